use std::sync::Arc;

use eframe::egui::{self, Align, Context, Layout, Vec2};

use crate::orgs::OrgIndex;

use super::super::physics::PhysicsConfig;
use super::super::{FilterParams, ViewModel};

impl ViewModel {
    pub(in crate::app) fn new(index: OrgIndex, filters: FilterParams) -> Self {
        Self {
            index: Arc::new(index),
            filters,
            filters_dirty: true,
            session: None,
            build_error: None,
            session_revision: 0,
            selected: None,
            search: String::new(),
            search_match_cache: None,
            pan: Vec2::ZERO,
            zoom: 1.0,
            view_transition: None,
            fit_requested: false,
            live_physics: true,
            physics: PhysicsConfig::default(),
        }
    }

    /// Swaps in a freshly loaded index and rebuilds with the current filters.
    pub(in crate::app) fn replace_index(&mut self, index: OrgIndex) {
        self.index = Arc::new(index);
        if self
            .selected
            .as_ref()
            .is_some_and(|stub| self.index.get(stub).is_none())
        {
            self.selected = None;
        }
        self.filters_dirty = true;
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        location: &str,
        reload_requested: &mut bool,
        is_reloading: bool,
        reload_error: Option<&str>,
    ) {
        if self.filters_dirty {
            self.apply_filters();
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("orgnet");
                    ui.separator();
                    ui.label(format!("index: {location}"));
                    ui.label(format!("organizations: {}", self.index.len()));
                    let reload_button =
                        ui.add_enabled(!is_reloading, egui::Button::new("Reload index"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    if is_reloading {
                        ui.spinner();
                    } else if let Some(error) = reload_error {
                        ui.colored_label(
                            egui::Color32::from_rgb(240, 128, 110),
                            "reload failed",
                        )
                        .on_hover_text(error);
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.graph_summary_text());
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.draw_graph(ui));
    }

    fn graph_summary_text(&self) -> String {
        match &self.session {
            Some(session) => format!(
                "{} nodes  |  {} edges  |  {}{}",
                session.nodes.len(),
                session.edges.len(),
                self.filters.source,
                if self.filters.humanitarian_only {
                    "  |  humanitarian only"
                } else {
                    ""
                }
            ),
            None if self.build_error.is_some() => "build failed".to_owned(),
            None => "empty graph".to_owned(),
        }
    }

    pub(in crate::app) fn set_selected(&mut self, selected: Option<String>) {
        self.selected = selected;
    }
}
