use eframe::egui::{self, Color32, RichText, Ui};

use crate::orgs::{Scope, SourceFilter};

use super::super::ViewModel;
use super::super::physics::PhysicsConfig;
use super::super::render_utils::{EDGE_COLOR, scope_color};

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Filters");
        ui.separator();
        ui.add_space(4.0);

        let mut changed = false;

        ui.label("Source");
        ui.horizontal_wrapped(|ui| {
            for choice in SourceFilter::CHOICES {
                changed |= ui
                    .radio_value(&mut self.filters.source, choice, choice.label())
                    .on_hover_text(match choice {
                        SourceFilter::Both => "Show partnerships from every source.",
                        SourceFilter::Only(_) => {
                            "Only pairs where both organizations take part in this source."
                        }
                    })
                    .changed();
            }
        });

        changed |= ui
            .checkbox(&mut self.filters.humanitarian_only, "Humanitarian only")
            .on_hover_text("Only pairs where both organizations are humanitarian.")
            .changed();

        if changed {
            self.filters_dirty = true;
        }

        ui.separator();

        ui.label("Search (name or stub)")
            .on_hover_text("Fuzzy-highlight matching organizations without changing the graph.");
        ui.text_edit_singleline(&mut self.search);

        ui.separator();

        ui.horizontal(|ui| {
            if ui
                .button("Refit view")
                .on_hover_text("Recenter and rescale the drawing around all nodes.")
                .clicked()
            {
                self.fit_requested = true;
            }
            if ui.button("Clear selection").clicked() {
                self.set_selected(None);
            }
        });

        ui.checkbox(&mut self.live_physics, "Live physics simulation")
            .on_hover_text("Keep simulating layout forces until the layout settles.");

        ui.collapsing("Physics tuning", |ui| {
            let mut tuned = false;
            tuned |= ui
                .add(
                    egui::Slider::new(&mut self.physics.charge_strength, -400.0..=-10.0)
                        .text("Charge"),
                )
                .on_hover_text("Many-body strength; more negative pushes nodes further apart.")
                .changed();
            tuned |= ui
                .add(
                    egui::Slider::new(&mut self.physics.link_distance, 5.0..=150.0)
                        .text("Link distance"),
                )
                .on_hover_text("Rest length of partnership links.")
                .changed();
            tuned |= ui
                .add(
                    egui::Slider::new(&mut self.physics.velocity_decay, 0.05..=0.9)
                        .text("Velocity decay"),
                )
                .on_hover_text("Friction applied to node velocities every tick.")
                .changed();

            if ui.button("Reset").clicked() {
                self.physics = PhysicsConfig::default();
                tuned = true;
            }

            if tuned && let Some(session) = self.session.as_mut() {
                session.reheat();
            }
        });

        ui.separator();
        ui.label(RichText::new("Legend").strong());
        for scope in [
            Scope::Local,
            Scope::Regional,
            Scope::International,
            Scope::Unknown,
        ] {
            legend_row(ui, scope_color(&scope), scope.label());
        }
        legend_row(ui, EDGE_COLOR, "partnership (width ~ weight)");
    }
}

fn legend_row(ui: &mut Ui, color: Color32, label: &str) {
    ui.horizontal(|ui| {
        let (rect, _) = ui.allocate_exact_size(egui::vec2(14.0, 14.0), egui::Sense::hover());
        ui.painter().circle_filled(rect.center(), 6.0, color);
        ui.label(label);
    });
}
