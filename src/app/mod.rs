use std::collections::HashSet;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Vec2};

use crate::orgs::{LoadOptions, OrgIndex, SourceFilter, load_org_index};

mod graph;
mod physics;
mod render_utils;
mod session;
mod ui;

use physics::PhysicsConfig;
use render_utils::ViewTransition;
use session::RenderSession;

type LoadResult = Result<OrgIndex, String>;

/// Values of the filter form.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FilterParams {
    pub source: SourceFilter,
    pub humanitarian_only: bool,
}

pub struct OrgNetworkApp {
    load_options: LoadOptions,
    initial_filters: FilterParams,
    state: AppState,
    reload_rx: Option<Receiver<LoadResult>>,
    reload_error: Option<String>,
}

enum AppState {
    Loading { rx: Receiver<LoadResult> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    index: Arc<OrgIndex>,
    filters: FilterParams,
    filters_dirty: bool,
    session: Option<RenderSession>,
    build_error: Option<String>,
    session_revision: u64,
    selected: Option<String>,
    search: String,
    search_match_cache: Option<SearchMatchCache>,
    pan: Vec2,
    zoom: f32,
    view_transition: Option<ViewTransition>,
    fit_requested: bool,
    live_physics: bool,
    physics: PhysicsConfig,
}

struct SearchMatchCache {
    query: String,
    session_revision: u64,
    matches: Arc<HashSet<usize>>,
}

impl OrgNetworkApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        load_options: LoadOptions,
        initial_filters: FilterParams,
    ) -> Self {
        let state = Self::start_load(load_options.clone());
        Self {
            load_options,
            initial_filters,
            state,
            reload_rx: None,
            reload_error: None,
        }
    }

    fn spawn_load(load_options: LoadOptions) -> Receiver<LoadResult> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_org_index(&load_options).map_err(|error| {
                tracing::error!(location = %load_options.location, "failed to load organization index: {error:#}");
                format!("{error:#}")
            });
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(load_options: LoadOptions) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(load_options),
        }
    }

    /// Applies a finished background reload. A failed reload keeps the
    /// current model and is reported through `reload_error`.
    /// Returns whether the reload is still pending.
    fn poll_reload(&mut self) -> bool {
        let Some(rx) = self.reload_rx.take() else {
            return false;
        };
        let AppState::Ready(model) = &mut self.state else {
            return false;
        };

        match rx.try_recv() {
            Ok(Ok(index)) => {
                self.reload_error = None;
                model.replace_index(index);
                false
            }
            Ok(Err(error)) => {
                self.reload_error = Some(error);
                false
            }
            Err(TryRecvError::Empty) => {
                self.reload_rx = Some(rx);
                true
            }
            Err(TryRecvError::Disconnected) => {
                self.reload_error = Some("Background load worker disconnected".to_owned());
                false
            }
        }
    }
}

impl eframe::App for OrgNetworkApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;
        let location = self.load_options.location.to_string();

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(index)) => {
                        transition = Some(AppState::Ready(Box::new(ViewModel::new(
                            index,
                            self.initial_filters,
                        ))));
                    }
                    Ok(Err(error)) => transition = Some(AppState::Error(error)),
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition =
                            Some(AppState::Error("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading organization index...");
                        ui.add_space(4.0);
                        ui.label(location.as_str());
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the organization index");
                    ui.add_space(6.0);
                    ui.label(location.as_str());
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.load_options.clone()));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(
                    ctx,
                    &location,
                    &mut reload_requested,
                    is_reloading,
                    self.reload_error.as_deref(),
                );

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_error = None;
                    self.reload_rx = Some(Self::spawn_load(self.load_options.clone()));
                }
            }
        }

        if self.poll_reload() {
            ctx.request_repaint();
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.reload_error = None;
            self.state = next_state;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::orgs::{IndexLocation, parse_org_index};

    fn sample_index() -> OrgIndex {
        let raw = json!({
            "a": { "partners": { "all": { "local": { "b": 1 } } } },
            "b": {}
        });
        parse_org_index(&raw.to_string()).unwrap()
    }

    fn ready_app(reload: LoadResult) -> OrgNetworkApp {
        let (tx, rx) = mpsc::channel();
        tx.send(reload).unwrap();
        OrgNetworkApp {
            load_options: LoadOptions {
                location: IndexLocation::File("org-index.json".into()),
                timeout: Duration::from_secs(1),
            },
            initial_filters: FilterParams::default(),
            state: AppState::Ready(Box::new(ViewModel::new(
                sample_index(),
                FilterParams::default(),
            ))),
            reload_rx: Some(rx),
            reload_error: None,
        }
    }

    #[test]
    fn failed_reload_keeps_the_current_graph() {
        let mut app = ready_app(Err("connection refused".to_owned()));

        assert!(!app.poll_reload());
        assert_eq!(app.reload_error.as_deref(), Some("connection refused"));
        assert!(app.reload_rx.is_none());
        let AppState::Ready(model) = &app.state else {
            panic!("reload failure must not leave the ready state");
        };
        assert_eq!(model.index.len(), 2);
    }

    #[test]
    fn successful_reload_replaces_the_index() {
        let reloaded = json!({ "c": {}, "d": {}, "e": {} });
        let mut app = ready_app(Ok(parse_org_index(&reloaded.to_string()).unwrap()));
        app.reload_error = Some("earlier failure".to_owned());

        assert!(!app.poll_reload());
        assert!(app.reload_error.is_none());
        let AppState::Ready(model) = &app.state else {
            panic!("expected the ready state");
        };
        assert_eq!(model.index.len(), 3);
        assert!(model.filters_dirty);
    }
}
