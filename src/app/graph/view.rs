use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{self, Align2, Color32, FontId, Rect, Sense, Stroke, Ui, Vec2, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use super::super::physics::step_physics;
use super::super::render_utils::{
    EDGE_COLOR, ViewTransition, blend_color, dim_color, draw_background, edge_visible, edge_width,
    fit_view, scope_color, world_to_screen,
};
use super::super::session::{NODE_RADIUS, RenderSession};
use super::super::{SearchMatchCache, ViewModel};

const FIT_MARGIN: f32 = 40.0;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

impl ViewModel {
    fn update_screen_space(rect: Rect, pan: Vec2, zoom: f32, session: &mut RenderSession) {
        let scratch = &mut session.view_scratch;
        scratch.screen_positions.clear();
        scratch.screen_radii.clear();
        for node in &session.nodes {
            scratch
                .screen_positions
                .push(world_to_screen(rect, pan, zoom, node.world_pos));
            scratch
                .screen_radii
                .push((NODE_RADIUS * zoom).clamp(1.5, 60.0));
        }

        Self::visible_indices_into(
            rect,
            &scratch.screen_positions,
            &scratch.screen_radii,
            &mut scratch.visible_indices,
        );
        scratch.visible_mask.clear();
        scratch.visible_mask.resize(session.nodes.len(), false);
        for &index in &scratch.visible_indices {
            scratch.visible_mask[index] = true;
        }
    }

    fn cached_search_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        let session = self.session.as_ref()?;
        if let Some(cached) = &self.search_match_cache
            && cached.session_revision == session.revision
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matcher = SkimMatcherV2::default();
        let matches = session
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| {
                fuzzy_match_score(&matcher, &node.name, query).is_some()
                    || fuzzy_match_score(&matcher, &node.stub, query).is_some()
            })
            .map(|(index, _)| index)
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            session_revision: session.revision,
            matches: Arc::clone(&matches),
        });

        Some(matches)
    }

    /// Advances the simulation and the view transform by one frame.
    /// Returns whether another frame is needed.
    fn advance_frame(&mut self, rect: Rect, now: f64) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };

        let moving = if self.live_physics || session.dragging.is_some() {
            step_physics(session, self.physics)
        } else {
            false
        };

        if !moving && !session.settled {
            session.settled = true;
            self.fit_requested = true;
        }

        if self.fit_requested {
            self.fit_requested = false;
            if let Some(bounds) = session.world_bounds() {
                let target = fit_view(bounds, rect.size(), FIT_MARGIN);
                self.view_transition =
                    Some(ViewTransition::new((self.pan, self.zoom), target, now));
            }
        }

        let mut transitioning = false;
        if let Some(transition) = self.view_transition {
            let (pan, zoom, done) = transition.sample(now);
            self.pan = pan;
            self.zoom = zoom;
            if done {
                self.view_transition = None;
            } else {
                transitioning = true;
            }
        }

        moving || transitioning || session.dragging.is_some()
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        if self.filters_dirty {
            self.apply_filters();
        }

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        draw_background(&painter, rect, self.pan, self.zoom);

        if let Some(error) = &self.build_error {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                format!("Graph build failed:\n{error}"),
                FontId::proportional(15.0),
                Color32::from_rgb(240, 128, 110),
            );
            return;
        }

        if self.session.is_none() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No partnerships match the current filters.",
                FontId::proportional(15.0),
                Color32::from_gray(200),
            );
            return;
        }

        self.handle_graph_zoom(ui, rect, &response);

        let now = ui.input(|input| input.time);
        if self.advance_frame(rect, now) {
            ui.ctx().request_repaint();
        }

        let search_matches = self.cached_search_matches();
        let (pan, zoom) = (self.pan, self.zoom);
        let Some(session) = self.session.as_mut() else {
            return;
        };

        Self::update_screen_space(rect, pan, zoom, session);
        let scratch = &session.view_scratch;

        let hovered = Self::hovered_index(
            ui,
            &scratch.visible_indices,
            &scratch.screen_positions,
            &scratch.screen_radii,
        );
        if hovered.is_some() || session.dragging.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = if session.dragging.is_some() {
                    egui::CursorIcon::Grabbing
                } else {
                    egui::CursorIcon::PointingHand
                };
            });
        }

        let selected_index = self
            .selected
            .as_ref()
            .and_then(|stub| session.index_by_stub.get(stub).copied());
        let search_active = search_matches
            .as_ref()
            .is_some_and(|matches| !matches.is_empty());

        for edge in &session.edges {
            let start = scratch.screen_positions[edge.source];
            let end = scratch.screen_positions[edge.target];
            if !scratch.visible_mask[edge.source]
                && !scratch.visible_mask[edge.target]
                && !edge_visible(rect, start, end, 2.0)
            {
                continue;
            }

            let touches_selection = selected_index
                .is_some_and(|selected| edge.source == selected || edge.target == selected);
            let base = EDGE_COLOR.gamma_multiply(0.6);
            let (width, color) = match selected_index {
                Some(_) if touches_selection => (
                    edge_width(edge.value) * zoom * 1.6,
                    blend_color(base, Color32::from_rgb(245, 206, 93), 0.55),
                ),
                Some(_) => (edge_width(edge.value) * zoom, dim_color(base, 0.35)),
                None => (edge_width(edge.value) * zoom, base),
            };

            painter.line_segment([start, end], Stroke::new(width.max(0.5), color));
        }

        for &index in &scratch.visible_indices {
            let node = &session.nodes[index];
            let position = scratch.screen_positions[index];
            let radius = scratch.screen_radii[index];

            let is_selected = selected_index == Some(index);
            let is_neighbor =
                selected_index.is_some_and(|selected| session.is_neighbor(selected, index));
            let is_match = search_matches
                .as_ref()
                .is_some_and(|matches| matches.contains(&index));

            let base = scope_color(&node.scope);
            let fill = if is_selected || is_neighbor || is_match {
                base
            } else if selected_index.is_some() {
                dim_color(base, 0.4)
            } else if search_active {
                dim_color(base, 0.5)
            } else {
                base
            };

            painter.circle_filled(position, radius, fill);

            let outline = if is_selected {
                Stroke::new(2.5, Color32::from_rgb(245, 206, 93))
            } else if is_match {
                Stroke::new(2.0, Color32::from_rgb(103, 196, 255))
            } else {
                Stroke::new(
                    (1.5 * zoom.sqrt()).clamp(0.5, 2.0),
                    Color32::from_rgba_unmultiplied(255, 255, 255, 200),
                )
            };
            painter.circle_stroke(position, radius, outline);

            let show_label = is_selected
                || hovered == Some(index)
                || (is_neighbor && zoom > 0.5)
                || (is_match && zoom > 0.35)
                || zoom > 1.6;
            if show_label {
                painter.text(
                    position + vec2(radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    node.name.as_str(),
                    FontId::proportional(12.0),
                    Color32::from_gray(238),
                );
            }
        }

        if let Some(index) = hovered {
            let node = &session.nodes[index];
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                format!(
                    "{}  |  {}  |  {}  |  partners {}",
                    node.name,
                    node.stub,
                    node.scope.label(),
                    session.degrees[index]
                ),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        let clicked_stub = if response.clicked_by(egui::PointerButton::Primary) {
            Some(hovered.map(|index| session.nodes[index].stub.clone()))
        } else {
            None
        };

        self.handle_graph_drag(rect, &response, hovered);
        if let Some(stub) = clicked_stub {
            self.handle_node_click(stub);
        }
    }
}
