use eframe::egui::{self, Pos2, Rect, Ui};

use super::super::ViewModel;
use super::super::render_utils::{MAX_ZOOM, MIN_ZOOM, circle_visible, screen_to_world};

impl ViewModel {
    /// Wheel and pinch zoom, anchored on the pointer.
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let (scroll, pinch) = ui.input(|input| (input.raw_scroll_delta.y, input.zoom_delta()));
        let wheel_factor = if scroll.abs() > f32::EPSILON {
            (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15)
        } else {
            1.0
        };
        let zoom_factor = wheel_factor * pinch;
        if (zoom_factor - 1.0).abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = screen_to_world(rect, self.pan, self.zoom, pointer);

        self.view_transition = None;
        self.zoom = (self.zoom * zoom_factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan = pointer - rect.center() - (world_before * self.zoom);
    }

    /// Dragging a node pins it under the pointer; dragging empty canvas pans.
    pub(in crate::app) fn handle_graph_drag(
        &mut self,
        rect: Rect,
        response: &egui::Response,
        hovered: Option<usize>,
    ) {
        let (pan, zoom) = (self.pan, self.zoom);
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let pointer = response.interact_pointer_pos();

        if response.drag_started_by(egui::PointerButton::Primary)
            && let (Some(index), Some(pointer)) = (hovered, pointer)
        {
            session.pin(index, screen_to_world(rect, pan, zoom, pointer));
            return;
        }

        if session.dragging.is_some() {
            if response.drag_stopped() {
                session.unpin();
            } else if let Some(pointer) = pointer {
                session.drag_to(screen_to_world(rect, pan, zoom, pointer));
            }
            return;
        }

        if response.dragged() {
            self.view_transition = None;
            self.pan += response.drag_delta();
        }
    }

    pub(in crate::app) fn visible_indices_into(
        rect: Rect,
        screen_positions: &[Pos2],
        screen_radii: &[f32],
        visible: &mut Vec<usize>,
    ) {
        visible.clear();
        visible.extend(
            (0..screen_positions.len())
                .filter(|&index| circle_visible(rect, screen_positions[index], screen_radii[index])),
        );
    }

    pub(in crate::app) fn hovered_index(
        ui: &Ui,
        visible_indices: &[usize],
        screen_positions: &[Pos2],
        screen_radii: &[f32],
    ) -> Option<usize> {
        let pointer = ui.input(|input| input.pointer.hover_pos())?;
        visible_indices
            .iter()
            .filter_map(|&index| {
                let distance = screen_positions[index].distance(pointer);
                (distance <= screen_radii[index].max(4.0)).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }

    pub(in crate::app) fn handle_node_click(&mut self, stub: Option<String>) {
        if let Some(stub) = &stub {
            tracing::info!(%stub, "node clicked");
        }
        self.set_selected(stub);
    }
}
