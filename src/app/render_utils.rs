use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2, vec2};

use crate::orgs::Scope;

pub(super) const MIN_ZOOM: f32 = 0.02;
pub(super) const MAX_ZOOM: f32 = 8.0;

pub(super) fn scope_color(scope: &Scope) -> Color32 {
    match scope {
        Scope::Local => Color32::from_rgb(255, 0, 0),
        Scope::Regional => Color32::from_rgb(255, 165, 0),
        Scope::International => Color32::from_rgb(0, 0, 255),
        Scope::Unknown | Scope::Other(_) => Color32::from_rgb(128, 128, 128),
    }
}

pub(super) const EDGE_COLOR: Color32 = Color32::from_rgb(128, 128, 128);

/// Stroke width in world units; grows with the fourth root of the weight.
pub(super) fn edge_width(value: f64) -> f32 {
    value.max(0.0).sqrt().sqrt() as f32
}

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| ((a as f32 * (1.0 - amount)) + (b as f32 * amount)) as u8;

    Color32::from_rgba_unmultiplied(
        mix(base.r(), overlay.r()),
        mix(base.g(), overlay.g()),
        mix(base.b(), overlay.b()),
        mix(base.a(), overlay.a()),
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = (56.0 * zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + pan;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    rect.expand(radius).contains(position)
}

pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let rect = rect.expand(padding);
    if !rect.intersects(Rect::from_two_pos(start, end)) {
        return false;
    }

    if rect.contains(start) || rect.contains(end) {
        return true;
    }

    let corners = [
        rect.left_top(),
        rect.right_top(),
        rect.right_bottom(),
        rect.left_bottom(),
    ];
    (0..4).any(|side| segments_intersect(start, end, corners[side], corners[(side + 1) % 4]))
}

fn segments_intersect(a1: Pos2, a2: Pos2, b1: Pos2, b2: Pos2) -> bool {
    fn cross(o: Pos2, a: Pos2, b: Pos2) -> f32 {
        let oa = a - o;
        let ob = b - o;
        (oa.x * ob.y) - (oa.y * ob.x)
    }

    let straddles = |p: f32, q: f32| (p <= 0.0 && q >= 0.0) || (p >= 0.0 && q <= 0.0);

    straddles(cross(a1, a2, b1), cross(a1, a2, b2))
        && straddles(cross(b1, b2, a1), cross(b1, b2, a2))
}

pub(super) fn world_to_screen(rect: Rect, pan: Vec2, zoom: f32, world: Vec2) -> Pos2 {
    rect.center() + pan + world * zoom
}

pub(super) fn screen_to_world(rect: Rect, pan: Vec2, zoom: f32, screen: Pos2) -> Vec2 {
    (screen - rect.center() - pan) / zoom
}

/// Pan and zoom that center `bounds` in a viewport of `viewport` size with
/// `margin` pixels to spare on every side. Never zooms in past 1:1.
pub(super) fn fit_view(bounds: Rect, viewport: Vec2, margin: f32) -> (Vec2, f32) {
    let usable = (viewport - vec2(margin, margin) * 2.0).max(vec2(1.0, 1.0));
    let size = bounds.size().max(vec2(1.0, 1.0));
    let zoom = (usable.x / size.x)
        .min(usable.y / size.y)
        .clamp(MIN_ZOOM, 1.0);
    let pan = -bounds.center().to_vec2() * zoom;
    (pan, zoom)
}

/// Eased transition between two view transforms.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct ViewTransition {
    from_pan: Vec2,
    from_zoom: f32,
    to_pan: Vec2,
    to_zoom: f32,
    started_at: f64,
    duration: f64,
}

impl ViewTransition {
    pub(super) const DURATION_SECS: f64 = 0.5;

    pub(super) fn new(from: (Vec2, f32), to: (Vec2, f32), started_at: f64) -> Self {
        Self {
            from_pan: from.0,
            from_zoom: from.1,
            to_pan: to.0,
            to_zoom: to.1,
            started_at,
            duration: Self::DURATION_SECS,
        }
    }

    /// Transform at `now` and whether the transition has finished.
    pub(super) fn sample(&self, now: f64) -> (Vec2, f32, bool) {
        let t = ((now - self.started_at) / self.duration).clamp(0.0, 1.0) as f32;
        let eased = t * t * (3.0 - 2.0 * t);
        let pan = self.from_pan + (self.to_pan - self.from_pan) * eased;
        let zoom = self.from_zoom + (self.to_zoom - self.from_zoom) * eased;
        (pan, zoom, t >= 1.0)
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;

    #[test]
    fn scope_colors_follow_the_fixed_palette() {
        assert_eq!(scope_color(&Scope::Local), Color32::from_rgb(255, 0, 0));
        assert_eq!(scope_color(&Scope::Regional), Color32::from_rgb(255, 165, 0));
        assert_eq!(
            scope_color(&Scope::International),
            Color32::from_rgb(0, 0, 255)
        );
        assert_eq!(scope_color(&Scope::Unknown), Color32::from_rgb(128, 128, 128));
        assert_eq!(
            scope_color(&Scope::Other("national".into())),
            scope_color(&Scope::Unknown)
        );
    }

    #[test]
    fn edges_are_drawn_grey() {
        assert_eq!(EDGE_COLOR, Color32::from_rgb(128, 128, 128));
    }

    #[test]
    fn edge_width_is_fourth_root_of_weight() {
        assert_eq!(edge_width(16.0), 2.0);
        assert_eq!(edge_width(1.0), 1.0);
        assert_eq!(edge_width(0.0), 0.0);
        assert_eq!(edge_width(-4.0), 0.0);
    }

    #[test]
    fn screen_and_world_transforms_invert() {
        let rect = Rect::from_min_size(pos2(10.0, 20.0), vec2(800.0, 600.0));
        let pan = vec2(-35.0, 12.5);
        let world = vec2(123.0, -45.0);
        let screen = world_to_screen(rect, pan, 2.5, world);
        let back = screen_to_world(rect, pan, 2.5, screen);
        assert!((back - world).length() < 1e-3);
    }

    #[test]
    fn fit_view_centers_and_scales_bounds() {
        let bounds = Rect::from_min_max(pos2(100.0, -50.0), pos2(900.0, 350.0));
        let viewport = vec2(440.0, 440.0);
        let (pan, zoom) = fit_view(bounds, viewport, 20.0);
        assert!((zoom - 0.5).abs() < 1e-6);

        let rect = Rect::from_min_size(Pos2::ZERO, viewport);
        let center = world_to_screen(rect, pan, zoom, bounds.center().to_vec2());
        assert!((center - rect.center()).length() < 1e-3);
    }

    #[test]
    fn fit_view_does_not_magnify_small_graphs() {
        let bounds = Rect::from_center_size(pos2(5.0, 5.0), vec2(20.0, 20.0));
        let (_, zoom) = fit_view(bounds, vec2(1000.0, 800.0), 20.0);
        assert_eq!(zoom, 1.0);
    }

    #[test]
    fn transition_eases_to_its_target() {
        let transition = ViewTransition::new((Vec2::ZERO, 1.0), (vec2(100.0, 0.0), 0.5), 10.0);

        let (pan, zoom, done) = transition.sample(10.0);
        assert_eq!((pan, zoom, done), (Vec2::ZERO, 1.0, false));

        let (pan, zoom, done) = transition.sample(10.25);
        assert!((pan.x - 50.0).abs() < 1e-3);
        assert!((zoom - 0.75).abs() < 1e-6);
        assert!(!done);

        let (pan, zoom, done) = transition.sample(11.0);
        assert_eq!((pan, zoom, done), (vec2(100.0, 0.0), 0.5, true));
    }

    #[test]
    fn edge_visibility_catches_crossing_segments() {
        let rect = Rect::from_min_max(pos2(0.0, 0.0), pos2(100.0, 100.0));
        assert!(edge_visible(rect, pos2(-50.0, 50.0), pos2(150.0, 50.0), 0.0));
        assert!(edge_visible(rect, pos2(50.0, 50.0), pos2(500.0, 500.0), 0.0));
        assert!(!edge_visible(rect, pos2(-50.0, -50.0), pos2(-10.0, 300.0), 0.0));
        assert!(!edge_visible(rect, pos2(150.0, -10.0), pos2(260.0, 40.0), 0.0));
        assert!(circle_visible(rect, pos2(105.0, 50.0), 10.0));
        assert!(!circle_visible(rect, pos2(120.0, 50.0), 10.0));
    }
}
