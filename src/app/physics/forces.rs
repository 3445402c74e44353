use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadCell;

const MIN_DISTANCE_SQ: f32 = 1.0;

/// Stand-in direction for bodies sitting on top of each other.
pub(super) fn jiggle(seed: usize) -> Vec2 {
    let angle = ((seed as f32) * 0.618_034 + 0.37) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin()) * 1e-3
}

/// Velocity change on a body at `point` from `count` bodies at `other`.
/// Negative strength pushes apart.
fn charge_from(point: Vec2, other: Vec2, count: f32, strength: f32, seed: usize) -> Vec2 {
    let mut delta = other - point;
    if delta.length_sq() == 0.0 {
        delta = jiggle(seed);
    }

    let mut distance_sq = delta.length_sq();
    if distance_sq < MIN_DISTANCE_SQ {
        distance_sq = (MIN_DISTANCE_SQ * distance_sq).sqrt();
    }

    delta * (strength * count / distance_sq)
}

pub(super) fn accumulate_charge(
    cell: &QuadCell,
    index: usize,
    positions: &[Vec2],
    strength: f32,
    theta: f32,
    velocity: &mut Vec2,
) {
    if cell.count <= 0.0 {
        return;
    }

    let point = positions[index];

    if cell.is_leaf() {
        for &other in &cell.bodies {
            if other != index {
                *velocity += charge_from(point, positions[other], 1.0, strength, index ^ other);
            }
        }
        return;
    }

    let distance = (cell.centroid - point).length().max(1e-4);
    if !cell.square.contains(point) && cell.square.width() / distance < theta {
        *velocity += charge_from(point, cell.centroid, cell.count, strength, index);
        return;
    }

    for child in cell.children.iter().flatten() {
        accumulate_charge(child, index, positions, strength, theta, velocity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_charge_pushes_bodies_apart() {
        let positions = vec![vec2(0.0, 0.0), vec2(10.0, 0.0)];
        let tree = QuadCell::build(&positions).unwrap();

        let mut left = Vec2::ZERO;
        accumulate_charge(&tree, 0, &positions, -100.0, 0.9, &mut left);
        let mut right = Vec2::ZERO;
        accumulate_charge(&tree, 1, &positions, -100.0, 0.9, &mut right);

        assert!(left.x < 0.0);
        assert!(right.x > 0.0);
        assert!((left.x + right.x).abs() < 1e-4);
        // strength * dx / dx^2
        assert!((left.x - (-10.0)).abs() < 1e-4);
    }

    #[test]
    fn far_cluster_is_approximated_by_its_centroid() {
        let mut positions = vec![vec2(0.0, 0.0)];
        for index in 0..40 {
            positions.push(vec2(
                1000.0 + (index % 8) as f32,
                1000.0 + (index / 8) as f32,
            ));
        }
        let tree = QuadCell::build(&positions).unwrap();

        let mut approximated = Vec2::ZERO;
        accumulate_charge(&tree, 0, &positions, -100.0, 0.9, &mut approximated);
        let mut exact = Vec2::ZERO;
        accumulate_charge(&tree, 0, &positions, -100.0, 0.0, &mut exact);

        assert!(approximated.x < 0.0 && approximated.y < 0.0);
        assert!((approximated - exact).length() / exact.length() < 0.05);
    }

    #[test]
    fn coincident_bodies_still_separate() {
        let positions = vec![vec2(5.0, 5.0), vec2(5.0, 5.0)];
        let tree = QuadCell::build(&positions).unwrap();
        let mut velocity = Vec2::ZERO;
        accumulate_charge(&tree, 0, &positions, -100.0, 0.9, &mut velocity);
        assert!(velocity.length() > 0.0);
        assert!(velocity.x.is_finite() && velocity.y.is_finite());
    }
}
