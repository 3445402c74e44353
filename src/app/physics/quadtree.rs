use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;

#[derive(Clone, Copy, Debug)]
pub(super) struct Square {
    pub(super) center: Vec2,
    pub(super) half_extent: f32,
}

impl Square {
    fn enclosing(points: &[Vec2]) -> Option<Self> {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);

        for point in points {
            min = min.min(*point);
            max = max.max(*point);
        }

        if !min.x.is_finite() || !min.y.is_finite() || !max.x.is_finite() || !max.y.is_finite() {
            return None;
        }

        let span = (max - min).max(vec2(1.0, 1.0));
        Some(Self {
            center: (min + max) * 0.5,
            half_extent: (span.x.max(span.y) * 0.5) + 1.0,
        })
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        let offset = (point - self.center).abs();
        offset.x <= self.half_extent && offset.y <= self.half_extent
    }

    pub(super) fn width(self) -> f32 {
        self.half_extent * 2.0
    }

    fn quadrant(self, quadrant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let offset = vec2(
            if quadrant & 1 == 0 { -quarter } else { quarter },
            if quadrant & 2 == 0 { -quarter } else { quarter },
        );

        Self {
            center: self.center + offset,
            half_extent: quarter,
        }
    }

    fn quadrant_of(self, point: Vec2) -> usize {
        usize::from(point.x >= self.center.x) | (usize::from(point.y >= self.center.y) << 1)
    }
}

/// Barnes-Hut cell: `count` bodies with their centroid, either split into
/// four children or holding the body indices directly.
pub(super) struct QuadCell {
    pub(super) square: Square,
    pub(super) centroid: Vec2,
    pub(super) count: f32,
    pub(super) bodies: Vec<usize>,
    pub(super) children: [Option<Box<QuadCell>>; 4],
}

impl QuadCell {
    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        let square = Square::enclosing(positions)?;
        let bodies = (0..positions.len()).collect::<Vec<_>>();
        Some(Self::subdivide(square, bodies, positions, 0))
    }

    fn subdivide(square: Square, bodies: Vec<usize>, positions: &[Vec2], depth: usize) -> Self {
        let count = bodies.len() as f32;
        let mut centroid = Vec2::ZERO;
        for &body in &bodies {
            centroid += positions[body];
        }
        if count > 0.0 {
            centroid /= count;
        }

        let mut cell = Self {
            square,
            centroid,
            count,
            bodies,
            children: std::array::from_fn(|_| None),
        };

        if depth >= MAX_DEPTH || cell.bodies.len() <= LEAF_CAPACITY {
            return cell;
        }

        let mut buckets = std::array::from_fn::<_, 4, _>(|_| Vec::new());
        for &body in &cell.bodies {
            buckets[square.quadrant_of(positions[body])].push(body);
        }

        // Coincident bodies cannot be separated by splitting further.
        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() <= 1 {
            return cell;
        }

        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if !bucket.is_empty() {
                cell.children[quadrant] = Some(Box::new(Self::subdivide(
                    square.quadrant(quadrant),
                    bucket,
                    positions,
                    depth + 1,
                )));
            }
        }
        cell.bodies.clear();
        cell
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf_bodies(cell: &QuadCell, out: &mut Vec<usize>) {
        out.extend_from_slice(&cell.bodies);
        for child in cell.children.iter().flatten() {
            leaf_bodies(child, out);
        }
    }

    #[test]
    fn every_body_lands_in_exactly_one_leaf() {
        let positions = (0..100)
            .map(|index| vec2((index % 10) as f32 * 13.0, (index / 10) as f32 * 7.0))
            .collect::<Vec<_>>();

        let root = QuadCell::build(&positions).unwrap();
        assert!(!root.is_leaf());
        assert_eq!(root.count, 100.0);

        let mut bodies = Vec::new();
        leaf_bodies(&root, &mut bodies);
        bodies.sort_unstable();
        assert_eq!(bodies, (0..100).collect::<Vec<_>>());

        for position in &positions {
            assert!(root.square.contains(*position));
        }
    }

    #[test]
    fn coincident_bodies_stay_in_one_leaf() {
        let positions = vec![vec2(3.0, 3.0); 20];
        let root = QuadCell::build(&positions).unwrap();
        assert!(root.is_leaf());
        assert_eq!(root.bodies.len(), 20);
        assert_eq!(root.centroid, vec2(3.0, 3.0));
    }

    #[test]
    fn empty_input_builds_nothing() {
        assert!(QuadCell::build(&[]).is_none());
    }
}
