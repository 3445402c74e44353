mod forces;
mod quadtree;

use eframe::egui::Vec2;

use super::session::RenderSession;
use forces::{accumulate_charge, jiggle};
use quadtree::QuadCell;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct PhysicsConfig {
    pub(in crate::app) charge_strength: f32,
    pub(in crate::app) link_distance: f32,
    pub(in crate::app) theta: f32,
    pub(in crate::app) velocity_decay: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            charge_strength: -100.0,
            link_distance: 30.0,
            theta: 0.9,
            velocity_decay: 0.4,
        }
    }
}

/// Simulation temperature. Every tick moves `alpha` towards `target`;
/// the layout is at rest once both sit below `min`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct Cooling {
    pub(in crate::app) alpha: f32,
    pub(in crate::app) target: f32,
    min: f32,
    decay: f32,
}

impl Default for Cooling {
    fn default() -> Self {
        let min = 0.001_f32;
        Self {
            alpha: 1.0,
            target: 0.0,
            min,
            // reaches `min` from 1.0 in about 300 ticks
            decay: 1.0 - min.powf(1.0 / 300.0),
        }
    }
}

impl Cooling {
    pub(in crate::app) fn is_active(&self) -> bool {
        self.alpha >= self.min || self.target >= self.min
    }

    pub(in crate::app) fn reheat(&mut self, alpha: f32) {
        self.alpha = self.alpha.max(alpha);
    }

    fn advance(&mut self) -> f32 {
        self.alpha += (self.target - self.alpha) * self.decay;
        self.alpha
    }
}

/// Advances the layout by one tick: many-body charge, centering, link
/// springs, then velocity integration. Returns whether the layout is still
/// moving.
pub(in crate::app) fn step_physics(session: &mut RenderSession, config: PhysicsConfig) -> bool {
    if !session.cooling.is_active() {
        return false;
    }

    let alpha = session.cooling.advance();
    let node_count = session.nodes.len();
    if node_count == 0 {
        return session.cooling.is_active();
    }

    let positions = &mut session.physics_scratch.positions;
    positions.clear();
    positions.extend(session.nodes.iter().map(|node| node.world_pos));

    if let Some(tree) = QuadCell::build(positions) {
        let strength = config.charge_strength * alpha;
        for (index, node) in session.nodes.iter_mut().enumerate() {
            accumulate_charge(
                &tree,
                index,
                positions,
                strength,
                config.theta,
                &mut node.velocity,
            );
        }
    }

    let mut centroid = Vec2::ZERO;
    for node in &session.nodes {
        centroid += node.world_pos;
    }
    centroid /= node_count as f32;
    for node in &mut session.nodes {
        node.world_pos -= centroid;
    }

    for (edge_index, edge) in session.edges.iter().enumerate() {
        let (source, target) = (edge.source, edge.target);
        if source == target || source >= node_count || target >= node_count {
            continue;
        }

        let source_degree = session.degrees[source].max(1) as f32;
        let target_degree = session.degrees[target].max(1) as f32;
        let strength = 1.0 / source_degree.min(target_degree);
        let bias = source_degree / (source_degree + target_degree);

        let source_node = &session.nodes[source];
        let target_node = &session.nodes[target];
        let mut delta = (target_node.world_pos + target_node.velocity)
            - (source_node.world_pos + source_node.velocity);
        if delta.length_sq() == 0.0 {
            delta = jiggle(edge_index);
        }

        let distance = delta.length();
        let pull = delta * ((distance - config.link_distance) / distance * alpha * strength);

        session.nodes[target].velocity -= pull * bias;
        session.nodes[source].velocity += pull * (1.0 - bias);
    }

    let keep = 1.0 - config.velocity_decay.clamp(0.0, 1.0);
    for node in &mut session.nodes {
        if let Some(pin) = node.pinned {
            node.world_pos = pin;
            node.velocity = Vec2::ZERO;
        } else {
            node.velocity *= keep;
            node.world_pos += node.velocity;
        }
    }

    session.cooling.is_active()
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;

    #[test]
    fn cooling_settles_after_a_few_hundred_ticks() {
        let mut cooling = Cooling::default();
        let mut ticks = 0;
        while cooling.is_active() {
            cooling.advance();
            ticks += 1;
            assert!(ticks < 1000);
        }
        assert!((250..=350).contains(&ticks), "settled after {ticks} ticks");
    }

    #[test]
    fn raised_target_keeps_the_simulation_running() {
        let mut cooling = Cooling {
            alpha: 0.0,
            ..Cooling::default()
        };
        assert!(!cooling.is_active());

        cooling.target = 0.3;
        assert!(cooling.is_active());
        for _ in 0..2000 {
            cooling.advance();
        }
        assert!((cooling.alpha - 0.3).abs() < 0.01);

        cooling.target = 0.0;
        cooling.reheat(0.1);
        assert!(cooling.alpha >= 0.29);
    }

    #[test]
    fn linked_pair_settles_near_link_distance() {
        let mut session = RenderSession::for_test(&[vec2(-50.0, 0.0), vec2(60.0, 0.0)], &[(0, 1)]);
        let config = PhysicsConfig::default();
        while step_physics(&mut session, config) {}

        let distance = (session.nodes[0].world_pos - session.nodes[1].world_pos).length();
        assert!(distance > 15.0 && distance < 120.0, "distance {distance}");
        let midpoint = (session.nodes[0].world_pos + session.nodes[1].world_pos) * 0.5;
        assert!(midpoint.length() < 1.0);
    }

    #[test]
    fn pinned_node_does_not_move() {
        let mut session = RenderSession::for_test(
            &[vec2(0.0, 0.0), vec2(5.0, 0.0), vec2(0.0, 5.0)],
            &[(0, 1), (1, 2)],
        );
        session.pin(1, vec2(40.0, 40.0));
        for _ in 0..50 {
            step_physics(&mut session, PhysicsConfig::default());
            assert_eq!(session.nodes[1].world_pos, vec2(40.0, 40.0));
            assert_eq!(session.nodes[1].velocity, Vec2::ZERO);
        }
    }

    #[test]
    fn settled_session_does_no_work() {
        let mut session = RenderSession::for_test(&[vec2(0.0, 0.0), vec2(5.0, 0.0)], &[]);
        session.cooling.alpha = 0.0;
        let before = session.nodes[1].world_pos;
        assert!(!step_physics(&mut session, PhysicsConfig::default()));
        assert_eq!(session.nodes[1].world_pos, before);
    }
}
