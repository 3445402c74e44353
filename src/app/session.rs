use std::collections::HashMap;

use anyhow::{Result, anyhow};
use eframe::egui::{Rect, Vec2, vec2};

use crate::orgs::{GraphData, Scope};

use super::physics::Cooling;

pub(in crate::app) const NODE_RADIUS: f32 = 10.0;

/// Alpha the simulation is held at while a node is being dragged.
const DRAG_ALPHA_TARGET: f32 = 0.3;

pub(in crate::app) struct RenderNode {
    pub(in crate::app) stub: String,
    pub(in crate::app) name: String,
    pub(in crate::app) scope: Scope,
    pub(in crate::app) world_pos: Vec2,
    pub(in crate::app) velocity: Vec2,
    pub(in crate::app) pinned: Option<Vec2>,
}

pub(in crate::app) struct RenderEdge {
    pub(in crate::app) source: usize,
    pub(in crate::app) target: usize,
    pub(in crate::app) value: f64,
}

#[derive(Default)]
pub(in crate::app) struct PhysicsScratch {
    pub(in crate::app) positions: Vec<Vec2>,
}

#[derive(Default)]
pub(in crate::app) struct ViewScratch {
    pub(in crate::app) screen_positions: Vec<eframe::egui::Pos2>,
    pub(in crate::app) screen_radii: Vec<f32>,
    pub(in crate::app) visible_indices: Vec<usize>,
    pub(in crate::app) visible_mask: Vec<bool>,
}

/// Everything drawn for one build of the graph. A filter change drops the
/// whole session and constructs a new one; nothing carries over.
pub(in crate::app) struct RenderSession {
    pub(in crate::app) revision: u64,
    pub(in crate::app) nodes: Vec<RenderNode>,
    pub(in crate::app) edges: Vec<RenderEdge>,
    pub(in crate::app) index_by_stub: HashMap<String, usize>,
    pub(in crate::app) neighbors: Vec<Vec<usize>>,
    pub(in crate::app) degrees: Vec<usize>,
    pub(in crate::app) cooling: Cooling,
    pub(in crate::app) settled: bool,
    pub(in crate::app) dragging: Option<usize>,
    pub(in crate::app) physics_scratch: PhysicsScratch,
    pub(in crate::app) view_scratch: ViewScratch,
}

/// Phyllotaxis seeding: deterministic and spread out without overlaps.
fn initial_position(index: usize) -> Vec2 {
    let radius = NODE_RADIUS * (0.5 + index as f32).sqrt();
    let angle = index as f32 * std::f32::consts::PI * (3.0 - 5.0_f32.sqrt());
    vec2(radius * angle.cos(), radius * angle.sin())
}

impl RenderSession {
    pub(in crate::app) fn new(graph: &GraphData<'_>, revision: u64) -> Result<Self> {
        let mut nodes = Vec::with_capacity(graph.nodes.len());
        let mut index_by_stub = HashMap::with_capacity(graph.nodes.len());

        for (index, org) in graph.nodes.iter().enumerate() {
            if index_by_stub.insert(org.stub.clone(), index).is_some() {
                return Err(anyhow!("organization {} appears twice in the graph", org.stub));
            }
            nodes.push(RenderNode {
                stub: org.stub.clone(),
                name: org.name.clone(),
                scope: org.scope.clone(),
                world_pos: initial_position(index),
                velocity: Vec2::ZERO,
                pinned: None,
            });
        }

        let mut edges = Vec::with_capacity(graph.edges.len());
        let mut neighbors = vec![Vec::new(); nodes.len()];
        for edge in &graph.edges {
            let endpoint = |stub: &str| {
                index_by_stub.get(stub).copied().ok_or_else(|| {
                    anyhow!("edge {} - {} references unknown node {stub}", edge.source, edge.target)
                })
            };
            let source = endpoint(&edge.source)?;
            let target = endpoint(&edge.target)?;

            neighbors[source].push(target);
            neighbors[target].push(source);
            edges.push(RenderEdge {
                source,
                target,
                value: edge.value,
            });
        }

        let degrees = neighbors.iter().map(Vec::len).collect();

        Ok(Self {
            revision,
            nodes,
            edges,
            index_by_stub,
            neighbors,
            degrees,
            cooling: Cooling::default(),
            settled: false,
            dragging: None,
            physics_scratch: PhysicsScratch::default(),
            view_scratch: ViewScratch::default(),
        })
    }

    pub(in crate::app) fn pin(&mut self, index: usize, world: Vec2) {
        let Some(node) = self.nodes.get_mut(index) else {
            return;
        };
        node.pinned = Some(world);
        self.dragging = Some(index);
        self.cooling.target = DRAG_ALPHA_TARGET;
    }

    pub(in crate::app) fn drag_to(&mut self, world: Vec2) {
        if let Some(node) = self.dragging.and_then(|index| self.nodes.get_mut(index)) {
            node.pinned = Some(world);
        }
    }

    pub(in crate::app) fn unpin(&mut self) {
        if let Some(node) = self.dragging.take().and_then(|index| self.nodes.get_mut(index)) {
            node.pinned = None;
        }
        self.cooling.target = 0.0;
    }

    pub(in crate::app) fn reheat(&mut self) {
        self.cooling.reheat(DRAG_ALPHA_TARGET);
    }

    /// World-space box around all nodes, radius included.
    pub(in crate::app) fn world_bounds(&self) -> Option<Rect> {
        let mut nodes = self.nodes.iter();
        let first = nodes.next()?;
        let mut bounds = Rect::from_center_size(first.world_pos.to_pos2(), Vec2::ZERO);
        for node in nodes {
            bounds.extend_with(node.world_pos.to_pos2());
        }
        Some(bounds.expand(NODE_RADIUS))
    }

    pub(in crate::app) fn is_neighbor(&self, a: usize, b: usize) -> bool {
        self.neighbors
            .get(a)
            .is_some_and(|neighbors| neighbors.contains(&b))
    }
}

#[cfg(test)]
impl RenderSession {
    pub(in crate::app) fn for_test(positions: &[Vec2], edges: &[(usize, usize)]) -> Self {
        let nodes = positions
            .iter()
            .enumerate()
            .map(|(index, position)| RenderNode {
                stub: format!("n{index}"),
                name: format!("Node {index}"),
                scope: Scope::Unknown,
                world_pos: *position,
                velocity: Vec2::ZERO,
                pinned: None,
            })
            .collect::<Vec<_>>();

        let mut neighbors = vec![Vec::new(); nodes.len()];
        for &(source, target) in edges {
            neighbors[source].push(target);
            neighbors[target].push(source);
        }

        Self {
            revision: 0,
            index_by_stub: nodes
                .iter()
                .enumerate()
                .map(|(index, node)| (node.stub.clone(), index))
                .collect(),
            edges: edges
                .iter()
                .map(|&(source, target)| RenderEdge {
                    source,
                    target,
                    value: 1.0,
                })
                .collect(),
            degrees: neighbors.iter().map(Vec::len).collect(),
            neighbors,
            nodes,
            cooling: Cooling::default(),
            settled: false,
            dragging: None,
            physics_scratch: PhysicsScratch::default(),
            view_scratch: ViewScratch::default(),
        }
    }
}
