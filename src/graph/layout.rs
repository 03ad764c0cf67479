//! Orbital layout: nodes on an ellipse around a fixed central hub.
//!
//! - Node 0 sits at the top, the rest follow clockwise
//! - The orbit grows with node count so labels don't collide
//! - Past a crowding threshold every other node is pushed outward (zig-zag)
//! - The surface grows with the orbit so nothing is clipped
//!
//! Layout is a pure function of the entity order and the viewport size, so
//! two passes over identical inputs give identical positions.

use super::status::StatusStore;
use super::types::{Entity, NodePosition};
use egui::{Pos2, Vec2};
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, TAU};

/// Golden-ratio conjugate, used to stagger animation phases
const PHASE_STAGGER: f32 = 0.618_034;

/// Geometry constants for the orbital layout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Orbit never shrinks below this
    pub min_radius: f32,
    /// Distance reserved around the hub before the ring starts
    pub hub_clearance: f32,
    /// Radius of the hub disc
    pub hub_radius: f32,
    pub node_diameter: f32,
    /// Gap between neighbouring nodes along the ring
    pub node_padding: f32,
    /// Above this many nodes the zig-zag offset kicks in
    pub crowding_threshold: usize,
    /// Outward offset applied to odd nodes when crowded
    pub zigzag_delta: f32,
    /// Vertical room for the label under a node
    pub label_allowance: f32,
    /// Outer margin of the surface
    pub margin: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            min_radius: 140.0,
            hub_clearance: 70.0,
            hub_radius: 30.0,
            node_diameter: 48.0,
            node_padding: 40.0,
            crowding_threshold: 12,
            zigzag_delta: 42.0,
            label_allowance: 26.0,
            margin: 24.0,
        }
    }
}

impl LayoutConfig {
    pub fn node_radius(&self) -> f32 {
        self.node_diameter * 0.5
    }
}

/// Result of one layout pass
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitLayout {
    /// Hub anchor
    pub center: Pos2,
    /// Unclamped orbit radius for this node count
    pub base_radius: f32,
    pub radius_x: f32,
    pub radius_y: f32,
    /// Zig-zag offset in effect (0 when not crowded)
    pub zigzag: f32,
    /// Size of the drawing surface; at least the viewport
    pub surface: Vec2,
    pub node_radius: f32,
    pub hub_radius: f32,
    /// One entry per entity, in entity order
    pub nodes: Vec<NodePosition>,
}

impl OrbitLayout {
    #[cfg(test)]
    pub fn position_of(&self, key: &str) -> Option<Pos2> {
        self.nodes.iter().find(|n| n.key == key).map(|n| n.pos)
    }

    pub fn node(&self, index: usize) -> Option<&NodePosition> {
        self.nodes.get(index)
    }

    /// Re-read node status from the store without moving anything
    pub fn recolor(&mut self, store: &StatusStore) {
        for node in &mut self.nodes {
            node.status = store.state(&node.key);
        }
    }
}

/// Computes node positions from an entity list and a viewport size
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    pub config: LayoutConfig,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// Orbit radius needed to fit `count` nodes around the hub.
    pub fn base_radius(&self, count: usize) -> f32 {
        let c = &self.config;
        let circumference = count as f32 * (c.node_diameter + c.node_padding);
        (c.hub_clearance + circumference / TAU).max(c.min_radius)
    }

    pub fn compute(&self, entities: &[Entity], store: &StatusStore, viewport: Vec2) -> OrbitLayout {
        let c = &self.config;
        let count = entities.len();
        let node_radius = c.node_radius();
        let base_radius = self.base_radius(count);
        let zigzag = if count > c.crowding_threshold {
            c.zigzag_delta
        } else {
            0.0
        };

        // Horizontal room is fixed by the viewport; vertical room grows with the surface.
        // The zig-zag offset widens the surface instead of pulling the ring in.
        let available_x = viewport.x * 0.5 - node_radius - c.margin;
        let radius_x = base_radius.min(available_x).max(c.min_radius);
        let radius_y = base_radius;

        let surface = Vec2::new(
            viewport.x.max(2.0 * (radius_x + zigzag + node_radius + c.margin)),
            viewport
                .y
                .max(2.0 * (radius_y + zigzag + node_radius + c.label_allowance + c.margin)),
        );
        let center = Pos2::new(surface.x * 0.5, surface.y * 0.5);

        let nodes: Vec<NodePosition> = entities
            .iter()
            .enumerate()
            .map(|(i, entity)| {
                let angle = TAU * i as f32 / count as f32 - FRAC_PI_2;
                let offset = if zigzag > 0.0 && i % 2 == 1 { zigzag } else { 0.0 };
                let pos = Pos2::new(
                    center.x + (radius_x + offset) * angle.cos(),
                    center.y + (radius_y + offset) * angle.sin(),
                );
                NodePosition {
                    key: entity.key.clone(),
                    index: i,
                    pos,
                    status: store.state(&entity.key),
                    phase: (i as f32 * PHASE_STAGGER).fract(),
                }
            })
            .collect();

        tracing::debug!(
            "Layout pass: {} nodes, radius {:.1}x{:.1}, surface {:.0}x{:.0}",
            count,
            radius_x,
            radius_y,
            surface.x,
            surface.y
        );

        OrbitLayout {
            center,
            base_radius,
            radius_x,
            radius_y,
            zigzag,
            surface,
            node_radius,
            hub_radius: c.hub_radius,
            nodes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entities(n: usize) -> Vec<Entity> {
        (0..n)
            .map(|i| Entity::new(format!("svc-{}", i), format!("Service {}", i)))
            .collect()
    }

    const COUNTS: [usize; 4] = [1, 5, 20, 50];

    #[test]
    fn test_radius_monotonic_and_floored() {
        let engine = LayoutEngine::default();
        let store = StatusStore::new();
        let viewport = Vec2::new(1200.0, 800.0);
        let mut last_base = 0.0;
        let mut last_x = 0.0;
        for n in COUNTS {
            let layout = engine.compute(&entities(n), &store, viewport);
            assert!(layout.base_radius >= engine.config.min_radius);
            assert!(layout.radius_x >= engine.config.min_radius);
            assert!(layout.radius_y >= engine.config.min_radius);
            assert!(layout.base_radius >= last_base, "n={}", n);
            assert!(layout.radius_x >= last_x, "n={}", n);
            last_base = layout.base_radius;
            last_x = layout.radius_x;
        }
    }

    #[test]
    fn test_nodes_inside_surface() {
        let engine = LayoutEngine::default();
        let store = StatusStore::new();
        for viewport in [Vec2::new(1200.0, 800.0), Vec2::new(320.0, 240.0)] {
            for n in COUNTS {
                let layout = engine.compute(&entities(n), &store, viewport);
                let r = layout.node_radius;
                assert!(layout.surface.x >= viewport.x && layout.surface.y >= viewport.y);
                for node in &layout.nodes {
                    assert!(node.pos.x >= r && node.pos.x <= layout.surface.x - r, "n={} {:?}", n, node.pos);
                    assert!(node.pos.y >= r && node.pos.y <= layout.surface.y - r, "n={} {:?}", n, node.pos);
                }
            }
        }
    }

    #[test]
    fn test_horizontal_radius_never_shrinks_on_small_viewport() {
        let engine = LayoutEngine::default();
        let store = StatusStore::new();
        let viewport = Vec2::new(600.0, 600.0);
        let mut last_x = 0.0;
        for n in 1..=30 {
            let layout = engine.compute(&entities(n), &store, viewport);
            assert!(
                layout.radius_x >= last_x,
                "radius_x dropped at n={}: {} -> {} (zigzag {})",
                n,
                last_x,
                layout.radius_x,
                layout.zigzag
            );
            last_x = layout.radius_x;
            // Crowded rings widen the surface rather than shrinking the orbit
            let r = layout.node_radius;
            for node in &layout.nodes {
                assert!(node.pos.x >= r && node.pos.x <= layout.surface.x - r, "n={}", n);
            }
        }
    }

    #[test]
    fn test_labels_fit_below_bottom_node() {
        let engine = LayoutEngine::default();
        let store = StatusStore::new();
        let label_allowance = engine.config.label_allowance;
        for viewport in [Vec2::new(1200.0, 800.0), Vec2::new(320.0, 240.0)] {
            for n in COUNTS {
                let layout = engine.compute(&entities(n), &store, viewport);
                let bottom = layout
                    .nodes
                    .iter()
                    .map(|node| node.pos.y)
                    .fold(f32::MIN, f32::max);
                assert!(
                    bottom + layout.node_radius + label_allowance <= layout.surface.y + 1e-3,
                    "n={} bottom={} surface={}",
                    n,
                    bottom,
                    layout.surface.y
                );
            }
        }
    }

    #[test]
    fn test_first_node_at_top_then_clockwise() {
        let engine = LayoutEngine::default();
        let layout = engine.compute(&entities(4), &StatusStore::new(), Vec2::new(1000.0, 800.0));
        let c = layout.center;
        let top = layout.nodes[0].pos;
        assert!((top.x - c.x).abs() < 1e-3);
        assert!(top.y < c.y);
        // Screen y points down, so clockwise from the top goes right
        assert!(layout.nodes[1].pos.x > c.x);
        assert!(layout.nodes[2].pos.y > c.y);
        assert!(layout.nodes[3].pos.x < c.x);
    }

    #[test]
    fn test_zigzag_only_when_crowded() {
        let engine = LayoutEngine::default();
        let store = StatusStore::new();
        let viewport = Vec2::new(4000.0, 4000.0);
        let sparse = engine.compute(&entities(engine.config.crowding_threshold), &store, viewport);
        assert_eq!(sparse.zigzag, 0.0);

        let crowded = engine.compute(&entities(20), &store, viewport);
        assert_eq!(crowded.zigzag, engine.config.zigzag_delta);
        let dist = |i: usize| crowded.nodes[i].pos.distance(crowded.center);
        assert!(dist(1) > dist(0) + engine.config.zigzag_delta * 0.5);
    }

    #[test]
    fn test_layout_is_deterministic() {
        let engine = LayoutEngine::default();
        let store = StatusStore::new();
        let viewport = Vec2::new(900.0, 700.0);
        let list = entities(17);
        let a = engine.compute(&list, &store, viewport);
        let b = engine.compute(&list, &store, viewport);
        assert_eq!(a, b);
    }

    #[test]
    fn test_phases_are_staggered() {
        let engine = LayoutEngine::default();
        let layout = engine.compute(&entities(6), &StatusStore::new(), Vec2::new(800.0, 600.0));
        for pair in layout.nodes.windows(2) {
            assert!((pair[0].phase - pair[1].phase).abs() > 0.1);
            assert!((0.0..1.0).contains(&pair[1].phase));
        }
    }
}
