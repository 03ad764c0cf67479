//! The topology engine: owns layout, health, animation and tooltip state
//! for one session and exposes the view lifecycle (`activate`,
//! `deactivate`, `destroy`).

use super::edges::{AnimationConfig, EdgeDraw, EdgeRenderer, FrameContext};
use super::interaction::{InteractionLayer, Tooltip};
use super::layout::{LayoutConfig, LayoutEngine, OrbitLayout};
use super::scheduler::{FrameHost, FrameRequest, RenderScheduler};
use super::status::StatusStore;
use super::topology::Topology;
use super::types::{Entity, HealthState, RawHealthMap};
use egui::{Color32, Pos2, Vec2};
use std::collections::HashSet;
use std::f32::consts::TAU;

/// Viewport changes smaller than this don't trigger a new layout
const RESIZE_TOLERANCE: f32 = 0.5;

/// Whether the host can draw at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceStatus {
    Ready,
    /// Permanent for the session; every render call becomes a no-op
    Unsupported,
}

/// A node as drawn in one frame
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDraw {
    pub index: usize,
    pub pos: Pos2,
    pub radius: f32,
    pub color: Color32,
    /// Pulsing halo (radius, alpha) on down nodes
    pub halo: Option<(f32, f32)>,
}

/// Everything painted in one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FramePlan {
    pub time: f64,
    pub frame: u64,
    pub edges: Vec<EdgeDraw>,
    pub nodes: Vec<NodeDraw>,
}

pub struct TopologyEngine {
    entities: Vec<Entity>,
    topology: Topology,
    store: StatusStore,
    layout_engine: LayoutEngine,
    animation: AnimationConfig,
    layout: Option<OrbitLayout>,
    viewport: Option<Vec2>,
    scheduler: RenderScheduler,
    edges: EdgeRenderer,
    interaction: InteractionLayer,
    tooltip: Tooltip,
    surface: SurfaceStatus,
    active: bool,
    last_plan: Option<FramePlan>,
    layout_passes: u64,
}

impl TopologyEngine {
    pub fn new(layout: LayoutConfig, animation: AnimationConfig) -> Self {
        Self {
            entities: Vec::new(),
            topology: Topology::default(),
            store: StatusStore::new(),
            layout_engine: LayoutEngine::new(layout),
            animation,
            layout: None,
            viewport: None,
            scheduler: RenderScheduler::new(),
            edges: EdgeRenderer,
            interaction: InteractionLayer::default(),
            tooltip: Tooltip::new(),
            surface: SurfaceStatus::Ready,
            active: false,
            last_plan: None,
            layout_passes: 0,
        }
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn store(&self) -> &StatusStore {
        &self.store
    }

    pub fn layout(&self) -> Option<&OrbitLayout> {
        self.layout.as_ref()
    }

    pub fn scheduler(&self) -> &RenderScheduler {
        &self.scheduler
    }

    pub fn tooltip(&self) -> &Tooltip {
        &self.tooltip
    }

    pub fn last_plan(&self) -> Option<&FramePlan> {
        self.last_plan.as_ref()
    }

    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn surface(&self) -> SurfaceStatus {
        self.surface
    }

    #[cfg(test)]
    pub fn layout_passes(&self) -> u64 {
        self.layout_passes
    }

    pub fn animation(&self) -> &AnimationConfig {
        &self.animation
    }

    /// Mark the drawing surface as unavailable for the rest of the session.
    pub fn mark_surface_unsupported(&mut self, host: &mut dyn FrameHost) {
        if self.surface == SurfaceStatus::Unsupported {
            return;
        }
        tracing::warn!("Drawing surface unavailable; topology view disabled for this session");
        self.scheduler.stop(host);
        self.surface = SurfaceStatus::Unsupported;
        self.active = false;
        self.layout = None;
        self.last_plan = None;
        self.tooltip.hide();
    }

    /// Replace the entity list. Relayouts only when the list actually changed.
    pub fn set_entities(&mut self, entities: Vec<Entity>, host: &mut dyn FrameHost) {
        let entities = dedupe_keys(entities);
        if entities == self.entities {
            return;
        }
        tracing::info!("Entity list updated: {} entities", entities.len());
        self.topology = Topology::build(&entities);
        self.entities = entities;

        if !self.active {
            self.layout = None;
            self.last_plan = None;
            return;
        }
        if self.entities.is_empty() {
            self.scheduler.stop(host);
            self.clear_surface();
            return;
        }
        self.relayout();
        if !self.scheduler.is_running() {
            self.scheduler.start(host, self.entities.len());
        }
    }

    /// Merge a health map. Recolors existing positions; never moves nodes.
    pub fn apply_health(&mut self, health: &RawHealthMap) {
        self.store.merge(health);
        if let Some(layout) = self.layout.as_mut() {
            layout.recolor(&self.store);
        }
    }

    /// Graph view became visible: lay out once, then start animating.
    pub fn activate(&mut self, viewport: Vec2, host: &mut dyn FrameHost) {
        if self.surface == SurfaceStatus::Unsupported {
            return;
        }
        self.active = true;
        self.viewport = Some(viewport);
        if self.entities.is_empty() {
            self.scheduler.stop(host);
            self.clear_surface();
            return;
        }
        self.relayout();
        self.scheduler.start(host, self.entities.len());
    }

    /// Graph view hidden: stop animating and drop per-view state.
    pub fn deactivate(&mut self, host: &mut dyn FrameHost) {
        self.scheduler.stop(host);
        self.active = false;
        self.clear_surface();
    }

    /// Tear down for good at session end
    pub fn destroy(&mut self, host: &mut dyn FrameHost) {
        self.deactivate(host);
        self.entities.clear();
        self.topology = Topology::default();
        self.store = StatusStore::new();
        self.viewport = None;
    }

    /// Viewport size changed while active
    pub fn resize(&mut self, viewport: Vec2) {
        if !self.active {
            return;
        }
        let changed = self
            .viewport
            .map_or(true, |v| {
                (v.x - viewport.x).abs() > RESIZE_TOLERANCE
                    || (v.y - viewport.y).abs() > RESIZE_TOLERANCE
            });
        if changed {
            self.viewport = Some(viewport);
            if !self.entities.is_empty() {
                self.relayout();
            }
        }
    }

    /// Handle a delivered frame request. Returns the fresh plan when the
    /// request belongs to the running chain.
    pub fn frame(
        &mut self,
        host: &mut dyn FrameHost,
        request: FrameRequest,
        time: f64,
    ) -> Option<&FramePlan> {
        if self.surface == SurfaceStatus::Unsupported {
            return None;
        }
        let tick = self.scheduler.begin_frame(request, time)?;
        let Some(layout) = self.layout.as_ref() else {
            // Positions are committed before the first tick; nothing to draw otherwise
            self.scheduler.stop(host);
            return None;
        };

        let ctx = FrameContext::new(tick.time, layout, &self.topology, &self.animation);
        let edges = self.edges.plan(&ctx);
        let nodes = plan_nodes(layout, &self.animation, tick.time);
        self.last_plan = Some(FramePlan {
            time: tick.time,
            frame: tick.frame,
            edges,
            nodes,
        });

        self.scheduler.end_frame(host);
        self.last_plan.as_ref()
    }

    /// Feed a pointer sample in surface coordinates; `to_screen` maps the
    /// surface origin to screen space for the tooltip.
    pub fn pointer(&mut self, pos: Option<Pos2>, to_screen: Vec2) {
        let events = self.interaction.pointer(self.layout.as_ref(), pos);
        InteractionLayer::apply(
            &events,
            &mut self.tooltip,
            to_screen,
            &self.entities,
            &self.topology,
            &self.store,
        );
    }

    pub fn hovered(&self) -> Option<usize> {
        self.interaction.hovered()
    }

    fn relayout(&mut self) {
        let viewport = self.viewport.unwrap_or(Vec2::new(800.0, 600.0));
        self.layout = Some(self.layout_engine.compute(&self.entities, &self.store, viewport));
        self.layout_passes += 1;
        tracing::debug!("Layout pass {} at {:.0}x{:.0}", self.layout_passes, viewport.x, viewport.y);
        // Shared surface state never carries over between passes
        self.last_plan = None;
        self.tooltip.hide();
        self.interaction.reset();
    }

    fn clear_surface(&mut self) {
        self.layout = None;
        self.last_plan = None;
        self.tooltip.hide();
        self.interaction.reset();
    }
}

fn plan_nodes(layout: &OrbitLayout, animation: &AnimationConfig, time: f64) -> Vec<NodeDraw> {
    layout
        .nodes
        .iter()
        .map(|node| {
            let halo = (node.status == HealthState::Down).then(|| {
                let wave = ((time * animation.pulse_speed as f64 + node.phase as f64) as f32 * TAU).sin();
                let grow = 0.5 + 0.5 * wave;
                (layout.node_radius + 4.0 + 6.0 * grow, 0.45 - 0.3 * grow)
            });
            NodeDraw {
                index: node.index,
                pos: node.pos,
                radius: layout.node_radius,
                color: node.status.color(),
                halo,
            }
        })
        .collect()
}

/// Keep the first entity for each key
fn dedupe_keys(entities: Vec<Entity>) -> Vec<Entity> {
    let mut seen = HashSet::new();
    let before = entities.len();
    let unique: Vec<Entity> = entities
        .into_iter()
        .filter(|e| seen.insert(e.key.clone()))
        .collect();
    if unique.len() != before {
        tracing::warn!("Dropped {} entities with duplicate keys", before - unique.len());
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::edges::EdgeClass;
    use crate::graph::scheduler::testing::ManualHost;
    use crate::graph::types::RawHealth;

    fn engine() -> TopologyEngine {
        TopologyEngine::new(LayoutConfig::default(), AnimationConfig::default())
    }

    fn sample() -> Vec<Entity> {
        vec![
            Entity::new("a", "Alpha"),
            Entity::new("b", "Beta").with_depends_on("a"),
            Entity::new("c", "Gamma").with_connected_to("a,b"),
        ]
    }

    fn viewport() -> Vec2 {
        Vec2::new(1024.0, 768.0)
    }

    /// Deliver every outstanding request once
    fn pump(engine: &mut TopologyEngine, host: &mut ManualHost, time: f64) -> usize {
        let mut drawn = 0;
        for request in host.drain() {
            if engine.frame(host, request, time).is_some() {
                drawn += 1;
            }
        }
        drawn
    }

    #[test]
    fn activation_lays_out_before_first_frame() {
        let mut host = ManualHost::default();
        let mut engine = engine();
        engine.set_entities(sample(), &mut host);
        assert!(engine.layout().is_none());
        assert!(host.outstanding.is_empty());

        engine.activate(viewport(), &mut host);
        assert!(engine.layout().is_some());
        assert!(engine.scheduler().is_running());
        assert_eq!(pump(&mut engine, &mut host, 0.1), 1);

        let plan = engine.last_plan().unwrap();
        assert_eq!(plan.nodes.len(), 3);
        assert_eq!(plan.edges.iter().filter(|e| e.class == EdgeClass::Hub).count(), 3);
        assert_eq!(plan.edges.iter().filter(|e| e.class == EdgeClass::Dependency).count(), 1);
        assert_eq!(plan.edges.iter().filter(|e| e.class == EdgeClass::Connection).count(), 2);
    }

    #[test]
    fn empty_list_keeps_scheduler_idle() {
        let mut host = ManualHost::default();
        let mut engine = engine();
        engine.activate(viewport(), &mut host);
        assert!(!engine.scheduler().is_running());
        assert!(host.outstanding.is_empty());

        engine.set_entities(sample(), &mut host);
        assert!(engine.scheduler().is_running());

        engine.set_entities(Vec::new(), &mut host);
        assert!(!engine.scheduler().is_running());
        assert!(host.outstanding.is_empty());
        assert!(engine.layout().is_none());
    }

    #[test]
    fn reactivation_gives_identical_layout() {
        let mut host = ManualHost::default();
        let mut engine = engine();
        engine.set_entities(sample(), &mut host);
        engine.activate(viewport(), &mut host);
        let first = engine.layout().cloned().unwrap();

        engine.deactivate(&mut host);
        assert!(host.outstanding.is_empty());
        assert_eq!(pump(&mut engine, &mut host, 1.0), 0);

        engine.activate(viewport(), &mut host);
        assert_eq!(engine.layout().cloned().unwrap(), first);
        assert_eq!(host.outstanding.len(), 1);
    }

    #[test]
    fn health_change_recolors_without_moving() {
        let mut host = ManualHost::default();
        let mut engine = engine();
        engine.set_entities(sample(), &mut host);
        engine.activate(viewport(), &mut host);
        let passes = engine.layout_passes();
        let before: Vec<Pos2> = engine.layout().unwrap().nodes.iter().map(|n| n.pos).collect();

        let mut health = RawHealthMap::new();
        health.insert("a".into(), RawHealth { ok: false, ..Default::default() });
        engine.apply_health(&health);

        let layout = engine.layout().unwrap();
        let after: Vec<Pos2> = layout.nodes.iter().map(|n| n.pos).collect();
        assert_eq!(before, after);
        assert_eq!(layout.nodes[0].status, HealthState::Down);
        assert_eq!(engine.layout_passes(), passes);

        pump(&mut engine, &mut host, 0.3);
        let plan = engine.last_plan().unwrap();
        assert!(plan.nodes[0].halo.is_some());
        assert!(plan.nodes[1].halo.is_none());
    }

    #[test]
    fn unchanged_entity_list_does_not_relayout() {
        let mut host = ManualHost::default();
        let mut engine = engine();
        engine.set_entities(sample(), &mut host);
        engine.activate(viewport(), &mut host);
        let passes = engine.layout_passes();
        engine.set_entities(sample(), &mut host);
        assert_eq!(engine.layout_passes(), passes);

        let mut grown = sample();
        grown.push(Entity::new("d", "Delta"));
        engine.set_entities(grown, &mut host);
        assert_eq!(engine.layout_passes(), passes + 1);
        assert_eq!(host.outstanding.len(), 1);
    }

    #[test]
    fn resize_relayouts_only_on_real_change() {
        let mut host = ManualHost::default();
        let mut engine = engine();
        engine.set_entities(sample(), &mut host);
        engine.activate(viewport(), &mut host);
        let passes = engine.layout_passes();
        engine.resize(viewport() + Vec2::splat(0.2));
        assert_eq!(engine.layout_passes(), passes);
        engine.resize(Vec2::new(600.0, 400.0));
        assert_eq!(engine.layout_passes(), passes + 1);
    }

    #[test]
    fn new_layout_pass_hides_tooltip() {
        let mut host = ManualHost::default();
        let mut engine = engine();
        engine.set_entities(sample(), &mut host);
        engine.activate(viewport(), &mut host);
        let node = engine.layout().unwrap().nodes[1].pos;
        engine.pointer(Some(node), Vec2::ZERO);
        assert_eq!(engine.tooltip().target(), Some(1));

        engine.resize(Vec2::new(640.0, 480.0));
        assert!(!engine.tooltip().is_visible());
        assert_eq!(engine.hovered(), None);
    }

    #[test]
    fn unsupported_surface_is_permanent_noop() {
        let mut host = ManualHost::default();
        let mut engine = engine();
        engine.set_entities(sample(), &mut host);
        engine.activate(viewport(), &mut host);
        engine.mark_surface_unsupported(&mut host);
        assert!(host.outstanding.is_empty());

        engine.activate(viewport(), &mut host);
        assert!(!engine.is_active());
        assert!(engine.layout().is_none());
        assert!(host.outstanding.is_empty());
    }

    #[test]
    fn duplicate_keys_keep_first() {
        let mut host = ManualHost::default();
        let mut engine = engine();
        engine.set_entities(
            vec![Entity::new("a", "First"), Entity::new("a", "Second")],
            &mut host,
        );
        assert_eq!(engine.entities().len(), 1);
        assert_eq!(engine.entities()[0].display_name, "First");
    }

    #[test]
    fn destroy_leaves_nothing_outstanding() {
        let mut host = ManualHost::default();
        let mut engine = engine();
        engine.set_entities(sample(), &mut host);
        engine.activate(viewport(), &mut host);
        pump(&mut engine, &mut host, 0.0);
        engine.destroy(&mut host);
        assert!(host.outstanding.is_empty());
        assert!(engine.entities().is_empty());
        assert!(!engine.is_active());
    }
}
