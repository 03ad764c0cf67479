//! Switching between the list view and the topology view.

use super::engine::TopologyEngine;
use super::scheduler::FrameHost;
use egui::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    List,
    Graph,
}

impl View {
    pub fn label(&self) -> &'static str {
        match self {
            View::List => "List",
            View::Graph => "Topology",
        }
    }
}

/// Owns the current view and drives the engine lifecycle on switches
#[derive(Debug)]
pub struct ViewController {
    current: View,
}

impl Default for ViewController {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewController {
    /// Starts in the list view; the graph view is entered through `switch_to`
    pub fn new() -> Self {
        Self {
            current: View::List,
        }
    }

    pub fn current(&self) -> View {
        self.current
    }

    /// Switch views. Returns `false` when `view` is already current.
    pub fn switch_to(
        &mut self,
        view: View,
        engine: &mut TopologyEngine,
        host: &mut dyn FrameHost,
        viewport: Vec2,
    ) -> bool {
        if view == self.current {
            return false;
        }
        tracing::info!("Switching view: {:?} -> {:?}", self.current, view);
        match view {
            View::Graph => engine.activate(viewport, host),
            View::List => engine.deactivate(host),
        }
        self.current = view;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::edges::AnimationConfig;
    use crate::graph::layout::LayoutConfig;
    use crate::graph::scheduler::testing::ManualHost;
    use crate::graph::types::Entity;

    fn setup() -> (ViewController, TopologyEngine, ManualHost) {
        let mut host = ManualHost::default();
        let mut engine = TopologyEngine::new(LayoutConfig::default(), AnimationConfig::default());
        engine.set_entities(
            vec![Entity::new("a", "A"), Entity::new("b", "B").with_depends_on("a")],
            &mut host,
        );
        (ViewController::new(), engine, host)
    }

    #[test]
    fn switch_to_graph_activates() {
        let (mut views, mut engine, mut host) = setup();
        assert!(views.switch_to(View::Graph, &mut engine, &mut host, Vec2::new(800.0, 600.0)));
        assert_eq!(views.current(), View::Graph);
        assert!(engine.is_active());
        assert!(engine.scheduler().is_running());
        assert_eq!(host.outstanding.len(), 1);
    }

    #[test]
    fn repeated_switch_is_noop() {
        let (mut views, mut engine, mut host) = setup();
        let viewport = Vec2::new(800.0, 600.0);
        views.switch_to(View::Graph, &mut engine, &mut host, viewport);
        let issued = host.issued;
        let passes = engine.layout_passes();

        assert!(!views.switch_to(View::Graph, &mut engine, &mut host, viewport));
        assert_eq!(host.issued, issued);
        assert_eq!(host.outstanding.len(), 1);
        assert_eq!(engine.layout_passes(), passes);
    }

    #[test]
    fn switch_back_to_list_stops_animation() {
        let (mut views, mut engine, mut host) = setup();
        let viewport = Vec2::new(800.0, 600.0);
        views.switch_to(View::Graph, &mut engine, &mut host, viewport);
        assert!(views.switch_to(View::List, &mut engine, &mut host, viewport));
        assert!(!engine.is_active());
        assert!(!engine.scheduler().is_running());
        assert!(host.outstanding.is_empty());
        assert!(engine.layout().is_none());

        assert!(!views.switch_to(View::List, &mut engine, &mut host, viewport));
        assert!(host.outstanding.is_empty());
    }
}
