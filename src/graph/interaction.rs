//! Pointer hover handling and the shared tooltip.

use super::layout::OrbitLayout;
use super::status::StatusStore;
use super::topology::Topology;
use super::types::{format_latency, Entity};
use crate::theme;
use egui::{Color32, Pos2, Vec2};

/// Offset from the pointer to the tooltip's top-left corner
const TOOLTIP_OFFSET: Vec2 = Vec2::new(14.0, 14.0);

#[derive(Debug, Default, Clone, PartialEq)]
pub struct TooltipContent {
    pub title: String,
    pub status_label: String,
    pub status_color: Color32,
    pub latency: Option<String>,
    pub dependencies: Vec<String>,
    pub connections: Vec<String>,
}

/// The single tooltip used for every hover in the session.
///
/// Content buffers are cleared and refilled in place; the egui area id is
/// fixed so the same window is reused across interactions.
#[derive(Debug)]
pub struct Tooltip {
    id: egui::Id,
    /// Node the tooltip describes; `None` while hidden
    target: Option<usize>,
    anchor: Pos2,
    content: TooltipContent,
}

impl Default for Tooltip {
    fn default() -> Self {
        Self::new()
    }
}

impl Tooltip {
    pub fn new() -> Self {
        Self {
            id: egui::Id::new("topology_tooltip"),
            target: None,
            anchor: Pos2::ZERO,
            content: TooltipContent::default(),
        }
    }

    #[cfg(test)]
    pub fn id(&self) -> egui::Id {
        self.id
    }

    #[cfg(test)]
    pub fn is_visible(&self) -> bool {
        self.target.is_some()
    }

    #[cfg(test)]
    pub fn target(&self) -> Option<usize> {
        self.target
    }

    #[cfg(test)]
    pub fn anchor(&self) -> Pos2 {
        self.anchor
    }

    #[cfg(test)]
    pub fn content(&self) -> &TooltipContent {
        &self.content
    }

    /// Fill the tooltip for `node` and show it at `pointer`
    pub fn show_for(
        &mut self,
        node: usize,
        pointer: Pos2,
        entities: &[Entity],
        topology: &Topology,
        store: &StatusStore,
    ) {
        let Some(entity) = entities.get(node) else {
            self.hide();
            return;
        };
        let snapshot = store.get(&entity.key);
        let content = &mut self.content;
        content.title.clear();
        content.title.push_str(&entity.display_name);
        content.status_label.clear();
        content.status_label.push_str(snapshot.state.label());
        content.status_color = snapshot.state.color();
        content.latency = snapshot.latency_ms.map(format_latency);

        // Declared order for dependencies, index order for peers
        content.dependencies.clear();
        content.dependencies.extend(
            entity
                .depends_on
                .iter()
                .filter_map(|key| topology.index_of(key))
                .filter_map(|i| entities.get(i))
                .map(|e| e.display_name.clone()),
        );
        content.connections.clear();
        content.connections.extend(
            topology
                .connections_of(node)
                .into_iter()
                .filter_map(|i| entities.get(i))
                .map(|e| e.display_name.clone()),
        );

        self.target = Some(node);
        self.move_to(pointer);
    }

    pub fn move_to(&mut self, pointer: Pos2) {
        self.anchor = pointer + TOOLTIP_OFFSET;
    }

    pub fn hide(&mut self) {
        self.target = None;
    }

    /// Paint at the current anchor, in screen coordinates
    pub fn paint(&self, ctx: &egui::Context) {
        if self.target.is_none() {
            return;
        }
        let content = &self.content;
        egui::Area::new(self.id)
            .order(egui::Order::Tooltip)
            .fixed_pos(self.anchor)
            .interactable(false)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style())
                    .fill(theme::bg::SURFACE)
                    .show(ui, |ui| {
                        ui.label(
                            egui::RichText::new(&content.title)
                                .strong()
                                .color(theme::text::PRIMARY),
                        );
                        ui.horizontal(|ui| {
                            ui.colored_label(content.status_color, "●");
                            ui.label(&content.status_label);
                            if let Some(ref latency) = content.latency {
                                ui.label(
                                    egui::RichText::new(latency).color(theme::text::SECONDARY),
                                );
                            }
                        });
                        if !content.dependencies.is_empty() {
                            ui.label(
                                egui::RichText::new(format!(
                                    "Depends on: {}",
                                    content.dependencies.join(", ")
                                ))
                                .color(theme::edge::DEPENDENCY),
                            );
                        }
                        if !content.connections.is_empty() {
                            ui.label(
                                egui::RichText::new(format!(
                                    "Connected to: {}",
                                    content.connections.join(", ")
                                ))
                                .color(theme::edge::CONNECTION),
                            );
                        }
                    });
            });
    }
}

/// Pointer transitions derived from successive hover samples
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Enter(usize, Pos2),
    Move(Pos2),
    Leave,
}

/// Tracks which node the pointer is over
#[derive(Debug, Default)]
pub struct InteractionLayer {
    hovered: Option<usize>,
}

impl InteractionLayer {
    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    /// Closest node whose disc contains `pos`
    pub fn hit_test(layout: &OrbitLayout, pos: Pos2) -> Option<usize> {
        layout
            .nodes
            .iter()
            .map(|n| (n.index, n.pos.distance(pos)))
            .filter(|(_, d)| *d <= layout.node_radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Turn a pointer sample (surface coordinates) into hover events
    pub fn pointer(&mut self, layout: Option<&OrbitLayout>, pos: Option<Pos2>) -> Vec<PointerEvent> {
        let hit = match (layout, pos) {
            (Some(layout), Some(p)) => Self::hit_test(layout, p),
            _ => None,
        };
        let mut events = Vec::new();
        match (self.hovered, hit, pos) {
            (Some(old), Some(new), Some(p)) if old == new => events.push(PointerEvent::Move(p)),
            (old, Some(new), Some(p)) => {
                if old.is_some() {
                    events.push(PointerEvent::Leave);
                }
                events.push(PointerEvent::Enter(new, p));
            }
            (Some(_), None, _) => events.push(PointerEvent::Leave),
            _ => {}
        }
        self.hovered = hit;
        events
    }

    /// Apply events to the shared tooltip. `to_screen` maps surface to screen.
    pub fn apply(
        events: &[PointerEvent],
        tooltip: &mut Tooltip,
        to_screen: Vec2,
        entities: &[Entity],
        topology: &Topology,
        store: &StatusStore,
    ) {
        for event in events {
            match *event {
                PointerEvent::Enter(node, p) => {
                    tooltip.show_for(node, p + to_screen, entities, topology, store)
                }
                PointerEvent::Move(p) => tooltip.move_to(p + to_screen),
                PointerEvent::Leave => tooltip.hide(),
            }
        }
    }

    pub fn reset(&mut self) {
        self.hovered = None;
    }
}
