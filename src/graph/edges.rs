//! Edge planning for the three edge classes.
//!
//! Every frame produces a list of [`EdgeDraw`]s: geometry plus a resolved
//! [`EdgeStyle`]. Styles come from the health of the endpoints; an edge
//! only carries a travelling particle when both ends are up.

use super::layout::OrbitLayout;
use super::topology::Topology;
use super::types::HealthState;
use crate::theme;
use egui::{Color32, Pos2, Vec2};
use serde::{Deserialize, Serialize};

/// Points sampled along a curved edge
const CURVE_SEGMENTS: usize = 24;

/// Control point offset, as a fraction of chord length
const CURVE_BOW: f32 = 0.25;

/// Arrowhead length on dependency edges
const ARROW_SIZE: f32 = 9.0;

/// Animation timing parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Full particle trips per second
    pub particle_speed: f32,
    /// Halo pulses per second on down nodes
    pub pulse_speed: f32,
    pub particle_radius: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            particle_speed: 0.4,
            pulse_speed: 0.8,
            particle_radius: 3.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeClass {
    /// Node to the central hub
    Hub,
    /// Directed: dependent to dependency
    Dependency,
    /// Undirected peer link
    Connection,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StrokePattern {
    Solid,
    /// Solid line fading from the style color into `to`
    Gradient { to: Color32 },
    Dashed { dash: f32, gap: f32 },
    Dotted { spacing: f32 },
}

impl StrokePattern {
    #[cfg(test)]
    pub fn is_solid(&self) -> bool {
        matches!(self, StrokePattern::Solid | StrokePattern::Gradient { .. })
    }
}

/// How an edge is stroked for a given health state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeStyle {
    pub pattern: StrokePattern,
    pub color: Color32,
    pub width: f32,
    pub opacity: f32,
    pub particle: bool,
    pub break_mark: bool,
}

impl EdgeStyle {
    fn new(pattern: StrokePattern, color: Color32, opacity: f32) -> Self {
        Self {
            pattern,
            color,
            width: theme::stroke_width::EDGE,
            opacity,
            particle: false,
            break_mark: false,
        }
    }

    fn with_particle(mut self) -> Self {
        self.particle = true;
        self
    }

    fn with_break_mark(mut self) -> Self {
        self.break_mark = true;
        self
    }

    /// Stroke color with opacity applied
    pub fn stroke_color(&self) -> Color32 {
        self.color.gamma_multiply(self.opacity)
    }
}

impl EdgeClass {
    /// Style for an edge whose (combined) endpoint state is `state`.
    pub fn style(self, state: HealthState) -> EdgeStyle {
        match self {
            EdgeClass::Hub => match state {
                HealthState::Up => EdgeStyle::new(
                    StrokePattern::Gradient { to: theme::edge::HUB_END },
                    state.color(),
                    0.9,
                )
                .with_particle(),
                HealthState::Degraded => EdgeStyle::new(
                    StrokePattern::Dashed { dash: 8.0, gap: 6.0 },
                    state.color(),
                    0.75,
                ),
                HealthState::Down => EdgeStyle::new(
                    StrokePattern::Dashed { dash: 6.0, gap: 6.0 },
                    state.color(),
                    0.6,
                )
                .with_break_mark(),
                HealthState::Disabled => {
                    EdgeStyle::new(StrokePattern::Dotted { spacing: 7.0 }, state.color(), 0.35)
                }
                HealthState::Unknown => EdgeStyle::new(
                    StrokePattern::Dashed { dash: 4.0, gap: 8.0 },
                    state.color(),
                    0.45,
                ),
            },
            EdgeClass::Dependency => peer_style(theme::edge::DEPENDENCY, state),
            EdgeClass::Connection => peer_style(theme::edge::CONNECTION, state),
        }
    }
}

fn peer_style(hue: Color32, state: HealthState) -> EdgeStyle {
    match state {
        HealthState::Up => EdgeStyle::new(StrokePattern::Solid, hue, 0.8).with_particle(),
        HealthState::Degraded => {
            EdgeStyle::new(StrokePattern::Dashed { dash: 8.0, gap: 6.0 }, hue, 0.6)
        }
        HealthState::Down | HealthState::Disabled | HealthState::Unknown => {
            EdgeStyle::new(StrokePattern::Dashed { dash: 6.0, gap: 6.0 }, hue, 0.3)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeEnd {
    Hub,
    Node(usize),
}

/// One edge ready to paint, in surface coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeDraw {
    pub class: EdgeClass,
    pub source: EdgeEnd,
    pub target: EdgeEnd,
    /// Polyline from source to target
    pub path: Vec<Pos2>,
    pub style: EdgeStyle,
    pub particle: Option<Pos2>,
    pub break_mark: Option<Pos2>,
    /// Arrowhead triangle at the target end
    pub arrow: Option<[Pos2; 3]>,
}

impl EdgeDraw {
    #[cfg(test)]
    pub fn end(&self) -> Option<Pos2> {
        self.path.last().copied()
    }
}

/// Everything a single frame needs to plan its edges.
///
/// Hub styles are resolved once per node here instead of at every draw site.
pub struct FrameContext<'a> {
    pub time: f64,
    pub layout: &'a OrbitLayout,
    pub topology: &'a Topology,
    pub animation: &'a AnimationConfig,
    hub_styles: Vec<EdgeStyle>,
}

impl<'a> FrameContext<'a> {
    pub fn new(
        time: f64,
        layout: &'a OrbitLayout,
        topology: &'a Topology,
        animation: &'a AnimationConfig,
    ) -> Self {
        let hub_styles = layout
            .nodes
            .iter()
            .map(|n| EdgeClass::Hub.style(n.status))
            .collect();
        Self {
            time,
            layout,
            topology,
            animation,
            hub_styles,
        }
    }

    pub fn state(&self, index: usize) -> HealthState {
        self.layout
            .node(index)
            .map(|n| n.status)
            .unwrap_or_default()
    }

    /// Particle progress in `[0, 1)` for a given phase offset
    fn progress(&self, phase: f32) -> f32 {
        let t = self.time * self.animation.particle_speed as f64 + phase as f64;
        t.rem_euclid(1.0) as f32
    }
}

/// Plans hub, dependency and connection edges for a frame
#[derive(Debug, Default)]
pub struct EdgeRenderer;

impl EdgeRenderer {
    pub fn plan(&self, ctx: &FrameContext<'_>) -> Vec<EdgeDraw> {
        let layout = ctx.layout;
        let mut draws = Vec::with_capacity(
            layout.nodes.len()
                + ctx.topology.dependency_edges().len()
                + ctx.topology.connection_edges().len(),
        );

        for (node, style) in layout.nodes.iter().zip(&ctx.hub_styles) {
            let path = vec![node.pos, layout.center];
            let particle = style
                .particle
                .then(|| node.pos.lerp(layout.center, ctx.progress(node.phase)));
            let break_mark = style
                .break_mark
                .then(|| node.pos.lerp(layout.center, 0.5));
            draws.push(EdgeDraw {
                class: EdgeClass::Hub,
                source: EdgeEnd::Node(node.index),
                target: EdgeEnd::Hub,
                path,
                style: *style,
                particle,
                break_mark,
                arrow: None,
            });
        }

        for &(from, to) in ctx.topology.dependency_edges() {
            let (Some(a), Some(b)) = (layout.node(from), layout.node(to)) else {
                continue;
            };
            let state = ctx.state(from).combine(ctx.state(to));
            let style = EdgeClass::Dependency.style(state);
            let control = curve_control(a.pos, b.pos, CURVE_BOW);
            let phase = (a.phase + 0.33).fract();
            draws.push(EdgeDraw {
                class: EdgeClass::Dependency,
                source: EdgeEnd::Node(from),
                target: EdgeEnd::Node(to),
                path: sample_curve(a.pos, control, b.pos),
                style,
                particle: style
                    .particle
                    .then(|| quadratic_point(a.pos, control, b.pos, ctx.progress(phase))),
                break_mark: None,
                arrow: arrow_head(control, b.pos, layout.node_radius),
            });
        }

        for &(from, to) in ctx.topology.connection_edges() {
            let (Some(a), Some(b)) = (layout.node(from), layout.node(to)) else {
                continue;
            };
            let state = ctx.state(from).combine(ctx.state(to));
            let style = EdgeClass::Connection.style(state);
            // Bow to the other side so a dependency over the same pair stays visible
            let control = curve_control(a.pos, b.pos, -CURVE_BOW);
            let phase = ((a.phase + b.phase) * 0.5 + 0.5).fract();
            draws.push(EdgeDraw {
                class: EdgeClass::Connection,
                source: EdgeEnd::Node(from),
                target: EdgeEnd::Node(to),
                path: sample_curve(a.pos, control, b.pos),
                style,
                particle: style
                    .particle
                    .then(|| quadratic_point(a.pos, control, b.pos, ctx.progress(phase))),
                break_mark: None,
                arrow: None,
            });
        }

        draws
    }
}

/// Control point offset perpendicular to the chord by `bow` times its length
pub fn curve_control(a: Pos2, b: Pos2, bow: f32) -> Pos2 {
    let chord = b - a;
    let length = chord.length();
    let mid = a.lerp(b, 0.5);
    if length < f32::EPSILON {
        return mid;
    }
    let perp = Vec2::new(-chord.y, chord.x) / length;
    mid + perp * (bow * length)
}

pub fn quadratic_point(a: Pos2, control: Pos2, b: Pos2, t: f32) -> Pos2 {
    let u = 1.0 - t;
    let v = a.to_vec2() * (u * u) + control.to_vec2() * (2.0 * u * t) + b.to_vec2() * (t * t);
    v.to_pos2()
}

fn sample_curve(a: Pos2, control: Pos2, b: Pos2) -> Vec<Pos2> {
    let mut points: Vec<Pos2> = (0..CURVE_SEGMENTS)
        .map(|k| quadratic_point(a, control, b, k as f32 / CURVE_SEGMENTS as f32))
        .collect();
    points.push(b);
    points
}

fn arrow_head(control: Pos2, tip_node: Pos2, node_radius: f32) -> Option<[Pos2; 3]> {
    let tangent = tip_node - control;
    if tangent.length() < f32::EPSILON {
        return None;
    }
    let dir = tangent.normalized();
    let tip = tip_node - dir * (node_radius + 2.0);
    let perp = Vec2::new(-dir.y, dir.x);
    Some([
        tip,
        tip - dir * ARROW_SIZE + perp * ARROW_SIZE * 0.5,
        tip - dir * ARROW_SIZE - perp * ARROW_SIZE * 0.5,
    ])
}
