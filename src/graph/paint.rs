//! Paints a frame plan onto an egui painter.

use super::edges::{EdgeDraw, StrokePattern};
use super::engine::{FramePlan, TopologyEngine};
use super::layout::OrbitLayout;
use super::types::Entity;
use crate::theme;
use egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Shape, Stroke, Vec2};

/// Sub-segments used to fake a gradient along a straight edge
const GRADIENT_STEPS: usize = 12;

/// Paint the whole topology surface. `origin` is the surface's top-left in
/// screen space.
pub fn paint_surface(
    ui: &egui::Ui,
    painter: &Painter,
    origin: Vec2,
    engine: &TopologyEngine,
    show_labels: bool,
) {
    painter.rect_filled(painter.clip_rect(), 0.0, theme::bg::GRAPH);

    let Some(layout) = engine.layout() else {
        if engine.entities().is_empty() {
            painter.text(
                painter.clip_rect().center(),
                Align2::CENTER_CENTER,
                "No services configured",
                FontId::proportional(20.0),
                theme::text::MUTED,
            );
        }
        return;
    };

    if let Some(plan) = engine.last_plan() {
        for edge in &plan.edges {
            paint_edge(painter, origin, edge, engine.animation().particle_radius);
        }
    }

    paint_hub(painter, origin, layout);
    paint_nodes(ui, painter, origin, engine, layout, engine.last_plan(), show_labels);
}

fn paint_edge(painter: &Painter, origin: Vec2, edge: &EdgeDraw, particle_radius: f32) {
    let points: Vec<Pos2> = edge.path.iter().map(|p| *p + origin).collect();
    if points.len() < 2 {
        return;
    }
    let style = &edge.style;
    let color = style.stroke_color();
    let stroke = Stroke::new(style.width, color);

    match style.pattern {
        StrokePattern::Solid => {
            painter.add(Shape::line(points, stroke));
        }
        StrokePattern::Gradient { to } => {
            let to = to.gamma_multiply(style.opacity);
            let (start, end) = (points[0], points[points.len() - 1]);
            for k in 0..GRADIENT_STEPS {
                let t0 = k as f32 / GRADIENT_STEPS as f32;
                let t1 = (k + 1) as f32 / GRADIENT_STEPS as f32;
                let c = theme::lerp_color(color, to, (t0 + t1) * 0.5);
                painter.line_segment([start.lerp(end, t0), start.lerp(end, t1)], Stroke::new(style.width, c));
            }
        }
        StrokePattern::Dashed { dash, gap } => {
            painter.extend(Shape::dashed_line(&points, stroke, dash, gap));
        }
        StrokePattern::Dotted { spacing } => {
            painter.extend(Shape::dotted_line(&points, color, spacing, style.width * 0.6));
        }
    }

    if let Some(arrow) = edge.arrow {
        painter.add(Shape::convex_polygon(
            arrow.iter().map(|p| *p + origin).collect(),
            color,
            Stroke::NONE,
        ));
    }

    if let Some(p) = edge.particle {
        let p = p + origin;
        painter.circle_filled(p, particle_radius * 2.2, style.color.gamma_multiply(0.25));
        painter.circle_filled(p, particle_radius, theme::edge::PARTICLE);
    }

    if let Some(mid) = edge.break_mark {
        let mid = mid + origin;
        let s = 6.0;
        let mark = Stroke::new(theme::stroke_width::BREAK_MARK, theme::edge::BREAK_MARK);
        painter.line_segment([mid + Vec2::new(-s, -s), mid + Vec2::new(s, s)], mark);
        painter.line_segment([mid + Vec2::new(-s, s), mid + Vec2::new(s, -s)], mark);
    }
}

fn paint_hub(painter: &Painter, origin: Vec2, layout: &OrbitLayout) {
    let center = layout.center + origin;
    painter.circle_filled(center, layout.hub_radius, theme::bg::HUB);
    painter.circle_stroke(center, layout.hub_radius, Stroke::new(2.0, theme::edge::HUB_END));
    painter.text(
        center,
        Align2::CENTER_CENTER,
        "HUB",
        FontId::proportional(12.0),
        theme::text::SECONDARY,
    );
}

fn paint_nodes(
    ui: &egui::Ui,
    painter: &Painter,
    origin: Vec2,
    engine: &TopologyEngine,
    layout: &OrbitLayout,
    plan: Option<&FramePlan>,
    show_labels: bool,
) {
    let hovered = engine.hovered();
    for node in &layout.nodes {
        let Some(entity) = engine.entities().get(node.index) else {
            continue;
        };
        let pos = node.pos + origin;
        let radius = layout.node_radius;
        let color = node.status.color();

        if let Some((halo_radius, alpha)) = plan
            .and_then(|p| p.nodes.get(node.index))
            .and_then(|n| n.halo)
        {
            painter.circle_filled(pos, halo_radius, color.gamma_multiply(alpha));
        }

        painter.circle_filled(pos, radius, theme::bg::SURFACE);
        paint_node_face(ui, painter, pos, radius, entity);

        let is_hovered = hovered == Some(node.index);
        let (border, width) = if is_hovered {
            (theme::border::HOVER, theme::stroke_width::NODE_HOVER)
        } else {
            (color, theme::stroke_width::NODE)
        };
        painter.circle_stroke(pos, radius, Stroke::new(width, border));

        if show_labels {
            painter.text(
                pos + Vec2::new(0.0, radius + 4.0),
                Align2::CENTER_TOP,
                truncate(&entity.display_name, 22),
                FontId::proportional(12.0),
                theme::text::PRIMARY,
            );
        }
    }
}

fn paint_node_face(ui: &egui::Ui, painter: &Painter, pos: Pos2, radius: f32, entity: &Entity) {
    if let Some(uri) = entity.icon_ref.as_deref().and_then(icon_uri) {
        let side = radius * 1.2;
        let rect = Rect::from_center_size(pos, Vec2::splat(side));
        egui::Image::new(uri).paint_at(ui, rect);
        return;
    }
    painter.text(
        pos,
        Align2::CENTER_CENTER,
        entity.initials(),
        FontId::proportional(radius * 0.6),
        Color32::WHITE,
    );
}

/// URI for icons the installed loaders can read (local files only)
pub fn icon_uri(icon_ref: &str) -> Option<String> {
    let icon_ref = icon_ref.trim();
    if icon_ref.is_empty() || (icon_ref.contains("://") && !icon_ref.starts_with("file://")) {
        return None;
    }
    if icon_ref.starts_with("file://") {
        Some(icon_ref.to_string())
    } else {
        Some(format!("file://{}", icon_ref))
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{}...", truncated)
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icon_uri_accepts_local_paths_only() {
        assert_eq!(icon_uri("icons/db.png").as_deref(), Some("file://icons/db.png"));
        assert_eq!(icon_uri("file:///tmp/a.png").as_deref(), Some("file:///tmp/a.png"));
        assert_eq!(icon_uri("https://example.com/a.png"), None);
        assert_eq!(icon_uri("  "), None);
    }

    #[test]
    fn truncate_long_labels() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 4), "abcd...");
    }
}
