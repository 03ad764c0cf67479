//! Unified theme and color constants for the dashboard.
//!
//! The topology view, list view and status bar all pull their colors
//! from here so a health state reads the same everywhere.

use egui::Color32;

/// Background colors for different layers
pub mod bg {
    use super::*;

    /// Topology surface background - darkest layer
    pub const GRAPH: Color32 = Color32::from_rgb(14, 17, 23);

    /// Panel backgrounds - slightly lighter than graph
    pub const PANEL: Color32 = Color32::from_rgb(20, 22, 28);

    /// Tooltip / elevated surface
    pub const SURFACE: Color32 = Color32::from_rgb(28, 30, 38);

    /// Hub disc fill
    pub const HUB: Color32 = Color32::from_rgb(35, 38, 48);
}

/// Colors attached to each health state
pub mod health {
    use super::*;

    pub const UP: Color32 = Color32::from_rgb(34, 197, 94);
    pub const DEGRADED: Color32 = Color32::from_rgb(245, 158, 11);
    pub const DOWN: Color32 = Color32::from_rgb(239, 68, 68);
    pub const DISABLED: Color32 = Color32::from_rgb(107, 114, 128);
    pub const UNKNOWN: Color32 = Color32::from_rgb(120, 125, 135);
}

/// Edge hues for the three edge classes
pub mod edge {
    use super::*;

    /// Hub end of the hub-edge gradient
    pub const HUB_END: Color32 = Color32::from_rgb(59, 130, 246);

    /// Warm hue for dependency edges
    pub const DEPENDENCY: Color32 = Color32::from_rgb(255, 149, 0);

    /// Cyan for peer connections
    pub const CONNECTION: Color32 = Color32::from_rgb(6, 182, 212);

    /// Travelling particle
    pub const PARTICLE: Color32 = Color32::WHITE;

    /// Break mark drawn across a down hub edge
    pub const BREAK_MARK: Color32 = super::health::DOWN;
}

/// Text colors at different emphasis levels
pub mod text {
    use super::*;

    pub const PRIMARY: Color32 = Color32::from_rgb(240, 240, 245);
    pub const SECONDARY: Color32 = Color32::from_rgb(180, 180, 190);
    pub const MUTED: Color32 = Color32::from_rgb(120, 125, 135);
}

/// Border colors
pub mod border {
    use super::*;

    pub const SUBTLE: Color32 = Color32::from_rgb(45, 48, 55);
    pub const HOVER: Color32 = Color32::WHITE;
}

/// Stroke widths used by the topology painter
pub mod stroke_width {
    pub const EDGE: f32 = 2.0;
    pub const NODE: f32 = 2.0;
    pub const NODE_HOVER: f32 = 3.0;
    pub const BREAK_MARK: f32 = 2.5;
}

/// Linear interpolation between two colors, alpha included.
pub fn lerp_color(a: Color32, b: Color32, t: f32) -> Color32 {
    Color32::from_rgba_unmultiplied(
        lerp_u8(a.r(), b.r(), t),
        lerp_u8(a.g(), b.g(), t),
        lerp_u8(a.b(), b.b(), t),
        lerp_u8(a.a(), b.a(), t),
    )
}

fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    let result = a as f32 + (b as f32 - a as f32) * t;
    result.clamp(0.0, 255.0) as u8
}
