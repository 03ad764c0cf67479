//! Topology view: layout, edge styling, animation loop and hover handling.

pub mod edges;
pub mod engine;
pub mod interaction;
pub mod layout;
pub mod paint;
pub mod scheduler;
pub mod status;
pub mod topology;
pub mod types;
pub mod view;

pub use edges::AnimationConfig;
pub use engine::{SurfaceStatus, TopologyEngine};
pub use layout::LayoutConfig;
pub use scheduler::RepaintHost;
pub use view::{View, ViewController};
