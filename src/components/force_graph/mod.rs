//! Force-directed word graph on an HTML canvas.
//!
//! - Link, charge, center and collide forces with energy cooling
//! - Pan, zoom, animated reset and drag-to-pin
//! - Radius and label size scaled by occurrence count

mod component;
mod render;
pub mod scale;
pub mod simulation;
pub mod state;

pub use component::ForceGraphCanvas;
pub use render::lineage_color;
pub use scale::{ScaleConfig, WeightScale};
pub use simulation::{ForceParameters, LayoutNode, LinkEndpoints, Simulation};
pub use state::{ForceGraphState, Tooltip, ViewTransform, ViewportConfig};
