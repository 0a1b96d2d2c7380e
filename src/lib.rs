//! chart-compose: composable chart layout and rendering engine.
//!
//! A [`Chart`] owns shared scales, facets, measured axes and a legend, and
//! draws any number of geometries (bars, lines, points, pies) over them in
//! priority order. Drawing goes through the backend-agnostic
//! [`render::RenderFrame`]; animation is driven by the host calling
//! [`Chart::tick`].

pub mod animation;
pub mod api;
pub mod core;
pub mod error;
pub mod geometry;
pub mod interaction;
pub mod layout;
pub mod render;
pub mod telemetry;

pub use api::{Chart, ChartLayout, ChartOptions, ChartSpec, FacetCell, GeometrySpec};
pub use error::{ChartError, ChartResult};
