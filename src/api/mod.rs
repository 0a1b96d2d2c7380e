mod chart;
mod chart_options;
mod compose;
mod interaction_controller;
mod json_contract;
mod render_coordinator;

pub use chart::Chart;
pub use chart_options::ChartOptions;
pub use compose::{ChartLayout, FacetCell};
pub use json_contract::{CHART_SPEC_JSON_SCHEMA_V1, ChannelSpec, ChartSpec, GeometrySpec};
