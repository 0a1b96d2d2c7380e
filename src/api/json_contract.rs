use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{AccessorSpec, Row};
use crate::error::{ChartError, ChartResult};
use crate::geometry::{
    BarGeometry, Channels, Geometry, GeometryKind, GeometryOptions, LineGeometry, PieGeometry,
    PointGeometry,
};
use crate::render::Renderer;

use super::{Chart, ChartOptions};

pub const CHART_SPEC_JSON_SCHEMA_V1: u32 = 1;

fn default_schema_version() -> u32 {
    CHART_SPEC_JSON_SCHEMA_V1
}

/// Channel accessors named declaratively.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelSpec {
    pub x: Option<AccessorSpec>,
    pub y: Option<AccessorSpec>,
    pub x2: Option<AccessorSpec>,
    pub y2: Option<AccessorSpec>,
    pub colour: Option<AccessorSpec>,
    pub size: Option<AccessorSpec>,
}

impl ChannelSpec {
    fn apply(&self, channels: &mut Channels) -> ChartResult<()> {
        let build = |spec: &Option<AccessorSpec>| spec.as_ref().map(AccessorSpec::build).transpose();
        if let Some(x) = build(&self.x)? {
            channels.x = Some(x);
        }
        if let Some(y) = build(&self.y)? {
            channels.y = Some(y);
        }
        if let Some(x2) = build(&self.x2)? {
            channels.x2 = Some(x2);
        }
        if let Some(y2) = build(&self.y2)? {
            channels.y2 = Some(y2);
        }
        if let Some(colour) = build(&self.colour)? {
            channels.colour = Some(colour);
        }
        if let Some(size) = build(&self.size)? {
            channels.size = Some(size);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometrySpec {
    pub kind: GeometryKind,
    #[serde(default)]
    pub options: GeometryOptions,
    #[serde(flatten)]
    pub channels: ChannelSpec,
}

impl GeometrySpec {
    pub fn build(&self) -> ChartResult<Box<dyn Geometry>> {
        let options = self.options.clone();
        let mut geometry: Box<dyn Geometry> = match self.kind {
            GeometryKind::Bar => Box::new(BarGeometry::new().with_options(options)?),
            GeometryKind::Line => Box::new(LineGeometry::new().with_options(options)?),
            GeometryKind::Point => Box::new(PointGeometry::new().with_options(options)?),
            GeometryKind::Pie => Box::new(PieGeometry::new().with_options(options)?),
        };
        self.channels.apply(geometry.channels_mut())?;
        Ok(geometry)
    }
}

/// Declarative chart description loadable from JSON.
///
/// Accessors are field names (or constants); formatters keep their
/// built-in defaults and can be replaced on the built chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub options: ChartOptions,
    #[serde(flatten)]
    pub channels: ChannelSpec,
    #[serde(default)]
    pub facet: Option<AccessorSpec>,
    #[serde(default)]
    pub geometries: Vec<GeometrySpec>,
    #[serde(default)]
    pub data: Option<Vec<Row>>,
}

impl ChartSpec {
    pub fn from_json_str(input: &str) -> ChartResult<Self> {
        let spec: Self = serde_json::from_str(input).map_err(|e| {
            ChartError::InvalidData(format!("failed to parse chart spec json: {e}"))
        })?;
        if spec.schema_version != CHART_SPEC_JSON_SCHEMA_V1 {
            return Err(ChartError::InvalidData(format!(
                "unsupported chart spec schema version: {}",
                spec.schema_version
            )));
        }
        Ok(spec)
    }

    pub fn to_json_pretty(&self) -> ChartResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            ChartError::InvalidData(format!("failed to serialize chart spec json: {e}"))
        })
    }

    /// Validates every part and assembles a chart without a render target.
    pub fn build<R: Renderer>(&self) -> ChartResult<Chart<R>> {
        let mut chart = Chart::new(self.options.clone())?;
        self.channels.apply(chart.channels_mut())?;
        if let Some(facet) = &self.facet {
            chart.set_facet(Some(facet.build()?));
        }
        for geometry in &self.geometries {
            chart.add_boxed_geometry(geometry.build()?)?;
        }
        if let Some(rows) = &self.data {
            chart.set_data(rows.clone());
        }
        debug!(
            geometries = self.geometries.len(),
            rows = self.data.as_ref().map_or(0, Vec::len),
            "chart built from spec"
        );
        Ok(chart)
    }
}
