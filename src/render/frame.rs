use serde::{Deserialize, Serialize};

use crate::core::Viewport;
use crate::error::{ChartError, ChartResult};
use crate::render::{CanvasLayerKind, Color, Primitive};

/// One keyed primitive in a frame.
///
/// `key` identifies the element across renders; `group` names the
/// transition that animates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawItem {
    pub key: String,
    pub group: String,
    pub layer: CanvasLayerKind,
    pub primitive: Primitive,
}

/// Vertical linear gradient referenced by `Fill::Gradient`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientDef {
    pub id: String,
    pub stops: Vec<(f64, Color)>,
}

impl GradientDef {
    pub fn validate(&self) -> ChartResult<()> {
        if self.id.is_empty() || self.stops.is_empty() {
            return Err(ChartError::InvalidData(
                "gradient needs an id and at least one stop".to_owned(),
            ));
        }
        for (offset, color) in &self.stops {
            if !offset.is_finite() || !(0.0..=1.0).contains(offset) {
                return Err(ChartError::DegenerateInput(format!(
                    "gradient `{}` stop offset must be in [0, 1]",
                    self.id
                )));
            }
            color.validate()?;
        }
        Ok(())
    }
}

/// Backend-agnostic scene for one chart draw pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    pub viewport: Viewport,
    pub items: Vec<DrawItem>,
    pub gradients: Vec<GradientDef>,
}

impl RenderFrame {
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            items: Vec::new(),
            gradients: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_item(mut self, item: DrawItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn validate(&self) -> ChartResult<()> {
        if !self.viewport.is_valid() {
            return Err(ChartError::InvalidViewport {
                width: self.viewport.width,
                height: self.viewport.height,
            });
        }
        for item in &self.items {
            item.primitive.validate().map_err(|err| match err {
                ChartError::DegenerateInput(msg) => {
                    ChartError::DegenerateInput(format!("`{}`: {msg}", item.key))
                }
                other => other,
            })?;
        }
        for gradient in &self.gradients {
            gradient.validate()?;
        }
        Ok(())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in paint order: by layer, then insertion order.
    #[must_use]
    pub fn painting_order(&self) -> Vec<&DrawItem> {
        let mut items: Vec<&DrawItem> = self.items.iter().collect();
        items.sort_by_key(|item| item.layer);
        items
    }

    #[must_use]
    pub fn item(&self, key: &str) -> Option<&DrawItem> {
        self.items.iter().find(|item| item.key == key)
    }

    /// Position of `key` in paint order.
    #[must_use]
    pub fn paint_index(&self, key: &str) -> Option<usize> {
        self.painting_order()
            .iter()
            .position(|item| item.key == key)
    }

    pub fn items_in(&self, layer: CanvasLayerKind) -> impl Iterator<Item = &DrawItem> {
        self.items.iter().filter(move |item| item.layer == layer)
    }

    pub fn items_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a DrawItem> {
        self.items
            .iter()
            .filter(move |item| item.key.starts_with(prefix))
    }

    #[must_use]
    pub fn texts(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter_map(|item| item.primitive.as_text())
            .map(|text| text.text.as_str())
            .collect()
    }

    #[must_use]
    pub fn gradient(&self, id: &str) -> Option<&GradientDef> {
        self.gradients.iter().find(|g| g.id == id)
    }
}
