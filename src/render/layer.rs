use serde::{Deserialize, Serialize};

/// Painting layer of a draw item. Declaration order is paint order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CanvasLayerKind {
    Background,
    Grid,
    Series,
    Labels,
    Axis,
    Legend,
}

impl CanvasLayerKind {
    #[must_use]
    pub fn canonical_order() -> [Self; 6] {
        [
            Self::Background,
            Self::Grid,
            Self::Series,
            Self::Labels,
            Self::Axis,
            Self::Legend,
        ]
    }
}
