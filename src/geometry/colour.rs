use indexmap::{IndexMap, IndexSet};

use crate::core::DatumKey;
use crate::error::{ChartError, ChartResult};
use crate::render::Color;

/// Ordinal colour scale over series keys.
///
/// Keys are coloured by their position in the shared domain so the same
/// series gets the same colour in every geometry; per-label overrides are
/// consulted first.
#[derive(Debug, Clone, PartialEq)]
pub struct ColourScale {
    domain: IndexSet<DatumKey>,
    palette: Vec<Color>,
    overrides: IndexMap<String, Color>,
}

impl ColourScale {
    pub fn new(
        domain: impl IntoIterator<Item = DatumKey>,
        palette: Vec<Color>,
        overrides: IndexMap<String, Color>,
    ) -> ChartResult<Self> {
        if palette.is_empty() {
            return Err(ChartError::Configuration(
                "colour range must contain at least one colour".to_owned(),
            ));
        }
        Ok(Self {
            domain: domain.into_iter().collect(),
            palette,
            overrides,
        })
    }

    #[must_use]
    pub fn colour(&self, key: &DatumKey) -> Color {
        if let Some(color) = self.overrides.get(&key.label()) {
            return *color;
        }
        let index = self.domain.get_index_of(key).unwrap_or(self.domain.len());
        self.palette[index % self.palette.len()]
    }

    #[must_use]
    pub fn index_of(&self, key: &DatumKey) -> Option<usize> {
        self.domain.get_index_of(key)
    }

    pub fn domain(&self) -> impl Iterator<Item = &DatumKey> {
        self.domain.iter()
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::ColourScale;
    use crate::core::DatumKey;
    use crate::render::Color;

    #[test]
    fn palette_cycles_and_overrides_win() {
        let keys = ["a", "b", "c"].map(|k| DatumKey::Text(k.to_owned()));
        let scale = ColourScale::new(
            keys.clone(),
            vec![Color::BLACK, Color::WHITE],
            IndexMap::from([("b".to_owned(), Color::rgb(1.0, 0.0, 0.0))]),
        )
        .expect("scale");
        assert_eq!(scale.colour(&keys[0]), Color::BLACK);
        assert_eq!(scale.colour(&keys[1]), Color::rgb(1.0, 0.0, 0.0));
        assert_eq!(scale.colour(&keys[2]), Color::BLACK);
    }

    #[test]
    fn empty_palette_is_rejected() {
        assert!(ColourScale::new(Vec::new(), Vec::new(), IndexMap::new()).is_err());
    }
}
