pub mod accessor;
pub mod bucket;
pub mod datum;
pub mod format;
pub mod plot_scale;
pub mod prepare;
pub mod scale;
pub mod types;

pub use accessor::{Accessor, AccessorSpec, Formatter};
pub use bucket::{BucketRow, BucketStrategy, freedman_diaconis_width, interquartile_range};
pub use datum::{Datum, DatumKey};
pub use plot_scale::{BandScale, LinearScale, PlotScale, nice_ticks};
pub use prepare::{Encoding, PreparedPoint, colour_domain, group_by_key, prepare_points};
pub use scale::Scale;
pub use types::{PlotRect, Row, Viewport};
