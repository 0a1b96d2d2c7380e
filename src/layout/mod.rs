pub mod axis;
pub mod facets;
pub mod labels;
pub mod legend;

pub use axis::{
    AxisOutcome, AxisPosition, AxisSpec, LabelRotation, TickLabel, choose_rotation, draw_axis,
    measure_axis, remove_overlapping_ticks, tick_labels,
};
pub use facets::{FACET_GAP_PX, Margins, facet_bands, partition_facets};
pub use labels::{
    LABEL_FONT_FLOOR_PX, LabelFit, LabelPalette, fit_labels, label_colour, shrink_to_fit,
};
pub use legend::{LegendEntry, LegendLayout, draw_legend, legend_domain};
