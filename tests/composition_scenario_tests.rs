use std::f64::consts::TAU;

use approx::assert_relative_eq;
use chart_compose::core::{
    Datum, DatumKey, Scale, accessor, freedman_diaconis_width, interquartile_range,
};
use chart_compose::geometry::{BarGeometry, LineGeometry, PieGeometry, StyleOptions};
use chart_compose::interaction::HitTarget;
use chart_compose::layout::{LabelFit, LabelRotation, shrink_to_fit};
use chart_compose::render::{
    CanvasLayerKind, HeuristicTextMeasurer, NullRenderer, RenderFrame, TextMeasurer,
};
use chart_compose::{Chart, ChartOptions};
use serde_json::{Value, json};

fn chart(width: u32, height: u32, rows: Vec<Value>) -> Chart<NullRenderer> {
    Chart::new(ChartOptions::new(width, height))
        .expect("chart")
        .with_target(NullRenderer::default())
        .with_x(accessor::field("x").expect("x"))
        .with_y(accessor::field("y").expect("y"))
        .with_data(rows)
}

fn settled_frame(chart: &mut Chart<NullRenderer>) -> RenderFrame {
    chart.render().expect("render");
    chart.finish_transitions().expect("finish");
    chart
        .target()
        .and_then(|target| target.last_frame.clone())
        .expect("painted frame")
}

fn keyed<'f>(frame: &'f RenderFrame, needle: &str) -> Vec<&'f chart_compose::render::DrawItem> {
    frame
        .items
        .iter()
        .filter(|item| item.key.contains(needle))
        .collect()
}

#[test]
fn two_categories_draw_bars_in_value_ratio() {
    let mut chart = chart(
        200,
        100,
        vec![json!({"x": "A", "y": 5}), json!({"x": "B", "y": 10})],
    );
    chart.add_geometry(BarGeometry::new()).expect("bar");
    let frame = settled_frame(&mut chart);

    let bars: Vec<_> = keyed(&frame, "/bar/")
        .into_iter()
        .filter_map(|item| item.primitive.as_rect())
        .collect();
    assert_eq!(bars.len(), 2);
    assert!(bars[0].height > 0.0);
    assert_relative_eq!(bars[1].height / bars[0].height, 2.0, epsilon = 1e-9);
    assert_relative_eq!(bars[0].width, bars[1].width, epsilon = 1e-9);

    let layout = chart.layout().expect("layout");
    assert_eq!(
        layout.x_domain(0),
        vec![DatumKey::Text("A".into()), DatumKey::Text("B".into())]
    );
}

#[test]
fn freedman_diaconis_width_matches_formula() {
    let values = [1.0, 2.0, 2.0, 3.0, 100.0];
    let iqr = interquartile_range(&values);
    assert_relative_eq!(iqr, 1.0, epsilon = 1e-12);

    let expected = 2.0 * iqr * 5f64.powf(-1.0 / 3.0);
    let width = freedman_diaconis_width(&values).expect("width");
    assert_relative_eq!(width, expected, epsilon = 1e-12);

    let data: Vec<Datum> = values.iter().copied().map(Datum::Number).collect();
    let strategy = Scale::Continuous.buckets(&data).expect("strategy");
    assert_relative_eq!(strategy.width().expect("continuous"), expected, epsilon = 1e-12);
}

#[test]
fn continuous_bars_count_rows_per_bucket() {
    let rows = [1, 2, 2, 3, 100]
        .into_iter()
        .map(|x| json!({"x": x}))
        .collect();
    let mut chart = chart(400, 200, rows);
    chart
        .add_geometry(BarGeometry::new().with_x_scale(Scale::Continuous))
        .expect("bar");
    let frame = settled_frame(&mut chart);

    let labels: Vec<String> = chart
        .layout()
        .expect("layout")
        .x_domain(0)
        .iter()
        .map(DatumKey::label)
        .collect();
    assert_eq!(labels, vec!["2", "3", "4", "101"]);

    let heights: Vec<f64> = keyed(&frame, "/bar/")
        .into_iter()
        .filter_map(|item| item.primitive.as_rect())
        .map(|rect| rect.height)
        .collect();
    assert_eq!(heights.len(), 4);
    assert_relative_eq!(heights[1], heights[0] * 2.0, epsilon = 1e-9);
    assert_relative_eq!(heights[2], heights[0], epsilon = 1e-9);
}

#[test]
fn line_shares_bar_value_scale_and_draws_above() {
    let mut chart = chart(
        300,
        200,
        vec![json!({"x": "A", "y": 4}), json!({"x": "B", "y": 10})],
    );
    // registered first but drawn second
    let line = chart.add_geometry(LineGeometry::new()).expect("line");
    let bar = chart.add_geometry(BarGeometry::new()).expect("bar");
    let frame = settled_frame(&mut chart);

    let layout = chart.layout().expect("layout");
    assert_eq!(layout.draw_order, vec![bar.clone(), line.clone()]);
    assert_eq!(layout.representative.as_deref(), Some(bar.as_str()));

    let last_bar = frame
        .items
        .iter()
        .rposition(|item| item.key.starts_with(&format!("0:{bar}/")))
        .expect("bar items");
    let first_line = frame
        .items
        .iter()
        .position(|item| item.key.starts_with(&format!("0:{line}/")))
        .expect("line items");
    assert!(first_line > last_bar);

    let bar_b = keyed(&frame, &format!("{bar}/bar/B"))[0]
        .primitive
        .as_rect()
        .expect("rect")
        .clone();
    let marker_b = keyed(&frame, &format!("{line}/point/{line}/B"))[0]
        .primitive
        .as_circle()
        .copied()
        .expect("circle");
    assert_relative_eq!(bar_b.y, marker_b.cy, epsilon = 1e-9);
    assert_relative_eq!(bar_b.x + bar_b.width / 2.0, marker_b.cx, epsilon = 1e-9);
}

#[test]
fn oversized_label_in_narrow_bar_is_removed() {
    let measured = HeuristicTextMeasurer.measure("12345", "sans-serif", 12.0).width;
    assert_relative_eq!(measured, 37.2, epsilon = 1e-9);
    assert_eq!(shrink_to_fit(measured, 10.0, 12.0), LabelFit::Remove);

    match shrink_to_fit(measured, 30.0, 12.0) {
        LabelFit::Shrink { font_size } => assert!(font_size >= 8.0 && font_size < 12.0),
        other => panic!("expected shrink, got {other:?}"),
    }
}

#[test]
fn narrow_chart_drops_bar_labels() {
    let rows = (0..30)
        .map(|i| json!({"x": format!("c{i:02}"), "y": 12345}))
        .collect();
    let mut chart = chart(220, 200, rows);
    chart
        .add_geometry(BarGeometry::new().with_show_labels(true))
        .expect("bar");
    let frame = settled_frame(&mut chart);

    assert_eq!(keyed(&frame, "/bar/").len(), 30);
    assert!(keyed(&frame, "/label/").is_empty());
}

#[test]
fn facets_share_value_scale_and_split_width() {
    let rows = vec![
        json!({"g": "east", "x": "A", "y": 1}),
        json!({"g": "west", "x": "A", "y": 8}),
        json!({"g": "east", "x": "B", "y": 3}),
    ];
    let mut chart = chart(500, 240, rows).with_facet(accessor::field("g").expect("g"));
    chart.add_geometry(BarGeometry::new()).expect("bar");
    let frame = settled_frame(&mut chart);

    let layout = chart.layout().expect("layout");
    assert_eq!(layout.cells.len(), 2);
    assert_relative_eq!(layout.cells[0].rect.width, layout.cells[1].rect.width, epsilon = 1e-9);
    assert!(layout.cells[1].rect.x > layout.cells[0].rect.right());
    assert_eq!(layout.x_domain(0).len(), 2);
    assert_eq!(layout.x_domain(1).len(), 1);

    let headers: Vec<_> = keyed(&frame, ":header")
        .into_iter()
        .filter_map(|item| item.primitive.as_text())
        .map(|text| text.text.clone())
        .collect();
    assert_eq!(headers, vec!["east", "west"]);

    let y = layout.y_scale.expect("shared y");
    assert!(y.domain().1 >= 8.0);
    let heights: Vec<f64> = keyed(&frame, "/bar/A/")
        .into_iter()
        .filter_map(|item| item.primitive.as_rect())
        .map(|rect| rect.height)
        .collect();
    assert_eq!(heights.len(), 2);
    assert_relative_eq!(heights[1], heights[0] * 8.0, epsilon = 1e-9);
}

#[test]
fn legend_lists_series_in_first_seen_order() {
    let rows = vec![
        json!({"x": "A", "y": 1, "s": "beta"}),
        json!({"x": "A", "y": 2, "s": "alpha"}),
        json!({"x": "B", "y": 3, "s": "beta"}),
    ];
    let mut chart = chart(400, 240, rows).with_colour(accessor::field("s").expect("s"));
    chart.add_geometry(BarGeometry::new()).expect("bar");
    let frame = settled_frame(&mut chart);

    let layout = chart.layout().expect("layout");
    let labels: Vec<&str> = layout
        .legend_entries
        .iter()
        .map(|entry| entry.label.as_str())
        .collect();
    assert_eq!(labels, vec!["beta", "alpha"]);
    assert!(layout.margins.top > chart.options().padding.top);

    let legend_items = frame
        .items
        .iter()
        .filter(|item| item.layer == CanvasLayerKind::Legend)
        .count();
    assert_eq!(legend_items, 4);
}

#[test]
fn pie_only_chart_has_no_axes() {
    let rows = vec![
        json!({"x": "a", "y": 1, "s": "one"}),
        json!({"x": "b", "y": 3, "s": "two"}),
    ];
    let mut chart = chart(240, 240, rows).with_colour(accessor::field("s").expect("s"));
    chart.add_geometry(PieGeometry::new()).expect("pie");
    let frame = settled_frame(&mut chart);

    let layout = chart.layout().expect("layout");
    assert!(layout.representative.is_none());
    assert!(layout.y_scale.is_none());
    assert!(layout.x_axes.is_empty());

    let sweep: f64 = frame
        .items
        .iter()
        .filter_map(|item| item.primitive.as_arc())
        .map(|arc| arc.end_angle - arc.start_angle)
        .sum();
    assert_relative_eq!(sweep, TAU, epsilon = 1e-9);
}

#[test]
fn axis_box_frames_every_cell() {
    let options = ChartOptions::new(300, 200)
        .with_axis_box(true)
        .with_style(StyleOptions {
            show_legend: Some(false),
            ..StyleOptions::default()
        });
    let mut chart = Chart::new(options)
        .expect("chart")
        .with_target(NullRenderer::default())
        .with_data(vec![json!({"x": "A", "y": 2})]);
    chart.add_geometry(BarGeometry::new()).expect("bar");
    let frame = settled_frame(&mut chart);

    let boxes = keyed(&frame, ":axis-box");
    assert_eq!(boxes.len(), 1);
    let cell = chart.layout().expect("layout").cells[0].rect;
    let outline = boxes[0].primitive.as_rect().expect("rect").rect();
    assert_relative_eq!(outline.width, cell.width, epsilon = 1e-9);
    assert!(chart.layout().expect("layout").legend.is_none());
}

#[test]
fn repeated_x_values_keep_every_line_marker() {
    let rows = vec![
        json!({"x": "A", "y": 1}),
        json!({"x": "A", "y": 9}),
        json!({"x": "B", "y": 5}),
    ];
    let mut chart = chart(300, 200, rows);
    let line = chart
        .add_geometry(LineGeometry::new().with_show_labels(true))
        .expect("line");
    let frame = settled_frame(&mut chart);

    let markers: Vec<_> = keyed(&frame, &format!("{line}/point/"))
        .into_iter()
        .filter_map(|item| item.primitive.as_circle())
        .collect();
    assert_eq!(markers.len(), 3);
    let polyline = frame
        .items
        .iter()
        .find_map(|item| item.primitive.as_polyline())
        .expect("polyline");
    assert_eq!(polyline.points.len(), 3);
    assert_eq!(chart.hit_targets().len(), 3);
    assert_eq!(keyed(&frame, &format!("{line}/label/")).len(), 3);
}

#[test]
fn ranged_bars_span_min_start_to_max_end() {
    let rows = vec![
        json!({"x": "A", "y": 2, "end": 8}),
        json!({"x": "A", "y": 1, "end": 5}),
        json!({"x": "B", "y": 3, "end": 4}),
    ];
    let mut chart = chart(300, 200, rows);
    chart
        .add_geometry(BarGeometry::new().with_y2(accessor::field("end").expect("end")))
        .expect("bar");
    let frame = settled_frame(&mut chart);

    let bars: Vec<_> = keyed(&frame, "/bar/")
        .into_iter()
        .filter_map(|item| item.primitive.as_rect())
        .collect();
    assert_eq!(bars.len(), 2);
    assert_relative_eq!(bars[0].height / bars[1].height, 7.0, epsilon = 1e-9);

    let layout = chart.layout().expect("layout");
    let y = layout.y_scale.expect("y scale");
    let cell = layout.cells[0].rect;
    assert_relative_eq!(bars[0].y + bars[0].height - cell.y, y.map(1.0), epsilon = 1e-9);
    assert_relative_eq!(bars[0].y - cell.y, y.map(8.0), epsilon = 1e-9);
}

#[test]
fn secondary_axis_line_uses_its_own_value_scale() {
    let rows = vec![
        json!({"x": "A", "y": 1, "total": 1000}),
        json!({"x": "B", "y": 2, "total": 3000}),
    ];
    let mut chart = chart(400, 240, rows);
    chart.add_geometry(BarGeometry::new()).expect("bar");
    let line = chart
        .add_geometry(
            LineGeometry::new()
                .with_y(accessor::field("total").expect("total"))
                .with_use_y2_axis(true),
        )
        .expect("line");
    let frame = settled_frame(&mut chart);

    let layout = chart.layout().expect("layout");
    let y = layout.y_scale.expect("y");
    let y2 = layout.y2_scale.expect("y2");
    assert!(y.domain().1 < 1000.0);
    assert!(y2.domain().1 >= 3000.0);
    assert!(layout.margins.right > chart.options().padding.right);

    let ticks = frame
        .items
        .iter()
        .filter(|item| item.key.starts_with("y2-axis/tick/") && item.layer == CanvasLayerKind::Axis)
        .count();
    assert!(ticks > 0);

    let cell = layout.cells[0].rect;
    let marker = keyed(&frame, &format!("{line}/point/{line}/B/"))[0]
        .primitive
        .as_circle()
        .copied()
        .expect("circle");
    assert_relative_eq!(marker.cy - cell.y, y2.map(3000.0), epsilon = 1e-9);
    assert!(
        chart
            .hit_targets()
            .iter()
            .any(|target| matches!(target, HitTarget::Element { key, .. } if key.contains("/point/")))
    );
}

fn category_chart(names: &[String]) -> Chart<NullRenderer> {
    let rows = names
        .iter()
        .enumerate()
        .map(|(i, name)| json!({"x": name, "y": i + 1}))
        .collect();
    let mut chart = chart(300, 400, rows);
    chart.add_geometry(BarGeometry::new()).expect("bar");
    chart
}

fn tick_labels(frame: &RenderFrame) -> Vec<chart_compose::render::TextPrimitive> {
    frame
        .items
        .iter()
        .filter(|item| item.key.starts_with("0:x-axis/tick/") && item.key.ends_with("/label"))
        .filter_map(|item| item.primitive.as_text().cloned())
        .collect()
}

#[test]
fn medium_category_names_tilt() {
    let names: Vec<String> = (0..4).map(|i| format!("region{i}abcdefg")).collect();
    let mut chart = category_chart(&names);
    let frame = settled_frame(&mut chart);

    let axis = &chart.layout().expect("layout").x_axes[0];
    assert_eq!(axis.rotation, LabelRotation::Tilted);
    assert_relative_eq!(axis.font_size, 12.0, epsilon = 1e-9);
    let labels = tick_labels(&frame);
    assert!(!labels.is_empty());
    assert!(labels.iter().all(|t| t.rotation_deg == -30.0));
}

#[test]
fn long_category_names_turn_vertical_with_smaller_font() {
    let names: Vec<String> = (0..4)
        .map(|i| format!("a-rather-long-category-label-{i}"))
        .collect();
    let mut chart = category_chart(&names);
    let frame = settled_frame(&mut chart);

    let layout = chart.layout().expect("layout");
    let axis = &layout.x_axes[0];
    assert_eq!(axis.rotation, LabelRotation::Vertical);
    assert!(axis.font_size < 12.0);
    let labels = tick_labels(&frame);
    assert!(!labels.is_empty());
    assert!(labels.iter().all(|t| t.rotation_deg == -90.0 && t.font_size_px < 12.0));
    // the vertical labels were measured into the bottom margin
    assert!(layout.margins.bottom > 100.0);
}
