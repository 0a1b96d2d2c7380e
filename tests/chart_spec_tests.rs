use chart_compose::core::DatumKey;
use chart_compose::render::NullRenderer;
use chart_compose::{ChartError, ChartSpec};

const SALES_SPEC: &str = r##"{
    "schema_version": 1,
    "options": {
        "viewport": {"width": 480, "height": 260},
        "axis_box": true,
        "style": {"colours": ["#1f77b4", "#ff7f0e"], "show_labels": true}
    },
    "x": {"field": "month"},
    "y": {"field": "units"},
    "colour": {"field": "region"},
    "geometries": [
        {"kind": "line", "options": {"name": "trend", "style": {"show_labels": false}}},
        {"kind": "bar", "options": {"name": "units", "stacked": true, "gradient": true}}
    ],
    "data": [
        {"month": "Jan", "units": 3, "region": "north"},
        {"month": "Jan", "units": 5, "region": "south"},
        {"month": "Feb", "units": 4, "region": "north"},
        {"month": "Feb", "units": 2, "region": "south"}
    ]
}"##;

#[test]
fn json_spec_renders_stacked_gradient_bars_under_a_line() {
    let spec = ChartSpec::from_json_str(SALES_SPEC).expect("spec");
    let mut chart = spec
        .build::<NullRenderer>()
        .expect("chart")
        .with_target(NullRenderer::default());
    chart.render().expect("render");
    chart.finish_transitions().expect("finish");

    let layout = chart.layout().expect("layout");
    assert_eq!(layout.draw_order, vec!["units", "trend"]);
    assert_eq!(
        layout.x_domain(0),
        vec![DatumKey::Text("Jan".into()), DatumKey::Text("Feb".into())]
    );
    // stacked totals drive the shared value domain
    assert!(layout.y_scale.expect("y").domain().1 >= 8.0);

    let frame = chart.current_frame();
    assert_eq!(frame.gradients.len(), 2);
    assert!(
        layout
            .legend_entries
            .iter()
            .all(|entry| matches!(entry.fill, chart_compose::render::Fill::Gradient { .. }))
    );
    let bars = frame
        .items
        .iter()
        .filter(|item| item.key.starts_with("0:units/bar/"))
        .count();
    assert_eq!(bars, 4);
    let lines = frame
        .items
        .iter()
        .filter(|item| item.key.starts_with("0:trend/line/"))
        .count();
    assert_eq!(lines, 2);
}

#[test]
fn spec_round_trips_through_json() {
    let spec = ChartSpec::from_json_str(SALES_SPEC).expect("spec");
    let text = spec.to_json_pretty().expect("serialize");
    let again = ChartSpec::from_json_str(&text).expect("reparse");
    assert_eq!(spec, again);
}

#[test]
fn malformed_json_is_invalid_data() {
    let err = ChartSpec::from_json_str("{ not json").expect_err("parse error");
    assert!(matches!(err, ChartError::InvalidData(_)));
}

#[test]
fn empty_colour_list_in_spec_fails_on_build() {
    let spec = ChartSpec::from_json_str(
        r#"{"geometries": [{"kind": "point", "options": {"style": {"colours": []}}}]}"#,
    )
    .expect("parse");
    let err = spec.build::<NullRenderer>().expect_err("empty colours");
    assert!(err.is_configuration());
}
