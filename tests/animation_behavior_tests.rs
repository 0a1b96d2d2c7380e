use approx::assert_relative_eq;
use chart_compose::animation::{Easing, TransitionEnd, TransitionScheduler, TransitionSpec};
use chart_compose::core::accessor;
use chart_compose::geometry::{BarGeometry, StyleOptions};
use chart_compose::render::{NullRenderer, RenderFrame};
use chart_compose::{Chart, ChartOptions};
use serde_json::{Value, json};

fn labelled_bars(rows: Vec<Value>, style: StyleOptions) -> Chart<NullRenderer> {
    let mut chart = Chart::new(ChartOptions::new(240, 160).with_style(style))
        .expect("chart")
        .with_target(NullRenderer::default())
        .with_x(accessor::field("x").expect("x"))
        .with_y(accessor::field("y").expect("y"))
        .with_data(rows);
    chart
        .add_geometry(BarGeometry::new().with_show_labels(true))
        .expect("bar");
    chart
}

fn rows() -> Vec<Value> {
    vec![json!({"x": "A", "y": 5}), json!({"x": "B", "y": 10})]
}

fn last_frame(chart: &Chart<NullRenderer>) -> RenderFrame {
    chart
        .target()
        .and_then(|target| target.last_frame.clone())
        .expect("frame")
}

fn bar_heights(frame: &RenderFrame) -> Vec<f64> {
    frame
        .items
        .iter()
        .filter(|item| item.key.contains("/bar/"))
        .filter_map(|item| item.primitive.as_rect())
        .map(|rect| rect.height)
        .collect()
}

fn label_count(frame: &RenderFrame) -> usize {
    frame
        .items
        .iter()
        .filter(|item| item.key.contains("/label/"))
        .count()
}

#[test]
fn bars_grow_before_labels_appear() {
    let mut chart = labelled_bars(rows(), StyleOptions::default());

    chart.render().expect("render");
    let start = last_frame(&chart);
    assert!(bar_heights(&start).iter().all(|h| *h == 0.0));
    assert_eq!(label_count(&start), 0);
    assert!(chart.has_running_transitions());

    chart.tick(375.0).expect("tick");
    let middle = last_frame(&chart);
    assert!(bar_heights(&middle).iter().all(|h| *h > 0.0));
    assert_eq!(label_count(&middle), 0);

    chart.tick(750.0).expect("tick");
    let end = last_frame(&chart);
    assert_eq!(label_count(&end), 2);
    assert!(!chart.has_running_transitions());
    let heights = bar_heights(&end);
    assert!(heights.iter().zip(bar_heights(&middle)).all(|(e, m)| *e > m));
}

#[test]
fn no_animation_reveals_labels_immediately() {
    let style = StyleOptions {
        no_animation: Some(true),
        ..StyleOptions::default()
    };
    let mut chart = labelled_bars(rows(), style);

    chart.render().expect("render");
    let frame = last_frame(&chart);
    assert_eq!(label_count(&frame), 2);
    assert!(bar_heights(&frame).iter().all(|h| *h > 0.0));
    assert!(!chart.has_running_transitions());
}

#[test]
fn rerender_interrupts_running_growth() {
    let mut chart = labelled_bars(rows(), StyleOptions::default());
    chart.render().expect("render");
    chart.tick(300.0).expect("tick");
    let interrupted_at = bar_heights(&last_frame(&chart));

    chart.set_data(vec![json!({"x": "A", "y": 10}), json!({"x": "B", "y": 10})]);
    chart.render().expect("second render");
    assert_eq!(chart.interrupted_transitions(), 1);

    // the new transition starts from the displayed state
    let resumed = bar_heights(&last_frame(&chart));
    for (was, now) in interrupted_at.iter().zip(&resumed) {
        assert_relative_eq!(*was, *now, epsilon = 1e-9);
    }
    assert_eq!(label_count(&last_frame(&chart)), 0);

    chart.finish_transitions().expect("finish");
    let settled = bar_heights(&last_frame(&chart));
    assert_relative_eq!(settled[0], settled[1], epsilon = 1e-9);
    assert_eq!(label_count(&last_frame(&chart)), 2);
}

#[test]
fn consecutive_renders_settle_to_identical_frames() {
    let mut chart = labelled_bars(rows(), StyleOptions::default());
    chart.render().expect("render");
    chart.finish_transitions().expect("finish");
    let first = last_frame(&chart);

    chart.render().expect("render again");
    chart.finish_transitions().expect("finish again");
    let second = last_frame(&chart);

    assert_eq!(first, second);
}

#[test]
fn removed_categories_exit_then_disappear() {
    let mut chart = labelled_bars(rows(), StyleOptions::default());
    chart.render().expect("render");
    chart.finish_transitions().expect("finish");
    assert_eq!(bar_heights(&last_frame(&chart)).len(), 2);

    chart.set_data(vec![json!({"x": "A", "y": 5})]);
    chart.render().expect("render");
    let exiting = last_frame(&chart);
    assert_eq!(bar_heights(&exiting).len(), 2);

    chart.finish_transitions().expect("finish");
    assert_eq!(bar_heights(&last_frame(&chart)).len(), 1);
}

#[test]
fn scheduler_runs_continuations_in_start_order() {
    let mut scheduler = TransitionScheduler::new();
    let spec = TransitionSpec::new(100.0, 0.0, Easing::Linear);
    scheduler.start(
        "a",
        spec,
        [TransitionEnd::RevealLabels {
            group: "a:labels".into(),
        }],
    );
    scheduler.start(
        "b",
        TransitionSpec::new(50.0, 20.0, Easing::QuadOut),
        [TransitionEnd::DropExited { group: "b".into() }],
    );

    assert!(scheduler.advance(60.0).is_empty());
    assert_relative_eq!(scheduler.progress("a"), 0.6, epsilon = 1e-12);

    let ended = scheduler.advance(100.0);
    assert_eq!(
        ended,
        vec![
            TransitionEnd::RevealLabels {
                group: "a:labels".into()
            },
            TransitionEnd::DropExited { group: "b".into() },
        ]
    );
    assert_eq!(scheduler.active_count(), 0);
}

#[test]
fn restarting_a_name_drops_the_old_continuation() {
    let mut scheduler = TransitionScheduler::new();
    let spec = TransitionSpec::default();
    scheduler.start(
        "bars",
        spec,
        [TransitionEnd::DropExited {
            group: "old".into(),
        }],
    );
    scheduler.start(
        "bars",
        spec,
        [TransitionEnd::DropExited {
            group: "new".into(),
        }],
    );

    assert_eq!(scheduler.interrupted_count(), 1);
    assert_eq!(
        scheduler.finish_all(),
        vec![TransitionEnd::DropExited {
            group: "new".into()
        }]
    );
}
