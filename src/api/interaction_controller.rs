use tracing::trace;

use crate::interaction::{
    ChartEvent, ChartEventKind, HitTarget, PointerEvent, PointerKind, hit_test,
};
use crate::render::Renderer;

use super::Chart;

impl<R: Renderer> Chart<R> {
    /// Routes raw pointer input through the hit targets of the last render.
    ///
    /// Returns the kinds of events that were published, in emission order.
    pub fn pointer(&mut self, event: PointerEvent) -> Vec<ChartEventKind> {
        let hit = hit_test(&self.hit_targets, event.x, event.y)
            .map(|(key, payload)| (key.to_owned(), payload.clone()));
        let mut emitted = Vec::new();

        match (event.kind, hit) {
            (PointerKind::Move, Some((key, payload))) => {
                if self.hovered.as_deref() != Some(key.as_str()) {
                    if self.hide_tooltip(event) {
                        emitted.push(ChartEventKind::TooltipHide);
                    }
                    trace!(key = %key, "pointer entered element");
                }
                self.hovered = Some(key);
                let message = ChartEvent::new(ChartEventKind::TooltipShow, event, &payload);
                self.dispatcher.emit(&message);
                emitted.push(ChartEventKind::TooltipShow);
            }
            (PointerKind::Click, Some((_, payload))) => {
                let message = ChartEvent::new(ChartEventKind::ElementClick, event, &payload);
                self.dispatcher.emit(&message);
                emitted.push(ChartEventKind::ElementClick);
            }
            (PointerKind::Move | PointerKind::Leave, _) => {
                if self.hide_tooltip(event) {
                    emitted.push(ChartEventKind::TooltipHide);
                }
            }
            (PointerKind::Click, None) => {}
        }
        emitted
    }

    /// Hides the tooltip of the hovered element, if any, using the hit
    /// targets that are currently committed.
    pub(super) fn hide_tooltip(&mut self, event: PointerEvent) -> bool {
        let Some(key) = self.hovered.take() else {
            return false;
        };
        let payload = self.hit_targets.iter().find_map(|target| match target {
            HitTarget::Element {
                key: candidate,
                payload,
                ..
            } if *candidate == key => Some(payload.clone()),
            HitTarget::Tracking { points, .. } => points
                .iter()
                .find(|p| p.key == key)
                .map(|p| p.payload.clone()),
            _ => None,
        });
        let Some(payload) = payload else {
            return false;
        };
        trace!(key = %key, "pointer left element");
        let message = ChartEvent::new(ChartEventKind::TooltipHide, event, &payload);
        self.dispatcher.emit(&message);
        true
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use serde_json::json;

    use crate::api::{Chart, ChartOptions};
    use crate::core::accessor;
    use crate::geometry::BarGeometry;
    use crate::interaction::{ChartEventKind, HitShape, HitTarget, PointerEvent};
    use crate::render::NullRenderer;

    fn bar_chart() -> Chart<NullRenderer> {
        let mut chart = Chart::new(ChartOptions::new(200, 100))
            .expect("chart")
            .with_target(NullRenderer::default())
            .with_x(accessor::field("x").expect("x"))
            .with_y(accessor::field("y").expect("y"))
            .with_data(vec![json!({"x": "A", "y": 5}), json!({"x": "B", "y": 10})]);
        chart.add_geometry(BarGeometry::new()).expect("bar");
        chart.render().expect("render");
        chart.finish_transitions().expect("finish");
        chart
    }

    fn bar_centre(chart: &Chart<NullRenderer>, index: usize) -> (f64, f64) {
        match &chart.hit_targets()[index] {
            HitTarget::Element {
                shape: HitShape::Rect(rect),
                ..
            } => (rect.x + rect.width / 2.0, rect.y + rect.height / 2.0),
            other => panic!("unexpected target {other:?}"),
        }
    }

    #[test]
    fn hover_then_leave_shows_and_hides_tooltip() {
        let mut chart = bar_chart();
        let seen = Rc::new(RefCell::new(Vec::new()));
        for kind in [ChartEventKind::TooltipShow, ChartEventKind::TooltipHide] {
            let sink = Rc::clone(&seen);
            chart.subscribe(kind, move |event| {
                sink.borrow_mut().push((event.kind, event.value.clone()));
            });
        }

        let (x, y) = bar_centre(&chart, 1);
        assert_eq!(chart.pointer(PointerEvent::moved(x, y)), vec![ChartEventKind::TooltipShow]);
        assert_eq!(chart.pointer(PointerEvent::leave()), vec![ChartEventKind::TooltipHide]);
        assert!(chart.pointer(PointerEvent::leave()).is_empty());

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].1, crate::core::Datum::Number(10.0));
    }

    #[test]
    fn moving_between_elements_hides_the_previous_tooltip() {
        let mut chart = bar_chart();
        let hidden = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&hidden);
        chart.subscribe(ChartEventKind::TooltipHide, move |event| {
            sink.borrow_mut().push(event.value.clone());
        });

        let (ax, ay) = bar_centre(&chart, 0);
        let (bx, by) = bar_centre(&chart, 1);
        assert_eq!(chart.pointer(PointerEvent::moved(ax, ay)), vec![ChartEventKind::TooltipShow]);
        assert_eq!(
            chart.pointer(PointerEvent::moved(bx, by)),
            vec![ChartEventKind::TooltipHide, ChartEventKind::TooltipShow]
        );
        // staying on the same element only refreshes the tooltip
        assert_eq!(chart.pointer(PointerEvent::moved(bx, by)), vec![ChartEventKind::TooltipShow]);
        assert_eq!(*hidden.borrow(), vec![crate::core::Datum::Number(5.0)]);
    }

    #[test]
    fn rerender_hides_the_open_tooltip() {
        let mut chart = bar_chart();
        let hides = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&hides);
        chart.subscribe(ChartEventKind::TooltipHide, move |_| *sink.borrow_mut() += 1);

        let (x, y) = bar_centre(&chart, 0);
        chart.pointer(PointerEvent::moved(x, y));
        chart.render().expect("render");
        assert_eq!(*hides.borrow(), 1);
        assert!(chart.pointer(PointerEvent::leave()).is_empty());
    }

    #[test]
    fn click_outside_every_element_emits_nothing() {
        let mut chart = bar_chart();
        let clicks = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&clicks);
        chart.subscribe(ChartEventKind::ElementClick, move |_| *sink.borrow_mut() += 1);

        assert!(chart.pointer(PointerEvent::click(-5.0, -5.0)).is_empty());
        let (x, y) = bar_centre(&chart, 0);
        assert_eq!(chart.pointer(PointerEvent::click(x, y)), vec![ChartEventKind::ElementClick]);
        assert_eq!(*clicks.borrow(), 1);
    }
}
