use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::{Datum, Row};
use crate::interaction::{HitPayload, PointerEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChartEventKind {
    ElementClick,
    TooltipShow,
    TooltipHide,
}

/// Message delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartEvent {
    pub kind: ChartEventKind,
    pub originating_event: PointerEvent,
    pub data_point: Row,
    pub series: String,
    pub series_index: usize,
    pub value: Datum,
    pub geometry: String,
}

impl ChartEvent {
    #[must_use]
    pub fn new(kind: ChartEventKind, originating_event: PointerEvent, payload: &HitPayload) -> Self {
        Self {
            kind,
            originating_event,
            data_point: payload.data_point.clone(),
            series: payload.series.clone(),
            series_index: payload.series_index,
            value: payload.value.clone(),
            geometry: payload.geometry.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&ChartEvent)>;

/// Publish/subscribe channel shared by the chart and its geometries.
///
/// Geometries never show tooltips themselves; they only publish here.
#[derive(Default)]
pub struct Dispatcher {
    next_id: u64,
    listeners: Vec<(SubscriptionId, ChartEventKind, Listener)>,
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &mut self,
        kind: ChartEventKind,
        listener: impl FnMut(&ChartEvent) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, kind, Box::new(listener)));
        id
    }

    /// Returns `false` if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(candidate, _, _)| *candidate != id);
        self.listeners.len() != before
    }

    /// Delivers `event` to every listener of its kind, in subscription order.
    pub fn emit(&mut self, event: &ChartEvent) -> usize {
        let mut delivered = 0;
        for (_, kind, listener) in &mut self.listeners {
            if *kind == event.kind {
                listener(event);
                delivered += 1;
            }
        }
        trace!(kind = ?event.kind, delivered, "dispatched chart event");
        delivered
    }

    #[must_use]
    pub fn listener_count(&self, kind: ChartEventKind) -> usize {
        self.listeners.iter().filter(|(_, k, _)| *k == kind).count()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use serde_json::json;

    use super::{ChartEvent, ChartEventKind, Dispatcher};
    use crate::core::Datum;
    use crate::interaction::{HitPayload, PointerEvent};

    fn event(kind: ChartEventKind) -> ChartEvent {
        let payload = HitPayload {
            data_point: json!({"x": "A"}),
            series: "s".into(),
            series_index: 0,
            value: Datum::Number(5.0),
            geometry: "bar-0".into(),
        };
        ChartEvent::new(kind, PointerEvent::click(1.0, 1.0), &payload)
    }

    #[test]
    fn listeners_only_see_their_kind_until_unsubscribed() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut dispatcher = Dispatcher::new();
        let sink = Rc::clone(&seen);
        let id = dispatcher.subscribe(ChartEventKind::ElementClick, move |e| {
            sink.borrow_mut().push(e.geometry.clone());
        });

        assert_eq!(dispatcher.emit(&event(ChartEventKind::TooltipShow)), 0);
        assert_eq!(dispatcher.emit(&event(ChartEventKind::ElementClick)), 1);
        assert!(dispatcher.unsubscribe(id));
        assert!(!dispatcher.unsubscribe(id));
        assert_eq!(dispatcher.emit(&event(ChartEventKind::ElementClick)), 0);
        assert_eq!(*seen.borrow(), vec!["bar-0".to_owned()]);
    }
}
