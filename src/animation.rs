//! Named, cancellable transitions and the keyed tween state they drive.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::trace;

use crate::render::{
    ArcPrimitive, CirclePrimitive, DrawItem, Fill, LinePrimitive, PolylinePrimitive, Primitive,
    RectPrimitive, SurfaceItem, TextPrimitive,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Easing {
    Linear,
    #[default]
    CubicInOut,
    QuadOut,
}

impl Easing {
    #[must_use]
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Self::QuadOut => 1.0 - (1.0 - t) * (1.0 - t),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionSpec {
    pub duration_ms: f64,
    pub delay_ms: f64,
    pub easing: Easing,
}

impl TransitionSpec {
    #[must_use]
    pub const fn new(duration_ms: f64, delay_ms: f64, easing: Easing) -> Self {
        Self {
            duration_ms,
            delay_ms,
            easing,
        }
    }

    /// Zero-length transition, used when animation is disabled.
    #[must_use]
    pub const fn instant() -> Self {
        Self::new(0.0, 0.0, Easing::Linear)
    }
}

impl Default for TransitionSpec {
    fn default() -> Self {
        Self::new(750.0, 0.0, Easing::CubicInOut)
    }
}

/// Continuation scheduled for when a transition completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionEnd {
    /// Show the labels of `group`; they were held back while shapes grew.
    RevealLabels { group: String },
    /// Remove elements of `group` that are animating out.
    DropExited { group: String },
}

#[derive(Debug, Clone)]
struct Transition {
    started_ms: f64,
    spec: TransitionSpec,
    on_end: SmallVec<[TransitionEnd; 2]>,
}

impl Transition {
    fn raw_progress(&self, now_ms: f64) -> f64 {
        let elapsed = now_ms - self.started_ms - self.spec.delay_ms;
        if self.spec.duration_ms <= 0.0 {
            return if elapsed >= 0.0 { 1.0 } else { 0.0 };
        }
        (elapsed / self.spec.duration_ms).clamp(0.0, 1.0)
    }
}

/// Cooperative scheduler driven by the host's clock.
///
/// Starting a transition under a name that is still running replaces it;
/// the replaced transition's continuations never fire.
#[derive(Debug, Default)]
pub struct TransitionScheduler {
    now_ms: f64,
    active: IndexMap<String, Transition>,
    interrupted: usize,
}

impl TransitionScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    pub fn start(
        &mut self,
        name: impl Into<String>,
        spec: TransitionSpec,
        on_end: impl IntoIterator<Item = TransitionEnd>,
    ) {
        let name = name.into();
        let transition = Transition {
            started_ms: self.now_ms,
            spec,
            on_end: on_end.into_iter().collect(),
        };
        if self.active.insert(name.clone(), transition).is_some() {
            self.interrupted += 1;
            trace!(name = %name, "transition interrupted");
        }
    }

    /// Eased progress of `name`; finished or unknown transitions report 1.
    #[must_use]
    pub fn progress(&self, name: &str) -> f64 {
        self.active.get(name).map_or(1.0, |t| {
            t.spec.easing.apply(t.raw_progress(self.now_ms))
        })
    }

    #[must_use]
    pub fn is_active(&self, name: &str) -> bool {
        self.active.contains_key(name)
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    #[must_use]
    pub fn interrupted_count(&self) -> usize {
        self.interrupted
    }

    /// Moves the clock forward and collects continuations of every
    /// transition that completed, in start order.
    pub fn advance(&mut self, now_ms: f64) -> Vec<TransitionEnd> {
        if now_ms.is_finite() && now_ms > self.now_ms {
            self.now_ms = now_ms;
        }
        let now = self.now_ms;
        let mut ended = Vec::new();
        self.active.retain(|_, transition| {
            if transition.raw_progress(now) >= 1.0 {
                ended.extend(transition.on_end.drain(..));
                false
            } else {
                true
            }
        });
        ended
    }

    /// Completes every running transition immediately.
    pub fn finish_all(&mut self) -> Vec<TransitionEnd> {
        self.active
            .drain(..)
            .flat_map(|(_, transition)| transition.on_end)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tween {
    pub previous: Primitive,
    pub current: Primitive,
}

#[derive(Debug, Clone, PartialEq)]
struct AnimatedEntry {
    item: DrawItem,
    tween: Tween,
    exiting: bool,
}

/// Keyed `{ key → tween }` map owned by the chart.
///
/// Committing a new render turns each item's displayed state into the
/// tween's start so interrupted animations continue from where they were.
#[derive(Debug, Default)]
pub struct AnimationState {
    entries: IndexMap<String, AnimatedEntry>,
}

impl AnimationState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn tween(&self, key: &str) -> Option<&Tween> {
        self.entries.get(key).map(|e| &e.tween)
    }

    /// Applies enter/update/exit for a freshly rendered item list.
    ///
    /// `progress` reports the current eased progress of a transition group.
    /// Returns the groups that gained exiting items.
    pub fn commit(
        &mut self,
        items: Vec<SurfaceItem>,
        progress: impl Fn(&str) -> f64,
    ) -> Vec<String> {
        let mut next: IndexMap<String, AnimatedEntry> = IndexMap::with_capacity(items.len());
        for SurfaceItem { item, enter } in items {
            let previous = match self.entries.get(&item.key) {
                Some(old) => displayed(old, progress(&old.item.group)),
                None => enter.unwrap_or_else(|| collapsed(&item.primitive)),
            };
            let tween = Tween {
                previous,
                current: item.primitive.clone(),
            };
            next.insert(
                item.key.clone(),
                AnimatedEntry {
                    item,
                    tween,
                    exiting: false,
                },
            );
        }

        let mut exiting_groups = Vec::new();
        for (key, old) in self.entries.drain(..) {
            if next.contains_key(&key) {
                continue;
            }
            let shown = displayed(&old, progress(&old.item.group));
            if !exiting_groups.contains(&old.item.group) {
                exiting_groups.push(old.item.group.clone());
            }
            next.insert(
                key,
                AnimatedEntry {
                    tween: Tween {
                        current: collapsed(&shown),
                        previous: shown,
                    },
                    exiting: true,
                    item: old.item,
                },
            );
        }
        self.entries = next;
        exiting_groups
    }

    /// Removes exiting items of `group`.
    pub fn drop_exited(&mut self, group: &str) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| !(entry.exiting && entry.item.group == group));
        before - self.entries.len()
    }

    /// Current displayed items, skipping groups rejected by `visible`.
    #[must_use]
    pub fn snapshot(
        &self,
        progress: impl Fn(&str) -> f64,
        visible: impl Fn(&str) -> bool,
    ) -> Vec<DrawItem> {
        let mut cache: HashMap<&str, f64> = HashMap::new();
        self.entries
            .values()
            .filter(|entry| visible(&entry.item.group))
            .map(|entry| {
                let group = entry.item.group.as_str();
                let t = *cache.entry(group).or_insert_with(|| progress(group));
                DrawItem {
                    primitive: displayed(entry, t),
                    ..entry.item.clone()
                }
            })
            .collect()
    }
}

fn displayed(entry: &AnimatedEntry, t: f64) -> Primitive {
    interpolate(&entry.tween.previous, &entry.tween.current, t)
}

/// Collapsed form a primitive enters from and exits to.
#[must_use]
pub fn collapsed(primitive: &Primitive) -> Primitive {
    match primitive {
        Primitive::Rect(rect) => Primitive::Rect(RectPrimitive {
            y: rect.y + rect.height,
            height: 0.0,
            ..rect.clone()
        }),
        Primitive::Circle(circle) => Primitive::Circle(CirclePrimitive {
            radius: 0.0,
            ..*circle
        }),
        Primitive::Arc(arc) => Primitive::Arc(ArcPrimitive {
            end_angle: arc.start_angle,
            ..*arc
        }),
        Primitive::Line(line) => Primitive::Line(LinePrimitive {
            color: line.color.with_alpha(0.0),
            ..*line
        }),
        Primitive::Polyline(line) => Primitive::Polyline(PolylinePrimitive {
            color: line.color.with_alpha(0.0),
            ..line.clone()
        }),
        Primitive::Text(text) => Primitive::Text(TextPrimitive {
            color: text.color.with_alpha(0.0),
            ..text.clone()
        }),
    }
}

/// Interpolates between two states of the same element. Mismatched kinds
/// jump straight to `to`.
#[must_use]
pub fn interpolate(from: &Primitive, to: &Primitive, t: f64) -> Primitive {
    if t >= 1.0 {
        return to.clone();
    }
    let t = t.max(0.0);
    let mix = |a: f64, b: f64| a + (b - a) * t;
    match (from, to) {
        (Primitive::Rect(a), Primitive::Rect(b)) => Primitive::Rect(RectPrimitive {
            x: mix(a.x, b.x),
            y: mix(a.y, b.y),
            width: mix(a.width, b.width),
            height: mix(a.height, b.height),
            opacity: mix(a.opacity, b.opacity),
            fill: match (&a.fill, &b.fill) {
                (Fill::Solid(ca), Fill::Solid(cb)) => Fill::Solid(ca.lerp(*cb, t)),
                _ => b.fill.clone(),
            },
            ..b.clone()
        }),
        (Primitive::Circle(a), Primitive::Circle(b)) => Primitive::Circle(CirclePrimitive {
            cx: mix(a.cx, b.cx),
            cy: mix(a.cy, b.cy),
            radius: mix(a.radius, b.radius),
            fill: a.fill.lerp(b.fill, t),
            opacity: mix(a.opacity, b.opacity),
        }),
        (Primitive::Arc(a), Primitive::Arc(b)) => Primitive::Arc(ArcPrimitive {
            cx: mix(a.cx, b.cx),
            cy: mix(a.cy, b.cy),
            inner_radius: mix(a.inner_radius, b.inner_radius),
            outer_radius: mix(a.outer_radius, b.outer_radius),
            start_angle: mix(a.start_angle, b.start_angle),
            end_angle: mix(a.end_angle, b.end_angle),
            fill: a.fill.lerp(b.fill, t),
        }),
        (Primitive::Line(a), Primitive::Line(b)) => Primitive::Line(LinePrimitive {
            x1: mix(a.x1, b.x1),
            y1: mix(a.y1, b.y1),
            x2: mix(a.x2, b.x2),
            y2: mix(a.y2, b.y2),
            stroke_width: mix(a.stroke_width, b.stroke_width),
            color: a.color.lerp(b.color, t),
        }),
        (Primitive::Polyline(a), Primitive::Polyline(b)) if a.points.len() == b.points.len() => {
            Primitive::Polyline(PolylinePrimitive {
                points: a
                    .points
                    .iter()
                    .zip(&b.points)
                    .map(|(pa, pb)| (mix(pa.0, pb.0), mix(pa.1, pb.1)))
                    .collect(),
                stroke_width: mix(a.stroke_width, b.stroke_width),
                color: a.color.lerp(b.color, t),
            })
        }
        (Primitive::Text(a), Primitive::Text(b)) => Primitive::Text(TextPrimitive {
            x: mix(a.x, b.x),
            y: mix(a.y, b.y),
            font_size_px: mix(a.font_size_px, b.font_size_px),
            color: a.color.lerp(b.color, t),
            rotation_deg: mix(a.rotation_deg, b.rotation_deg),
            ..b.clone()
        }),
        _ => to.clone(),
    }
}
