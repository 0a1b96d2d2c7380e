mod dispatcher;

use serde::{Deserialize, Serialize};

use crate::core::{Datum, PlotRect, Row};

pub use dispatcher::{ChartEvent, ChartEventKind, Dispatcher, SubscriptionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerKind {
    Move,
    Click,
    Leave,
}

/// Raw pointer input forwarded by the host, in chart pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub x: f64,
    pub y: f64,
}

impl PointerEvent {
    #[must_use]
    pub fn moved(x: f64, y: f64) -> Self {
        Self {
            kind: PointerKind::Move,
            x,
            y,
        }
    }

    #[must_use]
    pub fn click(x: f64, y: f64) -> Self {
        Self {
            kind: PointerKind::Click,
            x,
            y,
        }
    }

    #[must_use]
    pub fn leave() -> Self {
        Self {
            kind: PointerKind::Leave,
            x: f64::NAN,
            y: f64::NAN,
        }
    }
}

/// Data attached to a hoverable element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitPayload {
    pub data_point: Row,
    pub series: String,
    pub series_index: usize,
    pub value: Datum,
    pub geometry: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HitShape {
    Rect(PlotRect),
    Circle {
        cx: f64,
        cy: f64,
        radius: f64,
    },
    /// Angles in radians, clockwise from 12 o'clock.
    Sector {
        cx: f64,
        cy: f64,
        inner_radius: f64,
        outer_radius: f64,
        start_angle: f64,
        end_angle: f64,
    },
}

impl HitShape {
    #[must_use]
    pub fn contains(self, x: f64, y: f64) -> bool {
        match self {
            Self::Rect(rect) => rect.contains(x, y),
            Self::Circle { cx, cy, radius } => (x - cx).hypot(y - cy) <= radius,
            Self::Sector {
                cx,
                cy,
                inner_radius,
                outer_radius,
                start_angle,
                end_angle,
            } => {
                let distance = (x - cx).hypot(y - cy);
                if distance < inner_radius || distance > outer_radius {
                    return false;
                }
                let angle = (x - cx).atan2(cy - y).rem_euclid(std::f64::consts::TAU);
                angle >= start_angle && angle <= end_angle
            }
        }
    }

    #[must_use]
    pub fn translated(self, dx: f64, dy: f64) -> Self {
        match self {
            Self::Rect(rect) => Self::Rect(rect.translate(dx, dy)),
            Self::Circle { cx, cy, radius } => Self::Circle {
                cx: cx + dx,
                cy: cy + dy,
                radius,
            },
            Self::Sector {
                cx,
                cy,
                inner_radius,
                outer_radius,
                start_angle,
                end_angle,
            } => Self::Sector {
                cx: cx + dx,
                cy: cy + dy,
                inner_radius,
                outer_radius,
                start_angle,
                end_angle,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub x: f64,
    pub y: f64,
    pub key: String,
    pub payload: HitPayload,
}

/// Pointer-sensitive region committed by a render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HitTarget {
    Element {
        key: String,
        shape: HitShape,
        payload: HitPayload,
    },
    /// Shared rectangle resolving the point nearest to the pointer along x.
    Tracking { area: PlotRect, points: Vec<TrackPoint> },
}

impl HitTarget {
    /// Element key and payload under `(x, y)`, if any.
    #[must_use]
    pub fn hit(&self, x: f64, y: f64) -> Option<(&str, &HitPayload)> {
        match self {
            Self::Element {
                key,
                shape,
                payload,
            } => shape.contains(x, y).then_some((key.as_str(), payload)),
            Self::Tracking { area, points } => {
                if !area.contains(x, y) {
                    return None;
                }
                points
                    .iter()
                    .min_by(|a, b| (a.x - x).abs().total_cmp(&(b.x - x).abs()))
                    .map(|p| (p.key.as_str(), &p.payload))
            }
        }
    }

    #[must_use]
    pub fn translated(self, dx: f64, dy: f64) -> Self {
        match self {
            Self::Element {
                key,
                shape,
                payload,
            } => Self::Element {
                key,
                shape: shape.translated(dx, dy),
                payload,
            },
            Self::Tracking { area, points } => Self::Tracking {
                area: area.translate(dx, dy),
                points: points
                    .into_iter()
                    .map(|p| TrackPoint {
                        x: p.x + dx,
                        y: p.y + dy,
                        ..p
                    })
                    .collect(),
            },
        }
    }
}

/// Topmost target under the pointer. Later targets sit above earlier ones.
#[must_use]
pub fn hit_test(targets: &[HitTarget], x: f64, y: f64) -> Option<(&str, &HitPayload)> {
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    targets.iter().rev().find_map(|target| target.hit(x, y))
}
