use crate::core::PlotRect;
use crate::interaction::HitTarget;
use crate::render::{
    CanvasLayerKind, DrawItem, GradientDef, Primitive, TextHAlign, TextMeasurer, TextPrimitive,
    TextSize,
};

/// A keyed primitive plus the state it animates in from on first sight.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceItem {
    pub item: DrawItem,
    pub enter: Option<Primitive>,
}

/// Cell-sized drawing handle handed to geometries, axes and the legend.
///
/// Everything pushed is expressed in local coordinates and stored
/// translated by the surface origin. An offscreen surface is used to
/// measure candidate content before committing a layout; it is simply
/// dropped afterwards.
pub struct Surface<'m> {
    origin: (f64, f64),
    width: f64,
    height: f64,
    measurer: &'m dyn TextMeasurer,
    font_family: String,
    offscreen: bool,
    items: Vec<SurfaceItem>,
    gradients: Vec<GradientDef>,
    hit_targets: Vec<HitTarget>,
}

impl<'m> Surface<'m> {
    #[must_use]
    pub fn new(
        measurer: &'m dyn TextMeasurer,
        font_family: impl Into<String>,
        width: f64,
        height: f64,
    ) -> Self {
        Self {
            origin: (0.0, 0.0),
            width,
            height,
            measurer,
            font_family: font_family.into(),
            offscreen: false,
            items: Vec::new(),
            gradients: Vec::new(),
            hit_targets: Vec::new(),
        }
    }

    /// Detached surface used only for measurement.
    #[must_use]
    pub fn offscreen(
        measurer: &'m dyn TextMeasurer,
        font_family: impl Into<String>,
        width: f64,
        height: f64,
    ) -> Self {
        Self {
            offscreen: true,
            ..Self::new(measurer, font_family, width, height)
        }
    }

    /// Translated sub-surface sharing the measurer. Merge it back with
    /// [`Surface::absorb`].
    #[must_use]
    pub fn child(&self, dx: f64, dy: f64, width: f64, height: f64) -> Surface<'m> {
        Surface {
            origin: (self.origin.0 + dx, self.origin.1 + dy),
            width,
            height,
            measurer: self.measurer,
            font_family: self.font_family.clone(),
            offscreen: self.offscreen,
            items: Vec::new(),
            gradients: Vec::new(),
            hit_targets: Vec::new(),
        }
    }

    pub fn absorb(&mut self, child: Surface<'_>) {
        self.items.extend(child.items);
        for gradient in child.gradients {
            self.add_gradient(gradient);
        }
        self.hit_targets.extend(child.hit_targets);
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    #[must_use]
    pub fn origin(&self) -> (f64, f64) {
        self.origin
    }

    #[must_use]
    pub fn is_offscreen(&self) -> bool {
        self.offscreen
    }

    #[must_use]
    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    #[must_use]
    pub fn measurer(&self) -> &'m dyn TextMeasurer {
        self.measurer
    }

    #[must_use]
    pub fn measure_text(&self, text: &str, font_size_px: f64) -> TextSize {
        self.measurer.measure(text, &self.font_family, font_size_px)
    }

    pub fn push(
        &mut self,
        key: impl Into<String>,
        group: impl Into<String>,
        layer: CanvasLayerKind,
        primitive: impl Into<Primitive>,
    ) {
        self.push_item(key.into(), group.into(), layer, primitive.into(), None);
    }

    /// Pushes a primitive with an explicit enter state (e.g. a bar collapsed
    /// onto its baseline).
    pub fn push_entering(
        &mut self,
        key: impl Into<String>,
        group: impl Into<String>,
        layer: CanvasLayerKind,
        primitive: impl Into<Primitive>,
        enter: impl Into<Primitive>,
    ) {
        self.push_item(
            key.into(),
            group.into(),
            layer,
            primitive.into(),
            Some(enter.into()),
        );
    }

    fn push_item(
        &mut self,
        key: String,
        group: String,
        layer: CanvasLayerKind,
        primitive: Primitive,
        enter: Option<Primitive>,
    ) {
        let (dx, dy) = self.origin;
        self.items.push(SurfaceItem {
            item: DrawItem {
                key,
                group,
                layer,
                primitive: primitive.translated(dx, dy),
            },
            enter: enter.map(|p| p.translated(dx, dy)),
        });
    }

    pub fn add_gradient(&mut self, gradient: GradientDef) {
        if !self.gradients.iter().any(|g| g.id == gradient.id) {
            self.gradients.push(gradient);
        }
    }

    pub fn add_hit_target(&mut self, target: HitTarget) {
        let (dx, dy) = self.origin;
        self.hit_targets.push(target.translated(dx, dy));
    }

    /// Drops every item whose key starts with `prefix`.
    pub fn remove_with_prefix(&mut self, prefix: &str) -> usize {
        let before = self.items.len();
        self.items.retain(|entry| !entry.item.key.starts_with(prefix));
        before - self.items.len()
    }

    /// Mutable access to items whose key starts with `prefix`.
    pub fn items_with_prefix_mut<'a>(
        &'a mut self,
        prefix: &'a str,
    ) -> impl Iterator<Item = &'a mut DrawItem> {
        self.items
            .iter_mut()
            .map(|entry| &mut entry.item)
            .filter(move |item| item.key.starts_with(prefix))
    }

    #[must_use]
    pub fn items(&self) -> &[SurfaceItem] {
        &self.items
    }

    #[must_use]
    pub fn gradients(&self) -> &[GradientDef] {
        &self.gradients
    }

    #[must_use]
    pub fn hit_targets(&self) -> &[HitTarget] {
        &self.hit_targets
    }

    /// Bounding box of everything drawn so far, in this surface's local
    /// coordinates.
    #[must_use]
    pub fn bounds(&self) -> Option<PlotRect> {
        let (dx, dy) = self.origin;
        self.items
            .iter()
            .filter_map(|entry| primitive_bounds(&entry.item.primitive, self.measurer, &self.font_family))
            .map(|rect| rect.translate(-dx, -dy))
            .reduce(PlotRect::union)
    }

    #[must_use]
    pub fn into_parts(self) -> (Vec<SurfaceItem>, Vec<GradientDef>, Vec<HitTarget>) {
        (self.items, self.gradients, self.hit_targets)
    }
}

/// Axis-aligned bounds of a primitive, measuring text with `measurer`.
#[must_use]
pub fn primitive_bounds(
    primitive: &Primitive,
    measurer: &dyn TextMeasurer,
    font_family: &str,
) -> Option<PlotRect> {
    match primitive {
        Primitive::Line(line) => Some(rect_from_points(&[(line.x1, line.y1), (line.x2, line.y2)])),
        Primitive::Rect(rect) => Some(rect.rect()),
        Primitive::Polyline(line) if !line.points.is_empty() => Some(rect_from_points(&line.points)),
        Primitive::Polyline(_) => None,
        Primitive::Circle(c) => Some(PlotRect::new(
            c.cx - c.radius,
            c.cy - c.radius,
            c.radius * 2.0,
            c.radius * 2.0,
        )),
        Primitive::Arc(arc) => Some(PlotRect::new(
            arc.cx - arc.outer_radius,
            arc.cy - arc.outer_radius,
            arc.outer_radius * 2.0,
            arc.outer_radius * 2.0,
        )),
        Primitive::Text(text) => Some(text_bounds(text, measurer, font_family)),
    }
}

/// Bounds of a text primitive, honouring alignment and rotation about its
/// anchor.
#[must_use]
pub fn text_bounds(text: &TextPrimitive, measurer: &dyn TextMeasurer, font_family: &str) -> PlotRect {
    let size = measurer.measure(&text.text, font_family, text.font_size_px);
    let left = match text.h_align {
        TextHAlign::Left => 0.0,
        TextHAlign::Center => -size.width / 2.0,
        TextHAlign::Right => -size.width,
    };
    let top = -size.height / 2.0;
    let corners = [
        (left, top),
        (left + size.width, top),
        (left, top + size.height),
        (left + size.width, top + size.height),
    ];
    let theta = text.rotation_deg.to_radians();
    let (sin, cos) = theta.sin_cos();
    let rotated: Vec<(f64, f64)> = corners
        .iter()
        .map(|&(x, y)| (text.x + x * cos - y * sin, text.y + x * sin + y * cos))
        .collect();
    rect_from_points(&rotated)
}

fn rect_from_points(points: &[(f64, f64)]) -> PlotRect {
    let (mut x0, mut y0) = (f64::INFINITY, f64::INFINITY);
    let (mut x1, mut y1) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for &(x, y) in points {
        x0 = x0.min(x);
        y0 = y0.min(y);
        x1 = x1.max(x);
        y1 = y1.max(y);
    }
    PlotRect::new(x0, y0, x1 - x0, y1 - y0)
}
