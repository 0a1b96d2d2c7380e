use std::collections::HashSet;
use std::fmt;

use tracing::debug;

use crate::animation::{AnimationState, TransitionScheduler};
use crate::core::{Accessor, Formatter, Row};
use crate::error::{ChartError, ChartResult};
use crate::geometry::{Channels, Geometry};
use crate::interaction::{ChartEvent, ChartEventKind, Dispatcher, HitTarget, SubscriptionId};
use crate::render::{GradientDef, HeuristicTextMeasurer, RenderFrame, Renderer, TextMeasurer};

#[cfg(feature = "cairo-backend")]
use crate::render::CairoContextRenderer;

use super::compose::ChartLayout;
use super::render_coordinator::RenderCoordinator;
use super::ChartOptions;

/// A geometry together with the stable key it was registered under.
pub(super) struct GeometrySlot {
    pub(super) key: String,
    pub(super) geometry: Box<dyn Geometry>,
}

/// Composer facade consumed by host applications.
///
/// Holds retained configuration (options, chart-level channels, the
/// geometry list) and the state that must survive between renders: tweens,
/// running transitions, hit targets and subscribers. Prepared data and
/// scales are rebuilt on every [`Chart::render`].
pub struct Chart<R: Renderer> {
    pub(super) target: Option<R>,
    pub(super) options: ChartOptions,
    pub(super) channels: Channels,
    pub(super) facet: Option<Accessor>,
    pub(super) measurer: Box<dyn TextMeasurer>,
    pub(super) geometries: Vec<GeometrySlot>,
    pub(super) data: Option<Vec<Row>>,
    pub(super) dispatcher: Dispatcher,
    pub(super) scheduler: TransitionScheduler,
    pub(super) animation: AnimationState,
    pub(super) hidden_labels: HashSet<String>,
    pub(super) gradients: Vec<GradientDef>,
    pub(super) hit_targets: Vec<HitTarget>,
    pub(super) hovered: Option<String>,
    pub(super) layout: Option<ChartLayout>,
    pub(super) next_geometry_index: usize,
}

impl<R: Renderer> fmt::Debug for Chart<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chart")
            .field("has_target", &self.target.is_some())
            .field("options", &self.options)
            .field("geometries", &self.geometry_keys())
            .field("rows", &self.data.as_ref().map(Vec::len))
            .field("running_transitions", &self.scheduler.active_count())
            .finish_non_exhaustive()
    }
}

impl<R: Renderer> Chart<R> {
    pub fn new(options: ChartOptions) -> ChartResult<Self> {
        options.validate()?;
        Ok(Self {
            target: None,
            options,
            channels: Channels::default(),
            facet: None,
            measurer: Box::new(HeuristicTextMeasurer),
            geometries: Vec::new(),
            data: None,
            dispatcher: Dispatcher::new(),
            scheduler: TransitionScheduler::new(),
            animation: AnimationState::new(),
            hidden_labels: HashSet::new(),
            gradients: Vec::new(),
            hit_targets: Vec::new(),
            hovered: None,
            layout: None,
            next_geometry_index: 0,
        })
    }

    #[must_use]
    pub fn with_target(mut self, target: R) -> Self {
        self.target = Some(target);
        self
    }

    pub fn set_target(&mut self, target: R) {
        self.target = Some(target);
    }

    #[must_use]
    pub fn target(&self) -> Option<&R> {
        self.target.as_ref()
    }

    pub fn take_target(&mut self) -> Option<R> {
        self.target.take()
    }

    /// Replaces the text measurer used by the layout passes.
    #[must_use]
    pub fn with_measurer(mut self, measurer: impl TextMeasurer + 'static) -> Self {
        self.measurer = Box::new(measurer);
        self
    }

    #[must_use]
    pub fn options(&self) -> &ChartOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: ChartOptions) -> ChartResult<()> {
        options.validate()?;
        self.options = options;
        Ok(())
    }

    #[must_use]
    pub fn channels(&self) -> &Channels {
        &self.channels
    }

    /// Chart-level defaults inherited by every geometry that leaves a
    /// channel unset.
    pub fn channels_mut(&mut self) -> &mut Channels {
        &mut self.channels
    }

    #[must_use]
    pub fn with_x(mut self, accessor: Accessor) -> Self {
        self.channels.x = Some(accessor);
        self
    }

    #[must_use]
    pub fn with_y(mut self, accessor: Accessor) -> Self {
        self.channels.y = Some(accessor);
        self
    }

    #[must_use]
    pub fn with_colour(mut self, accessor: Accessor) -> Self {
        self.channels.colour = Some(accessor);
        self
    }

    #[must_use]
    pub fn with_size(mut self, accessor: Accessor) -> Self {
        self.channels.size = Some(accessor);
        self
    }

    #[must_use]
    pub fn with_format_x(mut self, formatter: Formatter) -> Self {
        self.channels.format_x = Some(formatter);
        self
    }

    #[must_use]
    pub fn with_format_y(mut self, formatter: Formatter) -> Self {
        self.channels.format_y = Some(formatter);
        self
    }

    #[must_use]
    pub fn with_format_label(mut self, formatter: Formatter) -> Self {
        self.channels.format_label = Some(formatter);
        self
    }

    #[must_use]
    pub fn with_facet(mut self, accessor: Accessor) -> Self {
        self.facet = Some(accessor);
        self
    }

    #[must_use]
    pub fn facet(&self) -> Option<&Accessor> {
        self.facet.as_ref()
    }

    pub fn set_facet(&mut self, accessor: Option<Accessor>) {
        self.facet = accessor;
    }

    /// Registers a geometry and returns its stable key: the configured name,
    /// or `<kind>-<n>` in registration order.
    pub fn add_geometry(&mut self, geometry: impl Geometry + 'static) -> ChartResult<String> {
        self.add_boxed_geometry(Box::new(geometry))
    }

    pub fn add_boxed_geometry(&mut self, geometry: Box<dyn Geometry>) -> ChartResult<String> {
        geometry.options().validate()?;
        let key = match &geometry.options().name {
            Some(name) => name.clone(),
            None => format!("{}-{}", geometry.kind().name(), self.next_geometry_index),
        };
        if self.geometries.iter().any(|slot| slot.key == key) {
            return Err(ChartError::Configuration(format!(
                "geometry key `{key}` is already registered"
            )));
        }
        self.next_geometry_index += 1;
        debug!(key = %key, kind = geometry.kind().name(), "geometry registered");
        self.geometries.push(GeometrySlot {
            key: key.clone(),
            geometry,
        });
        Ok(key)
    }

    pub fn with_geometry(mut self, geometry: impl Geometry + 'static) -> ChartResult<Self> {
        self.add_geometry(geometry)?;
        Ok(self)
    }

    pub fn remove_geometry(&mut self, key: &str) -> bool {
        let before = self.geometries.len();
        self.geometries.retain(|slot| slot.key != key);
        self.geometries.len() != before
    }

    #[must_use]
    pub fn geometry(&self, key: &str) -> Option<&dyn Geometry> {
        self.geometries
            .iter()
            .find(|slot| slot.key == key)
            .map(|slot| slot.geometry.as_ref())
    }

    pub fn geometry_mut(&mut self, key: &str) -> Option<&mut (dyn Geometry + 'static)> {
        self.geometries
            .iter_mut()
            .find(|slot| slot.key == key)
            .map(|slot| slot.geometry.as_mut())
    }

    /// Keys in registration order.
    #[must_use]
    pub fn geometry_keys(&self) -> Vec<&str> {
        self.geometries.iter().map(|slot| slot.key.as_str()).collect()
    }

    pub fn set_data(&mut self, rows: Vec<Row>) {
        self.data = Some(rows);
    }

    #[must_use]
    pub fn with_data(mut self, rows: Vec<Row>) -> Self {
        self.data = Some(rows);
        self
    }

    pub fn clear_data(&mut self) {
        self.data = None;
    }

    #[must_use]
    pub fn data(&self) -> Option<&[Row]> {
        self.data.as_deref()
    }

    /// Layout computed by the most recent successful render.
    #[must_use]
    pub fn layout(&self) -> Option<&ChartLayout> {
        self.layout.as_ref()
    }

    #[must_use]
    pub fn hit_targets(&self) -> &[HitTarget] {
        &self.hit_targets
    }

    /// Composes the current data and paints the first animation frame.
    ///
    /// Without data this logs a warning and draws nothing.
    pub fn render(&mut self) -> ChartResult<()> {
        RenderCoordinator::render(self)
    }

    /// Advances the animation clock to `now_ms` and repaints.
    pub fn tick(&mut self, now_ms: f64) -> ChartResult<()> {
        RenderCoordinator::tick(self, now_ms)
    }

    /// Jumps every running transition to its end state and repaints.
    pub fn finish_transitions(&mut self) -> ChartResult<()> {
        RenderCoordinator::finish(self)
    }

    /// Frame as it would be painted at the current animation time.
    #[must_use]
    pub fn current_frame(&self) -> RenderFrame {
        RenderCoordinator::frame(self)
    }

    /// Paints the current frame into a host-owned Cairo context.
    #[cfg(feature = "cairo-backend")]
    pub fn render_on_cairo_context(&mut self, context: &cairo::Context) -> ChartResult<()>
    where
        R: CairoContextRenderer,
    {
        RenderCoordinator::render_on_cairo_context(self, context)
    }

    #[must_use]
    pub fn has_running_transitions(&self) -> bool {
        self.scheduler.active_count() > 0
    }

    #[must_use]
    pub fn interrupted_transitions(&self) -> usize {
        self.scheduler.interrupted_count()
    }

    pub fn subscribe(
        &mut self,
        kind: ChartEventKind,
        listener: impl FnMut(&ChartEvent) + 'static,
    ) -> SubscriptionId {
        self.dispatcher.subscribe(kind, listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.dispatcher.unsubscribe(id)
    }

    #[must_use]
    pub fn into_target(self) -> Option<R> {
        self.target
    }
}
