use tracing::{debug, warn};

use crate::animation::{TransitionEnd, TransitionSpec};
use crate::error::{ChartError, ChartResult};
use crate::interaction::PointerEvent;
use crate::render::{RenderFrame, Renderer};

use super::Chart;
use super::compose::compose;

#[cfg(feature = "cairo-backend")]
use crate::render::CairoContextRenderer;

pub(super) struct RenderCoordinator;

impl RenderCoordinator {
    /// Full pass: compose, commit tweens, start named transitions, paint.
    pub(super) fn render<R: Renderer>(chart: &mut Chart<R>) -> ChartResult<()> {
        if chart.target.is_none() {
            return Err(ChartError::MissingRenderTarget);
        }
        let Some(rows) = chart.data.as_deref() else {
            warn!("render requested before data was set; nothing drawn");
            return Ok(());
        };
        let composition = compose(chart, rows)?;

        // progress is read before the new transitions replace the old ones
        let scheduler = &chart.scheduler;
        let exiting = chart
            .animation
            .commit(composition.items, |group| scheduler.progress(group));

        for group in &composition.groups {
            chart.hidden_labels.insert(group.label_group.clone());
            chart.scheduler.start(
                group.shape_group.as_str(),
                group.spec,
                [
                    TransitionEnd::RevealLabels {
                        group: group.label_group.clone(),
                    },
                    TransitionEnd::DropExited {
                        group: group.shape_group.clone(),
                    },
                ],
            );
        }
        let fallback = if chart.options.style.no_animation == Some(true) {
            TransitionSpec::instant()
        } else {
            TransitionSpec::default()
        };
        for group in exiting {
            if composition.groups.iter().any(|g| g.shape_group == group) {
                continue;
            }
            chart.scheduler.start(
                group.as_str(),
                fallback,
                [TransitionEnd::DropExited {
                    group: group.clone(),
                }],
            );
        }

        // the open tooltip belongs to the previous targets
        chart.hide_tooltip(PointerEvent::leave());
        chart.hit_targets = composition.hit_targets;
        chart.gradients = composition.gradients;
        chart.layout = Some(composition.layout);

        let now = chart.scheduler.now_ms();
        Self::settle(chart, now);
        Self::paint(chart)
    }

    pub(super) fn tick<R: Renderer>(chart: &mut Chart<R>, now_ms: f64) -> ChartResult<()> {
        if chart.target.is_none() {
            return Err(ChartError::MissingRenderTarget);
        }
        Self::settle(chart, now_ms);
        Self::paint(chart)
    }

    pub(super) fn finish<R: Renderer>(chart: &mut Chart<R>) -> ChartResult<()> {
        if chart.target.is_none() {
            return Err(ChartError::MissingRenderTarget);
        }
        let ended = chart.scheduler.finish_all();
        Self::apply_ends(chart, ended);
        Self::paint(chart)
    }

    #[cfg(feature = "cairo-backend")]
    pub(super) fn render_on_cairo_context<R: Renderer + CairoContextRenderer>(
        chart: &mut Chart<R>,
        context: &cairo::Context,
    ) -> ChartResult<()> {
        let frame = Self::frame(chart);
        frame.validate()?;
        let target = chart
            .target
            .as_mut()
            .ok_or(ChartError::MissingRenderTarget)?;
        target.render_on_cairo_context(context, &frame)
    }

    fn settle<R: Renderer>(chart: &mut Chart<R>, now_ms: f64) {
        let ended = chart.scheduler.advance(now_ms);
        Self::apply_ends(chart, ended);
    }

    fn apply_ends<R: Renderer>(chart: &mut Chart<R>, ended: Vec<TransitionEnd>) {
        for end in ended {
            match end {
                TransitionEnd::RevealLabels { group } => {
                    chart.hidden_labels.remove(&group);
                }
                TransitionEnd::DropExited { group } => {
                    let dropped = chart.animation.drop_exited(&group);
                    if dropped > 0 {
                        debug!(group = %group, dropped, "exited elements removed");
                    }
                }
            }
        }
    }

    /// Frame at the scheduler's current time.
    pub(super) fn frame<R: Renderer>(chart: &Chart<R>) -> RenderFrame {
        let scheduler = &chart.scheduler;
        let hidden = &chart.hidden_labels;
        let mut frame = RenderFrame::new(chart.options.viewport);
        frame.items = chart.animation.snapshot(
            |group| scheduler.progress(group),
            |group| !hidden.contains(group),
        );
        frame.gradients = chart.gradients.clone();
        frame
    }

    fn paint<R: Renderer>(chart: &mut Chart<R>) -> ChartResult<()> {
        let frame = Self::frame(chart);
        frame.validate()?;
        let target = chart
            .target
            .as_mut()
            .ok_or(ChartError::MissingRenderTarget)?;
        target.render(&frame)
    }
}
