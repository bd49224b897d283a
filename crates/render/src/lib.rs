//! Render path: turns window snapshots into chart frames on a fixed cadence
//! and presents them to a [`DisplaySurface`].
//!
//! The loop never touches a surface itself.  Frames travel over a channel to
//! whichever task owns the surface, which calls [`present_or_log`].

pub mod frame;

pub use frame::{build_frame, PLACEHOLDER};

use std::time::Duration;
use tempgraph_config::ChartConfig;
use tempgraph_core::{BoundedSeries, ChartFrame, DisplaySurface, Result};
use tokio::sync::{mpsc, watch};
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Frames buffered for the display task.  Each frame is complete state, so a
/// slow consumer only ever needs the newest one.
const FRAME_QUEUE: usize = 2;

/// Periodic snapshot-and-draw loop over a shared [`BoundedSeries`].
pub struct RenderLoop {
    series: BoundedSeries,
    period: Duration,
    chart:  watch::Receiver<ChartConfig>,
}

impl RenderLoop {
    /// `chart` is re-read on every tick so axis settings can change live.
    pub fn new(series: BoundedSeries, period: Duration, chart: watch::Receiver<ChartConfig>) -> Self {
        Self { series, period, chart }
    }

    /// Compute the frame for the window as it is right now.
    pub fn tick(&self) -> ChartFrame {
        let (snapshot, latest) = self.series.view();
        build_frame(&snapshot, latest.as_ref(), &self.chart.borrow())
    }

    /// Spawn the loop on the current Tokio runtime.  It emits one frame per
    /// period, regardless of whether new samples arrived, and stops when
    /// `cancel` fires or the receiver is dropped.
    pub fn spawn(self, cancel: CancellationToken) -> mpsc::Receiver<ChartFrame> {
        let (tx, rx) = mpsc::channel(FRAME_QUEUE);

        tokio::spawn(async move {
            let mut ticker = time::interval(self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(period = ?self.period, "Render loop starting");

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                match tx.try_send(self.tick()) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        debug!("Display task behind; dropping frame");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => break, // receiver dropped
                }
            }

            info!("Render loop stopped");
        });

        rx
    }
}

/// Push one frame to `surface`.
pub fn present<S: DisplaySurface + ?Sized>(frame: &ChartFrame, surface: &mut S) -> Result<()> {
    surface.set_latest_value_label(&frame.label)?;
    surface.set_series_points(&frame.points)?;
    surface.set_axis_range(frame.x_range.0, frame.x_range.1)?;
    surface.set_value_range(frame.y_range.0, frame.y_range.1)
}

/// [`present`], with failures logged at the tick boundary instead of
/// propagated.  Returns whether the frame was applied in full.
pub fn present_or_log<S: DisplaySurface + ?Sized>(frame: &ChartFrame, surface: &mut S) -> bool {
    match present(frame, surface) {
        Ok(()) => true,
        Err(e) => {
            warn!("Frame dropped: {e}");
            false
        }
    }
}
