use crate::error::Result;
use chrono::{DateTime, Local};

/// One complete render state, computed off the display task and handed to it
/// through a queue.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartFrame {
    /// Text for the current-value label.
    pub label: String,
    /// Receive time of the newest sample, if any.
    pub updated_at: Option<DateTime<Local>>,
    /// Plotted points, `(index in window, value)`.
    pub points: Vec<(f64, f64)>,
    /// Visible x-axis range.
    pub x_range: (f64, f64),
    /// Visible y-axis range.
    pub y_range: (f64, f64),
}

/// Something the render path can draw a chart and a latest-value label on.
///
/// Implementations may live on a context that is not safe to touch from
/// background tasks; callers are expected to present frames from the owning
/// context only.
pub trait DisplaySurface {
    fn set_latest_value_label(&mut self, text: &str) -> Result<()>;

    fn set_series_points(&mut self, points: &[(f64, f64)]) -> Result<()>;

    fn set_axis_range(&mut self, x_min: f64, x_max: f64) -> Result<()>;

    /// Vertical bounds.  Surfaces with a fixed y-axis can ignore this.
    fn set_value_range(&mut self, _y_min: f64, _y_max: f64) -> Result<()> {
        Ok(())
    }
}
