pub mod display;
pub mod error;
pub mod event;
pub mod series;
pub mod state;

pub use display::{ChartFrame, DisplaySurface};
pub use error::{GraphError, Result};
pub use event::Message;
pub use series::{BoundedSeries, Sample};
pub use state::ConnectionState;
