use crate::{display::ChartFrame, state::ConnectionState};

/// All messages that flow into the display task.
///
/// Sources:
/// - Render loop        → `Frame`
/// - Ingestion worker   → `Connection`, `IngestStopped`
/// - Config watcher     → `ConfigReloaded`
/// - Ctrl-C / window    → `Shutdown`
#[derive(Debug, Clone)]
pub enum Message {
    /// A complete chart state computed off the display task.
    Frame(ChartFrame),
    /// Broker connection changed state.
    Connection(ConnectionState),
    /// Config file changed on disk.
    ConfigReloaded,
    /// The ingestion worker returned (only after cancellation).
    IngestStopped,
    /// Graceful shutdown requested.
    Shutdown,
}
