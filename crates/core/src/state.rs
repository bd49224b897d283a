use std::fmt;

/// Lifecycle of the broker connection owned by the ingestion worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    /// Connected and subscribed to the configured topic.
    Subscribed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting   => "connecting",
            Self::Subscribed   => "subscribed",
        };
        f.write_str(label)
    }
}
