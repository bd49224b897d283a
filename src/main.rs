//! tempgraph: live MQTT temperature chart.
//!
//! Run with:  `RUST_LOG=info tempgraph`
//!
//! Broker, topic and window size come from
//! `$XDG_CONFIG_HOME/tempgraph/tempgraph.toml` and `TEMPGRAPH_*` variables.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Structured logging; RUST_LOG controls verbosity (default: info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("tempgraph v{} starting", env!("CARGO_PKG_VERSION"));

    tempgraph_gui::run().map_err(Into::into)
}
