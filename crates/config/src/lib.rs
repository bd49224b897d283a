pub mod schema;
pub mod watcher;

pub use schema::{BrokerConfig, ChartConfig, GraphConfig, ThemeConfig, WindowConfig};
pub use watcher::spawn_watcher;

use std::path::{Path, PathBuf};
use tempgraph_core::{GraphError, Result};

/// Environment variables that override the `[broker]` section.
pub const ENV_BROKER_HOST: &str = "TEMPGRAPH_BROKER_HOST";
pub const ENV_BROKER_PORT: &str = "TEMPGRAPH_BROKER_PORT";
pub const ENV_TOPIC: &str = "TEMPGRAPH_TOPIC";

/// Load configuration from a TOML file, apply environment overrides and
/// validate the result.  A missing file yields `GraphConfig::default()` so the
/// monitor always starts with sensible settings.
pub fn load(path: impl AsRef<Path>) -> Result<GraphConfig> {
    let mut config = read_file(path.as_ref())?;
    apply_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate(&config)?;
    Ok(config)
}

fn read_file(path: &Path) -> Result<GraphConfig> {
    if !path.exists() {
        tracing::warn!(
            "Config file not found at '{}'; using defaults.",
            path.display()
        );
        return Ok(GraphConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| GraphError::Config(format!("cannot read '{}': {e}", path.display())))?;

    toml::from_str(&raw).map_err(|e| GraphError::Config(format!("TOML parse error: {e}")))
}

/// Apply `TEMPGRAPH_*` overrides looked up through `lookup`.
pub fn apply_overrides(
    config: &mut GraphConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(host) = lookup(ENV_BROKER_HOST) {
        config.broker.host = host;
    }
    if let Some(port) = lookup(ENV_BROKER_PORT) {
        config.broker.port = port
            .trim()
            .parse()
            .map_err(|e| GraphError::Config(format!("{ENV_BROKER_PORT}='{port}': {e}")))?;
    }
    if let Some(topic) = lookup(ENV_TOPIC) {
        config.broker.topic = topic;
    }
    Ok(())
}

/// Reject settings the monitor cannot run with.
pub fn validate(config: &GraphConfig) -> Result<()> {
    if config.broker.host.trim().is_empty() {
        return Err(GraphError::Config("broker.host must not be empty".into()));
    }
    if config.broker.topic.trim().is_empty() {
        return Err(GraphError::Config("broker.topic must not be empty".into()));
    }
    if config.window.refresh_ms == 0 {
        return Err(GraphError::Config("window.refresh_ms must be positive".into()));
    }
    let chart = &config.chart;
    if !(chart.y_min.is_finite() && chart.y_max.is_finite()) || chart.y_min >= chart.y_max {
        return Err(GraphError::Config(format!(
            "chart.y_min ({}) must be below chart.y_max ({})",
            chart.y_min, chart.y_max
        )));
    }
    Ok(())
}

/// Names of the sections whose changes only take effect after a restart.
pub fn restart_required(old: &GraphConfig, new: &GraphConfig) -> Vec<&'static str> {
    let mut sections = Vec::new();
    if old.broker != new.broker {
        sections.push("broker");
    }
    if old.window != new.window {
        sections.push("window");
    }
    sections
}

/// Return the default config path, honouring `$XDG_CONFIG_HOME`.
pub fn default_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("tempgraph").join("tempgraph.toml")
}
