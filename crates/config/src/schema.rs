use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::time::Duration;

const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(50) {
    Some(n) => n,
    None => unreachable!(),
};

/// Root configuration structure parsed from `tempgraph.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Where the readings come from.
    pub broker: BrokerConfig,
    /// History window and refresh cadence.
    pub window: WindowConfig,
    /// Chart axis settings.
    pub chart: ChartConfig,
    /// Theme / visual settings.
    pub theme: ThemeConfig,
}

/// MQTT broker connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    /// Topic carrying one decimal reading per message.
    pub topic: String,
    /// Client identifier.  Empty = `tempgraph-<pid>`.
    pub client_id: String,
    pub keep_alive_secs: u64,
    /// Pause between a failed/dropped connection and the next attempt.
    pub reconnect_delay_ms: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host:               "test.mosquitto.org".to_string(),
            port:               1883,
            topic:              "temperaturas/sonda1".to_string(),
            client_id:          String::new(),
            keep_alive_secs:    60,
            reconnect_delay_ms: 2_000,
        }
    }
}

impl BrokerConfig {
    /// Configured client id, or one derived from the process id.
    pub fn effective_client_id(&self) -> String {
        if self.client_id.trim().is_empty() {
            format!("tempgraph-{}", std::process::id())
        } else {
            self.client_id.clone()
        }
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

/// Size of the in-memory history and how often it is redrawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Number of samples kept (and plotted).
    pub capacity: NonZeroUsize,
    /// Redraw period in milliseconds.
    pub refresh_ms: u64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            capacity:   DEFAULT_CAPACITY,
            refresh_ms: 500,
        }
    }
}

impl WindowConfig {
    pub fn refresh_period(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }
}

/// Chart axis settings.  Reloaded live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Lower y bound used when `auto_scale` is off (or the window is empty).
    pub y_min: f64,
    /// Upper y bound used when `auto_scale` is off (or the window is empty).
    pub y_max: f64,
    /// Fit the y-axis to the data currently in the window.
    pub auto_scale: bool,
    /// Unit suffix appended to the current-value label.
    pub unit: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            y_min:      -50.0,
            y_max:      100.0,
            auto_scale: false,
            unit:       "°C".to_string(),
        }
    }
}

/// Theme / styling configuration.  Reloaded live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Window background color (hex, e.g. `"#1e1e2e"`).
    pub background: String,
    /// Text color.
    pub foreground: String,
    /// Plot line color.
    pub accent: String,
    /// Chart border and grid color.
    pub grid: String,
    /// Base font size in points.
    pub font_size: f32,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            background: "#1e1e2e".to_string(), // Catppuccin Mocha base
            foreground: "#cdd6f4".to_string(), // Catppuccin Mocha text
            accent:     "#89b4fa".to_string(), // Catppuccin Mocha blue
            grid:       "#45475a".to_string(), // Catppuccin Mocha surface1
            font_size:  16.0,
        }
    }
}
