pub mod colors;

pub use colors::Color;

use tempgraph_config::ThemeConfig;

/// Compiled theme derived from [`ThemeConfig`].
///
/// Calling [`Theme::from_config`] is infallible: invalid color strings fall
/// back to the built-in palette.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub background: Color,
    pub foreground: Color,
    /// Plot line and latest-value accent.
    pub accent:     Color,
    /// Chart border and grid lines.
    pub grid:       Color,
    pub font_size:  f32,
}

impl Theme {
    /// Build a [`Theme`] from the config file's `[theme]` section.
    pub fn from_config(cfg: &ThemeConfig) -> Self {
        Self {
            background: Color::from_hex(&cfg.background).unwrap_or(Color::BASE),
            foreground: Color::from_hex(&cfg.foreground).unwrap_or(Color::TEXT),
            accent:     Color::from_hex(&cfg.accent).unwrap_or(Color::BLUE),
            grid:       Color::from_hex(&cfg.grid).unwrap_or(Color::SURFACE),
            font_size:  if cfg.font_size > 0.0 { cfg.font_size } else { 16.0 },
        }
    }

    /// Fill under the plotted line.
    pub fn area_fill(&self) -> Color {
        self.accent.with_alpha(0.1)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_config(&ThemeConfig::default())
    }
}
