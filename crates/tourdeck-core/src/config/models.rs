use super::defaults;
use serde::{Deserialize, Serialize};

/// Top-level configuration; one TOML table per concern.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TourConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub scroll: ScrollConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlaybackConfig {
    #[serde(default = "crate::config::defaults::default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "crate::config::defaults::default_dwell_ms")]
    pub dwell_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: defaults::default_tick_interval_ms(),
            dwell_ms: defaults::default_dwell_ms(),
        }
    }
}

/// Crossing lines are fractions of the viewport height measured from its top.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScrollConfig {
    #[serde(default = "crate::config::defaults::default_enter_fraction")]
    pub enter_fraction: f32,
    #[serde(default = "crate::config::defaults::default_leave_fraction")]
    pub leave_fraction: f32,
    #[serde(default = "crate::config::defaults::default_viewport_height")]
    pub viewport_height: f32,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            enter_fraction: defaults::default_enter_fraction(),
            leave_fraction: defaults::default_leave_fraction(),
            viewport_height: defaults::default_viewport_height(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "crate::config::defaults::default_log_level")]
    pub log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: defaults::default_log_level(),
        }
    }
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    #[default]
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl TourConfig {
    /// Pull every field back into its supported range.
    pub fn sanitized(mut self) -> Self {
        self.playback.tick_interval_ms = self
            .playback
            .tick_interval_ms
            .clamp(defaults::MIN_TICK_INTERVAL_MS, defaults::MAX_TICK_INTERVAL_MS);
        self.playback.dwell_ms = self
            .playback
            .dwell_ms
            .clamp(defaults::MIN_DWELL_MS, defaults::MAX_DWELL_MS);

        let fraction = |value: f32, fallback: f32| {
            if value.is_finite() {
                value.clamp(0.0, 1.0)
            } else {
                fallback
            }
        };
        self.scroll.enter_fraction =
            fraction(self.scroll.enter_fraction, defaults::default_enter_fraction());
        self.scroll.leave_fraction =
            fraction(self.scroll.leave_fraction, defaults::default_leave_fraction());
        if self.scroll.leave_fraction > self.scroll.enter_fraction {
            self.scroll.leave_fraction = self.scroll.enter_fraction;
        }
        self.scroll.viewport_height = if self.scroll.viewport_height.is_finite() {
            self.scroll.viewport_height.max(defaults::MIN_VIEWPORT_HEIGHT)
        } else {
            defaults::default_viewport_height()
        };
        self
    }
}
