pub(crate) fn default_tick_interval_ms() -> u64 {
    50
}

pub(crate) fn default_dwell_ms() -> u64 {
    10_000
}

pub(crate) fn default_enter_fraction() -> f32 {
    0.6
}

pub(crate) fn default_leave_fraction() -> f32 {
    0.4
}

pub(crate) fn default_viewport_height() -> f32 {
    900.0
}

pub(crate) fn default_log_level() -> crate::config::LogLevel {
    crate::config::LogLevel::Debug
}

pub(crate) const MIN_TICK_INTERVAL_MS: u64 = 10;
pub(crate) const MAX_TICK_INTERVAL_MS: u64 = 1_000;
pub(crate) const MIN_DWELL_MS: u64 = 500;
pub(crate) const MAX_DWELL_MS: u64 = 600_000;
pub(crate) const MIN_VIEWPORT_HEIGHT: f32 = 1.0;
