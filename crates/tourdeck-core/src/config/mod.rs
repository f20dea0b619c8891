//! Configuration loading for the tour engine.
//!
//! All user-tunable settings are centralized here and loaded from
//! `conf/config.toml` if present. Missing or invalid entries fall back to
//! defaults so a preview can always start.

mod defaults;
mod io;
mod models;

pub use io::{load_config, parse_config, serialize_config};
pub use models::{LogLevel, LoggingConfig, PlaybackConfig, ScrollConfig, TourConfig};
