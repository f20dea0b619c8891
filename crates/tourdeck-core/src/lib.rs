pub mod bindings;
pub mod cancellation;
pub mod config;
pub mod demo;
pub mod highlight;
pub mod playback;
pub mod session;
pub mod steps;
pub mod ticker;
pub mod viewport;
