pub mod analytics;
pub mod config;
pub mod knowledge;
pub mod logging;
pub mod play;
pub mod player;
pub mod simulate;
pub mod sink;
pub mod telemetry;
