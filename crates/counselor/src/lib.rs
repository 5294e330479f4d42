pub mod chances;
pub mod config;
pub mod error;
pub mod telemetry;
