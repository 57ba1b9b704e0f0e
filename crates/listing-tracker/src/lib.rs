pub mod catalog;
pub mod config;
pub mod error;
pub mod telemetry;
pub mod tracker;
