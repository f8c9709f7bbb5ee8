pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod query;
pub mod series;

pub use error::{Result, SimulatorError};
