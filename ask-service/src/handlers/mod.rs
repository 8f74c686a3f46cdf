//! HTTP handlers for the ask service.

pub mod ask;
pub mod health;

pub use ask::{ask_gemini, job_status};
pub use health::{health_check, index, metrics_endpoint};
