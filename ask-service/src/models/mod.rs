//! Domain models for the ask service.

pub mod generation;
pub mod job;

pub use generation::Generation;
pub use job::{Job, JobState, JobStatus};
