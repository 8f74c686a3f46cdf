pub mod job_runner;
pub mod job_store;
pub mod providers;

pub use job_runner::JobRunner;
pub use job_store::JobStore;
