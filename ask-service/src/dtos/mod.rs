pub mod ask;

pub use ask::{AskRequest, AskResponse, JobAccepted, PROMPT_REQUIRED};
