//! Small shared helpers.

pub mod pacing;
pub mod user_agent;

pub use pacing::{Pacer, TokioPacer};
pub use user_agent::build_headers;
