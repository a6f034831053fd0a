//! Interchangeable answer backends behind [`AnswerSource`].

pub use eci_core::{AnswerSource, SourceError};

mod answer_router;
mod local_matcher;
mod remote_agent;

pub use answer_router::{AnswerMode, AnswerRouter};
pub use local_matcher::LocalMatcher;
pub use remote_agent::RemoteAgent;
