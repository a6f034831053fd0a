//! eci-core: knowledge base, keyword index, similarity matcher and answer resolver
//! for the ECI Knowledge Assistant, plus the shared config and conversation log.
//!
//! The resolver is a pure function over an immutable [`KnowledgeBase`]; everything
//! that talks to the outside world sits behind [`AnswerSource`].

mod conversation;
mod knowledge;
mod shared;
mod source;
mod typing;

// Shared
pub use shared::{CoreConfig, DEFAULT_SESSION_PREFIX};

// Knowledge
pub use knowledge::{
    edit_distance, similarity, AnswerResolver, CatalogError, KeywordIndex, KeywordRule,
    KnowledgeBase, KnowledgeEntry, MatchResult, Resolution, ResolverOptions,
    DEFAULT_CLARIFICATION, DEFAULT_THRESHOLD,
};

// Conversation log
pub use conversation::{ConversationStore, ExchangeRecord};

// Answer backends
pub use source::{AnswerSource, SourceError};

pub use typing::word_chunks;
