//! Conversation log: every answered exchange, grouped by session.

mod store;

pub use store::{ConversationStore, ExchangeRecord};
