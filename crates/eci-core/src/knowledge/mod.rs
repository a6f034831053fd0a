//! Answer retrieval over a fixed question/answer catalog.
//!
//! ## Resolution pipeline
//!
//! | Stage        | Module        | Outcome                                         |
//! |--------------|---------------|-------------------------------------------------|
//! | Normalize    | `resolver`    | trimmed, lowercased query                       |
//! | Keyword      | `keywords`    | first rule (declaration order) with a trigger   |
//! | Word overlap | `resolver`    | opt-in; first entry sharing > 40% of the words  |
//! | Similarity   | `similarity`  | best normalized edit-distance score             |
//! | Threshold    | `resolver`    | below threshold -> clarification message        |

mod catalog;
mod eci;
mod keywords;
mod resolver;
mod similarity;

pub use catalog::{CatalogError, KnowledgeBase, KnowledgeEntry, DEFAULT_CLARIFICATION};
pub use keywords::{KeywordIndex, KeywordRule};
pub use resolver::{AnswerResolver, MatchResult, Resolution, ResolverOptions, DEFAULT_THRESHOLD};
pub use similarity::{edit_distance, similarity};
