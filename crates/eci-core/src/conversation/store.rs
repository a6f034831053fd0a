//! Sled-backed conversation log.
//!
//! Keys are `conversation/{session_id}/{seq:020}` so a prefix scan returns one
//! session's exchanges in write order. `seq` comes from `Db::generate_id`, which
//! stays monotonic across restarts and ignores the wall clock.

use serde::{Deserialize, Serialize};
use sled::Db;
use std::collections::BTreeSet;
use std::path::Path;

const TREE_NAME: &str = "conversations";
const KEY_PREFIX: &str = "conversation/";

/// One user message and the answer that was returned for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRecord {
    /// Zero-padded write sequence; also the key suffix.
    pub id: String,
    pub session_id: String,
    pub prompt: String,
    pub output: String,
    /// Answer backend that produced `output` ("local", "agent").
    pub source: String,
    /// Unix timestamp (milliseconds).
    pub timestamp_ms: i64,
}

impl ExchangeRecord {
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice(bytes).ok()
    }
}

fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

fn session_prefix(session_id: &str) -> String {
    format!("{}{}/", KEY_PREFIX, session_id)
}

/// Append-only log of exchanges, one Sled tree.
pub struct ConversationStore {
    db: Db,
}

impl ConversationStore {
    /// Opens or creates the conversation DB at the given path.
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, sled::Error> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// In-memory DB removed on drop.
    pub fn open_temporary() -> Result<Self, sled::Error> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    /// Records an exchange; returns its id. Ids increase in write order.
    pub fn append(
        &self,
        session_id: &str,
        prompt: &str,
        output: &str,
        source: &str,
    ) -> Result<String, sled::Error> {
        let tree = self.db.open_tree(TREE_NAME)?;
        let timestamp_ms = now_ms();
        let id = format!("{:020}", self.db.generate_id()?);
        let key = format!("{}{}", session_prefix(session_id), id);
        let record = ExchangeRecord {
            id: id.clone(),
            session_id: session_id.to_string(),
            prompt: prompt.to_string(),
            output: output.to_string(),
            source: source.to_string(),
            timestamp_ms,
        };
        tree.insert(key.as_bytes(), record.to_bytes())?;
        tracing::debug!(
            target: "eci::conversation",
            session_id = session_id,
            bytes = output.len(),
            "Exchange recorded"
        );
        Ok(id)
    }

    /// The last `limit` exchanges of a session, oldest first.
    pub fn history(&self, session_id: &str, limit: usize) -> Result<Vec<ExchangeRecord>, sled::Error> {
        let tree = self.db.open_tree(TREE_NAME)?;
        let mut out = Vec::new();
        for item in tree.scan_prefix(session_prefix(session_id).as_bytes()) {
            let (_k, v) = item?;
            if let Some(rec) = ExchangeRecord::from_bytes(&v) {
                // Prefix scans for "a" also see "a/b"; keep exact sessions only.
                if rec.session_id == session_id {
                    out.push(rec);
                }
            }
        }
        let skip = out.len().saturating_sub(limit);
        Ok(out.split_off(skip))
    }

    /// Whether any exchange has been recorded for the session.
    pub fn contains_session(&self, session_id: &str) -> Result<bool, sled::Error> {
        let tree = self.db.open_tree(TREE_NAME)?;
        for item in tree.scan_prefix(session_prefix(session_id).as_bytes()) {
            let (_k, v) = item?;
            if ExchangeRecord::from_bytes(&v).is_some_and(|rec| rec.session_id == session_id) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Distinct session ids, sorted.
    pub fn sessions(&self) -> Result<Vec<String>, sled::Error> {
        let tree = self.db.open_tree(TREE_NAME)?;
        let mut ids = BTreeSet::new();
        for item in tree.scan_prefix(KEY_PREFIX.as_bytes()) {
            let (_k, v) = item?;
            if let Some(rec) = ExchangeRecord::from_bytes(&v) {
                ids.insert(rec.session_id);
            }
        }
        Ok(ids.into_iter().collect())
    }

    /// Deletes every exchange of a session; returns how many were removed.
    pub fn clear(&self, session_id: &str) -> Result<usize, sled::Error> {
        let tree = self.db.open_tree(TREE_NAME)?;
        let mut removed = 0;
        for item in tree.scan_prefix(session_prefix(session_id).as_bytes()) {
            let (k, v) = item?;
            let exact = ExchangeRecord::from_bytes(&v)
                .map(|rec| rec.session_id == session_id)
                .unwrap_or(true);
            if exact {
                tree.remove(k)?;
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::info!(
                target: "eci::conversation",
                session_id = session_id,
                removed,
                "Conversation cleared"
            );
        }
        Ok(removed)
    }

    /// Reads through the tree once; used by the gateway pre-flight check.
    pub fn verify_readable(&self) -> Result<(), sled::Error> {
        let tree = self.db.open_tree(TREE_NAME)?;
        tree.get(b"__verify__")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_read_back_in_order() {
        let store = ConversationStore::open_temporary().unwrap();
        store.append("s1", "What is ECI?", "ECI stands for...", "local").unwrap();
        store.append("s1", "bulk queries", "Yes, but...", "local").unwrap();
        store.append("s2", "hi", "clarify", "agent").unwrap();

        let history = store.history("s1", 10).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].prompt, "What is ECI?");
        assert_eq!(history[1].prompt, "bulk queries");
        assert!(history.iter().all(|r| r.session_id == "s1" && r.source == "local"));
    }

    #[test]
    fn history_limit_keeps_latest() {
        let store = ConversationStore::open_temporary().unwrap();
        for i in 0..5 {
            store.append("s", &format!("q{i}"), "a", "local").unwrap();
        }
        let last_two: Vec<String> = store
            .history("s", 2)
            .unwrap()
            .into_iter()
            .map(|r| r.prompt)
            .collect();
        assert_eq!(last_two, vec!["q3", "q4"]);
        assert!(store.history("s", 0).unwrap().is_empty());
    }

    #[test]
    fn ids_follow_write_order_and_match_keys() {
        let store = ConversationStore::open_temporary().unwrap();
        let ids: Vec<String> = (0..3)
            .map(|i| store.append("s", &format!("q{i}"), "a", "local").unwrap())
            .collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));

        let history = store.history("s", 10).unwrap();
        let read: Vec<&str> = history.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(read, ids.iter().map(String::as_str).collect::<Vec<_>>());

        let tree = store.db.open_tree(TREE_NAME).unwrap();
        for id in &ids {
            assert!(tree.contains_key(format!("conversation/s/{}", id)).unwrap());
        }
    }

    #[test]
    fn contains_session_is_exact() {
        let store = ConversationStore::open_temporary().unwrap();
        store.append("a/b", "inner", "y", "local").unwrap();
        assert!(store.contains_session("a/b").unwrap());
        assert!(!store.contains_session("a").unwrap());
        assert!(!store.contains_session("missing").unwrap());
    }

    #[test]
    fn sessions_are_distinct_and_sorted() {
        let store = ConversationStore::open_temporary().unwrap();
        store.append("b", "q", "a", "local").unwrap();
        store.append("a", "q", "a", "local").unwrap();
        store.append("b", "q", "a", "local").unwrap();
        assert_eq!(store.sessions().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn nested_session_ids_do_not_leak() {
        let store = ConversationStore::open_temporary().unwrap();
        store.append("a", "outer", "x", "local").unwrap();
        store.append("a/b", "inner", "y", "local").unwrap();
        let outer = store.history("a", 10).unwrap();
        assert_eq!(outer.len(), 1);
        assert_eq!(outer[0].prompt, "outer");
        assert_eq!(store.clear("a").unwrap(), 1);
        assert_eq!(store.history("a/b", 10).unwrap().len(), 1);
    }

    #[test]
    fn clear_removes_one_session() {
        let store = ConversationStore::open_temporary().unwrap();
        store.append("s1", "q", "a", "local").unwrap();
        store.append("s1", "q", "a", "local").unwrap();
        store.append("s2", "q", "a", "local").unwrap();
        assert_eq!(store.clear("s1").unwrap(), 2);
        assert!(store.history("s1", 10).unwrap().is_empty());
        assert_eq!(store.sessions().unwrap(), vec!["s2"]);
        assert_eq!(store.clear("missing").unwrap(), 0);
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eci_conversations");
        {
            let store = ConversationStore::open_path(&path).unwrap();
            store.append("s", "q", "a", "local").unwrap();
            store.verify_readable().unwrap();
        }
        let store = ConversationStore::open_path(&path).unwrap();
        assert_eq!(store.history("s", 10).unwrap().len(), 1);
    }
}
