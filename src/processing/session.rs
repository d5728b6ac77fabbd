//! Per-batch context kept by the caller for follow-up summarization

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;
use uuid::Uuid;

/// Opaque identifier returned by a ranking run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(Uuid);

impl BatchId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for BatchId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Raw job text and each candidate's raw extracted text for one batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchContext {
    job_text: String,
    resume_texts: HashMap<String, String>,
}

impl BatchContext {
    pub fn new(job_text: impl Into<String>) -> Self {
        Self {
            job_text: job_text.into(),
            resume_texts: HashMap::new(),
        }
    }

    /// Record a candidate's extracted text. A repeated name keeps the latest text.
    pub fn insert_resume(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.resume_texts.insert(name.into(), text.into());
    }

    pub fn job_text(&self) -> &str {
        &self.job_text
    }

    pub fn resume_text(&self, name: &str) -> Option<&str> {
        self.resume_texts.get(name).map(String::as_str)
    }
}

/// Caller-owned store of batch contexts, safe to share between request handlers.
#[derive(Debug, Default)]
pub struct SessionStore {
    batches: RwLock<HashMap<BatchId, BatchContext>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, batch_id: BatchId, context: BatchContext) {
        self.batches
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(batch_id, context);
    }

    pub fn get(&self, batch_id: &BatchId) -> Option<BatchContext> {
        self.batches
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(batch_id)
            .cloned()
    }

    pub fn remove(&self, batch_id: &BatchId) -> Option<BatchContext> {
        self.batches
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(batch_id)
    }

    pub fn len(&self) -> usize {
        self.batches
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batches_do_not_share_state() {
        let store = SessionStore::new();
        let (first, second) = (BatchId::new(), BatchId::new());
        assert_ne!(first, second);

        let mut a = BatchContext::new("job A");
        a.insert_resume("alice.pdf", "alice text");
        let mut b = BatchContext::new("job B");
        b.insert_resume("alice.pdf", "a different alice");

        store.insert(first, a);
        store.insert(second, b);

        assert_eq!(store.get(&first).unwrap().resume_text("alice.pdf"), Some("alice text"));
        assert_eq!(store.get(&second).unwrap().job_text(), "job B");
        assert_eq!(store.len(), 2);

        store.remove(&first);
        assert!(store.get(&first).is_none());
    }

    #[test]
    fn test_batch_id_parses_from_display() {
        let id = BatchId::new();
        let parsed: BatchId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-batch".parse::<BatchId>().is_err());
    }
}
