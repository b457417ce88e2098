//! The local record: position -> value held by this node.
//!
//! Two writers touch an entry: the query handler (adoption) and the
//! position's consensus loop (clear on flip, mark decided). Every mutation
//! happens under the store's write lock, so adopt-or-vote is a single atomic
//! check-and-set and two concurrent first proposals cannot both adopt.

use flurry_consensus::{Position, Value};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// A value held for one position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub value: Value,
    /// Set once this node's loop decided on exactly this value. Purely local.
    pub decided: bool,
}

/// What happened to an inbound proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposeOutcome {
    /// The position was empty; the value is now held.
    Adopted,
    /// The position already held exactly this value.
    Matched,
    /// The position holds a different value.
    Conflict,
}

impl ProposeOutcome {
    /// The wire-level answer: adoption and matching vote look the same.
    pub const fn accepted(self) -> bool {
        matches!(self, Self::Adopted | Self::Matched)
    }
}

/// Shared position -> value map.
#[derive(Debug, Default)]
pub struct RecordStore {
    entries: RwLock<HashMap<Position, Entry>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt `value` if `position` is empty, otherwise vote on it.
    ///
    /// Never overwrites or removes an existing entry.
    pub async fn propose(&self, position: Position, value: &Value) -> ProposeOutcome {
        let mut entries = self.entries.write().await;
        match entries.get(&position) {
            Some(entry) if entry.value == *value => ProposeOutcome::Matched,
            Some(_) => ProposeOutcome::Conflict,
            None => {
                entries.insert(
                    position,
                    Entry {
                        value: value.clone(),
                        decided: false,
                    },
                );
                ProposeOutcome::Adopted
            }
        }
    }

    /// Current entry for `position`, if any.
    pub async fn get(&self, position: Position) -> Option<Entry> {
        self.entries.read().await.get(&position).cloned()
    }

    /// Drop the entry for `position` after a flip.
    ///
    /// Decided entries are never cleared. Returns the removed value.
    pub async fn clear(&self, position: Position) -> Option<Value> {
        let mut entries = self.entries.write().await;
        match entries.get(&position) {
            Some(entry) if !entry.decided => entries.remove(&position).map(|e| e.value),
            _ => None,
        }
    }

    /// Mark `position` decided if it still holds `value`.
    ///
    /// Returns `false` when the entry is gone or holds another value.
    pub async fn mark_decided(&self, position: Position, value: &Value) -> bool {
        let mut entries = self.entries.write().await;
        match entries.get_mut(&position) {
            Some(entry) if entry.value == *value => {
                entry.decided = true;
                true
            }
            _ => false,
        }
    }

    /// Number of positions currently held.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Number of positions this node has decided.
    pub async fn decided_count(&self) -> usize {
        self.entries.read().await.values().filter(|e| e.decided).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn adopt_then_vote() {
        let store = RecordStore::new();
        let red = Value::from("red");
        let blue = Value::from("blue");

        assert_eq!(store.propose(Position(7), &red).await, ProposeOutcome::Adopted);
        assert_eq!(store.propose(Position(7), &red).await, ProposeOutcome::Matched);
        assert_eq!(store.propose(Position(7), &blue).await, ProposeOutcome::Conflict);
        assert_eq!(store.get(Position(7)).await.unwrap().value, red);
    }

    #[tokio::test]
    async fn positions_are_independent() {
        let store = RecordStore::new();
        store.propose(Position(1), &Value::from("a")).await;
        assert_eq!(
            store.propose(Position(2), &Value::from("b")).await,
            ProposeOutcome::Adopted
        );
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn clear_allows_readoption() {
        let store = RecordStore::new();
        store.propose(Position(7), &Value::from("red")).await;
        assert_eq!(store.clear(Position(7)).await, Some(Value::from("red")));
        assert!(store.get(Position(7)).await.is_none());
        assert_eq!(
            store.propose(Position(7), &Value::from("blue")).await,
            ProposeOutcome::Adopted
        );
    }

    #[tokio::test]
    async fn decided_entries_survive_clear() {
        let store = RecordStore::new();
        let red = Value::from("red");
        store.propose(Position(7), &red).await;
        assert!(store.mark_decided(Position(7), &red).await);
        assert_eq!(store.clear(Position(7)).await, None);
        assert!(store.get(Position(7)).await.unwrap().decided);
        assert_eq!(store.decided_count().await, 1);
    }

    #[tokio::test]
    async fn mark_decided_requires_matching_value() {
        let store = RecordStore::new();
        store.propose(Position(7), &Value::from("blue")).await;
        assert!(!store.mark_decided(Position(7), &Value::from("red")).await);
        assert!(!store.mark_decided(Position(8), &Value::from("red")).await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_proposals_adopt_once() {
        let store = Arc::new(RecordStore::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.propose(Position(1), &Value::from(format!("v{}", i))).await
            }));
        }

        let mut adopted = 0;
        for handle in handles {
            if handle.await.unwrap() == ProposeOutcome::Adopted {
                adopted += 1;
            }
        }
        assert_eq!(adopted, 1);
    }
}
