//! In-memory scratchpad state: the counter and the note collection.

use chrono::{SecondsFormat, Utc};

use crate::types::{Note, ScratchpadError, ScratchpadResult};

/// Owned scratchpad state.
///
/// The store itself is not synchronized. Callers that share it between
/// concurrent requests wrap it in a single mutex so every mutation is atomic.
#[derive(Debug, Clone)]
pub struct ScratchpadStore {
    counter: i64,
    notes: Vec<Note>,
    next_note_id: u64,
    created_at: String,
}

impl Default for ScratchpadStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ScratchpadStore {
    /// Create an empty store with the counter at zero.
    pub fn new() -> Self {
        Self {
            counter: 0,
            notes: Vec::new(),
            next_note_id: 1,
            created_at: now_rfc3339(),
        }
    }

    pub fn counter(&self) -> i64 {
        self.counter
    }

    pub fn set_counter(&mut self, value: i64) {
        self.counter = value;
    }

    /// Add `amount` to the counter, returning `(old, new)`.
    pub fn increment(&mut self, amount: i64) -> ScratchpadResult<(i64, i64)> {
        let old = self.counter;
        let new = old.checked_add(amount).ok_or(ScratchpadError::Overflow {
            current: old,
            amount,
        })?;
        self.counter = new;
        tracing::debug!("Counter {old} -> {new}");
        Ok((old, new))
    }

    /// Append a note and return it.
    pub fn add_note(&mut self, content: &str, tags: Vec<String>) -> ScratchpadResult<&Note> {
        if content.trim().is_empty() {
            return Err(ScratchpadError::InvalidInput(
                "Note content must not be empty".to_string(),
            ));
        }

        let id = self.next_note_id;
        self.next_note_id += 1;
        self.notes.push(Note {
            id,
            content: content.to_string(),
            tags,
            created_at: now_rfc3339(),
        });
        tracing::debug!("Added note {id}");

        let last = self.notes.len() - 1;
        Ok(&self.notes[last])
    }

    /// Get a note by ID.
    pub fn note(&self, id: u64) -> ScratchpadResult<&Note> {
        self.notes
            .iter()
            .find(|n| n.id == id)
            .ok_or(ScratchpadError::NoteNotFound(id))
    }

    /// All notes in insertion order.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    /// The last `limit` notes (insertion order) carrying any of `tags`.
    ///
    /// An empty tag list matches every note; `limit == 0` returns all matches.
    pub fn recent_notes(&self, limit: usize, tags: &[String]) -> Vec<&Note> {
        let filtered: Vec<&Note> = self
            .notes
            .iter()
            .filter(|n| tags.is_empty() || n.has_any_tag(tags))
            .collect();

        if limit == 0 || filtered.len() <= limit {
            return filtered;
        }
        filtered[filtered.len() - limit..].to_vec()
    }

    pub fn created_at(&self) -> &str {
        &self.created_at
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_increment() {
        let mut store = ScratchpadStore::new();
        assert_eq!(store.increment(5).unwrap(), (0, 5));
        assert_eq!(store.increment(-2).unwrap(), (5, 3));
        assert_eq!(store.counter(), 3);
    }

    #[test]
    fn test_increment_overflow_leaves_counter() {
        let mut store = ScratchpadStore::new();
        store.set_counter(i64::MAX);
        assert!(matches!(
            store.increment(1),
            Err(ScratchpadError::Overflow { .. })
        ));
        assert_eq!(store.counter(), i64::MAX);
    }

    #[test]
    fn test_note_ids_are_sequential() {
        let mut store = ScratchpadStore::new();
        let a = store.add_note("first", vec![]).unwrap().id;
        let b = store.add_note("second", tags(&["x"])).unwrap().id;
        assert_eq!((a, b), (1, 2));
        assert_eq!(store.note(2).unwrap().content, "second");
        assert_eq!(store.note(3), Err(ScratchpadError::NoteNotFound(3)));
    }

    #[test]
    fn test_empty_note_rejected() {
        let mut store = ScratchpadStore::new();
        assert!(store.add_note("   ", vec![]).is_err());
        assert_eq!(store.note_count(), 0);
    }

    #[test]
    fn test_recent_notes_filter_and_limit() {
        let mut store = ScratchpadStore::new();
        store.add_note("a", tags(&["work"])).unwrap();
        store.add_note("b", tags(&["home"])).unwrap();
        store.add_note("c", tags(&["work", "urgent"])).unwrap();
        store.add_note("d", vec![]).unwrap();

        let all = store.recent_notes(0, &[]);
        assert_eq!(all.len(), 4);

        let last_two: Vec<_> = store.recent_notes(2, &[]).iter().map(|n| n.id).collect();
        assert_eq!(last_two, vec![3, 4]);

        let work: Vec<_> = store
            .recent_notes(10, &tags(&["work"]))
            .iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(work, vec![1, 3]);

        let any: Vec<_> = store
            .recent_notes(1, &tags(&["home", "urgent"]))
            .iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(any, vec![3]);
    }
}
