pub mod window;

use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};
use tracing::info;

use crate::error::{RelayError, Result};
use crate::types::{ContextTurn, MessageEntry, MessageRequest};

/// The in-memory conversation log.
///
/// Insertion order is chronological order. All mutation goes through a
/// single write lock, so concurrent appends never lose an entry and an
/// import never interleaves with an append. No method suspends, which
/// keeps the lock out of any await point.
pub struct ConversationLog {
    inner: RwLock<LogState>,
}

#[derive(Default)]
struct LogState {
    entries: Vec<MessageEntry>,
    ids: HashSet<String>,
    /// Millisecond stamp of the last generated id; ids never reuse or go
    /// back in time even if the wall clock does.
    last_stamp_ms: i64,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(LogState::default()),
        }
    }

    /// Append an inbound message, returning its freshly assigned id.
    pub fn append(&self, request: MessageRequest) -> String {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        state.push(request)
    }

    /// Append an inbound message and select the last `window_size` turns
    /// under the same write guard, so the window always ends with the
    /// message just appended.
    pub fn append_with_window(
        &self,
        request: MessageRequest,
        window_size: usize,
    ) -> (String, Vec<ContextTurn>) {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let message_id = state.push(request);
        let context = window::select(&state.entries, window_size);
        (message_id, context)
    }

    /// Replace the whole log. An empty sequence clears it.
    ///
    /// The replacement is validated before anything is touched; on error
    /// the current log is left exactly as it was.
    pub fn replace_all(&self, entries: Vec<MessageEntry>) -> Result<usize> {
        let mut ids = HashSet::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if entry.message_id.trim().is_empty() {
                return Err(RelayError::MalformedImport(format!(
                    "entry {i} has an empty message_id"
                )));
            }
            if !ids.insert(entry.message_id.clone()) {
                return Err(RelayError::MalformedImport(format!(
                    "duplicate message_id '{}' at entry {i}",
                    entry.message_id
                )));
            }
            for (key, persona) in &entry.persona_settings {
                persona.validate().map_err(|e| {
                    RelayError::MalformedImport(format!("entry {i}: persona '{key}': {e}"))
                })?;
            }
        }

        let count = entries.len();
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        state.entries = entries;
        state.ids = ids;

        info!(count, "history replaced");
        Ok(count)
    }

    /// Snapshot of the whole log in insertion order.
    pub fn read_all(&self) -> Vec<MessageEntry> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .clone()
    }

    /// The last `window_size` turns, see [`window::select`].
    pub fn window(&self, window_size: usize) -> Vec<ContextTurn> {
        let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        window::select(&state.entries, window_size)
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ConversationLog {
    fn default() -> Self {
        Self::new()
    }
}

impl LogState {
    fn push(&mut self, request: MessageRequest) -> String {
        let stamp_ms = Utc::now().timestamp_millis().max(self.last_stamp_ms + 1);
        self.last_stamp_ms = stamp_ms;

        let mut message_id = generate_message_id(stamp_ms);
        while self.ids.contains(&message_id) {
            message_id = generate_message_id(stamp_ms);
        }

        self.ids.insert(message_id.clone());
        self.entries.push(MessageEntry {
            message_id: message_id.clone(),
            timestamp: request.timestamp,
            persona_settings: request.persona_settings,
            message: request.message,
        });

        info!(message_id = %message_id, entries = self.entries.len(), "message appended");
        message_id
    }
}

/// `2026-10-19T12-30-05.123Z-1a2b3c4d`: a millisecond UTC stamp (colons
/// swapped for dashes) followed by eight random hex digits. Stamps issued by
/// one log strictly increase, so ids sort lexically by insertion.
fn generate_message_id(stamp_ms: i64) -> String {
    let stamp: DateTime<Utc> = Utc
        .timestamp_millis_opt(stamp_ms)
        .single()
        .unwrap_or_else(Utc::now);
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", stamp.format("%Y-%m-%dT%H-%M-%S%.3fZ"), &suffix[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_id_has_stamp_and_suffix() {
        let id = generate_message_id(1_700_000_000_123);
        assert_eq!(id.len(), "2023-11-14T22-13-20.123Z-".len() + 8);
        assert!(id.starts_with("2023-11-14T22-13-20.123Z-"), "{id}");
        assert!(!id.contains(':'));
    }

    #[test]
    fn later_stamps_sort_after_earlier_ones() {
        let a = generate_message_id(1_700_000_000_999);
        let b = generate_message_id(1_700_000_001_000);
        assert!(a < b);
    }
}
