use crate::types::{ContextTurn, MessageEntry};

/// Select the most recent `window_size` entries, oldest first, reduced to
/// speaker and text.
///
/// Returns fewer turns when the log is shorter, and nothing for a window
/// of zero.
pub fn select(entries: &[MessageEntry], window_size: usize) -> Vec<ContextTurn> {
    let count = window_size.min(entries.len());
    entries[entries.len() - count..]
        .iter()
        .map(ContextTurn::from)
        .collect()
}
