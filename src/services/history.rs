//! History manager.
//!
//! A session keeps two views of its attempts:
//!
//! - the full trace, unbounded, used for the result record;
//! - a context window with a fixed capacity, used to build repair prompts.
//!
//! Both are [`History`] values; a bounded history evicts its oldest entry
//! first once the capacity is exceeded.

use std::collections::vec_deque;
use std::collections::VecDeque;

use crate::domain::models::Attempt;

const IN_CONTEXT_HEADER: &str = "Below are the most recent consecutive k attempts trying to \
implement this Chisel module. For each attempt, the corresponding code is provided along with \
a summary of the errors found in that version and the suggested modifications. \n\n\
NOTE: Please refer to these past attempts to avoid repeating the same mistakes.\n\n";

/// Append-only sequence of entries with optional FIFO capacity.
#[derive(Debug, Clone)]
pub struct History<T = Attempt> {
    entries: VecDeque<T>,
    capacity: Option<usize>,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl<T> History<T> {
    /// A history that keeps every entry.
    pub fn unbounded() -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: None,
        }
    }

    /// A history that keeps at most `capacity` entries (at least one).
    pub fn bounded(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: Some(capacity),
        }
    }

    /// Append an entry, returning the one evicted to make room, if any.
    pub fn add(&mut self, entry: T) -> Option<T> {
        self.entries.push_back(entry);
        match self.capacity {
            Some(cap) if self.entries.len() > cap => self.entries.pop_front(),
            _ => None,
        }
    }

    /// The final `min(k, len)` entries in arrival order; every entry when
    /// `k` is negative.
    pub fn last(&self, k: isize) -> vec_deque::Iter<'_, T> {
        let start = usize::try_from(k)
            .map_or(0, |k| self.entries.len().saturating_sub(k));
        self.entries.range(start..)
    }

    pub fn iter(&self) -> vec_deque::Iter<'_, T> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Render attempts as the in-context history block of a correction prompt.
///
/// Returns `None` when there is nothing to show.
pub fn format_in_context<'a>(attempts: impl IntoIterator<Item = &'a Attempt>) -> Option<String> {
    let blocks: Vec<String> = attempts
        .into_iter()
        .enumerate()
        .map(|(i, attempt)| {
            format!(
                "## Attempt {}\n\nChisel Code (omitted):\n```scala\n{}\n```\nSummary: {}\n\n",
                i + 1,
                attempt.artifact.stripped(),
                attempt.summary()
            )
        })
        .collect();

    if blocks.is_empty() {
        None
    } else {
        Some(format!("{IN_CONTEXT_HEADER}{}", blocks.join("\n")))
    }
}
