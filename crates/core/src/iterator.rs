// SPDX-License-Identifier: MIT

//! The cursor over argument strings that drives sub-tree re-runs (spec §4.6).

use parking_lot::Mutex;

/// An ordered list of argument strings plus a cursor, owned by a
/// [`crate::tree`]-level sub-tree. Advancing is a caller-driven operation —
/// `Iterator` itself only tracks position, the tree decides when a full
/// re-run has earned an `advance()`.
#[derive(Debug)]
pub struct ArgIterator {
    args: Vec<String>,
    cursor: Mutex<usize>,
}

impl ArgIterator {
    pub fn new(args: Vec<String>) -> Self {
        Self {
            args,
            cursor: Mutex::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn cursor(&self) -> usize {
        *self.cursor.lock()
    }

    /// `true` once the cursor has moved past the last argument.
    pub fn is_exhausted(&self) -> bool {
        self.cursor() >= self.args.len()
    }

    /// The argument for the current position, or `None` if exhausted or
    /// empty.
    pub fn current_arg(&self) -> Option<&str> {
        self.args.get(self.cursor()).map(String::as_str)
    }

    /// Move the cursor forward one position.
    pub fn advance(&self) {
        let mut cursor = self.cursor.lock();
        *cursor += 1;
    }

    /// Reset the cursor to the start, for a fresh top-level run.
    pub fn rewind(&self) {
        *self.cursor.lock() = 0;
    }

    /// `current_run/total_len`, for the status document's `iteration` field.
    pub fn progress_label(&self) -> String {
        format!("{}/{}", self.cursor().min(self.args.len()), self.args.len())
    }
}

#[cfg(test)]
#[path = "iterator_tests.rs"]
mod tests;
