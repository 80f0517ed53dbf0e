//! Move history with per-move capture lists.

use crate::board::{Board, Point, Stone};

/// One accepted move and the stones it removed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryEntry {
    pub point: Point,
    pub color: Stone,
    /// Indices emptied by this move. Always stones of `color.opponent()`.
    pub captured: Vec<usize>,
}

/// Append-only move log. Only the most recent entry is ever removed.
#[derive(Clone, Debug, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub fn pop(&mut self) -> Option<HistoryEntry> {
        self.entries.pop()
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Record a move made by a remote player by diffing two snapshots.
    ///
    /// When `after` differs from `before` by exactly one new `mover` stone plus
    /// the removal of opposing stones, the move is logged like a local one and
    /// `true` is returned. Any other difference means the log no longer
    /// describes the board, so it is cleared and `false` is returned.
    pub fn record_remote(&mut self, before: &Board, after: &Board, mover: Stone) -> bool {
        match diff_single_move(before, after, mover) {
            Some(entry) => {
                self.push(entry);
                true
            }
            None => {
                self.clear();
                false
            }
        }
    }
}

fn diff_single_move(before: &Board, after: &Board, mover: Stone) -> Option<HistoryEntry> {
    if before.size() != after.size() || mover.is_empty() {
        return None;
    }

    let mut placed = None;
    let mut captured = Vec::new();
    for (i, (&old, &new)) in before.cells().iter().zip(after.cells()).enumerate() {
        match (old, new) {
            _ if old == new => {}
            (Stone::Empty, c) if c == mover && placed.is_none() => placed = Some(i),
            (c, Stone::Empty) if c == mover.opponent() => captured.push(i),
            _ => return None,
        }
    }

    placed.map(|i| HistoryEntry {
        point: after.point(i),
        color: mover,
        captured,
    })
}
