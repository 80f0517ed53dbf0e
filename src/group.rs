//! Connected-group analysis: liberty counting and capture removal.
//!
//! Both passes flood-fill with an explicit stack and a visited set, so the
//! search depth is bounded by the board area rather than the call stack.

use crate::board::{Board, Stone};

/// Count the liberties of the group containing `start`.
///
/// Every empty neighbor is counted once per adjacent group member, so an
/// empty point touching two stones of the group contributes 2. Returns 0 for
/// an empty `start` and for a group with no empty neighbor at all.
pub fn liberties(board: &Board, start: usize) -> usize {
    let color = board.get(start);
    if color.is_empty() {
        return 0;
    }

    let mut stack = vec![start];
    let mut visited = vec![false; board.len()];
    let mut libs = 0;

    while let Some(pt) = stack.pop() {
        if visited[pt] {
            continue;
        }
        visited[pt] = true;

        for n in board.neighbors(pt) {
            match board.get(n) {
                Stone::Empty => libs += 1,
                c if c == color && !visited[n] => stack.push(n),
                _ => {}
            }
        }
    }
    libs
}

/// Collect the indices of every stone connected to `start` with its color.
pub fn collect_group(board: &Board, start: usize) -> Vec<usize> {
    let color = board.get(start);
    let mut group = Vec::new();
    if color.is_empty() {
        return group;
    }

    let mut stack = vec![start];
    let mut visited = vec![false; board.len()];

    while let Some(pt) = stack.pop() {
        if visited[pt] {
            continue;
        }
        visited[pt] = true;
        group.push(pt);

        for n in board.neighbors(pt) {
            if !visited[n] && board.get(n) == color {
                stack.push(n);
            }
        }
    }
    group
}

/// Remove the group containing `start` and return the emptied indices.
///
/// The caller has already established that the group has no liberties.
pub fn remove_captured_stones(board: &mut Board, start: usize) -> Vec<usize> {
    let removed = collect_group(board, start);
    for &pt in &removed {
        board.set(pt, Stone::Empty);
    }
    removed
}
