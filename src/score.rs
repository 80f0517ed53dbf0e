//! Area scoring.
//!
//! Each side scores its stones on the board plus the empty regions bordered
//! only by its own stones. White also receives komi. Regions touching both
//! colors, or no stones at all, belong to nobody.

use std::fmt;

use crate::board::{Board, Stone};

/// One side's share of the final count.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorScore {
    pub stones: usize,
    pub territory: usize,
    /// Zero for Black.
    pub komi: f64,
    pub total: f64,
}

/// Result of a game.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Outcome {
    Draw,
    Win { winner: Stone, margin: f64 },
}

/// Full breakdown returned by [`determine_winner`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoreResult {
    pub black: ColorScore,
    pub white: ColorScore,
    pub outcome: Outcome,
}

impl ScoreResult {
    /// Black's total minus White's total.
    pub fn diff(&self) -> f64 {
        self.black.total - self.white.total
    }

    pub fn winner(&self) -> Option<Stone> {
        match self.outcome {
            Outcome::Draw => None,
            Outcome::Win { winner, .. } => Some(winner),
        }
    }
}

/// Score `board` with area rules, adding `komi` to White.
pub fn determine_winner(board: &Board, komi: f64) -> ScoreResult {
    let black_stones = board.count(Stone::Black);
    let white_stones = board.count(Stone::White);
    let (black_territory, white_territory) = territory(board);

    let black = ColorScore {
        stones: black_stones,
        territory: black_territory,
        komi: 0.0,
        total: (black_stones + black_territory) as f64,
    };
    let white = ColorScore {
        stones: white_stones,
        territory: white_territory,
        komi,
        total: (white_stones + white_territory) as f64 + komi,
    };

    let diff = black.total - white.total;
    let outcome = if diff == 0.0 {
        Outcome::Draw
    } else if diff > 0.0 {
        Outcome::Win {
            winner: Stone::Black,
            margin: diff,
        }
    } else {
        Outcome::Win {
            winner: Stone::White,
            margin: -diff,
        }
    };

    ScoreResult {
        black,
        white,
        outcome,
    }
}

/// Territory owned by (Black, White).
fn territory(board: &Board) -> (usize, usize) {
    let mut visited = vec![false; board.len()];
    let mut black = 0;
    let mut white = 0;

    for start in 0..board.len() {
        if visited[start] || !board.get(start).is_empty() {
            continue;
        }

        let mut stack = vec![start];
        visited[start] = true;
        let mut region = 0;
        let mut touches_black = false;
        let mut touches_white = false;

        while let Some(pt) = stack.pop() {
            region += 1;
            for n in board.neighbors(pt) {
                match board.get(n) {
                    Stone::Empty if !visited[n] => {
                        visited[n] = true;
                        stack.push(n);
                    }
                    Stone::Black => touches_black = true,
                    Stone::White => touches_white = true,
                    Stone::Empty => {}
                }
            }
        }

        match (touches_black, touches_white) {
            (true, false) => black += region,
            (false, true) => white += region,
            _ => {}
        }
    }
    (black, white)
}

/// Spell out a point margin: `7.5` is `"7 and a half"`, `0.25` is `"a quarter"`.
///
/// Quarter fractions get words; other fractions print with two decimals.
pub fn format_margin(margin: f64) -> String {
    let quarters = margin * 4.0;
    if (quarters - quarters.round()).abs() > 1e-9 {
        return format!("{margin:.2}");
    }

    let quarters = quarters.round() as i64;
    let whole = quarters / 4;
    let fraction = match quarters % 4 {
        1 => Some("a quarter"),
        2 => Some("a half"),
        3 => Some("three quarters"),
        _ => None,
    };

    match (whole, fraction) {
        (w, None) => w.to_string(),
        (0, Some(frac)) => frac.to_string(),
        (w, Some(frac)) => format!("{w} and {frac}"),
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Draw => f.write_str("Draw"),
            Outcome::Win { winner, margin } => {
                write!(f, "{winner} wins by {} points", format_margin(*margin))
            }
        }
    }
}

impl fmt::Display for ScoreResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Black: {} stones + {} territory = {}",
            self.black.stones, self.black.territory, self.black.total
        )?;
        writeln!(
            f,
            "White: {} stones + {} territory + {} komi = {}",
            self.white.stones, self.white.territory, self.white.komi, self.white.total
        )?;
        write!(f, "{}", self.outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_board_white_wins_by_komi() {
        let board = Board::new(19);
        let result = determine_winner(&board, 7.5);
        assert_eq!(result.black.territory, 0);
        assert_eq!(result.white.territory, 0);
        assert_eq!(result.black.total, 0.0);
        assert_eq!(result.white.total, 7.5);
        assert_eq!(result.diff(), -7.5);
        assert_eq!(
            result.outcome,
            Outcome::Win {
                winner: Stone::White,
                margin: 7.5
            }
        );
        assert_eq!(result.outcome.to_string(), "White wins by 7 and a half points");
    }

    #[test]
    fn test_single_stone_owns_whole_board() {
        let mut board = Board::new(9);
        board.set(board.index(4, 4), Stone::Black);
        let result = determine_winner(&board, 0.0);
        assert_eq!(result.black.stones, 1);
        assert_eq!(result.black.territory, 80);
        assert_eq!(result.black.total, 81.0);
        assert_eq!(result.winner(), Some(Stone::Black));
    }

    #[test]
    fn test_split_board() {
        // Black wall on column 2, White wall on column 4 of a 7x7 board.
        let mut board = Board::new(7);
        for y in 0..7 {
            board.set(board.index(2, y), Stone::Black);
            board.set(board.index(4, y), Stone::White);
        }
        let result = determine_winner(&board, 0.5);
        // Columns 0-1 are Black's, 5-6 White's, column 3 touches both.
        assert_eq!(result.black.territory, 14);
        assert_eq!(result.white.territory, 14);
        assert_eq!(result.black.total, 21.0);
        assert_eq!(result.white.total, 21.5);
        assert_eq!(result.outcome.to_string(), "White wins by a half points");
    }

    #[test]
    fn test_draw() {
        let mut board = Board::new(7);
        for y in 0..7 {
            board.set(board.index(2, y), Stone::Black);
            board.set(board.index(4, y), Stone::White);
        }
        let result = determine_winner(&board, 0.0);
        assert_eq!(result.outcome, Outcome::Draw);
        assert_eq!(result.outcome.to_string(), "Draw");
    }

    #[test]
    fn test_format_margin_words() {
        assert_eq!(format_margin(7.0), "7");
        assert_eq!(format_margin(7.5), "7 and a half");
        assert_eq!(format_margin(3.25), "3 and a quarter");
        assert_eq!(format_margin(3.75), "3 and three quarters");
        assert_eq!(format_margin(0.25), "a quarter");
        assert_eq!(format_margin(1.1), "1.10");
    }
}
