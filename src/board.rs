//! Board storage and coordinate mapping.
//!
//! The board is a flat `Vec<Stone>` of length `size * size`, addressed by
//! `index = y * size + x` with `(0, 0)` in the top-left corner. Out-of-range
//! coordinates are a caller bug: they trip a `debug_assert!` and otherwise
//! panic on slice indexing.

use std::fmt;

use crate::constants::{WIRE_BLACK, WIRE_EMPTY, WIRE_WHITE};

/// Occupancy of a single point.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Stone {
    #[default]
    Empty = WIRE_EMPTY,
    Black = WIRE_BLACK,
    White = WIRE_WHITE,
}

impl Stone {
    /// The other player's color. `Empty` maps to itself.
    pub fn opponent(self) -> Stone {
        match self {
            Stone::Black => Stone::White,
            Stone::White => Stone::Black,
            Stone::Empty => Stone::Empty,
        }
    }

    /// Decode a wire value, returning `None` for anything outside `{0, 1, 2}`.
    pub fn from_wire(value: i64) -> Option<Stone> {
        match value {
            0 => Some(Stone::Empty),
            1 => Some(Stone::Black),
            2 => Some(Stone::White),
            _ => None,
        }
    }

    pub fn to_wire(self) -> u8 {
        self as u8
    }

    pub fn is_empty(self) -> bool {
        self == Stone::Empty
    }
}

impl fmt::Display for Stone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stone::Empty => "Empty",
            Stone::Black => "Black",
            Stone::White => "White",
        };
        f.write_str(name)
    }
}

/// A point on the board as `(x, y)` column/row coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

impl Point {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// A square Go board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    size: usize,
    cells: Vec<Stone>,
}

impl Board {
    /// Create an all-empty board of `size * size` points.
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "board size must be positive");
        Self {
            size,
            cells: vec![Stone::Empty; size * size],
        }
    }

    /// Build a board from existing cells. `cells.len()` must equal `size * size`.
    pub fn from_cells(size: usize, cells: Vec<Stone>) -> Self {
        assert_eq!(cells.len(), size * size, "cell count does not match board size");
        Self { size, cells }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Total number of points (`size * size`).
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True when no stone of either color is on the board.
    pub fn has_no_stones(&self) -> bool {
        self.cells.iter().all(|s| s.is_empty())
    }

    /// Linear index of `(x, y)`.
    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.size && y < self.size, "({x}, {y}) is off the board");
        y * self.size + x
    }

    /// Coordinates of a linear index.
    #[inline]
    pub fn point(&self, index: usize) -> Point {
        Point::new(index % self.size, index / self.size)
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        x < self.size && y < self.size
    }

    pub fn stone_at(&self, x: usize, y: usize) -> Stone {
        self.cells[self.index(x, y)]
    }

    #[inline]
    pub fn get(&self, index: usize) -> Stone {
        self.cells[index]
    }

    #[inline]
    pub fn set(&mut self, index: usize, stone: Stone) {
        self.cells[index] = stone;
    }

    /// Read-only view of every cell in index order.
    pub fn cells(&self) -> &[Stone] {
        &self.cells
    }

    /// Indices of the up to four orthogonal neighbors of `index`.
    pub fn neighbors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        let s = self.size;
        let (x, y) = (index % s, index / s);
        let up = (y > 0).then(|| index - s);
        let down = (y + 1 < s).then(|| index + s);
        let left = (x > 0).then(|| index - 1);
        let right = (x + 1 < s).then(|| index + 1);
        [up, down, left, right].into_iter().flatten()
    }

    /// Number of stones of `color` on the board.
    pub fn count(&self, color: Stone) -> usize {
        self.cells.iter().filter(|&&s| s == color).count()
    }

    /// The board as wire values in `{0, 1, 2}`.
    pub fn to_wire(&self) -> Vec<u8> {
        self.cells.iter().map(|s| s.to_wire()).collect()
    }
}

/// Parse a vertex such as `"D4"` into a point on a board of `size`.
///
/// Columns use letters `A`-`T` skipping `I`; row 1 is the bottom edge.
/// Returns `None` for malformed or off-board input.
pub fn parse_vertex(s: &str, size: usize) -> Option<Point> {
    let bytes = s.trim().as_bytes();
    if bytes.len() < 2 {
        return None;
    }

    let col_char = bytes[0].to_ascii_uppercase();
    if !col_char.is_ascii_uppercase() || col_char == b'I' {
        return None;
    }
    let mut col = (col_char - b'A') as usize;
    if col_char > b'I' {
        col -= 1;
    }

    let row: usize = std::str::from_utf8(&bytes[1..]).ok()?.parse().ok()?;
    if row == 0 || row > size || col >= size {
        return None;
    }
    Some(Point::new(col, size - row))
}

/// Format a point as a vertex string such as `"D4"`.
pub fn format_vertex(p: Point, size: usize) -> String {
    let mut c = b'A' + p.x as u8;
    if c >= b'I' {
        c += 1;
    }
    format!("{}{}", c as char, size - p.y)
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  ")?;
        for x in 0..self.size {
            let label = format_vertex(Point::new(x, 0), self.size);
            write!(f, " {}", &label[..1])?;
        }
        writeln!(f)?;
        for y in 0..self.size {
            write!(f, "{:>2}", self.size - y)?;
            for x in 0..self.size {
                let ch = match self.stone_at(x, y) {
                    Stone::Black => 'X',
                    Stone::White => 'O',
                    Stone::Empty => '.',
                };
                write!(f, " {ch}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
