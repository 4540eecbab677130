//! Card data model: grid sizes, cards, card sets, and generation requests.
//!
//! Nothing here outlives a single generation run; a request is built from
//! user input, consumed immediately, and never persisted.

use crate::error::BingoError;
use std::fmt;

/// Smallest card count a request can ask for.
pub const MIN_CARDS: i64 = 1;
/// Largest card count a request can ask for.
pub const MAX_CARDS: i64 = 100;

/// Side length of a square bingo card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridSize {
    Four,
    Five,
    Six,
}

impl GridSize {
    pub const ALL: [GridSize; 3] = [GridSize::Four, GridSize::Five, GridSize::Six];

    pub fn side(self) -> usize {
        match self {
            GridSize::Four => 4,
            GridSize::Five => 5,
            GridSize::Six => 6,
        }
    }

    /// Total cell count; card values are drawn from `1..=cells()`.
    pub fn cells(self) -> usize {
        self.side() * self.side()
    }
}

impl TryFrom<u8> for GridSize {
    type Error = BingoError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            4 => Ok(GridSize::Four),
            5 => Ok(GridSize::Five),
            6 => Ok(GridSize::Six),
            other => Err(BingoError::InvalidConfiguration(format!(
                "unsupported grid size {} (expected 4, 5 or 6)",
                other
            ))),
        }
    }
}

impl fmt::Display for GridSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.side(), self.side())
    }
}

/// One bingo card: a permutation of `1..=cells`, row-major.
///
/// Order is significant; it is the visual cell layout read left-to-right,
/// top-to-bottom. Two cards are equal only if their sequences match
/// position for position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    cells: Vec<u8>,
}

impl Card {
    pub(crate) fn from_cells(cells: Vec<u8>) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub fn value_at(&self, grid: GridSize, row: usize, col: usize) -> Option<u8> {
        if row >= grid.side() || col >= grid.side() {
            return None;
        }
        self.cells.get(row * grid.side() + col).copied()
    }
}

/// The cards produced by one generation request, in generation order.
/// Invariant: no two cards share an identical cell arrangement.
#[derive(Debug, Clone)]
pub struct CardSet {
    grid: GridSize,
    cards: Vec<Card>,
}

impl CardSet {
    pub(crate) fn new(grid: GridSize, cards: Vec<Card>) -> Self {
        Self { grid, cards }
    }

    pub fn grid(&self) -> GridSize {
        self.grid
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Card> {
        self.cards.iter()
    }
}

impl<'a> IntoIterator for &'a CardSet {
    type Item = &'a Card;
    type IntoIter = std::slice::Iter<'a, Card>;

    fn into_iter(self) -> Self::IntoIter {
        self.cards.iter()
    }
}

/// A clamped generation request. Out-of-range counts are corrected, not
/// rejected: zero or negative becomes 1, anything above 100 becomes 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationRequest {
    grid: GridSize,
    count: usize,
}

impl GenerationRequest {
    pub fn new(grid: GridSize, requested: i64) -> Self {
        Self {
            grid,
            count: requested.clamp(MIN_CARDS, MAX_CARDS) as usize,
        }
    }

    pub fn grid(self) -> GridSize {
        self.grid
    }

    pub fn count(self) -> usize {
        self.count
    }
}
