use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const FILE_LETTERS: [char; 8] = ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h'];

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum CoordError {
    #[error("coordinate out of bounds: rank {0}, file {1}")]
    OutOfBounds(i8, i8),

    #[error("not an algebraic square: {0}")]
    InvalidAlgebraic(String),
}

/// Zero-based (rank, file) board coordinate.
///
/// Rank 0 is black's back rank, rank 7 is white's back rank, file 0 is the
/// a-file. Every constructed `Coord` is in bounds; out-of-range inputs are
/// rejected at construction, never wrapped.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Coord {
    rank: u8,
    file: u8,
}

impl Coord {
    pub fn new(rank: i8, file: i8) -> Result<Coord, CoordError> {
        if !(0..8).contains(&rank) || !(0..8).contains(&file) {
            return Err(CoordError::OutOfBounds(rank, file));
        }
        Ok(Coord {
            rank: rank as u8,
            file: file as u8,
        })
    }

    /// For internal loops over `0..8` indices, where bounds hold by
    /// construction.
    pub(crate) const fn from_indices(rank: usize, file: usize) -> Coord {
        debug_assert!(rank < 8 && file < 8);
        Coord {
            rank: rank as u8,
            file: file as u8,
        }
    }

    /// The coordinate `(rank + dr, file + df)`, or `None` if that steps off
    /// the board.
    pub fn try_offset(self, dr: i8, df: i8) -> Option<Coord> {
        let rank = self.rank as i8 + dr;
        let file = self.file as i8 + df;
        Coord::new(rank, file).ok()
    }

    pub fn rank(self) -> usize {
        self.rank as usize
    }

    pub fn file(self) -> usize {
        self.file as usize
    }
}

impl FromStr for Coord {
    type Err = CoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let (Some(file_ch), Some(rank_ch), None) = (chars.next(), chars.next(), chars.next())
        else {
            return Err(CoordError::InvalidAlgebraic(s.to_string()));
        };
        if !('a'..='h').contains(&file_ch) || !('1'..='8').contains(&rank_ch) {
            return Err(CoordError::InvalidAlgebraic(s.to_string()));
        }
        let file = file_ch as u8 - b'a';
        // Rank digit 1 is white's back rank, which is internal rank 7.
        let rank = b'8' - rank_ch as u8;
        Ok(Coord { rank, file })
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", FILE_LETTERS[self.file as usize], 8 - self.rank)
    }
}

impl fmt::Debug for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self, self.rank, self.file)
    }
}
