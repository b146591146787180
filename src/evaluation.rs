use strum::IntoEnumIterator;

use crate::coord::Coord;
use crate::position::{Piece, Position, Side};

/// Seam between evaluation and search, so search tests can plug in a fixed
/// or counting evaluator.
pub trait EvaluatePosition {
    fn evaluate(&self, position: &Position) -> f64;
}

#[derive(Clone, Copy)]
pub struct PositionEvaluator;

impl EvaluatePosition for PositionEvaluator {
    fn evaluate(&self, position: &Position) -> f64 {
        evaluate(position)
    }
}

pub static POSITION_EVALUATOR: PositionEvaluator = PositionEvaluator {};

// Centipawn values per GM Larry Kaufman's material analysis:
// https://www.danheisman.com/evaluation-of-material-imbalances.html
fn piece_value(piece: Piece) -> f64 {
    match piece {
        Piece::Pawn => 100.0,
        Piece::Knight => 325.0,
        Piece::Bishop => 325.0,
        Piece::Rook => 500.0,
        Piece::Queen => 975.0,
        // Kings are never captured, so they carry no material weight.
        Piece::King => 0.0,
    }
}

const BISHOP_PAIR_BONUS: f64 = 0.5;

// Piece-square tables based on secondchess:
// https://github.com/emdio/secondchess/blob/master/secondchess.c
// Oriented for White (rank 7 = white's back rank); Black reads them with the
// rank mirrored.
const PAWN_PST: [[i32; 8]; 8] = [
    [0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 15, 15, 0, 0, 0],
    [0, 0, 0, 10, 10, 0, 0, 0],
    [0, 0, 0, 5, 5, 0, 0, 0],
    [0, 0, 0, -25, -25, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0],
];

const KNIGHT_PST: [[i32; 8]; 8] = [
    [-40, -25, -25, -25, -25, -25, -25, -40],
    [-30, 0, 0, 0, 0, 0, 0, -30],
    [-30, 0, 0, 0, 0, 0, 0, -30],
    [-30, 0, 0, 15, 15, 0, 0, -30],
    [-30, 0, 0, 15, 15, 0, 0, -30],
    [-30, 0, 10, 0, 0, 10, 0, -30],
    [-30, 0, 0, 5, 5, 0, 0, -30],
    [-40, -30, -25, -25, -25, -25, -30, -40],
];

const BISHOP_PST: [[i32; 8]; 8] = [
    [-10, 0, 0, 0, 0, 0, 0, -10],
    [-10, 5, 0, 0, 0, 0, 5, -10],
    [-10, 0, 5, 0, 0, 5, 0, -10],
    [-10, 0, 0, 10, 10, 0, 0, -10],
    [-10, 0, 5, 10, 10, 5, 0, -10],
    [-10, 0, 5, 0, 0, 5, 0, -10],
    [-10, 5, 0, 0, 0, 0, 5, -10],
    [-10, -20, -20, -20, -20, -20, -20, -10],
];

const ROOK_PST: [[i32; 8]; 8] = [
    [0, 0, 0, 0, 0, 0, 0, 0],
    [10, 10, 10, 10, 10, 10, 10, 10],
    [0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 5, 5, 0, 0, 0],
];

// secondchess carries no queen table; the queen is scored by material alone.
const QUEEN_PST: [[i32; 8]; 8] = [[0; 8]; 8];

const KING_PST: [[i32; 8]; 8] = [
    [-25, -25, -25, -25, -25, -25, -25, -25],
    [-25, -25, -25, -25, -25, -25, -25, -25],
    [-25, -25, -25, -25, -25, -25, -25, -25],
    [-25, -25, -25, -25, -25, -25, -25, -25],
    [-25, -25, -25, -25, -25, -25, -25, -25],
    [-25, -25, -25, -25, -25, -25, -25, -25],
    [-25, -25, -25, -25, -25, -25, -25, -25],
    [10, 15, -15, -15, -15, -15, 15, 10],
];

fn piece_square_value(piece: Piece, side: Side, coord: Coord) -> f64 {
    let table = match piece {
        Piece::Pawn => &PAWN_PST,
        Piece::Knight => &KNIGHT_PST,
        Piece::Bishop => &BISHOP_PST,
        Piece::Rook => &ROOK_PST,
        Piece::Queen => &QUEEN_PST,
        Piece::King => &KING_PST,
    };
    let rank = match side {
        Side::White => coord.rank(),
        // Mirror vertically so both sides read the one White-oriented table
        // from their own perspective.
        Side::Black => 7 - coord.rank(),
    };
    f64::from(table[rank][coord.file()])
}

fn material(position: &Position, side: Side) -> f64 {
    Piece::iter()
        .map(|piece| piece_value(piece) * f64::from(position.inventory(side).count(piece)))
        .sum()
}

/// Static score of a position, positive favoring White: material balance from
/// the inventory, a bishop-pair bonus, and per-square positional values. Pure
/// in the board and inventory.
pub fn evaluate(position: &Position) -> f64 {
    let mut eval = material(position, Side::White) - material(position, Side::Black);

    if position.inventory(Side::White).count(Piece::Bishop) == 2 {
        eval += BISHOP_PAIR_BONUS;
    }
    if position.inventory(Side::Black).count(Piece::Bishop) == 2 {
        eval -= BISHOP_PAIR_BONUS;
    }

    for rank in 0..8 {
        for file in 0..8 {
            let coord = Coord::from_indices(rank, file);
            if let Some((piece, side)) = position.piece_at(coord) {
                match side {
                    Side::White => eval += piece_square_value(piece, side, coord),
                    Side::Black => eval -= piece_square_value(piece, side, coord),
                }
            }
        }
    }

    eval
}
