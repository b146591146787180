use arrayvec::ArrayVec;

use crate::coord::Coord;
use crate::position::{Move, Piece, Position, Side};

/// A queen on a center square of an open board reaches 27 squares; no piece
/// reaches more.
pub const MAX_PIECE_MOVES: usize = 27;

pub(crate) const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

pub(crate) const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

pub(crate) const BISHOP_RAYS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

pub(crate) const ROOK_RAYS: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Pseudo-legal destinations for the piece standing on `from`: movement
/// pattern and occupancy only, ignoring whether the mover's own king ends up
/// in check. Empty origin yields no moves.
///
/// Destinations are produced in a fixed order (offset-table order for
/// leapers, ray by ray nearest-square-first for sliders), which makes move
/// iteration deterministic all the way up the search.
pub fn pseudo_legal_moves(position: &Position, from: Coord) -> ArrayVec<Move, MAX_PIECE_MOVES> {
    let mut moves = ArrayVec::new();
    let Some((piece, side)) = position.piece_at(from) else {
        return moves;
    };

    match piece {
        Piece::Pawn => pawn_moves(position, from, side, &mut moves),
        Piece::Knight => leaper_moves(position, from, side, &KNIGHT_OFFSETS, &mut moves),
        Piece::Bishop => slider_moves(position, from, side, &BISHOP_RAYS, &mut moves),
        Piece::Rook => slider_moves(position, from, side, &ROOK_RAYS, &mut moves),
        Piece::Queen => {
            slider_moves(position, from, side, &BISHOP_RAYS, &mut moves);
            slider_moves(position, from, side, &ROOK_RAYS, &mut moves);
        }
        Piece::King => leaper_moves(position, from, side, &KING_OFFSETS, &mut moves),
    }

    moves
}

fn pawn_moves(
    position: &Position,
    from: Coord,
    side: Side,
    moves: &mut ArrayVec<Move, MAX_PIECE_MOVES>,
) {
    let forward = side.forward();

    if let Some(single) = from.try_offset(forward, 0) {
        if position.is_empty(single) {
            moves.push(Move::new(from, single));

            if from.rank() == side.pawn_start_rank() {
                if let Some(double) = from.try_offset(2 * forward, 0) {
                    if position.is_empty(double) {
                        moves.push(Move::new(from, double));
                    }
                }
            }
        }
    }

    // Diagonal steps are captures only.
    for df in [-1, 1] {
        if let Some(dest) = from.try_offset(forward, df) {
            if position.is_enemy(side, dest) {
                moves.push(Move::new(from, dest));
            }
        }
    }
}

fn leaper_moves(
    position: &Position,
    from: Coord,
    side: Side,
    offsets: &[(i8, i8)],
    moves: &mut ArrayVec<Move, MAX_PIECE_MOVES>,
) {
    for &(dr, df) in offsets {
        if let Some(dest) = from.try_offset(dr, df) {
            if position.is_empty(dest) || position.is_enemy(side, dest) {
                moves.push(Move::new(from, dest));
            }
        }
    }
}

fn slider_moves(
    position: &Position,
    from: Coord,
    side: Side,
    rays: &[(i8, i8)],
    moves: &mut ArrayVec<Move, MAX_PIECE_MOVES>,
) {
    for &(dr, df) in rays {
        let mut current = from;
        while let Some(dest) = current.try_offset(dr, df) {
            match position.piece_at(dest) {
                None => {
                    moves.push(Move::new(from, dest));
                    current = dest;
                }
                Some((_, owner)) if owner != side => {
                    moves.push(Move::new(from, dest));
                    break;
                }
                Some(_) => break,
            }
        }
    }
}
