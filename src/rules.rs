use arrayvec::ArrayVec;

use crate::coord::Coord;
use crate::move_gen::{
    self, BISHOP_RAYS, KING_OFFSETS, KNIGHT_OFFSETS, MAX_PIECE_MOVES, ROOK_RAYS,
};
use crate::position::{Move, Piece, Position, Side};

/// No side-to-move position exceeds this many legal moves.
pub const MAX_POSITION_MOVES: usize = 218;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum MoveError {
    #[error("no piece at {0}")]
    NoPieceAtSource(Coord),

    #[error("the piece at {0} is not {1}'s")]
    NotYourPiece(Coord, Side),

    #[error("{1} already has a piece at {0}")]
    FriendlyPieceAtDest(Coord, Side),

    #[error("the piece at {} cannot move to {}", .0.src, .0.dest)]
    NotAPieceMove(Move),

    #[error("{0} would leave {1}'s king in check")]
    LeavesKingInCheck(Move, Side),
}

/// How a game stands for the side whose turn it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    /// No legal moves while in check; the opponent wins.
    Checkmate,
    /// No legal moves while not in check; drawn. Both variants end the game.
    Stalemate,
}

/// Seam between the rules layer and search, so search can be driven by an
/// alternative generator in tests.
pub trait GenerateMoves {
    fn gen_moves(&self, position: &Position, side: Side) -> ArrayVec<Move, MAX_POSITION_MOVES>;
}

#[derive(Clone, Copy)]
pub struct LegalMoveGen;

impl GenerateMoves for LegalMoveGen {
    fn gen_moves(&self, position: &Position, side: Side) -> ArrayVec<Move, MAX_POSITION_MOVES> {
        legal_moves(position, side)
    }
}

pub static MOVE_GEN: LegalMoveGen = LegalMoveGen;

/// True if `side`'s king is attacked by any enemy piece.
///
/// Each enemy attack pattern is mirrored from the king's own square: a
/// matching enemy piece on the mirrored square (or at the first occupied
/// square of a ray) means the pattern also reaches the king.
pub fn in_check(position: &Position, side: Side) -> bool {
    let king = position.king_coord(side);
    let enemy = side.opposite();

    // An enemy pawn captures along its own forward diagonals, so it sits one
    // step in *our* forward direction from the king.
    for df in [-1, 1] {
        if let Some(from) = king.try_offset(side.forward(), df) {
            if position.piece_at(from) == Some((Piece::Pawn, enemy)) {
                return true;
            }
        }
    }

    for &(dr, df) in &KNIGHT_OFFSETS {
        if let Some(from) = king.try_offset(dr, df) {
            if position.piece_at(from) == Some((Piece::Knight, enemy)) {
                return true;
            }
        }
    }

    for &ray in &BISHOP_RAYS {
        match first_piece_along(position, king, ray) {
            Some((Piece::Bishop | Piece::Queen, owner)) if owner == enemy => return true,
            _ => {}
        }
    }

    for &ray in &ROOK_RAYS {
        match first_piece_along(position, king, ray) {
            Some((Piece::Rook | Piece::Queen, owner)) if owner == enemy => return true,
            _ => {}
        }
    }

    // Adjacent enemy king; forbids the kings standing next to each other.
    for &(dr, df) in &KING_OFFSETS {
        if let Some(from) = king.try_offset(dr, df) {
            if position.piece_at(from) == Some((Piece::King, enemy)) {
                return true;
            }
        }
    }

    false
}

fn first_piece_along(position: &Position, from: Coord, (dr, df): (i8, i8)) -> Option<(Piece, Side)> {
    let mut current = from;
    while let Some(next) = current.try_offset(dr, df) {
        if let Some(occupant) = position.piece_at(next) {
            return Some(occupant);
        }
        current = next;
    }
    None
}

/// Every move `side` can make without leaving its own king in check.
///
/// Pieces are visited rank-major then file-major, and each piece's moves in
/// generator order; search tie-breaks follow this fixed order.
pub fn legal_moves(position: &Position, side: Side) -> ArrayVec<Move, MAX_POSITION_MOVES> {
    let mut moves = ArrayVec::new();
    for rank in 0..8 {
        for file in 0..8 {
            let from = Coord::from_indices(rank, file);
            match position.piece_at(from) {
                Some((_, owner)) if owner == side => {}
                _ => continue,
            }
            for mve in move_gen::pseudo_legal_moves(position, from) {
                if !in_check(&position.apply(mve), side) {
                    moves.push(mve);
                }
            }
        }
    }
    moves
}

/// Legal destinations of the single piece on `from`, for move hints.
pub fn legal_moves_from(position: &Position, from: Coord) -> ArrayVec<Move, MAX_PIECE_MOVES> {
    let mut moves = ArrayVec::new();
    let Some((_, side)) = position.piece_at(from) else {
        return moves;
    };
    for mve in move_gen::pseudo_legal_moves(position, from) {
        if !in_check(&position.apply(mve), side) {
            moves.push(mve);
        }
    }
    moves
}

pub fn game_status(position: &Position, side: Side) -> GameStatus {
    if !legal_moves(position, side).is_empty() {
        GameStatus::InProgress
    } else if in_check(position, side) {
        GameStatus::Checkmate
    } else {
        GameStatus::Stalemate
    }
}

/// The move-input contract for externally supplied moves: `side` must own the
/// source piece, must not own the destination, and the move must be in the
/// piece's legal set. Rejections carry the failing clause.
pub fn validate_move(position: &Position, side: Side, mve: Move) -> Result<(), MoveError> {
    let Some((_, owner)) = position.piece_at(mve.src) else {
        return Err(MoveError::NoPieceAtSource(mve.src));
    };
    if owner != side {
        return Err(MoveError::NotYourPiece(mve.src, side));
    }
    if matches!(position.piece_at(mve.dest), Some((_, dest_owner)) if dest_owner == side) {
        return Err(MoveError::FriendlyPieceAtDest(mve.dest, side));
    }
    if !move_gen::pseudo_legal_moves(position, mve.src).contains(&mve) {
        return Err(MoveError::NotAPieceMove(mve));
    }
    if in_check(&position.apply(mve), side) {
        return Err(MoveError::LeavesKingInCheck(mve, side));
    }
    Ok(())
}

/// Validates and applies in one step; on rejection no position is produced.
pub fn play_move(position: &Position, side: Side, mve: Move) -> Result<Position, MoveError> {
    validate_move(position, side, mve)?;
    Ok(position.apply(mve))
}
