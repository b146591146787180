use std::fmt;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

use crate::coord::Coord;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum PositionError {
    #[error("{0} has no king in the given setup")]
    MissingKing(Side),

    #[error("{0} has more than one king in the given setup")]
    DuplicateKing(Side),

    #[error("two pieces placed on {0}")]
    SquareOccupied(Coord),
}

#[derive(Debug, PartialEq, Eq, EnumIter, Clone, Copy, Display, Hash, Deserialize, Serialize)]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    /// Rank step this side's pawns advance by. White moves toward rank 0.
    pub(crate) fn forward(self) -> i8 {
        match self {
            Side::White => -1,
            Side::Black => 1,
        }
    }

    pub(crate) fn pawn_start_rank(self) -> usize {
        match self {
            Side::White => 6,
            Side::Black => 1,
        }
    }
}

#[derive(Debug, PartialEq, Eq, EnumIter, Clone, Copy, Display, Hash, Deserialize, Serialize)]
pub enum Piece {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

#[allow(clippy::from_over_into)]
impl Into<char> for Piece {
    fn into(self) -> char {
        match self {
            Piece::Pawn => 'p',
            Piece::Knight => 'n',
            Piece::Bishop => 'b',
            Piece::Rook => 'r',
            Piece::Queen => 'q',
            Piece::King => 'k',
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Move {
    pub src: Coord,
    pub dest: Coord,
}

impl Move {
    pub fn new(src: Coord, dest: Coord) -> Move {
        Self { src, dest }
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.src, self.dest)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.src, self.dest)
    }
}

/// 64 square contents, addressed rank-major.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
struct Board([[Option<(Piece, Side)>; 8]; 8]);

impl Board {
    fn empty() -> Self {
        Board([[None; 8]; 8])
    }

    fn start() -> Self {
        const BACK_RANK: [Piece; 8] = [
            Piece::Rook,
            Piece::Knight,
            Piece::Bishop,
            Piece::Queen,
            Piece::King,
            Piece::Bishop,
            Piece::Knight,
            Piece::Rook,
        ];

        let mut board = Board::empty();
        for (file, &piece) in BACK_RANK.iter().enumerate() {
            board.0[0][file] = Some((piece, Side::Black));
            board.0[1][file] = Some((Piece::Pawn, Side::Black));
            board.0[6][file] = Some((Piece::Pawn, Side::White));
            board.0[7][file] = Some((piece, Side::White));
        }
        board
    }

    fn get(&self, coord: Coord) -> Option<(Piece, Side)> {
        self.0[coord.rank()][coord.file()]
    }

    fn set(&mut self, coord: Coord, content: Option<(Piece, Side)>) {
        self.0[coord.rank()][coord.file()] = content;
    }
}

/// Remaining piece counts for one side, kept in sync with the board so that
/// material evaluation never rescans all 64 squares.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Inventory([u8; 6]);

impl Inventory {
    fn empty() -> Self {
        Inventory([0; 6])
    }

    fn start() -> Self {
        Inventory([8, 2, 2, 2, 1, 1])
    }

    pub fn count(&self, piece: Piece) -> u8 {
        self.0[piece as usize]
    }

    pub fn total(&self) -> u8 {
        self.0.iter().sum()
    }

    fn increment(&mut self, piece: Piece) {
        self.0[piece as usize] += 1;
    }

    fn decrement(&mut self, piece: Piece) {
        debug_assert!(self.0[piece as usize] > 0, "inventory underflow: {piece}");
        self.0[piece as usize] -= 1;
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
struct Inventories {
    white: Inventory,
    black: Inventory,
}

impl Inventories {
    fn get(&self, side: Side) -> &Inventory {
        match side {
            Side::White => &self.white,
            Side::Black => &self.black,
        }
    }

    fn get_mut(&mut self, side: Side) -> &mut Inventory {
        match side {
            Side::White => &mut self.white,
            Side::Black => &mut self.black,
        }
    }
}

/// An immutable board snapshot: square contents, per-side inventory, king
/// coordinates and the move that produced it.
///
/// A `Position` is only created by [`Position::start`], [`Position::from_pieces`]
/// or [`Position::apply`]; it is never mutated afterwards, so search branches
/// holding different snapshots can never interfere.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Position {
    board: Board,
    inventory: Inventories,
    white_king: Coord,
    black_king: Coord,
    last_move: Option<Move>,
}

impl Position {
    pub fn start() -> Self {
        Self {
            board: Board::start(),
            inventory: Inventories {
                white: Inventory::start(),
                black: Inventory::start(),
            },
            white_king: Coord::from_indices(7, 4),
            black_king: Coord::from_indices(0, 4),
            last_move: None,
        }
    }

    /// Builds a position from an explicit piece list, for endgame studies and
    /// tests. Each side must have exactly one king.
    pub fn from_pieces(pieces: &[(Coord, Piece, Side)]) -> Result<Self, PositionError> {
        let mut board = Board::empty();
        let mut inventory = Inventories {
            white: Inventory::empty(),
            black: Inventory::empty(),
        };
        let mut white_king = None;
        let mut black_king = None;

        for &(coord, piece, side) in pieces {
            if board.get(coord).is_some() {
                return Err(PositionError::SquareOccupied(coord));
            }
            board.set(coord, Some((piece, side)));
            inventory.get_mut(side).increment(piece);

            if piece == Piece::King {
                let king = match side {
                    Side::White => &mut white_king,
                    Side::Black => &mut black_king,
                };
                if king.is_some() {
                    return Err(PositionError::DuplicateKing(side));
                }
                *king = Some(coord);
            }
        }

        Ok(Self {
            board,
            inventory,
            white_king: white_king.ok_or(PositionError::MissingKing(Side::White))?,
            black_king: black_king.ok_or(PositionError::MissingKing(Side::Black))?,
            last_move: None,
        })
    }

    pub fn piece_at(&self, coord: Coord) -> Option<(Piece, Side)> {
        self.board.get(coord)
    }

    pub fn is_empty(&self, coord: Coord) -> bool {
        self.board.get(coord).is_none()
    }

    pub fn is_enemy(&self, side: Side, coord: Coord) -> bool {
        matches!(self.board.get(coord), Some((_, owner)) if owner != side)
    }

    pub fn king_coord(&self, side: Side) -> Coord {
        match side {
            Side::White => self.white_king,
            Side::Black => self.black_king,
        }
    }

    pub fn inventory(&self, side: Side) -> &Inventory {
        self.inventory.get(side)
    }

    /// The move that produced this position, `None` for a freshly set up one.
    pub fn last_move(&self) -> Option<Move> {
        self.last_move
    }

    /// Derives the position after `mve`: the receiver is copied in full and
    /// left untouched.
    ///
    /// A capture removes the destination piece and decrements the captured
    /// side's inventory; a king move updates that side's king coordinate.
    ///
    /// # Panics
    ///
    /// Panics if `mve.src` is empty. Moving onto a friendly piece or capturing
    /// a king are caller contract violations caught by debug assertions; route
    /// externally supplied moves through [`crate::rules::play_move`].
    pub fn apply(&self, mve: Move) -> Position {
        let mut next = self.clone();
        next.last_move = Some(mve);

        let (piece, side) = self
            .piece_at(mve.src)
            .expect("apply: source square is empty");

        if let Some((captured, captured_side)) = self.piece_at(mve.dest) {
            debug_assert!(captured_side != side, "apply: friendly capture {mve}");
            debug_assert!(captured != Piece::King, "apply: king capture {mve}");
            next.inventory.get_mut(captured_side).decrement(captured);
        }
        next.board.set(mve.dest, Some((piece, side)));
        next.board.set(mve.src, None);

        if piece == Piece::King {
            match side {
                Side::White => next.white_king = mve.dest,
                Side::Black => next.black_king = mve.dest,
            }
        }

        next
    }
}

impl fmt::Display for Position {
    /// Plain grid, black's back rank on top: uppercase white pieces,
    /// lowercase black, `.` for empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in 0..8 {
            for file in 0..8 {
                let square = match self.board.get(Coord::from_indices(rank, file)) {
                    Some((piece, Side::White)) => {
                        let ch: char = piece.into();
                        ch.to_ascii_uppercase()
                    }
                    Some((piece, Side::Black)) => piece.into(),
                    None => '.',
                };
                write!(f, "{} ", square)?;
            }
            writeln!(f, " {}", 8 - rank)?;
        }
        writeln!(f, "a b c d e f g h")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;
    use testresult::TestResult;

    fn coord(s: &str) -> Coord {
        s.parse().unwrap()
    }

    #[test_case("e1", Piece::King, Side::White)]
    #[test_case("d1", Piece::Queen, Side::White)]
    #[test_case("e8", Piece::King, Side::Black)]
    #[test_case("d8", Piece::Queen, Side::Black)]
    #[test_case("a1", Piece::Rook, Side::White)]
    #[test_case("b8", Piece::Knight, Side::Black)]
    #[test_case("c1", Piece::Bishop, Side::White)]
    #[test_case("e2", Piece::Pawn, Side::White)]
    #[test_case("e7", Piece::Pawn, Side::Black)]
    fn test_start_layout(square: &str, piece: Piece, side: Side) {
        let position = Position::start();
        assert_eq!(position.piece_at(coord(square)), Some((piece, side)));
    }

    #[test]
    fn test_start_state() {
        let position = Position::start();
        assert_eq!(position.king_coord(Side::White), coord("e1"));
        assert_eq!(position.king_coord(Side::Black), coord("e8"));
        assert_eq!(position.inventory(Side::White).total(), 16);
        assert_eq!(position.inventory(Side::Black).total(), 16);
        assert_eq!(position.last_move(), None);
        assert!(position.is_empty(coord("e4")));
    }

    #[test]
    fn test_apply_relocation() {
        let start = Position::start();
        let mve = Move::new(coord("e2"), coord("e4"));
        let next = start.apply(mve);

        assert!(next.is_empty(coord("e2")));
        assert_eq!(next.piece_at(coord("e4")), Some((Piece::Pawn, Side::White)));
        assert_eq!(next.last_move(), Some(mve));

        // The parent snapshot is untouched.
        assert_eq!(start, Position::start());
    }

    #[test]
    fn test_apply_capture_updates_inventory() -> TestResult {
        let position = Position::from_pieces(&[
            (coord("e1"), Piece::King, Side::White),
            (coord("d4"), Piece::Rook, Side::White),
            (coord("d8"), Piece::Queen, Side::Black),
            (coord("h8"), Piece::King, Side::Black),
        ])?;

        let next = position.apply(Move::new(coord("d4"), coord("d8")));
        assert_eq!(next.piece_at(coord("d8")), Some((Piece::Rook, Side::White)));
        assert_eq!(next.inventory(Side::Black).count(Piece::Queen), 0);
        assert_eq!(next.inventory(Side::Black).total(), 1);
        assert_eq!(next.inventory(Side::White).total(), 2);

        assert_eq!(position.inventory(Side::Black).count(Piece::Queen), 1);
        Ok(())
    }

    #[test]
    fn test_apply_updates_king_coord() {
        let position = Position::start()
            .apply(Move::new(coord("e2"), coord("e4")))
            .apply(Move::new(coord("e7"), coord("e5")))
            .apply(Move::new(coord("e1"), coord("e2")));
        assert_eq!(position.king_coord(Side::White), coord("e2"));
        assert_eq!(position.king_coord(Side::Black), coord("e8"));
    }

    #[test]
    fn test_piece_counts_conserved_over_apply_chain() {
        let moves = [
            ("e2", "e4"),
            ("d7", "d5"),
            ("e4", "d5"), // capture
            ("d8", "d5"), // capture
            ("b1", "c3"),
            ("d5", "d4"),
        ];
        let mut position = Position::start();
        let mut captured = 0u8;
        for (src, dest) in moves {
            if !position.is_empty(coord(dest)) {
                captured += 1;
            }
            position = position.apply(Move::new(coord(src), coord(dest)));
            let on_board = position.inventory(Side::White).total()
                + position.inventory(Side::Black).total();
            assert_eq!(on_board + captured, 32);
        }
        assert_eq!(captured, 2);
    }

    #[test]
    fn test_from_pieces_rejects_bad_setups() {
        let missing = Position::from_pieces(&[(coord("e1"), Piece::King, Side::White)]);
        assert_eq!(missing.unwrap_err(), PositionError::MissingKing(Side::Black));

        let occupied = Position::from_pieces(&[
            (coord("e1"), Piece::King, Side::White),
            (coord("e1"), Piece::Queen, Side::White),
        ]);
        assert_eq!(
            occupied.unwrap_err(),
            PositionError::SquareOccupied(coord("e1"))
        );

        let doubled = Position::from_pieces(&[
            (coord("e1"), Piece::King, Side::White),
            (coord("a1"), Piece::King, Side::White),
            (coord("e8"), Piece::King, Side::Black),
        ]);
        assert_eq!(
            doubled.unwrap_err(),
            PositionError::DuplicateKing(Side::White)
        );
    }

    #[test]
    fn test_display_grid() {
        let shown = Position::start().to_string();
        let want = "\
r n b q k b n r  8
p p p p p p p p  7
. . . . . . . .  6
. . . . . . . .  5
. . . . . . . .  4
. . . . . . . .  3
P P P P P P P P  2
R N B Q K B N R  1
a b c d e f g h
";
        assert_eq!(shown, want);
    }
}
