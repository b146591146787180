pub mod coord;
pub mod evaluation;
pub mod move_gen;
pub mod position;
pub mod rules;
pub mod search;

pub use coord::{Coord, CoordError};
pub use evaluation::{evaluate, EvaluatePosition, PositionEvaluator, POSITION_EVALUATOR};
pub use position::{Move, Piece, Position, PositionError, Side};
pub use rules::{
    game_status, in_check, legal_moves, legal_moves_from, play_move, validate_move, GameStatus,
    GenerateMoves, LegalMoveGen, MoveError, MOVE_GEN,
};
pub use search::{
    best_move, search, spawn_search, DepthResult, SearchError, SearchHandle, SearchParams,
    SearchReport,
};
