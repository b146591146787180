use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::evaluation::{EvaluatePosition, POSITION_EVALUATOR};
use crate::position::{Move, Position, Side};
use crate::rules::{self, GenerateMoves, MOVE_GEN};

/// Mate scores sit far outside anything material and the tables can add up
/// to. Mates closer to the root score larger, so the search prefers the
/// faster mate.
const MATE_SCORE: f64 = 1_000_000.0;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SearchError {
    #[error("max depth must be at least 1, got 0")]
    ZeroMaxDepth,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SearchParams {
    pub max_depth: u8,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self { max_depth: 6 }
    }
}

/// The answer for one fully completed iterative-deepening depth.
///
/// `best_move` is `None` when the side to move has no legal moves at all:
/// that is a game-over signal, not a fault.
#[derive(Clone, Debug, PartialEq)]
pub struct DepthResult {
    pub depth: u8,
    pub eval: f64,
    pub best_move: Option<Move>,
}

#[derive(Debug)]
pub struct SearchReport {
    /// Deepest fully completed depth, or `None` if cancellation arrived
    /// before depth 1 finished.
    pub best: Option<DepthResult>,
    pub positions_processed: u64,
    pub time_elapsed: Duration,
}

/// Depth-limited alpha-beta from `position` with `side` to move.
///
/// Returns the score (White-positive) and the chosen move; the move is `None`
/// when there are no legal moves. Among equal-scoring moves the first in
/// generation order wins, so results are deterministic.
pub fn best_move(
    position: &Position,
    side: Side,
    depth_limit: u8,
    move_gen: impl GenerateMoves + Copy,
    evaluator: impl EvaluatePosition + Copy,
) -> (f64, Option<Move>) {
    let mut nodes = 0;
    let never = AtomicBool::new(false);
    match alpha_beta(
        position,
        side,
        0,
        depth_limit,
        f64::NEG_INFINITY,
        f64::INFINITY,
        move_gen,
        evaluator,
        &mut nodes,
        &never,
    ) {
        Some(result) => result,
        // The flag above is never set, so the search cannot be abandoned.
        None => unreachable!("search without a cancellation source was cancelled"),
    }
}

/// Two-sided alpha-beta. White maximizes (narrows `alpha`), Black minimizes
/// (narrows `beta`); a branch is cut as soon as `alpha >= beta`.
///
/// Returns `None` when `cancel` fires, which unwinds the whole in-flight
/// depth; partially explored depths are never reported.
#[allow(clippy::too_many_arguments)]
fn alpha_beta(
    position: &Position,
    side: Side,
    depth: u8,
    depth_limit: u8,
    mut alpha: f64,
    mut beta: f64,
    move_gen: impl GenerateMoves + Copy,
    evaluator: impl EvaluatePosition + Copy,
    nodes: &mut u64,
    cancel: &AtomicBool,
) -> Option<(f64, Option<Move>)> {
    if cancel.load(Ordering::Relaxed) {
        return None;
    }
    *nodes += 1;

    if depth == depth_limit {
        return Some((evaluator.evaluate(position), None));
    }

    let moves = move_gen.gen_moves(position, side);
    if moves.is_empty() {
        return Some((no_moves_score(position, side, depth), None));
    }

    let mut best: Option<Move> = None;
    if side == Side::White {
        for mve in moves {
            let child = position.apply(mve);
            let (score, _) = alpha_beta(
                &child,
                side.opposite(),
                depth + 1,
                depth_limit,
                alpha,
                beta,
                move_gen,
                evaluator,
                nodes,
                cancel,
            )?;
            if score > alpha {
                alpha = score;
                best = Some(mve);
            }
            if alpha >= beta {
                break;
            }
        }
        Some((alpha, best))
    } else {
        for mve in moves {
            let child = position.apply(mve);
            let (score, _) = alpha_beta(
                &child,
                side.opposite(),
                depth + 1,
                depth_limit,
                alpha,
                beta,
                move_gen,
                evaluator,
                nodes,
                cancel,
            )?;
            if score < beta {
                beta = score;
                best = Some(mve);
            }
            if alpha >= beta {
                break;
            }
        }
        Some((beta, best))
    }
}

/// Score for a node where the side to move has no legal moves: a loss when in
/// check, a draw otherwise (same policy as [`rules::game_status`]).
fn no_moves_score(position: &Position, side: Side, depth: u8) -> f64 {
    if rules::in_check(position, side) {
        let mate = MATE_SCORE - f64::from(depth);
        match side {
            Side::White => -mate,
            Side::Black => mate,
        }
    } else {
        0.0
    }
}

/// Iterative deepening driver: searches depth 1, then 2, and so on up to
/// `params.max_depth`, publishing each fully completed depth on `results`.
///
/// The loop has no clock of its own; an external controller imposes the time
/// budget by setting `cancel`, which abandons the in-flight depth. The last
/// result published (equally, `SearchReport::best`) is always from a fully
/// completed depth.
pub fn search(
    position: &Position,
    side: Side,
    params: &SearchParams,
    move_gen: impl GenerateMoves + Copy,
    evaluator: impl EvaluatePosition + Copy,
    results: mpsc::Sender<DepthResult>,
    cancel: Arc<AtomicBool>,
) -> Result<SearchReport, SearchError> {
    if params.max_depth == 0 {
        return Err(SearchError::ZeroMaxDepth);
    }

    let start = Instant::now();
    let mut nodes: u64 = 0;
    let mut best: Option<DepthResult> = None;

    for depth_limit in 1..=params.max_depth {
        match alpha_beta(
            position,
            side,
            0,
            depth_limit,
            f64::NEG_INFINITY,
            f64::INFINITY,
            move_gen,
            evaluator,
            &mut nodes,
            &cancel,
        ) {
            Some((eval, mve)) => {
                let result = DepthResult {
                    depth: depth_limit,
                    eval,
                    best_move: mve,
                };
                let elapsed = start.elapsed();
                let nps = nodes as f64 / elapsed.as_secs_f64().max(1e-9);
                info!(
                    "depth {} eval {} nodes {} nps {:.0} time {}ms best {}",
                    depth_limit,
                    eval,
                    nodes,
                    nps,
                    elapsed.as_millis(),
                    mve.map_or("-".to_string(), |m| m.to_string()),
                );
                // The controller may already have dropped its receiver.
                let _ = results.send(result.clone());
                best = Some(result);

                if mve.is_none() {
                    // No legal moves: deeper searches cannot change anything.
                    break;
                }
            }
            None => {
                debug!("search cancelled during depth {depth_limit}");
                break;
            }
        }
    }

    Ok(SearchReport {
        best,
        positions_processed: nodes,
        time_elapsed: start.elapsed(),
    })
}

/// A search running on its own thread, owning its position tree exclusively.
///
/// Completed depths arrive on an internal channel; the controller drains them
/// with [`SearchHandle::latest`], requests termination with
/// [`SearchHandle::cancel`], and collects the final report with
/// [`SearchHandle::wait`].
#[derive(Debug)]
pub struct SearchHandle {
    cancel: Arc<AtomicBool>,
    results: mpsc::Receiver<DepthResult>,
    join: JoinHandle<Result<SearchReport, SearchError>>,
}

impl SearchHandle {
    /// Requests cooperative termination; the worker abandons its in-flight
    /// depth and returns.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Drains the result channel and keeps the deepest completed answer seen
    /// so far, if any.
    pub fn latest(&self) -> Option<DepthResult> {
        let mut latest = None;
        while let Ok(result) = self.results.try_recv() {
            latest = Some(result);
        }
        latest
    }

    /// Blocks until the worker finishes. Call [`SearchHandle::cancel`] first
    /// to impose a time budget.
    pub fn wait(self) -> Result<SearchReport, SearchError> {
        match self.join.join() {
            Ok(report) => report,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    /// Cancels and waits, returning the last fully completed answer.
    pub fn stop(self) -> Result<SearchReport, SearchError> {
        self.cancel();
        self.wait()
    }
}

/// Spawns the iterative-deepening search as a cancellable worker with the
/// default move generator and evaluator.
pub fn spawn_search(position: Position, side: Side, params: SearchParams) -> SearchHandle {
    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_for_thread = Arc::clone(&cancel);
    let (tx, rx) = mpsc::channel();
    let join = std::thread::spawn(move || {
        search(
            &position,
            side,
            &params,
            MOVE_GEN,
            POSITION_EVALUATOR,
            tx,
            cancel_for_thread,
        )
    });
    SearchHandle {
        cancel,
        results: rx,
        join,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Coord;
    use crate::evaluation::evaluate;
    use crate::position::Piece;
    use crate::rules::legal_moves;
    use test_case::test_case;
    use testresult::TestResult;

    fn coord(s: &str) -> Coord {
        s.parse().unwrap()
    }

    fn mve(src: &str, dest: &str) -> Move {
        Move::new(coord(src), coord(dest))
    }

    /// Plain minimax without pruning, the reference alpha-beta must match.
    fn minimax(position: &Position, side: Side, depth: u8, depth_limit: u8) -> f64 {
        if depth == depth_limit {
            return evaluate(position);
        }
        let moves = legal_moves(position, side);
        if moves.is_empty() {
            return super::no_moves_score(position, side, depth);
        }
        let child_scores = moves
            .iter()
            .map(|&m| minimax(&position.apply(m), side.opposite(), depth + 1, depth_limit));
        if side == Side::White {
            child_scores.fold(f64::NEG_INFINITY, f64::max)
        } else {
            child_scores.fold(f64::INFINITY, f64::min)
        }
    }

    #[test]
    fn test_depth_one_picks_best_immediate_eval() {
        let position = Position::start();
        let (score, chosen) = best_move(&position, Side::White, 1, MOVE_GEN, POSITION_EVALUATOR);

        let mut want_score = f64::NEG_INFINITY;
        let mut want_move = None;
        for m in legal_moves(&position, Side::White) {
            let child_eval = evaluate(&position.apply(m));
            // Strictly-greater keeps the first of an equal-scoring run.
            if child_eval > want_score {
                want_score = child_eval;
                want_move = Some(m);
            }
        }

        assert_eq!(score, want_score);
        assert_eq!(chosen, want_move);
    }

    #[test]
    fn test_tie_break_follows_generation_order() {
        // Bare kings: several king moves share the top positional score, and
        // the first of them in generation order must be the one kept.
        let position = Position::from_pieces(&[
            (coord("e1"), Piece::King, Side::White),
            (coord("a8"), Piece::King, Side::Black),
        ])
        .unwrap();

        let moves = legal_moves(&position, Side::White);
        let mut want_score = f64::NEG_INFINITY;
        let mut want_move = None;
        for &m in &moves {
            let child_eval = evaluate(&position.apply(m));
            if child_eval > want_score {
                want_score = child_eval;
                want_move = Some(m);
            }
        }
        let tied = moves
            .iter()
            .filter(|&&m| evaluate(&position.apply(m)) == want_score)
            .count();
        assert!(tied >= 2, "scenario should have tied best moves, got {tied}");

        let (score, chosen) = best_move(&position, Side::White, 1, MOVE_GEN, POSITION_EVALUATOR);
        assert_eq!(score, want_score);
        assert_eq!(chosen, want_move);
    }

    fn sharp_midgame() -> Position {
        Position::start()
            .apply(mve("e2", "e4"))
            .apply(mve("e7", "e5"))
            .apply(mve("g1", "f3"))
            .apply(mve("b8", "c6"))
            .apply(mve("f1", "c4"))
            .apply(mve("f8", "c5"))
    }

    #[test_case(Position::start(), Side::White, 2)]
    #[test_case(Position::start(), Side::Black, 2)]
    #[test_case(sharp_midgame(), Side::White, 2)]
    #[test_case(sharp_midgame(), Side::Black, 3)]
    fn test_alpha_beta_matches_plain_minimax(position: Position, side: Side, depth: u8) {
        let (pruned_score, _) = best_move(&position, side, depth, MOVE_GEN, POSITION_EVALUATOR);
        let full_score = minimax(&position, side, 0, depth);
        assert_eq!(
            pruned_score, full_score,
            "pruning changed the score at depth {depth}"
        );
    }

    #[test]
    fn test_finds_back_rank_mate_in_one() {
        // White rook a1 mates on a8-adjacent back rank; black king boxed in
        // by its own pawns.
        let position = Position::from_pieces(&[
            (coord("g1"), Piece::King, Side::White),
            (coord("a1"), Piece::Rook, Side::White),
            (coord("g8"), Piece::King, Side::Black),
            (coord("f7"), Piece::Pawn, Side::Black),
            (coord("g7"), Piece::Pawn, Side::Black),
            (coord("h7"), Piece::Pawn, Side::Black),
        ])
        .unwrap();

        let (score, chosen) = best_move(&position, Side::White, 2, MOVE_GEN, POSITION_EVALUATOR);
        assert_eq!(chosen, Some(mve("a1", "a8")));
        assert!(score > MATE_SCORE / 2.0);
    }

    #[test]
    fn test_no_legal_moves_returns_no_move() {
        // Stalemated side to move: score 0, no move.
        let position = Position::from_pieces(&[
            (coord("e1"), Piece::King, Side::White),
            (coord("c7"), Piece::Queen, Side::White),
            (coord("a8"), Piece::King, Side::Black),
        ])
        .unwrap();
        let (score, chosen) = best_move(&position, Side::Black, 3, MOVE_GEN, POSITION_EVALUATOR);
        assert_eq!(chosen, None);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_search_publishes_every_completed_depth() -> TestResult {
        let (tx, rx) = mpsc::channel();
        let report = search(
            &Position::start(),
            Side::White,
            &SearchParams { max_depth: 3 },
            MOVE_GEN,
            POSITION_EVALUATOR,
            tx,
            Arc::new(AtomicBool::new(false)),
        )?;

        let published: Vec<DepthResult> = rx.iter().collect();
        assert_eq!(
            published.iter().map(|r| r.depth).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(report.best.as_ref(), published.last());
        assert!(report.best.unwrap().best_move.is_some());
        assert!(report.positions_processed > 0);
        Ok(())
    }

    #[test]
    fn test_pre_cancelled_search_reports_nothing() -> TestResult {
        let (tx, _rx) = mpsc::channel();
        let report = search(
            &Position::start(),
            Side::White,
            &SearchParams::default(),
            MOVE_GEN,
            POSITION_EVALUATOR,
            tx,
            Arc::new(AtomicBool::new(true)),
        )?;
        assert!(report.best.is_none());
        Ok(())
    }

    #[test]
    fn test_zero_depth_is_an_error() {
        let (tx, _rx) = mpsc::channel();
        let err = search(
            &Position::start(),
            Side::White,
            &SearchParams { max_depth: 0 },
            MOVE_GEN,
            POSITION_EVALUATOR,
            tx,
            Arc::new(AtomicBool::new(false)),
        )
        .unwrap_err();
        assert_eq!(err, SearchError::ZeroMaxDepth);
    }
}
