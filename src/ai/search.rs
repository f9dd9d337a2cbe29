//! Move pickers: the `MovePicker` trait, the cheap pickers, and minimax.
//!
//! Three implementations are provided:
//!   - `FirstLegalPicker`: the first generated legal move.
//!   - `RandomPicker`: a uniformly random legal move.
//!   - `MinimaxSearcher`: minimax with alpha-beta pruning, White maximizing.
//!
//! Every picker takes a stop flag. Only the searcher runs long enough to
//! care: it polls the flag at every node and unwinds once it is set.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rand::seq::SliceRandom;
use tracing::debug;

use crate::config::{EngineConfig, MoveSelection};
use crate::engine::board::Position;
use crate::engine::movegen::legal_moves;
use crate::engine::status;
use crate::engine::types::{Color, Move};

use super::evaluation::{INF, MATE, evaluate};

// =========================================================================
// MovePicker trait
// =========================================================================

/// Chooses a move for the side to move.
pub trait MovePicker: Send + Sync {
    /// Pick a move, or `None` when the side to move has no legal move.
    fn pick(&self, pos: &Position, stop: &AtomicBool) -> Option<Move>;

    /// Human-readable name for this picker.
    fn name(&self) -> &str;
}

/// Build the picker a configuration asks for.
pub fn picker_for(config: &EngineConfig) -> Arc<dyn MovePicker> {
    match config.selection {
        MoveSelection::Minimax => Arc::new(MinimaxSearcher::new(config.search_depth)),
        MoveSelection::FirstLegal => Arc::new(FirstLegalPicker),
        MoveSelection::Random => Arc::new(RandomPicker),
    }
}

// =========================================================================
// Cheap pickers
// =========================================================================

/// Plays the first legal move in generation order.
pub struct FirstLegalPicker;

impl MovePicker for FirstLegalPicker {
    fn pick(&self, pos: &Position, _stop: &AtomicBool) -> Option<Move> {
        legal_moves(pos, pos.side_to_move).first().copied()
    }

    fn name(&self) -> &str {
        "FirstLegal"
    }
}

/// Picks a random legal move.
pub struct RandomPicker;

impl MovePicker for RandomPicker {
    fn pick(&self, pos: &Position, _stop: &AtomicBool) -> Option<Move> {
        let moves = legal_moves(pos, pos.side_to_move);
        let mut rng = rand::thread_rng();
        moves.choose(&mut rng).copied()
    }

    fn name(&self) -> &str {
        "Random"
    }
}

// =========================================================================
// Move ordering (MVV-LVA)
// =========================================================================

/// Score a move for ordering. Higher = searched first.
fn move_order_score(mv: &Move) -> i32 {
    let mut score = 0;

    // Captures: most valuable victim, least valuable attacker.
    if let Some(victim) = mv.captured {
        score += 10_000 + victim.value() * 10 - mv.piece.value();
    }

    if let Some(promo) = mv.promotion {
        score += 8_000 + promo.value();
    }

    score
}

/// Sort moves for alpha-beta search (best-first). The sort is stable, so
/// quiet moves keep generation order.
fn order_moves(moves: &mut [Move]) {
    moves.sort_by_key(|m| std::cmp::Reverse(move_order_score(m)));
}

// =========================================================================
// MinimaxSearcher
// =========================================================================

/// Search statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub depth: u32,
    /// Score of the chosen move, White's perspective.
    pub score: i32,
    pub time_ms: u64,
    /// The stop flag cut the search short.
    pub aborted: bool,
}

struct SearchContext<'a> {
    stop: &'a AtomicBool,
    nodes: u64,
    aborted: bool,
}

impl SearchContext<'_> {
    #[inline]
    fn should_stop(&mut self) -> bool {
        if !self.aborted && self.stop.load(Ordering::Relaxed) {
            self.aborted = true;
        }
        self.aborted
    }
}

/// Minimax with alpha-beta pruning.
///
/// Returns a score from White's perspective. `ply` is the distance from the
/// root, used to prefer faster mates.
fn minimax(
    pos: &Position,
    depth: u32,
    mut alpha: i32,
    mut beta: i32,
    ply: u32,
    ctx: &mut SearchContext<'_>,
) -> i32 {
    ctx.nodes += 1;
    if ctx.should_stop() {
        return 0;
    }

    let mover = pos.side_to_move;
    let mut moves = legal_moves(pos, mover);

    // Terminal: no legal moves. Checked before the depth cut-off so a
    // depth-1 search still sees mate-in-1.
    if moves.is_empty() {
        if !status::is_check(pos) {
            return 0; // Stalemate.
        }
        let mate = MATE - ply as i32;
        return match mover {
            Color::White => -mate,
            Color::Black => mate,
        };
    }

    if status::is_fifty_move_draw(pos) || status::is_insufficient_material(pos) {
        return 0;
    }

    if depth == 0 {
        return evaluate(pos);
    }

    order_moves(&mut moves);

    let maximizing = mover == Color::White;
    let mut best = if maximizing { -INF } else { INF };

    for mv in &moves {
        let child = pos.apply_move(mv);
        let score = minimax(&child, depth - 1, alpha, beta, ply + 1, ctx);
        if ctx.aborted {
            return best;
        }

        if maximizing {
            best = best.max(score);
            alpha = alpha.max(score);
        } else {
            best = best.min(score);
            beta = beta.min(score);
        }
        if beta <= alpha {
            break; // Cutoff.
        }
    }

    best
}

/// Fixed-depth minimax searcher.
pub struct MinimaxSearcher {
    depth: u32,
}

impl MinimaxSearcher {
    /// A searcher for `depth` plies. Depth 0 is treated as 1.
    pub fn new(depth: u32) -> Self {
        Self {
            depth: depth.max(1),
        }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Run the search. Returns (best_move, stats).
    ///
    /// When stopped early the best fully searched root move is returned, or
    /// the first ordered move if none finished.
    pub fn search(&self, pos: &Position, stop: &AtomicBool) -> (Option<Move>, SearchStats) {
        let start = Instant::now();
        let mut ctx = SearchContext {
            stop,
            nodes: 1,
            aborted: false,
        };

        let mut moves = legal_moves(pos, pos.side_to_move);
        if moves.is_empty() {
            return (
                None,
                SearchStats {
                    nodes: 1,
                    depth: self.depth,
                    ..SearchStats::default()
                },
            );
        }
        order_moves(&mut moves);

        debug!(
            depth = self.depth,
            side = %pos.side_to_move,
            candidates = moves.len(),
            "search started"
        );

        let maximizing = pos.side_to_move == Color::White;
        let mut best_move = moves[0];
        let mut best_score = if maximizing { -INF } else { INF };
        let mut alpha = -INF;
        let mut beta = INF;

        for mv in &moves {
            let child = pos.apply_move(mv);
            let score = minimax(&child, self.depth - 1, alpha, beta, 1, &mut ctx);
            if ctx.aborted {
                // Keep whatever we found so far.
                break;
            }

            if maximizing && score > best_score {
                best_score = score;
                best_move = *mv;
                alpha = alpha.max(score);
            } else if !maximizing && score < best_score {
                best_score = score;
                best_move = *mv;
                beta = beta.min(score);
            }
        }

        let stats = SearchStats {
            nodes: ctx.nodes,
            depth: self.depth,
            score: best_score,
            time_ms: start.elapsed().as_millis() as u64,
            aborted: ctx.aborted,
        };
        debug!(
            mv = %best_move,
            score = stats.score,
            nodes = stats.nodes,
            elapsed_ms = stats.time_ms,
            aborted = stats.aborted,
            "search finished"
        );
        (Some(best_move), stats)
    }
}

impl MovePicker for MinimaxSearcher {
    fn pick(&self, pos: &Position, stop: &AtomicBool) -> Option<Move> {
        self.search(pos, stop).0
    }

    fn name(&self) -> &str {
        "Minimax"
    }
}

// =========================================================================
// Tests
// =========================================================================
