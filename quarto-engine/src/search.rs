//! Negamax search with alpha-beta pruning, transposition probing, and an
//! iterative-deepening wrapper under a wall-clock budget.
//!
//! Every node follows the same state machine: probe the transposition
//! table, check for terminal positions, expand candidate plies, recurse
//! with a flipped sign and a negated swapped window, record the result with
//! its bound kind, return. Values follow the negamax convention: always
//! good-for-the-side-about-to-move.

use std::time::{Duration, Instant};

use quarto_core::{evaluate, Board, Piece, PieceSet, MAX_SCORE};
use rand::seq::IndexedRandom;
use rand::Rng;

use crate::movegen::{generate, Move};
use crate::stats::SearchStats;
use crate::table::{Bound, TranspositionTable, TtEntry, TtKey};
use crate::zobrist::ZobristKeys;
use crate::EngineError;

/// Window bound; negatable without overflow.
const INFINITY: i32 = i32::MAX;

/// Depth and wall-clock limits for one `choose_move` call.
#[derive(Clone, Copy, Debug)]
pub struct SearchBudget {
    /// Hard ceiling on the deepening iterations.
    pub max_depth: u32,
    /// Wall-clock budget; checked between iterations, so overruns are
    /// bounded by one full depth.
    pub time_limit: Duration,
}

impl SearchBudget {
    /// Look-ahead presets matching the original difficulty levels.
    pub const EASY_DEPTH: u32 = 4;
    pub const MEDIUM_DEPTH: u32 = 8;
    pub const HARD_DEPTH: u32 = 12;
    pub const IMPOSSIBLE_DEPTH: u32 = 16;

    /// Budget with the given depth ceiling and the default time limit.
    pub fn with_depth(max_depth: u32) -> SearchBudget {
        SearchBudget {
            max_depth,
            ..SearchBudget::default()
        }
    }
}

impl Default for SearchBudget {
    fn default() -> Self {
        SearchBudget {
            max_depth: Self::HARD_DEPTH,
            time_limit: Duration::from_secs(5),
        }
    }
}

/// Per-game search state: Zobrist tables, transposition table, counters.
///
/// Constructed once per game and passed to every engine call; resetting for
/// a new game means building a fresh context, so there are no static tables
/// to clear. Not safe for concurrent use by two searches.
pub struct SearchContext {
    keys: ZobristKeys,
    table: TranspositionTable,
    stats: SearchStats,
}

impl SearchContext {
    /// Create a context with randomly seeded fingerprint tables.
    pub fn new() -> SearchContext {
        Self::with_rng(&mut rand::rng())
    }

    /// Create a context seeding the fingerprint tables from `rng`.
    pub fn with_rng<R: Rng + ?Sized>(rng: &mut R) -> SearchContext {
        SearchContext {
            keys: ZobristKeys::new(rng),
            table: TranspositionTable::new(),
            stats: SearchStats::default(),
        }
    }

    /// Counters from the most recent `choose_move` call.
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Number of cached positions.
    pub fn table_len(&self) -> usize {
        self.table.len()
    }

    /// Pick the best move for placing `piece`, deepening iteratively within
    /// the budget.
    ///
    /// `available` is the pool of pieces neither placed nor in hand. The
    /// search starts shallow (branching is largest and evaluation least
    /// informative on a sparse board) and deepens one ply at a time while
    /// 1.5x the last iteration's elapsed time still fits the remaining
    /// budget, stopping early once a win or loss is proven. The deepest
    /// completed iteration's move is returned.
    ///
    /// # Errors
    ///
    /// `EngineError::Contract` on a zero depth budget or when `piece` is
    /// still in `available`; `EngineError::Invariant` if no move was found,
    /// which cannot happen on a non-terminal position.
    pub fn choose_move(
        &mut self,
        board: &Board,
        piece: Piece,
        available: PieceSet,
        budget: &SearchBudget,
    ) -> Result<Move, EngineError> {
        if budget.max_depth == 0 {
            return Err(EngineError::Contract("depth budget must be positive"));
        }
        if available.contains(piece) {
            return Err(EngineError::Contract(
                "piece in hand must not be in the available set",
            ));
        }

        self.stats.reset();
        let start = Instant::now();
        // Deeper than the number of open cells is wasted work.
        let max_depth = budget.max_depth.min(board.empty_count().max(1));

        let mut best: Option<Move> = None;
        for depth in 1..=max_depth {
            let iteration_start = Instant::now();
            let (value, mv) = self.search(board, piece, available, 1, -INFINITY, INFINITY, depth)?;
            let mv = mv.ok_or(EngineError::Invariant(
                "search completed without a best move",
            ))?;
            let elapsed = iteration_start.elapsed();

            best = Some(mv);
            self.stats.deepest_completed = depth;
            tracing::debug!(
                depth,
                value,
                nodes = self.stats.nodes,
                elapsed_ms = elapsed.as_millis() as u64,
                "completed iteration"
            );

            if value.abs() >= MAX_SCORE {
                tracing::debug!(depth, value, "outcome proven, stopping early");
                break;
            }
            let remaining_time = budget.time_limit.saturating_sub(start.elapsed());
            if elapsed * 3 / 2 > remaining_time {
                break;
            }
        }

        self.stats.log_summary(self.table.len());
        best.ok_or(EngineError::Invariant(
            "iterative deepening completed no iteration",
        ))
    }

    /// One negamax node.
    ///
    /// `available` excludes `piece`, which is reserved in hand. `sign`
    /// flips each ply; `depth` counts remaining plies. Returns the node
    /// value and the best move, or `None` for a move when the node is
    /// terminal.
    pub fn search(
        &mut self,
        board: &Board,
        piece: Piece,
        available: PieceSet,
        sign: i32,
        mut alpha: i32,
        mut beta: i32,
        depth: u32,
    ) -> Result<(i32, Option<Move>), EngineError> {
        self.stats.nodes += 1;
        let original_alpha = alpha;

        let key = TtKey::new(&self.keys, *board, piece);
        if let Some(entry) = self.table.get(&key) {
            if entry.depth >= depth {
                self.stats.tt_hits += 1;
                match entry.bound {
                    Bound::Exact => {
                        self.stats.tt_cutoffs += 1;
                        return Ok((entry.value, Some(entry.best)));
                    }
                    Bound::Lower => alpha = alpha.max(entry.value),
                    Bound::Upper => beta = beta.min(entry.value),
                }
                if alpha >= beta {
                    self.stats.tt_cutoffs += 1;
                    return Ok((entry.value, Some(entry.best)));
                }
            }
        }

        let eval = evaluate(board);
        if eval.score == MAX_SCORE {
            // The previous ply completed a line; scale by depth so the
            // search prefers faster wins and slower losses.
            return Ok((-MAX_SCORE * (depth as i32 + 1), None));
        }
        if depth == 0 || available.is_empty() {
            return Ok((sign * eval.score, None));
        }

        let moves = generate(board, piece, available)?;
        if moves.is_empty() {
            return Err(EngineError::Invariant(
                "no moves generated for a non-terminal position",
            ));
        }

        let mut best_move: Option<Move> = None;
        let mut best_value = -INFINITY;
        for mv in moves {
            let (child_value, _) = self.search(
                &mv.board,
                mv.hand,
                available.without(mv.hand),
                -sign,
                -beta,
                -alpha,
                depth - 1,
            )?;
            let value = -child_value;
            if value > best_value {
                best_value = value;
                best_move = Some(mv);
            }
            alpha = alpha.max(best_value);
            if alpha >= beta {
                self.stats.beta_cutoffs += 1;
                break;
            }
        }

        let best = best_move.ok_or(EngineError::Invariant(
            "child loop finished without a best move",
        ))?;
        let bound = Bound::classify(best_value, original_alpha, beta)?;
        self.table.put(
            key,
            TtEntry {
                best,
                value: best_value,
                bound,
                depth,
            },
        );
        Ok((best_value, Some(best)))
    }
}

impl Default for SearchContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Pick a uniformly random starting piece to hand to the opponent.
///
/// Only used for the very first hand-off of a game; returns `None` for an
/// empty pool.
pub fn choose_starting_piece(available: PieceSet) -> Option<Piece> {
    choose_starting_piece_with(available, &mut rand::rng())
}

/// Seedable variant of [`choose_starting_piece`].
pub fn choose_starting_piece_with<R: Rng + ?Sized>(
    available: PieceSet,
    rng: &mut R,
) -> Option<Piece> {
    let pieces: Vec<Piece> = available.iter().collect();
    pieces.choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarto_core::Cell;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn context() -> SearchContext {
        SearchContext::with_rng(&mut StdRng::seed_from_u64(1))
    }

    #[test]
    fn test_zero_depth_budget_is_a_contract_error() {
        let mut ctx = context();
        let budget = SearchBudget {
            max_depth: 0,
            time_limit: Duration::from_secs(1),
        };
        let result = ctx.choose_move(
            &Board::new(),
            Piece::new(0),
            PieceSet::FULL.without(Piece::new(0)),
            &budget,
        );
        assert!(matches!(result, Err(EngineError::Contract(_))));
    }

    #[test]
    fn test_piece_in_available_set_is_a_contract_error() {
        let mut ctx = context();
        let result = ctx.choose_move(
            &Board::new(),
            Piece::new(0),
            PieceSet::FULL,
            &SearchBudget::default(),
        );
        assert!(matches!(result, Err(EngineError::Contract(_))));
    }

    #[test]
    fn test_opening_move_on_empty_board() {
        let mut ctx = context();
        let piece = Piece::new(0);
        let budget = SearchBudget {
            max_depth: 1,
            time_limit: Duration::from_secs(10),
        };
        let mv = ctx
            .choose_move(&Board::new(), piece, PieceSet::FULL.without(piece), &budget)
            .unwrap();

        assert_eq!(mv.board.placed_count(), 1);
        assert_eq!(mv.board.piece_at(mv.cell), Some(piece));
        assert_eq!(evaluate(&mv.board).score, 0);
    }

    #[test]
    fn test_takes_an_immediate_win() {
        // Three large pieces on row 0; piece 12 (large) in hand completes it.
        let mut board = Board::new();
        board.place(Cell(0), Piece::new(8));
        board.place(Cell(1), Piece::new(9));
        board.place(Cell(2), Piece::new(10));

        let piece = Piece::new(12);
        let mut available = PieceSet::FULL;
        for id in [8, 9, 10, 12] {
            available.remove(Piece::new(id));
        }

        let mut ctx = context();
        let mv = ctx
            .choose_move(&board, piece, available, &SearchBudget::with_depth(2))
            .unwrap();
        assert_eq!(mv.cell, Cell(3));
        assert!(quarto_core::has_won(&mv.board));
    }

    #[test]
    fn test_antisymmetry_of_signs() {
        // On an empty board every depth-1 leaf evaluates to zero, so the
        // negamax value must negate exactly when the sign flips.
        let piece = Piece::new(3);
        let available = PieceSet::FULL.without(piece);

        let mut positive = context();
        let (value_pos, _) = positive
            .search(&Board::new(), piece, available, 1, -INFINITY, INFINITY, 1)
            .unwrap();

        let mut negative = context();
        let (value_neg, _) = negative
            .search(&Board::new(), piece, available, -1, -INFINITY, INFINITY, 1)
            .unwrap();

        assert_eq!(value_pos, -value_neg);
    }

    #[test]
    fn test_repeated_search_hits_the_cache() {
        let mut ctx = context();
        let piece = Piece::new(7);
        let available = PieceSet::FULL.without(piece);

        let (value_a, move_a) = ctx
            .search(&Board::new(), piece, available, 1, -INFINITY, INFINITY, 2)
            .unwrap();
        let cached = ctx.table_len();
        assert!(cached > 0);

        let (value_b, move_b) = ctx
            .search(&Board::new(), piece, available, 1, -INFINITY, INFINITY, 2)
            .unwrap();
        assert_eq!(value_a, value_b);
        assert_eq!(move_a, move_b);
    }

    #[test]
    fn test_search_depth_zero_returns_signed_static_eval() {
        let mut board = Board::new();
        board.place(Cell(0), Piece::new(12));
        board.place(Cell(1), Piece::new(13));
        let static_score = evaluate(&board).score;
        assert!(static_score > 0);

        let piece = Piece::new(0);
        let available = PieceSet::FULL
            .without(Piece::new(12))
            .without(Piece::new(13))
            .without(piece);

        let mut ctx = context();
        let (value, mv) = ctx
            .search(&board, piece, available, -1, -INFINITY, INFINITY, 0)
            .unwrap();
        assert_eq!(value, -static_score);
        assert!(mv.is_none());
    }

    #[test]
    fn test_won_position_value_scales_with_depth() {
        let mut board = Board::new();
        for (i, id) in [8u8, 9, 10, 11].iter().enumerate() {
            board.place(Cell(i as u8), Piece::new(*id));
        }
        assert!(quarto_core::has_won(&board));

        let piece = Piece::new(0);
        let available = PieceSet::EMPTY;
        let mut ctx = context();

        let (shallow, _) = ctx
            .search(&board, piece, available, 1, -INFINITY, INFINITY, 1)
            .unwrap();
        let (deep, _) = ctx
            .search(&board, piece, available, 1, -INFINITY, INFINITY, 3)
            .unwrap();
        assert_eq!(shallow, -MAX_SCORE * 2);
        assert_eq!(deep, -MAX_SCORE * 4);
    }

    #[test]
    fn test_choose_starting_piece_is_from_the_pool() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut pool = PieceSet::EMPTY;
        pool.insert(Piece::new(2));
        pool.insert(Piece::new(5));
        for _ in 0..32 {
            let piece = choose_starting_piece_with(pool, &mut rng).unwrap();
            assert!(pool.contains(piece));
        }
        assert_eq!(choose_starting_piece_with(PieceSet::EMPTY, &mut rng), None);
    }
}
