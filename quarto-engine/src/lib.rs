//! Quarto search engine.
//!
//! Negamax with alpha-beta pruning over the dual-decision move structure of
//! Quarto (place the piece in hand, then choose the piece the opponent must
//! play), with symmetry-pruned move generation, a transposition table keyed
//! by (position, piece-in-hand), and an iterative-deepening wrapper under a
//! wall-clock budget.
//!
//! The engine is single-threaded and synchronous. All per-game state lives
//! in an explicitly owned [`SearchContext`]; starting a new game means
//! constructing a fresh context.

pub mod movegen;
pub mod search;
pub mod stats;
pub mod table;
pub mod zobrist;

use thiserror::Error;

pub use movegen::{generate, Move};
pub use search::{choose_starting_piece, choose_starting_piece_with, SearchBudget, SearchContext};
pub use stats::SearchStats;
pub use table::{Bound, TranspositionTable, TtEntry, TtKey};
pub use zobrist::ZobristKeys;

pub use quarto_core::{
    evaluate, has_won, Board, Cell, Evaluation, Piece, PieceSet, Threat, Threats, MAX_SCORE,
};

/// Errors surfaced by the engine.
///
/// Both variants are caller/engine desynchronization bugs, never retried and
/// never shown to an end user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The caller passed arguments that break an API precondition.
    #[error("contract violation: {0}")]
    Contract(&'static str),
    /// Internal bookkeeping reached a state the design rules out.
    #[error("invariant violation: {0}")]
    Invariant(&'static str),
}
