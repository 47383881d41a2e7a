//! Transposition table keyed by (position, piece-in-hand).
//!
//! Keys hash by Zobrist fingerprint but compare by full board content plus
//! the piece in hand, so a fingerprint collision can bucket two keys
//! together yet never conflate them. Entries are overwritten
//! unconditionally: under iterative deepening a later store for the same
//! key comes from an equal-or-deeper search.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use quarto_core::{Board, Piece};

use crate::movegen::Move;
use crate::zobrist::ZobristKeys;
use crate::EngineError;

/// How a cached value relates to the true minimax value.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Bound {
    /// The value is exact (searched inside the window).
    Exact,
    /// The search failed high; the true value is at least this.
    Lower,
    /// The search failed low; the true value is at most this.
    Upper,
}

impl Bound {
    /// Classify a search result against the original alpha-beta window.
    ///
    /// # Errors
    ///
    /// `EngineError::Invariant` if the window is inverted; bound
    /// classification is only meaningful for `original_alpha <= beta`.
    pub fn classify(value: i32, original_alpha: i32, beta: i32) -> Result<Bound, EngineError> {
        if original_alpha > beta {
            return Err(EngineError::Invariant(
                "alpha exceeds beta in bound classification",
            ));
        }
        if value <= original_alpha {
            Ok(Bound::Upper)
        } else if value >= beta {
            Ok(Bound::Lower)
        } else {
            Ok(Bound::Exact)
        }
    }
}

/// Lookup key: exact position content plus the piece in hand.
///
/// The fingerprint is precomputed at construction and is the only thing the
/// `Hash` impl feeds to the hasher; equality still compares the content.
#[derive(Clone, Copy, Debug)]
pub struct TtKey {
    board: Board,
    in_hand: Piece,
    fingerprint: u64,
}

impl TtKey {
    /// Build a key, fingerprinting with the context's Zobrist tables.
    pub fn new(keys: &ZobristKeys, board: Board, in_hand: Piece) -> TtKey {
        TtKey {
            board,
            in_hand,
            fingerprint: keys.fingerprint(&board, in_hand),
        }
    }

    /// Get the precomputed fingerprint.
    #[inline]
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }
}

impl PartialEq for TtKey {
    fn eq(&self, other: &TtKey) -> bool {
        // Full content comparison; the fingerprint only buckets.
        self.board == other.board && self.in_hand == other.in_hand
    }
}

impl Eq for TtKey {}

impl Hash for TtKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.fingerprint);
    }
}

/// A cached search result.
#[derive(Clone, Copy, Debug)]
pub struct TtEntry {
    /// Best move found at this node.
    pub best: Move,
    /// Value of the node, negamax convention.
    pub value: i32,
    /// How `value` relates to the true value.
    pub bound: Bound,
    /// Depth the node was searched to.
    pub depth: u32,
}

/// Cache of previously computed search results, game-lifetime.
///
/// Not designed for concurrent mutation; a context and its table belong to
/// one search at a time.
#[derive(Default)]
pub struct TranspositionTable {
    map: HashMap<TtKey, TtEntry>,
}

impl TranspositionTable {
    /// Create an empty table.
    pub fn new() -> TranspositionTable {
        TranspositionTable {
            map: HashMap::new(),
        }
    }

    /// Look up an entry.
    #[inline]
    pub fn get(&self, key: &TtKey) -> Option<&TtEntry> {
        self.map.get(key)
    }

    /// Store an entry, overwriting any previous one for the key.
    #[inline]
    pub fn put(&mut self, key: TtKey, entry: TtEntry) {
        self.map.insert(key, entry);
    }

    /// Get the number of cached positions.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.map.clear();
    }
}
