//! Zobrist-style fingerprinting of (position, piece-in-hand) pairs.
//!
//! Each (cell, piece) pair and each possible piece-in-hand gets a random
//! 64-bit key; a position's fingerprint is the XOR of the keys of its
//! occupied cells, folded with the in-hand key. The fingerprint buckets
//! transposition-table lookups; it is never trusted for equality, since
//! collisions are possible over a 64-bit keyspace.

use quarto_core::{Board, Cell, Piece, CELL_COUNT, PIECE_COUNT};
use rand::Rng;

/// Random key tables for fingerprinting.
///
/// Owned by a [`SearchContext`](crate::SearchContext) and built once per
/// game, so there is no global mutable state to clear.
pub struct ZobristKeys {
    /// One key per (cell, piece) pair.
    piece_cell: [[u64; PIECE_COUNT]; CELL_COUNT],
    /// One key per possible piece-in-hand.
    in_hand: [u64; PIECE_COUNT],
}

impl ZobristKeys {
    /// Generate fresh key tables from the given RNG.
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> ZobristKeys {
        let mut piece_cell = [[0u64; PIECE_COUNT]; CELL_COUNT];
        for cell in piece_cell.iter_mut() {
            for key in cell.iter_mut() {
                *key = rng.random();
            }
        }
        let mut in_hand = [0u64; PIECE_COUNT];
        for key in in_hand.iter_mut() {
            *key = rng.random();
        }
        ZobristKeys { piece_cell, in_hand }
    }

    /// Fingerprint the board contents alone.
    pub fn board_fingerprint(&self, board: &Board) -> u64 {
        let mut hash = 0u64;
        for cell in Cell::all() {
            if let Some(piece) = board.piece_at(cell) {
                hash ^= self.piece_cell[cell.0 as usize][piece.id() as usize];
            }
        }
        hash
    }

    /// Fingerprint a (board, piece-in-hand) search key.
    pub fn fingerprint(&self, board: &Board, in_hand: Piece) -> u64 {
        self.board_fingerprint(board) ^ self.in_hand[in_hand.id() as usize]
    }
}
