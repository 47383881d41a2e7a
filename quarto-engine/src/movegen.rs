//! Move generation with symmetry pruning and safe hand-off filtering.
//!
//! A Quarto ply is a dual decision: place the piece in hand on an empty
//! cell, then pick the piece the opponent must play next. The generator
//! expands every empty cell, drops children that are rotations/reflections
//! of an earlier child (via canonical-form set membership, so the check is
//! O(1) per child instead of pairwise), and for each surviving child emits
//! one move per piece that can be handed over without gifting a win.

use std::collections::HashSet;

use quarto_core::{evaluate, Board, Cell, Piece, PieceSet, Threats};
use serde::{Deserialize, Serialize};

use crate::EngineError;

/// A candidate ply: the resulting position, the insertion cell, and the
/// piece handed to the opponent.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Move {
    /// Position after placing the piece in hand.
    pub board: Board,
    /// Cell the piece in hand was placed on.
    pub cell: Cell,
    /// Piece handed to the opponent for the next ply.
    pub hand: Piece,
}

/// Moves sharing one child position, with that child's static score.
struct Group {
    moves: Vec<Move>,
    score: i32,
}

/// Generate all candidate moves for placing `piece`, ordered best-first.
///
/// Children are deduplicated across the 8 board symmetries. Children whose
/// threat vector is contested are skipped: any hand-off there loses, so one
/// fallback move stands in for all of them when nothing else survives. Moves
/// are grouped by child position, groups are sorted by the child's static
/// score descending (mover's perspective, to maximize cutoffs), then
/// flattened.
///
/// Always returns at least one move when the board has an empty cell and
/// `remaining` is non-empty.
///
/// # Errors
///
/// `EngineError::Contract` if `piece` is still in `remaining`; the caller
/// must have reserved it as in-hand already.
pub fn generate(board: &Board, piece: Piece, remaining: PieceSet) -> Result<Vec<Move>, EngineError> {
    if remaining.contains(piece) {
        return Err(EngineError::Contract(
            "piece to place must not be in the remaining set",
        ));
    }

    let mut seen: HashSet<u128> = HashSet::new();
    let mut groups: Vec<Group> = Vec::new();
    let mut fallback: Option<Move> = None;

    for cell in board.empty_cells() {
        let child = board.with_piece(cell, piece);
        if !seen.insert(child.canonical()) {
            continue;
        }

        if fallback.is_none() {
            fallback = remaining.iter().next().map(|hand| Move {
                board: child,
                cell,
                hand,
            });
        }

        let eval = evaluate(&child);
        if eval.threats.is_contested() {
            // Lost position: every remaining piece completes some threat.
            continue;
        }
        groups.push(Group {
            moves: hand_offs(&child, cell, remaining, &eval.threats),
            score: eval.score,
        });
    }

    groups.sort_by(|a, b| b.score.cmp(&a.score));

    let moves: Vec<Move> = groups.into_iter().flat_map(|g| g.moves).collect();
    if moves.is_empty() {
        // Every child is contested (or no piece is safe anywhere). The game
        // is forced; still hand something over so the search can proceed.
        return Ok(fallback.into_iter().collect());
    }
    Ok(moves)
}

/// Build the moves for one child position: one per safe hand-off, or one
/// arbitrary hand-off if no remaining piece is safe.
fn hand_offs(child: &Board, cell: Cell, remaining: PieceSet, threats: &Threats) -> Vec<Move> {
    let mut moves: Vec<Move> = remaining
        .iter()
        .filter(|&p| !threats.forbids(p))
        .map(|hand| Move {
            board: *child,
            cell,
            hand,
        })
        .collect();
    if moves.is_empty() {
        if let Some(hand) = remaining.iter().next() {
            moves.push(Move {
                board: *child,
                cell,
                hand,
            });
        }
    }
    moves
}
