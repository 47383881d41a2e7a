//! End-to-end engine tests: full self-play games and tactical checks that
//! cross the movegen/search/table seams.

use std::collections::HashSet;
use std::time::Duration;

use quarto_engine::{
    choose_starting_piece_with, evaluate, has_won, Board, Cell, Piece, PieceSet, SearchBudget,
    SearchContext,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn budget(depth: u32) -> SearchBudget {
    SearchBudget {
        max_depth: depth,
        time_limit: Duration::from_secs(30),
    }
}

/// Play one full self-play game; both sides share the context, as the
/// context belongs to the game. Returns the final board.
fn self_play(seed: u64, depth: u32) -> Board {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut ctx = SearchContext::with_rng(&mut rng);

    let mut board = Board::new();
    let mut pool = PieceSet::FULL;
    let mut hand = choose_starting_piece_with(pool, &mut rng).expect("full pool");
    pool.remove(hand);

    let mut placed: HashSet<u8> = HashSet::new();
    loop {
        if pool.is_empty() {
            // Last piece: only one cell can remain.
            let cell = board.empty_cells().next().expect("one cell left");
            board.place(cell, hand);
            assert!(placed.insert(hand.id()), "piece placed twice");
            break;
        }

        let mv = ctx
            .choose_move(&board, hand, pool, &budget(depth))
            .expect("non-terminal position must yield a move");

        // The move places exactly the piece in hand on an empty cell of the
        // old board.
        assert!(board.is_empty_cell(mv.cell));
        assert_eq!(mv.board.piece_at(mv.cell), Some(hand));
        assert_eq!(mv.board.placed_count(), board.placed_count() + 1);
        assert!(pool.contains(mv.hand), "handed over a consumed piece");
        assert!(placed.insert(hand.id()), "piece placed twice");

        board = mv.board;
        hand = mv.hand;
        pool.remove(hand);

        if has_won(&board) {
            return board;
        }
    }

    board
}

#[test]
fn test_self_play_game_reaches_a_valid_end() {
    let board = self_play(11, 2);
    assert!(
        has_won(&board) || board.placed_count() == 16,
        "game must end in a win or a full board"
    );
}

#[test]
fn test_self_play_games_with_other_seeds() {
    for seed in [1u64, 23] {
        let board = self_play(seed, 1);
        assert!(has_won(&board) || board.placed_count() == 16);
    }
}

#[test]
fn test_engine_completes_a_winning_line() {
    // Column 0 holds three white pieces; the white piece 5 is in hand.
    let mut board = Board::new();
    board.place(Cell(0), Piece::new(1));
    board.place(Cell(4), Piece::new(3));
    board.place(Cell(8), Piece::new(9));

    let piece = Piece::new(5);
    let mut pool = PieceSet::FULL;
    for id in [1, 3, 9, 5] {
        pool.remove(Piece::new(id));
    }

    let mut ctx = SearchContext::with_rng(&mut StdRng::seed_from_u64(0));
    let mv = ctx.choose_move(&board, piece, pool, &budget(3)).unwrap();
    assert_eq!(mv.cell, Cell(12));
    assert!(has_won(&mv.board));
}

#[test]
fn test_engine_hands_over_a_safe_piece_under_threat() {
    // Row 0 threatens with large (and square) pieces; the piece in hand
    // cannot complete the line, so the engine must pick a hand-off the
    // opponent cannot win with.
    let mut board = Board::new();
    board.place(Cell(0), Piece::new(8));
    board.place(Cell(1), Piece::new(9));
    board.place(Cell(2), Piece::new(10));

    let piece = Piece::new(4); // small, round
    let mut pool = PieceSet::FULL;
    for id in [8, 9, 10, 4] {
        pool.remove(Piece::new(id));
    }

    let mut ctx = SearchContext::with_rng(&mut StdRng::seed_from_u64(5));
    let mv = ctx.choose_move(&board, piece, pool, &budget(2)).unwrap();
    assert!(
        !evaluate(&mv.board).threats.forbids(mv.hand),
        "engine handed over a piece that completes a live threat: {:?}",
        mv
    );
}

#[test]
fn test_choose_move_is_stable_with_a_warm_table() {
    // Same call twice against the same context: the cached result must
    // reproduce the first answer.
    let piece = Piece::new(6);
    let pool = PieceSet::FULL.without(piece);
    let mut ctx = SearchContext::with_rng(&mut StdRng::seed_from_u64(2));

    let first = ctx
        .choose_move(&Board::new(), piece, pool, &budget(2))
        .unwrap();
    let second = ctx
        .choose_move(&Board::new(), piece, pool, &budget(2))
        .unwrap();
    assert_eq!(first, second);
}
