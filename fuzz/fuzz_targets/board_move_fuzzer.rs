//! Fuzz target for Board::execute_move
//!
//! Drives a board through arbitrary move sequences to find state
//! corruption the unit tests' hand-built positions would miss.
//!
//! # Strategy
//!
//! - Any color, in and out of turn order (the board has no turn concept)
//! - Token ids beyond the valid range
//! - Dice values mapped into 1..=6; the room never passes anything else
//! - Long sequences so tokens lap the ring and stack on shared cells
//!
//! # Invariants
//!
//! - Every token's wire position stays in -1..=56
//! - A rejected move leaves the board byte-for-byte unchanged
//! - A token leaving base requires a six and lands on relative 0
//! - Finished is terminal: a finished token never changes state again
//! - A reported capture names an enemy token that is now back in base,
//!   and never a cell on the safe list
//! - all_finished agrees with the per-token states

#![no_main]

use arbitrary::Arbitrary;
use chaupar_core::{Board, Color, HOME_POS, TokenState, global_index, is_safe_cell};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
struct BoardScenario {
    moves: Vec<FuzzedMove>,
}

#[derive(Debug, Clone, Arbitrary)]
struct FuzzedMove {
    color: u8,
    token_id: u8,
    dice: u8,
}

fuzz_target!(|scenario: BoardScenario| {
    let mut board = Board::new();
    let mut finished: Vec<(Color, u8)> = Vec::new();

    for mv in scenario.moves {
        let color = Color::ALL[(mv.color as usize) % Color::ALL.len()];
        let dice = 1 + mv.dice % 6;
        let before = board.clone();
        let was_base = matches!(
            board.token(color, mv.token_id).map(|t| t.state),
            Some(TokenState::Base)
        );

        match board.execute_move(color, mv.token_id, dice) {
            Ok(outcome) => {
                assert!((0..=HOME_POS as i8).contains(&outcome.new_pos));

                if was_base {
                    assert_eq!(dice, 6, "base exit without a six");
                    assert_eq!(outcome.new_pos, 0);
                    assert_eq!(outcome.capture, None, "entry performs no capture check");
                }

                if let Some(capture) = outcome.capture {
                    assert_ne!(capture.color, color, "own color captured");
                    assert_eq!(
                        board.token(capture.color, capture.token_id).map(|t| t.state),
                        Some(TokenState::Base),
                        "captured token must be back in base"
                    );
                    let landing = global_index(color, outcome.new_pos as u8);
                    assert!(!is_safe_cell(landing), "capture on a safe cell");
                }

                if outcome.new_pos == HOME_POS as i8 {
                    finished.push((color, mv.token_id));
                }
            },
            Err(_) => {
                assert_eq!(board, before, "failed move mutated the board");
            },
        }

        check_board(&board, &finished);
    }
});

fn check_board(board: &Board, finished: &[(Color, u8)]) {
    for color in Color::ALL {
        let mut done = 0;
        for token in board.tokens(color) {
            let pos = token.pos();
            assert!((-1..=HOME_POS as i8).contains(&pos), "position out of range: {pos}");

            match token.state {
                TokenState::Base => assert_eq!(pos, -1),
                TokenState::Track { pos: p, .. } => {
                    assert!(p < HOME_POS, "track position at or past home");
                    assert_eq!(pos, p as i8);
                },
                TokenState::Finished => {
                    assert_eq!(pos, HOME_POS as i8);
                    done += 1;
                },
            }
        }

        assert_eq!(board.all_finished(color), done == board.tokens(color).len());
    }

    for &(color, token_id) in finished {
        assert_eq!(
            board.token(color, token_id).map(|t| t.state),
            Some(TokenState::Finished),
            "finished token changed state"
        );
    }
}
