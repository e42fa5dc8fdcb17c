//! Fuzz target for room request handling
//!
//! Drives one room through arbitrary roll/move/pause sequences, dice fed
//! by a seeded simulated environment, to find turn-state desync between
//! the board, the turn machine, and the lifecycle status.
//!
//! # Strategy
//!
//! - Member and non-member connections, in and out of turn
//! - Arbitrary token ids and dice claims, so stale and bogus moves hit
//! - Pauses at any point, including after the match is decided
//! - Room sizes 1..=4 (a single seat reaches settlement fastest)
//!
//! # Invariants
//!
//! - The turn index always names a seat that exists
//! - A dice value is pending exactly while a move is awaited
//! - The six count never reaches the forfeit threshold between requests
//! - A room that is not Active emits nothing
//! - Handlers only broadcast dice_result, token_moved and turn_change
//! - Settlement happens at most once, closes its batch, and leaves the
//!   room Finished with the winner's tokens all home
//! - Pause never un-finishes a room

#![no_main]

use arbitrary::Arbitrary;
use chaupar_core::{Color, HOME_POS, MAX_CONSECUTIVE_SIXES, TurnPhase};
use chaupar_harness::SimEnv;
use chaupar_proto::Event;
use chaupar_server::{PlayerSlot, Room, RoomAction, RoomStatus};
use libfuzzer_sys::fuzz_target;

const BET: u64 = 100;

#[derive(Debug, Clone, Arbitrary)]
struct RoomScenario {
    seed: u64,
    player_count: u8,
    ops: Vec<RoomOp>,
}

#[derive(Debug, Clone, Arbitrary)]
enum RoomOp {
    Roll { seat: u8 },
    Move { seat: u8, token_id: u8, claimed_dice: u8 },
    Pause { seat: u8 },
}

fuzz_target!(|scenario: RoomScenario| {
    let count = 1 + usize::from(scenario.player_count % 4);
    let players: Vec<PlayerSlot> = (0..count)
        .map(|i| PlayerSlot {
            connection_id: 10 + i as u64,
            user_id: 100 + i as u64,
            color: Color::ALL[i % Color::ALL.len()],
            is_ai: false,
        })
        .collect();

    let env = SimEnv::with_seed(scenario.seed);
    let mut room: Room<u64> = Room::new(1, players, BET, 0);
    let mut settled = false;

    for op in scenario.ops {
        let status_before = room.status();

        match op {
            RoomOp::Roll { seat } => {
                let actions = room.handle_roll(conn(seat, count), &env);
                check_actions(&room, status_before, &actions, &mut settled);
            },
            RoomOp::Move { seat, token_id, claimed_dice } => {
                let actions = room.handle_move(conn(seat, count), token_id, claimed_dice);
                check_actions(&room, status_before, &actions, &mut settled);
            },
            RoomOp::Pause { seat } => {
                room.pause(conn(seat, count));
                if status_before == RoomStatus::Finished {
                    assert_eq!(room.status(), RoomStatus::Finished, "pause revived the room");
                }
            },
        }

        check_room(&room, count);
    }
});

/// Connection id for a fuzzed seat choice. One value past the last seat
/// maps to a connection that is not a member.
fn conn(seat: u8, count: usize) -> u64 {
    10 + u64::from(seat) % (count as u64 + 1)
}

fn check_actions(
    room: &Room<u64>,
    status_before: RoomStatus,
    actions: &[RoomAction],
    settled: &mut bool,
) {
    if status_before != RoomStatus::Active {
        assert!(actions.is_empty(), "inactive room produced actions");
        return;
    }

    for (i, action) in actions.iter().enumerate() {
        match action {
            RoomAction::Broadcast { event } => {
                assert!(
                    matches!(
                        event,
                        Event::DiceResult { .. }
                            | Event::TokenMoved { .. }
                            | Event::TurnChange { .. }
                    ),
                    "unexpected broadcast: {event:?}"
                );
            },
            RoomAction::Settle { winner, players, bet_amount } => {
                assert!(!*settled, "room settled twice");
                *settled = true;

                assert_eq!(i, actions.len() - 1, "settle must close the batch");
                assert_eq!(room.status(), RoomStatus::Finished);
                assert!(room.board().all_finished(winner.color));
                assert!(players.contains(winner));
                assert_eq!(*bet_amount, BET);
            },
        }
    }
}

fn check_room(room: &Room<u64>, count: usize) {
    let turn = room.turn();
    assert!(usize::from(turn.turn_index()) < count, "turn index past the last seat");
    assert!(turn.dice_value() <= 6);
    assert_eq!(
        turn.dice_value() != 0,
        turn.phase() == TurnPhase::AwaitingMove,
        "dice value and phase disagree"
    );
    assert!(turn.consecutive_sixes() < MAX_CONSECUTIVE_SIXES);

    for color in Color::ALL {
        for token in room.board().tokens(color) {
            assert!((-1..=HOME_POS as i8).contains(&token.pos()));
        }
    }
}
