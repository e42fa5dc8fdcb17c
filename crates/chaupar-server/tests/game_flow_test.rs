//! Full match flow: queueing, pairing, a complete scripted game, settlement.
//!
//! Drives a two-player match end to end through the public request surface
//! with every die scripted, then audits the event stream and the wallet.
//! Nothing nondeterministic leaks in: a leftover scripted die or an extra
//! event fails the test.

use chaupar_core::{Color, TokenStatus};
use chaupar_harness::SimEnv;
use chaupar_proto::{Event, Request};
use chaupar_server::{GameServer, MemoryWallet, RecordingDelivery, ServerConfig, Wallet};

/// Joins first, waits in the queue, seats second (green).
const GREEN_CONN: u64 = 10;
const GREEN_USER: u64 = 1;

/// Joins second, triggers the pairing, seats first (red).
const RED_CONN: u64 = 20;
const RED_USER: u64 = 2;

const BET: u64 = 100;

type TestServer = GameServer<SimEnv, MemoryWallet, RecordingDelivery>;

/// Register both players, queue them at the given stake, and read the
/// room id back out of the submitter's `game_start`.
async fn start_match(
    env: &SimEnv,
    wallet: &MemoryWallet,
    delivery: &RecordingDelivery,
    bet_amount: u64,
) -> (TestServer, u64) {
    let server =
        GameServer::new(env.clone(), wallet.clone(), delivery.clone(), ServerConfig::default());

    assert!(server.register_connection(GREEN_CONN, GREEN_USER).await);
    assert!(server.register_connection(RED_CONN, RED_USER).await);

    let join = Request::JoinQueue { bet_amount, player_count: 2 };
    server.handle_request(GREEN_CONN, join).await.unwrap();
    assert!(delivery.is_empty(), "a lone player gets no events");
    server.handle_request(RED_CONN, join).await.unwrap();

    let events = delivery.events_for(RED_CONN);
    let Some(Event::GameStart { room_id, player_color, players }) = events.first() else {
        panic!("expected game_start for the submitter, got {events:?}");
    };
    assert_eq!(*player_color, Color::Red, "the pairing submitter takes the first seat");
    assert_eq!(players, &[Color::Red, Color::Green]);

    (server, *room_id)
}

/// One possession: for each play, script the die, roll it, move the token.
async fn take_turn(
    server: &TestServer,
    env: &SimEnv,
    connection_id: u64,
    room_id: u64,
    plays: &[(u8, u8)],
) {
    for &(die, token_id) in plays {
        env.script_rolls(&[die]);
        server.handle_request(connection_id, Request::RollDice { room_id }).await.unwrap();
        server
            .handle_request(connection_id, Request::MoveToken {
                room_id,
                token_id,
                dice_value: die,
            })
            .await
            .unwrap();
    }
}

fn events_of(all: &[(u64, Event)], connection_id: u64) -> Vec<Event> {
    all.iter()
        .filter(|(conn, _)| *conn == connection_id)
        .map(|(_, event)| event.clone())
        .collect()
}

fn count(events: &[Event], predicate: impl Fn(&Event) -> bool) -> usize {
    events.iter().filter(|event| predicate(event)).count()
}

/// Drive the match to red's win with every die scripted.
///
/// Red walks each token home in four possessions: spawn-and-run
/// [6, 6, 5] three times, then [6, 5] to hit home by exact count
/// (6+5+6+6+5+6+6+5+6+5 = 56 steps past the spawn). Green spawns one
/// token and single-steps along its own stretch of the ring; the step
/// pattern keeps the colors off each other's cells, so no capture and
/// no forfeit disturbs the bookkeeping. Possessions alternate; green
/// sits out only after the winning move.
async fn play_red_sweep(server: &TestServer, env: &SimEnv, room_id: u64) {
    let mut red_turns: Vec<Vec<(u8, u8)>> = Vec::new();
    for token_id in 0..4u8 {
        for _ in 0..3 {
            red_turns.push(vec![(6, token_id), (6, token_id), (5, token_id)]);
        }
        red_turns.push(vec![(6, token_id), (5, token_id)]);
    }

    let mut green_turns: Vec<Vec<(u8, u8)>> = vec![vec![(6, 0), (1, 0)]];
    for step in [1, 1, 2, 1, 1, 1, 1, 2, 1, 1, 1, 2, 1, 1] {
        green_turns.push(vec![(step, 0)]);
    }
    assert_eq!(red_turns.len(), 16);
    assert_eq!(green_turns.len(), 15);

    for (i, red_possession) in red_turns.iter().enumerate() {
        take_turn(server, env, RED_CONN, room_id, red_possession).await;
        if let Some(green_possession) = green_turns.get(i) {
            take_turn(server, env, GREEN_CONN, room_id, green_possession).await;
        }
    }

    assert_eq!(env.scripted_remaining(), 0, "every scripted die must be consumed");
}

#[tokio::test]
async fn two_player_match_runs_to_settlement() {
    let env = SimEnv::with_seed(11);
    let wallet = MemoryWallet::new().with_user(GREEN_USER, 500).with_user(RED_USER, 1000);
    let delivery = RecordingDelivery::new();
    let (server, room_id) = start_match(&env, &wallet, &delivery, BET).await;

    assert_eq!(server.queue_len().await, 0);
    assert_eq!(server.room_count().await, 1);

    play_red_sweep(&server, &env, room_id).await;

    // Zero rake: the winner takes the whole pot, the loser's stake stays
    // wherever bet placement put it.
    assert_eq!(wallet.balance(RED_USER), Ok(1000 + 2 * BET as i64));
    assert_eq!(wallet.balance(GREEN_USER), Ok(500));

    // The room is torn down; a duplicate roll racing the settlement is
    // tolerated silently. The event counts below double as proof that it
    // emitted nothing.
    assert_eq!(server.room_count().await, 0);
    server.handle_request(RED_CONN, Request::RollDice { room_id }).await.unwrap();

    let all = delivery.take();
    for connection_id in [RED_CONN, GREEN_CONN] {
        let events = events_of(&all, connection_id);

        // 60 rolls and 60 moves: 44 red (12 three-roll and 4 two-roll
        // possessions) plus 16 green. 30 turn changes: every possession
        // hands the turn over except the winning one.
        assert_eq!(count(&events, |e| matches!(e, Event::GameStart { .. })), 1);
        assert_eq!(count(&events, |e| matches!(e, Event::DiceResult { .. })), 60);
        assert_eq!(count(&events, |e| matches!(e, Event::TokenMoved { .. })), 60);
        assert_eq!(count(&events, |e| matches!(e, Event::TurnChange { .. })), 30);
        assert_eq!(count(&events, |e| matches!(e, Event::GameOver { .. })), 1);
        assert_eq!(events.len(), 152);

        // Both players watch the same opening: red's first roll is a six
        // that spawns token 0 on its start cell.
        assert_eq!(events[1], Event::DiceResult {
            color: Color::Red,
            value: 6,
            turn_index: 0,
            consecutive_sixes: 1,
        });
        assert_eq!(events[2], Event::TokenMoved {
            color: Color::Red,
            token_id: 0,
            new_pos: 0,
            status: TokenStatus::Track,
            killed_info: None,
        });

        // The winning move finishes red's last token, then the match
        // report closes the stream.
        assert_eq!(events[events.len() - 2], Event::TokenMoved {
            color: Color::Red,
            token_id: 3,
            new_pos: 56,
            status: TokenStatus::Finished,
            killed_info: None,
        });
    }

    let red_events = events_of(&all, RED_CONN);
    assert_eq!(red_events.last(), Some(&Event::GameOver {
        winner: Color::Red,
        winnings: 2 * BET,
        new_balance: Some(1200),
    }));

    let green_events = events_of(&all, GREEN_CONN);
    assert_eq!(green_events.last(), Some(&Event::GameOver {
        winner: Color::Red,
        winnings: 2 * BET,
        new_balance: Some(500),
    }));
}

#[tokio::test]
async fn maximum_bet_settlement_clamps_the_payout() {
    let env = SimEnv::with_seed(12);
    let wallet = MemoryWallet::new().with_user(GREEN_USER, 0).with_user(RED_USER, 0);
    let delivery = RecordingDelivery::new();
    let (server, room_id) = start_match(&env, &wallet, &delivery, u64::MAX).await;

    play_red_sweep(&server, &env, room_id).await;

    // The pot saturates at u64::MAX; the winner's credit clamps to the
    // wallet's signed range instead of wrapping into a debit.
    assert_eq!(wallet.balance(RED_USER), Ok(i64::MAX));
    assert_eq!(wallet.balance(GREEN_USER), Ok(0));

    let all = delivery.take();
    let red_events = events_of(&all, RED_CONN);
    assert_eq!(red_events.last(), Some(&Event::GameOver {
        winner: Color::Red,
        winnings: u64::MAX,
        new_balance: Some(i64::MAX),
    }));
    assert_eq!(server.room_count().await, 0);
}

#[tokio::test]
async fn four_player_match_seats_in_join_order() {
    let env = SimEnv::with_seed(3);
    let wallet = MemoryWallet::new()
        .with_user(101, 1000)
        .with_user(102, 1000)
        .with_user(103, 1000)
        .with_user(104, 1000);
    let delivery = RecordingDelivery::new();
    let server =
        GameServer::new(env.clone(), wallet, delivery.clone(), ServerConfig::default());

    for (connection_id, user_id) in [(1, 101), (2, 102), (3, 103), (4, 104)] {
        assert!(server.register_connection(connection_id, user_id).await);
        server
            .handle_request(connection_id, Request::JoinQueue { bet_amount: 50, player_count: 4 })
            .await
            .unwrap();
    }

    assert_eq!(server.queue_len().await, 0);
    assert_eq!(server.room_count().await, 1);
    assert_eq!(delivery.len(), 4, "one game_start per player");

    let submitter_events = delivery.events_for(4);
    let Some(Event::GameStart { room_id, .. }) = submitter_events.first() else {
        panic!("expected game_start for the submitter, got {submitter_events:?}");
    };
    let room_id = *room_id;

    // Submitter first, then the waiting players in arrival order.
    let expected = [(4, Color::Red), (1, Color::Green), (2, Color::Yellow), (3, Color::Blue)];
    for (connection_id, color) in expected {
        let events = delivery.events_for(connection_id);
        let Some(Event::GameStart { player_color, players, .. }) = events.first() else {
            panic!("expected game_start for {connection_id}, got {events:?}");
        };
        assert_eq!(*player_color, color);
        assert_eq!(players, &[Color::Red, Color::Green, Color::Yellow, Color::Blue]);
    }

    // Slot 0 (the submitter) holds the first turn.
    env.script_rolls(&[2]);
    server.handle_request(4, Request::RollDice { room_id }).await.unwrap();
    assert_eq!(delivery.len(), 8, "the roll reaches all four players");
    assert_eq!(delivery.events_for(1).get(1), Some(&Event::DiceResult {
        color: Color::Red,
        value: 2,
        turn_index: 0,
        consecutive_sixes: 0,
    }));

    // Everyone else is just a spectator until the turn reaches them.
    server.handle_request(1, Request::RollDice { room_id }).await.unwrap();
    assert_eq!(delivery.len(), 8, "an out-of-turn roll emits nothing");
}
