//! Session lifecycle: registration, disconnects, and their fallout.
//!
//! Disconnects take two shapes: a waiting player silently leaves the
//! queue, a playing one freezes their room. Both paths, plus the silent
//! drop of requests from unregistered connections, are covered here.

use chaupar_harness::SimEnv;
use chaupar_proto::{Event, Request};
use chaupar_server::{GameServer, MemoryWallet, RecordingDelivery, ServerConfig, ServerError};

type TestServer = GameServer<SimEnv, MemoryWallet, RecordingDelivery>;

fn server_with(env: &SimEnv, delivery: &RecordingDelivery) -> TestServer {
    let wallet = MemoryWallet::new().with_user(1, 1000).with_user(2, 1000).with_user(3, 1000);
    GameServer::new(env.clone(), wallet, delivery.clone(), ServerConfig::default())
}

const JOIN: Request = Request::JoinQueue { bet_amount: 100, player_count: 2 };

#[tokio::test]
async fn requests_from_unregistered_connections_are_ignored() {
    let env = SimEnv::with_seed(0);
    let delivery = RecordingDelivery::new();
    let server = server_with(&env, &delivery);

    // No session handoff happened: the join is dropped, not an error.
    server.handle_request(77, JOIN).await.unwrap();

    assert_eq!(server.queue_len().await, 0);
    assert!(delivery.is_empty());
}

#[tokio::test]
async fn connection_binds_to_one_user_until_disconnect() {
    let env = SimEnv::with_seed(0);
    let delivery = RecordingDelivery::new();
    let server = server_with(&env, &delivery);

    assert!(server.register_connection(7, 1).await);
    assert!(!server.register_connection(7, 2).await, "a bound connection stays bound");

    // After the disconnect the session is gone; the join is silently
    // dropped instead of queueing a ghost.
    server.handle_disconnect(7).await;
    server.handle_request(7, JOIN).await.unwrap();
    assert_eq!(server.queue_len().await, 0);

    // The id can be bound again after the disconnect, and then plays.
    assert!(server.register_connection(7, 2).await);
    server.handle_request(7, JOIN).await.unwrap();
    assert_eq!(server.queue_len().await, 1);
}

#[tokio::test]
async fn waiting_player_leaves_the_queue_on_disconnect() {
    let env = SimEnv::with_seed(0);
    let delivery = RecordingDelivery::new();
    let server = server_with(&env, &delivery);

    assert!(server.register_connection(10, 1).await);
    assert!(server.register_connection(20, 2).await);

    server.handle_request(10, JOIN).await.unwrap();
    assert_eq!(server.queue_len().await, 1);

    server.handle_disconnect(10).await;
    assert_eq!(server.queue_len().await, 0);

    // The next joiner waits instead of pairing with a ghost.
    server.handle_request(20, JOIN).await.unwrap();
    assert_eq!(server.queue_len().await, 1);
    assert_eq!(server.room_count().await, 0);
    assert!(delivery.is_empty());
}

#[tokio::test]
async fn disconnect_mid_match_freezes_the_room() {
    let env = SimEnv::with_seed(0);
    let delivery = RecordingDelivery::new();
    let server = server_with(&env, &delivery);

    assert!(server.register_connection(10, 1).await);
    assert!(server.register_connection(20, 2).await);
    server.handle_request(10, JOIN).await.unwrap();
    server.handle_request(20, JOIN).await.unwrap();
    assert_eq!(server.room_count().await, 1);

    let events = delivery.take();
    let Some((_, Event::GameStart { room_id, .. })) = events.first() else {
        panic!("expected game_start, got {events:?}");
    };
    let room_id = *room_id;

    server.handle_disconnect(20).await;

    // The room survives for a product-level resume or refund decision,
    // but play is frozen: the remaining player's requests change nothing.
    assert_eq!(server.room_count().await, 1);
    server.handle_request(10, Request::RollDice { room_id }).await.unwrap();
    server
        .handle_request(10, Request::MoveToken { room_id, token_id: 0, dice_value: 6 })
        .await
        .unwrap();
    assert!(delivery.is_empty(), "a frozen room emits nothing");

    // The survivor is free to look for a new match.
    server.handle_request(10, JOIN).await.unwrap();
    assert_eq!(server.queue_len().await, 1);
}

#[tokio::test]
async fn queueing_while_playing_is_rejected() {
    let env = SimEnv::with_seed(0);
    let delivery = RecordingDelivery::new();
    let server = server_with(&env, &delivery);

    assert!(server.register_connection(10, 1).await);
    assert!(server.register_connection(20, 2).await);
    server.handle_request(10, JOIN).await.unwrap();
    server.handle_request(20, JOIN).await.unwrap();

    let events = delivery.take();
    let Some((_, Event::GameStart { room_id, .. })) = events.first() else {
        panic!("expected game_start, got {events:?}");
    };
    let room_id = *room_id;

    let result = server.handle_request(20, JOIN).await;
    assert_eq!(
        result,
        Err(ServerError::AlreadyInMatch { connection_id: 20, room_id }),
        "one seat per connection while a match is live"
    );
    assert_eq!(server.queue_len().await, 0);
}

#[tokio::test]
async fn disconnect_of_unknown_connection_is_a_no_op() {
    let env = SimEnv::with_seed(0);
    let delivery = RecordingDelivery::new();
    let server = server_with(&env, &delivery);

    assert!(server.register_connection(10, 1).await);
    server.handle_request(10, JOIN).await.unwrap();

    server.handle_disconnect(999).await;

    assert_eq!(server.queue_len().await, 1, "strangers cannot dequeue anyone");
    assert_eq!(server.room_count().await, 0);
}
