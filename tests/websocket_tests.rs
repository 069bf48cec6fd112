mod common;

use std::sync::Arc;
use std::time::Duration;

use futures::SinkExt;
use serde_json::json;

use common::{
    connect, expect_rejection, expect_silence, next_message, ready_pair, send_json, spawn_server,
    test_state, token_for, wait_until_online, RECEIVE_TIMEOUT, TEST_SECRET,
};
use shared::models::game_session::{FinishReason, Side};
use shared::models::messages::ServerMessage;
use shared::models::tournament::TournamentStatus;
use shared::repositories::match_result_repository::{
    InMemoryMatchResultRepository, MatchResultRepository,
};
use shared::state::AppState;
use websocket_api::actions::connect::{
    CLOSE_NOT_A_PARTICIPANT, CLOSE_ROOM_FULL, CLOSE_UNAUTHORIZED,
};

#[tokio::test]
async fn test_missing_token_closes_with_unauthorized_code() {
    let addr = spawn_server(test_state()).await;

    let mut client = connect(&addr, None, Some("g1")).await;
    let (message, code) = expect_rejection(&mut client).await;

    assert_eq!(code, CLOSE_UNAUTHORIZED);
    assert!(
        message.contains("Unauthorized"),
        "Unexpected rejection message: {}",
        message
    );
}

#[tokio::test]
async fn test_forged_token_is_never_accepted() {
    let addr = spawn_server(test_state()).await;
    let forged = token_for(&AppState::in_memory("someone-else".to_string()), "alice");

    let mut client = connect(&addr, Some(&forged), None).await;
    let (_, code) = expect_rejection(&mut client).await;

    assert_eq!(code, CLOSE_UNAUTHORIZED);
}

#[tokio::test]
async fn test_third_connection_is_refused_as_room_full() {
    let state = test_state();
    let addr = spawn_server(state.clone()).await;
    let (_host, _guest) = ready_pair(&addr, &state, "g-full", "alice", "bob").await;

    let mut third = connect(&addr, Some(&token_for(&state, "carol")), Some("g-full")).await;
    let (_, code) = expect_rejection(&mut third).await;

    assert_eq!(code, CLOSE_ROOM_FULL);
}

#[tokio::test]
async fn test_ready_carries_both_players() {
    let state = test_state();
    let addr = spawn_server(state.clone()).await;

    let mut alice = connect(&addr, Some(&token_for(&state, "alice")), Some("g-ready")).await;
    wait_until_online(&state, "alice").await;
    let mut bob = connect(&addr, Some(&token_for(&state, "bob")), Some("g-ready")).await;

    match next_message(&mut alice).await {
        ServerMessage::Ready {
            side,
            left_name,
            right_name,
            left_user_id,
            right_user_id,
            state,
        } => {
            assert_eq!(side, Side::Left);
            assert_eq!(left_user_id, "alice");
            assert_eq!(right_user_id, "bob");
            assert_eq!(left_name, "alice (display)");
            assert_eq!(right_name, "bob (display)");
            assert_eq!((state.left_score, state.right_score), (0, 0));
        }
        other => panic!("Expected ready, got {:?}", other),
    }
    assert!(matches!(
        next_message(&mut bob).await,
        ServerMessage::Ready {
            side: Side::Right,
            ..
        }
    ));
}

#[tokio::test]
async fn test_paddle_moves_are_relayed_to_the_opponent() {
    let state = test_state();
    let addr = spawn_server(state.clone()).await;
    let (mut host, mut guest) = ready_pair(&addr, &state, "g-paddle", "alice", "bob").await;

    send_json(&mut host, json!({"type": "paddleMove", "y": 140.0})).await;
    send_json(&mut guest, json!({"type": "paddleMove", "y": 60.0})).await;

    assert_eq!(
        next_message(&mut guest).await,
        ServerMessage::PaddleUpdate {
            side: Side::Left,
            y: 140.0
        }
    );
    assert_eq!(
        next_message(&mut host).await,
        ServerMessage::PaddleUpdate {
            side: Side::Right,
            y: 60.0
        }
    );
}

#[tokio::test]
async fn test_only_the_host_drives_the_ball() {
    let state = test_state();
    let addr = spawn_server(state.clone()).await;
    let (mut host, mut guest) = ready_pair(&addr, &state, "g-ball", "alice", "bob").await;

    send_json(
        &mut guest,
        json!({"type": "ballUpdate", "ballX": 10.0, "ballY": 10.0, "ballVX": 1.0, "ballVY": 1.0}),
    )
    .await;
    assert!(matches!(
        next_message(&mut guest).await,
        ServerMessage::Error { .. }
    ));

    send_json(
        &mut host,
        json!({
            "type": "ballUpdate",
            "ballX": 420.0,
            "ballY": 180.0,
            "ballVX": -4.0,
            "ballVY": 2.5,
            "gameStarted": true
        }),
    )
    .await;
    assert_eq!(
        next_message(&mut guest).await,
        ServerMessage::BallUpdate {
            ball_x: 420.0,
            ball_y: 180.0,
            ball_vx: -4.0,
            ball_vy: 2.5,
            game_started: true
        }
    );
}

#[tokio::test]
async fn test_malformed_frames_do_not_close_the_connection() {
    let state = test_state();
    let addr = spawn_server(state.clone()).await;
    let (mut host, mut guest) = ready_pair(&addr, &state, "g-noise", "alice", "bob").await;

    host.send(tokio_tungstenite::tungstenite::Message::text("{broken"))
        .await
        .expect("Failed to send frame");
    send_json(&mut host, json!({"type": "warpDrive"})).await;
    send_json(&mut host, json!({"type": "pauseGame"})).await;

    assert_eq!(next_message(&mut guest).await, ServerMessage::GamePaused);
    expect_silence(&mut host, Duration::from_millis(200)).await;
}

#[tokio::test]
async fn test_score_reaching_threshold_finishes_the_game() {
    let results = Arc::new(InMemoryMatchResultRepository::new());
    let state = AppState::with_match_results(TEST_SECRET.to_string(), results.clone());
    let addr = spawn_server(state.clone()).await;
    let (mut host, mut guest) = ready_pair(&addr, &state, "g-score", "alice", "bob").await;

    send_json(
        &mut host,
        json!({"type": "scoreUpdate", "leftScore": 4, "rightScore": 2}),
    )
    .await;
    assert_eq!(
        next_message(&mut guest).await,
        ServerMessage::ScoreUpdate {
            left_score: 4,
            right_score: 2,
            winner: None
        }
    );

    // A client-claimed winner is ignored; the threshold decides.
    send_json(
        &mut host,
        json!({"type": "scoreUpdate", "leftScore": 5, "rightScore": 2, "winner": "right"}),
    )
    .await;
    assert_eq!(
        next_message(&mut guest).await,
        ServerMessage::ScoreUpdate {
            left_score: 5,
            right_score: 2,
            winner: Some(Side::Left)
        }
    );

    send_json(
        &mut host,
        json!({"type": "scoreUpdate", "leftScore": 6, "rightScore": 2}),
    )
    .await;
    assert!(matches!(
        next_message(&mut host).await,
        ServerMessage::Error { .. }
    ));

    let recorded = results.list_results().await.expect("Results unavailable");
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].game_id, "g-score");
    assert_eq!(recorded[0].reason, FinishReason::Score);
    assert_eq!(
        (recorded[0].left_score, recorded[0].right_score),
        (5, 2)
    );
}

#[tokio::test]
async fn test_give_up_then_disconnect_notifies_once() {
    let results = Arc::new(InMemoryMatchResultRepository::new());
    let state = AppState::with_match_results(TEST_SECRET.to_string(), results.clone());
    let addr = spawn_server(state.clone()).await;
    let (mut host, mut guest) = ready_pair(&addr, &state, "g-quit", "alice", "bob").await;

    send_json(&mut host, json!({"type": "giveUp"})).await;
    assert_eq!(
        next_message(&mut guest).await,
        ServerMessage::OpponentLeft {
            winner: Side::Right
        }
    );

    host.close(None).await.expect("Failed to close host socket");
    expect_silence(&mut guest, Duration::from_millis(300)).await;

    let recorded = results.list_results().await.expect("Results unavailable");
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].winner_id, "bob");
    assert_eq!(recorded[0].reason, FinishReason::Forfeit);
}

#[tokio::test]
async fn test_disconnect_mid_game_awards_the_remaining_player() {
    let state = test_state();
    let addr = spawn_server(state.clone()).await;
    let (host, mut guest) = ready_pair(&addr, &state, "g-drop", "alice", "bob").await;

    drop(host);

    assert_eq!(
        next_message(&mut guest).await,
        ServerMessage::OpponentLeft {
            winner: Side::Right
        }
    );
}

#[tokio::test]
async fn test_rematch_resets_the_room() {
    let state = test_state();
    let addr = spawn_server(state.clone()).await;
    let (mut host, mut guest) = ready_pair(&addr, &state, "g-again", "alice", "bob").await;

    send_json(
        &mut host,
        json!({"type": "scoreUpdate", "leftScore": 5, "rightScore": 0}),
    )
    .await;
    next_message(&mut guest).await;

    send_json(&mut guest, json!({"type": "requestRematch"})).await;
    assert_eq!(
        next_message(&mut host).await,
        ServerMessage::RematchRequested { side: Side::Right }
    );
    send_json(&mut host, json!({"type": "requestRematch"})).await;

    for client in [&mut host, &mut guest] {
        match next_message(client).await {
            ServerMessage::Ready { state, .. } => {
                assert_eq!((state.left_score, state.right_score), (0, 0));
                assert_eq!(state.winner, None);
            }
            other => panic!("Expected ready after rematch, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_lobby_connection_hears_about_its_match() {
    let state = test_state();
    let addr = spawn_server(state.clone()).await;
    let mut lobby = connect(&addr, Some(&token_for(&state, "alice")), None).await;
    wait_until_online(&state, "alice").await;

    state
        .matchmaking_service
        .join("alice")
        .await
        .expect("alice failed to join");
    state
        .matchmaking_service
        .join("bob")
        .await
        .expect("bob failed to join");

    match next_message(&mut lobby).await {
        ServerMessage::MatchFound {
            game_id,
            opponent_id,
        } => {
            assert_eq!(opponent_id, "bob");
            assert!(!game_id.is_empty());
        }
        other => panic!("Expected matchFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_tournament_final_is_played_over_websocket() {
    let state = test_state();
    let addr = spawn_server(state.clone()).await;
    let tournament = state
        .tournament_service
        .create_tournament("Final Night", 2, chrono::Utc::now())
        .await
        .expect("Failed to create tournament");
    for player in ["alice", "bob"] {
        state
            .tournament_service
            .join_tournament(&tournament.tournament_id, player)
            .await
            .expect("Failed to join tournament");
    }
    let match_id = state
        .tournament_service
        .get_upcoming_matches(&tournament.tournament_id)
        .await
        .expect("No upcoming matches")[0]
        .match_id
        .clone();

    let mut alice_lobby = connect(&addr, Some(&token_for(&state, "alice")), None).await;
    wait_until_online(&state, "alice").await;
    state
        .tournament_service
        .mark_ready(&match_id, "alice")
        .await
        .expect("alice not ready");
    let outcome = state
        .tournament_service
        .mark_ready(&match_id, "bob")
        .await
        .expect("bob not ready");
    let game_id = outcome.game_id.expect("No session created");

    assert_eq!(
        next_message(&mut alice_lobby).await,
        ServerMessage::TournamentMatchReady {
            tournament_id: tournament.tournament_id.clone(),
            match_id: match_id.clone(),
            game_id: game_id.clone(),
        }
    );

    let mut outsider = connect(&addr, Some(&token_for(&state, "carol")), Some(&game_id)).await;
    let (_, code) = expect_rejection(&mut outsider).await;
    assert_eq!(code, CLOSE_NOT_A_PARTICIPANT);

    let (mut host, mut guest) = ready_pair(&addr, &state, &game_id, "alice", "bob").await;
    let mut latecomer = connect(&addr, Some(&token_for(&state, "dave")), Some(&game_id)).await;
    let (_, code) = expect_rejection(&mut latecomer).await;
    assert_eq!(code, CLOSE_ROOM_FULL);

    send_json(
        &mut host,
        json!({"type": "scoreUpdate", "leftScore": 5, "rightScore": 3}),
    )
    .await;
    next_message(&mut guest).await;

    let deadline = tokio::time::Instant::now() + RECEIVE_TIMEOUT;
    loop {
        let current = state
            .tournament_service
            .get_tournament(&tournament.tournament_id)
            .await
            .expect("Tournament vanished");
        if current.status == TournamentStatus::Completed {
            let final_match = &current.rounds[0].matches[0];
            assert_eq!(current.champion_id, final_match.winner_id);
            assert!(current.champion_id.is_some());
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "Tournament never completed"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
