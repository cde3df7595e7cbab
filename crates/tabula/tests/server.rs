//! Integration tests for the Tabula server over real sockets.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tabula::prelude::*;
use tabula::protocol::{Codec, JsonCodec, decode_message};
use tabula::{BUSY_NOTICE, is_terminal_error};
use tokio_tungstenite::tungstenite::Message as WsMessage;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

// =========================================================================
// Helpers
// =========================================================================

async fn recv(client: &GameClient) -> Option<Message> {
    tokio::time::timeout(RECV_TIMEOUT, client.recv())
        .await
        .expect("timed out waiting for the server")
        .expect("recv should succeed")
}

async fn recv_kind(client: &GameClient, kind: MessageKind) -> Message {
    let msg = recv(client).await.expect("connection closed");
    assert_eq!(msg.kind(), kind, "unexpected message: {msg:?}");
    msg
}

/// Connects and waits for the admission acknowledgment, so players are
/// seated in the order this is called.
async fn join(addr: &str) -> GameClient {
    let client = GameClient::connect(addr).await.expect("should connect");
    recv_kind(&client, MessageKind::Connected).await;
    client
}

/// Plays scripted moves until the game is over for this client.
async fn autoplay(client: &GameClient, moves: &[i64]) -> Vec<Message> {
    let mut moves = moves.iter();
    let mut seen = Vec::new();
    while let Some(msg) = recv(client).await {
        if matches!(msg, Message::YourTurn(_) | Message::MoveRejected { .. }) {
            if let Some(mv) = moves.next() {
                client.send_move(*mv).await.unwrap();
            }
        }
        let done = matches!(msg, Message::GameEnd(_)) || is_terminal_error(&msg);
        seen.push(msg);
        if done {
            break;
        }
    }
    seen
}

fn won(messages: &[Message]) -> Option<bool> {
    messages.iter().find_map(|m| match m {
        Message::GameEnd(end) => Some(end.won),
        _ => None,
    })
}

// =========================================================================
// TCP
// =========================================================================

#[tokio::test]
async fn test_tcp_game_to_completion() {
    let server = TabulaServer::builder()
        .bind("127.0.0.1:0")
        .build(TicTacToe)
        .await
        .expect("server should build");
    let addr = server.local_addr().unwrap().to_string();

    let players = async {
        let c0 = join(&addr).await;
        let c1 = join(&addr).await;
        // X takes the left column: 1, 4, 7.
        tokio::join!(autoplay(&c0, &[1, 4, 7]), autoplay(&c1, &[2, 5]))
    };

    let (result, (seen0, seen1)) = tokio::join!(server.run(), players);
    result.expect("server should stop cleanly after one game");
    assert_eq!(won(&seen0), Some(true));
    assert_eq!(won(&seen1), Some(false));
}

#[tokio::test]
async fn test_latecomer_is_turned_away() {
    let server = TabulaServer::builder()
        .bind("127.0.0.1:0")
        .build(TicTacToe)
        .await
        .unwrap();
    let addr = server.local_addr().unwrap().to_string();

    let players = async {
        let c0 = join(&addr).await;
        let c1 = join(&addr).await;
        recv_kind(&c0, MessageKind::GameStart).await;

        let late = GameClient::connect(&addr).await.unwrap();
        assert_eq!(recv(&late).await, Some(Message::notice(BUSY_NOTICE)));
        assert_eq!(recv(&late).await, None);

        c0.disconnect().await.unwrap();
        let seen1 = autoplay(&c1, &[]).await;
        assert!(seen1.last().is_some_and(is_terminal_error), "{seen1:?}");
    };

    let (result, ()) = tokio::join!(server.run(), players);
    result.unwrap();
}

#[tokio::test]
async fn test_shutdown_while_admitting_closes_seated_players() {
    let server = TabulaServer::builder()
        .bind("127.0.0.1:0")
        .build(TicTacToe)
        .await
        .unwrap();
    let addr = server.local_addr().unwrap().to_string();
    let shutdown = server.shutdown_handle();

    let player = async {
        let c0 = join(&addr).await;
        shutdown.trigger();
        assert_eq!(recv(&c0).await, None);
    };

    let (result, ()) = tokio::join!(server.run(), player);
    result.unwrap();
}

#[tokio::test]
async fn test_serve_forever_hosts_the_next_session() {
    let server = TabulaServer::builder()
        .bind("127.0.0.1:0")
        .serve_forever(true)
        .build(TicTacToe)
        .await
        .unwrap();
    let addr = server.local_addr().unwrap().to_string();
    let shutdown = server.shutdown_handle();

    let players = async {
        let c0 = join(&addr).await;
        let c1 = join(&addr).await;
        c0.disconnect().await.unwrap();
        autoplay(&c1, &[]).await;
        assert_eq!(recv(&c1).await, None);

        // Seats are numbered from zero again in the next session.
        let next = GameClient::connect(&addr).await.unwrap();
        let Some(Message::Connected(ack)) = recv(&next).await else {
            panic!("expected CONNECTED");
        };
        assert_eq!(ack.player_id, PlayerId(0));
        assert_eq!(ack.current_players, 1);

        shutdown.trigger();
        assert_eq!(recv(&next).await, None);
    };

    let (result, ()) = tokio::join!(server.run(), players);
    result.unwrap();
}

#[tokio::test]
async fn test_builder_rejects_broken_rules() {
    #[derive(Clone)]
    struct Nobody;

    impl GameRules for Nobody {
        type State = ();
        type Move = ();

        fn name(&self) -> &str {
            "Nobody"
        }
        fn min_players(&self) -> usize {
            0
        }
        fn max_players(&self) -> usize {
            0
        }
        fn initialize(&self, _: usize) -> Result<(), RulesError> {
            Ok(())
        }
        fn current_player(&self, _: &()) -> PlayerId {
            PlayerId(0)
        }
        fn validate_move(&self, _: &(), _: PlayerId, _: &serde_json::Value) -> Result<(), String> {
            Ok(())
        }
        fn apply_move(&self, _: &(), _: PlayerId, _: ()) {}
        fn check_terminal(&self, _: &()) -> Option<TerminalResult> {
            None
        }
        fn render(&self, _: &()) -> String {
            String::new()
        }
        fn move_help(&self) -> String {
            String::new()
        }
    }

    let result = TabulaServer::builder().bind("127.0.0.1:0").build(Nobody).await;
    assert!(matches!(result, Err(TabulaError::Rules(_))));
}

// =========================================================================
// WebSocket
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

async fn ws_recv(ws: &mut ClientWs) -> Option<Message> {
    loop {
        let frame = tokio::time::timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for the server")?;
        // A reset after the server's close frame also counts as closed.
        match frame.ok()? {
            WsMessage::Binary(data) => return Some(decode_message(&JsonCodec, &data)),
            WsMessage::Text(text) => return Some(decode_message(&JsonCodec, text.as_bytes())),
            WsMessage::Close(_) => return None,
            _ => continue,
        }
    }
}

async fn ws_send(ws: &mut ClientWs, msg: &Message) {
    let payload = JsonCodec.encode(msg).unwrap();
    ws.send(WsMessage::Binary(payload.into())).await.unwrap();
}

#[tokio::test]
async fn test_websocket_rock_paper_scissors() {
    let server = TabulaServer::builder()
        .bind("127.0.0.1:0")
        .build_websocket(RockPaperScissors::new(1))
        .await
        .unwrap();
    let addr = server.local_addr().unwrap().to_string();

    let players = async {
        let url = format!("ws://{addr}");
        let (mut p0, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
        assert!(matches!(ws_recv(&mut p0).await, Some(Message::Connected(_))));
        let (mut p1, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
        assert!(matches!(ws_recv(&mut p1).await, Some(Message::Connected(_))));

        // Player 0 picks first.
        loop {
            match ws_recv(&mut p0).await.expect("p0 closed early") {
                Message::YourTurn(_) => break,
                _ => continue,
            }
        }
        ws_send(&mut p0, &Message::move_of("scissors")).await;

        loop {
            match ws_recv(&mut p1).await.expect("p1 closed early") {
                Message::YourTurn(turn) => {
                    assert_eq!(turn.game_state["choices"][0], "?");
                    break;
                }
                _ => continue,
            }
        }
        ws_send(&mut p1, &Message::move_of("rock")).await;

        let mut end = None;
        while let Some(msg) = ws_recv(&mut p1).await {
            if let Message::GameEnd(result) = msg {
                end = Some(result);
            }
        }
        end.expect("p1 should see GAME_END")
    };

    let (result, end) = tokio::join!(server.run(), players);
    result.unwrap();
    assert!(end.won);
    assert_eq!(end.winner, Some(PlayerId(1)));
    assert_eq!(end.message, "Player 1 wins 1-0!");
}
