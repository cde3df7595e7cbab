//! The message vocabulary: every type that travels "on the wire".
//!
//! On the wire each message is a JSON object with a `type` tag, an
//! optional `data` object whose shape is fixed by the tag, and an optional
//! `error` string:
//!
//! ```text
//! {"type": "MOVE", "data": {"move": 5}}
//! {"type": "MOVE_REJECTED", "error": "Position 5 is already taken"}
//! {"type": "DISCONNECT"}
//! ```
//!
//! In Rust the vocabulary is the closed [`Message`] enum, so a payload can
//! never be paired with the wrong tag.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A participant's seat in a session.
///
/// Player ids are dense and zero-based: the first admitted connection is
/// `PlayerId(0)`, the second `PlayerId(1)`, and so on. They stay stable for
/// the lifetime of the session.
///
/// `#[serde(transparent)]` serializes `PlayerId(1)` as just `1`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub usize);

impl PlayerId {
    /// Returns the seat index, usable for indexing per-player tables.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

/// The closed set of `type` tags.
///
/// `SCREAMING_SNAKE_CASE` renders `GameStart` as `"GAME_START"`, which is
/// the spelling every client of the protocol expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    Connected,
    GameStart,
    YourTurn,
    GameState,
    Move,
    MoveAccepted,
    MoveRejected,
    GameEnd,
    Error,
    Disconnect,
    ServerMessage,
}

impl MessageKind {
    /// The tag exactly as it appears on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connected => "CONNECTED",
            Self::GameStart => "GAME_START",
            Self::YourTurn => "YOUR_TURN",
            Self::GameState => "GAME_STATE",
            Self::Move => "MOVE",
            Self::MoveAccepted => "MOVE_ACCEPTED",
            Self::MoveRejected => "MOVE_REJECTED",
            Self::GameEnd => "GAME_END",
            Self::Error => "ERROR",
            Self::Disconnect => "DISCONNECT",
            Self::ServerMessage => "SERVER_MESSAGE",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// `CONNECTED`: admission acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connected {
    pub player_id: PlayerId,
    pub game_name: String,
    pub min_players: usize,
    pub max_players: usize,
    /// How many players have been admitted so far, this one included.
    pub current_players: usize,
}

/// `GAME_START`: the session begins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStart {
    pub player_id: PlayerId,
    pub game_name: String,
    /// The recipient's own view of the initial state.
    pub initial_state: Value,
    /// Static move guidance from the rules.
    pub help: String,
}

/// `YOUR_TURN`: the recipient must move now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YourTurn {
    pub game_state: Value,
    pub board_display: String,
}

/// `GAME_STATE`: informational update for players who are not acting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStateUpdate {
    pub game_state: Value,
    pub board_display: String,
    /// Who holds the turn now.
    pub current_player: PlayerId,
}

/// `MOVE`: a move attempt. The move value is opaque to the protocol;
/// only the game rules interpret it.
///
/// A missing or `null` move decodes as `None` so the session can answer
/// with a rejection instead of dropping the frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveRequest {
    #[serde(rename = "move", default)]
    pub value: Option<Value>,
}

/// `MOVE_ACCEPTED`: the actor's move was applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveAccepted {
    pub game_state: Value,
    pub board_display: String,
}

/// `GAME_END`: terminal result, personalised per recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEnd {
    pub winner: Option<PlayerId>,
    pub draw: bool,
    pub message: String,
    /// `true` only for the winner; always `false` on a draw.
    pub won: bool,
}

/// `SERVER_MESSAGE`: out-of-band informational text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerNotice {
    pub message: String,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// One protocol message.
///
/// Serialization is hand-written so that each variant emits exactly the
/// fields its tag allows. Deserialization goes through [`WireMessage`],
/// which keeps the loose `{type, data, error}` shape, and is then checked
/// against the vocabulary.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "WireMessage")]
pub enum Message {
    Connected(Connected),
    GameStart(GameStart),
    YourTurn(YourTurn),
    GameState(GameStateUpdate),
    Move(MoveRequest),
    MoveAccepted(MoveAccepted),
    MoveRejected { error: String },
    GameEnd(GameEnd),
    Error { error: String },
    Disconnect,
    ServerMessage(ServerNotice),
}

impl Message {
    /// Builds an `ERROR` message.
    pub fn error(text: impl Into<String>) -> Self {
        Self::Error { error: text.into() }
    }

    /// Builds a `MOVE_REJECTED` message.
    pub fn move_rejected(reason: impl Into<String>) -> Self {
        Self::MoveRejected {
            error: reason.into(),
        }
    }

    /// Builds a `MOVE` carrying the given move value. A JSON `null` is the
    /// same as no move at all, matching how the wire form decodes.
    pub fn move_of(value: impl Into<Value>) -> Self {
        let value = match value.into() {
            Value::Null => None,
            value => Some(value),
        };
        Self::Move(MoveRequest { value })
    }

    /// Builds a `SERVER_MESSAGE`.
    pub fn notice(text: impl Into<String>) -> Self {
        Self::ServerMessage(ServerNotice {
            message: text.into(),
        })
    }

    /// The wire tag of this message.
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Connected(_) => MessageKind::Connected,
            Self::GameStart(_) => MessageKind::GameStart,
            Self::YourTurn(_) => MessageKind::YourTurn,
            Self::GameState(_) => MessageKind::GameState,
            Self::Move(_) => MessageKind::Move,
            Self::MoveAccepted(_) => MessageKind::MoveAccepted,
            Self::MoveRejected { .. } => MessageKind::MoveRejected,
            Self::GameEnd(_) => MessageKind::GameEnd,
            Self::Error { .. } => MessageKind::Error,
            Self::Disconnect => MessageKind::Disconnect,
            Self::ServerMessage(_) => MessageKind::ServerMessage,
        }
    }
}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", &self.kind())?;
        match self {
            Self::Connected(data) => map.serialize_entry("data", data)?,
            Self::GameStart(data) => map.serialize_entry("data", data)?,
            Self::YourTurn(data) => map.serialize_entry("data", data)?,
            Self::GameState(data) => map.serialize_entry("data", data)?,
            Self::Move(data) => map.serialize_entry("data", data)?,
            Self::MoveAccepted(data) => map.serialize_entry("data", data)?,
            Self::GameEnd(data) => map.serialize_entry("data", data)?,
            Self::ServerMessage(data) => map.serialize_entry("data", data)?,
            Self::MoveRejected { error } | Self::Error { error } => {
                map.serialize_entry("error", error)?
            }
            Self::Disconnect => {}
        }
        map.end()
    }
}

/// The loose wire shape, before the payload is checked against the tag.
#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(rename = "type")]
    kind: MessageKind,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

impl TryFrom<WireMessage> for Message {
    type Error = ProtocolError;

    fn try_from(wire: WireMessage) -> Result<Self, ProtocolError> {
        let WireMessage { kind, data, error } = wire;
        let msg = match kind {
            MessageKind::Connected => Message::Connected(payload(kind, data)?),
            MessageKind::GameStart => Message::GameStart(payload(kind, data)?),
            MessageKind::YourTurn => Message::YourTurn(payload(kind, data)?),
            MessageKind::GameState => Message::GameState(payload(kind, data)?),
            MessageKind::MoveAccepted => Message::MoveAccepted(payload(kind, data)?),
            MessageKind::GameEnd => Message::GameEnd(payload(kind, data)?),
            MessageKind::ServerMessage => Message::ServerMessage(payload(kind, data)?),
            // An empty MOVE is still a MOVE; the session rejects it.
            MessageKind::Move => match data {
                Some(data) => Message::Move(
                    serde_json::from_value(data).map_err(ProtocolError::Decode)?,
                ),
                None => Message::Move(MoveRequest::default()),
            },
            MessageKind::MoveRejected => Message::MoveRejected {
                error: error.unwrap_or_else(|| "Invalid move".into()),
            },
            MessageKind::Error => Message::Error {
                error: error.unwrap_or_else(|| "Unknown error".into()),
            },
            MessageKind::Disconnect => Message::Disconnect,
        };
        Ok(msg)
    }
}

fn payload<T: DeserializeOwned>(
    kind: MessageKind,
    data: Option<Value>,
) -> Result<T, ProtocolError> {
    let data = data.ok_or_else(|| {
        ProtocolError::InvalidMessage(format!("{kind} requires a data object"))
    })?;
    serde_json::from_value(data).map_err(ProtocolError::Decode)
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The wire shapes below are what clients parse, so each test pins
    //! the exact JSON a variant produces.

    use serde_json::json;

    use super::*;

    fn to_json(msg: &Message) -> Value {
        serde_json::to_value(msg).unwrap()
    }

    // =====================================================================
    // PlayerId / MessageKind
    // =====================================================================

    #[test]
    fn test_player_id_serializes_as_plain_number() {
        assert_eq!(serde_json::to_string(&PlayerId(1)).unwrap(), "1");
        let pid: PlayerId = serde_json::from_str("3").unwrap();
        assert_eq!(pid, PlayerId(3));
    }

    #[test]
    fn test_player_id_display() {
        assert_eq!(PlayerId(0).to_string(), "P-0");
    }

    #[test]
    fn test_message_kind_serde_matches_as_str() {
        for kind in [
            MessageKind::Connected,
            MessageKind::GameStart,
            MessageKind::YourTurn,
            MessageKind::GameState,
            MessageKind::Move,
            MessageKind::MoveAccepted,
            MessageKind::MoveRejected,
            MessageKind::GameEnd,
            MessageKind::Error,
            MessageKind::Disconnect,
            MessageKind::ServerMessage,
        ] {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, Value::String(kind.as_str().into()));
        }
    }

    // =====================================================================
    // Outgoing shapes
    // =====================================================================

    #[test]
    fn test_connected_json_format() {
        let msg = Message::Connected(Connected {
            player_id: PlayerId(1),
            game_name: "Tic-Tac-Toe".into(),
            min_players: 2,
            max_players: 2,
            current_players: 2,
        });
        let json = to_json(&msg);
        assert_eq!(json["type"], "CONNECTED");
        assert_eq!(json["data"]["player_id"], 1);
        assert_eq!(json["data"]["game_name"], "Tic-Tac-Toe");
        assert_eq!(json["data"]["current_players"], 2);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_game_state_carries_current_player() {
        let msg = Message::GameState(GameStateUpdate {
            game_state: json!({"board": []}),
            board_display: "...".into(),
            current_player: PlayerId(0),
        });
        let json = to_json(&msg);
        assert_eq!(json["type"], "GAME_STATE");
        assert_eq!(json["data"]["current_player"], 0);
    }

    #[test]
    fn test_move_rejected_puts_reason_in_error_field() {
        let json = to_json(&Message::move_rejected("It's not your turn"));
        assert_eq!(json, json!({"type": "MOVE_REJECTED", "error": "It's not your turn"}));
    }

    #[test]
    fn test_disconnect_has_only_type() {
        assert_eq!(to_json(&Message::Disconnect), json!({"type": "DISCONNECT"}));
    }

    #[test]
    fn test_game_end_draw_has_null_winner() {
        let msg = Message::GameEnd(GameEnd {
            winner: None,
            draw: true,
            message: "The game is a draw!".into(),
            won: false,
        });
        let json = to_json(&msg);
        assert!(json["data"]["winner"].is_null());
        assert_eq!(json["data"]["draw"], true);
        assert_eq!(json["data"]["won"], false);
    }

    #[test]
    fn test_move_value_is_opaque() {
        let json = to_json(&Message::move_of(json!({"row": 1, "col": 2})));
        assert_eq!(json["data"]["move"]["row"], 1);
    }

    // =====================================================================
    // Incoming shapes
    // =====================================================================

    #[test]
    fn test_move_without_data_decodes_as_empty_move() {
        let msg: Message = serde_json::from_str(r#"{"type": "MOVE"}"#).unwrap();
        assert_eq!(msg, Message::Move(MoveRequest { value: None }));
    }

    #[test]
    fn test_move_with_null_value_decodes_as_empty_move() {
        let msg: Message =
            serde_json::from_str(r#"{"type": "MOVE", "data": {"move": null}}"#).unwrap();
        assert_eq!(msg, Message::Move(MoveRequest { value: None }));
    }

    #[test]
    fn test_move_with_string_value() {
        let msg: Message =
            serde_json::from_str(r#"{"type": "MOVE", "data": {"move": "5"}}"#).unwrap();
        assert_eq!(msg, Message::move_of("5"));
    }

    #[test]
    fn test_error_without_text_gets_fallback() {
        let msg: Message = serde_json::from_str(r#"{"type": "ERROR"}"#).unwrap();
        assert_eq!(msg, Message::error("Unknown error"));
    }

    #[test]
    fn test_unknown_type_fails_to_decode() {
        let result: Result<Message, _> = serde_json::from_str(r#"{"type": "FLY_TO_MOON"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_type_fails_to_decode() {
        let result: Result<Message, _> = serde_json::from_str(r#"{"data": {}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_payload_kind_without_data_fails_to_decode() {
        let result: Result<Message, _> = serde_json::from_str(r#"{"type": "GAME_END"}"#);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("GAME_END requires a data object"), "{err}");
    }

    #[test]
    fn test_game_start_round_trip() {
        let msg = Message::GameStart(GameStart {
            player_id: PlayerId(0),
            game_name: "Rock-Paper-Scissors".into(),
            initial_state: json!({"round": 1, "choices": [null, null]}),
            help: "Enter one of: rock, paper, or scissors".into(),
        });
        let bytes = serde_json::to_vec(&msg).unwrap();
        let decoded: Message = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn test_null_move_is_an_empty_move() {
        assert_eq!(
            Message::move_of(Value::Null),
            Message::Move(MoveRequest { value: None })
        );
    }

    #[test]
    fn test_every_kind_round_trips() {
        let messages = [
            Message::Connected(Connected {
                player_id: PlayerId(1),
                game_name: "Tic-Tac-Toe".into(),
                min_players: 2,
                max_players: 2,
                current_players: 2,
            }),
            Message::GameStart(GameStart {
                player_id: PlayerId(0),
                game_name: "Tic-Tac-Toe".into(),
                initial_state: json!({"board": [" ", "X", " "]}),
                help: String::new(),
            }),
            Message::YourTurn(YourTurn {
                game_state: json!({"current_player": 0}),
                board_display: " X | O | ".into(),
            }),
            Message::GameState(GameStateUpdate {
                game_state: json!({"current_player": 1}),
                board_display: String::new(),
                current_player: PlayerId(1),
            }),
            Message::move_of(5),
            Message::move_of(Value::Null),
            Message::Move(MoveRequest::default()),
            Message::MoveAccepted(MoveAccepted {
                game_state: json!(null),
                board_display: "board".into(),
            }),
            Message::move_rejected("Cell already taken"),
            Message::GameEnd(GameEnd {
                winner: None,
                draw: true,
                message: "It's a draw!".into(),
                won: false,
            }),
            Message::GameEnd(GameEnd {
                winner: Some(PlayerId(1)),
                draw: false,
                message: "Player 1 (O) wins!".into(),
                won: true,
            }),
            Message::error("Player 0 disconnected. Game ended."),
            Message::Disconnect,
            Message::notice("Server shutting down"),
        ];

        let mut kinds = std::collections::HashSet::new();
        for msg in messages {
            let bytes = serde_json::to_vec(&msg).unwrap();
            let decoded: Message = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(decoded, msg, "{}", String::from_utf8_lossy(&bytes));
            kinds.insert(msg.kind());
        }
        assert_eq!(kinds.len(), 11, "every message kind is covered");
    }
}
