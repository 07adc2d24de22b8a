//! Envelopes and the typed messages carried inside them.
//!
//! Every frame on the wire is an [`Envelope`]:
//!
//! ```json
//! { "type": "attack", "data": "{\"gameId\":0,\"indexPlayer\":1,\"x\":3,\"y\":4}", "id": 0 }
//! ```
//!
//! `data` is the payload serialized to JSON *and then stored as a string*.
//! Decoding is therefore two steps: parse the envelope, then parse `data`
//! according to `type`. [`ClientMessage`] and [`ServerMessage`] wrap both
//! steps so nothing else in the server deals with raw envelopes.

use serde::{Deserialize, Serialize};

use crate::types::player_or_none;
use crate::{
    AttackStatus, Codec, GameId, PlayerId, Position, ProtocolError, RoomId,
    ShipLayout,
};

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The outer frame of every message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Message type, e.g. `"reg"` or `"attack"`.
    #[serde(rename = "type")]
    pub kind: String,

    /// JSON-encoded payload. Some messages (`create_room`) carry an
    /// empty string.
    #[serde(default)]
    pub data: String,

    /// Unused sequencing placeholder. Always 0 on output, ignored on input.
    #[serde(default)]
    pub id: u32,
}

/// The set of message types the protocol knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Reg,
    CreateRoom,
    AddUserToRoom,
    AddShips,
    Attack,
    RandomAttack,
    UpdateRoom,
    UpdateWinners,
    CreateGame,
    StartGame,
    Turn,
    Finish,
}

impl MessageKind {
    /// The `type` string used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reg => "reg",
            Self::CreateRoom => "create_room",
            Self::AddUserToRoom => "add_user_to_room",
            Self::AddShips => "add_ships",
            Self::Attack => "attack",
            Self::RandomAttack => "randomAttack",
            Self::UpdateRoom => "update_room",
            Self::UpdateWinners => "update_winners",
            Self::CreateGame => "create_game",
            Self::StartGame => "start_game",
            Self::Turn => "turn",
            Self::Finish => "finish",
        }
    }

    /// Parses a wire `type` string. Matching is exact (case-sensitive).
    pub fn parse(kind: &str) -> Option<Self> {
        Some(match kind {
            "reg" => Self::Reg,
            "create_room" => Self::CreateRoom,
            "add_user_to_room" => Self::AddUserToRoom,
            "add_ships" => Self::AddShips,
            "attack" => Self::Attack,
            "randomAttack" => Self::RandomAttack,
            "update_room" => Self::UpdateRoom,
            "update_winners" => Self::UpdateWinners,
            "create_game" => Self::CreateGame,
            "start_game" => Self::StartGame,
            "turn" => Self::Turn,
            "finish" => Self::Finish,
            _ => return None,
        })
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Client → server payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegRequest {
    pub name: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddUserToRoomRequest {
    pub index_room: RoomId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddShipsRequest {
    pub game_id: GameId,
    pub index_player: PlayerId,
    pub ships: Vec<ShipLayout>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackRequest {
    pub game_id: GameId,
    pub index_player: PlayerId,
    pub x: u8,
    pub y: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomAttackRequest {
    pub game_id: GameId,
    pub index_player: PlayerId,
}

// ---------------------------------------------------------------------------
// Server → client payloads
// ---------------------------------------------------------------------------

/// Reply to `reg`. On failure `index` is `-1` and `errorText` says why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegResponse {
    pub name: String,
    #[serde(with = "player_or_none")]
    pub index: Option<PlayerId>,
    pub error: bool,
    pub error_text: String,
}

impl RegResponse {
    pub fn accepted(name: impl Into<String>, index: PlayerId) -> Self {
        Self {
            name: name.into(),
            index: Some(index),
            error: false,
            error_text: String::new(),
        }
    }

    pub fn rejected(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: None,
            error: true,
            error_text: reason.into(),
        }
    }
}

/// A member of a room as shown in the room list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomUser {
    pub name: String,
    pub index: PlayerId,
}

/// One entry of `update_room`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomEntry {
    pub room_id: RoomId,
    pub room_users: Vec<RoomUser>,
}

/// One row of the leaderboard (`update_winners`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerEntry {
    pub name: String,
    pub wins: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameData {
    pub id_game: GameId,
    /// The receiving player's own id.
    pub id_player: PlayerId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartGameData {
    /// The receiving player's own fleet, as they submitted it.
    pub ships: Vec<ShipLayout>,
    pub current_player_index: PlayerId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnData {
    pub current_player: PlayerId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackResult {
    pub position: Position,
    /// The player who fired.
    pub current_player: PlayerId,
    pub status: AttackStatus,
}

/// End of a game. `winPlayer` is `-1` when nobody won (forfeit by
/// disconnect).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishData {
    #[serde(with = "player_or_none")]
    pub win_player: Option<PlayerId>,
}

// ---------------------------------------------------------------------------
// ClientMessage
// ---------------------------------------------------------------------------

/// Everything a client may send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Register(RegRequest),
    CreateRoom,
    AddUserToRoom(AddUserToRoomRequest),
    AddShips(AddShipsRequest),
    Attack(AttackRequest),
    RandomAttack(RandomAttackRequest),
}

impl ClientMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Register(_) => MessageKind::Reg,
            Self::CreateRoom => MessageKind::CreateRoom,
            Self::AddUserToRoom(_) => MessageKind::AddUserToRoom,
            Self::AddShips(_) => MessageKind::AddShips,
            Self::Attack(_) => MessageKind::Attack,
            Self::RandomAttack(_) => MessageKind::RandomAttack,
        }
    }

    /// Decodes one raw inbound frame.
    ///
    /// # Errors
    /// - `Decode` if the envelope or its payload is malformed
    /// - `UnknownType` if `type` isn't a client → server message
    pub fn decode<C: Codec>(codec: &C, bytes: &[u8]) -> Result<Self, ProtocolError> {
        let envelope: Envelope = codec.decode(bytes)?;
        let data = envelope.data.as_bytes();

        let kind = MessageKind::parse(&envelope.kind)
            .ok_or_else(|| ProtocolError::UnknownType(envelope.kind.clone()))?;

        Ok(match kind {
            MessageKind::Reg => Self::Register(codec.decode(data)?),
            // The payload is meaningless (usually an empty string).
            MessageKind::CreateRoom => Self::CreateRoom,
            MessageKind::AddUserToRoom => Self::AddUserToRoom(codec.decode(data)?),
            MessageKind::AddShips => Self::AddShips(codec.decode(data)?),
            MessageKind::Attack => Self::Attack(codec.decode(data)?),
            MessageKind::RandomAttack => Self::RandomAttack(codec.decode(data)?),
            _ => return Err(ProtocolError::UnknownType(envelope.kind)),
        })
    }

    /// Encodes this message as a client would send it.
    pub fn encode<C: Codec>(&self, codec: &C) -> Result<Vec<u8>, ProtocolError> {
        let data = match self {
            Self::Register(d) => codec.encode_string(d)?,
            Self::CreateRoom => String::new(),
            Self::AddUserToRoom(d) => codec.encode_string(d)?,
            Self::AddShips(d) => codec.encode_string(d)?,
            Self::Attack(d) => codec.encode_string(d)?,
            Self::RandomAttack(d) => codec.encode_string(d)?,
        };
        codec.encode(&Envelope {
            kind: self.kind().as_str().to_string(),
            data,
            id: 0,
        })
    }
}

// ---------------------------------------------------------------------------
// ServerMessage
// ---------------------------------------------------------------------------

/// Everything the server may send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    Registered(RegResponse),
    UpdateRoom(Vec<RoomEntry>),
    UpdateWinners(Vec<WinnerEntry>),
    CreateGame(CreateGameData),
    StartGame(StartGameData),
    Turn(TurnData),
    Attack(AttackResult),
    Finish(FinishData),
}

impl ServerMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Registered(_) => MessageKind::Reg,
            Self::UpdateRoom(_) => MessageKind::UpdateRoom,
            Self::UpdateWinners(_) => MessageKind::UpdateWinners,
            Self::CreateGame(_) => MessageKind::CreateGame,
            Self::StartGame(_) => MessageKind::StartGame,
            Self::Turn(_) => MessageKind::Turn,
            Self::Attack(_) => MessageKind::Attack,
            Self::Finish(_) => MessageKind::Finish,
        }
    }

    /// Wraps the payload in an envelope with `id: 0`.
    pub fn to_envelope<C: Codec>(&self, codec: &C) -> Result<Envelope, ProtocolError> {
        let data = match self {
            Self::Registered(d) => codec.encode_string(d)?,
            Self::UpdateRoom(d) => codec.encode_string(d)?,
            Self::UpdateWinners(d) => codec.encode_string(d)?,
            Self::CreateGame(d) => codec.encode_string(d)?,
            Self::StartGame(d) => codec.encode_string(d)?,
            Self::Turn(d) => codec.encode_string(d)?,
            Self::Attack(d) => codec.encode_string(d)?,
            Self::Finish(d) => codec.encode_string(d)?,
        };
        Ok(Envelope {
            kind: self.kind().as_str().to_string(),
            data,
            id: 0,
        })
    }

    /// Encodes the full frame, ready for the transport.
    pub fn encode<C: Codec>(&self, codec: &C) -> Result<Vec<u8>, ProtocolError> {
        codec.encode(&self.to_envelope(codec)?)
    }

    /// Decodes a frame the server sent. Clients and tests use this.
    pub fn decode<C: Codec>(codec: &C, bytes: &[u8]) -> Result<Self, ProtocolError> {
        let envelope: Envelope = codec.decode(bytes)?;
        let data = envelope.data.as_bytes();

        let kind = MessageKind::parse(&envelope.kind)
            .ok_or_else(|| ProtocolError::UnknownType(envelope.kind.clone()))?;

        Ok(match kind {
            MessageKind::Reg => Self::Registered(codec.decode(data)?),
            MessageKind::UpdateRoom => Self::UpdateRoom(codec.decode(data)?),
            MessageKind::UpdateWinners => Self::UpdateWinners(codec.decode(data)?),
            MessageKind::CreateGame => Self::CreateGame(codec.decode(data)?),
            MessageKind::StartGame => Self::StartGame(codec.decode(data)?),
            MessageKind::Turn => Self::Turn(codec.decode(data)?),
            MessageKind::Attack => Self::Attack(codec.decode(data)?),
            MessageKind::Finish => Self::Finish(codec.decode(data)?),
            _ => return Err(ProtocolError::UnknownType(envelope.kind)),
        })
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(all(test, feature = "json"))]
mod tests {
    //! The browser client parses these shapes by hand, so the tests pin
    //! the exact JSON field names rather than only round-tripping.

    use super::*;
    use crate::{JsonCodec, Orientation, ShipKind};

    fn payload(bytes: &[u8]) -> (String, serde_json::Value) {
        let envelope: serde_json::Value = serde_json::from_slice(bytes).unwrap();
        let data = envelope["data"].as_str().expect("data must be a string");
        (
            envelope["type"].as_str().unwrap().to_string(),
            serde_json::from_str(data).unwrap(),
        )
    }

    // =====================================================================
    // Decoding client messages
    // =====================================================================

    #[test]
    fn test_decode_reg() {
        let raw = br#"{"type":"reg","data":"{\"name\":\"ahab\",\"password\":\"whale\"}","id":0}"#;

        let msg = ClientMessage::decode(&JsonCodec, raw).unwrap();

        assert_eq!(
            msg,
            ClientMessage::Register(RegRequest {
                name: "ahab".into(),
                password: "whale".into(),
            })
        );
    }

    #[test]
    fn test_decode_create_room_ignores_empty_data() {
        let raw = br#"{"type":"create_room","data":"","id":0}"#;
        assert_eq!(
            ClientMessage::decode(&JsonCodec, raw).unwrap(),
            ClientMessage::CreateRoom
        );
    }

    #[test]
    fn test_decode_missing_id_and_data_defaults() {
        let raw = br#"{"type":"create_room"}"#;
        assert_eq!(
            ClientMessage::decode(&JsonCodec, raw).unwrap(),
            ClientMessage::CreateRoom
        );
    }

    #[test]
    fn test_decode_add_ships_with_fleet() {
        let data = r#"{"gameId":3,"indexPlayer":1,"ships":[{"position":{"x":0,"y":0},"direction":true,"length":4,"type":"huge"}]}"#;
        let raw = serde_json::to_vec(&serde_json::json!({
            "type": "add_ships",
            "data": data,
            "id": 0,
        }))
        .unwrap();

        let msg = ClientMessage::decode(&JsonCodec, &raw).unwrap();

        let ClientMessage::AddShips(req) = msg else {
            panic!("expected AddShips, got {msg:?}");
        };
        assert_eq!(req.game_id, GameId(3));
        assert_eq!(req.index_player, PlayerId(1));
        assert_eq!(req.ships.len(), 1);
        assert_eq!(req.ships[0].orientation, Orientation::Vertical);
        assert_eq!(req.ships[0].kind, ShipKind::Huge);
    }

    #[test]
    fn test_decode_random_attack_camel_case_type() {
        let raw = br#"{"type":"randomAttack","data":"{\"gameId\":0,\"indexPlayer\":2}","id":0}"#;
        assert_eq!(
            ClientMessage::decode(&JsonCodec, raw).unwrap(),
            ClientMessage::RandomAttack(RandomAttackRequest {
                game_id: GameId(0),
                index_player: PlayerId(2),
            })
        );
    }

    #[test]
    fn test_decode_unknown_type_returns_unknown_type() {
        let raw = br#"{"type":"single_play","data":"","id":0}"#;
        let err = ClientMessage::decode(&JsonCodec, raw).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownType(t) if t == "single_play"));
    }

    #[test]
    fn test_decode_server_only_type_from_client_is_rejected() {
        let raw = br#"{"type":"turn","data":"{\"currentPlayer\":1}","id":0}"#;
        assert!(matches!(
            ClientMessage::decode(&JsonCodec, raw),
            Err(ProtocolError::UnknownType(_))
        ));
    }

    #[test]
    fn test_decode_garbage_returns_decode_error() {
        assert!(matches!(
            ClientMessage::decode(&JsonCodec, b"not json at all"),
            Err(ProtocolError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_payload_not_matching_type_returns_decode_error() {
        let raw = br#"{"type":"attack","data":"{\"name\":\"x\"}","id":0}"#;
        assert!(matches!(
            ClientMessage::decode(&JsonCodec, raw),
            Err(ProtocolError::Decode(_))
        ));
    }

    // =====================================================================
    // Encoding server messages
    // =====================================================================

    #[test]
    fn test_encode_envelope_has_string_data_and_zero_id() {
        let msg = ServerMessage::Turn(TurnData {
            current_player: PlayerId(5),
        });

        let bytes = msg.encode(&JsonCodec).unwrap();
        let envelope: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(envelope["type"], "turn");
        assert_eq!(envelope["id"], 0);
        assert_eq!(envelope["data"], r#"{"currentPlayer":5}"#);
    }

    #[test]
    fn test_encode_reg_rejected_uses_minus_one_index() {
        let msg = ServerMessage::Registered(RegResponse::rejected(
            "ahab",
            "wrong password",
        ));

        let (kind, data) = payload(&msg.encode(&JsonCodec).unwrap());

        assert_eq!(kind, "reg");
        assert_eq!(data["index"], -1);
        assert_eq!(data["error"], true);
        assert_eq!(data["errorText"], "wrong password");
    }

    #[test]
    fn test_encode_finish_without_winner_is_minus_one() {
        let msg = ServerMessage::Finish(FinishData { win_player: None });
        let (_, data) = payload(&msg.encode(&JsonCodec).unwrap());
        assert_eq!(data["winPlayer"], -1);
    }

    #[test]
    fn test_encode_update_room_shape() {
        let msg = ServerMessage::UpdateRoom(vec![RoomEntry {
            room_id: RoomId(2),
            room_users: vec![RoomUser {
                name: "ishmael".into(),
                index: PlayerId(0),
            }],
        }]);

        let (kind, data) = payload(&msg.encode(&JsonCodec).unwrap());

        assert_eq!(kind, "update_room");
        assert_eq!(data[0]["roomId"], 2);
        assert_eq!(data[0]["roomUsers"][0]["name"], "ishmael");
        assert_eq!(data[0]["roomUsers"][0]["index"], 0);
    }

    #[test]
    fn test_encode_attack_result_shape() {
        let msg = ServerMessage::Attack(AttackResult {
            position: Position::new(3, 4),
            current_player: PlayerId(1),
            status: AttackStatus::Shot,
        });

        let (_, data) = payload(&msg.encode(&JsonCodec).unwrap());

        assert_eq!(data["position"]["x"], 3);
        assert_eq!(data["position"]["y"], 4);
        assert_eq!(data["currentPlayer"], 1);
        assert_eq!(data["status"], "shot");
    }

    #[test]
    fn test_server_decode_reads_back_finish_with_winner() {
        let msg = ServerMessage::Finish(FinishData {
            win_player: Some(PlayerId(3)),
        });
        let bytes = msg.encode(&JsonCodec).unwrap();
        assert_eq!(ServerMessage::decode(&JsonCodec, &bytes).unwrap(), msg);
    }

    #[test]
    fn test_client_encode_is_accepted_by_client_decode() {
        let msg = ClientMessage::Attack(AttackRequest {
            game_id: GameId(1),
            index_player: PlayerId(0),
            x: 9,
            y: 9,
        });
        let bytes = msg.encode(&JsonCodec).unwrap();
        assert_eq!(ClientMessage::decode(&JsonCodec, &bytes).unwrap(), msg);
    }

    #[test]
    fn test_message_kind_parse_is_inverse_of_as_str() {
        for kind in [
            MessageKind::Reg,
            MessageKind::CreateRoom,
            MessageKind::AddUserToRoom,
            MessageKind::AddShips,
            MessageKind::Attack,
            MessageKind::RandomAttack,
            MessageKind::UpdateRoom,
            MessageKind::UpdateWinners,
            MessageKind::CreateGame,
            MessageKind::StartGame,
            MessageKind::Turn,
            MessageKind::Finish,
        ] {
            assert_eq!(MessageKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(MessageKind::parse("Reg"), None);
    }
}
