//! Wire protocol for Salvo.
//!
//! This crate defines the "language" that battleship clients and the
//! server speak:
//!
//! - **Types** ([`PlayerId`], [`Position`], [`ShipLayout`], ...): the
//!   identifiers and board shapes that appear inside messages.
//! - **Messages** ([`Envelope`], [`ClientMessage`], [`ServerMessage`]):
//!   every envelope is `{ "type": ..., "data": "<json string>", "id": 0 }`,
//!   where `data` is the payload JSON encoded a second time as a string.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how values become bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! The protocol layer knows nothing about connections, rooms or games.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientMessage) → Coordinator (game state)
//! ```

mod codec;
mod error;
mod messages;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use messages::{
    AddShipsRequest, AddUserToRoomRequest, AttackRequest, AttackResult,
    ClientMessage, CreateGameData, Envelope, FinishData, MessageKind,
    RandomAttackRequest, RegRequest, RegResponse, RoomEntry, RoomUser,
    ServerMessage, StartGameData, TurnData, WinnerEntry,
};
pub use types::{
    AttackStatus, GameId, Orientation, PlayerId, Position, RoomId, ShipKind,
    ShipLayout,
};
