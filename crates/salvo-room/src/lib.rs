//! Room matchmaking for Salvo.
//!
//! A room is a waiting area for a two-player match. The player who creates
//! it sits alone until someone joins; a room with one member is "free" and
//! advertised to every client. Once a second player joins the room is
//! matched and the coordinator turns it into a game.
//!
//! # Key types
//!
//! - [`RoomManager`]: creates rooms, joins players, lists free rooms
//! - [`Room`]: one room and its members
//! - [`JoinOutcome`]: whether a join produced a match
//! - [`RoomError`]: lookup and capacity failures

mod error;
mod manager;
mod room;

pub use error::RoomError;
pub use manager::{JoinOutcome, RoomManager};
pub use room::{Room, ROOM_CAPACITY};
