//! The battle layer: everything that happens on the boards.
//!
//! - [`geometry`]: pure board math. Which ship sits on a cell, when a ship
//!   is sunk, and which cells ring a wreck.
//! - [`GameSession`]: one match between two players. Fleets, attack
//!   history, turn, lifecycle flags.
//! - [`GameStore`]: every live session, and the operations the coordinator
//!   drives them with (`add_ships`, `attack`, `random_target`, forfeits).
//!
//! Nothing in here talks to the network. The store returns plain values
//! describing what happened and the coordinator turns those into messages.

pub mod geometry;

mod error;
mod session;
mod store;

pub use error::BattleError;
pub use geometry::{BOARD_SIZE, Ship};
pub use session::{GameSession, PlayerInGame};
pub use store::{AttackOutcome, AttackReport, GameStore, IgnoreReason, Placement};
