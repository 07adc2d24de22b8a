//! Player identity for Salvo.
//!
//! This crate answers two questions for the rest of the server:
//!
//! 1. **Who is this?** Players register with a name and a password. The
//!    first registration of a name creates the player and fixes its id;
//!    later registrations with the same password log back into it.
//! 2. **Where are they?** Each live connection is bound to at most one
//!    player and each player to at most one live connection.
//!
//! Players are never forgotten while the process runs, so a win count
//! survives disconnects.
//!
//! ```text
//! Coordinator (above)  ← asks "which player sent this?" / "where do I send this?"
//!     ↕
//! Identity (this crate)  ← players, credentials, win counts, bindings
//!     ↕
//! Protocol + Transport (below)  ← PlayerId, ConnectionId
//! ```

mod directory;
mod error;
mod player;

pub use directory::PlayerDirectory;
pub use error::IdentityError;
pub use player::{Credential, Player};
