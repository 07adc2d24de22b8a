//! # Salvo
//!
//! A multiplayer battleship server. Players connect over WebSockets,
//! register with a name and password, pair up in two-player rooms, place
//! their fleets, and take turns firing until one fleet is gone.
//!
//! All game state lives in a single coordinator task. Connection tasks
//! only move bytes: inbound frames become coordinator events, and the
//! coordinator answers through per-connection outbound channels.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use salvo::prelude::*;
//!
//! # async fn run() -> Result<(), SalvoError> {
//! let server = SalvoServerBuilder::new()
//!     .config(ServerConfig::from_env())
//!     .build()
//!     .await?;
//! server.run_until(async {
//!     let _ = tokio::signal::ctrl_c().await;
//! }).await
//! # }
//! ```

mod actor;
mod config;
mod coordinator;
mod dispatcher;
mod error;
mod handler;
mod server;

pub use actor::{CoordinatorHandle, spawn_coordinator};
pub use config::{DEFAULT_BIND_ADDR, DEFAULT_EVENT_QUEUE, ServerConfig};
pub use coordinator::Coordinator;
pub use dispatcher::{Dispatcher, OutboundSender};
pub use error::{CoordinatorError, SalvoError};
pub use server::{SalvoServer, SalvoServerBuilder};

/// Common imports for running a server or driving a coordinator.
pub mod prelude {
    pub use crate::{
        Coordinator, CoordinatorError, SalvoError, SalvoServer, SalvoServerBuilder, ServerConfig,
    };
    pub use salvo_protocol::{ClientMessage, GameId, JsonCodec, PlayerId, RoomId, ServerMessage};
    pub use salvo_transport::ConnectionId;
}
