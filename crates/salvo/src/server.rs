//! `SalvoServer` builder and server loop.
//!
//! This is the entry point for running a Salvo server. It ties together
//! the layers: transport → connection handlers → coordinator actor.

use std::future::Future;

use salvo_protocol::JsonCodec;
use salvo_transport::{Transport, TransportError, WebSocketTransport};

use crate::actor::{CoordinatorHandle, spawn_coordinator};
use crate::handler::handle_connection;
use crate::{SalvoError, ServerConfig};

/// Builder for configuring and starting a Salvo server.
///
/// # Example
///
/// ```rust,no_run
/// use salvo::prelude::*;
///
/// # async fn run() -> Result<(), SalvoError> {
/// let server = SalvoServer::builder()
///     .bind("0.0.0.0:3000")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct SalvoServerBuilder {
    config: ServerConfig,
}

impl SalvoServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the capacity of the coordinator's event queue.
    pub fn event_queue(mut self, size: usize) -> Self {
        self.config.event_queue = size;
        self
    }

    /// Binds the listener and starts the coordinator.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<SalvoServer, SalvoError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;
        let coordinator = spawn_coordinator(JsonCodec, self.config.event_queue);
        Ok(SalvoServer {
            transport,
            coordinator,
        })
    }
}

/// A bound Salvo server.
///
/// Call [`run()`](Self::run) or [`run_until()`](Self::run_until) to start
/// accepting connections.
pub struct SalvoServer {
    transport: WebSocketTransport,
    coordinator: CoordinatorHandle,
}

impl SalvoServer {
    /// Creates a new builder.
    pub fn builder() -> SalvoServerBuilder {
        SalvoServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), SalvoError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` resolves.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// A failed accept is logged and the loop carries on. Connections
    /// that are already open keep running after shutdown until their
    /// peers hang up.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), SalvoError> {
        match self.local_addr() {
            Ok(addr) => tracing::info!(%addr, "Salvo server listening"),
            Err(e) => tracing::warn!(error = %e, "Salvo server running, address unknown"),
        }
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("shutdown requested");
                    self.transport.shutdown().await?;
                    return Ok(());
                }
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let coordinator = self.coordinator.clone();
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, coordinator).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(TransportError::Shutdown) => return Ok(()),
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }
    }
}
