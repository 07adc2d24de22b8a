//! Server configuration.

/// Address the server listens on when nothing else is configured.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Default capacity of the coordinator's event queue.
pub const DEFAULT_EVENT_QUEUE: usize = 1024;

/// Runtime settings for a [`SalvoServer`](crate::SalvoServer).
///
/// ```rust
/// use salvo::ServerConfig;
///
/// let config = ServerConfig::default();
/// assert_eq!(config.bind_addr, "127.0.0.1:3000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// `host:port` to listen on. Port `0` picks a free port.
    pub bind_addr: String,

    /// How many connection events may wait for the coordinator before
    /// connection tasks start waiting too.
    pub event_queue: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            event_queue: DEFAULT_EVENT_QUEUE,
        }
    }
}

impl ServerConfig {
    /// Reads `SALVO_BIND_ADDR` and `SALVO_EVENT_QUEUE`.
    ///
    /// Unset variables keep their defaults. Unusable values (blank
    /// address, queue size that isn't a positive number) are logged and
    /// replaced by the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("SALVO_BIND_ADDR") {
            let addr = addr.trim();
            if addr.is_empty() {
                tracing::warn!("SALVO_BIND_ADDR is blank, using {DEFAULT_BIND_ADDR}");
            } else {
                config.bind_addr = addr.to_string();
            }
        }

        if let Some(raw) = lookup("SALVO_EVENT_QUEUE") {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.event_queue = n,
                _ => tracing::warn!(
                    value = %raw,
                    "SALVO_EVENT_QUEUE must be a positive integer, using {DEFAULT_EVENT_QUEUE}"
                ),
            }
        }

        config
    }
}
