//! The player record.

use std::fmt;

use salvo_protocol::PlayerId;

/// A player's password.
///
/// Wrapped so it can't leak into logs: `Debug` prints a placeholder.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Checks a password attempt against the stored one.
    pub fn matches(&self, attempt: &str) -> bool {
        self.0 == attempt
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// A registered player.
///
/// Created on the first successful registration of a name and kept until
/// the process exits.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub credential: Credential,
    /// Games won. Only ever goes up.
    pub wins: u32,
}
