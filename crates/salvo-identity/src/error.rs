//! Error types for the identity layer.

use salvo_protocol::PlayerId;

/// Errors that can occur during registration and player lookups.
///
/// `CredentialMismatch` and `AlreadyConnected` are shown to the user
/// (their `Display` text becomes the `errorText` of the `reg` reply).
/// The rest are internal lookups that the server only logs.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The name is taken and the password doesn't match.
    #[error("wrong password for player {name:?}")]
    CredentialMismatch { name: String },

    /// The player is already playing from another open connection.
    /// A player can only be connected once at a time.
    #[error("player {name:?} is already connected")]
    AlreadyConnected { id: PlayerId, name: String },

    /// No player has this id.
    #[error("player {0} not found")]
    PlayerNotFound(PlayerId),
}

impl IdentityError {
    /// Returns `true` for errors the client should be told about.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::CredentialMismatch { .. } | Self::AlreadyConnected { .. }
        )
    }
}
