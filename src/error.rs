//! Unified error types for the message stats service.

use thiserror::Error;

/// Unified error type for the service process.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration loaded but failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Telegram session or remote call error.
    #[error("telegram error: {0}")]
    Telegram(#[from] TelegramError),
}

/// Errors raised by the Telegram session and remote calls.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TelegramError {
    /// The client could not connect to Telegram.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The persisted session is not logged in.
    #[error("session is not authorized")]
    Unauthorized,

    /// The session string could not be decoded.
    #[error("invalid session string: {0}")]
    InvalidSession(String),

    /// The peer could not be resolved to a chat.
    #[error("peer not found: {0}")]
    PeerNotFound(String),

    /// A remote procedure call failed.
    #[error("remote call {method} failed: {reason}")]
    RemoteCall {
        /// Remote method name.
        method: &'static str,
        /// Reason for failure.
        reason: String,
    },
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_call_error_names_method() {
        let err = TelegramError::RemoteCall {
            method: "messages.getMessagesViews",
            reason: "CHANNEL_PRIVATE".to_string(),
        };

        assert_eq!(
            err.to_string(),
            "remote call messages.getMessagesViews failed: CHANNEL_PRIVATE"
        );
    }

    #[test]
    fn telegram_error_converts_into_app_error() {
        let err: AppError = TelegramError::Unauthorized.into();
        assert!(matches!(err, AppError::Telegram(TelegramError::Unauthorized)));
    }
}
