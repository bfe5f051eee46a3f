/// Error handling module for the crash restarter.
///
/// This module defines the error types used throughout the library.
/// Most failures in this system are absorbed close to where they occur
/// (a flaky status API is reported as an ambiguous probe, not an error;
/// a failed restart becomes an operator notification), so the variants
/// here cover the places where a `Result` genuinely crosses a module
/// boundary: configuration loading, the browser-automation protocol,
/// and outbound HTTP.
use thiserror::Error;

/// Errors that can occur in the crash-restarter library.
///
/// Each variant carries a human-readable context string; restart-protocol
/// failures are split into `LoginFailed` and `RestartFailed` so tests can
/// distinguish them, even though the monitor deliberately treats both the
/// same way (notify the operator, apply the failure cooldown).
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or parse the configuration file.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    /// Configuration is well-formed but contains invalid values.
    ///
    /// This error occurs when:
    /// - A server entry has both or neither of `restartUrl`/`serviceId`
    /// - A restart URL does not look like a restart endpoint
    /// - Panel credentials are missing
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    /// Error in the browser-automation session transport.
    ///
    /// This error occurs when:
    /// - The WebDriver endpoint cannot be reached
    /// - A command returns a protocol-level error envelope
    /// - The response cannot be decoded
    #[error("Automation session error: {0}")]
    Session(String),

    /// The panel rejected the login, or the post-login destination did
    /// not look authenticated.
    #[error("Panel login failed: {0}")]
    LoginFailed(String),

    /// The restart action did not land on the expected destination.
    ///
    /// This error occurs when:
    /// - The post-restart URL lacks the expected success suffix
    /// - The alternate backend's page lacks the expected marker
    #[error("Restart failed: {0}")]
    RestartFailed(String),

    /// Error delivering an operator notification.
    ///
    /// Always logged and swallowed by the caller; notifications are
    /// fire-and-forget.
    #[error("Notification error: {0}")]
    Notification(String),

    /// Any other error not covered by the above categories.
    #[error("Other error: {0}")]
    Other(String),
}

/// Result type for crash-restarter operations.
pub type Result<T> = std::result::Result<T, Error>;
