//! Error types and handling for the Nexus push CLI
//!
//! Provides structured error types for all CLI operations with proper context
//! and per-category exit codes.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for Nexus push CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Comprehensive error types for Nexus push CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    // ═══════════════════════════════════════════════════════════════
    // Network & HTTP Errors
    // ═══════════════════════════════════════════════════════════════
    /// HTTP transport failure (connection refused, TLS, timeout, ...)
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The server answered with a status the operation does not accept
    #[error("{method} {path} failed with status {status}")]
    UnexpectedStatus {
        method: &'static str,
        path: String,
        status: u16,
    },

    /// Response body could not be parsed as the expected XML/JSON document
    #[error("Invalid server response: {0}")]
    InvalidResponse(String),

    // ═══════════════════════════════════════════════════════════════
    // Configuration Errors
    // ═══════════════════════════════════════════════════════════════
    /// Failed to read configuration file
    #[error("Failed to read config from {path}: {reason}")]
    ConfigRead { path: PathBuf, reason: String },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file not found
    #[error("Configuration not found. Run 'nexus-push init' to create a starter config")]
    NoConfig,

    /// Failed to write configuration file
    #[error("Failed to write config to {path}: {reason}")]
    ConfigWrite { path: PathBuf, reason: String },

    /// No staging profile mapped for the product/quality-level combination
    #[error("No staging profile configured for product '{product}' at quality level {quality}")]
    MissingProfile { product: String, quality: String },

    /// A username is configured but no password could be resolved
    #[error(
        "Missing password for environment '{environment}'. \
         Set it in the config file or via NEXUS_PUSH_PASSWORD"
    )]
    MissingPassword { environment: String },

    /// Push source is neither a directory nor a zip archive
    #[error("Push target is neither a directory nor a zip archive: {path}")]
    InvalidTarget { path: PathBuf },

    // ═══════════════════════════════════════════════════════════════
    // Staging Lifecycle Errors
    // ═══════════════════════════════════════════════════════════════
    /// Server-side validation rules rejected the staged content.
    /// The individual rule failure messages have already been reported.
    #[error("Server reported rule failures during '{action}' of {repository}")]
    VerificationFailed { action: String, repository: String },

    /// Activity polling gave up after the configured number of attempts
    #[error("Gave up waiting for '{action}' activity on {repository} after {attempts} attempts")]
    ActivityTimeout {
        action: String,
        repository: String,
        attempts: u32,
    },

    /// The activity log carries no repositoryPromoted event for the entity
    #[error("Promoted id not found: no repositoryPromoted event recorded for {repository}")]
    PromotedIdNotFound { repository: String },

    /// The server rejected a staging drop request
    #[error("Failed to drop staging repository {repository}")]
    DropFailed { repository: String },

    /// A named content group does not exist on the server
    #[error("No such group: {group}")]
    GroupNotFound { group: String },

    // ═══════════════════════════════════════════════════════════════
    // Archive & I/O Errors
    // ═══════════════════════════════════════════════════════════════
    /// Zip archive could not be read or written
    #[error("Zip archive error: {0}")]
    Zip(String),

    /// File operation failed
    #[error("File operation failed: {path}: {reason}")]
    File { path: PathBuf, reason: String },

    /// Directory operation failed
    #[error("Directory operation failed: {path}: {reason}")]
    Dir { path: PathBuf, reason: String },

    // ═══════════════════════════════════════════════════════════════
    // Other Errors
    // ═══════════════════════════════════════════════════════════════
    /// Failed to serialize a request document
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigRead { .. }
            | Self::InvalidConfig(_)
            | Self::NoConfig
            | Self::ConfigWrite { .. }
            | Self::MissingProfile { .. }
            | Self::MissingPassword { .. }
            | Self::InvalidTarget { .. } => 2,
            Self::Http(_) | Self::UnexpectedStatus { .. } | Self::InvalidResponse(_) => 4,
            Self::ActivityTimeout { .. } => 5,
            Self::VerificationFailed { .. }
            | Self::PromotedIdNotFound { .. }
            | Self::DropFailed { .. }
            | Self::GroupNotFound { .. } => 6,
            Self::Zip(_) | Self::File { .. } | Self::Dir { .. } => 7,
            _ => 1,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::File {
            path: PathBuf::from("<unknown>"),
            reason: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for CliError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

impl From<zip::result::ZipError> for CliError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Zip(err.to_string())
    }
}

impl From<walkdir::Error> for CliError {
    fn from(err: walkdir::Error) -> Self {
        Self::File {
            path: err
                .path()
                .map_or_else(|| PathBuf::from("<unknown>"), Path::to_path_buf),
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_exit_with_2() {
        let err = CliError::MissingProfile {
            product: "eap".to_string(),
            quality: "GA".to_string(),
        };
        assert_eq!(err.exit_code(), 2);
        assert_eq!(CliError::NoConfig.exit_code(), 2);
    }

    #[test]
    fn transport_and_verification_codes_differ() {
        let transport = CliError::Http("connection refused".to_string());
        let verification = CliError::VerificationFailed {
            action: "close".to_string(),
            repository: "xyz-1001".to_string(),
        };
        assert_ne!(transport.exit_code(), verification.exit_code());
    }
}
