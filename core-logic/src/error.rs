//! # Core Error Types
//!
//! Centralized error definitions for the core-logic crate.
//! All errors implement `std::error::Error` and `std::fmt::Display`.

use thiserror::Error;

/// Unified error type for core-logic operations.
///
/// Wraps the specific error enums so callers that only need "did startup
/// succeed" can hold a single type.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Config(ConfigError),

    #[error(transparent)]
    Wallet(WalletError),

    #[error(transparent)]
    Network(NetworkError),

    #[error(transparent)]
    Security(SecurityError),
}

impl From<ConfigError> for CoreError {
    fn from(e: ConfigError) -> Self {
        CoreError::Config(e)
    }
}

impl From<WalletError> for CoreError {
    fn from(e: WalletError) -> Self {
        CoreError::Wallet(e)
    }
}

impl From<NetworkError> for CoreError {
    fn from(e: NetworkError) -> Self {
        CoreError::Network(e)
    }
}

impl From<SecurityError> for CoreError {
    fn from(e: SecurityError) -> Self {
        CoreError::Security(e)
    }
}

/// Configuration-related errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid RPC URL format: '{url}'")]
    InvalidRpcUrl { url: String },

    #[error("Missing required configuration field: '{field}'")]
    MissingField { field: String },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Invalid address for '{field}': '{value}'")]
    InvalidAddress { field: String, value: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("I/O error reading {path}: {msg}")]
    IoError { path: String, msg: String },
}

/// Wallet and key material errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WalletError {
    #[error("Environment variable '{key}' holding the private key is not set")]
    MissingEnvKey { key: String },

    #[error("Decryption failed for wallet at '{path}': {reason}")]
    DecryptionFailed { path: String, reason: String },

    #[error("Invalid private key format: expected hex string")]
    InvalidKeyFormat,

    #[error("Private key has wrong length: expected 64 hex chars, got {length}")]
    InvalidKeyLength { length: usize },

    #[error("Unrecognized wallet format in '{path}'")]
    UnrecognizedFormat { path: String },
}

/// Network and RPC-related errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    #[error("Connection refused to {endpoint}: {reason}")]
    ConnectionRefused { endpoint: String, reason: String },

    #[error("RPC call '{method}' failed: {reason}")]
    Rpc { method: String, reason: String },

    #[error("Invalid response to '{method}': {reason}")]
    InvalidResponse { method: String, reason: String },
}

impl NetworkError {
    pub fn rpc(method: &str, reason: impl ToString) -> Self {
        NetworkError::Rpc {
            method: method.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_response(method: &str, reason: impl ToString) -> Self {
        NetworkError::InvalidResponse {
            method: method.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Security-related errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SecurityError {
    #[error("Password required but not provided")]
    PasswordRequired,

    #[error("Invalid hex in '{field}'")]
    InvalidHex { field: String },

    #[error("Encryption/decryption failed: {reason}")]
    CryptographyFailed { reason: String },
}
