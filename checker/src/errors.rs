//! Error taxonomy for node checks and node administration
//!
//! Every variant of [`CheckError`] is contained per node: the checker turns it
//! into a negative verdict, so it never aborts a batch. Storage and
//! configuration failures travel as `anyhow::Error` instead.

use std::time::Duration;
use thiserror::Error;

/// Failure while checking a single node
#[derive(Debug, Error)]
pub enum CheckError {
    /// Authentication or network failure opening a session
    #[error("connection to {host} failed: {reason}")]
    Connection { host: String, reason: String },

    /// No output became ready within the wait bound
    #[error("Cannot execute command {command}, after {seconds} seconds")]
    CommandTimeout { command: String, seconds: u64 },

    /// HTTP transport failure or unusable status
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    /// Reply did not have the expected shape
    #[error("parsing {0}")]
    Parse(#[from] ParseError),

    /// Node type tag is not known to the registry
    #[error("Unsupported node type '{0}'")]
    UnsupportedNodeType(String),

    /// Stored node lacks the connection fields its type needs
    #[error("Wrong node parameters: {0}")]
    InvalidTarget(String),

    /// Session driven out of order
    #[error("session cannot handle {event} while {phase}")]
    InvalidTransition {
        phase: &'static str,
        event: &'static str,
    },
}

impl CheckError {
    pub fn connection(host: &str, reason: impl ToString) -> Self {
        CheckError::Connection {
            host: host.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn request(url: &str, reason: impl ToString) -> Self {
        CheckError::Request {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn command_timeout(command: &str, bound: Duration) -> Self {
        CheckError::CommandTimeout {
            command: command.to_string(),
            seconds: bound.as_secs(),
        }
    }
}

/// Malformed or incomplete reply
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// A required label is absent from the reply
    #[error("Wrong {label} reply")]
    MissingLabel { label: String },

    /// A token could not be read as a number
    #[error("Wrong {label} value '{value}'")]
    InvalidNumber { label: String, value: String },

    /// A required JSON field is absent or has the wrong type
    #[error("Wrong {path} field")]
    MissingField { path: String },

    /// Reply is not valid JSON
    #[error("Wrong json reply: {0}")]
    InvalidJson(String),
}

impl ParseError {
    pub fn missing_label(label: &str) -> Self {
        ParseError::MissingLabel {
            label: label.to_string(),
        }
    }

    pub fn invalid_number(label: &str, value: &str) -> Self {
        ParseError::InvalidNumber {
            label: label.to_string(),
            value: value.to_string(),
        }
    }

    pub fn missing_field(path: &str) -> Self {
        ParseError::MissingField {
            path: path.to_string(),
        }
    }
}

/// Rejected add-node request, reported before any I/O happens
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Wrong node_ip, not valid: {0}")]
    InvalidHost(String),

    #[error("Wrong node_type, supported: {supported}")]
    UnsupportedNodeType { given: String, supported: String },

    #[error("Wrong port number: {0}")]
    InvalidPort(String),

    #[error("Wrong parameters for {node_type} node: {reason}")]
    TransportMismatch { node_type: String, reason: String },

    #[error("Wrong node number: {0}")]
    InvalidOrdinal(String),
}
