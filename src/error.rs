//! Error types shared across the transport.
//!
//! Only configuration, build and settings failures reach callers as
//! `Result`s. Submission failures stay inside the dispatcher and delivery
//! failures are reported to completion callbacks as
//! [`DeliveryOutcome`](crate::transport::DeliveryOutcome).

use std::io;

use thiserror::Error;

/// A connection string that cannot be turned into an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// The string has no `://` separating the scheme from the address.
    #[error("connection string is missing the '://' scheme separator")]
    MissingSchemeSeparator,
    /// The scheme before `://` is empty.
    #[error("connection string has an empty scheme")]
    EmptyScheme,
    /// Nothing precedes the project segment.
    #[error("connection string has an empty host")]
    EmptyHost,
    /// No `/projectId` segment follows the host, or it is empty.
    #[error("connection string is missing the project id segment")]
    MissingProjectId,
}

/// The HTTP engine refused a request before it was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// The engine's request queue is at capacity.
    #[error("request queue is full")]
    QueueFull,
    /// The engine no longer accepts requests.
    #[error("engine is closed")]
    Closed,
}

/// Errors that may occur while building a transport.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Invalid user supplied configuration.
    #[error("invalid transport configuration: {0}")]
    InvalidConfig(String),
    /// Underlying I/O error whilst creating the transport.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Errors raised while loading [`ClientSettings`](crate::settings::ClientSettings).
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    /// The settings file is not valid INI.
    #[error("failed to parse settings: {0}")]
    Parse(#[from] ini::ParseError),
}
