//! Error types for the NLP gateway

use std::error::Error as StdError;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown upstream: {0}")]
    UnknownUpstream(String),

    /// The upstream could not be reached at all (connect, DNS, timeout).
    #[error("{method} \"{url}\": {reason}")]
    UpstreamUnavailable {
        method: String,
        url: String,
        reason: String,
    },

    /// The upstream answered with a non-2xx status.
    #[error("{message}")]
    UpstreamStatus { status: u16, message: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build an `UpstreamUnavailable` from a transport error, keeping the whole source chain.
    pub fn unavailable(method: &str, url: &str, err: &reqwest::Error) -> Self {
        let mut reason = err.to_string();
        let mut source = StdError::source(err);
        while let Some(cause) = source {
            reason.push_str(": ");
            reason.push_str(&cause.to_string());
            source = cause.source();
        }

        Error::UpstreamUnavailable {
            method: method.to_string(),
            url: url.to_string(),
            reason,
        }
    }
}
