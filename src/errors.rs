//! Error channel shared by every media storage operation.
//!
//! Each failure is one variant of [`MediaStorageError`]; callers that only care
//! about the coarse taxonomy can use [`MediaStorageError::kind`].

use crate::services::{meta_key::InvalidMetaKey, session::SessionError};
use reqwest::StatusCode;
use std::io;
use thiserror::Error;

/// Coarse classification of a [`MediaStorageError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No token available, connect not completed, or the call itself was malformed.
    InvalidUsage,
    /// A metadata key or value was rejected before any request was issued.
    InvalidParameter,
    /// The service answered with a non-2xx status.
    Api,
    /// The exchange failed before a usable response was obtained, or the
    /// response could not be decoded.
    Transport,
}

#[derive(Debug, Error)]
pub enum MediaStorageError {
    #[error("wrong usage: {0}")]
    InvalidUsage(String),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("invalid {name}: `{value}`")]
    InvalidParameter { name: &'static str, value: String },
    #[error("media storage responded with {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type MediaStorageResult<T> = Result<T, MediaStorageError>;

impl MediaStorageError {
    pub fn invalid_usage(msg: impl Into<String>) -> Self {
        Self::InvalidUsage(msg.into())
    }

    pub fn invalid_parameter(name: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            value: value.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidUsage(_) | Self::Session(_) => ErrorKind::InvalidUsage,
            Self::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            Self::Api { .. } => ErrorKind::Api,
            Self::Transport(_) | Self::Io(_) | Self::Decode(_) => ErrorKind::Transport,
        }
    }

    /// Status code of an [`ErrorKind::Api`] failure.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(err) => err.status(),
            _ => None,
        }
    }

    /// Hint for callers deciding whether to try again. The client itself never retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            Self::Transport(err) => err.is_timeout() || err.is_connect(),
            Self::Io(_) => true,
            _ => false,
        }
    }
}

impl From<InvalidMetaKey> for MediaStorageError {
    fn from(err: InvalidMetaKey) -> Self {
        Self::invalid_parameter("metadata key", err.0)
    }
}
