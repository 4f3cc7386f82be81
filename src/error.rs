use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::wizard::SeedType;

/// Failures talking to the Spotify Web API.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    #[error("spotify rejected the access token")]
    Unauthorized,
    #[error("spotify answered with HTTP {0}")]
    Status(u16),
    #[error("request to spotify failed: {0}")]
    Transport(String),
    #[error("unexpected spotify response: {0}")]
    Decode(String),
    #[error("invalid spotify id: {0}")]
    InvalidId(String),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SessionError {
    #[error("not signed in")]
    Missing,
    #[error("session expired at {expired_at}")]
    Expired { expired_at: DateTime<Utc> },
}

/// Problems with the state handed from the wizard to the results screen.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HandoffError {
    #[error("missing query parameter `{0}`")]
    MissingParam(&'static str),
    #[error("query parameter `{param}` is malformed: {reason}")]
    Malformed { param: &'static str, reason: String },
    #[error("unsupported handoff version {0}")]
    UnsupportedVersion(u32),
    #[error("unknown seed type {0:?}")]
    UnknownSeedType(String),
    #[error("no {0} seeds selected")]
    EmptySeed(SeedType),
    #[error("{count} seeds selected, at most {max} allowed")]
    TooManySeeds { count: usize, max: usize },
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Api(#[from] ApiError),
}
