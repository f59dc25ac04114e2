//! Error taxonomy for the planning pipeline.
//!
//! Remote-call failures (`FetchError`, `AiError`) are caught at the component
//! that produced them and converted into an empty/`None`/degraded value;
//! they never unwind into the orchestrator. Only `PlanError` aborts a run.

use thiserror::Error;

/// Failure of an outbound call to the mapping provider.
///
/// Produced inside `MapsClient` and consumed by its own fail-open boundary;
/// callers of the public client methods never see this type.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network error, timeout, or connection failure.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response from the provider.
    #[error("provider returned HTTP {0}")]
    Status(reqwest::StatusCode),

    /// Syntactically valid response with an empty result set.
    #[error("provider returned an empty result set")]
    ZeroResults,

    /// Response body did not match the expected wire shape.
    #[error("malformed payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Failure of a generative-AI invocation.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("model endpoint returned HTTP {0}")]
    Status(reqwest::StatusCode),

    /// The response contained no usable answer.
    #[error("no usable answer in model response")]
    Parse,
}

/// Malformed encoded polyline. Callers treat any decode failure as "no route".
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("encoded polyline truncated mid-chunk")]
    UnexpectedEnd,

    #[error("invalid polyline character {0:?}")]
    InvalidChar(char),
}

/// Credential problem detected at process start.
///
/// Surfaced once as a visible banner; the affected component then degrades
/// per its fail-open policy instead of aborting the process.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing or blank credential: {0}")]
    MissingCredential(&'static str),

    #[error("could not construct HTTP client: {0}")]
    ClientInit(#[from] reqwest::Error),
}

/// Fatal conditions for a planning run. Everything else degrades.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("no routes found between the given locations")]
    NoRoutes,

    /// Guarded but logically unreachable once routes exist.
    #[error("could not determine a final route")]
    NoRouteChosen,
}
