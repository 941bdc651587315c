use thiserror::Error;

use crate::resources::ResourceId;
use crate::surface::SurfaceId;

/// Errors reported by the engine.
///
/// Every error is reported once, at the call that caused it. Nothing in the
/// engine retries on its own.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Canvas or surface dimensions were not strictly positive.
    #[error("invalid dimensions {width}x{height}: width and height must be > 0")]
    InvalidDimensions { width: i64, height: i64 },

    /// A tick rate was zero, negative or not finite.
    #[error("invalid {name} rate {rate}: must be a finite value > 0")]
    InvalidRate { name: &'static str, rate: f64 },

    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An operation was attempted in a lifecycle state that does not allow it.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    #[error("resource id {0} is already registered to a live object")]
    DuplicateResource(ResourceId),

    #[error("unknown surface {0:?}")]
    UnknownSurface(SurfaceId),

    /// The host or the presentation backend could not create a resource.
    #[error("failed to create {what}: {reason}")]
    ResourceCreation { what: &'static str, reason: String },

    /// An application hook reported a failure.
    #[error("application hook failed: {0:#}")]
    Hook(anyhow::Error),

    /// The presentation backend failed while composing or presenting.
    #[error("backend failure: {0}")]
    Backend(String),
}

impl EngineError {
    pub(crate) fn dimensions(width: i64, height: i64) -> Self {
        EngineError::InvalidDimensions { width, height }
    }

    pub(crate) fn creation(what: &'static str, err: anyhow::Error) -> Self {
        EngineError::ResourceCreation {
            what,
            reason: format!("{err:#}"),
        }
    }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
