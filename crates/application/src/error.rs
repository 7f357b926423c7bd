//! Chain error types

use std::panic::Location;

use courier_domain::AssertionError;
use thiserror::Error;

use crate::ports::BridgeError;

/// Boxed error returned by user-supplied inspectors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error a chain resolves with: the failure of its first failing step.
#[derive(Debug, Error)]
pub enum ChainError {
    /// A status, body, header or cookie assertion failed.
    #[error(transparent)]
    Assertion(#[from] AssertionError),

    /// A user inspector returned an error.
    #[error(transparent)]
    Inspector(BoxError),

    /// The request could not be exchanged with the server.
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// An assertion ran before any request step.
    #[error("there is no response to assert on, issue a request first")]
    NoResponse,

    /// A failure annotated with the call site of the step that raised it.
    #[error("{source}\n    at {location}")]
    Located {
        /// Where the failing step was added to the chain.
        location: &'static Location<'static>,
        /// The original failure.
        source: Box<ChainError>,
    },
}

impl ChainError {
    /// Returns the failure without any call-site annotation.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Located { source, .. } => source.root(),
            other => other,
        }
    }

    /// Returns the call site the failing step was added at, if recorded.
    #[must_use]
    pub const fn location(&self) -> Option<&'static Location<'static>> {
        match self {
            Self::Located { location, .. } => Some(*location),
            _ => None,
        }
    }

    /// Returns the assertion failure, if that is what this is.
    #[must_use]
    pub fn as_assertion(&self) -> Option<&AssertionError> {
        match self.root() {
            Self::Assertion(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type alias for chain execution.
pub type ChainResult<T> = Result<T, ChainError>;
