//! Error types for the afs crate.

use thiserror::Error;

use crate::types::{PropertyId, StreamStatus};

/// Result type alias for afs operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for afs operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The native open call did not report success.
    #[error("unable to create native resource: {status}")]
    Creation {
        /// Status returned by the open call.
        status: StreamStatus,
    },

    /// Operation on a resource whose native open has not completed.
    #[error("resource not open")]
    NotOpen,

    /// Operation on a resource that was already closed.
    #[error("resource already closed")]
    UseAfterClose,

    /// The native layer does not know this property for this resource.
    #[error("unsupported property {0}")]
    UnsupportedProperty(PropertyId),

    /// The size query succeeded but the fetch failed.
    ///
    /// Transient: the value may appear after more data has been parsed.
    #[error("property {property} unavailable: {status}")]
    PropertyUnavailable {
        /// Property that was queried.
        property: PropertyId,
        /// Status returned by the fetch.
        status: StreamStatus,
    },

    /// Write to a property the native layer reports as read-only.
    #[error("property {0} is read-only")]
    ReadOnlyProperty(PropertyId),

    /// Caller-supplied buffer, offset or length is invalid.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Any other native failure.
    #[error("{op} failed: {status}")]
    Status {
        /// Native entry point that failed.
        op: &'static str,
        /// Status it returned.
        status: StreamStatus,
    },
}

impl Error {
    /// Check if this is a use-after-close error.
    pub fn is_use_after_close(&self) -> bool {
        matches!(self, Error::UseAfterClose)
    }

    /// Check if this is an unsupported property error.
    pub fn is_unsupported_property(&self) -> bool {
        matches!(self, Error::UnsupportedProperty(_))
    }

    /// Check if this is a transient property unavailable error.
    pub fn is_property_unavailable(&self) -> bool {
        matches!(self, Error::PropertyUnavailable { .. })
    }

    /// Check if this is a read-only property error.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Error::ReadOnlyProperty(_))
    }

    /// Check if this is an argument validation error.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument(_))
    }

    /// Native status carried by this error, if any.
    pub fn status(&self) -> Option<StreamStatus> {
        match self {
            Error::Creation { status }
            | Error::PropertyUnavailable { status, .. }
            | Error::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
