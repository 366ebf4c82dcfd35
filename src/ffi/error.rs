//! Error conversion utilities for FFI.
//!
//! Every native status is turned into a typed [`Error`] here, at the
//! boundary, so the safe wrappers never handle bare integers.

use super::raw::{
    OSStatus, K_AUDIO_FILE_STREAM_ERR_ILLEGAL_OPERATION,
    K_AUDIO_FILE_STREAM_ERR_UNSUPPORTED_PROPERTY, NO_ERR,
};
use crate::error::Error;
use crate::types::{PropertyId, StreamStatus};

/// Check a status code and convert to Result.
pub fn check_status(code: OSStatus, op: &'static str) -> crate::Result<()> {
    if code == NO_ERR {
        Ok(())
    } else {
        Err(Error::Status {
            op,
            status: StreamStatus::from(code),
        })
    }
}

/// Convert a failed open into a creation error.
pub fn creation_error(code: OSStatus) -> Error {
    Error::Creation {
        status: StreamStatus::from(code),
    }
}

/// Convert a failed property size query.
pub fn property_info_error(property: PropertyId, code: OSStatus) -> Error {
    match code {
        K_AUDIO_FILE_STREAM_ERR_UNSUPPORTED_PROPERTY => Error::UnsupportedProperty(property),
        _ => Error::Status {
            op: "AudioFileStreamGetPropertyInfo",
            status: StreamStatus::from(code),
        },
    }
}

/// Convert a failed property fetch.
///
/// Anything other than "unsupported" is reported as unavailable: the
/// framework may not know the value yet.
pub fn property_get_error(property: PropertyId, code: OSStatus) -> Error {
    match code {
        K_AUDIO_FILE_STREAM_ERR_UNSUPPORTED_PROPERTY => Error::UnsupportedProperty(property),
        _ => Error::PropertyUnavailable {
            property,
            status: StreamStatus::from(code),
        },
    }
}

/// Convert a failed property write.
pub fn property_set_error(property: PropertyId, code: OSStatus) -> Error {
    match code {
        K_AUDIO_FILE_STREAM_ERR_ILLEGAL_OPERATION => Error::ReadOnlyProperty(property),
        K_AUDIO_FILE_STREAM_ERR_UNSUPPORTED_PROPERTY => Error::UnsupportedProperty(property),
        _ => Error::Status {
            op: "AudioFileStreamSetProperty",
            status: StreamStatus::from(code),
        },
    }
}
