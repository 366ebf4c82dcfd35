//! FFI bindings to AudioToolbox, CoreLocation and Foundation.
//!
//! This module contains the low-level C layer. Users should prefer the
//! safe Rust wrappers in the parent modules; it is public so alternative
//! backends can implement the entry point traits.

pub mod api;
pub mod error;
pub mod handles;
pub mod raw;
#[cfg(target_vendor = "apple")]
pub mod system;

pub use api::{LocationApi, ObjectArrayApi, StreamApi};
pub use error::check_status;
pub use handles::*;
#[cfg(target_vendor = "apple")]
pub use system::SystemApi;
