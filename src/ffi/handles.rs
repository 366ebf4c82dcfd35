//! Handle types for opaque references to native objects.
//!
//! Each handle type is a newtype wrapper around an address-sized value so it
//! can cross the C boundary wherever the headers declare an opaque pointer.

/// Macro to define a handle type.
macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[repr(transparent)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name {
            _h: usize,
        }

        impl $name {
            /// Create an invalid (null) handle.
            #[inline]
            pub const fn invalid() -> Self {
                Self { _h: 0 }
            }

            /// Wrap a raw address handed out by the native layer.
            #[inline]
            pub const fn from_raw(raw: usize) -> Self {
                Self { _h: raw }
            }

            /// Get the raw address.
            #[inline]
            pub const fn as_raw(&self) -> usize {
                self._h
            }

            /// Check if this handle is valid (non-null).
            #[inline]
            pub const fn is_valid(&self) -> bool {
                self._h != 0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::invalid()
            }
        }
    };
}

define_handle!(
    /// Opaque `AudioFileStreamID`.
    AudioFileStreamId
);
define_handle!(
    /// Opaque Objective-C object reference (`id`).
    ObjectHandle
);
