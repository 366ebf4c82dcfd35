//! Marshaling between Rust slices and Foundation `NSArray`s.
//!
//! Element iteration and ownership semantics stay native; these helpers only
//! build the pointer buffers the native calls expect and convert results.
//!
//! `NSArray` cannot hold nil. Null slots are stored as the
//! [`ObjectArrayApi::null_placeholder`] object (`NSNull`) and come back out
//! as the null handle.

use std::ffi::{CStr, CString};

use crate::error::{Error, Result};
use crate::ffi::{ObjectArrayApi, ObjectHandle};

/// A native object reference owned by Rust, released on drop.
pub struct OwnedObject<'a> {
    api: &'a dyn ObjectArrayApi,
    handle: ObjectHandle,
}

impl<'a> OwnedObject<'a> {
    /// Take ownership of a +1 reference.
    ///
    /// # Safety
    ///
    /// `handle` must be null or a reference the caller owns; it will be
    /// released exactly once through `api`.
    pub unsafe fn from_retained(api: &'a dyn ObjectArrayApi, handle: ObjectHandle) -> Self {
        Self { api, handle }
    }

    /// A null reference.
    pub fn null(api: &'a dyn ObjectArrayApi) -> Self {
        Self {
            api,
            handle: ObjectHandle::invalid(),
        }
    }

    /// Get the underlying handle.
    pub fn handle(&self) -> ObjectHandle {
        self.handle
    }

    /// Check if this is the null reference.
    pub fn is_null(&self) -> bool {
        !self.handle.is_valid()
    }

    /// Give up ownership without releasing.
    pub fn into_raw(self) -> ObjectHandle {
        let handle = self.handle;
        std::mem::forget(self);
        handle
    }
}

impl Drop for OwnedObject<'_> {
    fn drop(&mut self) {
        if self.handle.is_valid() {
            unsafe { self.api.release(self.handle) };
        }
    }
}

/// Build an array from existing object handles.
///
/// `None` yields the null array, so optional array parameters can be passed
/// straight through to native calls. Null handles inside `items` are stored
/// as the placeholder object.
///
/// # Safety
///
/// Every non-null handle in `items` must be a live object.
pub unsafe fn from_handles<'a>(
    api: &'a dyn ObjectArrayApi,
    items: Option<&[ObjectHandle]>,
) -> OwnedObject<'a> {
    let Some(items) = items else {
        return OwnedObject::null(api);
    };
    let placeholder = api.null_placeholder();
    let buffer: Vec<ObjectHandle> = items
        .iter()
        .map(|h| if h.is_valid() { *h } else { placeholder })
        .collect();
    let array = api.array_from_objects(buffer.as_ptr(), buffer.len());
    OwnedObject::from_retained(api, array)
}

/// Build an array of strings. `None` items become placeholder slots.
///
/// The temporary native strings are released once the array holds them.
pub fn from_strings<'a>(
    api: &'a dyn ObjectArrayApi,
    items: &[Option<&str>],
) -> Result<OwnedObject<'a>> {
    let mut strings: Vec<OwnedObject<'a>> = Vec::with_capacity(items.len());
    for item in items {
        let owned = match item {
            Some(s) => {
                let c = CString::new(*s).map_err(|_| {
                    Error::InvalidArgument(format!("string contains NUL byte: {:?}", s))
                })?;
                unsafe { OwnedObject::from_retained(api, api.string_from_utf8(c.as_ptr())) }
            }
            None => OwnedObject::null(api),
        };
        strings.push(owned);
    }

    let placeholder = unsafe { api.null_placeholder() };
    let handles: Vec<ObjectHandle> = strings
        .iter()
        .map(|s| if s.is_null() { placeholder } else { s.handle() })
        .collect();
    let array = unsafe { api.array_from_objects(handles.as_ptr(), handles.len()) };
    Ok(unsafe { OwnedObject::from_retained(api, array) })
}

/// Convert every element of an array.
///
/// Returns `None` for the null array. Placeholder slots are passed to
/// `convert` as the null handle.
///
/// # Safety
///
/// `array` must be null or a live `NSArray`.
pub unsafe fn array_from_handle<T>(
    api: &dyn ObjectArrayApi,
    array: ObjectHandle,
    mut convert: impl FnMut(ObjectHandle) -> T,
) -> Option<Vec<T>> {
    if !array.is_valid() {
        return None;
    }
    let placeholder = api.null_placeholder();
    let count = api.array_count(array);
    Some(
        (0..count)
            .map(|i| {
                let element = api.array_object_at(array, i);
                if element == placeholder {
                    convert(ObjectHandle::invalid())
                } else {
                    convert(element)
                }
            })
            .collect(),
    )
}

/// Read an array of strings. Null elements come back as `None`.
///
/// # Safety
///
/// `array` must be null or a live `NSArray` whose elements are `NSString`s
/// or the placeholder.
pub unsafe fn strings_from_handle(
    api: &dyn ObjectArrayApi,
    array: ObjectHandle,
) -> Option<Vec<Option<String>>> {
    array_from_handle(api, array, |element| {
        if !element.is_valid() {
            return None;
        }
        let utf8 = api.string_to_utf8(element);
        if utf8.is_null() {
            None
        } else {
            Some(CStr::from_ptr(utf8).to_string_lossy().into_owned())
        }
    })
}
