//! Self-describing property access.
//!
//! Variable-size properties are read in two steps: the native layer reports
//! the size, a buffer of exactly that size is allocated, then filled.
//! Fixed-width scalars skip the size query.

use std::mem::{size_of, MaybeUninit};
use std::os::raw::c_void;

use crate::error::{Error, Result};
use crate::ffi::error::{property_get_error, property_info_error, property_set_error};
use crate::ffi::raw::{self, NO_ERR};
use crate::ffi::{AudioFileStreamId, StreamApi};
use crate::types::{PropertyId, StreamStatus};

/// Size and mutability of a property, as reported by the native layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyInfo {
    /// Size in bytes of the current value.
    pub size: usize,
    /// True if the property can be written.
    pub writable: bool,
}

/// Plain-old-data layouts that can be copied to and from property bytes.
///
/// # Safety
///
/// Implementors must be `#[repr(C)]` (or primitive) with no pointers, and
/// every bit pattern of `size_of::<Self>()` bytes must be a valid value.
pub unsafe trait NativeLayout: Copy + Default + 'static {}

unsafe impl NativeLayout for i32 {}
unsafe impl NativeLayout for u32 {}
unsafe impl NativeLayout for i64 {}
unsafe impl NativeLayout for u64 {}
unsafe impl NativeLayout for f64 {}
unsafe impl NativeLayout for raw::AudioStreamBasicDescription {}
unsafe impl NativeLayout for raw::AudioStreamPacketDescription {}
unsafe impl NativeLayout for raw::AudioFramePacketTranslation {}
unsafe impl NativeLayout for raw::AudioBytePacketTranslation {}
unsafe impl NativeLayout for raw::AudioFilePacketTableInfo {}
unsafe impl NativeLayout for raw::AudioFormatListItem {}
unsafe impl NativeLayout for raw::AudioChannelDescription {}
unsafe impl NativeLayout for raw::AudioChannelLayoutHeader {}

/// Owned, 8-byte aligned property value.
///
/// Replaces the allocate/fill/free dance of the C API: the storage is
/// released when the buffer goes out of scope, on every path.
#[derive(Clone)]
pub struct PropertyBuffer {
    storage: Vec<u64>,
    len: usize,
}

impl PropertyBuffer {
    /// Zeroed buffer of `len` bytes.
    pub fn zeroed(len: usize) -> Self {
        Self {
            storage: vec![0u64; len.div_ceil(8)],
            len,
        }
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// View the bytes.
    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: storage holds at least `len` initialized bytes
        unsafe { std::slice::from_raw_parts(self.storage.as_ptr().cast::<u8>(), self.len) }
    }

    /// Copy the bytes out.
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    /// Decode a `T` at `offset`. `None` if it would read past the end.
    pub fn read<T: NativeLayout>(&self, offset: usize) -> Option<T> {
        let end = offset.checked_add(size_of::<T>())?;
        if end > self.len {
            return None;
        }
        let mut value = MaybeUninit::<T>::uninit();
        // SAFETY: bounds checked above; NativeLayout accepts any bit pattern
        unsafe {
            std::ptr::copy_nonoverlapping(
                self.as_bytes().as_ptr().add(offset),
                value.as_mut_ptr().cast::<u8>(),
                size_of::<T>(),
            );
            Some(value.assume_init())
        }
    }

    /// Decode `count` consecutive `T`s starting at `offset`.
    pub fn read_array<T: NativeLayout>(&self, offset: usize, count: usize) -> Option<Vec<T>> {
        (0..count)
            .map(|i| self.read::<T>(offset.checked_add(i.checked_mul(size_of::<T>())?)?))
            .collect()
    }

    fn as_mut_ptr(&mut self) -> *mut c_void {
        self.storage.as_mut_ptr().cast()
    }

    fn truncate(&mut self, len: usize) {
        self.len = self.len.min(len);
    }
}

impl std::fmt::Debug for PropertyBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyBuffer").field("len", &self.len).finish()
    }
}

/// Property calls against one open native handle.
pub(crate) struct PropertyAccessor<'a> {
    api: &'a dyn StreamApi,
    handle: AudioFileStreamId,
}

impl<'a> PropertyAccessor<'a> {
    pub(crate) fn new(api: &'a dyn StreamApi, handle: AudioFileStreamId) -> Self {
        Self { api, handle }
    }

    pub(crate) fn query_info(&self, id: PropertyId) -> Result<PropertyInfo> {
        let mut size: u32 = 0;
        let mut writable: raw::Boolean = 0;
        let code = unsafe {
            self.api
                .get_property_info(self.handle, id.code(), &mut size, &mut writable)
        };
        if code != NO_ERR {
            return Err(property_info_error(id, code));
        }
        Ok(PropertyInfo {
            size: size as usize,
            writable: writable != 0,
        })
    }

    pub(crate) fn get_buffer(&self, id: PropertyId) -> Result<PropertyBuffer> {
        let info = self.query_info(id)?;
        let mut buffer = PropertyBuffer::zeroed(info.size);
        let mut io_size = info.size as u32;
        let code = unsafe {
            self.api
                .get_property(self.handle, id.code(), &mut io_size, buffer.as_mut_ptr())
        };
        if code != NO_ERR {
            return Err(property_get_error(id, code));
        }
        buffer.truncate(io_size as usize);
        Ok(buffer)
    }

    pub(crate) fn get_into(&self, id: PropertyId, out: &mut [u8]) -> Result<usize> {
        let mut io_size = u32::try_from(out.len()).map_err(|_| {
            Error::InvalidArgument(format!("buffer of {} bytes exceeds u32", out.len()))
        })?;
        let code = unsafe {
            self.api.get_property(
                self.handle,
                id.code(),
                &mut io_size,
                out.as_mut_ptr().cast(),
            )
        };
        if code != NO_ERR {
            return Err(property_get_error(id, code));
        }
        Ok(io_size as usize)
    }

    pub(crate) fn get_scalar<T: NativeLayout>(&self, id: PropertyId) -> Result<T> {
        self.exchange(id, T::default())
    }

    /// Pass `input` to the native getter and return what it wrote back.
    ///
    /// Used both for plain scalars and for translation properties, which
    /// read their input fields from the same struct they fill.
    pub(crate) fn exchange<T: NativeLayout>(&self, id: PropertyId, input: T) -> Result<T> {
        let mut value = input;
        let mut io_size = size_of::<T>() as u32;
        let code = unsafe {
            self.api.get_property(
                self.handle,
                id.code(),
                &mut io_size,
                (&mut value as *mut T).cast(),
            )
        };
        if code != NO_ERR {
            return Err(property_get_error(id, code));
        }
        if io_size as usize != size_of::<T>() {
            return Err(Error::Status {
                op: "AudioFileStreamGetProperty",
                status: StreamStatus::BadPropertySize,
            });
        }
        Ok(value)
    }

    pub(crate) fn set_buffer(&self, id: PropertyId, data: &[u8]) -> Result<()> {
        let size = u32::try_from(data.len()).map_err(|_| {
            Error::InvalidArgument(format!("property value of {} bytes exceeds u32", data.len()))
        })?;
        let code = unsafe {
            self.api
                .set_property(self.handle, id.code(), size, data.as_ptr().cast())
        };
        if code != NO_ERR {
            return Err(property_set_error(id, code));
        }
        Ok(())
    }

    pub(crate) fn set_scalar<T: NativeLayout>(&self, id: PropertyId, value: T) -> Result<()> {
        let code = unsafe {
            self.api.set_property(
                self.handle,
                id.code(),
                size_of::<T>() as u32,
                (&value as *const T).cast(),
            )
        };
        if code != NO_ERR {
            return Err(property_set_error(id, code));
        }
        Ok(())
    }
}
