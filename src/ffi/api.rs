//! Native entry point tables.
//!
//! The safe wrappers never call the extern functions directly; they go
//! through these traits so the framework can be substituted (the tests run
//! against an in-process implementation that speaks the same C ABI).
//! [`super::SystemApi`] forwards to the real frameworks on Apple targets.

use std::os::raw::{c_char, c_void};

use super::handles::{AudioFileStreamId, ObjectHandle};
use super::raw::{
    AudioFileStreamPacketsProc, AudioFileStreamPropertyId, AudioFileStreamPropertyListenerProc,
    AudioFileTypeId, Boolean, CLLocationCoordinate2D, OSStatus,
};

/// AudioToolbox audio file stream entry points.
///
/// Every method mirrors the C function of the same name; pointer arguments
/// carry the same validity requirements as in the C header.
pub trait StreamApi: Send + Sync {
    /// `AudioFileStreamOpen`.
    ///
    /// # Safety
    ///
    /// `out_stream` must be valid for writes. `client_data` is handed back
    /// verbatim to both callbacks.
    unsafe fn open(
        &self,
        client_data: *mut c_void,
        property_listener_proc: AudioFileStreamPropertyListenerProc,
        packets_proc: AudioFileStreamPacketsProc,
        file_type_hint: AudioFileTypeId,
        out_stream: *mut AudioFileStreamId,
    ) -> OSStatus;

    /// `AudioFileStreamParseBytes`.
    ///
    /// # Safety
    ///
    /// `data` must be valid for `data_byte_size` bytes.
    unsafe fn parse_bytes(
        &self,
        stream: AudioFileStreamId,
        data_byte_size: u32,
        data: *const c_void,
        flags: u32,
    ) -> OSStatus;

    /// `AudioFileStreamSeek`.
    ///
    /// # Safety
    ///
    /// Both out pointers must be valid for writes.
    unsafe fn seek(
        &self,
        stream: AudioFileStreamId,
        packet_offset: i64,
        out_data_byte_offset: *mut i64,
        io_flags: *mut u32,
    ) -> OSStatus;

    /// `AudioFileStreamGetPropertyInfo`.
    ///
    /// # Safety
    ///
    /// Both out pointers must be valid for writes.
    unsafe fn get_property_info(
        &self,
        stream: AudioFileStreamId,
        property_id: AudioFileStreamPropertyId,
        out_property_data_size: *mut u32,
        out_writable: *mut Boolean,
    ) -> OSStatus;

    /// `AudioFileStreamGetProperty`.
    ///
    /// # Safety
    ///
    /// `out_property_data` must be valid for `*io_property_data_size` bytes.
    unsafe fn get_property(
        &self,
        stream: AudioFileStreamId,
        property_id: AudioFileStreamPropertyId,
        io_property_data_size: *mut u32,
        out_property_data: *mut c_void,
    ) -> OSStatus;

    /// `AudioFileStreamSetProperty`.
    ///
    /// # Safety
    ///
    /// `property_data` must be valid for `property_data_size` bytes.
    unsafe fn set_property(
        &self,
        stream: AudioFileStreamId,
        property_id: AudioFileStreamPropertyId,
        property_data_size: u32,
        property_data: *const c_void,
    ) -> OSStatus;

    /// `AudioFileStreamClose`.
    ///
    /// # Safety
    ///
    /// `stream` must not be used again afterwards.
    unsafe fn close(&self, stream: AudioFileStreamId) -> OSStatus;
}

/// CoreLocation coordinate validation.
pub trait LocationApi: Send + Sync {
    /// `CLLocationCoordinate2DIsValid`.
    fn coordinate_is_valid(&self, coord: CLLocationCoordinate2D) -> bool;
}

/// Foundation `NSArray` / `NSString` messaging used by the array helpers.
///
/// Objects returned by `array_from_objects` and `string_from_utf8` are owned
/// by the caller (+1) and must be passed to `release`.
pub trait ObjectArrayApi: Send + Sync {
    /// `[[NSArray alloc] initWithObjects:count:]`.
    ///
    /// # Safety
    ///
    /// `objects` must be valid for `count` reads.
    unsafe fn array_from_objects(&self, objects: *const ObjectHandle, count: usize)
        -> ObjectHandle;

    /// `[array count]`.
    ///
    /// # Safety
    ///
    /// `array` must be a live NSArray.
    unsafe fn array_count(&self, array: ObjectHandle) -> usize;

    /// `[array objectAtIndex:]`.
    ///
    /// # Safety
    ///
    /// `array` must be a live NSArray and `index` in range.
    unsafe fn array_object_at(&self, array: ObjectHandle, index: usize) -> ObjectHandle;

    /// `[[NSString alloc] initWithUTF8String:]`.
    ///
    /// # Safety
    ///
    /// `utf8` must point to a NUL-terminated string.
    unsafe fn string_from_utf8(&self, utf8: *const c_char) -> ObjectHandle;

    /// `[string UTF8String]`; the pointer is borrowed from the object.
    ///
    /// # Safety
    ///
    /// `string` must be a live NSString or null.
    unsafe fn string_to_utf8(&self, string: ObjectHandle) -> *const c_char;

    /// `[NSNull null]`, the shared object standing in for empty array slots.
    ///
    /// Not owned by the caller; never passed to `release`.
    ///
    /// # Safety
    ///
    /// Requires a loaded Foundation runtime.
    unsafe fn null_placeholder(&self) -> ObjectHandle;

    /// `[object release]`.
    ///
    /// # Safety
    ///
    /// `object` must be owned by the caller.
    unsafe fn release(&self, object: ObjectHandle);
}
