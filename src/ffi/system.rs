//! Entry point tables backed by the system frameworks.

use std::ffi::CStr;
use std::os::raw::{c_char, c_void};

use super::api::{LocationApi, ObjectArrayApi, StreamApi};
use super::handles::{AudioFileStreamId, ObjectHandle};
use super::raw::{self, *};

/// Forwards every call to the linked Apple frameworks.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemApi;

impl StreamApi for SystemApi {
    unsafe fn open(
        &self,
        client_data: *mut c_void,
        property_listener_proc: AudioFileStreamPropertyListenerProc,
        packets_proc: AudioFileStreamPacketsProc,
        file_type_hint: AudioFileTypeId,
        out_stream: *mut AudioFileStreamId,
    ) -> OSStatus {
        raw::AudioFileStreamOpen(
            client_data,
            property_listener_proc,
            packets_proc,
            file_type_hint,
            out_stream,
        )
    }

    unsafe fn parse_bytes(
        &self,
        stream: AudioFileStreamId,
        data_byte_size: u32,
        data: *const c_void,
        flags: u32,
    ) -> OSStatus {
        raw::AudioFileStreamParseBytes(stream, data_byte_size, data, flags)
    }

    unsafe fn seek(
        &self,
        stream: AudioFileStreamId,
        packet_offset: i64,
        out_data_byte_offset: *mut i64,
        io_flags: *mut u32,
    ) -> OSStatus {
        raw::AudioFileStreamSeek(stream, packet_offset, out_data_byte_offset, io_flags)
    }

    unsafe fn get_property_info(
        &self,
        stream: AudioFileStreamId,
        property_id: AudioFileStreamPropertyId,
        out_property_data_size: *mut u32,
        out_writable: *mut Boolean,
    ) -> OSStatus {
        raw::AudioFileStreamGetPropertyInfo(stream, property_id, out_property_data_size, out_writable)
    }

    unsafe fn get_property(
        &self,
        stream: AudioFileStreamId,
        property_id: AudioFileStreamPropertyId,
        io_property_data_size: *mut u32,
        out_property_data: *mut c_void,
    ) -> OSStatus {
        raw::AudioFileStreamGetProperty(stream, property_id, io_property_data_size, out_property_data)
    }

    unsafe fn set_property(
        &self,
        stream: AudioFileStreamId,
        property_id: AudioFileStreamPropertyId,
        property_data_size: u32,
        property_data: *const c_void,
    ) -> OSStatus {
        raw::AudioFileStreamSetProperty(stream, property_id, property_data_size, property_data)
    }

    unsafe fn close(&self, stream: AudioFileStreamId) -> OSStatus {
        raw::AudioFileStreamClose(stream)
    }
}

impl LocationApi for SystemApi {
    fn coordinate_is_valid(&self, coord: CLLocationCoordinate2D) -> bool {
        unsafe { raw::CLLocationCoordinate2DIsValid(coord) != 0 }
    }
}

// objc_msgSend has to be cast to the exact signature of each message.
type MsgSendId = unsafe extern "C" fn(ObjectHandle, Selector) -> ObjectHandle;
type MsgSendVoid = unsafe extern "C" fn(ObjectHandle, Selector);
type MsgSendUsize = unsafe extern "C" fn(ObjectHandle, Selector) -> usize;
type MsgSendIdAtIndex = unsafe extern "C" fn(ObjectHandle, Selector, usize) -> ObjectHandle;
type MsgSendObjectsCount =
    unsafe extern "C" fn(ObjectHandle, Selector, *const ObjectHandle, usize) -> ObjectHandle;
type MsgSendCStr = unsafe extern "C" fn(ObjectHandle, Selector, *const c_char) -> ObjectHandle;
type MsgSendToCStr = unsafe extern "C" fn(ObjectHandle, Selector) -> *const c_char;

unsafe fn msg_send<F: Copy>() -> F {
    let f: unsafe extern "C" fn() = raw::objc_msgSend;
    std::mem::transmute_copy(&f)
}

unsafe fn sel(name: &CStr) -> Selector {
    raw::sel_registerName(name.as_ptr())
}

unsafe fn alloc(class: &CStr) -> ObjectHandle {
    let cls = raw::objc_getClass(class.as_ptr());
    if !cls.is_valid() {
        return ObjectHandle::invalid();
    }
    msg_send::<MsgSendId>()(cls, sel(c"alloc"))
}

impl ObjectArrayApi for SystemApi {
    unsafe fn array_from_objects(
        &self,
        objects: *const ObjectHandle,
        count: usize,
    ) -> ObjectHandle {
        let obj = alloc(c"NSArray");
        if !obj.is_valid() {
            return obj;
        }
        msg_send::<MsgSendObjectsCount>()(obj, sel(c"initWithObjects:count:"), objects, count)
    }

    unsafe fn array_count(&self, array: ObjectHandle) -> usize {
        msg_send::<MsgSendUsize>()(array, sel(c"count"))
    }

    unsafe fn array_object_at(&self, array: ObjectHandle, index: usize) -> ObjectHandle {
        msg_send::<MsgSendIdAtIndex>()(array, sel(c"objectAtIndex:"), index)
    }

    unsafe fn string_from_utf8(&self, utf8: *const c_char) -> ObjectHandle {
        let obj = alloc(c"NSString");
        if !obj.is_valid() {
            return obj;
        }
        msg_send::<MsgSendCStr>()(obj, sel(c"initWithUTF8String:"), utf8)
    }

    unsafe fn string_to_utf8(&self, string: ObjectHandle) -> *const c_char {
        if !string.is_valid() {
            return std::ptr::null();
        }
        msg_send::<MsgSendToCStr>()(string, sel(c"UTF8String"))
    }

    unsafe fn null_placeholder(&self) -> ObjectHandle {
        let cls = raw::objc_getClass(c"NSNull".as_ptr());
        if !cls.is_valid() {
            return ObjectHandle::invalid();
        }
        msg_send::<MsgSendId>()(cls, sel(c"null"))
    }

    unsafe fn release(&self, object: ObjectHandle) {
        if object.is_valid() {
            msg_send::<MsgSendVoid>()(object, sel(c"release"));
        }
    }
}
