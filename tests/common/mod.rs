//! In-process stand-ins for the native frameworks.
//!
//! `FakeAudioToolbox` speaks the same C ABI as AudioToolbox: it stores the
//! callbacks and client data passed to open and invokes them synchronously
//! from `parse_bytes`, so the real trampolines run in tests.
//!
//! The fake file format is a 4-byte `FAKE` header followed by fixed 4-byte
//! packets. Each packet holds 2 frames of 16-bit mono audio.

#![allow(dead_code)]

use std::collections::HashMap;
use std::ffi::CString;
use std::mem::size_of;
use std::os::raw::{c_char, c_void};
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use afs::ffi::raw::{self, *};
use afs::ffi::{AudioFileStreamId, LocationApi, ObjectArrayApi, ObjectHandle, StreamApi};
use afs::{AudioFileStream, AudioFileType, PropertyId, StreamOptions};
use parking_lot::Mutex;

pub const HEADER: &[u8; 4] = b"FAKE";
pub const PACKET_SIZE: usize = 4;
pub const FRAMES_PER_PACKET: i64 = 2;
pub const SAMPLE_RATE: f64 = 44_100.0;
pub const BIT_RATE: u32 = 705_600;
pub const MAGIC_COOKIE: &[u8] = &[0xca, 0xfe, 0xf0, 0x0d, 0x01];
pub const DEFAULT_DATA_OFFSET: i64 = 4;

/// Open fails with `UnsupportedFileType` for this hint.
pub const REJECTED_HINT: AudioFileType = AudioFileType::Other(0x6261_6421); // 'bad!'
/// Open reports success without producing a handle for this hint.
pub const NULL_HANDLE_HINT: AudioFileType = AudioFileType::Other(0x6e75_6c6c); // 'null'

/// Install a test logger. Safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Header plus `packets` packets, packet `n` filled with byte `n`.
pub fn fake_file(packets: usize) -> Vec<u8> {
    let mut data = HEADER.to_vec();
    for n in 0..packets {
        data.extend(std::iter::repeat(n as u8).take(PACKET_SIZE));
    }
    data
}

/// Open a stream on a fresh fake, returning both.
pub fn open_stream() -> (Arc<FakeAudioToolbox>, AudioFileStream) {
    init_logging();
    let fake = FakeAudioToolbox::new();
    let stream = AudioFileStream::open_with(fake.clone(), StreamOptions::with_hint(AudioFileType::Mp3))
        .expect("open_with should succeed");
    (fake, stream)
}

#[derive(Clone, Copy)]
struct Callbacks {
    client_data: usize,
    property: AudioFileStreamPropertyListenerProc,
    packets: AudioFileStreamPacketsProc,
}

struct FakeStream {
    callbacks: Callbacks,
    hint: u32,
    ready: bool,
    pending: Vec<u8>,
    packets_emitted: i64,
    data_offset: i64,
    packet_table: AudioFilePacketTableInfo,
    cached: Vec<PropertyId>,
    parse_flags: Vec<u32>,
    format_list_padding: usize,
    closed: bool,
    close_calls: usize,
}

/// AudioToolbox stand-in.
pub struct FakeAudioToolbox {
    streams: Mutex<HashMap<usize, FakeStream>>,
    next_id: AtomicUsize,
    last_opened: Mutex<Option<AudioFileStreamId>>,
    fail_next_close: Mutex<bool>,
}

impl FakeAudioToolbox {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            streams: Mutex::new(HashMap::new()),
            next_id: AtomicUsize::new(0x1000),
            last_opened: Mutex::new(None),
            fail_next_close: Mutex::new(false),
        })
    }

    /// Handle produced by the most recent successful open.
    pub fn last_opened(&self) -> AudioFileStreamId {
        (*self.last_opened.lock()).expect("a stream should have been opened")
    }

    /// Number of times close was called for `id`.
    pub fn close_calls(&self, id: AudioFileStreamId) -> usize {
        self.streams
            .lock()
            .get(&id.as_raw())
            .map(|s| s.close_calls)
            .unwrap_or(0)
    }

    /// Number of streams opened and not yet closed.
    pub fn open_streams(&self) -> usize {
        self.streams.lock().values().filter(|s| !s.closed).count()
    }

    /// Properties a listener asked the parser to cache.
    pub fn cached_properties(&self, id: AudioFileStreamId) -> Vec<PropertyId> {
        self.streams
            .lock()
            .get(&id.as_raw())
            .map(|s| s.cached.clone())
            .unwrap_or_default()
    }

    /// Flags passed with every parse call.
    pub fn parse_flags(&self, id: AudioFileStreamId) -> Vec<u32> {
        self.streams
            .lock()
            .get(&id.as_raw())
            .map(|s| s.parse_flags.clone())
            .unwrap_or_default()
    }

    /// Append `bytes` stray bytes to the format list value.
    pub fn pad_format_list(&self, id: AudioFileStreamId, bytes: usize) {
        if let Some(s) = self.streams.lock().get_mut(&id.as_raw()) {
            s.format_list_padding = bytes;
        }
    }

    /// Make the next close report `UnspecifiedError`.
    pub fn fail_next_close(&self) {
        *self.fail_next_close.lock() = true;
    }

    /// Invoke the stored callbacks outside of a parse call, as the framework
    /// may from its own threads. Works after close too.
    pub fn fire_callbacks(&self, id: AudioFileStreamId) {
        let callbacks = match self.streams.lock().get(&id.as_raw()) {
            Some(s) => s.callbacks,
            None => return,
        };
        let client_data = callbacks.client_data as *mut c_void;
        let mut flags = 0u32;
        let data = [0u8; PACKET_SIZE];
        let mut desc = AudioStreamPacketDescription {
            m_start_offset: 0,
            m_variable_frames_in_packet: 0,
            m_data_byte_size: PACKET_SIZE as u32,
        };
        unsafe {
            (callbacks.property)(client_data, id, K_PROPERTY_DATA_FORMAT, &mut flags);
            (callbacks.packets)(
                client_data,
                PACKET_SIZE as u32,
                1,
                data.as_ptr().cast(),
                &mut desc,
            );
        }
    }
}

/// Size and writability of every property the fake knows.
fn property_shape(id: u32) -> Option<(usize, bool)> {
    let shape = match id {
        K_PROPERTY_READY_TO_PRODUCE_PACKETS => (size_of::<u32>(), false),
        K_PROPERTY_FILE_FORMAT => (size_of::<u32>(), false),
        K_PROPERTY_DATA_FORMAT => (size_of::<AudioStreamBasicDescription>(), false),
        K_PROPERTY_FORMAT_LIST => (2 * size_of::<AudioFormatListItem>(), false),
        K_PROPERTY_MAGIC_COOKIE_DATA => (MAGIC_COOKIE.len(), false),
        K_PROPERTY_AUDIO_DATA_BYTE_COUNT => (size_of::<u64>(), false),
        K_PROPERTY_AUDIO_DATA_PACKET_COUNT => (size_of::<u64>(), false),
        K_PROPERTY_MAXIMUM_PACKET_SIZE => (size_of::<u32>(), false),
        K_PROPERTY_DATA_OFFSET => (size_of::<i64>(), true),
        K_PROPERTY_CHANNEL_LAYOUT => (
            size_of::<AudioChannelLayoutHeader>() + 2 * size_of::<AudioChannelDescription>(),
            false,
        ),
        K_PROPERTY_PACKET_TO_FRAME | K_PROPERTY_FRAME_TO_PACKET => {
            (size_of::<AudioFramePacketTranslation>(), false)
        }
        K_PROPERTY_PACKET_TO_BYTE | K_PROPERTY_BYTE_TO_PACKET => {
            (size_of::<AudioBytePacketTranslation>(), false)
        }
        K_PROPERTY_PACKET_TABLE_INFO => (size_of::<AudioFilePacketTableInfo>(), true),
        K_PROPERTY_PACKET_SIZE_UPPER_BOUND => (size_of::<u32>(), false),
        K_PROPERTY_AVERAGE_BYTES_PER_PACKET => (size_of::<f64>(), false),
        K_PROPERTY_BIT_RATE => (size_of::<u32>(), false),
        _ => return None,
    };
    Some(shape)
}

pub fn fake_format() -> AudioStreamBasicDescription {
    AudioStreamBasicDescription {
        m_sample_rate: SAMPLE_RATE,
        m_format_id: u32::from_be_bytes(*b"lpcm"),
        m_format_flags: 0,
        m_bytes_per_packet: PACKET_SIZE as u32,
        m_frames_per_packet: FRAMES_PER_PACKET as u32,
        m_bytes_per_frame: 2,
        m_channels_per_frame: 1,
        m_bits_per_channel: 16,
        m_reserved: 0,
    }
}

fn bytes_of<T: Copy>(value: &T) -> Vec<u8> {
    unsafe { std::slice::from_raw_parts((value as *const T).cast::<u8>(), size_of::<T>()).to_vec() }
}

impl FakeStream {
    /// Size and writability, including injected padding.
    fn shape(&self, id: u32) -> Option<(usize, bool)> {
        let (size, writable) = property_shape(id)?;
        if id == K_PROPERTY_FORMAT_LIST {
            return Some((size + self.format_list_padding, writable));
        }
        Some((size, writable))
    }

    /// Current value of a property. `input` is the caller's buffer, read by
    /// translation properties.
    unsafe fn value(&self, id: u32, input: *const c_void) -> Result<Vec<u8>, OSStatus> {
        let is_estimate = |packet: i64| {
            if packet >= self.packets_emitted {
                K_BYTE_PACKET_TRANSLATION_FLAG_IS_ESTIMATE
            } else {
                0
            }
        };
        let value = match id {
            K_PROPERTY_READY_TO_PRODUCE_PACKETS => bytes_of(&(self.ready as u32)),
            K_PROPERTY_FILE_FORMAT => bytes_of(&self.hint),
            K_PROPERTY_DATA_FORMAT => {
                if !self.ready {
                    return Err(K_AUDIO_FILE_STREAM_ERR_DATA_UNAVAILABLE);
                }
                bytes_of(&fake_format())
            }
            K_PROPERTY_FORMAT_LIST => {
                let mut half = fake_format();
                half.m_sample_rate = SAMPLE_RATE / 2.0;
                let mut out = bytes_of(&AudioFormatListItem {
                    m_asbd: fake_format(),
                    m_channel_layout_tag: (100 << 16) | 1,
                });
                out.extend(bytes_of(&AudioFormatListItem {
                    m_asbd: half,
                    m_channel_layout_tag: (100 << 16) | 1,
                }));
                out.resize(out.len() + self.format_list_padding, 0);
                out
            }
            K_PROPERTY_MAGIC_COOKIE_DATA => MAGIC_COOKIE.to_vec(),
            K_PROPERTY_AUDIO_DATA_BYTE_COUNT => {
                bytes_of(&((self.packets_emitted as u64) * PACKET_SIZE as u64))
            }
            K_PROPERTY_AUDIO_DATA_PACKET_COUNT => bytes_of(&(self.packets_emitted as u64)),
            K_PROPERTY_MAXIMUM_PACKET_SIZE | K_PROPERTY_PACKET_SIZE_UPPER_BOUND => {
                bytes_of(&(PACKET_SIZE as u32))
            }
            K_PROPERTY_DATA_OFFSET => bytes_of(&self.data_offset),
            K_PROPERTY_CHANNEL_LAYOUT => {
                let mut out = bytes_of(&AudioChannelLayoutHeader {
                    m_channel_layout_tag: 0,
                    m_channel_bitmap: 0,
                    m_number_channel_descriptions: 2,
                });
                for label in [1u32, 2] {
                    out.extend(bytes_of(&AudioChannelDescription {
                        m_channel_label: label,
                        m_channel_flags: 0,
                        m_coordinates: [label as f32, 0.0, 0.0],
                    }));
                }
                out
            }
            K_PROPERTY_PACKET_TO_FRAME => {
                let mut t = ptr::read_unaligned(input.cast::<AudioFramePacketTranslation>());
                t.m_frame = t.m_packet * FRAMES_PER_PACKET;
                bytes_of(&t)
            }
            K_PROPERTY_FRAME_TO_PACKET => {
                let mut t = ptr::read_unaligned(input.cast::<AudioFramePacketTranslation>());
                t.m_packet = t.m_frame / FRAMES_PER_PACKET;
                t.m_frame_offset_in_packet = (t.m_frame % FRAMES_PER_PACKET) as u32;
                bytes_of(&t)
            }
            K_PROPERTY_PACKET_TO_BYTE => {
                let mut t = ptr::read_unaligned(input.cast::<AudioBytePacketTranslation>());
                t.m_byte = t.m_packet * PACKET_SIZE as i64;
                t.m_flags = is_estimate(t.m_packet);
                bytes_of(&t)
            }
            K_PROPERTY_BYTE_TO_PACKET => {
                let mut t = ptr::read_unaligned(input.cast::<AudioBytePacketTranslation>());
                t.m_packet = t.m_byte / PACKET_SIZE as i64;
                t.m_byte_offset_in_packet = (t.m_byte % PACKET_SIZE as i64) as u32;
                t.m_flags = is_estimate(t.m_packet);
                bytes_of(&t)
            }
            K_PROPERTY_PACKET_TABLE_INFO => bytes_of(&self.packet_table),
            K_PROPERTY_AVERAGE_BYTES_PER_PACKET => bytes_of(&(PACKET_SIZE as f64)),
            K_PROPERTY_BIT_RATE => bytes_of(&BIT_RATE),
            _ => return Err(K_AUDIO_FILE_STREAM_ERR_UNSUPPORTED_PROPERTY),
        };
        Ok(value)
    }
}

impl StreamApi for FakeAudioToolbox {
    unsafe fn open(
        &self,
        client_data: *mut c_void,
        property_listener_proc: AudioFileStreamPropertyListenerProc,
        packets_proc: AudioFileStreamPacketsProc,
        file_type_hint: AudioFileTypeId,
        out_stream: *mut AudioFileStreamId,
    ) -> OSStatus {
        if file_type_hint == u32::from(REJECTED_HINT) {
            return K_AUDIO_FILE_STREAM_ERR_UNSUPPORTED_FILE_TYPE;
        }
        if file_type_hint == u32::from(NULL_HANDLE_HINT) {
            return NO_ERR;
        }

        let id = AudioFileStreamId::from_raw(self.next_id.fetch_add(0x10, Ordering::Relaxed));
        self.streams.lock().insert(
            id.as_raw(),
            FakeStream {
                callbacks: Callbacks {
                    client_data: client_data as usize,
                    property: property_listener_proc,
                    packets: packets_proc,
                },
                hint: file_type_hint,
                ready: false,
                pending: Vec::new(),
                packets_emitted: 0,
                data_offset: DEFAULT_DATA_OFFSET,
                packet_table: AudioFilePacketTableInfo::default(),
                cached: Vec::new(),
                parse_flags: Vec::new(),
                format_list_padding: 0,
                closed: false,
                close_calls: 0,
            },
        );
        *self.last_opened.lock() = Some(id);
        *out_stream = id;
        NO_ERR
    }

    unsafe fn parse_bytes(
        &self,
        stream: AudioFileStreamId,
        data_byte_size: u32,
        data: *const c_void,
        flags: u32,
    ) -> OSStatus {
        let bytes = if data_byte_size == 0 {
            &[][..]
        } else {
            std::slice::from_raw_parts(data.cast::<u8>(), data_byte_size as usize)
        };

        // The lock is released before any callback runs: listeners re-enter
        // get_property.
        let (callbacks, found, chunk, mut descriptions) = {
            let mut streams = self.streams.lock();
            let Some(s) = streams.get_mut(&stream.as_raw()).filter(|s| !s.closed) else {
                return K_AUDIO_FILE_STREAM_ERR_UNSPECIFIED_ERROR;
            };
            s.parse_flags.push(flags);
            if flags & K_PARSE_FLAG_DISCONTINUITY != 0 {
                s.pending.clear();
            }
            s.pending.extend_from_slice(bytes);

            let mut found = Vec::new();
            if !s.ready {
                if s.pending.len() < HEADER.len() {
                    return NO_ERR;
                }
                if &s.pending[..HEADER.len()] != HEADER {
                    return K_AUDIO_FILE_STREAM_ERR_INVALID_FILE;
                }
                s.pending.drain(..HEADER.len());
                s.ready = true;
                found.push(K_PROPERTY_DATA_FORMAT);
                found.push(K_PROPERTY_READY_TO_PRODUCE_PACKETS);
            }

            let packets = s.pending.len() / PACKET_SIZE;
            let chunk: Vec<u8> = s.pending.drain(..packets * PACKET_SIZE).collect();
            let descriptions: Vec<AudioStreamPacketDescription> = (0..packets)
                .map(|i| AudioStreamPacketDescription {
                    m_start_offset: (i * PACKET_SIZE) as i64,
                    m_variable_frames_in_packet: 0,
                    m_data_byte_size: PACKET_SIZE as u32,
                })
                .collect();
            s.packets_emitted += packets as i64;
            (s.callbacks, found, chunk, descriptions)
        };

        let client_data = callbacks.client_data as *mut c_void;
        for property in found {
            let mut io_flags = 0u32;
            (callbacks.property)(client_data, stream, property, &mut io_flags);
            if io_flags & K_PROPERTY_FLAG_CACHE_PROPERTY != 0 {
                if let Some(s) = self.streams.lock().get_mut(&stream.as_raw()) {
                    s.cached.push(PropertyId(property));
                }
            }
        }

        if !chunk.is_empty() {
            (callbacks.packets)(
                client_data,
                chunk.len() as u32,
                descriptions.len() as u32,
                chunk.as_ptr().cast(),
                descriptions.as_mut_ptr(),
            );
        }
        NO_ERR
    }

    unsafe fn seek(
        &self,
        stream: AudioFileStreamId,
        packet_offset: i64,
        out_data_byte_offset: *mut i64,
        io_flags: *mut u32,
    ) -> OSStatus {
        let streams = self.streams.lock();
        let Some(s) = streams.get(&stream.as_raw()) else {
            return K_AUDIO_FILE_STREAM_ERR_UNSPECIFIED_ERROR;
        };
        if packet_offset < 0 {
            return K_AUDIO_FILE_STREAM_ERR_INVALID_PACKET_OFFSET;
        }
        *out_data_byte_offset = packet_offset * PACKET_SIZE as i64;
        *io_flags = if packet_offset >= s.packets_emitted {
            K_SEEK_FLAG_OFFSET_IS_ESTIMATED
        } else {
            0
        };
        NO_ERR
    }

    unsafe fn get_property_info(
        &self,
        stream: AudioFileStreamId,
        property_id: AudioFileStreamPropertyId,
        out_property_data_size: *mut u32,
        out_writable: *mut Boolean,
    ) -> OSStatus {
        let streams = self.streams.lock();
        let Some(s) = streams.get(&stream.as_raw()) else {
            return K_AUDIO_FILE_STREAM_ERR_UNSPECIFIED_ERROR;
        };
        let Some((size, writable)) = s.shape(property_id) else {
            return K_AUDIO_FILE_STREAM_ERR_UNSUPPORTED_PROPERTY;
        };
        *out_property_data_size = size as u32;
        *out_writable = writable as Boolean;
        NO_ERR
    }

    unsafe fn get_property(
        &self,
        stream: AudioFileStreamId,
        property_id: AudioFileStreamPropertyId,
        io_property_data_size: *mut u32,
        out_property_data: *mut c_void,
    ) -> OSStatus {
        let streams = self.streams.lock();
        let Some(s) = streams.get(&stream.as_raw()) else {
            return K_AUDIO_FILE_STREAM_ERR_UNSPECIFIED_ERROR;
        };
        let Some((size, _)) = s.shape(property_id) else {
            return K_AUDIO_FILE_STREAM_ERR_UNSUPPORTED_PROPERTY;
        };
        if (*io_property_data_size as usize) < size {
            return K_AUDIO_FILE_STREAM_ERR_BAD_PROPERTY_SIZE;
        }
        let value = match s.value(property_id, out_property_data) {
            Ok(value) => value,
            Err(code) => return code,
        };
        ptr::copy_nonoverlapping(value.as_ptr(), out_property_data.cast::<u8>(), value.len());
        *io_property_data_size = value.len() as u32;
        NO_ERR
    }

    unsafe fn set_property(
        &self,
        stream: AudioFileStreamId,
        property_id: AudioFileStreamPropertyId,
        property_data_size: u32,
        property_data: *const c_void,
    ) -> OSStatus {
        let mut streams = self.streams.lock();
        let Some(s) = streams.get_mut(&stream.as_raw()) else {
            return K_AUDIO_FILE_STREAM_ERR_UNSPECIFIED_ERROR;
        };
        let Some((size, writable)) = property_shape(property_id) else {
            return K_AUDIO_FILE_STREAM_ERR_UNSUPPORTED_PROPERTY;
        };
        if !writable {
            return K_AUDIO_FILE_STREAM_ERR_ILLEGAL_OPERATION;
        }
        if property_data_size as usize != size {
            return K_AUDIO_FILE_STREAM_ERR_BAD_PROPERTY_SIZE;
        }
        match property_id {
            K_PROPERTY_DATA_OFFSET => {
                s.data_offset = ptr::read_unaligned(property_data.cast::<i64>());
            }
            K_PROPERTY_PACKET_TABLE_INFO => {
                s.packet_table = ptr::read_unaligned(property_data.cast());
            }
            _ => return K_AUDIO_FILE_STREAM_ERR_ILLEGAL_OPERATION,
        }
        NO_ERR
    }

    unsafe fn close(&self, stream: AudioFileStreamId) -> OSStatus {
        let mut streams = self.streams.lock();
        let Some(s) = streams.get_mut(&stream.as_raw()) else {
            return K_AUDIO_FILE_STREAM_ERR_UNSPECIFIED_ERROR;
        };
        s.close_calls += 1;
        s.closed = true;
        if std::mem::take(&mut *self.fail_next_close.lock()) {
            return K_AUDIO_FILE_STREAM_ERR_UNSPECIFIED_ERROR;
        }
        NO_ERR
    }
}

/// CoreLocation stand-in with the framework's range checks.
pub struct FakeCoreLocation;

impl LocationApi for FakeCoreLocation {
    fn coordinate_is_valid(&self, coord: raw::CLLocationCoordinate2D) -> bool {
        (-90.0..=90.0).contains(&coord.latitude) && (-180.0..=180.0).contains(&coord.longitude)
    }
}

enum FakeObject {
    String(CString),
    Array(Vec<ObjectHandle>),
}

struct Entry {
    refs: usize,
    object: FakeObject,
}

/// The `NSNull` singleton. Not reference counted.
pub const NULL_PLACEHOLDER: ObjectHandle = ObjectHandle::from_raw(0x10);

/// Foundation stand-in with reference counting. Arrays retain their
/// elements, as `NSArray` does.
pub struct FakeFoundation {
    objects: Mutex<HashMap<usize, Entry>>,
    next: AtomicUsize,
    bad_releases: AtomicUsize,
    nil_insertions: AtomicUsize,
}

impl FakeFoundation {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            next: AtomicUsize::new(0x8000),
            bad_releases: AtomicUsize::new(0),
            nil_insertions: AtomicUsize::new(0),
        }
    }

    fn insert(&self, object: FakeObject) -> ObjectHandle {
        let handle = self.next.fetch_add(0x10, Ordering::Relaxed);
        self.objects.lock().insert(handle, Entry { refs: 1, object });
        ObjectHandle::from_raw(handle)
    }

    /// Create a +1 string.
    pub fn make_string(&self, s: &str) -> ObjectHandle {
        self.insert(FakeObject::String(
            CString::new(s).expect("test strings have no NUL"),
        ))
    }

    /// Retain count of a live object, 0 once it is gone.
    pub fn ref_count(&self, handle: ObjectHandle) -> usize {
        self.objects
            .lock()
            .get(&handle.as_raw())
            .map(|e| e.refs)
            .unwrap_or(0)
    }

    /// Number of objects still alive.
    pub fn live_objects(&self) -> usize {
        self.objects.lock().len()
    }

    /// Releases of objects that were not alive.
    pub fn bad_releases(&self) -> usize {
        self.bad_releases.load(Ordering::Relaxed)
    }

    /// Arrays built with a nil element. `NSArray` raises on these.
    pub fn nil_insertions(&self) -> usize {
        self.nil_insertions.load(Ordering::Relaxed)
    }

    fn release_handle(&self, handle: ObjectHandle) {
        if handle == NULL_PLACEHOLDER {
            return;
        }
        let released = {
            let mut objects = self.objects.lock();
            let Some(entry) = objects.get_mut(&handle.as_raw()) else {
                self.bad_releases.fetch_add(1, Ordering::Relaxed);
                return;
            };
            entry.refs -= 1;
            if entry.refs > 0 {
                return;
            }
            objects.remove(&handle.as_raw())
        };
        if let Some(Entry {
            object: FakeObject::Array(elements),
            ..
        }) = released
        {
            for element in elements.into_iter().filter(ObjectHandle::is_valid) {
                self.release_handle(element);
            }
        }
    }
}

impl ObjectArrayApi for FakeFoundation {
    unsafe fn array_from_objects(&self, objects: *const ObjectHandle, count: usize) -> ObjectHandle {
        let elements = if count == 0 {
            Vec::new()
        } else {
            std::slice::from_raw_parts(objects, count).to_vec()
        };
        if elements.iter().any(|e| !e.is_valid()) {
            self.nil_insertions.fetch_add(1, Ordering::Relaxed);
        }
        {
            let mut live = self.objects.lock();
            for element in elements.iter().filter(|e| e.is_valid()) {
                if let Some(entry) = live.get_mut(&element.as_raw()) {
                    entry.refs += 1;
                }
            }
        }
        self.insert(FakeObject::Array(elements))
    }

    unsafe fn array_count(&self, array: ObjectHandle) -> usize {
        match self.objects.lock().get(&array.as_raw()) {
            Some(Entry {
                object: FakeObject::Array(elements),
                ..
            }) => elements.len(),
            _ => 0,
        }
    }

    unsafe fn array_object_at(&self, array: ObjectHandle, index: usize) -> ObjectHandle {
        match self.objects.lock().get(&array.as_raw()) {
            Some(Entry {
                object: FakeObject::Array(elements),
                ..
            }) => elements.get(index).copied().unwrap_or_default(),
            _ => ObjectHandle::invalid(),
        }
    }

    unsafe fn string_from_utf8(&self, utf8: *const c_char) -> ObjectHandle {
        self.insert(FakeObject::String(std::ffi::CStr::from_ptr(utf8).to_owned()))
    }

    unsafe fn string_to_utf8(&self, string: ObjectHandle) -> *const c_char {
        // The CString's heap buffer stays put while the entry is alive
        match self.objects.lock().get(&string.as_raw()) {
            Some(Entry {
                object: FakeObject::String(s),
                ..
            }) => s.as_ptr(),
            _ => ptr::null(),
        }
    }

    unsafe fn null_placeholder(&self) -> ObjectHandle {
        NULL_PLACEHOLDER
    }

    unsafe fn release(&self, object: ObjectHandle) {
        self.release_handle(object);
    }
}
