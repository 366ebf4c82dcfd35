//! Raw C declarations for the bound frameworks.
//!
//! Constants, `#[repr(C)]` layouts and callback signatures match the
//! AudioToolbox, CoreLocation and Foundation headers bit for bit.
//! Users should prefer the safe Rust wrappers in the parent modules.

use std::os::raw::c_void;

use super::handles::*;

/// Status code returned by the native entry points.
pub type OSStatus = i32;

/// Four-character-code property identifier.
pub type AudioFileStreamPropertyId = u32;

/// Four-character-code file type identifier.
pub type AudioFileTypeId = u32;

/// Core Foundation boolean (`unsigned char`).
pub type Boolean = u8;

// Status codes
pub const NO_ERR: OSStatus = 0;
pub const K_AUDIO_FILE_STREAM_ERR_UNSUPPORTED_FILE_TYPE: OSStatus = 0x7479703f; // 'typ?'
pub const K_AUDIO_FILE_STREAM_ERR_UNSUPPORTED_DATA_FORMAT: OSStatus = 0x666d743f; // 'fmt?'
pub const K_AUDIO_FILE_STREAM_ERR_UNSUPPORTED_PROPERTY: OSStatus = 0x7074793f; // 'pty?'
pub const K_AUDIO_FILE_STREAM_ERR_BAD_PROPERTY_SIZE: OSStatus = 0x2173697a; // '!siz'
pub const K_AUDIO_FILE_STREAM_ERR_NOT_OPTIMIZED: OSStatus = 0x6f70746d; // 'optm'
pub const K_AUDIO_FILE_STREAM_ERR_INVALID_PACKET_OFFSET: OSStatus = 0x70636b3f; // 'pck?'
pub const K_AUDIO_FILE_STREAM_ERR_INVALID_FILE: OSStatus = 0x6474613f; // 'dta?'
pub const K_AUDIO_FILE_STREAM_ERR_VALUE_UNKNOWN: OSStatus = 0x756e6b3f; // 'unk?'
pub const K_AUDIO_FILE_STREAM_ERR_DATA_UNAVAILABLE: OSStatus = 0x6d6f7265; // 'more'
pub const K_AUDIO_FILE_STREAM_ERR_ILLEGAL_OPERATION: OSStatus = 0x6e6f7065; // 'nope'
pub const K_AUDIO_FILE_STREAM_ERR_UNSPECIFIED_ERROR: OSStatus = 0x7768743f; // 'wht?'
pub const K_AUDIO_FILE_STREAM_ERR_DISCONTINUITY_CANT_RECOVER: OSStatus = 0x64736321; // 'dsc!'

// Property identifiers
pub const K_PROPERTY_READY_TO_PRODUCE_PACKETS: AudioFileStreamPropertyId = 0x72656479; // 'redy'
pub const K_PROPERTY_FILE_FORMAT: AudioFileStreamPropertyId = 0x66666d74; // 'ffmt'
pub const K_PROPERTY_DATA_FORMAT: AudioFileStreamPropertyId = 0x64666d74; // 'dfmt'
pub const K_PROPERTY_FORMAT_LIST: AudioFileStreamPropertyId = 0x666c7374; // 'flst'
pub const K_PROPERTY_MAGIC_COOKIE_DATA: AudioFileStreamPropertyId = 0x6d676963; // 'mgic'
pub const K_PROPERTY_AUDIO_DATA_BYTE_COUNT: AudioFileStreamPropertyId = 0x62636e74; // 'bcnt'
pub const K_PROPERTY_AUDIO_DATA_PACKET_COUNT: AudioFileStreamPropertyId = 0x70636e74; // 'pcnt'
pub const K_PROPERTY_MAXIMUM_PACKET_SIZE: AudioFileStreamPropertyId = 0x70737a65; // 'psze'
pub const K_PROPERTY_DATA_OFFSET: AudioFileStreamPropertyId = 0x646f6666; // 'doff'
pub const K_PROPERTY_CHANNEL_LAYOUT: AudioFileStreamPropertyId = 0x636d6170; // 'cmap'
pub const K_PROPERTY_PACKET_TO_FRAME: AudioFileStreamPropertyId = 0x706b6672; // 'pkfr'
pub const K_PROPERTY_FRAME_TO_PACKET: AudioFileStreamPropertyId = 0x6672706b; // 'frpk'
pub const K_PROPERTY_PACKET_TO_BYTE: AudioFileStreamPropertyId = 0x706b6279; // 'pkby'
pub const K_PROPERTY_BYTE_TO_PACKET: AudioFileStreamPropertyId = 0x6279706b; // 'bypk'
pub const K_PROPERTY_PACKET_TABLE_INFO: AudioFileStreamPropertyId = 0x706e666f; // 'pnfo'
pub const K_PROPERTY_PACKET_SIZE_UPPER_BOUND: AudioFileStreamPropertyId = 0x706b7562; // 'pkub'
pub const K_PROPERTY_AVERAGE_BYTES_PER_PACKET: AudioFileStreamPropertyId = 0x61627070; // 'abpp'
pub const K_PROPERTY_BIT_RATE: AudioFileStreamPropertyId = 0x62726174; // 'brat'

// Property flags (AudioFileStreamPropertyFlags)
pub const K_PROPERTY_FLAG_PROPERTY_IS_CACHED: u32 = 1;
pub const K_PROPERTY_FLAG_CACHE_PROPERTY: u32 = 2;

// Parse flags (AudioFileStreamParseFlags)
pub const K_PARSE_FLAG_DISCONTINUITY: u32 = 1;

// Seek flags (AudioFileStreamSeekFlags)
pub const K_SEEK_FLAG_OFFSET_IS_ESTIMATED: u32 = 1;

// Byte/packet translation flags
pub const K_BYTE_PACKET_TRANSLATION_FLAG_IS_ESTIMATE: u32 = 1;

/// AudioStreamBasicDescription.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AudioStreamBasicDescription {
    pub m_sample_rate: f64,
    pub m_format_id: u32,
    pub m_format_flags: u32,
    pub m_bytes_per_packet: u32,
    pub m_frames_per_packet: u32,
    pub m_bytes_per_frame: u32,
    pub m_channels_per_frame: u32,
    pub m_bits_per_channel: u32,
    pub m_reserved: u32,
}

/// AudioStreamPacketDescription.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AudioStreamPacketDescription {
    pub m_start_offset: i64,
    pub m_variable_frames_in_packet: u32,
    pub m_data_byte_size: u32,
}

/// AudioFramePacketTranslation.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AudioFramePacketTranslation {
    pub m_frame: i64,
    pub m_packet: i64,
    pub m_frame_offset_in_packet: u32,
}

/// AudioBytePacketTranslation.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AudioBytePacketTranslation {
    pub m_byte: i64,
    pub m_packet: i64,
    pub m_byte_offset_in_packet: u32,
    pub m_flags: u32,
}

/// AudioFilePacketTableInfo.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AudioFilePacketTableInfo {
    pub m_number_valid_frames: i64,
    pub m_priming_frames: i32,
    pub m_remainder_frames: i32,
}

/// AudioFormatListItem.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AudioFormatListItem {
    pub m_asbd: AudioStreamBasicDescription,
    pub m_channel_layout_tag: u32,
}

/// AudioChannelDescription.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AudioChannelDescription {
    pub m_channel_label: u32,
    pub m_channel_flags: u32,
    pub m_coordinates: [f32; 3],
}

/// Fixed header of AudioChannelLayout.
///
/// The native struct declares a one-element trailing array; the descriptions
/// follow the header directly, `m_number_channel_descriptions` of them.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AudioChannelLayoutHeader {
    pub m_channel_layout_tag: u32,
    pub m_channel_bitmap: u32,
    pub m_number_channel_descriptions: u32,
}

/// CLLocationCoordinate2D.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CLLocationCoordinate2D {
    pub latitude: f64,
    pub longitude: f64,
}

/// Property listener callback (`AudioFileStream_PropertyListenerProc`).
pub type AudioFileStreamPropertyListenerProc = unsafe extern "C" fn(
    client_data: *mut c_void,
    stream: AudioFileStreamId,
    property_id: AudioFileStreamPropertyId,
    io_flags: *mut u32,
);

/// Packets callback (`AudioFileStream_PacketsProc`).
pub type AudioFileStreamPacketsProc = unsafe extern "C" fn(
    client_data: *mut c_void,
    number_bytes: u32,
    number_packets: u32,
    input_data: *const c_void,
    packet_descriptions: *mut AudioStreamPacketDescription,
);

#[cfg(target_vendor = "apple")]
extern "C" {
    // AudioToolbox
    pub fn AudioFileStreamOpen(
        client_data: *mut c_void,
        property_listener_proc: AudioFileStreamPropertyListenerProc,
        packets_proc: AudioFileStreamPacketsProc,
        file_type_hint: AudioFileTypeId,
        out_stream: *mut AudioFileStreamId,
    ) -> OSStatus;
    pub fn AudioFileStreamParseBytes(
        stream: AudioFileStreamId,
        data_byte_size: u32,
        data: *const c_void,
        flags: u32,
    ) -> OSStatus;
    pub fn AudioFileStreamSeek(
        stream: AudioFileStreamId,
        packet_offset: i64,
        out_data_byte_offset: *mut i64,
        io_flags: *mut u32,
    ) -> OSStatus;
    pub fn AudioFileStreamGetPropertyInfo(
        stream: AudioFileStreamId,
        property_id: AudioFileStreamPropertyId,
        out_property_data_size: *mut u32,
        out_writable: *mut Boolean,
    ) -> OSStatus;
    pub fn AudioFileStreamGetProperty(
        stream: AudioFileStreamId,
        property_id: AudioFileStreamPropertyId,
        io_property_data_size: *mut u32,
        out_property_data: *mut c_void,
    ) -> OSStatus;
    pub fn AudioFileStreamSetProperty(
        stream: AudioFileStreamId,
        property_id: AudioFileStreamPropertyId,
        property_data_size: u32,
        property_data: *const c_void,
    ) -> OSStatus;
    pub fn AudioFileStreamClose(stream: AudioFileStreamId) -> OSStatus;

    // CoreLocation
    pub fn CLLocationCoordinate2DIsValid(coord: CLLocationCoordinate2D) -> i8;

    // Objective-C runtime
    pub fn objc_getClass(name: *const std::os::raw::c_char) -> ObjectHandle;
    pub fn sel_registerName(name: *const std::os::raw::c_char) -> Selector;
    pub fn objc_msgSend();
}

/// Objective-C selector.
pub type Selector = *const c_void;
