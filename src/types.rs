//! Type definitions and enums.

use std::fmt;

use bitflags::bitflags;

use crate::ffi::raw;

/// Display adapter for a 32-bit four-character code.
///
/// Printable codes render as `'dfmt'`, anything else as hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCC(pub u32);

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0.to_be_bytes();
        if bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            write!(f, "'")?;
            for b in bytes {
                write!(f, "{}", b as char)?;
            }
            write!(f, "'")
        } else {
            write!(f, "{:#010x}", self.0)
        }
    }
}

/// Status reported by the audio file stream entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamStatus {
    /// Success.
    Ok,
    /// The file type is not supported.
    UnsupportedFileType,
    /// The data format is not supported by this file type.
    UnsupportedDataFormat,
    /// The property is not supported.
    UnsupportedProperty,
    /// The size of the property data was not correct.
    BadPropertySize,
    /// Packets exist after the audio data; seeking requires more reads.
    NotOptimized,
    /// A packet offset was less than zero or past the end of the file.
    InvalidPacketOffset,
    /// The file is malformed or not an instance of its declared type.
    InvalidFile,
    /// The property value is not present in this file before the audio data.
    ValueUnknown,
    /// More data is needed before the request can be answered.
    DataUnavailable,
    /// The operation is not allowed, e.g. writing a read-only property.
    IllegalOperation,
    /// An unspecified error occurred.
    UnspecifiedError,
    /// A discontinuity occurred the parser cannot recover from.
    DiscontinuityCantRecover,
    /// Any status not listed above.
    Other(i32),
}

impl StreamStatus {
    /// Check if this status reports success.
    pub fn is_ok(&self) -> bool {
        matches!(self, StreamStatus::Ok)
    }
}

impl From<i32> for StreamStatus {
    fn from(code: i32) -> Self {
        match code {
            raw::NO_ERR => StreamStatus::Ok,
            raw::K_AUDIO_FILE_STREAM_ERR_UNSUPPORTED_FILE_TYPE => StreamStatus::UnsupportedFileType,
            raw::K_AUDIO_FILE_STREAM_ERR_UNSUPPORTED_DATA_FORMAT => {
                StreamStatus::UnsupportedDataFormat
            }
            raw::K_AUDIO_FILE_STREAM_ERR_UNSUPPORTED_PROPERTY => StreamStatus::UnsupportedProperty,
            raw::K_AUDIO_FILE_STREAM_ERR_BAD_PROPERTY_SIZE => StreamStatus::BadPropertySize,
            raw::K_AUDIO_FILE_STREAM_ERR_NOT_OPTIMIZED => StreamStatus::NotOptimized,
            raw::K_AUDIO_FILE_STREAM_ERR_INVALID_PACKET_OFFSET => StreamStatus::InvalidPacketOffset,
            raw::K_AUDIO_FILE_STREAM_ERR_INVALID_FILE => StreamStatus::InvalidFile,
            raw::K_AUDIO_FILE_STREAM_ERR_VALUE_UNKNOWN => StreamStatus::ValueUnknown,
            raw::K_AUDIO_FILE_STREAM_ERR_DATA_UNAVAILABLE => StreamStatus::DataUnavailable,
            raw::K_AUDIO_FILE_STREAM_ERR_ILLEGAL_OPERATION => StreamStatus::IllegalOperation,
            raw::K_AUDIO_FILE_STREAM_ERR_UNSPECIFIED_ERROR => StreamStatus::UnspecifiedError,
            raw::K_AUDIO_FILE_STREAM_ERR_DISCONTINUITY_CANT_RECOVER => {
                StreamStatus::DiscontinuityCantRecover
            }
            other => StreamStatus::Other(other),
        }
    }
}

impl From<StreamStatus> for i32 {
    fn from(status: StreamStatus) -> i32 {
        match status {
            StreamStatus::Ok => raw::NO_ERR,
            StreamStatus::UnsupportedFileType => raw::K_AUDIO_FILE_STREAM_ERR_UNSUPPORTED_FILE_TYPE,
            StreamStatus::UnsupportedDataFormat => {
                raw::K_AUDIO_FILE_STREAM_ERR_UNSUPPORTED_DATA_FORMAT
            }
            StreamStatus::UnsupportedProperty => raw::K_AUDIO_FILE_STREAM_ERR_UNSUPPORTED_PROPERTY,
            StreamStatus::BadPropertySize => raw::K_AUDIO_FILE_STREAM_ERR_BAD_PROPERTY_SIZE,
            StreamStatus::NotOptimized => raw::K_AUDIO_FILE_STREAM_ERR_NOT_OPTIMIZED,
            StreamStatus::InvalidPacketOffset => raw::K_AUDIO_FILE_STREAM_ERR_INVALID_PACKET_OFFSET,
            StreamStatus::InvalidFile => raw::K_AUDIO_FILE_STREAM_ERR_INVALID_FILE,
            StreamStatus::ValueUnknown => raw::K_AUDIO_FILE_STREAM_ERR_VALUE_UNKNOWN,
            StreamStatus::DataUnavailable => raw::K_AUDIO_FILE_STREAM_ERR_DATA_UNAVAILABLE,
            StreamStatus::IllegalOperation => raw::K_AUDIO_FILE_STREAM_ERR_ILLEGAL_OPERATION,
            StreamStatus::UnspecifiedError => raw::K_AUDIO_FILE_STREAM_ERR_UNSPECIFIED_ERROR,
            StreamStatus::DiscontinuityCantRecover => {
                raw::K_AUDIO_FILE_STREAM_ERR_DISCONTINUITY_CANT_RECOVER
            }
            StreamStatus::Other(code) => code,
        }
    }
}

impl fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = i32::from(*self);
        match self {
            StreamStatus::Other(_) => write!(f, "status {}", FourCC(code as u32)),
            named => write!(f, "{:?} ({})", named, FourCC(code as u32)),
        }
    }
}

/// Identifier of a queryable audio file stream property.
///
/// A newtype rather than an enum so codes unknown to this crate (reported by
/// newer framework versions through the property listener) survive intact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyId(pub u32);

impl PropertyId {
    pub const READY_TO_PRODUCE_PACKETS: Self = Self(raw::K_PROPERTY_READY_TO_PRODUCE_PACKETS);
    pub const FILE_FORMAT: Self = Self(raw::K_PROPERTY_FILE_FORMAT);
    pub const DATA_FORMAT: Self = Self(raw::K_PROPERTY_DATA_FORMAT);
    pub const FORMAT_LIST: Self = Self(raw::K_PROPERTY_FORMAT_LIST);
    pub const MAGIC_COOKIE_DATA: Self = Self(raw::K_PROPERTY_MAGIC_COOKIE_DATA);
    pub const AUDIO_DATA_BYTE_COUNT: Self = Self(raw::K_PROPERTY_AUDIO_DATA_BYTE_COUNT);
    pub const AUDIO_DATA_PACKET_COUNT: Self = Self(raw::K_PROPERTY_AUDIO_DATA_PACKET_COUNT);
    pub const MAXIMUM_PACKET_SIZE: Self = Self(raw::K_PROPERTY_MAXIMUM_PACKET_SIZE);
    pub const DATA_OFFSET: Self = Self(raw::K_PROPERTY_DATA_OFFSET);
    pub const CHANNEL_LAYOUT: Self = Self(raw::K_PROPERTY_CHANNEL_LAYOUT);
    pub const PACKET_TO_FRAME: Self = Self(raw::K_PROPERTY_PACKET_TO_FRAME);
    pub const FRAME_TO_PACKET: Self = Self(raw::K_PROPERTY_FRAME_TO_PACKET);
    pub const PACKET_TO_BYTE: Self = Self(raw::K_PROPERTY_PACKET_TO_BYTE);
    pub const BYTE_TO_PACKET: Self = Self(raw::K_PROPERTY_BYTE_TO_PACKET);
    pub const PACKET_TABLE_INFO: Self = Self(raw::K_PROPERTY_PACKET_TABLE_INFO);
    pub const PACKET_SIZE_UPPER_BOUND: Self = Self(raw::K_PROPERTY_PACKET_SIZE_UPPER_BOUND);
    pub const AVERAGE_BYTES_PER_PACKET: Self = Self(raw::K_PROPERTY_AVERAGE_BYTES_PER_PACKET);
    pub const BIT_RATE: Self = Self(raw::K_PROPERTY_BIT_RATE);

    /// Get the raw four-character code.
    pub const fn code(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", FourCC(self.0))
    }
}

bitflags! {
    /// Flags exchanged with the property listener.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PropertyFlags: u32 {
        /// The parser has cached the property value.
        const PROPERTY_IS_CACHED = raw::K_PROPERTY_FLAG_PROPERTY_IS_CACHED;
        /// Set by a listener to ask the parser to cache the value.
        const CACHE_PROPERTY = raw::K_PROPERTY_FLAG_CACHE_PROPERTY;
    }
}

bitflags! {
    /// Flags passed with each chunk of bytes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ParseFlags: u32 {
        /// The chunk does not follow the previous one.
        const DISCONTINUITY = raw::K_PARSE_FLAG_DISCONTINUITY;
    }
}

bitflags! {
    /// Flags returned by a seek.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SeekFlags: u32 {
        /// The returned byte offset is an estimate.
        const OFFSET_IS_ESTIMATED = raw::K_SEEK_FLAG_OFFSET_IS_ESTIMATED;
    }
}

/// Audio file type hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AudioFileType {
    /// No hint; let the parser sniff the data.
    #[default]
    Unknown,
    Aiff,
    Aifc,
    Wave,
    SoundDesigner2,
    Next,
    Mp3,
    Mp2,
    Mp1,
    Ac3,
    AacAdts,
    Mpeg4,
    M4a,
    M4b,
    Caf,
    ThreeGp,
    ThreeGp2,
    Amr,
    /// Any code not listed above.
    Other(u32),
}

impl AudioFileType {
    const CODES: &'static [(AudioFileType, &'static [u8; 4])] = &[
        (AudioFileType::Aiff, b"AIFF"),
        (AudioFileType::Aifc, b"AIFC"),
        (AudioFileType::Wave, b"WAVE"),
        (AudioFileType::SoundDesigner2, b"Sd2f"),
        (AudioFileType::Next, b"NeXT"),
        (AudioFileType::Mp3, b"MPG3"),
        (AudioFileType::Mp2, b"MPG2"),
        (AudioFileType::Mp1, b"MPG1"),
        (AudioFileType::Ac3, b"ac-3"),
        (AudioFileType::AacAdts, b"adts"),
        (AudioFileType::Mpeg4, b"mp4f"),
        (AudioFileType::M4a, b"m4af"),
        (AudioFileType::M4b, b"m4bf"),
        (AudioFileType::Caf, b"caff"),
        (AudioFileType::ThreeGp, b"3gpp"),
        (AudioFileType::ThreeGp2, b"3gp2"),
        (AudioFileType::Amr, b"amrf"),
    ];
}

impl From<AudioFileType> for u32 {
    fn from(ty: AudioFileType) -> u32 {
        match ty {
            AudioFileType::Unknown => 0,
            AudioFileType::Other(code) => code,
            known => AudioFileType::CODES
                .iter()
                .find(|(t, _)| *t == known)
                .map(|(_, code)| u32::from_be_bytes(**code))
                .unwrap_or(0),
        }
    }
}

impl From<u32> for AudioFileType {
    fn from(code: u32) -> Self {
        if code == 0 {
            return AudioFileType::Unknown;
        }
        AudioFileType::CODES
            .iter()
            .find(|(_, c)| u32::from_be_bytes(**c) == code)
            .map(|(t, _)| *t)
            .unwrap_or(AudioFileType::Other(code))
    }
}

/// Options for opening an audio file stream.
#[derive(Debug, Clone, Default)]
pub struct StreamOptions {
    /// Hint for the file type of the data to be parsed.
    pub file_type_hint: AudioFileType,
}

impl StreamOptions {
    /// Options with the given file type hint.
    pub fn with_hint(file_type_hint: AudioFileType) -> Self {
        Self { file_type_hint }
    }
}

/// Outcome of a packet seek.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekResult {
    /// Byte offset of the packet within the audio data.
    pub byte_offset: i64,
    /// True if the offset is an estimate.
    pub is_estimate: bool,
}

/// Outcome of a frame to packet translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePosition {
    /// Packet containing the frame.
    pub packet: i64,
    /// Frame offset within that packet.
    pub frame_offset_in_packet: u32,
}

/// Outcome of a packet to byte translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteOffset {
    /// Byte offset of the packet.
    pub byte: i64,
    /// True if the offset is an estimate.
    pub is_estimate: bool,
}

/// Outcome of a byte to packet translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketPosition {
    /// Packet containing the byte.
    pub packet: i64,
    /// Byte offset within that packet.
    pub byte_offset_in_packet: u32,
    /// True if the packet is an estimate.
    pub is_estimate: bool,
}

/// Description of a linear or compressed audio stream.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StreamBasicDescription {
    pub sample_rate: f64,
    pub format_id: u32,
    pub format_flags: u32,
    pub bytes_per_packet: u32,
    pub frames_per_packet: u32,
    pub bytes_per_frame: u32,
    pub channels_per_frame: u32,
    pub bits_per_channel: u32,
}

impl From<raw::AudioStreamBasicDescription> for StreamBasicDescription {
    fn from(asbd: raw::AudioStreamBasicDescription) -> Self {
        Self {
            sample_rate: asbd.m_sample_rate,
            format_id: asbd.m_format_id,
            format_flags: asbd.m_format_flags,
            bytes_per_packet: asbd.m_bytes_per_packet,
            frames_per_packet: asbd.m_frames_per_packet,
            bytes_per_frame: asbd.m_bytes_per_frame,
            channels_per_frame: asbd.m_channels_per_frame,
            bits_per_channel: asbd.m_bits_per_channel,
        }
    }
}

/// One packet inside a decoded chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PacketDescription {
    /// Byte offset of the packet inside the chunk.
    pub start_offset: i64,
    /// Frames in the packet, zero for constant frame counts.
    pub variable_frames_in_packet: u32,
    /// Size of the packet in bytes.
    pub data_byte_size: u32,
}

impl From<raw::AudioStreamPacketDescription> for PacketDescription {
    fn from(desc: raw::AudioStreamPacketDescription) -> Self {
        Self {
            start_offset: desc.m_start_offset,
            variable_frames_in_packet: desc.m_variable_frames_in_packet,
            data_byte_size: desc.m_data_byte_size,
        }
    }
}

/// Priming and remainder frames of an encoded stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PacketTableInfo {
    pub number_valid_frames: i64,
    pub priming_frames: i32,
    pub remainder_frames: i32,
}

impl From<raw::AudioFilePacketTableInfo> for PacketTableInfo {
    fn from(info: raw::AudioFilePacketTableInfo) -> Self {
        Self {
            number_valid_frames: info.m_number_valid_frames,
            priming_frames: info.m_priming_frames,
            remainder_frames: info.m_remainder_frames,
        }
    }
}

impl From<PacketTableInfo> for raw::AudioFilePacketTableInfo {
    fn from(info: PacketTableInfo) -> Self {
        Self {
            m_number_valid_frames: info.number_valid_frames,
            m_priming_frames: info.priming_frames,
            m_remainder_frames: info.remainder_frames,
        }
    }
}

/// One entry of the stream's format list.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FormatListItem {
    pub format: StreamBasicDescription,
    pub channel_layout_tag: u32,
}

impl From<raw::AudioFormatListItem> for FormatListItem {
    fn from(item: raw::AudioFormatListItem) -> Self {
        Self {
            format: item.m_asbd.into(),
            channel_layout_tag: item.m_channel_layout_tag,
        }
    }
}

/// Position and role of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChannelDescription {
    pub label: u32,
    pub flags: u32,
    pub coordinates: [f32; 3],
}

impl From<raw::AudioChannelDescription> for ChannelDescription {
    fn from(desc: raw::AudioChannelDescription) -> Self {
        Self {
            label: desc.m_channel_label,
            flags: desc.m_channel_flags,
            coordinates: desc.m_coordinates,
        }
    }
}

/// Decoded channel layout.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChannelLayout {
    pub tag: u32,
    pub bitmap: u32,
    pub descriptions: Vec<ChannelDescription>,
}
