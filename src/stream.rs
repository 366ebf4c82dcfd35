//! Audio file stream parser.
//!
//! Wraps an AudioToolbox `AudioFileStreamID`. Bytes fed to
//! [`AudioFileStream::parse_bytes`] are parsed by the framework, which reports
//! discovered properties and decoded packets through callbacks; those are
//! re-exposed as the [`AudioFileStream::on_property_found`] and
//! [`AudioFileStream::on_packets`] events.

use std::ops::Deref;
use std::os::raw::c_void;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, LazyLock};

use parking_lot::{RwLock, RwLockReadGuard};

use crate::error::{Error, Result};
use crate::event::{Event, ListenerId};
use crate::ffi::error::creation_error;
use crate::ffi::raw::{self, AudioStreamPacketDescription, NO_ERR};
use crate::ffi::{check_status, AudioFileStreamId, StreamApi};
use crate::property::{NativeLayout, PropertyAccessor, PropertyBuffer, PropertyInfo};
use crate::registry::{CallbackRegistry, ContextToken};
use crate::types::{
    AudioFileType, ByteOffset, ChannelLayout, FormatListItem, FramePosition, PacketDescription,
    PacketPosition, PacketTableInfo, ParseFlags, PropertyFlags, PropertyId, SeekFlags,
    SeekResult, StreamBasicDescription, StreamOptions, StreamStatus,
};

/// Token -> stream lookup for the trampolines.
static STREAMS: LazyLock<CallbackRegistry<StreamView>> = LazyLock::new(CallbackRegistry::new);

/// Listener for [`AudioFileStream::on_property_found`].
pub type PropertyFoundListener = dyn Fn(&StreamView, &mut PropertyFound) + Send + Sync;

/// Listener for [`AudioFileStream::on_packets`].
pub type PacketsListener = dyn Fn(&StreamView, &PacketsDecoded<'_>) + Send + Sync;

/// A property value became available while parsing.
///
/// Listeners may set [`PropertyFlags::CACHE_PROPERTY`] in `flags`; the final
/// flag set is written back to the parser after all listeners ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyFound {
    /// The property that was found.
    pub property: PropertyId,
    /// Flags exchanged with the parser.
    pub flags: PropertyFlags,
}

/// A chunk of audio data was split into packets.
#[derive(Debug)]
pub struct PacketsDecoded<'a> {
    /// The packet data, valid only for the duration of the callback.
    pub data: &'a [u8],
    /// One entry per packet; empty for constant bit rate data.
    pub descriptions: Vec<PacketDescription>,
    /// Number of packets reported by the parser.
    pub packet_count: u32,
}

impl PacketsDecoded<'_> {
    /// Number of bytes in the chunk.
    pub fn bytes(&self) -> usize {
        self.data.len()
    }

    /// Bytes of one packet, if its description lies inside the chunk.
    pub fn packet(&self, index: usize) -> Option<&[u8]> {
        let desc = self.descriptions.get(index)?;
        let start = usize::try_from(desc.start_offset).ok()?;
        let end = start.checked_add(desc.data_byte_size as usize)?;
        self.data.get(start..end)
    }
}

/// Lifecycle of the native handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandleState {
    Unopened,
    Open(AudioFileStreamId),
    Closed,
}

/// Property access to a stream.
///
/// This is what listeners receive, so they can query the stream from inside
/// a callback; [`AudioFileStream`] derefs to it.
pub struct StreamView {
    api: Arc<dyn StreamApi>,
    state: RwLock<HandleState>,
    property_found: Event<PropertyFoundListener>,
    packets: Event<PacketsListener>,
}

impl StreamView {
    fn new(api: Arc<dyn StreamApi>) -> Self {
        Self {
            api,
            state: RwLock::new(HandleState::Unopened),
            property_found: Event::new("property_found"),
            packets: Event::new("packets"),
        }
    }

    /// Run `f` with the open handle.
    ///
    /// Holds a recursive read lock for the duration of the native call so
    /// release cannot happen underneath it, while still allowing listeners
    /// dispatched from inside `f` to query properties.
    fn with_handle<R>(&self, f: impl FnOnce(AudioFileStreamId) -> Result<R>) -> Result<R> {
        let state = self.state.read_recursive();
        match *state {
            HandleState::Open(handle) => f(handle),
            HandleState::Unopened => Err(Error::NotOpen),
            HandleState::Closed => Err(Error::UseAfterClose),
        }
    }

    fn with_properties<R>(&self, f: impl FnOnce(PropertyAccessor<'_>) -> Result<R>) -> Result<R> {
        self.with_handle(|handle| f(PropertyAccessor::new(self.api.as_ref(), handle)))
    }

    /// Check if the native handle is open.
    pub fn is_open(&self) -> bool {
        matches!(*self.state.read_recursive(), HandleState::Open(_))
    }

    /// Read guard for dispatching a native callback.
    ///
    /// `None` once release has begun. While the guard is held, release blocks
    /// on the write lock, so no listener runs after `close` returns.
    fn dispatch_guard(&self) -> Option<RwLockReadGuard<'_, HandleState>> {
        let state = self.state.read_recursive();
        if matches!(*state, HandleState::Closed) {
            log::trace!("dropping callback for closed stream");
            return None;
        }
        Some(state)
    }

    /// Release the native handle, once.
    ///
    /// The token is removed from the registry before the handle is released,
    /// so a late callback cannot reach a half-destroyed stream.
    fn release(&self, token: ContextToken) -> Result<()> {
        STREAMS.unregister(token);

        let handle = {
            let mut state = self.state.write();
            match std::mem::replace(&mut *state, HandleState::Closed) {
                HandleState::Open(handle) => handle,
                _ => return Ok(()),
            }
        };

        log::debug!("closing audio file stream {:#x}", handle.as_raw());
        let code = unsafe { self.api.close(handle) };
        check_status(code, "AudioFileStreamClose")
    }

    /// Size and mutability of a property.
    pub fn property_info(&self, id: PropertyId) -> Result<PropertyInfo> {
        self.with_properties(|p| p.query_info(id))
    }

    /// Fetch a property of any size.
    ///
    /// The returned buffer is exactly the size the parser reported.
    pub fn property(&self, id: PropertyId) -> Result<PropertyBuffer> {
        self.with_properties(|p| p.get_buffer(id))
    }

    /// Fetch a property into a caller-sized buffer; returns the bytes written.
    pub fn property_into(&self, id: PropertyId, out: &mut [u8]) -> Result<usize> {
        self.with_properties(|p| p.get_into(id, out))
    }

    /// Fetch a fixed-width property without querying its size.
    pub fn scalar<T: NativeLayout>(&self, id: PropertyId) -> Result<T> {
        self.with_properties(|p| p.get_scalar(id))
    }

    /// Best-effort variant of [`StreamView::scalar`].
    ///
    /// Returns `T::default()` (zero) on **any** failure, including a closed
    /// stream. A zero result therefore does not mean the value is zero; use
    /// [`StreamView::scalar`] when the distinction matters.
    pub fn scalar_or_default<T: NativeLayout>(&self, id: PropertyId) -> T {
        self.scalar(id).unwrap_or_default()
    }

    /// Write a property from raw bytes.
    pub fn set_property(&self, id: PropertyId, data: &[u8]) -> Result<()> {
        self.with_properties(|p| p.set_buffer(id, data))
    }

    /// Write a fixed-width property.
    pub fn set_scalar<T: NativeLayout>(&self, id: PropertyId, value: T) -> Result<()> {
        self.with_properties(|p| p.set_scalar(id, value))
    }

    /// True once the parser has found the start of the audio data.
    pub fn ready_to_produce_packets(&self) -> Result<bool> {
        Ok(self.scalar::<u32>(PropertyId::READY_TO_PRODUCE_PACKETS)? == 1)
    }

    /// File type detected by the parser.
    pub fn file_type(&self) -> Result<AudioFileType> {
        Ok(AudioFileType::from(self.scalar::<u32>(PropertyId::FILE_FORMAT)?))
    }

    /// Format of the audio data.
    pub fn data_format(&self) -> Result<StreamBasicDescription> {
        let asbd = self.scalar::<raw::AudioStreamBasicDescription>(PropertyId::DATA_FORMAT)?;
        Ok(asbd.into())
    }

    /// All formats the data can be decoded as (e.g. the layers of HE-AAC).
    pub fn format_list(&self) -> Result<Vec<FormatListItem>> {
        let buffer = self.property(PropertyId::FORMAT_LIST)?;
        let item_size = std::mem::size_of::<raw::AudioFormatListItem>();
        if buffer.len() % item_size != 0 {
            return Err(bad_property_size());
        }
        let items = buffer
            .read_array::<raw::AudioFormatListItem>(0, buffer.len() / item_size)
            .ok_or_else(bad_property_size)?;
        Ok(items.into_iter().map(FormatListItem::from).collect())
    }

    /// Codec magic cookie. Empty if the format has none.
    pub fn magic_cookie(&self) -> Result<Vec<u8>> {
        Ok(self.property(PropertyId::MAGIC_COOKIE_DATA)?.to_vec())
    }

    /// Number of bytes of audio data.
    pub fn data_byte_count(&self) -> Result<u64> {
        self.scalar(PropertyId::AUDIO_DATA_BYTE_COUNT)
    }

    /// Number of packets of audio data.
    pub fn data_packet_count(&self) -> Result<u64> {
        self.scalar(PropertyId::AUDIO_DATA_PACKET_COUNT)
    }

    /// Largest packet in the data.
    pub fn maximum_packet_size(&self) -> Result<u32> {
        self.scalar(PropertyId::MAXIMUM_PACKET_SIZE)
    }

    /// Byte offset of the audio data within the file.
    pub fn data_offset(&self) -> Result<i64> {
        self.scalar(PropertyId::DATA_OFFSET)
    }

    /// Channel layout of the data.
    pub fn channel_layout(&self) -> Result<ChannelLayout> {
        let buffer = self.property(PropertyId::CHANNEL_LAYOUT)?;
        let header = buffer
            .read::<raw::AudioChannelLayoutHeader>(0)
            .ok_or_else(bad_property_size)?;
        let descriptions = buffer
            .read_array::<raw::AudioChannelDescription>(
                std::mem::size_of::<raw::AudioChannelLayoutHeader>(),
                header.m_number_channel_descriptions as usize,
            )
            .ok_or_else(bad_property_size)?;
        Ok(ChannelLayout {
            tag: header.m_channel_layout_tag,
            bitmap: header.m_channel_bitmap,
            descriptions: descriptions.into_iter().map(Into::into).collect(),
        })
    }

    /// Priming and remainder frames.
    pub fn packet_table_info(&self) -> Result<PacketTableInfo> {
        let info = self.scalar::<raw::AudioFilePacketTableInfo>(PropertyId::PACKET_TABLE_INFO)?;
        Ok(info.into())
    }

    /// Override priming and remainder frames.
    pub fn set_packet_table_info(&self, info: PacketTableInfo) -> Result<()> {
        self.set_scalar(
            PropertyId::PACKET_TABLE_INFO,
            raw::AudioFilePacketTableInfo::from(info),
        )
    }

    /// Upper bound on packet size, available before parsing packets.
    pub fn packet_size_upper_bound(&self) -> Result<u32> {
        self.scalar(PropertyId::PACKET_SIZE_UPPER_BOUND)
    }

    /// Average packet size.
    pub fn average_bytes_per_packet(&self) -> Result<f64> {
        self.scalar(PropertyId::AVERAGE_BYTES_PER_PACKET)
    }

    /// Bit rate in bits per second.
    pub fn bit_rate(&self) -> Result<u32> {
        self.scalar(PropertyId::BIT_RATE)
    }

    /// First frame of a packet.
    pub fn packet_to_frame(&self, packet: i64) -> Result<i64> {
        let input = raw::AudioFramePacketTranslation {
            m_packet: packet,
            ..Default::default()
        };
        let out = self.with_properties(|p| p.exchange(PropertyId::PACKET_TO_FRAME, input))?;
        Ok(out.m_frame)
    }

    /// Packet containing a frame.
    pub fn frame_to_packet(&self, frame: i64) -> Result<FramePosition> {
        let input = raw::AudioFramePacketTranslation {
            m_frame: frame,
            ..Default::default()
        };
        let out = self.with_properties(|p| p.exchange(PropertyId::FRAME_TO_PACKET, input))?;
        Ok(FramePosition {
            packet: out.m_packet,
            frame_offset_in_packet: out.m_frame_offset_in_packet,
        })
    }

    /// Byte offset of a packet.
    pub fn packet_to_byte(&self, packet: i64) -> Result<ByteOffset> {
        let input = raw::AudioBytePacketTranslation {
            m_packet: packet,
            ..Default::default()
        };
        let out = self.with_properties(|p| p.exchange(PropertyId::PACKET_TO_BYTE, input))?;
        Ok(ByteOffset {
            byte: out.m_byte,
            is_estimate: out.m_flags & raw::K_BYTE_PACKET_TRANSLATION_FLAG_IS_ESTIMATE != 0,
        })
    }

    /// Packet containing a byte offset.
    pub fn byte_to_packet(&self, byte: i64) -> Result<PacketPosition> {
        let input = raw::AudioBytePacketTranslation {
            m_byte: byte,
            ..Default::default()
        };
        let out = self.with_properties(|p| p.exchange(PropertyId::BYTE_TO_PACKET, input))?;
        Ok(PacketPosition {
            packet: out.m_packet,
            byte_offset_in_packet: out.m_byte_offset_in_packet,
            is_estimate: out.m_flags & raw::K_BYTE_PACKET_TRANSLATION_FLAG_IS_ESTIMATE != 0,
        })
    }
}

/// An audio file stream parser.
///
/// Feed it bytes as they arrive; subscribe to its events to receive the
/// discovered properties and the packets. The native stream is closed on
/// [`AudioFileStream::close`] or on drop, whichever comes first.
///
/// # Example
///
/// ```ignore
/// use afs::{AudioFileStream, AudioFileType};
///
/// let mut stream = AudioFileStream::open(AudioFileType::Mp3)?;
/// stream.on_packets(|_, chunk| {
///     println!("{} bytes in {} packets", chunk.bytes(), chunk.packet_count);
/// });
///
/// let data = std::fs::read("song.mp3").expect("read file");
/// for chunk in data.chunks(4096) {
///     stream.parse_bytes(chunk, false)?;
/// }
/// println!("bit rate: {}", stream.bit_rate()?);
/// stream.close()?;
/// # Ok::<(), afs::Error>(())
/// ```
pub struct AudioFileStream {
    view: Arc<StreamView>,
    token: ContextToken,
}

impl AudioFileStream {
    /// Open a stream parser backed by the system AudioToolbox.
    #[cfg(target_vendor = "apple")]
    pub fn open(file_type_hint: AudioFileType) -> Result<Self> {
        Self::open_with(
            Arc::new(crate::ffi::SystemApi),
            StreamOptions::with_hint(file_type_hint),
        )
    }

    /// Open a stream parser through the given entry points.
    ///
    /// On failure nothing is left registered and no stream is returned.
    pub fn open_with(api: Arc<dyn StreamApi>, options: StreamOptions) -> Result<Self> {
        let view = Arc::new(StreamView::new(api));
        let token = STREAMS.register(&view);

        let mut handle = AudioFileStreamId::invalid();
        let code = unsafe {
            view.api.open(
                token.as_client_data(),
                property_listener_trampoline,
                packets_trampoline,
                options.file_type_hint.into(),
                &mut handle,
            )
        };

        if code != NO_ERR || !handle.is_valid() {
            STREAMS.unregister(token);
            *view.state.write() = HandleState::Closed;
            let code = if code == NO_ERR {
                raw::K_AUDIO_FILE_STREAM_ERR_UNSPECIFIED_ERROR
            } else {
                code
            };
            return Err(creation_error(code));
        }

        *view.state.write() = HandleState::Open(handle);
        log::debug!(
            "opened audio file stream {:#x} (hint {:?}, token {})",
            handle.as_raw(),
            options.file_type_hint,
            token.as_raw()
        );

        Ok(Self { view, token })
    }

    /// Context token this stream registered with the native layer.
    pub fn token(&self) -> ContextToken {
        self.token
    }

    /// Parse a chunk of bytes.
    ///
    /// Callbacks fire synchronously from inside this call. Pass
    /// `discontinuity = true` when the chunk does not follow the previous one
    /// (e.g. after a seek).
    pub fn parse_bytes(&self, data: &[u8], discontinuity: bool) -> Result<()> {
        let size = u32::try_from(data.len()).map_err(|_| {
            Error::InvalidArgument(format!("chunk of {} bytes exceeds u32", data.len()))
        })?;
        let flags = if discontinuity {
            ParseFlags::DISCONTINUITY
        } else {
            ParseFlags::empty()
        };

        self.view.with_handle(|handle| {
            let code = unsafe {
                self.view
                    .api
                    .parse_bytes(handle, size, data.as_ptr().cast(), flags.bits())
            };
            check_status(code, "AudioFileStreamParseBytes")
        })
    }

    /// Parse `count` bytes of `data` starting at `offset`.
    pub fn parse_range(
        &self,
        data: &[u8],
        offset: usize,
        count: usize,
        discontinuity: bool,
    ) -> Result<()> {
        let end = offset
            .checked_add(count)
            .ok_or_else(|| Error::InvalidArgument("offset + count overflows".to_string()))?;
        if end > data.len() {
            return Err(Error::InvalidArgument(format!(
                "offset {} + count {} exceeds buffer of {} bytes",
                offset,
                count,
                data.len()
            )));
        }
        self.parse_bytes(&data[offset..end], discontinuity)
    }

    /// Byte offset of a packet, for resuming the download after a seek.
    pub fn seek(&self, packet_offset: i64) -> Result<SeekResult> {
        self.view.with_handle(|handle| {
            let mut byte_offset: i64 = 0;
            let mut flags: u32 = 0;
            let code = unsafe {
                self.view
                    .api
                    .seek(handle, packet_offset, &mut byte_offset, &mut flags)
            };
            check_status(code, "AudioFileStreamSeek")?;
            Ok(SeekResult {
                byte_offset,
                is_estimate: SeekFlags::from_bits_retain(flags)
                    .contains(SeekFlags::OFFSET_IS_ESTIMATED),
            })
        })
    }

    /// Subscribe to property discoveries.
    pub fn on_property_found<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&StreamView, &mut PropertyFound) + Send + Sync + 'static,
    {
        self.view.property_found.subscribe(Arc::new(listener))
    }

    /// Subscribe to decoded packets.
    pub fn on_packets<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&StreamView, &PacketsDecoded<'_>) + Send + Sync + 'static,
    {
        self.view.packets.subscribe(Arc::new(listener))
    }

    /// Remove a listener from whichever event it was subscribed to.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.view.property_found.unsubscribe(id) || self.view.packets.unsubscribe(id)
    }

    /// Close the stream and release the native handle.
    ///
    /// Idempotent: later calls return `Ok(())` without touching the native
    /// layer. Every other operation fails with [`Error::UseAfterClose`]
    /// afterwards. Called automatically on drop.
    pub fn close(&mut self) -> Result<()> {
        self.view.release(self.token)
    }
}

impl Deref for AudioFileStream {
    type Target = StreamView;

    fn deref(&self) -> &StreamView {
        &self.view
    }
}

impl Drop for AudioFileStream {
    fn drop(&mut self) {
        if let Err(e) = self.view.release(self.token) {
            log::warn!("failed to close audio file stream on drop: {}", e);
        }
    }
}

/// A property value whose length does not fit its layout.
fn bad_property_size() -> Error {
    Error::Status {
        op: "AudioFileStreamGetProperty",
        status: StreamStatus::BadPropertySize,
    }
}

/// Property listener registered with the native layer.
///
/// # Safety
///
/// Called by the framework with the client data passed to open and a valid
/// (or null) flags pointer.
unsafe extern "C" fn property_listener_trampoline(
    client_data: *mut c_void,
    _stream: AudioFileStreamId,
    property_id: raw::AudioFileStreamPropertyId,
    io_flags: *mut u32,
) {
    // Unwinding into the framework is undefined behavior
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let token = ContextToken::from_client_data(client_data);
        let Some(shared) = STREAMS.lookup(token) else {
            log::trace!("dropping property callback for stale token {}", token.as_raw());
            return;
        };
        let view: &StreamView = &shared;
        // Held through dispatch and write-back so release waits for us
        let Some(_state) = view.dispatch_guard() else {
            return;
        };

        let mut found = PropertyFound {
            property: PropertyId(property_id),
            flags: if io_flags.is_null() {
                PropertyFlags::empty()
            } else {
                PropertyFlags::from_bits_retain(*io_flags)
            },
        };
        view.property_found.emit(|listener| listener(view, &mut found));

        if !io_flags.is_null() {
            *io_flags = found.flags.bits();
        }
    }));
}

/// Packets callback registered with the native layer.
///
/// # Safety
///
/// `input_data` must be valid for `number_bytes` bytes and
/// `packet_descriptions` for `number_packets` entries (or null).
unsafe extern "C" fn packets_trampoline(
    client_data: *mut c_void,
    number_bytes: u32,
    number_packets: u32,
    input_data: *const c_void,
    packet_descriptions: *mut AudioStreamPacketDescription,
) {
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let token = ContextToken::from_client_data(client_data);
        let Some(shared) = STREAMS.lookup(token) else {
            log::trace!("dropping packets callback for stale token {}", token.as_raw());
            return;
        };
        let view: &StreamView = &shared;
        let Some(_state) = view.dispatch_guard() else {
            return;
        };
        if view.packets.is_empty() {
            return;
        }

        let data = if input_data.is_null() || number_bytes == 0 {
            &[][..]
        } else {
            std::slice::from_raw_parts(input_data.cast::<u8>(), number_bytes as usize)
        };
        let descriptions = if packet_descriptions.is_null() || number_packets == 0 {
            Vec::new()
        } else {
            std::slice::from_raw_parts(packet_descriptions, number_packets as usize)
                .iter()
                .copied()
                .map(PacketDescription::from)
                .collect()
        };

        let chunk = PacketsDecoded {
            data,
            descriptions,
            packet_count: number_packets,
        };
        view.packets.emit(|listener| listener(view, &chunk));
    }));
}
