//! Rust bindings for the AudioToolbox audio file stream parser.
//!
//! This crate provides a safe Rust interface over a handful of native Apple
//! framework surfaces: the AudioToolbox stream parser (`AudioFileStream*`),
//! CoreLocation coordinate validation and Foundation object arrays. Parsing,
//! decoding and validation stay in the frameworks; the crate owns handle
//! lifecycle, property marshaling and callback dispatch.
//!
//! # Example
//!
//! ```ignore
//! use afs::{AudioFileStream, AudioFileType, PropertyFlags, PropertyId};
//!
//! fn main() -> afs::Result<()> {
//!     let mut stream = AudioFileStream::open(AudioFileType::Mp3)?;
//!
//!     // Ask the parser to cache the data format when it shows up
//!     stream.on_property_found(|view, found| {
//!         if found.property == PropertyId::DATA_FORMAT {
//!             found.flags |= PropertyFlags::CACHE_PROPERTY;
//!             if let Ok(format) = view.data_format() {
//!                 println!("sample rate: {}", format.sample_rate);
//!             }
//!         }
//!     });
//!
//!     stream.on_packets(|_, chunk| {
//!         println!("{} packets, {} bytes", chunk.packet_count, chunk.bytes());
//!     });
//!
//!     let data = std::fs::read("song.mp3").expect("read file");
//!     for chunk in data.chunks(8192) {
//!         stream.parse_bytes(chunk, false)?;
//!     }
//!
//!     // Close explicitly to observe errors; drop would close too
//!     stream.close()?;
//!     Ok(())
//! }
//! ```
//!
//! # Backends
//!
//! Every native call goes through the traits in [`ffi::api`]. On Apple targets
//! [`ffi::SystemApi`] forwards to the linked frameworks; elsewhere (and in
//! tests) any implementation speaking the same C ABI can be injected with
//! [`AudioFileStream::open_with`].

pub mod array;
pub mod error;
mod event;
pub mod ffi;
pub mod location;
pub mod property;
pub mod registry;
pub mod stream;
pub mod types;

// Re-export main types at the crate root
pub use error::{Error, Result};
pub use event::ListenerId;
pub use location::Coordinate2D;
pub use property::{NativeLayout, PropertyBuffer, PropertyInfo};
pub use registry::ContextToken;
pub use stream::{AudioFileStream, PacketsDecoded, PropertyFound, StreamView};
pub use types::{
    AudioFileType, ByteOffset, ChannelDescription, ChannelLayout, FormatListItem, FourCC,
    FramePosition, PacketDescription, PacketPosition, PacketTableInfo, ParseFlags, PropertyFlags,
    PropertyId, SeekFlags, SeekResult, StreamBasicDescription, StreamOptions, StreamStatus,
};
