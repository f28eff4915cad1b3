//! Nested chunk containers.
//!
//! A file is a run of chunks packed back to back with no padding. Every chunk is an 8 byte
//! header followed by its payload, and the run ends where the enclosing view ends. All
//! values are little endian.
//!
//! | Type | Name | Description |
//! | ---: | ---- | ----------- |
//! | u32  | tag  | Bits 0-30 hold the chunk id. Bit 31 marks a compressed payload |
//! | u32  | size | Length of the payload in bytes |
//! | [u8; size] | payload | Scalars, strings or further chunks |
//!
//! [`ChunkReader`] navigates this layout without copying, and [`ChunkWriter`] produces it in
//! one forward pass, back-patching each length when its chunk is closed.

pub mod codec;
pub mod header;
pub mod provider;
pub mod reader;
pub mod writer;

pub use codec::{Codec, LzoCodec};
pub use header::{ChunkHeader, CHUNK_COMPRESSED, CHUNK_ID_MASK, HEADER_SIZE};
pub use reader::{ChunkReader, Chunks};
pub use writer::ChunkWriter;

pub use xrkit_core::binary;
