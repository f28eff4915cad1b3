//! Little-endian binary primitives shared by the chunk reader and writer.
//!
//! [`ByteView`] is the read side: a bounds-checked window with a cursor. [`Sink`] is the write
//! side: something that accepts bytes at a cursor and can be rewound for back-patching.
//! [`Deserialize`] and [`Serialize`] connect typed values to both.

mod deserialization;
mod error;
mod scalar;
mod serialization;
mod sink;
mod view;

pub use deserialization::*;
pub use error::*;
pub use scalar::*;
pub use serialization::*;
pub use sink::*;
pub use view::*;
