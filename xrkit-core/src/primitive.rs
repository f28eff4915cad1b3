use std::fmt;

use crate::binary::{ByteView, Deserialize, Error, ResultContextExt, Serialize, Sink};

/// Three-byte little-endian unsigned integer, held in the low bits of a `u32`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct U24(u32);

impl U24 {
    pub const MAX: u32 = 0x00ff_ffff;

    /// Bits above the low 24 are dropped.
    pub fn truncating(value: u32) -> Self {
        Self(value & Self::MAX)
    }
}

impl From<U24> for u32 {
    fn from(value: U24) -> Self {
        value.0
    }
}

impl Deserialize for U24 {
    fn deserialize(view: &mut ByteView<'_>) -> Result<Self, Error> {
        let mut buf = [0; 4];
        view.read_bytes(&mut buf[..3])
            .context("cannot deserialize U24")?;
        Ok(Self(u32::from_le_bytes(buf)))
    }
}

impl Serialize for U24 {
    fn serialize(&self, sink: &mut (impl Sink + ?Sized)) -> Result<(), Error> {
        sink.write_bytes(&self.0.to_le_bytes()[..3])
    }
}

impl fmt::Debug for U24 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for U24 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
