use std::{
    fmt::{Debug, Display},
    ops::Deref,
};

use crate::binary::{ByteView, Deserialize, Error, Serialize, Sink};

/// Byte string as stored in resource files.
///
/// Game data is not guaranteed to be UTF-8 (names are frequently in a legacy code page), so
/// the bytes are kept verbatim. The terminator is never part of the stored bytes.
#[derive(Clone, PartialEq, Eq, Default, Hash)]
pub struct RawString {
    bytes: Vec<u8>,
}

impl RawString {
    pub fn to_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn to_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }
}

impl Debug for RawString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(utf8) = self.to_str() {
            Debug::fmt(utf8, f)
        } else {
            f.write_str("<invalid UTF-8> ")?;
            Debug::fmt(&self.bytes, f)
        }
    }
}

impl Display for RawString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&String::from_utf8_lossy(&self.bytes), f)
    }
}

impl Deref for RawString {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.bytes
    }
}

impl From<Vec<u8>> for RawString {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl From<&[u8]> for RawString {
    fn from(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }
}

impl From<String> for RawString {
    fn from(value: String) -> Self {
        Self::from(value.into_bytes())
    }
}

impl From<&str> for RawString {
    fn from(value: &str) -> Self {
        Self::from(value.as_bytes())
    }
}

impl PartialEq<str> for RawString {
    fn eq(&self, other: &str) -> bool {
        self.bytes == other.as_bytes()
    }
}

impl PartialEq<&str> for RawString {
    fn eq(&self, other: &&str) -> bool {
        self.bytes == other.as_bytes()
    }
}

/// Zero-terminated on the wire.
impl Deserialize for RawString {
    fn deserialize(view: &mut ByteView<'_>) -> Result<Self, Error> {
        view.read_sz()
    }
}

impl Serialize for RawString {
    fn serialize(&self, sink: &mut (impl Sink + ?Sized)) -> Result<(), Error> {
        serialize_sz(&self.bytes, sink)
    }
}

impl Serialize for str {
    fn serialize(&self, sink: &mut (impl Sink + ?Sized)) -> Result<(), Error> {
        serialize_sz(self.as_bytes(), sink)
    }
}

/// Writes the bytes followed by exactly one zero byte. A terminator already present at the end
/// is not doubled.
pub fn serialize_sz(bytes: &[u8], sink: &mut (impl Sink + ?Sized)) -> Result<(), Error> {
    let bytes = bytes.strip_suffix(&[0]).unwrap_or(bytes);
    sink.write_bytes(bytes)?;
    sink.write_bytes(&[0])
}
