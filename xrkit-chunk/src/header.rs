use xrkit_core::binary::{ByteView, Deserialize, Error, Serialize, Sink};

/// Set in the tag of chunks whose payload went through a [`crate::Codec`].
pub const CHUNK_COMPRESSED: u32 = 0x8000_0000;
pub const CHUNK_ID_MASK: u32 = !CHUNK_COMPRESSED;
pub const HEADER_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    /// Logical id with the compression flag removed.
    pub id: u32,
    pub size: u32,
    pub compressed: bool,
}

impl ChunkHeader {
    pub fn from_tag(tag: u32, size: u32) -> Self {
        Self {
            id: tag & CHUNK_ID_MASK,
            size,
            compressed: tag & CHUNK_COMPRESSED != 0,
        }
    }

    pub fn tag(&self) -> u32 {
        if self.compressed {
            self.id | CHUNK_COMPRESSED
        } else {
            self.id
        }
    }
}

/// The header exactly as stored.
#[derive(xrkit_core::Deserialize, xrkit_core::Serialize)]
struct StoredHeader {
    tag: u32,
    size: u32,
}

impl Deserialize for ChunkHeader {
    fn deserialize(view: &mut ByteView<'_>) -> Result<Self, Error> {
        let StoredHeader { tag, size } = view.read()?;
        Ok(Self::from_tag(tag, size))
    }
}

impl Serialize for ChunkHeader {
    fn serialize(&self, sink: &mut (impl Sink + ?Sized)) -> Result<(), Error> {
        StoredHeader {
            tag: self.tag(),
            size: self.size,
        }
        .serialize(sink)
    }
}
