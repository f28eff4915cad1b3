use xrkit_chunk::{binary::ByteView, ChunkHeader};

/// Whether `bytes` parse as a run of chunks that ends exactly where the bytes end.
///
/// Chunk payloads carry no type information, so this is how tools guess that a payload holds
/// nested chunks rather than plain values. Empty payloads are treated as values.
pub fn looks_like_chunks(bytes: &[u8]) -> bool {
    let mut view = ByteView::new(bytes);
    if view.is_empty() {
        return false;
    }
    while !view.eof() {
        let Ok(header) = view.read::<ChunkHeader>() else {
            return false;
        };
        if view.advance(header.size as usize).is_err() {
            return false;
        }
    }
    true
}
