use std::{
    ops::{Deref, DerefMut, Range},
    sync::Arc,
};

use tracing::{debug, trace};
use xrkit_core::binary::{ByteView, Deserialize, Error, ErrorKind, ResultContextExt};
use xrkit_scrambler::Scrambler;

use crate::{
    header::{CHUNK_ID_MASK, HEADER_SIZE},
    ChunkHeader, Codec,
};

/// Reader over a run of chunks.
///
/// Scalar, string and sequence reads come from the underlying [`ByteView`], which the reader
/// derefs to. On top of that it locates chunks by id or by position and opens them as
/// independent sub-readers. A sub-reader borrows the parent's bytes when the payload is stored
/// as is. It owns a private buffer when the payload had to be decompressed or decrypted.
/// Either way it never touches the parent's cursor.
#[derive(Clone)]
pub struct ChunkReader<'a> {
    view: ByteView<'a>,
    /// Where `find_chunk(.., false)` continues: the end of the last located payload.
    resume: usize,
    /// Where `open_chunk_next` continues.
    enumeration: usize,
    /// End of the last located payload, checked by `debug_find_chunk`.
    located: Option<usize>,
    codec: Option<&'a dyn Codec>,
}

impl<'a> ChunkReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self::from_view(ByteView::new(bytes))
    }

    pub fn from_owned(bytes: impl Into<Arc<[u8]>>) -> ChunkReader<'static> {
        ChunkReader::from_view(ByteView::owned(bytes))
    }

    pub fn from_view(view: ByteView<'a>) -> Self {
        Self {
            view,
            resume: 0,
            enumeration: 0,
            located: None,
            codec: None,
        }
    }

    /// Codec used for compressed chunks. Sub-readers inherit it.
    pub fn with_codec(mut self, codec: &'a dyn Codec) -> Self {
        self.codec = Some(codec);
        self
    }

    pub fn codec(&self) -> Option<&'a dyn Codec> {
        self.codec
    }

    pub fn view(&self) -> &ByteView<'a> {
        &self.view
    }

    pub fn into_view(self) -> ByteView<'a> {
        self.view
    }

    fn child(&self, view: ByteView<'a>) -> ChunkReader<'a> {
        ChunkReader {
            codec: self.codec,
            ..ChunkReader::from_view(view)
        }
    }

    /// Reads the header at `offset` and checks that its payload fits in the view.
    fn header_at(&self, offset: usize) -> Result<(ChunkHeader, Range<usize>), Error> {
        let mut header_view = self.view.sub_view(offset..self.view.len())?;
        let header = header_view
            .read::<ChunkHeader>()
            .with_context(|| format!("truncated chunk header at offset {offset}"))?;

        let payload_start = offset + HEADER_SIZE;
        let payload_end = payload_start + header.size as usize;
        if payload_end > self.view.len() {
            return Err(ErrorKind::OutOfBounds.make(format!(
                "chunk {} at offset {offset} claims {} bytes, but only {} remain",
                header.id,
                header.size,
                self.view.len() - payload_start
            )));
        }
        Ok((header, payload_start..payload_end))
    }

    /// Turns a payload into a sub-reader, decompressing it if the header says so.
    fn open_payload(
        &self,
        header: &ChunkHeader,
        payload: ByteView<'a>,
    ) -> Result<ChunkReader<'a>, Error> {
        if !header.compressed {
            return Ok(self.child(payload));
        }

        let codec = self.codec.ok_or_else(|| {
            ErrorKind::MissingCodec.make(format!("chunk {} is compressed", header.id))
        })?;
        let decompressed = codec
            .decompress(payload.bytes())
            .with_context(|| format!("cannot decompress chunk {}", header.id))?;
        debug!(
            chunk_id = header.id,
            compressed_size = header.size,
            size = decompressed.len(),
            "Decompressed chunk"
        );
        Ok(self.child(ByteView::owned(decompressed)))
    }

    /// Looks for the chunk `id` among the chunks of this view.
    ///
    /// With `reset` the scan starts at the beginning of the view. Otherwise it continues right
    /// after the payload of the previously located chunk. On a match the cursor is placed at
    /// the start of the payload, ready for it to be consumed. On a miss the cursor stays where
    /// it was.
    pub fn find_chunk(&mut self, id: u32, reset: bool) -> Result<Option<ChunkHeader>, Error> {
        let id = id & CHUNK_ID_MASK;
        let mut offset = if reset { 0 } else { self.resume };
        while offset < self.view.len() {
            let (header, payload) = self.header_at(offset)?;
            trace!(
                chunk_id = header.id,
                size = header.size,
                offset,
                "Scanning chunk"
            );
            if header.id == id {
                self.view.seek(payload.start)?;
                self.resume = payload.end;
                self.located = Some(payload.end);
                return Ok(Some(header));
            }
            offset = payload.end;
        }
        Ok(None)
    }

    /// Checks that the last located chunk was consumed exactly, with no stray reads before or
    /// after. Only checks in builds with debug assertions.
    pub fn debug_find_chunk(&self) -> Result<(), Error> {
        if !cfg!(debug_assertions) {
            return Ok(());
        }
        match self.located {
            Some(end) if end == self.view.tell() => Ok(()),
            Some(end) => Err(ErrorKind::StrayRead.make(format!(
                "cursor is at {} but the located chunk ends at {end}",
                self.view.tell()
            ))),
            None => Err(ErrorKind::StrayRead.make("no chunk has been located")),
        }
    }

    /// Opens chunk `id` as a sub-reader. The parent's cursor ends up right after the chunk.
    pub fn open_chunk(&mut self, id: u32) -> Result<Option<ChunkReader<'a>>, Error> {
        let Some(header) = self.find_chunk(id, true)? else {
            return Ok(None);
        };
        let payload = self.view.take_view(header.size as usize)?;
        debug!(
            chunk_id = header.id,
            size = header.size,
            compressed = header.compressed,
            "Opening chunk"
        );
        self.open_payload(&header, payload).map(Some)
    }

    /// Like [`ChunkReader::open_chunk`], then decrypts the payload. The sub-reader always owns
    /// its bytes.
    pub fn open_chunk_scrambled(
        &mut self,
        id: u32,
        scrambler: &Scrambler,
    ) -> Result<Option<ChunkReader<'a>>, Error> {
        let Some(chunk) = self.open_chunk(id)? else {
            return Ok(None);
        };
        let decrypted = scrambler.decrypt(chunk.view.bytes());
        Ok(Some(self.child(ByteView::owned(decrypted))))
    }

    /// Opens the chunk that follows `prev` in storage order, whatever its id.
    ///
    /// Pass `None` to start from the first chunk, then hand back each returned reader to get
    /// the next one. Returns `None` once the view is exhausted.
    pub fn open_chunk_next(
        &mut self,
        prev: Option<ChunkReader<'a>>,
    ) -> Result<Option<(u32, ChunkReader<'a>)>, Error> {
        let offset = match prev {
            Some(prev) => {
                self.close_chunk(prev);
                self.enumeration
            }
            None => 0,
        };
        self.enumeration = offset;
        if offset >= self.view.len() {
            return Ok(None);
        }

        let (header, payload) = self.header_at(offset)?;
        self.enumeration = payload.end;
        let chunk = self.open_payload(&header, self.view.sub_view(payload)?)?;
        Ok(Some((header.id, chunk)))
    }

    /// Iterates over all chunks of this view in storage order. Independent of the cursor and
    /// of [`ChunkReader::open_chunk_next`].
    pub fn chunks(&self) -> Chunks<'_, 'a> {
        Chunks {
            reader: self,
            offset: 0,
            failed: false,
        }
    }

    /// Releases a sub-reader. Dropping it has the same effect.
    pub fn close_chunk(&self, chunk: ChunkReader<'_>) {
        drop(chunk);
    }

    /// Copies the stored payload of chunk `id` into the front of `dest` and returns its size.
    pub fn read_raw_chunk(&mut self, id: u32, dest: &mut [u8]) -> Result<Option<usize>, Error> {
        let Some(header) = self.find_chunk(id, true)? else {
            return Ok(None);
        };
        let size = header.size as usize;
        if size > dest.len() {
            return Err(ErrorKind::ChunkTooLarge.make(format!(
                "chunk {} holds {size} bytes but the destination holds {}",
                header.id,
                dest.len()
            )));
        }
        self.view.read_bytes(&mut dest[..size])?;
        Ok(Some(size))
    }

    /// Reads a single value stored as the payload of chunk `id`.
    ///
    /// The value is decoded from a view bounded to the payload, so it can never read into the
    /// next chunk. [`xrkit_core::string::RawString`] payloads are read as zero-terminated text.
    pub fn read_chunk<T>(&mut self, id: u32) -> Result<Option<T>, Error>
    where
        T: Deserialize,
    {
        let Some(header) = self.find_chunk(id, true)? else {
            return Ok(None);
        };
        let start = self.view.tell();
        let mut payload = self.view.sub_view(start..start + header.size as usize)?;
        let value = payload
            .read::<T>()
            .with_context(|| format!("cannot read the value of chunk {}", header.id))?;
        self.view.seek(start + payload.tell())?;
        self.debug_find_chunk().with_context(|| {
            format!(
                "chunk {} holds {} bytes but the value used {}",
                header.id,
                header.size,
                payload.tell()
            )
        })?;
        Ok(Some(value))
    }

    /// Decodes `n` consecutive elements with `decode`.
    pub fn read_seq_with<T, F>(&mut self, n: usize, mut decode: F) -> Result<Vec<T>, Error>
    where
        F: FnMut(&mut ChunkReader<'a>) -> Result<T, Error>,
    {
        let mut items = Vec::with_capacity(n.min(self.view.size()));
        for i in 0..n {
            items.push(decode(self).with_context(|| format!("cannot read element {i} of {n}"))?);
        }
        Ok(items)
    }

    /// Decodes every chunk of this view, in storage order, with `decode`.
    pub fn read_chunks<T, F>(&mut self, mut decode: F) -> Result<Vec<T>, Error>
    where
        F: FnMut(&mut ChunkReader<'a>) -> Result<T, Error>,
    {
        let mut items = vec![];
        let mut prev = None;
        while let Some((id, mut chunk)) = self.open_chunk_next(prev.take())? {
            let index = items.len();
            items.push(
                decode(&mut chunk)
                    .with_context(|| format!("cannot decode chunk {id} (item {index})"))?,
            );
            prev = Some(chunk);
        }
        Ok(items)
    }
}

impl<'a> Deref for ChunkReader<'a> {
    type Target = ByteView<'a>;

    fn deref(&self) -> &Self::Target {
        &self.view
    }
}

impl<'a> DerefMut for ChunkReader<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.view
    }
}

impl std::fmt::Debug for ChunkReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkReader")
            .field("view", &self.view)
            .field("located", &self.located)
            .field("has_codec", &self.codec.is_some())
            .finish()
    }
}

/// Iterator returned by [`ChunkReader::chunks`].
pub struct Chunks<'r, 'a> {
    reader: &'r ChunkReader<'a>,
    offset: usize,
    failed: bool,
}

impl<'r, 'a> Iterator for Chunks<'r, 'a> {
    type Item = Result<(ChunkHeader, ChunkReader<'a>), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.reader.view.len() {
            return None;
        }
        let result = self
            .reader
            .header_at(self.offset)
            .and_then(|(header, payload)| {
                self.offset = payload.end;
                let view = self.reader.view.sub_view(payload)?;
                Ok((header, self.reader.open_payload(&header, view)?))
            });
        self.failed = result.is_err();
        Some(result)
    }
}
