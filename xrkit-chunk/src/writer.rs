use tracing::{debug, trace};
use xrkit_core::{
    binary::{Error, ErrorKind, MemorySink, ResultContextExt, Serialize, Sink},
    primitive::U24,
    string::serialize_sz,
};
use xrkit_scrambler::Scrambler;

use crate::{ChunkHeader, Codec, CHUNK_COMPRESSED, CHUNK_ID_MASK};

/// Streaming producer of the chunk layout.
///
/// Chunks are opened and closed like brackets. Opening one writes its header with a zero
/// length, and closing it seeks back to patch in the real length. Nothing is buffered, so
/// the writer works the same over an in-memory buffer, a file or a [`DryRunSink`] that only
/// measures.
///
/// [`DryRunSink`]: xrkit_core::binary::DryRunSink
#[derive(Debug)]
pub struct ChunkWriter<S> {
    sink: S,
    /// Payload start offset of every open chunk, innermost last.
    open_chunks: Vec<usize>,
}

impl ChunkWriter<MemorySink> {
    pub fn in_memory() -> Self {
        Self::new(MemorySink::new())
    }
}

impl<S> ChunkWriter<S>
where
    S: Sink,
{
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            open_chunks: vec![],
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Number of chunks currently open.
    pub fn depth(&self) -> usize {
        self.open_chunks.len()
    }

    /// Returns the sink, whatever state the chunk stack is in. Use [`ChunkWriter::finish`] to
    /// check that every chunk was closed.
    pub fn into_inner(self) -> S {
        self.sink
    }

    pub fn finish(self) -> Result<S, Error> {
        if let Some(&innermost) = self.open_chunks.last() {
            return Err(ErrorKind::UnclosedChunk.make(format!(
                "{} chunk(s) still open, innermost payload starts at {innermost}",
                self.open_chunks.len()
            )));
        }
        Ok(self.sink)
    }

    /// Starts a chunk. `id` is written as the tag verbatim, so the compression flag can be
    /// set by the caller.
    pub fn open_chunk(&mut self, id: u32) -> Result<(), Error> {
        let header = ChunkHeader::from_tag(id, 0);
        debug!(
            chunk_id = header.id,
            compressed = header.compressed,
            depth = self.open_chunks.len(),
            "Opening chunk"
        );
        self.write_u32(id)?;
        self.write_u32(0)?;
        self.open_chunks.push(self.sink.tell());
        Ok(())
    }

    /// Ends the innermost open chunk and back-patches its length. On failure the chunk stays
    /// open.
    pub fn close_chunk(&mut self) -> Result<(), Error> {
        let payload_start = *self
            .open_chunks
            .last()
            .ok_or_else(|| ErrorKind::EmptyChunkStack.make("close_chunk without open_chunk"))?;
        let end = self.sink.tell();
        let length = end
            .checked_sub(payload_start)
            .and_then(|length| u32::try_from(length).ok())
            .ok_or_else(|| {
                ErrorKind::SeekOutOfRange.make(format!(
                    "chunk payload started at {payload_start} but the cursor is at {end}"
                ))
            })?;
        trace!(length, payload_start, "Closing chunk");

        self.sink.seek(payload_start - 4)?;
        self.sink.write_bytes(&length.to_le_bytes())?;
        self.sink.seek(end)?;
        self.open_chunks.pop();
        Ok(())
    }

    /// Writes a whole chunk with `data` as its payload. The length is known up front, so the
    /// chunk stack is left alone.
    pub fn write_raw_chunk(&mut self, id: u32, data: &[u8]) -> Result<(), Error> {
        let size = u32::try_from(data.len()).map_err(|_| {
            ErrorKind::ChunkTooLarge.make(format!(
                "chunk {id} payload of {} bytes does not fit a u32 length",
                data.len()
            ))
        })?;
        let header = ChunkHeader::from_tag(id, size);
        trace!(chunk_id = header.id, size, "Writing raw chunk");
        self.write(&header)?;
        self.sink.write_bytes(data)
    }

    /// Compresses `data` with `codec` and writes it as a chunk flagged as compressed.
    pub fn write_compressed_chunk(
        &mut self,
        id: u32,
        data: &[u8],
        codec: &dyn Codec,
    ) -> Result<(), Error> {
        let compressed = codec
            .compress(data)
            .with_context(|| format!("cannot compress chunk {id}"))?;
        debug!(
            chunk_id = id,
            size = data.len(),
            compressed_size = compressed.len(),
            "Compressed chunk"
        );
        self.write_raw_chunk((id & CHUNK_ID_MASK) | CHUNK_COMPRESSED, &compressed)
    }

    /// Encrypts `data` with `scrambler` and writes it as a chunk.
    pub fn write_scrambled_chunk(
        &mut self,
        id: u32,
        data: &[u8],
        scrambler: &Scrambler,
    ) -> Result<(), Error> {
        self.write_raw_chunk(id, &scrambler.encrypt(data))
    }

    pub fn write_raw(&mut self, data: &[u8]) -> Result<(), Error> {
        self.sink.write_bytes(data)
    }

    pub fn write<T>(&mut self, value: &T) -> Result<(), Error>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    pub fn write_u8(&mut self, value: u8) -> Result<(), Error> {
        self.write(&value)
    }

    pub fn write_i8(&mut self, value: i8) -> Result<(), Error> {
        self.write(&value)
    }

    pub fn write_u16(&mut self, value: u16) -> Result<(), Error> {
        self.write(&value)
    }

    pub fn write_i16(&mut self, value: i16) -> Result<(), Error> {
        self.write(&value)
    }

    pub fn write_u32(&mut self, value: u32) -> Result<(), Error> {
        self.write(&value)
    }

    pub fn write_i32(&mut self, value: i32) -> Result<(), Error> {
        self.write(&value)
    }

    pub fn write_f32(&mut self, value: f32) -> Result<(), Error> {
        self.write(&value)
    }

    pub fn write_bool(&mut self, value: bool) -> Result<(), Error> {
        self.write(&value)
    }

    /// Low three bytes of `value`.
    pub fn write_u24(&mut self, value: u32) -> Result<(), Error> {
        self.write(&U24::truncating(value))
    }

    /// The bytes followed by a single zero terminator.
    pub fn write_sz(&mut self, string: impl AsRef<[u8]>) -> Result<(), Error> {
        serialize_sz(string.as_ref(), self)
    }

    /// The bytes followed by CR LF.
    pub fn write_line(&mut self, string: impl AsRef<[u8]>) -> Result<(), Error> {
        self.sink.write_bytes(string.as_ref())?;
        self.sink.write_bytes(b"\r\n")
    }

    /// Maps `value` from `min..=max` onto `0..=65535`. Values outside the range are not
    /// clamped and wrap around.
    pub fn write_float_q16(&mut self, value: f32, min: f32, max: f32) -> Result<(), Error> {
        let quantized = ((value - min) * 65535.0 / (max - min)) as i32 as u16;
        self.write_u16(quantized)
    }

    /// Maps `value` from `min..=max` onto `0..=255`, wrapping like
    /// [`ChunkWriter::write_float_q16`].
    pub fn write_float_q8(&mut self, value: f32, min: f32, max: f32) -> Result<(), Error> {
        let quantized = ((value - min) * 255.0 / (max - min)) as i32 as u8;
        self.write_u8(quantized)
    }
}

impl<S> Sink for ChunkWriter<S>
where
    S: Sink,
{
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.sink.write_bytes(bytes)
    }

    fn seek(&mut self, position: usize) -> Result<(), Error> {
        self.sink.seek(position)
    }

    fn tell(&self) -> usize {
        self.sink.tell()
    }
}

#[cfg(test)]
mod tests {
    use xrkit_core::binary::DryRunSink;

    use super::*;

    #[test]
    fn lengths_are_back_patched() {
        let mut writer = ChunkWriter::in_memory();
        writer.open_chunk(1).unwrap();
        writer.write_u16(0xbeef).unwrap();
        writer.open_chunk(2).unwrap();
        writer.close_chunk().unwrap();
        writer.close_chunk().unwrap();

        let bytes = writer.finish().unwrap().into_inner();
        assert_eq!(
            bytes,
            [1, 0, 0, 0, 10, 0, 0, 0, 0xef, 0xbe, 2, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn stack_misuse() {
        let mut writer = ChunkWriter::in_memory();
        assert_eq!(
            writer.close_chunk().unwrap_err().kind(),
            ErrorKind::EmptyChunkStack
        );
        writer.open_chunk(3).unwrap();
        assert_eq!(writer.depth(), 1);
        assert_eq!(
            writer.finish().unwrap_err().kind(),
            ErrorKind::UnclosedChunk
        );
    }

    #[test]
    fn failed_close_keeps_the_chunk_open() {
        let mut writer = ChunkWriter::in_memory();
        writer.open_chunk(1).unwrap();
        writer.write_u32(7).unwrap();
        writer.seek(2).unwrap();
        assert_eq!(
            writer.close_chunk().unwrap_err().kind(),
            ErrorKind::SeekOutOfRange
        );
        assert_eq!(writer.depth(), 1);

        writer.seek(12).unwrap();
        writer.close_chunk().unwrap();
        assert_eq!(writer.depth(), 0);
        assert_eq!(
            writer.finish().unwrap().into_inner(),
            [1, 0, 0, 0, 4, 0, 0, 0, 7, 0, 0, 0]
        );
    }

    #[test]
    fn strings_and_lines() {
        let mut writer = ChunkWriter::in_memory();
        writer.write_sz("a").unwrap();
        writer.write_sz(b"b\0").unwrap();
        writer.write_line("c").unwrap();
        assert_eq!(writer.into_inner().as_bytes(), b"a\0b\0c\r\n");
    }

    #[test]
    fn quantized_floats() {
        let mut writer = ChunkWriter::in_memory();
        writer.write_float_q16(1.0, 0.0, 1.0).unwrap();
        writer.write_float_q16(0.5, 0.0, 1.0).unwrap();
        writer.write_float_q8(-1.0, -1.0, 1.0).unwrap();
        writer.write_float_q8(1.0, -1.0, 1.0).unwrap();
        writer.write_u24(0x0102_0304).unwrap();
        assert_eq!(
            writer.into_inner().as_bytes(),
            [0xff, 0xff, 0xff, 0x7f, 0x00, 0xff, 0x04, 0x03, 0x02]
        );
    }

    #[test]
    fn dry_run_reports_the_same_size() {
        fn produce(writer: &mut ChunkWriter<impl Sink>) {
            writer.open_chunk(0).unwrap();
            writer.write_sz("spawn").unwrap();
            writer.open_chunk(1).unwrap();
            writer.write_f32(2.5).unwrap();
            writer.close_chunk().unwrap();
            writer.close_chunk().unwrap();
        }

        let mut real = ChunkWriter::in_memory();
        produce(&mut real);
        let mut dry = ChunkWriter::new(DryRunSink::new());
        produce(&mut dry);

        let dry = dry.finish().unwrap();
        assert_eq!(dry.high_water_mark(), real.finish().unwrap().len());
        assert_eq!(dry.tell(), dry.high_water_mark());
    }
}
