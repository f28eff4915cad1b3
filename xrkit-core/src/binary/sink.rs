use super::{Error, ErrorKind};

/// Destination for written bytes.
///
/// Writes land at the cursor. `seek` may only move the cursor inside the range that has
/// already been written, which is all the chunk writer needs to back-patch lengths.
pub trait Sink {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Error>;
    fn seek(&mut self, position: usize) -> Result<(), Error>;
    fn tell(&self) -> usize;
}

impl<S> Sink for &mut S
where
    S: Sink + ?Sized,
{
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        (**self).write_bytes(bytes)
    }

    fn seek(&mut self, position: usize) -> Result<(), Error> {
        (**self).seek(position)
    }

    fn tell(&self) -> usize {
        (**self).tell()
    }
}

impl<S> Sink for Box<S>
where
    S: Sink + ?Sized,
{
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        (**self).write_bytes(bytes)
    }

    fn seek(&mut self, position: usize) -> Result<(), Error> {
        (**self).seek(position)
    }

    fn tell(&self) -> usize {
        (**self).tell()
    }
}

/// Growable in-memory buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySink {
    buffer: Vec<u8>,
    position: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }

    /// Hands the whole buffer to another sink, usually one obtained from a sink provider.
    pub fn save_to(&self, destination: &mut (impl Sink + ?Sized)) -> Result<(), Error> {
        destination.write_bytes(&self.buffer)
    }
}

impl Sink for MemorySink {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let end = self.position + bytes.len();
        if end > self.buffer.len() {
            self.buffer.resize(end, 0);
        }
        self.buffer[self.position..end].copy_from_slice(bytes);
        self.position = end;
        Ok(())
    }

    fn seek(&mut self, position: usize) -> Result<(), Error> {
        if position > self.buffer.len() {
            return Err(ErrorKind::SeekOutOfRange.make(format!(
                "cannot seek to {position} in a buffer of {} bytes",
                self.buffer.len()
            )));
        }
        self.position = position;
        Ok(())
    }

    fn tell(&self) -> usize {
        self.position
    }
}

/// Sink that stores nothing and only measures how much would have been written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DryRunSink {
    position: usize,
    high_water_mark: usize,
}

impl DryRunSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size a real sink would have after the same writes.
    pub fn high_water_mark(&self) -> usize {
        self.high_water_mark
    }
}

impl Sink for DryRunSink {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.position += bytes.len();
        self.high_water_mark = self.high_water_mark.max(self.position);
        Ok(())
    }

    fn seek(&mut self, position: usize) -> Result<(), Error> {
        if position > self.high_water_mark {
            return Err(ErrorKind::SeekOutOfRange.make(format!(
                "cannot seek to {position}, only {} bytes were written",
                self.high_water_mark
            )));
        }
        self.position = position;
        Ok(())
    }

    fn tell(&self) -> usize {
        self.position
    }
}
