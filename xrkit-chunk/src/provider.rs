//! Where chunk files come from and where they go.
//!
//! The reader and writer never open files themselves. Tools hand them bytes obtained from a
//! [`ByteSource`] and sinks obtained from a [`SinkProvider`]. Both report a missing resource or
//! a refused sink as `None`, which callers are expected to branch on.

use std::{
    borrow::Cow,
    collections::HashMap,
    fs::File,
    io::{Seek, SeekFrom, Write},
    path::{Component, Path, PathBuf},
};

use bitflags::bitflags;
use tracing::{debug, warn};
use xrkit_core::binary::{DryRunSink, Error, ErrorKind, ResultMapToBinaryErrorExt, Sink};

pub trait ByteSource {
    /// Full contents of the resource, or `None` if it cannot be read.
    fn read_resource(&self, name: &str) -> Option<Cow<'_, [u8]>>;
}

pub trait SinkProvider {
    /// A fresh, empty sink for the resource, or `None` if one cannot be created.
    fn create_sink(&self, name: &str) -> Option<Box<dyn Sink>>;

    /// Like [`SinkProvider::create_sink`], but a provider that only hands out measuring sinks
    /// under a read-only policy writes this one for real. Meant for side outputs such as logs.
    fn create_sink_ignoring_read_only(&self, name: &str) -> Option<Box<dyn Sink>> {
        self.create_sink(name)
    }
}

/// Resources kept in memory, keyed by name.
impl ByteSource for HashMap<String, Vec<u8>> {
    fn read_resource(&self, name: &str) -> Option<Cow<'_, [u8]>> {
        self.get(name).map(|bytes| Cow::Borrowed(bytes.as_slice()))
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FsFlags: u32 {
        /// Sinks only measure what would be written. Nothing touches the disk.
        const READ_ONLY = 0x1;
    }
}

/// Resources stored as files under a root directory.
#[derive(Debug, Clone)]
pub struct FileSystem {
    root: PathBuf,
    flags: FsFlags,
}

impl FileSystem {
    pub fn new(root: impl Into<PathBuf>, flags: FsFlags) -> Self {
        Self {
            root: root.into(),
            flags,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn flags(&self) -> FsFlags {
        self.flags
    }

    /// Path of `name` under the root. Names that are absolute or climb out with `..` resolve
    /// to `None`.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        let relative = Path::new(name);
        let contained = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        if !contained {
            warn!(name, root = ?self.root, "Resource name escapes the root");
            return None;
        }
        Some(self.root.join(relative))
    }

    fn create_file_sink(&self, path: &Path) -> Option<Box<dyn Sink>> {
        if let Some(parent) = path.parent() {
            if let Err(error) = std::fs::create_dir_all(parent) {
                warn!(?path, %error, "Cannot create parent directory");
                return None;
            }
        }
        match File::create(path) {
            Ok(file) => {
                debug!(?path, "Created file sink");
                Some(Box::new(FileSink::new(file)))
            }
            Err(error) => {
                warn!(?path, %error, "Cannot create file sink");
                None
            }
        }
    }
}

impl ByteSource for FileSystem {
    fn read_resource(&self, name: &str) -> Option<Cow<'_, [u8]>> {
        let path = self.resolve(name)?;
        match std::fs::read(&path) {
            Ok(bytes) => {
                debug!(?path, size = bytes.len(), "Read resource");
                Some(Cow::Owned(bytes))
            }
            Err(error) => {
                debug!(?path, %error, "Cannot read resource");
                None
            }
        }
    }
}

impl SinkProvider for FileSystem {
    fn create_sink(&self, name: &str) -> Option<Box<dyn Sink>> {
        let path = self.resolve(name)?;
        if self.flags.contains(FsFlags::READ_ONLY) {
            debug!(?path, "Read-only file system, handing out a dry-run sink");
            return Some(Box::new(DryRunSink::new()));
        }
        self.create_file_sink(&path)
    }

    fn create_sink_ignoring_read_only(&self, name: &str) -> Option<Box<dyn Sink>> {
        let path = self.resolve(name)?;
        self.create_file_sink(&path)
    }
}

/// Sink writing straight into a file.
#[derive(Debug)]
pub struct FileSink {
    file: File,
    position: usize,
    len: usize,
}

impl FileSink {
    /// `file` is expected to be empty.
    pub fn new(file: File) -> Self {
        Self {
            file,
            position: 0,
            len: 0,
        }
    }

    pub fn into_inner(self) -> File {
        self.file
    }
}

impl Sink for FileSink {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.file
            .write_all(bytes)
            .map_err_to_binary_error(ErrorKind::Io)?;
        self.position += bytes.len();
        self.len = self.len.max(self.position);
        Ok(())
    }

    fn seek(&mut self, position: usize) -> Result<(), Error> {
        if position > self.len {
            return Err(ErrorKind::SeekOutOfRange.make(format!(
                "cannot seek to {position} in a file of {} bytes",
                self.len
            )));
        }
        self.file
            .seek(SeekFrom::Start(position as u64))
            .map_err_to_binary_error(ErrorKind::Io)?;
        self.position = position;
        Ok(())
    }

    fn tell(&self) -> usize {
        self.position
    }
}
