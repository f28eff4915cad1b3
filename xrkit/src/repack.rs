use std::path::Path;

use anyhow::{anyhow, Context};
use clap::ValueEnum;
use tracing::{debug, info};
use xrkit_chunk::{
    binary::{Error, Sink},
    provider::{ByteSource, FileSystem, FsFlags, SinkProvider},
    ChunkReader, ChunkWriter, LzoCodec,
};

use crate::layout::looks_like_chunks;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Compression {
    /// Compress the chunks that were compressed in the input.
    Keep,
    /// Compress every top-level chunk.
    All,
    /// Store every chunk uncompressed.
    None,
}

impl Compression {
    fn applies(self, was_compressed: bool) -> bool {
        match self {
            Compression::Keep => was_compressed,
            Compression::All => true,
            Compression::None => false,
        }
    }
}

/// Rewrites a chunk file through the chunk writer.
///
/// Nested chunks are rebuilt with back-patched lengths. With `read_only` the output goes to a
/// dry-run sink, so only the size of the result is reported.
pub fn repack(
    input: &Path,
    output: &Path,
    compression: Compression,
    read_only: bool,
) -> anyhow::Result<()> {
    let (source, input_name) = split_resource_path(input, FsFlags::empty())?;
    let flags = if read_only {
        FsFlags::READ_ONLY
    } else {
        FsFlags::empty()
    };
    let (target, output_name) = split_resource_path(output, flags)?;

    let bytes = source
        .read_resource(&input_name)
        .with_context(|| format!("cannot read {input:?}"))?;
    let sink = target
        .create_sink(&output_name)
        .with_context(|| format!("cannot create {output:?}"))?;

    info!(?input, ?output, ?compression, read_only, "Repacking");
    let reader = ChunkReader::new(&bytes).with_codec(&LzoCodec);
    let mut writer = ChunkWriter::new(sink);
    copy_chunks(&reader, &mut writer, compression).context("cannot repack chunks")?;
    let sink = writer.finish()?;

    if read_only {
        println!("{} bytes would be written to {}", sink.tell(), output.display());
    } else {
        println!("{} bytes written to {}", sink.tell(), output.display());
    }
    Ok(())
}

fn split_resource_path(path: &Path, flags: FsFlags) -> anyhow::Result<(FileSystem, String)> {
    let name = path
        .file_name()
        .ok_or_else(|| anyhow!("{path:?} does not name a file"))?
        .to_string_lossy()
        .into_owned();
    let root = path.parent().unwrap_or(Path::new("."));
    Ok((FileSystem::new(root, flags), name))
}

fn copy_chunks(
    reader: &ChunkReader<'_>,
    writer: &mut ChunkWriter<impl Sink>,
    compression: Compression,
) -> Result<(), Error> {
    for entry in reader.chunks() {
        let (header, chunk) = entry?;
        let payload = chunk.bytes();

        if compression.applies(header.compressed) {
            writer.write_compressed_chunk(header.id, payload, &LzoCodec)?;
        } else if looks_like_chunks(payload) {
            debug!(chunk_id = header.id, "Rebuilding nested chunk");
            writer.open_chunk(header.id)?;
            copy_chunks(&chunk, writer, compression)?;
            writer.close_chunk()?;
        } else {
            writer.write_raw_chunk(header.id, payload)?;
        }
    }
    Ok(())
}
