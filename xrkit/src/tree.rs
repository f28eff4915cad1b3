use std::path::Path;

use anyhow::Context;
use tracing::{debug, info};
use walkdir::WalkDir;
use xrkit_chunk::{ChunkReader, LzoCodec};

use crate::layout::looks_like_chunks;

/// Bytes of a leaf payload shown next to its header.
const PREVIEW_LEN: usize = 16;

pub fn tree(path: &Path, max_depth: usize) -> anyhow::Result<()> {
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let filename = entry.path();
        let bytes = std::fs::read(filename)
            .with_context(|| format!("cannot read {filename:?}"))?;
        if !looks_like_chunks(&bytes) {
            debug!(?filename, "Not a chunk file, skipping");
            continue;
        }

        info!(?filename, size = bytes.len(), "Dumping chunk tree");
        println!("{}", filename.display());
        let reader = ChunkReader::new(&bytes).with_codec(&LzoCodec);
        print_chunks(&reader, 1, max_depth)
            .with_context(|| format!("cannot walk the chunks of {filename:?}"))?;
    }
    Ok(())
}

fn print_chunks(reader: &ChunkReader<'_>, depth: usize, max_depth: usize) -> anyhow::Result<()> {
    let indent = "  ".repeat(depth);
    for entry in reader.chunks() {
        let (header, chunk) = entry?;
        let compression = if header.compressed {
            format!(" (compressed, {} bytes unpacked)", chunk.len())
        } else {
            String::new()
        };
        let nested = looks_like_chunks(chunk.bytes());

        if nested && depth < max_depth {
            println!("{indent}[{}] {} bytes{compression}", header.id, header.size);
            print_chunks(&chunk, depth + 1, max_depth)?;
        } else {
            let preview = &chunk.bytes()[..chunk.len().min(PREVIEW_LEN)];
            println!(
                "{indent}[{}] {} bytes{compression} {preview:02x?}{}",
                header.id,
                header.size,
                if chunk.len() > PREVIEW_LEN { " ..." } else { "" }
            );
        }
    }
    Ok(())
}
