use std::path::Path;

use anyhow::Context;
use tracing::info;
use xrkit_chunk::{ChunkReader, ChunkWriter};
use xrkit_scrambler::{CipherConfig, Scrambler};

/// Encrypts `input`. With `chunk_id` the result is wrapped in a single chunk of that id.
pub fn scramble(
    input: &Path,
    output: &Path,
    config: CipherConfig,
    chunk_id: Option<u32>,
) -> anyhow::Result<()> {
    let data = std::fs::read(input).with_context(|| format!("cannot read {input:?}"))?;
    let scrambler = Scrambler::shared(config);
    info!(?input, %config, size = data.len(), "Scrambling");

    let scrambled = match chunk_id {
        Some(id) => {
            let mut writer = ChunkWriter::in_memory();
            writer.write_scrambled_chunk(id, &data, scrambler)?;
            writer.finish()?.into_inner()
        }
        None => scrambler.encrypt(&data),
    };
    std::fs::write(output, scrambled).with_context(|| format!("cannot write {output:?}"))?;
    Ok(())
}

/// Decrypts `input`. With `chunk_id` only the payload of that chunk is decrypted.
pub fn unscramble(
    input: &Path,
    output: &Path,
    config: CipherConfig,
    chunk_id: Option<u32>,
) -> anyhow::Result<()> {
    let data = std::fs::read(input).with_context(|| format!("cannot read {input:?}"))?;
    let scrambler = Scrambler::shared(config);
    info!(?input, %config, size = data.len(), "Unscrambling");

    let plain = match chunk_id {
        Some(id) => {
            let mut reader = ChunkReader::new(&data);
            let chunk = reader
                .open_chunk_scrambled(id, scrambler)?
                .with_context(|| format!("{input:?} has no chunk {id}"))?;
            chunk.bytes().to_vec()
        }
        None => scrambler.decrypt(&data),
    };
    std::fs::write(output, plain).with_context(|| format!("cannot write {output:?}"))?;
    Ok(())
}
