mod layout;
mod repack;
mod scramble;
mod tree;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use repack::{repack, Compression};
use scramble::{scramble, unscramble};
use tracing::{error, info, metadata::LevelFilter};
use tracing_subscriber::{prelude::*, EnvFilter};
use tree::tree;
use xrkit_scrambler::CipherConfig;

#[derive(Subcommand)]
enum Command {
    /// Print the chunk structure of a file, or of every chunk file under a directory.
    ///
    /// Payloads that parse as a run of chunks are expanded. Compressed chunks are unpacked with
    /// LZO before being inspected.
    Tree {
        /// File or directory to inspect.
        path: PathBuf,

        /// How many levels of nested chunks to expand.
        #[clap(long, default_value_t = 8)]
        max_depth: usize,
    },

    /// Encrypt a file with the resource cipher.
    Scramble {
        input: PathBuf,
        output: PathBuf,

        /// Cipher configuration: `ru` or `ww`.
        #[clap(long, default_value = "ru")]
        config: CipherConfig,

        /// Wrap the encrypted bytes in a chunk with this id.
        #[clap(long)]
        chunk: Option<u32>,
    },

    /// Decrypt a file encrypted with the resource cipher.
    Unscramble {
        input: PathBuf,
        output: PathBuf,

        /// Cipher configuration: `ru` or `ww`.
        #[clap(long, default_value = "ru")]
        config: CipherConfig,

        /// Only decrypt the payload of the chunk with this id.
        #[clap(long)]
        chunk: Option<u32>,
    },

    /// Rewrite a chunk file, optionally changing which chunks are compressed.
    Repack {
        input: PathBuf,
        output: PathBuf,

        #[clap(long, value_enum, default_value_t = Compression::Keep)]
        compression: Compression,

        /// Do not write anything. Only report the size the output would have.
        #[clap(long)]
        read_only: bool,
    },
}

#[derive(Parser)]
struct Args {
    /// Tool to run.
    #[clap(subcommand)]
    command: Command,
}

fn fallible_main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Tree { path, max_depth } => tree(&path, max_depth)?,
        Command::Scramble {
            input,
            output,
            config,
            chunk,
        } => scramble(&input, &output, config, chunk)?,
        Command::Unscramble {
            input,
            output,
            config,
            chunk,
        } => unscramble(&input, &output, config, chunk)?,
        Command::Repack {
            input,
            output,
            compression,
            read_only,
        } => repack(&input, &output, compression, read_only)?,
    }

    Ok(())
}

fn main() {
    let subscriber = tracing_subscriber::registry()
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::DEBUG.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer().without_time());
    tracing::subscriber::set_global_default(subscriber)
        .expect("cannot set default tracing subscriber");

    info!("X-Ray chunk toolkit version {}", env!("CARGO_PKG_VERSION"));

    match fallible_main() {
        Ok(_) => (),
        Err(err) => {
            error!("in fallible_main: {err:?}");
        }
    }
}
