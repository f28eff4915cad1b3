//! Keyed substitution stream cipher used by the engine to obfuscate text resources.
//!
//! This is obfuscation, not encryption. There is no nonce and the keystream depends only on
//! the configuration, so equal inputs always produce equal outputs.

mod config;
mod scrambler;

pub use config::CipherConfig;
pub use scrambler::{Scrambler, SBOX_SIZE};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown cipher configuration {0:?} (expected one of: ru, ww)")]
    UnknownConfig(String),
    #[error("output buffer holds {output} bytes but the input has {input}")]
    LengthMismatch { input: usize, output: usize },
}
