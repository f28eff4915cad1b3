use std::fmt;

use once_cell::sync::Lazy;
use tracing::debug;

use crate::{CipherConfig, Error};

pub const SBOX_SIZE: usize = 256;

const SEED_MULT: i32 = 0x0808_8405;

fn next_seed(seed: i32) -> i32 {
    seed.wrapping_mul(SEED_MULT).wrapping_add(1)
}

fn top_byte(seed: i32) -> u8 {
    (seed >> 24) as u8
}

static RU: Lazy<Scrambler> = Lazy::new(|| Scrambler::new(CipherConfig::Ru));
static WW: Lazy<Scrambler> = Lazy::new(|| Scrambler::new(CipherConfig::Ww));

/// Byte-substitution stream cipher.
///
/// Every call starts again from the configuration's keystream seed, so the output for a given
/// input never depends on earlier calls.
#[derive(Clone)]
pub struct Scrambler {
    config: CipherConfig,
    seed: i32,
    enc_sbox: [u8; SBOX_SIZE],
    dec_sbox: [u8; SBOX_SIZE],
}

impl Scrambler {
    pub fn new(config: CipherConfig) -> Self {
        let params = config.params();
        debug!(%config, "Building substitution boxes");
        let (enc_sbox, dec_sbox) = build_sboxes(params.sbox_seed, params.multiplier);
        Self {
            config,
            seed: params.keystream_seed,
            enc_sbox,
            dec_sbox,
        }
    }

    /// Process-wide instance, built on first use.
    pub fn shared(config: CipherConfig) -> &'static Scrambler {
        match config {
            CipherConfig::Ru => &*RU,
            CipherConfig::Ww => &*WW,
        }
    }

    pub fn config(&self) -> CipherConfig {
        self.config
    }

    pub fn enc_sbox(&self) -> &[u8; SBOX_SIZE] {
        &self.enc_sbox
    }

    pub fn dec_sbox(&self) -> &[u8; SBOX_SIZE] {
        &self.dec_sbox
    }

    fn keystream(&self) -> impl Iterator<Item = u8> {
        std::iter::successors(Some(next_seed(self.seed)), |&seed| Some(next_seed(seed)))
            .map(top_byte)
    }

    pub fn encrypt_in_place(&self, data: &mut [u8]) {
        for (byte, key) in data.iter_mut().zip(self.keystream()) {
            *byte = self.enc_sbox[*byte as usize] ^ key;
        }
    }

    pub fn decrypt_in_place(&self, data: &mut [u8]) {
        for (byte, key) in data.iter_mut().zip(self.keystream()) {
            *byte = self.dec_sbox[(*byte ^ key) as usize];
        }
    }

    pub fn encrypt(&self, input: &[u8]) -> Vec<u8> {
        let mut output = input.to_vec();
        self.encrypt_in_place(&mut output);
        output
    }

    pub fn decrypt(&self, input: &[u8]) -> Vec<u8> {
        let mut output = input.to_vec();
        self.decrypt_in_place(&mut output);
        output
    }

    pub fn encrypt_into(&self, output: &mut [u8], input: &[u8]) -> Result<(), Error> {
        check_lengths(output, input)?;
        output.copy_from_slice(input);
        self.encrypt_in_place(output);
        Ok(())
    }

    pub fn decrypt_into(&self, output: &mut [u8], input: &[u8]) -> Result<(), Error> {
        check_lengths(output, input)?;
        output.copy_from_slice(input);
        self.decrypt_in_place(output);
        Ok(())
    }
}

impl fmt::Debug for Scrambler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scrambler")
            .field("config", &self.config)
            .field("seed", &format_args!("{:#010x}", self.seed))
            .finish_non_exhaustive()
    }
}

fn check_lengths(output: &[u8], input: &[u8]) -> Result<(), Error> {
    if output.len() != input.len() {
        return Err(Error::LengthMismatch {
            input: input.len(),
            output: output.len(),
        });
    }
    Ok(())
}

/// Shuffles the identity permutation with `multiplier * 256` swaps of two distinct entries
/// chosen by the seed, then inverts it.
fn build_sboxes(mut seed: i32, multiplier: usize) -> ([u8; SBOX_SIZE], [u8; SBOX_SIZE]) {
    let mut enc_sbox = [0; SBOX_SIZE];
    for (i, slot) in enc_sbox.iter_mut().enumerate() {
        *slot = i as u8;
    }

    for _ in 0..multiplier * SBOX_SIZE {
        seed = next_seed(seed);
        let a = top_byte(seed);
        let b = loop {
            seed = next_seed(seed);
            let b = top_byte(seed);
            if b != a {
                break b;
            }
        };
        enc_sbox.swap(a as usize, b as usize);
    }

    let mut dec_sbox = [0; SBOX_SIZE];
    for (i, &substituted) in enc_sbox.iter().enumerate() {
        dec_sbox[substituted as usize] = i as u8;
    }
    (enc_sbox, dec_sbox)
}
