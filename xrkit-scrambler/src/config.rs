use std::{fmt, str::FromStr};

use crate::Error;

/// Named cipher configurations shipped with the game builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherConfig {
    /// Russian release.
    Ru,
    /// Worldwide release.
    Ww,
}

pub(crate) struct Params {
    pub keystream_seed: i32,
    pub sbox_seed: i32,
    pub multiplier: usize,
}

impl CipherConfig {
    pub const ALL: [CipherConfig; 2] = [CipherConfig::Ru, CipherConfig::Ww];

    pub fn name(self) -> &'static str {
        match self {
            CipherConfig::Ru => "ru",
            CipherConfig::Ww => "ww",
        }
    }

    pub(crate) fn params(self) -> Params {
        match self {
            CipherConfig::Ru => Params {
                keystream_seed: 0x0131_a9d3,
                sbox_seed: 0x0132_9436,
                multiplier: 8,
            },
            CipherConfig::Ww => Params {
                keystream_seed: 0x016e_b2eb,
                sbox_seed: 0x005b_bc4b,
                multiplier: 4,
            },
        }
    }
}

impl FromStr for CipherConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|config| config.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownConfig(s.to_owned()))
    }
}

impl fmt::Display for CipherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
