use rust_lzo::{LZOContext, LZOError};
use tracing::trace;
use xrkit_core::binary::{Error, ErrorKind};

/// Compression scheme for chunks flagged with [`crate::CHUNK_COMPRESSED`].
///
/// Readers hold a shared reference to their codec, so it must be `Sync` for readers to move
/// between threads.
pub trait Codec: Send + Sync {
    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>, Error>;
    fn compress(&self, input: &[u8]) -> Result<Vec<u8>, Error>;
}

/// LZO1X payloads, prefixed with the decompressed size as a little endian `u32`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LzoCodec;

impl LzoCodec {
    const SIZE_PREFIX: usize = 4;
    /// LZO1X cannot expand a stream by more than this factor. A larger declared size comes
    /// from a damaged or hostile prefix and is refused before anything is allocated.
    const MAX_RATIO: usize = 256;

    fn worst_case_size(input_size: usize) -> usize {
        input_size + input_size / 16 + 64 + 3
    }
}

impl Codec for LzoCodec {
    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>, Error> {
        if input.len() < Self::SIZE_PREFIX {
            return Err(ErrorKind::Codec.make(format!(
                "LZO payload of {} bytes is too short for its size prefix",
                input.len()
            )));
        }
        let (prefix, stream) = input.split_at(Self::SIZE_PREFIX);
        let expected_size =
            u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
        trace!(
            compressed_size = stream.len(),
            expected_size,
            "Decompressing LZO stream"
        );
        let limit = stream.len().saturating_mul(Self::MAX_RATIO);
        if expected_size > limit {
            return Err(ErrorKind::Codec.make(format!(
                "LZO stream of {} bytes cannot decompress to the declared {expected_size} bytes",
                stream.len()
            )));
        }

        let mut output = vec![0; expected_size];
        let (decompressed, result) = LZOContext::decompress_to_slice(stream, &mut output);
        let actual_size = decompressed.len();
        check(result)?;
        if actual_size != expected_size {
            return Err(ErrorKind::Codec.make(format!(
                "LZO stream decompressed to {actual_size} bytes, but {expected_size} were declared"
            )));
        }
        Ok(output)
    }

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>, Error> {
        let expected_size = u32::try_from(input.len()).map_err(|_| {
            ErrorKind::Codec.make(format!(
                "{} bytes cannot be described by a u32 size prefix",
                input.len()
            ))
        })?;

        let mut output = vec![0; Self::worst_case_size(input.len())];
        let mut context = LZOContext::new();
        let (compressed, result) = context.compress_to_slice(input, &mut output);
        let compressed_size = compressed.len();
        check(result)?;

        let mut payload = Vec::with_capacity(Self::SIZE_PREFIX + compressed_size);
        payload.extend_from_slice(&expected_size.to_le_bytes());
        payload.extend_from_slice(&output[..compressed_size]);
        trace!(
            size = input.len(),
            compressed_size,
            "Compressed LZO stream"
        );
        Ok(payload)
    }
}

fn check(result: LZOError) -> Result<(), Error> {
    let name = match result {
        LZOError::OK => return Ok(()),
        LZOError::ERROR => "ERROR",
        LZOError::OUT_OF_MEMORY => "OUT_OF_MEMORY",
        LZOError::NOT_COMPRESSIBLE => "NOT_COMPRESSIBLE",
        LZOError::INPUT_OVERRUN => "INPUT_OVERRUN",
        LZOError::OUTPUT_OVERRUN => "OUTPUT_OVERRUN",
        LZOError::LOOKBEHIND_OVERRUN => "LOOKBEHIND_OVERRUN",
        LZOError::EOF_NOT_FOUND => "EOF_NOT_FOUND",
        LZOError::INPUT_NOT_CONSUMED => "INPUT_NOT_CONSUMED",
        LZOError::NOT_YET_IMPLEMENTED => "NOT_YET_IMPLEMENTED",
        LZOError::INVALID_ARGUMENT => "INVALID_ARGUMENT",
    };
    Err(ErrorKind::Codec.make(format!("LZO error {name}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lzo_round_trip() {
        let input: Vec<u8> = b"level.ltx "
            .iter()
            .copied()
            .cycle()
            .take(600)
            .chain(0..=255)
            .collect();
        let payload = LzoCodec.compress(&input).unwrap();
        assert_eq!(&payload[..4], &(input.len() as u32).to_le_bytes());
        assert!(payload.len() < input.len());
        assert_eq!(LzoCodec.decompress(&payload).unwrap(), input);
    }

    #[test]
    fn truncated_payloads_are_codec_errors() {
        assert_eq!(
            LzoCodec.decompress(&[1, 0]).unwrap_err().kind(),
            ErrorKind::Codec
        );

        let mut payload = LzoCodec.compress(&[7; 100]).unwrap();
        payload[0] = 200;
        assert_eq!(
            LzoCodec.decompress(&payload).unwrap_err().kind(),
            ErrorKind::Codec
        );
    }

    #[test]
    fn implausible_size_prefix_is_refused() {
        let mut payload = 0xffff_fff0_u32.to_le_bytes().to_vec();
        payload.extend_from_slice(&[0x11, 0, 0, 0, 0, 0, 0, 0]);
        let error = LzoCodec.decompress(&payload).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Codec);
        assert!(error.to_string().contains("cannot decompress to the declared"));
    }
}
