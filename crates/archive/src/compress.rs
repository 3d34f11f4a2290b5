//! Media blob compression.
//!
//! Blobs are deflated (zlib) at write time and inflated at read time,
//! guarded by a stored flag. Either direction degrades gracefully: a
//! compression failure stores the raw bytes with the flag cleared, and a
//! corrupt compressed blob decompresses to its stored bytes rather than
//! erroring.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use tracing::warn;

/// The result of compressing a blob for storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compressed {
    pub data: Vec<u8>,
    /// Whether `data` is actually deflated. Cleared when compression failed.
    pub compressed: bool,
}

/// Deflate `raw` for storage.
#[must_use]
pub fn compress(raw: &[u8]) -> Compressed {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    let result = encoder.write_all(raw).and_then(|()| encoder.finish());
    match result {
        Ok(data) => Compressed {
            data,
            compressed: true,
        },
        Err(err) => {
            warn!(error = %err, "media compression failed, storing raw bytes");
            Compressed {
                data: raw.to_vec(),
                compressed: false,
            }
        }
    }
}

/// Inflate a stored blob according to its flag.
#[must_use]
pub fn decompress(stored: &[u8], compressed: bool) -> Vec<u8> {
    if !compressed {
        return stored.to_vec();
    }
    let mut decoder = ZlibDecoder::new(stored);
    let mut out = Vec::new();
    match decoder.read_to_end(&mut out) {
        Ok(_) => out,
        Err(err) => {
            warn!(error = %err, "media decompression failed, returning stored bytes");
            stored.to_vec()
        }
    }
}
