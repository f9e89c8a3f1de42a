use std::io::{Read, Write};
use std::path::PathBuf;

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{Error, Result};

/// zlib-compress bytes with the default compression level
pub fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).map_err(|source| Error::Io {
        path: PathBuf::from("<zlib>"),
        source,
    })?;
    encoder.finish().map_err(|source| Error::Io {
        path: PathBuf::from("<zlib>"),
        source,
    })
}

/// decompress a zlib stream
///
/// malformed input is a corrupt object, not an io failure: the only
/// zlib streams this system reads are ones it wrote itself.
pub fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::CorruptObject(format!("bad zlib stream: {}", e)))?;
    Ok(out)
}
