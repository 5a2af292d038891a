//! `zip: DEF` payload compression

use std::io::{
    Read,
    Write,
};

use flate2::{
    Compression,
    read::DeflateDecoder,
    write::DeflateEncoder,
};

use crate::error::{
    JoseError,
    Malformed,
};

/// Raw DEFLATE (RFC 1951), no zlib or gzip framing
pub(crate) fn deflate(data: &[u8]) -> Result<Vec<u8>, JoseError> {
    let mut encoder = DeflateEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder
        .write_all(data)
        .and_then(|()| encoder.finish())
        .map_err(|e| JoseError::Crypto(format!("deflate failed: {e}")))
}

/// Inflates `data`, refusing output beyond `limit` octets
///
/// # Errors
///
/// - [`JoseError::DecryptionFailed`] when `data` is not a valid DEFLATE stream
/// - [`Malformed::OverSizeThreshold`] when the output exceeds `limit`
pub(crate) fn inflate(data: &[u8], limit: usize) -> Result<Vec<u8>, JoseError> {
    let mut out = Vec::with_capacity(data.len().saturating_mul(2).min(limit));
    DeflateDecoder::new(data)
        .take((limit as u64).saturating_add(1))
        .read_to_end(&mut out)
        .map_err(|_| JoseError::DecryptionFailed)?;
    if out.len() > limit {
        return Err(Malformed::OverSizeThreshold.into());
    }
    Ok(out)
}
