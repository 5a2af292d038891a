//! Compact serialization helpers: segment splitting and unpadded base64url.

use base64_simd::URL_SAFE_NO_PAD as b64;
use memchr::memchr_iter;

use crate::error::Malformed;

/// Dot-delimited view over a compact-serialized token
///
/// Only the shapes JOSE defines are accepted: two segments (unsecured),
/// three (JWS) or five (JWE).
#[derive(Debug)]
pub(crate) struct Segments<'a> {
    data: &'a str,
    dots: [usize; 4],
    count: usize,
}

impl<'a> TryFrom<&'a str> for Segments<'a> {
    type Error = Malformed;
    fn try_from(value: &'a str) -> Result<Self, Self::Error> {
        let mut dots = [0; 4];
        let mut count = 1;
        for pos in memchr_iter(b'.', value.as_bytes()) {
            if let Some(slot) = dots.get_mut(count - 1) {
                *slot = pos;
            }
            count += 1;
        }
        match count {
            2 | 3 | 5 => Ok(Self { data: value, dots, count }),
            n => Err(Malformed::SegmentCount(n)),
        }
    }
}

impl<'a> Segments<'a> {
    /// Number of segments (2, 3 or 5)
    pub(crate) const fn len(&self) -> usize {
        self.count
    }

    /// Raw (still encoded) segment at `index`
    pub(crate) fn get(&self, index: usize) -> &'a str {
        let start = if index == 0 { 0 } else { self.dots[index - 1] + 1 };
        let end = if index + 1 == self.count {
            self.data.len()
        } else {
            self.dots[index]
        };
        &self.data[start..end]
    }

    /// Encoded header and payload joined by a dot; the JWS signing input
    pub(crate) fn signing_input(&self) -> &'a str {
        if self.count == 2 {
            self.data
        } else {
            &self.data[..self.dots[1]]
        }
    }
}

/// Decodes one unpadded base64url segment
pub(crate) fn decode(segment: &str) -> Result<Vec<u8>, Malformed> {
    let mut out = Vec::with_capacity(b64.estimated_decoded_length(segment.len()));
    b64.decode_append(segment.as_bytes(), &mut out)
        .map_err(|_| Malformed::Encoding)?;
    Ok(out)
}

/// Appends the unpadded base64url form of `data`
pub(crate) fn encode_append(data: impl AsRef<[u8]>, out: &mut String) {
    b64.encode_append(data, out);
}

/// Exact encoded length of `len` input bytes
pub(crate) fn encoded_length(len: usize) -> usize {
    b64.encoded_length(len)
}

/// Joins already-raw byte segments into a compact string
pub(crate) fn join(parts: &[&[u8]]) -> String {
    let capacity = parts.iter().map(|p| encoded_length(p.len()) + 1).sum();
    let mut out = String::with_capacity(capacity);
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.push('.');
        }
        encode_append(part, &mut out);
    }
    out
}
