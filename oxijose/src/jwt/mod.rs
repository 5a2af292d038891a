//! Compact-serialized JWTs
//!
//! [`Jwt`] is the tagged union of the five token shapes. Each variant owns its
//! header(s), its payload and the raw segments it was built or reconstructed
//! from, so [`Jwt::build`] and every signature or tag check operate on the exact
//! transmitted bytes, never on a re-serialization.
//!
//! Tokens are immutable once built or reconstructed. Claims of signed or
//! encrypted tokens are only handed out after the signature or tag has been
//! checked.
mod encrypted;
mod nested;
mod plaintext;
mod signed;

use std::fmt;

pub use encrypted::EncryptedJwt;
pub use nested::{
    EncryptedThenSignedJwt,
    SignedThenEncryptedJwt,
};
pub use plaintext::PlaintextJwt;
pub use signed::SignedJwt;
use tracing::debug;

use crate::{
    compact::{
        self,
        Segments,
    },
    error::{
        JoseError,
        Malformed,
    },
    header::{
        Cty,
        Header,
        Typ,
    },
    json::ParserConfig,
};

/// Shape of a compact-serialized token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JwtKind {
    /// `header.payload`, `alg: none`
    Plaintext,
    /// `header.payload.signature`
    Signed,
    /// `header.encryptedKey.iv.ciphertext.tag`
    Encrypted,
    /// JWE whose plaintext is a JWS
    SignedThenEncrypted,
    /// JWS whose payload is a JWE
    EncryptedThenSigned,
}

impl fmt::Display for JwtKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Plaintext => "plaintext",
            Self::Signed => "signed",
            Self::Encrypted => "encrypted",
            Self::SignedThenEncrypted => "signed-then-encrypted",
            Self::EncryptedThenSigned => "encrypted-then-signed",
        })
    }
}

/// Any JWT, as built or reconstructed
#[derive(Debug, Clone)]
pub enum Jwt {
    /// Unsecured token
    Plaintext(PlaintextJwt),
    /// JWS
    Signed(SignedJwt),
    /// JWE
    Encrypted(EncryptedJwt),
    /// JWE carrying a JWS
    SignedThenEncrypted(SignedThenEncryptedJwt),
    /// JWS carrying a JWE
    EncryptedThenSigned(EncryptedThenSignedJwt),
}

impl Jwt {
    /// Reconstructs a token, selecting the variant by segment count and header
    ///
    /// - two segments, or three with `alg: none`: [`Jwt::Plaintext`]
    /// - three segments whose `cty` is `JWE` or `JWT`, or whose `typ` is `JWE`:
    ///   [`Jwt::EncryptedThenSigned`]
    /// - other three-segment tokens: [`Jwt::Signed`]
    /// - five segments whose `cty` is `JWT`: [`Jwt::SignedThenEncrypted`]
    /// - other five-segment tokens: [`Jwt::Encrypted`]
    ///
    /// No signature or tag is checked here; use the variant's `verify` or
    /// `decrypt` method.
    ///
    /// # Errors
    ///
    /// - [`JoseError::MalformedToken`] for a wrong segment count, bad base64url,
    ///   bad or duplicate-keyed JSON, a required header parameter that is absent,
    ///   or an unsecured token carrying a signature
    /// - [`JoseError::UnknownAlgorithm`] for an unregistered `alg`, `enc` or `zip`
    /// - [`JoseError::TypeMismatch`] for a reserved parameter of the wrong type
    pub fn reconstruct(token: &str, config: &ParserConfig) -> Result<Self, JoseError> {
        let result = Self::dispatch(token, config);
        match &result {
            Ok(jwt) => debug!(kind = %jwt.kind(), "reconstructed token"),
            Err(JoseError::MalformedToken(reason)) => debug!(%reason, "rejected malformed token"),
            Err(_) => {}
        }
        result
    }

    fn dispatch(token: &str, config: &ParserConfig) -> Result<Self, JoseError> {
        let (segments, header) = split_with_header(token, config)?;
        match segments.len() {
            5 => {
                if cty_is(&header, "JWT") {
                    SignedThenEncryptedJwt::from_parts(token, &segments, header, config)
                        .map(Self::SignedThenEncrypted)
                } else {
                    EncryptedJwt::from_parts(token, &segments, header, config).map(Self::Encrypted)
                }
            }
            3 if header.is_unsecured() => {
                PlaintextJwt::from_parts(token, &segments, header, config).map(Self::Plaintext)
            }
            3 if cty_is(&header, "JWE") || cty_is(&header, "JWT") || typ_is(&header, "JWE") => {
                EncryptedThenSignedJwt::from_parts(token, &segments, header, config)
                    .map(Self::EncryptedThenSigned)
            }
            3 => SignedJwt::from_parts(token, &segments, header, config).map(Self::Signed),
            _ => PlaintextJwt::from_parts(token, &segments, header, config).map(Self::Plaintext),
        }
    }

    /// Compact serialization, exactly as built or received
    #[must_use]
    pub fn build(&self) -> &str {
        match self {
            Self::Plaintext(jwt) => jwt.build(),
            Self::Signed(jwt) => jwt.build(),
            Self::Encrypted(jwt) => jwt.build(),
            Self::SignedThenEncrypted(jwt) => jwt.build(),
            Self::EncryptedThenSigned(jwt) => jwt.build(),
        }
    }

    /// Outermost header
    #[must_use]
    pub fn header(&self) -> &Header {
        match self {
            Self::Plaintext(jwt) => jwt.header(),
            Self::Signed(jwt) => jwt.header(),
            Self::Encrypted(jwt) => jwt.header(),
            Self::SignedThenEncrypted(jwt) => jwt.header(),
            Self::EncryptedThenSigned(jwt) => jwt.header(),
        }
    }

    /// Shape of the token
    #[must_use]
    pub const fn kind(&self) -> JwtKind {
        match self {
            Self::Plaintext(_) => JwtKind::Plaintext,
            Self::Signed(_) => JwtKind::Signed,
            Self::Encrypted(_) => JwtKind::Encrypted,
            Self::SignedThenEncrypted(_) => JwtKind::SignedThenEncrypted,
            Self::EncryptedThenSigned(_) => JwtKind::EncryptedThenSigned,
        }
    }
}

impl fmt::Display for Jwt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.build())
    }
}

impl From<PlaintextJwt> for Jwt {
    fn from(value: PlaintextJwt) -> Self {
        Self::Plaintext(value)
    }
}

impl From<SignedJwt> for Jwt {
    fn from(value: SignedJwt) -> Self {
        Self::Signed(value)
    }
}

impl From<EncryptedJwt> for Jwt {
    fn from(value: EncryptedJwt) -> Self {
        Self::Encrypted(value)
    }
}

impl From<SignedThenEncryptedJwt> for Jwt {
    fn from(value: SignedThenEncryptedJwt) -> Self {
        Self::SignedThenEncrypted(value)
    }
}

impl From<EncryptedThenSignedJwt> for Jwt {
    fn from(value: EncryptedThenSignedJwt) -> Self {
        Self::EncryptedThenSigned(value)
    }
}

/// Size check, segment split and header decode shared by every variant
fn split_with_header<'a>(
    token: &'a str,
    config: &ParserConfig,
) -> Result<(Segments<'a>, Header), JoseError> {
    config.check_token_size(token.len())?;
    let segments = Segments::try_from(token)?;
    let header = Header::from_json(&compact::decode(segments.get(0))?, config)?;
    Ok((segments, header))
}

fn expect_segments(segments: &Segments<'_>, counts: &[usize]) -> Result<(), Malformed> {
    if counts.contains(&segments.len()) {
        Ok(())
    } else {
        Err(Malformed::SegmentCount(segments.len()))
    }
}

/// Resolves a header parameter the token shape cannot do without
///
/// Absent is malformed; present but from the other registry (e.g. a JWS `alg`
/// on a JWE) is unsupported.
fn required<T>(value: Option<T>, header: &Header, name: &'static str) -> Result<T, JoseError> {
    value.ok_or_else(|| {
        header.get(name).map_or_else(
            || Malformed::MissingParameter(name).into(),
            |v| JoseError::UnsupportedOperation(format!("'{name}' {v} is not valid for this token")),
        )
    })
}

/// Built tokens declare `typ: JWT` unless the caller chose a type
fn default_typ(header: &mut Header) {
    if !header.contains("typ") {
        header.set_typ("JWT");
    }
}

fn cty_is(header: &Header, value: &str) -> bool {
    header.cty().is_some_and(|cty| cty.eq_ignore_ascii_case(value))
}

fn typ_is(header: &Header, value: &str) -> bool {
    header.typ().is_some_and(|typ| typ.eq_ignore_ascii_case(value))
}

fn nested_token(payload: &[u8]) -> Result<&str, Malformed> {
    std::str::from_utf8(payload).map_err(|_| Malformed::Encoding)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::{
        Jwt,
        JwtKind,
    };
    use crate::{
        Algorithm,
        EncryptionMethod,
        JweAlgorithm,
        claims::{
            ClaimsSet,
            IntDate,
        },
        crypto::openssl::HmacKey,
        error::{
            JoseError,
            Malformed,
        },
        header::{
            Cty,
            Header,
        },
        json::ParserConfig,
        jwe::JweKey,
        jwt::{
            EncryptedJwt,
            EncryptedThenSignedJwt,
            PlaintextJwt,
            SignedJwt,
            SignedThenEncryptedJwt,
        },
    };

    fn claims() -> ClaimsSet {
        let mut claims = ClaimsSet::new();
        claims.set_sub("alice").unwrap().set_exp(IntDate::from_secs(1_700_000_000));
        claims
    }

    #[test]
    fn segment_count_dispatch() {
        let config = ParserConfig::default();
        // {"alg":"none"}.{}
        let jwt = Jwt::reconstruct("eyJhbGciOiJub25lIn0.e30", &config).unwrap();
        assert_eq!(jwt.kind(), JwtKind::Plaintext);
        let jwt = Jwt::reconstruct("eyJhbGciOiJub25lIn0.e30.", &config).unwrap();
        assert_eq!(jwt.kind(), JwtKind::Plaintext);

        let key = HmacKey::hs256(b"secret").unwrap();
        let signed = SignedJwt::sign(Header::jws(Algorithm::HS256), claims(), &key).unwrap();
        let jwt = Jwt::reconstruct(signed.build(), &config).unwrap();
        assert_eq!(jwt.kind(), JwtKind::Signed);

        let cek = [4u8; 32];
        let encrypted = EncryptedJwt::encrypt(
            Header::jwe(JweAlgorithm::Dir, EncryptionMethod::A256Gcm),
            &claims(),
            JweKey::from(&cek),
        )
        .unwrap();
        let jwt = Jwt::reconstruct(encrypted.build(), &config).unwrap();
        assert_eq!(jwt.kind(), JwtKind::Encrypted);

        for token in ["", "e30", "a.b.c.d", "a.b.c.d.e.f"] {
            let err = Jwt::reconstruct(token, &config).unwrap_err();
            assert!(
                matches!(err, JoseError::MalformedToken(Malformed::SegmentCount(_))),
                "{token}: {err:?}"
            );
        }
    }

    #[test]
    fn nested_dispatch() {
        let config = ParserConfig::default();
        let key = HmacKey::hs256(b"secret").unwrap();
        let cek = [4u8; 32];

        let signed = SignedJwt::sign(Header::jws(Algorithm::HS256), claims(), &key).unwrap();
        let outer = SignedThenEncryptedJwt::encrypt(
            &signed,
            Header::jwe(JweAlgorithm::Dir, EncryptionMethod::A256Gcm),
            JweKey::from(&cek),
        )
        .unwrap();
        let jwt = Jwt::reconstruct(outer.build(), &config).unwrap();
        assert_eq!(jwt.kind(), JwtKind::SignedThenEncrypted);
        assert_eq!(jwt.header().cty(), Some("JWT"));

        let encrypted = EncryptedJwt::encrypt(
            Header::jwe(JweAlgorithm::Dir, EncryptionMethod::A256Gcm),
            &claims(),
            JweKey::from(&cek),
        )
        .unwrap();
        let outer =
            EncryptedThenSignedJwt::sign(&encrypted, Header::jws(Algorithm::HS256), &key).unwrap();
        let jwt = Jwt::reconstruct(outer.build(), &config).unwrap();
        assert_eq!(jwt.kind(), JwtKind::EncryptedThenSigned);
        assert_eq!(jwt.to_string(), outer.build());
    }

    #[test]
    fn five_segments_require_enc() {
        // {"alg":"dir"}
        let err = Jwt::reconstruct("eyJhbGciOiJkaXIifQ....", &ParserConfig::default()).unwrap_err();
        assert_eq!(err, JoseError::MalformedToken(Malformed::MissingParameter("enc")));
    }

    #[test]
    fn unsecured_token_with_signature_rejected() {
        let err =
            Jwt::reconstruct("eyJhbGciOiJub25lIn0.e30.U0lH", &ParserConfig::default()).unwrap_err();
        assert_eq!(err, JoseError::MalformedToken(Malformed::UnsecuredSignature));
    }

    #[test]
    fn size_threshold() {
        let config = ParserConfig::default().with_max_token_size(10);
        let err = Jwt::reconstruct("eyJhbGciOiJub25lIn0.e30", &config).unwrap_err();
        assert_eq!(err, JoseError::MalformedToken(Malformed::OverSizeThreshold));
    }

    #[test]
    fn header_of_every_variant() {
        let plaintext = PlaintextJwt::new(Header::new(), claims()).unwrap();
        let jwt = Jwt::from(plaintext);
        assert!(jwt.header().is_unsecured());
        assert_eq!(jwt.build().matches('.').count(), 1);
    }
}
