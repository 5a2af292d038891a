use tracing::debug;

use crate::{
    CompressionAlgorithm,
    EncryptionMethod,
    JweAlgorithm,
    claims::ClaimsSet,
    compact::{
        self,
        Segments,
    },
    error::JoseError,
    header::{
        Enc,
        Header,
        KeyAlg,
        Zip,
    },
    json::ParserConfig,
    jwe::{
        JweEncryption,
        JweHandler,
        JweKey,
        deflate,
        inflate,
    },
    jwt::{
        default_typ,
        expect_segments,
        required,
        split_with_header,
    },
};

/// JWE in compact serialization
///
/// The additional authenticated data is the encoded header exactly as it appears
/// in the token.
#[derive(Debug, Clone)]
pub struct EncryptedJwt {
    header: Header,
    alg: JweAlgorithm,
    enc: EncryptionMethod,
    zip: Option<CompressionAlgorithm>,
    compact: String,
    aad_len: usize,
    encrypted_key: Vec<u8>,
    iv: Vec<u8>,
    encryption: JweEncryption,
    config: ParserConfig,
}

impl EncryptedJwt {
    /// Encrypts `claims` under the `alg` and `enc` named by `header`
    ///
    /// # Errors
    ///
    /// - [`JoseError::UnsupportedOperation`] when `header` lacks a JWE `alg` or `enc`,
    ///   or `key` is of the wrong kind
    /// - [`JoseError::InvalidKey`] when `key` does not fit the algorithm
    /// - [`JoseError::Crypto`] when the backend fails
    pub fn encrypt(header: Header, claims: &ClaimsSet, key: JweKey<'_>) -> Result<Self, JoseError> {
        Self::seal(header, &claims.to_json()?, key)
    }

    pub(crate) fn seal(
        mut header: Header,
        payload: &[u8],
        key: JweKey<'_>,
    ) -> Result<Self, JoseError> {
        let alg = header.key_alg().ok_or_else(|| {
            JoseError::UnsupportedOperation("header has no JWE 'alg'".into())
        })?;
        let enc = header
            .enc()
            .ok_or_else(|| JoseError::UnsupportedOperation("header has no 'enc'".into()))?;
        let zip = header.zip();
        default_typ(&mut header);

        let compressed;
        let plaintext = match zip {
            Some(CompressionAlgorithm::Deflate) => {
                compressed = deflate(payload)?;
                &compressed[..]
            }
            None => payload,
        };

        let mut compact = String::new();
        compact::encode_append(header.to_json()?, &mut compact);
        let aad_len = compact.len();
        let sealed = JweHandler::new(alg, enc).seal(key, plaintext, compact.as_bytes())?;
        for part in [
            &sealed.encrypted_key[..],
            &sealed.iv[..],
            sealed.encryption.ciphertext(),
            sealed.encryption.authentication_tag(),
        ] {
            compact.push('.');
            compact::encode_append(part, &mut compact);
        }
        debug!(kind = "encrypted", %alg, %enc, "built token");

        Ok(Self {
            header,
            alg,
            enc,
            zip,
            compact,
            aad_len,
            encrypted_key: sealed.encrypted_key,
            iv: sealed.iv,
            encryption: sealed.encryption,
            config: ParserConfig::default(),
        })
    }

    /// Reconstructs a five-segment JWE
    ///
    /// `config` is retained and applied to the decrypted payload.
    ///
    /// # Errors
    ///
    /// See [`Jwt::reconstruct`](crate::jwt::Jwt::reconstruct).
    pub fn reconstruct(token: &str, config: &ParserConfig) -> Result<Self, JoseError> {
        let (segments, header) = split_with_header(token, config)?;
        Self::from_parts(token, &segments, header, config)
    }

    pub(crate) fn from_parts(
        token: &str,
        segments: &Segments<'_>,
        header: Header,
        config: &ParserConfig,
    ) -> Result<Self, JoseError> {
        expect_segments(segments, &[5])?;
        let alg = required(header.key_alg(), &header, "alg")?;
        let enc = required(header.enc(), &header, "enc")?;
        let zip = header.zip();
        let ciphertext = compact::decode(segments.get(3))?;
        let tag = compact::decode(segments.get(4))?;
        Ok(Self {
            alg,
            enc,
            zip,
            compact: token.to_owned(),
            aad_len: segments.get(0).len(),
            encrypted_key: compact::decode(segments.get(1))?,
            iv: compact::decode(segments.get(2))?,
            encryption: JweEncryption::new(ciphertext, tag),
            config: *config,
            header,
        })
    }

    /// Decrypts and parses the claims
    ///
    /// Claims are parsed with the [`ParserConfig`] the token was reconstructed with,
    /// so duplicate claim names are rejected here.
    ///
    /// # Errors
    ///
    /// - [`JoseError::DecryptionFailed`] for a wrong key or any tampering
    /// - [`JoseError::UnsupportedOperation`] when `key` is of the wrong kind
    /// - [`JoseError::MalformedToken`] when the plaintext is not a valid claims set
    pub fn decrypt(&self, key: JweKey<'_>) -> Result<ClaimsSet, JoseError> {
        ClaimsSet::from_json(&self.open(key)?, &self.config)
    }

    /// Authenticates and decrypts the payload, inflating it when `zip` is set
    pub(crate) fn open(&self, key: JweKey<'_>) -> Result<Vec<u8>, JoseError> {
        let aad = &self.compact.as_bytes()[..self.aad_len];
        let plaintext = JweHandler::new(self.alg, self.enc)
            .open(key, &self.encrypted_key, &self.iv, &self.encryption, aad)
            .inspect_err(|_| debug!(kind = "encrypted", "decryption failed"))?;
        match self.zip {
            Some(CompressionAlgorithm::Deflate) => {
                inflate(&plaintext, self.config.max_decompressed_size())
            }
            None => Ok(plaintext),
        }
    }

    /// Header, available before decryption for key selection
    #[must_use]
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Key management algorithm
    #[must_use]
    pub const fn alg(&self) -> JweAlgorithm {
        self.alg
    }

    /// Content encryption method
    #[must_use]
    pub const fn enc(&self) -> EncryptionMethod {
        self.enc
    }

    /// JWE Encrypted Key, empty for `dir`
    #[must_use]
    pub fn encrypted_key(&self) -> &[u8] {
        &self.encrypted_key
    }

    /// Initialisation vector
    #[must_use]
    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    /// Ciphertext and authentication tag
    #[must_use]
    pub const fn encryption(&self) -> &JweEncryption {
        &self.encryption
    }

    /// Compact serialization
    #[must_use]
    pub fn build(&self) -> &str {
        &self.compact
    }

    pub(crate) const fn config(&self) -> &ParserConfig {
        &self.config
    }
}
