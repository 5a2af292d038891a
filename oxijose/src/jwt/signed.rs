use tracing::debug;

use crate::{
    Algorithm,
    claims::ClaimsSet,
    compact::{
        self,
        Segments,
    },
    error::{
        JoseError,
        Malformed,
    },
    header::{
        Alg,
        Header,
    },
    json::ParserConfig,
    jws::{
        Signer,
        VerificationKey,
        sign_compact,
    },
    jwt::{
        default_typ,
        expect_segments,
        required,
        split_with_header,
    },
};

/// Signed compact token with an arbitrary payload
///
/// Shared by [`SignedJwt`] and the outer layer of an encrypted-then-signed token.
#[derive(Debug, Clone)]
pub(crate) struct Jws {
    header: Header,
    alg: Algorithm,
    payload: Vec<u8>,
    compact: String,
    signing_input_len: usize,
    signature: Vec<u8>,
}

impl Jws {
    pub(crate) fn sign<S>(mut header: Header, payload: Vec<u8>, key: &S) -> Result<Self, JoseError>
    where
        S: Signer + ?Sized,
    {
        let alg = header.alg().ok_or_else(|| {
            JoseError::UnsupportedOperation("header has no JWS 'alg'".into())
        })?;
        if alg == Algorithm::None {
            return Err(JoseError::UnsupportedOperation(
                "unsecured tokens are built with PlaintextJwt".into(),
            ));
        }
        default_typ(&mut header);
        let (compact, signing_input_len) = sign_compact(key, alg, &header.to_json()?, &payload)?;
        let signature = compact
            .get(signing_input_len..)
            .and_then(|rest| rest.strip_prefix('.'))
            .ok_or_else(|| JoseError::Crypto("signer did not append a signature segment".into()))?;
        let signature = compact::decode(signature)?;
        debug!(kind = "signed", %alg, "built token");
        Ok(Self {
            header,
            alg,
            payload,
            compact,
            signing_input_len,
            signature,
        })
    }

    pub(crate) fn from_parts(
        token: &str,
        segments: &Segments<'_>,
        header: Header,
    ) -> Result<Self, JoseError> {
        expect_segments(segments, &[3])?;
        let alg = required(header.alg(), &header, "alg")?;
        let signature = compact::decode(segments.get(2))?;
        if alg == Algorithm::None {
            return Err(if signature.is_empty() {
                JoseError::UnsupportedOperation("unsecured tokens are read with PlaintextJwt".into())
            } else {
                Malformed::UnsecuredSignature.into()
            });
        }
        Ok(Self {
            alg,
            payload: compact::decode(segments.get(1))?,
            compact: token.to_owned(),
            signing_input_len: segments.signing_input().len(),
            signature,
            header,
        })
    }

    /// Checks the signature over the received signing input
    pub(crate) fn verify<K>(&self, key: &K) -> Result<(), JoseError>
    where
        K: VerificationKey + ?Sized,
    {
        if key.alg() != Some(self.alg) {
            return Err(JoseError::WrongAlgorithm);
        }
        key.verify(self.signing_input().as_bytes(), &self.signature)
            .inspect_err(|_| debug!(kind = "signed", "signature rejected"))
    }

    pub(crate) fn header(&self) -> &Header {
        &self.header
    }

    pub(crate) const fn alg(&self) -> Algorithm {
        self.alg
    }

    pub(crate) fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub(crate) fn signing_input(&self) -> &str {
        &self.compact[..self.signing_input_len]
    }

    pub(crate) fn signature(&self) -> &[u8] {
        &self.signature
    }

    pub(crate) fn build(&self) -> &str {
        &self.compact
    }
}

/// JWS carrying a claims set
#[derive(Debug, Clone)]
pub struct SignedJwt {
    jws: Jws,
    claims: ClaimsSet,
}

impl SignedJwt {
    /// Signs `claims` with `key` under the `alg` named by `header`
    ///
    /// # Errors
    ///
    /// - [`JoseError::UnsupportedOperation`] when `header` has no JWS `alg`, the
    ///   `alg` is `none`, or the key cannot produce it
    /// - [`JoseError::WrongAlgorithm`] when `key` is bound to another algorithm
    /// - [`JoseError::Crypto`] when the backend fails
    pub fn sign<S>(header: Header, claims: ClaimsSet, key: &S) -> Result<Self, JoseError>
    where
        S: Signer + ?Sized,
    {
        let jws = Jws::sign(header, claims.to_json()?, key)?;
        Ok(Self { jws, claims })
    }

    /// Reconstructs a three-segment JWS
    ///
    /// The claims are parsed but only exposed by [`SignedJwt::verify`].
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
        let jws = Jws::from_parts(token, segments, header)?;
        let claims = ClaimsSet::from_json(jws.payload(), config)?;
        Ok(Self { jws, claims })
    }

    /// Verifies the signature, then returns the claims
    ///
    /// # Errors
    ///
    /// - [`JoseError::WrongAlgorithm`] when the key's algorithm is not the header `alg`
    /// - [`JoseError::DecryptionFailed`] when the signature does not verify
    pub fn verify<K>(&self, key: &K) -> Result<&ClaimsSet, JoseError>
    where
        K: VerificationKey + ?Sized,
    {
        self.jws.verify(key)?;
        Ok(&self.claims)
    }

    /// Verifies the signature and yields the claims by value
    ///
    /// # Errors
    ///
    /// As [`SignedJwt::verify`].
    pub fn into_verified<K>(self, key: &K) -> Result<ClaimsSet, JoseError>
    where
        K: VerificationKey + ?Sized,
    {
        self.jws.verify(key)?;
        Ok(self.claims)
    }

    /// Header, available before verification for key selection
    #[must_use]
    pub fn header(&self) -> &Header {
        self.jws.header()
    }

    /// Signing algorithm from the header
    #[must_use]
    pub const fn alg(&self) -> Algorithm {
        self.jws.alg()
    }

    /// Encoded header and payload exactly as signed
    #[must_use]
    pub fn signing_input(&self) -> &str {
        self.jws.signing_input()
    }

    /// Decoded signature
    #[must_use]
    pub fn signature(&self) -> &[u8] {
        self.jws.signature()
    }

    /// Compact serialization
    #[must_use]
    pub fn build(&self) -> &str {
        self.jws.build()
    }

    pub(crate) const fn unverified_claims(&self) -> &ClaimsSet {
        &self.claims
    }

    pub(crate) fn into_parts(self) -> (Header, ClaimsSet) {
        (self.jws.header, self.claims)
    }
}
