use crate::{
    Algorithm,
    claims::ClaimsSet,
    compact::Segments,
    error::JoseError,
    header::Header,
    json::ParserConfig,
    jwe::JweKey,
    jws::{
        Signer,
        VerificationKey,
    },
    jwt::{
        EncryptedJwt,
        SignedJwt,
        nested_token,
        signed::Jws,
        split_with_header,
    },
};

/// JWE whose plaintext is a compact JWS (`cty: JWT`)
#[derive(Debug, Clone)]
pub struct SignedThenEncryptedJwt {
    jwe: EncryptedJwt,
}

impl SignedThenEncryptedJwt {
    /// Encrypts the compact form of `signed`; `cty` is set to `JWT`
    ///
    /// # Errors
    ///
    /// As [`EncryptedJwt::encrypt`].
    pub fn encrypt(
        signed: &SignedJwt,
        mut header: Header,
        key: JweKey<'_>,
    ) -> Result<Self, JoseError> {
        header.set_cty("JWT");
        let jwe = EncryptedJwt::seal(header, signed.build().as_bytes(), key)?;
        Ok(Self { jwe })
    }

    /// Reconstructs the outer JWE; the inner JWS is read on decryption
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
        let jwe = EncryptedJwt::from_parts(token, segments, header, config)?;
        Ok(Self { jwe })
    }

    /// Decrypts the outer layer and reconstructs the inner JWS, still unverified
    ///
    /// # Errors
    ///
    /// - As [`EncryptedJwt::decrypt`]
    /// - [`JoseError::MalformedToken`] when the plaintext is not a compact JWS
    pub fn decrypt(&self, key: JweKey<'_>) -> Result<SignedJwt, JoseError> {
        let payload = self.jwe.open(key)?;
        SignedJwt::reconstruct(nested_token(&payload)?, self.jwe.config())
    }

    /// Decrypts, then verifies the inner signature
    ///
    /// # Errors
    ///
    /// As [`SignedThenEncryptedJwt::decrypt`] and [`SignedJwt::verify`].
    pub fn decrypt_and_verify<K>(
        &self,
        key: JweKey<'_>,
        verification_key: &K,
    ) -> Result<ClaimsSet, JoseError>
    where
        K: VerificationKey + ?Sized,
    {
        self.decrypt(key)?.into_verified(verification_key)
    }

    /// Outer JWE header
    #[must_use]
    pub fn header(&self) -> &Header {
        self.jwe.header()
    }

    /// Outer JWE
    #[must_use]
    pub const fn encrypted(&self) -> &EncryptedJwt {
        &self.jwe
    }

    /// Compact serialization
    #[must_use]
    pub fn build(&self) -> &str {
        self.jwe.build()
    }
}

/// JWS whose payload is a compact JWE (`cty: JWT`, or `JWE` when received)
#[derive(Debug, Clone)]
pub struct EncryptedThenSignedJwt {
    jws: Jws,
    inner: EncryptedJwt,
}

impl EncryptedThenSignedJwt {
    /// Signs the compact form of `encrypted`; `cty` is set to `JWT`
    ///
    /// # Errors
    ///
    /// As [`SignedJwt::sign`].
    pub fn sign<S>(encrypted: &EncryptedJwt, mut header: Header, key: &S) -> Result<Self, JoseError>
    where
        S: Signer + ?Sized,
    {
        header.set_cty("JWT");
        let jws = Jws::sign(header, encrypted.build().as_bytes().to_vec(), key)?;
        Ok(Self {
            jws,
            inner: encrypted.clone(),
        })
    }

    /// Reconstructs the outer JWS and the inner JWE
    ///
    /// # Errors
    ///
    /// See [`Jwt::reconstruct`](crate::jwt::Jwt::reconstruct); the payload must
    /// itself be a five-segment JWE.
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
        let inner = EncryptedJwt::reconstruct(nested_token(jws.payload())?, config)?;
        Ok(Self { jws, inner })
    }

    /// Verifies the outer signature, then exposes the inner JWE
    ///
    /// # Errors
    ///
    /// As [`SignedJwt::verify`].
    pub fn verify<K>(&self, key: &K) -> Result<&EncryptedJwt, JoseError>
    where
        K: VerificationKey + ?Sized,
    {
        self.jws.verify(key)?;
        Ok(&self.inner)
    }

    /// Verifies, then decrypts the inner JWE
    ///
    /// # Errors
    ///
    /// As [`EncryptedThenSignedJwt::verify`] and [`EncryptedJwt::decrypt`].
    pub fn verify_and_decrypt<K>(
        &self,
        verification_key: &K,
        key: JweKey<'_>,
    ) -> Result<ClaimsSet, JoseError>
    where
        K: VerificationKey + ?Sized,
    {
        self.verify(verification_key)?.decrypt(key)
    }

    /// Outer JWS header
    #[must_use]
    pub fn header(&self) -> &Header {
        self.jws.header()
    }

    /// Signing algorithm of the outer JWS
    #[must_use]
    pub const fn alg(&self) -> Algorithm {
        self.jws.alg()
    }

    /// Compact serialization
    #[must_use]
    pub fn build(&self) -> &str {
        self.jws.build()
    }
}
