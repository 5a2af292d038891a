#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![doc = include_str!("../README.md")]

/// Algorithm, encryption method and compression registries.
pub mod algorithm;

/// Claims set model and RFC 7519 accessor traits.
pub mod claims;

/// Error enums
pub mod error;

/// JOSE header model and RFC 7515/7516 accessor traits.
pub mod header;

/// Functions and traits supporting claim validation of signed JWTs.
pub mod validation;

/// Crypto backend implementations (i.e. `openssl`)
pub mod crypto;

/// JWS signing and verification traits.
pub mod jws;

/// JWE content encryption and key management handlers.
pub mod jwe;

/// RSA JSON Web Keys and their conversion to and from OpenSSL keys.
pub mod jwk;

/// The five compact token shapes and their reconstruction.
pub mod jwt;

mod compact;
mod json;

pub use algorithm::{
    Algorithm,
    CompressionAlgorithm,
    EncryptionMethod,
    JweAlgorithm,
};
pub use json::{
    DuplicateKeyPolicy,
    ParserConfig,
};

/// Provides dangerous (i.e. non-signature-verifying) JWT decoding functionality.
pub mod dangerous {
    use crate::{
        claims::ClaimsSet,
        error::JoseError,
        header::Header,
        json::ParserConfig,
        jwt::Jwt,
    };

    /// Reads the header and claims of a plaintext or signed JWT without any
    /// signature verification
    ///
    /// DANGER: does NOT verify the JWT signature
    ///
    /// If you need to use headers/claims to pick keys, then implement a custom
    /// [`KeyProvider`].
    ///
    /// If you need to run custom validation steps, then implement
    /// a [`TokenValidator`].
    ///
    /// [`oxijose`] was built with those features specifically to
    /// avoid the necessity of parsing a JWT more than once,
    /// so this function should rarely be necessary.
    ///
    /// [`oxijose`]: crate
    /// [`KeyProvider`]: crate::validation::KeyProvider
    /// [`TokenValidator`]: crate::validation::TokenValidator
    ///
    /// # Errors
    ///
    /// - any reconstruction error of [`Jwt::reconstruct`]
    /// - [`JoseError::UnsupportedOperation`] for encrypted or nested tokens, whose
    ///   claims cannot be read without a key
    pub fn unverified_claims(
        token: &str,
        config: &ParserConfig,
    ) -> Result<(Header, ClaimsSet), JoseError> {
        match Jwt::reconstruct(token, config)? {
            Jwt::Plaintext(jwt) => Ok((jwt.header().clone(), jwt.claims().clone())),
            Jwt::Signed(jwt) => Ok(jwt.into_parts()),
            other => Err(JoseError::UnsupportedOperation(format!(
                "claims of a {} token require a key",
                other.kind()
            ))),
        }
    }
}
