//! Claim validation and key resolution for signed tokens
//!
//! A [`ValidationPipeline`] reconstructs a JWS, resolves the verification key
//! through a [`KeyProvider`], checks the signature, then runs its
//! [`TokenValidator`]s in order. The validators can also be run on their own
//! with [`ValidationPipeline::validate`], e.g. on the claims of a decrypted JWE.
pub mod keystore;

pub(crate) mod validator;

pub use pipeline::{
    ValidationPipeline,
    ValidationPipelineBuilder,
};
pub use validator::TokenValidator;

mod pipeline;

use crate::{
    claims::ClaimsSet,
    error::JoseError,
    header::Header,
    jws::VerificationKey,
};

/// A [`KeyProvider`] which, given an unverified JWT's header and claims, can determine
/// the appropriate key to attempt verification with or otherwise return an error.
pub trait KeyProvider<H: ?Sized = Header, C: ?Sized = ClaimsSet> {
    /// Type of [`VerificationKey`] provided
    type Key: VerificationKey + ?Sized;

    /// Attempt to resolve the key to be used for JWT signature verification.
    ///
    /// # Errors
    ///
    /// - [`JoseError::KeyNotFound`] when the appropriate key is not available
    ///   to the [`KeyProvider`] (e.g. `kid` field on `header` indicates a key which does
    ///   not exist in the keystore).
    fn resolve_key(&self, header: &H, claims: &C) -> Result<&Self::Key, JoseError>;
}

/// Static provider that unconditionally returns a single [`VerificationKey`]
#[derive(Debug)]
pub struct StaticKeyProvider<VK: VerificationKey> {
    key: VK,
}

impl<VK: VerificationKey> StaticKeyProvider<VK> {
    /// Instantiate a new [`StaticKeyProvider`] wrapping the given [`VerificationKey`].
    pub const fn new(key: VK) -> Self {
        Self { key }
    }
}

impl<H, C, VK> KeyProvider<H, C> for StaticKeyProvider<VK>
where
    H: ?Sized,
    C: ?Sized,
    VK: VerificationKey,
{
    type Key = VK;
    fn resolve_key(&self, _: &H, _: &C) -> Result<&VK, JoseError> {
        Ok(&self.key)
    }
}

impl<VK> From<VK> for StaticKeyProvider<VK>
where
    VK: VerificationKey,
{
    fn from(value: VK) -> Self {
        Self { key: value }
    }
}
