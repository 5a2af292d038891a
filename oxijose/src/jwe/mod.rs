//! JWE content encryption and key management
//!
//! Handlers are stateless strategies selected from the algorithm registry.
//! Cipher contexts are created per call, so every handler is `Send + Sync`
//! and shared as a `'static` instance.
mod compression;
mod content;
mod key_management;

pub(crate) use compression::{
    deflate,
    inflate,
};
pub use content::{
    AesCbcHmac,
    AesGcm,
    ContentEncryptionHandler,
    content_handler,
};
pub use key_management::{
    AesKeyWrap,
    Direct,
    KeyManagementHandler,
    RsaKeyManagement,
    key_management_handler,
};
use openssl::pkey::{
    PKey,
    PKeyRef,
    Private,
    Public,
};
use tracing::trace;
use zeroize::Zeroizing;

use crate::{
    EncryptionMethod,
    JweAlgorithm,
    error::JoseError,
};

/// Key material for one encrypt or decrypt call
///
/// Borrowed, never stored: the caller owns the key and its lifetime.
#[derive(Clone, Copy)]
pub enum JweKey<'a> {
    /// Shared symmetric secret: the CEK itself for `dir`, the key-encryption key
    /// for `A*KW`
    Secret(&'a [u8]),
    /// RSA public key of the recipient, for encryption only
    Public(&'a PKeyRef<Public>),
    /// RSA private key of the recipient; also usable for encryption
    Private(&'a PKeyRef<Private>),
}

impl std::fmt::Debug for JweKey<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // key material is never printed
        match self {
            Self::Secret(_) => f.write_str("JweKey::Secret(..)"),
            Self::Public(_) => f.write_str("JweKey::Public(..)"),
            Self::Private(_) => f.write_str("JweKey::Private(..)"),
        }
    }
}

impl<'a> From<&'a [u8]> for JweKey<'a> {
    fn from(value: &'a [u8]) -> Self {
        Self::Secret(value)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for JweKey<'a> {
    fn from(value: &'a [u8; N]) -> Self {
        Self::Secret(value)
    }
}

impl<'a> From<&'a PKey<Public>> for JweKey<'a> {
    fn from(value: &'a PKey<Public>) -> Self {
        Self::Public(value)
    }
}

impl<'a> From<&'a PKey<Private>> for JweKey<'a> {
    fn from(value: &'a PKey<Private>) -> Self {
        Self::Private(value)
    }
}

/// Ciphertext and authentication tag produced by one encryption
///
/// The two are only ever consumed together; the tag is checked before the
/// ciphertext is trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JweEncryption {
    ciphertext: Vec<u8>,
    authentication_tag: Vec<u8>,
}

impl JweEncryption {
    /// Pairs a ciphertext with its tag
    #[must_use]
    pub const fn new(ciphertext: Vec<u8>, authentication_tag: Vec<u8>) -> Self {
        Self {
            ciphertext,
            authentication_tag,
        }
    }

    /// Ciphertext octets
    #[must_use]
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Authentication tag octets
    #[must_use]
    pub fn authentication_tag(&self) -> &[u8] {
        &self.authentication_tag
    }
}

/// Output of [`JweHandler::seal`]: every binary segment of a JWE except the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedContent {
    /// JWE Encrypted Key, empty for `dir`
    pub encrypted_key: Vec<u8>,
    /// JWE Initialization Vector
    pub iv: Vec<u8>,
    /// Ciphertext and tag
    pub encryption: JweEncryption,
}

/// Pairing of a key management strategy with a content encryption strategy
#[derive(Clone, Copy)]
pub struct JweHandler {
    key_management: &'static dyn KeyManagementHandler,
    content: &'static dyn ContentEncryptionHandler,
}

impl JweHandler {
    /// Selects the handlers for `alg` and `enc`
    #[must_use]
    pub fn new(alg: JweAlgorithm, enc: EncryptionMethod) -> Self {
        trace!(alg = %alg, enc = %enc, "selected jwe handlers");
        Self {
            key_management: key_management_handler(alg),
            content: content_handler(enc),
        }
    }

    /// Key management strategy
    #[must_use]
    pub fn key_management(&self) -> &'static dyn KeyManagementHandler {
        self.key_management
    }

    /// Content encryption strategy
    #[must_use]
    pub fn content(&self) -> &'static dyn ContentEncryptionHandler {
        self.content
    }

    /// Produces a CEK, encrypts it to `key`, and encrypts `plaintext` under it
    /// with `aad` authenticated
    ///
    /// # Errors
    ///
    /// - [`JoseError::InvalidKey`] when `key` does not fit the key management algorithm
    /// - [`JoseError::UnsupportedOperation`] when `key` is of the wrong kind
    /// - [`JoseError::Crypto`] on backend failure
    pub fn seal(
        &self,
        key: JweKey<'_>,
        plaintext: &[u8],
        aad: &[u8],
    ) -> Result<SealedContent, JoseError> {
        let cek = self.key_management.content_encryption_key(key, self.content)?;
        let encrypted_key = self.key_management.generate_jwe_encrypted_key(key, &cek)?;
        let iv = self.content.generate_initialisation_vector()?;
        let encryption = self.content.encrypt(&cek, &iv, plaintext, aad)?;
        Ok(SealedContent {
            encrypted_key,
            iv,
            encryption,
        })
    }

    /// Recovers the CEK from `encrypted_key` and decrypts `encryption`
    ///
    /// # Errors
    ///
    /// - [`JoseError::DecryptionFailed`] for any failure of key unwrapping, tag
    ///   verification or decryption
    /// - [`JoseError::UnsupportedOperation`] when `key` is of the wrong kind
    pub fn open(
        &self,
        key: JweKey<'_>,
        encrypted_key: &[u8],
        iv: &[u8],
        encryption: &JweEncryption,
        aad: &[u8],
    ) -> Result<Vec<u8>, JoseError> {
        let cek = self.key_management.decrypt_content_encryption_key(
            key,
            encrypted_key,
            self.content.method(),
        )?;
        self.content.decrypt(&cek, iv, encryption, aad)
    }
}

impl std::fmt::Debug for JweHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JweHandler")
            .field("alg", &self.key_management.algorithm())
            .field("enc", &self.content.method())
            .finish()
    }
}

pub(crate) fn random_bytes(len: usize) -> Result<Zeroizing<Vec<u8>>, JoseError> {
    let mut buf = Zeroizing::new(vec![0; len]);
    openssl::rand::rand_bytes(&mut buf)?;
    Ok(buf)
}
