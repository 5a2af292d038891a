use openssl::{
    aes::{
        AesKey,
        unwrap_key,
        wrap_key,
    },
    encrypt::{
        Decrypter,
        Encrypter,
    },
    hash::MessageDigest,
    pkey::{
        HasPublic,
        Id,
        PKeyRef,
        Private,
    },
    rsa::Padding,
};
use tracing::debug;
use zeroize::Zeroizing;

use crate::{
    EncryptionMethod,
    JweAlgorithm,
    error::JoseError,
    jwe::{
        ContentEncryptionHandler,
        JweKey,
        random_bytes,
    },
};

/// Produces and recovers the content encryption key (CEK) of a JWE
///
/// On the receiving side every failure caused by the token surfaces as
/// [`JoseError::DecryptionFailed`]. A key of the wrong kind is a caller error and
/// surfaces as [`JoseError::UnsupportedOperation`].
pub trait KeyManagementHandler: Send + Sync {
    /// Algorithm this handler implements
    fn algorithm(&self) -> JweAlgorithm;

    /// CEK for a new token: `key` itself for direct encryption, otherwise a fresh
    /// random key from `content`
    ///
    /// # Errors
    ///
    /// - [`JoseError::InvalidKey`] when a direct key has the wrong length
    /// - [`JoseError::UnsupportedOperation`] when `key` is of the wrong kind
    /// - [`JoseError::Crypto`] when the random source fails
    fn content_encryption_key(
        &self,
        _key: JweKey<'_>,
        content: &dyn ContentEncryptionHandler,
    ) -> Result<Zeroizing<Vec<u8>>, JoseError> {
        content.generate_encryption_key()
    }

    /// JWE Encrypted Key segment carrying `cek` to the holder of `key`
    ///
    /// # Errors
    ///
    /// - [`JoseError::InvalidKey`] when `key` does not fit the algorithm
    /// - [`JoseError::UnsupportedOperation`] when `key` is of the wrong kind
    /// - [`JoseError::Crypto`] on backend failure
    fn generate_jwe_encrypted_key(&self, key: JweKey<'_>, cek: &[u8]) -> Result<Vec<u8>, JoseError>;

    /// Recovers the CEK for `method` from the JWE Encrypted Key segment
    ///
    /// # Errors
    ///
    /// - [`JoseError::DecryptionFailed`] when the CEK cannot be recovered
    /// - [`JoseError::UnsupportedOperation`] when `key` is of the wrong kind
    fn decrypt_content_encryption_key(
        &self,
        key: JweKey<'_>,
        encrypted_key: &[u8],
        method: EncryptionMethod,
    ) -> Result<Zeroizing<Vec<u8>>, JoseError>;
}

fn wrong_key_kind(alg: JweAlgorithm, expected: &str) -> JoseError {
    JoseError::UnsupportedOperation(format!("{alg} requires {expected}"))
}

/// `dir`: the shared secret is the CEK and the encrypted key segment is empty
#[derive(Debug)]
pub struct Direct;

impl KeyManagementHandler for Direct {
    fn algorithm(&self) -> JweAlgorithm {
        JweAlgorithm::Dir
    }

    fn content_encryption_key(
        &self,
        key: JweKey<'_>,
        content: &dyn ContentEncryptionHandler,
    ) -> Result<Zeroizing<Vec<u8>>, JoseError> {
        let JweKey::Secret(secret) = key else {
            return Err(wrong_key_kind(JweAlgorithm::Dir, "a symmetric secret"));
        };
        if secret.len() != content.method().descriptor().key_len() {
            return Err(JoseError::InvalidKey(
                "direct key length does not match the encryption method",
            ));
        }
        Ok(Zeroizing::new(secret.to_vec()))
    }

    fn generate_jwe_encrypted_key(&self, _: JweKey<'_>, _: &[u8]) -> Result<Vec<u8>, JoseError> {
        Ok(Vec::new())
    }

    fn decrypt_content_encryption_key(
        &self,
        key: JweKey<'_>,
        encrypted_key: &[u8],
        method: EncryptionMethod,
    ) -> Result<Zeroizing<Vec<u8>>, JoseError> {
        let JweKey::Secret(secret) = key else {
            return Err(wrong_key_kind(JweAlgorithm::Dir, "a symmetric secret"));
        };
        if !encrypted_key.is_empty() || secret.len() != method.descriptor().key_len() {
            return Err(JoseError::DecryptionFailed);
        }
        Ok(Zeroizing::new(secret.to_vec()))
    }
}

/// `A128KW`, `A192KW` and `A256KW`: RFC 3394 AES Key Wrap of a random CEK
#[derive(Debug)]
pub struct AesKeyWrap {
    alg: JweAlgorithm,
}

impl AesKeyWrap {
    /// `A128KW`
    pub const A128: Self = Self {
        alg: JweAlgorithm::A128KW,
    };
    /// `A192KW`
    pub const A192: Self = Self {
        alg: JweAlgorithm::A192KW,
    };
    /// `A256KW`
    pub const A256: Self = Self {
        alg: JweAlgorithm::A256KW,
    };

    fn kek<'a>(&self, key: JweKey<'a>) -> Result<&'a [u8], JoseError> {
        let JweKey::Secret(kek) = key else {
            return Err(wrong_key_kind(self.alg, "a symmetric key-encryption key"));
        };
        if Some(kek.len() * 8) == self.alg.descriptor().key_size {
            Ok(kek)
        } else {
            Err(JoseError::InvalidKey(
                "key-encryption key length does not match the algorithm",
            ))
        }
    }
}

impl KeyManagementHandler for AesKeyWrap {
    fn algorithm(&self) -> JweAlgorithm {
        self.alg
    }

    fn generate_jwe_encrypted_key(&self, key: JweKey<'_>, cek: &[u8]) -> Result<Vec<u8>, JoseError> {
        let kek = self.kek(key)?;
        if cek.len() < 16 || cek.len() % 8 != 0 {
            return Err(JoseError::InvalidKey("cek length cannot be wrapped"));
        }
        let kek = AesKey::new_encrypt(kek)
            .map_err(|_| JoseError::InvalidKey("key-encryption key rejected"))?;
        let mut wrapped = vec![0; cek.len() + 8];
        let len = wrap_key(&kek, None, &mut wrapped, cek)
            .map_err(|_| JoseError::Crypto("aes key wrap failed".into()))?;
        wrapped.truncate(len);
        Ok(wrapped)
    }

    fn decrypt_content_encryption_key(
        &self,
        key: JweKey<'_>,
        encrypted_key: &[u8],
        method: EncryptionMethod,
    ) -> Result<Zeroizing<Vec<u8>>, JoseError> {
        let kek = match self.kek(key) {
            Ok(kek) => kek,
            Err(JoseError::InvalidKey(_)) => return Err(JoseError::DecryptionFailed),
            Err(err) => return Err(err),
        };
        if encrypted_key.len() < 24 || encrypted_key.len() % 8 != 0 {
            return Err(JoseError::DecryptionFailed);
        }
        let kek = AesKey::new_decrypt(kek).map_err(|_| JoseError::DecryptionFailed)?;
        let mut cek = Zeroizing::new(vec![0; encrypted_key.len() - 8]);
        let len = unwrap_key(&kek, None, &mut cek, encrypted_key)
            .map_err(|_| JoseError::DecryptionFailed)?;
        if len != method.descriptor().key_len() {
            return Err(JoseError::DecryptionFailed);
        }
        cek.truncate(len);
        Ok(cek)
    }
}

/// `RSA1_5`, `RSA-OAEP` and `RSA-OAEP-256`: CEK encrypted to an RSA public key
///
/// For `RSA1_5` a padding failure on decryption is replaced by a random CEK so
/// that it fails later at tag verification, indistinguishable from any other
/// tampering (RFC 7516 11.5).
#[derive(Debug)]
pub struct RsaKeyManagement {
    alg: JweAlgorithm,
}

impl RsaKeyManagement {
    /// `RSA1_5`
    pub const RSA1_5: Self = Self {
        alg: JweAlgorithm::Rsa1_5,
    };
    /// `RSA-OAEP`
    pub const OAEP: Self = Self {
        alg: JweAlgorithm::RsaOaep,
    };
    /// `RSA-OAEP-256`
    pub const OAEP_256: Self = Self {
        alg: JweAlgorithm::RsaOaep256,
    };

    fn encrypt_to<T>(&self, key: &PKeyRef<T>, cek: &[u8]) -> Result<Vec<u8>, JoseError>
    where
        T: HasPublic,
    {
        if key.id() != Id::RSA {
            return Err(wrong_key_kind(self.alg, "an RSA key"));
        }
        if key.bits() < 2048 {
            return Err(JoseError::InvalidKey("rsa keys must be at least 2048 bits"));
        }
        let mut encrypter = Encrypter::new(key)?;
        match self.alg {
            JweAlgorithm::Rsa1_5 => encrypter.set_rsa_padding(Padding::PKCS1)?,
            JweAlgorithm::RsaOaep256 => {
                encrypter.set_rsa_padding(Padding::PKCS1_OAEP)?;
                encrypter.set_rsa_oaep_md(MessageDigest::sha256())?;
                encrypter.set_rsa_mgf1_md(MessageDigest::sha256())?;
            }
            _ => encrypter.set_rsa_padding(Padding::PKCS1_OAEP)?,
        }
        let mut encrypted = vec![0; encrypter.encrypt_len(cek)?];
        let len = encrypter.encrypt(cek, &mut encrypted)?;
        encrypted.truncate(len);
        Ok(encrypted)
    }

    fn decrypt_with(
        &self,
        key: &PKeyRef<Private>,
        encrypted_key: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, openssl::error::ErrorStack> {
        let mut decrypter = Decrypter::new(key)?;
        match self.alg {
            JweAlgorithm::Rsa1_5 => decrypter.set_rsa_padding(Padding::PKCS1)?,
            JweAlgorithm::RsaOaep256 => {
                decrypter.set_rsa_padding(Padding::PKCS1_OAEP)?;
                decrypter.set_rsa_oaep_md(MessageDigest::sha256())?;
                decrypter.set_rsa_mgf1_md(MessageDigest::sha256())?;
            }
            _ => decrypter.set_rsa_padding(Padding::PKCS1_OAEP)?,
        }
        let mut cek = Zeroizing::new(vec![0; decrypter.decrypt_len(encrypted_key)?]);
        let len = decrypter.decrypt(encrypted_key, &mut cek)?;
        cek.truncate(len);
        Ok(cek)
    }
}

impl KeyManagementHandler for RsaKeyManagement {
    fn algorithm(&self) -> JweAlgorithm {
        self.alg
    }

    fn generate_jwe_encrypted_key(&self, key: JweKey<'_>, cek: &[u8]) -> Result<Vec<u8>, JoseError> {
        match key {
            JweKey::Public(key) => self.encrypt_to(key, cek),
            JweKey::Private(key) => self.encrypt_to(key, cek),
            JweKey::Secret(_) => Err(wrong_key_kind(self.alg, "an RSA key")),
        }
    }

    fn decrypt_content_encryption_key(
        &self,
        key: JweKey<'_>,
        encrypted_key: &[u8],
        method: EncryptionMethod,
    ) -> Result<Zeroizing<Vec<u8>>, JoseError> {
        let JweKey::Private(key) = key else {
            return Err(wrong_key_kind(self.alg, "an RSA private key"));
        };
        if key.id() != Id::RSA {
            return Err(wrong_key_kind(self.alg, "an RSA private key"));
        }
        let key_len = method.descriptor().key_len();
        match self.decrypt_with(key, encrypted_key) {
            Ok(cek) if cek.len() == key_len => Ok(cek),
            _ if self.alg == JweAlgorithm::Rsa1_5 => {
                debug!("substituting random cek after RSA1_5 key decryption failure");
                random_bytes(key_len).map_err(|_| JoseError::DecryptionFailed)
            }
            _ => Err(JoseError::DecryptionFailed),
        }
    }
}

static DIRECT: Direct = Direct;
static A128KW: AesKeyWrap = AesKeyWrap::A128;
static A192KW: AesKeyWrap = AesKeyWrap::A192;
static A256KW: AesKeyWrap = AesKeyWrap::A256;
static RSA1_5: RsaKeyManagement = RsaKeyManagement::RSA1_5;
static RSA_OAEP: RsaKeyManagement = RsaKeyManagement::OAEP;
static RSA_OAEP_256: RsaKeyManagement = RsaKeyManagement::OAEP_256;

/// Shared handler for `alg`
#[must_use]
pub fn key_management_handler(alg: JweAlgorithm) -> &'static dyn KeyManagementHandler {
    match alg {
        JweAlgorithm::Rsa1_5 => &RSA1_5,
        JweAlgorithm::RsaOaep => &RSA_OAEP,
        JweAlgorithm::RsaOaep256 => &RSA_OAEP_256,
        JweAlgorithm::A128KW => &A128KW,
        JweAlgorithm::A192KW => &A192KW,
        JweAlgorithm::A256KW => &A256KW,
        JweAlgorithm::Dir => &DIRECT,
    }
}
