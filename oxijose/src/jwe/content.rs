use openssl::{
    memcmp,
    pkey::PKey,
    sign::Signer,
    symm::{
        self,
        Cipher,
    },
};
use zeroize::Zeroizing;

use crate::{
    EncryptionMethod,
    algorithm::EncryptionMethodDescriptor,
    crypto::openssl::message_digest,
    error::JoseError,
    jwe::{
        JweEncryption,
        random_bytes,
    },
};

/// Encrypts and decrypts JWE content under a content encryption key (CEK)
///
/// Implementations validate every length against the method's descriptor before
/// reaching the cipher. On the receiving side every failure surfaces as
/// [`JoseError::DecryptionFailed`].
pub trait ContentEncryptionHandler: Send + Sync {
    /// Method this handler implements
    fn method(&self) -> EncryptionMethod;

    /// Fresh random CEK of the method's key length
    ///
    /// # Errors
    ///
    /// [`JoseError::Crypto`] when the random source fails
    fn generate_encryption_key(&self) -> Result<Zeroizing<Vec<u8>>, JoseError> {
        random_bytes(self.method().descriptor().key_len())
    }

    /// Fresh random initialisation vector of the method's IV length
    ///
    /// # Errors
    ///
    /// [`JoseError::Crypto`] when the random source fails
    fn generate_initialisation_vector(&self) -> Result<Vec<u8>, JoseError> {
        let mut iv = vec![0; self.method().descriptor().iv_len];
        openssl::rand::rand_bytes(&mut iv)?;
        Ok(iv)
    }

    /// Encrypts `plaintext`, authenticating `aad` alongside it
    ///
    /// # Errors
    ///
    /// - [`JoseError::InvalidKey`] when `key` or `iv` has the wrong length
    /// - [`JoseError::Crypto`] on backend failure
    fn encrypt(
        &self,
        key: &[u8],
        iv: &[u8],
        plaintext: &[u8],
        aad: &[u8],
    ) -> Result<JweEncryption, JoseError>;

    /// Checks the tag over `aad` and the ciphertext, then decrypts
    ///
    /// # Errors
    ///
    /// [`JoseError::DecryptionFailed`], whatever the cause
    fn decrypt(
        &self,
        key: &[u8],
        iv: &[u8],
        encryption: &JweEncryption,
        aad: &[u8],
    ) -> Result<Vec<u8>, JoseError>;
}

/// `AES_CBC_HMAC_SHA2` composite authenticated encryption (RFC 7518 5.2)
///
/// The CEK is `MAC_KEY || ENC_KEY`. The tag is the HMAC of
/// `AAD || IV || ciphertext || AL` truncated to the MAC key length, where `AL` is
/// the AAD length in bits as a 64-bit big-endian integer.
#[derive(Debug)]
pub struct AesCbcHmac {
    method: EncryptionMethod,
}

impl AesCbcHmac {
    /// `A128CBC-HS256`
    pub const A128_HS256: Self = Self {
        method: EncryptionMethod::A128CbcHs256,
    };
    /// `A192CBC-HS384`
    pub const A192_HS384: Self = Self {
        method: EncryptionMethod::A192CbcHs384,
    };
    /// `A256CBC-HS512`
    pub const A256_HS512: Self = Self {
        method: EncryptionMethod::A256CbcHs512,
    };

    fn descriptor(&self) -> &'static EncryptionMethodDescriptor {
        self.method.descriptor()
    }

    fn cipher(&self) -> Cipher {
        match self.method {
            EncryptionMethod::A192CbcHs384 => Cipher::aes_192_cbc(),
            EncryptionMethod::A256CbcHs512 => Cipher::aes_256_cbc(),
            _ => Cipher::aes_128_cbc(),
        }
    }

    fn tag(
        &self,
        mac_key: &[u8],
        aad: &[u8],
        iv: &[u8],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, JoseError> {
        let descriptor = self.descriptor();
        let digest = descriptor
            .mac
            .and_then(|mac| mac.descriptor().digest)
            .ok_or_else(|| JoseError::UnsupportedOperation(format!("{} has no mac", self.method)))?;
        let key = PKey::hmac(mac_key)?;
        let mut signer = Signer::new(message_digest(digest), &key)?;
        signer.update(aad)?;
        signer.update(iv)?;
        signer.update(ciphertext)?;
        signer.update(&(aad.len() as u64 * 8).to_be_bytes())?;
        let mut tag = signer.sign_to_vec()?;
        tag.truncate(descriptor.key_offset);
        Ok(tag)
    }
}

impl ContentEncryptionHandler for AesCbcHmac {
    fn method(&self) -> EncryptionMethod {
        self.method
    }

    fn encrypt(
        &self,
        key: &[u8],
        iv: &[u8],
        plaintext: &[u8],
        aad: &[u8],
    ) -> Result<JweEncryption, JoseError> {
        let descriptor = self.descriptor();
        check_lengths(descriptor, key, iv)?;
        let (mac_key, enc_key) = key.split_at(descriptor.key_offset);
        let ciphertext = symm::encrypt(self.cipher(), enc_key, Some(iv), plaintext)?;
        let tag = self.tag(mac_key, aad, iv, &ciphertext)?;
        Ok(JweEncryption::new(ciphertext, tag))
    }

    fn decrypt(
        &self,
        key: &[u8],
        iv: &[u8],
        encryption: &JweEncryption,
        aad: &[u8],
    ) -> Result<Vec<u8>, JoseError> {
        let descriptor = self.descriptor();
        check_lengths(descriptor, key, iv).map_err(|_| JoseError::DecryptionFailed)?;
        let (mac_key, enc_key) = key.split_at(descriptor.key_offset);
        let expected = self
            .tag(mac_key, aad, iv, encryption.ciphertext())
            .map_err(|_| JoseError::DecryptionFailed)?;
        let actual = encryption.authentication_tag();
        if actual.len() != expected.len() || !memcmp::eq(&expected, actual) {
            return Err(JoseError::DecryptionFailed);
        }
        symm::decrypt(self.cipher(), enc_key, Some(iv), encryption.ciphertext())
            .map_err(|_| JoseError::DecryptionFailed)
    }
}

/// AES in Galois/Counter Mode with a 96-bit IV and 128-bit tag (RFC 7518 5.3)
#[derive(Debug)]
pub struct AesGcm {
    method: EncryptionMethod,
}

impl AesGcm {
    /// `A128GCM`
    pub const A128: Self = Self {
        method: EncryptionMethod::A128Gcm,
    };
    /// `A192GCM`
    pub const A192: Self = Self {
        method: EncryptionMethod::A192Gcm,
    };
    /// `A256GCM`
    pub const A256: Self = Self {
        method: EncryptionMethod::A256Gcm,
    };

    fn cipher(&self) -> Cipher {
        match self.method {
            EncryptionMethod::A192Gcm => Cipher::aes_192_gcm(),
            EncryptionMethod::A256Gcm => Cipher::aes_256_gcm(),
            _ => Cipher::aes_128_gcm(),
        }
    }
}

impl ContentEncryptionHandler for AesGcm {
    fn method(&self) -> EncryptionMethod {
        self.method
    }

    fn encrypt(
        &self,
        key: &[u8],
        iv: &[u8],
        plaintext: &[u8],
        aad: &[u8],
    ) -> Result<JweEncryption, JoseError> {
        let descriptor = self.method.descriptor();
        check_lengths(descriptor, key, iv)?;
        let mut tag = vec![0; descriptor.tag_len];
        let ciphertext = symm::encrypt_aead(self.cipher(), key, Some(iv), aad, plaintext, &mut tag)?;
        Ok(JweEncryption::new(ciphertext, tag))
    }

    fn decrypt(
        &self,
        key: &[u8],
        iv: &[u8],
        encryption: &JweEncryption,
        aad: &[u8],
    ) -> Result<Vec<u8>, JoseError> {
        let descriptor = self.method.descriptor();
        check_lengths(descriptor, key, iv).map_err(|_| JoseError::DecryptionFailed)?;
        if encryption.authentication_tag().len() != descriptor.tag_len {
            return Err(JoseError::DecryptionFailed);
        }
        symm::decrypt_aead(
            self.cipher(),
            key,
            Some(iv),
            aad,
            encryption.ciphertext(),
            encryption.authentication_tag(),
        )
        .map_err(|_| JoseError::DecryptionFailed)
    }
}

fn check_lengths(
    descriptor: &EncryptionMethodDescriptor,
    key: &[u8],
    iv: &[u8],
) -> Result<(), JoseError> {
    if key.len() != descriptor.key_len() {
        return Err(JoseError::InvalidKey("content encryption key has the wrong length"));
    }
    if iv.len() != descriptor.iv_len {
        return Err(JoseError::InvalidKey("initialisation vector has the wrong length"));
    }
    Ok(())
}

static A128CBC_HS256: AesCbcHmac = AesCbcHmac::A128_HS256;
static A192CBC_HS384: AesCbcHmac = AesCbcHmac::A192_HS384;
static A256CBC_HS512: AesCbcHmac = AesCbcHmac::A256_HS512;
static A128GCM: AesGcm = AesGcm::A128;
static A192GCM: AesGcm = AesGcm::A192;
static A256GCM: AesGcm = AesGcm::A256;

/// Shared handler for `method`
#[must_use]
pub fn content_handler(method: EncryptionMethod) -> &'static dyn ContentEncryptionHandler {
    match method {
        EncryptionMethod::A128CbcHs256 => &A128CBC_HS256,
        EncryptionMethod::A192CbcHs384 => &A192CBC_HS384,
        EncryptionMethod::A256CbcHs512 => &A256CBC_HS512,
        EncryptionMethod::A128Gcm => &A128GCM,
        EncryptionMethod::A192Gcm => &A192GCM,
        EncryptionMethod::A256Gcm => &A256GCM,
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::{
        AesCbcHmac,
        ContentEncryptionHandler,
        content_handler,
    };
    use crate::{
        EncryptionMethod,
        error::JoseError,
        jwe::JweEncryption,
    };

    fn hex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    // RFC 7518 Appendix B.1
    #[test]
    fn a128cbc_hs256_known_answer() {
        let key = hex("000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f");
        let plaintext = hex(concat!(
            "41206369706865722073797374656d206d757374206e6f7420626520726571756972656420746f2062",
            "65207365637265742c20616e64206974206d7573742062652061626c6520746f2066616c6c20696e74",
            "6f207468652068616e6473206f662074686520656e656d7920776974686f757420696e636f6e76656e",
            "69656e6365"
        ));
        let iv = hex("1af38c2dc2b96ffdd86694092341bc04");
        let aad = hex(concat!(
            "546865207365636f6e64207072696e6369706c65206f66204175677573746520",
            "4b6572636b686f666673"
        ));

        let sealed = AesCbcHmac::A128_HS256
            .encrypt(&key, &iv, &plaintext, &aad)
            .unwrap();
        assert_eq!(
            sealed.ciphertext(),
            hex(concat!(
                "c80edfa32ddf39d5ef00c0b468834279a2e46a1b8049f792f76bfe54b903a9c9a94ac9b47ad2655c",
                "5f10f9aef71427e2fc6f9b3f399a221489f16362c703233609d45ac69864e3321cf82935ac4096c8",
                "6e133314c54019e8ca7980dfa4b9cf1b384c486f3a54c51078158ee5d79de59fbd34d848b3d69550",
                "a67646344427ade54b8851ffb598f7f80074b9473c82e2db"
            ))
        );
        assert_eq!(
            sealed.authentication_tag(),
            hex("652c3fa36b0a7c5b3219fab3a30bc1c4")
        );

        let opened = AesCbcHmac::A128_HS256
            .decrypt(&key, &iv, &sealed, &aad)
            .unwrap();
        assert_eq!(opened, plaintext);
    }

    #[test]
    fn tampering_is_decryption_failure() {
        for method in EncryptionMethod::ALL {
            let handler = content_handler(method);
            assert_eq!(handler.method(), method);
            let key = handler.generate_encryption_key().unwrap();
            let iv = handler.generate_initialisation_vector().unwrap();
            let sealed = handler.encrypt(&key, &iv, b"attack at dawn", b"aad").unwrap();

            let mut ciphertext = sealed.ciphertext().to_vec();
            ciphertext[0] ^= 1;
            let flipped = JweEncryption::new(ciphertext, sealed.authentication_tag().to_vec());
            assert_eq!(
                handler.decrypt(&key, &iv, &flipped, b"aad").unwrap_err(),
                JoseError::DecryptionFailed
            );

            let mut tag = sealed.authentication_tag().to_vec();
            tag.pop();
            let truncated = JweEncryption::new(sealed.ciphertext().to_vec(), tag);
            assert_eq!(
                handler.decrypt(&key, &iv, &truncated, b"aad").unwrap_err(),
                JoseError::DecryptionFailed
            );

            assert_eq!(
                handler.decrypt(&key[1..], &iv, &sealed, b"aad").unwrap_err(),
                JoseError::DecryptionFailed
            );
            assert_eq!(
                handler.decrypt(&key, &iv[1..], &sealed, b"aad").unwrap_err(),
                JoseError::DecryptionFailed
            );
        }
    }

    #[test]
    fn wrong_key_length_rejected_before_cipher() {
        let handler = content_handler(EncryptionMethod::A256Gcm);
        let iv = handler.generate_initialisation_vector().unwrap();
        assert_eq!(iv.len(), 12);
        let err = handler.encrypt(&[0; 16], &iv, b"", b"").unwrap_err();
        assert!(matches!(err, JoseError::InvalidKey(_)));
    }

    #[test]
    fn generated_lengths() {
        for method in EncryptionMethod::ALL {
            let handler = content_handler(method);
            let descriptor = method.descriptor();
            assert_eq!(
                handler.generate_encryption_key().unwrap().len(),
                descriptor.key_len()
            );
            assert_eq!(
                handler.generate_initialisation_vector().unwrap().len(),
                descriptor.iv_len
            );
        }
    }
}
