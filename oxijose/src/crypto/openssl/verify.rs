use openssl::{
    bn::BigNum,
    ec::EcKeyRef,
    ecdsa::EcdsaSig,
    hash::{
        Hasher,
        MessageDigest,
    },
    memcmp,
    pkey::{
        HasPublic,
        PKey,
        PKeyRef,
    },
    rsa::Padding,
    sign::{
        RsaPssSaltlen,
        Signer,
        Verifier,
    },
};

use crate::{
    Algorithm,
    algorithm::AlgorithmFamily,
    crypto::openssl::{
        AsymmetricKey,
        HmacKey,
        ec_component_len,
        ec_curve_alg,
        map_pkey_alg,
        message_digest,
    },
    error::JoseError,
    jws::VerificationKey,
};

impl VerificationKey for HmacKey {
    fn alg(&self) -> Option<Algorithm> {
        Some(self.alg)
    }
    fn verify(&self, msg: &[u8], asig: &[u8]) -> Result<(), JoseError> {
        let mut signer =
            Signer::new(self.digest(), &self.key).map_err(|_| JoseError::DecryptionFailed)?;
        signer.update(msg).map_err(|_| JoseError::DecryptionFailed)?;
        let csig = signer
            .sign_to_vec()
            .map_err(|_| JoseError::DecryptionFailed)?;
        if csig.len() == asig.len() && memcmp::eq(&csig, asig) {
            Ok(())
        } else {
            Err(JoseError::DecryptionFailed)
        }
    }
}

impl<T> VerificationKey for PKey<T>
where
    T: HasPublic,
{
    fn alg(&self) -> Option<Algorithm> {
        map_pkey_alg(self)
    }
    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), JoseError> {
        let alg = self.alg().ok_or_else(unsupported_key)?;
        verify_with(self, alg, message, signature)
    }
}

impl<T> VerificationKey for AsymmetricKey<T>
where
    T: HasPublic,
{
    fn alg(&self) -> Option<Algorithm> {
        Some(self.alg)
    }
    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), JoseError> {
        verify_with(&self.key, self.alg, message, signature)
    }
}

impl<T> VerificationKey for EcKeyRef<T>
where
    T: HasPublic,
{
    fn alg(&self) -> Option<Algorithm> {
        ec_curve_alg(self)
    }
    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), JoseError> {
        let alg = self.alg().ok_or_else(unsupported_key)?;
        let digest = alg.descriptor().digest.ok_or_else(unsupported_key)?;
        verify_ecdsa_with_digest(self, message_digest(digest), message, signature)
    }
}

fn unsupported_key() -> JoseError {
    JoseError::UnsupportedOperation("key type or size has no JWS algorithm".into())
}

fn verify_with<T>(
    key: &PKeyRef<T>,
    alg: Algorithm,
    message: &[u8],
    signature: &[u8],
) -> Result<(), JoseError>
where
    T: HasPublic,
{
    let descriptor = alg.descriptor();
    let digest = descriptor.digest.map(message_digest);
    match (descriptor.family, digest) {
        (AlgorithmFamily::Rsa, Some(digest)) => {
            verify_with_digest(key, digest, message, signature, false)
        }
        (AlgorithmFamily::RsaPss, Some(digest)) => {
            verify_with_digest(key, digest, message, signature, true)
        }
        (AlgorithmFamily::Ecdsa, Some(digest)) => {
            let eckey = key.ec_key().map_err(|_| unsupported_key())?;
            verify_ecdsa_with_digest(&eckey, digest, message, signature)
        }
        // HMAC requires the secret, see [`HmacKey`]
        _ => Err(unsupported_key()),
    }
}

fn verify_with_digest<T>(
    key: &PKeyRef<T>,
    digest: MessageDigest,
    message: &[u8],
    signature: &[u8],
    pss: bool,
) -> Result<(), JoseError>
where
    T: HasPublic,
{
    let mut verifier = Verifier::new(digest, key).map_err(|_| JoseError::DecryptionFailed)?;
    if pss {
        verifier
            .set_rsa_padding(Padding::PKCS1_PSS)
            .and_then(|()| verifier.set_rsa_pss_saltlen(RsaPssSaltlen::DIGEST_LENGTH))
            .map_err(|_| JoseError::DecryptionFailed)?;
    }
    verifier
        .update(message)
        .map_err(|_| JoseError::DecryptionFailed)?;
    if verifier
        .verify(signature)
        .map_err(|_| JoseError::DecryptionFailed)?
    {
        Ok(())
    } else {
        Err(JoseError::DecryptionFailed)
    }
}

fn verify_ecdsa_with_digest<T>(
    key: &EcKeyRef<T>,
    digest: MessageDigest,
    message: &[u8],
    signature: &[u8],
) -> Result<(), JoseError>
where
    T: HasPublic,
{
    let sp = ec_component_len(key);
    if signature.len() != sp * 2 {
        return Err(JoseError::DecryptionFailed);
    }
    let (r, s) = signature.split_at(sp);
    let sig = BigNum::from_slice(r)
        .and_then(|r| Ok((r, BigNum::from_slice(s)?)))
        .and_then(|(r, s)| EcdsaSig::from_private_components(r, s))
        .map_err(|_| JoseError::DecryptionFailed)?;

    let mut hasher = Hasher::new(digest).map_err(|_| JoseError::DecryptionFailed)?;
    hasher
        .update(message)
        .map_err(|_| JoseError::DecryptionFailed)?;
    let digest = hasher.finish().map_err(|_| JoseError::DecryptionFailed)?;

    if sig
        .verify(&digest, key)
        .map_err(|_| JoseError::DecryptionFailed)?
    {
        Ok(())
    } else {
        Err(JoseError::DecryptionFailed)
    }
}
