use openssl::{
    ec::EcKeyRef,
    ecdsa::EcdsaSig,
    hash::{
        Hasher,
        MessageDigest,
    },
    pkey::{
        HasPrivate,
        Id,
        PKey,
        PKeyRef,
    },
    rsa::Padding,
    sign::{
        RsaPssSaltlen,
        Signer,
    },
};

use crate::{
    Algorithm,
    algorithm::AlgorithmFamily,
    crypto::openssl::{
        AsymmetricKey,
        HmacKey,
        ec_component_len,
        map_pkey_alg,
        message_digest,
    },
    error::JoseError,
    jws::Signer as JwsSigner,
};

impl JwsSigner for HmacKey {
    fn siglen(&self) -> usize {
        self.digest().size()
    }
    fn check_alg(&self, algorithm: Algorithm) -> Result<(), JoseError> {
        if algorithm == self.alg {
            Ok(())
        } else {
            Err(JoseError::WrongAlgorithm)
        }
    }
    fn sign_jwt(&self, _: Algorithm, jwt: &mut String) -> Result<(), JoseError> {
        let mut signer = Signer::new(self.digest(), &self.key)?;
        signer.update(jwt.as_bytes())?;
        let sig = signer.sign_to_vec()?;
        self.append_sig(sig, jwt);
        Ok(())
    }
}

impl<T> JwsSigner for PKey<T>
where
    T: HasPrivate,
{
    fn siglen(&self) -> usize {
        map_pkey_alg(self).map_or(0, |alg| signature_len(self, alg))
    }
    fn check_alg(&self, header_alg: Algorithm) -> Result<(), JoseError> {
        map_pkey_alg(self).map_or_else(
            || {
                Err(JoseError::UnsupportedOperation(
                    "key type or size has no JWS algorithm".into(),
                ))
            },
            |key_alg| {
                if key_alg == header_alg {
                    Ok(())
                } else {
                    Err(JoseError::WrongAlgorithm)
                }
            },
        )
    }
    fn sign_jwt(&self, algorithm: Algorithm, jwt: &mut String) -> Result<(), JoseError> {
        let sig = sign_with(self, algorithm, jwt.as_bytes())?;
        self.append_sig(sig, jwt);
        Ok(())
    }
}

impl<T> JwsSigner for AsymmetricKey<T>
where
    T: HasPrivate,
{
    fn siglen(&self) -> usize {
        signature_len(&self.key, self.alg)
    }
    fn check_alg(&self, algorithm: Algorithm) -> Result<(), JoseError> {
        if algorithm == self.alg {
            Ok(())
        } else {
            Err(JoseError::WrongAlgorithm)
        }
    }
    fn sign_jwt(&self, algorithm: Algorithm, jwt: &mut String) -> Result<(), JoseError> {
        let sig = sign_with(&self.key, algorithm, jwt.as_bytes())?;
        self.append_sig(sig, jwt);
        Ok(())
    }
}

fn signature_len<T>(key: &PKeyRef<T>, alg: Algorithm) -> usize
where
    T: HasPrivate,
{
    match (alg.family(), key.id()) {
        (AlgorithmFamily::Ecdsa, Id::EC) => key
            .ec_key()
            .map_or(0, |ec| 2 * ec_component_len(&ec)),
        // RSA signatures are exactly the modulus length
        _ => key.size(),
    }
}

fn sign_with<T>(key: &PKeyRef<T>, algorithm: Algorithm, message: &[u8]) -> Result<Vec<u8>, JoseError>
where
    T: HasPrivate,
{
    let descriptor = algorithm.descriptor();
    let digest = descriptor.digest.map(message_digest);
    match (descriptor.family, digest) {
        (AlgorithmFamily::Rsa, Some(digest)) => rsa_sign(digest, key, message, false),
        (AlgorithmFamily::RsaPss, Some(digest)) => rsa_sign(digest, key, message, true),
        (AlgorithmFamily::Ecdsa, Some(digest)) => ec_sign(digest, key.ec_key()?.as_ref(), message),
        // [`HmacKey`] must be used for HS-family algorithms; unsecured tokens are never signed
        _ => Err(JoseError::UnsupportedOperation(format!(
            "{algorithm} cannot be signed with an asymmetric key"
        ))),
    }
}

fn ec_sign<T>(digest: MessageDigest, key: &EcKeyRef<T>, message: &[u8]) -> Result<Vec<u8>, JoseError>
where
    T: HasPrivate,
{
    let mut hasher = Hasher::new(digest)?;
    hasher.update(message)?;
    let digest = hasher.finish()?;

    let rsig = EcdsaSig::sign(&digest, key)?;
    let plen = i32::try_from(ec_component_len(key))
        .map_err(|_| JoseError::InvalidKey("ec group order too large"))?;
    let mut signature = rsig.r().to_vec_padded(plen)?;
    signature.append(&mut rsig.s().to_vec_padded(plen)?);
    Ok(signature)
}

fn rsa_sign<T>(
    digest: MessageDigest,
    key: &PKeyRef<T>,
    message: &[u8],
    pss: bool,
) -> Result<Vec<u8>, JoseError>
where
    T: HasPrivate,
{
    let mut signer = Signer::new(digest, key)?;
    if pss {
        signer.set_rsa_padding(Padding::PKCS1_PSS)?;
        signer.set_rsa_pss_saltlen(RsaPssSaltlen::DIGEST_LENGTH)?;
    }
    signer.update(message)?;
    let sig = signer.sign_to_vec()?;
    Ok(sig)
}
