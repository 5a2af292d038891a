//! [`openssl`] crypto backend implementation
//!
//! Implements [`Signer`] and [`VerificationKey`] on various
//! [`openssl`] types to permit their direct usage in JWS
//! operations. The JWE handlers use the same backend.
//!
//! [`Signer`]: crate::jws::Signer
//! [`VerificationKey`]: crate::jws::VerificationKey

mod sign;
mod verify;

use openssl::{
    ec::EcKeyRef,
    hash::MessageDigest,
    nid::Nid,
    pkey::{
        HasParams,
        HasPublic,
        Id,
        PKey,
        PKeyRef,
        Private,
    },
};

use crate::{
    Algorithm,
    algorithm::{
        AlgorithmFamily,
        Digest,
    },
    error::JoseError,
};

pub(crate) fn message_digest(digest: Digest) -> MessageDigest {
    match digest {
        Digest::Sha256 => MessageDigest::sha256(),
        Digest::Sha384 => MessageDigest::sha384(),
        Digest::Sha512 => MessageDigest::sha512(),
    }
}

/// OpenSSL [`HmacKey`] for signing and/or verifying JWS
pub struct HmacKey {
    key: PKey<Private>,
    alg: Algorithm,
}

impl std::fmt::Debug for HmacKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // secret is never printed
        f.debug_struct("HmacKey")
            .field("alg", &self.alg)
            .finish_non_exhaustive()
    }
}

impl HmacKey {
    /// Constructs an HMAC key for any of `HS256`, `HS384` or `HS512`
    ///
    /// # Errors
    ///
    /// - [`JoseError::UnsupportedOperation`] if `alg` is not an HMAC algorithm
    /// - [`JoseError::InvalidKey`] if `secret` is empty
    pub fn new(alg: Algorithm, secret: &[u8]) -> Result<Self, JoseError> {
        if alg.family() != AlgorithmFamily::Hmac {
            return Err(JoseError::UnsupportedOperation(format!(
                "{alg} is not an HMAC algorithm"
            )));
        }
        if secret.is_empty() {
            return Err(JoseError::InvalidKey("hmac secret must not be zero-length"));
        }
        let key = PKey::hmac(secret)?;
        Ok(Self { key, alg })
    }

    /// Constructs a new HS256 key
    ///
    /// # Errors
    ///
    /// If secret is an empty slice.
    pub fn hs256(secret: &[u8]) -> Result<Self, JoseError> {
        Self::new(Algorithm::HS256, secret)
    }

    /// Constructs a new HS384 key
    ///
    /// # Errors
    ///
    /// If secret is an empty slice.
    pub fn hs384(secret: &[u8]) -> Result<Self, JoseError> {
        Self::new(Algorithm::HS384, secret)
    }

    /// Constructs a new HS512 key
    ///
    /// # Errors
    ///
    /// If secret is an empty slice.
    pub fn hs512(secret: &[u8]) -> Result<Self, JoseError> {
        Self::new(Algorithm::HS512, secret)
    }

    /// Algorithm this key signs with
    #[must_use]
    pub const fn alg(&self) -> Algorithm {
        self.alg
    }

    pub(crate) fn digest(&self) -> MessageDigest {
        // `new` only admits HMAC algorithms, all of which carry a digest
        let digest = self.alg.descriptor().digest.unwrap_or(Digest::Sha256);
        message_digest(digest)
    }
}

/// An RSA or EC [`PKey`] pinned to an explicit JWS [`Algorithm`]
///
/// A bare [`PKey`] infers its algorithm from key type and size. Use this wrapper
/// when the inference is ambiguous, e.g. to sign `PS256` with an ordinary RSA key.
pub struct AsymmetricKey<T> {
    key: PKey<T>,
    alg: Algorithm,
}

impl<T> AsymmetricKey<T>
where
    T: HasPublic,
{
    /// Pins `key` to `alg`
    ///
    /// # Errors
    ///
    /// - [`JoseError::UnsupportedOperation`] if `alg` is not an RSA, RSA-PSS or ECDSA
    ///   algorithm, or `key` belongs to a different family or EC curve
    /// - [`JoseError::InvalidKey`] if an RSA key is shorter than 2048 bits
    pub fn new(alg: Algorithm, key: PKey<T>) -> Result<Self, JoseError> {
        let compatible = match (alg.family(), key.id()) {
            (AlgorithmFamily::Rsa | AlgorithmFamily::RsaPss, Id::RSA | Id::RSA_PSS) => {
                if key.bits() < 2048 {
                    return Err(JoseError::InvalidKey("rsa keys must be at least 2048 bits"));
                }
                true
            }
            (AlgorithmFamily::Ecdsa, Id::EC) => key
                .ec_key()
                .ok()
                .and_then(|ec| ec_curve_alg(&ec))
                .is_some_and(|curve_alg| curve_alg == alg),
            _ => false,
        };
        if compatible {
            Ok(Self { key, alg })
        } else {
            Err(JoseError::UnsupportedOperation(format!(
                "{alg} cannot be used with this key"
            )))
        }
    }

    /// Algorithm the key is pinned to
    #[must_use]
    pub const fn alg(&self) -> Algorithm {
        self.alg
    }

    /// Underlying key
    #[must_use]
    pub fn key(&self) -> &PKeyRef<T> {
        &self.key
    }
}

fn map_pkey_alg<T>(key: &PKeyRef<T>) -> Option<Algorithm>
where
    T: HasPublic,
{
    match (key.id(), key.bits()) {
        (Id::RSA, 2048) => Some(Algorithm::RS256),
        (Id::RSA, 3072) => Some(Algorithm::RS384),
        (Id::RSA, 4096) => Some(Algorithm::RS512),
        (Id::RSA_PSS, 2048) => Some(Algorithm::PS256),
        (Id::RSA_PSS, 3072) => Some(Algorithm::PS384),
        (Id::RSA_PSS, 4096) => Some(Algorithm::PS512),
        (Id::EC, _) => {
            let eckey = key.ec_key().ok()?;
            ec_curve_alg(&eckey)
        }
        _ => None,
    }
}

fn ec_curve_alg<T>(key: &EcKeyRef<T>) -> Option<Algorithm>
where
    T: HasPublic,
{
    match key.group().curve_name()? {
        Nid::X9_62_PRIME256V1 => Some(Algorithm::ES256),
        Nid::SECP384R1 => Some(Algorithm::ES384),
        Nid::SECP521R1 => Some(Algorithm::ES512),
        _ => None,
    }
}

/// Octets in each of the fixed-width `r` and `s` halves of an ECDSA signature
fn ec_component_len<T>(key: &EcKeyRef<T>) -> usize
where
    T: HasParams,
{
    key.group().order_bits().div_ceil(8) as usize
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use openssl::{
        bn::{
            BigNum,
            BigNumContext,
        },
        ec::{
            EcGroup,
            EcKey,
            EcPoint,
        },
        nid::Nid,
        pkey::PKey,
        rsa::Rsa,
    };

    use super::{
        AsymmetricKey,
        HmacKey,
        ec_component_len,
        ec_curve_alg,
        map_pkey_alg,
    };
    use crate::{
        Algorithm,
        error::JoseError,
    };

    #[test]
    fn hmac_key_must_be_hmac() {
        let err = HmacKey::new(Algorithm::PS256, b"secret").err().unwrap();
        assert!(matches!(err, JoseError::UnsupportedOperation(_)));
    }

    #[test]
    fn hmac_key_must_not_be_empty() {
        let err = HmacKey::hs256(b"").err().unwrap();
        assert!(matches!(err, JoseError::InvalidKey(_)));
    }

    #[test]
    fn hmac_digest_sizes() {
        assert_eq!(HmacKey::hs256(b"k").unwrap().digest().size(), 32);
        assert_eq!(HmacKey::hs384(b"k").unwrap().digest().size(), 48);
        assert_eq!(HmacKey::hs512(b"k").unwrap().digest().size(), 64);
    }

    #[test]
    fn hmac_key_debug_hides_secret() {
        let key = HmacKey::hs384(b"hunter2").unwrap();
        let printed = format!("{key:?}");
        assert_eq!(printed, "HmacKey { alg: HS384, .. }");
    }

    #[test]
    fn ec_component_len_per_curve() {
        for (nid, len) in [
            (Nid::X9_62_PRIME256V1, 32),
            (Nid::SECP384R1, 48),
            (Nid::SECP521R1, 66),
        ] {
            let group = EcGroup::from_curve_name(nid).unwrap();
            let key = EcKey::generate(&group).unwrap();
            assert_eq!(ec_component_len(&key), len);
        }
    }

    #[test]
    fn rsa_key_inference_by_size() {
        let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
        assert_eq!(map_pkey_alg(&key), Some(Algorithm::RS256));

        let key = PKey::from_rsa(Rsa::generate(1024).unwrap()).unwrap();
        assert_eq!(map_pkey_alg(&key), None);
    }

    #[test]
    fn asymmetric_key_pins_algorithm() {
        let rsa = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
        let key = AsymmetricKey::new(Algorithm::PS384, rsa.clone()).unwrap();
        assert_eq!(key.alg(), Algorithm::PS384);

        let err = AsymmetricKey::new(Algorithm::ES256, rsa).err().unwrap();
        assert!(matches!(err, JoseError::UnsupportedOperation(_)));

        let small = PKey::from_rsa(Rsa::generate(1024).unwrap()).unwrap();
        let err = AsymmetricKey::new(Algorithm::RS256, small).err().unwrap();
        assert!(matches!(err, JoseError::InvalidKey(_)));

        let ec = EcKey::generate(&EcGroup::from_curve_name(Nid::SECP384R1).unwrap()).unwrap();
        let ec = PKey::from_ec_key(ec).unwrap();
        AsymmetricKey::new(Algorithm::ES384, ec.clone()).unwrap();
        let err = AsymmetricKey::new(Algorithm::ES256, ec).err().unwrap();
        assert!(matches!(err, JoseError::UnsupportedOperation(_)));

        let hmac = PKey::hmac(b"secret").unwrap();
        let err = AsymmetricKey::new(Algorithm::HS256, hmac).err().unwrap();
        assert!(matches!(err, JoseError::UnsupportedOperation(_)));
    }

    #[test]
    fn unsupported_ec_curve_returns_no_alg() {
        let keypair = EcKey::generate(&EcGroup::from_curve_name(Nid::SECT283R1).unwrap()).unwrap();
        let keypair = PKey::from_ec_key(keypair).unwrap();
        let eckey = keypair.ec_key().unwrap();

        assert!(ec_curve_alg(&eckey).is_none());
    }

    #[test]
    #[allow(clippy::many_single_char_names)]
    fn unnamed_ec_curve_rejected() {
        // P-256 domain parameters, but without the curve name attached
        let p = BigNum::from_hex_str(
            "ffffffff00000001000000000000000000000000ffffffffffffffffffffffff",
        )
        .unwrap();
        let a = BigNum::from_hex_str(
            "ffffffff00000001000000000000000000000000fffffffffffffffffffffffc",
        )
        .unwrap();
        let b = BigNum::from_hex_str(
            "5ac635d8aa3a93e7b3ebbd55769886bc651d06b0cc53b0f63bce3c3e27d2604b",
        )
        .unwrap();
        let gx = BigNum::from_hex_str(
            "6b17d1f2e12c4247f8bce6e563a440f277037d812deb33a0f4a13945d898c296",
        )
        .unwrap();
        let gy = BigNum::from_hex_str(
            "4fe342e2fe1a7f9b8ee7eb4a7c0f9e162bce33576b315ececbb6406837bf51f5",
        )
        .unwrap();
        let n = BigNum::from_hex_str(
            "ffffffff00000000ffffffffffffffffbce6faada7179e84f3b9cac2fc632551",
        )
        .unwrap();
        let h = BigNum::from_u32(1).unwrap();

        let mut ctx = BigNumContext::new().unwrap();
        let mut group = EcGroup::from_components(p, a, b, &mut ctx).unwrap();
        group.set_asn1_flag(openssl::ec::Asn1Flag::EXPLICIT_CURVE);

        let mut g = EcPoint::new(&group).unwrap();
        g.set_affine_coordinates_gfp(&group, &gx, &gy, &mut ctx)
            .unwrap();
        group.set_generator(g, n, h).unwrap();

        let key = EcKey::generate(&group).unwrap();
        assert!(key.group().curve_name().is_none());
        assert!(ec_curve_alg(&key).is_none());
    }
}
