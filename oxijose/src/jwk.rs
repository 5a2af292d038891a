//! RSA JSON Web Keys
//!
//! An [`RsaJwk`] is an ordered JSON object like [`Header`](crate::header::Header).
//! Key material members hold unpadded base64url big-endian integers and are
//! checked on construction; other members pass through untouched.
//!
//! Ref: [RFC 7517](<https://datatracker.ietf.org/doc/html/rfc7517>),
//! [RFC 7518 6.3](<https://datatracker.ietf.org/doc/html/rfc7518#section-6.3>)

use openssl::{
    bn::{
        BigNum,
        BigNumRef,
    },
    pkey::{
        HasPublic,
        PKey,
        PKeyRef,
        Private,
        Public,
    },
    rsa::{
        Rsa,
        RsaPrivateKeyBuilder,
    },
};
use serde::Serialize;
use serde_json::{
    Map,
    Value,
};
use url::Url;

use crate::{
    Algorithm,
    compact,
    error::{
        JoseError,
        Malformed,
    },
    json::{
        ParserConfig,
        parse_object,
    },
};

const KTY: &str = "kty";
const RSA: &str = "RSA";

/// Members that carry a base64url-encoded integer
const INTEGER_MEMBERS: [&str; 8] = ["n", "e", "d", "p", "q", "dp", "dq", "qi"];

/// Members of the CRT private key form, in addition to `d`
const CRT_MEMBERS: [&str; 5] = ["p", "q", "dp", "dq", "qi"];

/// RSA key in JWK form (`kty: RSA`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaJwk {
    params: Map<String, Value>,
}

impl RsaJwk {
    /// Public key JWK from the modulus and exponent of `key`
    ///
    /// # Errors
    ///
    /// [`JoseError::UnsupportedOperation`] if `key` is not an RSA key.
    pub fn from_public_key<T>(key: &PKeyRef<T>) -> Result<Self, JoseError>
    where
        T: HasPublic,
    {
        let rsa = key.rsa().map_err(|_| not_rsa())?;
        let mut jwk = Self::bare();
        jwk.put_integer("n", rsa.n());
        jwk.put_integer("e", rsa.e());
        Ok(jwk)
    }

    /// Private key JWK carrying `d` and, when the key has them, the CRT members
    ///
    /// # Errors
    ///
    /// [`JoseError::UnsupportedOperation`] if `key` is not an RSA key.
    pub fn from_private_key(key: &PKeyRef<Private>) -> Result<Self, JoseError> {
        let rsa = key.rsa().map_err(|_| not_rsa())?;
        let mut jwk = Self::bare();
        jwk.put_integer("n", rsa.n());
        jwk.put_integer("e", rsa.e());
        jwk.put_integer("d", rsa.d());
        if let (Some(p), Some(q), Some(dp), Some(dq), Some(qi)) =
            (rsa.p(), rsa.q(), rsa.dmp1(), rsa.dmq1(), rsa.iqmp())
        {
            jwk.put_integer("p", p);
            jwk.put_integer("q", q);
            jwk.put_integer("dp", dp);
            jwk.put_integer("dq", dq);
            jwk.put_integer("qi", qi);
        }
        Ok(jwk)
    }

    /// Parses a JWK from JSON
    ///
    /// # Errors
    ///
    /// - [`JoseError::MalformedToken`] when the bytes are not a single JSON object
    ///   within the limits of `config`
    /// - [`JoseError::TypeMismatch`] as [`RsaJwk::try_from`]
    pub fn from_json(bytes: &[u8], config: &ParserConfig) -> Result<Self, JoseError> {
        Self::try_from(parse_object(bytes, config)?)
    }

    /// Serializes the members, in insertion order, as compact JSON
    ///
    /// # Errors
    ///
    /// [`JoseError::MalformedToken`] if serialization fails.
    pub fn to_json(&self) -> Result<Vec<u8>, JoseError> {
        serde_json::to_vec(&self.params).map_err(|_| Malformed::Json.into())
    }

    /// Builds the public key from `n` and `e`
    ///
    /// # Errors
    ///
    /// [`JoseError::Crypto`] if OpenSSL rejects the components.
    pub fn to_public_key(&self) -> Result<PKey<Public>, JoseError> {
        let rsa = Rsa::from_public_components(self.integer("n")?, self.integer("e")?)?;
        Ok(PKey::from_rsa(rsa)?)
    }

    /// Builds the private key, using the CRT members when all five are present
    ///
    /// # Errors
    ///
    /// - [`JoseError::InvalidKey`] if the JWK has no `d`
    /// - [`JoseError::UnsupportedOperation`] for multi-prime keys (`oth`)
    /// - [`JoseError::Crypto`] if OpenSSL rejects the components
    pub fn to_private_key(&self) -> Result<PKey<Private>, JoseError> {
        if !self.is_private() {
            return Err(JoseError::InvalidKey("jwk has no private exponent"));
        }
        if self.params.contains_key("oth") {
            return Err(JoseError::UnsupportedOperation(
                "multi-prime RSA keys are not supported".into(),
            ));
        }
        let (n, e, d) = (self.integer("n")?, self.integer("e")?, self.integer("d")?);
        let rsa = if CRT_MEMBERS.iter().all(|m| self.params.contains_key(*m)) {
            Rsa::from_private_components(
                n,
                e,
                d,
                self.integer("p")?,
                self.integer("q")?,
                self.integer("dp")?,
                self.integer("dq")?,
                self.integer("qi")?,
            )?
        } else {
            RsaPrivateKeyBuilder::new(n, e, d)?.build()
        };
        Ok(PKey::from_rsa(rsa)?)
    }

    /// Public and private key of a private JWK
    ///
    /// # Errors
    ///
    /// As [`RsaJwk::to_public_key`] and [`RsaJwk::to_private_key`].
    pub fn to_key_pair(&self) -> Result<(PKey<Public>, PKey<Private>), JoseError> {
        Ok((self.to_public_key()?, self.to_private_key()?))
    }

    /// Same key without its private members
    #[must_use]
    pub fn to_public_jwk(&self) -> Self {
        let mut params = self.params.clone();
        params.retain(|name, _| {
            !matches!(name.as_str(), "d" | "oth") && !CRT_MEMBERS.contains(&name.as_str())
        });
        Self { params }
    }

    /// Whether the JWK carries the private exponent
    #[must_use]
    pub fn is_private(&self) -> bool {
        self.params.contains_key("d")
    }

    /// `n` as base64url
    #[must_use]
    pub fn modulus(&self) -> Option<&str> {
        self.str_member("n")
    }

    /// `e` as base64url
    #[must_use]
    pub fn public_exponent(&self) -> Option<&str> {
        self.str_member("e")
    }

    /// `d` as base64url
    #[must_use]
    pub fn private_exponent(&self) -> Option<&str> {
        self.str_member("d")
    }

    /// `p` as base64url
    #[must_use]
    pub fn prime_p(&self) -> Option<&str> {
        self.str_member("p")
    }

    /// `q` as base64url
    #[must_use]
    pub fn prime_q(&self) -> Option<&str> {
        self.str_member("q")
    }

    /// `dp` as base64url
    #[must_use]
    pub fn prime_p_exponent(&self) -> Option<&str> {
        self.str_member("dp")
    }

    /// `dq` as base64url
    #[must_use]
    pub fn prime_q_exponent(&self) -> Option<&str> {
        self.str_member("dq")
    }

    /// `qi` as base64url
    #[must_use]
    pub fn crt_coefficient(&self) -> Option<&str> {
        self.str_member("qi")
    }

    /// `kid`
    #[must_use]
    pub fn kid(&self) -> Option<&str> {
        self.str_member("kid")
    }

    /// `use`, e.g. `sig` or `enc`
    #[must_use]
    pub fn key_use(&self) -> Option<&str> {
        self.str_member("use")
    }

    /// `alg` as a JWS algorithm
    #[must_use]
    pub fn alg(&self) -> Option<Algorithm> {
        self.str_member("alg")?.parse().ok()
    }

    /// `x5u`
    #[must_use]
    pub fn x5u(&self) -> Option<Url> {
        Url::parse(self.str_member("x5u")?).ok()
    }

    /// Sets `kid`
    pub fn set_kid(&mut self, kid: impl Into<String>) -> &mut Self {
        self.params.insert("kid".into(), Value::String(kid.into()));
        self
    }

    /// Sets `use`
    pub fn set_key_use(&mut self, key_use: impl Into<String>) -> &mut Self {
        self.params.insert("use".into(), Value::String(key_use.into()));
        self
    }

    /// Sets `alg`
    pub fn set_alg(&mut self, alg: Algorithm) -> &mut Self {
        self.params.insert("alg".into(), Value::String(alg.name().into()));
        self
    }

    /// Sets `x5u`
    pub fn set_x5u(&mut self, x5u: &Url) -> &mut Self {
        self.params.insert("x5u".into(), Value::String(x5u.as_str().into()));
        self
    }

    /// Returns the raw value of any member
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// Members as a JSON object
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.params
    }

    pub(crate) fn check(params: &Map<String, Value>) -> Result<(), JoseError> {
        if params.get(KTY).and_then(Value::as_str) != Some(RSA) {
            return Err(JoseError::type_mismatch(KTY, "\"RSA\""));
        }
        for name in ["n", "e"] {
            if !params.contains_key(name) {
                return Err(Malformed::MissingParameter(name).into());
            }
        }
        for name in INTEGER_MEMBERS {
            if let Some(value) = params.get(name) {
                value
                    .as_str()
                    .and_then(|s| compact::decode(s).ok())
                    .filter(|bytes| !bytes.is_empty())
                    .ok_or_else(|| JoseError::type_mismatch(name, "a base64url integer"))?;
            }
        }
        for name in ["kid", "use", "alg", "x5t"] {
            if params.get(name).is_some_and(|v| !v.is_string()) {
                return Err(JoseError::type_mismatch(name, "a string"));
            }
        }
        if let Some(x5u) = params.get("x5u") {
            x5u.as_str()
                .and_then(|s| Url::parse(s).ok())
                .ok_or_else(|| JoseError::type_mismatch("x5u", "an absolute URL"))?;
        }
        Ok(())
    }

    fn bare() -> Self {
        let mut params = Map::new();
        params.insert(KTY.into(), Value::String(RSA.into()));
        Self { params }
    }

    fn put_integer(&mut self, name: &str, value: &BigNumRef) {
        let mut encoded = String::new();
        compact::encode_append(value.to_vec(), &mut encoded);
        self.params.insert(name.into(), Value::String(encoded));
    }

    fn str_member(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(Value::as_str)
    }

    fn integer(&self, name: &'static str) -> Result<BigNum, JoseError> {
        let encoded = self
            .str_member(name)
            .ok_or(Malformed::MissingParameter(name))?;
        Ok(BigNum::from_slice(&compact::decode(encoded)?)?)
    }
}

impl TryFrom<Map<String, Value>> for RsaJwk {
    type Error = JoseError;

    /// # Errors
    ///
    /// - [`JoseError::TypeMismatch`] when `kty` is not `RSA`, an integer member is
    ///   not unpadded base64url, or `kid`/`use`/`alg`/`x5u` has the wrong type
    /// - [`JoseError::MalformedToken`] when `n` or `e` is absent
    fn try_from(params: Map<String, Value>) -> Result<Self, Self::Error> {
        Self::check(&params)?;
        Ok(Self { params })
    }
}

impl From<RsaJwk> for Map<String, Value> {
    fn from(value: RsaJwk) -> Self {
        value.params
    }
}

impl Serialize for RsaJwk {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.params.serialize(serializer)
    }
}

fn not_rsa() -> JoseError {
    JoseError::UnsupportedOperation("not an RSA key".into())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use openssl::{
        ec::{
            EcGroup,
            EcKey,
        },
        hash::MessageDigest,
        nid::Nid,
        pkey::PKey,
        rsa::Rsa,
        sign::{
            Signer,
            Verifier,
        },
    };
    use serde_json::{
        Map,
        Value,
        json,
    };

    use super::RsaJwk;
    use crate::{
        Algorithm,
        error::{
            JoseError,
            Malformed,
        },
        json::ParserConfig,
    };

    // RFC 7517 A.2
    const N: &str = concat!(
        "0vx7agoebGcQSuuPiLJXZptN9nndrQmbXEps2aiAFbWhM78LhWx4cbbfAAtVT86zwu1RK7aPFFxuhDR1L6tSoc_B",
        "JECPebWKRXjBZCiFV4n3oknjhMstn64tZ_2W-5JsGY4Hc5n9yBXArwl93lqt7_RN5w6Cf0h4QyQ5v-65YGjQR0_FD",
        "W2QvzqY368QQMicAtaSqzs8KJZgnYb9c7d0zgdAZHzu6qMQvRL5hajrn1n91CbOpbISD08qNLyrdkt-bFTWhAI4vM",
        "QFh6WeZu0fM4lFd2NcRwr3XPksINHaQ-G_xBniIqbw0Ls1jF44-csFCur-kEgU8awapJzKnqDKgw",
    );
    const D: &str = concat!(
        "X4cTteJY_gn4FYPsXB8rdXix5vwsg1FLN5E3EaG6RJoVH-HLLKD9M7dx5oo7GURknchnrRweUkC7hT5fJLM0WbFAK",
        "NLWY2vv7B6NqXSzUvxT0_YSfqijwp3RTzlBaCxWp4doFk5N2o8Gy_nHNKroADIkJ46pRUohsXywbReAdYaMwFs9tv8",
        "d_cPVY3i07a3t8MN6TNwm0dSawm9v47UiCl3Sk5ZiG7xojPLu4sbg1U2jx4IBTNBznbJSzFHK66jT8bgkuqsk0Gjsk",
        "DJk19Z4qwjwbsnn4j2WBii3RL-Us2lGVkY8fkFzme1z0HbIkfz0Y6mqnOYtqc0X4jfcKoAC8Q",
    );
    const P: &str = concat!(
        "83i-7IvMGXoMXCskv73TKr8637FiO7Z27zv8oj6pbWUQyLPQBQxtPVnwD20R-60eTDmD2ujnMt5PoqMrm8RfmNhVW",
        "DtjjMmCMjOpSXicFHj7XOuVIYQyqVWlWEh6dN36GVZYk93N8Bc9vY41xy8B9RzzOGVQzXvNEvn7O0nVbfs",
    );
    const Q: &str = concat!(
        "3dfOR9cuYq-0S-mkFLzgItgMEfFzB2q3hWehMuG0oCuqnb3vobLyumqjVZQO1dIrdwgTnCdpYzBcOfW5r370AFXji",
        "Wft_NGEiovonizhKpo9VVS78TzFgxkIdrecRezsZ-1kYd_s1qDbxtkDEgfAITAG9LUnADun4vIcb6yelxk",
    );
    const DP: &str = concat!(
        "G4sPXkc6Ya9y8oJW9_ILj4xuppu0lzi_H7VTkS8xj5SdX3coE0oimYwxIi2emTAue0UOa5dpgFGyBJ4c8tQ2VF402",
        "XRugKDTP8akYhFo5tAA77Qe_NmtuYZc3C3m3I24G2GvR5sSDxUyAN2zq8Lfn9EUms6rY3Ob8YeiKkTiBj0",
    );
    const DQ: &str = concat!(
        "s9lAH9fggBsoFR8Oac2R_E2gw282rT2kGOAhvIllETE1efrA6huUUvMfBcMpn8lqeW6vzznYY5SSQF7pMdC_agI3n",
        "G8Ibp1BUb0JUiraRNqUfLhcQb_d9GF4Dh7e74WbRsobRonujTYN1xCaP6TO61jvWrX-L18txXw494Q_cgk",
    );
    const QI: &str = concat!(
        "GyM_p6JrXySiz1toFgKbWV-JdI3jQ4ypu9rbMWx3rQJBfmt0FoYzgUIZEVFEcOqwemRN81zoDAaa-Bk0KWNGDjJHZ",
        "DdDmFhW3AN7lI-puxk_mHZGJ11rxyR8O55XLSe3SPmRfKwZI6yU24ZxvQKFYItdldUKGzO6Ia6zTKhAVRU",
    );

    fn rfc_jwk_json() -> Vec<u8> {
        serde_json::to_vec(&json!({
            "kty": "RSA",
            "n": N,
            "e": "AQAB",
            "d": D,
            "p": P,
            "q": Q,
            "dp": DP,
            "dq": DQ,
            "qi": QI,
            "alg": "RS256",
            "kid": "2011-04-29",
        }))
        .unwrap()
    }

    #[test]
    fn parse_reads_every_member() {
        let jwk = RsaJwk::from_json(&rfc_jwk_json(), &ParserConfig::default()).unwrap();
        assert_eq!(jwk.modulus(), Some(N));
        assert_eq!(jwk.public_exponent(), Some("AQAB"));
        assert_eq!(jwk.private_exponent(), Some(D));
        assert_eq!(jwk.prime_p(), Some(P));
        assert_eq!(jwk.prime_q(), Some(Q));
        assert_eq!(jwk.prime_p_exponent(), Some(DP));
        assert_eq!(jwk.prime_q_exponent(), Some(DQ));
        assert_eq!(jwk.crt_coefficient(), Some(QI));
        assert_eq!(jwk.alg(), Some(Algorithm::RS256));
        assert_eq!(jwk.kid(), Some("2011-04-29"));
        assert!(jwk.is_private());

        // members keep their order on the way back out
        assert_eq!(jwk.to_json().unwrap(), rfc_jwk_json());
    }

    #[test]
    fn rfc_key_converts_and_signs() {
        let jwk = RsaJwk::from_json(&rfc_jwk_json(), &ParserConfig::default()).unwrap();
        let (public, private) = jwk.to_key_pair().unwrap();
        assert!(private.rsa().unwrap().check_key().unwrap());
        assert_eq!(public.bits(), 2048);

        let mut signer = Signer::new(MessageDigest::sha256(), &private).unwrap();
        signer.update(b"payload").unwrap();
        let signature = signer.sign_to_vec().unwrap();

        let mut verifier = Verifier::new(MessageDigest::sha256(), &public).unwrap();
        verifier.update(b"payload").unwrap();
        assert!(verifier.verify(&signature).unwrap());
    }

    #[test]
    fn generated_key_round_trip() {
        let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();

        let jwk = RsaJwk::from_private_key(&key).unwrap();
        assert_eq!(jwk.public_exponent(), Some("AQAB"));
        let restored = jwk.to_private_key().unwrap();
        assert_eq!(
            restored.rsa().unwrap().private_key_to_der().unwrap(),
            key.rsa().unwrap().private_key_to_der().unwrap()
        );

        let parsed = RsaJwk::from_json(&jwk.to_json().unwrap(), &ParserConfig::default()).unwrap();
        assert_eq!(parsed, jwk);

        let public = RsaJwk::from_public_key(&key).unwrap();
        assert!(!public.is_private());
        assert_eq!(public, jwk.to_public_jwk());
        assert_eq!(
            public.to_public_key().unwrap().public_key_to_der().unwrap(),
            key.public_key_to_der().unwrap()
        );
    }

    #[test]
    fn private_exponent_without_crt_members() {
        let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
        let full = RsaJwk::from_private_key(&key).unwrap();

        let mut params = full.as_map().clone();
        for name in ["p", "q", "dp", "dq", "qi"] {
            params.shift_remove(name);
        }
        let jwk = RsaJwk::try_from(params).unwrap();
        let restored = jwk.to_private_key().unwrap().rsa().unwrap();
        assert_eq!(restored.d(), key.rsa().unwrap().d());
        assert!(restored.p().is_none());
    }

    #[test]
    fn public_jwk_cannot_build_private_key() {
        let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
        let jwk = RsaJwk::from_public_key(&key).unwrap();
        assert_eq!(
            jwk.to_private_key().unwrap_err(),
            JoseError::InvalidKey("jwk has no private exponent")
        );
    }

    #[test]
    fn setters_and_public_projection() {
        let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
        let mut jwk = RsaJwk::from_private_key(&key).unwrap();
        jwk.set_kid("k1").set_key_use("sig").set_alg(Algorithm::PS256);

        let public = jwk.to_public_jwk();
        assert_eq!(public.kid(), Some("k1"));
        assert_eq!(public.key_use(), Some("sig"));
        assert_eq!(public.alg(), Some(Algorithm::PS256));
        for name in ["d", "p", "q", "dp", "dq", "qi"] {
            assert!(public.get(name).is_none(), "{name}");
        }
    }

    #[test]
    fn rejects_non_rsa_input() {
        let config = ParserConfig::default();

        let err = RsaJwk::from_json(br#"{"kty":"EC","n":"AQAB","e":"AQAB"}"#, &config).unwrap_err();
        assert!(matches!(err, JoseError::TypeMismatch { key, .. } if key == "kty"));

        let err = RsaJwk::from_json(br#"{"kty":"RSA","e":"AQAB"}"#, &config).unwrap_err();
        assert_eq!(err, JoseError::MalformedToken(Malformed::MissingParameter("n")));

        let err = RsaJwk::from_json(br#"{"kty":"RSA","n":"AQ==","e":"AQAB"}"#, &config)
            .unwrap_err();
        assert!(matches!(err, JoseError::TypeMismatch { key, .. } if key == "n"));

        let err = RsaJwk::from_json(br#"{"kty":"RSA","n":"AQAB","e":65537}"#, &config)
            .unwrap_err();
        assert!(matches!(err, JoseError::TypeMismatch { key, .. } if key == "e"));

        let err = RsaJwk::from_json(br#"{"kty":"RSA","n":"AQAB","e":"AQAB","kid":1}"#, &config)
            .unwrap_err();
        assert!(matches!(err, JoseError::TypeMismatch { key, .. } if key == "kid"));

        let ec = EcKey::generate(&EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap()).unwrap();
        let ec = PKey::from_ec_key(ec).unwrap();
        assert!(matches!(
            RsaJwk::from_private_key(&ec).unwrap_err(),
            JoseError::UnsupportedOperation(_)
        ));
    }

    #[test]
    fn multi_prime_is_unsupported() {
        let mut params: Map<String, Value> = serde_json::from_slice(&rfc_jwk_json()).unwrap();
        params.insert("oth".into(), json!([{"r": "AQAB", "d": "AQAB", "t": "AQAB"}]));
        let jwk = RsaJwk::try_from(params).unwrap();
        assert!(matches!(
            jwk.to_private_key().unwrap_err(),
            JoseError::UnsupportedOperation(_)
        ));
    }
}
