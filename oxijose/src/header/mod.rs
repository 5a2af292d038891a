//! JOSE header model
//!
//! A [`Header`] is an ordered JSON object. Reserved parameters are routed through
//! a dispatch table ([`HeaderKey`]) that validates their JSON type on every write,
//! whether the write comes from a typed setter, [`Header::set`] or the parser.
//! Unrecognised parameters pass through untouched.
mod rfc7515;
mod rfc7516;

pub use rfc7515::{
    Alg,
    Crit,
    Cty,
    Jku,
    Jwk,
    Kid,
    Typ,
    X5C,
    X5T,
    X5TS256,
    X5U,
};
pub use rfc7516::{
    Enc,
    KeyAlg,
    Zip,
};
use serde::Serialize;
use serde_json::{
    Map,
    Value,
};
use url::Url;

use crate::{
    Algorithm,
    CompressionAlgorithm,
    EncryptionMethod,
    JweAlgorithm,
    error::{
        JoseError,
        Malformed,
    },
    json::{
        ParserConfig,
        parse_object,
    },
    jwk::RsaJwk,
};

/// Reserved header parameter names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderKey {
    /// `typ`
    Typ,
    /// `alg`
    Alg,
    /// `enc`
    Enc,
    /// `zip`
    Zip,
    /// `kid`
    Kid,
    /// `cty`
    Cty,
    /// `crit`
    Crit,
    /// `jku`
    Jku,
    /// `jwk`
    Jwk,
    /// `x5u`
    X5u,
    /// `x5t`
    X5t,
    /// `x5t#S256`
    X5tS256,
    /// `x5c`
    X5c,
}

impl HeaderKey {
    /// Every reserved header parameter
    pub const ALL: [Self; 13] = [
        Self::Typ,
        Self::Alg,
        Self::Enc,
        Self::Zip,
        Self::Kid,
        Self::Cty,
        Self::Crit,
        Self::Jku,
        Self::Jwk,
        Self::X5u,
        Self::X5t,
        Self::X5tS256,
        Self::X5c,
    ];

    /// Registered parameter name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Typ => "typ",
            Self::Alg => "alg",
            Self::Enc => "enc",
            Self::Zip => "zip",
            Self::Kid => "kid",
            Self::Cty => "cty",
            Self::Crit => "crit",
            Self::Jku => "jku",
            Self::Jwk => "jwk",
            Self::X5u => "x5u",
            Self::X5t => "x5t",
            Self::X5tS256 => "x5t#S256",
            Self::X5c => "x5c",
        }
    }

    /// Resolves a parameter name, [`None`] for extension parameters
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.name() == name)
    }

    fn check(self, value: &Value) -> Result<(), JoseError> {
        let name = self.name();
        match self {
            Self::Alg => {
                let alg = expect_str(name, value)?;
                if alg.parse::<Algorithm>().is_err() {
                    alg.parse::<JweAlgorithm>()?;
                }
            }
            Self::Enc => {
                expect_str(name, value)?.parse::<EncryptionMethod>()?;
            }
            Self::Zip => {
                expect_str(name, value)?.parse::<CompressionAlgorithm>()?;
            }
            Self::Typ | Self::Kid | Self::Cty | Self::X5t | Self::X5tS256 => {
                expect_str(name, value)?;
            }
            Self::Crit | Self::X5c => {
                expect_str_array(name, value)?;
            }
            Self::Jku | Self::X5u => {
                Url::parse(expect_str(name, value)?)
                    .map_err(|_| JoseError::type_mismatch(name, "an absolute URL"))?;
            }
            Self::Jwk => {
                let jwk = value
                    .as_object()
                    .ok_or_else(|| JoseError::type_mismatch(name, "a JSON object"))?;
                match jwk.get("kty").and_then(Value::as_str) {
                    Some("RSA") => RsaJwk::check(jwk)?,
                    Some(_) => {}
                    None => return Err(JoseError::type_mismatch(name, "a JWK with a 'kty'")),
                }
            }
        }
        Ok(())
    }
}

fn expect_str<'a>(name: &str, value: &'a Value) -> Result<&'a str, JoseError> {
    value
        .as_str()
        .ok_or_else(|| JoseError::type_mismatch(name, "a string"))
}

fn expect_str_array<'a>(name: &str, value: &'a Value) -> Result<Vec<&'a str>, JoseError> {
    value
        .as_array()
        .and_then(|items| items.iter().map(Value::as_str).collect::<Option<Vec<_>>>())
        .ok_or_else(|| JoseError::type_mismatch(name, "an array of strings"))
}

/// JOSE header: ordered parameters with typed access to the reserved ones
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Header {
    params: Map<String, Value>,
}

impl Header {
    /// Empty header
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Header for a JWS with the given `alg`
    #[must_use]
    pub fn jws(alg: Algorithm) -> Self {
        let mut header = Self::new();
        header.set_alg(alg);
        header
    }

    /// Header for a JWE with the given key management `alg` and content `enc`
    #[must_use]
    pub fn jwe(alg: JweAlgorithm, enc: EncryptionMethod) -> Self {
        let mut header = Self::new();
        header.set_key_alg(alg).set_enc(enc);
        header
    }

    /// Parses a decoded header segment
    ///
    /// # Errors
    ///
    /// - [`JoseError::MalformedToken`] when the bytes are not a single JSON object
    ///   within the limits of `config`
    /// - [`JoseError::TypeMismatch`] when a reserved parameter has the wrong type
    /// - [`JoseError::UnknownAlgorithm`] when `alg`, `enc` or `zip` is not registered
    pub fn from_json(bytes: &[u8], config: &ParserConfig) -> Result<Self, JoseError> {
        Self::try_from(parse_object(bytes, config)?)
    }

    /// Serializes the parameters, in insertion order, as compact JSON
    ///
    /// # Errors
    ///
    /// [`JoseError::MalformedToken`] if serialization fails.
    pub fn to_json(&self) -> Result<Vec<u8>, JoseError> {
        serde_json::to_vec(&self.params).map_err(|_| Malformed::Json.into())
    }

    /// Returns the raw value of any parameter
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// Sets any parameter, validating the value type of reserved ones
    ///
    /// # Errors
    ///
    /// - [`JoseError::TypeMismatch`] when `name` is reserved and `value` has the
    ///   wrong JSON type or is not a valid URL for URL-typed parameters
    /// - [`JoseError::UnknownAlgorithm`] for unregistered `alg`, `enc` or `zip`
    pub fn set(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<&mut Self, JoseError> {
        let name = name.into();
        let value = value.into();
        if let Some(key) = HeaderKey::from_name(&name) {
            key.check(&value)?;
        }
        self.params.insert(name, value);
        Ok(self)
    }

    /// Removes a parameter, returning its value
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.params.shift_remove(name)
    }

    /// Whether the parameter is present
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    /// Iterates over all parameters in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of parameters
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Whether the header has no parameters
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Whether `alg` is `none`
    #[must_use]
    pub fn is_unsecured(&self) -> bool {
        self.alg() == Some(Algorithm::None)
    }

    // typed setters only produce values that pass `HeaderKey::check`
    fn put(&mut self, key: HeaderKey, value: impl Into<Value>) -> &mut Self {
        self.params.insert(key.name().to_owned(), value.into());
        self
    }

    /// Sets `alg` to a JWS algorithm
    pub fn set_alg(&mut self, alg: Algorithm) -> &mut Self {
        self.put(HeaderKey::Alg, alg.name())
    }

    /// Sets `alg` to a JWE key management algorithm
    pub fn set_key_alg(&mut self, alg: JweAlgorithm) -> &mut Self {
        self.put(HeaderKey::Alg, alg.name())
    }

    /// Sets `enc`
    pub fn set_enc(&mut self, enc: EncryptionMethod) -> &mut Self {
        self.put(HeaderKey::Enc, enc.name())
    }

    /// Sets `zip`
    pub fn set_zip(&mut self, zip: CompressionAlgorithm) -> &mut Self {
        self.put(HeaderKey::Zip, zip.name())
    }

    /// Sets `typ`
    pub fn set_typ(&mut self, typ: impl Into<String>) -> &mut Self {
        self.put(HeaderKey::Typ, typ.into())
    }

    /// Sets `cty`
    pub fn set_cty(&mut self, cty: impl Into<String>) -> &mut Self {
        self.put(HeaderKey::Cty, cty.into())
    }

    /// Sets `kid`
    pub fn set_kid(&mut self, kid: impl Into<String>) -> &mut Self {
        self.put(HeaderKey::Kid, kid.into())
    }

    /// Sets `crit`
    pub fn set_crit(&mut self, crit: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        let crit: Vec<Value> = crit.into_iter().map(|c| Value::String(c.into())).collect();
        self.put(HeaderKey::Crit, crit)
    }

    /// Sets `jku`
    pub fn set_jku(&mut self, jku: &Url) -> &mut Self {
        self.put(HeaderKey::Jku, jku.as_str())
    }

    /// Sets `jwk`
    pub fn set_jwk(&mut self, jwk: Map<String, Value>) -> &mut Self {
        self.put(HeaderKey::Jwk, jwk)
    }

    /// Sets `jwk` to an RSA key
    pub fn set_rsa_jwk(&mut self, jwk: &RsaJwk) -> &mut Self {
        self.put(HeaderKey::Jwk, jwk.as_map().clone())
    }

    /// Sets `x5u`
    pub fn set_x5u(&mut self, x5u: &Url) -> &mut Self {
        self.put(HeaderKey::X5u, x5u.as_str())
    }

    /// Sets `x5t`
    pub fn set_x5t(&mut self, x5t: impl Into<String>) -> &mut Self {
        self.put(HeaderKey::X5t, x5t.into())
    }

    /// Sets `x5t#S256`
    pub fn set_x5t_s256(&mut self, thumbprint: impl Into<String>) -> &mut Self {
        self.put(HeaderKey::X5tS256, thumbprint.into())
    }

    /// Sets `x5c`
    pub fn set_x5c(&mut self, chain: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        let chain: Vec<Value> = chain.into_iter().map(|c| Value::String(c.into())).collect();
        self.put(HeaderKey::X5c, chain)
    }

    fn str_param(&self, key: HeaderKey) -> Option<&str> {
        self.params.get(key.name()).and_then(Value::as_str)
    }

    fn str_array_param(&self, key: HeaderKey) -> Option<Vec<&str>> {
        self.params
            .get(key.name())
            .and_then(|v| expect_str_array(key.name(), v).ok())
    }
}

impl TryFrom<Map<String, Value>> for Header {
    type Error = JoseError;
    fn try_from(params: Map<String, Value>) -> Result<Self, Self::Error> {
        for (name, value) in &params {
            if let Some(key) = HeaderKey::from_name(name) {
                key.check(value)?;
            }
        }
        Ok(Self { params })
    }
}

impl Serialize for Header {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.params.serialize(serializer)
    }
}

impl Alg for Header {
    fn alg(&self) -> Option<Algorithm> {
        self.str_param(HeaderKey::Alg)?.parse().ok()
    }
}

impl KeyAlg for Header {
    fn key_alg(&self) -> Option<JweAlgorithm> {
        self.str_param(HeaderKey::Alg)?.parse().ok()
    }
}

impl Enc for Header {
    fn enc(&self) -> Option<EncryptionMethod> {
        self.str_param(HeaderKey::Enc)?.parse().ok()
    }
}

impl Zip for Header {
    fn zip(&self) -> Option<CompressionAlgorithm> {
        self.str_param(HeaderKey::Zip)?.parse().ok()
    }
}

impl Jku for Header {
    fn jku(&self) -> Option<Url> {
        Url::parse(self.str_param(HeaderKey::Jku)?).ok()
    }
}

impl Jwk for Header {
    fn jwk(&self) -> Option<&Map<String, Value>> {
        self.params.get(HeaderKey::Jwk.name())?.as_object()
    }

    fn rsa_jwk(&self) -> Option<RsaJwk> {
        RsaJwk::try_from(self.jwk()?.clone()).ok()
    }
}

impl Kid for Header {
    fn kid(&self) -> Option<&str> {
        self.str_param(HeaderKey::Kid)
    }
}

impl X5U for Header {
    fn x5u(&self) -> Option<Url> {
        Url::parse(self.str_param(HeaderKey::X5u)?).ok()
    }
}

impl X5C for Header {
    fn x5c(&self) -> Option<Vec<&str>> {
        self.str_array_param(HeaderKey::X5c)
    }
}

impl X5T for Header {
    fn x5t(&self) -> Option<&str> {
        self.str_param(HeaderKey::X5t)
    }
}

impl X5TS256 for Header {
    fn x5t_s256(&self) -> Option<&str> {
        self.str_param(HeaderKey::X5tS256)
    }
}

impl Typ for Header {
    fn typ(&self) -> Option<&str> {
        self.str_param(HeaderKey::Typ)
    }
}

impl Cty for Header {
    fn cty(&self) -> Option<&str> {
        self.str_param(HeaderKey::Cty)
    }
}

impl Crit for Header {
    fn crit(&self) -> Option<Vec<&str>> {
        self.str_array_param(HeaderKey::Crit)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use openssl::{
        pkey::PKey,
        rsa::Rsa,
    };
    use serde_json::{
        Map,
        json,
    };
    use url::Url;

    use super::{
        Alg,
        Crit,
        Cty,
        Enc,
        Header,
        HeaderKey,
        Jku,
        Jwk,
        KeyAlg,
        Kid,
        Typ,
        X5C,
        X5T,
        X5TS256,
        X5U,
        Zip,
    };
    use crate::{
        Algorithm,
        CompressionAlgorithm,
        EncryptionMethod,
        JweAlgorithm,
        error::{
            JoseError,
            Malformed,
        },
        json::ParserConfig,
        jwk::RsaJwk,
    };

    #[test]
    fn typed_setters_round_trip() {
        let jku = Url::parse("https://example.org/jwks.json").unwrap();
        let x5u = Url::parse("https://example.org/cert.pem").unwrap();
        let mut jwk = Map::new();
        jwk.insert("kty".into(), json!("oct"));

        let mut header = Header::new();
        header
            .set_alg(Algorithm::ES384)
            .set_typ("JWT")
            .set_cty("example")
            .set_kid("key-1")
            .set_crit(["exp"])
            .set_jku(&jku)
            .set_jwk(jwk.clone())
            .set_x5u(&x5u)
            .set_x5t("dGh1bWI")
            .set_x5t_s256("dGh1bWIy")
            .set_x5c(["MIIB", "MIIC"]);

        assert_eq!(header.alg(), Some(Algorithm::ES384));
        assert_eq!(header.key_alg(), None);
        assert_eq!(header.typ(), Some("JWT"));
        assert_eq!(header.cty(), Some("example"));
        assert_eq!(header.kid(), Some("key-1"));
        assert_eq!(header.crit(), Some(vec!["exp"]));
        assert_eq!(header.jku(), Some(jku));
        assert_eq!(header.jwk(), Some(&jwk));
        assert_eq!(header.x5u(), Some(x5u));
        assert_eq!(header.x5t(), Some("dGh1bWI"));
        assert_eq!(header.x5t_s256(), Some("dGh1bWIy"));
        assert_eq!(header.x5c(), Some(vec!["MIIB", "MIIC"]));
    }

    #[test]
    fn rsa_jwk_parameter() {
        let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
        let mut jwk = RsaJwk::from_public_key(&key).unwrap();
        jwk.set_kid("signing-key");

        let mut header = Header::jws(Algorithm::RS256);
        header.set_rsa_jwk(&jwk);
        assert_eq!(header.rsa_jwk(), Some(jwk.clone()));

        let parsed = Header::from_json(&header.to_json().unwrap(), &ParserConfig::default()).unwrap();
        let restored = parsed.rsa_jwk().unwrap();
        assert_eq!(restored.kid(), Some("signing-key"));
        assert_eq!(
            restored.to_public_key().unwrap().public_key_to_der().unwrap(),
            key.public_key_to_der().unwrap()
        );

        // an opaque non-RSA key is kept but has no RSA view
        header.set("jwk", json!({"kty": "oct", "k": "c2VjcmV0"})).unwrap();
        assert_eq!(header.rsa_jwk(), None);
    }

    #[test]
    fn jwk_parameter_is_checked() {
        let config = ParserConfig::default();

        let err = Header::from_json(br#"{"alg":"RS256","jwk":{"n":"AQAB"}}"#, &config).unwrap_err();
        assert!(matches!(err, JoseError::TypeMismatch { key, .. } if key == "jwk"));

        let err = Header::from_json(
            br#"{"alg":"RS256","jwk":{"kty":"RSA","n":"not base64!","e":"AQAB"}}"#,
            &config,
        )
        .unwrap_err();
        assert!(matches!(err, JoseError::TypeMismatch { key, .. } if key == "n"));

        let mut header = Header::new();
        let err = header.set("jwk", json!({"kty": "RSA", "n": "AQAB"})).unwrap_err();
        assert_eq!(err, JoseError::MalformedToken(Malformed::MissingParameter("e")));
        assert!(!header.contains("jwk"));
    }

    #[test]
    fn jwe_parameters() {
        let mut header = Header::jwe(JweAlgorithm::RsaOaep256, EncryptionMethod::A256Gcm);
        header.set_zip(CompressionAlgorithm::Deflate);
        assert_eq!(header.key_alg(), Some(JweAlgorithm::RsaOaep256));
        assert_eq!(header.alg(), None);
        assert_eq!(header.enc(), Some(EncryptionMethod::A256Gcm));
        assert_eq!(header.zip(), Some(CompressionAlgorithm::Deflate));
        assert_eq!(
            header.to_json().unwrap(),
            br#"{"alg":"RSA-OAEP-256","enc":"A256GCM","zip":"DEF"}"#
        );
    }

    #[test]
    fn absent_parameters_are_none() {
        let header = Header::new();
        assert!(header.is_empty());
        assert_eq!(header.alg(), None);
        assert_eq!(header.kid(), None);
        assert_eq!(header.crit(), None);
        assert_eq!(header.jku(), None);
    }

    #[test]
    fn generic_set_dispatches_reserved_keys() {
        let mut header = Header::new();
        header.set("kid", "abc").unwrap();
        assert_eq!(header.kid(), Some("abc"));

        let err = header.set("kid", 42).unwrap_err();
        assert_eq!(
            err,
            JoseError::TypeMismatch {
                key: "kid".into(),
                expected: "a string"
            }
        );
        // failed writes leave the previous value in place
        assert_eq!(header.kid(), Some("abc"));

        let err = header.set("jku", "not a url").unwrap_err();
        assert!(matches!(err, JoseError::TypeMismatch { key, .. } if key == "jku"));

        let err = header.set("x5c", json!(["a", 1])).unwrap_err();
        assert!(matches!(err, JoseError::TypeMismatch { key, .. } if key == "x5c"));

        let err = header.set("jwk", "string").unwrap_err();
        assert!(matches!(err, JoseError::TypeMismatch { key, .. } if key == "jwk"));
    }

    #[test]
    fn generic_set_rejects_unknown_algorithms() {
        let mut header = Header::new();
        assert_eq!(
            header.set("alg", "HS1").unwrap_err(),
            JoseError::UnknownAlgorithm("HS1".into())
        );
        assert_eq!(
            header.set("enc", "A128CTR").unwrap_err(),
            JoseError::UnknownAlgorithm("A128CTR".into())
        );
        assert_eq!(
            header.set("zip", "GZIP").unwrap_err(),
            JoseError::UnknownAlgorithm("GZIP".into())
        );
        header.set("alg", "dir").unwrap();
        assert_eq!(header.key_alg(), Some(JweAlgorithm::Dir));
    }

    #[test]
    fn custom_parameters_pass_through() {
        let mut header = Header::jws(Algorithm::HS256);
        header.set("x-custom", json!({"nested": [1, 2]})).unwrap();
        assert_eq!(header.get("x-custom"), Some(&json!({"nested": [1, 2]})));
        assert!(header.contains("x-custom"));
        assert_eq!(header.remove("x-custom"), Some(json!({"nested": [1, 2]})));
        assert_eq!(header.len(), 1);
    }

    #[test]
    fn parse_preserves_order_and_validates() {
        let header = Header::from_json(
            br#"{"typ":"JWT","alg":"HS256","custom":true}"#,
            &ParserConfig::new(),
        )
        .unwrap();
        let names: Vec<_> = header.iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["typ", "alg", "custom"]);
        assert_eq!(header.to_json().unwrap(), br#"{"typ":"JWT","alg":"HS256","custom":true}"#);

        let err = Header::from_json(br#"{"alg":256}"#, &ParserConfig::new()).unwrap_err();
        assert!(matches!(err, JoseError::TypeMismatch { .. }));

        let err =
            Header::from_json(br#"{"alg":"HS256","alg":"none"}"#, &ParserConfig::new()).unwrap_err();
        assert_eq!(
            err,
            JoseError::MalformedToken(Malformed::DuplicateKey("alg".into()))
        );
    }

    #[test]
    fn key_names_resolve() {
        for key in HeaderKey::ALL {
            assert_eq!(HeaderKey::from_name(key.name()), Some(key));
        }
        assert_eq!(HeaderKey::from_name("ALG"), None);
        assert_eq!(HeaderKey::from_name("custom"), None);
    }

    #[test]
    fn unsecured() {
        assert!(Header::jws(Algorithm::None).is_unsecured());
        assert!(!Header::jws(Algorithm::HS256).is_unsecured());
    }
}
