//! JWT claims set model
mod int_date;
mod rfc7519;

use chrono::{
    DateTime,
    Utc,
};
pub use int_date::IntDate;
pub use rfc7519::{
    Aud,
    Exp,
    Iat,
    Iss,
    Jti,
    Nbf,
    Sub,
};
use serde::Serialize;
use serde_json::{
    Map,
    Value,
};
use url::Url;

use crate::{
    error::{
        JoseError,
        Malformed,
    },
    json::{
        ParserConfig,
        parse_object,
    },
};

/// Reserved claim names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClaimKey {
    /// `iss`
    Iss,
    /// `sub`
    Sub,
    /// `prn`, the pre-RFC name of `sub`
    Prn,
    /// `aud`
    Aud,
    /// `iat`
    Iat,
    /// `nbf`
    Nbf,
    /// `exp`
    Exp,
    /// `jti`
    Jti,
    /// `typ`
    Typ,
}

impl ClaimKey {
    /// Every reserved claim
    pub const ALL: [Self; 9] = [
        Self::Iss,
        Self::Sub,
        Self::Prn,
        Self::Aud,
        Self::Iat,
        Self::Nbf,
        Self::Exp,
        Self::Jti,
        Self::Typ,
    ];

    /// Registered claim name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Iss => "iss",
            Self::Sub => "sub",
            Self::Prn => "prn",
            Self::Aud => "aud",
            Self::Iat => "iat",
            Self::Nbf => "nbf",
            Self::Exp => "exp",
            Self::Jti => "jti",
            Self::Typ => "typ",
        }
    }

    /// Resolves a claim name, [`None`] for custom claims
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.name() == name)
    }

    fn check(self, value: &Value) -> Result<(), JoseError> {
        let name = self.name();
        match self {
            Self::Iss | Self::Sub | Self::Prn => check_string_or_uri(name, value),
            Self::Aud => match value {
                Value::Array(items) => items
                    .iter()
                    .try_for_each(|item| check_string_or_uri(name, item)),
                _ => check_string_or_uri(name, value),
            },
            Self::Iat | Self::Nbf | Self::Exp => value
                .as_i64()
                .map(drop)
                .ok_or_else(|| JoseError::type_mismatch(name, "an integer IntDate")),
            Self::Jti | Self::Typ => value
                .as_str()
                .map(drop)
                .ok_or_else(|| JoseError::type_mismatch(name, "a string")),
        }
    }
}

/// `StringOrURI`: any string, but one containing `:` must be an absolute URI
fn check_string_or_uri(name: &str, value: &Value) -> Result<(), JoseError> {
    let s = value
        .as_str()
        .ok_or_else(|| JoseError::type_mismatch(name, "a StringOrURI"))?;
    if s.contains(':') {
        Url::parse(s).map_err(|_| JoseError::type_mismatch(name, "a StringOrURI"))?;
    }
    Ok(())
}

/// JWT claims set: ordered claims with typed access to the reserved ones
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClaimsSet {
    claims: Map<String, Value>,
}

impl ClaimsSet {
    /// Empty claims set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a decoded payload
    ///
    /// # Errors
    ///
    /// - [`JoseError::MalformedToken`] when the bytes are not a single JSON object
    ///   within the limits of `config`, including repeated claim names
    /// - [`JoseError::TypeMismatch`] when a reserved claim has the wrong type
    pub fn from_json(bytes: &[u8], config: &ParserConfig) -> Result<Self, JoseError> {
        Self::try_from(parse_object(bytes, config)?)
    }

    /// Serializes the claims, in insertion order, as compact JSON
    ///
    /// # Errors
    ///
    /// [`JoseError::MalformedToken`] if serialization fails.
    pub fn to_json(&self) -> Result<Vec<u8>, JoseError> {
        serde_json::to_vec(&self.claims).map_err(|_| Malformed::Json.into())
    }

    /// Returns the raw value of any claim
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    /// Sets any claim, validating the value type of reserved ones
    ///
    /// # Errors
    ///
    /// [`JoseError::TypeMismatch`] when `name` is reserved and `value` has the wrong
    /// JSON type (e.g. a non-integer `exp`, or an `iss` that looks like but is not a URI).
    pub fn set(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<&mut Self, JoseError> {
        let name = name.into();
        let value = value.into();
        if let Some(key) = ClaimKey::from_name(&name) {
            key.check(&value)?;
        }
        self.claims.insert(name, value);
        Ok(self)
    }

    /// Removes a claim, returning its value
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.claims.shift_remove(name)
    }

    /// Whether the claim is present
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.claims.contains_key(name)
    }

    /// Iterates over all claims in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.claims.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of claims
    #[must_use]
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    /// Whether the set holds no claims
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    fn put_checked(&mut self, key: ClaimKey, value: Value) -> Result<&mut Self, JoseError> {
        key.check(&value)?;
        self.claims.insert(key.name().to_owned(), value);
        Ok(self)
    }

    fn put(&mut self, key: ClaimKey, value: impl Into<Value>) -> &mut Self {
        self.claims.insert(key.name().to_owned(), value.into());
        self
    }

    fn str_claim(&self, key: ClaimKey) -> Option<&str> {
        self.claims.get(key.name()).and_then(Value::as_str)
    }

    fn date_claim(&self, key: ClaimKey) -> Option<IntDate> {
        self.claims
            .get(key.name())
            .and_then(Value::as_i64)
            .map(IntDate::from_secs)
    }

    /// Sets `iss`
    ///
    /// # Errors
    ///
    /// [`JoseError::TypeMismatch`] if `iss` contains `:` but is not a URI.
    pub fn set_iss(&mut self, iss: impl Into<String>) -> Result<&mut Self, JoseError> {
        self.put_checked(ClaimKey::Iss, Value::String(iss.into()))
    }

    /// Sets `sub`
    ///
    /// # Errors
    ///
    /// [`JoseError::TypeMismatch`] if `sub` contains `:` but is not a URI.
    pub fn set_sub(&mut self, sub: impl Into<String>) -> Result<&mut Self, JoseError> {
        self.put_checked(ClaimKey::Sub, Value::String(sub.into()))
    }

    /// Sets the legacy `prn` (principal) claim
    ///
    /// # Errors
    ///
    /// [`JoseError::TypeMismatch`] if `prn` contains `:` but is not a URI.
    pub fn set_principal(&mut self, prn: impl Into<String>) -> Result<&mut Self, JoseError> {
        self.put_checked(ClaimKey::Prn, Value::String(prn.into()))
    }

    /// Legacy `prn` (principal) claim
    #[must_use]
    pub fn principal(&self) -> Option<&str> {
        self.str_claim(ClaimKey::Prn)
    }

    /// Appends an audience
    ///
    /// A single audience is written as a JSON string; adding a second turns `aud`
    /// into an array.
    ///
    /// # Errors
    ///
    /// [`JoseError::TypeMismatch`] if `aud` contains `:` but is not a URI.
    pub fn add_audience(&mut self, aud: impl Into<String>) -> Result<&mut Self, JoseError> {
        let aud = Value::String(aud.into());
        check_string_or_uri(ClaimKey::Aud.name(), &aud)?;
        let merged = match self.claims.get_mut(ClaimKey::Aud.name()) {
            Some(Value::Array(items)) => {
                items.push(aud);
                return Ok(self);
            }
            Some(existing) => Value::Array(vec![existing.take(), aud]),
            None => aud,
        };
        Ok(self.put(ClaimKey::Aud, merged))
    }

    /// Replaces `aud` with the given audiences
    ///
    /// # Errors
    ///
    /// [`JoseError::TypeMismatch`] if any entry contains `:` but is not a URI.
    pub fn set_audience(
        &mut self,
        audience: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<&mut Self, JoseError> {
        let mut values: Vec<Value> = audience
            .into_iter()
            .map(|aud| Value::String(aud.into()))
            .collect();
        let value = if values.len() == 1 {
            values.swap_remove(0)
        } else {
            Value::Array(values)
        };
        self.put_checked(ClaimKey::Aud, value)
    }

    /// Sets `iat`
    pub fn set_iat(&mut self, iat: impl Into<IntDate>) -> &mut Self {
        self.put(ClaimKey::Iat, iat.into().secs())
    }

    /// Sets `nbf`
    pub fn set_nbf(&mut self, nbf: impl Into<IntDate>) -> &mut Self {
        self.put(ClaimKey::Nbf, nbf.into().secs())
    }

    /// Sets `exp`
    pub fn set_exp(&mut self, exp: impl Into<IntDate>) -> &mut Self {
        self.put(ClaimKey::Exp, exp.into().secs())
    }

    /// Sets `jti`
    pub fn set_jti(&mut self, jti: impl Into<String>) -> &mut Self {
        self.put(ClaimKey::Jti, jti.into())
    }

    /// Sets `typ`
    pub fn set_typ(&mut self, typ: impl Into<String>) -> &mut Self {
        self.put(ClaimKey::Typ, typ.into())
    }

    /// `typ` claim
    #[must_use]
    pub fn typ(&self) -> Option<&str> {
        self.str_claim(ClaimKey::Typ)
    }

    /// `exp` as a calendar date
    #[must_use]
    pub fn expiration_time(&self) -> Option<DateTime<Utc>> {
        self.date_claim(ClaimKey::Exp)?.to_datetime()
    }

    /// `nbf` as a calendar date
    #[must_use]
    pub fn not_before_time(&self) -> Option<DateTime<Utc>> {
        self.date_claim(ClaimKey::Nbf)?.to_datetime()
    }

    /// `iat` as a calendar date
    #[must_use]
    pub fn issued_at_time(&self) -> Option<DateTime<Utc>> {
        self.date_claim(ClaimKey::Iat)?.to_datetime()
    }
}

impl TryFrom<Map<String, Value>> for ClaimsSet {
    type Error = JoseError;
    fn try_from(claims: Map<String, Value>) -> Result<Self, Self::Error> {
        for (name, value) in &claims {
            if let Some(key) = ClaimKey::from_name(name) {
                key.check(value)?;
            }
        }
        Ok(Self { claims })
    }
}

impl Serialize for ClaimsSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.claims.serialize(serializer)
    }
}

impl Iss for ClaimsSet {
    fn iss(&self) -> Option<&str> {
        self.str_claim(ClaimKey::Iss)
    }
}

impl Sub for ClaimsSet {
    fn sub(&self) -> Option<&str> {
        self.str_claim(ClaimKey::Sub)
    }
}

impl Aud for ClaimsSet {
    fn aud(&self) -> impl Iterator<Item = impl AsRef<str>> {
        let values = match self.claims.get(ClaimKey::Aud.name()) {
            Some(Value::Array(items)) => items.as_slice(),
            Some(single) => std::slice::from_ref(single),
            None => &[],
        };
        values.iter().filter_map(Value::as_str)
    }
}

impl Exp for ClaimsSet {
    fn exp(&self) -> Option<i64> {
        self.date_claim(ClaimKey::Exp).map(IntDate::secs)
    }
}

impl Nbf for ClaimsSet {
    fn nbf(&self) -> Option<i64> {
        self.date_claim(ClaimKey::Nbf).map(IntDate::secs)
    }
}

impl Iat for ClaimsSet {
    fn iat(&self) -> Option<i64> {
        self.date_claim(ClaimKey::Iat).map(IntDate::secs)
    }
}

impl Jti for ClaimsSet {
    fn jti(&self) -> Option<&str> {
        self.str_claim(ClaimKey::Jti)
    }
}
