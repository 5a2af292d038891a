//! Explicit parser configuration and the strict JSON object reader used for
//! every header and claims segment.
//!
//! `serde_json` silently keeps the last of several identical member names. JOSE
//! requires such objects to be rejected, so segments are read through a custom
//! [`DeserializeSeed`] that sees every member as it is parsed.

use std::{
    cell::Cell,
    fmt,
};

use serde::de::{
    self,
    DeserializeSeed,
    MapAccess,
    SeqAccess,
    Visitor,
};
use serde_json::{
    Map,
    Number,
    Value,
};

use crate::error::Malformed;

/// Handling of repeated member names inside a JSON object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateKeyPolicy {
    /// Reject the whole token with [`Malformed::DuplicateKey`]
    #[default]
    Reject,
    /// Keep the last occurrence, as ECMAScript `JSON.parse` does
    ///
    /// Only intended for interoperating with legacy issuers.
    LastWins,
}

/// Limits applied while reconstructing a token
///
/// Passed explicitly into every parse call; there is no process-wide parser state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    max_token_size: Option<usize>,
    max_depth: usize,
    duplicate_keys: DuplicateKeyPolicy,
    max_decompressed_size: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserConfig {
    /// Default nesting limit for JSON values inside a segment
    pub const DEFAULT_MAX_DEPTH: usize = 32;

    /// Default bound on the inflated size of a `zip: DEF` payload (1 MiB)
    pub const DEFAULT_MAX_DECOMPRESSED_SIZE: usize = 1024 * 1024;

    /// Configuration with no token size cap, a nesting limit of
    /// [`Self::DEFAULT_MAX_DEPTH`] and duplicate members rejected
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_token_size: None,
            max_depth: Self::DEFAULT_MAX_DEPTH,
            duplicate_keys: DuplicateKeyPolicy::Reject,
            max_decompressed_size: Self::DEFAULT_MAX_DECOMPRESSED_SIZE,
        }
    }

    /// Caps accepted token size to `size` bytes
    ///
    /// Larger tokens fail with [`Malformed::OverSizeThreshold`] before any decoding.
    #[must_use]
    pub const fn with_max_token_size(mut self, size: usize) -> Self {
        self.max_token_size = Some(size);
        self
    }

    /// Sets the maximum nesting depth of objects and arrays in a segment
    #[must_use]
    pub const fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Sets the duplicate member policy
    #[must_use]
    pub const fn with_duplicate_keys(mut self, policy: DuplicateKeyPolicy) -> Self {
        self.duplicate_keys = policy;
        self
    }

    /// Sets the largest payload `zip: DEF` decompression may produce
    #[must_use]
    pub const fn with_max_decompressed_size(mut self, size: usize) -> Self {
        self.max_decompressed_size = size;
        self
    }

    /// Configured token size cap, if any
    #[must_use]
    pub const fn max_token_size(&self) -> Option<usize> {
        self.max_token_size
    }

    /// Configured nesting limit
    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Configured duplicate member policy
    #[must_use]
    pub const fn duplicate_keys(&self) -> DuplicateKeyPolicy {
        self.duplicate_keys
    }

    /// Configured decompression bound
    #[must_use]
    pub const fn max_decompressed_size(&self) -> usize {
        self.max_decompressed_size
    }

    pub(crate) const fn check_token_size(&self, len: usize) -> Result<(), Malformed> {
        match self.max_token_size {
            Some(limit) if len > limit => Err(Malformed::OverSizeThreshold),
            _ => Ok(()),
        }
    }
}

/// Parses `bytes` as a single JSON object under the limits in `config`
pub(crate) fn parse_object(
    bytes: &[u8],
    config: &ParserConfig,
) -> Result<Map<String, Value>, Malformed> {
    let fault = Cell::new(None);
    let reader = StrictReader {
        config,
        depth: 0,
        fault: &fault,
    };
    let mut de = serde_json::Deserializer::from_slice(bytes);
    let parsed = reader
        .deserialize(&mut de)
        .and_then(|value| de.end().map(|()| value));

    match parsed {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(Malformed::Json),
        Err(_) => Err(fault.take().unwrap_or(Malformed::Json)),
    }
}

#[derive(Clone, Copy)]
struct StrictReader<'a> {
    config: &'a ParserConfig,
    depth: usize,
    fault: &'a Cell<Option<Malformed>>,
}

impl StrictReader<'_> {
    fn descend<E: de::Error>(self) -> Result<Self, E> {
        if self.depth >= self.config.max_depth {
            self.fault.set(Some(Malformed::NestingTooDeep));
            return Err(E::custom("nesting too deep"));
        }
        Ok(Self {
            depth: self.depth + 1,
            ..self
        })
    }
}

impl<'de> DeserializeSeed<'de> for StrictReader<'_> {
    type Value = Value;

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for StrictReader<'_> {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Number(v.into()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(Value::Number(v.into()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Number::from_f64(v).map_or(Value::Null, Value::Number))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let child = self.descend::<A::Error>()?;
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element_seed(child)? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A>(self, mut access: A) -> Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let child = self.descend::<A::Error>()?;
        let mut map = Map::new();
        while let Some(key) = access.next_key::<String>()? {
            let value = access.next_value_seed(child)?;
            if map.contains_key(&key)
                && self.config.duplicate_keys == DuplicateKeyPolicy::Reject
            {
                self.fault.set(Some(Malformed::DuplicateKey(key)));
                return Err(de::Error::custom("duplicate member"));
            }
            map.insert(key, value);
        }
        Ok(Value::Object(map))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use serde_json::json;

    use super::{
        DuplicateKeyPolicy,
        ParserConfig,
        parse_object,
    };
    use crate::error::Malformed;

    #[test]
    fn parses_object_preserving_order() {
        let map = parse_object(br#"{"z":1,"a":[true,null,"x"],"m":{"n":1.5}}"#, &ParserConfig::new())
            .unwrap();
        let keys: Vec<_> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, ["z", "a", "m"]);
        assert_eq!(map["a"], json!([true, null, "x"]));
        assert_eq!(map["m"]["n"], json!(1.5));
    }

    #[test]
    fn rejects_duplicate_member() {
        let err = parse_object(br#"{"sub":"alice","sub":"mallory"}"#, &ParserConfig::new())
            .unwrap_err();
        assert_eq!(err, Malformed::DuplicateKey("sub".into()));
    }

    #[test]
    fn rejects_nested_duplicate_member() {
        let err = parse_object(br#"{"jwk":{"kty":"RSA","kty":"EC"}}"#, &ParserConfig::new())
            .unwrap_err();
        assert_eq!(err, Malformed::DuplicateKey("kty".into()));
    }

    #[test]
    fn last_wins_policy_keeps_final_value() {
        let config = ParserConfig::new().with_duplicate_keys(DuplicateKeyPolicy::LastWins);
        let map = parse_object(br#"{"sub":"alice","sub":"mallory"}"#, &config).unwrap();
        assert_eq!(map["sub"], json!("mallory"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn nesting_limit() {
        let config = ParserConfig::new().with_max_depth(3);
        parse_object(br#"{"a":{"b":{}}}"#, &config).unwrap();

        let err = parse_object(br#"{"a":{"b":{"c":{}}}}"#, &config).unwrap_err();
        assert_eq!(err, Malformed::NestingTooDeep);

        let err = parse_object(br#"{"a":[[[]]]}"#, &config).unwrap_err();
        assert_eq!(err, Malformed::NestingTooDeep);
    }

    #[test]
    fn non_object_rejected() {
        for input in [&b"[]"[..], b"\"str\"", b"42", b"null", b""] {
            assert_eq!(parse_object(input, &ParserConfig::new()).unwrap_err(), Malformed::Json);
        }
    }

    #[test]
    fn trailing_garbage_rejected() {
        let err = parse_object(br#"{"a":1} {"b":2}"#, &ParserConfig::new()).unwrap_err();
        assert_eq!(err, Malformed::Json);
    }

    #[test]
    fn invalid_utf8_rejected() {
        let err = parse_object(b"{\"a\":\"\xff\"}", &ParserConfig::new()).unwrap_err();
        assert_eq!(err, Malformed::Json);
    }

    #[test]
    fn token_size_limit() {
        let config = ParserConfig::new().with_max_token_size(10);
        config.check_token_size(10).unwrap();
        assert_eq!(
            config.check_token_size(11).unwrap_err(),
            Malformed::OverSizeThreshold
        );
        ParserConfig::new().check_token_size(usize::MAX).unwrap();
    }

    #[test]
    fn defaults() {
        let config = ParserConfig::default();
        assert_eq!(config.max_token_size(), None);
        assert_eq!(config.max_depth(), 32);
        assert_eq!(config.duplicate_keys(), DuplicateKeyPolicy::Reject);
        assert_eq!(config.max_decompressed_size(), 1024 * 1024);
    }
}
