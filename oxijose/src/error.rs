use thiserror::Error;

/// Errors raised while building, reconstructing, verifying or decrypting JOSE tokens
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JoseError {
    /// Error raised when an `alg`, `enc` or `zip` identifier is not in the registry
    #[error("unknown algorithm identifier '{0}'")]
    UnknownAlgorithm(String),

    /// Error raised when a reserved header parameter or claim holds a value of the
    /// wrong JSON type (e.g. a number for `kid`, or a non-URI for `jku`)
    #[error("'{key}' must be {expected}")]
    TypeMismatch {
        /// Name of the offending header parameter or claim
        key: String,
        /// Human readable description of the expected type
        expected: &'static str,
    },

    /// Error raised when a compact-serialized token cannot be parsed
    #[error("malformed token: {0}")]
    MalformedToken(#[from] Malformed),

    /// Error raised when a signature, authentication tag or wrapped key fails to
    /// verify. Deliberately carries no detail about which step failed.
    #[error("decryption or verification failed")]
    DecryptionFailed,

    /// Error raised when an algorithm is recognised but cannot be performed with
    /// the supplied key or by this build
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Error raised when caller-supplied key material is unusable for producing a token
    #[error("invalid key: {0}")]
    InvalidKey(&'static str),

    /// Error raised when the header `alg` does not match the algorithm of the key
    #[error("header 'alg' did not match the key algorithm")]
    WrongAlgorithm,

    /// Error raised when the crypto backend fails while producing a token
    #[error("crypto backend error: {0}")]
    Crypto(String),

    /// Error raised by a [`KeyProvider`] when no key can be resolved
    ///
    /// [`KeyProvider`]: crate::validation::KeyProvider
    #[error("key not found")]
    KeyNotFound,

    /// Error raised when a [`TokenValidator`] rejects the claims of a verified token
    ///
    /// [`TokenValidator`]: crate::validation::TokenValidator
    #[error("claims rejected: {0}")]
    InvalidClaims(#[from] ClaimViolation),
}

impl From<openssl::error::ErrorStack> for JoseError {
    fn from(value: openssl::error::ErrorStack) -> Self {
        Self::Crypto(value.to_string())
    }
}

impl JoseError {
    pub(crate) fn type_mismatch(key: impl Into<String>, expected: &'static str) -> Self {
        Self::TypeMismatch {
            key: key.into(),
            expected,
        }
    }
}

/// Reasons a compact-serialized token was rejected before any cryptography ran
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Malformed {
    /// Token did not contain two, three or five dot-delimited segments
    #[error("token contained {0} dot-delimited segments")]
    SegmentCount(usize),

    /// A segment was not unpadded base64url
    #[error("segment is not unpadded base64url")]
    Encoding,

    /// A header or payload was not a UTF-8 JSON object
    #[error("segment is not a valid JSON object")]
    Json,

    /// A header or payload JSON object repeated a member name
    #[error("duplicate member '{0}'")]
    DuplicateKey(String),

    /// A header or payload JSON value nested deeper than the configured limit
    #[error("json nesting exceeds configured depth")]
    NestingTooDeep,

    /// Token was larger than the configured size limit
    #[error("token above configured size threshold")]
    OverSizeThreshold,

    /// An unsecured (`alg: none`) token carried a non-empty signature segment
    #[error("unsecured token carried a signature")]
    UnsecuredSignature,

    /// A header parameter required by the token shape was absent
    #[error("missing required header parameter '{0}'")]
    MissingParameter(&'static str),
}

/// Claim rules enforced by the validation pipeline
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClaimViolation {
    /// `exp` is in the past
    #[error("'exp' indicates token is expired")]
    Expired,

    /// `nbf` is in the future
    #[error("'nbf' indicates token is not yet valid")]
    NotValidYet,

    /// `iat` is in the future
    #[error("'iat' indicates token was issued in the future")]
    IssuedInFuture,

    /// `iss` did not match
    #[error("'iss' did not match expected issuer")]
    WrongIssuer,

    /// `aud` did not contain the expected audience
    #[error("'aud' did not contain expected audience")]
    WrongAudience,

    /// `sub` was not in the accepted set
    #[error("'sub' was not an accepted subject")]
    WrongSubject,

    /// `typ` header was not in the accepted set
    #[error("'typ' was not an accepted type")]
    WrongType,

    /// A claim required by a configured validator is absent
    #[error("required claim '{0}' is absent")]
    MissingClaim(&'static str),

    /// Raised by any custom [`TokenValidator`](crate::validation::TokenValidator)
    #[error("custom validation failed: {0}")]
    Custom(&'static str),
}
