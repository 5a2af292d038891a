//! JOSE Header Accessor Traits based on RFC 7515 Defined Header Fields
//!
//! Every accessor returns [`None`] when the parameter is absent.

use serde_json::{
    Map,
    Value,
};
use url::Url;

use crate::{
    Algorithm,
    jwk::RsaJwk,
};

/// `alg` (Algorithm) Header Parameter
///
/// Ref: [RFC 7515 4.1.1](<https://datatracker.ietf.org/doc/html/rfc7515#section-4.1.1>)
pub trait Alg {
    /// Return `alg` (Algorithm) header as a JWS algorithm
    fn alg(&self) -> Option<Algorithm>;
}

/// `jku` (JWK Set URL) Header Parameter
///
/// Ref: [RFC 7515 4.1.2](<https://datatracker.ietf.org/doc/html/rfc7515#section-4.1.2>)
pub trait Jku {
    /// Return `jku` (JWK Set URL) header
    fn jku(&self) -> Option<Url>;
}

/// `jwk` (JSON Web Key) Header Parameter
///
/// Ref: [RFC 7515 4.1.3](<https://datatracker.ietf.org/doc/html/rfc7515#section-4.1.3>)
///
/// WARNING: only use this if you understand the inherent risks and mitigations, like
/// validating any JWT-provided JWKs against a trusted root.
pub trait Jwk {
    /// Return `jwk` (JSON Web Key) header as an untyped JSON object
    fn jwk(&self) -> Option<&Map<String, Value>>;

    /// Return `jwk` (JSON Web Key) header as an RSA key, if it is one
    fn rsa_jwk(&self) -> Option<RsaJwk>;
}

/// `kid` (Key ID) Header Parameter
///
/// Ref: [RFC 7515 4.1.4](<https://datatracker.ietf.org/doc/html/rfc7515#section-4.1.4>)
pub trait Kid {
    /// Return `kid` (Key ID) header
    fn kid(&self) -> Option<&str>;
}

/// `x5u` (X.509 URL) Header Parameter
///
/// Ref: [RFC 7515 4.1.5](<https://datatracker.ietf.org/doc/html/rfc7515#section-4.1.5>)
///
/// WARNING: only use this if you understand the inherent risks and mitigations
pub trait X5U {
    /// Return `x5u` (X.509 URL) header
    fn x5u(&self) -> Option<Url>;
}

/// `x5c` (X.509 Certificate Chain) Header Parameter
///
/// Ref: [RFC 7515 4.1.6](<https://datatracker.ietf.org/doc/html/rfc7515#section-4.1.6>)
///
/// WARNING: only use this if you understand the inherent risks and mitigations
pub trait X5C {
    /// Return `x5c` (X.509 Certificate Chain) header, base64 DER certificates in order
    fn x5c(&self) -> Option<Vec<&str>>;
}

/// `x5t` (X.509 Certificate SHA-1 Thumbprint) Header Parameter
///
/// Ref: [RFC 7515 4.1.7](<https://datatracker.ietf.org/doc/html/rfc7515#section-4.1.7>)
pub trait X5T {
    /// Return `x5t` (X.509 Certificate SHA-1 Thumbprint) header
    fn x5t(&self) -> Option<&str>;
}

/// `x5t#S256` (X.509 Certificate SHA-256 Thumbprint) Header Parameter
///
/// Ref: [RFC 7515 4.1.8](<https://datatracker.ietf.org/doc/html/rfc7515#section-4.1.8>)
pub trait X5TS256 {
    /// Return `x5t#S256` (X.509 Certificate SHA-256 Thumbprint) header
    fn x5t_s256(&self) -> Option<&str>;
}

/// `typ` (Type) Header Parameter
///
/// Ref: [RFC 7515 4.1.9](<https://datatracker.ietf.org/doc/html/rfc7515#section-4.1.9>)
pub trait Typ {
    /// Return `typ` (Type) header
    fn typ(&self) -> Option<&str>;
}

/// `cty` (Content Type) Header Parameter
///
/// Ref: [RFC 7515 4.1.10](<https://datatracker.ietf.org/doc/html/rfc7515#section-4.1.10>)
pub trait Cty {
    /// Return `cty` (Content Type) header
    fn cty(&self) -> Option<&str>;
}

/// `crit` (Critical) Header Parameter
///
/// Ref: [RFC 7515 4.1.11](<https://datatracker.ietf.org/doc/html/rfc7515#section-4.1.11>)
pub trait Crit {
    /// Return `crit` (Critical) header
    fn crit(&self) -> Option<Vec<&str>>;
}
