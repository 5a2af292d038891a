//! Traits representing full list of JWT Claims registered in RFC 7519
//!
//! Every accessor returns [`None`] (or an empty iterator) when the claim is absent.

/// `iss` (Issuer) Claim
///
/// Ref: [RFC 7519 4.1.1](<https://datatracker.ietf.org/doc/html/rfc7519#section-4.1.1>)
pub trait Iss {
    /// Return `iss` (Issuer) claim
    fn iss(&self) -> Option<&str>;
}

/// `sub` (Subject) Claim
///
/// Ref: [RFC 7519 4.1.2](<https://datatracker.ietf.org/doc/html/rfc7519#section-4.1.2>)
pub trait Sub {
    /// Return `sub` (Subject) claim
    fn sub(&self) -> Option<&str>;
}

/// `aud` (Audience) Claim
///
/// Ref: [RFC 7519 4.1.3](<https://datatracker.ietf.org/doc/html/rfc7519#section-4.1.3>)
pub trait Aud {
    /// Return `aud` (Audience) claim, normalized to a list
    fn aud(&self) -> impl Iterator<Item = impl AsRef<str>>;
}

/// `exp` (Expiration Time) Claim
///
/// Ref: [RFC 7519 4.1.4](<https://datatracker.ietf.org/doc/html/rfc7519#section-4.1.4>)
pub trait Exp {
    /// Return `exp` (Expiration Time) claim in seconds since the epoch
    fn exp(&self) -> Option<i64>;
}

/// `nbf` (Not Before) Claim
///
/// Ref: [RFC 7519 4.1.5](<https://datatracker.ietf.org/doc/html/rfc7519#section-4.1.5>)
pub trait Nbf {
    /// Return `nbf` (Not Before) claim in seconds since the epoch
    fn nbf(&self) -> Option<i64>;
}

/// `iat` (Issued At) Claim
///
/// Ref: [RFC 7519 4.1.6](<https://datatracker.ietf.org/doc/html/rfc7519#section-4.1.6>)
pub trait Iat {
    /// Return `iat` (Issued At) claim in seconds since the epoch
    fn iat(&self) -> Option<i64>;
}

/// `jti` (JWT ID) Claim
///
/// Ref: [RFC 7519 4.1.7](<https://datatracker.ietf.org/doc/html/rfc7519#section-4.1.7>)
pub trait Jti {
    /// Return `jti` (JWT ID) claim
    fn jti(&self) -> Option<&str>;
}
