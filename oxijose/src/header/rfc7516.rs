//! JOSE Header Accessor Traits for RFC 7516 (JWE) Header Fields

use crate::{
    CompressionAlgorithm,
    EncryptionMethod,
    JweAlgorithm,
};

/// `alg` (Algorithm) Header Parameter of a JWE
///
/// Ref: [RFC 7516 4.1.1](<https://datatracker.ietf.org/doc/html/rfc7516#section-4.1.1>)
pub trait KeyAlg {
    /// Return `alg` header as a key management algorithm
    fn key_alg(&self) -> Option<JweAlgorithm>;
}

/// `enc` (Encryption Algorithm) Header Parameter
///
/// Ref: [RFC 7516 4.1.2](<https://datatracker.ietf.org/doc/html/rfc7516#section-4.1.2>)
pub trait Enc {
    /// Return `enc` (Encryption Algorithm) header
    fn enc(&self) -> Option<EncryptionMethod>;
}

/// `zip` (Compression Algorithm) Header Parameter
///
/// Ref: [RFC 7516 4.1.3](<https://datatracker.ietf.org/doc/html/rfc7516#section-4.1.3>)
pub trait Zip {
    /// Return `zip` (Compression Algorithm) header
    fn zip(&self) -> Option<CompressionAlgorithm>;
}
