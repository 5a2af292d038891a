//! Immutable registry of the JOSE algorithm identifiers understood by this crate.
//!
//! Every identifier maps to a `'static` descriptor holding the cryptographic
//! parameters the handlers need. The set is closed: it is part of the wire
//! contract and cannot be extended at runtime.

use std::{
    fmt::Display,
    str::FromStr,
};

use crate::error::JoseError;

/// Message digest underlying a MAC or signature algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Digest {
    /// `SHA-256`
    Sha256,
    /// `SHA-384`
    Sha384,
    /// `SHA-512`
    Sha512,
}

impl Digest {
    /// Output size of the digest in octets
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }
}

/// Family a JWS [`Algorithm`] belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmFamily {
    /// Keyed-hash message authentication
    Hmac,
    /// `RSASSA-PKCS1-v1_5`
    Rsa,
    /// `RSASSA-PSS`
    RsaPss,
    /// Elliptic curve DSA with fixed-width `r || s` signatures
    Ecdsa,
    /// Unsecured, no signature
    None,
}

/// Parameters of a JWS [`Algorithm`]
#[derive(Debug, PartialEq, Eq)]
pub struct AlgorithmDescriptor {
    /// Registered `alg` identifier
    pub name: &'static str,
    /// Name of the underlying MAC/signature transformation
    pub transformation: &'static str,
    /// Digest used by the transformation, [`None`] for unsecured tokens
    pub digest: Option<Digest>,
    /// Algorithm family
    pub family: AlgorithmFamily,
}

/// JWS Signature Algorithm
///
/// Ref: [RFC 7518 3.1](<https://datatracker.ietf.org/doc/html/rfc7518#section-3.1>)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// `HMAC` using `SHA-256`
    HS256,

    /// `HMAC` using `SHA-384`
    HS384,

    /// `HMAC` using `SHA-512`
    HS512,

    /// `RSASSA-PKCS1-v1_5` using `SHA-256`
    RS256,

    /// `RSASSA-PKCS1-v1_5` using `SHA-384`
    RS384,

    /// `RSASSA-PKCS1-v1_5` using `SHA-512`
    RS512,

    /// `RSASSA-PSS` using `SHA-256` and MGF1 with SHA-256
    PS256,

    /// `RSASSA-PSS` using `SHA-384` and MGF1 with SHA-384
    PS384,

    /// `RSASSA-PSS` using `SHA-512` and MGF1 with SHA-512
    PS512,

    /// `ECDSA` using `P-256` curve and `SHA-256` digest
    ES256,

    /// `ECDSA` using `P-384` curve and `SHA-384` digest
    ES384,

    /// `ECDSA` using `P-521` curve and `SHA-512` digest
    ES512,

    /// No digital signature or MAC performed
    None,
}

const HS256: AlgorithmDescriptor = hmac("HS256", "HmacSHA256", Digest::Sha256);
const HS384: AlgorithmDescriptor = hmac("HS384", "HmacSHA384", Digest::Sha384);
const HS512: AlgorithmDescriptor = hmac("HS512", "HmacSHA512", Digest::Sha512);
const RS256: AlgorithmDescriptor = signature(
    "RS256",
    "SHA256withRSA",
    Digest::Sha256,
    AlgorithmFamily::Rsa,
);
const RS384: AlgorithmDescriptor = signature(
    "RS384",
    "SHA384withRSA",
    Digest::Sha384,
    AlgorithmFamily::Rsa,
);
const RS512: AlgorithmDescriptor = signature(
    "RS512",
    "SHA512withRSA",
    Digest::Sha512,
    AlgorithmFamily::Rsa,
);
const PS256: AlgorithmDescriptor = signature(
    "PS256",
    "SHA256withRSAandMGF1",
    Digest::Sha256,
    AlgorithmFamily::RsaPss,
);
const PS384: AlgorithmDescriptor = signature(
    "PS384",
    "SHA384withRSAandMGF1",
    Digest::Sha384,
    AlgorithmFamily::RsaPss,
);
const PS512: AlgorithmDescriptor = signature(
    "PS512",
    "SHA512withRSAandMGF1",
    Digest::Sha512,
    AlgorithmFamily::RsaPss,
);
const ES256: AlgorithmDescriptor = signature(
    "ES256",
    "SHA256withECDSA",
    Digest::Sha256,
    AlgorithmFamily::Ecdsa,
);
const ES384: AlgorithmDescriptor = signature(
    "ES384",
    "SHA384withECDSA",
    Digest::Sha384,
    AlgorithmFamily::Ecdsa,
);
const ES512: AlgorithmDescriptor = signature(
    "ES512",
    "SHA512withECDSA",
    Digest::Sha512,
    AlgorithmFamily::Ecdsa,
);
const NONE: AlgorithmDescriptor = AlgorithmDescriptor {
    name: "none",
    transformation: "none",
    digest: None,
    family: AlgorithmFamily::None,
};

const fn hmac(
    name: &'static str,
    transformation: &'static str,
    digest: Digest,
) -> AlgorithmDescriptor {
    signature(name, transformation, digest, AlgorithmFamily::Hmac)
}

const fn signature(
    name: &'static str,
    transformation: &'static str,
    digest: Digest,
    family: AlgorithmFamily,
) -> AlgorithmDescriptor {
    AlgorithmDescriptor {
        name,
        transformation,
        digest: Some(digest),
        family,
    }
}

impl Algorithm {
    /// Every registered JWS algorithm
    pub const ALL: [Self; 13] = [
        Self::HS256,
        Self::HS384,
        Self::HS512,
        Self::RS256,
        Self::RS384,
        Self::RS512,
        Self::PS256,
        Self::PS384,
        Self::PS512,
        Self::ES256,
        Self::ES384,
        Self::ES512,
        Self::None,
    ];

    /// Returns the immutable parameter set for this algorithm
    #[must_use]
    pub const fn descriptor(self) -> &'static AlgorithmDescriptor {
        match self {
            Self::HS256 => &HS256,
            Self::HS384 => &HS384,
            Self::HS512 => &HS512,
            Self::RS256 => &RS256,
            Self::RS384 => &RS384,
            Self::RS512 => &RS512,
            Self::PS256 => &PS256,
            Self::PS384 => &PS384,
            Self::PS512 => &PS512,
            Self::ES256 => &ES256,
            Self::ES384 => &ES384,
            Self::ES512 => &ES512,
            Self::None => &NONE,
        }
    }

    /// Registered `alg` identifier
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.descriptor().name
    }

    /// Algorithm family
    #[must_use]
    pub const fn family(self) -> AlgorithmFamily {
        self.descriptor().family
    }
}

/// Key management family of a [`JweAlgorithm`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyManagementFamily {
    /// CEK encrypted to an RSA public key
    Rsa,
    /// CEK wrapped with a pre-shared AES key (RFC 3394)
    AesKeyWrap,
    /// Pre-shared key used directly as the CEK
    Direct,
}

/// Parameters of a [`JweAlgorithm`]
#[derive(Debug, PartialEq, Eq)]
pub struct JweAlgorithmDescriptor {
    /// Registered `alg` identifier
    pub name: &'static str,
    /// Name of the key-encryption transformation, [`None`] for direct encryption
    pub transformation: Option<&'static str>,
    /// Key management family
    pub family: KeyManagementFamily,
    /// Size of the key-encryption key in bits, where the algorithm fixes it
    pub key_size: Option<usize>,
}

/// JWE Key Management Algorithm
///
/// Ref: [RFC 7518 4.1](<https://datatracker.ietf.org/doc/html/rfc7518#section-4.1>)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JweAlgorithm {
    /// `RSAES-PKCS1-v1_5`
    ///
    /// Deprecated by the JOSE working group; retained for existing deployments.
    Rsa1_5,

    /// `RSAES OAEP` using default parameters (SHA-1, MGF1 with SHA-1)
    RsaOaep,

    /// `RSAES OAEP` using SHA-256 and MGF1 with SHA-256
    RsaOaep256,

    /// AES Key Wrap using a 128-bit key
    A128KW,

    /// AES Key Wrap using a 192-bit key
    A192KW,

    /// AES Key Wrap using a 256-bit key
    A256KW,

    /// Direct use of a shared symmetric key as the CEK
    Dir,
}

const RSA1_5: JweAlgorithmDescriptor = JweAlgorithmDescriptor {
    name: "RSA1_5",
    transformation: Some("RSA/ECB/PKCS1Padding"),
    family: KeyManagementFamily::Rsa,
    key_size: None,
};
const RSA_OAEP: JweAlgorithmDescriptor = JweAlgorithmDescriptor {
    name: "RSA-OAEP",
    transformation: Some("RSA/ECB/OAEPWithSHA-1AndMGF1Padding"),
    family: KeyManagementFamily::Rsa,
    key_size: None,
};
const RSA_OAEP_256: JweAlgorithmDescriptor = JweAlgorithmDescriptor {
    name: "RSA-OAEP-256",
    transformation: Some("RSA/ECB/OAEPWithSHA-256AndMGF1Padding"),
    family: KeyManagementFamily::Rsa,
    key_size: None,
};
const A128KW: JweAlgorithmDescriptor = aes_kw("A128KW", 128);
const A192KW: JweAlgorithmDescriptor = aes_kw("A192KW", 192);
const A256KW: JweAlgorithmDescriptor = aes_kw("A256KW", 256);
const DIR: JweAlgorithmDescriptor = JweAlgorithmDescriptor {
    name: "dir",
    transformation: None,
    family: KeyManagementFamily::Direct,
    key_size: None,
};

const fn aes_kw(name: &'static str, key_size: usize) -> JweAlgorithmDescriptor {
    JweAlgorithmDescriptor {
        name,
        transformation: Some("AESWrap"),
        family: KeyManagementFamily::AesKeyWrap,
        key_size: Some(key_size),
    }
}

impl JweAlgorithm {
    /// Every registered JWE key management algorithm
    pub const ALL: [Self; 7] = [
        Self::Rsa1_5,
        Self::RsaOaep,
        Self::RsaOaep256,
        Self::A128KW,
        Self::A192KW,
        Self::A256KW,
        Self::Dir,
    ];

    /// Returns the immutable parameter set for this algorithm
    #[must_use]
    pub const fn descriptor(self) -> &'static JweAlgorithmDescriptor {
        match self {
            Self::Rsa1_5 => &RSA1_5,
            Self::RsaOaep => &RSA_OAEP,
            Self::RsaOaep256 => &RSA_OAEP_256,
            Self::A128KW => &A128KW,
            Self::A192KW => &A192KW,
            Self::A256KW => &A256KW,
            Self::Dir => &DIR,
        }
    }

    /// Registered `alg` identifier
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.descriptor().name
    }

    /// Key management family
    #[must_use]
    pub const fn family(self) -> KeyManagementFamily {
        self.descriptor().family
    }
}

/// Parameters of an [`EncryptionMethod`]
#[derive(Debug, PartialEq, Eq)]
pub struct EncryptionMethodDescriptor {
    /// Registered `enc` identifier
    pub name: &'static str,
    /// Cipher transformation
    pub transformation: &'static str,
    /// MAC algorithm for composite CBC-HMAC methods, [`None`] for AEAD ciphers
    pub mac: Option<Algorithm>,
    /// Octets of the CEK used as the MAC key; also the authentication tag length
    /// for composite methods. Zero for AEAD ciphers.
    pub key_offset: usize,
    /// Total CEK size in bits
    pub key_size: usize,
    /// Initialisation vector size in octets
    pub iv_len: usize,
    /// Authentication tag size in octets
    pub tag_len: usize,
}

impl EncryptionMethodDescriptor {
    /// Total CEK size in octets
    #[must_use]
    pub const fn key_len(&self) -> usize {
        self.key_size / 8
    }
}

/// JWE Content Encryption Method
///
/// Ref: [RFC 7518 5.1](<https://datatracker.ietf.org/doc/html/rfc7518#section-5.1>)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncryptionMethod {
    /// `AES_128_CBC_HMAC_SHA_256` authenticated encryption
    A128CbcHs256,

    /// `AES_192_CBC_HMAC_SHA_384` authenticated encryption
    A192CbcHs384,

    /// `AES_256_CBC_HMAC_SHA_512` authenticated encryption
    A256CbcHs512,

    /// AES GCM using a 128-bit key
    A128Gcm,

    /// AES GCM using a 192-bit key
    A192Gcm,

    /// AES GCM using a 256-bit key
    A256Gcm,
}

const CBC_TRANSFORMATION: &str = "AES/CBC/PKCS5Padding";
const GCM_TRANSFORMATION: &str = "AES/GCM/NoPadding";

const A128CBC_HS256: EncryptionMethodDescriptor =
    cbc_hmac("A128CBC-HS256", Algorithm::HS256, 16);
const A192CBC_HS384: EncryptionMethodDescriptor =
    cbc_hmac("A192CBC-HS384", Algorithm::HS384, 24);
const A256CBC_HS512: EncryptionMethodDescriptor =
    cbc_hmac("A256CBC-HS512", Algorithm::HS512, 32);
const A128GCM: EncryptionMethodDescriptor = gcm("A128GCM", 128);
const A192GCM: EncryptionMethodDescriptor = gcm("A192GCM", 192);
const A256GCM: EncryptionMethodDescriptor = gcm("A256GCM", 256);

const fn cbc_hmac(
    name: &'static str,
    mac: Algorithm,
    key_offset: usize,
) -> EncryptionMethodDescriptor {
    EncryptionMethodDescriptor {
        name,
        transformation: CBC_TRANSFORMATION,
        mac: Some(mac),
        key_offset,
        key_size: key_offset * 16,
        iv_len: 16,
        tag_len: key_offset,
    }
}

const fn gcm(name: &'static str, key_size: usize) -> EncryptionMethodDescriptor {
    EncryptionMethodDescriptor {
        name,
        transformation: GCM_TRANSFORMATION,
        mac: None,
        key_offset: 0,
        key_size,
        iv_len: 12,
        tag_len: 16,
    }
}

impl EncryptionMethod {
    /// Every registered content encryption method
    pub const ALL: [Self; 6] = [
        Self::A128CbcHs256,
        Self::A192CbcHs384,
        Self::A256CbcHs512,
        Self::A128Gcm,
        Self::A192Gcm,
        Self::A256Gcm,
    ];

    /// Returns the immutable parameter set for this method
    #[must_use]
    pub const fn descriptor(self) -> &'static EncryptionMethodDescriptor {
        match self {
            Self::A128CbcHs256 => &A128CBC_HS256,
            Self::A192CbcHs384 => &A192CBC_HS384,
            Self::A256CbcHs512 => &A256CBC_HS512,
            Self::A128Gcm => &A128GCM,
            Self::A192Gcm => &A192GCM,
            Self::A256Gcm => &A256GCM,
        }
    }

    /// Registered `enc` identifier
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.descriptor().name
    }

    /// Whether the method is a composite AES-CBC + HMAC construction
    #[must_use]
    pub const fn is_cbc_hmac(self) -> bool {
        self.descriptor().mac.is_some()
    }
}

/// JWE `zip` (Compression Algorithm)
///
/// Ref: [RFC 7516 4.1.3](<https://datatracker.ietf.org/doc/html/rfc7516#section-4.1.3>)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionAlgorithm {
    /// Raw DEFLATE (RFC 1951)
    Deflate,
}

impl CompressionAlgorithm {
    /// Registered `zip` identifier
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Deflate => "DEF",
        }
    }
}

/// Compares identifiers ignoring ASCII case and treating `-` and `_` alike,
/// so legacy spellings such as `A128CBC_HS256` resolve.
fn identifier_eq(registered: &str, candidate: &str) -> bool {
    registered.len() == candidate.len()
        && registered
            .bytes()
            .zip(candidate.bytes())
            .all(|(r, c)| normalize(r) == normalize(c))
}

const fn normalize(b: u8) -> u8 {
    match b {
        b'_' => b'-',
        _ => b.to_ascii_uppercase(),
    }
}

impl FromStr for Algorithm {
    type Err = JoseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|alg| alg.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| JoseError::UnknownAlgorithm(s.to_owned()))
    }
}

impl FromStr for JweAlgorithm {
    type Err = JoseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|alg| identifier_eq(alg.name(), s))
            .ok_or_else(|| JoseError::UnknownAlgorithm(s.to_owned()))
    }
}

impl FromStr for EncryptionMethod {
    type Err = JoseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|enc| identifier_eq(enc.name(), s))
            .ok_or_else(|| JoseError::UnknownAlgorithm(s.to_owned()))
    }
}

impl FromStr for CompressionAlgorithm {
    type Err = JoseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("DEF") {
            Ok(Self::Deflate)
        } else {
            Err(JoseError::UnknownAlgorithm(s.to_owned()))
        }
    }
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Display for JweAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Display for EncryptionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Display for CompressionAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
