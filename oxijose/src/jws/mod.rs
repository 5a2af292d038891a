//! JWS signing and verification seams
//!
//! [`Signer`] and [`VerificationKey`] are implemented by the crypto backend
//! (see [`crate::crypto::openssl`]) and may be implemented on custom key types.

use crate::{
    Algorithm,
    compact,
    error::JoseError,
};

/// JWS `Signer`, usually implemented on a cryptographic key representation or a wrapper
/// around a cryptographic key.
pub trait Signer {
    /// This method is called prior to attempting signing to confirm the `Signer` supports
    /// the `algorithm` specified by the JWS header.
    ///
    /// # Errors
    ///
    /// This method MUST return:
    /// - [`JoseError::WrongAlgorithm`] when the `algorithm` does not match
    ///   the `Signer` algorithm(s).
    /// - [`JoseError::UnsupportedOperation`] if the `algorithm` is not supported
    ///   by the crypto backend or key family.
    fn check_alg(&self, algorithm: Algorithm) -> Result<(), JoseError>;

    /// This method is provided with the base-64 encoded, dot-delimited header and
    /// payload. It MUST calculate a signature with the key's algorithm and append it
    /// as the final dot-delimited section. It MAY make use of the
    /// [`Signer::append_sig`] default implementation to concatenate the signature.
    ///
    /// # Errors
    ///
    /// - [`JoseError::Crypto`] when the backend fails to produce a signature
    /// - [`JoseError::WrongAlgorithm`] or [`JoseError::UnsupportedOperation`] under the
    ///   same conditions as [`Signer::check_alg`], which is called first in normal usage
    fn sign_jwt(&self, algorithm: Algorithm, jwt: &mut String) -> Result<(), JoseError>;

    /// This method MUST return the exact size, in bytes, of the signature produced by
    /// the `Signer`
    fn siglen(&self) -> usize;

    /// Convenience method to base64-encode and append `sig` as the final dot-delimited
    /// section of the `jwt` to be called from [`Signer::sign_jwt`].
    fn append_sig(&self, sig: impl AsRef<[u8]>, jwt: &mut String) {
        jwt.push('.');
        compact::encode_append(sig, jwt);
    }
}

/// A [`VerificationKey`] used to validate JWS signatures.
pub trait VerificationKey {
    /// Return the key's [`Algorithm`] or [`None`] if algorithm is undeterminable or unsupported
    fn alg(&self) -> Option<Algorithm>;

    /// Verify a JWS signature.
    ///
    /// # Parameters
    ///
    /// - `message` is the dot-delimited base-64-url encoded header and payload,
    ///   exactly as transmitted, but not the signature.
    ///   Ref: <https://datatracker.ietf.org/doc/html/rfc7515#section-7.1>
    /// - `signature` is the decoded signature segment.
    ///
    /// # Errors
    ///
    /// - [`JoseError::DecryptionFailed`] when the signature is not valid or cannot be
    ///   checked. No detail about the cause is given.
    /// - [`JoseError::UnsupportedOperation`] when the key's algorithm cannot be
    ///   determined.
    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), JoseError>;
}

impl<T: Signer + ?Sized> Signer for &T {
    fn check_alg(&self, algorithm: Algorithm) -> Result<(), JoseError> {
        (**self).check_alg(algorithm)
    }
    fn sign_jwt(&self, algorithm: Algorithm, jwt: &mut String) -> Result<(), JoseError> {
        (**self).sign_jwt(algorithm, jwt)
    }
    fn siglen(&self) -> usize {
        (**self).siglen()
    }
}

impl<T: VerificationKey + ?Sized> VerificationKey for &T {
    fn alg(&self) -> Option<Algorithm> {
        (**self).alg()
    }
    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), JoseError> {
        (**self).verify(message, signature)
    }
}

/// Encodes and signs `header` and `payload`, both already serialized
///
/// Returns the compact token and the length of its signing input.
pub(crate) fn sign_compact<S>(
    key: &S,
    algorithm: Algorithm,
    header: &[u8],
    payload: &[u8],
) -> Result<(String, usize), JoseError>
where
    S: Signer + ?Sized,
{
    key.check_alg(algorithm)?;

    let mut jwt = String::with_capacity(
        compact::encoded_length(header.len())
            + 1
            + compact::encoded_length(payload.len())
            + 1
            + compact::encoded_length(key.siglen()),
    );

    #[cfg(debug_assertions)]
    let initial_cap = jwt.capacity();

    compact::encode_append(header, &mut jwt);
    jwt.push('.');
    compact::encode_append(payload, &mut jwt);
    let signing_input_len = jwt.len();
    key.sign_jwt(algorithm, &mut jwt)?;

    #[cfg(debug_assertions)]
    debug_assert_eq!(initial_cap, jwt.capacity());

    Ok((jwt, signing_input_len))
}
