use tracing::debug;

use crate::{
    Algorithm,
    claims::ClaimsSet,
    compact::{
        self,
        Segments,
    },
    error::{
        JoseError,
        Malformed,
    },
    header::{
        Alg,
        Header,
    },
    json::ParserConfig,
    jwt::{
        default_typ,
        expect_segments,
        split_with_header,
    },
};

/// Unsecured JWT (`alg: none`)
///
/// Built in the two-segment form. Reconstruction also accepts the RFC 7519
/// three-segment form, provided the signature segment is empty.
#[derive(Debug, Clone)]
pub struct PlaintextJwt {
    header: Header,
    claims: ClaimsSet,
    compact: String,
}

impl PlaintextJwt {
    /// Builds an unsecured token; `alg` is forced to `none` and `typ` defaults to `JWT`
    ///
    /// # Errors
    ///
    /// [`JoseError::MalformedToken`] if the header or claims fail to serialize.
    pub fn new(mut header: Header, claims: ClaimsSet) -> Result<Self, JoseError> {
        header.set_alg(Algorithm::None);
        default_typ(&mut header);
        let compact = compact::join(&[&header.to_json()?, &claims.to_json()?]);
        debug!(kind = "plaintext", "built token");
        Ok(Self {
            header,
            claims,
            compact,
        })
    }

    /// Reconstructs an unsecured token
    ///
    /// # Errors
    ///
    /// - [`JoseError::WrongAlgorithm`] when the header `alg` is not `none`
    /// - [`JoseError::MalformedToken`] for a non-empty signature segment, or as
    ///   [`Jwt::reconstruct`](crate::jwt::Jwt::reconstruct)
    pub fn reconstruct(token: &str, config: &ParserConfig) -> Result<Self, JoseError> {
        let (segments, header) = split_with_header(token, config)?;
        Self::from_parts(token, &segments, header, config)
    }

    pub(crate) fn from_parts(
        token: &str,
        segments: &Segments<'_>,
        header: Header,
        config: &ParserConfig,
    ) -> Result<Self, JoseError> {
        expect_segments(segments, &[2, 3])?;
        match header.alg() {
            Some(Algorithm::None) => {}
            Some(_) => return Err(JoseError::WrongAlgorithm),
            None if header.contains("alg") => return Err(JoseError::WrongAlgorithm),
            None => return Err(Malformed::MissingParameter("alg").into()),
        }
        if segments.len() == 3 && !segments.get(2).is_empty() {
            return Err(Malformed::UnsecuredSignature.into());
        }
        let claims = ClaimsSet::from_json(&compact::decode(segments.get(1))?, config)?;
        Ok(Self {
            header,
            claims,
            compact: token.to_owned(),
        })
    }

    /// Header
    #[must_use]
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Claims; nothing protects them
    #[must_use]
    pub const fn claims(&self) -> &ClaimsSet {
        &self.claims
    }

    /// Compact serialization
    #[must_use]
    pub fn build(&self) -> &str {
        &self.compact
    }
}
