// JUSTIFICATION: using `pub(crate)` makes it immediately obvious that an item
// is not exposed via the public API.
#![allow(clippy::redundant_pub_crate)]
use std::collections::HashSet;

use crate::{
    claims::{
        Aud,
        ClaimsSet,
        Exp,
        Iat,
        IntDate,
        Iss,
        Nbf,
        Sub,
    },
    error::{
        ClaimViolation,
        JoseError,
    },
    header::{
        Header,
        Typ,
    },
};

/// Trait for implementing custom token validator layers
///
/// # Example Implementation
///
/// ```rust
/// use std::collections::HashSet;
/// use oxijose::{
///     Algorithm,
///     claims::{ClaimsSet, Iss},
///     crypto::openssl::HmacKey,
///     error::{ClaimViolation, JoseError},
///     header::Header,
///     jwt::SignedJwt,
///     validation::{
///         StaticKeyProvider,
///         TokenValidator,
///         ValidationPipeline,
///     },
/// };
///
/// pub struct IssuerAllowList {
///     accepted_issuers: HashSet<String>,
/// }
/// impl IssuerAllowList {
///     pub fn new(accepted_issuers: impl IntoIterator<Item = impl Into<String>>) -> Self {
///         Self {
///             accepted_issuers: accepted_issuers.into_iter().map(Into::into).collect(),
///         }
///     }
/// }
/// impl TokenValidator for IssuerAllowList {
///     fn validate(&self, _: &Header, claims: &ClaimsSet) -> Result<(), JoseError> {
///         match claims.iss() {
///             Some(iss) if self.accepted_issuers.contains(iss) => Ok(()),
///             _ => Err(ClaimViolation::WrongIssuer.into()),
///         }
///     }
/// }
///
/// fn main() -> Result<(), JoseError> {
///     let key = HmacKey::hs256(b"secret")?;
///     let mut claims = ClaimsSet::new();
///     claims.set_iss("jwt.example.org")?;
///     let token = SignedJwt::sign(Header::jws(Algorithm::HS256), claims, &key)?;
///
///     let pipeline = ValidationPipeline::builder(StaticKeyProvider::new(key))
///         .with(IssuerAllowList::new(["oxijose.example.org", "jwt.example.org"]))
///         // additional `.with(...)` calls can be chained here
///         // all validators are ran in-order
///         .build();
///     let (_, claims) = pipeline.verify(token.build())?;
///     assert_eq!(claims.iss(), Some("jwt.example.org"));
///     Ok(())
/// }
/// ```
pub trait TokenValidator<H: ?Sized = Header, C: ?Sized = ClaimsSet> {
    /// Given the `header` and `claims` of a verified or decrypted JWT, perform
    /// some validation step.
    ///
    /// # Errors
    ///
    /// This method MUST return a [`JoseError`] if the `header` and/or `claims`
    /// do not pass the validation step, usually a [`JoseError::InvalidClaims`]
    /// (e.g. [`ClaimViolation::Expired`] if `exp` is in the past).
    fn validate(&self, header: &H, claims: &C) -> Result<(), JoseError>;
}

pub(crate) struct TypeValidator {
    accepted_types: HashSet<String>,
}
impl TypeValidator {
    // media types compare case-insensitively
    pub(crate) fn new(accepted_types: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            accepted_types: accepted_types
                .into_iter()
                .map(|typ| typ.into().to_ascii_lowercase())
                .collect(),
        }
    }
}
impl<H, C> TokenValidator<H, C> for TypeValidator
where
    H: Typ + ?Sized,
    C: ?Sized,
{
    fn validate(&self, header: &H, _: &C) -> Result<(), JoseError> {
        match header.typ() {
            Some(typ) if self.accepted_types.contains(&typ.to_ascii_lowercase()) => Ok(()),
            _ => Err(ClaimViolation::WrongType.into()),
        }
    }
}

pub(crate) struct IssuerValidator {
    expected_issuer: String,
}
impl IssuerValidator {
    pub(crate) const fn new(iss: String) -> Self {
        Self {
            expected_issuer: iss,
        }
    }
}
impl<H, C> TokenValidator<H, C> for IssuerValidator
where
    H: ?Sized,
    C: Iss + ?Sized,
{
    fn validate(&self, _: &H, claims: &C) -> Result<(), JoseError> {
        let iss = claims.iss().ok_or(ClaimViolation::MissingClaim("iss"))?;
        if self.expected_issuer == iss {
            Ok(())
        } else {
            Err(ClaimViolation::WrongIssuer.into())
        }
    }
}

pub(crate) struct AudienceValidator {
    expected_audience: String,
}
impl AudienceValidator {
    pub(crate) const fn new(aud: String) -> Self {
        Self {
            expected_audience: aud,
        }
    }
}
impl<H, C> TokenValidator<H, C> for AudienceValidator
where
    H: ?Sized,
    C: Aud + ?Sized,
{
    fn validate(&self, _: &H, claims: &C) -> Result<(), JoseError> {
        if claims.aud().any(|e| e.as_ref() == self.expected_audience) {
            Ok(())
        } else {
            Err(ClaimViolation::WrongAudience.into())
        }
    }
}

pub(crate) struct SubjectValidator {
    accepted_subjects: HashSet<String>,
}
impl SubjectValidator {
    pub(crate) fn new(accepted_subjects: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            accepted_subjects: accepted_subjects.into_iter().map(Into::into).collect(),
        }
    }
}
impl<H, C> TokenValidator<H, C> for SubjectValidator
where
    H: ?Sized,
    C: Sub + ?Sized,
{
    fn validate(&self, _: &H, claims: &C) -> Result<(), JoseError> {
        let sub = claims.sub().ok_or(ClaimViolation::MissingClaim("sub"))?;
        if self.accepted_subjects.contains(sub) {
            Ok(())
        } else {
            Err(ClaimViolation::WrongSubject.into())
        }
    }
}

/// Tolerated clock skew in seconds, shared by the time-based validators
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Leeway(pub(crate) i64);

impl Leeway {
    // current time moved forward by the leeway
    fn ahead(self) -> i64 {
        IntDate::now().secs().saturating_add(self.0)
    }

    // current time moved back by the leeway
    fn behind(self) -> i64 {
        IntDate::now().secs().saturating_sub(self.0)
    }
}

pub(crate) struct NotBeforeValidator {
    leeway: Leeway,
}
impl NotBeforeValidator {
    pub(crate) const fn new(leeway: Leeway) -> Self {
        Self { leeway }
    }
}
impl<H, C> TokenValidator<H, C> for NotBeforeValidator
where
    H: ?Sized,
    C: Nbf + ?Sized,
{
    fn validate(&self, _: &H, claims: &C) -> Result<(), JoseError> {
        let nbf = claims.nbf().ok_or(ClaimViolation::MissingClaim("nbf"))?;
        if nbf <= self.leeway.ahead() {
            Ok(())
        } else {
            Err(ClaimViolation::NotValidYet.into())
        }
    }
}

pub(crate) struct IssuedAtValidator {
    leeway: Leeway,
}
impl IssuedAtValidator {
    pub(crate) const fn new(leeway: Leeway) -> Self {
        Self { leeway }
    }
}
impl<H, C> TokenValidator<H, C> for IssuedAtValidator
where
    H: ?Sized,
    C: Iat + ?Sized,
{
    fn validate(&self, _: &H, claims: &C) -> Result<(), JoseError> {
        let iat = claims.iat().ok_or(ClaimViolation::MissingClaim("iat"))?;
        if iat <= self.leeway.ahead() {
            Ok(())
        } else {
            Err(ClaimViolation::IssuedInFuture.into())
        }
    }
}

pub(crate) struct ExpirationValidator {
    leeway: Leeway,
}
impl ExpirationValidator {
    pub(crate) const fn new(leeway: Leeway) -> Self {
        Self { leeway }
    }
}
impl<H, C> TokenValidator<H, C> for ExpirationValidator
where
    H: ?Sized,
    C: Exp + ?Sized,
{
    fn validate(&self, _: &H, claims: &C) -> Result<(), JoseError> {
        let exp = claims.exp().ok_or(ClaimViolation::MissingClaim("exp"))?;
        if exp > self.leeway.behind() {
            Ok(())
        } else {
            Err(ClaimViolation::Expired.into())
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::{
        AudienceValidator,
        ExpirationValidator,
        IssuedAtValidator,
        IssuerValidator,
        Leeway,
        NotBeforeValidator,
        SubjectValidator,
        TokenValidator,
        TypeValidator,
    };
    use crate::{
        claims::{
            ClaimsSet,
            IntDate,
        },
        error::{
            ClaimViolation,
            JoseError,
        },
        header::Header,
    };

    fn at(offset: i64) -> IntDate {
        IntDate::from_secs(IntDate::now().secs() + offset)
    }

    fn check(
        validator: &dyn TokenValidator,
        header: &Header,
        claims: &ClaimsSet,
    ) -> Result<(), JoseError> {
        validator.validate(header, claims)
    }

    #[test]
    fn expiration_with_leeway() {
        let header = Header::new();
        let mut claims = ClaimsSet::new();
        claims.set_exp(at(-30));

        let strict = ExpirationValidator::new(Leeway(0));
        assert_eq!(
            check(&strict, &header, &claims).unwrap_err(),
            JoseError::InvalidClaims(ClaimViolation::Expired)
        );
        let lenient = ExpirationValidator::new(Leeway(60));
        assert!(check(&lenient, &header, &claims).is_ok());

        assert_eq!(
            check(&strict, &header, &ClaimsSet::new()).unwrap_err(),
            JoseError::InvalidClaims(ClaimViolation::MissingClaim("exp"))
        );
    }

    #[test]
    fn not_before_and_issued_at() {
        let header = Header::new();
        let mut claims = ClaimsSet::new();
        claims.set_nbf(at(30)).set_iat(at(30));

        assert_eq!(
            check(&NotBeforeValidator::new(Leeway(0)), &header, &claims).unwrap_err(),
            JoseError::InvalidClaims(ClaimViolation::NotValidYet)
        );
        assert_eq!(
            check(&IssuedAtValidator::new(Leeway(0)), &header, &claims).unwrap_err(),
            JoseError::InvalidClaims(ClaimViolation::IssuedInFuture)
        );
        assert!(check(&NotBeforeValidator::new(Leeway(60)), &header, &claims).is_ok());
        assert!(check(&IssuedAtValidator::new(Leeway(60)), &header, &claims).is_ok());
    }

    #[test]
    fn issuer_audience_subject() {
        let header = Header::new();
        let mut claims = ClaimsSet::new();
        claims
            .set_iss("https://issuer.example.org")
            .unwrap()
            .set_sub("alice")
            .unwrap()
            .add_audience("api")
            .unwrap()
            .add_audience("web")
            .unwrap();

        assert!(
            check(
                &IssuerValidator::new("https://issuer.example.org".into()),
                &header,
                &claims
            )
            .is_ok()
        );
        assert_eq!(
            check(&IssuerValidator::new("other".into()), &header, &claims).unwrap_err(),
            JoseError::InvalidClaims(ClaimViolation::WrongIssuer)
        );
        assert!(check(&AudienceValidator::new("web".into()), &header, &claims).is_ok());
        assert_eq!(
            check(&AudienceValidator::new("cli".into()), &header, &claims).unwrap_err(),
            JoseError::InvalidClaims(ClaimViolation::WrongAudience)
        );
        assert!(check(&SubjectValidator::new(["bob", "alice"]), &header, &claims).is_ok());
        assert_eq!(
            check(&SubjectValidator::new(["bob"]), &header, &claims).unwrap_err(),
            JoseError::InvalidClaims(ClaimViolation::WrongSubject)
        );
    }

    #[test]
    fn type_is_case_insensitive() {
        let claims = ClaimsSet::new();
        let mut header = Header::new();
        header.set_typ("at+JWT");
        assert!(check(&TypeValidator::new(["AT+jwt"]), &header, &claims).is_ok());
        assert_eq!(
            check(&TypeValidator::new(["JWT"]), &header, &claims).unwrap_err(),
            JoseError::InvalidClaims(ClaimViolation::WrongType)
        );
        assert_eq!(
            check(&TypeValidator::new(["JWT"]), &Header::new(), &claims).unwrap_err(),
            JoseError::InvalidClaims(ClaimViolation::WrongType)
        );
    }
}
