use tracing::debug;

use crate::{
    claims::ClaimsSet,
    error::JoseError,
    header::Header,
    json::ParserConfig,
    jwt::SignedJwt,
    validation::{
        KeyProvider,
        validator::{
            AudienceValidator,
            ExpirationValidator,
            IssuedAtValidator,
            IssuerValidator,
            Leeway,
            NotBeforeValidator,
            SubjectValidator,
            TokenValidator,
            TypeValidator,
        },
    },
};

type BoxedValidator = Box<dyn TokenValidator + Send + Sync>;

// time-based checks are bound to the leeway only when the pipeline is built
enum Step {
    Expiration,
    NotBefore,
    IssuedAt,
    Layer(BoxedValidator),
}

/// Builder for a [`ValidationPipeline`]
pub struct ValidationPipelineBuilder<KP> {
    steps: Vec<Step>,
    key_provider: KP,
    leeway: Leeway,
    config: ParserConfig,
}
impl<KP> ValidationPipelineBuilder<KP>
where
    KP: KeyProvider + Send + Sync + 'static,
{
    pub(crate) fn new(key_provider: KP) -> Self {
        Self {
            steps: Vec::new(),
            key_provider,
            leeway: Leeway::default(),
            config: ParserConfig::default(),
        }
    }

    /// Parser limits applied when reconstructing tokens
    #[must_use]
    pub const fn with_parser_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// Clock skew, in seconds, tolerated by the `exp`, `nbf` and `iat` validators
    #[must_use]
    pub fn with_leeway(mut self, seconds: u32) -> Self {
        self.leeway = Leeway(i64::from(seconds));
        self
    }

    /// Rejects JWTs where the `iss` field does not match the given `iss` value.
    #[must_use]
    pub fn with_issuer_validator(self, iss: impl Into<String>) -> Self {
        self.with(IssuerValidator::new(iss.into()))
    }

    /// Rejects JWTs that do not contain the given `aud` value in their `aud` list.
    #[must_use]
    pub fn with_audience_validator(self, aud: impl Into<String>) -> Self {
        self.with(AudienceValidator::new(aud.into()))
    }

    /// Rejects JWTs with an `nbf` time after the current time plus leeway.
    #[must_use]
    pub fn with_not_before_validator(mut self) -> Self {
        self.steps.push(Step::NotBefore);
        self
    }

    /// Rejects JWTs with an `exp` time at or before the current time minus leeway.
    #[must_use]
    pub fn with_expiration_validator(mut self) -> Self {
        self.steps.push(Step::Expiration);
        self
    }

    /// Rejects JWTs with an `iat` time after the current time plus leeway.
    #[must_use]
    pub fn with_issued_at_validator(mut self) -> Self {
        self.steps.push(Step::IssuedAt);
        self
    }

    /// Rejects JWTs with a `typ` header not in the `accepted_types` list
    #[must_use]
    pub fn with_type_validator(
        self,
        accepted_types: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.with(TypeValidator::new(accepted_types))
    }

    /// Rejects JWTs with a `sub` not in the `accepted_subjects` list
    #[must_use]
    pub fn with_subject_validator(
        self,
        accepted_subjects: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.with(SubjectValidator::new(accepted_subjects))
    }

    /// Adds a custom validator to the validation pipeline.
    /// This method may be chained to add multiple custom validators.
    #[must_use]
    pub fn with(mut self, validator: impl TokenValidator + Send + Sync + 'static) -> Self {
        self.steps.push(Step::Layer(Box::new(validator)));
        self
    }

    /// Finalizes the validation pipeline construction.
    pub fn build(self) -> ValidationPipeline<KP> {
        let leeway = self.leeway;
        let validators = self
            .steps
            .into_iter()
            .map(|step| -> BoxedValidator {
                match step {
                    Step::Expiration => Box::new(ExpirationValidator::new(leeway)),
                    Step::NotBefore => Box::new(NotBeforeValidator::new(leeway)),
                    Step::IssuedAt => Box::new(IssuedAtValidator::new(leeway)),
                    Step::Layer(validator) => validator,
                }
            })
            .collect();
        ValidationPipeline {
            validators,
            key_provider: self.key_provider,
            config: self.config,
        }
    }
}

/// Validation pipeline that, once built, can reconstruct, verify and validate
/// compact-serialized JWS tokens
pub struct ValidationPipeline<KP> {
    validators: Vec<BoxedValidator>,
    key_provider: KP,
    config: ParserConfig,
}

impl<KP> ValidationPipeline<KP>
where
    KP: KeyProvider + Send + Sync + 'static,
{
    /// Returns a new [`ValidationPipelineBuilder`].
    pub fn builder(key_provider: KP) -> ValidationPipelineBuilder<KP> {
        ValidationPipelineBuilder::new(key_provider)
    }

    /// Verifies a signed JWT using the pipeline's key provider and validators.
    ///
    /// # Errors
    ///
    /// - [`JoseError::MalformedToken`], [`JoseError::UnknownAlgorithm`] or
    ///   [`JoseError::TypeMismatch`] when the token cannot be reconstructed
    ///   (see [`Jwt::reconstruct`](crate::jwt::Jwt::reconstruct))
    /// - [`JoseError::UnsupportedOperation`] for an unsecured token
    /// - [`JoseError::KeyNotFound`] when the [`KeyProvider`] cannot resolve a key
    /// - [`JoseError::WrongAlgorithm`] when the header `alg` field does not match
    ///   the key's algorithm
    /// - [`JoseError::DecryptionFailed`] when the signature is invalid
    /// - [`JoseError::InvalidClaims`], or any other error raised by a
    ///   [`TokenValidator`] in the pipeline
    pub fn verify(&self, token: &str) -> Result<(Header, ClaimsSet), JoseError> {
        let jwt = SignedJwt::reconstruct(token, &self.config)?;

        // try to get a matching key from the resolver
        let key = self
            .key_provider
            .resolve_key(jwt.header(), jwt.unverified_claims())?;

        // alg check and signature
        jwt.verify(key)?;

        let (header, claims) = jwt.into_parts();
        self.validate(&header, &claims)?;
        Ok((header, claims))
    }

    /// Runs the validators alone, e.g. on the claims of a decrypted JWE
    ///
    /// # Errors
    ///
    /// The first error raised by a [`TokenValidator`].
    pub fn validate(&self, header: &Header, claims: &ClaimsSet) -> Result<(), JoseError> {
        for v in &self.validators {
            v.validate(header, claims)
                .inspect_err(|e| debug!(reason = %e, "claims rejected"))?;
        }
        Ok(())
    }
}
