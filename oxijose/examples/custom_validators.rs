#![allow(clippy::unwrap_used)]
use std::collections::HashSet;

use oxijose::{
    Algorithm,
    claims::ClaimsSet,
    crypto::openssl::HmacKey,
    error::{
        ClaimViolation,
        JoseError,
    },
    header::Header,
    jwt::SignedJwt,
    validation::{
        TokenValidator,
        ValidationPipeline,
        keystore::LocalKeystore,
    },
};

// ANCHOR: impl
/// Requires every listed entry in the space-delimited `scope` claim
pub struct ScopeValidator {
    required: Vec<String>,
}
impl ScopeValidator {
    fn requiring(scopes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            required: scopes.into_iter().map(Into::into).collect(),
        }
    }
}
impl TokenValidator for ScopeValidator {
    fn validate(&self, _: &Header, claims: &ClaimsSet) -> Result<(), JoseError> {
        let granted: HashSet<&str> = claims
            .get("scope")
            .and_then(|scope| scope.as_str())
            .map(|scope| scope.split(' ').collect())
            .unwrap_or_default();
        if self.required.iter().all(|s| granted.contains(s.as_str())) {
            Ok(())
        } else {
            Err(ClaimViolation::Custom("missing required scope").into())
        }
    }
}
// ANCHOR_END: impl

fn main() {
    let mut keystore = LocalKeystore::empty();
    keystore.add_key("2024-01", HmacKey::hs256(b"first secret").unwrap());
    keystore.add_key("2024-02", HmacKey::hs256(b"second secret").unwrap());

    let mut header = Header::jws(Algorithm::HS256);
    header.set_kid("2024-02");
    let mut claims = ClaimsSet::new();
    claims.set_iss("jwt.example.org").unwrap();
    claims.set("scope", "read:tokens write:tokens").unwrap();
    let jwt = SignedJwt::sign(
        header.clone(),
        claims.clone(),
        &HmacKey::hs256(b"second secret").unwrap(),
    )
    .unwrap();

    // ANCHOR: usage
    let validator = ValidationPipeline::builder(keystore)
        .with_issuer_validator("jwt.example.org")
        .with(ScopeValidator::requiring(["read:tokens"]))
        .build();
    // ANCHOR_END: usage

    let (decoded_header, decoded_claims) = validator.verify(jwt.build()).unwrap();
    assert_eq!(decoded_header, header);
    assert_eq!(decoded_claims, claims);

    println!("JWT validated successfully");
}
