#![allow(clippy::unwrap_used)]
use openssl::{
    pkey::PKey,
    rsa::Rsa,
};
use oxijose::{
    Algorithm,
    EncryptionMethod,
    JweAlgorithm,
    ParserConfig,
    claims::{
        ClaimsSet,
        Sub,
    },
    crypto::openssl::HmacKey,
    header::Header,
    jwe::JweKey,
    jwt::{
        Jwt,
        SignedJwt,
        SignedThenEncryptedJwt,
    },
    validation::{
        StaticKeyProvider,
        ValidationPipeline,
    },
};

fn main() {
    let signing_key = HmacKey::hs256(b"a shared secret of thirty-two by").unwrap();
    let recipient = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();

    let mut claims = ClaimsSet::new();
    claims.set_sub("alice").unwrap();
    let signed = SignedJwt::sign(Header::jws(Algorithm::HS256), claims, &signing_key).unwrap();
    let nested = SignedThenEncryptedJwt::encrypt(
        &signed,
        Header::jwe(JweAlgorithm::RsaOaep, EncryptionMethod::A128CbcHs256),
        JweKey::from(&recipient),
    )
    .unwrap();
    println!("nested JWT: {jwt}", jwt = nested.build());

    let Jwt::SignedThenEncrypted(received) =
        Jwt::reconstruct(nested.build(), &ParserConfig::default()).unwrap()
    else {
        panic!("expected a signed-then-encrypted token");
    };

    // the decrypted inner JWS goes through the usual validation pipeline
    let inner = received.decrypt(JweKey::from(&recipient)).unwrap();
    let validator = ValidationPipeline::builder(StaticKeyProvider::from(signing_key))
        .with_subject_validator(["alice"])
        .build();
    let (_, claims) = validator.verify(inner.build()).unwrap();
    assert_eq!(claims.sub(), Some("alice"));

    println!("nested JWT validated successfully");
}
