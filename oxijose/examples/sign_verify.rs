#![allow(clippy::unwrap_used)]
use openssl::{
    ec::{
        EcGroup,
        EcKey,
    },
    nid::Nid,
    pkey::PKey,
};
use oxijose::{
    Algorithm,
    claims::{
        ClaimsSet,
        IntDate,
        Iss,
    },
    header::Header,
    jwt::SignedJwt,
    validation::{
        StaticKeyProvider,
        ValidationPipeline,
    },
};

fn main() {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    let key = PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap();

    let mut header = Header::jws(Algorithm::ES256);
    header.set_typ("JWT");
    let mut claims = ClaimsSet::new();
    claims
        .set_iss("oxijose.example.org")
        .unwrap()
        .set_exp(IntDate::from_secs(IntDate::now().secs() + 300));

    let jwt = SignedJwt::sign(header.clone(), claims.clone(), &key).unwrap();
    println!("JWT: {jwt}", jwt = jwt.build());

    let validator = ValidationPipeline::builder(StaticKeyProvider::from(key))
        .with_issuer_validator("oxijose.example.org")
        .with_expiration_validator()
        .with_type_validator(["JWT"])
        .build();

    let (decoded_header, decoded_claims) = validator.verify(jwt.build()).unwrap();
    assert_eq!(decoded_header, header);
    assert_eq!(decoded_claims, claims);
    assert_eq!(decoded_claims.iss(), Some("oxijose.example.org"));

    println!("JWT validated successfully");
}
