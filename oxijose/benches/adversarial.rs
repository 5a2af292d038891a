#![allow(clippy::unwrap_used)]
use std::{
    fmt::Display,
    hint::black_box,
};

use criterion::{
    Criterion,
    Throughput,
    criterion_group,
    criterion_main,
};
use jsonwebtoken::{
    DecodingKey,
    Validation,
};
use openssl::{
    pkey::PKey,
    rsa::Rsa,
};
use oxijose::{
    Algorithm,
    CompressionAlgorithm,
    EncryptionMethod,
    JweAlgorithm,
    ParserConfig,
    claims::{
        ClaimsSet,
        IntDate,
    },
    header::Header,
    jwe::JweKey,
    jws::VerificationKey,
    jwt::{
        EncryptedJwt,
        SignedJwt,
    },
    validation::{
        StaticKeyProvider,
        ValidationPipeline,
    },
};
use serde::{
    Deserialize,
    Serialize,
};

// NOTE: [`Clone`] is NOT required by [`oxijose`] but is required by [`jsonwebtoken`]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    aud: Vec<String>,
    exp: i64,
    iat: i64,
    sub: String,
}

fn claims() -> ClaimsSet {
    let mut claims = ClaimsSet::new();
    claims
        .set_sub("test")
        .unwrap()
        .add_audience("oxijose-test")
        .unwrap()
        .set_exp(IntDate::from_secs(1_865_013_100))
        .set_iat(IntDate::from_secs(0));
    claims
}

fn oxi_val<T>(key: T, config: ParserConfig) -> ValidationPipeline<StaticKeyProvider<T>>
where
    T: VerificationKey + Send + Sync + 'static,
{
    ValidationPipeline::builder(key.into())
        .with_parser_config(config)
        .with_expiration_validator()
        .with_audience_validator("oxijose-test")
        .with_type_validator(["JWT", "JOSE"])
        .build()
}

fn jwst_val(alg: jsonwebtoken::Algorithm) -> Validation {
    let mut validation = jsonwebtoken::Validation::new(alg);
    validation.validate_exp = true;
    validation.set_required_spec_claims(&["exp", "aud", "sub", "iat"]);
    validation.set_audience(&["oxijose-test"]);
    validation
}

#[derive(Debug, Clone, Copy)]
enum Size {
    Jwt8K,
    Jwt16K,
    /// Envoy/Istio proxy default max header size is `61_440`
    Jwt60K,
    /// Cloudflare proxy max header size is `131_072`
    Jwt128K,
    Jwt4M,
}
impl Size {
    const fn target(self) -> usize {
        match self {
            Self::Jwt8K => 8_000,
            Self::Jwt16K => 16_000,
            Self::Jwt60K => 61_000,
            Self::Jwt128K => 130_000,
            Self::Jwt4M => 4_000_000,
        }
    }
}
impl Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Jwt8K => write!(f, "8K"),
            Self::Jwt16K => write!(f, "16K"),
            Self::Jwt60K => write!(f, "60K"),
            Self::Jwt128K => write!(f, "128K"),
            Self::Jwt4M => write!(f, "4M"),
        }
    }
}

/// Header stuffed with short unique members until the token reaches `sz`
fn mkadv(sz: Size, signer: &PKey<openssl::pkey::Private>) -> String {
    let mut header = Header::jws(Algorithm::RS256);
    header.set_typ("JWT");
    let mut i = 0u64;
    loop {
        let jwt = SignedJwt::sign(header.clone(), claims(), signer).unwrap();
        if jwt.build().len() >= sz.target() {
            return jwt.build().to_owned();
        }
        // each member adds roughly 12 encoded bytes; grow in large steps
        let missing = (sz.target() - jwt.build().len()) / 12 + 1;
        for _ in 0..missing {
            header.set(format!("{i:x}"), "").unwrap();
            i += 1;
        }
    }
}

/// Deflate bomb: a small JWE whose payload inflates to `inflated` bytes
fn mkbomb(inflated: usize, kek: &[u8]) -> String {
    let mut header = Header::jwe(JweAlgorithm::A256KW, EncryptionMethod::A256Gcm);
    header.set_zip(CompressionAlgorithm::Deflate);
    let mut claims = claims();
    claims.set("pad", "0".repeat(inflated)).unwrap();
    EncryptedJwt::encrypt(header, &claims, JweKey::from(kek))
        .unwrap()
        .build()
        .to_owned()
}

fn adversarial(c: &mut Criterion) {
    // NOTE: the verifying key here doesn't match the signer, that's intentional:
    // this simulates a bad actor sending oversized JWTs with bad signatures as a
    // means of DoS amplification.
    let signer = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
    let pubkey = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();

    for sz in [
        Size::Jwt8K,
        Size::Jwt16K,
        Size::Jwt60K,
        Size::Jwt128K,
        Size::Jwt4M,
    ] {
        let mut group = c.benchmark_group(format!("Adversarial JWT ({sz})"));
        let jwt = mkadv(sz, &signer);
        group.throughput(Throughput::Bytes(jwt.len() as u64));

        let validator = oxi_val(
            pubkey.clone(),
            ParserConfig::default().with_max_token_size(16 * 1024),
        );
        group.bench_function("oxijose_with_size_limit", |b| {
            b.iter(|| black_box(validator.verify(black_box(&jwt)).unwrap_err()));
        });

        let validator = oxi_val(pubkey.clone(), ParserConfig::default());
        group.bench_function("oxijose", |b| {
            b.iter(|| black_box(validator.verify(black_box(&jwt)).unwrap_err()));
        });

        let jkey = DecodingKey::from_rsa_der(pubkey.public_key_to_der().unwrap().as_slice());
        let validation = jwst_val(jsonwebtoken::Algorithm::RS256);
        group.bench_function("jsonwebtoken", |b| {
            b.iter(|| {
                black_box(
                    jsonwebtoken::decode::<Claims>(
                        black_box(&jwt),
                        black_box(&jkey),
                        black_box(&validation),
                    )
                    .unwrap_err(),
                );
            });
        });
        group.finish();
    }

    let kek = [0x11; 32];
    let mut group = c.benchmark_group("Deflate bomb (64M inflated)");
    let bomb = mkbomb(64 * 1024 * 1024, &kek);
    group.throughput(Throughput::Bytes(bomb.len() as u64));
    let parsed = EncryptedJwt::reconstruct(&bomb, &ParserConfig::default()).unwrap();
    group.bench_function("oxijose_default_limit", |b| {
        b.iter(|| black_box(parsed.decrypt(JweKey::from(&kek)).unwrap_err()));
    });
    group.finish();
}

criterion_group!(benches, adversarial);
criterion_main!(benches);
