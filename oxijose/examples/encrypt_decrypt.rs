#![allow(clippy::unwrap_used)]
use openssl::{
    pkey::PKey,
    rsa::Rsa,
};
use oxijose::{
    CompressionAlgorithm,
    EncryptionMethod,
    JweAlgorithm,
    ParserConfig,
    claims::ClaimsSet,
    header::Header,
    jwe::JweKey,
    jwt::EncryptedJwt,
};

fn main() {
    // the recipient publishes its public key and keeps the private half
    let recipient = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
    let public = PKey::public_key_from_pem(&recipient.public_key_to_pem().unwrap()).unwrap();

    let mut header = Header::jwe(JweAlgorithm::RsaOaep256, EncryptionMethod::A256Gcm);
    header.set_zip(CompressionAlgorithm::Deflate);
    let mut claims = ClaimsSet::new();
    claims.set("msg", "hi").unwrap();

    let jwe = EncryptedJwt::encrypt(header, &claims, JweKey::from(&public)).unwrap();
    println!("JWE: {jwe}", jwe = jwe.build());

    let received = EncryptedJwt::reconstruct(jwe.build(), &ParserConfig::default()).unwrap();
    let decrypted = received.decrypt(JweKey::from(&recipient)).unwrap();
    assert_eq!(decrypted, claims);

    // a pre-shared 256-bit CEK with `dir`
    let cek = [0x5a; 32];
    let jwe = EncryptedJwt::encrypt(
        Header::jwe(JweAlgorithm::Dir, EncryptionMethod::A256Gcm),
        &claims,
        JweKey::from(&cek),
    )
    .unwrap();
    let received = EncryptedJwt::reconstruct(jwe.build(), &ParserConfig::default()).unwrap();
    assert!(received.decrypt(JweKey::from(&[0xa5; 32])).is_err());
    assert_eq!(received.decrypt(JweKey::from(&cek)).unwrap(), claims);

    println!("JWE decrypted successfully");
}
