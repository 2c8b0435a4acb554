//! Thin wrappers over OpenSSL's PKCS7 S/MIME operations.
//!
//! PEM material in, S/MIME wire text out. Callers decide how a failure is
//! classified; everything here surfaces the raw OpenSSL error stack.

use openssl::error::ErrorStack;
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkcs7::{Pkcs7, Pkcs7Flags};
use openssl::pkey::PKey;
use openssl::stack::Stack;
use openssl::x509::store::X509StoreBuilder;
use openssl::x509::X509;

use super::cipher::CipherSuite;

type Result<T> = std::result::Result<T, ErrorStack>;

/// Produce a detached signature over `content` and return the full S/MIME
/// structure (multipart/signed) as wire text.
pub fn sign_detached(cert_pem: &str, key_pem: &str, content: &[u8]) -> Result<String> {
    let cert = X509::from_pem(cert_pem.as_bytes())?;
    let key = PKey::private_key_from_pem(key_pem.as_bytes())?;
    let extra_certs = Stack::new()?;

    let flags = Pkcs7Flags::DETACHED | Pkcs7Flags::STREAM;
    let pkcs7 = Pkcs7::sign(&cert, &key, &extra_certs, content, flags)?;
    let smime = pkcs7.to_smime(content, flags)?;

    Ok(String::from_utf8_lossy(&smime).into_owned())
}

/// Encrypt `content` for every certificate in `cert_pems` and return the
/// enveloped S/MIME structure (application/x-pkcs7-mime) as wire text.
pub fn encrypt(cert_pems: &[&str], content: &[u8], cipher: CipherSuite) -> Result<String> {
    let mut certs = Stack::new()?;
    for pem in cert_pems {
        certs.push(X509::from_pem(pem.as_bytes())?)?;
    }

    let flags = Pkcs7Flags::STREAM;
    let pkcs7 = Pkcs7::encrypt(&certs, content, cipher.openssl(), flags)?;
    let smime = pkcs7.to_smime(content, flags)?;

    Ok(String::from_utf8_lossy(&smime).into_owned())
}

/// Decrypt an enveloped S/MIME message with the recipient's key.
///
/// Conformance-test surface; the send path never decrypts.
pub fn decrypt(smime_text: &str, key_pem: &str, cert_pem: &str) -> Result<Vec<u8>> {
    let (pkcs7, _) = Pkcs7::from_smime(smime_text.as_bytes())?;
    let key = PKey::private_key_from_pem(key_pem.as_bytes())?;
    let cert = X509::from_pem(cert_pem.as_bytes())?;
    pkcs7.decrypt(&key, &cert, Pkcs7Flags::empty())
}

/// Verify a signed S/MIME message against the signer's certificate and
/// return the covered content.
///
/// The signer certificate doubles as the trust anchor, so self-signed
/// certificates verify without a separate CA.
pub fn verify(smime_text: &str, signer_cert_pem: &str) -> Result<Vec<u8>> {
    let (pkcs7, content) = Pkcs7::from_smime(smime_text.as_bytes())?;
    let signer = X509::from_pem(signer_cert_pem.as_bytes())?;

    let mut store_builder = X509StoreBuilder::new()?;
    store_builder.add_cert(signer.clone())?;
    let store = store_builder.build();

    let mut certs = Stack::new()?;
    certs.push(signer)?;

    let mut out = Vec::new();
    pkcs7.verify(&certs, &store, content.as_deref(), Some(&mut out), Pkcs7Flags::empty())?;
    Ok(out)
}

/// Raw SHA-1 digest of the certificate, for fingerprint display.
pub fn certificate_fingerprint(cert_pem: &str) -> Result<Vec<u8>> {
    let cert = X509::from_pem(cert_pem.as_bytes())?;
    Ok(cert.digest(MessageDigest::sha1())?.to_vec())
}

/// The emailAddress attribute of the certificate subject, if present.
pub fn certificate_subject_email(cert_pem: &str) -> Result<Option<String>> {
    let cert = X509::from_pem(cert_pem.as_bytes())?;
    let email = cert
        .subject_name()
        .entries_by_nid(Nid::PKCS9_EMAILADDRESS)
        .next()
        .and_then(|entry| entry.data().as_utf8().ok())
        .map(|s| s.to_string());
    Ok(email)
}
