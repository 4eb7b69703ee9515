//! Test PKI generated at test time: RSA keys, CA and leaf certificates, signed messages.

#![allow(dead_code)]

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use once_cell::sync::Lazy;
use openssl::asn1::{Asn1Time, Asn1Type};
use openssl::bn::{BigNum, MsbOption};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkcs7::{Pkcs7, Pkcs7Flags};
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::stack::Stack;
use openssl::x509::extension::{
    BasicConstraints, ExtendedKeyUsage, KeyUsage, SubjectAlternativeName,
};
use openssl::x509::{X509Builder, X509Name, X509NameBuilder, X509NameRef, X509};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use x509_trust::constants::{SIGNED_MESSAGE_BEGIN, SIGNED_MESSAGE_END};

pub static ROOT_KEY: Lazy<PKey<Private>> = Lazy::new(generate_key);
pub static INTERMEDIATE_KEY: Lazy<PKey<Private>> = Lazy::new(generate_key);
pub static LEAF_KEY: Lazy<PKey<Private>> = Lazy::new(generate_key);
pub static OTHER_KEY: Lazy<PKey<Private>> = Lazy::new(generate_key);

pub static ROOT: Lazy<X509> =
    Lazy::new(|| build_certificate("Test Root CA", None, true, &ROOT_KEY, None, valid_now()));

pub static OTHER_ROOT: Lazy<X509> =
    Lazy::new(|| build_certificate("Other Root CA", None, true, &OTHER_KEY, None, valid_now()));

pub static INTERMEDIATE: Lazy<X509> = Lazy::new(|| {
    build_certificate(
        "Test Intermediate CA",
        None,
        true,
        &INTERMEDIATE_KEY,
        Some(Issuer::root()),
        valid_now(),
    )
});

/// Leaf issued directly by [`ROOT`], with `alice@example.org` as its email.
pub static ALICE: Lazy<X509> = Lazy::new(|| {
    build_certificate(
        "alice",
        Some("alice@example.org"),
        false,
        &LEAF_KEY,
        Some(Issuer::root()),
        valid_now(),
    )
});

/// Leaf issued by [`INTERMEDIATE`].
pub static BOB: Lazy<X509> = Lazy::new(|| {
    build_certificate(
        "bob",
        Some("bob@example.org"),
        false,
        &LEAF_KEY,
        Some(Issuer {
            cert: &INTERMEDIATE,
            key: &INTERMEDIATE_KEY,
        }),
        valid_now(),
    )
});

/// Leaf issued by [`ROOT`] that expired long ago.
pub static EXPIRED: Lazy<X509> = Lazy::new(|| {
    let validity = (
        Asn1Time::from_unix(1_000_000_000).unwrap(),
        Asn1Time::from_unix(1_000_086_400).unwrap(),
    );
    build_certificate(
        "carol",
        Some("carol@example.org"),
        false,
        &LEAF_KEY,
        Some(Issuer::root()),
        validity,
    )
});

/// Self-signed leaf that no trust pool contains.
pub static SELF_SIGNED: Lazy<X509> = Lazy::new(|| {
    build_certificate(
        "mallory",
        Some("mallory@example.org"),
        false,
        &OTHER_KEY,
        None,
        valid_now(),
    )
});

/// Leaf issued by [`ROOT`] with neither a common name nor an email.
pub static ANONYMOUS: Lazy<X509> =
    Lazy::new(|| build_certificate("", None, false, &LEAF_KEY, Some(Issuer::root()), valid_now()));

/// Leaf issued by [`ROOT`] that is only fit for TLS servers.
pub static SERVER_ONLY: Lazy<X509> = Lazy::new(|| {
    let subject = common_name("dave");
    let mut builder = leaf_builder(&subject, &ROOT, &LEAF_KEY);
    builder
        .append_extension(ExtendedKeyUsage::new().server_auth().build().unwrap())
        .unwrap();
    builder.sign(&ROOT_KEY, MessageDigest::sha256()).unwrap();
    builder.build()
});

/// Root whose common name is a PrintableString holding `@` and parentheses.
pub static CORP_ROOT: Lazy<X509> = Lazy::new(|| {
    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_nid_with_type(
        Nid::COMMONNAME,
        "Corp CA (pki@corp.example)",
        Asn1Type::PRINTABLESTRING,
    )
    .unwrap();
    let name = name.build();

    let mut builder = X509Builder::new().unwrap();
    set_basics(&mut builder, &name, &name, &OTHER_KEY);
    builder
        .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
        .unwrap();
    builder
        .append_extension(
            KeyUsage::new()
                .critical()
                .key_cert_sign()
                .crl_sign()
                .build()
                .unwrap(),
        )
        .unwrap();
    builder.sign(&OTHER_KEY, MessageDigest::sha256()).unwrap();
    builder.build()
});

/// Leaf issued by [`CORP_ROOT`].
pub static CORP_LEAF: Lazy<X509> = Lazy::new(|| {
    let subject = common_name("erin");
    let mut builder = leaf_builder(&subject, &CORP_ROOT, &LEAF_KEY);
    builder
        .append_extension(ExtendedKeyUsage::new().email_protection().build().unwrap())
        .unwrap();
    builder.sign(&OTHER_KEY, MessageDigest::sha256()).unwrap();
    builder.build()
});

fn common_name(value: &str) -> X509Name {
    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_nid(Nid::COMMONNAME, value).unwrap();
    name.build()
}

fn set_basics(
    builder: &mut X509Builder,
    subject: &X509NameRef,
    issuer: &X509NameRef,
    key: &PKey<Private>,
) {
    let mut serial = BigNum::new().unwrap();
    serial.rand(64, MsbOption::MAYBE_ZERO, false).unwrap();
    let (not_before, not_after) = valid_now();

    builder.set_version(2).unwrap();
    builder
        .set_serial_number(&serial.to_asn1_integer().unwrap())
        .unwrap();
    builder.set_subject_name(subject).unwrap();
    builder.set_issuer_name(issuer).unwrap();
    builder.set_pubkey(key).unwrap();
    builder.set_not_before(&not_before).unwrap();
    builder.set_not_after(&not_after).unwrap();
}

/// Unsigned leaf with basic constraints and signing key usage, but no extended key usage.
fn leaf_builder(subject: &X509NameRef, issuer: &X509, key: &PKey<Private>) -> X509Builder {
    let mut builder = X509Builder::new().unwrap();
    set_basics(&mut builder, subject, issuer.subject_name(), key);
    builder
        .append_extension(BasicConstraints::new().build().unwrap())
        .unwrap();
    builder
        .append_extension(
            KeyUsage::new()
                .critical()
                .digital_signature()
                .non_repudiation()
                .build()
                .unwrap(),
        )
        .unwrap();
    builder
}

pub struct Issuer<'a> {
    pub cert: &'a X509,
    pub key: &'a PKey<Private>,
}

impl Issuer<'static> {
    pub fn root() -> Self {
        Issuer {
            cert: &ROOT,
            key: &ROOT_KEY,
        }
    }
}

fn generate_key() -> PKey<Private> {
    PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap()
}

fn valid_now() -> (Asn1Time, Asn1Time) {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;
    (
        Asn1Time::from_unix(now - 3600).unwrap(),
        Asn1Time::days_from_now(365).unwrap(),
    )
}

pub fn build_certificate(
    common_name: &str,
    email: Option<&str>,
    is_ca: bool,
    key: &PKey<Private>,
    issuer: Option<Issuer<'_>>,
    (not_before, not_after): (Asn1Time, Asn1Time),
) -> X509 {
    let mut name = X509NameBuilder::new().unwrap();
    if common_name.is_empty() {
        name.append_entry_by_nid(Nid::ORGANIZATIONNAME, "Anonymous Org")
            .unwrap();
    } else {
        name.append_entry_by_nid(Nid::COMMONNAME, common_name)
            .unwrap();
    }
    let name = name.build();

    let mut serial = BigNum::new().unwrap();
    serial.rand(64, MsbOption::MAYBE_ZERO, false).unwrap();

    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    builder
        .set_serial_number(&serial.to_asn1_integer().unwrap())
        .unwrap();
    builder.set_subject_name(&name).unwrap();
    match &issuer {
        Some(issuer) => builder.set_issuer_name(issuer.cert.subject_name()).unwrap(),
        None => builder.set_issuer_name(&name).unwrap(),
    }
    builder.set_pubkey(key).unwrap();
    builder.set_not_before(&not_before).unwrap();
    builder.set_not_after(&not_after).unwrap();

    if is_ca {
        builder
            .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
            .unwrap();
        builder
            .append_extension(
                KeyUsage::new()
                    .critical()
                    .key_cert_sign()
                    .crl_sign()
                    .build()
                    .unwrap(),
            )
            .unwrap();
    } else {
        builder
            .append_extension(BasicConstraints::new().build().unwrap())
            .unwrap();
        builder
            .append_extension(
                KeyUsage::new()
                    .critical()
                    .digital_signature()
                    .non_repudiation()
                    .build()
                    .unwrap(),
            )
            .unwrap();
        builder
            .append_extension(
                ExtendedKeyUsage::new()
                    .email_protection()
                    .client_auth()
                    .build()
                    .unwrap(),
            )
            .unwrap();
    }

    if let Some(email) = email {
        let issuer_cert = issuer.as_ref().map(|issuer| &**issuer.cert);
        let san = SubjectAlternativeName::new()
            .email(email)
            .build(&builder.x509v3_context(issuer_cert, None))
            .unwrap();
        builder.append_extension(san).unwrap();
    }

    let signing_key = issuer.as_ref().map_or(key, |issuer| issuer.key);
    builder.sign(signing_key, MessageDigest::sha256()).unwrap();
    builder.build()
}

/// Signs `content` as `signer` and returns the ASCII-armored message.
///
/// `extra` certificates are carried in the message alongside the signer's.
pub fn sign(
    content: &[u8],
    signer: &X509,
    key: &PKey<Private>,
    extra: &[&X509],
    detached: bool,
) -> String {
    let mut certs = Stack::new().unwrap();
    for cert in extra {
        certs.push((*cert).clone()).unwrap();
    }

    let flags = if detached {
        Pkcs7Flags::DETACHED | Pkcs7Flags::BINARY
    } else {
        Pkcs7Flags::BINARY
    };

    let pkcs7 = Pkcs7::sign(signer, key, &certs, content, flags).unwrap();
    armor(&pkcs7.to_der().unwrap())
}

/// Wraps DER bytes in signed-message armor, 64 columns per line.
pub fn armor(der: &[u8]) -> String {
    let encoded = STANDARD.encode(der);
    let mut text = String::from(SIGNED_MESSAGE_BEGIN);
    text.push('\n');
    for chunk in encoded.as_bytes().chunks(64) {
        text.push_str(std::str::from_utf8(chunk).unwrap());
        text.push('\n');
    }
    text.push_str(SIGNED_MESSAGE_END);
    text.push('\n');
    text
}

/// A PKCS#7 signed-data message with embedded content and an empty signer set.
pub fn zero_signer_message(content: &[u8]) -> String {
    use asn1::{to_der, ASN1Block, ASN1Class, BigInt, BigUint, OID};

    fn oid(arcs: &[u64]) -> OID {
        OID::new(arcs.iter().map(|arc| BigUint::from(*arc)).collect())
    }

    let encapsulated = ASN1Block::Sequence(
        0,
        vec![
            ASN1Block::ObjectIdentifier(0, oid(&[1, 2, 840, 113549, 1, 7, 1])),
            ASN1Block::Explicit(
                ASN1Class::ContextSpecific,
                0,
                BigUint::from(0u8),
                Box::new(ASN1Block::OctetString(0, content.to_vec())),
            ),
        ],
    );

    let signed_data = ASN1Block::Sequence(
        0,
        vec![
            ASN1Block::Integer(0, BigInt::from(1)),
            ASN1Block::Set(0, Vec::new()),
            encapsulated,
            ASN1Block::Set(0, Vec::new()),
        ],
    );

    let content_info = ASN1Block::Sequence(
        0,
        vec![
            ASN1Block::ObjectIdentifier(0, oid(&[1, 2, 840, 113549, 1, 7, 2])),
            ASN1Block::Explicit(
                ASN1Class::ContextSpecific,
                0,
                BigUint::from(0u8),
                Box::new(signed_data),
            ),
        ],
    );

    armor(&to_der(&content_info).unwrap())
}

pub fn write_pem(path: &Path, certs: &[&X509]) {
    let mut pem = Vec::new();
    for cert in certs {
        pem.extend(cert.to_pem().unwrap());
    }
    std::fs::write(path, pem).unwrap();
}

pub fn der(cert: &X509) -> Vec<u8> {
    cert.to_der().unwrap()
}
