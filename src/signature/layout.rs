//! The parts of a PKCS#7 `SignedData` that OpenSSL does not expose.
//!
//! Only the outer structure is walked: names, certificates and attributes are skipped
//! as opaque elements, so their contents never cause a rejection here.

use crate::signature::error::EnvelopeError;
use std::borrow::Cow;
use x509_parser::asn1_rs::{Class, FromDer, Header, Length, Oid, Tag};
use x509_parser::nom;

const OID_PKCS7_SIGNED_DATA: &str = "1.2.840.113549.1.7.2";

pub(crate) struct SignerInfoLayout {
    pub(crate) digest_algorithm: String,
    pub(crate) signature_algorithm: String,
    pub(crate) signature: Vec<u8>,
}

pub(crate) struct SignedDataLayout {
    pub(crate) content: Option<Vec<u8>>,
    pub(crate) signer_infos: Vec<SignerInfoLayout>,
}

impl SignedDataLayout {
    // ContentInfo ::= SEQUENCE { contentType, [0] EXPLICIT SignedData }
    // SignedData ::= SEQUENCE { version, digestAlgorithms, contentInfo,
    //                           [0] certificates OPTIONAL, [1] crls OPTIONAL, signerInfos }
    pub(crate) fn decode(der: &[u8]) -> Result<Self, EnvelopeError> {
        let (content_info, _) = Element::read(der)?;
        if !content_info.is(Tag::Sequence) {
            return Err(EnvelopeError::Malformed("expected a ContentInfo sequence"));
        }

        let content_info = content_info.children()?;
        let content_type = content_info.first().and_then(Element::oid);
        if content_type.as_deref() != Some(OID_PKCS7_SIGNED_DATA) {
            return Err(EnvelopeError::Malformed("content type is not signedData"));
        }

        let wrapper = content_info
            .get(1)
            .filter(|element| element.is_context(0))
            .ok_or(EnvelopeError::Malformed("ContentInfo lacks its content"))?;
        let (signed_data, _) = Element::read(wrapper.contents)?;
        if !signed_data.is(Tag::Sequence) {
            return Err(EnvelopeError::Malformed("expected a SignedData sequence"));
        }

        let fields = signed_data.children()?;
        if fields.len() < 4 || !fields[0].is(Tag::Integer) || !fields[1].is(Tag::Set) {
            return Err(EnvelopeError::Malformed("unexpected SignedData layout"));
        }

        let encapsulated = &fields[2];
        let signer_infos = &fields[fields.len() - 1];
        if !encapsulated.is(Tag::Sequence) || !signer_infos.is(Tag::Set) {
            return Err(EnvelopeError::Malformed("unexpected SignedData layout"));
        }

        let content = decode_encapsulated(encapsulated)?;
        let signer_infos = signer_infos
            .children()?
            .iter()
            .map(decode_signer_info)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            content,
            signer_infos,
        })
    }
}

// EncapsulatedContentInfo ::= SEQUENCE { eContentType, [0] EXPLICIT eContent OPTIONAL }
fn decode_encapsulated(encapsulated: &Element<'_>) -> Result<Option<Vec<u8>>, EnvelopeError> {
    let fields = encapsulated.children()?;
    if fields.first().and_then(Element::oid).is_none() {
        return Err(EnvelopeError::Malformed("encapsulated content lacks its type"));
    }

    match fields.get(1) {
        None => Ok(None),
        Some(wrapper) if wrapper.is_context(0) => {
            let (content, _) = Element::read(wrapper.contents)?;
            if !content.is(Tag::OctetString) {
                return Err(EnvelopeError::Malformed(
                    "embedded content is not an octet string",
                ));
            }
            Ok(Some(content.contents.to_vec()))
        }
        Some(_) => Err(EnvelopeError::Malformed("unexpected encapsulated content")),
    }
}

// SignerInfo ::= SEQUENCE { version, issuerAndSerialNumber, digestAlgorithm,
//                           [0] authenticatedAttributes OPTIONAL,
//                           digestEncryptionAlgorithm, encryptedDigest, ... }
fn decode_signer_info(signer_info: &Element<'_>) -> Result<SignerInfoLayout, EnvelopeError> {
    if !signer_info.is(Tag::Sequence) {
        return Err(EnvelopeError::Malformed("signer info is not a sequence"));
    }
    let fields = signer_info.children()?;

    // issuerAndSerialNumber starts with a Name, so only the two algorithm
    // identifiers start with an OID.
    let mut algorithms = fields.iter().filter_map(Element::algorithm_oid);
    let digest_algorithm = algorithms
        .next()
        .ok_or(EnvelopeError::Malformed("signer info lacks a digest algorithm"))?;
    let signature_algorithm = algorithms
        .next()
        .ok_or(EnvelopeError::Malformed("signer info lacks a signature algorithm"))?;

    let signature = fields
        .iter()
        .find(|field| field.is(Tag::OctetString))
        .map(|field| field.contents.to_vec())
        .ok_or(EnvelopeError::Malformed("signer info lacks a signature"))?;

    Ok(SignerInfoLayout {
        digest_algorithm,
        signature_algorithm,
        signature,
    })
}

/// A DER element whose contents are left undecoded.
struct Element<'a> {
    class: Class,
    tag: Tag,
    contents: &'a [u8],
}

impl<'a> Element<'a> {
    /// Reads one element and returns it with the bytes that follow it.
    fn read(input: &'a [u8]) -> Result<(Self, &'a [u8]), EnvelopeError> {
        let (rest, header) = Header::from_der(input).map_err(|e| match e {
            nom::Err::Error(e) | nom::Err::Failure(e) => EnvelopeError::Der(e),
            nom::Err::Incomplete(_) => EnvelopeError::Malformed("truncated DER header"),
        })?;

        let Length::Definite(len) = header.length() else {
            return Err(EnvelopeError::Malformed("indefinite length in DER"));
        };
        if len > rest.len() {
            return Err(EnvelopeError::Malformed("truncated DER element"));
        }

        let (contents, rest) = rest.split_at(len);
        let element = Element {
            class: header.class(),
            tag: header.tag(),
            contents,
        };
        Ok((element, rest))
    }

    /// Splits the contents of a constructed element into its elements.
    fn children(&self) -> Result<Vec<Element<'a>>, EnvelopeError> {
        let mut input = self.contents;
        let mut children = Vec::new();
        while !input.is_empty() {
            let (child, rest) = Element::read(input)?;
            children.push(child);
            input = rest;
        }
        Ok(children)
    }

    fn is(&self, tag: Tag) -> bool {
        self.class == Class::Universal && self.tag == tag
    }

    fn is_context(&self, number: u32) -> bool {
        self.class == Class::ContextSpecific && self.tag == Tag(number)
    }

    /// Dotted form of an OBJECT IDENTIFIER element.
    fn oid(&self) -> Option<String> {
        self.is(Tag::Oid)
            .then(|| Oid::new(Cow::Borrowed(self.contents)).to_id_string())
    }

    /// Dotted OID of an `AlgorithmIdentifier`, or `None` for any other element.
    fn algorithm_oid(&self) -> Option<String> {
        if !self.is(Tag::Sequence) {
            return None;
        }
        self.children().ok()?.first().and_then(Element::oid)
    }
}

#[cfg(test)]
mod layout_test {
    use super::*;

    // Short-form DER encoding; every element in these tests is under 128 bytes.
    fn tlv(tag: u8, contents: &[u8]) -> Vec<u8> {
        assert!(contents.len() < 0x80);
        let mut out = vec![tag, contents.len() as u8];
        out.extend_from_slice(contents);
        out
    }

    fn concat(parts: &[Vec<u8>]) -> Vec<u8> {
        parts.concat()
    }

    const SIGNED_DATA_OID: [u8; 9] = [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x07, 0x02];
    const DATA_OID: [u8; 9] = [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x07, 0x01];
    const SHA256_OID: [u8; 9] = [0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01];
    const RSA_OID: [u8; 9] = [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x01];

    fn signed_data(content: Option<&[u8]>, signer_infos: &[Vec<u8>]) -> Vec<u8> {
        let mut encapsulated = vec![tlv(0x06, &DATA_OID)];
        if let Some(content) = content {
            encapsulated.push(tlv(0xa0, &tlv(0x04, content)));
        }

        let signed_data = tlv(
            0x30,
            &concat(&[
                tlv(0x02, &[0x01]),
                tlv(0x31, &[]),
                tlv(0x30, &concat(&encapsulated)),
                tlv(0x31, &concat(signer_infos)),
            ]),
        );

        tlv(
            0x30,
            &concat(&[tlv(0x06, &SIGNED_DATA_OID), tlv(0xa0, &signed_data)]),
        )
    }

    fn signer_info(issuer_cn: &[u8]) -> Vec<u8> {
        // PrintableString with characters outside its alphabet.
        let name = tlv(
            0x30,
            &tlv(
                0x31,
                &tlv(
                    0x30,
                    &concat(&[tlv(0x06, &[0x55, 0x04, 0x03]), tlv(0x13, issuer_cn)]),
                ),
            ),
        );
        let issuer_and_serial = tlv(0x30, &concat(&[name, tlv(0x02, &[0x2a])]));

        tlv(
            0x30,
            &concat(&[
                tlv(0x02, &[0x01]),
                issuer_and_serial,
                tlv(0x30, &concat(&[tlv(0x06, &SHA256_OID), tlv(0x05, &[])])),
                tlv(0xa0, &tlv(0x30, &[])),
                tlv(0x30, &concat(&[tlv(0x06, &RSA_OID), tlv(0x05, &[])])),
                tlv(0x04, &[0xde, 0xad, 0xbe, 0xef]),
            ]),
        )
    }

    #[test]
    fn test_decode_empty_signer_set() {
        let der = signed_data(Some(&b"hello"[..]), &[]);

        let layout = SignedDataLayout::decode(&der).unwrap();

        assert!(layout.signer_infos.is_empty());
        assert_eq!(layout.content.as_deref(), Some(&b"hello"[..]));
    }

    #[test]
    fn test_decode_detached_content() {
        let der = signed_data(None, &[signer_info(b"Root CA")]);

        let layout = SignedDataLayout::decode(&der).unwrap();

        assert_eq!(layout.content, None);
        assert_eq!(layout.signer_infos.len(), 1);
    }

    #[test]
    fn test_decode_signer_info_with_unusual_issuer_name() {
        let der = signed_data(
            Some(&b"hello"[..]),
            &[signer_info(b"Corp CA (pki@corp.example) *")],
        );

        let layout = SignedDataLayout::decode(&der).unwrap();

        let signer = &layout.signer_infos[0];
        assert_eq!(signer.digest_algorithm, "2.16.840.1.101.3.4.2.1");
        assert_eq!(signer.signature_algorithm, "1.2.840.113549.1.1.1");
        assert_eq!(signer.signature, vec![0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn test_decode_rejects_other_content_type() {
        let der = tlv(
            0x30,
            &concat(&[tlv(0x06, &DATA_OID), tlv(0xa0, &tlv(0x04, b"x"))]),
        );

        assert!(matches!(
            SignedDataLayout::decode(&der),
            Err(EnvelopeError::Malformed("content type is not signedData"))
        ));
    }

    #[test]
    fn test_decode_rejects_truncated_input() {
        let der = signed_data(Some(&b"hello"[..]), &[]);

        assert!(SignedDataLayout::decode(&der[..der.len() - 3]).is_err());
    }
}
