//! Enveloped XML-DSIG for the EBICS `AuthSignature`.
//!
//! The reference is the constrained XPath
//! `#xpointer(//*[@authenticate='true'])`: the digest covers the C14N forms
//! of every element carrying `authenticate="true"`, concatenated in document
//! order. `SignedInfo` itself is canonicalized in the context of the
//! surrounding document, so in-scope namespace declarations (notably the
//! default EBICS namespace and the `ds` prefix on the document element) are
//! part of the signed bytes.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rsa::RsaPublicKey;
use tracing::debug;

use ebics_core::EbicsError;
use ebics_crypto::{sha256, KeyPair};

use crate::c14n::canonicalize;
use crate::dom::{Element, Node};
use crate::names::{
    ALG_C14N, ALG_RSA_SHA256, ALG_SHA256, ATTR_ALGORITHM, ATTR_AUTHENTICATE, ATTR_URI,
    AUTH_SIGNATURE, DS_CANONICALIZATION_METHOD, DS_DIGEST_METHOD, DS_DIGEST_VALUE, DS_REFERENCE,
    DS_SIGNATURE_METHOD, DS_SIGNATURE_VALUE, DS_SIGNED_INFO, DS_TRANSFORM, DS_TRANSFORMS, HEADER,
    REFERENCE_URI,
};

/// SHA-256 over the concatenated C14N forms of all `authenticate="true"`
/// elements. Fails when the document contains none.
pub fn digest_authenticated(doc: &Element) -> Result<[u8; 32], EbicsError> {
    let fragments = collect_authenticated(doc);
    if fragments.is_empty() {
        return Err(EbicsError::CreateRequest(
            "document has no authenticate=\"true\" elements".into(),
        ));
    }
    let ns_map = namespace_map(doc);
    let mut concatenated = String::new();
    for fragment in fragments {
        concatenated.push_str(&canonical_in_context(fragment, &ns_map));
    }
    Ok(sha256(concatenated.as_bytes()))
}

/// Compute the digest, build `SignedInfo`, sign it with the user's
/// authentication key and insert the `AuthSignature` element after the
/// header.
pub fn sign_request(doc: &mut Element, auth_key: &KeyPair) -> Result<(), EbicsError> {
    let digest = digest_authenticated(doc)?;
    let signed_info = build_signed_info(&BASE64.encode(digest));

    let canonical = canonical_in_context(&signed_info, &namespace_map(doc));
    let signature = ebics_crypto::sign(auth_key.private(), canonical.as_bytes())?;

    let auth_signature = Element::new(AUTH_SIGNATURE)
        .child(signed_info)
        .child(Element::with_text(DS_SIGNATURE_VALUE, BASE64.encode(signature)));

    let position = doc
        .children
        .iter()
        .position(|node| matches!(node, Node::Element(el) if el.local_name() == HEADER))
        .map(|i| i + 1)
        .unwrap_or(doc.children.len());
    doc.children.insert(position, Node::Element(auth_signature));
    Ok(())
}

/// Verify the `AuthSignature` of a received document against the bank's
/// authentication public key. Any malformed input verifies false.
pub fn verify_response(doc: &Element, bank_auth: &RsaPublicKey) -> bool {
    match try_verify(doc, bank_auth) {
        Ok(valid) => valid,
        Err(e) => {
            debug!(error = %e, "authentication signature rejected");
            false
        }
    }
}

fn try_verify(doc: &Element, bank_auth: &RsaPublicKey) -> Result<bool, EbicsError> {
    let auth_signature = doc
        .find(AUTH_SIGNATURE)
        .ok_or_else(|| EbicsError::MalformedResponse("no AuthSignature".into()))?;
    let signed_info = auth_signature
        .first_child("SignedInfo")
        .ok_or_else(|| EbicsError::MalformedResponse("no SignedInfo".into()))?;
    let reference = signed_info
        .first_child("Reference")
        .ok_or_else(|| EbicsError::MalformedResponse("no Reference".into()))?;

    // The constrained profile admits exactly one reference and algorithm set.
    if reference.attribute(ATTR_URI) != Some(REFERENCE_URI) {
        return Ok(false);
    }
    if method_algorithm(signed_info, "SignatureMethod") != Some(ALG_RSA_SHA256)
        || method_algorithm(reference, "DigestMethod") != Some(ALG_SHA256)
    {
        return Ok(false);
    }

    let claimed_digest = decode_base64_text(
        reference
            .first_child("DigestValue")
            .ok_or_else(|| EbicsError::MalformedResponse("no DigestValue".into()))?,
    )?;
    if claimed_digest != digest_authenticated(doc)? {
        return Ok(false);
    }

    let signature = decode_base64_text(
        auth_signature
            .first_child("SignatureValue")
            .ok_or_else(|| EbicsError::MalformedResponse("no SignatureValue".into()))?,
    )?;
    let canonical = canonical_in_context(signed_info, &namespace_map(doc));
    Ok(ebics_crypto::verify(
        bank_auth,
        canonical.as_bytes(),
        &signature,
    ))
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn build_signed_info(digest_b64: &str) -> Element {
    Element::new(DS_SIGNED_INFO)
        .child(Element::new(DS_CANONICALIZATION_METHOD).attr(ATTR_ALGORITHM, ALG_C14N))
        .child(Element::new(DS_SIGNATURE_METHOD).attr(ATTR_ALGORITHM, ALG_RSA_SHA256))
        .child(
            Element::new(DS_REFERENCE)
                .attr(ATTR_URI, REFERENCE_URI)
                .child(
                    Element::new(DS_TRANSFORMS)
                        .child(Element::new(DS_TRANSFORM).attr(ATTR_ALGORITHM, ALG_C14N)),
                )
                .child(Element::new(DS_DIGEST_METHOD).attr(ATTR_ALGORITHM, ALG_SHA256))
                .child(Element::with_text(DS_DIGEST_VALUE, digest_b64)),
        )
}

/// All `authenticate="true"` elements in document order.
fn collect_authenticated(doc: &Element) -> Vec<&Element> {
    let mut out = Vec::new();
    walk_authenticated(doc, &mut out);
    out
}

fn walk_authenticated<'a>(element: &'a Element, out: &mut Vec<&'a Element>) {
    if element.attribute(ATTR_AUTHENTICATE) == Some("true") {
        out.push(element);
    }
    for child in element.elements() {
        walk_authenticated(child, out);
    }
}

/// All namespace declarations of the document, first occurrence winning.
fn namespace_map(doc: &Element) -> Vec<(String, String)> {
    let mut map: Vec<(String, String)> = Vec::new();
    collect_namespaces(doc, &mut map);
    map
}

fn collect_namespaces(element: &Element, map: &mut Vec<(String, String)>) {
    for (name, value) in &element.attributes {
        let prefix = if name == "xmlns" {
            Some("")
        } else {
            name.strip_prefix("xmlns:")
        };
        if let Some(prefix) = prefix {
            if !map.iter().any(|(p, _)| p == prefix) {
                map.push((prefix.to_string(), value.clone()));
            }
        }
    }
    for child in element.elements() {
        collect_namespaces(child, map);
    }
}

/// Clone a fragment, inject the document's in-scope namespace declarations
/// that the fragment root does not re-declare, then canonicalize. Without the
/// injection, prefixes bound on ancestors would become unbound in the
/// extracted fragment and the digest would diverge between peers.
fn canonical_in_context(fragment: &Element, ns_map: &[(String, String)]) -> String {
    let mut clone = fragment.clone();
    for (prefix, uri) in ns_map {
        let attr_name = if prefix.is_empty() {
            "xmlns".to_string()
        } else {
            format!("xmlns:{prefix}")
        };
        if clone.attribute(&attr_name).is_none() {
            clone.attributes.push((attr_name, uri.clone()));
        }
    }
    canonicalize(&clone)
}

fn method_algorithm<'a>(parent: &'a Element, local: &str) -> Option<&'a str> {
    parent.first_child(local)?.attribute(ATTR_ALGORITHM)
}

fn decode_base64_text(element: &Element) -> Result<Vec<u8>, EbicsError> {
    let compact: String = element
        .text_content()
        .split_whitespace()
        .collect();
    BASE64
        .decode(compact)
        .map_err(|e| EbicsError::MalformedResponse(format!("base64: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::{NS_EBICS_H004, NS_XMLDSIG};
    use ebics_core::types::KeyVersion;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rsa::RsaPrivateKey;
    use std::sync::OnceLock;

    fn auth_key() -> &'static KeyPair {
        static KEY: OnceLock<KeyPair> = OnceLock::new();
        KEY.get_or_init(|| {
            let key = RsaPrivateKey::new(&mut StdRng::seed_from_u64(7), 2048).unwrap();
            KeyPair::new(KeyVersion::X002, key).unwrap()
        })
    }

    fn sample_request() -> Element {
        Element::new("ebicsRequest")
            .attr("xmlns", NS_EBICS_H004)
            .attr("xmlns:ds", NS_XMLDSIG)
            .attr("Version", "H004")
            .attr("Revision", "1")
            .child(
                Element::new("header")
                    .child(
                        Element::new("static")
                            .attr(ATTR_AUTHENTICATE, "true")
                            .child(Element::with_text("HostID", "SIZBN001"))
                            .child(Element::with_text("PartnerID", "PART01")),
                    )
                    .child(
                        Element::new("mutable")
                            .attr(ATTR_AUTHENTICATE, "true")
                            .child(Element::with_text("TransactionPhase", "Initialisation")),
                    ),
            )
            .child(Element::new("body").attr(ATTR_AUTHENTICATE, "true"))
    }

    #[test]
    fn sign_verify_round_trip() {
        let mut doc = sample_request();
        sign_request(&mut doc, auth_key()).unwrap();

        // AuthSignature sits between header and body.
        assert_eq!(doc.elements().nth(1).unwrap().local_name(), "AuthSignature");
        assert!(verify_response(&doc, &auth_key().public()));
    }

    #[test]
    fn round_trip_survives_the_wire() {
        let mut doc = sample_request();
        sign_request(&mut doc, auth_key()).unwrap();

        let reparsed = Element::parse(doc.to_document().unwrap().as_bytes()).unwrap();
        assert!(verify_response(&reparsed, &auth_key().public()));
    }

    #[test]
    fn tampered_authenticated_content_fails() {
        let mut doc = sample_request();
        sign_request(&mut doc, auth_key()).unwrap();

        let tampered = doc
            .to_document()
            .unwrap()
            .replace("SIZBN001", "SIZBN002");
        let reparsed = Element::parse(tampered.as_bytes()).unwrap();
        assert!(!verify_response(&reparsed, &auth_key().public()));
    }

    #[test]
    fn wrong_key_fails() {
        let mut doc = sample_request();
        sign_request(&mut doc, auth_key()).unwrap();

        let other = RsaPrivateKey::new(&mut StdRng::seed_from_u64(8), 2048).unwrap();
        assert!(!verify_response(&doc, &other.to_public_key()));
    }

    #[test]
    fn digest_ignores_whitespace_outside_authenticated_subtrees() {
        let compact = Element::parse(
            format!(
                r#"<ebicsRequest xmlns="{NS_EBICS_H004}" xmlns:ds="{NS_XMLDSIG}"><header><static authenticate="true"><HostID>H</HostID></static></header></ebicsRequest>"#
            )
            .as_bytes(),
        )
        .unwrap();
        let spaced = Element::parse(
            format!(
                "<ebicsRequest xmlns:ds=\"{NS_XMLDSIG}\" xmlns=\"{NS_EBICS_H004}\">\n  <header>\n    <static authenticate=\"true\"><HostID>H</HostID></static>\n  </header>\n</ebicsRequest>"
            )
            .as_bytes(),
        )
        .unwrap();
        assert_eq!(
            digest_authenticated(&compact).unwrap(),
            digest_authenticated(&spaced).unwrap()
        );
    }

    #[test]
    fn unsigned_document_verifies_false() {
        assert!(!verify_response(&sample_request(), &auth_key().public()));
    }

    #[test]
    fn document_without_authenticated_elements_cannot_be_signed() {
        let mut doc = Element::new("ebicsRequest").child(Element::new("header"));
        assert!(sign_request(&mut doc, auth_key()).is_err());
    }
}
