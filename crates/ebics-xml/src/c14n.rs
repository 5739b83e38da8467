//! Inclusive C14N 1.0 (`http://www.w3.org/TR/2001/REC-xml-c14n-20010315`)
//! over the element tree.
//!
//! Namespace declarations are taken from the attributes physically present on
//! each element; the signer injects all in-scope declarations onto extracted
//! fragment roots first (see `dsig`), so the physical axis matches the
//! namespace axis for every tree this serializer sees.

use std::collections::HashMap;

use crate::dom::{Element, Node};
use crate::names::NS_XML;

/// Canonical form of `element` as a document subset rooted at it.
pub fn canonicalize(element: &Element) -> String {
    let mut out = String::new();
    write_canonical(element, &HashMap::new(), &mut out);
    out
}

fn write_canonical(element: &Element, rendered_ns: &HashMap<String, String>, out: &mut String) {
    // Partition namespace declarations from regular attributes.
    let mut ns_decls: Vec<(&str, &str)> = Vec::new();
    let mut attrs: Vec<(&str, &str)> = Vec::new();
    for (name, value) in &element.attributes {
        match ns_prefix(name) {
            Some(prefix) => ns_decls.push((prefix, value)),
            None => attrs.push((name, value)),
        }
    }

    // A namespace node is rendered when it differs from what the nearest
    // ancestor rendered for the same prefix. An empty default declaration is
    // only rendered when it undeclares an inherited default namespace.
    let mut scope = rendered_ns.clone();
    ns_decls.retain(|(prefix, uri)| {
        let inherited = rendered_ns.get(*prefix).map(String::as_str);
        if uri.is_empty() && prefix.is_empty() {
            inherited.map(|u| !u.is_empty()).unwrap_or(false)
        } else {
            inherited != Some(uri)
        }
    });
    for (prefix, uri) in &ns_decls {
        scope.insert((*prefix).to_string(), (*uri).to_string());
    }

    // Namespace nodes sort by prefix; the default declaration sorts first.
    ns_decls.sort_by(|a, b| a.0.cmp(b.0));
    // Attributes sort by (namespace URI, local name); unprefixed attributes
    // carry no namespace.
    attrs.sort_by_key(|(name, _)| attr_sort_key(name, &scope));

    out.push('<');
    out.push_str(&element.name);
    for (prefix, uri) in &ns_decls {
        if prefix.is_empty() {
            out.push_str(" xmlns=\"");
        } else {
            out.push_str(" xmlns:");
            out.push_str(prefix);
            out.push_str("=\"");
        }
        escape_attr(uri, out);
        out.push('"');
    }
    for (name, value) in &attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_attr(value, out);
        out.push('"');
    }
    out.push('>');

    for child in &element.children {
        match child {
            Node::Element(el) => write_canonical(el, &scope, out),
            Node::Text(text) => escape_text(text, out),
        }
    }

    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

/// `xmlns` → `Some("")`, `xmlns:p` → `Some("p")`, anything else → `None`.
fn ns_prefix(attr_name: &str) -> Option<&str> {
    if attr_name == "xmlns" {
        Some("")
    } else {
        attr_name.strip_prefix("xmlns:")
    }
}

fn attr_sort_key(name: &str, scope: &HashMap<String, String>) -> (String, String) {
    match name.split_once(':') {
        Some(("xml", local)) => (NS_XML.to_string(), local.to_string()),
        Some((prefix, local)) => {
            let uri = scope.get(prefix).cloned().unwrap_or_default();
            (uri, local.to_string())
        }
        None => (String::new(), name.to_string()),
    }
}

fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(ch),
        }
    }
}
