//! ebics-xml
//!
//! The XML layer of the EBICS envelope: a small namespace-preserving element
//! tree (parsed and emitted with quick-xml), the EBICS/XML-DSIG name tables,
//! inclusive C14N 1.0 serialization, and the enveloped `AuthSignature`
//! producer/verifier with its constrained
//! `#xpointer(//*[@authenticate='true'])` reference.

pub mod c14n;
pub mod dom;
pub mod dsig;
pub mod names;

pub use c14n::canonicalize;
pub use dom::{Element, Node};
pub use dsig::{digest_authenticated, sign_request, verify_response};
