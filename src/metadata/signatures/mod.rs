//! Signature blob decoding.
//!
//! Method, field, property and `TypeSpec` signatures describe the types a member uses.
//! The free functions below decode one blob with the default nesting limit; use
//! [`SignatureParser::with_max_depth`] to choose another.
//!
//! # Examples
//!
//! ```rust
//! use dotdoc::metadata::signatures::{parse_method_signature, TypeSignature};
//!
//! // instance void Method(int32, string)
//! let method = parse_method_signature(&[0x20, 0x02, 0x01, 0x08, 0x0E])?;
//! assert!(method.has_this);
//! assert_eq!(method.params[1].base, TypeSignature::String);
//! # Ok::<(), dotdoc::Error>(())
//! ```

mod parser;
mod types;

pub use parser::{SignatureParser, MAX_RECURSION_DEPTH};
pub use types::*;

use crate::Result;

/// Decode a method signature blob.
///
/// # Errors
/// See [`SignatureParser::parse_method_signature`].
pub fn parse_method_signature(data: &[u8]) -> Result<SignatureMethod> {
    SignatureParser::new(data).parse_method_signature()
}

/// Decode a field signature blob.
///
/// # Errors
/// See [`SignatureParser::parse_field_signature`].
pub fn parse_field_signature(data: &[u8]) -> Result<SignatureField> {
    SignatureParser::new(data).parse_field_signature()
}

/// Decode a property signature blob.
///
/// # Errors
/// See [`SignatureParser::parse_property_signature`].
pub fn parse_property_signature(data: &[u8]) -> Result<SignatureProperty> {
    SignatureParser::new(data).parse_property_signature()
}

/// Decode a `TypeSpec` signature blob.
///
/// # Errors
/// See [`SignatureParser::parse_type_spec_signature`].
pub fn parse_type_spec_signature(data: &[u8]) -> Result<SignatureTypeSpec> {
    SignatureParser::new(data).parse_type_spec_signature()
}
