//! Parser configuration
//!
//! Controls which members the walker lists and how member keys are spelled. The defaults
//! reproduce what the documentation UI has always shown: constructors and properties of
//! every accessibility, public methods only.

use crate::{dockey::KeyEncoder, metadata::signatures::MAX_RECURSION_DEPTH};

/// Configuration for [`crate::DocParser`]
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ParserConfig {
    /// List private, internal and protected constructors too
    pub include_non_public_constructors: bool,

    /// List non-public methods too
    pub include_non_public_methods: bool,

    /// List non-public properties too (protected API surface)
    pub include_non_public_properties: bool,

    /// Fill `Members` of enumerations with their literals
    pub include_enum_members: bool,

    /// Spell generic method keys the way compilers do (``` M:N.C.Map``1(``0) ```)
    pub method_arity_suffix: bool,

    /// Extension of the sidecar file, which sits next to the binary
    pub comments_extension: String,

    /// Nesting limit for signature blobs
    pub max_signature_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            include_non_public_constructors: true,
            include_non_public_methods: false,
            include_non_public_properties: true,
            include_enum_members: true,
            method_arity_suffix: false,
            comments_extension: String::from("xml"),
            max_signature_depth: MAX_RECURSION_DEPTH,
        }
    }
}

impl ParserConfig {
    /// Only the public surface
    #[must_use]
    pub fn public_only() -> Self {
        Self {
            include_non_public_constructors: false,
            include_non_public_methods: false,
            include_non_public_properties: false,
            ..Self::default()
        }
    }

    /// Every member of every accessibility, compiler-style method keys
    #[must_use]
    pub fn complete() -> Self {
        Self {
            include_non_public_constructors: true,
            include_non_public_methods: true,
            include_non_public_properties: true,
            include_enum_members: true,
            method_arity_suffix: true,
            ..Self::default()
        }
    }

    /// Use `extension` for the sidecar file instead of `xml`
    #[must_use]
    pub fn with_comments_extension(mut self, extension: impl Into<String>) -> Self {
        self.comments_extension = extension.into();
        self
    }

    /// The key encoder this configuration asks for
    #[must_use]
    pub fn key_encoder(&self) -> KeyEncoder {
        KeyEncoder::new().with_method_arity(self.method_arity_suffix)
    }
}
