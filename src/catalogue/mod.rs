//! Type catalogues: where the walker gets its types from.
//!
//! A [`TypeCatalogue`] yields the identity of one binary and a [`TypeDescriptor`] for
//! every externally visible type in it. The walker and the key encoder only ever see
//! descriptors, so the metadata reader can be swapped for another source.
//!
//! # Key Types
//! - [`CilCatalogue`] - reads descriptors from the ECMA-335 metadata of a PE image
//! - [`StaticCatalogue`] - descriptors assembled in memory
//! - [`AssemblyIdentity`] - module version id, name, version, culture and key token
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotdoc::catalogue::{CilCatalogue, TypeCatalogue};
//! use std::path::Path;
//!
//! let catalogue = CilCatalogue::from_file(Path::new("Library.dll"))?;
//! println!("{}", catalogue.identity()?.full_name());
//! for ty in catalogue.visible_types() {
//!     println!("{}", ty?.full_name());
//! }
//! # Ok::<(), dotdoc::Error>(())
//! ```

mod cil;
mod descriptor;
pub mod names;
mod static_catalogue;

pub use cil::CilCatalogue;
pub use descriptor::{
    strip_arity, EventDescriptor, FieldDescriptor, MethodDescriptor, MethodSig, ParamDescriptor,
    PropertyDescriptor, PropertySig, TypeDescriptor, TypeKind, TypeName, TypeSig,
};
pub use static_catalogue::StaticCatalogue;

use std::fmt::Write;

use crate::Result;

/// Identity of a loaded binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyIdentity {
    /// Module version id; changes whenever the binary is rebuilt
    pub mvid: uguid::Guid,
    /// Simple assembly name
    pub name: String,
    /// Major, minor, build and revision numbers
    pub version: [u16; 4],
    /// Culture, empty for culture-neutral assemblies
    pub culture: String,
    /// Last 8 bytes of the SHA-1 of the public key, reversed
    pub public_key_token: Option<[u8; 8]>,
}

impl AssemblyIdentity {
    /// A culture-neutral, unsigned identity.
    pub fn new(mvid: uguid::Guid, name: impl Into<String>, version: [u16; 4]) -> Self {
        AssemblyIdentity {
            mvid,
            name: name.into(),
            version,
            culture: String::new(),
            public_key_token: None,
        }
    }

    /// Display name: `Name, Version=1.0.0.0, Culture=neutral, PublicKeyToken=null`.
    #[must_use]
    pub fn full_name(&self) -> String {
        let [major, minor, build, revision] = self.version;
        let culture = if self.culture.is_empty() {
            "neutral"
        } else {
            self.culture.as_str()
        };

        let token = match &self.public_key_token {
            Some(bytes) => bytes.iter().fold(String::with_capacity(16), |mut out, byte| {
                let _ = write!(out, "{byte:02x}");
                out
            }),
            None => "null".to_string(),
        };

        format!(
            "{}, Version={major}.{minor}.{build}.{revision}, Culture={culture}, PublicKeyToken={token}",
            self.name
        )
    }
}

/// A source of type descriptors for one binary.
pub trait TypeCatalogue {
    /// Identity of the binary.
    ///
    /// # Errors
    /// Fails if the identifying metadata cannot be read.
    fn identity(&self) -> Result<AssemblyIdentity>;

    /// Every externally visible type: public top-level types and types nested with
    /// public visibility. A type that fails to load is yielded as an error, and the
    /// remaining types are still produced.
    fn visible_types(&self) -> Box<dyn Iterator<Item = Result<TypeDescriptor>> + '_>;
}
