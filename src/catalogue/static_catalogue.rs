//! A catalogue of descriptors assembled in memory.

use crate::{
    catalogue::{AssemblyIdentity, TypeCatalogue, TypeDescriptor},
    error::DecodeError,
    Error, Result,
};

/// Descriptors supplied directly by the caller.
///
/// Useful for documenting types that come from a source other than a PE image, and
/// for exercising the walker without building a binary. Types that are not visible
/// are kept but never yielded.
///
/// ```rust
/// use dotdoc::catalogue::{AssemblyIdentity, StaticCatalogue, TypeCatalogue, TypeDescriptor, TypeKind, TypeName};
///
/// let identity = AssemblyIdentity::new(uguid::Guid::ZERO, "Sample", [1, 0, 0, 0]);
/// let catalogue = StaticCatalogue::new(identity)
///     .with_type(TypeDescriptor::new(TypeName::new("N", "C"), TypeKind::CLASS | TypeKind::PUBLIC));
/// assert_eq!(catalogue.visible_types().count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct StaticCatalogue {
    identity: AssemblyIdentity,
    types: Vec<std::result::Result<TypeDescriptor, (String, DecodeError)>>,
}

impl StaticCatalogue {
    /// An empty catalogue with the given identity.
    #[must_use]
    pub fn new(identity: AssemblyIdentity) -> Self {
        StaticCatalogue {
            identity,
            types: Vec::new(),
        }
    }

    /// Add a type.
    #[must_use]
    pub fn with_type(mut self, ty: TypeDescriptor) -> Self {
        self.types.push(Ok(ty));
        self
    }

    /// Add a visible type that fails to load with `message`.
    #[must_use]
    pub fn with_broken_type(mut self, name: impl Into<String>, message: impl Into<String>) -> Self {
        self.types
            .push(Err((name.into(), DecodeError(message.into()))));
        self
    }

    /// Number of types, visible or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// True if no type was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeCatalogue for StaticCatalogue {
    fn identity(&self) -> Result<AssemblyIdentity> {
        Ok(self.identity.clone())
    }

    fn visible_types(&self) -> Box<dyn Iterator<Item = Result<TypeDescriptor>> + '_> {
        Box::new(self.types.iter().filter_map(|entry| match entry {
            Ok(ty) if ty.is_visible() => Some(Ok(ty.clone())),
            Ok(_) => None,
            Err((name, error)) => Some(Err(Error::TypeLoad {
                name: name.clone(),
                source: Box::new(Error::Decode(error.clone())),
            })),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::{TypeKind, TypeName};

    #[test]
    fn yields_visible_and_broken() {
        let identity = AssemblyIdentity::new(uguid::Guid::ZERO, "Sample", [0; 4]);
        let catalogue = StaticCatalogue::new(identity.clone())
            .with_type(TypeDescriptor::new(
                TypeName::new("N", "Hidden"),
                TypeKind::CLASS,
            ))
            .with_type(TypeDescriptor::new(
                TypeName::new("N", "Shown"),
                TypeKind::CLASS | TypeKind::PUBLIC,
            ))
            .with_broken_type("N.Broken", "unresolved base");

        assert_eq!(catalogue.len(), 3);
        assert_eq!(catalogue.identity().unwrap(), identity);

        let types: Vec<_> = catalogue.visible_types().collect();
        assert_eq!(types.len(), 2);
        assert_eq!(types[0].as_ref().unwrap().full_name(), "N.Shown");

        let error = types[1].as_ref().unwrap_err().to_string();
        assert_eq!(error, "Failed to load type N.Broken - unresolved base");
    }
}
