//! Descriptors of types and members.
//!
//! These are owned, read-only values produced by a [`crate::catalogue::TypeCatalogue`].
//! The key encoder and the walker depend only on them, never on the metadata tables,
//! so a catalogue backed by something other than a PE image can feed the same pipeline.

use bitflags::bitflags;

use crate::{
    error::DecodeError,
    metadata::typesystem::{FieldAttributes, MethodAttributes, ParamAttributes, PropertyAttributes},
};

/// Namespace, nesting path and name of a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TypeName {
    /// Namespace of the outermost enclosing type, empty for the global namespace
    pub namespace: String,
    /// Metadata name, including a generic arity suffix such as `` `1 ``
    pub name: String,
    /// Enclosing type names, outermost first
    pub enclosing: Vec<String>,
}

impl TypeName {
    /// A top-level type.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        TypeName {
            namespace: namespace.into(),
            name: name.into(),
            enclosing: Vec::new(),
        }
    }

    /// A type in the `System` namespace.
    pub fn system(name: impl Into<String>) -> Self {
        TypeName::new("System", name)
    }

    /// A type nested inside `outer`.
    pub fn nested(outer: &TypeName, name: impl Into<String>) -> Self {
        let mut enclosing = outer.enclosing.clone();
        enclosing.push(outer.name.clone());

        TypeName {
            namespace: outer.namespace.clone(),
            name: name.into(),
            enclosing,
        }
    }

    /// True if the type is declared inside another type.
    #[must_use]
    pub fn is_nested(&self) -> bool {
        !self.enclosing.is_empty()
    }

    /// True for the top-level type `namespace.name`.
    #[must_use]
    pub fn is(&self, namespace: &str, name: &str) -> bool {
        self.enclosing.is_empty() && self.namespace == namespace && self.name == name
    }

    /// Reflection-style full name, nesting levels separated by `+`: `N.Outer+Inner`.
    #[must_use]
    pub fn full_name(&self) -> String {
        self.join('+')
    }

    /// Full name with every nesting level separated by `.`: `N.Outer.Inner`.
    #[must_use]
    pub fn key_name(&self) -> String {
        self.join('.')
    }

    /// The name without its generic arity suffix.
    #[must_use]
    pub fn bare_name(&self) -> &str {
        strip_arity(&self.name)
    }

    fn join(&self, nesting: char) -> String {
        let mut out = String::with_capacity(self.namespace.len() + self.name.len() + 1);
        if !self.namespace.is_empty() {
            out.push_str(&self.namespace);
            out.push('.');
        }
        for outer in &self.enclosing {
            out.push_str(outer);
            out.push(nesting);
        }
        out.push_str(&self.name);
        out
    }
}

/// Strip a trailing `` `N `` generic arity marker from a metadata name.
#[must_use]
pub fn strip_arity(name: &str) -> &str {
    match name.rfind('`') {
        Some(pos) if pos + 1 < name.len() && name[pos + 1..].bytes().all(|b| b.is_ascii_digit()) => {
            &name[..pos]
        }
        _ => name,
    }
}

/// A type as it appears in a member signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSig {
    /// A non-generic type, or a generic definition used without arguments
    Named(TypeName),
    /// A constructed generic type
    Generic {
        /// The generic definition
        definition: TypeName,
        /// Type arguments, in declaration order
        args: Vec<TypeSig>,
    },
    /// A generic parameter of the declaring type
    TypeParam {
        /// Zero-based declaration position
        position: u32,
        /// Declared name, e.g. `T`
        name: String,
    },
    /// A generic parameter of the method
    MethodParam {
        /// Zero-based declaration position
        position: u32,
        /// Declared name, e.g. `TResult`
        name: String,
    },
    /// Single-dimensional, zero-based array
    SzArray(Box<TypeSig>),
    /// Multi-dimensional array
    Array {
        /// Element type
        element: Box<TypeSig>,
        /// Number of dimensions
        rank: u32,
    },
    /// Managed reference (`ref`/`out`)
    ByRef(Box<TypeSig>),
    /// Unmanaged pointer
    Pointer(Box<TypeSig>),
}

impl TypeSig {
    /// A non-generic type.
    pub fn named(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        TypeSig::Named(TypeName::new(namespace, name))
    }

    /// A type in the `System` namespace.
    pub fn system(name: impl Into<String>) -> Self {
        TypeSig::Named(TypeName::system(name))
    }

    /// A constructed generic type.
    #[must_use]
    pub fn generic(definition: TypeName, args: Vec<TypeSig>) -> Self {
        TypeSig::Generic { definition, args }
    }

    /// A generic parameter of the declaring type.
    pub fn type_param(position: u32, name: impl Into<String>) -> Self {
        TypeSig::TypeParam {
            position,
            name: name.into(),
        }
    }

    /// A generic parameter of the method.
    pub fn method_param(position: u32, name: impl Into<String>) -> Self {
        TypeSig::MethodParam {
            position,
            name: name.into(),
        }
    }

    /// `element[]`
    #[must_use]
    pub fn sz_array(element: TypeSig) -> Self {
        TypeSig::SzArray(Box::new(element))
    }

    /// `element[,]` and higher ranks.
    #[must_use]
    pub fn array(element: TypeSig, rank: u32) -> Self {
        TypeSig::Array {
            element: Box::new(element),
            rank,
        }
    }

    /// `ref inner`
    #[must_use]
    pub fn by_ref(inner: TypeSig) -> Self {
        TypeSig::ByRef(Box::new(inner))
    }

    /// `inner*`
    #[must_use]
    pub fn pointer(inner: TypeSig) -> Self {
        TypeSig::Pointer(Box::new(inner))
    }

    /// `System.Void`
    #[must_use]
    pub fn void() -> Self {
        TypeSig::system("Void")
    }

    /// True for a type or method generic parameter.
    #[must_use]
    pub fn is_generic_param(&self) -> bool {
        matches!(self, TypeSig::TypeParam { .. } | TypeSig::MethodParam { .. })
    }

    /// The named type, or the definition of a constructed generic type.
    #[must_use]
    pub fn type_name(&self) -> Option<&TypeName> {
        match self {
            TypeSig::Named(name) => Some(name),
            TypeSig::Generic { definition, .. } => Some(definition),
            _ => None,
        }
    }

    /// Replace generic parameters by the arguments at their position, when known.
    ///
    /// Parameters without a matching argument are left in place.
    #[must_use]
    pub fn substitute(&self, type_args: &[TypeSig], method_args: &[TypeSig]) -> TypeSig {
        match self {
            TypeSig::TypeParam { position, .. } => type_args
                .get(*position as usize)
                .cloned()
                .unwrap_or_else(|| self.clone()),
            TypeSig::MethodParam { position, .. } => method_args
                .get(*position as usize)
                .cloned()
                .unwrap_or_else(|| self.clone()),
            TypeSig::Named(_) => self.clone(),
            TypeSig::Generic { definition, args } => TypeSig::Generic {
                definition: definition.clone(),
                args: args
                    .iter()
                    .map(|arg| arg.substitute(type_args, method_args))
                    .collect(),
            },
            TypeSig::SzArray(element) => {
                TypeSig::sz_array(element.substitute(type_args, method_args))
            }
            TypeSig::Array { element, rank } => {
                TypeSig::array(element.substitute(type_args, method_args), *rank)
            }
            TypeSig::ByRef(inner) => TypeSig::by_ref(inner.substitute(type_args, method_args)),
            TypeSig::Pointer(inner) => TypeSig::pointer(inner.substitute(type_args, method_args)),
        }
    }
}

bitflags! {
    /// Shape and visibility of a type, as the walker classifies it.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TypeKind: u32 {
        /// Reference type that is not an interface
        const CLASS = 0x0001;
        /// Interface
        const INTERFACE = 0x0002;
        /// Value type (struct or enum)
        const VALUE_TYPE = 0x0004;
        /// Enumeration
        const ENUM = 0x0008;
        /// Derives from `System.Delegate` or `System.MulticastDelegate`
        const DELEGATE = 0x0010;
        /// Declares generic parameters
        const GENERIC = 0x0020;
        /// Declared inside another type
        const NESTED = 0x0040;
        /// Abstract
        const ABSTRACT = 0x0080;
        /// Sealed
        const SEALED = 0x0100;
        /// Top-level public type
        const PUBLIC = 0x0200;
        /// Nested type with public visibility
        const NESTED_PUBLIC = 0x0400;
        /// One of the runtime primitive types
        const PRIMITIVE = 0x0800;
    }
}

/// A type and its declared members.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    /// Namespace, nesting and name
    pub name: TypeName,
    /// Shape and visibility
    pub kind: TypeKind,
    /// Declared generic parameter names, in order
    pub generic_params: Vec<String>,
    /// Concrete generic arguments when the descriptor is a constructed type, else empty
    pub generic_args: Vec<TypeSig>,
    /// Base types from the immediate parent up to and including the root
    pub bases: Vec<TypeSig>,
    /// Instance and static constructors
    pub constructors: Vec<MethodDescriptor>,
    /// Methods other than constructors, accessors included
    pub methods: Vec<MethodDescriptor>,
    /// Properties
    pub properties: Vec<PropertyDescriptor>,
    /// Fields, including the `value__` field of enumerations
    pub fields: Vec<FieldDescriptor>,
    /// Events
    pub events: Vec<EventDescriptor>,
}

impl TypeDescriptor {
    /// An empty descriptor of the given shape.
    #[must_use]
    pub fn new(name: TypeName, kind: TypeKind) -> Self {
        TypeDescriptor {
            name,
            kind,
            generic_params: Vec::new(),
            generic_args: Vec::new(),
            bases: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            fields: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Reflection-style full name (`N.Outer+Inner`).
    #[must_use]
    pub fn full_name(&self) -> String {
        self.name.full_name()
    }

    /// Public top-level type, or a nested type declared public.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.kind
            .intersects(TypeKind::PUBLIC | TypeKind::NESTED_PUBLIC)
    }

    /// Declares generic parameters.
    #[must_use]
    pub fn is_generic(&self) -> bool {
        !self.generic_params.is_empty()
    }

    /// The immediate base type.
    #[must_use]
    pub fn base(&self) -> Option<&TypeSig> {
        self.bases.first()
    }

    /// The type as a signature element: its generic arguments, or its own
    /// parameters for a definition.
    #[must_use]
    pub fn as_sig(&self) -> TypeSig {
        if !self.generic_args.is_empty() {
            return TypeSig::generic(self.name.clone(), self.generic_args.clone());
        }
        if self.generic_params.is_empty() {
            return TypeSig::Named(self.name.clone());
        }

        let args = self
            .generic_params
            .iter()
            .zip(0u32..)
            .map(|(name, position)| TypeSig::type_param(position, name.clone()))
            .collect();
        TypeSig::generic(self.name.clone(), args)
    }
}

/// A constructor or method.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDescriptor {
    /// Metadata name (`.ctor` for instance constructors)
    pub name: String,
    /// `MethodAttributes`
    pub attributes: MethodAttributes,
    /// Declared generic parameter names, in order
    pub generic_params: Vec<String>,
    /// Concrete generic arguments for a constructed method, else empty
    pub generic_args: Vec<TypeSig>,
    /// Decoded signature, or why it could not be decoded
    pub signature: std::result::Result<MethodSig, DecodeError>,
}

impl MethodDescriptor {
    /// A non-generic method with a decoded signature.
    pub fn new(name: impl Into<String>, attributes: MethodAttributes, signature: MethodSig) -> Self {
        MethodDescriptor {
            name: name.into(),
            attributes,
            generic_params: Vec::new(),
            generic_args: Vec::new(),
            signature: Ok(signature),
        }
    }

    /// `.ctor` or `.cctor`.
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.name == ".ctor" || self.name == ".cctor"
    }

    /// Declares generic parameters.
    #[must_use]
    pub fn is_generic(&self) -> bool {
        !self.generic_params.is_empty()
    }
}

/// Return type and parameters of a method.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSig {
    /// Return type, `System.Void` for none
    pub return_type: TypeSig,
    /// Parameters, in order
    pub params: Vec<ParamDescriptor>,
}

impl MethodSig {
    /// Signature with the given parts.
    #[must_use]
    pub fn new(return_type: TypeSig, params: Vec<ParamDescriptor>) -> Self {
        MethodSig {
            return_type,
            params,
        }
    }
}

/// A method parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDescriptor {
    /// Declared name, empty when the binary has none
    pub name: String,
    /// Parameter type; `out` and `ref` parameters are [`TypeSig::ByRef`]
    pub ty: TypeSig,
    /// `ParamAttributes`
    pub attributes: ParamAttributes,
}

impl ParamDescriptor {
    /// A parameter without attributes.
    pub fn new(name: impl Into<String>, ty: TypeSig) -> Self {
        ParamDescriptor {
            name: name.into(),
            ty,
            attributes: ParamAttributes::empty(),
        }
    }

    /// Marked `[Out]`.
    #[must_use]
    pub fn is_out(&self) -> bool {
        self.attributes.contains(ParamAttributes::OUT)
    }

    /// Marked `[Retval]`.
    #[must_use]
    pub fn is_retval(&self) -> bool {
        self.attributes.contains(ParamAttributes::RETVAL)
    }
}

/// A property.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    /// Metadata name (`Item` for the default indexer)
    pub name: String,
    /// `PropertyAttributes`
    pub attributes: PropertyAttributes,
    /// At least one accessor is public
    pub is_public: bool,
    /// Decoded signature, or why it could not be decoded
    pub signature: std::result::Result<PropertySig, DecodeError>,
}

/// Type and index parameters of a property.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySig {
    /// Property type
    pub ty: TypeSig,
    /// Index parameter types, empty for non-indexers
    pub index_params: Vec<TypeSig>,
}

/// A field; for enumerations the literals and the `value__` backing field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Metadata name
    pub name: String,
    /// `FieldAttributes`
    pub attributes: FieldAttributes,
    /// Decoded type, or why it could not be decoded
    pub ty: std::result::Result<TypeSig, DecodeError>,
}

/// An event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDescriptor {
    /// Metadata name
    pub name: String,
    /// The add accessor is public
    pub is_public: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        let outer = TypeName::new("N", "Outer`1");
        let inner = TypeName::nested(&outer, "Inner");
        assert_eq!(inner.full_name(), "N.Outer`1+Inner");
        assert_eq!(inner.key_name(), "N.Outer`1.Inner");
        assert!(inner.is_nested());
        assert_eq!(outer.bare_name(), "Outer");

        let global = TypeName::new("", "Lonely");
        assert_eq!(global.full_name(), "Lonely");
        assert!(TypeName::system("Object").is("System", "Object"));
    }

    #[test]
    fn arity() {
        assert_eq!(strip_arity("List`1"), "List");
        assert_eq!(strip_arity("Dictionary`2"), "Dictionary");
        assert_eq!(strip_arity("Plain"), "Plain");
        assert_eq!(strip_arity("Odd`"), "Odd`");
        assert_eq!(strip_arity("Odd`x"), "Odd`x");
    }

    #[test]
    fn substitute() {
        let list = TypeName::new("System.Collections.Generic", "List`1");
        let sig = TypeSig::sz_array(TypeSig::generic(
            list.clone(),
            vec![TypeSig::type_param(0, "T")],
        ));

        let int = TypeSig::system("Int32");
        let bound = sig.substitute(&[int.clone()], &[]);
        assert_eq!(bound, TypeSig::sz_array(TypeSig::generic(list, vec![int])));

        let method = TypeSig::method_param(1, "U");
        assert_eq!(method.substitute(&[], &[TypeSig::void()]), method);
    }

    #[test]
    fn descriptor_as_sig() {
        let mut ty = TypeDescriptor::new(TypeName::new("N", "Box`1"), TypeKind::CLASS);
        assert_eq!(ty.as_sig(), TypeSig::named("N", "Box`1"));

        ty.generic_params.push("T".to_string());
        assert_eq!(
            ty.as_sig(),
            TypeSig::generic(ty.name.clone(), vec![TypeSig::type_param(0, "T")])
        );
        assert!(!ty.is_visible());
    }
}
