//! Documentation comment member keys.
//!
//! Compilers export doc comments into a sidecar XML file where every `member` element is
//! named by a key such as `M:N.C.Bar(System.Int32[],System.Collections.Generic.Dictionary{System.String,System.Int32})`.
//! This module derives the same key from the descriptors of a [`crate::catalogue::TypeCatalogue`],
//! so that the prose for a type or member can be found by exact lookup.
//!
//! # Format
//!
//! - prefix: `T:` type, `F:` field, `P:` property, `E:` event, `M:` method and constructor
//! - declaring type: namespace-qualified, nesting levels joined by `.`, generic arity kept
//!   (``N.List`1``)
//! - constructors use `#` in front of the member name (`M:N.C.#ctor`)
//! - parameter list in parentheses, omitted when empty
//! - parameter types: constructed generics as `Def{A,B}`, type parameters as `` `N ``,
//!   method parameters as ``` ``N ```, then pointer (`*`), array (`[]`, `[0:,0:]`) and by-ref
//!   (`@`) decorations, innermost first
//! - conversion operators append `~` and the return type
//!
//! # Examples
//!
//! ```rust
//! use dotdoc::catalogue::{MethodDescriptor, MethodSig, ParamDescriptor, TypeDescriptor, TypeKind, TypeName, TypeSig};
//! use dotdoc::metadata::typesystem::MethodAttributes;
//! use dotdoc::dockey::KeyEncoder;
//!
//! let ty = TypeDescriptor::new(TypeName::new("N", "C"), TypeKind::CLASS | TypeKind::PUBLIC);
//! let foo = MethodDescriptor::new(
//!     "Foo",
//!     MethodAttributes::PUBLIC,
//!     MethodSig::new(TypeSig::void(), vec![ParamDescriptor::new("value", TypeSig::system("Int32"))]),
//! );
//!
//! let encoder = KeyEncoder::default();
//! assert_eq!(encoder.type_key(&ty), "T:N.C");
//! assert_eq!(encoder.method_key(&ty, &foo)?, "M:N.C.Foo(System.Int32)");
//! # Ok::<(), dotdoc::Error>(())
//! ```

use std::fmt::Write;

use strum::{EnumCount, EnumIter};

use crate::{
    catalogue::{
        strip_arity, EventDescriptor, FieldDescriptor, MethodDescriptor, PropertyDescriptor,
        TypeDescriptor, TypeName, TypeSig,
    },
    Result,
};

const CONVERSION_OPERATORS: [&str; 2] = ["op_Explicit", "op_Implicit"];

/// The six shapes a member key takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount)]
pub enum MemberKind {
    /// `T:`
    Type,
    /// `F:`
    Field,
    /// `P:`
    Property,
    /// `E:`
    Event,
    /// `M:`
    Method,
    /// `M:` with `#` before the name
    Constructor,
}

impl MemberKind {
    /// The two-character key prefix.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            MemberKind::Type => "T:",
            MemberKind::Field => "F:",
            MemberKind::Property => "P:",
            MemberKind::Event => "E:",
            MemberKind::Method | MemberKind::Constructor => "M:",
        }
    }

    /// Shape of an existing key, by its prefix and, for `M:`, the constructor marker.
    #[must_use]
    pub fn of(key: &str) -> Option<MemberKind> {
        let (prefix, rest) = key.split_at_checked(2)?;
        Some(match prefix {
            "T:" => MemberKind::Type,
            "F:" => MemberKind::Field,
            "P:" => MemberKind::Property,
            "E:" => MemberKind::Event,
            "M:" => {
                let name_part = rest.split('(').next().unwrap_or(rest);
                if name_part.contains(".#") {
                    MemberKind::Constructor
                } else {
                    MemberKind::Method
                }
            }
            _ => return None,
        })
    }
}

/// Builds member keys.
///
/// Encoding is deterministic: the same descriptors always give the same bytes. A member
/// whose signature could not be decoded has no key and yields the decode error instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyEncoder {
    method_arity_suffix: bool,
}

impl KeyEncoder {
    /// An encoder producing plain method names.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append ``` ``N ``` to the names of generic methods, as compilers do.
    #[must_use]
    pub fn with_method_arity(mut self, enabled: bool) -> Self {
        self.method_arity_suffix = enabled;
        self
    }

    /// `T:` key of a type.
    #[must_use]
    pub fn type_key(&self, ty: &TypeDescriptor) -> String {
        let mut key = String::from(MemberKind::Type.prefix());
        key.push_str(&ty.name.key_name());
        key
    }

    /// `M:` key of a method or constructor.
    ///
    /// # Errors
    /// Returns the decode failure carried by the descriptor's signature.
    pub fn method_key(&self, ty: &TypeDescriptor, method: &MethodDescriptor) -> Result<String> {
        let signature = method.signature.as_ref().map_err(Clone::clone)?;

        let kind = if method.is_constructor() {
            MemberKind::Constructor
        } else {
            MemberKind::Method
        };

        let mut name = method.name.clone();
        if self.method_arity_suffix && method.is_generic() {
            let _ = write!(name, "``{}", method.generic_params.len());
        }

        let params: Vec<TypeSig> = signature
            .params
            .iter()
            .map(|param| substitute_param(&param.ty, &ty.generic_args, &method.generic_args))
            .collect();

        let mut key = member_key(kind, &ty.name, &name, &params);
        if CONVERSION_OPERATORS.contains(&method.name.as_str()) {
            key.push('~');
            append_type(&mut key, &signature.return_type);
        }
        Ok(key)
    }

    /// `P:` key of a property; indexers list their index parameters.
    ///
    /// # Errors
    /// Returns the decode failure carried by the descriptor's signature.
    pub fn property_key(&self, ty: &TypeDescriptor, property: &PropertyDescriptor) -> Result<String> {
        let signature = property.signature.as_ref().map_err(Clone::clone)?;
        let params: Vec<TypeSig> = signature
            .index_params
            .iter()
            .map(|param| substitute_param(param, &ty.generic_args, &[]))
            .collect();

        Ok(member_key(MemberKind::Property, &ty.name, &property.name, &params))
    }

    /// `F:` key of a field.
    #[must_use]
    pub fn field_key(&self, ty: &TypeDescriptor, field: &FieldDescriptor) -> String {
        member_key(MemberKind::Field, &ty.name, &field.name, &[])
    }

    /// `E:` key of an event.
    #[must_use]
    pub fn event_key(&self, ty: &TypeDescriptor, event: &EventDescriptor) -> String {
        member_key(MemberKind::Event, &ty.name, &event.name, &[])
    }
}

fn substitute_param(param: &TypeSig, type_args: &[TypeSig], method_args: &[TypeSig]) -> TypeSig {
    if param.is_generic_param() {
        param.substitute(type_args, method_args)
    } else {
        param.clone()
    }
}

fn member_key(kind: MemberKind, declaring: &TypeName, name: &str, params: &[TypeSig]) -> String {
    let mut key = String::from(kind.prefix());
    key.push_str(&declaring.key_name());
    key.push('.');
    match name.strip_prefix('.') {
        Some(rest) if kind == MemberKind::Constructor => {
            key.push('#');
            key.push_str(rest);
        }
        _ => key.push_str(name),
    }

    if !params.is_empty() {
        key.push('(');
        append_types(&mut key, params);
        key.push(')');
    }
    key
}

/// Encode a parameter type the way it appears inside a member key.
///
/// ```rust
/// use dotdoc::catalogue::{TypeName, TypeSig};
/// use dotdoc::dockey::encode_type;
///
/// let dictionary = TypeSig::generic(
///     TypeName::new("System.Collections.Generic", "Dictionary`2"),
///     vec![TypeSig::system("String"), TypeSig::system("Int32")],
/// );
/// assert_eq!(encode_type(&dictionary), "System.Collections.Generic.Dictionary{System.String,System.Int32}");
/// assert_eq!(encode_type(&TypeSig::by_ref(TypeSig::sz_array(TypeSig::method_param(0, "T")))), "``0[]@");
/// ```
#[must_use]
pub fn encode_type(ty: &TypeSig) -> String {
    let mut out = String::new();
    append_type(&mut out, ty);
    out
}

fn append_types(out: &mut String, types: &[TypeSig]) {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        append_type(out, ty);
    }
}

fn append_type(out: &mut String, ty: &TypeSig) {
    let (element, decorations) = reduce_to_element(ty);

    match element {
        TypeSig::Named(name) => out.push_str(&name.key_name()),
        TypeSig::Generic { definition, args } => {
            append_open_name(out, definition);
            out.push('{');
            append_types(out, args);
            out.push('}');
        }
        TypeSig::TypeParam { position, .. } => {
            let _ = write!(out, "`{position}");
        }
        TypeSig::MethodParam { position, .. } => {
            let _ = write!(out, "``{position}");
        }
        // A by-ref under a pointer or array cannot occur in valid metadata; encode it anyway.
        other => append_type(out, other),
    }

    out.push_str(&decorations);
}

/// Namespace-qualified name with every arity suffix removed.
fn append_open_name(out: &mut String, name: &TypeName) {
    if !name.namespace.is_empty() {
        out.push_str(&name.namespace);
        out.push('.');
    }
    for outer in &name.enclosing {
        out.push_str(strip_arity(outer));
        out.push('.');
    }
    out.push_str(name.bare_name());
}

/// Strip by-ref, then array, then pointer layers off `ty`.
///
/// Each stripped layer is placed in front of the decorations collected so far, except
/// by-ref which is outermost and stays last.
fn reduce_to_element(ty: &TypeSig) -> (&TypeSig, String) {
    let mut decorations = String::new();
    let mut current = ty;

    while let TypeSig::ByRef(inner) = current {
        decorations.push('@');
        current = inner;
    }

    loop {
        match current {
            TypeSig::SzArray(element) => {
                decorations.insert_str(0, "[]");
                current = element;
            }
            TypeSig::Array { element, rank } => {
                decorations.insert_str(0, &array_suffix(*rank));
                current = element;
            }
            _ => break,
        }
    }

    while let TypeSig::Pointer(inner) = current {
        decorations.insert(0, '*');
        current = inner;
    }

    (current, decorations)
}

fn array_suffix(rank: u32) -> String {
    if rank <= 1 {
        return String::from("[]");
    }

    let mut suffix = String::from("[");
    for _ in 1..rank {
        suffix.push_str("0:,");
    }
    suffix.push_str("0:]");
    suffix
}
