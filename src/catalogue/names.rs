//! Display names of types and members.
//!
//! Three renderings are produced, matching what a .NET developer sees elsewhere:
//! - the reflection `Name` (`Int32`, ``List`1``, `String[]`)
//! - the reflection `FullName` (`System.Int32`, `N.Outer+Inner`)
//! - a C#-style friendly form for generics (`System.Collections.Generic.Dictionary<string, int>`)
//!
//! Member signature strings (`Void Add(Int32, System.String)`) follow the runtime's
//! `MethodInfo.ToString()` convention.

use crate::catalogue::descriptor::{
    MethodDescriptor, MethodSig, PropertyDescriptor, PropertySig, TypeDescriptor, TypeName,
    TypeSig,
};

const PRIMITIVES: [&str; 14] = [
    "Boolean", "Char", "SByte", "Byte", "Int16", "UInt16", "Int32", "UInt32", "Int64", "UInt64",
    "IntPtr", "UIntPtr", "Single", "Double",
];

const KEYWORDS: [(&str, &str); 16] = [
    ("Boolean", "bool"),
    ("Byte", "byte"),
    ("Char", "char"),
    ("Decimal", "decimal"),
    ("Double", "double"),
    ("Int16", "short"),
    ("Int32", "int"),
    ("Int64", "long"),
    ("Object", "object"),
    ("SByte", "sbyte"),
    ("Single", "float"),
    ("String", "string"),
    ("UInt16", "ushort"),
    ("UInt32", "uint"),
    ("UInt64", "ulong"),
    ("Void", "void"),
];

/// True for the runtime primitive types (`System.Int32`, `System.Boolean`, ...).
#[must_use]
pub fn is_primitive(name: &TypeName) -> bool {
    !name.is_nested() && name.namespace == "System" && PRIMITIVES.contains(&name.name.as_str())
}

fn keyword(name: &TypeName) -> Option<&'static str> {
    if name.is_nested() || name.namespace != "System" {
        return None;
    }
    KEYWORDS
        .iter()
        .find(|(system, _)| *system == name.name)
        .map(|(_, keyword)| *keyword)
}

fn array_suffix(rank: u32) -> String {
    if rank <= 1 {
        "[*]".to_string()
    } else {
        format!("[{}]", ",".repeat(rank as usize - 1))
    }
}

/// Reflection `Type.Name`: the unqualified name with element decorations.
#[must_use]
pub fn simple_name(sig: &TypeSig) -> String {
    match sig {
        TypeSig::Named(name) | TypeSig::Generic {
            definition: name, ..
        } => name.name.clone(),
        TypeSig::TypeParam { name, .. } | TypeSig::MethodParam { name, .. } => name.clone(),
        TypeSig::SzArray(element) => format!("{}[]", simple_name(element)),
        TypeSig::Array { element, rank } => format!("{}{}", simple_name(element), array_suffix(*rank)),
        TypeSig::ByRef(inner) => format!("{}&", simple_name(inner)),
        TypeSig::Pointer(inner) => format!("{}*", simple_name(inner)),
    }
}

/// Reflection `Type.FullName`; `None` for types that mention a generic parameter,
/// which the runtime leaves without a full name.
#[must_use]
pub fn reflection_full_name(sig: &TypeSig) -> Option<String> {
    match sig {
        TypeSig::Named(name) => Some(name.full_name()),
        TypeSig::Generic { definition, args } => {
            let args = args
                .iter()
                .map(reflection_full_name)
                .collect::<Option<Vec<_>>>()?;
            Some(format!("{}[{}]", definition.full_name(), args.join(",")))
        }
        TypeSig::TypeParam { .. } | TypeSig::MethodParam { .. } => None,
        TypeSig::SzArray(element) => Some(format!("{}[]", reflection_full_name(element)?)),
        TypeSig::Array { element, rank } => Some(format!(
            "{}{}",
            reflection_full_name(element)?,
            array_suffix(*rank)
        )),
        TypeSig::ByRef(inner) => Some(format!("{}&", reflection_full_name(inner)?)),
        TypeSig::Pointer(inner) => Some(format!("{}*", reflection_full_name(inner)?)),
    }
}

/// C#-style name: keyword aliases for primitives, `<...>` argument lists, `.` between
/// nesting levels.
#[must_use]
pub fn friendly_name(sig: &TypeSig) -> String {
    match sig {
        TypeSig::Named(name) => keyword(name).map_or_else(|| name.key_name(), str::to_string),
        TypeSig::Generic { definition, args } => {
            let mut out = String::new();
            if !definition.namespace.is_empty() {
                out.push_str(&definition.namespace);
                out.push('.');
            }
            for outer in &definition.enclosing {
                out.push_str(crate::catalogue::descriptor::strip_arity(outer));
                out.push('.');
            }
            out.push_str(definition.bare_name());

            let args: Vec<String> = args.iter().map(friendly_name).collect();
            out.push('<');
            out.push_str(&args.join(", "));
            out.push('>');
            out
        }
        TypeSig::TypeParam { name, .. } | TypeSig::MethodParam { name, .. } => name.clone(),
        TypeSig::SzArray(element) => format!("{}[]", friendly_name(element)),
        TypeSig::Array { element, rank } => format!(
            "{}[{}]",
            friendly_name(element),
            ",".repeat((*rank).max(1) as usize - 1)
        ),
        TypeSig::ByRef(inner) => format!("{}&", friendly_name(inner)),
        TypeSig::Pointer(inner) => format!("{}*", friendly_name(inner)),
    }
}

fn is_nullable(sig: &TypeSig) -> bool {
    matches!(sig, TypeSig::Generic { definition, .. } if definition.is("System", "Nullable`1"))
}

/// The `Type` shown for a parameter, return value or property: the reflection name,
/// except generic parameters and `Nullable<>` which use the friendly form.
#[must_use]
pub fn type_name(sig: &TypeSig) -> String {
    if sig.is_generic_param() || is_nullable(sig) {
        friendly_name(sig)
    } else {
        simple_name(sig)
    }
}

/// The `TypeFullName` shown for a parameter, return value, property or base type: the
/// reflection full name, except generics and generic parameters which use the friendly
/// form.
#[must_use]
pub fn full_type_name(sig: &TypeSig) -> String {
    match sig {
        TypeSig::Generic { .. } | TypeSig::TypeParam { .. } | TypeSig::MethodParam { .. } => {
            friendly_name(sig)
        }
        _ => reflection_full_name(sig).unwrap_or_else(|| simple_name(sig)),
    }
}

/// Name of a type inside a member signature string: primitives, `Void` and nested
/// types print their simple name, everything else its namespace-qualified name.
#[must_use]
pub fn signature_name(sig: &TypeSig) -> String {
    match sig {
        TypeSig::Named(name) if is_primitive(name) || name.is("System", "Void") || name.is_nested() => {
            name.name.clone()
        }
        _ => qualified_name(sig),
    }
}

fn qualified_name(sig: &TypeSig) -> String {
    match sig {
        TypeSig::Named(name) => name.full_name(),
        TypeSig::Generic { definition, args } => {
            let args: Vec<String> = args.iter().map(qualified_name).collect();
            format!("{}[{}]", definition.full_name(), args.join(","))
        }
        TypeSig::TypeParam { name, .. } | TypeSig::MethodParam { name, .. } => name.clone(),
        TypeSig::SzArray(element) => format!("{}[]", qualified_name(element)),
        TypeSig::Array { element, rank } => {
            format!("{}{}", qualified_name(element), array_suffix(*rank))
        }
        TypeSig::ByRef(inner) => format!("{}&", qualified_name(inner)),
        TypeSig::Pointer(inner) => format!("{}*", qualified_name(inner)),
    }
}

/// `Name<A,B>` for a generic method, using the simple names of its arguments, or of
/// its parameters for a definition. Non-generic methods keep their name.
#[must_use]
pub fn generic_method_name(method: &MethodDescriptor) -> String {
    let args: Vec<String> = if method.generic_args.is_empty() {
        method.generic_params.clone()
    } else {
        method.generic_args.iter().map(simple_name).collect()
    };

    if args.is_empty() {
        method.name.clone()
    } else {
        format!("{}<{}>", method.name, args.join(","))
    }
}

/// Runtime-style signature of a method: `Void Add(Int32, System.String)`,
/// `T Get[T](Int32)`, `Void .ctor()`.
#[must_use]
pub fn method_fullname(method: &MethodDescriptor, signature: &MethodSig) -> String {
    let mut out = signature_name(&signature.return_type);
    out.push(' ');
    out.push_str(&method.name);

    let generic: Vec<String> = if method.generic_args.is_empty() {
        method.generic_params.clone()
    } else {
        method.generic_args.iter().map(signature_name).collect()
    };
    if !generic.is_empty() {
        out.push('[');
        out.push_str(&generic.join(","));
        out.push(']');
    }

    let params: Vec<String> = signature
        .params
        .iter()
        .map(|param| signature_name(&param.ty))
        .collect();
    out.push('(');
    out.push_str(&params.join(", "));
    out.push(')');
    out
}

/// Runtime-style signature of a property: `Int32 Count`, `String Item [Int32]`.
#[must_use]
pub fn property_fullname(property: &PropertyDescriptor, signature: &PropertySig) -> String {
    let mut out = format!("{} {}", signature_name(&signature.ty), property.name);
    if !signature.index_params.is_empty() {
        let params: Vec<String> = signature.index_params.iter().map(signature_name).collect();
        out.push_str(" [");
        out.push_str(&params.join(", "));
        out.push(']');
    }
    out
}

/// The `Fullname` of a type: friendly form for generic types, reflection full name
/// otherwise.
#[must_use]
pub fn type_fullname(ty: &TypeDescriptor) -> String {
    full_type_name(&ty.as_sig())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalogue::descriptor::ParamDescriptor,
        metadata::typesystem::{MethodAttributes, PropertyAttributes},
    };

    fn dictionary(key: TypeSig, value: TypeSig) -> TypeSig {
        TypeSig::generic(
            TypeName::new("System.Collections.Generic", "Dictionary`2"),
            vec![key, value],
        )
    }

    #[test]
    fn simple_and_full() {
        let int_array = TypeSig::sz_array(TypeSig::system("Int32"));
        assert_eq!(simple_name(&int_array), "Int32[]");
        assert_eq!(full_type_name(&int_array), "System.Int32[]");

        let by_ref = TypeSig::by_ref(TypeSig::system("String"));
        assert_eq!(simple_name(&by_ref), "String&");
        assert_eq!(type_name(&by_ref), "String&");
        assert_eq!(full_type_name(&by_ref), "System.String&");

        let grid = TypeSig::array(TypeSig::system("Double"), 2);
        assert_eq!(simple_name(&grid), "Double[,]");

        let nested = TypeSig::Named(TypeName::nested(&TypeName::new("N", "Outer"), "Inner"));
        assert_eq!(full_type_name(&nested), "N.Outer+Inner");

        let open = TypeSig::sz_array(TypeSig::type_param(0, "T"));
        assert_eq!(reflection_full_name(&open), None);
        assert_eq!(full_type_name(&open), "T[]");
    }

    #[test]
    fn friendly_generics() {
        let dict = dictionary(TypeSig::system("String"), TypeSig::system("Int32"));
        assert_eq!(simple_name(&dict), "Dictionary`2");
        assert_eq!(type_name(&dict), "Dictionary`2");
        assert_eq!(
            full_type_name(&dict),
            "System.Collections.Generic.Dictionary<string, int>"
        );

        let nullable = TypeSig::generic(TypeName::system("Nullable`1"), vec![TypeSig::system("Int32")]);
        assert_eq!(type_name(&nullable), "System.Nullable<int>");

        let param = TypeSig::method_param(0, "TResult");
        assert_eq!(type_name(&param), "TResult");
        assert_eq!(full_type_name(&param), "TResult");
    }

    #[test]
    fn method_strings() {
        let method = MethodDescriptor::new(
            "Add",
            MethodAttributes::PUBLIC,
            MethodSig::new(
                TypeSig::void(),
                vec![
                    ParamDescriptor::new("count", TypeSig::system("Int32")),
                    ParamDescriptor::new("name", TypeSig::system("String")),
                ],
            ),
        );
        let Ok(signature) = &method.signature else {
            unreachable!()
        };
        assert_eq!(method_fullname(&method, signature), "Void Add(Int32, System.String)");
        assert_eq!(generic_method_name(&method), "Add");

        let mut generic = MethodDescriptor::new(
            "Convert",
            MethodAttributes::PUBLIC,
            MethodSig::new(
                TypeSig::method_param(1, "TOut"),
                vec![ParamDescriptor::new("input", TypeSig::method_param(0, "TIn"))],
            ),
        );
        generic.generic_params = vec!["TIn".to_string(), "TOut".to_string()];
        let Ok(signature) = &generic.signature else {
            unreachable!()
        };
        assert_eq!(method_fullname(&generic, signature), "TOut Convert[TIn,TOut](TIn)");
        assert_eq!(generic_method_name(&generic), "Convert<TIn,TOut>");

        let ctor = MethodDescriptor::new(".ctor", MethodAttributes::PUBLIC, MethodSig::new(TypeSig::void(), vec![]));
        let Ok(signature) = &ctor.signature else {
            unreachable!()
        };
        assert_eq!(method_fullname(&ctor, signature), "Void .ctor()");
    }

    #[test]
    fn property_strings() {
        let property = PropertyDescriptor {
            name: "Item".to_string(),
            attributes: PropertyAttributes::empty(),
            is_public: true,
            signature: Ok(PropertySig {
                ty: TypeSig::system("String"),
                index_params: vec![TypeSig::system("Int32")],
            }),
        };
        let Ok(signature) = &property.signature else {
            unreachable!()
        };
        assert_eq!(property_fullname(&property, signature), "System.String Item [Int32]");
    }
}
