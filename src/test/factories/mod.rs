//! Descriptor and sidecar factories for walker and key tests.

use crate::{
    catalogue::{MethodDescriptor, MethodSig, ParamDescriptor, TypeDescriptor, TypeKind, TypeName, TypeSig},
    metadata::typesystem::MethodAttributes,
};

/// A public class deriving from `System.Object`.
pub fn class(namespace: &str, name: &str) -> TypeDescriptor {
    let mut ty = TypeDescriptor::new(TypeName::new(namespace, name), TypeKind::CLASS | TypeKind::PUBLIC);
    ty.bases.push(TypeSig::system("Object"));
    ty
}

/// `ty` with its base chain replaced, immediate parent first.
pub fn with_bases(mut ty: TypeDescriptor, bases: Vec<TypeSig>) -> TypeDescriptor {
    ty.bases = bases;
    ty
}

/// A public instance method.
pub fn method(name: &str, return_type: TypeSig, params: Vec<ParamDescriptor>) -> MethodDescriptor {
    MethodDescriptor::new(
        name,
        MethodAttributes::PUBLIC | MethodAttributes::HIDE_BY_SIG,
        MethodSig::new(return_type, params),
    )
}

/// A parameter without attributes.
pub fn param(name: &str, ty: TypeSig) -> ParamDescriptor {
    ParamDescriptor::new(name, ty)
}

/// A sidecar document for `assembly`; each member is a key and its inner XML.
pub fn doc_xml(assembly: &str, members: &[(&str, &str)]) -> String {
    let mut xml = format!("<?xml version=\"1.0\"?>\n<doc>\n  <assembly>\n    <name>{assembly}</name>\n  </assembly>\n  <members>\n");
    for (key, body) in members {
        xml.push_str(&format!("    <member name=\"{key}\">\n      {body}\n    </member>\n"));
    }
    xml.push_str("  </members>\n</doc>\n");
    xml
}
