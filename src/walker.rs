//! Building the documentation tree of a binary.
//!
//! [`DocParser::parse`] loads a binary and its sidecar file, then walks every visible type:
//! the type is classified, its base chain summarized, and its constructors, methods,
//! properties and enumeration literals are documented by computing their member key and
//! looking it up in the sidecar.
//!
//! Failures are contained at the smallest scope that still yields a useful tree:
//!
//! - the binary or the sidecar cannot be loaded: the whole parse fails
//! - a type cannot be described: it is skipped
//! - a member's key or comments cannot be resolved: the member stays in the tree with
//!   `LoadError` set and the error message as its `Fullname`
//!
//! # Examples
//!
//! ```rust
//! use dotdoc::{
//!     catalogue::{AssemblyIdentity, MethodDescriptor, MethodSig, StaticCatalogue, TypeDescriptor, TypeKind, TypeName, TypeSig},
//!     comments::CommentStore,
//!     metadata::typesystem::MethodAttributes,
//!     DocParser,
//! };
//!
//! let mut ty = TypeDescriptor::new(TypeName::new("N", "C"), TypeKind::CLASS | TypeKind::PUBLIC);
//! ty.bases.push(TypeSig::system("Object"));
//! ty.methods.push(MethodDescriptor::new("Run", MethodAttributes::PUBLIC, MethodSig::new(TypeSig::void(), vec![])));
//!
//! let catalogue = StaticCatalogue::new(AssemblyIdentity::new(uguid::Guid::ZERO, "N", [1, 0, 0, 0])).with_type(ty);
//! let comments = CommentStore::from_xml(
//!     r#"<doc><members><member name="M:N.C.Run"><summary>Runs.</summary></member></members></doc>"#,
//! )?;
//!
//! let assembly = DocParser::default().walk(&catalogue, &comments, "N.dll")?;
//! let class = assembly.find_type("N.C").unwrap();
//! assert_eq!(class.methods[0].comments.summary, "Runs.");
//! # Ok::<(), dotdoc::Error>(())
//! ```

use std::{collections::HashMap, path::Path};

use crate::{
    catalogue::{
        names, CilCatalogue, FieldDescriptor, MethodDescriptor, PropertyDescriptor,
        TypeCatalogue, TypeDescriptor, TypeKind,
    },
    comments::{CommentSource, CommentStore, MemberComments},
    config::ParserConfig,
    dockey::KeyEncoder,
    model::{
        format_params, Assembly, CommentBlock, Constructor, MemberSummary, Method, Namespace,
        ObjectType, Parameter, Property, TypeBase, TypeSummary,
    },
    Result,
};

/// Backing field of every enumeration; not a literal.
const ENUM_VALUE_FIELD: &str = "value__";

/// Turns binaries into [`Assembly`] trees.
///
/// A parser holds only its configuration; every call builds a new tree and touches no
/// shared state, so one parser can serve many threads.
#[derive(Debug, Clone, Default)]
pub struct DocParser {
    config: ParserConfig,
}

impl DocParser {
    /// A parser with the given configuration.
    #[must_use]
    pub fn new(config: ParserConfig) -> Self {
        DocParser { config }
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse the binary at `path`.
    ///
    /// With `include_namespaces` the sidecar file next to the binary is loaded and every
    /// visible type is documented. Without it only the identity is read and the returned
    /// assembly has no namespaces; the sidecar is not needed.
    ///
    /// # Errors
    /// Fails if the binary cannot be loaded, or, with `include_namespaces`, if the sidecar
    /// is missing or invalid. No partial tree is returned.
    pub fn parse(&self, path: &Path, include_namespaces: bool) -> Result<Assembly> {
        let file_name = path.display().to_string();

        let catalogue = CilCatalogue::from_file(path)
            .map(|catalogue| catalogue.with_max_depth(self.config.max_signature_depth))
            .inspect_err(|error| {
                log::error!("{file_name}: failed to load binary (binary): {error}");
            })?;

        if !include_namespaces {
            return self.summarize(&catalogue, &file_name);
        }

        let sidecar = path.with_extension(&self.config.comments_extension);
        let comments = CommentStore::from_file(&sidecar).inspect_err(|error| {
            log::error!(
                "{file_name}: failed to load {} (comments): {error}",
                sidecar.display()
            );
        })?;

        self.walk(&catalogue, &comments, &file_name)
    }

    /// An assembly with identity fields only.
    ///
    /// # Errors
    /// Fails if the catalogue cannot produce its identity.
    pub fn summarize<C>(&self, catalogue: &C, file_name: &str) -> Result<Assembly>
    where
        C: TypeCatalogue + ?Sized,
    {
        let identity = catalogue.identity().inspect_err(|error| {
            log::error!("{file_name}: failed to read assembly identity (metadata): {error}");
        })?;

        Ok(Assembly {
            id: identity.mvid,
            name: identity.name.clone(),
            full_name: identity.full_name(),
            file_name: file_name.to_string(),
            namespaces: Vec::new(),
        })
    }

    /// Document every visible type of `catalogue` with the prose in `comments`.
    ///
    /// # Errors
    /// Fails only if the catalogue cannot produce its identity; type and member failures
    /// are recorded in the tree.
    pub fn walk<C, S>(&self, catalogue: &C, comments: &S, file_name: &str) -> Result<Assembly>
    where
        C: TypeCatalogue + ?Sized,
        S: CommentSource + ?Sized,
    {
        let mut assembly = self.summarize(catalogue, file_name)?;
        let walker = Walker {
            config: &self.config,
            encoder: self.config.key_encoder(),
            comments,
        };

        let mut namespaces: Vec<Namespace> = Vec::new();
        for descriptor in catalogue.visible_types() {
            let descriptor = match descriptor {
                Ok(descriptor) => descriptor,
                Err(error) => {
                    log::warn!("{file_name}: skipping type: {error}");
                    continue;
                }
            };

            let (object_type, document) = walker.document_type(&descriptor);

            let namespace_name = descriptor.name.namespace.as_str();
            let index = match namespaces.iter().position(|ns| ns.name == namespace_name) {
                Some(index) => index,
                None => {
                    namespaces.push(Namespace::new(namespace_name));
                    namespaces.len() - 1
                }
            };
            namespaces[index].list_mut(object_type).push(document);
        }

        namespaces.sort_by(|a, b| a.name.cmp(&b.name));
        for namespace in &mut namespaces {
            namespace.sort();
        }

        assembly.namespaces = namespaces;
        Ok(assembly)
    }
}

/// Pick exactly one shape, checking delegate, class, enumeration, structure and interface
/// in that order. Anything left over is listed with the delegates.
fn classify(kind: TypeKind) -> ObjectType {
    if kind.contains(TypeKind::CLASS) {
        if kind.contains(TypeKind::DELEGATE) {
            ObjectType::Delegate
        } else {
            ObjectType::Class
        }
    } else if kind.contains(TypeKind::ENUM) {
        ObjectType::Enumeration
    } else if kind.contains(TypeKind::VALUE_TYPE) {
        ObjectType::Structure
    } else if kind.contains(TypeKind::INTERFACE) {
        ObjectType::Interface
    } else {
        ObjectType::Delegate
    }
}

/// Names that occur more than once in `names`.
fn repeated<'a>(names: impl Iterator<Item = &'a str>) -> HashMap<&'a str, usize> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for name in names {
        *counts.entry(name).or_default() += 1;
    }
    counts.retain(|_, count| *count > 1);
    counts
}

/// What a hashed id is derived from: the documentation key, or the member's position in
/// its declaring type when the key cannot be spelled.
fn id_source(key: &Result<String>, ty: &TypeDescriptor, name: &str, index: usize) -> String {
    match key {
        Ok(key) => key.clone(),
        Err(_) => format!("{}.{name}@{index}", ty.full_name()),
    }
}

/// Accessors are listed as properties; operators stay methods.
fn is_accessor(method: &MethodDescriptor) -> bool {
    method.attributes.is_special_name() && !method.name.starts_with("op_")
}

/// One walk over one catalogue.
struct Walker<'w, S: ?Sized> {
    config: &'w ParserConfig,
    encoder: KeyEncoder,
    comments: &'w S,
}

impl<S: CommentSource + ?Sized> Walker<'_, S> {
    fn lookup(&self, key: &str) -> Result<Option<&MemberComments>> {
        let found = self.comments.comments(key)?;
        if found.is_none() {
            log::debug!("no documentation for {key}");
        }
        Ok(found)
    }

    fn document_type(&self, ty: &TypeDescriptor) -> (ObjectType, TypeBase) {
        let object_type = classify(ty.kind);

        let mut comments = CommentBlock::named(ty.name.name.clone());
        comments.fullname = names::type_fullname(ty);

        let key = self.encoder.type_key(ty);
        match self.lookup(&key) {
            Ok(Some(found)) => comments.apply(found),
            Ok(None) => {}
            Err(error) => {
                log::warn!("{}: comments unavailable: {error}", comments.fullname);
                comments.load_error = true;
            }
        }
        comments.assign_id(&key);

        let mut document = TypeBase::new(comments, object_type);
        document.is_public = ty.kind.contains(TypeKind::PUBLIC);
        document.is_sealed = ty.kind.contains(TypeKind::SEALED);
        document.is_abstract = ty.kind.contains(TypeKind::ABSTRACT);
        document.is_primitive = ty.kind.contains(TypeKind::PRIMITIVE);
        document.is_nested = ty.kind.contains(TypeKind::NESTED);
        document.parent_class = ty
            .base()
            .and_then(names::reflection_full_name)
            .unwrap_or_default();
        document.parents = ty
            .bases
            .iter()
            .rev()
            .map(|base| TypeSummary {
                name: names::simple_name(base),
                fullname: names::full_type_name(base),
            })
            .collect();

        let parent_id = document.comments.id.clone();
        document.constructors = self.constructors(ty, &parent_id);
        document.methods = self.methods(ty, &parent_id);
        document.properties = self.properties(ty, &parent_id);
        if object_type == ObjectType::Enumeration && self.config.include_enum_members {
            document.members = self.enum_members(ty);
        }

        (object_type, document)
    }

    fn constructors(&self, ty: &TypeDescriptor, parent_id: &str) -> Vec<Constructor> {
        let mut constructors: Vec<Constructor> = ty
            .constructors
            .iter()
            .enumerate()
            .filter(|(_, ctor)| self.config.include_non_public_constructors || ctor.attributes.is_public())
            .map(|(index, ctor)| {
                let mut comments = CommentBlock::named(ty.name.name.clone());
                comments.use_hash_code_for_id = true;

                let key = self.encoder.method_key(ty, ctor);
                let id_key = id_source(&key, ty, &ctor.name, index);
                let parameters = self
                    .method_body(ty, ctor, key, &mut comments)
                    .unwrap_or_else(|error| {
                        log::warn!("{}: constructor comments unavailable: {error}", ty.full_name());
                        comments.fail(error.to_string());
                        Vec::new()
                    });
                comments.assign_id(&id_key);

                Constructor {
                    comments,
                    parent_class: parent_id.to_string(),
                    formatted_params: format_params(&parameters),
                    parameters,
                    attributes: ctor.attributes.describe(),
                }
            })
            .collect();

        constructors.sort_by(|a, b| a.comments.name.cmp(&b.comments.name));
        constructors
    }

    fn methods(&self, ty: &TypeDescriptor, parent_id: &str) -> Vec<Method> {
        let listed: Vec<(usize, &MethodDescriptor)> = ty
            .methods
            .iter()
            .enumerate()
            .filter(|(_, method)| !is_accessor(method))
            .filter(|(_, method)| self.config.include_non_public_methods || method.attributes.is_public())
            .collect();
        let overloads = repeated(listed.iter().map(|(_, method)| method.name.as_str()));

        let mut methods: Vec<Method> = listed
            .into_iter()
            .map(|(index, method)| {
                let mut comments = CommentBlock::named(names::generic_method_name(method));
                comments.use_hash_code_for_id =
                    method.is_generic() || overloads.contains_key(method.name.as_str());

                let mut document = Method {
                    parent_class: parent_id.to_string(),
                    ..Default::default()
                };

                let key = self.encoder.method_key(ty, method);
                let id_key = id_source(&key, ty, &method.name, index);
                match self.method_body(ty, method, key, &mut comments) {
                    Ok(parameters) => {
                        if let Ok(signature) = &method.signature {
                            document.return_type = names::type_name(&signature.return_type);
                            document.return_type_full_name =
                                names::full_type_name(&signature.return_type);
                        }
                        document.formatted_params = format_params(&parameters);
                        document.parameters = parameters;
                    }
                    Err(error) => {
                        log::warn!("{}.{}: comments unavailable: {error}", ty.full_name(), method.name);
                        comments.fail(error.to_string());
                    }
                }

                comments.assign_id(&id_key);
                document.comments = comments;
                document
            })
            .collect();

        methods.sort_by(|a, b| a.comments.name.cmp(&b.comments.name));
        methods
    }

    /// Full name, prose and parameters of a constructor or method.
    fn method_body(
        &self,
        ty: &TypeDescriptor,
        method: &MethodDescriptor,
        key: Result<String>,
        comments: &mut CommentBlock,
    ) -> Result<Vec<Parameter>> {
        let signature = method.signature.as_ref().map_err(Clone::clone)?;
        comments.fullname = names::method_fullname(method, signature);

        let key = key?;
        let found = self.lookup(&key)?;
        if let Some(found) = found {
            comments.apply(found);
        }

        Ok(signature
            .params
            .iter()
            .map(|param| Parameter {
                name: param.name.clone(),
                description: found
                    .and_then(|found| found.param(&param.name))
                    .unwrap_or_default()
                    .to_string(),
                ty: names::type_name(&param.ty),
                type_full_name: names::full_type_name(&param.ty),
                attributes: param.attributes.describe(),
                is_out: param.is_out(),
                is_ret: param.is_retval(),
            })
            .collect())
    }

    fn properties(&self, ty: &TypeDescriptor, parent_id: &str) -> Vec<Property> {
        let listed: Vec<(usize, &PropertyDescriptor)> = ty
            .properties
            .iter()
            .enumerate()
            .filter(|(_, property)| self.config.include_non_public_properties || property.is_public)
            .collect();
        let overloads = repeated(listed.iter().map(|(_, property)| property.name.as_str()));

        let mut properties: Vec<Property> = listed
            .into_iter()
            .map(|(index, property)| {
                let mut comments = CommentBlock::named(property.name.clone());
                comments.use_hash_code_for_id = overloads.contains_key(property.name.as_str());

                let mut document = Property {
                    parent_class: parent_id.to_string(),
                    attributes: property.attributes.describe(),
                    ..Default::default()
                };

                let key = self.encoder.property_key(ty, property);
                let id_key = id_source(&key, ty, &property.name, index);
                let resolved = property
                    .signature
                    .as_ref()
                    .map_err(|error| crate::Error::from(error.clone()))
                    .and_then(|signature| {
                        comments.fullname = names::property_fullname(property, signature);
                        document.ty = names::type_name(&signature.ty);
                        document.type_full_name = names::full_type_name(&signature.ty);

                        let key = key?;
                        self.lookup(&key)
                    });

                match resolved {
                    Ok(Some(found)) => comments.apply(found),
                    Ok(None) => {}
                    Err(error) => {
                        log::warn!("{}.{}: comments unavailable: {error}", ty.full_name(), property.name);
                        comments.fail(error.to_string());
                    }
                }

                comments.assign_id(&id_key);
                document.comments = comments;
                document
            })
            .collect();

        properties.sort_by(|a, b| a.comments.name.cmp(&b.comments.name));
        properties
    }

    fn enum_members(&self, ty: &TypeDescriptor) -> Vec<MemberSummary> {
        let mut members: Vec<MemberSummary> = ty
            .fields
            .iter()
            .filter(|field| field.name != ENUM_VALUE_FIELD && field.attributes.is_public())
            .map(|field| MemberSummary {
                name: field.name.clone(),
                description: self.field_summary(ty, field),
            })
            .collect();

        members.sort_by(|a, b| a.name.cmp(&b.name));
        members
    }

    fn field_summary(&self, ty: &TypeDescriptor, field: &FieldDescriptor) -> String {
        let key = self.encoder.field_key(ty, field);
        match self.lookup(&key) {
            Ok(found) => found.map(|found| found.summary.clone()).unwrap_or_default(),
            Err(error) => {
                log::warn!("{}.{}: comments unavailable: {error}", ty.full_name(), field.name);
                String::new()
            }
        }
    }
}
