//! The documentation tree.
//!
//! [`crate::DocParser::parse`] produces one [`Assembly`] per binary. Ownership is strictly
//! top-down: an assembly owns its namespaces, a namespace its types, a type its members.
//! Members point back at their type through [`Constructor::parent_class`] and friends,
//! which hold the type's [`CommentBlock::id`] rather than a reference.
//!
//! Every node serializes with `serde`, field names in `PascalCase`, so the tree can be
//! handed to a web front end as JSON unchanged.
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotdoc::DocParser;
//! use std::path::Path;
//!
//! let assembly = DocParser::default().parse(Path::new("Library.dll"), true)?;
//! if let Some(ty) = assembly.find_type("Library.Widget") {
//!     for method in &ty.methods {
//!         println!("{} - {}", method.comments.name, method.comments.summary);
//!     }
//! }
//! # Ok::<(), dotdoc::Error>(())
//! ```

use serde::{ser::SerializeStruct, Serialize, Serializer};
use strum::{AsRefStr, Display, EnumCount, EnumIter};

use crate::comments::MemberComments;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Stable identifier for a member whose name is not unique within its type.
///
/// 64-bit FNV-1a over the UTF-8 bytes of `key`, as 16 lowercase hex digits. The
/// value depends only on the input, so ids survive restarts.
///
/// ```rust
/// assert_eq!(dotdoc::model::hash_id(""), "cbf29ce484222325");
/// assert_eq!(dotdoc::model::hash_id("a"), "af63dc4c8601ec8c");
/// ```
#[must_use]
pub fn hash_id(key: &str) -> String {
    let hash = key.bytes().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    });
    format!("{hash:016x}")
}

/// One binary and its documented API.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Assembly {
    /// Module version id of the binary
    pub id: uguid::Guid,
    /// Simple assembly name
    pub name: String,
    /// Display name with version, culture and public key token
    pub full_name: String,
    /// Path the binary was loaded from
    pub file_name: String,
    /// Namespaces sorted by name; empty in lightweight mode
    pub namespaces: Vec<Namespace>,
}

impl Assembly {
    /// First type whose [`CommentBlock::fullname`] equals `full_name`, in namespace order.
    #[must_use]
    pub fn find_type(&self, full_name: &str) -> Option<&TypeBase> {
        self.namespaces
            .iter()
            .flat_map(Namespace::types)
            .find(|ty| ty.comments.fullname == full_name)
    }

    /// The namespace called `name`.
    #[must_use]
    pub fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.namespaces.iter().find(|ns| ns.name == name)
    }
}

/// Types sharing a namespace, split by shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Namespace {
    /// Namespace name, empty for the global namespace
    pub name: String,
    /// Classes
    pub classes: Vec<TypeBase>,
    /// Interfaces
    pub interfaces: Vec<TypeBase>,
    /// Structures
    pub structures: Vec<TypeBase>,
    /// Enumerations
    pub enumerations: Vec<TypeBase>,
    /// Delegates
    pub delegates: Vec<TypeBase>,
}

impl Namespace {
    /// An empty namespace.
    pub fn new(name: impl Into<String>) -> Self {
        Namespace {
            name: name.into(),
            ..Default::default()
        }
    }

    /// The list holding types of `object_type`.
    pub fn list_mut(&mut self, object_type: ObjectType) -> &mut Vec<TypeBase> {
        match object_type {
            ObjectType::Class => &mut self.classes,
            ObjectType::Interface => &mut self.interfaces,
            ObjectType::Structure => &mut self.structures,
            ObjectType::Enumeration => &mut self.enumerations,
            ObjectType::Delegate => &mut self.delegates,
        }
    }

    /// Every type, list by list.
    pub fn types(&self) -> impl Iterator<Item = &TypeBase> {
        self.classes
            .iter()
            .chain(&self.interfaces)
            .chain(&self.structures)
            .chain(&self.enumerations)
            .chain(&self.delegates)
    }

    /// Every type, sorted by name.
    #[must_use]
    pub fn all_types(&self) -> Vec<&TypeBase> {
        let mut all: Vec<&TypeBase> = self.types().collect();
        all.sort_by(|a, b| a.comments.name.cmp(&b.comments.name));
        all
    }

    /// Number of types in all lists.
    #[must_use]
    pub fn count_all_types(&self) -> usize {
        self.classes.len()
            + self.interfaces.len()
            + self.structures.len()
            + self.enumerations.len()
            + self.delegates.len()
    }

    /// Sort every list by name.
    pub fn sort(&mut self) {
        for list in [
            &mut self.classes,
            &mut self.interfaces,
            &mut self.structures,
            &mut self.enumerations,
            &mut self.delegates,
        ] {
            list.sort_by(|a, b| a.comments.name.cmp(&b.comments.name));
        }
    }
}

impl Serialize for Namespace {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Namespace", 8)?;
        state.serialize_field("Name", &self.name)?;
        state.serialize_field("Classes", &self.classes)?;
        state.serialize_field("Interfaces", &self.interfaces)?;
        state.serialize_field("Structures", &self.structures)?;
        state.serialize_field("Enumerations", &self.enumerations)?;
        state.serialize_field("Delegates", &self.delegates)?;
        state.serialize_field("AllTypes", &self.all_types())?;
        state.serialize_field("CountAlltype", &self.count_all_types())?;
        state.end()
    }
}

/// The prose and identity shared by types and members.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CommentBlock {
    /// Display name
    pub name: String,
    /// Display signature, or the error message when [`CommentBlock::load_error`] is set
    pub fullname: String,
    /// `<summary>`
    pub summary: String,
    /// `<remarks>`
    pub remarks: String,
    /// `<returns>`
    pub returns: String,
    /// `<example>`
    pub example: String,
    /// `<exception>` entries
    pub exceptions: Vec<ExceptionSummary>,
    /// Identify by [`hash_id`] of the documentation key instead of the display name
    #[serde(skip)]
    pub use_hash_code_for_id: bool,
    /// Unique within the parent; set by [`CommentBlock::assign_id`]
    pub id: String,
    /// Resolving the documentation of this node failed
    pub load_error: bool,
}

impl CommentBlock {
    /// A block with only a display name.
    pub fn named(name: impl Into<String>) -> Self {
        CommentBlock {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Copy the prose of a `member` element.
    pub fn apply(&mut self, comments: &MemberComments) {
        self.summary.clone_from(&comments.summary);
        self.remarks.clone_from(&comments.remarks);
        self.returns.clone_from(&comments.returns);
        self.example.clone_from(&comments.example);
        self.exceptions = comments
            .exceptions
            .iter()
            .map(|exception| ExceptionSummary {
                cref: exception.cref.clone(),
                description: exception.description.clone(),
            })
            .collect();
    }

    /// Mark the block as failed, keeping `message` in place of the full name.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.load_error = true;
        self.fullname = message.into();
    }

    /// Derive [`CommentBlock::id`] from the display name, or from `key` when the block
    /// uses hashed ids.
    ///
    /// `key` must be unique within the parent. Members pass their documentation key, or a
    /// positional stand-in when the key cannot be spelled.
    pub fn assign_id(&mut self, key: &str) {
        self.id = if self.use_hash_code_for_id {
            hash_id(key)
        } else {
            self.name.clone()
        };
    }
}

/// An `<exception>` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExceptionSummary {
    /// Exception type key, e.g. `T:System.ArgumentException`
    pub cref: String,
    /// Trimmed text
    pub description: String,
}

/// The five shapes a documented type takes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, AsRefStr, EnumIter, EnumCount,
)]
pub enum ObjectType {
    /// Reference type
    Class,
    /// Interface
    Interface,
    /// Value type
    Structure,
    /// Enumeration
    Enumeration,
    /// Delegate
    Delegate,
}

/// A documented type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TypeBase {
    /// Name, prose and id
    #[serde(flatten)]
    pub comments: CommentBlock,
    /// Full name of the immediate base type, empty when there is none
    pub parent_class: String,
    /// Base types, root first, immediate parent last
    pub parents: Vec<TypeSummary>,
    /// Shape
    pub object_type: ObjectType,
    /// Top-level public
    pub is_public: bool,
    /// Sealed
    pub is_sealed: bool,
    /// Abstract
    pub is_abstract: bool,
    /// Runtime primitive
    pub is_primitive: bool,
    /// Declared inside another type
    pub is_nested: bool,
    /// Constructors sorted by name
    pub constructors: Vec<Constructor>,
    /// Methods sorted by name
    pub methods: Vec<Method>,
    /// Properties sorted by name
    pub properties: Vec<Property>,
    /// Enumeration literals sorted by name; empty for other shapes
    pub members: Vec<MemberSummary>,
}

/// A member found by [`TypeBase::find_member`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MemberRef<'a> {
    /// Constructor
    Constructor(&'a Constructor),
    /// Method
    Method(&'a Method),
    /// Property
    Property(&'a Property),
}

impl MemberRef<'_> {
    /// The member's comment block.
    #[must_use]
    pub fn comments(&self) -> &CommentBlock {
        match self {
            MemberRef::Constructor(constructor) => &constructor.comments,
            MemberRef::Method(method) => &method.comments,
            MemberRef::Property(property) => &property.comments,
        }
    }
}

impl TypeBase {
    /// A type with no members.
    #[must_use]
    pub fn new(comments: CommentBlock, object_type: ObjectType) -> Self {
        TypeBase {
            comments,
            parent_class: String::new(),
            parents: Vec::new(),
            object_type,
            is_public: false,
            is_sealed: false,
            is_abstract: false,
            is_primitive: false,
            is_nested: false,
            constructors: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            members: Vec::new(),
        }
    }

    /// The constructor with id `id`.
    #[must_use]
    pub fn find_constructor(&self, id: &str) -> Option<&Constructor> {
        self.constructors.iter().find(|c| c.comments.id == id)
    }

    /// The method with id `id`.
    #[must_use]
    pub fn find_method(&self, id: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.comments.id == id)
    }

    /// The property with id `id`.
    #[must_use]
    pub fn find_property(&self, id: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.comments.id == id)
    }

    /// The constructor, method or property with id `id`, searched in that order.
    #[must_use]
    pub fn find_member(&self, id: &str) -> Option<MemberRef<'_>> {
        self.find_constructor(id)
            .map(MemberRef::Constructor)
            .or_else(|| self.find_method(id).map(MemberRef::Method))
            .or_else(|| self.find_property(id).map(MemberRef::Property))
    }
}

/// A constructor.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Constructor {
    /// Name, prose and id
    #[serde(flatten)]
    pub comments: CommentBlock,
    /// Id of the declaring type
    pub parent_class: String,
    /// Parameters in declaration order
    pub parameters: Vec<Parameter>,
    /// Parameter types joined with `,`
    #[serde(rename = "formatedParams")]
    pub formatted_params: String,
    /// Method attribute flags, e.g. `Public, HideBySig, SpecialName, RTSpecialName`
    pub attributes: String,
}

/// A method.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Method {
    /// Name, prose and id
    #[serde(flatten)]
    pub comments: CommentBlock,
    /// Id of the declaring type
    pub parent_class: String,
    /// Parameters in declaration order
    pub parameters: Vec<Parameter>,
    /// Parameter types joined with `,`
    #[serde(rename = "formatedParams")]
    pub formatted_params: String,
    /// Display name of the return type
    pub return_type: String,
    /// Full name of the return type
    pub return_type_full_name: String,
}

/// A property.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Property {
    /// Name, prose and id
    #[serde(flatten)]
    pub comments: CommentBlock,
    /// Id of the declaring type
    pub parent_class: String,
    /// Display name of the property type
    #[serde(rename = "Type")]
    pub ty: String,
    /// Full name of the property type
    pub type_full_name: String,
    /// Property attribute flags, `None` for plain properties
    pub attributes: String,
}

/// A constructor or method parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Parameter {
    /// Declared name
    pub name: String,
    /// Text of the matching `<param>` element
    pub description: String,
    /// Display name of the parameter type
    #[serde(rename = "Type")]
    pub ty: String,
    /// Full name of the parameter type
    pub type_full_name: String,
    /// Parameter attribute flags
    pub attributes: String,
    /// `[Out]`
    pub is_out: bool,
    /// `[Retval]`
    pub is_ret: bool,
}

/// Parameter types joined with `,`.
#[must_use]
pub fn format_params(parameters: &[Parameter]) -> String {
    parameters
        .iter()
        .map(|parameter| parameter.ty.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// Name and full name of a base type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TypeSummary {
    /// Display name
    pub name: String,
    /// Full name
    pub fullname: String,
}

/// An enumeration literal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MemberSummary {
    /// Literal name
    pub name: String,
    /// `<summary>` of the literal
    pub description: String,
}
