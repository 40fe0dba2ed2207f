//! Decoded signature blobs (ECMA-335 II.23.2).

use crate::metadata::token::Token;

/// A type as written in a signature.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum TypeSignature {
    Void,
    Boolean,
    Char,
    I1,
    U1,
    I2,
    U2,
    I4,
    U4,
    I8,
    U8,
    R4,
    R8,
    String,
    /// `System.IntPtr`
    I,
    /// `System.UIntPtr`
    U,
    Object,
    TypedByRef,
    /// Unmanaged pointer to the inner type
    Ptr(Box<TypeSignature>),
    /// Managed reference to the inner type
    ByRef(Box<TypeSignature>),
    /// A value type, `TypeDefOrRefOrSpecEncoded`
    ValueType(Token),
    /// A reference type, `TypeDefOrRefOrSpecEncoded`
    Class(Token),
    /// Position of a type-level generic parameter
    GenericParamType(u32),
    /// Position of a method-level generic parameter
    GenericParamMethod(u32),
    /// General array with rank and bounds
    Array(SignatureArray),
    /// Single-dimensional, zero-based array
    SzArray(Box<TypeSignature>),
    /// Generic instantiation: the definition plus its arguments
    GenericInst(Box<TypeSignature>, Vec<TypeSignature>),
    /// Function pointer
    FnPtr(Box<SignatureMethod>),
    /// Pinned local
    Pinned(Box<TypeSignature>),
}

/// Size and lower bound of one array dimension, when the signature states them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArrayDimensions {
    /// Number of elements
    pub size: Option<u32>,
    /// Lowest valid index
    pub lower_bound: Option<u32>,
}

/// A general (`ELEMENT_TYPE_ARRAY`) array.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureArray {
    /// Element type
    pub base: Box<TypeSignature>,
    /// Number of dimensions
    pub rank: u32,
    /// Declared sizes and bounds, at most `rank` entries
    pub dimensions: Vec<ArrayDimensions>,
}

/// A parameter or return value.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureParameter {
    /// Custom modifiers preceding the type
    pub modifiers: Vec<Token>,
    /// Passed by reference
    pub by_ref: bool,
    /// The parameter type
    pub base: TypeSignature,
}

/// A method signature (`MethodDefSig`, `MethodRefSig`, `StandAloneMethodSig`).
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureMethod {
    /// Instance method
    pub has_this: bool,
    /// `this` is passed explicitly as the first parameter
    pub explicit_this: bool,
    /// `VARARG` calling convention
    pub vararg: bool,
    /// Number of generic parameters, 0 for non-generic methods
    pub param_count_generic: u32,
    /// Return value
    pub return_type: SignatureParameter,
    /// Fixed parameters
    pub params: Vec<SignatureParameter>,
}

/// A field signature.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureField {
    /// Custom modifiers preceding the type
    pub modifiers: Vec<Token>,
    /// The field type
    pub base: TypeSignature,
}

/// A property signature; `params` holds the index parameters of indexers.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureProperty {
    /// Instance property
    pub has_this: bool,
    /// Custom modifiers preceding the type
    pub modifiers: Vec<Token>,
    /// The property type
    pub base: TypeSignature,
    /// Index parameters
    pub params: Vec<SignatureParameter>,
}

/// The type described by a `TypeSpec` row.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureTypeSpec {
    /// The constructed type
    pub base: TypeSignature,
}
