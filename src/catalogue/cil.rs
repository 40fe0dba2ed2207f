//! A [`TypeCatalogue`] over the ECMA-335 metadata of a PE image.
//!
//! Descriptors are built on demand from the `TypeDef` rows and the member runs hanging
//! off them. Lookups that need a whole table scan (nesting, generic parameters,
//! property and event ownership, accessors) are indexed once when the catalogue is
//! created.

use std::{collections::HashMap, ops::Range, path::Path};

use sha1::{Digest, Sha1};

use crate::{
    catalogue::{
        names::is_primitive, AssemblyIdentity, EventDescriptor, FieldDescriptor,
        MethodDescriptor, MethodSig, ParamDescriptor, PropertyDescriptor, PropertySig,
        TypeCatalogue, TypeDescriptor, TypeKind, TypeName, TypeSig,
    },
    error::DecodeError,
    metadata::{
        signatures::{SignatureParameter, SignatureParser, TypeSignature, MAX_RECURSION_DEPTH},
        tables::{
            AssemblyRaw, EventMapRaw, EventRaw, FieldRaw, GenericParamRaw,
            MethodDefRaw, MethodSemanticsRaw, ModuleRaw, NestedClassRaw, ParamRaw,
            PropertyMapRaw, PropertyRaw, TableId, TypeDefRaw, TypeRefRaw, TypeSpecRaw,
        },
        token::Token,
        typesystem::{
            FieldAttributes, MethodAttributes, ParamAttributes, PropertyAttributes,
            TypeAttributes,
        },
        view::AssemblyView,
    },
    Error,
    Error::TypeNotFound,
    Result,
};

/// Enclosing and base chains longer than this are treated as cycles.
const MAX_CHAIN: usize = 64;

/// Names of the generic parameters in scope while converting a signature.
#[derive(Clone, Copy, Default)]
struct GenericScope<'s> {
    type_params: &'s [String],
    method_params: &'s [String],
}

impl GenericScope<'_> {
    fn type_param(&self, position: u32) -> TypeSig {
        let name = self
            .type_params
            .get(position as usize)
            .cloned()
            .unwrap_or_else(|| format!("!{position}"));
        TypeSig::type_param(position, name)
    }

    fn method_param(&self, position: u32) -> TypeSig {
        let name = self
            .method_params
            .get(position as usize)
            .cloned()
            .unwrap_or_else(|| format!("!!{position}"));
        TypeSig::method_param(position, name)
    }
}

/// Table-wide lookups, computed once.
#[derive(Default)]
struct MetadataIndex {
    /// Nested `TypeDef` row to its enclosing row
    enclosing: HashMap<u32, u32>,
    /// `TypeDef` row to its generic parameter names
    type_generics: HashMap<u32, Vec<String>>,
    /// `MethodDef` row to its generic parameter names
    method_generics: HashMap<u32, Vec<String>>,
    /// `TypeDef` row to its run in the `Property` table
    property_runs: HashMap<u32, Range<u32>>,
    /// `TypeDef` row to its run in the `Event` table
    event_runs: HashMap<u32, Range<u32>>,
    /// Accessor `MethodDef` rows of each property and event
    accessors: HashMap<(TableId, u32), Vec<u32>>,
}

impl MetadataIndex {
    fn build(view: &AssemblyView) -> Result<Self> {
        let tables = view.tables();
        let strings = view.strings();
        let mut index = MetadataIndex::default();

        if let Some(nested) = tables.table::<NestedClassRaw>() {
            for row in &nested {
                index.enclosing.insert(row.nested_class, row.enclosing_class);
            }
        }

        if let Some(params) = tables.table::<GenericParamRaw>() {
            let mut owners: HashMap<(TableId, u32), Vec<(u16, String)>> = HashMap::new();
            for row in &params {
                let name = strings.get(row.name as usize)?.to_string();
                owners
                    .entry((row.owner.tag, row.owner.row))
                    .or_default()
                    .push((row.number, name));
            }

            for ((table, row), mut params) in owners {
                params.sort_by_key(|(number, _)| *number);
                let names = params.into_iter().map(|(_, name)| name).collect();
                match table {
                    TableId::TypeDef => index.type_generics.insert(row, names),
                    TableId::MethodDef => index.method_generics.insert(row, names),
                    _ => None,
                };
            }
        }

        if let Some(maps) = tables.table::<PropertyMapRaw>() {
            let total = tables.table::<PropertyRaw>().map_or(0, |t| t.row_count());
            let starts: Vec<(u32, u32)> = maps.iter().map(|m| (m.parent, m.property_list)).collect();
            index.property_runs = owned_runs(&starts, total);
        }

        if let Some(maps) = tables.table::<EventMapRaw>() {
            let total = tables.table::<EventRaw>().map_or(0, |t| t.row_count());
            let starts: Vec<(u32, u32)> = maps.iter().map(|m| (m.parent, m.event_list)).collect();
            index.event_runs = owned_runs(&starts, total);
        }

        if let Some(semantics) = tables.table::<MethodSemanticsRaw>() {
            for row in &semantics {
                index
                    .accessors
                    .entry((row.association.tag, row.association.row))
                    .or_default()
                    .push(row.method);
            }
        }

        Ok(index)
    }
}

/// A run of rows `[start, end)` clamped to a table of `total` rows.
fn run(start: u32, end: u32, total: u32) -> Range<u32> {
    let start = start.max(1);
    let end = end.min(total + 1);
    start..end.max(start)
}

/// Runs of a map table whose rows name an owner and the first row of its run.
fn owned_runs(starts: &[(u32, u32)], total: u32) -> HashMap<u32, Range<u32>> {
    starts
        .iter()
        .enumerate()
        .map(|(i, (owner, start))| {
            let end = starts.get(i + 1).map_or(total + 1, |(_, next)| *next);
            (*owner, run(*start, end, total))
        })
        .collect()
}

/// Descriptors read from the metadata of one binary.
pub struct CilCatalogue {
    view: AssemblyView,
    index: MetadataIndex,
    max_depth: usize,
}

impl CilCatalogue {
    /// Load the binary at `path`.
    ///
    /// # Errors
    /// Fails if the file cannot be read or its metadata is malformed.
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::new(AssemblyView::from_file(path)?)
    }

    /// Load a binary that is already in memory.
    ///
    /// # Errors
    /// Fails if the data is not a managed PE image.
    pub fn from_mem(data: Vec<u8>) -> Result<Self> {
        Self::new(AssemblyView::from_mem(data)?)
    }

    /// Wrap a parsed view.
    ///
    /// # Errors
    /// Fails if the generic parameter names cannot be read.
    pub fn new(view: AssemblyView) -> Result<Self> {
        let index = MetadataIndex::build(&view)?;
        Ok(CilCatalogue {
            view,
            index,
            max_depth: MAX_RECURSION_DEPTH,
        })
    }

    /// Limit the nesting depth accepted in signature blobs.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The underlying metadata view.
    #[must_use]
    pub fn view(&self) -> &AssemblyView {
        &self.view
    }

    fn string(&self, index: u32) -> Result<&str> {
        self.view.strings().get(index as usize)
    }

    fn blob(&self, index: u32) -> Result<&[u8]> {
        match self.view.blobs() {
            Some(blobs) => blobs.get(index as usize),
            None => Err(malformed_error!("Metadata has no #Blob heap")),
        }
    }

    fn typedef(&self, rid: u32) -> Result<TypeDefRaw> {
        self.view
            .tables()
            .table::<TypeDefRaw>()
            .and_then(|table| table.get(rid))
            .ok_or_else(|| TypeNotFound(Token::from_parts(TableId::TypeDef as u8, rid)))
    }

    fn type_generics(&self, rid: u32) -> &[String] {
        self.index
            .type_generics
            .get(&rid)
            .map_or(&[], Vec::as_slice)
    }

    fn typedef_name(&self, rid: u32) -> Result<TypeName> {
        let mut chain = Vec::new();
        let mut current = rid;
        loop {
            if chain.len() >= MAX_CHAIN {
                return Err(malformed_error!("Nesting of type row {} does not terminate", rid));
            }
            chain.push(self.typedef(current)?);
            match self.index.enclosing.get(&current) {
                Some(outer) => current = *outer,
                None => break,
            }
        }

        let mut rows = chain.iter().rev();
        let Some(outermost) = rows.next() else {
            return Err(TypeNotFound(Token::from_parts(TableId::TypeDef as u8, rid)));
        };

        let mut name = TypeName::new(
            self.string(outermost.type_namespace)?,
            self.string(outermost.type_name)?,
        );
        for row in rows {
            name = TypeName::nested(&name, self.string(row.type_name)?);
        }
        Ok(name)
    }

    fn typeref_name(&self, rid: u32) -> Result<TypeName> {
        let refs = self.view.tables().table::<TypeRefRaw>();
        let mut chain = Vec::new();
        let mut current = rid;
        loop {
            if chain.len() >= MAX_CHAIN {
                return Err(malformed_error!("Nesting of type reference {} does not terminate", rid));
            }
            let row = refs
                .as_ref()
                .and_then(|table| table.get(current))
                .ok_or_else(|| TypeNotFound(Token::from_parts(TableId::TypeRef as u8, current)))?;
            let scope = row.resolution_scope;
            chain.push(row);
            if scope.tag == TableId::TypeRef && scope.row != 0 {
                current = scope.row;
            } else {
                break;
            }
        }

        let mut rows = chain.iter().rev();
        let Some(outermost) = rows.next() else {
            return Err(TypeNotFound(Token::from_parts(TableId::TypeRef as u8, rid)));
        };

        let mut name = TypeName::new(
            self.string(outermost.type_namespace)?,
            self.string(outermost.type_name)?,
        );
        for row in rows {
            name = TypeName::nested(&name, self.string(row.type_name)?);
        }
        Ok(name)
    }

    fn typespec(&self, rid: u32, scope: GenericScope<'_>, depth: usize) -> Result<TypeSig> {
        let row = self
            .view
            .tables()
            .table::<TypeSpecRaw>()
            .and_then(|table| table.get(rid))
            .ok_or_else(|| TypeNotFound(Token::from_parts(TableId::TypeSpec as u8, rid)))?;

        let spec = SignatureParser::with_max_depth(self.blob(row.signature)?, self.max_depth)
            .parse_type_spec_signature()?;
        self.convert(&spec.base, scope, depth + 1)
    }

    fn resolve_token(&self, token: Token, scope: GenericScope<'_>, depth: usize) -> Result<TypeSig> {
        match token.table() {
            0x02 => Ok(TypeSig::Named(self.typedef_name(token.row())?)),
            0x01 => Ok(TypeSig::Named(self.typeref_name(token.row())?)),
            0x1B => self.typespec(token.row(), scope, depth),
            _ => Err(TypeNotFound(token)),
        }
    }

    fn convert(&self, sig: &TypeSignature, scope: GenericScope<'_>, depth: usize) -> Result<TypeSig> {
        if depth > self.max_depth {
            return Err(crate::Error::RecursionLimit(self.max_depth));
        }

        let next = depth + 1;
        Ok(match sig {
            TypeSignature::Void => TypeSig::system("Void"),
            TypeSignature::Boolean => TypeSig::system("Boolean"),
            TypeSignature::Char => TypeSig::system("Char"),
            TypeSignature::I1 => TypeSig::system("SByte"),
            TypeSignature::U1 => TypeSig::system("Byte"),
            TypeSignature::I2 => TypeSig::system("Int16"),
            TypeSignature::U2 => TypeSig::system("UInt16"),
            TypeSignature::I4 => TypeSig::system("Int32"),
            TypeSignature::U4 => TypeSig::system("UInt32"),
            TypeSignature::I8 => TypeSig::system("Int64"),
            TypeSignature::U8 => TypeSig::system("UInt64"),
            TypeSignature::R4 => TypeSig::system("Single"),
            TypeSignature::R8 => TypeSig::system("Double"),
            TypeSignature::String => TypeSig::system("String"),
            TypeSignature::I | TypeSignature::FnPtr(_) => TypeSig::system("IntPtr"),
            TypeSignature::U => TypeSig::system("UIntPtr"),
            TypeSignature::Object => TypeSig::system("Object"),
            TypeSignature::TypedByRef => TypeSig::system("TypedReference"),
            TypeSignature::Ptr(inner) => TypeSig::pointer(self.convert(inner, scope, next)?),
            TypeSignature::ByRef(inner) => TypeSig::by_ref(self.convert(inner, scope, next)?),
            TypeSignature::Pinned(inner) => self.convert(inner, scope, next)?,
            TypeSignature::ValueType(token) | TypeSignature::Class(token) => {
                self.resolve_token(*token, scope, next)?
            }
            TypeSignature::GenericParamType(position) => scope.type_param(*position),
            TypeSignature::GenericParamMethod(position) => scope.method_param(*position),
            TypeSignature::SzArray(element) => TypeSig::sz_array(self.convert(element, scope, next)?),
            TypeSignature::Array(array) => {
                TypeSig::array(self.convert(&array.base, scope, next)?, array.rank)
            }
            TypeSignature::GenericInst(definition, args) => {
                let definition = match self.convert(definition, scope, next)? {
                    TypeSig::Named(name) => name,
                    other => {
                        return Err(malformed_error!(
                            "Generic instantiation of a non-type - {:?}",
                            other
                        ))
                    }
                };
                let args = args
                    .iter()
                    .map(|arg| self.convert(arg, scope, next))
                    .collect::<Result<Vec<_>>>()?;
                TypeSig::generic(definition, args)
            }
        })
    }

    fn convert_param(&self, param: &SignatureParameter, scope: GenericScope<'_>) -> Result<TypeSig> {
        let ty = self.convert(&param.base, scope, 0)?;
        Ok(if param.by_ref { TypeSig::by_ref(ty) } else { ty })
    }

    /// Base types from the immediate parent to the root, arguments substituted through
    /// generic bases.
    fn base_chain(&self, row: &TypeDefRaw) -> Result<Vec<TypeSig>> {
        let mut bases = Vec::new();
        let mut extends = row.extends;
        let mut owner = row.rid;
        let mut args: Vec<TypeSig> = Vec::new();

        while extends.row != 0 {
            if bases.len() >= MAX_CHAIN {
                return Err(malformed_error!("Base chain of type row {} does not terminate", row.rid));
            }

            let scope = GenericScope {
                type_params: self.type_generics(owner),
                method_params: &[],
            };

            let next_def = match extends.tag {
                TableId::TypeDef => {
                    bases.push(TypeSig::Named(self.typedef_name(extends.row)?));
                    args.clear();
                    Some(extends.row)
                }
                TableId::TypeRef => {
                    let name = self.typeref_name(extends.row)?;
                    bases.push(TypeSig::Named(name.clone()));
                    complete_framework_chain(&name, &mut bases);
                    None
                }
                TableId::TypeSpec => {
                    let (base, definition) = self.generic_base(extends.row, scope)?;
                    let base = base.substitute(&args, &[]);
                    args = match &base {
                        TypeSig::Generic { args, .. } => args.clone(),
                        _ => Vec::new(),
                    };
                    bases.push(base.clone());

                    match definition {
                        Some(rid) => Some(rid),
                        None => {
                            if let Some(name) = base.type_name() {
                                complete_framework_chain(name, &mut bases);
                            }
                            None
                        }
                    }
                }
                _ => return Err(TypeNotFound(extends.token)),
            };

            let Some(definition) = next_def else {
                break;
            };
            extends = self.typedef(definition)?.extends;
            owner = definition;
        }

        Ok(bases)
    }

    /// A `TypeSpec` base class and, when its definition lives in this binary, that
    /// definition's row.
    fn generic_base(&self, rid: u32, scope: GenericScope<'_>) -> Result<(TypeSig, Option<u32>)> {
        let row = self
            .view
            .tables()
            .table::<TypeSpecRaw>()
            .and_then(|table| table.get(rid))
            .ok_or_else(|| TypeNotFound(Token::from_parts(TableId::TypeSpec as u8, rid)))?;
        let spec = SignatureParser::with_max_depth(self.blob(row.signature)?, self.max_depth)
            .parse_type_spec_signature()?;

        let definition = match &spec.base {
            TypeSignature::GenericInst(inner, _) => match inner.as_ref() {
                TypeSignature::Class(token) | TypeSignature::ValueType(token)
                    if token.table() == 0x02 =>
                {
                    Some(token.row())
                }
                _ => None,
            },
            _ => None,
        };

        Ok((self.convert(&spec.base, scope, 0)?, definition))
    }

    fn method_run(&self, row: &TypeDefRaw) -> Range<u32> {
        let tables = self.view.tables();
        let total = tables.table::<MethodDefRaw>().map_or(0, |t| t.row_count());
        let end = tables
            .table::<TypeDefRaw>()
            .and_then(|t| t.get(row.rid + 1))
            .map_or(total + 1, |next| next.method_list);
        run(row.method_list, end, total)
    }

    fn field_run(&self, row: &TypeDefRaw) -> Range<u32> {
        let tables = self.view.tables();
        let total = tables.table::<FieldRaw>().map_or(0, |t| t.row_count());
        let end = tables
            .table::<TypeDefRaw>()
            .and_then(|t| t.get(row.rid + 1))
            .map_or(total + 1, |next| next.field_list);
        run(row.field_list, end, total)
    }

    fn param_run(&self, row: &MethodDefRaw) -> Range<u32> {
        let tables = self.view.tables();
        let total = tables.table::<ParamRaw>().map_or(0, |t| t.row_count());
        let end = tables
            .table::<MethodDefRaw>()
            .and_then(|t| t.get(row.rid + 1))
            .map_or(total + 1, |next| next.param_list);
        run(row.param_list, end, total)
    }

    fn method_signature(
        &self,
        row: &MethodDefRaw,
        scope: GenericScope<'_>,
    ) -> Result<MethodSig> {
        let signature = SignatureParser::with_max_depth(self.blob(row.signature)?, self.max_depth)
            .parse_method_signature()?;

        let mut declared: HashMap<u16, (String, ParamAttributes)> = HashMap::new();
        if let Some(params) = self.view.tables().table::<ParamRaw>() {
            for rid in self.param_run(row) {
                if let Some(param) = params.get(rid) {
                    declared.insert(
                        param.sequence,
                        (
                            self.string(param.name)?.to_string(),
                            ParamAttributes::from_bits_retain(param.flags),
                        ),
                    );
                }
            }
        }

        let return_type = self.convert_param(&signature.return_type, scope)?;
        let params = signature
            .params
            .iter()
            .zip(1u16..)
            .map(|(param, sequence)| {
                let (name, attributes) = declared
                    .remove(&sequence)
                    .unwrap_or_else(|| (String::new(), ParamAttributes::empty()));
                Ok(ParamDescriptor {
                    name,
                    ty: self.convert_param(param, scope)?,
                    attributes,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(MethodSig::new(return_type, params))
    }

    fn methods(&self, row: &TypeDefRaw) -> Result<Vec<MethodDescriptor>> {
        let Some(table) = self.view.tables().table::<MethodDefRaw>() else {
            return Ok(Vec::new());
        };

        let mut methods = Vec::new();
        for rid in self.method_run(row) {
            let method = table
                .get(rid)
                .ok_or_else(|| TypeNotFound(Token::from_parts(TableId::MethodDef as u8, rid)))?;
            let generic_params = self
                .index
                .method_generics
                .get(&rid)
                .cloned()
                .unwrap_or_default();

            let scope = GenericScope {
                type_params: self.type_generics(row.rid),
                method_params: &generic_params,
            };
            let signature = self
                .method_signature(&method, scope)
                .map_err(DecodeError::from);

            methods.push(MethodDescriptor {
                name: self.string(method.name)?.to_string(),
                attributes: MethodAttributes::from_bits_retain(method.flags),
                generic_params,
                generic_args: Vec::new(),
                signature,
            });
        }
        Ok(methods)
    }

    fn fields(&self, row: &TypeDefRaw) -> Result<Vec<FieldDescriptor>> {
        let Some(table) = self.view.tables().table::<FieldRaw>() else {
            return Ok(Vec::new());
        };

        let scope = GenericScope {
            type_params: self.type_generics(row.rid),
            method_params: &[],
        };

        let mut fields = Vec::new();
        for rid in self.field_run(row) {
            let field = table
                .get(rid)
                .ok_or_else(|| TypeNotFound(Token::from_parts(TableId::Field as u8, rid)))?;

            let ty = self
                .blob(field.signature)
                .and_then(|blob| {
                    SignatureParser::with_max_depth(blob, self.max_depth).parse_field_signature()
                })
                .and_then(|sig| self.convert(&sig.base, scope, 0))
                .map_err(DecodeError::from);

            fields.push(FieldDescriptor {
                name: self.string(field.name)?.to_string(),
                attributes: FieldAttributes::from_bits_retain(field.flags),
                ty,
            });
        }
        Ok(fields)
    }

    fn has_public_accessor(&self, owner: TableId, rid: u32) -> bool {
        let Some(methods) = self.view.tables().table::<MethodDefRaw>() else {
            return false;
        };

        self.index
            .accessors
            .get(&(owner, rid))
            .is_some_and(|accessors| {
                accessors.iter().any(|method| {
                    methods
                        .get(*method)
                        .is_some_and(|m| MethodAttributes::from_bits_retain(m.flags).is_public())
                })
            })
    }

    fn properties(&self, row: &TypeDefRaw) -> Result<Vec<PropertyDescriptor>> {
        let (Some(table), Some(range)) = (
            self.view.tables().table::<PropertyRaw>(),
            self.index.property_runs.get(&row.rid),
        ) else {
            return Ok(Vec::new());
        };

        let scope = GenericScope {
            type_params: self.type_generics(row.rid),
            method_params: &[],
        };

        let mut properties = Vec::new();
        for rid in range.clone() {
            let property = table
                .get(rid)
                .ok_or_else(|| TypeNotFound(Token::from_parts(TableId::Property as u8, rid)))?;

            let signature = self
                .blob(property.signature)
                .and_then(|blob| {
                    SignatureParser::with_max_depth(blob, self.max_depth)
                        .parse_property_signature()
                })
                .and_then(|sig| {
                    let ty = self.convert(&sig.base, scope, 0)?;
                    let index_params = sig
                        .params
                        .iter()
                        .map(|param| self.convert_param(param, scope))
                        .collect::<Result<Vec<_>>>()?;
                    Ok(PropertySig { ty, index_params })
                })
                .map_err(DecodeError::from);

            properties.push(PropertyDescriptor {
                name: self.string(property.name)?.to_string(),
                attributes: PropertyAttributes::from_bits_retain(property.flags),
                is_public: self.has_public_accessor(TableId::Property, rid),
                signature,
            });
        }
        Ok(properties)
    }

    fn events(&self, row: &TypeDefRaw) -> Result<Vec<EventDescriptor>> {
        let (Some(table), Some(range)) = (
            self.view.tables().table::<EventRaw>(),
            self.index.event_runs.get(&row.rid),
        ) else {
            return Ok(Vec::new());
        };

        range
            .clone()
            .map(|rid| {
                let event = table
                    .get(rid)
                    .ok_or_else(|| TypeNotFound(Token::from_parts(TableId::Event as u8, rid)))?;
                Ok(EventDescriptor {
                    name: self.string(event.name)?.to_string(),
                    is_public: self.has_public_accessor(TableId::Event, rid),
                })
            })
            .collect()
    }

    fn is_visible(&self, row: &TypeDefRaw) -> bool {
        let flags = TypeAttributes::from_bits_retain(row.flags);
        flags.is_public() || flags.is_nested_public()
    }

    /// Build the descriptor of `TypeDef` row `rid`.
    ///
    /// # Errors
    /// Fails if the row, its names, its base chain or its member tables cannot be read.
    /// Undecodable member signatures do not fail the type; they are kept inside the
    /// member descriptors. Failures come back as [`Error::TypeLoad`] naming the type.
    pub fn describe(&self, rid: u32) -> Result<TypeDescriptor> {
        self.describe_row(rid).map_err(|error| Error::TypeLoad {
            name: self.display_name(rid),
            source: Box::new(error),
        })
    }

    /// Full name of row `rid` for diagnostics, its token if the name cannot be read.
    fn display_name(&self, rid: u32) -> String {
        self.typedef_name(rid).map_or_else(
            |_| Token::from_parts(TableId::TypeDef as u8, rid).to_string(),
            |name| name.full_name(),
        )
    }

    fn describe_row(&self, rid: u32) -> Result<TypeDescriptor> {
        let row = self.typedef(rid)?;
        let flags = TypeAttributes::from_bits_retain(row.flags);
        let name = self.typedef_name(rid)?;
        let bases = self.base_chain(&row)?;

        let immediate = bases.first().and_then(TypeSig::type_name);
        let base_is = |namespace: &str, base: &str| immediate.is_some_and(|n| n.is(namespace, base));

        let is_enum = base_is("System", "Enum");
        let is_value_type = is_enum || (base_is("System", "ValueType") && !name.is("System", "Enum"));

        let mut kind = if flags.is_interface() {
            TypeKind::INTERFACE
        } else if is_value_type {
            TypeKind::VALUE_TYPE
        } else {
            TypeKind::CLASS
        };
        if is_enum {
            kind |= TypeKind::ENUM;
        }
        if kind.contains(TypeKind::CLASS)
            && (base_is("System", "Delegate") || base_is("System", "MulticastDelegate"))
        {
            kind |= TypeKind::DELEGATE;
        }
        if flags.contains(TypeAttributes::ABSTRACT) {
            kind |= TypeKind::ABSTRACT;
        }
        if flags.contains(TypeAttributes::SEALED) {
            kind |= TypeKind::SEALED;
        }
        if flags.is_public() {
            kind |= TypeKind::PUBLIC;
        }
        if flags.is_nested() {
            kind |= TypeKind::NESTED;
        }
        if flags.is_nested_public() {
            kind |= TypeKind::NESTED_PUBLIC;
        }
        if is_primitive(&name) {
            kind |= TypeKind::PRIMITIVE;
        }

        let generic_params = self.type_generics(rid).to_vec();
        if !generic_params.is_empty() {
            kind |= TypeKind::GENERIC;
        }

        let (constructors, methods) = self
            .methods(&row)?
            .into_iter()
            .partition(MethodDescriptor::is_constructor);

        Ok(TypeDescriptor {
            name,
            kind,
            generic_params,
            generic_args: Vec::new(),
            bases,
            constructors,
            methods,
            properties: self.properties(&row)?,
            fields: self.fields(&row)?,
            events: self.events(&row)?,
        })
    }
}

/// Extend a chain that left the binary through a reference to `name` with the
/// framework's own bases, so that it ends at `System.Object`.
fn complete_framework_chain(name: &TypeName, bases: &mut Vec<TypeSig>) {
    let mut current = name.clone();
    loop {
        let next = if current.is("System", "Object") {
            break;
        } else if current.is("System", "Enum") {
            "ValueType"
        } else if current.is("System", "MulticastDelegate") {
            "Delegate"
        } else {
            "Object"
        };

        current = TypeName::system(next);
        bases.push(TypeSig::Named(current.clone()));
    }
}

impl TypeCatalogue for CilCatalogue {
    fn identity(&self) -> Result<AssemblyIdentity> {
        let tables = self.view.tables();
        let module = tables
            .table::<ModuleRaw>()
            .and_then(|table| table.get(1))
            .ok_or_else(|| malformed_error!("Metadata has no Module row"))?;

        let mvid = match self.view.guids() {
            Some(guids) if module.mvid != 0 => guids.get(module.mvid as usize)?,
            _ => uguid::Guid::ZERO,
        };

        let Some(assembly) = tables.table::<AssemblyRaw>().and_then(|table| table.get(1)) else {
            let module_name = self.string(module.name)?;
            let name = Path::new(module_name)
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or(module_name);
            return Ok(AssemblyIdentity::new(mvid, name, [0; 4]));
        };

        let public_key_token = if assembly.public_key == 0 {
            None
        } else {
            let key = self.blob(assembly.public_key)?;
            if key.is_empty() {
                None
            } else {
                let digest = Sha1::digest(key);
                let mut token = [0u8; 8];
                for (slot, byte) in token.iter_mut().zip(digest.iter().rev()) {
                    *slot = *byte;
                }
                Some(token)
            }
        };

        Ok(AssemblyIdentity {
            mvid,
            name: self.string(assembly.name)?.to_string(),
            version: [
                assembly.major_version,
                assembly.minor_version,
                assembly.build_number,
                assembly.revision_number,
            ],
            culture: self.string(assembly.culture)?.to_string(),
            public_key_token,
        })
    }

    fn visible_types(&self) -> Box<dyn Iterator<Item = Result<TypeDescriptor>> + '_> {
        let Some(table) = self.view.tables().table::<TypeDefRaw>() else {
            return Box::new(std::iter::empty());
        };

        let visible: Vec<u32> = table
            .iter()
            .filter(|row| self.is_visible(row))
            .map(|row| row.rid)
            .collect();

        Box::new(visible.into_iter().map(|rid| self.describe(rid)))
    }
}

impl std::fmt::Debug for CilCatalogue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CilCatalogue")
            .field("types", &self.view.tables().table::<TypeDefRaw>().map_or(0, |t| t.row_count()))
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{def, GenericOwner, MetadataBuilder, PeBuilder};

    #[test]
    fn runs_are_clamped() {
        assert_eq!(run(3, 5, 10), 3..5);
        assert_eq!(run(0, 2, 10), 1..2);
        assert_eq!(run(4, 20, 5), 4..6);
        assert_eq!(run(6, 3, 5), 6..6);

        let runs = owned_runs(&[(2, 1), (5, 3)], 4);
        assert_eq!(runs[&2], 1..3);
        assert_eq!(runs[&5], 3..5);
    }

    #[test]
    fn framework_chain() {
        let mut bases = vec![TypeSig::system("Enum")];
        complete_framework_chain(&TypeName::system("Enum"), &mut bases);
        let names: Vec<String> = bases.iter().map(|b| b.type_name().unwrap().full_name()).collect();
        assert_eq!(names, ["System.Enum", "System.ValueType", "System.Object"]);

        let mut bases = vec![];
        complete_framework_chain(&TypeName::system("MulticastDelegate"), &mut bases);
        assert_eq!(bases, [TypeSig::system("Delegate"), TypeSig::system("Object")]);

        let mut bases = vec![];
        complete_framework_chain(&TypeName::new("Other", "Base"), &mut bases);
        assert_eq!(bases, [TypeSig::system("Object")]);

        let mut bases = vec![];
        complete_framework_chain(&TypeName::system("Object"), &mut bases);
        assert!(bases.is_empty());
    }

    #[test]
    fn describe_crafted_image() {
        let mut builder = MetadataBuilder::new("Sample");
        let object = builder.type_ref("System", "Object");

        let widget = builder.type_def("Acme", "Widget", 0x0010_0001, object);
        builder.method(widget, ".ctor", 0x1886, &[0x20, 0x00, 0x01], &[]);
        builder.method(
            widget,
            "Resize",
            0x0086,
            &[0x20, 0x02, 0x01, 0x08, 0x0E],
            &[(1, "width", 0), (2, "label", 0)],
        );
        builder.method(widget, "Hidden", 0x0081, &[0x00, 0x00, 0x01], &[]);

        builder.type_def("Acme", "Internal", 0x0010_0000, object);

        let image = PeBuilder::new(builder.build()).build();
        let catalogue = CilCatalogue::from_mem(image).unwrap();

        let identity = catalogue.identity().unwrap();
        assert_eq!(identity.name, "Sample");
        assert_eq!(identity.version, [1, 0, 0, 0]);
        assert_eq!(
            identity.full_name(),
            "Sample, Version=1.0.0.0, Culture=neutral, PublicKeyToken=null"
        );

        let types: Vec<TypeDescriptor> = catalogue
            .visible_types()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(types.len(), 1);

        let widget = &types[0];
        assert_eq!(widget.full_name(), "Acme.Widget");
        assert!(widget.kind.contains(TypeKind::CLASS | TypeKind::PUBLIC));
        assert_eq!(widget.bases, [TypeSig::system("Object")]);
        assert_eq!(widget.constructors.len(), 1);
        assert_eq!(widget.methods.len(), 2);

        let resize = &widget.methods[0];
        assert_eq!(resize.name, "Resize");
        let signature = resize.signature.as_ref().unwrap();
        assert_eq!(signature.return_type, TypeSig::void());
        assert_eq!(signature.params.len(), 2);
        assert_eq!(signature.params[0].name, "width");
        assert_eq!(signature.params[0].ty, TypeSig::system("Int32"));
        assert_eq!(signature.params[1].name, "label");
        assert_eq!(signature.params[1].ty, TypeSig::system("String"));
    }

    #[test]
    fn describe_generics_properties_and_enums() {
        let mut builder = MetadataBuilder::new("Sample");
        let object = builder.type_ref("System", "Object");
        let system_enum = builder.type_ref("System", "Enum");

        let boxed = builder.type_def("Acme", "Box`1", 0x0010_0001, object);
        builder.generic_param(GenericOwner::Type(boxed), 0, "T");
        let getter = builder.method(boxed, "get_Value", 0x0886, &[0x20, 0x00, 0x13, 0x00], &[]);
        let map = builder.method(
            boxed,
            "Map",
            0x0086,
            &[0x30, 0x01, 0x01, 0x1E, 0x00, 0x13, 0x00],
            &[(1, "value", 0)],
        );
        builder.generic_param(GenericOwner::Method(map), 0, "U");
        builder.property(boxed, "Value", &[0x28, 0x00, 0x13, 0x00], Some(getter), None);

        let inner = builder.type_def("", "Inner", 0x0010_0002, object);
        builder.nested(inner, boxed);

        let closed = builder.type_spec(&[0x15, 0x12, def(boxed) as u8, 0x01, 0x08]);
        builder.type_def("Acme", "IntBox", 0x0010_0101, closed);

        let color = builder.type_def("Acme", "Color", 0x0000_0101, system_enum);
        builder.field(color, "value__", 0x0606, &[0x06, 0x08]);
        builder.field(color, "Red", 0x8056, &[0x06, 0x11, def(color) as u8]);

        let catalogue = CilCatalogue::from_mem(PeBuilder::new(builder.build()).build()).unwrap();
        let types: Vec<TypeDescriptor> = catalogue
            .visible_types()
            .collect::<Result<Vec<_>>>()
            .unwrap();

        let names: Vec<String> = types.iter().map(TypeDescriptor::full_name).collect();
        assert_eq!(names, ["Acme.Box`1", "Acme.Box`1+Inner", "Acme.IntBox", "Acme.Color"]);

        let boxed = &types[0];
        assert_eq!(boxed.generic_params, ["T"]);
        assert!(boxed.kind.contains(TypeKind::GENERIC));
        let map = boxed.methods.iter().find(|m| m.name == "Map").unwrap();
        assert_eq!(map.generic_params, ["U"]);
        let signature = map.signature.as_ref().unwrap();
        assert_eq!(signature.return_type, TypeSig::method_param(0, "U"));
        assert_eq!(signature.params[0].ty, TypeSig::type_param(0, "T"));

        assert_eq!(boxed.properties.len(), 1);
        assert!(boxed.properties[0].is_public);
        assert_eq!(
            boxed.properties[0].signature.as_ref().unwrap().ty,
            TypeSig::type_param(0, "T")
        );

        let inner = &types[1];
        assert!(inner.kind.contains(TypeKind::NESTED | TypeKind::NESTED_PUBLIC));
        assert!(!inner.kind.contains(TypeKind::PUBLIC));

        let int_box = &types[2];
        assert!(int_box.kind.contains(TypeKind::SEALED));
        assert_eq!(
            int_box.bases,
            [
                TypeSig::generic(TypeName::new("Acme", "Box`1"), vec![TypeSig::system("Int32")]),
                TypeSig::system("Object"),
            ]
        );

        let color = &types[3];
        assert!(color.kind.contains(TypeKind::VALUE_TYPE | TypeKind::ENUM));
        assert_eq!(
            color.bases,
            [TypeSig::system("Enum"), TypeSig::system("ValueType"), TypeSig::system("Object")]
        );
        assert_eq!(color.fields.len(), 2);
        assert_eq!(color.fields[1].ty, Ok(TypeSig::named("Acme", "Color")));
    }

    #[test]
    fn failing_types_are_named() {
        let mut builder = MetadataBuilder::new("Sample");
        let object = builder.type_ref("System", "Object");
        builder.type_def("Acme", "Good", 0x0010_0001, object);
        // row 3 derives from itself
        let looped = builder.type_def("Acme", "Loop", 0x0010_0001, def(3));
        assert_eq!(looped, 3);

        let catalogue = CilCatalogue::from_mem(PeBuilder::new(builder.build()).build()).unwrap();
        let types: Vec<Result<TypeDescriptor>> = catalogue.visible_types().collect();
        assert_eq!(types.len(), 2);
        assert_eq!(types[0].as_ref().unwrap().full_name(), "Acme.Good");

        let error = types[1].as_ref().unwrap_err();
        match error {
            Error::TypeLoad { name, source } => {
                assert_eq!(name, "Acme.Loop");
                assert!(matches!(**source, Error::Malformed { .. }));
            }
            other => panic!("expected TypeLoad, got {other:?}"),
        }
        assert!(error.to_string().starts_with("Failed to load type Acme.Loop - "));
    }

    #[test]
    fn identity_without_assembly_row() {
        let builder = MetadataBuilder::new("Loose").without_assembly();
        let catalogue = CilCatalogue::from_mem(PeBuilder::new(builder.build()).build()).unwrap();

        let identity = catalogue.identity().unwrap();
        assert_eq!(identity.name, "Loose");
        assert_eq!(identity.version, [0; 4]);
        assert_eq!(identity.mvid, MetadataBuilder::MVID);
    }

    #[test]
    fn identity_of_signed_assembly() {
        let builder = MetadataBuilder::new("Signed")
            .with_version([2, 1, 0, 7])
            .with_culture("fr")
            .with_public_key(&[0x00, 0x24, 0x00, 0x00, 0x04, 0x80]);
        let catalogue = CilCatalogue::from_mem(PeBuilder::new(builder.build()).build()).unwrap();

        let identity = catalogue.identity().unwrap();
        assert_eq!(identity.version, [2, 1, 0, 7]);
        assert_eq!(identity.culture, "fr");

        let digest = Sha1::digest([0x00, 0x24, 0x00, 0x00, 0x04, 0x80]);
        let expected: Vec<u8> = digest.iter().rev().take(8).copied().collect();
        assert_eq!(identity.public_key_token.unwrap().as_slice(), expected.as_slice());
    }
}
