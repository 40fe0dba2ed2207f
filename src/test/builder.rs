//! Writers for minimal managed PE images.
//!
//! [`MetadataBuilder`] emits the metadata of a library (`#~`, `#Strings`, `#GUID` and
//! `#Blob`), [`PeBuilder`] wraps it into a PE32 image with a CLR header. Members are added
//! in emission order: a method, field, property or event always belongs to the most
//! recently defined type, exactly like a compiler lays out its tables.
//!
//! Only std and `uguid` are used so that the integration tests can include this file.

#![allow(dead_code)]

use std::collections::HashMap;

/// `TypeDefOrRef` coded index of a `TypeDef` row, also valid inside signature blobs.
pub fn def(rid: u32) -> u32 {
    rid << 2
}

/// Owner of a generic parameter.
#[derive(Clone, Copy, Debug)]
pub enum GenericOwner {
    /// `TypeDef` row
    Type(u32),
    /// `MethodDef` row
    Method(u32),
}

struct TypeDefRow {
    flags: u32,
    name: u32,
    namespace: u32,
    extends: u32,
    field_list: u32,
    method_list: u32,
}

struct MethodRow {
    flags: u16,
    name: u32,
    signature: u32,
    param_list: u32,
}

struct AssemblyRow {
    version: [u16; 4],
    public_key: u32,
    name: u32,
    culture: u32,
}

/// Emits the metadata root and streams of a library.
pub struct MetadataBuilder {
    strings: Vec<u8>,
    string_offsets: HashMap<String, u32>,
    blobs: Vec<u8>,
    guids: Vec<u8>,

    module_name: u32,
    mvid: u32,
    assembly: Option<AssemblyRow>,

    assembly_refs: Vec<u32>,
    type_refs: Vec<(u32, u32, u32)>,
    type_defs: Vec<TypeDefRow>,
    fields: Vec<(u16, u32, u32)>,
    methods: Vec<MethodRow>,
    params: Vec<(u16, u16, u32)>,
    event_maps: Vec<(u32, u32)>,
    events: Vec<(u16, u32, u32)>,
    property_maps: Vec<(u32, u32)>,
    properties: Vec<(u16, u32, u32)>,
    semantics: Vec<(u16, u32, u32)>,
    type_specs: Vec<u32>,
    nested: Vec<(u32, u32)>,
    generic_params: Vec<(u16, u32, u32)>,
}

impl MetadataBuilder {
    /// Default module version id of built images.
    pub const MVID: uguid::Guid = uguid::guid!("d0c5d0c5-1234-4abc-8def-0123456789ab");

    /// A library called `name`, version 1.0.0.0, with the `<Module>` type and a
    /// reference to `mscorlib`.
    pub fn new(name: &str) -> Self {
        let mut builder = MetadataBuilder {
            strings: vec![0],
            string_offsets: HashMap::new(),
            blobs: vec![0],
            guids: Vec::new(),
            module_name: 0,
            mvid: 0,
            assembly: None,
            assembly_refs: Vec::new(),
            type_refs: Vec::new(),
            type_defs: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            params: Vec::new(),
            event_maps: Vec::new(),
            events: Vec::new(),
            property_maps: Vec::new(),
            properties: Vec::new(),
            semantics: Vec::new(),
            type_specs: Vec::new(),
            nested: Vec::new(),
            generic_params: Vec::new(),
        };

        builder.module_name = builder.string(&format!("{name}.dll"));
        builder.mvid = builder.guid(Self::MVID);
        let assembly_name = builder.string(name);
        builder.assembly = Some(AssemblyRow {
            version: [1, 0, 0, 0],
            public_key: 0,
            name: assembly_name,
            culture: 0,
        });
        let corlib = builder.string("mscorlib");
        builder.assembly_refs.push(corlib);
        builder.type_def("", "<Module>", 0, 0);
        builder
    }

    /// Use `mvid` as module version id.
    pub fn with_mvid(mut self, mvid: uguid::Guid) -> Self {
        self.guids.clear();
        self.mvid = self.guid(mvid);
        self
    }

    /// Use `version` as assembly version.
    pub fn with_version(mut self, version: [u16; 4]) -> Self {
        if let Some(assembly) = self.assembly.as_mut() {
            assembly.version = version;
        }
        self
    }

    /// Sign the assembly with `key`.
    pub fn with_public_key(mut self, key: &[u8]) -> Self {
        let index = self.blob(key);
        if let Some(assembly) = self.assembly.as_mut() {
            assembly.public_key = index;
        }
        self
    }

    /// Use `culture` as assembly culture.
    pub fn with_culture(mut self, culture: &str) -> Self {
        let index = self.string(culture);
        if let Some(assembly) = self.assembly.as_mut() {
            assembly.culture = index;
        }
        self
    }

    /// Emit a module without an `Assembly` row.
    pub fn without_assembly(mut self) -> Self {
        self.assembly = None;
        self
    }

    /// Offset of `value` in `#Strings`, adding it if needed.
    pub fn string(&mut self, value: &str) -> u32 {
        if value.is_empty() {
            return 0;
        }
        if let Some(offset) = self.string_offsets.get(value) {
            return *offset;
        }

        let offset = self.strings.len() as u32;
        self.strings.extend_from_slice(value.as_bytes());
        self.strings.push(0);
        self.string_offsets.insert(value.to_string(), offset);
        offset
    }

    /// Offset of a new blob holding `data`.
    pub fn blob(&mut self, data: &[u8]) -> u32 {
        let offset = self.blobs.len() as u32;
        let len = data.len() as u32;
        if len < 0x80 {
            self.blobs.push(len as u8);
        } else if len < 0x4000 {
            self.blobs.extend_from_slice(&(0x8000 | len as u16).to_be_bytes());
        } else {
            self.blobs.extend_from_slice(&(0xC000_0000 | len).to_be_bytes());
        }
        self.blobs.extend_from_slice(data);
        offset
    }

    fn guid(&mut self, guid: uguid::Guid) -> u32 {
        self.guids.extend_from_slice(&guid.to_bytes());
        (self.guids.len() / 16) as u32
    }

    /// A type in `mscorlib`; returns its `TypeDefOrRef` coded index.
    pub fn type_ref(&mut self, namespace: &str, name: &str) -> u32 {
        let scope = (1 << 2) | 2;
        let name = self.string(name);
        let namespace = self.string(namespace);
        self.type_refs.push((scope, name, namespace));
        ((self.type_refs.len() as u32) << 2) | 1
    }

    /// A type defined in this module; `extends` is a `TypeDefOrRef` coded index or 0.
    pub fn type_def(&mut self, namespace: &str, name: &str, flags: u32, extends: u32) -> u32 {
        let name = self.string(name);
        let namespace = self.string(namespace);
        self.type_defs.push(TypeDefRow {
            flags,
            name,
            namespace,
            extends,
            field_list: self.fields.len() as u32 + 1,
            method_list: self.methods.len() as u32 + 1,
        });
        self.type_defs.len() as u32
    }

    /// A `TypeSpec` with signature `signature`; returns its `TypeDefOrRef` coded index.
    pub fn type_spec(&mut self, signature: &[u8]) -> u32 {
        let blob = self.blob(signature);
        self.type_specs.push(blob);
        ((self.type_specs.len() as u32) << 2) | 2
    }

    /// Declare `nested` as nested inside `enclosing`.
    pub fn nested(&mut self, nested: u32, enclosing: u32) {
        self.nested.push((nested, enclosing));
    }

    fn check_owner(&self, owner: u32) {
        assert_eq!(
            owner,
            self.type_defs.len() as u32,
            "members must be added to the most recent type"
        );
    }

    /// A method of `owner`; `params` are `(sequence, name, flags)`.
    pub fn method(
        &mut self,
        owner: u32,
        name: &str,
        flags: u16,
        signature: &[u8],
        params: &[(u16, &str, u16)],
    ) -> u32 {
        self.check_owner(owner);

        let param_list = self.params.len() as u32 + 1;
        for (sequence, param_name, param_flags) in params {
            let param_name = self.string(param_name);
            self.params.push((*param_flags, *sequence, param_name));
        }

        let name = self.string(name);
        let signature = self.blob(signature);
        self.methods.push(MethodRow {
            flags,
            name,
            signature,
            param_list,
        });
        self.methods.len() as u32
    }

    /// A field of `owner`.
    pub fn field(&mut self, owner: u32, name: &str, flags: u16, signature: &[u8]) -> u32 {
        self.check_owner(owner);
        let name = self.string(name);
        let signature = self.blob(signature);
        self.fields.push((flags, name, signature));
        self.fields.len() as u32
    }

    /// A property of `owner` with optional getter and setter `MethodDef` rows.
    pub fn property(
        &mut self,
        owner: u32,
        name: &str,
        signature: &[u8],
        getter: Option<u32>,
        setter: Option<u32>,
    ) -> u32 {
        self.check_owner(owner);
        if self.property_maps.last().map(|(parent, _)| *parent) != Some(owner) {
            self.property_maps
                .push((owner, self.properties.len() as u32 + 1));
        }

        let name = self.string(name);
        let signature = self.blob(signature);
        self.properties.push((0, name, signature));
        let rid = self.properties.len() as u32;

        let association = (rid << 1) | 1;
        if let Some(method) = setter {
            self.semantics.push((0x0001, method, association));
        }
        if let Some(method) = getter {
            self.semantics.push((0x0002, method, association));
        }
        rid
    }

    /// An event of `owner` with an optional add accessor.
    pub fn event(&mut self, owner: u32, name: &str, event_type: u32, adder: Option<u32>) -> u32 {
        self.check_owner(owner);
        if self.event_maps.last().map(|(parent, _)| *parent) != Some(owner) {
            self.event_maps.push((owner, self.events.len() as u32 + 1));
        }

        let name = self.string(name);
        self.events.push((0, name, event_type));
        let rid = self.events.len() as u32;

        if let Some(method) = adder {
            self.semantics.push((0x0008, method, rid << 1));
        }
        rid
    }

    /// Generic parameter number `number` called `name`.
    pub fn generic_param(&mut self, owner: GenericOwner, number: u16, name: &str) {
        let owner = match owner {
            GenericOwner::Type(rid) => rid << 1,
            GenericOwner::Method(rid) => (rid << 1) | 1,
        };
        let name = self.string(name);
        self.generic_params.push((number, owner, name));
    }

    fn tables(&self) -> Vec<u8> {
        let mut valid = 0u64;
        let mut rows = Vec::new();
        let mut body = Vec::new();

        let mut table = |id: u32, count: usize, emit: &mut dyn FnMut(&mut Vec<u8>)| {
            if count == 0 {
                return;
            }
            valid |= 1 << id;
            rows.push(count as u32);
            emit(&mut body);
        };

        table(0x00, 1, &mut |out| {
            put16(out, 0);
            put16(out, self.module_name);
            put16(out, self.mvid);
            put16(out, 0);
            put16(out, 0);
        });
        table(0x01, self.type_refs.len(), &mut |out| {
            for (scope, name, namespace) in &self.type_refs {
                put16(out, *scope);
                put16(out, *name);
                put16(out, *namespace);
            }
        });
        table(0x02, self.type_defs.len(), &mut |out| {
            for row in &self.type_defs {
                put32(out, row.flags);
                put16(out, row.name);
                put16(out, row.namespace);
                put16(out, row.extends);
                put16(out, row.field_list);
                put16(out, row.method_list);
            }
        });
        table(0x04, self.fields.len(), &mut |out| {
            for (flags, name, signature) in &self.fields {
                put16(out, u32::from(*flags));
                put16(out, *name);
                put16(out, *signature);
            }
        });
        table(0x06, self.methods.len(), &mut |out| {
            for row in &self.methods {
                put32(out, 0);
                put16(out, 0);
                put16(out, u32::from(row.flags));
                put16(out, row.name);
                put16(out, row.signature);
                put16(out, row.param_list);
            }
        });
        table(0x08, self.params.len(), &mut |out| {
            for (flags, sequence, name) in &self.params {
                put16(out, u32::from(*flags));
                put16(out, u32::from(*sequence));
                put16(out, *name);
            }
        });
        table(0x12, self.event_maps.len(), &mut |out| {
            for (parent, list) in &self.event_maps {
                put16(out, *parent);
                put16(out, *list);
            }
        });
        table(0x14, self.events.len(), &mut |out| {
            for (flags, name, event_type) in &self.events {
                put16(out, u32::from(*flags));
                put16(out, *name);
                put16(out, *event_type);
            }
        });
        table(0x15, self.property_maps.len(), &mut |out| {
            for (parent, list) in &self.property_maps {
                put16(out, *parent);
                put16(out, *list);
            }
        });
        table(0x17, self.properties.len(), &mut |out| {
            for (flags, name, signature) in &self.properties {
                put16(out, u32::from(*flags));
                put16(out, *name);
                put16(out, *signature);
            }
        });
        table(0x18, self.semantics.len(), &mut |out| {
            for (semantics, method, association) in &self.semantics {
                put16(out, u32::from(*semantics));
                put16(out, *method);
                put16(out, *association);
            }
        });
        table(0x1B, self.type_specs.len(), &mut |out| {
            for signature in &self.type_specs {
                put16(out, *signature);
            }
        });
        let assembly_rows = usize::from(self.assembly.is_some());
        table(0x20, assembly_rows, &mut |out| {
            if let Some(assembly) = &self.assembly {
                put32(out, 0x8004);
                for part in assembly.version {
                    put16(out, u32::from(part));
                }
                put32(out, 0);
                put16(out, assembly.public_key);
                put16(out, assembly.name);
                put16(out, assembly.culture);
            }
        });
        table(0x23, self.assembly_refs.len(), &mut |out| {
            for name in &self.assembly_refs {
                for part in [4, 0, 0, 0] {
                    put16(out, part);
                }
                put32(out, 0);
                put16(out, 0);
                put16(out, *name);
                put16(out, 0);
                put16(out, 0);
            }
        });
        table(0x29, self.nested.len(), &mut |out| {
            for (nested, enclosing) in &self.nested {
                put16(out, *nested);
                put16(out, *enclosing);
            }
        });
        table(0x2A, self.generic_params.len(), &mut |out| {
            for (number, owner, name) in &self.generic_params {
                put16(out, u32::from(*number));
                put16(out, 0);
                put16(out, *owner);
                put16(out, *name);
            }
        });

        let mut stream = Vec::new();
        put32(&mut stream, 0);
        stream.extend_from_slice(&[2, 0, 0, 1]);
        stream.extend_from_slice(&valid.to_le_bytes());
        stream.extend_from_slice(&0u64.to_le_bytes());
        for count in rows {
            put32(&mut stream, count);
        }
        stream.extend_from_slice(&body);
        stream
    }

    /// The metadata root followed by its streams.
    pub fn build(self) -> Vec<u8> {
        let streams: [(&str, Vec<u8>); 4] = [
            ("#~", self.tables()),
            ("#Strings", self.strings.clone()),
            ("#GUID", self.guids.clone()),
            ("#Blob", self.blobs.clone()),
        ];

        let version = b"v4.0.30319\0\0";
        let header_len: usize = 16
            + version.len()
            + 4
            + streams
                .iter()
                .map(|(name, _)| 8 + align4(name.len() + 1))
                .sum::<usize>();

        let mut root = Vec::new();
        put32(&mut root, 0x424A_5342);
        put16(&mut root, 1);
        put16(&mut root, 1);
        put32(&mut root, 0);
        put32(&mut root, version.len() as u32);
        root.extend_from_slice(version);
        put16(&mut root, 0);
        put16(&mut root, streams.len() as u32);

        let mut offset = header_len;
        for (name, data) in &streams {
            put32(&mut root, offset as u32);
            put32(&mut root, align4(data.len()) as u32);
            let mut padded = name.as_bytes().to_vec();
            padded.resize(align4(name.len() + 1), 0);
            root.extend_from_slice(&padded);
            offset += align4(data.len());
        }

        for (_, data) in &streams {
            let mut padded = data.clone();
            padded.resize(align4(data.len()), 0);
            root.extend_from_slice(&padded);
        }
        root
    }
}

/// Wraps metadata into a PE32 DLL with a single `.text` section.
pub struct PeBuilder {
    metadata: Vec<u8>,
}

impl PeBuilder {
    /// RVA of the `.text` section, where the CLR header starts.
    pub const TEXT_RVA: u32 = 0x2000;
    /// File offset of the `.text` section.
    pub const TEXT_FILE_OFFSET: u32 = 0x200;

    const PE_OFFSET: usize = 0x80;
    const CLR_HEADER_SIZE: u32 = 72;

    /// An image carrying `metadata`.
    pub fn new(metadata: Vec<u8>) -> Self {
        PeBuilder { metadata }
    }

    /// The image bytes.
    pub fn build(self) -> Vec<u8> {
        let metadata_rva = Self::TEXT_RVA + Self::CLR_HEADER_SIZE;

        let mut text = Vec::new();
        put32(&mut text, Self::CLR_HEADER_SIZE);
        put16(&mut text, 2);
        put16(&mut text, 5);
        put32(&mut text, metadata_rva);
        put32(&mut text, self.metadata.len() as u32);
        put32(&mut text, 1);
        text.resize(Self::CLR_HEADER_SIZE as usize, 0);
        text.extend_from_slice(&self.metadata);

        let virtual_size = text.len() as u32;
        let raw_size = align(text.len(), 0x200) as u32;
        let image_size = Self::TEXT_RVA + align(text.len(), 0x2000) as u32;

        let mut image = vec![0u8; Self::TEXT_FILE_OFFSET as usize];
        image[0..2].copy_from_slice(b"MZ");
        image[0x3C..0x40].copy_from_slice(&(Self::PE_OFFSET as u32).to_le_bytes());

        let mut headers = Vec::new();
        headers.extend_from_slice(b"PE\0\0");

        // COFF header
        put16(&mut headers, 0x014C);
        put16(&mut headers, 1);
        put32(&mut headers, 0);
        put32(&mut headers, 0);
        put32(&mut headers, 0);
        put16(&mut headers, 0xE0);
        put16(&mut headers, 0x2102);

        // optional header, standard fields
        put16(&mut headers, 0x010B);
        headers.extend_from_slice(&[8, 0]);
        put32(&mut headers, raw_size);
        put32(&mut headers, 0);
        put32(&mut headers, 0);
        put32(&mut headers, 0);
        put32(&mut headers, Self::TEXT_RVA);
        put32(&mut headers, 0);

        // windows fields
        put32(&mut headers, 0x1000_0000);
        put32(&mut headers, 0x2000);
        put32(&mut headers, 0x200);
        for version in [4, 0, 0, 0, 4, 0] {
            put16(&mut headers, version);
        }
        put32(&mut headers, 0);
        put32(&mut headers, image_size);
        put32(&mut headers, Self::TEXT_FILE_OFFSET);
        put32(&mut headers, 0);
        put16(&mut headers, 3);
        put16(&mut headers, 0x8540);
        for size in [0x10_0000, 0x1000, 0x10_0000, 0x1000] {
            put32(&mut headers, size);
        }
        put32(&mut headers, 0);
        put32(&mut headers, 16);

        // data directories; 14 is the CLR runtime header
        for directory in 0..16 {
            if directory == 14 {
                put32(&mut headers, Self::TEXT_RVA);
                put32(&mut headers, Self::CLR_HEADER_SIZE);
            } else {
                put32(&mut headers, 0);
                put32(&mut headers, 0);
            }
        }

        // section table
        headers.extend_from_slice(b".text\0\0\0");
        put32(&mut headers, virtual_size);
        put32(&mut headers, Self::TEXT_RVA);
        put32(&mut headers, raw_size);
        put32(&mut headers, Self::TEXT_FILE_OFFSET);
        put32(&mut headers, 0);
        put32(&mut headers, 0);
        put16(&mut headers, 0);
        put16(&mut headers, 0);
        put32(&mut headers, 0x6000_0020);

        image[Self::PE_OFFSET..Self::PE_OFFSET + headers.len()].copy_from_slice(&headers);

        text.resize(raw_size as usize, 0);
        image.extend_from_slice(&text);
        image
    }
}

fn put16(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&(value as u16).to_le_bytes());
}

fn put32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn align(value: usize, to: usize) -> usize {
    value.div_ceil(to) * to
}

fn align4(value: usize) -> usize {
    align(value, 4)
}
