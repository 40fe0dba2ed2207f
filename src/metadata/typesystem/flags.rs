//! Attribute bitflags of the `TypeDef`, `MethodDef`, `Field`, `Param` and `Property` rows
//! (ECMA-335 II.23.1).

use bitflags::bitflags;

const VISIBILITY_MASK: u32 = 0x0007;
const MEMBER_ACCESS_MASK: u16 = 0x0007;

bitflags! {
    /// `TypeAttributes` (II.23.1.15)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TypeAttributes: u32 {
        /// Type is visible outside the assembly
        const PUBLIC = 0x0000_0001;
        /// Nested type with public visibility
        const NESTED_PUBLIC = 0x0000_0002;
        /// Nested type with private visibility
        const NESTED_PRIVATE = 0x0000_0003;
        /// Nested type visible to the enclosing type and its subtypes
        const NESTED_FAMILY = 0x0000_0004;
        /// Nested type visible inside the assembly
        const NESTED_ASSEMBLY = 0x0000_0005;
        /// Nested type visible to subtypes inside the assembly
        const NESTED_FAM_AND_ASSEM = 0x0000_0006;
        /// Nested type visible to subtypes or inside the assembly
        const NESTED_FAM_OR_ASSEM = 0x0000_0007;
        /// Fields are laid out sequentially
        const SEQUENTIAL_LAYOUT = 0x0000_0008;
        /// Fields are laid out at explicit offsets
        const EXPLICIT_LAYOUT = 0x0000_0010;
        /// Type is an interface
        const INTERFACE = 0x0000_0020;
        /// Type cannot be instantiated
        const ABSTRACT = 0x0000_0080;
        /// Type cannot be derived from
        const SEALED = 0x0000_0100;
        /// Name is special
        const SPECIAL_NAME = 0x0000_0400;
        /// Type is imported
        const IMPORT = 0x0000_1000;
        /// Type is serializable
        const SERIALIZABLE = 0x0000_2000;
        /// Static constructor may run lazily
        const BEFORE_FIELD_INIT = 0x0010_0000;
        /// Runtime should check name encoding
        const RT_SPECIAL_NAME = 0x0000_0800;
    }
}

impl TypeAttributes {
    /// The three visibility bits.
    #[must_use]
    pub fn visibility(self) -> u32 {
        self.bits() & VISIBILITY_MASK
    }

    /// Top-level public type.
    #[must_use]
    pub fn is_public(self) -> bool {
        self.visibility() == Self::PUBLIC.bits()
    }

    /// Nested type with public visibility.
    #[must_use]
    pub fn is_nested_public(self) -> bool {
        self.visibility() == Self::NESTED_PUBLIC.bits()
    }

    /// Any nested visibility.
    #[must_use]
    pub fn is_nested(self) -> bool {
        self.visibility() >= Self::NESTED_PUBLIC.bits()
    }

    /// Type is an interface.
    #[must_use]
    pub fn is_interface(self) -> bool {
        self.contains(Self::INTERFACE)
    }
}

bitflags! {
    /// `MethodAttributes` (II.23.1.10)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MethodAttributes: u16 {
        /// Accessible only by the parent type
        const PRIVATE = 0x0001;
        /// Accessible by subtypes inside the assembly
        const FAM_AND_ASSEM = 0x0002;
        /// Accessible inside the assembly
        const ASSEMBLY = 0x0003;
        /// Accessible by the type and its subtypes
        const FAMILY = 0x0004;
        /// Accessible by subtypes or inside the assembly
        const FAM_OR_ASSEM = 0x0005;
        /// Accessible by anyone
        const PUBLIC = 0x0006;
        /// Exported to unmanaged code
        const UNMANAGED_EXPORT = 0x0008;
        /// Defined on the type rather than per instance
        const STATIC = 0x0010;
        /// Cannot be overridden
        const FINAL = 0x0020;
        /// Virtual
        const VIRTUAL = 0x0040;
        /// Hides by name and signature
        const HIDE_BY_SIG = 0x0080;
        /// Always gets a new vtable slot
        const NEW_SLOT = 0x0100;
        /// Overridable only when also accessible
        const CHECK_ACCESS_ON_OVERRIDE = 0x0200;
        /// No implementation
        const ABSTRACT = 0x0400;
        /// Name is special (accessors, operators)
        const SPECIAL_NAME = 0x0800;
        /// Runtime-recognised special name (`.ctor`, `.cctor`)
        const RT_SPECIAL_NAME = 0x1000;
        /// Implemented through P/Invoke
        const PINVOKE_IMPL = 0x2000;
        /// Has security attached
        const HAS_SECURITY = 0x4000;
        /// Calls a method that requires a security object
        const REQUIRE_SEC_OBJECT = 0x8000;
    }
}

const METHOD_ACCESS_NAMES: [&str; 8] = [
    "PrivateScope",
    "Private",
    "FamANDAssem",
    "Assembly",
    "Family",
    "FamORAssem",
    "Public",
    "MemberAccessMask",
];

const METHOD_FLAG_NAMES: [(MethodAttributes, &str); 13] = [
    (MethodAttributes::UNMANAGED_EXPORT, "UnmanagedExport"),
    (MethodAttributes::STATIC, "Static"),
    (MethodAttributes::FINAL, "Final"),
    (MethodAttributes::VIRTUAL, "Virtual"),
    (MethodAttributes::HIDE_BY_SIG, "HideBySig"),
    (MethodAttributes::NEW_SLOT, "NewSlot"),
    (MethodAttributes::CHECK_ACCESS_ON_OVERRIDE, "CheckAccessOnOverride"),
    (MethodAttributes::ABSTRACT, "Abstract"),
    (MethodAttributes::SPECIAL_NAME, "SpecialName"),
    (MethodAttributes::RT_SPECIAL_NAME, "RTSpecialName"),
    (MethodAttributes::PINVOKE_IMPL, "PinvokeImpl"),
    (MethodAttributes::HAS_SECURITY, "HasSecurity"),
    (MethodAttributes::REQUIRE_SEC_OBJECT, "RequireSecObject"),
];

impl MethodAttributes {
    /// The three member access bits.
    #[must_use]
    pub fn access(self) -> u16 {
        self.bits() & MEMBER_ACCESS_MASK
    }

    /// Accessible by anyone.
    #[must_use]
    pub fn is_public(self) -> bool {
        self.access() == Self::PUBLIC.bits()
    }

    /// Static method.
    #[must_use]
    pub fn is_static(self) -> bool {
        self.contains(Self::STATIC)
    }

    /// Accessor, operator or other compiler-named method.
    #[must_use]
    pub fn is_special_name(self) -> bool {
        self.contains(Self::SPECIAL_NAME)
    }

    /// Render the flags with the names the runtime uses, e.g.
    /// `Public, HideBySig, SpecialName, RTSpecialName`.
    #[must_use]
    pub fn describe(self) -> String {
        let mut parts = vec![METHOD_ACCESS_NAMES[self.access() as usize]];
        parts.extend(
            METHOD_FLAG_NAMES
                .iter()
                .filter(|(flag, _)| self.contains(*flag))
                .map(|(_, name)| *name),
        );

        parts.join(", ")
    }
}

bitflags! {
    /// `FieldAttributes` (II.23.1.5)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FieldAttributes: u16 {
        /// Accessible only by the parent type
        const PRIVATE = 0x0001;
        /// Accessible by anyone
        const PUBLIC = 0x0006;
        /// Defined on the type rather than per instance
        const STATIC = 0x0010;
        /// Assignable only in a constructor
        const INIT_ONLY = 0x0020;
        /// Compile-time constant
        const LITERAL = 0x0040;
        /// Name is special
        const SPECIAL_NAME = 0x0200;
        /// Runtime-recognised special name (`value__`)
        const RT_SPECIAL_NAME = 0x0400;
        /// Has a default value
        const HAS_DEFAULT = 0x8000;
    }
}

impl FieldAttributes {
    /// Accessible by anyone.
    #[must_use]
    pub fn is_public(self) -> bool {
        self.bits() & MEMBER_ACCESS_MASK == Self::PUBLIC.bits()
    }
}

bitflags! {
    /// `ParamAttributes` (II.23.1.13)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ParamAttributes: u16 {
        /// Input parameter
        const IN = 0x0001;
        /// Output parameter
        const OUT = 0x0002;
        /// Locale identifier parameter
        const LCID = 0x0004;
        /// Return value
        const RETVAL = 0x0008;
        /// Optional parameter
        const OPTIONAL = 0x0010;
        /// Has a default value
        const HAS_DEFAULT = 0x1000;
        /// Has marshalling information
        const HAS_FIELD_MARSHAL = 0x2000;
    }
}

impl ParamAttributes {
    /// Render the flags with the names the runtime uses, `None` when empty.
    #[must_use]
    pub fn describe(self) -> String {
        let names = [
            (Self::IN, "In"),
            (Self::OUT, "Out"),
            (Self::LCID, "Lcid"),
            (Self::RETVAL, "Retval"),
            (Self::OPTIONAL, "Optional"),
            (Self::HAS_DEFAULT, "HasDefault"),
            (Self::HAS_FIELD_MARSHAL, "HasFieldMarshal"),
        ];

        let parts: Vec<&str> = names
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();

        if parts.is_empty() {
            "None".to_string()
        } else {
            parts.join(", ")
        }
    }
}

bitflags! {
    /// `PropertyAttributes` (II.23.1.14)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PropertyAttributes: u16 {
        /// Name is special
        const SPECIAL_NAME = 0x0200;
        /// Runtime-recognised special name
        const RT_SPECIAL_NAME = 0x0400;
        /// Has a default value
        const HAS_DEFAULT = 0x1000;
    }
}

impl PropertyAttributes {
    /// Render the flags with the names the runtime uses, `None` when empty.
    #[must_use]
    pub fn describe(self) -> String {
        let names = [
            (Self::SPECIAL_NAME, "SpecialName"),
            (Self::RT_SPECIAL_NAME, "RTSpecialName"),
            (Self::HAS_DEFAULT, "HasDefault"),
        ];

        let parts: Vec<&str> = names
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();

        if parts.is_empty() {
            "None".to_string()
        } else {
            parts.join(", ")
        }
    }
}
