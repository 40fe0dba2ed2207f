//! The `MethodSemantics` table (0x18).

use crate::{
    file::io::{read_le_at, read_le_at_dyn},
    metadata::{
        tables::{CodedIndex, CodedIndexType, RowReadable, TableId, TableInfo},
        token::Token,
    },
    Result,
};

/// Ties an accessor method to the property or event it implements.
#[derive(Clone, Debug)]
pub struct MethodSemanticsRaw {
    /// Row id
    pub rid: u32,
    /// Metadata token
    pub token: Token,
    /// `MethodSemanticsAttributes` (setter, getter, other, add, remove, fire)
    pub semantics: u16,
    /// `MethodDef` row of the accessor
    pub method: u32,
    /// The owning `Event` or `Property`
    pub association: CodedIndex,
}

impl MethodSemanticsRaw {
    /// Setter of a property
    pub const SETTER: u16 = 0x0001;
    /// Getter of a property
    pub const GETTER: u16 = 0x0002;
}

impl RowReadable for MethodSemanticsRaw {
    const TABLE: TableId = TableId::MethodSemantics;

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfo) -> Result<Self> {
        Ok(MethodSemanticsRaw {
            rid,
            token: Token::new(TableId::MethodSemantics.token_base() + rid),
            semantics: read_le_at::<u16>(data, offset)?,
            method: read_le_at_dyn(data, offset, sizes.is_large(TableId::MethodDef))?,
            association: CodedIndex::read(data, offset, sizes, CodedIndexType::HasSemantics)?,
        })
    }
}
