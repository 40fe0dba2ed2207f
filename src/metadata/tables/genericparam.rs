//! The `GenericParam` table (0x2A).

use crate::{
    file::io::{read_le_at, read_le_at_dyn},
    metadata::{
        tables::{CodedIndex, CodedIndexType, RowReadable, TableId, TableInfo},
        token::Token,
    },
    Result,
};

/// A generic parameter of a type or method.
#[derive(Clone, Debug)]
pub struct GenericParamRaw {
    /// Row id
    pub rid: u32,
    /// Metadata token
    pub token: Token,
    /// 0-based position in the owner's parameter list
    pub number: u16,
    /// `GenericParamAttributes`
    pub flags: u16,
    /// Owning `TypeDef` or `MethodDef`
    pub owner: CodedIndex,
    /// `#Strings` index of the parameter name
    pub name: u32,
}

impl RowReadable for GenericParamRaw {
    const TABLE: TableId = TableId::GenericParam;

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfo) -> Result<Self> {
        Ok(GenericParamRaw {
            rid,
            token: Token::new(TableId::GenericParam.token_base() + rid),
            number: read_le_at::<u16>(data, offset)?,
            flags: read_le_at::<u16>(data, offset)?,
            owner: CodedIndex::read(data, offset, sizes, CodedIndexType::TypeOrMethodDef)?,
            name: read_le_at_dyn(data, offset, sizes.is_large_str())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::metadata::tables::MetadataTable;

    use super::*;

    #[test]
    fn crafted_short() {
        let data = vec![
            0x01, 0x00, // number
            0x00, 0x00, // flags
            0x05, 0x00, // owner: MethodDef 2
            0x30, 0x00, // name
        ];

        let sizes = Arc::new(TableInfo::new_test(
            &[(TableId::GenericParam, 1), (TableId::MethodDef, 2)],
            false,
            false,
            false,
        ));
        let table = MetadataTable::<GenericParamRaw>::new(&data, 1, sizes).unwrap();

        let row = table.get(1).unwrap();
        assert_eq!(row.token.value(), 0x2A00_0001);
        assert_eq!(row.number, 1);
        assert_eq!(row.owner, CodedIndex::new(TableId::MethodDef, 2));
        assert_eq!(row.name, 0x30);
    }
}
