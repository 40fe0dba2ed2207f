//! The `Event` table (0x14).

use crate::{
    file::io::{read_le_at, read_le_at_dyn},
    metadata::{
        tables::{CodedIndex, CodedIndexType, RowReadable, TableId, TableInfo},
        token::Token,
    },
    Result,
};

/// An event declared by a type.
#[derive(Clone, Debug)]
pub struct EventRaw {
    /// Row id
    pub rid: u32,
    /// Metadata token
    pub token: Token,
    /// `EventAttributes`
    pub flags: u16,
    /// `#Strings` index of the name
    pub name: u32,
    /// Delegate type of the handler
    pub event_type: CodedIndex,
}

impl RowReadable for EventRaw {
    const TABLE: TableId = TableId::Event;

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfo) -> Result<Self> {
        Ok(EventRaw {
            rid,
            token: Token::new(TableId::Event.token_base() + rid),
            flags: read_le_at::<u16>(data, offset)?,
            name: read_le_at_dyn(data, offset, sizes.is_large_str())?,
            event_type: CodedIndex::read(data, offset, sizes, CodedIndexType::TypeDefOrRef)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::metadata::tables::{EventMapRaw, MetadataTable};

    use super::*;

    #[test]
    fn crafted_event_run() {
        let map = vec![
            0x02, 0x00, // parent
            0x01, 0x00, // event_list
        ];
        let events = vec![
            0x00, 0x00, // flags
            0x10, 0x00, // name
            0x05, 0x00, // event_type: TypeRef 1
        ];

        let sizes = Arc::new(TableInfo::new_test(
            &[
                (TableId::TypeDef, 2),
                (TableId::TypeRef, 1),
                (TableId::EventMap, 1),
                (TableId::Event, 1),
            ],
            false,
            false,
            false,
        ));

        let map = MetadataTable::<EventMapRaw>::new(&map, 1, sizes.clone()).unwrap();
        let row = map.get(1).unwrap();
        assert_eq!((row.parent, row.event_list), (2, 1));

        let events = MetadataTable::<EventRaw>::new(&events, 1, sizes).unwrap();
        let row = events.get(1).unwrap();
        assert_eq!(row.token.value(), 0x1400_0001);
        assert_eq!(row.name, 0x10);
        assert_eq!(row.event_type, CodedIndex::new(TableId::TypeRef, 1));
    }
}
