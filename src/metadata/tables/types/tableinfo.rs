//! Row counts and index widths of the tables present in a `#~` stream.

use std::sync::Arc;

use strum::{EnumCount, IntoEnumIterator};

use crate::{
    file::io::{read_le, read_le_at},
    metadata::tables::types::{CodedIndexType, Column, TableId},
    Error::OutOfBounds,
    Result,
};

/// Row count of one table plus the derived index width.
#[derive(Clone, Copy, Default, PartialEq, Debug)]
pub struct TableRowInfo {
    /// Number of rows
    pub rows: u32,
    /// Bits needed to address every row
    pub bits: u8,
    /// Indexes into this table take 4 bytes
    pub is_large: bool,
}

impl TableRowInfo {
    /// Derive the index width for a table with `rows` rows.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(rows: u32) -> Self {
        let bits = if rows == 0 {
            1
        } else {
            (32 - rows.leading_zeros()) as u8
        };

        Self {
            rows,
            bits,
            is_large: rows > u32::from(u16::MAX),
        }
    }
}

/// Sizes of every index kind used by the table columns.
#[derive(Clone, Default, Debug)]
pub struct TableInfo {
    rows: Vec<TableRowInfo>,
    coded_indexes: Vec<u8>,
    is_large_index_str: bool,
    is_large_index_guid: bool,
    is_large_index_blob: bool,
}

/// Shared handle to a [`TableInfo`].
pub type TableInfoRef = Arc<TableInfo>;

impl TableInfo {
    /// Read the row counts and heap-size flags from the start of a `#~` stream.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the row count array is truncated.
    pub fn new(data: &[u8], valid_bitvec: u64) -> Result<Self> {
        let mut rows = vec![TableRowInfo::default(); TableId::COUNT];
        let mut next_row_offset = 24;

        for table_id in TableId::iter() {
            if (valid_bitvec & (1 << table_id as usize)) == 0 {
                continue;
            }

            let row_count = read_le_at::<u32>(data, &mut next_row_offset)?;
            rows[table_id as usize] = TableRowInfo::new(row_count);
        }

        if data.len() < 7 {
            return Err(OutOfBounds);
        }
        let heap_size_flags = read_le::<u8>(&data[6..])?;

        let mut table_info = TableInfo {
            rows,
            coded_indexes: vec![0; CodedIndexType::COUNT],
            is_large_index_str: heap_size_flags & 1 == 1,
            is_large_index_guid: heap_size_flags & 2 == 2,
            is_large_index_blob: heap_size_flags & 4 == 4,
        };
        table_info.calculate_coded_index_bits();

        Ok(table_info)
    }

    /// Build a [`TableInfo`] directly from row counts.
    #[cfg(test)]
    pub fn new_test(
        valid_tables: &[(TableId, u32)],
        large_str: bool,
        large_blob: bool,
        large_guid: bool,
    ) -> Self {
        let mut table_info = TableInfo {
            rows: vec![TableRowInfo::default(); TableId::COUNT],
            coded_indexes: vec![0; CodedIndexType::COUNT],
            is_large_index_str: large_str,
            is_large_index_guid: large_guid,
            is_large_index_blob: large_blob,
        };

        for (table, rows) in valid_tables {
            table_info.rows[*table as usize] = TableRowInfo::new(*rows);
        }

        table_info.calculate_coded_index_bits();
        table_info
    }

    /// Split a raw coded index into its table and row.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the tag selects no table.
    pub fn decode_coded_index(
        &self,
        value: u32,
        coded_index_type: CodedIndexType,
    ) -> Result<(TableId, u32)> {
        let tables = coded_index_type.tables();
        let tag_bits = coded_index_type.tag_bits();
        let tag_mask = (1 << tag_bits) - 1;

        let tag = value & tag_mask;
        let index = value >> tag_bits;

        match tables.get(tag as usize) {
            Some(table) => Ok((*table, index)),
            None => Err(OutOfBounds),
        }
    }

    /// Row count of `table`, 0 if absent.
    #[must_use]
    pub fn rows(&self, table: TableId) -> u32 {
        self.rows[table as usize].rows
    }

    /// Indexes into `table` take 4 bytes.
    #[must_use]
    pub fn is_large(&self, table: TableId) -> bool {
        self.rows[table as usize].is_large
    }

    /// `#Strings` indexes take 4 bytes.
    #[must_use]
    pub fn is_large_str(&self) -> bool {
        self.is_large_index_str
    }

    /// `#GUID` indexes take 4 bytes.
    #[must_use]
    pub fn is_large_guid(&self) -> bool {
        self.is_large_index_guid
    }

    /// `#Blob` indexes take 4 bytes.
    #[must_use]
    pub fn is_large_blob(&self) -> bool {
        self.is_large_index_blob
    }

    /// Width of a coded index of the given family.
    #[must_use]
    pub fn coded_index_bytes(&self, coded_index_type: CodedIndexType) -> u8 {
        if self.coded_indexes[coded_index_type as usize] > 16 {
            4
        } else {
            2
        }
    }

    /// Width of one column.
    #[must_use]
    pub fn column_bytes(&self, column: Column) -> u8 {
        let wide = |large: bool| if large { 4 } else { 2 };

        match column {
            Column::U16 => 2,
            Column::U32 => 4,
            Column::Str => wide(self.is_large_index_str),
            Column::Guid => wide(self.is_large_index_guid),
            Column::Blob => wide(self.is_large_index_blob),
            Column::Table(table) => wide(self.is_large(table)),
            Column::Coded(coded) => self.coded_index_bytes(coded),
        }
    }

    /// Width of one row of `table`.
    #[must_use]
    pub fn row_size(&self, table: TableId) -> u32 {
        table
            .columns()
            .iter()
            .map(|column| u32::from(self.column_bytes(*column)))
            .sum()
    }

    fn calculate_coded_index_bits(&mut self) {
        for coded_index in CodedIndexType::iter() {
            let max_bits = coded_index
                .tables()
                .iter()
                .map(|table| self.rows[*table as usize].bits)
                .max()
                .unwrap_or(1);

            self.coded_indexes[coded_index as usize] = max_bits + coded_index.tag_bits();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_sizes() {
        let info = TableInfo::new_test(&[(TableId::TypeDef, 10), (TableId::Field, 3)], false, false, false);

        assert_eq!(info.rows(TableId::TypeDef), 10);
        assert_eq!(info.rows(TableId::Param), 0);
        assert_eq!(info.row_size(TableId::TypeDef), 4 + 2 + 2 + 2 + 2 + 2);
        assert_eq!(info.row_size(TableId::Assembly), 4 + 2 * 4 + 4 + 2 + 2 + 2);
        assert_eq!(info.row_size(TableId::Module), 2 + 2 + 2 * 3);
    }

    #[test]
    fn large_sizes() {
        let info = TableInfo::new_test(
            &[(TableId::TypeRef, 0x4000), (TableId::Field, 0x1_0000)],
            true,
            false,
            true,
        );

        // 15 bits of rows plus 2 tag bits no longer fit in 16
        assert_eq!(info.coded_index_bytes(CodedIndexType::TypeDefOrRef), 4);
        assert_eq!(info.coded_index_bytes(CodedIndexType::TypeOrMethodDef), 2);
        assert!(info.is_large(TableId::Field));
        assert_eq!(info.row_size(TableId::Field), 2 + 4 + 2);
        assert_eq!(info.row_size(TableId::Module), 2 + 4 + 4 * 3);
    }

    #[test]
    fn decode() {
        let info = TableInfo::new_test(&[], false, false, false);

        assert_eq!(
            info.decode_coded_index(0x49, CodedIndexType::TypeDefOrRef).unwrap(),
            (TableId::TypeRef, 0x12)
        );
        assert_eq!(
            info.decode_coded_index(0x0B, CodedIndexType::HasCustomAttribute).unwrap(),
            (TableId::StandAloneSig, 0)
        );
        assert!(info.decode_coded_index(0x03, CodedIndexType::TypeDefOrRef).is_err());
    }

    #[test]
    fn read_from_stream_header() {
        let mut data = vec![0u8; 24];
        data[6] = 0x05;
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&7u32.to_le_bytes());

        let valid = (1 << TableId::Module as u64) | (1 << TableId::TypeDef as u64);
        let info = TableInfo::new(&data, valid).unwrap();

        assert_eq!(info.rows(TableId::Module), 1);
        assert_eq!(info.rows(TableId::TypeDef), 7);
        assert!(info.is_large_str());
        assert!(!info.is_large_guid());
        assert!(info.is_large_blob());

        assert!(TableInfo::new(&data[..28], valid).is_err());
    }
}
