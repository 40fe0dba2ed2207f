//! The `#~` stream: table presence, row counts and the table data itself
//! (ECMA-335 II.24.2.6).

use std::sync::Arc;

use strum::{EnumCount, IntoEnumIterator};

use crate::{
    file::io::read_le,
    metadata::tables::{MetadataTable, RowReadable, TableId, TableInfo, TableInfoRef},
    Error::OutOfBounds,
    Result,
};

/// Parsed header of the `#~` stream plus the location of every present table.
pub struct TablesHeader<'a> {
    /// Major schema version, 2
    pub major_version: u8,
    /// Minor schema version, 0
    pub minor_version: u8,
    /// Bit vector of present tables
    pub valid: u64,
    /// Bit vector of sorted tables
    pub sorted: u64,
    /// Row counts and index widths
    pub info: TableInfoRef,
    data: &'a [u8],
    offsets: Vec<Option<(usize, u32)>>,
}

impl<'a> TablesHeader<'a> {
    /// Parse the `#~` stream.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if no table is present or a table id beyond
    /// `GenericParamConstraint` is flagged, and [`crate::Error::OutOfBounds`] if a table
    /// does not fit in the stream.
    pub fn from(data: &'a [u8]) -> Result<TablesHeader<'a>> {
        if data.len() < 24 {
            return Err(OutOfBounds);
        }

        let valid = read_le::<u64>(&data[8..])?;
        if valid == 0 {
            return Err(malformed_error!("No valid rows in any of the tables"));
        }
        if valid >> TableId::COUNT != 0 {
            return Err(malformed_error!(
                "Unsupported metadata tables present - {:#x}",
                valid
            ));
        }

        let info = Arc::new(TableInfo::new(data, valid)?);
        let mut offsets = vec![None; TableId::COUNT];
        let mut current_offset = 24 + valid.count_ones() as usize * 4;

        for table_id in TableId::iter() {
            if valid & (1 << table_id as u64) == 0 {
                continue;
            }

            let rows = info.rows(table_id);
            let size = u64::from(rows) * u64::from(info.row_size(table_id));
            let Some(end) = usize::try_from(size)
                .ok()
                .and_then(|size| current_offset.checked_add(size))
            else {
                return Err(OutOfBounds);
            };
            if end > data.len() {
                return Err(OutOfBounds);
            }

            offsets[table_id as usize] = Some((current_offset, rows));
            current_offset = end;
        }

        Ok(TablesHeader {
            major_version: read_le::<u8>(&data[4..])?,
            minor_version: read_le::<u8>(&data[5..])?,
            valid,
            sorted: read_le::<u64>(&data[16..])?,
            info,
            data,
            offsets,
        })
    }

    /// Number of tables present.
    #[must_use]
    pub fn table_count(&self) -> u32 {
        self.valid.count_ones()
    }

    /// Whether `table_id` is present.
    #[must_use]
    pub fn has_table(&self, table_id: TableId) -> bool {
        self.offsets[table_id as usize].is_some()
    }

    /// Typed access to the table holding rows of type `T`, `None` if it is absent.
    #[must_use]
    pub fn table<T: RowReadable>(&self) -> Option<MetadataTable<'a, T>> {
        let (offset, rows) = self.offsets[T::TABLE as usize]?;

        MetadataTable::new(&self.data[offset..], rows, self.info.clone()).ok()
    }
}
