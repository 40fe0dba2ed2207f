//! Borrowed view over the metadata of a loaded binary.
//!
//! [`AssemblyView`] owns the [`File`] and keeps the parsed CLR header, metadata root,
//! heaps and table header alongside it, all borrowing from the same bytes. Nothing is
//! copied out of the image; rows and strings are decoded on access.
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotdoc::metadata::{tables::TypeDefRaw, view::AssemblyView};
//! use std::path::Path;
//!
//! let view = AssemblyView::from_file(Path::new("Library.dll"))?;
//! if let Some(types) = view.tables().table::<TypeDefRaw>() {
//!     for row in &types {
//!         println!("{}", view.strings().get(row.type_name as usize)?);
//!     }
//! }
//! # Ok::<(), dotdoc::Error>(())
//! ```

use std::{path::Path, sync::Arc};

use ouroboros::self_referencing;

use crate::{
    file::File,
    metadata::{
        cor20header::Cor20Header,
        root::Root,
        streams::{Blob, Guid, StreamHeader, Strings, TablesHeader},
    },
    Error::OutOfBounds,
    Result,
};

/// The parsed metadata structures, borrowing from the file bytes.
pub struct AssemblyViewData<'a> {
    /// The CLR runtime header
    pub cor20header: Cor20Header,
    /// The metadata root and its stream headers
    pub metadata_root: Root,
    /// The `#~` stream
    pub metadata_tables: TablesHeader<'a>,
    /// The `#Strings` heap
    pub strings: Strings<'a>,
    /// The `#GUID` heap, if present
    pub guids: Option<Guid<'a>>,
    /// The `#Blob` heap, if present
    pub blobs: Option<Blob<'a>>,
}

impl<'a> AssemblyViewData<'a> {
    /// Locate and parse the metadata of `file`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if a required stream is missing or invalid,
    /// [`crate::Error::NotSupported`] for uncompressed (`#-`) tables, and
    /// [`crate::Error::OutOfBounds`] if a structure lies outside the image.
    pub fn from_file(file: &'a File) -> Result<Self> {
        let (clr_rva, clr_size) = file.clr()?;
        let clr_offset = file.rva_to_offset(clr_rva)?;
        let cor20header = Cor20Header::read(file.data_slice(clr_offset, clr_size)?)?;

        let metadata_offset = file.rva_to_offset(cor20header.meta_data_rva as usize)?;
        let metadata_slice =
            file.data_slice(metadata_offset, cor20header.meta_data_size as usize)?;
        let metadata_root = Root::read(metadata_slice)?;

        let mut metadata_tables = None;
        let mut strings = None;
        let mut guids = None;
        let mut blobs = None;

        for stream in &metadata_root.stream_headers {
            let start = stream.offset as usize;
            let Some(end) = start.checked_add(stream.size as usize) else {
                return Err(OutOfBounds);
            };
            if end > metadata_slice.len() {
                return Err(OutOfBounds);
            }

            let stream_data = &metadata_slice[start..end];
            match stream.name.as_str() {
                "#~" => metadata_tables = Some(TablesHeader::from(stream_data)?),
                "#-" => return Err(crate::Error::NotSupported),
                "#Strings" => strings = Some(Strings::from(stream_data)?),
                "#GUID" => guids = Some(Guid::from(stream_data)?),
                "#Blob" => blobs = Some(Blob::from(stream_data)?),
                _ => {}
            }
        }

        let Some(metadata_tables) = metadata_tables else {
            return Err(malformed_error!("Metadata has no #~ stream"));
        };
        let Some(strings) = strings else {
            return Err(malformed_error!("Metadata has no #Strings heap"));
        };

        Ok(AssemblyViewData {
            cor20header,
            metadata_root,
            metadata_tables,
            strings,
            guids,
            blobs,
        })
    }
}

/// A loaded binary together with its parsed metadata.
#[self_referencing]
pub struct AssemblyView {
    file: Arc<File>,

    #[borrows(file)]
    #[not_covariant]
    data: AssemblyViewData<'this>,
}

impl AssemblyView {
    /// Load and parse the binary at `file`.
    ///
    /// # Errors
    /// Fails if the file cannot be read, is not a PE image with a CLR header, or its
    /// metadata is malformed.
    pub fn from_file(file: &Path) -> Result<Self> {
        let input = Arc::new(File::from_file(file)?);
        Self::load(input)
    }

    /// Parse a binary that is already in memory.
    ///
    /// # Errors
    /// Same as [`AssemblyView::from_file`], minus the I/O failures.
    pub fn from_mem(data: Vec<u8>) -> Result<Self> {
        let input = Arc::new(File::from_mem(data)?);
        Self::load(input)
    }

    fn load(file: Arc<File>) -> Result<Self> {
        AssemblyView::try_new(file, |file| AssemblyViewData::from_file(file))
    }

    /// The CLR runtime header.
    pub fn cor20header(&self) -> &Cor20Header {
        self.with_data(|data| &data.cor20header)
    }

    /// The metadata root.
    pub fn metadata_root(&self) -> &Root {
        self.with_data(|data| &data.metadata_root)
    }

    /// Stream headers, in file order.
    pub fn streams(&self) -> &[StreamHeader] {
        self.with_data(|data| &data.metadata_root.stream_headers)
    }

    /// The `#~` table stream.
    pub fn tables(&self) -> &TablesHeader {
        self.with_data(|data| &data.metadata_tables)
    }

    /// The `#Strings` heap.
    pub fn strings(&self) -> &Strings {
        self.with_data(|data| &data.strings)
    }

    /// The `#GUID` heap.
    pub fn guids(&self) -> Option<&Guid> {
        self.with_data(|data| data.guids.as_ref())
    }

    /// The `#Blob` heap.
    pub fn blobs(&self) -> Option<&Blob> {
        self.with_data(|data| data.blobs.as_ref())
    }

    /// The underlying file.
    pub fn file(&self) -> &Arc<File> {
        self.borrow_file()
    }
}
