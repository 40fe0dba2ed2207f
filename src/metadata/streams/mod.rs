//! Metadata streams (ECMA-335 II.24.2.2).
//!
//! - [`TablesHeader`] - the `#~` table stream
//! - [`Strings`] - identifier heap
//! - [`Guid`] - GUID heap, holds the module version id
//! - [`Blob`] - signatures and public keys
//!
//! The `#US` heap holds string literals used by method bodies and is not read.

mod blob;
mod guid;
mod streamheader;
mod strings;
mod tablesheader;

pub use blob::Blob;
pub use guid::Guid;
pub use streamheader::StreamHeader;
pub use strings::Strings;
pub use tablesheader::TablesHeader;
