//! ECMA-335 metadata of a managed binary.
//!
//! This is the physical layer underneath [`crate::catalogue::CilCatalogue`]: the CLR
//! header locates the metadata root, the root lists the streams, and the `#~` stream
//! holds the tables whose rows reference the heaps.
//!
//! - [`view::AssemblyView`] - owns a loaded binary and its parsed streams
//! - [`tables`] - table schema, index widths and typed rows
//! - [`signatures`] - method, field, property and `TypeSpec` signature decoding
//! - [`typesystem`] - element type codes and attribute flags
//! - [`token::Token`] - table/row references

pub mod cor20header;
pub mod root;
pub mod signatures;
pub mod streams;
pub mod tables;
pub mod token;
pub mod typesystem;
pub mod view;
