// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(clippy::too_many_arguments)]

//! # dotdoc
//!
//! Extracts the documented API surface of a .NET assembly. `dotdoc` reads the ECMA-335
//! metadata of a compiled binary, joins every type and member with the entry of the XML
//! documentation file the compiler wrote next to it, and produces a serializable tree:
//! an assembly made of namespaces, namespaces made of classes, interfaces, structures and
//! enumerations, each carrying its constructors, methods and properties with their
//! parameters and comments.
//!
//! Neither Windows nor a .NET runtime is needed; the binary is parsed directly.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dotdoc::DocParser;
//! use std::path::Path;
//!
//! // Library.dll and Library.xml sit in the same directory
//! let assembly = DocParser::default().parse(Path::new("Library.dll"), true)?;
//!
//! for namespace in &assembly.namespaces {
//!     for ty in namespace.types() {
//!         println!("{} ({} methods)", ty.comments.fullname, ty.methods.len());
//!     }
//! }
//! # Ok::<(), dotdoc::Error>(())
//! ```
//!
//! Passing `false` for `include_namespaces` only reads the identity of the assembly; no
//! sidecar is required then.
//!
//! ## Architecture
//!
//! - [`file`] maps the binary and locates the CLR header inside the PE image
//! - [`metadata`] decodes the metadata root, heaps, tables and signature blobs
//! - [`catalogue`] turns table rows into type and member descriptors behind the
//!   [`catalogue::TypeCatalogue`] seam
//! - [`dockey`] spells the documentation keys (`T:`, `M:`, `P:`, `F:`, `E:`) compilers emit
//! - [`comments`] parses the sidecar into a lookup keyed by those strings
//! - [`DocParser`] walks a catalogue and a comment source into the [`model`] tree
//! - [`AssemblyCache`] keeps parsed trees around for hosts that serve them repeatedly
//!
//! ## Error Handling
//!
//! Operations return [`Result<T, Error>`](Result). Failures that concern a single
//! member are recorded on that member (`LoadError` and `Error`) instead of aborting the
//! walk; only a missing or unreadable binary or sidecar fails the whole parse.
//!
//! ```rust,no_run
//! use dotdoc::{DocParser, Error};
//!
//! match DocParser::default().parse(std::path::Path::new("Library.dll"), true) {
//!     Ok(assembly) => println!("{}", assembly.full_name),
//!     Err(Error::CommentsNotFound(path)) => println!("no sidecar at {}", path.display()),
//!     Err(e) => println!("Error: {e}"),
//! }
//! ```
//!
//! ## Logging
//!
//! Diagnostics go through the [`log`](https://docs.rs/log) facade. Hosts pick a logger;
//! the `dotdoc` command line tool uses `env_logger`.
#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit- and integration-tests
#[cfg(test)]
pub(crate) mod test;

/// Memory-mapped or in-memory access to PE images.
///
/// [`File`] owns the bytes and the parsed PE headers; [`file::parser::Parser`] is the
/// cursor the metadata decoders read through.
pub mod file;

/// Definitions and parsing of CIL metadata based on ECMA-335
///
/// Only the parts a documentation walk needs are decoded: the CLR header, the metadata
/// root, the `#~`, `#Strings`, `#GUID` and `#Blob` streams, the tables that describe
/// types and their members, and method, field and property signatures.
pub mod metadata;

/// Types and members of an assembly as plain descriptors.
pub mod catalogue;

/// Documentation keys of types and members.
pub mod dockey;

/// The XML documentation sidecar.
pub mod comments;

/// The documentation tree handed to consumers.
pub mod model;

/// Parser configuration.
pub mod config;

mod cache;
mod walker;

/// `dotdoc` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `dotdoc` Error type
///
/// # Examples
///
/// ```rust,no_run
/// use dotdoc::{DocParser, Error};
///
/// match DocParser::default().parse(std::path::Path::new("Library.dll"), false) {
///     Ok(assembly) => println!("{}", assembly.name),
///     Err(Error::NotSupported) => println!("not a .NET binary"),
///     Err(Error::Malformed { message, .. }) => println!("Malformed: {message}"),
///     Err(e) => println!("Error: {e}"),
/// }
/// ```
pub use error::{DecodeError, Error};

pub use cache::AssemblyCache;
pub use config::ParserConfig;
pub use walker::DocParser;

pub use catalogue::{AssemblyIdentity, CilCatalogue, StaticCatalogue, TypeCatalogue};
pub use comments::{CommentSource, CommentStore, MemberComments};
pub use dockey::{KeyEncoder, MemberKind};
pub use model::{
    Assembly, CommentBlock, Constructor, ExceptionSummary, Method, Namespace, ObjectType,
    Parameter, Property, TypeBase,
};

pub use file::File;
