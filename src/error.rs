use std::path::PathBuf;

use thiserror::Error;

use crate::metadata::token::Token;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// The variants fall into three groups, matching the three failure granularities of a
/// documentation parse:
///
/// ## Binary loading
/// - [`Error::Malformed`] - Corrupted or invalid file structure
/// - [`Error::OutOfBounds`] - Attempted to read beyond data boundaries
/// - [`Error::NotSupported`] - Unsupported file format or feature
/// - [`Error::Empty`] - Empty input provided
/// - [`Error::FileError`] - Filesystem I/O errors
/// - [`Error::GoblinErr`] - PE parsing errors from the goblin crate
/// - [`Error::RecursionLimit`] - Signature nesting exceeded the configured depth
/// - [`Error::TypeNotFound`] - A token referenced a row that does not exist
/// - [`Error::TypeLoad`] - A type definition could not be described
///
/// ## Sidecar XML
/// - [`Error::CommentsNotFound`] - The documentation file does not exist
/// - [`Error::Format`] - The documentation file is not well-formed or violates the schema
/// - [`Error::DuplicateMember`] - A member key occurs more than once
///
/// ## Descriptors
/// - [`Error::Decode`] - A member's metadata could not be decoded
///
/// # Examples
///
/// ```rust,no_run
/// use dotdoc::{DocParser, Error};
/// use std::path::Path;
///
/// match DocParser::default().parse(Path::new("Library.dll"), true) {
///     Ok(assembly) => println!("{} namespaces", assembly.namespaces.len()),
///     Err(Error::CommentsNotFound(path)) => eprintln!("no sidecar at {}", path.display()),
///     Err(error) => eprintln!("failed: {error}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The file is damaged and could not be parsed.
    ///
    /// Carries the source location where the problem was detected, which makes
    /// crafted-input failures easy to trace.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// Description of the problem
        message: String,
        /// Source file that detected it
        file: &'static str,
        /// Source line that detected it
        line: u32,
    },

    /// An out of bound access was attempted while parsing the file.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// This file type is not supported.
    #[error("This file type is not supported")]
    NotSupported,

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Other errors that don't fit other categories.
    #[error("{0}")]
    Error(String),

    /// Error from the goblin crate while parsing the PE container.
    #[error("{0}")]
    GoblinErr(#[from] goblin::error::Error),

    /// A metadata token pointed at a row that does not exist.
    #[error("Failed to find row for token - {0}")]
    TypeNotFound(Token),

    /// A type definition could not be turned into a descriptor.
    #[error("Failed to load type {name} - {source}")]
    TypeLoad {
        /// Full name of the type, or its token when the name is unreadable too
        name: String,
        /// What went wrong
        source: Box<Error>,
    },

    /// Signature nesting went past the allowed depth.
    #[error("Reach the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),

    /// The documentation sidecar file does not exist.
    #[error("Documentation file not found - {}", .0.display())]
    CommentsNotFound(PathBuf),

    /// The documentation sidecar is not well-formed XML or does not follow the
    /// `doc/members/member[@name]` layout.
    #[error("Invalid documentation file - {0}")]
    Format(String),

    /// More than one `member` element carries the requested key.
    #[error("Documentation key is not unique - {0}")]
    DuplicateMember(String),

    /// A descriptor carried a decode failure for this member.
    #[error("{0}")]
    Decode(#[from] DecodeError),
}

impl From<quick_xml::Error> for Error {
    fn from(error: quick_xml::Error) -> Self {
        Error::Format(error.to_string())
    }
}

/// A decode failure captured inside a descriptor.
///
/// Descriptors are plain cloneable values, so a member whose metadata could not be
/// decoded keeps the failure as text and reports it when the member is documented.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct DecodeError(pub String);

impl From<&Error> for DecodeError {
    fn from(error: &Error) -> Self {
        DecodeError(error.to_string())
    }
}

impl From<Error> for DecodeError {
    fn from(error: Error) -> Self {
        DecodeError(error.to_string())
    }
}
