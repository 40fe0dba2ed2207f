//! Doc-comment sidecar files.
//!
//! Compilers write the `///` comments of a library into an XML file next to the binary:
//!
//! ```xml
//! <doc>
//!   <assembly><name>Library</name></assembly>
//!   <members>
//!     <member name="M:N.C.Foo(System.Int32)">
//!       <summary>Does foo.</summary>
//!       <param name="value">The input.</param>
//!     </member>
//!   </members>
//! </doc>
//! ```
//!
//! [`CommentStore`] validates that layout while loading and indexes every `member` by its
//! `name` attribute, a key as produced by [`crate::dockey::KeyEncoder`]. Lookups are exact
//! and case-sensitive.
//!
//! # Examples
//!
//! ```rust
//! use dotdoc::comments::{CommentSource, CommentStore};
//!
//! let store = CommentStore::from_xml(
//!     r#"<doc><members><member name="T:N.C"><summary> A class. </summary></member></members></doc>"#,
//! )?;
//! let comments = store.comments("T:N.C")?.expect("documented");
//! assert_eq!(comments.summary, "A class.");
//! assert!(store.comments("T:N.D")?.is_none());
//! # Ok::<(), dotdoc::Error>(())
//! ```

mod store;

pub use store::CommentStore;

use crate::Result;

/// The prose extracted from one `member` element.
///
/// Every text is whitespace-trimmed; missing elements are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberComments {
    /// `<summary>`
    pub summary: String,
    /// `<remarks>`
    pub remarks: String,
    /// `<returns>`
    pub returns: String,
    /// `<example>`
    pub example: String,
    /// `<param name="...">`, in document order
    pub params: Vec<ParamComment>,
    /// `<exception cref="...">`, in document order
    pub exceptions: Vec<ExceptionComment>,
}

impl MemberComments {
    /// Description of the parameter called `name`; the first match wins.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|param| param.name == name)
            .map(|param| param.description.as_str())
    }
}

/// A `<param>` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamComment {
    /// Value of the `name` attribute
    pub name: String,
    /// Trimmed text
    pub description: String,
}

/// An `<exception>` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExceptionComment {
    /// Value of the `cref` attribute, e.g. `T:System.ArgumentNullException`
    pub cref: String,
    /// Trimmed text
    pub description: String,
}

/// Anything that answers member-key lookups.
///
/// The walker only depends on this trait, so tests and callers can substitute their own
/// sources.
pub trait CommentSource {
    /// The comments stored under `key`.
    ///
    /// Returns `Ok(None)` for a key that is not documented.
    ///
    /// # Errors
    /// Fails when the key cannot be answered, e.g. because it is ambiguous.
    fn comments(&self, key: &str) -> Result<Option<&MemberComments>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_lookup() {
        let comments = MemberComments {
            params: vec![
                ParamComment {
                    name: "a".into(),
                    description: "first".into(),
                },
                ParamComment {
                    name: "a".into(),
                    description: "shadowed".into(),
                },
                ParamComment {
                    name: "b".into(),
                    description: String::new(),
                },
            ],
            ..Default::default()
        };

        assert_eq!(comments.param("a"), Some("first"));
        assert_eq!(comments.param("b"), Some(""));
        assert_eq!(comments.param("A"), None);
    }
}
