use std::{
    borrow::Cow,
    collections::{HashMap, HashSet},
    path::Path,
    str::FromStr,
};

use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};

use crate::{
    comments::{CommentSource, ExceptionComment, MemberComments, ParamComment},
    Error::{self, CommentsNotFound, DuplicateMember, Format},
    Result,
};

const DOC: &str = "doc";
const ASSEMBLY: &str = "assembly";
const MEMBERS: &str = "members";
const MEMBER: &str = "member";
const NAME: &str = "name";

/// A loaded sidecar file, indexed by member key.
///
/// Immutable once built; lookups take `&self` and the store is `Send + Sync`.
#[derive(Debug, Default)]
pub struct CommentStore {
    assembly_name: Option<String>,
    members: HashMap<String, MemberComments>,
    duplicates: HashSet<String>,
}

impl CommentStore {
    /// Load and validate the sidecar at `path`.
    ///
    /// # Errors
    /// Returns [`crate::Error::CommentsNotFound`] if there is no such file,
    /// [`crate::Error::FileError`] if it cannot be read and [`crate::Error::Format`] if
    /// it is not a well-formed doc-comment file.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(CommentsNotFound(path.to_path_buf()));
        }

        let xml = std::fs::read_to_string(path)?;
        Self::from_xml(&xml)
    }

    /// Parse and validate a sidecar held in memory.
    ///
    /// The root must be `doc`; it may contain `assembly` and `members`, and `members` may
    /// only contain `member` elements with a non-empty `name`. Anything inside a `member`
    /// is free-form.
    ///
    /// # Errors
    /// Returns [`crate::Error::Format`] for malformed XML or a layout violation.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);

        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);

        let mut loader = Loader::default();
        loop {
            match reader.read_event()? {
                Event::Start(element) => loader.open(&element)?,
                Event::Empty(element) => {
                    loader.open(&element)?;
                    loader.close()?;
                }
                Event::End(_) => loader.close()?,
                Event::Text(text) => loader.text(&text.unescape()?)?,
                Event::CData(data) => {
                    let data = data.into_inner();
                    let text = std::str::from_utf8(&data)
                        .map_err(|error| Format(format!("CDATA is not UTF-8: {error}")))?;
                    loader.text(text)?;
                }
                Event::Eof => break,
                Event::Decl(_) | Event::PI(_) | Event::DocType(_) | Event::Comment(_) => {}
            }
        }

        loader.finish()
    }

    /// Value of `doc/assembly/name`, when present.
    #[must_use]
    pub fn assembly_name(&self) -> Option<&str> {
        self.assembly_name.as_deref()
    }

    /// Number of distinct member keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True if no member is documented.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// True if `key` is documented, ambiguous or not.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.members.contains_key(key)
    }

    /// All member keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }

    /// The comments stored under `key`.
    ///
    /// # Errors
    /// Returns [`crate::Error::DuplicateMember`] if more than one `member` carries `key`.
    pub fn lookup(&self, key: &str) -> Result<Option<&MemberComments>> {
        if self.duplicates.contains(key) {
            return Err(DuplicateMember(key.to_string()));
        }

        Ok(self.members.get(key))
    }
}

impl CommentSource for CommentStore {
    fn comments(&self, key: &str) -> Result<Option<&MemberComments>> {
        self.lookup(key)
    }
}

impl FromStr for CommentStore {
    type Err = Error;

    fn from_str(xml: &str) -> Result<Self> {
        Self::from_xml(xml)
    }
}

/// Which part of a `member` is being collected.
enum Section {
    Summary,
    Remarks,
    Returns,
    Example,
    Param(String),
    Exception(String),
    Other,
}

/// A member element under construction.
struct OpenMember {
    key: String,
    comments: MemberComments,
    seen: [bool; 4],
    section: Option<(Section, String)>,
}

impl OpenMember {
    fn new(key: String) -> Self {
        OpenMember {
            key,
            comments: MemberComments::default(),
            seen: [false; 4],
            section: None,
        }
    }

    fn begin(&mut self, element: &BytesStart<'_>, name: &str) -> Result<()> {
        let section = match name {
            "summary" => Section::Summary,
            "remarks" => Section::Remarks,
            "returns" => Section::Returns,
            "example" => Section::Example,
            "param" => Section::Param(attribute(element, "name")?.unwrap_or_default()),
            "exception" => Section::Exception(attribute(element, "cref")?.unwrap_or_default()),
            _ => Section::Other,
        };
        self.section = Some((section, String::new()));
        Ok(())
    }

    fn end(&mut self) {
        let Some((section, text)) = self.section.take() else {
            return;
        };
        let text = text.trim().to_string();

        let slot = match section {
            Section::Summary => 0,
            Section::Remarks => 1,
            Section::Returns => 2,
            Section::Example => 3,
            Section::Param(name) => {
                self.comments.params.push(ParamComment {
                    name,
                    description: text,
                });
                return;
            }
            Section::Exception(cref) => {
                self.comments.exceptions.push(ExceptionComment {
                    cref,
                    description: text,
                });
                return;
            }
            Section::Other => return,
        };

        if self.seen[slot] {
            return;
        }
        self.seen[slot] = true;

        let target = match slot {
            0 => &mut self.comments.summary,
            1 => &mut self.comments.remarks,
            2 => &mut self.comments.returns,
            _ => &mut self.comments.example,
        };
        *target = text;
    }
}

/// Event sink that validates the layout and fills a [`CommentStore`].
#[derive(Default)]
struct Loader {
    path: Vec<String>,
    seen_root: bool,
    member: Option<OpenMember>,
    store: CommentStore,
}

impl Loader {
    fn open(&mut self, element: &BytesStart<'_>) -> Result<()> {
        let name = String::from_utf8_lossy(element.local_name().as_ref()).into_owned();
        let parent = self.path.last().map(String::as_str);

        match (self.path.len(), parent) {
            (0, _) => {
                if self.seen_root {
                    return Err(Format("document has more than one root element".into()));
                }
                if name != DOC {
                    return Err(Format(format!("root element is <{name}>, expected <{DOC}>")));
                }
                self.seen_root = true;
            }
            (1, _) => {
                if name != ASSEMBLY && name != MEMBERS {
                    return Err(Format(format!("unexpected <{name}> inside <{DOC}>")));
                }
            }
            (2, Some(MEMBERS)) => {
                if name != MEMBER {
                    return Err(Format(format!("unexpected <{name}> inside <{MEMBERS}>")));
                }
                let key = attribute(element, NAME)?.unwrap_or_default();
                if key.is_empty() {
                    return Err(Format(format!("<{MEMBER}> without a {NAME} attribute")));
                }
                self.member = Some(OpenMember::new(key));
            }
            (3, Some(MEMBER)) => {
                if let Some(member) = self.member.as_mut() {
                    member.begin(element, &name)?;
                }
            }
            _ => {}
        }

        self.path.push(name);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let depth = self.path.len();
        let Some(name) = self.path.pop() else {
            return Err(Format("closing tag without an open element".into()));
        };

        match depth {
            4 => {
                if let Some(member) = self.member.as_mut() {
                    member.end();
                }
            }
            3 if name == MEMBER => {
                if let Some(member) = self.member.take() {
                    self.insert(member);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<()> {
        if let Some((_, buffer)) = self.member.as_mut().and_then(|m| m.section.as_mut()) {
            buffer.push_str(text);
            return Ok(());
        }

        let in_assembly_name = self.path.len() == 3
            && self.path[1] == ASSEMBLY
            && self.path[2] == NAME;
        if in_assembly_name {
            self.store
                .assembly_name
                .get_or_insert_with(String::new)
                .push_str(text.trim());
            return Ok(());
        }

        if self.path.len() <= 2 && !text.trim().is_empty() {
            let context = self.path.last().map_or("document", String::as_str);
            return Err(Format(format!("unexpected text in {context}")));
        }
        Ok(())
    }

    fn insert(&mut self, member: OpenMember) {
        let store = &mut self.store;
        if store.members.contains_key(&member.key) {
            store.duplicates.insert(member.key);
        } else {
            store.members.insert(member.key, member.comments);
        }
    }

    fn finish(self) -> Result<CommentStore> {
        if !self.seen_root {
            return Err(Format(format!("document has no <{DOC}> root")));
        }
        if let Some(open) = self.path.last() {
            return Err(Format(format!("element <{open}> is not closed")));
        }
        Ok(self.store)
    }
}

fn attribute(element: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    let attribute = element
        .try_get_attribute(name)
        .map_err(|error| Format(error.to_string()))?;

    match attribute {
        Some(attribute) => {
            let value: Cow<'_, str> = attribute
                .unescape_value()
                .map_err(|error| Format(error.to_string()))?;
            Ok(Some(value.into_owned()))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0"?>
<doc>
    <assembly>
        <name>Sample</name>
    </assembly>
    <members>
        <member name="T:N.C">
            <summary>
            A class with <see cref="T:N.D"/> links.
            </summary>
            <remarks>Remarks &amp; more.</remarks>
        </member>
        <member name="M:N.C.Foo(System.Int32)">
            <summary>Foo does things.</summary>
            <summary>Ignored second summary.</summary>
            <param name="value">  The value. </param>
            <returns><![CDATA[a <raw> result]]></returns>
            <example><code>c.Foo(1);</code></example>
            <exception cref="T:System.ArgumentException">When negative.</exception>
        </member>
        <member name="P:N.C.Empty"/>
        <member name="F:N.C.Twice"><summary>one</summary></member>
        <member name="F:N.C.Twice"><summary>two</summary></member>
    </members>
</doc>
"#;

    #[test]
    fn load_and_lookup() {
        let store = CommentStore::from_xml(SAMPLE).unwrap();
        assert_eq!(store.assembly_name(), Some("Sample"));
        assert_eq!(store.len(), 4);

        let class = store.lookup("T:N.C").unwrap().unwrap();
        assert_eq!(class.summary, "A class with  links.");
        assert_eq!(class.remarks, "Remarks & more.");
        assert_eq!(class.returns, "");

        let foo = store.lookup("M:N.C.Foo(System.Int32)").unwrap().unwrap();
        assert_eq!(foo.summary, "Foo does things.");
        assert_eq!(foo.param("value"), Some("The value."));
        assert_eq!(foo.returns, "a <raw> result");
        assert_eq!(foo.example, "c.Foo(1);");
        assert_eq!(foo.exceptions.len(), 1);
        assert_eq!(foo.exceptions[0].cref, "T:System.ArgumentException");
        assert_eq!(foo.exceptions[0].description, "When negative.");

        let empty = store.lookup("P:N.C.Empty").unwrap().unwrap();
        assert_eq!(empty, &MemberComments::default());
    }

    #[test]
    fn exact_match_only() {
        let store = CommentStore::from_xml(SAMPLE).unwrap();
        assert!(store.lookup("t:N.C").unwrap().is_none());
        assert!(store.lookup("T:N.C ").unwrap().is_none());
        assert!(store.lookup("M:N.C.Foo").unwrap().is_none());
        assert!(store.comments("T:Missing").unwrap().is_none());
    }

    #[test]
    fn duplicate_keys() {
        let store = CommentStore::from_xml(SAMPLE).unwrap();
        assert!(store.contains("F:N.C.Twice"));
        assert!(matches!(
            store.lookup("F:N.C.Twice"),
            Err(DuplicateMember(key)) if key == "F:N.C.Twice"
        ));
        assert!(store.lookup("T:N.C").is_ok());
    }

    #[test]
    fn layout_violations() {
        let cases = [
            "",
            "<docs><members/></docs>",
            "<doc><members><item name=\"T:X\"/></members></doc>",
            "<doc><members><member/></members></doc>",
            "<doc><members><member name=\"\"/></members></doc>",
            "<doc><extra/></doc>",
            "<doc>loose text</doc>",
            "<doc><members>",
            "<doc><members></doc>",
            "<doc/><doc/>",
        ];

        for xml in cases {
            assert!(
                matches!(CommentStore::from_xml(xml), Err(Format(_))),
                "accepted: {xml:?}"
            );
        }
    }

    #[test]
    fn minimal_documents() {
        let store = CommentStore::from_xml("\u{feff}<doc/>").unwrap();
        assert!(store.is_empty());
        assert_eq!(store.assembly_name(), None);

        let store: CommentStore = "<doc><members/></doc>".parse().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Sample.xml");

        assert!(matches!(
            CommentStore::from_file(&path),
            Err(CommentsNotFound(missing)) if missing == path
        ));

        std::fs::write(&path, SAMPLE).unwrap();
        let store = CommentStore::from_file(&path).unwrap();
        assert_eq!(store.keys().count(), 4);

        std::fs::write(&path, "<doc><members>").unwrap();
        assert!(matches!(CommentStore::from_file(&path), Err(Format(_))));
    }
}
