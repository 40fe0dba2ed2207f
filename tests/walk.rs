//! Walks over in-memory catalogues.
//!
//! These tests drive the public API without any binary: descriptors are built by hand and
//! the documentation comes from an XML string or from a custom [`CommentSource`].

use dotdoc::{
    catalogue::{
        AssemblyIdentity, MethodDescriptor, MethodSig, ParamDescriptor, StaticCatalogue,
        TypeDescriptor, TypeKind, TypeName, TypeSig,
    },
    metadata::typesystem::MethodAttributes,
    CommentSource, CommentStore, DocParser, Error, KeyEncoder, MemberComments, MemberKind,
    Result,
};

fn identity() -> AssemblyIdentity {
    AssemblyIdentity::new(
        uguid::guid!("0f0e0d0c-0b0a-0908-0706-050403020100"),
        "N",
        [3, 0, 0, 0],
    )
}

fn class(namespace: &str, name: &str) -> TypeDescriptor {
    let mut ty = TypeDescriptor::new(TypeName::new(namespace, name), TypeKind::CLASS | TypeKind::PUBLIC);
    ty.bases.push(TypeSig::system("Object"));
    ty
}

fn method(name: &str, params: Vec<ParamDescriptor>) -> MethodDescriptor {
    MethodDescriptor::new(
        name,
        MethodAttributes::PUBLIC | MethodAttributes::HIDE_BY_SIG,
        MethodSig::new(TypeSig::void(), params),
    )
}

fn int(name: &str) -> ParamDescriptor {
    ParamDescriptor::new(name, TypeSig::system("Int32"))
}

fn dictionary(key: TypeSig, value: TypeSig) -> TypeSig {
    TypeSig::generic(
        TypeName::new("System.Collections.Generic", "Dictionary`2"),
        vec![key, value],
    )
}

#[test]
fn member_keys() {
    let encoder = KeyEncoder::default();
    let ty = class("N", "C");

    let foo = method("Foo", vec![int("value")]);
    let key = encoder.method_key(&ty, &foo).unwrap();
    assert_eq!(key, "M:N.C.Foo(System.Int32)");
    assert_eq!(encoder.method_key(&ty, &foo).unwrap(), key);
    assert_eq!(MemberKind::of(&key), Some(MemberKind::Method));

    let bar = method(
        "Bar",
        vec![
            ParamDescriptor::new("a", TypeSig::sz_array(TypeSig::system("Int32"))),
            ParamDescriptor::new("b", dictionary(TypeSig::system("String"), TypeSig::system("Int32"))),
        ],
    );
    assert_eq!(
        encoder.method_key(&ty, &bar).unwrap(),
        "M:N.C.Bar(System.Int32[],System.Collections.Generic.Dictionary{System.String,System.Int32})"
    );

    let ctor = MethodDescriptor::new(
        ".ctor",
        MethodAttributes::PUBLIC | MethodAttributes::SPECIAL_NAME | MethodAttributes::RT_SPECIAL_NAME,
        MethodSig::new(TypeSig::void(), vec![]),
    );
    let ctor_key = encoder.method_key(&ty, &ctor).unwrap();
    assert_eq!(ctor_key, "M:N.C.#ctor");
    assert_eq!(MemberKind::of(&ctor_key), Some(MemberKind::Constructor));
    assert_eq!(encoder.type_key(&ty), "T:N.C");
}

#[test]
fn round_trip_through_the_store() {
    let mut ty = class("N", "C");
    ty.methods.push(method("Foo", vec![int("value")]));
    let catalogue = StaticCatalogue::new(identity()).with_type(ty);

    let comments = CommentStore::from_xml(
        r#"<doc>
             <assembly><name>N</name></assembly>
             <members>
               <member name="M:N.C.Foo(System.Int32)">
                 <summary>Does foo.</summary>
                 <param name="value">A number.</param>
               </member>
             </members>
           </doc>"#,
    )
    .unwrap();
    assert_eq!(comments.assembly_name(), Some("N"));

    let assembly = DocParser::default().walk(&catalogue, &comments, "N.dll").unwrap();
    assert_eq!(assembly.full_name, "N, Version=3.0.0.0, Culture=neutral, PublicKeyToken=null");

    let foo = &assembly.find_type("N.C").unwrap().methods[0];
    assert_eq!(foo.comments.summary, "Does foo.");
    assert_eq!(foo.parameters[0].description, "A number.");
    assert_eq!(foo.comments.id, "Foo");
    assert!(!foo.comments.use_hash_code_for_id);
}

#[test]
fn overloads_and_lone_methods() {
    let mut ty = class("N", "C");
    ty.methods.push(method("Foo", vec![int("a")]));
    ty.methods.push(method("Foo", vec![int("a"), int("b")]));
    ty.methods.push(method("Bar", vec![]));
    let catalogue = StaticCatalogue::new(identity()).with_type(ty);
    let comments = CommentStore::from_xml("<doc><members/></doc>").unwrap();

    let first = DocParser::default().walk(&catalogue, &comments, "N.dll").unwrap();
    let methods = &first.find_type("N.C").unwrap().methods;

    let foos: Vec<_> = methods.iter().filter(|m| m.comments.name == "Foo").collect();
    assert!(foos.iter().all(|foo| foo.comments.use_hash_code_for_id));
    assert_ne!(foos[0].comments.id, foos[1].comments.id);

    let bar = methods.iter().find(|m| m.comments.name == "Bar").unwrap();
    assert!(!bar.comments.use_hash_code_for_id);
    assert_eq!(bar.comments.id, "Bar");

    // ids do not depend on the process
    let second = DocParser::default().walk(&catalogue, &comments, "N.dll").unwrap();
    assert_eq!(first, second);
}

#[test]
fn classes_sort_by_name() {
    let catalogue = StaticCatalogue::new(identity())
        .with_type(class("N", "Zeta"))
        .with_type(class("N", "Alpha"))
        .with_type(class("N", "Mu"));
    let comments = CommentStore::from_xml("<doc><members/></doc>").unwrap();

    let assembly = DocParser::default().walk(&catalogue, &comments, "N.dll").unwrap();
    let names: Vec<&str> = assembly.namespaces[0]
        .classes
        .iter()
        .map(|ty| ty.comments.name.as_str())
        .collect();
    assert_eq!(names, ["Alpha", "Mu", "Zeta"]);
}

/// Serves an XML store, except for one key where it fails.
struct Flaky {
    store: CommentStore,
    poisoned: &'static str,
}

impl CommentSource for Flaky {
    fn comments(&self, key: &str) -> Result<Option<&MemberComments>> {
        if key == self.poisoned {
            return Err(Error::Error(format!("lookup of {key} failed")));
        }
        self.store.comments(key)
    }
}

#[test]
fn one_failing_member_leaves_the_rest_intact() {
    let mut ty = class("N", "C");
    for name in ["First", "Second", "Third"] {
        ty.methods.push(method(name, vec![]));
    }
    let catalogue = StaticCatalogue::new(identity()).with_type(ty);

    let store = CommentStore::from_xml(
        r#"<doc><members>
             <member name="T:N.C"><summary>The type.</summary></member>
             <member name="M:N.C.First"><summary>One.</summary><remarks>First remark.</remarks></member>
             <member name="M:N.C.Second"><summary>Two.</summary><remarks>Second remark.</remarks></member>
             <member name="M:N.C.Third"><summary>Three.</summary><remarks>Third remark.</remarks></member>
           </members></doc>"#,
    )
    .unwrap();
    let comments = Flaky {
        store,
        poisoned: "M:N.C.Second",
    };

    let assembly = DocParser::default().walk(&catalogue, &comments, "N.dll").unwrap();
    let ty = assembly.find_type("N.C").unwrap();
    assert_eq!(ty.comments.summary, "The type.");
    assert!(!ty.comments.load_error);

    let second = ty.methods.iter().find(|m| m.comments.name == "Second").unwrap();
    assert!(second.comments.load_error);
    assert_eq!(second.comments.fullname, "lookup of M:N.C.Second failed");

    for name in ["First", "Third"] {
        let method = ty.methods.iter().find(|m| m.comments.name == name).unwrap();
        assert!(!method.comments.load_error);
        assert!(!method.comments.summary.is_empty());
        assert!(!method.comments.remarks.is_empty());
    }
}

#[test]
fn duplicate_keys_fail_only_their_member() {
    let mut ty = class("N", "C");
    ty.methods.push(method("Twice", vec![]));
    ty.methods.push(method("Once", vec![]));
    let catalogue = StaticCatalogue::new(identity()).with_type(ty);

    let comments = CommentStore::from_xml(
        r#"<doc><members>
             <member name="M:N.C.Twice"><summary>A.</summary></member>
             <member name="M:N.C.Twice"><summary>B.</summary></member>
             <member name="M:N.C.Once"><summary>C.</summary></member>
           </members></doc>"#,
    )
    .unwrap();

    let assembly = DocParser::default().walk(&catalogue, &comments, "N.dll").unwrap();
    let methods = &assembly.find_type("N.C").unwrap().methods;
    assert!(methods.iter().find(|m| m.comments.name == "Twice").unwrap().comments.load_error);
    assert_eq!(
        methods.iter().find(|m| m.comments.name == "Once").unwrap().comments.summary,
        "C."
    );
}

#[test]
fn summary_needs_no_comments() {
    let catalogue = StaticCatalogue::new(identity()).with_type(class("N", "C"));

    let assembly = DocParser::default().summarize(&catalogue, "N.dll").unwrap();
    assert_eq!(assembly.name, "N");
    assert_eq!(assembly.file_name, "N.dll");
    assert!(assembly.namespaces.is_empty());
}
