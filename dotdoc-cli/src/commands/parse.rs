use std::path::Path;

use dotdoc::{Assembly, TypeBase};

use crate::{
    app::{GlobalOptions, ParserOptions},
    commands::common::{load_assembly, shorten},
    output::{print_output, Columns},
};

const SUMMARY_WIDTH: usize = 72;

pub fn run(
    path: &Path,
    include_namespaces: bool,
    parser: &ParserOptions,
    opts: &GlobalOptions,
) -> anyhow::Result<()> {
    let assembly = load_assembly(path, parser.config(), include_namespaces)?;

    print_output(&assembly, opts, |assembly| {
        println!("{}", assembly.full_name);
        println!("  Id:   {}", assembly.id);
        println!("  File: {}", assembly.file_name);
        if include_namespaces {
            print_namespaces(assembly);
        }
    })
}

fn print_namespaces(assembly: &Assembly) {
    let mut types = 0;
    let mut failed = 0;

    for namespace in &assembly.namespaces {
        let name = if namespace.name.is_empty() {
            "<global>"
        } else {
            namespace.name.as_str()
        };
        println!("\nnamespace {name} ({} types)", namespace.count_all_types());

        for ty in namespace.all_types() {
            types += 1;
            failed += print_type(ty);
        }
    }

    println!("\n{types} type(s) documented.");
    if failed > 0 {
        println!("{failed} member(s) without documentation due to errors.");
    }
}

/// Print one type and its members; returns the number of failed members.
fn print_type(ty: &TypeBase) -> usize {
    println!("\n  {} {}", ty.object_type, ty.comments.fullname);
    if !ty.parent_class.is_empty() {
        println!("    : {}", ty.parent_class);
    }
    if !ty.comments.summary.is_empty() {
        println!("    {}", shorten(&ty.comments.summary, SUMMARY_WIDTH));
    }

    let mut failed = 0;
    let mut members = Columns::new(&["Kind", "Member", "Summary"]).indent("    ");
    let mut add = |kind: &str, fullname: &str, summary: &str, load_error: bool| {
        if load_error {
            failed += 1;
            members.row([kind.to_string(), format!("! {fullname}"), String::new()]);
        } else {
            members.row([kind.to_string(), fullname.to_string(), shorten(summary, SUMMARY_WIDTH)]);
        }
    };

    for ctor in &ty.constructors {
        add("ctor", &ctor.comments.fullname, &ctor.comments.summary, ctor.comments.load_error);
    }
    for method in &ty.methods {
        add("method", &method.comments.fullname, &method.comments.summary, method.comments.load_error);
    }
    for property in &ty.properties {
        add(
            "property",
            &property.comments.fullname,
            &property.comments.summary,
            property.comments.load_error,
        );
    }
    for member in &ty.members {
        add("value", &member.name, &member.description, false);
    }

    if !members.is_empty() {
        println!();
        members.print();
    }
    failed
}
