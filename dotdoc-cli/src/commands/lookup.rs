use std::path::Path;

use anyhow::Context;
use dotdoc::{CommentStore, MemberKind};
use serde::Serialize;

use crate::{
    app::GlobalOptions,
    output::{print_output, Columns},
};

#[derive(Debug, Serialize)]
struct Param {
    name: String,
    description: String,
}

#[derive(Debug, Serialize)]
struct Exception {
    cref: String,
    description: String,
}

#[derive(Debug, Serialize)]
struct LookupOutput {
    key: String,
    kind: Option<String>,
    found: bool,
    summary: String,
    remarks: String,
    returns: String,
    example: String,
    params: Vec<Param>,
    exceptions: Vec<Exception>,
}

pub fn run(xml: &Path, key: &str, opts: &GlobalOptions) -> anyhow::Result<()> {
    let store = CommentStore::from_file(xml)
        .with_context(|| format!("failed to read documentation: {}", xml.display()))?;
    let comments = store
        .lookup(key)
        .with_context(|| format!("cannot answer {key}"))?;

    let mut output = LookupOutput {
        key: key.to_string(),
        kind: MemberKind::of(key).map(|kind| format!("{kind:?}")),
        found: comments.is_some(),
        summary: String::new(),
        remarks: String::new(),
        returns: String::new(),
        example: String::new(),
        params: Vec::new(),
        exceptions: Vec::new(),
    };
    if let Some(comments) = comments {
        output.summary.clone_from(&comments.summary);
        output.remarks.clone_from(&comments.remarks);
        output.returns.clone_from(&comments.returns);
        output.example.clone_from(&comments.example);
        output.params = comments
            .params
            .iter()
            .map(|param| Param {
                name: param.name.clone(),
                description: param.description.clone(),
            })
            .collect();
        output.exceptions = comments
            .exceptions
            .iter()
            .map(|exception| Exception {
                cref: exception.cref.clone(),
                description: exception.description.clone(),
            })
            .collect();
    }

    print_output(&output, opts, |out| {
        if !out.found {
            println!("{}: not documented in {}", out.key, xml.display());
            return;
        }

        println!("{}", out.key);
        for (label, text) in [
            ("Summary", &out.summary),
            ("Remarks", &out.remarks),
            ("Returns", &out.returns),
            ("Example", &out.example),
        ] {
            if !text.is_empty() {
                println!("\n{label}:\n  {text}");
            }
        }

        if !out.params.is_empty() {
            println!("\nParameters:");
            let mut params = Columns::new(&["Name", "Description"]).indent("  ");
            for param in &out.params {
                params.row([param.name.as_str(), param.description.as_str()]);
            }
            params.print();
        }

        if !out.exceptions.is_empty() {
            println!("\nExceptions:");
            let mut exceptions = Columns::new(&["Type", "When"]).indent("  ");
            for exception in &out.exceptions {
                exceptions.row([exception.cref.as_str(), exception.description.as_str()]);
            }
            exceptions.print();
        }
    })
}
