use std::path::Path;

use anyhow::Context;
use dotdoc::{
    catalogue::TypeDescriptor, CilCatalogue, CommentSource, CommentStore, KeyEncoder,
    ParserConfig, TypeCatalogue,
};
use serde::Serialize;

use crate::{
    app::{GlobalOptions, ParserOptions},
    commands::common::load_sidecar,
    output::{print_output, Columns},
};

#[derive(Debug, Serialize)]
struct KeyEntry {
    key: String,
    documented: bool,
}

#[derive(Debug, Serialize)]
struct KeysOutput {
    keys: Vec<KeyEntry>,
    documented: usize,
    count: usize,
    failures: Vec<String>,
}

pub fn run(
    path: &Path,
    undocumented: bool,
    parser: &ParserOptions,
    opts: &GlobalOptions,
) -> anyhow::Result<()> {
    let config = parser.config();
    let catalogue = CilCatalogue::from_file(path)
        .with_context(|| format!("failed to load assembly: {}", path.display()))?
        .with_max_depth(config.max_signature_depth);
    let sidecar = load_sidecar(path, &config)?;

    let mut keys = Vec::new();
    let mut failures = Vec::new();
    for ty in catalogue.visible_types() {
        match ty {
            Ok(ty) => type_keys(&ty, &config, &mut keys, &mut failures),
            Err(error) => failures.push(format!("type skipped: {error}")),
        }
    }

    let mut entries: Vec<KeyEntry> = keys
        .into_iter()
        .map(|key| KeyEntry {
            documented: is_documented(sidecar.as_ref(), &key, &mut failures),
            key,
        })
        .collect();
    let count = entries.len();
    let documented = entries.iter().filter(|entry| entry.documented).count();
    if undocumented {
        entries.retain(|entry| !entry.documented);
    }

    let output = KeysOutput {
        keys: entries,
        documented,
        count,
        failures,
    };

    print_output(&output, opts, |out| {
        let mut table = Columns::new(&["Doc", "Key"]);
        for entry in &out.keys {
            table.row([if entry.documented { "yes" } else { "no" }, entry.key.as_str()]);
        }
        table.print();

        for failure in &out.failures {
            println!("! {failure}");
        }
        println!("\n{} of {} key(s) documented.", out.documented, out.count);
    })
}

/// Keys of `ty` and the members the walker would list under `config`, then fields and
/// events.
fn type_keys(
    ty: &TypeDescriptor,
    config: &ParserConfig,
    keys: &mut Vec<String>,
    failures: &mut Vec<String>,
) {
    let encoder: KeyEncoder = config.key_encoder();
    keys.push(encoder.type_key(ty));

    let constructors = ty
        .constructors
        .iter()
        .filter(|ctor| config.include_non_public_constructors || ctor.attributes.is_public());
    let methods = ty
        .methods
        .iter()
        .filter(|method| config.include_non_public_methods || method.attributes.is_public());
    for method in constructors.chain(methods) {
        match encoder.method_key(ty, method) {
            Ok(key) => keys.push(key),
            Err(error) => failures.push(format!("{}.{}: {error}", ty.full_name(), method.name)),
        }
    }

    for property in &ty.properties {
        if !config.include_non_public_properties && !property.is_public {
            continue;
        }
        match encoder.property_key(ty, property) {
            Ok(key) => keys.push(key),
            Err(error) => failures.push(format!("{}.{}: {error}", ty.full_name(), property.name)),
        }
    }

    keys.extend(
        ty.fields
            .iter()
            .filter(|field| field.attributes.is_public())
            .map(|field| encoder.field_key(ty, field)),
    );
    keys.extend(
        ty.events
            .iter()
            .filter(|event| event.is_public)
            .map(|event| encoder.event_key(ty, event)),
    );
}

fn is_documented(sidecar: Option<&CommentStore>, key: &str, failures: &mut Vec<String>) -> bool {
    let Some(store) = sidecar else {
        return false;
    };
    match store.comments(key) {
        Ok(found) => found.is_some(),
        Err(error) => {
            failures.push(format!("{key}: {error}"));
            false
        }
    }
}
