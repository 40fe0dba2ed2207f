use std::path::Path;

use anyhow::Context;
use dotdoc::{Assembly, CommentStore, DocParser, ParserConfig};

/// Parse `path` with `config`, with the path in the error.
pub fn load_assembly(path: &Path, config: ParserConfig, include_namespaces: bool) -> anyhow::Result<Assembly> {
    DocParser::new(config)
        .parse(path, include_namespaces)
        .with_context(|| format!("failed to document assembly: {}", path.display()))
}

/// The documentation file next to `binary`, or `None` if there is none.
pub fn load_sidecar(binary: &Path, config: &ParserConfig) -> anyhow::Result<Option<CommentStore>> {
    let sidecar = binary.with_extension(&config.comments_extension);
    if !sidecar.is_file() {
        log::warn!("{}: no documentation file, every key is reported undocumented", sidecar.display());
        return Ok(None);
    }

    CommentStore::from_file(&sidecar)
        .map(Some)
        .with_context(|| format!("failed to read documentation: {}", sidecar.display()))
}

/// `text` cut to `width` characters, with an ellipsis when something was dropped.
pub fn shorten(text: &str, width: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= width {
        return flat;
    }
    let mut cut: String = flat.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
