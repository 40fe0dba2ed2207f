//! A cache of parsed assemblies for long-running hosts.
//!
//! [`crate::DocParser::parse`] is stateless: every call reads the binary and its sidecar
//! again. A host that serves the same trees repeatedly keeps them in an
//! [`AssemblyCache`], which it owns and passes around explicitly.
//!
//! Entries are keyed by the module version id of the binary, so loading a rebuilt binary
//! adds a new entry while loading the same build twice replaces the old one. Every entry
//! remembers the path it came from, which lets [`AssemblyCache::rebuild`] re-read all of
//! them after the files on disk changed.
//!
//! # Thread Safety
//!
//! All operations take `&self`. Trees are handed out as `Arc<Assembly>` and stay valid
//! after the entry is removed or replaced.
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotdoc::{AssemblyCache, DocParser};
//! use std::path::Path;
//!
//! let cache = AssemblyCache::new(DocParser::default());
//! let assembly = cache.load(Path::new("Library.dll"))?;
//! assert!(cache.get(&assembly.id).is_some());
//!
//! // the files were replaced on disk
//! let failures = cache.rebuild();
//! for (path, error) in failures {
//!     eprintln!("{} dropped: {error}", path.display());
//! }
//! # Ok::<(), dotdoc::Error>(())
//! ```

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use dashmap::DashMap;
use rayon::prelude::*;

use crate::{model::Assembly, DocParser, Error, Result};

struct CacheEntry {
    path: PathBuf,
    assembly: Arc<Assembly>,
}

/// Parsed assemblies keyed by module version id.
pub struct AssemblyCache {
    parser: DocParser,
    entries: DashMap<uguid::Guid, CacheEntry>,
}

impl AssemblyCache {
    /// An empty cache that parses with `parser`.
    #[must_use]
    pub fn new(parser: DocParser) -> Self {
        AssemblyCache {
            parser,
            entries: DashMap::new(),
        }
    }

    /// The parser used for loading.
    #[must_use]
    pub fn parser(&self) -> &DocParser {
        &self.parser
    }

    /// Parse the binary at `path` with its sidecar and cache the tree.
    ///
    /// An entry with the same id is replaced.
    ///
    /// # Errors
    /// Returns the parse failure; the cache is left unchanged.
    pub fn load(&self, path: &Path) -> Result<Arc<Assembly>> {
        let assembly = Arc::new(self.parser.parse(path, true)?);
        self.insert(path.to_path_buf(), assembly.clone());
        Ok(assembly)
    }

    fn insert(&self, path: PathBuf, assembly: Arc<Assembly>) {
        let id = assembly.id;
        if let Some(previous) = self.entries.insert(id, CacheEntry { path, assembly }) {
            log::debug!("replaced cached assembly {} ({})", id, previous.path.display());
        }
    }

    /// The tree with module version id `id`.
    #[must_use]
    pub fn get(&self, id: &uguid::Guid) -> Option<Arc<Assembly>> {
        self.entries.get(id).map(|entry| entry.assembly.clone())
    }

    /// The path the tree with id `id` was loaded from.
    #[must_use]
    pub fn path(&self, id: &uguid::Guid) -> Option<PathBuf> {
        self.entries.get(id).map(|entry| entry.path.clone())
    }

    /// True if a tree with id `id` is cached.
    #[must_use]
    pub fn contains(&self, id: &uguid::Guid) -> bool {
        self.entries.contains_key(id)
    }

    /// Every cached tree, ordered by assembly name and then by path.
    #[must_use]
    pub fn iter(&self) -> std::vec::IntoIter<Arc<Assembly>> {
        let mut entries: Vec<(PathBuf, Arc<Assembly>)> = self
            .entries
            .iter()
            .map(|entry| (entry.path.clone(), entry.assembly.clone()))
            .collect();
        entries.sort_by(|(a_path, a), (b_path, b)| a.name.cmp(&b.name).then_with(|| a_path.cmp(b_path)));

        entries
            .into_iter()
            .map(|(_, assembly)| assembly)
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// Drop the tree with id `id`, returning it.
    pub fn remove(&self, id: &uguid::Guid) -> Option<Arc<Assembly>> {
        self.entries.remove(id).map(|(_, entry)| entry.assembly)
    }

    /// Drop every tree.
    pub fn invalidate(&self) {
        self.entries.clear();
    }

    /// Re-parse every remembered path and replace the cache content with the results.
    ///
    /// Paths are parsed in parallel. A path that no longer parses is dropped and
    /// reported together with its error.
    pub fn rebuild(&self) -> Vec<(PathBuf, Error)> {
        let mut paths: Vec<PathBuf> = self.entries.iter().map(|entry| entry.path.clone()).collect();
        paths.sort();
        paths.dedup();

        let parsed: Vec<(PathBuf, Result<Assembly>)> = paths
            .into_par_iter()
            .map(|path| {
                let result = self.parser.parse(&path, true);
                (path, result)
            })
            .collect();

        self.entries.clear();

        let mut failures = Vec::new();
        for (path, result) in parsed {
            match result {
                Ok(assembly) => self.insert(path, Arc::new(assembly)),
                Err(error) => {
                    log::warn!("{}: dropped from cache: {error}", path.display());
                    failures.push((path, error));
                }
            }
        }
        failures
    }

    /// Number of cached trees.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AssemblyCache {
    fn default() -> Self {
        AssemblyCache::new(DocParser::default())
    }
}

impl std::fmt::Debug for AssemblyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssemblyCache")
            .field("parser", &self.parser)
            .field("entries", &self.entries.len())
            .finish()
    }
}
