//! Rewriting sources as they are loaded.
//!
//! A [`RewritingLoader`] wraps another [`SourceLoader`] and reads every file
//! through it. Sources that contain the directive marker are rewritten; every
//! other source is returned exactly as the wrapped loader produced it. Either
//! way the loaded source keeps the path it was requested under, so
//! diagnostics refer to the original file.

use crate::directive::contains_marker;
use crate::error::LoadError;
use crate::transform::{rewrite_document, Transformer};
use camino::{Utf8Path, Utf8PathBuf};
use source_map::SourceMapStore;
use std::fs;
use std::sync::Arc;
use tracing::{debug, trace};

/// A loaded source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSource {
    /// The path the source was requested under.
    pub path: Utf8PathBuf,
    /// The text to compile.
    pub text: String,
    /// Whether `text` is a rewrite of the file's contents.
    pub rewritten: bool,
}

/// Something that turns a path into source text.
pub trait SourceLoader {
    /// Loads the source at `path`.
    fn load(&self, path: &Utf8Path) -> Result<LoadedSource, LoadError>;
}

/// Reads files from disk as UTF-8.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn load(&self, path: &Utf8Path) -> Result<LoadedSource, LoadError> {
        let bytes = read(path)?;
        let text = String::from_utf8(bytes).map_err(|_| LoadError::InvalidUtf8 {
            path: path.to_owned(),
        })?;
        Ok(LoadedSource {
            path: path.to_owned(),
            text,
            rewritten: false,
        })
    }
}

/// A loader that rewrites files containing directives.
///
/// Line maps are recorded in the shared store under the file's path.
#[derive(Debug)]
pub struct RewritingLoader<L = FsLoader> {
    inner: L,
    transformer: Transformer,
    store: Arc<SourceMapStore>,
    persist_to: Option<Utf8PathBuf>,
    root: Option<Utf8PathBuf>,
}

impl<L: SourceLoader> RewritingLoader<L> {
    /// Wraps `inner`, rewriting with `transformer` and recording maps in `store`.
    pub fn new(inner: L, transformer: Transformer, store: Arc<SourceMapStore>) -> Self {
        Self {
            inner,
            transformer,
            store,
            persist_to: None,
            root: None,
        }
    }

    /// Also writes every rewritten file below `dir`.
    pub fn persist_to(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.persist_to = Some(dir.into());
        self
    }

    /// Mirrors persisted files relative to `root` instead of their full path.
    pub fn relative_to(mut self, root: impl Into<Utf8PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Returns the wrapped loader.
    pub fn inner(&self) -> &L {
        &self.inner
    }

    /// Returns the store line maps are recorded in.
    pub fn store(&self) -> &SourceMapStore {
        &self.store
    }

    /// Where a rewritten `path` is persisted, if persisting is enabled.
    pub fn persisted_path(&self, path: &Utf8Path) -> Option<Utf8PathBuf> {
        let dir = self.persist_to.as_ref()?;
        let relative = self
            .root
            .as_deref()
            .and_then(|root| path.strip_prefix(root).ok())
            .map(Utf8Path::to_path_buf)
            .unwrap_or_else(|| {
                path.components()
                    .filter(|component| matches!(component, camino::Utf8Component::Normal(_)))
                    .map(|component| component.as_str())
                    .collect()
            });
        Some(dir.join(relative))
    }

    fn persist(&self, path: &Utf8Path, text: &str) -> Result<(), LoadError> {
        let Some(target) = self.persisted_path(path) else {
            return Ok(());
        };
        let write_error = |source| LoadError::Write {
            path: target.clone(),
            source,
        };
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        fs::write(&target, text).map_err(write_error)?;
        debug!(%path, persisted = %target, "persisted rewritten source");
        Ok(())
    }
}

impl<L: SourceLoader> SourceLoader for RewritingLoader<L> {
    fn load(&self, path: &Utf8Path) -> Result<LoadedSource, LoadError> {
        let loaded = self.inner.load(path)?;
        if !contains_marker(&loaded.text) {
            trace!(%path, "no directive marker, passing through");
            return Ok(loaded);
        }

        let rewritten =
            rewrite_document(&loaded.text, path.as_str(), &self.transformer, &self.store)
                .map_err(|source| LoadError::Rewrite {
                    path: path.to_owned(),
                    source,
                })?;
        debug!(%path, changed = rewritten.changed, "rewrote source");

        self.persist(path, &rewritten.text)?;
        Ok(LoadedSource {
            path: path.to_owned(),
            text: rewritten.text,
            rewritten: true,
        })
    }
}

fn read(path: &Utf8Path) -> Result<Vec<u8>, LoadError> {
    fs::read(path).map_err(|source| LoadError::Read {
        path: path.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TransformationRegistry;

    fn loader() -> RewritingLoader {
        RewritingLoader::new(
            FsLoader,
            Transformer::with_registry(TransformationRegistry::with_builtins()),
            Arc::new(SourceMapStore::new()),
        )
    }

    #[test]
    fn test_persisted_path_mirrors_relative_path() {
        let loader = loader().persist_to("/out").relative_to("/work");
        assert_eq!(
            loader.persisted_path(Utf8Path::new("/work/lib/a.rb")),
            Some(Utf8PathBuf::from("/out/lib/a.rb"))
        );
        assert_eq!(
            loader.persisted_path(Utf8Path::new("/elsewhere/b.rb")),
            Some(Utf8PathBuf::from("/out/elsewhere/b.rb"))
        );
    }

    #[test]
    fn test_nothing_is_persisted_by_default() {
        assert_eq!(loader().persisted_path(Utf8Path::new("/work/a.rb")), None);
    }

    #[test]
    fn test_missing_file_is_a_read_error() {
        let error = loader()
            .load(Utf8Path::new("/definitely/not/here.rb"))
            .unwrap_err();
        assert!(matches!(error, LoadError::Read { .. }));
    }
}
