//! Loading image assets into memory.

use super::AssetSlot;
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// Raw asset bytes keyed by slot.
///
/// Slots that were never filled are absent and produce neither a manifest
/// entry nor a bundle file. Image contents are not inspected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetStore {
    assets: BTreeMap<AssetSlot, Vec<u8>>,
}

impl AssetStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `(slot, path)` pair; pairs with no path are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AssetRead`] for the first path that cannot be read.
    pub fn from_paths<I, P>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = (AssetSlot, Option<P>)>,
        P: AsRef<Path>,
    {
        let mut store = Self::new();
        for (slot, path) in paths {
            store.load(slot, path)?;
        }
        Ok(store)
    }

    /// Load every file in `dir` whose name is a standard asset filename.
    ///
    /// Only the top level of `dir` is scanned. Files with other names
    /// (`logo@3x.png`, `cert.pem`, ...) are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the directory cannot be listed, or
    /// [`Error::AssetRead`] if a matching file cannot be read.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut store = Self::new();

        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
            let entry = entry.map_err(|e| {
                Error::Io(io::Error::other(format!(
                    "Failed to scan asset directory {}: {}",
                    dir.display(),
                    e
                )))
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let Some(slot) = entry.file_name().to_str().and_then(AssetSlot::from_filename) else {
                continue;
            };

            store.load_file(slot, entry.path())?;
        }

        tracing::debug!(dir = %dir.display(), count = store.len(), "scanned asset directory");
        Ok(store)
    }

    /// Read `path` into `slot` if a path is given.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AssetRead`] if the path is given but unreadable.
    pub fn load<P: AsRef<Path>>(&mut self, slot: AssetSlot, path: Option<P>) -> Result<()> {
        match path {
            Some(path) => self.load_file(slot, path),
            None => Ok(()),
        }
    }

    /// Read `path` into `slot`, replacing any previous bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AssetRead`] if the file cannot be read.
    pub fn load_file(&mut self, slot: AssetSlot, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| Error::AssetRead {
            slot,
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!(%slot, path = %path.display(), bytes = bytes.len(), "loaded asset");
        self.assets.insert(slot, bytes);
        Ok(())
    }

    /// Put in-memory bytes into `slot`, returning what was there before.
    pub fn insert(&mut self, slot: AssetSlot, bytes: impl Into<Vec<u8>>) -> Option<Vec<u8>> {
        self.assets.insert(slot, bytes.into())
    }

    /// Builder-style variant of [`AssetStore::insert`].
    pub fn with(mut self, slot: AssetSlot, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(slot, bytes);
        self
    }

    pub fn get(&self, slot: AssetSlot) -> Option<&[u8]> {
        self.assets.get(&slot).map(Vec::as_slice)
    }

    pub fn contains(&self, slot: AssetSlot) -> bool {
        self.assets.contains_key(&slot)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Present slots in filename order.
    pub fn slots(&self) -> impl Iterator<Item = AssetSlot> + '_ {
        self.assets.keys().copied()
    }

    /// `(bundle filename, bytes)` for every present slot, in filename order.
    pub fn files(&self) -> impl Iterator<Item = (&'static str, &[u8])> {
        self.assets
            .iter()
            .map(|(slot, bytes)| (slot.filename(), bytes.as_slice()))
    }
}
