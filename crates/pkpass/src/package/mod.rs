//! Pass bundle assembly, writing, and reading.
//!
//! A bundle is a flat ZIP archive:
//!
//! ```text
//! pass.json
//! icon.png, icon@2x.png, ...   (present assets, filename order)
//! manifest.json
//! signature
//! ```
//!
//! [`PassBundle`] is the in-memory form. [`write_bundle`] writes it to disk
//! atomically; [`read_bundle`] and [`verify_bundle`] go the other way.

pub mod archive;
pub mod extract;

pub use archive::{write_bundle, CompressionLevel};
pub use extract::{read_bundle, read_bundle_from, verify_bundle};

use crate::assets::AssetStore;
use crate::bundle::{MANIFEST_FILENAME, SIGNATURE_FILENAME};
use crate::crypto::SignedManifest;
use crate::{Error, Result};

/// Name of the pass metadata entry inside a bundle.
pub const PASS_FILENAME: &str = "pass.json";

/// Ordered, duplicate-free set of named files making up a bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassBundle {
    entries: Vec<(String, Vec<u8>)>,
}

impl PassBundle {
    /// Create an empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lay out a bundle in canonical order from its finished parts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Packaging`] if two parts share a filename.
    pub fn assemble(
        pass_json: Vec<u8>,
        assets: &AssetStore,
        signed: &SignedManifest,
    ) -> Result<Self> {
        let mut bundle = Self::new();
        bundle.push(PASS_FILENAME, pass_json)?;
        for (filename, data) in assets.files() {
            bundle.push(filename, data.to_vec())?;
        }
        bundle.push(MANIFEST_FILENAME, signed.manifest().to_vec())?;
        bundle.push(SIGNATURE_FILENAME, signed.signature().to_vec())?;
        Ok(bundle)
    }

    /// Append a file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Packaging`] if the name is empty, contains a path
    /// separator, or is already present.
    pub fn push(&mut self, name: impl Into<String>, data: Vec<u8>) -> Result<()> {
        let name = name.into();
        if name.is_empty() || name.contains('/') || name.contains('\\') {
            return Err(Error::Packaging(format!("invalid bundle entry name: {name:?}")));
        }
        if self.contains(&name) {
            return Err(Error::Packaging(format!("duplicate bundle entry: {name}")));
        }
        self.entries.push((name, data));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Entry names in bundle order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// `(name, bytes)` in bundle order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries.iter().map(|(n, d)| (n.as_str(), d.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
