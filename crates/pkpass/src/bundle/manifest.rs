//! `manifest.json` generation for pass bundles
//!
//! Maps every file in the bundle (except the manifest and the signature) to
//! the hex digest of its bytes. Wallets recompute these digests on import and
//! reject the pass on any mismatch.

use crate::assets::AssetStore;
use crate::{Error, Result};
use sha1::{Digest, Sha1};
use sha2::Sha256;
use std::collections::BTreeMap;

/// Name of the manifest entry inside a bundle.
pub const MANIFEST_FILENAME: &str = "manifest.json";

/// Name of the detached signature entry inside a bundle.
pub const SIGNATURE_FILENAME: &str = "signature";

/// Digest used for manifest entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DigestAlgorithm {
    /// SHA-1, the digest `.pkpass` consumers expect.
    #[default]
    Sha1,
    /// SHA-256, used by newer wallet package formats.
    Sha256,
}

impl DigestAlgorithm {
    /// Digest length in bytes.
    pub fn output_len(self) -> usize {
        match self {
            DigestAlgorithm::Sha1 => 20,
            DigestAlgorithm::Sha256 => 32,
        }
    }

    /// Hash `data` and return the digest bytes.
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            DigestAlgorithm::Sha1 => Sha1::digest(data).to_vec(),
            DigestAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
        }
    }

    /// Hash `data` and return the lowercase hex digest.
    pub fn hex_digest(self, data: &[u8]) -> String {
        hex::encode(self.digest(data))
    }

    /// Infer the algorithm from a hex digest's length.
    fn from_hex_len(len: usize) -> Option<Self> {
        match len {
            40 => Some(DigestAlgorithm::Sha1),
            64 => Some(DigestAlgorithm::Sha256),
            _ => None,
        }
    }
}

/// Finished manifest: filename → hex digest, ordered by filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    algorithm: DigestAlgorithm,
    entries: BTreeMap<String, String>,
}

impl Manifest {
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Hex digest recorded for `filename`.
    pub fn get(&self, filename: &str) -> Option<&str> {
        self.entries.get(filename).map(String::as_str)
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.entries.contains_key(filename)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in filename order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether `data` hashes to the digest recorded for `filename`.
    /// Hex case is ignored, since other producers may write uppercase digests.
    pub fn matches(&self, filename: &str, data: &[u8]) -> bool {
        self.get(filename).is_some_and(|expected| {
            expected.eq_ignore_ascii_case(&self.algorithm.hex_digest(data))
        })
    }

    /// Serialize to compact JSON with keys in filename order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.entries)?)
    }

    /// Parse `manifest.json` bytes taken from an existing bundle.
    ///
    /// The digest algorithm is inferred from the digest length, which must
    /// be the same for every entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the bytes are not a JSON string map, or
    /// [`Error::Digest`] if a digest is not hex of a known length.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let entries: BTreeMap<String, String> = serde_json::from_slice(data)?;

        let mut algorithm = None;
        for (name, digest) in &entries {
            if !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(Error::Digest(format!("digest for {name} is not hex")));
            }
            let found = DigestAlgorithm::from_hex_len(digest.len()).ok_or_else(|| {
                Error::Digest(format!("digest for {name} has unexpected length {}", digest.len()))
            })?;
            match algorithm {
                None => algorithm = Some(found),
                Some(a) if a != found => {
                    return Err(Error::Digest("manifest mixes digest algorithms".into()));
                }
                Some(_) => {}
            }
        }

        Ok(Self {
            algorithm: algorithm.unwrap_or_default(),
            entries,
        })
    }
}

/// Builder for a pass bundle manifest.
///
/// Each file is digested as it is added; [`ManifestBuilder::build`] freezes
/// the result. Names must be flat (no `/`) and unique, and may not be
/// `manifest.json` or `signature`.
#[derive(Debug, Clone, Default)]
pub struct ManifestBuilder {
    algorithm: DigestAlgorithm,
    entries: BTreeMap<String, String>,
}

impl ManifestBuilder {
    /// Create a builder using `algorithm` for every entry.
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        Self {
            algorithm,
            entries: BTreeMap::new(),
        }
    }

    /// Digest one file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Digest`] if the name is empty, nested, reserved or
    /// already present.
    pub fn add_file(&mut self, filename: &str, data: &[u8]) -> Result<&mut Self> {
        if filename.is_empty() || filename.contains('/') || filename.contains('\\') {
            return Err(Error::Digest(format!("invalid bundle filename: {filename:?}")));
        }
        if filename == MANIFEST_FILENAME || filename == SIGNATURE_FILENAME {
            return Err(Error::Digest(format!("{filename} cannot list itself in the manifest")));
        }
        if self.entries.contains_key(filename) {
            return Err(Error::Digest(format!("duplicate bundle file: {filename}")));
        }

        self.entries
            .insert(filename.to_string(), self.algorithm.hex_digest(data));
        Ok(self)
    }

    /// Digest every asset present in `assets`.
    ///
    /// # Errors
    ///
    /// Same as [`ManifestBuilder::add_file`].
    pub fn add_assets(&mut self, assets: &AssetStore) -> Result<&mut Self> {
        for (filename, data) in assets.files() {
            self.add_file(filename, data)?;
        }
        Ok(self)
    }

    /// Number of files added so far.
    pub fn file_count(&self) -> usize {
        self.entries.len()
    }

    pub fn build(self) -> Manifest {
        Manifest {
            algorithm: self.algorithm,
            entries: self.entries,
        }
    }
}
