//! Manifest handling for pass bundles.
//!
//! Every file that enters a bundle is listed in `manifest.json` together with
//! a digest of its bytes; the manifest itself is what gets signed. This module
//! generates that file using [`ManifestBuilder`].
//!
//! # manifest.json Structure
//!
//! A single flat JSON object, keys sorted by filename:
//!
//! ```json
//! {"icon.png":"<hex digest>","pass.json":"<hex digest>"}
//! ```
//!
//! `manifest.json` and `signature` never appear in it.
//!
//! # Examples
//!
//! ```
//! use pkpass::bundle::{DigestAlgorithm, ManifestBuilder};
//!
//! let mut builder = ManifestBuilder::new(DigestAlgorithm::Sha1);
//! builder.add_file("pass.json", b"{}")?;
//! let manifest_bytes = builder.build().to_json()?;
//! # Ok::<(), pkpass::Error>(())
//! ```

pub mod manifest;

pub use manifest::{
    DigestAlgorithm, Manifest, ManifestBuilder, MANIFEST_FILENAME, SIGNATURE_FILENAME,
};
