//! Pass bundle reading and verification.
//!
//! Loads a `.pkpass` archive back into a [`PassBundle`] and checks that its
//! manifest, digests, and signature agree.

use super::{PassBundle, PASS_FILENAME};
use crate::bundle::{Manifest, MANIFEST_FILENAME, SIGNATURE_FILENAME};
use crate::crypto::verify_detached;
use crate::pass::PassDocument;
use crate::{Error, Result};
use std::fs::File;
use std::io::{self, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

/// Largest entry accepted when reading a bundle. Pass images are small, so
/// anything bigger is treated as a malformed archive.
const MAX_ENTRY_SIZE: u64 = 64 * 1024 * 1024;

/// Read a bundle from a `.pkpass` file.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be opened, [`Error::Zip`] if it
/// is not a ZIP archive, or [`Error::Verification`] if it contains nested,
/// duplicate or oversized entries.
pub fn read_bundle(path: impl AsRef<Path>) -> Result<PassBundle> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        Error::Io(io::Error::new(
            e.kind(),
            format!("cannot open bundle {}: {}", path.display(), e),
        ))
    })?;
    read_bundle_from(file)
}

/// Read a bundle from any seekable reader holding a ZIP archive.
///
/// # Errors
///
/// See [`read_bundle`].
pub fn read_bundle_from<R: Read + Seek>(reader: R) -> Result<PassBundle> {
    let mut archive = ZipArchive::new(reader)?;
    let mut bundle = PassBundle::new();

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            return Err(Error::Verification(format!(
                "unexpected directory in bundle: {}",
                file.name()
            )));
        }

        let name = file.name().to_string();
        if file.size() > MAX_ENTRY_SIZE {
            return Err(Error::Verification(format!(
                "{name} declares {} bytes, limit is {MAX_ENTRY_SIZE}",
                file.size()
            )));
        }

        // The declared size is untrusted; bound the read itself as well.
        let mut data = Vec::new();
        let read = (&mut file).take(MAX_ENTRY_SIZE + 1).read_to_end(&mut data)?;
        if read as u64 > MAX_ENTRY_SIZE {
            return Err(Error::Verification(format!("{name} exceeds {MAX_ENTRY_SIZE} bytes")));
        }

        bundle
            .push(name, data)
            .map_err(|e| Error::Verification(e.to_string()))?;
    }

    Ok(bundle)
}

/// Check a bundle's internal consistency and signature.
///
/// `pass.json` must parse and validate, `manifest.json` must list exactly
/// the other files of the bundle with matching digests, and `signature`
/// must be a valid detached signature over the manifest bytes. The signer
/// certificate is not checked against any trust anchor.
///
/// Returns the parsed manifest on success.
///
/// # Errors
///
/// Returns [`Error::Verification`] describing the first problem found.
pub fn verify_bundle(bundle: &PassBundle) -> Result<Manifest> {
    let pass_json = required(bundle, PASS_FILENAME)?;
    let manifest_json = required(bundle, MANIFEST_FILENAME)?;
    let signature = required(bundle, SIGNATURE_FILENAME)?;

    let pass_text = std::str::from_utf8(pass_json)
        .map_err(|e| Error::Verification(format!("{PASS_FILENAME} is not UTF-8: {e}")))?;
    PassDocument::from_json(pass_text)
        .and_then(|doc| doc.validate())
        .map_err(|e| Error::Verification(format!("invalid {PASS_FILENAME}: {e}")))?;

    let manifest = Manifest::from_json(manifest_json)
        .map_err(|e| Error::Verification(format!("invalid {MANIFEST_FILENAME}: {e}")))?;

    for (name, data) in bundle.entries() {
        if name == MANIFEST_FILENAME || name == SIGNATURE_FILENAME {
            continue;
        }
        if !manifest.contains(name) {
            return Err(Error::Verification(format!("{name} is not listed in manifest")));
        }
        if !manifest.matches(name, data) {
            return Err(Error::Verification(format!("digest mismatch for {name}")));
        }
    }

    if let Some((missing, _)) = manifest.entries().find(|(name, _)| !bundle.contains(name)) {
        return Err(Error::Verification(format!(
            "manifest lists {missing} which is not in the bundle"
        )));
    }

    verify_detached(manifest_json, signature)?;

    tracing::debug!(files = manifest.len(), "bundle verified");
    Ok(manifest)
}

fn required<'a>(bundle: &'a PassBundle, name: &str) -> Result<&'a [u8]> {
    bundle
        .get(name)
        .ok_or_else(|| Error::Verification(format!("bundle has no {name}")))
}
