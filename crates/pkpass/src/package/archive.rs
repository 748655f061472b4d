//! Pass bundle archive creation.
//!
//! Writes a [`PassBundle`] as a flat ZIP file. The archive is built in a
//! temporary file next to the destination and renamed over it only once it
//! is complete, so the destination either keeps its previous contents or
//! holds a finished bundle.
//!
//! # Examples
//!
//! ```no_run
//! use pkpass::package::{write_bundle, CompressionLevel, PassBundle};
//!
//! let mut bundle = PassBundle::new();
//! bundle.push("pass.json", b"{}".to_vec())?;
//! write_bundle(&bundle, "out/example.pkpass", CompressionLevel::DEFAULT)?;
//! # Ok::<(), pkpass::Error>(())
//! ```

use super::PassBundle;
use crate::{Error, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// ZIP compression level for bundle creation.
///
/// # Examples
///
/// ```
/// use pkpass::package::CompressionLevel;
///
/// let stored = CompressionLevel::NONE;
/// let custom = CompressionLevel::new(12);
/// assert_eq!(custom.level(), 9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionLevel(u32);

impl CompressionLevel {
    /// No compression (level 0); entries are stored.
    pub const NONE: CompressionLevel = CompressionLevel(0);

    /// Default compression (level 6).
    pub const DEFAULT: CompressionLevel = CompressionLevel(6);

    /// Maximum compression (level 9).
    pub const MAX: CompressionLevel = CompressionLevel(9);

    /// Creates a compression level from 0-9.
    ///
    /// Values greater than 9 are clamped to 9.
    #[must_use]
    pub fn new(level: u32) -> Self {
        CompressionLevel(level.min(9))
    }

    /// Returns the compression level value (0-9).
    #[must_use]
    pub fn level(&self) -> u32 {
        self.0
    }

    fn file_options(self) -> SimpleFileOptions {
        let options = SimpleFileOptions::default().unix_permissions(0o644);
        if self.0 == 0 {
            options.compression_method(CompressionMethod::Stored)
        } else {
            options
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(i64::from(self.0)))
        }
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u32> for CompressionLevel {
    fn from(level: u32) -> Self {
        CompressionLevel::new(level)
    }
}

/// Write `bundle` to `output_path`, replacing any existing file atomically.
///
/// The parent directory of `output_path` must already exist.
///
/// # Errors
///
/// Returns [`Error::Packaging`] if the temporary file cannot be created in
/// the parent directory, the archive cannot be written, or the finished file
/// cannot be moved into place. On error no file is left at `output_path`
/// unless one existed before, in which case it is untouched.
pub fn write_bundle(
    bundle: &PassBundle,
    output_path: impl AsRef<Path>,
    compression_level: CompressionLevel,
) -> Result<()> {
    let output_path = output_path.as_ref();
    let parent = match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(parent).map_err(|e| {
        Error::Packaging(format!(
            "cannot create temporary file in {}: {}",
            parent.display(),
            e
        ))
    })?;

    write_archive(bundle, &mut temp, compression_level)?;

    temp.as_file()
        .sync_all()
        .map_err(|e| Error::Packaging(format!("cannot sync bundle: {}", e)))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))
            .map_err(|e| Error::Packaging(format!("cannot set bundle permissions: {}", e)))?;
    }

    temp.persist(output_path).map_err(|e| {
        Error::Packaging(format!(
            "cannot move bundle into place at {}: {}",
            output_path.display(),
            e.error
        ))
    })?;

    tracing::debug!(
        path = %output_path.display(),
        entries = bundle.len(),
        level = compression_level.level(),
        "bundle written"
    );
    Ok(())
}

fn write_archive<W>(
    bundle: &PassBundle,
    writer: W,
    compression_level: CompressionLevel,
) -> Result<()>
where
    W: Write + std::io::Seek,
{
    let mut zip = ZipWriter::new(writer);
    let options = compression_level.file_options();

    for (name, data) in bundle.entries() {
        zip.start_file(name, options)
            .map_err(|e| Error::Packaging(format!("cannot add {} to archive: {}", name, e)))?;
        zip.write_all(data)
            .map_err(|e| Error::Packaging(format!("cannot write {} to archive: {}", name, e)))?;
    }

    zip.finish()
        .map_err(|e| Error::Packaging(format!("cannot finalize archive: {}", e)))?;
    Ok(())
}
