//! Error types for pass bundle generation.
//!
//! This module defines the [`enum@Error`] enum covering every failure a
//! generation call can hit: invalid pass metadata, unreadable assets,
//! credential problems, signing, packaging and bundle verification.
//!
//! # See Also
//!
//! - [`crate::Result`] - Convenience type alias using this error

use crate::assets::AssetSlot;
use std::path::PathBuf;
use thiserror::Error;

/// Error type for pass bundle operations.
///
/// All public functions in this crate return [`crate::Result<T>`], which uses
/// this error type. Every variant is terminal for the call that produced it:
/// nothing is retried internally and no output file is left behind.
///
/// # Examples
///
/// ```no_run
/// use pkpass::{generate_pass, AssetSlot, Error, PassConfig};
///
/// let config = PassConfig::new("Example Org", "Demo", "pass.org.example", "AB12CD34EF", "SN-1");
/// let assets = [(AssetSlot::Icon, Some("icon.png"))];
/// let result = generate_pass(config, "cert.pem", "key.pem", "out.pkpass", assets);
/// match result {
///     Ok(()) => println!("Pass written"),
///     Err(Error::Certificate(msg)) => eprintln!("Bad credentials: {msg}"),
///     Err(Error::AssetRead { slot, path, .. }) => {
///         eprintln!("Cannot read {slot} from {}", path.display())
///     }
///     Err(e) => eprintln!("Other error: {e}"),
/// }
/// ```
#[derive(Debug, Error)]
pub enum Error {
    /// Pass metadata is missing a required field or holds an invalid value.
    #[error("Invalid pass configuration: {0}")]
    Config(String),

    /// An asset path was given but the file could not be read.
    #[error("Failed to read {slot} asset from {}: {source}", path.display())]
    AssetRead {
        /// Slot the asset was meant to fill.
        slot: AssetSlot,
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Certificate or private key could not be loaded, or they do not match.
    #[error("Invalid certificate: {0}")]
    Certificate(String),

    /// The cryptographic signing operation failed.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// The manifest could not be built from the bundle contents.
    #[error("Manifest error: {0}")]
    Digest(String),

    /// The bundle could not be assembled or written to its output path.
    #[error("Packaging failed: {0}")]
    Packaging(String),

    /// An existing bundle failed integrity or signature checks.
    #[error("Bundle verification failed: {0}")]
    Verification(String),

    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive operation failed.
    ///
    /// Occurs while writing or reading a bundle. See [`crate::package`].
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
