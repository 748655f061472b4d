pub mod assets;
pub mod builder;
pub mod bundle;
pub mod crypto;
pub mod error;
pub mod package;
pub mod pass;

pub use assets::{AssetSlot, AssetStore};
pub use builder::{generate_pass, PassGenerator, Stage};
pub use bundle::{DigestAlgorithm, Manifest, ManifestBuilder};
pub use crypto::{SignedManifest, SigningAssets};
pub use error::Error;
pub use package::{read_bundle, verify_bundle, write_bundle, CompressionLevel, PassBundle};
pub use pass::{Barcode, BarcodeFormat, PassConfig, PassDocument, PassField, PassFields, PassStyle};

pub type Result<T> = std::result::Result<T, Error>;
