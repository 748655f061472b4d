pub mod assets;
pub mod cms;
#[cfg(test)]
pub(crate) mod test_support;

pub use assets::SigningAssets;
pub use cms::{sign_detached, sign_manifest, verify_detached, SignedManifest};
