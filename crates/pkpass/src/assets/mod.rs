//! Pass image assets.
//!
//! A pass carries up to twelve optional images, each identified by an
//! [`AssetSlot`] (role plus resolution variant) with a fixed bundle filename:
//!
//! | Role | Standard | High resolution |
//! |------|----------|-----------------|
//! | background | `background.png` | `background@2x.png` |
//! | footer | `footer.png` | `footer@2x.png` |
//! | icon | `icon.png` | `icon@2x.png` |
//! | logo | `logo.png` | `logo@2x.png` |
//! | strip | `strip.png` | `strip@2x.png` |
//! | thumbnail | `thumbnail.png` | `thumbnail@2x.png` |
//!
//! [`AssetStore`] holds the loaded bytes for whichever slots were provided.
//!
//! # Examples
//!
//! ```no_run
//! use pkpass::assets::{AssetSlot, AssetStore};
//!
//! let store = AssetStore::from_paths([
//!     (AssetSlot::Icon, Some("pki/icon.png")),
//!     (AssetSlot::Icon2x, Some("pki/icon@2x.png")),
//!     (AssetSlot::Strip, None),
//! ])?;
//! assert!(!store.contains(AssetSlot::Strip));
//! # Ok::<(), pkpass::Error>(())
//! ```

pub mod slot;
pub mod store;

pub use slot::AssetSlot;
pub use store::AssetStore;
