//! Closed set of image roles a pass can carry.

use crate::Error;
use std::fmt;
use std::str::FromStr;

/// Image role and resolution variant.
///
/// Variants are declared in the byte order of their filenames, so iterating
/// a `BTreeMap<AssetSlot, _>` visits assets in filename order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetSlot {
    Background,
    Background2x,
    Footer,
    Footer2x,
    Icon,
    Icon2x,
    Logo,
    Logo2x,
    Strip,
    Strip2x,
    Thumbnail,
    Thumbnail2x,
}

impl AssetSlot {
    /// Every slot, in filename order.
    pub const ALL: [AssetSlot; 12] = [
        AssetSlot::Background,
        AssetSlot::Background2x,
        AssetSlot::Footer,
        AssetSlot::Footer2x,
        AssetSlot::Icon,
        AssetSlot::Icon2x,
        AssetSlot::Logo,
        AssetSlot::Logo2x,
        AssetSlot::Strip,
        AssetSlot::Strip2x,
        AssetSlot::Thumbnail,
        AssetSlot::Thumbnail2x,
    ];

    /// Slot name without extension, e.g. `icon@2x`.
    pub fn name(self) -> &'static str {
        match self {
            AssetSlot::Background => "background",
            AssetSlot::Background2x => "background@2x",
            AssetSlot::Footer => "footer",
            AssetSlot::Footer2x => "footer@2x",
            AssetSlot::Icon => "icon",
            AssetSlot::Icon2x => "icon@2x",
            AssetSlot::Logo => "logo",
            AssetSlot::Logo2x => "logo@2x",
            AssetSlot::Strip => "strip",
            AssetSlot::Strip2x => "strip@2x",
            AssetSlot::Thumbnail => "thumbnail",
            AssetSlot::Thumbnail2x => "thumbnail@2x",
        }
    }

    /// Filename of the slot inside a bundle, e.g. `icon@2x.png`.
    pub fn filename(self) -> &'static str {
        match self {
            AssetSlot::Background => "background.png",
            AssetSlot::Background2x => "background@2x.png",
            AssetSlot::Footer => "footer.png",
            AssetSlot::Footer2x => "footer@2x.png",
            AssetSlot::Icon => "icon.png",
            AssetSlot::Icon2x => "icon@2x.png",
            AssetSlot::Logo => "logo.png",
            AssetSlot::Logo2x => "logo@2x.png",
            AssetSlot::Strip => "strip.png",
            AssetSlot::Strip2x => "strip@2x.png",
            AssetSlot::Thumbnail => "thumbnail.png",
            AssetSlot::Thumbnail2x => "thumbnail@2x.png",
        }
    }

    /// Look up the slot whose bundle filename is `filename`.
    pub fn from_filename(filename: &str) -> Option<AssetSlot> {
        Self::ALL.into_iter().find(|slot| slot.filename() == filename)
    }

    /// Whether this is the high-resolution variant of its role.
    pub fn is_retina(self) -> bool {
        self.name().ends_with("@2x")
    }
}

impl fmt::Display for AssetSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AssetSlot {
    type Err = Error;

    /// Accepts `icon@2x`, `icon2x` or `icon@2x.png`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let normalized = normalized.strip_suffix(".png").unwrap_or(&normalized);

        Self::ALL
            .into_iter()
            .find(|slot| slot.name() == normalized || slot.name().replace('@', "") == normalized)
            .ok_or_else(|| Error::Config(format!("unknown asset slot: {s}")))
    }
}
