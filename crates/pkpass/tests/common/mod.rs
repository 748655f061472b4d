//! Shared fixtures for integration tests: throwaway credentials, image
//! files, and bundle inspection helpers.

#![allow(dead_code)]

use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, MsbOption};
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::x509::{X509Builder, X509NameBuilder, X509};
use pkpass::{AssetSlot, PassConfig};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::ZipArchive;

pub const TEAM_ID: &str = "AA00AA0A0A";

pub fn example_config() -> PassConfig {
    PassConfig::new(
        "Apple inc.",
        "Example pass",
        "com.example.pass",
        TEAM_ID,
        "ABCDEFG1234567890",
    )
}

pub fn generate_key() -> PKey<Private> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
}

pub fn self_signed_cert(key: &PKey<Private>) -> X509 {
    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", "Pass Type ID: com.example.pass")
        .unwrap();
    name.append_entry_by_text("OU", TEAM_ID).unwrap();
    let name = name.build();

    let mut serial = BigNum::new().unwrap();
    serial.rand(64, MsbOption::MAYBE_ZERO, false).unwrap();

    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    builder
        .set_serial_number(&serial.to_asn1_integer().unwrap())
        .unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(key).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(365).unwrap())
        .unwrap();
    builder.sign(key, MessageDigest::sha256()).unwrap();
    builder.build()
}

/// Temporary directory holding `cert.pem`, `key.pem` and one image file
/// per asset slot.
pub struct Fixture {
    pub dir: TempDir,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let key = generate_key();
        let cert = self_signed_cert(&key);

        let cert_path = dir.path().join("cert.pem");
        let key_path = dir.path().join("key.pem");
        fs::write(&cert_path, cert.to_pem().unwrap()).unwrap();
        fs::write(&key_path, key.private_key_to_pem_pkcs8().unwrap()).unwrap();

        let images = dir.path().join("images");
        fs::create_dir(&images).unwrap();
        for slot in AssetSlot::ALL {
            fs::write(images.join(slot.filename()), image_bytes(slot)).unwrap();
        }

        Self {
            dir,
            cert_path,
            key_path,
        }
    }

    pub fn images_dir(&self) -> PathBuf {
        self.dir.path().join("images")
    }

    pub fn image(&self, slot: AssetSlot) -> PathBuf {
        self.images_dir().join(slot.filename())
    }

    pub fn output(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// `(slot, Some(path))` for every slot.
    pub fn all_assets(&self) -> Vec<(AssetSlot, Option<PathBuf>)> {
        AssetSlot::ALL
            .iter()
            .map(|&slot| (slot, Some(self.image(slot))))
            .collect()
    }

    /// Only the two icon slots; every other slot given as `None`.
    pub fn icon_assets(&self) -> Vec<(AssetSlot, Option<PathBuf>)> {
        AssetSlot::ALL
            .iter()
            .map(|&slot| {
                let path = matches!(slot, AssetSlot::Icon | AssetSlot::Icon2x)
                    .then(|| self.image(slot));
                (slot, path)
            })
            .collect()
    }
}

/// Distinct placeholder bytes per slot; contents are never decoded.
pub fn image_bytes(slot: AssetSlot) -> Vec<u8> {
    let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
    bytes.extend_from_slice(slot.name().as_bytes());
    bytes
}

/// Every entry of the archive at `path`, in archive order.
pub fn read_entries(path: &Path) -> Vec<(String, Vec<u8>)> {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut data = Vec::new();
            file.read_to_end(&mut data).unwrap();
            (file.name().to_string(), data)
        })
        .collect()
}

pub fn entry<'a>(entries: &'a [(String, Vec<u8>)], name: &str) -> &'a [u8] {
    entries
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, d)| d.as_slice())
        .unwrap_or_else(|| panic!("bundle has no {name}"))
}

pub fn parse_manifest(data: &[u8]) -> BTreeMap<String, String> {
    serde_json::from_slice(data).unwrap()
}

/// Files in `dir`, sorted, for checking that nothing stray was written.
pub fn dir_listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
