//! Pass generation builder API
//!
//! [`PassGenerator`] collects credentials, assets and output options, then
//! runs the whole pipeline for a [`PassDocument`]:
//!
//! ```text
//! Collecting → Digesting → Signing → Packaged
//! ```
//!
//! Any failure aborts the run before the output path is touched.
//! [`generate_pass`] is the one-call form for PEM credentials.

use crate::assets::{AssetSlot, AssetStore};
use crate::bundle::{DigestAlgorithm, ManifestBuilder};
use crate::crypto::{sign_manifest, SigningAssets};
use crate::package::{write_bundle, CompressionLevel, PassBundle, PASS_FILENAME};
use crate::pass::PassDocument;
use crate::{Error, Result};
use secrecy::SecretString;
use std::fmt;
use std::path::{Path, PathBuf};

/// Pipeline stage, reported in log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Validating metadata, loading credentials and assets.
    Collecting,
    /// Hashing bundle files into the manifest.
    Digesting,
    /// Signing the manifest.
    Signing,
    /// Bundle written to its final path.
    Packaged,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Collecting => "collecting",
            Stage::Digesting => "digesting",
            Stage::Signing => "signing",
            Stage::Packaged => "packaged",
        };
        f.write_str(name)
    }
}

/// Signed pass bundle generator with builder pattern API.
///
/// # Example
///
/// ```no_run
/// use pkpass::{AssetSlot, PassConfig, PassDocument, PassGenerator};
///
/// let config = PassConfig::new("Example Org", "Demo", "pass.org.example", "AB12CD34EF", "SN-1");
///
/// PassGenerator::new()
///     .pkcs12("signer.p12")
///     .password("secret")
///     .chain_certificate("AppleWWDRCA.pem")
///     .asset(AssetSlot::Icon, "icon.png")
///     .asset_dir("images")
///     .generate(&PassDocument::new(config), "out.pkpass")?;
/// # Ok::<(), pkpass::Error>(())
/// ```
#[derive(Clone)]
pub struct PassGenerator {
    certificate: Option<PathBuf>,
    private_key: Option<PathBuf>,
    pkcs12: Option<PathBuf>,
    password: Option<SecretString>,
    chain_certificates: Vec<PathBuf>,
    asset_dir: Option<PathBuf>,
    assets: Vec<(AssetSlot, PathBuf)>,
    digest_algorithm: DigestAlgorithm,
    compression_level: CompressionLevel,
}

impl PassGenerator {
    /// Create a new generator with no credentials and no assets.
    pub fn new() -> Self {
        Self {
            certificate: None,
            private_key: None,
            pkcs12: None,
            password: None,
            chain_certificates: Vec::new(),
            asset_dir: None,
            assets: Vec::new(),
            digest_algorithm: DigestAlgorithm::default(),
            compression_level: CompressionLevel::DEFAULT,
        }
    }

    /// Set certificate file path (PEM or DER format).
    ///
    /// Use together with `private_key()`.
    /// Alternatively, use `pkcs12()` for PKCS#12 files that contain both.
    pub fn certificate(mut self, path: impl AsRef<Path>) -> Self {
        self.certificate = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set private key file path (PEM or DER format).
    pub fn private_key(mut self, path: impl AsRef<Path>) -> Self {
        self.private_key = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set PKCS#12 file path (.p12 format).
    ///
    /// PKCS#12 files contain both the certificate and private key, and may
    /// carry intermediate certificates.
    pub fn pkcs12(mut self, path: impl AsRef<Path>) -> Self {
        self.pkcs12 = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set password for an encrypted private key or PKCS#12 file.
    ///
    /// The password is stored securely and will be zeroized when dropped.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(SecretString::new(password.into()));
        self
    }

    /// Add an intermediate certificate file (e.g. Apple WWDR) to embed in
    /// the signature. May be called more than once.
    pub fn chain_certificate(mut self, path: impl AsRef<Path>) -> Self {
        self.chain_certificates.push(path.as_ref().to_path_buf());
        self
    }

    /// Select the manifest digest algorithm (SHA-1 by default).
    pub fn digest_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.digest_algorithm = algorithm;
        self
    }

    /// Set ZIP compression level for the bundle (0-9).
    ///
    /// 0 = stored, 9 = maximum compression. Default is 6.
    pub fn compression_level(mut self, level: u32) -> Self {
        self.compression_level = CompressionLevel::new(level);
        self
    }

    /// Fill `slot` from `path`. Overrides a file found via `asset_dir()`.
    pub fn asset(mut self, slot: AssetSlot, path: impl AsRef<Path>) -> Self {
        self.assets.push((slot, path.as_ref().to_path_buf()));
        self
    }

    /// Pick up every standard asset filename found directly in `dir`.
    pub fn asset_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.asset_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Validate the credential configuration.
    ///
    /// Returns an error if:
    /// - Both PKCS#12 and PEM credentials are specified
    /// - Neither PKCS#12 nor PEM credentials are specified
    /// - Only one of certificate/private_key is specified (need both)
    pub fn validate(&self) -> Result<()> {
        let has_p12 = self.pkcs12.is_some();
        let has_pem = self.certificate.is_some() || self.private_key.is_some();

        if has_p12 && has_pem {
            return Err(Error::Certificate(
                "Cannot specify both PKCS#12 and PEM certificate/key".into(),
            ));
        }

        if !has_p12 && !has_pem {
            return Err(Error::Certificate(
                "Must specify either PKCS#12 or certificate/key pair".into(),
            ));
        }

        if has_pem && (self.certificate.is_none() || self.private_key.is_none()) {
            return Err(Error::Certificate(
                "Both certificate and private key must be specified".into(),
            ));
        }

        Ok(())
    }

    /// Load signing assets from configured paths.
    fn load_signing_assets(&self) -> Result<SigningAssets> {
        self.validate()?;

        let mut assets = if let Some(ref p12) = self.pkcs12 {
            SigningAssets::from_p12(p12, self.password.as_ref())?
        } else {
            let cert = self
                .certificate
                .as_ref()
                .ok_or_else(|| Error::Certificate("No certificate configured".into()))?;
            let key = self
                .private_key
                .as_ref()
                .ok_or_else(|| Error::Certificate("No private key configured".into()))?;
            SigningAssets::from_pem(cert, key, self.password.as_ref())?
        };

        for chain in &self.chain_certificates {
            assets = assets.with_chain_certificate(chain)?;
        }

        Ok(assets)
    }

    fn load_assets(&self) -> Result<AssetStore> {
        let mut store = match self.asset_dir {
            Some(ref dir) => AssetStore::from_dir(dir)?,
            None => AssetStore::new(),
        };
        for (slot, path) in &self.assets {
            store.load_file(*slot, path)?;
        }
        Ok(store)
    }

    /// Build the signed bundle in memory without writing it.
    ///
    /// # Errors
    ///
    /// Returns the first failure in pipeline order: [`Error::Config`] for
    /// invalid metadata, [`Error::Certificate`] for credential problems,
    /// [`Error::AssetRead`] for unreadable images, [`Error::Signing`] if
    /// signing fails, [`Error::Packaging`] if the bundle layout is invalid.
    pub fn build_bundle(&self, pass: &PassDocument) -> Result<PassBundle> {
        let identity = pass.config().identity();
        tracing::debug!(stage = %Stage::Collecting, pass = %identity, "starting pass generation");

        let pass_json = pass.to_json()?;
        let signing = self.load_signing_assets()?;

        if let Some(team_id) = signing.team_id() {
            if team_id != pass.config().team_identifier() {
                tracing::warn!(
                    certificate_team = team_id,
                    pass_team = pass.config().team_identifier(),
                    "certificate team ID does not match teamIdentifier"
                );
            }
        }

        let assets = self.load_assets()?;

        tracing::debug!(
            stage = %Stage::Digesting,
            assets = assets.len(),
            algorithm = ?self.digest_algorithm,
            "building manifest"
        );
        let mut manifest = ManifestBuilder::new(self.digest_algorithm);
        manifest.add_file(PASS_FILENAME, &pass_json)?;
        manifest.add_assets(&assets)?;
        let manifest_json = manifest.build().to_json()?;

        tracing::debug!(
            stage = %Stage::Signing,
            chain = signing.cert_chain.len(),
            "signing manifest"
        );
        let signed = sign_manifest(manifest_json, &signing)?;

        PassBundle::assemble(pass_json, &assets, &signed)
    }

    /// Generate the bundle for `pass` and write it atomically to `output`.
    ///
    /// On error nothing is written; an existing file at `output` is left as
    /// it was.
    ///
    /// # Errors
    ///
    /// See [`PassGenerator::build_bundle`]; additionally
    /// [`Error::Packaging`] if the output cannot be written.
    pub fn generate(&self, pass: &PassDocument, output: impl AsRef<Path>) -> Result<()> {
        let output = output.as_ref();
        let bundle = self.build_bundle(pass)?;

        write_bundle(&bundle, output, self.compression_level)?;

        tracing::info!(
            stage = %Stage::Packaged,
            pass = %pass.config().identity(),
            path = %output.display(),
            files = bundle.len(),
            "pass bundle written"
        );
        Ok(())
    }
}

impl Default for PassGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate a signed pass bundle from PEM credentials in one call.
///
/// `asset_paths` pairs each slot with an optional file path; slots with no
/// path are left out of the bundle. A slot listed twice keeps its last path.
/// To embed the WWDR intermediate, append it to the PEM at `cert_path` after
/// the signer certificate.
///
/// # Errors
///
/// Returns [`Error::Config`], [`Error::Certificate`], [`Error::AssetRead`],
/// [`Error::Signing`] or [`Error::Packaging`]; no output file is created on
/// any of them.
///
/// # Example
///
/// ```no_run
/// use pkpass::{generate_pass, AssetSlot, PassConfig};
///
/// let config = PassConfig::new("Example Org", "Demo", "pass.org.example", "AB12CD34EF", "SN-1");
/// generate_pass(
///     config,
///     "cert.pem",
///     "key.pem",
///     "out.pkpass",
///     [(AssetSlot::Icon, Some("icon.png")), (AssetSlot::Strip, None)],
/// )?;
/// # Ok::<(), pkpass::Error>(())
/// ```
pub fn generate_pass<I, P>(
    pass: impl Into<PassDocument>,
    cert_path: impl AsRef<Path>,
    key_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    asset_paths: I,
) -> Result<()>
where
    I: IntoIterator<Item = (AssetSlot, Option<P>)>,
    P: AsRef<Path>,
{
    let generator = asset_paths
        .into_iter()
        .filter_map(|(slot, path)| path.map(|p| (slot, p)))
        .fold(
            PassGenerator::new().certificate(cert_path).private_key(key_path),
            |generator, (slot, path)| generator.asset(slot, path),
        );

    generator.generate(&pass.into(), output_path)
}
