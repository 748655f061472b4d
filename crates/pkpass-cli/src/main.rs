//! Command-line interface for the pkpass bundle builder.
//!
//! `pkpass generate` builds and signs a `.pkpass` bundle from pass metadata,
//! images and PEM or PKCS#12 credentials. `pkpass verify` checks an existing
//! bundle's manifest and signature.

use clap::{Args, Parser, Subcommand};
use pkpass::{read_bundle, verify_bundle, AssetSlot, DigestAlgorithm, PassDocument, PassGenerator};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pkpass", version)]
#[command(about = "Build and sign wallet pass bundles")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build and sign a pass bundle
    Generate(GenerateArgs),
    /// Check the manifest and signature of an existing bundle
    Verify(VerifyArgs),
}

#[derive(Args)]
struct GenerateArgs {
    /// Pass metadata in pass.json format
    #[arg(long)]
    config: Option<PathBuf>,

    /// organizationName (overrides --config)
    #[arg(long)]
    organization_name: Option<String>,

    /// description (overrides --config)
    #[arg(long)]
    description: Option<String>,

    /// passTypeIdentifier (overrides --config)
    #[arg(long)]
    pass_type_identifier: Option<String>,

    /// teamIdentifier (overrides --config)
    #[arg(long)]
    team_identifier: Option<String>,

    /// serialNumber (overrides --config)
    #[arg(long)]
    serial_number: Option<String>,

    /// Certificate file (PEM or DER)
    #[arg(short = 'c', long)]
    certificate: Option<PathBuf>,

    /// Private key file (PEM or DER)
    #[arg(short = 'k', long)]
    private_key: Option<PathBuf>,

    /// PKCS#12 file (.p12)
    #[arg(short = 'p', long)]
    pkcs12: Option<PathBuf>,

    /// Password for private key or PKCS#12
    #[arg(long)]
    password: Option<String>,

    /// Intermediate certificate to embed (e.g. Apple WWDR); repeatable
    #[arg(long)]
    wwdr: Vec<PathBuf>,

    /// Directory scanned for standard image names (icon.png, logo@2x.png, ...)
    #[arg(long)]
    assets_dir: Option<PathBuf>,

    #[command(flatten)]
    images: ImageArgs,

    /// ZIP compression level (0-9, default: 6)
    /// 0 = stored, 9 = maximum compression
    #[arg(short = 'z', long, default_value = "6")]
    zip_level: u32,

    /// Use SHA-256 manifest digests instead of SHA-1
    #[arg(long)]
    sha256: bool,

    /// Output bundle path
    #[arg(short, long)]
    output: PathBuf,
}

/// Per-slot image paths; these override files found in --assets-dir.
#[derive(Args)]
struct ImageArgs {
    #[arg(long)]
    background: Option<PathBuf>,
    #[arg(long)]
    background2x: Option<PathBuf>,
    #[arg(long)]
    footer: Option<PathBuf>,
    #[arg(long)]
    footer2x: Option<PathBuf>,
    #[arg(long)]
    icon: Option<PathBuf>,
    #[arg(long)]
    icon2x: Option<PathBuf>,
    #[arg(long)]
    logo: Option<PathBuf>,
    #[arg(long)]
    logo2x: Option<PathBuf>,
    #[arg(long)]
    strip: Option<PathBuf>,
    #[arg(long)]
    strip2x: Option<PathBuf>,
    #[arg(long)]
    thumbnail: Option<PathBuf>,
    #[arg(long)]
    thumbnail2x: Option<PathBuf>,
}

impl ImageArgs {
    fn slots(&self) -> [(AssetSlot, Option<&PathBuf>); 12] {
        [
            (AssetSlot::Background, self.background.as_ref()),
            (AssetSlot::Background2x, self.background2x.as_ref()),
            (AssetSlot::Footer, self.footer.as_ref()),
            (AssetSlot::Footer2x, self.footer2x.as_ref()),
            (AssetSlot::Icon, self.icon.as_ref()),
            (AssetSlot::Icon2x, self.icon2x.as_ref()),
            (AssetSlot::Logo, self.logo.as_ref()),
            (AssetSlot::Logo2x, self.logo2x.as_ref()),
            (AssetSlot::Strip, self.strip.as_ref()),
            (AssetSlot::Strip2x, self.strip2x.as_ref()),
            (AssetSlot::Thumbnail, self.thumbnail.as_ref()),
            (AssetSlot::Thumbnail2x, self.thumbnail2x.as_ref()),
        ]
    }
}

#[derive(Args)]
struct VerifyArgs {
    /// Bundle to check
    bundle: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Generate(args) => generate(&args),
        Command::Verify(args) => verify(&args.bundle),
    }
}

fn generate(args: &GenerateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let pass = load_pass(args)?;

    let mut generator = PassGenerator::new().compression_level(args.zip_level);

    if let Some(ref p12) = args.pkcs12 {
        generator = generator.pkcs12(p12);
    }
    if let Some(ref cert) = args.certificate {
        generator = generator.certificate(cert);
    }
    if let Some(ref key) = args.private_key {
        generator = generator.private_key(key);
    }
    if let Some(ref password) = args.password {
        generator = generator.password(password.as_str());
    }
    for wwdr in &args.wwdr {
        generator = generator.chain_certificate(wwdr);
    }
    if args.sha256 {
        generator = generator.digest_algorithm(DigestAlgorithm::Sha256);
    }
    if let Some(ref dir) = args.assets_dir {
        generator = generator.asset_dir(dir);
    }
    for (slot, path) in args.images.slots() {
        if let Some(path) = path {
            generator = generator.asset(slot, path);
        }
    }

    generator.generate(&pass, &args.output)?;

    println!("Generated: {}", args.output.display());
    Ok(())
}

/// Read `--config` (if any) and apply the field override flags on top.
fn load_pass(args: &GenerateArgs) -> Result<PassDocument, Box<dyn std::error::Error>> {
    let mut value = match args.config {
        Some(ref path) => {
            let text = fs::read_to_string(path)
                .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
            serde_json::from_str(&text)?
        }
        None => serde_json::Value::Object(serde_json::Map::new()),
    };

    let object = value
        .as_object_mut()
        .ok_or("pass metadata must be a JSON object")?;

    let overrides = [
        ("organizationName", &args.organization_name),
        ("description", &args.description),
        ("passTypeIdentifier", &args.pass_type_identifier),
        ("teamIdentifier", &args.team_identifier),
        ("serialNumber", &args.serial_number),
    ];
    for (key, field) in overrides {
        if let Some(field) = field {
            object.insert(key.to_string(), field.clone().into());
        }
        // Missing fields become empty so validation names them.
        object
            .entry(key)
            .or_insert_with(|| serde_json::Value::String(String::new()));
    }

    Ok(serde_json::from_value(value)?)
}

fn verify(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let bundle = read_bundle(path)?;
    tracing::debug!(path = %path.display(), entries = bundle.len(), "read bundle");
    let manifest = verify_bundle(&bundle)?;

    println!(
        "Verified: {} ({} files, {:?} digests)",
        path.display(),
        manifest.len(),
        manifest.algorithm()
    );
    Ok(())
}
