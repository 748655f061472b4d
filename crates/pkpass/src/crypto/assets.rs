//! Certificate, private key, and intermediate chain loading

use crate::{Error, Result};
use openssl::error::ErrorStack;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{PKey, Private};
use openssl::x509::X509;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::fs;
use std::path::Path;

/// Signing assets: pass type certificate, its private key, and the
/// intermediate certificates embedded alongside it in the signature.
pub struct SigningAssets {
    /// X.509 signer certificate
    pub certificate: X509,
    /// Private key matching `certificate`
    pub private_key: PKey<Private>,
    /// Intermediate certificates (e.g. Apple WWDR), signer excluded
    pub cert_chain: Vec<X509>,
    /// Team ID extracted from certificate
    pub team_id: Option<String>,
}

impl fmt::Debug for SigningAssets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningAssets")
            .field("team_id", &self.team_id)
            .field("cert_chain_len", &self.cert_chain.len())
            .finish_non_exhaustive()
    }
}

impl SigningAssets {
    /// Load from separate certificate and private key files
    ///
    /// The certificate may be PEM or DER. A PEM file holding several
    /// certificates is read as signer first, then its intermediates (for
    /// example the Apple WWDR certificate), which become the chain. The key
    /// may be PEM (optionally encrypted, in which case `key_password` is
    /// required) or DER.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Certificate`] if either file is unreadable or
    /// unparsable, or if the key does not match the certificate.
    pub fn from_pem(
        cert_path: impl AsRef<Path>,
        key_path: impl AsRef<Path>,
        key_password: Option<&SecretString>,
    ) -> Result<Self> {
        let cert_data = read_credential(cert_path.as_ref(), "certificate")?;
        let key_data = read_credential(key_path.as_ref(), "private key")?;

        Self::from_pem_bytes(&cert_data, &key_data, key_password)
    }

    /// Same as [`SigningAssets::from_pem`] for in-memory data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Certificate`] on parse failure or key mismatch.
    pub fn from_pem_bytes(
        cert_data: &[u8],
        key_data: &[u8],
        key_password: Option<&SecretString>,
    ) -> Result<Self> {
        let mut certs = parse_certificates(cert_data)
            .map_err(|e| Error::Certificate(format!("Failed to load certificate: {}", e)))?
            .into_iter();
        let certificate = certs
            .next()
            .ok_or_else(|| Error::Certificate("No certificate found".into()))?;
        let cert_chain: Vec<X509> = certs.collect();

        let private_key = if let Some(pass) = key_password {
            PKey::private_key_from_pem_passphrase(key_data, pass.expose_secret().as_bytes())
        } else {
            PKey::private_key_from_pem(key_data).or_else(|_| PKey::private_key_from_der(key_data))
        }
        .map_err(|e| Error::Certificate(format!("Failed to load private key: {}", e)))?;

        Self::validate_key_pair(&certificate, &private_key)?;

        let team_id = Self::extract_team_id(&certificate);

        Ok(Self {
            certificate,
            private_key,
            cert_chain,
            team_id,
        })
    }

    /// Load from PKCS#12 (.p12) file
    ///
    /// Any CA certificates in the container become the intermediate chain.
    /// The password defaults to the empty string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Certificate`] if the file is unreadable, the password
    /// is wrong, or the container lacks a certificate or key.
    pub fn from_p12(p12_path: impl AsRef<Path>, password: Option<&SecretString>) -> Result<Self> {
        let p12_data = read_credential(p12_path.as_ref(), "PKCS#12 file")?;

        let pkcs12 = Pkcs12::from_der(&p12_data)
            .map_err(|e| Error::Certificate(format!("Invalid PKCS#12: {}", e)))?;

        let pass = password.map(|s| s.expose_secret().as_str()).unwrap_or("");
        let parsed = pkcs12
            .parse2(pass)
            .map_err(|e| Error::Certificate(format!("Failed to parse PKCS#12: {}", e)))?;

        let certificate = parsed
            .cert
            .ok_or_else(|| Error::Certificate("No certificate in PKCS#12".into()))?;

        let private_key = parsed
            .pkey
            .ok_or_else(|| Error::Certificate("No private key in PKCS#12".into()))?;

        Self::validate_key_pair(&certificate, &private_key)?;

        let cert_chain = parsed
            .ca
            .map(|stack| stack.into_iter().collect())
            .unwrap_or_default();

        let team_id = Self::extract_team_id(&certificate);

        Ok(Self {
            certificate,
            private_key,
            cert_chain,
            team_id,
        })
    }

    /// Append intermediate certificates read from `path` (PEM bundle or DER).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Certificate`] if the file is unreadable or holds no
    /// certificate.
    pub fn with_chain_certificate(mut self, path: impl AsRef<Path>) -> Result<Self> {
        let data = read_credential(path.as_ref(), "chain certificate")?;

        let certs = parse_certificates(&data).map_err(|e| {
            Error::Certificate(format!("Failed to load chain certificate: {}", e))
        })?;

        self.cert_chain.extend(certs);
        Ok(self)
    }

    /// Team ID from the certificate subject's OU, if present.
    pub fn team_id(&self) -> Option<&str> {
        self.team_id.as_deref()
    }

    /// Extract team ID from certificate subject
    fn extract_team_id(cert: &X509) -> Option<String> {
        let subject = cert.subject_name();

        // Look for OU (Organizational Unit) which contains team ID
        for entry in subject.entries() {
            let nid = entry.object().nid();
            if nid == openssl::nid::Nid::ORGANIZATIONALUNITNAME {
                if let Ok(data) = entry.data().as_utf8() {
                    return Some(data.to_string());
                }
            }
        }
        None
    }

    /// Validate that the private key matches the certificate's public key
    fn validate_key_pair(cert: &X509, private_key: &PKey<Private>) -> Result<()> {
        let cert_public_key = cert.public_key().map_err(|e| {
            Error::Certificate(format!(
                "Failed to extract public key from certificate: {}",
                e
            ))
        })?;

        if !private_key.public_eq(&cert_public_key) {
            return Err(Error::Certificate(
                "Private key does not match certificate public key".into(),
            ));
        }

        Ok(())
    }
}

/// Every certificate in `data`: a PEM bundle in file order, or a single DER
/// certificate.
fn parse_certificates(data: &[u8]) -> std::result::Result<Vec<X509>, ErrorStack> {
    match X509::stack_from_pem(data) {
        Ok(certs) if !certs.is_empty() => Ok(certs),
        _ => X509::from_der(data).map(|cert| vec![cert]),
    }
}

fn read_credential(path: &Path, what: &str) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| {
        Error::Certificate(format!("Failed to read {} {}: {}", what, path.display(), e))
    })
}
