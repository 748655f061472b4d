//! Detached PKCS#7 signing of the bundle manifest
//!
//! The `signature` file of a pass bundle is a DER-encoded PKCS#7 SignedData
//! structure whose content is `manifest.json` but which does not embed it.
//! OpenSSL signs in binary mode (no MIME canonicalisation of the manifest
//! bytes), uses SHA-256 as the message digest for RSA and ECDSA keys, adds a
//! signing-time attribute, and embeds the signer certificate plus any
//! intermediate certificates.

use super::SigningAssets;
use crate::{Error, Result};
use openssl::error::ErrorStack;
use openssl::pkcs7::{Pkcs7, Pkcs7Flags};
use openssl::stack::Stack;
use openssl::x509::store::X509StoreBuilder;
use openssl::x509::X509;

/// Manifest bytes together with their detached signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedManifest {
    manifest: Vec<u8>,
    signature: Vec<u8>,
    certificate_chain: Vec<Vec<u8>>,
}

impl SignedManifest {
    /// The exact `manifest.json` bytes the signature covers.
    pub fn manifest(&self) -> &[u8] {
        &self.manifest
    }

    /// DER-encoded PKCS#7 detached signature.
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// DER certificates embedded in the signature, signer first.
    pub fn certificate_chain(&self) -> &[Vec<u8>] {
        &self.certificate_chain
    }
}

/// Sign final manifest bytes with the given credentials.
///
/// # Errors
///
/// Returns [`Error::Signing`] if OpenSSL fails to produce or encode the
/// signature.
pub fn sign_manifest(manifest: Vec<u8>, assets: &SigningAssets) -> Result<SignedManifest> {
    let signature = sign_detached(&manifest, assets)?;

    let certificate_chain = std::iter::once(&assets.certificate)
        .chain(assets.cert_chain.iter())
        .map(|cert| cert.to_der().map_err(signing_error))
        .collect::<Result<Vec<_>>>()?;

    Ok(SignedManifest {
        manifest,
        signature,
        certificate_chain,
    })
}

/// Generate a detached DER PKCS#7 signature over `data`.
///
/// # Errors
///
/// Returns [`Error::Signing`] on any OpenSSL failure.
pub fn sign_detached(data: &[u8], assets: &SigningAssets) -> Result<Vec<u8>> {
    let mut chain = Stack::<X509>::new().map_err(signing_error)?;
    for cert in &assets.cert_chain {
        chain.push(cert.clone()).map_err(signing_error)?;
    }

    let flags = Pkcs7Flags::DETACHED | Pkcs7Flags::BINARY;
    let pkcs7 = Pkcs7::sign(&assets.certificate, &assets.private_key, &chain, data, flags)
        .map_err(signing_error)?;

    pkcs7.to_der().map_err(signing_error)
}

/// Verify a detached signature over `data` against the signer certificate
/// embedded in it.
///
/// Only the signature itself is checked; the certificate chain is not
/// validated against any trust store.
///
/// # Errors
///
/// Returns [`Error::Verification`] if the signature cannot be parsed or
/// does not match `data`.
pub fn verify_detached(data: &[u8], signature: &[u8]) -> Result<()> {
    let pkcs7 = Pkcs7::from_der(signature)
        .map_err(|e| Error::Verification(format!("Malformed signature: {}", e)))?;

    let certs = Stack::<X509>::new().map_err(verification_error)?;
    let store = X509StoreBuilder::new().map_err(verification_error)?.build();

    let flags = Pkcs7Flags::NOVERIFY | Pkcs7Flags::BINARY;
    pkcs7
        .verify(&certs, &store, Some(data), None, flags)
        .map_err(|e| Error::Verification(format!("Signature does not match manifest: {}", e)))
}

fn signing_error(e: ErrorStack) -> Error {
    Error::Signing(format!("Failed to build PKCS#7 signature: {}", e))
}

fn verification_error(e: ErrorStack) -> Error {
    Error::Verification(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::test_support::{generate_ec_key, generate_rsa_key, generate_test_cert};

    fn test_assets(rsa: bool) -> SigningAssets {
        let key = if rsa { generate_rsa_key() } else { generate_ec_key() };
        let cert = generate_test_cert(&key, Some("AB12CD34EF"));
        SigningAssets::from_pem_bytes(
            &cert.to_pem().unwrap(),
            &key.private_key_to_pem_pkcs8().unwrap(),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_signature_verifies_ec() {
        let assets = test_assets(false);
        let manifest = br#"{"pass.json":"2aae6c35c94fcfb415dbe95f408b9ce91ee846ed"}"#.to_vec();

        let signed = sign_manifest(manifest.clone(), &assets).unwrap();
        assert_eq!(signed.manifest(), &manifest[..]);
        assert!(verify_detached(signed.manifest(), signed.signature()).is_ok());
    }

    #[test]
    fn test_signature_verifies_rsa() {
        let assets = test_assets(true);
        let manifest = br#"{"icon.png":"00","pass.json":"11"}"#;

        let signature = sign_detached(manifest, &assets).unwrap();
        assert!(verify_detached(manifest, &signature).is_ok());
    }

    #[test]
    fn test_tampered_manifest_fails() {
        let assets = test_assets(false);
        let manifest = br#"{"pass.json":"2aae6c35c94fcfb415dbe95f408b9ce91ee846ed"}"#.to_vec();
        let signed = sign_manifest(manifest.clone(), &assets).unwrap();

        for i in [0, manifest.len() / 2, manifest.len() - 1] {
            let mut tampered = manifest.clone();
            tampered[i] ^= 0x01;
            let result = verify_detached(&tampered, signed.signature());
            assert!(
                matches!(result, Err(Error::Verification(_))),
                "flipping byte {i} should break the signature"
            );
        }
    }

    #[test]
    fn test_signature_is_detached() {
        let assets = test_assets(false);
        let manifest = b"MANIFEST-CONTENT-MARKER-0123456789".to_vec();
        let signed = sign_manifest(manifest.clone(), &assets).unwrap();

        assert!(!signed
            .signature()
            .windows(manifest.len())
            .any(|w| w == &manifest[..]));
    }

    #[test]
    fn test_certificate_chain_embedded() {
        let mut assets = test_assets(false);
        let wwdr_key = generate_ec_key();
        let wwdr = generate_test_cert(&wwdr_key, None);
        let wwdr_der = wwdr.to_der().unwrap();
        assets.cert_chain.push(wwdr);

        let signed = sign_manifest(b"{}".to_vec(), &assets).unwrap();
        assert_eq!(signed.certificate_chain().len(), 2);
        assert_eq!(signed.certificate_chain()[0], assets.certificate.to_der().unwrap());
        assert_eq!(signed.certificate_chain()[1], wwdr_der);
        assert!(verify_detached(b"{}", signed.signature()).is_ok());
    }

    #[test]
    fn test_malformed_signature() {
        let result = verify_detached(b"{}", b"not a signature");
        assert!(matches!(result, Err(Error::Verification(_))));
    }
}
