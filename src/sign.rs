// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! RSA signing material and the PKCS#1 v1.5 / SHA-1 signing operation used by
//! the signature section builder (spec.md §4.9).

use std::{fs, path::PathBuf};

use pkcs1::DecodeRsaPrivateKey;
use pkcs8::DecodePrivateKey;
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use sha1::Sha1;

/// Points at an RSA private key used for the legacy v2 signing convention
/// (spec.md §4.9: PKCS#1 v1.5 over SHA-1 of the control-section digest).
#[derive(Debug, Clone)]
pub struct SigningConfig {
    /// Path to the private key file (PEM, PKCS#1 or PKCS#8, optionally encrypted).
    pub private_key_path: PathBuf,
    /// Passphrase for an encrypted private key, if any.
    pub passphrase: Option<String>,
}

impl SigningConfig {
    /// Points signing at the given private key file, with no passphrase.
    pub fn new(private_key_path: PathBuf) -> Self {
        Self {
            private_key_path,
            passphrase: None,
        }
    }

    /// Sets the passphrase used to decrypt an encrypted private key.
    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase.replace(passphrase.into());
        self
    }

    /// The basename used in the signature archive's entry name
    /// (`.SIGN.RSA.<basename>.pub`, spec.md §4.9 / §6).
    pub fn key_basename(&self) -> crate::Result<String> {
        self.private_key_path
            .file_name()
            .and_then(|s| s.to_str())
            .map(str::to_owned)
            .ok_or_else(|| crate::Error::FailedToExtractFilename(self.private_key_path.clone()))
    }

    /// Loads the RSA private key, trying PKCS#1 PEM, then unencrypted PKCS#8
    /// PEM, then passphrase-protected PKCS#8 PEM (in that order).
    pub(crate) fn load_key(&self) -> crate::Result<RsaPrivateKey> {
        let pem = fs::read_to_string(&self.private_key_path)
            .map_err(|e| crate::Error::IoWithPath(self.private_key_path.clone(), e))?;

        if let Ok(key) = RsaPrivateKey::from_pkcs1_pem(&pem) {
            return Ok(key);
        }
        if let Ok(key) = RsaPrivateKey::from_pkcs8_pem(&pem) {
            return Ok(key);
        }
        if let Some(passphrase) = &self.passphrase {
            return RsaPrivateKey::from_pkcs8_encrypted_pem(&pem, passphrase).map_err(|e| {
                crate::Error::SigningKey(self.private_key_path.clone(), e.to_string())
            });
        }

        Err(crate::Error::SigningKey(
            self.private_key_path.clone(),
            "not a recognized PKCS#1 or PKCS#8 PEM key (and no passphrase was \
             supplied to try decrypting it)"
                .to_string(),
        ))
    }
}

/// Signs `digest` -- the SHA-1 digest already computed over the control
/// archive bytes by the control-section builder -- with PKCS#1 v1.5 padding
/// (spec.md §4.9). `digest` is the 20-byte SHA-1 output itself, not a message
/// to be hashed again: this mirrors `abuild-sign`/apk-tools, which sign the
/// control tar.gz's SHA-1 digest directly rather than hashing it twice.
pub(crate) fn sign_control_digest(
    signing: &SigningConfig,
    digest: &[u8],
) -> crate::Result<Vec<u8>> {
    let key = signing.load_key()?;
    let padding = Pkcs1v15Sign::new::<Sha1>();
    let signature = key.sign(padding, digest)?;
    Ok(signature)
}
