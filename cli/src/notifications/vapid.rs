//! VAPID keys for Web Push (RFC 8292).
//!
//! Generates and validates P-256 ECDSA keypairs. The public half is the
//! application server key a page passes to `pushManager.subscribe()`; the
//! private half signs the VAPID JWT on every push request.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64URL, Engine};
use p256::ecdsa::SigningKey;
use p256::elliptic_curve::rand_core::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{P256_PRIVATE_KEY_LEN, P256_PUBLIC_KEY_LEN};
use crate::encoding::{url_base64_to_bytes, DecodeError};

/// Why a piece of key material was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// Key string was empty.
    #[error("key is empty")]
    Empty,
    /// Key string is not valid URL-safe base64.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// Decoded key has the wrong size.
    #[error("expected {expected}-byte key, got {actual} bytes")]
    Length {
        /// Required length.
        expected: usize,
        /// Decoded length.
        actual: usize,
    },
    /// Public key does not use the uncompressed SEC1 encoding.
    #[error("public key is not an uncompressed point (leading byte 0x{0:02x}, expected 0x04)")]
    NotUncompressed(u8),
    /// Public key bytes are not a point on P-256.
    #[error("public key is not a valid P-256 point")]
    NotOnCurve,
}

/// Check that raw bytes form a usable application server key.
pub fn validate_application_server_key(bytes: &[u8]) -> Result<(), KeyError> {
    if bytes.len() != P256_PUBLIC_KEY_LEN {
        return Err(KeyError::Length {
            expected: P256_PUBLIC_KEY_LEN,
            actual: bytes.len(),
        });
    }
    if bytes[0] != 0x04 {
        return Err(KeyError::NotUncompressed(bytes[0]));
    }
    if p256::PublicKey::from_sec1_bytes(bytes).is_err() {
        return Err(KeyError::NotOnCurve);
    }
    Ok(())
}

/// Decode and validate a URL-safe base64 application server key.
pub fn decode_application_server_key(encoded: &str) -> Result<Vec<u8>, KeyError> {
    if encoded.trim().is_empty() {
        return Err(KeyError::Empty);
    }
    let bytes = url_base64_to_bytes(encoded.trim())?;
    validate_application_server_key(&bytes)?;
    Ok(bytes)
}

/// VAPID keypair for web push authentication.
///
/// The private key is stored as the raw 32-byte scalar and the public key
/// as the uncompressed SEC1 point (65 bytes), both URL-safe base64 without
/// padding. The raw scalar is the format `web-push`'s
/// `VapidSignatureBuilder::from_base64()` expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VapidKeys {
    /// Raw 32-byte P-256 private key scalar (base64url).
    private_key_b64: String,
    /// Uncompressed public key bytes (base64url, 65 bytes decoded).
    public_key_b64: String,
}

impl VapidKeys {
    /// Generate a fresh VAPID keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut OsRng);
        Self::from_signing_key(&signing_key)
    }

    fn from_signing_key(signing_key: &SigningKey) -> Self {
        // SEC1 uncompressed public key (65 bytes: 0x04 || x || y)
        let public_bytes = signing_key.verifying_key().to_encoded_point(false);
        Self {
            private_key_b64: BASE64URL.encode(signing_key.to_bytes().as_slice()),
            public_key_b64: BASE64URL.encode(public_bytes.as_bytes()),
        }
    }

    /// Reconstruct from provisioned base64url strings.
    ///
    /// Both halves are validated and must belong to the same keypair.
    pub fn from_base64url(public_key_b64: &str, private_key_b64: &str) -> Result<Self> {
        let pub_bytes = decode_application_server_key(public_key_b64)
            .context("Invalid VAPID public key")?;

        let priv_bytes =
            url_base64_to_bytes(private_key_b64.trim()).context("Invalid base64url for VAPID private key")?;
        anyhow::ensure!(
            priv_bytes.len() == P256_PRIVATE_KEY_LEN,
            "VAPID private key must be a {}-byte P-256 scalar, got {} bytes",
            P256_PRIVATE_KEY_LEN,
            priv_bytes.len()
        );
        let signing_key = SigningKey::from_slice(&priv_bytes)
            .context("VAPID private key is not a valid P-256 scalar")?;

        let keys = Self::from_signing_key(&signing_key);
        anyhow::ensure!(
            keys.application_server_key()? == pub_bytes,
            "VAPID public key does not match the private key"
        );
        Ok(keys)
    }

    /// Base64url-encoded uncompressed public key.
    ///
    /// This is what browsers receive as the `applicationServerKey`.
    pub fn public_key_base64url(&self) -> &str {
        &self.public_key_b64
    }

    /// Base64url-encoded raw 32-byte private key scalar.
    pub fn private_key_base64url(&self) -> &str {
        &self.private_key_b64
    }

    /// Decoded public key bytes (65 bytes).
    pub fn application_server_key(&self) -> Result<Vec<u8>> {
        url_base64_to_bytes(&self.public_key_b64).context("Failed to decode VAPID public key")
    }
}
