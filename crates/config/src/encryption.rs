//! Encryption utilities for `ENC(...)` configuration values.
//!
//! Responsibilities:
//! - Provide AES-256-GCM encryption and decryption of individual values.
//! - Parse and validate secret keys (64 hex characters, 32 bytes).
//! - Encode ciphertext as `ENC(<hex(nonce || ciphertext)>)` tokens.
//!
//! Does NOT handle:
//! - Deciding which key to use (see `secret.rs` for the resolution chain).
//! - Finding tokens inside a configuration tree (see `loader/builder.rs`).
//!
//! Invariants:
//! - Key material is held in `secrecy` wrappers and never appears in `Debug` output.
//! - A fresh random nonce is generated for every encryption.

use std::fmt;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::constants::{NONCE_LEN, SECRET_KEY_LEN};

/// Errors that can occur while handling secrets.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error(
        "No decryption key available. Pass a key explicitly, register a global key or key provider, or set STRATA_SECRET_KEY"
    )]
    MissingKey,

    #[error("Invalid secret key: {0}")]
    InvalidKey(String),

    #[error("Malformed secret token: {0}")]
    MalformedToken(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed (wrong key or tampered ciphertext): {0}")]
    DecryptionFailed(String),
}

pub type Result<T> = std::result::Result<T, SecretError>;

/// A validated AES-256 key, stored hex-encoded.
#[derive(Clone)]
pub struct SecretKey {
    encoded: SecretString,
}

impl SecretKey {
    /// Parses a hex-encoded key, failing immediately on a malformed value.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        decode_key(trimmed)?;
        Ok(Self {
            encoded: SecretString::new(trimmed.to_string().into()),
        })
    }

    /// Generates a new random key.
    pub fn generate() -> Self {
        let key: [u8; SECRET_KEY_LEN] = rand::random();
        Self {
            encoded: SecretString::new(hex::encode(key).into()),
        }
    }

    /// Returns the hex form of the key. Callers are responsible for not logging it.
    pub fn expose_hex(&self) -> &str {
        self.encoded.expose_secret()
    }

    fn bytes(&self) -> Result<[u8; SECRET_KEY_LEN]> {
        decode_key(self.encoded.expose_secret())
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey([REDACTED])")
    }
}

fn decode_key(text: &str) -> Result<[u8; SECRET_KEY_LEN]> {
    let bytes = hex::decode(text)
        .map_err(|e| SecretError::InvalidKey(format!("expected hex characters: {e}")))?;
    bytes.as_slice().try_into().map_err(|_| {
        SecretError::InvalidKey(format!(
            "expected {} bytes ({} hex characters), got {} bytes",
            SECRET_KEY_LEN,
            SECRET_KEY_LEN * 2,
            bytes.len()
        ))
    })
}

/// Core cryptographic logic for AES-256-GCM.
pub struct Encryptor;

impl Encryptor {
    /// Encrypts data using AES-256-GCM.
    /// Returns (ciphertext + tag, nonce).
    pub fn encrypt(data: &[u8], key: &[u8; SECRET_KEY_LEN]) -> Result<(Vec<u8>, [u8; NONCE_LEN])> {
        let cipher = Aes256Gcm::new(key.into());
        let nonce_bytes: [u8; NONCE_LEN] = rand::random();
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, data)
            .map_err(|e| SecretError::EncryptionFailed(e.to_string()))?;

        Ok((ciphertext, nonce_bytes))
    }

    /// Decrypts data using AES-256-GCM.
    pub fn decrypt(
        ciphertext: &[u8],
        key: &[u8; SECRET_KEY_LEN],
        nonce: &[u8; NONCE_LEN],
    ) -> Result<Vec<u8>> {
        let cipher = Aes256Gcm::new(key.into());
        let nonce = Nonce::from_slice(nonce);

        cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| SecretError::DecryptionFailed(e.to_string()))
    }
}

/// Returns the ciphertext inside `ENC(...)`, or `None` if `value` is not a token.
pub fn token_payload(value: &str) -> Option<&str> {
    value
        .strip_prefix("ENC(")
        .and_then(|rest| rest.strip_suffix(')'))
        .filter(|payload| !payload.is_empty())
}

/// Encrypts `plaintext` into an `ENC(...)` token.
pub fn encrypt_value(plaintext: &str, key: &SecretKey) -> Result<String> {
    let (ciphertext, nonce) = Encryptor::encrypt(plaintext.as_bytes(), &key.bytes()?)?;
    let mut payload = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    payload.extend_from_slice(&nonce);
    payload.extend_from_slice(&ciphertext);
    Ok(format!("ENC({})", hex::encode(payload)))
}

/// Decrypts the payload of an `ENC(...)` token (the text between the parentheses).
pub fn decrypt_payload(payload: &str, key: &SecretKey) -> Result<SecretString> {
    let raw = hex::decode(payload)
        .map_err(|e| SecretError::MalformedToken(format!("ciphertext is not hex: {e}")))?;
    if raw.len() <= NONCE_LEN {
        return Err(SecretError::MalformedToken(format!(
            "ciphertext too short ({} bytes)",
            raw.len()
        )));
    }
    let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
    let nonce: [u8; NONCE_LEN] = nonce
        .try_into()
        .map_err(|_| SecretError::MalformedToken("invalid nonce size".to_string()))?;

    let plaintext = Encryptor::decrypt(ciphertext, &key.bytes()?, &nonce)?;
    let text = String::from_utf8(plaintext)
        .map_err(|_| SecretError::DecryptionFailed("plaintext is not valid UTF-8".to_string()))?;
    Ok(SecretString::new(text.into()))
}
