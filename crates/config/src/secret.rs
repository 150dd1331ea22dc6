//! Lazily decrypted configuration secrets.
//!
//! Responsibilities:
//! - Hold `ENC(...)` ciphertext without decrypting it at load time.
//! - Resolve the decryption key: explicit argument, then the registered global key,
//!   then the registered key provider, then `STRATA_SECRET_KEY`.
//! - Cache decrypted plaintext until it is scrubbed.
//!
//! Does NOT handle:
//! - The cipher itself (see `encryption.rs`).
//! - Finding `ENC(...)` strings in a tree (see `loader/builder.rs`).
//!
//! Invariants:
//! - A `LazySecret` is only ever constructed from ciphertext.
//! - Neither `Debug` nor any other formatting path reveals plaintext.
//! - Plaintext is only produced by an explicit `get()` call.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use secrecy::SecretString;

use crate::constants::ENV_SECRET_KEY;
use crate::encryption::{self, Result, SecretError, SecretKey};
use crate::loader::env_var_or_none;

/// Callback consulted when no explicit or global key is available.
pub type KeyProvider = Arc<dyn Fn() -> Option<String> + Send + Sync>;

static GLOBAL_KEY: RwLock<Option<SecretKey>> = RwLock::new(None);
static KEY_PROVIDER: RwLock<Option<KeyProvider>> = RwLock::new(None);

/// Registers the process-wide decryption key.
///
/// The key format is validated immediately; an invalid key leaves any previously
/// registered key in place.
pub fn set_global_key(key: &str) -> Result<()> {
    let parsed = SecretKey::parse(key)?;
    *GLOBAL_KEY.write().unwrap_or_else(PoisonError::into_inner) = Some(parsed);
    Ok(())
}

/// Removes the process-wide decryption key.
pub fn clear_global_key() {
    *GLOBAL_KEY.write().unwrap_or_else(PoisonError::into_inner) = None;
}

/// Registers a callback that supplies a hex key on demand (e.g. from a vault client).
pub fn set_key_provider<F>(provider: F)
where
    F: Fn() -> Option<String> + Send + Sync + 'static,
{
    *KEY_PROVIDER.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(provider));
}

/// Removes the registered key provider.
pub fn clear_key_provider() {
    *KEY_PROVIDER.write().unwrap_or_else(PoisonError::into_inner) = None;
}

/// Resolves the key to decrypt with, in chain order.
pub fn resolve_key(explicit: Option<&SecretKey>) -> Result<SecretKey> {
    if let Some(key) = explicit {
        return Ok(key.clone());
    }

    if let Some(key) = GLOBAL_KEY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
    {
        return Ok(key.clone());
    }

    // Clone the provider out so the callback runs without holding the lock.
    let provider = KEY_PROVIDER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    if let Some(text) = provider.and_then(|provider| provider()) {
        return SecretKey::parse(&text);
    }

    match env_var_or_none(ENV_SECRET_KEY) {
        Some(text) => SecretKey::parse(&text),
        None => Err(SecretError::MissingKey),
    }
}

/// An encrypted configuration value.
pub struct LazySecret {
    ciphertext: String,
    plaintext: Mutex<Option<SecretString>>,
}

impl LazySecret {
    /// Wraps raw ciphertext (the text between `ENC(` and `)`).
    pub fn new(ciphertext: impl Into<String>) -> Self {
        Self {
            ciphertext: ciphertext.into(),
            plaintext: Mutex::new(None),
        }
    }

    /// Wraps a full `ENC(...)` token, or returns `None` if `token` is not one.
    pub fn from_token(token: &str) -> Option<Self> {
        encryption::token_payload(token).map(Self::new)
    }

    pub fn ciphertext(&self) -> &str {
        &self.ciphertext
    }

    /// Decrypts and returns the plaintext.
    ///
    /// An explicit key always forces a fresh decryption. Without one, a cached
    /// plaintext from an earlier call is returned if present.
    pub fn get(&self, key: Option<&SecretKey>) -> Result<SecretString> {
        if key.is_none()
            && let Some(plaintext) = self.cached()
        {
            return Ok(plaintext);
        }

        // The cache lock is not held here; key providers may read other secrets.
        let key = resolve_key(key)?;
        let plaintext = encryption::decrypt_payload(&self.ciphertext, &key)?;
        *self.plaintext.lock().unwrap_or_else(PoisonError::into_inner) = Some(plaintext.clone());
        Ok(plaintext)
    }

    fn cached(&self) -> Option<SecretString> {
        self.plaintext
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether plaintext is currently cached in memory.
    pub fn is_decrypted(&self) -> bool {
        self.plaintext
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Drops cached plaintext. `SecretString` zeroizes its buffer on drop; copies the
    /// caller obtained from `get()` are not affected.
    pub fn scrub(&self) {
        self.plaintext
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

impl Clone for LazySecret {
    /// Clones the ciphertext only; the copy starts without cached plaintext.
    fn clone(&self) -> Self {
        Self::new(self.ciphertext.clone())
    }
}

impl PartialEq for LazySecret {
    fn eq(&self, other: &Self) -> bool {
        self.ciphertext == other.ciphertext
    }
}

impl fmt::Debug for LazySecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LazySecret([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encryption::encrypt_value;
    use secrecy::ExposeSecret;
    use serial_test::serial;

    fn reset_chain() {
        clear_global_key();
        clear_key_provider();
    }

    fn secret_for(plaintext: &str, key: &SecretKey) -> LazySecret {
        LazySecret::from_token(&encrypt_value(plaintext, key).unwrap()).unwrap()
    }

    #[test]
    #[serial]
    fn test_explicit_key_decrypts() {
        reset_chain();
        let key = SecretKey::generate();
        let secret = secret_for("s3cret", &key);

        assert!(!secret.is_decrypted());
        assert_eq!(secret.get(Some(&key)).unwrap().expose_secret(), "s3cret");
        assert!(secret.is_decrypted());
    }

    #[test]
    #[serial]
    fn test_missing_key_when_chain_is_empty() {
        reset_chain();
        let key = SecretKey::generate();
        let secret = secret_for("value", &key);

        temp_env::with_var_unset(ENV_SECRET_KEY, || {
            assert!(matches!(secret.get(None), Err(SecretError::MissingKey)));
        });
        assert!(!secret.is_decrypted());
    }

    #[test]
    #[serial]
    fn test_global_key_beats_provider_and_env() {
        reset_chain();
        let global = SecretKey::generate();
        let other = SecretKey::generate();
        let other_hex = other.expose_hex().to_string();
        set_global_key(global.expose_hex()).unwrap();
        set_key_provider(move || Some(other_hex.clone()));

        let secret = secret_for("from-global", &global);
        temp_env::with_var(ENV_SECRET_KEY, Some(other.expose_hex()), || {
            assert_eq!(
                secret.get(None).unwrap().expose_secret(),
                "from-global"
            );
        });
        reset_chain();
    }

    #[test]
    #[serial]
    fn test_provider_beats_env() {
        reset_chain();
        let provided = SecretKey::generate();
        let env_key = SecretKey::generate();
        let provided_hex = provided.expose_hex().to_string();
        set_key_provider(move || Some(provided_hex.clone()));

        let secret = secret_for("from-provider", &provided);
        temp_env::with_var(ENV_SECRET_KEY, Some(env_key.expose_hex()), || {
            assert_eq!(
                secret.get(None).unwrap().expose_secret(),
                "from-provider"
            );
        });
        reset_chain();
    }

    #[test]
    #[serial]
    fn test_provider_may_inspect_the_secret_it_unlocks() {
        reset_chain();
        let key = SecretKey::generate();
        let key_hex = key.expose_hex().to_string();
        let secret = Arc::new(secret_for("nested", &key));

        let seen = Arc::clone(&secret);
        set_key_provider(move || {
            assert!(!seen.is_decrypted());
            Some(key_hex.clone())
        });

        assert_eq!(secret.get(None).unwrap().expose_secret(), "nested");
        assert!(secret.is_decrypted());
        reset_chain();
    }

    #[test]
    #[serial]
    fn test_env_key_is_last_resort() {
        reset_chain();
        let key = SecretKey::generate();
        let secret = secret_for("from-env", &key);

        temp_env::with_var(ENV_SECRET_KEY, Some(key.expose_hex()), || {
            assert_eq!(secret.get(None).unwrap().expose_secret(), "from-env");
        });
    }

    #[test]
    #[serial]
    fn test_set_global_key_validates_immediately() {
        reset_chain();
        let good = SecretKey::generate();
        set_global_key(good.expose_hex()).unwrap();

        assert!(matches!(
            set_global_key("definitely-not-a-key"),
            Err(SecretError::InvalidKey(_))
        ));

        // The earlier registration survives the failed one.
        let secret = secret_for("still-works", &good);
        assert_eq!(secret.get(None).unwrap().expose_secret(), "still-works");
        reset_chain();
    }

    #[test]
    #[serial]
    fn test_wrong_explicit_key_fails_even_with_cache() {
        reset_chain();
        let key = SecretKey::generate();
        let wrong = SecretKey::generate();
        let secret = secret_for("cached", &key);

        secret.get(Some(&key)).unwrap();
        assert!(matches!(
            secret.get(Some(&wrong)),
            Err(SecretError::DecryptionFailed(_))
        ));
    }

    #[test]
    #[serial]
    fn test_scrub_clears_cached_plaintext() {
        reset_chain();
        let key = SecretKey::generate();
        let secret = secret_for("ephemeral", &key);

        secret.get(Some(&key)).unwrap();
        assert!(secret.is_decrypted());
        secret.scrub();
        assert!(!secret.is_decrypted());

        temp_env::with_var_unset(ENV_SECRET_KEY, || {
            assert!(matches!(secret.get(None), Err(SecretError::MissingKey)));
        });
    }

    #[test]
    fn test_debug_never_shows_ciphertext_or_plaintext() {
        let secret = LazySecret::new("abcdef0123");
        let debug = format!("{:?}", secret);
        assert!(!debug.contains("abcdef0123"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_clone_does_not_carry_plaintext() {
        let key = SecretKey::generate();
        let secret = secret_for("copy-me", &key);
        secret.get(Some(&key)).unwrap();

        let copy = secret.clone();
        assert_eq!(copy, secret);
        assert!(!copy.is_decrypted());
    }
}
