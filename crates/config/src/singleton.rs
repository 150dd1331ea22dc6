//! Process-wide, one-shot configuration holder.
//!
//! Responsibilities:
//! - Load the configuration exactly once and hand out shared references to it.
//! - Reject every later initialization attempt, concurrent or not.
//!
//! Does NOT handle:
//! - Reloading. Configuration is fixed for the life of the process.
//!
//! Invariants:
//! - At most one `initialize` call ever succeeds per holder (test-only reset aside).
//! - The lock is held from the state check through the load, so concurrent callers observe
//!   a finished state and later callers get `AlreadyInitialized` before any validation.
//! - A failed load leaves the holder uninitialized.

use std::borrow::Borrow;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::config::Config;
use crate::loader::{ConfigError, ConfigLoader};

#[derive(Debug)]
enum State {
    Uninitialized,
    Initializing,
    Ready(Arc<Config>),
}

/// A one-shot holder for a loaded [`Config`].
///
/// Most programs use [`ConfigSingleton::global`]; independent instances are useful in
/// tests and in libraries that want their own scope.
#[derive(Debug)]
pub struct ConfigSingleton {
    state: Mutex<State>,
}

static GLOBAL: ConfigSingleton = ConfigSingleton::new();

impl Default for ConfigSingleton {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigSingleton {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(State::Uninitialized),
        }
    }

    /// The process-wide holder.
    pub fn global() -> &'static ConfigSingleton {
        &GLOBAL
    }

    /// Loads `config_dir` under `profile` and stores the result.
    ///
    /// # Errors
    ///
    /// - `MissingProfile` if `profile` is empty.
    /// - `AlreadyInitialized` if any earlier call succeeded.
    /// - Any load error, in which case a later call may try again.
    pub fn initialize(
        &self,
        profile: &str,
        config_dir: impl Into<PathBuf>,
    ) -> Result<Arc<Config>, ConfigError> {
        self.initialize_locked(|| {
            if profile.trim().is_empty() {
                return Err(ConfigError::MissingProfile);
            }
            ConfigLoader::new()
                .with_profile(profile)
                .with_config_dir(config_dir)
                .from_env()
        })
    }

    /// Like [`ConfigSingleton::initialize`] with a fully configured loader.
    pub fn initialize_with(&self, loader: &ConfigLoader) -> Result<Arc<Config>, ConfigError> {
        self.initialize_locked(|| Ok(loader))
    }

    /// Checks the state, then prepares and runs the loader, all under one lock.
    fn initialize_locked<L>(
        &self,
        prepare: impl FnOnce() -> Result<L, ConfigError>,
    ) -> Result<Arc<Config>, ConfigError>
    where
        L: Borrow<ConfigLoader>,
    {
        let mut state = self.lock();
        if !matches!(*state, State::Uninitialized) {
            debug!("Rejecting repeated configuration initialization");
            return Err(ConfigError::AlreadyInitialized);
        }
        *state = State::Initializing;

        let result = prepare().and_then(|loader| {
            let loader: &ConfigLoader = loader.borrow();
            if loader.profile().is_none_or(|p| p.trim().is_empty()) {
                return Err(ConfigError::MissingProfile);
            }
            let config = Arc::new(loader.load()?);
            info!(
                profile = loader.profile().unwrap_or_default(),
                "Configuration initialized"
            );
            Ok(config)
        });

        *state = match &result {
            Ok(config) => State::Ready(Arc::clone(config)),
            Err(_) => State::Uninitialized,
        };
        result
    }

    /// The stored configuration.
    pub fn get(&self) -> Result<Arc<Config>, ConfigError> {
        match &*self.lock() {
            State::Ready(config) => Ok(Arc::clone(config)),
            _ => Err(ConfigError::NotInitialized),
        }
    }

    pub fn is_initialized(&self) -> bool {
        matches!(*self.lock(), State::Ready(_))
    }

    /// Forgets the stored configuration. Test builds only.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn reset_for_testing(&self) {
        *self.lock() = State::Uninitialized;
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        // Only a load that panicked can leave this state behind.
        if matches!(*state, State::Initializing) {
            *state = State::Uninitialized;
        }
        state
    }
}
