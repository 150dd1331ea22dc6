//! Layered, provenance-tracked configuration for strata.
//!
//! A config directory holds `application.<ext>`, optional `application-<profile>.<ext>`
//! overlays, and any files they pull in through `imports`. [`ConfigLoader`] resolves such
//! a directory into one [`Config`], recording every file it opened; `ENC(...)` values stay
//! encrypted until [`LazySecret::get`] is called.

pub mod config;
pub mod constants;
pub mod encryption;
pub mod format;
mod loader;
pub mod merge;
pub mod secret;
pub mod singleton;
pub mod value;

pub use config::{Config, ConfigNode, ConfigView, Metadata};
pub use encryption::{SecretError, SecretKey, encrypt_value};
pub use format::ConfigFormat;
pub use loader::{
    ConfigError, ConfigLoader, ImportTraceEntry, env_var_or_none, expand_env, load_config,
    resolve_profile, running_under_test_harness,
};
pub use merge::{merge, merge_into};
pub use secret::{
    LazySecret, clear_global_key, clear_key_provider, set_global_key, set_key_provider,
};
pub use singleton::ConfigSingleton;
pub use value::{Map, Value};
