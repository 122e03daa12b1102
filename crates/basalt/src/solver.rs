//! Entry point: a bound solver library.
//!
//! [`Basalt`] owns the loaded library (shared object or in-process stub)
//! and hands out configurations and environments. It is cheap to clone and
//! safe to share across threads; the values it creates are not.

use crate::api::Api;
use crate::config::Config;
use crate::env::Env;
use crate::error::{Error, Result};
use crate::ffi::loader::NativeLibrary;
use crate::ffi::types::NativeValue;
use crate::ops;
use basalt_sys::{RawConfig, RawEnv};
use std::ffi::OsStr;
use std::sync::Arc;

/// A loaded solver library.
#[derive(Debug, Clone)]
pub struct Basalt {
    api: Arc<Api>,
}

impl Basalt {
    /// Load the solver from a shared library path or platform library name.
    pub fn load(library: impl AsRef<OsStr>) -> Result<Self> {
        let lib = NativeLibrary::open(library)?;
        Ok(Self {
            api: Arc::new(Api::new(lib)?),
        })
    }

    /// Bind the in-process reference backend instead of a shared library.
    #[cfg(feature = "stub")]
    pub fn stub() -> Self {
        match Api::new(NativeLibrary::stub()) {
            Ok(api) => Self { api: Arc::new(api) },
            Err(_) => unreachable!("the stub backend resolves its own symbols"),
        }
    }

    /// Create an empty configuration.
    pub fn config(&self) -> Result<Config> {
        Config::create(Arc::clone(&self.api))
    }

    /// Parse a configuration from `key = value` lines.
    pub fn config_from_str(&self, text: &str) -> Result<Config> {
        Config::parse(Arc::clone(&self.api), text)
    }

    fn env_result(&self, op: &'static str, v: NativeValue) -> Result<Env> {
        match v {
            NativeValue::Env(raw) if raw.is_error() => Err(Error::Native {
                op,
                message: "returned the error handle".to_string(),
            }),
            NativeValue::Env(raw) => Ok(Env::wrap(Arc::clone(&self.api), raw)),
            _ => unreachable!("signature table guarantees an env return"),
        }
    }

    /// Create an environment from a configuration. The configuration stays
    /// usable and may back further environments.
    pub fn env(&self, config: &Config) -> Result<Env> {
        let v = self.api.call(&ops::ENV_NEW, &[config.val()])?;
        self.env_result(ops::ENV_NEW.name, v)
    }

    /// Create an environment sharing term storage with `sibling`.
    pub fn shared_env(&self, config: &Config, sibling: &Env) -> Result<Env> {
        let v = self
            .api
            .call(&ops::ENV_NEW_SHARED, &[config.val(), sibling.val()])?;
        self.env_result(ops::ENV_NEW_SHARED.name, v)
    }

    /// Re-adopt a configuration handle released with [`Config::into_raw`].
    ///
    /// # Safety
    ///
    /// `raw` must be a live configuration handle from this library, owned
    /// by no other wrapper.
    pub unsafe fn adopt_config(&self, raw: RawConfig) -> Config {
        Config::wrap(Arc::clone(&self.api), raw)
    }

    /// Re-adopt an environment handle released with [`Env::into_raw`].
    ///
    /// # Safety
    ///
    /// `raw` must be a live environment handle from this library, owned by
    /// no other wrapper.
    pub unsafe fn adopt_env(&self, raw: RawEnv) -> Env {
        Env::wrap(Arc::clone(&self.api), raw)
    }
}
