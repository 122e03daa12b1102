//! Solver configurations.
//!
//! A [`Config`] is created standalone or parsed from `key = value` text,
//! and may be shared by any number of environments — creating an
//! environment borrows the configuration, it does not consume it. The
//! native handle is destroyed on drop; [`Config::into_raw`] relinquishes
//! ownership instead.

use crate::api::Api;
use crate::error::{Error, Result};
use crate::ffi::types::NativeValue;
use crate::ops;
use basalt_sys::RawConfig;
use std::mem::ManuallyDrop;
use std::sync::Arc;

/// A solver configuration handle.
#[derive(Debug)]
pub struct Config {
    api: Arc<Api>,
    raw: RawConfig,
}

impl Config {
    pub(crate) fn wrap(api: Arc<Api>, raw: RawConfig) -> Self {
        Self { api, raw }
    }

    pub(crate) fn create(api: Arc<Api>) -> Result<Self> {
        match api.call(&ops::CONFIG_NEW, &[])? {
            NativeValue::Config(raw) if raw.is_error() => Err(Error::Native {
                op: ops::CONFIG_NEW.name,
                message: "returned the error handle".to_string(),
            }),
            NativeValue::Config(raw) => Ok(Self::wrap(api, raw)),
            _ => unreachable!("signature table guarantees a config return"),
        }
    }

    pub(crate) fn parse(api: Arc<Api>, text: &str) -> Result<Self> {
        let v = api.call(&ops::CONFIG_PARSE, &[NativeValue::Str(text.to_string())])?;
        match v {
            NativeValue::Config(raw) if raw.is_error() => Err(Error::Native {
                op: ops::CONFIG_PARSE.name,
                message: "configuration text did not parse".to_string(),
            }),
            NativeValue::Config(raw) => Ok(Self::wrap(api, raw)),
            _ => unreachable!("signature table guarantees a config return"),
        }
    }

    /// The raw handle. Valid only while this value is alive.
    pub fn raw(&self) -> RawConfig {
        self.raw
    }

    pub(crate) fn val(&self) -> NativeValue {
        NativeValue::Config(self.raw)
    }

    /// Relinquish ownership without destroying the configuration.
    pub fn into_raw(self) -> RawConfig {
        ManuallyDrop::new(self).raw
    }

    /// Set a named option. Configuration failures have no environment to
    /// record diagnostics, so the error carries the status alone.
    pub fn set_option(&mut self, key: &str, value: &str) -> Result<()> {
        self.api
            .call(
                &ops::CONFIG_SET_OPTION,
                &[
                    self.val(),
                    NativeValue::Str(key.to_string()),
                    NativeValue::Str(value.to_string()),
                ],
            )
            .map(|_| ())
    }
}

impl Drop for Config {
    fn drop(&mut self) {
        let _ = self
            .api
            .call(&ops::CONFIG_FREE, &[NativeValue::Config(self.raw)]);
    }
}
