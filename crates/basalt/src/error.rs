//! Error types for the binding.

use crate::ffi::caller::CallError;
use crate::ffi::loader::LoadError;
use crate::ffi::marshal::MarshalError;
use thiserror::Error;

/// Any failure surfaced by the binding.
///
/// Native failure codes are never swallowed or defaulted: a failing status,
/// an error-sentinel handle, or an out-of-range result discriminant always
/// arrives as a typed variant, with the library's last-error text attached
/// when an environment was available to ask.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Marshal(#[from] MarshalError),
    #[error(transparent)]
    Call(#[from] CallError),
    #[error("native operation `{op}` failed: {message}")]
    Native { op: &'static str, message: String },
    #[error("`{text}` does not denote a rational value")]
    Numeral { text: String },
}

pub type Result<T> = std::result::Result<T, Error>;
