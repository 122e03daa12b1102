//! Low-level ABI surface for the Basalt SMT solver.
//!
//! This crate defines the raw handle types and status constants of the
//! `libbasalt` C API. It deliberately contains no `extern` block: symbols are
//! resolved at runtime by the `basalt` crate, so this crate stays linkable on
//! hosts where the solver library is absent.
//!
//! **You probably want the `basalt` crate instead.** It provides the safe,
//! ergonomic API on top of these raw types.
//!
//! # Handles
//!
//! Every solver object is identified by an opaque pointer-sized handle. A
//! handle is meaningless to inspect and must only be passed back to the
//! library that produced it. The all-zero bit-pattern is the library's error
//! sentinel; [`RawTerm::is_error`] and friends test for it.
//!
//! # Thread safety
//!
//! libbasalt is not safe for concurrent use on handles sharing an
//! environment. The raw types are plain pointers and inherit no
//! synchronization; the `basalt` crate encodes the single-thread discipline
//! in its wrapper types.

use std::ffi::c_void;

#[cfg(feature = "stub")]
pub mod stub;

macro_rules! raw_handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[repr(transparent)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub *mut c_void);

        impl $name {
            /// The library's error sentinel for this handle kind.
            pub fn error() -> Self {
                Self(std::ptr::null_mut())
            }

            /// True when the handle is the error sentinel.
            pub fn is_error(&self) -> bool {
                self.0.is_null()
            }
        }
    };
}

raw_handle! {
    /// A solver configuration handle (`basalt_config_*`).
    RawConfig
}
raw_handle! {
    /// An environment handle: declarations, assertions, backtrack stack.
    RawEnv
}
raw_handle! {
    /// A term handle, valid only within the environment that built it.
    RawTerm
}
raw_handle! {
    /// A type handle, valid only within the environment that built it.
    RawType
}
raw_handle! {
    /// A declaration handle, valid only within its environment.
    RawDecl
}
raw_handle! {
    /// A model handle produced by a successful solve.
    RawModel
}

/// Status code returned by operations that can only succeed or fail.
pub const STATUS_OK: i32 = 0;

/// Result codes of `basalt_solve`.
pub const RESULT_UNKNOWN: i32 = -1;
pub const RESULT_UNSAT: i32 = 0;
pub const RESULT_SAT: i32 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_sentinel_is_null() {
        assert!(RawTerm::error().is_error());
        assert!(RawEnv::error().is_error());
        assert!(!RawTerm(0x1000 as *mut c_void).is_error());
    }

    #[test]
    fn test_handle_roundtrips_bit_pattern() {
        let p = 0xdead_b000 as *mut c_void;
        assert_eq!(RawConfig(p).0, p);
    }
}
