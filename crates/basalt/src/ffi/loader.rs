//! Native library resolution.
//!
//! The solver is bound at runtime: either a shared `libbasalt` loaded with
//! `libloading`, or (feature `stub`) the in-process reference backend from
//! `basalt-sys`. Both backings answer the same question — the address of a
//! named symbol — so everything above this module is backend-agnostic.

use libloading::Library;
use std::ffi::{c_void, OsStr};
use thiserror::Error;

/// Library loading errors.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to load native library `{name}`: {source}")]
    LoadFailed {
        name: String,
        #[source]
        source: libloading::Error,
    },
    #[error("symbol `{symbol}` not found in native library")]
    SymbolNotFound { symbol: &'static str },
}

#[derive(Debug)]
enum Backing {
    Dynamic(Library),
    #[cfg(feature = "stub")]
    Stub,
}

/// A loaded solver library.
///
/// Keeps the underlying shared object alive for as long as any symbol
/// resolved from it may be called.
#[derive(Debug)]
pub struct NativeLibrary {
    backing: Backing,
}

impl NativeLibrary {
    /// Load a shared library by path or by platform library name, with
    /// `dlopen`-style resolution semantics.
    ///
    /// # Safety considerations
    ///
    /// Loading a library executes its initialization code; the caller must
    /// trust the named library.
    pub fn open(name: impl AsRef<OsStr>) -> Result<Self, LoadError> {
        let name = name.as_ref();
        let library = unsafe { Library::new(name) }.map_err(|source| LoadError::LoadFailed {
            name: name.to_string_lossy().into_owned(),
            source,
        })?;
        Ok(Self {
            backing: Backing::Dynamic(library),
        })
    }

    /// Use the in-process reference backend instead of a shared library.
    #[cfg(feature = "stub")]
    pub fn stub() -> Self {
        Self {
            backing: Backing::Stub,
        }
    }

    /// Address of a named symbol.
    ///
    /// The address stays valid while `self` is alive; callers must not
    /// outlive the library with it.
    pub(crate) fn symbol(&self, name: &'static str) -> Result<*const c_void, LoadError> {
        match &self.backing {
            Backing::Dynamic(library) => {
                let sym: libloading::Symbol<'_, unsafe extern "C" fn()> =
                    unsafe { library.get(name.as_bytes()) }
                        .map_err(|_| LoadError::SymbolNotFound { symbol: name })?;
                Ok(*sym as *const c_void)
            }
            #[cfg(feature = "stub")]
            Backing::Stub => {
                basalt_sys::stub::lookup(name).ok_or(LoadError::SymbolNotFound { symbol: name })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_library_fails() {
        let err = NativeLibrary::open("no_such_library_zzz").unwrap_err();
        assert!(matches!(err, LoadError::LoadFailed { .. }));
    }

    #[cfg(feature = "stub")]
    #[test]
    fn test_stub_resolves_known_symbols() {
        let lib = NativeLibrary::stub();
        assert!(lib.symbol("basalt_solve").is_ok());
        assert!(matches!(
            lib.symbol("basalt_bogus"),
            Err(LoadError::SymbolNotFound {
                symbol: "basalt_bogus"
            })
        ));
    }
}
