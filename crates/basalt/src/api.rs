//! Bound operation cache over a loaded library.
//!
//! `Api` owns the native library and lazily binds operations from the
//! signature table on first use, caching the bound callable per symbol name.
//! The text-release symbol is resolved eagerly because every text-returning
//! operation needs it.

use crate::error::Result;
use crate::ffi::caller::{NativeFn, SeqSignature, Signature};
use crate::ffi::loader::NativeLibrary;
use crate::ffi::types::NativeValue;
use crate::ops;
use std::collections::HashMap;
use std::ffi::c_char;
use std::sync::{Arc, Mutex};

pub(crate) struct Api {
    lib: NativeLibrary,
    release_text: unsafe extern "C" fn(*mut c_char),
    cache: Mutex<HashMap<&'static str, Arc<NativeFn>>>,
}

impl Api {
    pub fn new(lib: NativeLibrary) -> Result<Self> {
        let release = lib.symbol(ops::STR_FREE)?;
        // The symbol table pins this signature: void basalt_str_free(char*).
        let release_text = unsafe {
            std::mem::transmute::<*const std::ffi::c_void, unsafe extern "C" fn(*mut c_char)>(
                release,
            )
        };
        Ok(Self {
            lib,
            release_text,
            cache: Mutex::new(HashMap::new()),
        })
    }

    fn bound(
        &self,
        name: &'static str,
        bind: impl FnOnce(&NativeLibrary) -> Result<NativeFn>,
    ) -> Result<Arc<NativeFn>> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(f) = cache.get(name) {
            return Ok(Arc::clone(f));
        }
        let f = Arc::new(bind(&self.lib)?);
        cache.insert(name, Arc::clone(&f));
        Ok(f)
    }

    /// Invoke a fixed-arity operation.
    pub fn call(&self, sig: &'static Signature, args: &[NativeValue]) -> Result<NativeValue> {
        let f = self.bound(sig.name, |lib| {
            Ok(NativeFn::fixed(lib.symbol(sig.name)?, sig, self.release_text))
        })?;
        Ok(unsafe { f.invoke(args) }?)
    }

    /// Invoke a variadic operation with `seq` as its collection argument.
    pub fn call_seq(
        &self,
        sig: &'static SeqSignature,
        prefix: &[NativeValue],
        seq: &[NativeValue],
        suffix: &[NativeValue],
    ) -> Result<NativeValue> {
        let f = self.bound(sig.name, |lib| {
            Ok(NativeFn::variadic(
                lib.symbol(sig.name)?,
                sig,
                self.release_text,
            ))
        })?;
        Ok(unsafe { f.invoke_seq(prefix, seq, suffix) }?)
    }
}

impl std::fmt::Debug for Api {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Api").finish_non_exhaustive()
    }
}

#[cfg(all(test, feature = "stub"))]
mod tests {
    use super::*;
    use crate::error::Error;

    fn stub_api() -> Api {
        Api::new(NativeLibrary::stub()).unwrap()
    }

    #[test]
    fn test_call_binds_lazily_and_caches() {
        let api = stub_api();
        let a = api.call(&ops::CONFIG_NEW, &[]).unwrap();
        let b = api.call(&ops::CONFIG_NEW, &[]).unwrap();
        assert_eq!(api.cache.lock().unwrap().len(), 1);
        for v in [a, b] {
            api.call(&ops::CONFIG_FREE, &[v]).unwrap();
        }
    }

    #[test]
    fn test_unknown_symbol_is_load_error() {
        static BOGUS: Signature = Signature {
            name: "basalt_not_an_op",
            params: &[],
            ret: crate::ffi::types::Kind::Void,
        };
        let api = stub_api();
        let err = api.call(&BOGUS, &[]).unwrap_err();
        assert!(matches!(err, Error::Load(_)));
    }

    #[test]
    fn test_status_failure_surfaces() {
        let api = stub_api();
        // Popping with no open backtrack point fails at the native level.
        let cfg = api.call(&ops::CONFIG_NEW, &[]).unwrap();
        let env = api.call(&ops::ENV_NEW, &[cfg.clone()]).unwrap();
        let err = api.call(&ops::POP, &[env.clone()]).unwrap_err();
        assert!(matches!(err, Error::Call(_)));
        api.call(&ops::ENV_FREE, &[env]).unwrap();
        api.call(&ops::CONFIG_FREE, &[cfg]).unwrap();
    }
}
