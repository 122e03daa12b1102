//! Signature-driven native calls.
//!
//! An operation is described by its [`Signature`]: a symbol name, ordered
//! parameter kinds, and a return kind. [`NativeFn`] turns a signature plus a
//! resolved symbol address into a callable, using one libffi call interface
//! per operation. The same mechanism serves every fixed arity; nothing here
//! is generated per arity or per operation.
//!
//! Operations taking a variable-length collection are described by a
//! [`SeqSignature`] instead: the sequence marshaler provides a contiguous
//! buffer, and the call splices a (buffer, length) pair between the prefix
//! and suffix parameters.
//!
//! # Safety
//!
//! Calling through a `NativeFn` is sound only if the signature matches the
//! native symbol's actual ABI. The per-operation signature table is the
//! single source of truth for that correspondence; everything above it is
//! safe code.

use crate::ffi::marshal::{claim_text, ArgPack, MarshalError};
use crate::ffi::seq::SeqBuffer;
use crate::ffi::types::{Kind, NativeValue, SatResult};
use libffi::middle::{Arg, Cif, CodePtr, Type};
use std::ffi::{c_char, c_void};
use thiserror::Error;

/// Description of a fixed-arity native operation.
#[derive(Debug, Clone, Copy)]
pub struct Signature {
    pub name: &'static str,
    pub params: &'static [Kind],
    pub ret: Kind,
}

/// Description of an operation taking one variable-length collection,
/// passed as a (buffer, length) pair between `prefix` and `suffix`.
#[derive(Debug, Clone, Copy)]
pub struct SeqSignature {
    pub name: &'static str,
    pub prefix: &'static [Kind],
    pub elem: Kind,
    pub suffix: &'static [Kind],
    pub ret: Kind,
}

/// Errors crossing or preparing a native call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CallError {
    #[error(transparent)]
    Marshal(#[from] MarshalError),
    #[error("`{op}` expects {expected} arguments, got {got}")]
    ArityMismatch {
        op: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("native `{op}` reported failure (status {code})")]
    Status { op: &'static str, code: i32 },
    #[error("native `{op}` returned result code {code} outside the closed set")]
    UnknownResult { op: &'static str, code: i32 },
    #[error("native `{op}` returned no text")]
    NullText { op: &'static str },
}

enum Shape {
    Fixed(&'static Signature),
    Variadic(&'static SeqSignature),
}

impl Shape {
    fn name(&self) -> &'static str {
        match self {
            Shape::Fixed(s) => s.name,
            Shape::Variadic(s) => s.name,
        }
    }

    fn ret(&self) -> Kind {
        match self {
            Shape::Fixed(s) => s.ret,
            Shape::Variadic(s) => s.ret,
        }
    }
}

/// A native operation bound to a resolved symbol address.
pub(crate) struct NativeFn {
    cif: Cif,
    code: CodePtr,
    shape: Shape,
    release_text: unsafe extern "C" fn(*mut c_char),
}

// One bound operation only carries a code address and its call interface;
// sharing it across threads is as safe as the underlying library allows,
// which the handle wrappers already gate.
unsafe impl Send for NativeFn {}
unsafe impl Sync for NativeFn {}

impl NativeFn {
    /// Bind a fixed-arity operation to a symbol address.
    pub fn fixed(
        code: *const c_void,
        sig: &'static Signature,
        release_text: unsafe extern "C" fn(*mut c_char),
    ) -> Self {
        let cif = Cif::new(sig.params.iter().map(Kind::ffi_type), sig.ret.ffi_type());
        Self {
            cif,
            code: CodePtr::from_ptr(code),
            shape: Shape::Fixed(sig),
            release_text,
        }
    }

    /// Bind a variadic operation; the (buffer, length) pair lands between
    /// the prefix and suffix parameters.
    pub fn variadic(
        code: *const c_void,
        sig: &'static SeqSignature,
        release_text: unsafe extern "C" fn(*mut c_char),
    ) -> Self {
        let params = sig
            .prefix
            .iter()
            .map(Kind::ffi_type)
            .chain([Type::pointer(), Type::usize()])
            .chain(sig.suffix.iter().map(Kind::ffi_type))
            .collect::<Vec<_>>();
        let cif = Cif::new(params, sig.ret.ffi_type());
        Self {
            cif,
            code: CodePtr::from_ptr(code),
            shape: Shape::Variadic(sig),
            release_text,
        }
    }

    /// Call a fixed-arity operation.
    ///
    /// # Safety
    ///
    /// The bound signature must match the native symbol's ABI.
    pub unsafe fn invoke(&self, args: &[NativeValue]) -> Result<NativeValue, CallError> {
        let Shape::Fixed(sig) = &self.shape else {
            return Err(CallError::ArityMismatch {
                op: self.shape.name(),
                expected: 0,
                got: args.len(),
            });
        };
        if args.len() != sig.params.len() {
            return Err(CallError::ArityMismatch {
                op: sig.name,
                expected: sig.params.len(),
                got: args.len(),
            });
        }
        let mut pack = ArgPack::with_capacity(args.len());
        for (value, &want) in args.iter().zip(sig.params) {
            pack.push(value, want)?;
        }
        unsafe { self.dispatch(&pack.ffi_args()) }
    }

    /// Call a variadic operation with `seq` marshaled as its collection.
    ///
    /// # Safety
    ///
    /// The bound signature must match the native symbol's ABI.
    pub unsafe fn invoke_seq(
        &self,
        prefix: &[NativeValue],
        seq: &[NativeValue],
        suffix: &[NativeValue],
    ) -> Result<NativeValue, CallError> {
        let Shape::Variadic(sig) = &self.shape else {
            return Err(CallError::ArityMismatch {
                op: self.shape.name(),
                expected: prefix.len() + suffix.len(),
                got: 0,
            });
        };
        if prefix.len() != sig.prefix.len() || suffix.len() != sig.suffix.len() {
            return Err(CallError::ArityMismatch {
                op: sig.name,
                expected: sig.prefix.len() + sig.suffix.len(),
                got: prefix.len() + suffix.len(),
            });
        }
        let mut pack = ArgPack::with_capacity(prefix.len() + suffix.len() + 2);
        for (value, &want) in prefix.iter().zip(sig.prefix) {
            pack.push(value, want)?;
        }
        pack.push_seq(SeqBuffer::marshal(seq, sig.elem)?);
        for (value, &want) in suffix.iter().zip(sig.suffix) {
            pack.push(value, want)?;
        }
        unsafe { self.dispatch(&pack.ffi_args()) }
    }

    /// Perform the call and convert the raw return per the return kind.
    unsafe fn dispatch(&self, args: &[Arg]) -> Result<NativeValue, CallError> {
        let op = self.shape.name();
        let ret = self.shape.ret();
        Ok(match ret {
            kind if kind.is_handle() => {
                let bits: *mut c_void = unsafe { self.cif.call(self.code, args) };
                match NativeValue::wrap_handle(kind, bits) {
                    Some(v) => v,
                    None => unreachable!("handle kinds always wrap"),
                }
            }
            Kind::Int => NativeValue::Int(unsafe { self.cif.call(self.code, args) }),
            Kind::Bool => {
                let raw: i32 = unsafe { self.cif.call(self.code, args) };
                NativeValue::Bool(raw != 0)
            }
            Kind::Status => {
                let code: i32 = unsafe { self.cif.call(self.code, args) };
                if code != basalt_sys::STATUS_OK {
                    return Err(CallError::Status { op, code });
                }
                NativeValue::Unit
            }
            Kind::Sat => {
                let code: i32 = unsafe { self.cif.call(self.code, args) };
                match SatResult::from_code(code) {
                    Some(r) => NativeValue::Sat(r),
                    None => return Err(CallError::UnknownResult { op, code }),
                }
            }
            Kind::Str => {
                let ptr: *mut c_char = unsafe { self.cif.call(self.code, args) };
                match unsafe { claim_text(ptr, self.release_text) } {
                    Ok(s) => NativeValue::Str(s),
                    Err(MarshalError::NullPointer) => return Err(CallError::NullText { op }),
                    Err(e) => return Err(e.into()),
                }
            }
            Kind::Void => {
                unsafe { self.cif.call::<()>(self.code, args) };
                NativeValue::Unit
            }
            _ => unreachable!("return kinds are covered above"),
        })
    }
}
