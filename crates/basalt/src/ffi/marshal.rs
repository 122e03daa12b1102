//! Scalar and text marshaling across the native boundary.
//!
//! `ArgPack` converts positional managed arguments into the C representation
//! libffi hands to the callee, and owns every temporary (NUL-terminated
//! strings, sequence buffers) until the call returns, so argument storage is
//! released on every exit path.
//!
//! # Text ownership
//!
//! Text returned by the native side is owned by the library and must be
//! released with its free operation. [`claim_text`] deep-copies into a
//! managed `String` and then releases the native buffer, including when the
//! copy fails — copy-then-release is the single place this rule lives.

use crate::ffi::seq::SeqBuffer;
use crate::ffi::types::{Kind, NativeValue};
use libffi::middle::Arg;
use std::ffi::{c_char, c_void, CStr, CString};
use thiserror::Error;

/// Errors raised before or while crossing the boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MarshalError {
    /// Value kind does not match the kind the signature expects.
    #[error("kind mismatch: expected {expected}, got {got}")]
    KindMismatch {
        expected: &'static str,
        got: &'static str,
    },
    /// Null pointer where the native contract promises a value.
    #[error("null pointer from native call")]
    NullPointer,
    /// Text not representable across the boundary.
    #[error("invalid string: {0}")]
    InvalidString(String),
    /// Integer outside the range of the target representation.
    #[error("value {value} out of range for {target}")]
    OutOfRange { value: i64, target: &'static str },
}

enum Cell {
    Ptr(*mut c_void),
    Int(i32),
    Len(usize),
}

/// Marshaled positional arguments for one native call.
pub(crate) struct ArgPack {
    cells: Vec<Cell>,
    strings: Vec<CString>,
    seqs: Vec<SeqBuffer>,
}

impl ArgPack {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            cells: Vec::with_capacity(n),
            strings: Vec::new(),
            seqs: Vec::new(),
        }
    }

    /// Convert one managed value to its C representation under `want`.
    pub fn push(&mut self, value: &NativeValue, want: Kind) -> Result<(), MarshalError> {
        let mismatch = || MarshalError::KindMismatch {
            expected: want.display_name(),
            got: value.kind().display_name(),
        };
        let cell = match value {
            _ if want.is_handle() => Cell::Ptr(value.unwrap_handle(want).ok_or_else(mismatch)?),
            NativeValue::Int(i) if want == Kind::Int => Cell::Int(*i),
            NativeValue::Bool(b) if want == Kind::Bool => Cell::Int(*b as i32),
            NativeValue::Str(s) if want == Kind::Str => {
                let c = CString::new(s.as_str()).map_err(|e| {
                    MarshalError::InvalidString(format!("string contains NUL byte: {}", e))
                })?;
                let ptr = c.as_ptr() as *mut c_void;
                self.strings.push(c);
                Cell::Ptr(ptr)
            }
            _ => return Err(mismatch()),
        };
        self.cells.push(cell);
        Ok(())
    }

    /// Splice a marshaled sequence in as a (buffer, length) argument pair.
    /// The pack keeps the buffer alive until it is dropped.
    pub fn push_seq(&mut self, seq: SeqBuffer) {
        self.cells.push(Cell::Ptr(seq.as_ptr()));
        self.cells.push(Cell::Len(seq.len()));
        self.seqs.push(seq);
    }

    /// Borrow the packed cells as libffi arguments. Must be called after all
    /// pushes; the returned args borrow storage owned by this pack.
    pub fn ffi_args(&self) -> Vec<Arg> {
        self.cells
            .iter()
            .map(|cell| match cell {
                Cell::Ptr(p) => Arg::new(p),
                Cell::Int(i) => Arg::new(i),
                Cell::Len(n) => Arg::new(n),
            })
            .collect()
    }
}

/// Deep-copy native-owned text, then release the native buffer.
///
/// # Safety
///
/// `ptr` must be null or a NUL-terminated buffer owned by the library that
/// `release` frees. After this call the buffer is gone either way.
pub(crate) unsafe fn claim_text(
    ptr: *mut c_char,
    release: unsafe extern "C" fn(*mut c_char),
) -> Result<String, MarshalError> {
    if ptr.is_null() {
        return Err(MarshalError::NullPointer);
    }
    let copied = unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map(str::to_owned)
        .map_err(|e| MarshalError::InvalidString(format!("invalid UTF-8 from native call: {}", e)));
    unsafe { release(ptr) };
    copied
}

#[cfg(test)]
mod tests {
    use super::*;
    use basalt_sys::RawTerm;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_push_handle() {
        let mut pack = ArgPack::with_capacity(1);
        let v = NativeValue::Term(RawTerm(0x40 as *mut c_void));
        pack.push(&v, Kind::Term).unwrap();
        assert_eq!(pack.ffi_args().len(), 1);
    }

    #[test]
    fn test_push_int_and_bool() {
        let mut pack = ArgPack::with_capacity(2);
        pack.push(&NativeValue::Int(-7), Kind::Int).unwrap();
        pack.push(&NativeValue::Bool(true), Kind::Bool).unwrap();
        assert_eq!(pack.ffi_args().len(), 2);
    }

    #[test]
    fn test_push_kind_mismatch() {
        let mut pack = ArgPack::with_capacity(1);
        let err = pack.push(&NativeValue::Int(1), Kind::Term).unwrap_err();
        assert_eq!(
            err,
            MarshalError::KindMismatch {
                expected: "term",
                got: "int"
            }
        );
    }

    #[test]
    fn test_push_string_with_nul_rejected() {
        let mut pack = ArgPack::with_capacity(1);
        let err = pack
            .push(&NativeValue::Str("a\0b".to_string()), Kind::Str)
            .unwrap_err();
        assert!(matches!(err, MarshalError::InvalidString(_)));
    }

    #[test]
    fn test_string_storage_outlives_cell() {
        let mut pack = ArgPack::with_capacity(1);
        pack.push(&NativeValue::Str("hello".to_string()), Kind::Str)
            .unwrap();
        let args = pack.ffi_args();
        assert_eq!(args.len(), 1);
        // The CString is owned by the pack, not the pushed value.
        assert_eq!(pack.strings.len(), 1);
        assert_eq!(pack.strings[0].to_str().unwrap(), "hello");
    }

    static RELEASED: AtomicUsize = AtomicUsize::new(0);

    unsafe extern "C" fn fake_release(p: *mut c_char) {
        RELEASED.fetch_add(1, Ordering::SeqCst);
        drop(unsafe { CString::from_raw(p) });
    }

    #[test]
    fn test_claim_text_copies_then_releases() {
        let native = CString::new("copied").unwrap().into_raw();
        let before = RELEASED.load(Ordering::SeqCst);
        let s = unsafe { claim_text(native, fake_release) }.unwrap();
        assert_eq!(s, "copied");
        assert_eq!(RELEASED.load(Ordering::SeqCst), before + 1);
    }

    #[test]
    fn test_claim_text_null_is_error() {
        let err = unsafe { claim_text(std::ptr::null_mut(), fake_release) }.unwrap_err();
        assert_eq!(err, MarshalError::NullPointer);
    }

    #[test]
    fn test_claim_text_releases_even_on_bad_utf8() {
        let native = CString::new(vec![0xf0u8, 0x28, 0x8c, 0x28]).unwrap().into_raw();
        let before = RELEASED.load(Ordering::SeqCst);
        let err = unsafe { claim_text(native, fake_release) }.unwrap_err();
        assert!(matches!(err, MarshalError::InvalidString(_)));
        assert_eq!(RELEASED.load(Ordering::SeqCst), before + 1);
    }
}
