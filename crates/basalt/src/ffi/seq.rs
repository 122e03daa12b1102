//! Sequence-to-contiguous-buffer marshaling for variadic native calls.
//!
//! Wherever the ABI takes a (pointer, count) pair — keep-sets, parameter
//! type lists, application argument lists, interpolation group ids — the
//! managed side hands a slice of values of one kind to [`SeqBuffer::marshal`]
//! and splices the result into the call as two arguments. One routine serves
//! every call site; there is no per-site array code.
//!
//! The buffer length always equals the element count, elements keep their
//! input order, and a zero-length sequence yields a valid, well-aligned,
//! non-null buffer pointer rather than a null special case. The buffer is
//! owned by the value and freed on drop, so it is released on every exit
//! path, including native-call failure.

use crate::ffi::marshal::MarshalError;
use crate::ffi::types::{Kind, NativeValue};
use std::ffi::c_void;

/// A contiguous native buffer built from a homogeneous value sequence.
#[derive(Debug)]
pub(crate) enum SeqBuffer {
    Handles(Vec<*mut c_void>),
    Ints(Vec<i32>),
}

impl SeqBuffer {
    /// Marshal `items` as elements of kind `elem`.
    ///
    /// Fails fast on the first element whose kind differs, before anything
    /// crosses the boundary.
    pub fn marshal(items: &[NativeValue], elem: Kind) -> Result<Self, MarshalError> {
        let mismatch = |got: &NativeValue| MarshalError::KindMismatch {
            expected: elem.display_name(),
            got: got.kind().display_name(),
        };
        if elem.is_handle() {
            let mut buf = Vec::with_capacity(items.len());
            for item in items {
                buf.push(item.unwrap_handle(elem).ok_or_else(|| mismatch(item))?);
            }
            return Ok(SeqBuffer::Handles(buf));
        }
        match elem {
            Kind::Int => {
                let mut buf = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        NativeValue::Int(i) => buf.push(*i),
                        other => return Err(mismatch(other)),
                    }
                }
                Ok(SeqBuffer::Ints(buf))
            }
            other => Err(MarshalError::KindMismatch {
                expected: "handle or int sequence element",
                got: other.display_name(),
            }),
        }
    }

    /// Base pointer of the buffer. Non-null even for length zero.
    pub fn as_ptr(&self) -> *mut c_void {
        match self {
            SeqBuffer::Handles(v) => v.as_ptr() as *mut c_void,
            SeqBuffer::Ints(v) => v.as_ptr() as *mut c_void,
        }
    }

    /// Element count; exactly the input sequence length.
    pub fn len(&self) -> usize {
        match self {
            SeqBuffer::Handles(v) => v.len(),
            SeqBuffer::Ints(v) => v.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use basalt_sys::{RawTerm, RawType};
    use proptest::prelude::*;

    /// Read a marshaled buffer back into values, mirroring what the callee
    /// observes through the (pointer, count) pair.
    fn read_back(buf: &SeqBuffer, elem: Kind) -> Vec<NativeValue> {
        match buf {
            SeqBuffer::Handles(v) => v
                .iter()
                .map(|&bits| NativeValue::wrap_handle(elem, bits).unwrap())
                .collect(),
            SeqBuffer::Ints(v) => v.iter().map(|&i| NativeValue::Int(i)).collect(),
        }
    }

    #[test]
    fn test_zero_length_buffer_is_valid() {
        let buf = SeqBuffer::marshal(&[], Kind::Term).unwrap();
        assert_eq!(buf.len(), 0);
        assert!(!buf.as_ptr().is_null());

        let buf = SeqBuffer::marshal(&[], Kind::Int).unwrap();
        assert_eq!(buf.len(), 0);
        assert!(!buf.as_ptr().is_null());
    }

    #[test]
    fn test_heterogeneous_sequence_fails_fast() {
        let items = [
            NativeValue::Term(RawTerm(0x10 as *mut c_void)),
            NativeValue::Int(3),
        ];
        let err = SeqBuffer::marshal(&items, Kind::Term).unwrap_err();
        assert_eq!(
            err,
            MarshalError::KindMismatch {
                expected: "term",
                got: "int"
            }
        );
    }

    #[test]
    fn test_wrong_handle_kind_rejected() {
        let items = [NativeValue::Type(RawType(0x20 as *mut c_void))];
        assert!(SeqBuffer::marshal(&items, Kind::Term).is_err());
    }

    #[test]
    fn test_unsupported_element_kind_rejected() {
        let items = [NativeValue::Str("x".into())];
        assert!(SeqBuffer::marshal(&items, Kind::Str).is_err());
    }

    proptest! {
        #[test]
        fn prop_int_sequence_round_trips(values in proptest::collection::vec(any::<i32>(), 0..64)) {
            let items: Vec<NativeValue> = values.iter().map(|&i| NativeValue::Int(i)).collect();
            let buf = SeqBuffer::marshal(&items, Kind::Int).unwrap();
            prop_assert_eq!(buf.len(), items.len());
            let back = read_back(&buf, Kind::Int);
            prop_assert_eq!(back, items);
        }

        #[test]
        fn prop_handle_sequence_round_trips(bits in proptest::collection::vec(any::<usize>(), 0..64)) {
            let items: Vec<NativeValue> = bits
                .iter()
                .map(|&b| NativeValue::Term(RawTerm(b as *mut c_void)))
                .collect();
            let buf = SeqBuffer::marshal(&items, Kind::Term).unwrap();
            prop_assert_eq!(buf.len(), items.len());
            let back = read_back(&buf, Kind::Term);
            prop_assert_eq!(back, items);
        }
    }
}
