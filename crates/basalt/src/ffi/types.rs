//! Kind system for the native boundary.
//!
//! Defines:
//! - `Kind`: the closed set of value kinds an operation signature can name
//! - `NativeValue`: runtime representation of a value crossing the boundary
//! - `SatResult`: the closed three-valued outcome of a solve call
//!
//! Kind mapping at the ABI level:
//! - handle kinds (Config, Env, Term, Type, Decl, Model) → opaque pointer
//! - Int, Bool, Status, Sat → 32-bit signed integer
//! - Str → NUL-terminated text pointer
//! - Void → no value

use basalt_sys::{RawConfig, RawDecl, RawEnv, RawModel, RawTerm, RawType};
use libffi::middle::Type as FfiType;
use std::ffi::c_void;

/// Value kinds usable in an operation signature.
///
/// `Status` and `Sat` are return-only: both arrive as raw integers and are
/// converted to closed results at the boundary, so a caller never observes
/// the native discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Config,
    Env,
    Term,
    Type,
    Decl,
    Model,
    Int,
    Bool,
    Str,
    Status,
    Sat,
    Void,
}

impl Kind {
    /// True for the opaque-handle kinds.
    pub fn is_handle(&self) -> bool {
        matches!(
            self,
            Kind::Config | Kind::Env | Kind::Term | Kind::Type | Kind::Decl | Kind::Model
        )
    }

    /// The libffi type this kind occupies at the call boundary.
    pub(crate) fn ffi_type(&self) -> FfiType {
        match self {
            k if k.is_handle() => FfiType::pointer(),
            Kind::Str => FfiType::pointer(),
            Kind::Int | Kind::Bool | Kind::Status | Kind::Sat => FfiType::i32(),
            Kind::Void => FfiType::void(),
            _ => FfiType::pointer(),
        }
    }

    /// Display name used in error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Kind::Config => "config",
            Kind::Env => "env",
            Kind::Term => "term",
            Kind::Type => "type",
            Kind::Decl => "decl",
            Kind::Model => "model",
            Kind::Int => "int",
            Kind::Bool => "bool",
            Kind::Str => "text",
            Kind::Status => "status",
            Kind::Sat => "sat-result",
            Kind::Void => "void",
        }
    }
}

/// Outcome of a satisfiability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SatResult {
    Unknown,
    Unsat,
    Sat,
}

impl SatResult {
    /// Decode the native discriminant; `None` for anything outside the
    /// closed set.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            basalt_sys::RESULT_UNKNOWN => Some(SatResult::Unknown),
            basalt_sys::RESULT_UNSAT => Some(SatResult::Unsat),
            basalt_sys::RESULT_SAT => Some(SatResult::Sat),
            _ => None,
        }
    }
}

/// A value in boundary representation.
///
/// Wrapping a handle stores exactly its raw bit-pattern and nothing else;
/// unwrapping projects it back out. Several `NativeValue`s may carry the
/// same handle, mirroring what the native API itself permits.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Config(RawConfig),
    Env(RawEnv),
    Term(RawTerm),
    Type(RawType),
    Decl(RawDecl),
    Model(RawModel),
    Int(i32),
    Bool(bool),
    Str(String),
    Sat(SatResult),
    Unit,
}

impl NativeValue {
    /// The kind this value inhabits.
    pub fn kind(&self) -> Kind {
        match self {
            NativeValue::Config(_) => Kind::Config,
            NativeValue::Env(_) => Kind::Env,
            NativeValue::Term(_) => Kind::Term,
            NativeValue::Type(_) => Kind::Type,
            NativeValue::Decl(_) => Kind::Decl,
            NativeValue::Model(_) => Kind::Model,
            NativeValue::Int(_) => Kind::Int,
            NativeValue::Bool(_) => Kind::Bool,
            NativeValue::Str(_) => Kind::Str,
            NativeValue::Sat(_) => Kind::Sat,
            NativeValue::Unit => Kind::Void,
        }
    }

    /// Project the raw handle bits when this value is a handle of `want`.
    pub(crate) fn unwrap_handle(&self, want: Kind) -> Option<*mut c_void> {
        match (self, want) {
            (NativeValue::Config(h), Kind::Config) => Some(h.0),
            (NativeValue::Env(h), Kind::Env) => Some(h.0),
            (NativeValue::Term(h), Kind::Term) => Some(h.0),
            (NativeValue::Type(h), Kind::Type) => Some(h.0),
            (NativeValue::Decl(h), Kind::Decl) => Some(h.0),
            (NativeValue::Model(h), Kind::Model) => Some(h.0),
            _ => None,
        }
    }

    /// Rebuild a handle value of `kind` from raw bits.
    pub(crate) fn wrap_handle(kind: Kind, bits: *mut c_void) -> Option<NativeValue> {
        Some(match kind {
            Kind::Config => NativeValue::Config(RawConfig(bits)),
            Kind::Env => NativeValue::Env(RawEnv(bits)),
            Kind::Term => NativeValue::Term(RawTerm(bits)),
            Kind::Type => NativeValue::Type(RawType(bits)),
            Kind::Decl => NativeValue::Decl(RawDecl(bits)),
            Kind::Model => NativeValue::Model(RawModel(bits)),
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_unwrap_identity() {
        let bits = 0x5a5a_0000 as *mut c_void;
        for kind in [
            Kind::Config,
            Kind::Env,
            Kind::Term,
            Kind::Type,
            Kind::Decl,
            Kind::Model,
        ] {
            let wrapped = NativeValue::wrap_handle(kind, bits).unwrap();
            assert_eq!(wrapped.kind(), kind);
            assert_eq!(wrapped.unwrap_handle(kind), Some(bits));
        }
    }

    #[test]
    fn test_unwrap_rejects_other_kinds() {
        let v = NativeValue::Term(RawTerm(0x10 as *mut c_void));
        assert_eq!(v.unwrap_handle(Kind::Env), None);
        assert_eq!(NativeValue::Int(3).unwrap_handle(Kind::Term), None);
    }

    #[test]
    fn test_sat_result_codes_are_closed() {
        assert_eq!(SatResult::from_code(-1), Some(SatResult::Unknown));
        assert_eq!(SatResult::from_code(0), Some(SatResult::Unsat));
        assert_eq!(SatResult::from_code(1), Some(SatResult::Sat));
        assert_eq!(SatResult::from_code(2), None);
        assert_eq!(SatResult::from_code(i32::MIN), None);
    }

    #[test]
    fn test_aliasing_two_wrappers_one_handle() {
        let bits = 0x77 as *mut c_void;
        let a = NativeValue::Config(RawConfig(bits));
        let b = NativeValue::Config(RawConfig(bits));
        assert_eq!(a, b);
    }
}
