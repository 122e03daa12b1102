//! Terms, types, and declarations.
//!
//! These are `Copy` value wrappers around env-scoped handles. The native
//! library defines no destroy operation for them — they live and die with
//! their environment, which they borrow, so the borrow checker prevents
//! them from outliving it.

use crate::env::Env;
use crate::error::{Error, Result};
use crate::ffi::caller::Signature;
use crate::ffi::types::NativeValue;
use crate::ops;
use basalt_sys::{RawDecl, RawTerm, RawType};
use num_rational::BigRational;

/// A term handle scoped to one environment.
#[derive(Clone, Copy)]
pub struct Term<'env> {
    raw: RawTerm,
    env: &'env Env,
}

impl<'env> Term<'env> {
    pub(crate) fn wrap(raw: RawTerm, env: &'env Env) -> Self {
        Self { raw, env }
    }

    /// The raw handle bit-pattern.
    pub fn raw(&self) -> RawTerm {
        self.raw
    }

    pub(crate) fn env(&self) -> &'env Env {
        self.env
    }

    pub(crate) fn val(&self) -> NativeValue {
        NativeValue::Term(self.raw)
    }

    fn int_query(&self, sig: &'static Signature) -> Result<i32> {
        match self.env.call(sig, &[self.val()])? {
            NativeValue::Int(v) => Ok(v),
            _ => unreachable!("signature table guarantees an int return"),
        }
    }

    fn predicate(&self, sig: &'static Signature) -> Result<bool> {
        match self.env.call(sig, &[self.env.val(), self.val()])? {
            NativeValue::Bool(b) => Ok(b),
            _ => unreachable!("signature table guarantees a bool return"),
        }
    }

    /// Stable identity within the environment; structurally equal terms
    /// share one id.
    pub fn id(&self) -> Result<i32> {
        self.int_query(&ops::TERM_ID)
    }

    /// Number of direct children.
    pub fn arity(&self) -> Result<usize> {
        let n = self.int_query(&ops::TERM_ARITY)?;
        usize::try_from(n).map_err(|_| {
            Error::Marshal(crate::ffi::marshal::MarshalError::OutOfRange {
                value: n as i64,
                target: "term arity",
            })
        })
    }

    /// Child at `index`, in construction order.
    pub fn arg(&self, index: usize) -> Result<Term<'env>> {
        let index = i32::try_from(index).map_err(|_| {
            Error::Marshal(crate::ffi::marshal::MarshalError::OutOfRange {
                value: index as i64,
                target: "child index",
            })
        })?;
        let v = self
            .env
            .call(&ops::TERM_ARG, &[self.val(), NativeValue::Int(index)])?;
        self.env.term_result(ops::TERM_ARG.name, v)
    }

    /// The term's type.
    pub fn ty(&self) -> Result<Type<'env>> {
        match self.env.call(&ops::TERM_TYPE, &[self.val()])? {
            NativeValue::Type(raw) => Ok(Type::wrap(raw, self.env)),
            _ => unreachable!("signature table guarantees a type return"),
        }
    }

    /// Declaration of a constant or application term; `None` for other
    /// shapes.
    pub fn decl(&self) -> Result<Option<Decl<'env>>> {
        match self.env.call(&ops::TERM_DECL, &[self.val()])? {
            NativeValue::Decl(raw) if raw.is_error() => Ok(None),
            NativeValue::Decl(raw) => Ok(Some(Decl::wrap(raw, self.env))),
            _ => unreachable!("signature table guarantees a decl return"),
        }
    }

    /// Extract the value of a numeric literal.
    ///
    /// The numeral crosses the boundary as native-owned text, which is
    /// copied and released, then parsed to an exact rational.
    pub fn to_rational(&self) -> Result<BigRational> {
        let v = self
            .env
            .call(&ops::TERM_TO_NUMBER, &[self.env.val(), self.val()])?;
        let text = match v {
            NativeValue::Str(s) => s,
            _ => unreachable!("signature table guarantees a text return"),
        };
        if let Some((_, den)) = text.split_once('/') {
            if den.bytes().all(|b| b == b'0') {
                return Err(Error::Numeral { text });
            }
        }
        text.parse::<BigRational>()
            .map_err(|_| Error::Numeral { text })
    }

    /// Print this term as SMT-LIB 2 text.
    pub fn to_smtlib2(&self) -> Result<String> {
        match self
            .env
            .call(&ops::PRINT_SMTLIB2, &[self.env.val(), self.val()])?
        {
            NativeValue::Str(s) => Ok(s),
            _ => unreachable!("signature table guarantees a text return"),
        }
    }

    pub fn is_true(&self) -> Result<bool> {
        self.predicate(&ops::TERM_IS_TRUE)
    }

    pub fn is_false(&self) -> Result<bool> {
        self.predicate(&ops::TERM_IS_FALSE)
    }

    pub fn is_bool_constant(&self) -> Result<bool> {
        self.predicate(&ops::TERM_IS_BOOL_CONSTANT)
    }

    pub fn is_atom(&self) -> Result<bool> {
        self.predicate(&ops::TERM_IS_ATOM)
    }

    pub fn is_number(&self) -> Result<bool> {
        self.predicate(&ops::TERM_IS_NUMBER)
    }

    pub fn is_and(&self) -> Result<bool> {
        self.predicate(&ops::TERM_IS_AND)
    }

    pub fn is_or(&self) -> Result<bool> {
        self.predicate(&ops::TERM_IS_OR)
    }

    pub fn is_not(&self) -> Result<bool> {
        self.predicate(&ops::TERM_IS_NOT)
    }

    pub fn is_iff(&self) -> Result<bool> {
        self.predicate(&ops::TERM_IS_IFF)
    }

    pub fn is_equal(&self) -> Result<bool> {
        self.predicate(&ops::TERM_IS_EQUAL)
    }

    pub fn is_leq(&self) -> Result<bool> {
        self.predicate(&ops::TERM_IS_LEQ)
    }

    pub fn is_plus(&self) -> Result<bool> {
        self.predicate(&ops::TERM_IS_PLUS)
    }

    pub fn is_times(&self) -> Result<bool> {
        self.predicate(&ops::TERM_IS_TIMES)
    }

    pub fn is_floor(&self) -> Result<bool> {
        self.predicate(&ops::TERM_IS_FLOOR)
    }

    pub fn is_ite(&self) -> Result<bool> {
        self.predicate(&ops::TERM_IS_ITE)
    }

    pub fn is_constant(&self) -> Result<bool> {
        self.predicate(&ops::TERM_IS_CONSTANT)
    }

    pub fn is_apply(&self) -> Result<bool> {
        self.predicate(&ops::TERM_IS_APPLY)
    }
}

impl PartialEq for Term<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Term<'_> {}

impl std::fmt::Debug for Term<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Term({:p})", self.raw.0)
    }
}

/// A type handle scoped to one environment.
#[derive(Clone, Copy)]
pub struct Type<'env> {
    raw: RawType,
    env: &'env Env,
}

impl<'env> Type<'env> {
    pub(crate) fn wrap(raw: RawType, env: &'env Env) -> Self {
        Self { raw, env }
    }

    pub fn raw(&self) -> RawType {
        self.raw
    }

    pub(crate) fn val(&self) -> NativeValue {
        NativeValue::Type(self.raw)
    }

    fn predicate(&self, sig: &'static Signature) -> Result<bool> {
        match self.env.call(sig, &[self.env.val(), self.val()])? {
            NativeValue::Bool(b) => Ok(b),
            _ => unreachable!("signature table guarantees a bool return"),
        }
    }

    pub fn is_bool(&self) -> Result<bool> {
        self.predicate(&ops::IS_BOOL_TYPE)
    }

    pub fn is_rational(&self) -> Result<bool> {
        self.predicate(&ops::IS_RATIONAL_TYPE)
    }

    pub fn is_integer(&self) -> Result<bool> {
        self.predicate(&ops::IS_INTEGER_TYPE)
    }

    pub fn is_function(&self) -> Result<bool> {
        self.predicate(&ops::IS_FUNCTION_TYPE)
    }
}

impl PartialEq for Type<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Type<'_> {}

impl std::fmt::Debug for Type<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Type({:p})", self.raw.0)
    }
}

/// A declaration handle scoped to one environment.
#[derive(Clone, Copy)]
pub struct Decl<'env> {
    raw: RawDecl,
    env: &'env Env,
}

impl<'env> Decl<'env> {
    pub(crate) fn wrap(raw: RawDecl, env: &'env Env) -> Self {
        Self { raw, env }
    }

    pub fn raw(&self) -> RawDecl {
        self.raw
    }

    pub(crate) fn val(&self) -> NativeValue {
        NativeValue::Decl(self.raw)
    }

    /// Stable identity within the environment.
    pub fn id(&self) -> Result<i32> {
        match self.env.call(&ops::DECL_ID, &[self.val()])? {
            NativeValue::Int(v) => Ok(v),
            _ => unreachable!("signature table guarantees an int return"),
        }
    }
}

impl PartialEq for Decl<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Decl<'_> {}

impl std::fmt::Debug for Decl<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Decl({:p})", self.raw.0)
    }
}
