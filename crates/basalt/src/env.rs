//! Solver environments.
//!
//! An [`Env`] holds declared symbols, asserted formulas, and the incremental
//! backtrack stack. Terms, types, declarations, and models derived from an
//! environment borrow it, so the borrow checker rules out use after the
//! environment is destroyed — the native library cannot check this itself.
//!
//! The environment is destroyed when the value is dropped, at deterministic
//! scope exit on the owning thread. [`Env::into_raw`] relinquishes ownership
//! instead, for handles intentionally kept beyond a lexical scope.
//!
//! All calls are synchronous and blocking. `Env` is neither `Send` nor
//! `Sync`; callers wanting parallelism create independent environments,
//! optionally sharing one configuration.

use crate::api::Api;
use crate::error::{Error, Result};
use crate::ffi::caller::{CallError, SeqSignature, Signature};
use crate::ffi::types::{NativeValue, SatResult};
use crate::model::Model;
use crate::ops;
use crate::term::{Decl, Term, Type};
use basalt_sys::{RawEnv, RawModel};
use std::mem::ManuallyDrop;
use std::sync::Arc;

/// An interpolation group tag, handed out by [`Env::create_itp_group`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItpGroup(pub(crate) i32);

/// A solver environment. See the module docs for the ownership rules.
#[derive(Debug)]
pub struct Env {
    api: Arc<Api>,
    raw: RawEnv,
}

impl Env {
    pub(crate) fn wrap(api: Arc<Api>, raw: RawEnv) -> Self {
        Self { api, raw }
    }

    /// The raw handle. Valid only while this value is alive.
    pub fn raw(&self) -> RawEnv {
        self.raw
    }

    /// Relinquish ownership without destroying the environment.
    ///
    /// The caller becomes responsible for eventually destroying the handle,
    /// e.g. by re-adopting it with [`crate::Basalt::adopt_env`].
    pub fn into_raw(self) -> RawEnv {
        ManuallyDrop::new(self).raw
    }

    pub(crate) fn val(&self) -> NativeValue {
        NativeValue::Env(self.raw)
    }

    // ── Call plumbing ───────────────────────────────────────────────

    /// Latest diagnostic text recorded by the native library for this
    /// environment, if any.
    pub fn last_error_message(&self) -> Option<String> {
        match self.api.call(&ops::LAST_ERROR, &[self.val()]) {
            Ok(NativeValue::Str(s)) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    fn explain(&self, op: &'static str, fallback: String) -> Error {
        Error::Native {
            op,
            message: self.last_error_message().unwrap_or(fallback),
        }
    }

    fn attach_detail(&self, e: Error) -> Error {
        match e {
            Error::Call(CallError::Status { op, code }) => {
                self.explain(op, format!("status {}", code))
            }
            Error::Call(CallError::NullText { op }) => {
                self.explain(op, "no text returned".to_string())
            }
            other => other,
        }
    }

    pub(crate) fn call(&self, sig: &'static Signature, args: &[NativeValue]) -> Result<NativeValue> {
        self.api.call(sig, args).map_err(|e| self.attach_detail(e))
    }

    pub(crate) fn call_seq(
        &self,
        sig: &'static SeqSignature,
        prefix: &[NativeValue],
        seq: &[NativeValue],
        suffix: &[NativeValue],
    ) -> Result<NativeValue> {
        self.api
            .call_seq(sig, prefix, seq, suffix)
            .map_err(|e| self.attach_detail(e))
    }

    pub(crate) fn term_result(&self, op: &'static str, v: NativeValue) -> Result<Term<'_>> {
        match v {
            NativeValue::Term(raw) if raw.is_error() => {
                Err(self.explain(op, "returned the error handle".to_string()))
            }
            NativeValue::Term(raw) => Ok(Term::wrap(raw, self)),
            _ => unreachable!("signature table guarantees a term return"),
        }
    }

    fn type_result(&self, op: &'static str, v: NativeValue) -> Result<Type<'_>> {
        match v {
            NativeValue::Type(raw) if raw.is_error() => {
                Err(self.explain(op, "returned the error handle".to_string()))
            }
            NativeValue::Type(raw) => Ok(Type::wrap(raw, self)),
            _ => unreachable!("signature table guarantees a type return"),
        }
    }

    fn decl_result(&self, op: &'static str, v: NativeValue) -> Result<Decl<'_>> {
        match v {
            NativeValue::Decl(raw) if raw.is_error() => {
                Err(self.explain(op, "returned the error handle".to_string()))
            }
            NativeValue::Decl(raw) => Ok(Decl::wrap(raw, self)),
            _ => unreachable!("signature table guarantees a decl return"),
        }
    }

    fn unary_term(&self, sig: &'static Signature, a: Term<'_>) -> Result<Term<'_>> {
        let v = self.call(sig, &[self.val(), a.val()])?;
        self.term_result(sig.name, v)
    }

    fn binary_term(&self, sig: &'static Signature, a: Term<'_>, b: Term<'_>) -> Result<Term<'_>> {
        let v = self.call(sig, &[self.val(), a.val(), b.val()])?;
        self.term_result(sig.name, v)
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// Discard all assertions and open backtrack points.
    pub fn reset(&self) -> Result<()> {
        self.call(&ops::ENV_RESET, &[self.val()]).map(|_| ())
    }

    /// Run a native garbage pass, retaining every term in `keep`.
    ///
    /// Terms not in the keep-set (and not asserted) may be invalidated by
    /// the native library; keep using only what was kept.
    pub fn gc(&self, keep: &[Term<'_>]) -> Result<()> {
        let keep: Vec<NativeValue> = keep.iter().map(|t| t.val()).collect();
        self.call_seq(&ops::ENV_GC, &[self.val()], &keep, &[])
            .map(|_| ())
    }

    // ── Types ───────────────────────────────────────────────────────

    pub fn bool_type(&self) -> Result<Type<'_>> {
        let v = self.call(&ops::BOOL_TYPE, &[self.val()])?;
        self.type_result(ops::BOOL_TYPE.name, v)
    }

    pub fn rational_type(&self) -> Result<Type<'_>> {
        let v = self.call(&ops::RATIONAL_TYPE, &[self.val()])?;
        self.type_result(ops::RATIONAL_TYPE.name, v)
    }

    pub fn integer_type(&self) -> Result<Type<'_>> {
        let v = self.call(&ops::INTEGER_TYPE, &[self.val()])?;
        self.type_result(ops::INTEGER_TYPE.name, v)
    }

    /// Function type with the given parameter types and return type. A
    /// zero-parameter list is valid and marshals as an empty array, not a
    /// null pointer.
    pub fn function_type(&self, params: &[Type<'_>], ret: Type<'_>) -> Result<Type<'_>> {
        let params: Vec<NativeValue> = params.iter().map(|t| t.val()).collect();
        let v = self.call_seq(&ops::FUNCTION_TYPE, &[self.val()], &params, &[ret.val()])?;
        self.type_result(ops::FUNCTION_TYPE.name, v)
    }

    // ── Declarations ────────────────────────────────────────────────

    /// Declare a named symbol with a type.
    pub fn declare(&self, name: &str, ty: Type<'_>) -> Result<Decl<'_>> {
        let v = self.call(
            &ops::DECLARE,
            &[self.val(), NativeValue::Str(name.to_string()), ty.val()],
        )?;
        self.decl_result(ops::DECLARE.name, v)
    }

    /// Look up a previously declared symbol by name.
    pub fn find_decl(&self, name: &str) -> Result<Option<Decl<'_>>> {
        let v = self.call(
            &ops::FIND_DECL,
            &[self.val(), NativeValue::Str(name.to_string())],
        )?;
        match v {
            NativeValue::Decl(raw) if raw.is_error() => Ok(None),
            NativeValue::Decl(raw) => Ok(Some(Decl::wrap(raw, self))),
            _ => unreachable!("signature table guarantees a decl return"),
        }
    }

    // ── Term construction ───────────────────────────────────────────

    pub fn make_true(&self) -> Result<Term<'_>> {
        let v = self.call(&ops::MAKE_TRUE, &[self.val()])?;
        self.term_result(ops::MAKE_TRUE.name, v)
    }

    pub fn make_false(&self) -> Result<Term<'_>> {
        let v = self.call(&ops::MAKE_FALSE, &[self.val()])?;
        self.term_result(ops::MAKE_FALSE.name, v)
    }

    pub fn make_not(&self, a: Term<'_>) -> Result<Term<'_>> {
        self.unary_term(&ops::MAKE_NOT, a)
    }

    pub fn make_and(&self, a: Term<'_>, b: Term<'_>) -> Result<Term<'_>> {
        self.binary_term(&ops::MAKE_AND, a, b)
    }

    pub fn make_or(&self, a: Term<'_>, b: Term<'_>) -> Result<Term<'_>> {
        self.binary_term(&ops::MAKE_OR, a, b)
    }

    pub fn make_iff(&self, a: Term<'_>, b: Term<'_>) -> Result<Term<'_>> {
        self.binary_term(&ops::MAKE_IFF, a, b)
    }

    pub fn make_equal(&self, a: Term<'_>, b: Term<'_>) -> Result<Term<'_>> {
        self.binary_term(&ops::MAKE_EQUAL, a, b)
    }

    pub fn make_leq(&self, a: Term<'_>, b: Term<'_>) -> Result<Term<'_>> {
        self.binary_term(&ops::MAKE_LEQ, a, b)
    }

    pub fn make_plus(&self, a: Term<'_>, b: Term<'_>) -> Result<Term<'_>> {
        self.binary_term(&ops::MAKE_PLUS, a, b)
    }

    pub fn make_times(&self, a: Term<'_>, b: Term<'_>) -> Result<Term<'_>> {
        self.binary_term(&ops::MAKE_TIMES, a, b)
    }

    pub fn make_floor(&self, a: Term<'_>) -> Result<Term<'_>> {
        self.unary_term(&ops::MAKE_FLOOR, a)
    }

    /// Numeric literal from text, either `-?digits` or `-?digits/digits`.
    pub fn make_number(&self, text: &str) -> Result<Term<'_>> {
        let v = self.call(
            &ops::MAKE_NUMBER,
            &[self.val(), NativeValue::Str(text.to_string())],
        )?;
        self.term_result(ops::MAKE_NUMBER.name, v)
    }

    pub fn make_ite(&self, cond: Term<'_>, then: Term<'_>, els: Term<'_>) -> Result<Term<'_>> {
        let v = self.call(
            &ops::MAKE_ITE,
            &[self.val(), cond.val(), then.val(), els.val()],
        )?;
        self.term_result(ops::MAKE_ITE.name, v)
    }

    /// Constant reference to a declared 0-ary symbol.
    pub fn make_constant(&self, decl: Decl<'_>) -> Result<Term<'_>> {
        let v = self.call(&ops::MAKE_CONSTANT, &[self.val(), decl.val()])?;
        self.term_result(ops::MAKE_CONSTANT.name, v)
    }

    /// Uninterpreted-function application. The argument list marshals as one
    /// contiguous array in input order.
    pub fn make_apply(&self, decl: Decl<'_>, args: &[Term<'_>]) -> Result<Term<'_>> {
        let args: Vec<NativeValue> = args.iter().map(|t| t.val()).collect();
        let v = self.call_seq(&ops::MAKE_APPLY, &[self.val(), decl.val()], &args, &[])?;
        self.term_result(ops::MAKE_APPLY.name, v)
    }

    /// Copy a term from another environment into this one.
    pub fn copy_term(&self, term: Term<'_>) -> Result<Term<'_>> {
        let v = self.call(
            &ops::TERM_COPY,
            &[self.val(), term.val(), term.env().val()],
        )?;
        self.term_result(ops::TERM_COPY.name, v)
    }

    // ── Parsing ─────────────────────────────────────────────────────

    /// Parse a term from SMT-LIB 2 text against this environment's
    /// declarations.
    pub fn parse_smtlib2(&self, text: &str) -> Result<Term<'_>> {
        let v = self.call(
            &ops::PARSE_SMTLIB2,
            &[self.val(), NativeValue::Str(text.to_string())],
        )?;
        self.term_result(ops::PARSE_SMTLIB2.name, v)
    }

    /// Parse a term in the solver's native syntax.
    pub fn parse_term(&self, text: &str) -> Result<Term<'_>> {
        let v = self.call(
            &ops::PARSE_TERM,
            &[self.val(), NativeValue::Str(text.to_string())],
        )?;
        self.term_result(ops::PARSE_TERM.name, v)
    }

    // ── Incremental solving ─────────────────────────────────────────

    /// Open a backtrack point.
    pub fn push(&self) -> Result<()> {
        self.call(&ops::PUSH, &[self.val()]).map(|_| ())
    }

    /// Return to the most recent backtrack point, discarding assertions
    /// made since it was opened.
    pub fn pop(&self) -> Result<()> {
        self.call(&ops::POP, &[self.val()]).map(|_| ())
    }

    /// Number of open backtrack points.
    pub fn num_backtrack_points(&self) -> Result<usize> {
        match self.call(&ops::NUM_BACKTRACK_POINTS, &[self.val()])? {
            NativeValue::Int(n) if n >= 0 => Ok(n as usize),
            NativeValue::Int(n) => {
                Err(self.explain(ops::NUM_BACKTRACK_POINTS.name, format!("count {}", n)))
            }
            _ => unreachable!("signature table guarantees an int return"),
        }
    }

    /// Assert a boolean term.
    pub fn assert_formula(&self, term: Term<'_>) -> Result<()> {
        self.call(&ops::ASSERT, &[self.val(), term.val()]).map(|_| ())
    }

    /// Decide the current assertion stack. Idempotent while assertions are
    /// unchanged; blocks for the full duration of the native call.
    pub fn solve(&self) -> Result<SatResult> {
        match self.call(&ops::SOLVE, &[self.val()])? {
            NativeValue::Sat(r) => Ok(r),
            _ => unreachable!("signature table guarantees a sat result"),
        }
    }

    // ── Interpolation ───────────────────────────────────────────────

    /// Create a fresh interpolation group.
    pub fn create_itp_group(&self) -> Result<ItpGroup> {
        match self.call(&ops::ITP_GROUP_NEW, &[self.val()])? {
            NativeValue::Int(g) if g >= 0 => Ok(ItpGroup(g)),
            NativeValue::Int(g) => {
                Err(self.explain(ops::ITP_GROUP_NEW.name, format!("group id {}", g)))
            }
            _ => unreachable!("signature table guarantees an int return"),
        }
    }

    /// Route subsequent assertions into `group`.
    pub fn set_itp_group(&self, group: ItpGroup) -> Result<()> {
        self.call(&ops::ITP_GROUP_SET, &[self.val(), NativeValue::Int(group.0)])
            .map(|_| ())
    }

    /// Extract an interpolant for the partition named by `groups`.
    pub fn interpolant(&self, groups: &[ItpGroup]) -> Result<Term<'_>> {
        let groups: Vec<NativeValue> = groups.iter().map(|g| NativeValue::Int(g.0)).collect();
        let v = self.call_seq(&ops::INTERPOLANT, &[self.val()], &groups, &[])?;
        self.term_result(ops::INTERPOLANT.name, v)
    }

    // ── Models ──────────────────────────────────────────────────────

    /// Extract the model of the last successful solve.
    pub fn model(&self) -> Result<Model<'_>> {
        match self.call(&ops::MODEL_GET, &[self.val()])? {
            NativeValue::Model(raw) if raw.is_error() => {
                Err(self.explain(ops::MODEL_GET.name, "returned the error handle".to_string()))
            }
            NativeValue::Model(raw) => Ok(Model::wrap(raw, self)),
            _ => unreachable!("signature table guarantees a model return"),
        }
    }

    /// Evaluate a term under the implicit model of the last solve.
    pub fn model_value(&self, term: Term<'_>) -> Result<Term<'_>> {
        let v = self.call(&ops::MODEL_VALUE, &[self.val(), term.val()])?;
        self.term_result(ops::MODEL_VALUE.name, v)
    }

    /// Re-adopt a model handle previously released with
    /// [`Model::into_raw`].
    ///
    /// # Safety
    ///
    /// `raw` must be a live model handle of this environment, owned by no
    /// other wrapper.
    pub unsafe fn adopt_model(&self, raw: RawModel) -> Model<'_> {
        Model::wrap(raw, self)
    }
}

impl Drop for Env {
    fn drop(&mut self) {
        // Destroy failures cannot be reported from a destructor; the
        // explicit lifecycle calls exist for callers that need the result.
        let _ = self.api.call(&ops::ENV_FREE, &[NativeValue::Env(self.raw)]);
    }
}

#[cfg(all(test, feature = "stub"))]
mod tests {
    use crate::solver::Basalt;

    #[test]
    fn test_env_lifecycle_and_reset() {
        let basalt = Basalt::stub();
        let cfg = basalt.config().unwrap();
        let env = basalt.env(&cfg).unwrap();
        let t = env.make_true().unwrap();
        env.assert_formula(t).unwrap();
        env.reset().unwrap();
        assert_eq!(env.num_backtrack_points().unwrap(), 0);
    }

    #[test]
    fn test_pop_without_push_is_native_error() {
        let basalt = Basalt::stub();
        let cfg = basalt.config().unwrap();
        let env = basalt.env(&cfg).unwrap();
        let err = env.pop().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("basalt_pop"), "unexpected error: {}", msg);
        assert!(msg.contains("backtrack"), "missing native detail: {}", msg);
    }

    #[test]
    fn test_last_error_message_empty_on_fresh_env() {
        let basalt = Basalt::stub();
        let cfg = basalt.config().unwrap();
        let env = basalt.env(&cfg).unwrap();
        assert_eq!(env.last_error_message(), None);
    }
}
