//! Models.
//!
//! A [`Model`] snapshots the satisfying assignment of the last successful
//! solve. It is scoped to its environment and destroyed on drop; use
//! [`Model::into_raw`] to retain the handle beyond a lexical scope, and
//! [`crate::Env::adopt_model`] to take ownership back.

use crate::env::Env;
use crate::error::Result;
use crate::ffi::types::NativeValue;
use crate::ops;
use crate::term::Term;
use basalt_sys::RawModel;
use std::mem::ManuallyDrop;

/// A satisfying assignment, queryable per term.
pub struct Model<'env> {
    raw: RawModel,
    env: &'env Env,
}

impl<'env> Model<'env> {
    pub(crate) fn wrap(raw: RawModel, env: &'env Env) -> Self {
        Self { raw, env }
    }

    /// The raw handle. Valid only while this value is alive.
    pub fn raw(&self) -> RawModel {
        self.raw
    }

    /// Relinquish ownership without destroying the model.
    pub fn into_raw(self) -> RawModel {
        ManuallyDrop::new(self).raw
    }

    /// Evaluate `term` under this assignment.
    pub fn eval(&self, term: Term<'_>) -> Result<Term<'env>> {
        let v = self.env.call(
            &ops::MODEL_EVAL,
            &[NativeValue::Model(self.raw), term.val()],
        )?;
        self.env.term_result(ops::MODEL_EVAL.name, v)
    }
}

impl Drop for Model<'_> {
    fn drop(&mut self) {
        let _ = self
            .env
            .call(&ops::MODEL_FREE, &[NativeValue::Model(self.raw)]);
    }
}

impl std::fmt::Debug for Model<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Model({:p})", self.raw.0)
    }
}
