//! Basalt - safe Rust bindings for the Basalt SMT solver
//!
//! This crate is the marshaling layer between safe Rust and the solver's
//! C API of opaque, manually-managed handles:
//! - Handle wrapping/unwrapping without leaks or double-frees
//! - Scalar and text conversion, with copy-then-release text ownership
//! - Contiguous-array marshaling for variadic native calls
//! - Signature-driven call generation, uniform over any fixed arity
//! - Scoped lifecycle guards pairing every create with its destroy
//!
//! The solver itself stays external: it is loaded at runtime from a shared
//! library, or replaced by the in-process reference backend (feature
//! `stub`, on by default) for tests and hosts without the library.
//!
//! # Example
//!
//! ```
//! use basalt::{Basalt, SatResult};
//!
//! let basalt = Basalt::stub();
//! let config = basalt.config()?;
//! let env = basalt.env(&config)?;
//!
//! let bool_ty = env.bool_type()?;
//! let p = env.make_constant(env.declare("p", bool_ty)?)?;
//! env.assert_formula(p)?;
//! assert_eq!(env.solve()?, SatResult::Sat);
//!
//! let model = env.model()?;
//! assert!(model.eval(p)?.is_true()?);
//! # Ok::<(), basalt::Error>(())
//! ```
//!
//! # Threading
//!
//! Every call is synchronous and blocking. [`Basalt`] is shareable;
//! [`Env`] and everything derived from it are single-thread values, and the
//! layer adds no synchronization of its own.

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod ffi;

mod api;
mod config;
mod env;
mod error;
mod model;
mod ops;
mod solver;
mod term;

// Re-export commonly used types
pub use config::Config;
pub use env::{Env, ItpGroup};
pub use error::{Error, Result};
pub use ffi::types::SatResult;
pub use model::Model;
pub use solver::Basalt;
pub use term::{Decl, Term, Type};

// Raw handle types, for escape-hatch interop.
pub use basalt_sys::{RawConfig, RawDecl, RawEnv, RawModel, RawTerm, RawType};
