//! Foreign function interface infrastructure.
//!
//! The generic machinery under the typed solver API:
//! - Kind system and boundary values (`types`)
//! - Scalar/text marshaling with copy-then-release text ownership (`marshal`)
//! - Sequence-to-contiguous-buffer marshaling for variadic calls (`seq`)
//! - Signature-driven calls, one mechanism for every arity (`caller`)
//! - Native library resolution, shared object or in-process stub (`loader`)
//!
//! # Safety
//!
//! FFI involves `unsafe` code and careful ownership of native buffers. All
//! unsafe code is isolated here behind safe wrappers; soundness rests on the
//! per-operation signature table matching the native ABI.

pub mod caller;
pub mod loader;
pub mod marshal;
pub mod seq;
pub mod types;

pub use caller::{CallError, Signature};
pub use loader::{LoadError, NativeLibrary};
pub use marshal::MarshalError;
pub use types::{Kind, NativeValue, SatResult};
