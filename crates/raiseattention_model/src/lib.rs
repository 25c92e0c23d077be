//! Shared data model for RaiseAttention's exception-flow analysis.
//!
//! Every other crate in the workspace (visitor, resolver, signature engine,
//! diagnostic engine, cache) speaks in terms of the types defined here. None
//! of these types know how to parse TL source or how to serialise
//! themselves to disk; that is the job of the crates that consume them.

mod confidence;
pub mod decorators;
mod exception_set;
mod function;
mod handled;
pub mod hierarchy;
pub mod hof;
mod location;
mod module;
mod qualname;
mod stub;
mod try_scope;

pub use confidence::Confidence;
pub use exception_set::{ExceptionSet, EXCEPTION_POSSIBLE_NATIVE, EXCEPTION_UNTYPED};
pub use function::{CallInfo, CallableHint, CallableHintSlot, FunctionFlags, FunctionInfo};
pub use handled::HandledSet;
pub use location::{Location, Position};
pub use module::{ImportTable, Module, ModuleKind};
pub use qualname::QualName;
pub use stub::StubRecord;
pub use try_scope::{ExceptHandler, TryScope, TryScopeId};
