//! The Signature Engine: the inter-procedural fixpoint that turns
//! per-function call graphs from the Syntax Visitor, plus the External
//! Resolver and Stub Store, into a may-raise `ExceptionSet` for every
//! function reachable from a project's entry modules.

mod engine;
mod key;
mod resolve;

pub use engine::{EngineOptions, SignatureEngine};
pub use key::FunctionKey;
pub use resolve::{guess_module, resolve_local};
