//! The External Resolver: locates the source file behind a dotted import
//! path (project roots, then stdlib, then detected virtual-environment
//! site-packages), parses it on demand through `raiseattention_visitor`,
//! and memoises results per absolute path and content hash. Cyclic import
//! graphs are broken with an explicit active set rather than by recursing
//! blindly; the Signature Engine's worklist fixpoint is what actually makes
//! cycles converge.

mod error;
mod resolver;
mod venv;

pub use error::ResolverError;
pub use resolver::{follow_reexport, ExternalResolver, Resolution};
pub use venv::{detect_venv, VenvInfo};
