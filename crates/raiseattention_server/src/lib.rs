//! The session, discovery, batch, and LSP layer that sits on top of the
//! analysis crates: the one place that actually owns a `Config`, a
//! `StubStore`, an `AnalysisCache` and wires them together for a whole
//! project, rather than one file at a time.
//!
//! `raiseattention_server` is consumed by two frontends that otherwise share
//! nothing but this crate: the `raiseattention` CLI binary (batch mode) and
//! its own [`lsp`] module (interactive mode).

mod batch;
mod discovery;
mod error;
mod lsp;
mod session;
mod uri;

pub use batch::{run_batch, BatchOptions, BatchReport, ParsedFile};
pub use discovery::{derive_roots, discover_python_files, qualname_for};
pub use error::ServerError;
pub use lsp::run as run_lsp;
pub use session::AnalysisSession;
pub use uri::{path_to_uri, uri_to_path};
