//! The Diagnostic Engine: turns a module's call sites and the Signature
//! Engine's per-function may-raise sets into the final, suppression-filtered
//! diagnostic list a frontend publishes.

mod code;
mod diagnose;
mod diagnostic;
mod ignore;

pub use code::DiagnosticCode;
pub use diagnose::{diagnose_module, DiagnosticOptions};
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use ignore::{find_directive, IgnoreDirective};
