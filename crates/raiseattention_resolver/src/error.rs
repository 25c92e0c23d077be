/// Everything that can go wrong while the External Resolver tries to
/// locate and parse a module. An I/O error degrades to an `internal-error`
/// diagnostic against the offending file rather than aborting the run --
/// the caller is responsible for that degradation, this type just lets it
/// distinguish the cases.
#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Visit(#[from] raiseattention_visitor::VisitError),
}
