use std::path::PathBuf;

/// Everything that can abort the server's main loop itself. Per-file and
/// per-function failures degrade gracefully elsewhere; this is the
/// transport and session layer above that, where a failure really is fatal.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("lsp transport error: {0}")]
    Transport(#[from] lsp_server::ProtocolError),

    #[error("malformed request/response payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("failed to resolve configuration for {root}: {source}")]
    Config {
        root: PathBuf,
        #[source]
        source: raiseattention_config::ConfigError,
    },

    #[error("failed to open analysis cache: {0}")]
    Cache(#[from] raiseattention_cache::CacheError),

    #[error("failed to load stub database: {0}")]
    Stub(#[from] raiseattention_stubs::StubError),

    #[error("no workspace root in the initialize request")]
    NoWorkspaceRoot,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
