//! The LSP frontend: an editor-facing interactive mode alongside the
//! batch `check` command.
//!
//! No teacher source exists in the retrieval pack for this exact
//! `lsp-server`/`lsp-types`/`crossbeam`/`jod-thread` combination -- only
//! its `Cargo.toml` dependency set does -- so this module follows the
//! well-known idiom that combination implies (the same shape
//! `rust-analyzer` and `ruff_server` use: a synchronous `Connection`, a
//! `crossbeam::channel::select!` dispatch loop, notifications extracted by
//! type) rather than any one file copied from the pack. Documented as a
//! grounding caveat in this crate's design ledger entry.
//!
//! Dispatch is fully single-threaded: the main loop's `select!` only ever
//! has one arm active at a time, so a document-change notification cannot
//! interleave with an in-flight analysis the way two OS threads could.
//! That collapses "abandon stale in-flight analysis" down to a
//! content-hash recheck immediately before publishing, which is sufficient
//! to satisfy the ordering guarantee of never publishing a stale version,
//! even though it forgoes the resource-reclaiming early exit a true
//! cooperative-cancellation scheduler would give a large in-flight parse.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use lsp_server::{Connection, Message};
use lsp_types::notification::{
    DidChangeTextDocument, DidCloseTextDocument, DidOpenTextDocument, DidSaveTextDocument,
    Notification as LspNotificationTrait, PublishDiagnostics,
};
use lsp_types::{
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams, DidSaveTextDocumentParams,
    InitializeParams, NumberOrString, Position as LspPosition, PublishDiagnosticsParams, Range as LspRange,
    ServerCapabilities, TextDocumentSyncCapability, TextDocumentSyncKind, Url,
};

use raiseattention_config::PartialConfig;
use raiseattention_diagnostics::{diagnose_module, Diagnostic as RaDiagnostic, DiagnosticCode, DiagnosticKind, DiagnosticOptions};
use raiseattention_model::{ModuleKind, Position as RaPosition};
use raiseattention_signatures::{EngineOptions, SignatureEngine};

use crate::discovery::qualname_for;
use crate::error::ServerError;
use crate::session::AnalysisSession;
use crate::uri::uri_to_path;

/// A debounce window (default 500 ms) coalesces rapid document-change
/// events per URI.
const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);
/// How often the background ticker thread wakes the dispatch loop to check
/// whether any URI's debounce window has elapsed.
const TICK_INTERVAL: Duration = Duration::from_millis(50);

struct DocumentState {
    content: String,
    hash: String,
}

/// Starts the server on stdio and runs until the client shuts it down.
pub fn run() -> Result<(), ServerError> {
    init_logging();

    let (connection, io_threads) = Connection::stdio();
    let init_value = connection.initialize(serde_json::to_value(server_capabilities())?)?;
    let init_params: InitializeParams = serde_json::from_value(init_value)?;

    let root = workspace_root(&init_params).ok_or(ServerError::NoWorkspaceRoot)?;
    let session = AnalysisSession::open(&root, PartialConfig::default())?;

    main_loop(&connection, &session)?;

    io_threads.join()?;
    Ok(())
}

fn server_capabilities() -> ServerCapabilities {
    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
        ..ServerCapabilities::default()
    }
}

#[allow(deprecated)]
fn workspace_root(params: &InitializeParams) -> Option<PathBuf> {
    if let Some(folders) = &params.workspace_folders {
        if let Some(folder) = folders.first() {
            if let Some(path) = uri_to_path(&folder.uri) {
                return Some(path);
            }
        }
    }
    params.root_uri.as_ref().and_then(uri_to_path)
}

/// Bridges any `log`-facade records the shared analysis crates emit (the
/// resolver, the signature engine, the cache layer) into the same
/// `tracing-subscriber` output as this module's own spans, writing to
/// stderr -- never stdout, which carries the LSP transport.
fn init_logging() {
    use tracing_subscriber::prelude::*;

    let _ = tracing_log::LogTracer::init();
    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_ansi(false));
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// The two logical queues the dispatch loop selects over:
/// `connection.receiver` carries incoming document events, `tick_rx`
/// carries the background re-analysis scheduler's wakeups. A `jod-thread`
/// ticker is the only thread besides this one; it touches nothing but the
/// tick channel.
fn main_loop(connection: &Connection, session: &AnalysisSession) -> Result<(), ServerError> {
    let documents: DashMap<Url, DocumentState> = DashMap::new();
    let pending: DashMap<Url, Instant> = DashMap::new();

    let (tick_tx, tick_rx) = crossbeam::channel::unbounded::<()>();
    let _ticker = jod_thread::spawn(move || loop {
        std::thread::sleep(TICK_INTERVAL);
        if tick_tx.send(()).is_err() {
            break;
        }
    });

    loop {
        crossbeam::channel::select! {
            recv(connection.receiver) -> msg => {
                match msg {
                    Ok(Message::Request(req)) => {
                        if connection.handle_shutdown(&req)? {
                            return Ok(());
                        }
                        // Everything beyond the lifecycle requests `lsp-server`
                        // already handles is simply not served.
                    }
                    Ok(Message::Notification(not)) => handle_notification(not, &documents, &pending)?,
                    Ok(Message::Response(_)) => {}
                    Err(_) => return Ok(()),
                }
            }
            recv(tick_rx) -> tick => {
                if tick.is_err() {
                    return Ok(());
                }
                dispatch_ready(connection, session, &documents, &pending);
            }
        }
    }
}

fn handle_notification(
    not: lsp_server::Notification,
    documents: &DashMap<Url, DocumentState>,
    pending: &DashMap<Url, Instant>,
) -> Result<(), ServerError> {
    let lsp_server::Notification { method, params } = not;

    match method.as_str() {
        DidOpenTextDocument::METHOD => {
            let params: DidOpenTextDocumentParams = serde_json::from_value(params)?;
            let uri = params.text_document.uri;
            let content = params.text_document.text;
            let hash = raiseattention_cache::sha256_hex(content.as_bytes());
            documents.insert(uri.clone(), DocumentState { content, hash });
            pending.insert(uri, Instant::now());
        }
        DidChangeTextDocument::METHOD => {
            let params: DidChangeTextDocumentParams = serde_json::from_value(params)?;
            let uri = params.text_document.uri;
            if let Some(change) = params.content_changes.into_iter().last() {
                let hash = raiseattention_cache::sha256_hex(change.text.as_bytes());
                documents.insert(
                    uri.clone(),
                    DocumentState {
                        content: change.text,
                        hash,
                    },
                );
            }
            pending.insert(uri, Instant::now());
        }
        DidSaveTextDocument::METHOD => {
            let params: DidSaveTextDocumentParams = serde_json::from_value(params)?;
            pending.insert(params.text_document.uri, Instant::now());
        }
        DidCloseTextDocument::METHOD => {
            let params: DidCloseTextDocumentParams = serde_json::from_value(params)?;
            documents.remove(&params.text_document.uri);
            pending.remove(&params.text_document.uri);
        }
        _ => {}
    }
    Ok(())
}

/// Runs analysis for every URI whose debounce window has elapsed, then
/// publishes -- unless a newer edit superseded it while analysis ran.
fn dispatch_ready(
    connection: &Connection,
    session: &AnalysisSession,
    documents: &DashMap<Url, DocumentState>,
    pending: &DashMap<Url, Instant>,
) {
    let now = Instant::now();
    let ready: Vec<Url> = pending
        .iter()
        .filter(|entry| now.saturating_duration_since(*entry.value()) >= DEBOUNCE_WINDOW)
        .map(|entry| entry.key().clone())
        .collect();

    for uri in ready {
        pending.remove(&uri);
        let Some(doc) = documents.get(&uri) else { continue };
        let content = doc.content.clone();
        let hash = doc.hash.clone();
        drop(doc);

        let span = tracing::debug_span!("analyze_document", uri = %uri, content_hash = %hash);
        let _guard = span.enter();
        let diagnostics = analyze_document(session, &uri, &content);
        drop(_guard);

        let still_current = documents.get(&uri).map(|d| d.hash == hash).unwrap_or(false);
        if still_current {
            publish(connection, &uri, diagnostics);
        } else {
            tracing::debug!("discarding stale analysis for {uri}");
        }
    }
}

fn analyze_document(session: &AnalysisSession, uri: &Url, content: &str) -> Vec<lsp_types::Diagnostic> {
    let path = uri_to_path(uri).unwrap_or_else(|| PathBuf::from(uri.as_str()));
    let roots = vec![session.project_root.clone()];
    let qualname = qualname_for(&path, &roots);

    let module = match raiseattention_visitor::visit_source(&path, qualname.clone(), ModuleKind::Project, content) {
        Ok(module) => module,
        Err(err) => {
            let diagnostic = RaDiagnostic::new(
                DiagnosticCode::InternalError,
                path,
                RaPosition::new(1, 1),
                DiagnosticKind::InternalError {
                    detail: err.to_string(),
                },
            );
            return vec![to_lsp_diagnostic(&diagnostic)];
        }
    };

    let resolver = session.resolver();
    let engine = SignatureEngine::new(
        &resolver,
        &session.stubs,
        &session.config,
        EngineOptions {
            local_only: session.config.local_only,
            warn_native: session.config.warn_native,
        },
    );
    engine.analyze(qualname.clone(), Arc::new(module.clone()));

    let options = DiagnosticOptions {
        strict_mode: session.config.strict_mode,
        full_module_path: false,
        ignore_include: session.config.ignore_include.clone(),
        ignore_exclude: session.config.ignore_exclude.clone(),
    };
    let diagnostics = diagnose_module(&module, &qualname, content, &engine, options);
    crate::batch::filter_ignored_exceptions(diagnostics, &session.config.ignore_exceptions)
        .iter()
        .map(to_lsp_diagnostic)
        .collect()
}

fn to_lsp_diagnostic(diagnostic: &RaDiagnostic) -> lsp_types::Diagnostic {
    let severity = match diagnostic.code {
        DiagnosticCode::UnhandledException | DiagnosticCode::InternalError => lsp_types::DiagnosticSeverity::ERROR,
        DiagnosticCode::RaiseAttention => lsp_types::DiagnosticSeverity::WARNING,
    };
    let line = diagnostic.position.line.saturating_sub(1);
    let character = diagnostic.position.column.saturating_sub(1);
    let start = LspPosition::new(line, character);
    let end = LspPosition::new(line, character + 1);

    lsp_types::Diagnostic {
        range: LspRange::new(start, end),
        severity: Some(severity),
        code: Some(NumberOrString::String(diagnostic.code.as_str().to_string())),
        code_description: None,
        source: Some("raiseattention".to_string()),
        message: diagnostic.message(),
        related_information: None,
        tags: None,
        data: None,
    }
}

fn publish(connection: &Connection, uri: &Url, diagnostics: Vec<lsp_types::Diagnostic>) {
    let params = PublishDiagnosticsParams {
        uri: uri.clone(),
        diagnostics,
        version: None,
    };
    let notification = lsp_server::Notification::new(PublishDiagnostics::METHOD.to_string(), params);
    if let Err(err) = connection.sender.send(Message::Notification(notification)) {
        tracing::error!("failed to publish diagnostics for {uri}: {err}");
    }
}
