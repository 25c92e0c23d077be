use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// RaiseAttention: a static exception-flow analyser.
#[derive(Debug, Parser)]
#[command(name = "raiseattention", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Repeatable verbosity control (`-v` for info, `-vv` for debug); the
    /// general mechanism `check`'s own `--debug` is sugar for at its
    /// highest level.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyse one or more files or directories.
    Check(CheckArgs),
    /// Run the language server on stdio.
    Lsp,
    /// Inspect or reset the on-disk analysis cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Files or directories to analyse; defaults to the current directory.
    pub paths: Vec<PathBuf>,

    /// Emit the diagnostics list as JSON instead of the human format.
    #[arg(long)]
    pub json: bool,
    /// Skip external-module analysis; native and external callees
    /// contribute nothing.
    #[arg(long)]
    pub local: bool,
    /// Additionally emit a diagnostic for every undocumented exception in
    /// a function's full may-raise set.
    #[arg(long)]
    pub strict: bool,
    /// Suppress `PossibleNativeException` for unresolved native callees.
    #[arg(long = "no-warn-native")]
    pub no_warn_native: bool,
    /// Bypass the on-disk cache entirely for this run.
    #[arg(long = "no-cache")]
    pub no_cache: bool,
    /// Raises log verbosity to include per-file parse timings and
    /// Signature Engine iteration counts; never changes diagnostic
    /// content.
    #[arg(long)]
    pub debug: bool,
    /// Print absolute paths in diagnostic output.
    #[arg(long)]
    pub absolute: bool,
    /// List fully-qualified exception names rather than short class names.
    #[arg(long = "full-module-path")]
    pub full_module_path: bool,
}

#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Entry counts and on-disk size per cache tier.
    Status,
    /// Remove the whole cache directory.
    Clear,
    /// Drop entries whose source file no longer exists or whose TTL has
    /// elapsed.
    Prune,
}
