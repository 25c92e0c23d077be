use std::process::ExitCode;

use raiseattention_config::PartialConfig;
use raiseattention_server::AnalysisSession;

use crate::cli::CacheAction;

/// `raiseattention cache status|clear|prune`. These act on the cache
/// directory regardless of whether the project's own config disables it
/// day-to-day, so the CLI layer forces `cache_enabled` on for the session
/// this subcommand opens.
pub fn run(action: CacheAction) -> anyhow::Result<ExitCode> {
    let project_root = std::env::current_dir()?;
    let mut cli_layer = PartialConfig::default();
    cli_layer.cache_enabled = Some(true);

    let session = AnalysisSession::open(&project_root, cli_layer)?;
    let cache = session.cache.expect("cache_enabled was forced on above");

    match action {
        CacheAction::Status => {
            let status = cache.status();
            println!("cache root: {}", status.root.display());
            println!("file entries: {} ({} bytes)", status.file_entries, status.file_bytes);
            println!(
                "signature entries: {} ({} bytes)",
                status.signature_entries, status.signature_bytes
            );
        }
        CacheAction::Clear => {
            cache.clear()?;
            println!("cache cleared");
        }
        CacheAction::Prune => {
            let report = cache.prune()?;
            println!(
                "removed {} file entr{} and {} signature entr{}",
                report.file_removed,
                if report.file_removed == 1 { "y" } else { "ies" },
                report.signature_removed,
                if report.signature_removed == 1 { "y" } else { "ies" },
            );
        }
    }

    Ok(ExitCode::SUCCESS)
}
