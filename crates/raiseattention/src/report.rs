use std::process::ExitCode;

use itertools::Itertools;

use raiseattention_server::BatchReport;

/// Renders a finished [`BatchReport`] and computes the process exit code:
/// `0` clean, `1` diagnostics found, `2` only ever reached from `main`'s own
/// `Err` branch for a run that didn't complete at all.
pub fn render(report: &BatchReport, json: bool, absolute: bool) -> anyhow::Result<ExitCode> {
    if json {
        render_json(report)?;
    } else {
        render_human(report, absolute);
    }

    Ok(if report.diagnostics.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

/// Groups diagnostics by file before printing, so a multi-file run reads as
/// one block per file rather than an interleaved stream in discovery order.
fn render_human(report: &BatchReport, absolute: bool) {
    let by_path = report.diagnostics.iter().into_group_map_by(|d| d.path.clone());
    for path in by_path.keys().sorted() {
        for diagnostic in &by_path[path] {
            if absolute {
                let path = diagnostic.path.canonicalize().unwrap_or_else(|_| diagnostic.path.clone());
                println!(
                    "{}:{}:{}: error: {}",
                    path.display(),
                    diagnostic.position.line,
                    diagnostic.position.column,
                    diagnostic.message()
                );
            } else {
                println!("{diagnostic}");
            }
        }
    }
    println!("{} issue(s) found", report.diagnostics.len());
}

fn render_json(report: &BatchReport) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&json_payload(report))?);
    Ok(())
}

fn json_payload(report: &BatchReport) -> serde_json::Value {
    let items: Vec<_> = report
        .diagnostics
        .iter()
        .map(|d| {
            serde_json::json!({
                "code": d.code.as_str(),
                "path": d.path,
                "line": d.position.line,
                "column": d.position.column,
                "message": d.message(),
            })
        })
        .collect();

    serde_json::json!({
        "diagnostics": items,
        "files_analyzed": report.files_analyzed,
        "files_failed": report.files_failed,
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use raiseattention_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticKind};
    use raiseattention_model::Position;

    use super::*;

    #[test]
    fn json_payload_shape_for_unhandled_and_internal_error() {
        let report = BatchReport {
            diagnostics: vec![
                Diagnostic::new(
                    DiagnosticCode::UnhandledException,
                    PathBuf::from("pkg/a.py"),
                    Position::new(5, 9),
                    DiagnosticKind::UnhandledException {
                        callee: "r".to_string(),
                        exceptions: vec!["ValueError".to_string()],
                    },
                ),
                Diagnostic::new(
                    DiagnosticCode::InternalError,
                    PathBuf::from("pkg/bad.py"),
                    Position::new(1, 1),
                    DiagnosticKind::InternalError {
                        detail: "unexpected indent".to_string(),
                    },
                ),
            ],
            files_analyzed: 2,
            files_failed: 1,
        };

        insta::assert_snapshot!(serde_json::to_string_pretty(&json_payload(&report)).unwrap());
    }
}
