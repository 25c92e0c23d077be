use std::path::{Path, PathBuf};

use lsp_types::Url;

/// Normalises an editor-supplied `file:` URI into an absolute path,
/// accepting the three Windows URI dialects VS Code and friends emit
/// (`file:///C:/foo`, `file://C:/foo`, `file:/C:/foo`) plus the legacy
/// `file:` pipe form (`file:///C|/foo`).
#[must_use]
pub fn uri_to_path(uri: &Url) -> Option<PathBuf> {
    if uri.scheme() != "file" {
        return None;
    }

    // Deliberately not `Url::to_file_path`: its drive-letter handling is
    // gated on the *compiling* host's OS, but an editor can hand this
    // server a Windows-dialect URI (or this server can run headless on
    // Linux against a workspace mounted from a Windows host), so the drive
    // letter / pipe-form normalisation below is done by hand, uniformly.
    let raw = percent_decode(uri.path());
    let trimmed = raw.strip_prefix('/').unwrap_or(&raw);

    let path = if let Some(rest) = drive_letter_prefix(trimmed, '|').or_else(|| drive_letter_prefix(trimmed, ':')) {
        rest
    } else {
        format!("/{trimmed}")
    };

    Some(PathBuf::from(path))
}

/// `C|/Users/...` or `C:/Users/...` -- the colon form is the modern RFC
/// 8089 dialect, the pipe form a legacy one some older Windows tooling
/// still emits. Both translate to the same `C:/Users/...` path.
fn drive_letter_prefix(trimmed: &str, separator: char) -> Option<String> {
    let mut chars = trimmed.chars();
    let drive = chars.next()?;
    if !drive.is_ascii_alphabetic() {
        return None;
    }
    if chars.next()? != separator {
        return None;
    }
    let rest: String = chars.collect();
    Some(format!("{drive}:{rest}"))
}

fn percent_decode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut bytes = input.bytes();
    while let Some(b) = bytes.next() {
        if b == b'%' {
            let hi = bytes.next();
            let lo = bytes.next();
            if let (Some(hi), Some(lo)) = (hi, lo) {
                if let Ok(value) = u8::from_str_radix(&format!("{}{}", hi as char, lo as char), 16) {
                    out.push(value as char);
                    continue;
                }
            }
        }
        out.push(b as char);
    }
    out
}

/// The inverse of [`uri_to_path`], for publishing diagnostics against an
/// absolute path this server itself discovered (batch re-analysis, not an
/// editor-supplied URI).
#[must_use]
pub fn path_to_uri(path: &Path) -> Option<Url> {
    Url::from_file_path(path).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_posix_uri_round_trips() {
        let uri = Url::parse("file:///home/user/project/mod.py").unwrap();
        let path = uri_to_path(&uri).unwrap();
        assert_eq!(path, PathBuf::from("/home/user/project/mod.py"));
    }

    #[test]
    fn windows_triple_slash_drive_uri_is_accepted() {
        let uri = Url::parse("file:///C:/Users/me/project/mod.py").unwrap();
        let path = uri_to_path(&uri).unwrap();
        assert!(path.to_string_lossy().starts_with("C:"));
    }

    #[test]
    fn pipe_form_drive_uri_is_translated() {
        let uri = Url::parse("file:///C|/Users/me/project/mod.py").unwrap();
        let path = uri_to_path(&uri).unwrap();
        assert_eq!(path, PathBuf::from("C:/Users/me/project/mod.py"));
    }

    #[test]
    fn non_file_scheme_is_rejected() {
        let uri = Url::parse("untitled:Untitled-1").unwrap();
        assert!(uri_to_path(&uri).is_none());
    }
}
