use std::path::{Path, PathBuf};

/// Normalize a user-provided local path string into a PathBuf suitable for processing.
///
/// - Trims leading/trailing ASCII and Unicode whitespace
/// - Strips surrounding single or double quotes if present
/// - Expands a leading '~' to the HOME directory when possible
pub fn normalize_user_input_path(input: &str) -> PathBuf {
    let unquoted = strip_quotes(input.trim());

    if let Some(rest) = unquoted.strip_prefix('~') {
        if rest.is_empty() || rest.starts_with('/') {
            if let Some(home) = std::env::var_os("HOME") {
                let mut buf = PathBuf::from(home);
                let rest = rest.trim_start_matches('/');
                if !rest.is_empty() {
                    buf.push(rest);
                }
                return buf;
            }
        }
    }

    PathBuf::from(unquoted)
}

/// Trims a URL typed or pasted by a user, dropping surrounding quotes
pub fn normalize_url(input: &str) -> String {
    strip_quotes(input.trim()).trim().to_string()
}

/// Reduces an uploaded filename to a safe final path component
///
/// Directory parts (either separator) are discarded and characters other
/// than alphanumerics, `-`, `_` and `.` become `_`. Returns `None` when
/// nothing usable remains.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let last = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    let cleaned: String = last
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() || Path::new(cleaned).file_name().is_none() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

fn strip_quotes(s: &str) -> &str {
    if s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}
