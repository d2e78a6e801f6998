use crate::error::{StoreError, StoreResult};

/// Longest sanitized filename, in bytes.
pub const MAX_FILENAME_LEN: usize = 255;

/// Reduce an uploaded filename to a single safe path component.
///
/// Only the final component survives (either separator style), whitespace
/// becomes `_`, anything outside `[A-Za-z0-9._-]` is dropped, and leading
/// dots are stripped so the result can never be `.`, `..` or a hidden file.
pub fn sanitize_filename(filename: &str) -> StoreResult<String> {
    let last = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: String = last
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() => Some(c),
            '.' | '-' | '_' => Some(c),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .collect();

    let mut cleaned = cleaned.trim_start_matches('.').to_string();
    cleaned.truncate(MAX_FILENAME_LEN);

    if cleaned.is_empty() {
        return Err(StoreError::InvalidFilename(filename.to_string()));
    }
    Ok(cleaned)
}
