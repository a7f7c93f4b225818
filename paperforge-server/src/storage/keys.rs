//! Blob key naming
//!
//! Sources live under `{owner}/{timestamp}_{original name}` and results under
//! `{owner}/{kind}_{timestamp}.{ext}`; timestamps are Unix milliseconds.

use paperforge_core::domain::job::JobKind;

use super::StorageError;

const MAX_FILENAME_LEN: usize = 120;

/// Key of an uploaded source document
pub fn source_key(owner_id: &str, timestamp_ms: i64, original_name: &str) -> String {
    format!("{}/{}_{}", owner_id, timestamp_ms, safe_filename(original_name))
}

/// Key of a generated artifact
pub fn result_key(owner_id: &str, kind: JobKind, timestamp_ms: i64) -> String {
    format!(
        "{}/{}_{}.{}",
        owner_id,
        kind.as_str(),
        timestamp_ms,
        kind.extension()
    )
}

/// Reduces a client-supplied filename to a flat, URL-safe name.
///
/// Directory components are dropped, characters outside
/// `[A-Za-z0-9._-]` become `_`, leading dots are stripped and the result
/// is capped in length.
pub fn safe_filename(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '_') {
        return "upload.pdf".to_string();
    }

    if cleaned.len() <= MAX_FILENAME_LEN {
        return cleaned.to_string();
    }

    // Keep the extension when shortening
    match cleaned.rfind('.') {
        Some(dot) if cleaned.len() - dot <= 10 => {
            let ext = &cleaned[dot..];
            format!("{}{}", &cleaned[..MAX_FILENAME_LEN - ext.len()], ext)
        }
        _ => cleaned[..MAX_FILENAME_LEN].to_string(),
    }
}

/// Rejects keys that are empty, absolute or contain traversal segments
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && !key.starts_with('/')
        && !key.contains('\\')
        && !key.contains('\0')
        && key
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..");

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}
