use std::fs;
use std::path::Path;

use crate::error::AutoloadError;
use crate::schema::AutoloadSnapshot;

/// Read and validate a snapshot.
///
/// Any failure — missing file, malformed JSON, missing or empty required
/// field — is a typed error; callers treat all of them as "no snapshot".
pub fn load_snapshot(path: &Path) -> Result<AutoloadSnapshot, AutoloadError> {
    let content = fs::read_to_string(path)
        .map_err(|source| AutoloadError::io("reading snapshot", path, source))?;

    let snapshot: AutoloadSnapshot =
        serde_json::from_str(&content).map_err(|source| AutoloadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    for (field, value) in snapshot.required_fields() {
        if value.trim().is_empty() {
            return Err(AutoloadError::EmptyField {
                path: path.to_path_buf(),
                field,
            });
        }
    }

    Ok(snapshot)
}

/// Serialize and write a snapshot, stamping the export time.
pub fn save_snapshot(path: &Path, snapshot: AutoloadSnapshot) -> Result<(), AutoloadError> {
    let snapshot = snapshot.stamped();
    let content =
        serde_json::to_string_pretty(&snapshot).map_err(|source| AutoloadError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;

    fs::write(path, content)
        .map_err(|source| AutoloadError::io("writing snapshot", path, source))
}
