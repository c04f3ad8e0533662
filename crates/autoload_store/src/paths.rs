use std::env;
use std::path::PathBuf;

use crate::error::AutoloadError;

pub const SNAPSHOT_FILE_NAME: &str = ".gmbuild_autoload";

/// `$HOME/.gmbuild_autoload`.
pub fn default_snapshot_path() -> Result<PathBuf, AutoloadError> {
    let home = env::var_os("HOME").ok_or(AutoloadError::NoHomeDirectory)?;
    if home.is_empty() {
        return Err(AutoloadError::NoHomeDirectory);
    }
    Ok(PathBuf::from(home).join(SNAPSHOT_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::{default_snapshot_path, SNAPSHOT_FILE_NAME};

    #[test]
    fn path_ends_with_snapshot_file_name() {
        if std::env::var_os("HOME").is_some() {
            let path = default_snapshot_path().expect("path");
            assert!(path.ends_with(SNAPSHOT_FILE_NAME));
        }
    }
}
