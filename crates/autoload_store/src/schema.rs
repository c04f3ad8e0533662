use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// One exported snapshot of the session selections.
///
/// Field names on the wire are the short historical keys; renaming them
/// would orphan every previously exported snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoloadSnapshot {
    /// Project file path.
    #[serde(rename = "ppath")]
    pub project_path: String,
    /// WINE prefix root.
    #[serde(rename = "prefix")]
    pub prefix_path: String,
    /// Runtime parent directory (without the runtime folder).
    #[serde(rename = "rtpath")]
    pub runtime_path: String,
    /// Runtime folder name.
    #[serde(rename = "rt")]
    pub runtime_name: String,
    /// Debug build flag (0/1 historically, so an integer on the wire).
    #[serde(rename = "debug")]
    pub debug: u8,
    /// WINE drive letter mapped to the filesystem root.
    #[serde(rename = "drive")]
    pub drive_letter: String,
    /// Build configuration name.
    #[serde(rename = "config")]
    pub config_name: String,
    /// Install variant suffix (empty or "-LTS").
    #[serde(rename = "lts")]
    pub variant_suffix: String,
    /// RFC3339 export timestamp; absent in snapshots from older versions.
    #[serde(rename = "exported_at", default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<String>,
}

impl AutoloadSnapshot {
    /// Stamp the snapshot with the current UTC time.
    pub fn stamped(mut self) -> Self {
        self.exported_at = OffsetDateTime::now_utc().format(&Rfc3339).ok();
        self
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug != 0
    }

    /// Required fields that must be non-empty for a snapshot to restore.
    pub(crate) fn required_fields(&self) -> [(&'static str, &str); 4] {
        [
            ("ppath", self.project_path.as_str()),
            ("prefix", self.prefix_path.as_str()),
            ("rtpath", self.runtime_path.as_str()),
            ("rt", self.runtime_name.as_str()),
        ]
    }
}
