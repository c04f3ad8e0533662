//! Filesystem discovery of WINE prefixes, GameMaker installs, runtimes,
//! projects, and per-project build configs.
//!
//! All walks are bounded in depth and entry count so a pathological home
//! directory slows discovery down instead of hanging it. Empty results are
//! normal; callers surface them as advisories.

use std::fs::{read_dir, symlink_metadata};
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

const MAX_WALK_DEPTH: usize = 8;
const MAX_WALK_ENTRIES: usize = 100_000;

struct Walker<'a> {
    visited: usize,
    on_entry: &'a mut dyn FnMut(&Path, bool),
}

impl<'a> Walker<'a> {
    fn walk(&mut self, dir: &Path, depth: usize) {
        if depth > MAX_WALK_DEPTH || self.visited >= MAX_WALK_ENTRIES {
            return;
        }
        let Ok(entries) = read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            if self.visited >= MAX_WALK_ENTRIES {
                return;
            }
            self.visited += 1;
            let path = entry.path();
            // Symlinks are skipped entirely so prefix loops cannot recurse.
            let Ok(metadata) = symlink_metadata(&path) else {
                continue;
            };
            if metadata.file_type().is_symlink() {
                continue;
            }
            let is_dir = metadata.is_dir();
            (self.on_entry)(&path, is_dir);
            if is_dir {
                self.walk(&path, depth + 1);
            }
        }
    }
}

fn walk_filesystem(root: &Path, mut on_entry: impl FnMut(&Path, bool)) {
    let mut walker = Walker {
        visited: 0,
        on_entry: &mut on_entry,
    };
    walker.walk(root, 0);
}

fn file_name_of(path: &Path) -> &str {
    path.file_name().and_then(|name| name.to_str()).unwrap_or("")
}

/// WINE prefixes under `home`: every directory that contains a `drive_c`,
/// excluding snapshot noise under `.directory_history`.
pub fn find_prefixes(home: &Path) -> Vec<String> {
    let mut prefixes = Vec::new();
    walk_filesystem(home, |path, is_dir| {
        if !is_dir || file_name_of(path) != "drive_c" {
            return;
        }
        let Some(parent) = path.parent() else {
            return;
        };
        let prefix = parent.to_string_lossy().into_owned();
        if prefix.contains("/.directory_history/") {
            return;
        }
        prefixes.push(prefix);
    });
    prefixes.sort();
    prefixes
}

/// GameMaker project files (`*.yyp`) under `home`, excluding build caches.
pub fn find_projects(home: &Path) -> Vec<String> {
    let mut projects = Vec::new();
    walk_filesystem(home, |path, is_dir| {
        if is_dir {
            return;
        }
        let name = file_name_of(path);
        if !name.ends_with(".yyp") {
            return;
        }
        let full = path.to_string_lossy().into_owned();
        if full.to_ascii_lowercase().contains("cache") {
            return;
        }
        projects.push(full);
    });
    projects.sort();
    projects
}

static GM_EXECUTABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^GameMaker(Studio|-LTS)?\.exe$").expect("gm executable pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GmInstall {
    pub exe_path: String,
    /// `"-LTS"` for long-term-support installs, empty otherwise.
    pub variant_suffix: String,
}

/// First GameMaker IDE executable inside the prefix.
pub fn find_gm_executable(prefix: &Path) -> Option<GmInstall> {
    let mut found: Option<GmInstall> = None;
    walk_filesystem(prefix, |path, is_dir| {
        if is_dir || found.is_some() {
            return;
        }
        if !GM_EXECUTABLE.is_match(file_name_of(path)) {
            return;
        }
        let exe_path = path.to_string_lossy().into_owned();
        let variant_suffix = if exe_path.contains("-LTS") {
            "-LTS".to_string()
        } else {
            String::new()
        };
        found = Some(GmInstall {
            exe_path,
            variant_suffix,
        });
    });
    found
}

/// The runtime cache inside the prefix: returns the runtimes directory
/// (with a trailing separator) and the runtime folder names inside it.
pub fn find_runtimes(prefix: &Path) -> Option<(String, Vec<String>)> {
    let mut runtimes_dir: Option<PathBuf> = None;
    walk_filesystem(prefix, |path, is_dir| {
        if !is_dir || runtimes_dir.is_some() {
            return;
        }
        if file_name_of(path) == "runtimes" {
            runtimes_dir = Some(path.to_path_buf());
        }
    });

    let runtimes_dir = runtimes_dir?;
    let mut names: Vec<String> = read_dir(&runtimes_dir)
        .ok()?
        .flatten()
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .collect();
    names.sort();
    if names.is_empty() {
        return None;
    }

    let mut root = runtimes_dir.to_string_lossy().into_owned();
    if !root.ends_with('/') {
        root.push('/');
    }
    Some((root, names))
}

/// The GameMaker user-data directory (holds `Manifest.enc` login data).
pub fn find_user_dir(prefix: &Path) -> Option<String> {
    let mut found: Option<String> = None;
    walk_filesystem(prefix, |path, is_dir| {
        if is_dir || found.is_some() {
            return;
        }
        if file_name_of(path) == "Manifest.enc" {
            found = path
                .parent()
                .map(|parent| parent.to_string_lossy().into_owned());
        }
    });
    found
}

/// First file under `root` whose name matches `name` exactly, optionally
/// rejecting paths containing `exclude`.
pub fn find_file_named(root: &Path, name: &str, exclude: Option<&str>) -> Option<String> {
    let mut found: Option<String> = None;
    walk_filesystem(root, |path, is_dir| {
        if is_dir || found.is_some() {
            return;
        }
        if file_name_of(path) != name {
            return;
        }
        let full = path.to_string_lossy().into_owned();
        if let Some(excluded) = exclude {
            if full.contains(excluded) {
                return;
            }
        }
        found = Some(full);
    });
    found
}

static DEAD_OBJECT_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",[\s]*\}").expect("dead object comma pattern"));
static DEAD_ARRAY_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",[\s]*\]").expect("dead array comma pattern"));

/// GameMaker project files carry trailing commas the JSON spec forbids;
/// strip them so a strict parser accepts the document.
pub fn strip_dead_commas(content: &str) -> String {
    let content = DEAD_OBJECT_COMMA.replace_all(content, "}");
    DEAD_ARRAY_COMMA.replace_all(&content, "]").into_owned()
}

/// Flattened config tree from a project file, labeled `parent -> child`.
pub fn list_configs(project_path: &Path) -> Vec<String> {
    let Ok(content) = std::fs::read_to_string(project_path) else {
        return Vec::new();
    };
    let Ok(document) = serde_json::from_str::<Value>(&strip_dead_commas(&content)) else {
        return Vec::new();
    };
    let Some(root) = document.get("configs") else {
        return Vec::new();
    };

    let mut flattened = Vec::new();
    flatten_configs(root, "", &mut flattened);
    flattened
}

fn flatten_configs(node: &Value, prefix: &str, out: &mut Vec<String>) {
    let Some(name) = node.get("name").and_then(Value::as_str) else {
        return;
    };
    let label = format!("{prefix}{name}");
    out.push(label.clone());

    if let Some(children) = node.get("children").and_then(Value::as_array) {
        let child_prefix = format!("{label} -> ");
        for child in children {
            flatten_configs(child, &child_prefix, out);
        }
    }
}

static CONFIG_LEAF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-> (\w*)$").expect("config leaf pattern"));

/// The config name a flattened label refers to (the segment after the last
/// arrow, or the whole label for a root config).
pub fn config_leaf_name(label: &str) -> String {
    match CONFIG_LEAF.captures(label) {
        Some(captures) => captures
            .get(1)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default(),
        None => label.to_string(),
    }
}

static PROJECT_FILE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/([a-zA-Z.\s0-9-]+)\.yyp$").expect("project name pattern"));

/// Split a project path into (name, containing directory).
///
/// Names with characters outside the historical allow-list are rejected so
/// later path substitutions stay predictable.
pub fn project_name_and_dir(project_path: &str) -> Option<(String, String)> {
    let captures = PROJECT_FILE_NAME.captures(project_path)?;
    let name = captures.get(1)?.as_str().to_string();
    let file_name = format!("{name}.yyp");
    let dir = project_path
        .strip_suffix(&file_name)
        .unwrap_or(project_path)
        .to_string();
    Some((name, dir))
}
