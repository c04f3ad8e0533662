//! Build-configuration documents and build-source resolution.
//!
//! A build either generates fresh documents (`build.bff`, `macros.json`,
//! `targetoptions.json`) under the prefix's `drive_c/users/gmbuild/` tree,
//! or reuses the first existing `build.bff` found in the prefix. Both
//! sources normalize to the same `{runtime name, options path}` pair the
//! launch step consumes.

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app::Session;
use crate::discovery;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("no build.bff file found!")]
    NoExistingOptions,

    #[error("error reading build.bff!")]
    UnreadableOptions,

    #[error("failed to find {name}!")]
    MissingRuntimeTool { name: &'static str },

    #[error("I/O error while {operation} at {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {document}: {source}")]
    Serialize {
        document: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl BuildError {
    fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

/// The asset-compiler options document (`build.bff`).
///
/// Field names and stringly-typed values follow what the compiler actually
/// accepts; this document is consumed by Igor, not by this program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOptions {
    #[serde(rename = "targetFile")]
    pub target_file: String,
    #[serde(rename = "assetCompiler")]
    pub asset_compiler: String,
    pub debug: String,
    pub compile_output_file_name: String,
    #[serde(rename = "useShaders")]
    pub use_shaders: String,
    #[serde(rename = "steamOptions")]
    pub steam_options: String,
    pub config: String,
    #[serde(rename = "configParents")]
    pub config_parents: String,
    #[serde(rename = "outputFolder")]
    pub output_folder: String,
    #[serde(rename = "projectName")]
    pub project_name: String,
    pub macros: String,
    #[serde(rename = "projectDir")]
    pub project_dir: String,
    pub preferences: String,
    #[serde(rename = "projectPath")]
    pub project_path: String,
    #[serde(rename = "tempFolder")]
    pub temp_folder: String,
    #[serde(rename = "tempFolderUnmapped")]
    pub temp_folder_unmapped: String,
    #[serde(rename = "userDir")]
    pub user_dir: String,
    #[serde(rename = "runtimeLocation")]
    pub runtime_location: String,
    #[serde(rename = "targetOptions")]
    pub target_options: String,
    #[serde(rename = "targetMask")]
    pub target_mask: String,
    #[serde(rename = "applicationPath")]
    pub application_path: String,
    pub verbose: String,
    #[serde(rename = "SteamIDE")]
    pub steam_ide: String,
    #[serde(rename = "helpPort")]
    pub help_port: String,
    #[serde(rename = "debuggerPort")]
    pub debugger_port: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilerMacros {
    pub asset_compiler_cache_directory: String,
    pub project_cache_directory_name: String,
    pub project_name: String,
    pub asset_compiler_path: String,
    pub runner_path: String,
    pub x64_runner_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetOptions {
    pub runtime: String,
}

impl TargetOptions {
    pub fn vm() -> Self {
        Self {
            runtime: "VM".to_string(),
        }
    }
}

/// Paths of the generated document tree under the prefix.
#[derive(Debug, Clone)]
pub struct BuildDocuments {
    pub gmbuild_dir: PathBuf,
    /// Drive-letter form of the options path, as Igor wants it.
    pub options_path_mapped: String,
    pub options: BuildOptions,
}

fn gmbuild_dir(session: &Session) -> PathBuf {
    Path::new(&session.prefix_path).join("drive_c/users/gmbuild")
}

fn mapped(session: &Session, unix_path: impl AsRef<str>) -> String {
    format!("{}:{}", session.drive_letter, unix_path.as_ref())
}

pub fn generate_build_options(session: &Session) -> BuildOptions {
    let prefix = &session.prefix_path;
    let base = format!("{prefix}/drive_c/users/gmbuild");

    BuildOptions {
        target_file: String::new(),
        asset_compiler: String::new(),
        debug: if session.debug_enabled {
            "true".to_string()
        } else {
            "false".to_string()
        },
        compile_output_file_name: mapped(
            session,
            format!("{base}/build/{}.win", session.project_name),
        ),
        use_shaders: "True".to_string(),
        steam_options: mapped(session, format!("{base}/steam_options.yy")),
        config: session.config_name.clone(),
        config_parents: String::new(),
        output_folder: mapped(session, format!("{base}/build")),
        project_name: session.project_name.clone(),
        macros: mapped(session, format!("{base}/macros.json")),
        project_dir: mapped(session, &session.project_dir),
        preferences: mapped(session, format!("{base}/preferences.yy")),
        project_path: mapped(session, &session.project_path),
        temp_folder: mapped(session, format!("{base}/temp")),
        temp_folder_unmapped: mapped(session, format!("{base}/temp")),
        user_dir: session.user_dir.clone(),
        runtime_location: mapped(
            session,
            format!(
                "{prefix}/drive_c/ProgramData/GameMakerStudio2{}/Cache/Runtimes/{}",
                session.variant_suffix, session.runtime_name
            ),
        ),
        target_options: mapped(session, format!("{base}/targetoptions.json")),
        target_mask: "64".to_string(),
        application_path: mapped(session, &session.gm_exe_path),
        verbose: "False".to_string(),
        steam_ide: "False".to_string(),
        help_port: "51290".to_string(),
        debugger_port: "6509".to_string(),
    }
}

pub fn generate_macros(session: &Session) -> Result<CompilerMacros, BuildError> {
    let runtime_dir = session.runtime_dir();
    let runtime_root = Path::new(&runtime_dir);

    let asset_compiler = discovery::find_file_named(runtime_root, "GMAssetCompiler.exe", None)
        .ok_or(BuildError::MissingRuntimeTool {
            name: "GMAssetCompiler.exe",
        })?;
    let runner = discovery::find_file_named(runtime_root, "Runner.exe", Some("x64")).ok_or(
        BuildError::MissingRuntimeTool {
            name: "Runner.exe",
        },
    )?;
    let x64_runner = discovery::find_file_named(runtime_root, "Runner.exe", Some("x86"))
        .unwrap_or_else(|| runner.clone());

    let prefix = &session.prefix_path;
    Ok(CompilerMacros {
        asset_compiler_cache_directory: mapped(
            session,
            format!("{prefix}/drive_c/users/gmbuild/cache/ide"),
        ),
        project_cache_directory_name: session.project_name.clone(),
        project_name: session.project_name.clone(),
        asset_compiler_path: mapped(session, asset_compiler),
        runner_path: mapped(session, &runner),
        x64_runner_path: mapped(session, x64_runner),
    })
}

/// Create the gmbuild working tree and write the three build documents.
pub fn write_build_documents(session: &Session) -> Result<BuildDocuments, BuildError> {
    let base = gmbuild_dir(session);
    for sub in ["cache", "temp", "build", "cache/ide"] {
        let dir = base.join(sub);
        fs::create_dir_all(&dir).map_err(|source| {
            BuildError::io("creating build directories", dir.clone(), source)
        })?;
    }
    let project_cache = base.join("cache/ide").join(&session.project_name);
    fs::create_dir_all(&project_cache)
        .map_err(|source| BuildError::io("creating project cache", project_cache.clone(), source))?;

    let options = generate_build_options(session);
    let macros = generate_macros(session)?;
    let target_options = TargetOptions::vm();

    write_json(&base.join("build.bff"), &options, "build.bff")?;
    write_json(&base.join("macros.json"), &macros, "macros.json")?;
    write_json(
        &base.join("targetoptions.json"),
        &target_options,
        "targetoptions.json",
    )?;

    let options_path_mapped = mapped(
        session,
        format!("{}/build.bff", base.to_string_lossy()),
    );
    Ok(BuildDocuments {
        gmbuild_dir: base,
        options_path_mapped,
        options,
    })
}

fn write_json<T: Serialize>(
    path: &Path,
    value: &T,
    document: &'static str,
) -> Result<(), BuildError> {
    let content = serde_json::to_string_pretty(value)
        .map_err(|source| BuildError::Serialize { document, source })?;
    fs::write(path, content).map_err(|source| BuildError::io("writing document", path, source))
}

/// Where the compiler options come from for a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildSource {
    /// Documents generated by [`write_build_documents`] this session.
    Generated,
    /// The first `build.bff` already present in the prefix.
    ExistingFile,
}

/// The pair every build source normalizes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBuild {
    pub runtime_name: String,
    /// Passed verbatim to Igor as `-options=<path>`.
    pub options_path: String,
}

static RUNTIME_NAME_TAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"runtime-[0-9.]+$").expect("runtime tail pattern"));

pub fn resolve_build_source(
    source: BuildSource,
    session: &Session,
    documents: Option<&BuildDocuments>,
) -> Result<ResolvedBuild, BuildError> {
    match source {
        BuildSource::Generated => {
            let documents = documents.ok_or(BuildError::NoExistingOptions)?;
            Ok(ResolvedBuild {
                runtime_name: session.runtime_name.clone(),
                options_path: documents.options_path_mapped.clone(),
            })
        }
        BuildSource::ExistingFile => {
            let bff_path =
                discovery::find_file_named(Path::new(&session.prefix_path), "build.bff", None)
                    .ok_or(BuildError::NoExistingOptions)?;

            // Existing files may come from other tools; only the runtime
            // location is read, so a loose parse is deliberate.
            let content =
                fs::read_to_string(&bff_path).map_err(|_| BuildError::UnreadableOptions)?;
            let document: serde_json::Value =
                serde_json::from_str(&content).map_err(|_| BuildError::UnreadableOptions)?;
            let runtime_location = document
                .get("runtimeLocation")
                .and_then(serde_json::Value::as_str)
                .ok_or(BuildError::UnreadableOptions)?;
            let runtime_name = RUNTIME_NAME_TAIL
                .find(runtime_location)
                .map(|m| m.as_str().to_string())
                .ok_or(BuildError::UnreadableOptions)?;

            Ok(ResolvedBuild {
                runtime_name,
                options_path: bff_path,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{
        generate_build_options, resolve_build_source, write_build_documents, BuildError,
        BuildSource,
    };
    use crate::app::Session;

    fn touch(path: &std::path::Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(path, b"").expect("touch");
    }

    fn session_with_prefix(prefix: &str) -> Session {
        let mut session = Session::new("um");
        session.prefix_path = prefix.to_string();
        session.project_name = "game".to_string();
        session.project_dir = "/home/um/dev/game/".to_string();
        session.project_path = "/home/um/dev/game/game.yyp".to_string();
        session.runtime_root = format!("{prefix}/runtimes/");
        session.runtime_name = "runtime-2023.11.1.129".to_string();
        session.runtime_index = Some(0);
        session.drive_letter = 'Z';
        session
    }

    #[test]
    fn build_options_use_the_drive_mapping() {
        let session = session_with_prefix("/home/um/.wine");
        let options = generate_build_options(&session);
        assert!(options
            .compile_output_file_name
            .starts_with("Z:/home/um/.wine/drive_c/users/gmbuild/build/"));
        assert_eq!(options.debug, "false");
        assert_eq!(options.target_mask, "64");
        assert!(options.runtime_location.ends_with("runtime-2023.11.1.129"));
    }

    #[test]
    fn debug_flag_serializes_as_string() {
        let mut session = session_with_prefix("/home/um/.wine");
        session.debug_enabled = true;
        let options = generate_build_options(&session);
        assert_eq!(options.debug, "true");

        let json = serde_json::to_value(&options).expect("serialize");
        assert_eq!(json["debug"], "true");
        assert!(json.get("runtimeLocation").is_some());
        assert!(json.get("SteamIDE").is_some());
    }

    #[test]
    fn write_build_documents_creates_the_tree() {
        let dir = tempfile::tempdir().expect("tempdir");
        let prefix = dir.path().to_string_lossy().into_owned();
        let mut session = session_with_prefix(&prefix);
        session.runtime_root = format!("{prefix}/runtimes/");
        touch(
            &dir.path()
                .join("runtimes/runtime-2023.11.1.129/bin/GMAssetCompiler.exe"),
        );
        touch(
            &dir.path()
                .join("runtimes/runtime-2023.11.1.129/windows/x86/Runner.exe"),
        );
        touch(
            &dir.path()
                .join("runtimes/runtime-2023.11.1.129/windows/x64/Runner.exe"),
        );

        let documents = write_build_documents(&session).expect("documents");
        assert!(documents.gmbuild_dir.join("build.bff").exists());
        assert!(documents.gmbuild_dir.join("macros.json").exists());
        assert!(documents.gmbuild_dir.join("targetoptions.json").exists());
        assert!(documents.options_path_mapped.starts_with("Z:"));

        let macros_json = fs::read_to_string(documents.gmbuild_dir.join("macros.json"))
            .expect("macros readable");
        assert!(macros_json.contains("x86/Runner.exe"));
        assert!(macros_json.contains("x64/Runner.exe"));
    }

    #[test]
    fn missing_runtime_tools_fail_generation() {
        let dir = tempfile::tempdir().expect("tempdir");
        let prefix = dir.path().to_string_lossy().into_owned();
        let session = session_with_prefix(&prefix);

        let err = write_build_documents(&session).expect_err("must fail");
        assert!(matches!(err, BuildError::MissingRuntimeTool { .. }));
    }

    #[test]
    fn existing_source_recovers_runtime_from_the_options_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let prefix = dir.path().to_string_lossy().into_owned();
        let mut session = session_with_prefix(&prefix);
        session.runtime_name = "runtime-9.9.9".to_string();

        let options = generate_build_options(&session);
        let bff_dir = dir.path().join("drive_c/users/gmbuild");
        fs::create_dir_all(&bff_dir).expect("mkdir");
        fs::write(
            bff_dir.join("build.bff"),
            serde_json::to_string(&options).expect("serialize"),
        )
        .expect("write");

        let resolved = resolve_build_source(BuildSource::ExistingFile, &session, None)
            .expect("resolved");
        assert_eq!(resolved.runtime_name, "runtime-9.9.9");
        assert!(resolved.options_path.ends_with("build.bff"));
    }

    #[test]
    fn existing_source_without_a_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let prefix = dir.path().to_string_lossy().into_owned();
        let session = session_with_prefix(&prefix);

        let err = resolve_build_source(BuildSource::ExistingFile, &session, None)
            .expect_err("must fail");
        assert!(matches!(err, BuildError::NoExistingOptions));
    }

    #[test]
    fn malformed_existing_options_are_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let prefix = dir.path().to_string_lossy().into_owned();
        let session = session_with_prefix(&prefix);

        let bff_dir = dir.path().join("drive_c/users/gmbuild");
        fs::create_dir_all(&bff_dir).expect("mkdir");
        fs::write(bff_dir.join("build.bff"), "{ not json").expect("write");

        let err = resolve_build_source(BuildSource::ExistingFile, &session, None)
            .expect_err("must fail");
        assert!(matches!(err, BuildError::UnreadableOptions));
    }
}
