//! Request/response boundary for scanning, reading one file and generating
//! a bundle. Every operation returns a serializable payload or an
//! [`ApiError`] carrying an HTTP-equivalent status.

use crate::bundle::{self, BundleOptions, SkippedFile, resolve_relative};
use crate::entries::{self, ScanOptions};
use crate::error::AppError;
use crate::lines::count_lines;
use crate::matcher::PathMatcher;
use crate::selection::SelectionStats;
use crate::session::ProjectSession;
use crate::tree::ProjectTree;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{message} (status {status})")]
pub struct ApiError {
    pub status: u16,
    #[serde(rename = "error")]
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: 400,
            message: message.into(),
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self {
            status: err.status_code(),
            message: err.to_string(),
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    #[serde(default)]
    pub root_path: String,
    /// Flat listing of relative file paths. When absent the root is walked.
    #[serde(default)]
    pub paths: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub tree: ProjectTree,
    pub root_path: String,
    /// Figures for the default selection.
    pub stats: SelectionStats,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRequest {
    #[serde(default)]
    pub root_path: String,
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResponse {
    pub path: String,
    pub content: String,
    pub line_count: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleRequest {
    #[serde(default)]
    pub root_path: String,
    #[serde(default)]
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleResponse {
    pub bundle: String,
    pub total_files: usize,
    pub total_lines: usize,
    pub bundle_size: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedFile>,
}

fn require_root(root_path: &str, what: &str) -> ApiResult<PathBuf> {
    let trimmed = root_path.trim();
    if trimmed.is_empty() {
        return Err(ApiError::bad_request(format!("{} is required", what)));
    }
    Ok(PathBuf::from(trimmed))
}

pub fn scan(
    request: &ScanRequest,
    matcher: &PathMatcher,
    options: &ScanOptions,
) -> ApiResult<ScanResponse> {
    let root = require_root(&request.root_path, "Root path")?;
    let listing = match &request.paths {
        Some(paths) => {
            if !root.is_dir() {
                return Err(AppError::Input(format!(
                    "Project root is not a directory: {}",
                    root.display()
                ))
                .into());
            }
            entries::entries_from_listing(&root, paths)
        }
        None => entries::scan_directory(&root, options)?,
    };

    let mut session = ProjectSession::new();
    session.load_and_hydrate(&listing, matcher);
    let stats = session.selection().stats(session.tree());
    Ok(ScanResponse {
        tree: session.tree().clone(),
        root_path: request.root_path.trim().to_string(),
        stats,
    })
}

pub fn file_content(request: &FileRequest) -> ApiResult<FileResponse> {
    let root = require_root(&request.root_path, "Root path")?;
    if request.path.trim().is_empty() {
        return Err(ApiError::bad_request("File path is required"));
    }
    let relative = resolve_relative(&root, &request.path).ok_or_else(|| {
        ApiError::bad_request(format!("Path is outside the project root: {}", request.path))
    })?;
    let content = entries::read_text_file(&Path::new(&root).join(&relative))?;
    Ok(FileResponse {
        line_count: count_lines(&content),
        path: relative,
        content,
    })
}

pub fn generate_bundle(request: &BundleRequest, options: &BundleOptions) -> ApiResult<BundleResponse> {
    if request.files.is_empty() {
        return Err(ApiError::bad_request("No files selected"));
    }
    let root = require_root(&request.root_path, "Project root")?;
    let generated = bundle::generate_bundle(&root, &request.files, options)?;
    let size = generated.bundle.size();
    Ok(BundleResponse {
        total_files: generated.bundle.total_files,
        total_lines: generated.bundle.total_lines,
        bundle_size: size,
        bundle: generated.bundle.text,
        skipped: generated.skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("node_modules/lib")).unwrap();
        fs::write(root.join("README.md"), "# Hi").unwrap();
        fs::write(root.join("src/index.js"), "console.log(1)").unwrap();
        fs::write(root.join("node_modules/lib/a.js"), "a").unwrap();
        dir
    }

    fn root_of(dir: &tempfile::TempDir) -> String {
        dir.path().to_string_lossy().into_owned()
    }

    #[test]
    fn missing_inputs_are_bad_requests() {
        let matcher = PathMatcher::builtin().unwrap();
        let err = scan(&ScanRequest::default(), &matcher, &ScanOptions::default()).unwrap_err();
        assert_eq!(err, ApiError::bad_request("Root path is required"));

        let err = file_content(&FileRequest {
            root_path: "/tmp".into(),
            path: " ".into(),
        })
        .unwrap_err();
        assert_eq!(err.status, 400);

        let err = generate_bundle(&BundleRequest::default(), &BundleOptions::default()).unwrap_err();
        assert_eq!(err.message, "No files selected");
    }

    #[test]
    fn scan_returns_tree_and_default_stats() {
        let dir = project();
        let response = scan(
            &ScanRequest {
                root_path: root_of(&dir),
                paths: None,
            },
            &PathMatcher::builtin().unwrap(),
            &ScanOptions::default(),
        )
        .unwrap();
        let nm = response.tree.find("node_modules").unwrap();
        assert!(nm.is_excluded_effective);
        assert_eq!(response.stats.selected_files, 2);
        assert_eq!(response.stats.selected_lines, 2);

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("rootPath").is_some());
        assert_eq!(json["tree"][0]["name"], "node_modules");
        assert_eq!(json["tree"][0]["isExcludedEffective"], true);
    }

    #[test]
    fn listing_scan_hydrates_line_counts() {
        let dir = project();
        let response = scan(
            &ScanRequest {
                root_path: root_of(&dir),
                paths: Some(vec!["src/index.js".into(), "README.md".into()]),
            },
            &PathMatcher::builtin().unwrap(),
            &ScanOptions::default(),
        )
        .unwrap();
        assert_eq!(response.tree.find("src/index.js").unwrap().line_count, 1);
        assert_eq!(response.stats.total_files, 2);
    }

    #[test]
    fn scanning_a_missing_directory_is_a_bad_request() {
        let dir = project();
        let err = scan(
            &ScanRequest {
                root_path: dir.path().join("absent").to_string_lossy().into_owned(),
                paths: None,
            },
            &PathMatcher::builtin().unwrap(),
            &ScanOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.status, 400);
    }

    #[test]
    fn file_content_reads_inside_the_root_only() {
        let dir = project();
        let response = file_content(&FileRequest {
            root_path: root_of(&dir),
            path: "src/index.js".into(),
        })
        .unwrap();
        assert_eq!(response.content, "console.log(1)");

        let err = file_content(&FileRequest {
            root_path: root_of(&dir),
            path: "../secret".into(),
        })
        .unwrap_err();
        assert_eq!(err.status, 400);

        let err = file_content(&FileRequest {
            root_path: root_of(&dir),
            path: "missing.txt".into(),
        })
        .unwrap_err();
        assert_eq!(err.status, 500);
    }

    #[test]
    fn bundle_response_uses_camel_case_totals() {
        let dir = project();
        let response = generate_bundle(
            &BundleRequest {
                root_path: root_of(&dir),
                files: vec!["README.md".into(), "src/index.js".into()],
            },
            &BundleOptions::default(),
        )
        .unwrap();
        assert!(response.bundle.contains("Total files: 2, Total lines: 2"));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["totalFiles"], 2);
        assert_eq!(json["totalLines"], 2);
        assert_eq!(json["bundleSize"], response.bundle.len());
        assert!(json.get("skipped").is_none());
    }

    #[test]
    fn requests_deserialize_from_camel_case() {
        let request: BundleRequest =
            serde_json::from_str(r#"{"rootPath":"/p","files":["a.rs"]}"#).unwrap();
        assert_eq!(request.root_path, "/p");
        assert_eq!(request.files, vec!["a.rs".to_string()]);
    }
}
