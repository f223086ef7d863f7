use crate::error::{AppError, Result};
use ignore::{WalkBuilder, WalkState};
use rayon::prelude::*;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc;

const BINARY_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".bmp", ".ico", ".svg", ".pdf", ".zip", ".tar", ".gz", ".7z",
    ".rar", ".exe", ".dll", ".so", ".dylib", ".mp3", ".mp4", ".avi", ".mov", ".wav", ".doc",
    ".docx", ".xls", ".xlsx", ".ppt", ".pptx",
];

/// Where a file's text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryContent {
    /// Directory, or a file whose content is unavailable.
    Empty,
    Text(String),
    /// Read on demand from this absolute path.
    Deferred(PathBuf),
}

/// One item of a flat directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSystemEntry {
    pub relative_path: String,
    pub is_directory: bool,
    pub size: u64,
    pub content: EntryContent,
}

impl FileSystemEntry {
    pub fn directory(relative_path: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            is_directory: true,
            size: 0,
            content: EntryContent::Empty,
        }
    }

    pub fn text(relative_path: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            relative_path: relative_path.into(),
            is_directory: false,
            size: content.len() as u64,
            content: EntryContent::Text(content),
        }
    }

    pub fn deferred(relative_path: impl Into<String>, size: u64, source: PathBuf) -> Self {
        Self {
            relative_path: relative_path.into(),
            is_directory: false,
            size,
            content: EntryContent::Deferred(source),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentMode {
    /// Read every text file during the walk.
    #[default]
    Eager,
    /// Only record where to read each file from.
    Deferred,
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub use_gitignore: bool,
    pub include_hidden: bool,
    pub content: ContentMode,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            use_gitignore: false,
            include_hidden: true,
            content: ContentMode::Eager,
        }
    }
}

pub fn is_binary_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    BINARY_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Reads a file as UTF-8 text.
pub fn read_text_file(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| AppError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    String::from_utf8(bytes).map_err(|_| AppError::NotText {
        path: path.to_path_buf(),
    })
}

/// Like [`read_text_file`], refusing files larger than `limit` bytes
/// before reading them.
pub fn read_text_file_limited(path: &Path, limit: u64) -> Result<String> {
    let size = fs::metadata(path)
        .map_err(|e| AppError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?
        .len();
    if size > limit {
        return Err(AppError::FileTooLarge {
            path: path.to_path_buf(),
            size,
            limit,
        });
    }
    read_text_file(path)
}

/// Turns a platform path into the slash separated form used as node ids.
pub fn to_slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Cleans a user supplied relative path: backslashes, `./` and leading
/// slashes are dropped.
pub fn normalize_relative_path(raw: &str) -> String {
    raw.replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// The path a listed entry is known by in the tree. `None` for empty paths
/// and paths with a `..` segment.
pub fn tree_key(raw: &str) -> Option<String> {
    let key = normalize_relative_path(raw);
    if key.is_empty() || key.split('/').any(|segment| segment == "..") {
        return None;
    }
    Some(key)
}

#[derive(Debug)]
struct WalkedPath {
    path: PathBuf,
    relative_path: String,
    is_dir: bool,
    size: u64,
}

/// Recursively walks `project_root` into a flat listing.
pub fn scan_directory(project_root: &Path, options: &ScanOptions) -> Result<Vec<FileSystemEntry>> {
    if !project_root.is_dir() {
        return Err(AppError::Input(format!(
            "Project root is not a directory: {}",
            project_root.display()
        )));
    }

    let mut builder = WalkBuilder::new(project_root);
    builder.threads(rayon::current_num_threads().min(12));
    builder.hidden(!options.include_hidden);
    builder.ignore(options.use_gitignore);
    builder.git_ignore(options.use_gitignore);
    builder.git_exclude(options.use_gitignore);
    builder.git_global(options.use_gitignore);
    builder.parents(options.use_gitignore);
    builder.require_git(false);
    log::debug!(
        "WalkBuilder configured (gitignore: {}, hidden: {})",
        options.use_gitignore,
        options.include_hidden
    );

    let walker = builder.build_parallel();
    let root_clone = project_root.to_path_buf();
    let (tx_walked, rx_walked) = mpsc::channel::<WalkedPath>();
    let tx_for_closure = tx_walked.clone();

    log::info!("Walking project directory: {}", project_root.display());
    walker.run(move || {
        let tx_thread = tx_for_closure.clone();
        let root = root_clone.clone();

        Box::new(move |entry_result| {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Skipping unreadable path: {}", e);
                    return WalkState::Continue;
                }
            };
            if entry.depth() == 0 {
                return WalkState::Continue;
            }
            let path = entry.path();
            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) => {
                    log::warn!("Skipping {}: {}", path.display(), e);
                    return WalkState::Continue;
                }
            };
            let Some(relative) = pathdiff::diff_paths(path, &root) else {
                log::warn!("Could not get relative path for: {}", path.display());
                return WalkState::Continue;
            };
            let walked = WalkedPath {
                path: path.to_path_buf(),
                relative_path: to_slash_path(&relative),
                is_dir: metadata.is_dir(),
                size: if metadata.is_dir() { 0 } else { metadata.len() },
            };
            log::trace!("Walked path: {}", walked.relative_path);
            if tx_thread.send(walked).is_err() {
                log::error!("Receiver dropped for walked paths, stopping walk early.");
                return WalkState::Quit;
            }
            WalkState::Continue
        })
    });
    drop(tx_walked);

    let walked: Vec<WalkedPath> = rx_walked.into_iter().collect();
    log::info!("Directory walk complete. Found {} paths.", walked.len());

    let mut entries: Vec<FileSystemEntry> = walked
        .into_par_iter()
        .map(|w| into_entry(w, options.content))
        .collect();
    entries.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(entries)
}

fn into_entry(walked: WalkedPath, mode: ContentMode) -> FileSystemEntry {
    if walked.is_dir {
        return FileSystemEntry::directory(walked.relative_path);
    }
    let name = walked
        .relative_path
        .rsplit('/')
        .next()
        .unwrap_or(&walked.relative_path);
    let content = if is_binary_name(name) {
        log::trace!("Not reading binary file: {}", walked.relative_path);
        EntryContent::Empty
    } else {
        match mode {
            ContentMode::Deferred => EntryContent::Deferred(walked.path),
            ContentMode::Eager => match read_text_file(&walked.path) {
                Ok(text) => EntryContent::Text(text),
                Err(e) => {
                    log::warn!("Could not read {}: {}", walked.relative_path, e);
                    EntryContent::Empty
                }
            },
        }
    };
    FileSystemEntry {
        relative_path: walked.relative_path,
        is_directory: false,
        size: walked.size,
        content,
    }
}

/// Builds a listing from user supplied relative paths, the shape a
/// directory picker hands over. Content is always deferred.
pub fn entries_from_listing(project_root: &Path, relative_paths: &[String]) -> Vec<FileSystemEntry> {
    let mut entries = Vec::with_capacity(relative_paths.len());
    for raw in relative_paths {
        let Some(relative_path) = tree_key(raw.trim()) else {
            if !raw.trim().is_empty() {
                log::warn!("Skipping listed path outside the project: {}", raw);
            }
            continue;
        };
        let absolute = project_root.join(&relative_path);
        match fs::metadata(&absolute) {
            Ok(metadata) if metadata.is_dir() => {
                entries.push(FileSystemEntry::directory(relative_path));
            }
            Ok(metadata) => {
                let content = if is_binary_name(&relative_path) {
                    EntryContent::Empty
                } else {
                    EntryContent::Deferred(absolute)
                };
                entries.push(FileSystemEntry {
                    relative_path,
                    is_directory: false,
                    size: metadata.len(),
                    content,
                });
            }
            Err(e) => {
                log::warn!("Skipping listed path {}: {}", relative_path, e);
            }
        }
    }
    log::debug!("Listing produced {} entries.", entries.len());
    entries
}
