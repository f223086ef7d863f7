//! The bundle text format: encoding, decoding and generation from disk.

use crate::entries::{is_binary_name, normalize_relative_path, read_text_file_limited, to_slash_path};
use crate::error::{AppError, Result};
use crate::lines::count_lines;
use rayon::prelude::*;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

pub const BUNDLE_TITLE: &str = "PROJECT BUNDLE FOR AI ANALYSIS";
pub const SEPARATOR: &str = "==============================";
const DESCRIPTION: [&str; 3] = [
    "This file contains multiple project files separated by file headers.",
    "Each file is prefixed with \"##### FILE: [relative_path] #####\"",
    "Files are separated by \"##### END FILE #####\"",
];
const FILE_MARKER_PREFIX: &str = "##### FILE: ";
const FILE_MARKER_SUFFIX: &str = " #####";
pub const END_FILE_MARKER: &str = "##### END FILE #####";
const TOTALS_PREFIX: &str = "Total files: ";

pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleFile {
    pub path: String,
    pub content: String,
}

impl BundleFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

pub fn file_marker(path: &str) -> String {
    format!("{}{}{}", FILE_MARKER_PREFIX, path, FILE_MARKER_SUFFIX)
}

pub fn totals_line(total_files: usize, total_lines: usize) -> String {
    format!("{}{}, Total lines: {}", TOTALS_PREFIX, total_files, total_lines)
}

/// An encoded bundle and its totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub text: String,
    pub paths: Vec<String>,
    pub total_files: usize,
    pub total_lines: usize,
}

impl Bundle {
    pub fn encode(files: &[BundleFile]) -> Self {
        let total_lines: usize = files.iter().map(|f| count_lines(&f.content)).sum();
        let totals = totals_line(files.len(), total_lines);

        let mut parts: Vec<&str> = Vec::with_capacity(8 + files.len() * 4);
        parts.push(BUNDLE_TITLE);
        parts.push(SEPARATOR);
        parts.extend(DESCRIPTION);
        parts.push(&totals);
        parts.push(SEPARATOR);
        parts.push("");

        let markers: Vec<String> = files.iter().map(|f| file_marker(&f.path)).collect();
        for (file, marker) in files.iter().zip(&markers) {
            parts.push(marker);
            parts.push(&file.content);
            parts.push(END_FILE_MARKER);
            parts.push("");
        }

        Self {
            text: parts.join("\n"),
            paths: files.iter().map(|f| f.path.clone()).collect(),
            total_files: files.len(),
            total_lines,
        }
    }

    pub fn size(&self) -> usize {
        self.text.len()
    }
}

/// Encodes `files` in the given order.
pub fn encode(files: &[BundleFile]) -> String {
    Bundle::encode(files).text
}

/// Drops the first line of `content` when it is nothing but a comment
/// naming the file itself, as left behind by earlier bundling.
pub fn strip_path_comment<'a>(content: &'a str, path: &str) -> Cow<'a, str> {
    if content.is_empty() || path.is_empty() {
        return Cow::Borrowed(content);
    }
    let (first, rest) = match content.split_once('\n') {
        Some((first, rest)) => (first, rest),
        None => (content, ""),
    };
    let first = first.trim();
    if first.is_empty() {
        return Cow::Borrowed(content);
    }

    if path_variants(path).iter().any(|v| is_comment_of(first, v)) {
        log::trace!("Stripped path comment from {}", path);
        Cow::Borrowed(rest)
    } else {
        Cow::Borrowed(content)
    }
}

fn path_variants(path: &str) -> Vec<&str> {
    let mut variants = vec![path];
    if let Some(stripped) = path.strip_prefix('/') {
        variants.push(stripped);
    }
    if let Some((_, without_root)) = path.split_once('/') {
        variants.push(without_root);
    }
    if let Some(name) = path.rsplit('/').next() {
        variants.push(name);
    }
    variants.retain(|v| !v.is_empty());
    variants
}

fn is_comment_of(line: &str, variant: &str) -> bool {
    const WRAPPERS: [(&str, &str); 6] = [
        ("// ", ""),
        ("//", ""),
        ("# ", ""),
        ("#", ""),
        ("<!-- ", " -->"),
        ("<!--", "-->"),
    ];
    WRAPPERS.iter().any(|(open, close)| {
        line.strip_prefix(open)
            .and_then(|inner| inner.strip_suffix(close))
            == Some(variant)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BundleOptions {
    pub max_file_size: u64,
    pub strip_path_comments: bool,
}

impl Default for BundleOptions {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            strip_path_comments: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum SkipReason {
    NotFound,
    Directory,
    OutsideRoot,
    Binary,
    NotText,
    TooLarge { size: u64, limit: u64 },
    Unreadable { message: String },
}

impl SkipReason {
    /// Classifies a failed content read.
    pub fn from_read_error(err: AppError) -> Self {
        match err {
            AppError::FileTooLarge { size, limit, .. } => SkipReason::TooLarge { size, limit },
            AppError::NotText { .. } => SkipReason::NotText,
            AppError::FileRead { source, .. } if source.kind() == ErrorKind::NotFound => {
                SkipReason::NotFound
            }
            other => SkipReason::Unreadable {
                message: other.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedBundle {
    pub bundle: Bundle,
    pub skipped: Vec<SkippedFile>,
}

/// Reads the selected files under `project_root` and encodes them in the
/// given order. Files that cannot be embedded are skipped and reported.
pub fn generate_bundle(
    project_root: &Path,
    selected: &[String],
    options: &BundleOptions,
) -> Result<GeneratedBundle> {
    if selected.is_empty() {
        return Err(AppError::Input("No files selected".to_string()));
    }
    if !project_root.is_dir() {
        return Err(AppError::Input(format!(
            "Project root is not a directory: {}",
            project_root.display()
        )));
    }

    let mut seen = HashSet::new();
    let requested: Vec<&String> = selected.iter().filter(|p| seen.insert(p.as_str())).collect();
    log::debug!("Generating bundle from {} selected paths", requested.len());

    let outcomes: Vec<Result<BundleFile, SkippedFile>> = requested
        .par_iter()
        .map(|raw| load_bundle_file(project_root, raw, options))
        .collect();

    let mut files = Vec::with_capacity(outcomes.len());
    let mut skipped = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(file) => files.push(file),
            Err(skip) => {
                log::info!("Skipping {}: {:?}", skip.path, skip.reason);
                skipped.push(skip);
            }
        }
    }

    let bundle = Bundle::encode(&files);
    log::info!(
        "Bundle generated: {} files, {} lines, {} bytes ({} skipped)",
        bundle.total_files,
        bundle.total_lines,
        bundle.size(),
        skipped.len()
    );
    Ok(GeneratedBundle { bundle, skipped })
}

fn load_bundle_file(
    project_root: &Path,
    raw: &str,
    options: &BundleOptions,
) -> Result<BundleFile, SkippedFile> {
    let skip = |path: &str, reason| SkippedFile {
        path: path.to_string(),
        reason,
    };

    let Some(relative) = resolve_relative(project_root, raw) else {
        return Err(skip(raw, SkipReason::OutsideRoot));
    };
    let absolute = project_root.join(&relative);

    let metadata = match fs::metadata(&absolute) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(skip(&relative, SkipReason::NotFound));
        }
        Err(e) => {
            return Err(skip(&relative, SkipReason::Unreadable { message: e.to_string() }));
        }
    };
    if metadata.is_dir() {
        return Err(skip(&relative, SkipReason::Directory));
    }
    if is_binary_name(&relative) {
        return Err(skip(&relative, SkipReason::Binary));
    }

    let content = read_text_file_limited(&absolute, options.max_file_size)
        .map_err(|e| skip(&relative, SkipReason::from_read_error(e)))?;
    let content = if options.strip_path_comments {
        strip_path_comment(&content, &relative).into_owned()
    } else {
        content
    };
    Ok(BundleFile {
        path: relative,
        content,
    })
}

/// Root relative, slash separated form of `raw`, or `None` if it points
/// outside the root.
pub(crate) fn resolve_relative(project_root: &Path, raw: &str) -> Option<String> {
    let raw = raw.trim();
    let as_path = Path::new(raw);
    let relative = if as_path.is_absolute() {
        let stripped = as_path.strip_prefix(project_root).ok()?;
        to_slash_path(stripped)
    } else {
        normalize_relative_path(raw)
    };
    if relative.is_empty() || relative.split('/').any(|segment| segment == "..") {
        return None;
    }
    Some(relative)
}

/// Files and totals recovered from bundle text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecodedBundle {
    pub total_files: Option<usize>,
    pub total_lines: Option<usize>,
    pub files: Vec<BundleFile>,
}

/// Splits bundle text back into its files. A content line equal to the
/// end marker cannot be told apart from the marker itself.
pub fn decode(text: &str) -> Result<DecodedBundle> {
    let mut decoded = DecodedBundle::default();
    let mut lines = text.split('\n').enumerate().peekable();

    while let Some((_, line)) = lines.next_if(|(_, l)| parse_file_marker(l).is_none()) {
        if let Some(totals) = line.strip_prefix(TOTALS_PREFIX) {
            let (files, line_total) = parse_totals(totals);
            decoded.total_files = files;
            decoded.total_lines = line_total;
        }
    }

    while let Some((index, line)) = lines.next() {
        let Some(path) = parse_file_marker(line) else {
            if line.is_empty() {
                continue;
            }
            return Err(AppError::BundleFormat {
                line: index + 1,
                message: format!("expected a file marker, found {:?}", line),
            });
        };

        let mut body: Vec<&str> = Vec::new();
        let mut closed = false;
        for (_, content_line) in lines.by_ref() {
            if content_line == END_FILE_MARKER {
                closed = true;
                break;
            }
            body.push(content_line);
        }
        if !closed {
            return Err(AppError::BundleFormat {
                line: index + 1,
                message: format!("file {} has no end marker", path),
            });
        }
        decoded.files.push(BundleFile::new(path, body.join("\n")));
    }

    log::debug!("Decoded {} files from bundle", decoded.files.len());
    Ok(decoded)
}

fn parse_file_marker(line: &str) -> Option<&str> {
    line.strip_prefix(FILE_MARKER_PREFIX)?
        .strip_suffix(FILE_MARKER_SUFFIX)
}

fn parse_totals(rest: &str) -> (Option<usize>, Option<usize>) {
    let Some((files, lines)) = rest.split_once(", Total lines: ") else {
        return (rest.trim().parse().ok(), None);
    };
    (files.trim().parse().ok(), lines.trim().parse().ok())
}

/// Figures for an existing bundle text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleStats {
    pub files: usize,
    pub lines: usize,
    pub bytes: usize,
}

impl BundleStats {
    pub fn from_text(text: &str) -> Self {
        Self {
            files: text
                .split('\n')
                .filter(|l| parse_file_marker(l).is_some())
                .count(),
            lines: count_lines(text),
            bytes: text.len(),
        }
    }
}
