use crate::error::{AppError, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use crate::output_formats::get_default_exclusion_tables;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Name tables that decide default exclusion.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExclusionTables {
    #[serde(default)]
    pub folders: Vec<String>,
    #[serde(default)]
    pub files: Vec<String>,
}

impl ExclusionTables {
    pub fn builtin() -> Self {
        get_default_exclusion_tables().clone()
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone)]
enum FilePattern {
    /// Whole-name or suffix match.
    Literal(String),
    Glob(Regex),
}

/// Decides whether a single path segment is excluded by default.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    folders: Vec<String>,
    files: Vec<FilePattern>,
}

impl PathMatcher {
    pub fn new(tables: &ExclusionTables) -> Result<Self> {
        let folders = tables
            .folders
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .map(String::from)
            .collect();

        let mut files = Vec::with_capacity(tables.files.len());
        for pattern in &tables.files {
            let pattern = pattern.trim();
            if pattern.is_empty() {
                continue;
            }
            if pattern.contains('*') {
                let regex = glob_to_regex(pattern)?;
                log::trace!("File glob '{}' compiled to /{}/", pattern, regex.as_str());
                files.push(FilePattern::Glob(regex));
            } else {
                files.push(FilePattern::Literal(pattern.to_string()));
            }
        }
        Ok(Self { folders, files })
    }

    pub fn builtin() -> Result<Self> {
        Self::new(&ExclusionTables::builtin())
    }

    /// A matcher that excludes nothing.
    pub fn disabled() -> Self {
        Self {
            folders: Vec::new(),
            files: Vec::new(),
        }
    }

    pub fn is_excluded_by_default(&self, name: &str, is_directory: bool) -> bool {
        if is_directory {
            self.folders
                .iter()
                .any(|folder| name == folder || name.contains(folder.as_str()))
        } else {
            self.files.iter().any(|pattern| match pattern {
                FilePattern::Literal(literal) => name == literal || name.ends_with(literal.as_str()),
                FilePattern::Glob(regex) => regex.is_match(name),
            })
        }
    }
}

fn glob_to_regex(pattern: &str) -> Result<Regex> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Ok(Regex::new(&format!("^{}$", body))?)
}

/// Compiles path globs such as `src/**/*.rs` for bulk selection. A
/// pattern without a slash matches at any depth.
pub fn compile_globs<S: AsRef<str>>(patterns: &[S]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = pattern.as_ref().trim();
        if pattern.is_empty() {
            continue;
        }
        let pattern = if pattern.contains('/') {
            pattern.to_string()
        } else {
            format!("**/{}", pattern)
        };
        let glob = GlobBuilder::new(&pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| AppError::Glob(format!("Invalid glob '{}': {}", pattern, e)))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
