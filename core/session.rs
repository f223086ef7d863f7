//! A loaded project: its tree, the current selection, and the
//! generation-tagged line-count hydration of deferred files.

use crate::entries::{EntryContent, FileSystemEntry, read_text_file, tree_key};
use crate::error::Result;
use crate::lines::count_lines;
use crate::matcher::PathMatcher;
use crate::selection::SelectionModel;
use crate::tree::ProjectTree;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Reads every deferred file of one load. Carries the generation that
/// issued it so late results can be told apart from current ones.
#[derive(Debug, Clone)]
pub struct HydrationJob {
    generation: u64,
    targets: Vec<(String, PathBuf)>,
}

#[derive(Debug, Clone, Default)]
pub struct HydrationResult {
    pub generation: u64,
    pub counts: HashMap<String, usize>,
    /// `(relative path, reason)` for every read that failed.
    pub failures: Vec<(String, String)>,
}

impl HydrationJob {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn run(self) -> HydrationResult {
        self.run_with(read_text_file)
    }

    /// Reads all targets on the rayon pool. Every read settles on its own;
    /// a failure only leaves that file's provisional count in place.
    pub fn run_with<F>(self, reader: F) -> HydrationResult
    where
        F: Fn(&Path) -> Result<String> + Sync,
    {
        log::debug!(
            "Hydrating {} deferred files (generation {})",
            self.targets.len(),
            self.generation
        );
        let outcomes: Vec<(String, std::result::Result<usize, String>)> = self
            .targets
            .into_par_iter()
            .map(|(relative, source)| {
                let outcome = reader(&source)
                    .map(|text| count_lines(&text))
                    .map_err(|e| e.to_string());
                (relative, outcome)
            })
            .collect();

        let mut result = HydrationResult {
            generation: self.generation,
            ..HydrationResult::default()
        };
        for (relative, outcome) in outcomes {
            match outcome {
                Ok(lines) => {
                    result.counts.insert(relative, lines);
                }
                Err(reason) => {
                    log::warn!("Could not count lines of {}: {}", relative, reason);
                    result.failures.push((relative, reason));
                }
            }
        }
        result
    }
}

#[derive(Debug, Default)]
pub struct ProjectSession {
    generation: u64,
    tree: ProjectTree,
    selection: SelectionModel,
}

impl ProjectSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn tree(&self) -> &ProjectTree {
        &self.tree
    }

    pub fn selection(&self) -> &SelectionModel {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: SelectionModel) {
        self.selection = selection;
    }

    /// Replaces the tree and resets the selection to the default. Returns
    /// the job that will refine provisional line counts for this load.
    pub fn load(&mut self, entries: &[FileSystemEntry], matcher: &PathMatcher) -> HydrationJob {
        self.generation += 1;
        self.tree = ProjectTree::build(entries, matcher);
        self.selection = SelectionModel::with_default_selection(&self.tree);

        let targets = entries
            .iter()
            .filter(|e| !e.is_directory)
            .filter_map(|e| match &e.content {
                EntryContent::Deferred(source) => {
                    tree_key(&e.relative_path).map(|key| (key, source.clone()))
                }
                _ => None,
            })
            .collect();
        log::info!(
            "Loaded project (generation {}): {} files selected by default",
            self.generation,
            self.selection.selected().len()
        );
        HydrationJob {
            generation: self.generation,
            targets,
        }
    }

    /// Applies counts from a finished job. Returns false, changing nothing,
    /// when the job belongs to an earlier load.
    pub fn apply_hydration(&mut self, result: &HydrationResult) -> bool {
        if result.generation != self.generation {
            log::debug!(
                "Discarding stale hydration (generation {}, current {})",
                result.generation,
                self.generation
            );
            return false;
        }
        let updated = self.tree.apply_line_counts(&result.counts);
        log::debug!("Hydration updated {} line counts", updated);
        true
    }

    /// Loads and hydrates in one call.
    pub fn load_and_hydrate(&mut self, entries: &[FileSystemEntry], matcher: &PathMatcher) {
        let job = self.load(entries, matcher);
        if job.is_empty() {
            return;
        }
        let result = job.run();
        self.apply_hydration(&result);
    }
}
