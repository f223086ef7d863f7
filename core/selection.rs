//! Selection state over a [`ProjectTree`].
//!
//! [`SelectionModel`] is a plain value. Every reducer takes `&self` and
//! returns the next model, so callers decide when a new state replaces the
//! old one and nothing is shared behind their back.

use crate::error::{AppError, Result};
use crate::tree::{ProjectTree, TreeNode, ancestor_paths};
use globset::GlobSet;
use serde::Serialize;
use std::collections::BTreeSet;

/// Aggregate selection of a folder's unblocked files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TriState {
    None,
    Partial,
    All,
}

/// What a toggle reducer did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionAction {
    /// The node was blocked; it is now forced and the selection is unchanged.
    Forced,
    Selected,
    Deselected,
    /// A folder toggle selected this many files.
    FolderSelected(usize),
    /// A folder toggle cleared this many files.
    FolderCleared(usize),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionModel {
    selected: BTreeSet<String>,
    forced: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionStats {
    pub total_files: usize,
    pub total_lines: usize,
    pub selected_files: usize,
    pub selected_lines: usize,
}

/// Every file that is not excluded, effective exclusion included.
pub fn default_selection(tree: &ProjectTree) -> BTreeSet<String> {
    tree.files()
        .filter(|n| !n.is_excluded_effective)
        .map(|n| n.path.clone())
        .collect()
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_selection(tree: &ProjectTree) -> Self {
        let selected = default_selection(tree);
        log::debug!("Default selection: {} files", selected.len());
        Self {
            selected,
            forced: BTreeSet::new(),
        }
    }

    pub fn from_parts(selected: BTreeSet<String>, forced: BTreeSet<String>) -> Self {
        Self { selected, forced }
    }

    pub fn selected(&self) -> &BTreeSet<String> {
        &self.selected
    }

    pub fn forced(&self) -> &BTreeSet<String> {
        &self.forced
    }

    pub fn is_selected(&self, path: &str) -> bool {
        self.selected.contains(path)
    }

    pub fn is_forced(&self, path: &str) -> bool {
        self.forced.contains(path)
    }

    pub fn is_blocked(&self, node: &TreeNode) -> bool {
        node.is_excluded_effective && !self.forced.contains(&node.path)
    }

    /// Forces `node`, every ancestor, and for directories every current
    /// descendant.
    pub fn force_node(&self, node: &TreeNode) -> Self {
        let mut next = self.clone();
        next.forced.insert(node.path.clone());
        for ancestor in ancestor_paths(&node.path) {
            next.forced.insert(ancestor.to_string());
        }
        if node.is_directory {
            for descendant in node.descendants().skip(1) {
                next.forced.insert(descendant.path.clone());
            }
        }
        log::trace!("Forced {} ({} forced paths)", node.path, next.forced.len());
        next
    }

    pub fn toggle_file(&self, node: &TreeNode) -> (Self, SelectionAction) {
        if self.is_blocked(node) {
            return (self.force_node(node), SelectionAction::Forced);
        }
        let mut next = self.clone();
        if next.selected.remove(&node.path) {
            (next, SelectionAction::Deselected)
        } else {
            next.selected.insert(node.path.clone());
            (next, SelectionAction::Selected)
        }
    }

    /// `None` selects every unblocked file below the folder; `Partial` and
    /// `All` clear them.
    pub fn toggle_folder(&self, node: &TreeNode) -> (Self, SelectionAction) {
        if self.is_blocked(node) {
            return (self.force_node(node), SelectionAction::Forced);
        }
        match self.folder_selection_state(node) {
            TriState::None => {
                let count = self.unblocked_files(node).count();
                (self.select_subtree(node), SelectionAction::FolderSelected(count))
            }
            TriState::Partial | TriState::All => {
                let count = self
                    .unblocked_files(node)
                    .filter(|f| self.selected.contains(&f.path))
                    .count();
                (self.deselect_subtree(node), SelectionAction::FolderCleared(count))
            }
        }
    }

    /// Dispatches to [`Self::toggle_file`] or [`Self::toggle_folder`].
    pub fn toggle_path(&self, tree: &ProjectTree, path: &str) -> Result<(Self, SelectionAction)> {
        let node = tree
            .find(path)
            .ok_or_else(|| AppError::Input(format!("Unknown path: {}", path)))?;
        Ok(if node.is_directory {
            self.toggle_folder(node)
        } else {
            self.toggle_file(node)
        })
    }

    /// Selects `node` if it is an unblocked file, or every unblocked file
    /// below it.
    pub fn select_subtree(&self, node: &TreeNode) -> Self {
        let mut next = self.clone();
        if !node.is_directory {
            if !self.is_blocked(node) {
                next.selected.insert(node.path.clone());
            }
            return next;
        }
        for file in self.unblocked_files(node) {
            next.selected.insert(file.path.clone());
        }
        next
    }

    pub fn deselect_subtree(&self, node: &TreeNode) -> Self {
        let mut next = self.clone();
        if !node.is_directory {
            next.selected.remove(&node.path);
            return next;
        }
        for file in self.unblocked_files(node) {
            next.selected.remove(&file.path);
        }
        next
    }

    pub fn clear_selection(&self) -> Self {
        Self {
            selected: BTreeSet::new(),
            forced: self.forced.clone(),
        }
    }

    /// Selects every unblocked file whose path matches `globs`.
    pub fn select_matching(&self, tree: &ProjectTree, globs: &GlobSet) -> Self {
        let mut next = self.clone();
        for file in tree.files() {
            if !self.is_blocked(file) && globs.is_match(&file.path) {
                next.selected.insert(file.path.clone());
            }
        }
        next
    }

    pub fn deselect_matching(&self, tree: &ProjectTree, globs: &GlobSet) -> Self {
        let mut next = self.clone();
        for file in tree.files() {
            if globs.is_match(&file.path) {
                next.selected.remove(&file.path);
            }
        }
        next
    }

    pub fn folder_selection_state(&self, node: &TreeNode) -> TriState {
        let mut total = 0;
        let mut selected = 0;
        for file in self.unblocked_files(node) {
            total += 1;
            if self.selected.contains(&file.path) {
                selected += 1;
            }
        }
        match selected {
            0 => TriState::None,
            n if n == total => TriState::All,
            _ => TriState::Partial,
        }
    }

    pub fn folder_line_count(&self, node: &TreeNode) -> usize {
        self.unblocked_files(node)
            .filter(|f| self.selected.contains(&f.path))
            .map(|f| f.line_count)
            .sum()
    }

    /// Selected, unblocked files in tree order; what a bundle is built from.
    pub fn bundle_paths(&self, tree: &ProjectTree) -> Vec<String> {
        tree.files()
            .filter(|f| self.selected.contains(&f.path) && !self.is_blocked(f))
            .map(|f| f.path.clone())
            .collect()
    }

    pub fn stats(&self, tree: &ProjectTree) -> SelectionStats {
        let mut stats = SelectionStats::default();
        for file in tree.files().filter(|f| !self.is_blocked(f)) {
            stats.total_files += 1;
            stats.total_lines += file.line_count;
            if self.selected.contains(&file.path) {
                stats.selected_files += 1;
                stats.selected_lines += file.line_count;
            }
        }
        stats
    }

    fn unblocked_files<'a>(&'a self, node: &'a TreeNode) -> impl Iterator<Item = &'a TreeNode> + 'a {
        node.descendant_files().filter(move |f| !self.is_blocked(f))
    }
}
