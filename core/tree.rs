use crate::entries::{EntryContent, FileSystemEntry, tree_key};
use crate::lines::count_lines;
use crate::matcher::PathMatcher;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Average bytes per line used for provisional counts of deferred files.
pub const ESTIMATED_BYTES_PER_LINE: u64 = 40;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub name: String,
    pub path: String,
    pub is_directory: bool,
    pub is_excluded_by_default: bool,
    pub is_excluded_effective: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
    pub line_count: usize,
    pub size: u64,
}

impl TreeNode {
    /// Depth-first iterator over this node and all its descendants.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Descendant files, excluding `self` even when it is a file.
    pub fn descendant_files(&self) -> impl Iterator<Item = &TreeNode> + '_ {
        self.children
            .iter()
            .flat_map(|c| c.descendants())
            .filter(|n| !n.is_directory)
    }

    fn find_child(&self, name: &str) -> Option<&TreeNode> {
        self.children.iter().find(|c| c.name == name)
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Every proper ancestor path of `path`, nearest first.
pub fn ancestor_paths(path: &str) -> impl Iterator<Item = &str> + '_ {
    path.char_indices()
        .rev()
        .filter(|(_, c)| *c == '/')
        .map(move |(i, _)| &path[..i])
}

/// Directories first, then case-insensitive name order, raw order on ties.
pub fn compare_nodes(a: &TreeNode, b: &TreeNode) -> Ordering {
    b.is_directory
        .cmp(&a.is_directory)
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.name.cmp(&b.name))
}

fn estimate_lines(size: u64) -> usize {
    size.div_ceil(ESTIMATED_BYTES_PER_LINE) as usize
}

#[derive(Debug)]
struct PendingNode {
    name: String,
    is_directory: bool,
    size: u64,
    line_count: usize,
    children: Vec<String>,
}

/// The project's file tree. The root directory itself is not a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProjectTree {
    roots: Vec<TreeNode>,
}

impl ProjectTree {
    pub fn build(entries: &[FileSystemEntry], matcher: &PathMatcher) -> Self {
        log::debug!("Building tree structure from {} entries...", entries.len());
        let mut pending: HashMap<String, PendingNode> = HashMap::new();
        let mut root_paths: Vec<String> = Vec::new();

        for entry in entries {
            let Some(key) = tree_key(&entry.relative_path) else {
                log::warn!("Skipping entry with unusable path: {:?}", entry.relative_path);
                continue;
            };
            let segments: Vec<&str> = key.split('/').collect();

            let mut parent: Option<String> = None;
            for (i, segment) in segments.iter().enumerate() {
                let is_last = i + 1 == segments.len();
                let is_directory = !is_last || entry.is_directory;
                let node_path = segments[..=i].join("/");

                match pending.get_mut(&node_path) {
                    Some(existing) => {
                        if is_directory && !existing.is_directory {
                            log::warn!("Path {} listed as a file and a directory; treating it as a directory", node_path);
                            existing.is_directory = true;
                            existing.size = 0;
                            existing.line_count = 0;
                        } else if is_last && !is_directory && existing.is_directory {
                            log::warn!("Ignoring file entry {} that shadows a directory", node_path);
                        } else if is_last && !is_directory {
                            existing.size = entry.size;
                            existing.line_count = initial_line_count(entry);
                        }
                    }
                    None => {
                        let (size, line_count) = if is_directory {
                            (0, 0)
                        } else {
                            (entry.size, initial_line_count(entry))
                        };
                        pending.insert(
                            node_path.clone(),
                            PendingNode {
                                name: (*segment).to_string(),
                                is_directory,
                                size,
                                line_count,
                                children: Vec::new(),
                            },
                        );
                        match &parent {
                            Some(parent_path) => {
                                if let Some(p) = pending.get_mut(parent_path) {
                                    p.children.push(node_path.clone());
                                }
                            }
                            None => root_paths.push(node_path.clone()),
                        }
                    }
                }
                parent = Some(node_path);
            }
        }

        let mut roots: Vec<TreeNode> = root_paths
            .iter()
            .filter_map(|path| assemble(path, false, &mut pending, matcher))
            .collect();
        roots.sort_by(compare_nodes);
        log::debug!("Tree structure built with {} root nodes.", roots.len());
        Self { roots }
    }

    pub fn from_roots(mut roots: Vec<TreeNode>) -> Self {
        sort_recursive(&mut roots);
        Self { roots }
    }

    pub fn roots(&self) -> &[TreeNode] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &TreeNode> + '_ {
        self.roots.iter().flat_map(|r| r.descendants())
    }

    pub fn files(&self) -> impl Iterator<Item = &TreeNode> + '_ {
        self.nodes().filter(|n| !n.is_directory)
    }

    pub fn find(&self, path: &str) -> Option<&TreeNode> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let first = segments.next()?;
        let mut node = self.roots.iter().find(|r| r.name == first)?;
        for segment in segments {
            node = node.find_child(segment)?;
        }
        Some(node)
    }

    /// Replaces provisional line counts. Paths missing from `counts` keep
    /// their current value; shape and ordering are untouched.
    pub fn apply_line_counts(&mut self, counts: &HashMap<String, usize>) -> usize {
        fn visit(node: &mut TreeNode, counts: &HashMap<String, usize>, updated: &mut usize) {
            if node.is_directory {
                for child in &mut node.children {
                    visit(child, counts, updated);
                }
            } else if let Some(&lines) = counts.get(&node.path) {
                node.line_count = lines;
                *updated += 1;
            }
        }
        let mut updated = 0;
        for root in &mut self.roots {
            visit(root, counts, &mut updated);
        }
        updated
    }
}

fn initial_line_count(entry: &FileSystemEntry) -> usize {
    match &entry.content {
        EntryContent::Text(text) => count_lines(text),
        EntryContent::Deferred(_) => estimate_lines(entry.size),
        EntryContent::Empty => 0,
    }
}

fn assemble(
    path: &str,
    parent_excluded: bool,
    pending: &mut HashMap<String, PendingNode>,
    matcher: &PathMatcher,
) -> Option<TreeNode> {
    let record = pending.remove(path)?;
    let is_excluded_by_default = matcher.is_excluded_by_default(&record.name, record.is_directory);
    let is_excluded_effective = is_excluded_by_default || parent_excluded;
    if is_excluded_by_default {
        log::trace!("Excluded by default: {}", path);
    }

    let mut children: Vec<TreeNode> = record
        .children
        .iter()
        .filter_map(|child| assemble(child, is_excluded_effective, pending, matcher))
        .collect();
    children.sort_by(compare_nodes);

    Some(TreeNode {
        name: record.name,
        path: path.to_string(),
        is_directory: record.is_directory,
        is_excluded_by_default,
        is_excluded_effective,
        children,
        line_count: if record.is_directory { 0 } else { record.line_count },
        size: record.size,
    })
}

fn sort_recursive(nodes: &mut [TreeNode]) {
    nodes.sort_by(compare_nodes);
    for node in nodes.iter_mut() {
        sort_recursive(&mut node.children);
    }
}

/// Result of a name search over the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredTree {
    pub nodes: Vec<TreeNode>,
    /// Matching files that are not excluded.
    pub match_count: usize,
}

/// Keeps nodes whose name contains `term` (case-insensitive) and the
/// directories leading to them. An empty term returns the whole tree.
pub fn filter_tree<F>(tree: &ProjectTree, term: &str, is_blocked: F) -> FilteredTree
where
    F: Fn(&TreeNode) -> bool,
{
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return FilteredTree {
            nodes: tree.roots().to_vec(),
            match_count: 0,
        };
    }

    fn filter_nodes<F: Fn(&TreeNode) -> bool>(
        nodes: &[TreeNode],
        term: &str,
        is_blocked: &F,
        matches: &mut usize,
    ) -> Vec<TreeNode> {
        let mut kept = Vec::new();
        for node in nodes {
            let name_matches = node.name.to_lowercase().contains(term);
            if node.is_directory {
                let children = filter_nodes(&node.children, term, is_blocked, matches);
                if name_matches || !children.is_empty() {
                    kept.push(TreeNode {
                        children,
                        ..node.clone()
                    });
                }
            } else if name_matches {
                if !is_blocked(node) {
                    *matches += 1;
                }
                kept.push(node.clone());
            }
        }
        kept
    }

    let mut match_count = 0;
    let nodes = filter_nodes(tree.roots(), &term, &is_blocked, &mut match_count);
    FilteredTree { nodes, match_count }
}
