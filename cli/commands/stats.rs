use crate::cli_args::StatsArgs;
use crate::commands::{ProjectArgs, load_project};
use crate::output::{print_data_or_text, print_stats_pretty_table};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use tiktoken_rs::{CoreBPE, cl100k_base};
use xbundle_core::entries::read_text_file;
use xbundle_core::{AppError, ProjectTree, SelectionModel, format_size};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub project_name: String,
    pub total_files: usize,
    pub total_lines: usize,
    pub selected_files: usize,
    pub selected_lines: usize,
    pub selected_bytes: u64,
    pub selected_bytes_readable: String,
    pub estimated_tokens: usize,
    pub skipped_files: usize,
    pub files: Vec<FileStats>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStats {
    pub path: String,
    pub lines: usize,
    pub bytes: u64,
    pub bytes_readable: String,
    pub estimated_tokens: usize,
}

pub fn handle_stats_command(args: StatsArgs, quiet: bool) -> Result<()> {
    let project = load_project(ProjectArgs {
        project_config: &args.project_config,
        walk: &args.walk,
        selection: &args.selection,
        format_output: &args.format_output,
        bundle: None,
    })?;
    let project_name = project
        .config
        .general
        .project_name
        .clone()
        .unwrap_or_default();

    log::debug!("Calculating selection statistics...");
    let report = calculate_stats(
        &project_name,
        &project.root,
        project.session.tree(),
        project.session.selection(),
    )?;
    log::debug!("Statistics calculation complete.");

    if project.config.output.format == "text" {
        if quiet {
            return Ok(());
        }
        print_stats_pretty_table(&report)
    } else {
        print_data_or_text(&report, None, &project.config.output, "stats")
    }
}

fn calculate_stats(
    project_name: &str,
    project_root: &Path,
    tree: &ProjectTree,
    selection: &SelectionModel,
) -> Result<StatsReport> {
    let bpe = cl100k_base()
        .map_err(|e| anyhow::anyhow!(AppError::TikToken(e.to_string())))
        .context("Failed to load tokenizer")?;
    let totals = selection.stats(tree);

    let mut files = Vec::new();
    let mut skipped_files = 0;
    let mut selected_bytes: u64 = 0;
    let mut estimated_tokens = 0;

    for path in selection.bundle_paths(tree) {
        let Some(node) = tree.find(&path) else {
            continue;
        };
        let tokens = match count_tokens(&bpe, &project_root.join(&path)) {
            Some(tokens) => tokens,
            None => {
                skipped_files += 1;
                continue;
            }
        };
        selected_bytes = selected_bytes.saturating_add(node.size);
        estimated_tokens += tokens;
        files.push(FileStats {
            lines: node.line_count,
            bytes: node.size,
            bytes_readable: format_size(node.size),
            estimated_tokens: tokens,
            path,
        });
    }

    Ok(StatsReport {
        project_name: project_name.to_string(),
        total_files: totals.total_files,
        total_lines: totals.total_lines,
        selected_files: totals.selected_files,
        selected_lines: totals.selected_lines,
        selected_bytes,
        selected_bytes_readable: format_size(selected_bytes),
        estimated_tokens,
        skipped_files,
        files,
    })
}

fn count_tokens(bpe: &CoreBPE, path: &Path) -> Option<usize> {
    match read_text_file(path) {
        Ok(content) => Some(bpe.encode_ordinary(&content).len()),
        Err(e) => {
            log::warn!("Not counting tokens for {}: {}", path.display(), e);
            None
        }
    }
}
