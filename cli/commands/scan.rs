use crate::cli_args::ScanArgs;
use crate::commands::{ProjectArgs, load_project};
use crate::output::{print_data_or_text, render_tree};
use anyhow::Result;
use colored::*;
use xbundle_core::api::ScanResponse;
use xbundle_core::{ProjectTree, filter_tree};

pub fn handle_scan_command(args: ScanArgs, quiet: bool) -> Result<()> {
    let project = load_project(ProjectArgs {
        project_config: &args.project_config,
        walk: &args.walk,
        selection: &args.selection,
        format_output: &args.format_output,
        bundle: None,
    })?;
    let tree = project.session.tree();
    let selection = project.session.selection();
    let stats = selection.stats(tree);

    let (shown, match_count) = match args.filter.as_deref() {
        Some(term) if !term.trim().is_empty() => {
            let filtered = filter_tree(tree, term, |n| selection.is_blocked(n));
            log::debug!("Filter '{}' matched {} files", term, filtered.match_count);
            (ProjectTree::from_roots(filtered.nodes), Some(filtered.match_count))
        }
        _ => (tree.clone(), None),
    };

    let project_name = project
        .config
        .general
        .project_name
        .clone()
        .unwrap_or_default();

    let mut text = String::new();
    if !quiet {
        text.push_str(&format!(
            "{} {}\n",
            project_name.green().bold(),
            format!("({})", project.root.display()).dimmed()
        ));
    }
    if shown.is_empty() {
        text.push_str(&format!("{}\n", "(no entries)".yellow()));
    } else {
        text.push_str(&render_tree(shown.roots(), selection, args.hide_excluded));
    }
    if !quiet {
        if let Some(count) = match_count {
            text.push_str(&format!("\n{} matching files\n", count.to_string().cyan()));
        }
        text.push_str(&format!(
            "\nSelected {} of {} files, {} of {} lines\n",
            stats.selected_files.to_string().cyan(),
            stats.total_files,
            stats.selected_lines.to_string().cyan(),
            stats.total_lines
        ));
    }

    let payload = ScanResponse {
        tree: shown,
        root_path: project.root.display().to_string(),
        stats,
    };
    print_data_or_text(&payload, Some(text), &project.config.output, "scan")
}
