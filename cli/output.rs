use anyhow::{Context, Result};
use colored::*;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table, presets::UTF8_FULL};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use xbundle_core::config::OutputConfig;
use xbundle_core::{SelectionModel, TreeNode, TriState, output_formats};

use crate::commands::stats::StatsReport;

/// Prints structured data in the requested format, or `plain_text` when
/// the format is `text`.
pub fn print_data_or_text<T: Serialize>(
    data: &T,
    plain_text: Option<String>,
    output: &OutputConfig,
    root_name: &str,
) -> Result<()> {
    let format = output.format.to_lowercase();

    if format == "text" {
        match plain_text {
            Some(text) => write_to_stdout(&text),
            None => {
                let content = output_formats::serialize_to_json(data, true)?;
                write_to_stdout(&content)
            }
        }
    } else {
        let pretty_json = !output.json_minify;
        let content = serialize_output(data, &format, pretty_json, root_name)?;
        write_to_stdout(&content)
    }
}

fn serialize_output<T: Serialize>(
    data: &T,
    format: &str,
    pretty_json: bool,
    xml_root: &str,
) -> Result<String> {
    match format.to_lowercase().as_str() {
        "yaml" | "yml" => output_formats::serialize_to_yaml(data).map_err(anyhow::Error::from),
        "xml" => output_formats::serialize_to_xml(data, xml_root).map_err(anyhow::Error::from),
        _ => output_formats::serialize_to_json(data, pretty_json).map_err(anyhow::Error::from),
    }
}

pub fn write_to_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let mut file =
        File::create(path).with_context(|| format!("Failed to create file {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write to file {}", path.display()))?;
    Ok(())
}

pub fn write_to_stdout(content: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(content.as_bytes())
        .context("Failed to write to stdout")?;
    if !content.ends_with('\n') {
        handle
            .write_all(b"\n")
            .context("Failed to write newline to stdout")?;
    }
    handle.flush().context("Failed to flush stdout")?;
    Ok(())
}

/// Marker shown in front of a node: `[x]` selected, `[~]` partially
/// selected folder, `[ ]` unselected, `[-]` excluded and not forced.
pub fn node_marker(node: &TreeNode, selection: &SelectionModel) -> &'static str {
    if selection.is_blocked(node) {
        return "[-]";
    }
    if node.is_directory {
        match selection.folder_selection_state(node) {
            TriState::All => "[x]",
            TriState::Partial => "[~]",
            TriState::None => "[ ]",
        }
    } else if selection.is_selected(&node.path) {
        "[x]"
    } else {
        "[ ]"
    }
}

fn node_line(node: &TreeNode, selection: &SelectionModel) -> String {
    let marker = node_marker(node, selection);
    let blocked = selection.is_blocked(node);
    let (name, lines) = if node.is_directory {
        (format!("{}/", node.name), selection.folder_line_count(node))
    } else {
        (node.name.clone(), node.line_count)
    };

    let name = if blocked {
        name.dimmed().to_string()
    } else if node.is_directory {
        name.blue().bold().to_string()
    } else {
        name
    };
    let marker = match marker {
        "[x]" => marker.green().to_string(),
        "[~]" => marker.yellow().to_string(),
        "[-]" => marker.dimmed().to_string(),
        _ => marker.to_string(),
    };
    let mut line = format!("{} {}", marker, name);
    if !blocked && (lines > 0 || !node.is_directory) {
        line.push_str(&format!(" ({} lines)", lines).dimmed().to_string());
    }
    if selection.is_forced(&node.path) && node.is_excluded_effective {
        line.push_str(&" forced".magenta().to_string());
    }
    line
}

/// Renders `nodes` as an indented tree.
pub fn render_tree(nodes: &[TreeNode], selection: &SelectionModel, hide_blocked: bool) -> String {
    fn walk(
        nodes: &[TreeNode],
        selection: &SelectionModel,
        hide_blocked: bool,
        prefix: &str,
        out: &mut String,
    ) {
        let visible: Vec<&TreeNode> = nodes
            .iter()
            .filter(|n| !(hide_blocked && selection.is_blocked(n)))
            .collect();
        for (i, node) in visible.iter().enumerate() {
            let last = i + 1 == visible.len();
            let connector = if last { "└── " } else { "├── " };
            out.push_str(prefix);
            out.push_str(connector);
            out.push_str(&node_line(node, selection));
            out.push('\n');
            if node.is_directory && !node.children.is_empty() {
                let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
                walk(&node.children, selection, hide_blocked, &child_prefix, out);
            }
        }
    }

    let mut out = String::new();
    walk(nodes, selection, hide_blocked, "", &mut out);
    out
}

pub fn print_stats_pretty_table(report: &StatsReport) -> Result<()> {
    println!();
    println!(
        "{}",
        format!(" {} Selection Summary ", report.project_name)
            .green()
            .bold()
            .underline()
    );
    println!(
        "{:<20} {} of {}",
        "Selected Files:".green(),
        report.selected_files.to_string().cyan(),
        report.total_files
    );
    println!(
        "{:<20} {} of {}",
        "Selected Lines:".green(),
        report.selected_lines.to_string().cyan(),
        report.total_lines
    );
    println!(
        "{:<20} {}",
        "Selected Size:".green(),
        report.selected_bytes_readable.cyan()
    );
    println!(
        "{:<20} {}",
        "Est. Tokens:".green(),
        report.estimated_tokens.to_string().cyan()
    );

    if report.files.is_empty() {
        println!("\n{}", "(No files selected)".yellow());
    } else {
        println!("\n{}", " File Details ".green().bold().underline());
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            Cell::new("Path").fg(Color::Green),
            Cell::new("Lines").fg(Color::Green),
            Cell::new("Size").fg(Color::Green),
            Cell::new("Tokens").fg(Color::Green),
        ]);
        for file in &report.files {
            table.add_row(vec![
                Cell::new(&file.path).fg(Color::Cyan),
                Cell::new(file.lines).set_alignment(CellAlignment::Right),
                Cell::new(&file.bytes_readable)
                    .set_alignment(CellAlignment::Right)
                    .fg(Color::DarkGrey),
                Cell::new(file.estimated_tokens).set_alignment(CellAlignment::Right),
            ]);
        }
        println!("{table}");
    }
    if report.skipped_files > 0 {
        println!(
            "{}",
            format!("{} selected files could not be read.", report.skipped_files).yellow()
        );
    }
    println!();
    Ok(())
}
