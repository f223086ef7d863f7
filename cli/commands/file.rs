use crate::cli_args::FileArgs;
use crate::load_config_for_command;
use crate::output::print_data_or_text;
use anyhow::{Context, Result};
use xbundle_core::Config;
use xbundle_core::api::{self, FileRequest};

pub fn handle_file_command(args: FileArgs) -> Result<()> {
    let project_root = Config::determine_project_root(args.project_config.project_root.as_ref())
        .context("Failed to determine project root")?;
    let config = load_config_for_command(
        &project_root,
        &args.project_config,
        None,
        None,
        Some(&args.format_output),
    )
    .context("Failed to load configuration for file command")?;

    let request = FileRequest {
        root_path: project_root.display().to_string(),
        path: args.path.clone(),
    };
    let response = api::file_content(&request)
        .with_context(|| format!("Failed to read {}", args.path))?;
    log::debug!("Read {} ({} lines)", response.path, response.line_count);

    let raw = response.content.clone();
    print_data_or_text(&response, Some(raw), &config.output, "file")
}
