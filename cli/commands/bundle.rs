use crate::cli_args::BundleArgs;
use crate::commands::{ProjectArgs, load_project};
use crate::output::{self, print_data_or_text};
use anyhow::{Context, Result};
use colored::*;
use xbundle_core::api::BundleResponse;
use xbundle_core::{
    AppError, BundleStats, GeneratedBundle, SkipReason, format_size, generate_bundle,
};

pub fn handle_bundle_command(args: BundleArgs, quiet: bool) -> Result<()> {
    let project = load_project(ProjectArgs {
        project_config: &args.project_config,
        walk: &args.walk,
        selection: &args.selection,
        format_output: &args.format_output,
        bundle: Some(&args),
    })?;
    let config = &project.config;
    let options = config
        .bundle_options()
        .context("Invalid [bundle] settings")?;

    let paths = project.session.selection().bundle_paths(project.session.tree());
    if paths.is_empty() {
        anyhow::bail!(AppError::Input(
            "No files selected. Adjust --only/--skip/--force or the exclusion settings."
                .to_string()
        ));
    }
    log::info!("Bundling {} selected files", paths.len());

    let generated = generate_bundle(&project.root, &paths, &options)
        .context("Failed to generate bundle")?;
    report_skipped(&generated, quiet);

    if args.save.is_some() {
        let path = config.bundle_output_path(&project.root);
        output::write_to_file(&path, &generated.bundle.text)?;
        let written = BundleStats::from_text(&generated.bundle.text);
        log::debug!("Saved bundle figures: {:?}", written);
        if !quiet {
            println!(
                "{} Bundle saved to: {} ({} files, {} lines, {})",
                "✅".green(),
                path.display().to_string().blue(),
                written.files,
                written.lines,
                format_size(written.bytes as u64)
            );
        }
        return Ok(());
    }

    log::debug!("Writing bundle to stdout (requested explicitly: {})", args.stdout);
    let text = generated.bundle.text.clone();
    let response = BundleResponse {
        total_files: generated.bundle.total_files,
        total_lines: generated.bundle.total_lines,
        bundle_size: generated.bundle.size(),
        bundle: generated.bundle.text,
        skipped: generated.skipped,
    };
    print_data_or_text(&response, Some(text), &config.output, "bundle")
}

fn report_skipped(generated: &GeneratedBundle, quiet: bool) {
    if quiet || generated.skipped.is_empty() {
        return;
    }
    for skipped in &generated.skipped {
        let reason = match &skipped.reason {
            SkipReason::NotFound => "not found".to_string(),
            SkipReason::Directory => "is a directory".to_string(),
            SkipReason::OutsideRoot => "outside the project root".to_string(),
            SkipReason::Binary => "binary file".to_string(),
            SkipReason::NotText => "not UTF-8 text".to_string(),
            SkipReason::TooLarge { size, limit } => format!(
                "{} exceeds the {} limit",
                format_size(*size),
                format_size(*limit)
            ),
            SkipReason::Unreadable { message } => message.clone(),
        };
        eprintln!("{} {}: {}", "Skipped".yellow(), skipped.path, reason);
    }
}
