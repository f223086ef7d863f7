mod cli_args;
mod commands;
mod output;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use colored::*;
use std::path::Path;
use std::process;

use cli_args::{BundleArgs, Cli, Commands, FormatOutputOpts, ProjectConfigOpts, WalkOpts};
use xbundle_core::api::ApiError;
use xbundle_core::{AppError, Config};

fn main() {
    let cli_args = Cli::parse();

    setup_logging(cli_args.quiet, cli_args.verbose);

    let quiet = cli_args.quiet;

    log::debug!("CLI args parsed: {:?}", cli_args);

    let exit_code = match run_app(cli_args, quiet) {
        Ok(_) => {
            log::info!("Application finished successfully.");
            0
        }
        Err(e) => {
            let exit_code = exit_code_for(&e);
            if !quiet || exit_code == 1 || exit_code == 5 {
                eprintln!("{} {:#}", "Error:".red().bold(), e);
            } else {
                log::error!("Application failed: {:#}", e);
            }
            exit_code
        }
    };
    log::debug!("Exiting with code {}", exit_code);
    process::exit(exit_code);
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    if let Some(api_err) = err.downcast_ref::<ApiError>() {
        return if api_err.status == 400 { 1 } else { 2 };
    }
    let Some(app_err) = err.downcast_ref::<AppError>() else {
        return 1;
    };
    match app_err {
        AppError::Config(_)
        | AppError::TomlParse(_)
        | AppError::TomlSerialize(_)
        | AppError::Input(_)
        | AppError::BundleFormat { .. } => 1,
        AppError::Io(_)
        | AppError::FileRead { .. }
        | AppError::FileTooLarge { .. }
        | AppError::NotText { .. } => 2,
        AppError::Glob(_) | AppError::InvalidArgument(_) => 5,
        AppError::JsonSerialize(_) | AppError::YamlError(_) | AppError::XmlSerialize(_) => 6,
        AppError::TikToken(_) => 8,
        _ => 1,
    }
}

fn setup_logging(quiet: bool, verbose: u8) {
    let log_level = if quiet {
        log::LevelFilter::Off
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();
    log::trace!("Logger initialized with level: {:?}", log_level);
}

fn run_app(cli: Cli, quiet: bool) -> Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };
    match command {
        Commands::Scan(args) => {
            log::debug!("Executing 'scan' command...");
            commands::scan::handle_scan_command(args, quiet)?;
        }
        Commands::File(args) => {
            log::debug!("Executing 'file' command...");
            commands::file::handle_file_command(args)?;
        }
        Commands::Bundle(args) => {
            log::debug!("Executing 'bundle' command...");
            commands::bundle::handle_bundle_command(args, quiet)?;
        }
        Commands::Stats(args) => {
            log::debug!("Executing 'stats' command...");
            commands::stats::handle_stats_command(args, quiet)?;
        }
        Commands::Completion(args) => {
            log::debug!("Executing 'completion' command...");
            commands::completion::handle_completion_command(&args, quiet)?;
        }
        Commands::Config(args) => {
            log::debug!("Executing 'config' command...");
            let project_root =
                Config::determine_project_root(args.project_config.project_root.as_ref())
                    .context("Failed to determine project root for config command")?;
            commands::config::handle_config_command(&args, &project_root, quiet)?;
        }
    }
    Ok(())
}

fn merge_config_with_cli_overrides(mut config: Config, args: &BundleArgs) -> Config {
    log::trace!("Applying bundle command CLI overrides to config...");
    if let Some(size) = &args.max_file_size {
        config.bundle.max_file_size = size.clone();
    }
    if args.keep_path_comments {
        config.bundle.strip_path_comments = false;
    }
    if let Some(Some(path)) = &args.save {
        config.bundle.output_file = path.clone();
    }
    config
}

fn apply_walk_overrides(config: &mut Config, walk: &WalkOpts) {
    if walk.enable_gitignore {
        config.general.use_gitignore = true;
    }
    if walk.disable_gitignore {
        config.general.use_gitignore = false;
    }
    if walk.skip_hidden {
        config.general.include_hidden = false;
    }
    if walk.no_default_exclusions {
        config.exclusions.enabled = false;
    }
    config
        .exclusions
        .extra_folders
        .extend(walk.exclude_folders.iter().cloned());
    config
        .exclusions
        .extra_files
        .extend(walk.exclude_files.iter().cloned());
}

/// Loads the config file (if any) and applies the CLI overrides of the
/// running command on top of it.
pub fn load_config_for_command(
    project_root: &Path,
    project_opts: &ProjectConfigOpts,
    walk_opts: Option<&WalkOpts>,
    bundle_args: Option<&BundleArgs>,
    format_override: Option<&FormatOutputOpts>,
) -> Result<Config> {
    let config_path = Config::resolve_config_path(
        project_root,
        project_opts.config_file.as_ref(),
        project_opts.disable_config_file,
    )
    .context("Failed to resolve configuration path")?;

    let mut config = match &config_path {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(name) = &project_opts.project_name {
        config.general.project_name = Some(name.clone());
    }
    if let Some(walk) = walk_opts {
        apply_walk_overrides(&mut config, walk);
    }
    if let Some(args) = bundle_args {
        config = merge_config_with_cli_overrides(config, args);
    }
    if let Some(fmt_opts) = format_override {
        if let Some(format) = &fmt_opts.format {
            config.output.format = format.clone();
        }
        if fmt_opts.enable_json_minify {
            config.output.json_minify = true;
        }
        if fmt_opts.disable_json_minify {
            config.output.json_minify = false;
        }
    }

    config.general.project_name = Some(config.get_effective_project_name(project_root));
    log::trace!("Config after CLI overrides: {:?}", config);
    Ok(config)
}
