pub mod bundle;
pub mod completion;
pub mod config;
pub mod file;
pub mod scan;
pub mod stats;

use crate::cli_args::{BundleArgs, FormatOutputOpts, ProjectConfigOpts, SelectionOpts, WalkOpts};
use crate::load_config_for_command;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use xbundle_core::entries::{self, normalize_relative_path};
use xbundle_core::{AppError, Config, ContentMode, ProjectSession, SelectionModel, compile_globs};

/// A scanned project with the selection the command line asked for.
pub struct LoadedProject {
    pub root: PathBuf,
    pub config: Config,
    pub session: ProjectSession,
}

pub struct ProjectArgs<'a> {
    pub project_config: &'a ProjectConfigOpts,
    pub walk: &'a WalkOpts,
    pub selection: &'a SelectionOpts,
    pub format_output: &'a FormatOutputOpts,
    pub bundle: Option<&'a BundleArgs>,
}

pub fn load_project(args: ProjectArgs) -> Result<LoadedProject> {
    let root = Config::determine_project_root(args.project_config.project_root.as_ref())
        .context("Failed to determine project root")?;
    log::info!("Project root determined: {}", root.display());

    let config = load_config_for_command(
        &root,
        args.project_config,
        Some(args.walk),
        args.bundle,
        Some(args.format_output),
    )
    .context("Failed to load configuration")?;
    let matcher = config
        .path_matcher()
        .context("Failed to compile exclusion tables")?;

    let listing = match &args.walk.paths_from {
        Some(list_path) => {
            let text = fs::read_to_string(list_path).map_err(|e| AppError::FileRead {
                path: list_path.clone(),
                source: e,
            })?;
            let paths: Vec<String> = text.lines().map(str::to_string).collect();
            entries::entries_from_listing(&root, &paths)
        }
        None => entries::scan_directory(&root, &config.scan_options(ContentMode::Deferred))
            .context("Failed to scan project directory")?,
    };

    let listing = match config.bundle_output_key(&root) {
        Some(output_key) => {
            let before = listing.len();
            let kept: Vec<_> = listing
                .into_iter()
                .filter(|e| entries::tree_key(&e.relative_path).as_deref() != Some(output_key.as_str()))
                .collect();
            if kept.len() < before {
                log::debug!("Left the saved bundle {} out of the listing", output_key);
            }
            kept
        }
        None => listing,
    };

    let mut session = ProjectSession::new();
    let job = session.load(&listing, &matcher);
    if !job.is_empty() {
        let result = job.run();
        if !result.failures.is_empty() {
            log::info!("{} files could not be read for line counts", result.failures.len());
        }
        session.apply_hydration(&result);
    }

    let selection = apply_selection_opts(&session, args.selection)?;
    session.set_selection(selection);

    Ok(LoadedProject {
        root,
        config,
        session,
    })
}

/// `--only` restarts from an empty selection, `--force` un-blocks and
/// selects, `--skip` deselects last.
fn apply_selection_opts(session: &ProjectSession, opts: &SelectionOpts) -> Result<SelectionModel> {
    let tree = session.tree();
    let mut selection = session.selection().clone();

    if !opts.only.is_empty() {
        let globs = compile_globs(&opts.only)?;
        selection = selection.clear_selection().select_matching(tree, &globs);
        log::debug!("--only left {} files selected", selection.selected().len());
    }

    for raw in &opts.force {
        let path = normalize_relative_path(raw);
        let node = tree.find(&path).ok_or_else(|| {
            AppError::InvalidArgument(format!("--force path not found in project: {}", raw))
        })?;
        selection = selection.force_node(node).select_subtree(node);
        log::debug!("Forced {}", node.path);
    }

    if !opts.skip.is_empty() {
        let globs = compile_globs(&opts.skip)?;
        selection = selection.deselect_matching(tree, &globs);
    }
    Ok(selection)
}
