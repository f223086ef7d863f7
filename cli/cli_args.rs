use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct ProjectConfigOpts {
    #[arg(
        long,
        help = "Specify the target project directory (default: current dir).",
        help_heading = "Project Setup",
        value_name = "PATH"
    )]
    pub project_root: Option<PathBuf>,

    #[arg(
        long,
        help = "Specify path/filename of the TOML config file (default: .xtools/xbundle/xbundle.toml).",
        value_name = "CONFIG_FILE",
        conflicts_with = "disable_config_file",
        help_heading = "Project Setup"
    )]
    pub config_file: Option<String>,

    #[arg(
        long,
        help = "Disable loading any TOML config file.",
        conflicts_with = "config_file",
        help_heading = "Project Setup"
    )]
    pub disable_config_file: bool,

    #[arg(
        long,
        help = "Specify the project name (overrides config/dir name).",
        value_name = "NAME",
        help_heading = "Project Setup"
    )]
    pub project_name: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FormatOutputOpts {
    #[arg(short = 'f', long, help = "Set the output format.", value_name = "FORMAT", value_parser = ["text", "json", "yaml", "xml"], help_heading = "Output Formatting")]
    pub format: Option<String>,

    #[arg(
        long,
        help = "Ensure JSON output is compact (minified).",
        conflicts_with = "disable_json_minify",
        help_heading = "Output Formatting"
    )]
    pub enable_json_minify: bool,

    #[arg(
        long,
        help = "Ensure JSON output is pretty-printed (readable) [default].",
        conflicts_with = "enable_json_minify",
        help_heading = "Output Formatting"
    )]
    pub disable_json_minify: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct WalkOpts {
    #[arg(
        long,
        help = "Respect .gitignore files while walking.",
        overrides_with = "disable_gitignore",
        help_heading = "Directory Walk"
    )]
    pub enable_gitignore: bool,
    #[arg(
        long,
        help = "Ignore .gitignore files while walking [default].",
        overrides_with = "enable_gitignore",
        help_heading = "Directory Walk"
    )]
    pub disable_gitignore: bool,

    #[arg(
        long,
        help = "Skip hidden files and directories.",
        help_heading = "Directory Walk"
    )]
    pub skip_hidden: bool,

    #[arg(
        long,
        help = "Do not exclude anything by default (node_modules, target, *.min.js, ...).",
        help_heading = "Directory Walk"
    )]
    pub no_default_exclusions: bool,

    #[arg(long = "exclude-folder", value_name = "NAME", action = clap::ArgAction::Append, help = "Add a folder name to the default exclusions.", help_heading = "Directory Walk")]
    pub exclude_folders: Vec<String>,

    #[arg(long = "exclude-file", value_name = "PATTERN", action = clap::ArgAction::Append, help = "Add a file name, suffix or *-glob to the default exclusions.", help_heading = "Directory Walk")]
    pub exclude_files: Vec<String>,

    #[arg(
        long,
        value_name = "FILE",
        help = "Read the project listing (one relative path per line) from FILE instead of walking.",
        help_heading = "Directory Walk"
    )]
    pub paths_from: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SelectionOpts {
    #[arg(long, value_name = "GLOB", action = clap::ArgAction::Append, help = "Start from an empty selection and select unblocked files matching GLOB.", help_heading = "Selection")]
    pub only: Vec<String>,

    #[arg(long, value_name = "GLOB", action = clap::ArgAction::Append, help = "Deselect files matching GLOB.", help_heading = "Selection")]
    pub skip: Vec<String>,

    #[arg(long, value_name = "PATH", action = clap::ArgAction::Append, help = "Override exclusion for PATH and select it (or all files below it).", help_heading = "Selection")]
    pub force: Vec<String>,
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Bundle selected project files into a single text for AI models.",
    long_about = "xbundle scans a project directory, excludes build and vendor artifacts by default, \nlets you adjust the selection, and concatenates the selected files into one \ndelimited bundle suitable for pasting into an LLM context window.",
    help_template = "{about-section}\nUsage: {usage}\n\n{all-args}{after-help}",
    after_help = "EXAMPLES:\n  xbundle scan --filter index\n  xbundle bundle --only 'src/**' --save\n  xbundle bundle --force dist/app.js --stdout\n  xbundle stats -f json",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Increase message verbosity (-v, -vv).")]
    pub verbose: u8,

    #[arg(
        short,
        long,
        global = true,
        help = "Silence informational messages and warnings."
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    #[command(
        visible_alias = "s",
        about = "Show the project tree with exclusion and selection markers."
    )]
    Scan(ScanArgs),

    #[command(visible_alias = "cat", about = "Print the raw content of one project file.")]
    File(FileArgs),

    #[command(
        visible_alias = "b",
        visible_alias = "gen",
        about = "Generate the bundle from the selected files."
    )]
    Bundle(BundleArgs),

    #[command(
        visible_alias = "m",
        about = "Calculate and display selection statistics."
    )]
    Stats(StatsArgs),

    #[command(about = "Generate or save shell completion scripts.")]
    Completion(CompletionArgs),

    #[command(about = "Show or save the default configuration file structure.")]
    Config(ConfigArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    #[clap(flatten)]
    pub project_config: ProjectConfigOpts,
    #[clap(flatten)]
    pub format_output: FormatOutputOpts,
    #[clap(flatten)]
    pub walk: WalkOpts,
    #[clap(flatten)]
    pub selection: SelectionOpts,

    #[arg(
        long,
        value_name = "TERM",
        help = "Only show entries whose name contains TERM (case-insensitive)."
    )]
    pub filter: Option<String>,

    #[arg(long, help = "Hide entries that are excluded and not forced.")]
    pub hide_excluded: bool,
}

#[derive(Args, Debug, Clone)]
pub struct FileArgs {
    #[clap(flatten)]
    pub project_config: ProjectConfigOpts,
    #[clap(flatten)]
    pub format_output: FormatOutputOpts,

    #[arg(required = true, help = "Path of the file, relative to the project root.")]
    pub path: String,
}

#[derive(Args, Debug, Clone)]
pub struct BundleArgs {
    #[clap(flatten)]
    pub project_config: ProjectConfigOpts,
    #[clap(flatten)]
    pub format_output: FormatOutputOpts,
    #[clap(flatten)]
    pub walk: WalkOpts,
    #[clap(flatten)]
    pub selection: SelectionOpts,

    #[arg(
        long,
        help = "Write the bundle to standard output [default unless --save is given].",
        help_heading = "Output Control",
        conflicts_with = "save"
    )]
    pub stdout: bool,

    #[arg(
        short = 's', long, value_name = "FILE",
        num_args = 0..=1,
        help_heading = "Output Control",
        help = "Save the bundle. Optional FILE overrides [bundle].output_file.",
    )]
    pub save: Option<Option<PathBuf>>,

    #[arg(
        long,
        value_name = "SIZE_STRING",
        help = "Skip files larger than this (e.g. '1 MiB', '500KB') [default: 1 MiB].",
        help_heading = "Output Control"
    )]
    pub max_file_size: Option<String>,

    #[arg(
        long,
        help = "Keep a leading comment that only repeats the file's path.",
        help_heading = "Output Control"
    )]
    pub keep_path_comments: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatsArgs {
    #[clap(flatten)]
    pub project_config: ProjectConfigOpts,
    #[clap(flatten)]
    pub format_output: FormatOutputOpts,
    #[clap(flatten)]
    pub walk: WalkOpts,
    #[clap(flatten)]
    pub selection: SelectionOpts,
}

#[derive(Args, Debug, Clone)]
pub struct CompletionArgs {
    #[arg(
        long,
        value_name = "SHELL",
        value_enum,
        help = "Shell to generate completions for [default: fish]"
    )]
    pub shell: Option<Shell>,
    #[arg(
        long,
        help = "Save completion script to default location (prompts overwrite)."
    )]
    pub save: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[clap(flatten)]
    pub project_config: ProjectConfigOpts,

    #[arg(
        long,
        help = "Save default config structure to default path (prompts overwrite)."
    )]
    pub save: bool,
}
