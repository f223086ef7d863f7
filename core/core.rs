pub mod api;
pub mod bundle;
pub mod config;
pub mod entries;
pub mod error;
pub mod lines;
pub mod matcher;
pub mod output_formats;
pub mod selection;
pub mod session;
pub mod tree;

pub use bundle::{
    Bundle, BundleFile, BundleOptions, BundleStats, DecodedBundle, GeneratedBundle, SkipReason,
    SkippedFile, decode, encode, generate_bundle, strip_path_comment,
};
pub use config::Config;
pub use entries::{ContentMode, EntryContent, FileSystemEntry, ScanOptions, scan_directory};
pub use error::{AppError, Result};
pub use lines::count_lines;
pub use matcher::{ExclusionTables, PathMatcher, compile_globs};
pub use output_formats::format_size;
pub use selection::{SelectionAction, SelectionModel, SelectionStats, TriState};
pub use session::{HydrationJob, HydrationResult, ProjectSession};
pub use tree::{FilteredTree, ProjectTree, TreeNode, filter_tree};
