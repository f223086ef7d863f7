use crate::bundle::{BundleOptions, DEFAULT_MAX_FILE_SIZE};
use crate::entries::{ContentMode, ScanOptions, tree_key};
use crate::error::{AppError, Result};
use crate::matcher::{ExclusionTables, PathMatcher};
use byte_unit::Byte;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_DIR: &str = ".xtools/xbundle";
pub const DEFAULT_CONFIG_FILENAME: &str = "xbundle.toml";
pub const DEFAULT_OUTPUT_FILE: &str = "project-bundle.txt";
pub const DEFAULT_MAX_FILE_SIZE_STR: &str = "1 MiB";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub exclusions: ExclusionsConfig,
    #[serde(default)]
    pub bundle: BundleConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default = "default_false")]
    pub use_gitignore: bool,
    #[serde(default = "default_true")]
    pub include_hidden: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ExclusionsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Replaces the built-in folder table when set.
    #[serde(default)]
    pub folders: Option<Vec<String>>,
    /// Replaces the built-in file table when set.
    #[serde(default)]
    pub files: Option<Vec<String>>,
    #[serde(default)]
    pub extra_folders: Vec<String>,
    #[serde(default)]
    pub extra_files: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BundleConfig {
    #[serde(default = "default_max_file_size")]
    pub max_file_size: String,
    #[serde(default = "default_true")]
    pub strip_path_comments: bool,
    #[serde(default = "default_output_file")]
    pub output_file: PathBuf,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_false")]
    pub json_minify: bool,
}

fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_format() -> String {
    "text".to_string()
}
fn default_max_file_size() -> String {
    DEFAULT_MAX_FILE_SIZE_STR.to_string()
}
fn default_output_file() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_FILE)
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            project_name: None,
            use_gitignore: default_false(),
            include_hidden: default_true(),
        }
    }
}
impl Default for ExclusionsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            folders: None,
            files: None,
            extra_folders: Vec::new(),
            extra_files: Vec::new(),
        }
    }
}
impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            strip_path_comments: default_true(),
            output_file: default_output_file(),
        }
    }
}
impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            json_minify: default_false(),
        }
    }
}

/// Parses sizes such as `1 MiB`, `512KB` or a bare byte count.
pub fn parse_size(value: &str) -> Result<u64> {
    let trimmed = value.trim();
    if let Ok(bytes) = trimmed.parse::<u64>() {
        return Ok(bytes);
    }
    Byte::parse_str(trimmed, true)
        .map(|b| b.as_u64())
        .map_err(|e| AppError::InvalidArgument(format!("Invalid size '{}': {}", value, e)))
}

impl Config {
    pub fn determine_project_root(cli_project_root: Option<&PathBuf>) -> Result<PathBuf> {
        let path_str_opt = cli_project_root
            .map(|p| p.to_string_lossy().to_string())
            .or_else(|| env::var("PROJECT_ROOT").ok().filter(|s| !s.is_empty()));

        let path_to_resolve = match path_str_opt {
            Some(p_str) => PathBuf::from(shellexpand::tilde(&p_str).as_ref()),
            None => env::current_dir().map_err(AppError::Io)?,
        };

        path_to_resolve.canonicalize().map_err(|e| {
            AppError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to canonicalize project root '{}': {}",
                    path_to_resolve.display(),
                    e
                ),
            ))
        })
    }

    pub fn resolve_config_path(
        project_root: &Path,
        cli_config_file: Option<&String>,
        cli_disable_config: bool,
    ) -> Result<Option<PathBuf>> {
        if cli_disable_config {
            log::debug!("Config file loading disabled via CLI flag.");
            return Ok(None);
        }

        let Some(p_str) = cli_config_file else {
            let default_path = project_root
                .join(DEFAULT_CONFIG_DIR)
                .join(DEFAULT_CONFIG_FILENAME);
            if default_path.exists() {
                log::debug!("Using default config file path: {}", default_path.display());
                return Ok(Some(default_path));
            }
            log::debug!(
                "No config file specified and default not found at: {}",
                default_path.display()
            );
            return Ok(None);
        };

        let mut path = PathBuf::from(shellexpand::tilde(p_str).as_ref());
        let looks_like_path =
            path.is_absolute() || path.components().count() > 1 || p_str.contains(['/', '\\']);

        if looks_like_path {
            if !path.exists() && path.extension().is_none() {
                path.set_extension("toml");
            }
            if !path.exists() {
                return Err(AppError::Config(format!(
                    "Specified config file not found at path: {}",
                    path.display()
                )));
            }
            log::debug!("Using specified config file path: {}", path.display());
            return Ok(Some(path));
        }

        let filename = if path.extension().is_none_or(|e| e != "toml") {
            format!("{}.toml", path.to_string_lossy())
        } else {
            path.to_string_lossy().to_string()
        };
        let config_dir = project_root.join(DEFAULT_CONFIG_DIR);
        let full_path = config_dir.join(filename);
        if !full_path.exists() {
            return Err(AppError::Config(format!(
                "Specified config file '{}' not found in default directory: {}",
                path.display(),
                config_dir.display()
            )));
        }
        log::debug!(
            "Using specified config filename in default directory: {}",
            full_path.display()
        );
        Ok(Some(full_path))
    }

    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        log::info!("Loading configuration from: {}", config_path.display());
        let toml_content = fs::read_to_string(config_path).map_err(|e| AppError::FileRead {
            path: config_path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&toml_content).map_err(|e| match e {
            AppError::TomlParse(msg) => AppError::TomlParse(format!(
                "Error parsing config file '{}': {}. Check TOML syntax and structure.",
                config_path.display(),
                msg
            )),
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str::<Config>(content).map_err(|e| AppError::TomlParse(e.to_string()))
    }

    pub fn default_toml() -> Result<String> {
        Ok(toml::to_string_pretty(&Config::default())?)
    }

    pub fn get_effective_project_name(&self, project_root: &Path) -> String {
        self.general.project_name.clone().unwrap_or_else(|| {
            project_root
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "UnknownProject".to_string())
        })
    }

    /// The effective exclusion tables: built-in or replaced, plus extras.
    /// Empty when exclusions are disabled.
    pub fn exclusion_tables(&self) -> ExclusionTables {
        let exclusions = &self.exclusions;
        if !exclusions.enabled {
            return ExclusionTables::empty();
        }
        let builtin = ExclusionTables::builtin();
        let mut folders = exclusions.folders.clone().unwrap_or(builtin.folders);
        let mut files = exclusions.files.clone().unwrap_or(builtin.files);
        folders.extend(exclusions.extra_folders.iter().cloned());
        files.extend(exclusions.extra_files.iter().cloned());
        ExclusionTables { folders, files }
    }

    pub fn path_matcher(&self) -> Result<PathMatcher> {
        if !self.exclusions.enabled {
            log::debug!("Default exclusions disabled in configuration.");
            return Ok(PathMatcher::disabled());
        }
        PathMatcher::new(&self.exclusion_tables())
    }

    pub fn max_file_size_bytes(&self) -> Result<u64> {
        parse_size(&self.bundle.max_file_size)
    }

    pub fn bundle_options(&self) -> Result<BundleOptions> {
        let max_file_size = self.max_file_size_bytes()?;
        if max_file_size == 0 {
            log::warn!(
                "bundle.max_file_size is 0; falling back to {} bytes",
                DEFAULT_MAX_FILE_SIZE
            );
        }
        Ok(BundleOptions {
            max_file_size: if max_file_size == 0 {
                DEFAULT_MAX_FILE_SIZE
            } else {
                max_file_size
            },
            strip_path_comments: self.bundle.strip_path_comments,
        })
    }

    pub fn scan_options(&self, content: ContentMode) -> ScanOptions {
        ScanOptions {
            use_gitignore: self.general.use_gitignore,
            include_hidden: self.general.include_hidden,
            content,
        }
    }

    /// Where `bundle --save` writes. Relative paths resolve against the root.
    pub fn bundle_output_path(&self, project_root: &Path) -> PathBuf {
        if self.bundle.output_file.is_absolute() {
            self.bundle.output_file.clone()
        } else {
            project_root.join(&self.bundle.output_file)
        }
    }

    /// Tree path of the saved bundle when it lands inside `project_root`.
    pub fn bundle_output_key(&self, project_root: &Path) -> Option<String> {
        let output = self.bundle_output_path(project_root);
        let relative = output.strip_prefix(project_root).ok()?;
        tree_key(&relative.to_string_lossy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert!(!config.general.use_gitignore);
        assert_eq!(config.output.format, "text");
        assert_eq!(config.bundle_options().unwrap(), BundleOptions::default());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = Config::from_toml_str("[bundle]\nmax_size = 3\n").unwrap_err();
        assert!(matches!(err, AppError::TomlParse(_)));
    }

    #[test]
    fn exclusion_tables_replace_and_extend_builtins() {
        let config = Config::from_toml_str(
            r#"
            [exclusions]
            folders = ["vendor"]
            extra_files = ["*.snap"]
            "#,
        )
        .unwrap();
        let tables = config.exclusion_tables();
        assert_eq!(tables.folders, vec!["vendor".to_string()]);
        assert!(tables.files.iter().any(|f| f == "*.min.js"));
        assert_eq!(tables.files.last().map(String::as_str), Some("*.snap"));

        let matcher = config.path_matcher().unwrap();
        assert!(matcher.is_excluded_by_default("vendor", true));
        assert!(!matcher.is_excluded_by_default("node_modules", true));
        assert!(matcher.is_excluded_by_default("ui.snap", false));
    }

    #[test]
    fn disabled_exclusions_exclude_nothing() {
        let config = Config::from_toml_str("[exclusions]\nenabled = false\n").unwrap();
        assert!(config.exclusion_tables().folders.is_empty());
        assert!(!config.path_matcher().unwrap().is_excluded_by_default("target", true));
    }

    #[test]
    fn sizes_accept_units_and_raw_numbers() {
        assert_eq!(parse_size("1 MiB").unwrap(), 1024 * 1024);
        assert_eq!(parse_size("2048").unwrap(), 2048);
        assert_eq!(parse_size("512 KiB").unwrap(), 512 * 1024);
        assert!(parse_size("lots").is_err());
    }

    #[test]
    fn default_toml_round_trips() {
        let text = Config::default_toml().unwrap();
        assert!(text.contains("[bundle]"));
        assert_eq!(Config::from_toml_str(&text).unwrap(), Config::default());
    }

    #[test]
    fn config_path_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        assert_eq!(Config::resolve_config_path(root, None, false).unwrap(), None);

        let config_dir = root.join(DEFAULT_CONFIG_DIR);
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join(DEFAULT_CONFIG_FILENAME), "").unwrap();
        fs::write(config_dir.join("strict.toml"), "").unwrap();

        assert_eq!(
            Config::resolve_config_path(root, None, false).unwrap(),
            Some(config_dir.join(DEFAULT_CONFIG_FILENAME))
        );
        assert_eq!(
            Config::resolve_config_path(root, Some(&"strict".to_string()), false).unwrap(),
            Some(config_dir.join("strict.toml"))
        );
        assert_eq!(Config::resolve_config_path(root, None, true).unwrap(), None);
        assert!(Config::resolve_config_path(root, Some(&"nope".to_string()), false).is_err());
    }

    #[test]
    fn project_name_falls_back_to_directory_name() {
        let config = Config::default();
        assert_eq!(config.get_effective_project_name(Path::new("/work/demo")), "demo");
        let named = Config::from_toml_str("[general]\nproject_name = \"x\"\n").unwrap();
        assert_eq!(named.get_effective_project_name(Path::new("/work/demo")), "x");
    }

    #[test]
    fn bundle_output_key_only_for_paths_inside_the_root() {
        let root = Path::new("/work/project");
        let mut config = Config::default();
        assert_eq!(
            config.bundle_output_key(root).as_deref(),
            Some(DEFAULT_OUTPUT_FILE)
        );

        config.bundle.output_file = PathBuf::from("/work/project/out/b.txt");
        assert_eq!(config.bundle_output_key(root).as_deref(), Some("out/b.txt"));

        config.bundle.output_file = PathBuf::from("/tmp/b.txt");
        assert_eq!(config.bundle_output_key(root), None);

        config.bundle.output_file = PathBuf::from("../b.txt");
        assert_eq!(config.bundle_output_key(root), None);
    }
}
