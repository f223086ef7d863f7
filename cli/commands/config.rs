use crate::cli_args::ConfigArgs;
use crate::output::{write_to_file, write_to_stdout};
use anyhow::{Context, Result};
use colored::*;
use std::io::{self, Write};
use std::path::Path;
use xbundle_core::config::{DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILENAME};
use xbundle_core::Config;

pub fn handle_config_command(args: &ConfigArgs, project_root: &Path, quiet: bool) -> Result<()> {
    let default_toml = Config::default_toml().context("Failed to serialize default config")?;

    if !args.save {
        return write_to_stdout(&default_toml);
    }

    let save_path = project_root
        .join(DEFAULT_CONFIG_DIR)
        .join(DEFAULT_CONFIG_FILENAME);
    if save_path.exists() {
        if quiet {
            anyhow::bail!(
                "Target file '{}' exists. Overwrite prevented in quiet mode.",
                save_path.display()
            );
        }
        print!(
            "{} Config file already exists at '{}'. Overwrite? [{}/{}] ",
            "⚠️".yellow(),
            save_path.display().to_string().cyan(),
            "y".green(),
            "N".red()
        );
        io::stdout().flush().context("Failed to flush stdout")?;
        let mut response = String::new();
        io::stdin()
            .read_line(&mut response)
            .context("Failed to read user input")?;
        if !response.trim().eq_ignore_ascii_case("y") {
            println!("Save cancelled.");
            return Ok(());
        }
    }

    write_to_file(&save_path, &default_toml)?;
    if !quiet {
        println!(
            "{} Default config saved to: {}",
            "✅".green(),
            save_path.display().to_string().blue()
        );
    }
    Ok(())
}
