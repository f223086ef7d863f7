use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::create_dir_all(root.join("node_modules/lib")).unwrap();
    fs::write(root.join("README.md"), "# Hi").unwrap();
    fs::write(root.join("src/index.js"), "console.log(1)").unwrap();
    fs::write(root.join("node_modules/lib/a.js"), "a").unwrap();
    dir
}

fn xbundle(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("xbundle").unwrap();
    cmd.env("NO_COLOR", "1").current_dir(root);
    cmd
}

#[test]
fn scan_marks_default_exclusions() {
    let dir = project();
    xbundle(dir.path())
        .args(["scan", "--disable-config-file", "--project-root"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("[-] node_modules/"))
        .stdout(predicate::str::contains("[x] index.js"))
        .stdout(predicate::str::contains("Selected 2 of 2 files"));
}

#[test]
fn bundle_to_stdout_has_totals_and_markers() {
    let dir = project();
    xbundle(dir.path())
        .args(["bundle", "--stdout", "--disable-config-file", "--project-root"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Total files: 2, Total lines: 2"))
        .stdout(predicate::str::contains("##### FILE: src/index.js #####"))
        .stdout(predicate::str::contains("node_modules").not());
}

#[test]
fn forced_excluded_file_is_bundled() {
    let dir = project();
    xbundle(dir.path())
        .args(["bundle", "--stdout", "--disable-config-file"])
        .args(["--force", "node_modules/lib/a.js", "--project-root"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Total files: 3, Total lines: 3"))
        .stdout(predicate::str::contains("##### FILE: node_modules/lib/a.js #####"));
}

#[test]
fn only_and_skip_narrow_the_selection() {
    let dir = project();
    xbundle(dir.path())
        .args(["bundle", "--stdout", "--disable-config-file"])
        .args(["--only", "*.js", "--project-root"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Total files: 1, Total lines: 1"))
        .stdout(predicate::str::contains("README.md").not());

    xbundle(dir.path())
        .args(["bundle", "--stdout", "--disable-config-file"])
        .args(["--skip", "*.md", "--project-root"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Total files: 1, Total lines: 1"));
}

#[test]
fn bundle_save_writes_output_file() {
    let dir = project();
    let target = dir.path().join("exports/bundle.txt");
    xbundle(dir.path())
        .args(["bundle", "--disable-config-file", "--save"])
        .arg(&target)
        .arg("--project-root")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Bundle saved to"))
        .stdout(predicate::str::contains("(2 files, "));

    let saved = fs::read_to_string(&target).unwrap();
    assert!(saved.starts_with("PROJECT BUNDLE FOR AI ANALYSIS\n"));
    assert!(saved.ends_with("##### END FILE #####\n"));
}

#[test]
fn bundle_json_reports_counts() {
    let dir = project();
    let out = xbundle(dir.path())
        .args(["bundle", "-f", "json", "--disable-config-file", "--project-root"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(out.status.success());
    let text = String::from_utf8(out.stdout).unwrap();
    assert!(text.contains("\"totalFiles\": 2"));
    assert!(text.contains("\"totalLines\": 2"));
}

#[test]
fn empty_selection_is_an_input_error() {
    let dir = project();
    xbundle(dir.path())
        .args(["bundle", "--stdout", "--disable-config-file"])
        .args(["--only", "*.rs", "--project-root"])
        .arg(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No files selected"));
}

#[test]
fn unknown_force_path_fails() {
    let dir = project();
    xbundle(dir.path())
        .args(["bundle", "--stdout", "--disable-config-file"])
        .args(["--force", "missing.js", "--project-root"])
        .arg(dir.path())
        .assert()
        .code(5)
        .stderr(predicate::str::contains("missing.js"));
}

#[test]
fn file_prints_raw_content() {
    let dir = project();
    xbundle(dir.path())
        .args(["file", "README.md", "--disable-config-file", "--project-root"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::diff("# Hi\n"));
}

#[test]
fn file_outside_root_is_rejected() {
    let dir = project();
    xbundle(dir.path())
        .args(["file", "../etc/passwd", "--disable-config-file", "--project-root"])
        .arg(dir.path())
        .assert()
        .code(1);
}

#[test]
fn config_prints_default_toml() {
    let dir = project();
    xbundle(dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("[bundle]"))
        .stdout(predicate::str::contains("max_file_size"));
}

#[test]
fn config_file_extends_exclusions() {
    let dir = project();
    let cfg_dir = dir.path().join(".xtools/xbundle");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(
        cfg_dir.join("xbundle.toml"),
        "[exclusions]\nextra_folders = [\"src\", \".xtools\"]\n",
    )
    .unwrap();

    xbundle(dir.path())
        .args(["bundle", "--stdout", "--project-root"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Total files: 1, Total lines: 1"));
}

#[test]
fn saved_bundle_is_not_fed_into_the_next_one() {
    let dir = project();
    for _ in 0..2 {
        xbundle(dir.path())
            .args(["bundle", "--disable-config-file", "--save", "--project-root"])
            .arg(dir.path())
            .assert()
            .success();
    }

    let saved = fs::read_to_string(dir.path().join("project-bundle.txt")).unwrap();
    assert_eq!(saved.matches("PROJECT BUNDLE FOR AI ANALYSIS").count(), 1);
    assert!(saved.contains("Total files: 2, Total lines: 2"));
    assert!(!saved.contains("##### FILE: project-bundle.txt #####"));

    xbundle(dir.path())
        .args(["scan", "--disable-config-file", "--project-root"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("project-bundle.txt").not());
}

#[test]
fn stats_prints_summary_and_file_table() {
    let dir = project();
    xbundle(dir.path())
        .args(["stats", "--disable-config-file", "--project-root"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Selection Summary"))
        .stdout(predicate::str::contains("2 of 2"))
        .stdout(predicate::str::contains("Tokens"))
        .stdout(predicate::str::contains("src/index.js"));
}

#[test]
fn stats_json_uses_camel_case() {
    let dir = project();
    let out = xbundle(dir.path())
        .args(["stats", "-f", "json", "--disable-config-file", "--project-root"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(out.status.success());
    let text = String::from_utf8(out.stdout).unwrap();
    assert!(text.contains("\"selectedFiles\": 2"));
    assert!(text.contains("\"estimatedTokens\""));
    assert!(text.contains("\"bytesReadable\""));
    assert!(!text.contains("selected_files"));
}

#[test]
fn scan_filter_shows_matches_and_their_folders() {
    let dir = project();
    xbundle(dir.path())
        .args(["scan", "--filter", "INDEX", "--disable-config-file", "--project-root"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("src/"))
        .stdout(predicate::str::contains("index.js"))
        .stdout(predicate::str::contains("README.md").not())
        .stdout(predicate::str::contains("1 matching files"));
}

#[test]
fn scan_can_hide_excluded_entries() {
    let dir = project();
    xbundle(dir.path())
        .args(["scan", "--hide-excluded", "--disable-config-file", "--project-root"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("node_modules").not())
        .stdout(predicate::str::contains("README.md"));
}

#[test]
fn scan_marks_partially_selected_folders() {
    let dir = project();
    fs::write(dir.path().join("src/extra.js"), "x").unwrap();
    xbundle(dir.path())
        .args(["scan", "--skip", "src/extra.js", "--disable-config-file", "--project-root"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("[~] src/"))
        .stdout(predicate::str::contains("[ ] extra.js"))
        .stdout(predicate::str::contains("[x] index.js"));
}

#[test]
fn listing_file_replaces_the_walk() {
    let dir = project();
    let lists = TempDir::new().unwrap();
    let listing = lists.path().join("paths.txt");
    fs::write(&listing, "README.md\n./src/index.js\n../outside.txt\n").unwrap();

    xbundle(dir.path())
        .args(["bundle", "--stdout", "--disable-config-file", "--paths-from"])
        .arg(&listing)
        .arg("--project-root")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Total files: 2, Total lines: 2"))
        .stdout(predicate::str::contains("##### FILE: src/index.js #####"));
}

#[test]
fn path_comments_are_stripped_unless_kept() {
    let dir = project();
    fs::write(dir.path().join("src/util.js"), "// src/util.js\nexport {}").unwrap();

    xbundle(dir.path())
        .args(["bundle", "--stdout", "--only", "src/util.js", "--disable-config-file"])
        .arg("--project-root")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("##### FILE: src/util.js #####\nexport {}"));

    xbundle(dir.path())
        .args(["bundle", "--stdout", "--only", "src/util.js", "--disable-config-file"])
        .args(["--keep-path-comments", "--project-root"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "##### FILE: src/util.js #####\n// src/util.js\nexport {}",
        ));
}

#[test]
fn max_file_size_skips_large_files() {
    let dir = project();
    xbundle(dir.path())
        .args(["bundle", "--stdout", "--max-file-size", "10", "--disable-config-file"])
        .arg("--project-root")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Total files: 1, Total lines: 1"))
        .stdout(predicate::str::contains("##### FILE: src/index.js #####").not())
        .stderr(predicate::str::contains("Skipped src/index.js"));
}
