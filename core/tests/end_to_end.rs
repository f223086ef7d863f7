use std::fs;
use xbundle_core::{
    BundleOptions, ContentMode, FileSystemEntry, PathMatcher, ProjectSession, ProjectTree,
    ScanOptions, SelectionModel, TriState, decode, generate_bundle, scan_directory,
};

fn write_project(root: &std::path::Path) {
    fs::create_dir_all(root.join("src/build")).unwrap();
    fs::create_dir_all(root.join("node_modules/lib")).unwrap();
    fs::write(root.join("README.md"), "# Hi").unwrap();
    fs::write(root.join("src/index.js"), "console.log(1)").unwrap();
    fs::write(root.join("src/build/x.js"), "// src/build/x.js\nlet x = 1;\n").unwrap();
    fs::write(root.join("node_modules/lib/a.js"), "a").unwrap();
}

#[test]
fn listing_to_bundle_with_default_tables() {
    let entries = vec![
        FileSystemEntry::text("README.md", "# Hi"),
        FileSystemEntry::text("src/index.js", "console.log(1)"),
        FileSystemEntry::text("node_modules/lib/a.js", "a"),
    ];
    let tree = ProjectTree::build(&entries, &PathMatcher::builtin().unwrap());
    assert!(tree.find("node_modules").unwrap().is_excluded_effective);
    assert!(tree.find("node_modules/lib/a.js").unwrap().is_excluded_effective);

    let selection = SelectionModel::with_default_selection(&tree);
    assert_eq!(
        selection.bundle_paths(&tree),
        vec!["src/index.js".to_string(), "README.md".to_string()]
    );

    let files: Vec<_> = ["README.md", "src/index.js"]
        .iter()
        .map(|p| match &entries.iter().find(|e| e.relative_path == *p).unwrap().content {
            xbundle_core::EntryContent::Text(t) => xbundle_core::BundleFile::new(*p, t.clone()),
            other => panic!("unexpected content {:?}", other),
        })
        .collect();
    let text = xbundle_core::encode(&files);
    assert!(text.contains("\nTotal files: 2, Total lines: 2\n"));
    assert_eq!(decode(&text).unwrap().files, files);
}

#[test]
fn walked_project_to_bundle() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());

    let entries = scan_directory(
        dir.path(),
        &ScanOptions {
            content: ContentMode::Deferred,
            ..ScanOptions::default()
        },
    )
    .unwrap();
    let matcher = PathMatcher::builtin().unwrap();
    let mut session = ProjectSession::new();
    let job = session.load(&entries, &matcher);
    let result = job.run();
    assert!(result.failures.is_empty());
    assert!(session.apply_hydration(&result));

    let tree = session.tree();
    assert_eq!(tree.find("src/build/x.js").unwrap().line_count, 3);

    let x = tree.find("src/build/x.js").unwrap();
    let (forced, _) = session.selection().toggle_file(x);
    let (selected, _) = forced.toggle_file(x);
    session.set_selection(selected);

    let src = session.tree().find("src").unwrap();
    assert_eq!(session.selection().folder_selection_state(src), TriState::All);

    let paths = session.selection().bundle_paths(session.tree());
    assert_eq!(paths, vec!["src/build/x.js", "src/index.js", "README.md"]);

    let generated = generate_bundle(dir.path(), &paths, &BundleOptions::default()).unwrap();
    assert!(generated.skipped.is_empty());
    assert_eq!(generated.bundle.total_files, 3);
    assert_eq!(generated.bundle.total_lines, 2 + 1 + 1);

    let decoded = decode(&generated.bundle.text).unwrap();
    assert_eq!(decoded.files[0].path, "src/build/x.js");
    assert_eq!(decoded.files[0].content, "let x = 1;\n");
    assert_eq!(decoded.total_files, Some(3));
}
