//! Entry resolution over a plugin-shaped project tree.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use wpbundle_finder::{EntrySet, FinderError, PathResolver};

fn create_plugin() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    fs::write(root.join("my-plugin.php"), "<?php // Plugin Name: My Plugin").unwrap();
    fs::write(root.join("README.MD"), "# My Plugin").unwrap();
    fs::write(root.join("composer.json"), "{}").unwrap();

    fs::create_dir_all(root.join("src/Admin")).unwrap();
    fs::write(root.join("src/Config.php"), "<?php").unwrap();
    fs::write(root.join("src/Plugin.php"), "<?php").unwrap();
    fs::write(root.join("src/Admin/Settings.php"), "<?php").unwrap();

    fs::create_dir_all(root.join("node_modules/lodash")).unwrap();
    fs::write(root.join("node_modules/lodash/index.js"), "").unwrap();

    dir
}

fn keys(set: &EntrySet) -> Vec<String> {
    set.entries().keys().map(String::from).collect()
}

// =============================================================================
// Idempotence and exact-key precedence
// =============================================================================

#[test]
fn test_include_same_pattern_twice() {
    let dir = create_plugin();

    let mut once = EntrySet::new(dir.path()).unwrap();
    once.include("src/*.php").unwrap();

    let mut twice = EntrySet::new(dir.path()).unwrap();
    twice.include("src/*.php").unwrap();
    twice.include("src/*.php").unwrap();

    assert_eq!(once.entries(), twice.entries());
}

#[test]
fn test_include_then_exclude_same_key() {
    let dir = create_plugin();

    for pattern in ["README.MD", "src", "node_modules", "*.php"] {
        let mut set = EntrySet::new(dir.path()).unwrap();
        set.include(pattern).unwrap();
        set.exclude(pattern).unwrap();

        assert!(set.entries().is_empty(), "{pattern} should be fully excluded");
        assert!(set.removal_list().is_empty());
    }
}

// =============================================================================
// Nested overrides
// =============================================================================

#[test]
fn test_nested_exclude_keeps_parent_directory() {
    let dir = create_plugin();
    let dist = dir.path().join("dist");

    let mut set = EntrySet::new(dir.path()).unwrap();
    set.include("*").unwrap();
    set.exclude("src/Config.php").unwrap();

    assert!(set.entries().contains_key("src"));
    assert_eq!(
        set.entries_to_remove(&dist),
        vec![dist.join("src").join("Config.php")]
    );
}

#[test]
fn test_child_reincluded_after_parent_excluded() {
    let dir = create_plugin();

    let mut set = EntrySet::new(dir.path()).unwrap();
    set.include("*").unwrap();
    set.exclude("src").unwrap();
    set.include("src/Config.php").unwrap();

    let entries = set.entries();
    assert!(!entries.contains_key("src"));
    assert!(entries.contains_key("src/Config.php"));
}

#[test]
fn test_reinclusion_does_not_retract_removal() {
    let dir = create_plugin();

    let mut set = EntrySet::new(dir.path()).unwrap();
    set.include("*").unwrap();
    set.exclude("src/Admin").unwrap();
    set.include("src/Admin/Settings.php").unwrap();

    assert!(set.entries().contains_key("src"));
    assert!(set.entries().contains_key("src/Admin/Settings.php"));
    assert_eq!(set.removal_list(), ["src/Admin".to_string()]);
}

#[test]
fn test_sets_never_share_a_key() {
    let dir = create_plugin();

    let mut set = EntrySet::new(dir.path()).unwrap();
    set.include("*").unwrap();
    set.exclude("node_modules").unwrap();
    set.exclude("src/*.php").unwrap();
    set.include("**/*.php").unwrap();
    set.exclude("my-plugin.php").unwrap();

    let entries = set.entries();
    for key in set.excluded().keys() {
        assert!(!entries.contains_key(key), "{key} is in both sets");
    }
    assert_eq!(
        keys(&set),
        vec!["README.MD", "composer.json", "src", "src/Admin/Settings.php"]
    );
    assert_eq!(
        set.removal_list(),
        ["src/Config.php".to_string(), "src/Plugin.php".to_string()]
    );
}

// =============================================================================
// Directory atomicity
// =============================================================================

#[test]
fn test_directory_match_is_one_entry() {
    let dir = create_plugin();
    let resolver = PathResolver::new(dir.path()).unwrap();

    let resolved = resolver.resolve("node_*").unwrap();
    assert_eq!(resolved.keys().collect::<Vec<_>>(), vec!["node_modules"]);

    let resolved = resolver.resolve("src/*.php").unwrap();
    assert_eq!(
        resolved.keys().collect::<Vec<_>>(),
        vec!["src/Config.php", "src/Plugin.php"]
    );
}

// =============================================================================
// Pattern files
// =============================================================================

fn write_list(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let mut file = fs::File::create(&path).unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    path
}

#[test]
fn test_pattern_file_skips_comments_and_blanks() {
    let dir = create_plugin();
    let list = write_list(dir.path(), ".wpinclude", &["#comment", "", "README.MD"]);

    let mut set = EntrySet::new(dir.path()).unwrap();
    set.include_from_file(&list).unwrap();

    assert_eq!(keys(&set), vec!["README.MD"]);
}

#[test]
fn test_exclude_file_drives_removal_list() {
    let dir = create_plugin();
    let list = write_list(
        dir.path(),
        ".wpexclude",
        &["# build-only", "node_modules", "src/Admin/*.php"],
    );

    let mut set = EntrySet::new(dir.path()).unwrap();
    set.include("*").unwrap();
    set.exclude_from_file(&list).unwrap();

    assert!(!set.entries().contains_key("node_modules"));
    assert_eq!(set.removal_list(), ["src/Admin/Settings.php".to_string()]);
}

#[test]
fn test_missing_and_empty_files_are_distinct() {
    let dir = create_plugin();
    let mut set = EntrySet::new(dir.path()).unwrap();

    let missing = set.exclude_from_file(&dir.path().join(".wpexclude"));
    assert!(matches!(missing, Err(FinderError::NotFound { .. })));

    let empty = write_list(dir.path(), ".wpexclude", &["# nothing yet", ""]);
    let result = set.exclude_from_file(&empty);
    assert!(matches!(result, Err(FinderError::EmptyInput { .. })));
}

#[test]
fn test_root_with_bracketed_name() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("my-plugin[dev]");
    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(root.join("plugin.php"), "<?php").unwrap();
    fs::write(root.join("src/Plugin.php"), "<?php").unwrap();

    let mut set = EntrySet::new(&root).unwrap();
    set.include("*").unwrap();
    set.exclude("src/*.php").unwrap();

    assert_eq!(keys(&set), vec!["plugin.php", "src"]);
    assert_eq!(set.removal_list(), ["src/Plugin.php".to_string()]);
}
