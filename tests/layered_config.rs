//! Layered configuration: merge semantics and persistence

use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;
use wpbundle::config::{load_project, Registry, Scope};
use wpbundle::LayeredConfig;

#[test]
fn test_empty_override_keeps_fallback_collection() {
    let mut config = LayeredConfig::with_fallbacks(json!({"include": ["*"]}));
    config.set("include", json!([]), Registry::Defaults).unwrap();
    config.set("include", json!([]), Registry::Overrides).unwrap();

    assert_eq!(config.merged()["include"], json!(["*"]));
}

#[test]
fn test_non_empty_override_replaces_collection() {
    let mut config = LayeredConfig::with_fallbacks(json!({"include": ["*", "src"]}));
    config.set("include", json!(["a.txt"]), Registry::Overrides).unwrap();

    assert_eq!(config.merged()["include"], json!(["a.txt"]));
}

#[test]
fn test_objects_merge_recursively() {
    let mut config = LayeredConfig::default();
    config
        .set("composer.binary", json!("/usr/local/bin/composer"), Registry::Defaults)
        .unwrap();
    config
        .set("composer.install", json!(false), Registry::Overrides)
        .unwrap();

    let merged = config.merged();
    assert_eq!(merged["composer"]["binary"], "/usr/local/bin/composer");
    assert_eq!(merged["composer"]["install"], false);
    assert_eq!(merged["composer"]["args"][0], "install");
}

fn sample_tree() -> Value {
    json!({
        "output": "release",
        "clean": false,
        "retries": 3,
        "exclude": ["tests", "node_modules", ".github"],
        "archive": {"enabled": true, "name": "my-plugin", "format": "zip"}
    })
}

#[test]
fn test_round_trip_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("wpbundle.json");

    let mut config = LayeredConfig::empty();
    for (key, value) in sample_tree().as_object().unwrap() {
        config.set(key, value.clone(), Registry::Defaults).unwrap();
    }
    config
        .save(Scope::Registry(Registry::Defaults), &path, None, false)
        .unwrap();

    let mut reloaded = LayeredConfig::empty();
    reloaded.load(&path, None, Registry::Defaults).unwrap();

    assert_eq!(reloaded.registry(Registry::Defaults), &sample_tree());
}

#[test]
fn test_round_trip_toml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("wpbundle.toml");

    let mut config = LayeredConfig::empty();
    for (key, value) in sample_tree().as_object().unwrap() {
        config.set(key, value.clone(), Registry::Overrides).unwrap();
    }
    config
        .save(Scope::Registry(Registry::Overrides), &path, None, false)
        .unwrap();

    let mut reloaded = LayeredConfig::empty();
    reloaded.load(&path, None, Registry::Overrides).unwrap();

    assert_eq!(reloaded.registry(Registry::Overrides), &sample_tree());
}

#[test]
fn test_round_trip_under_key() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("composer.json");
    fs::write(
        &path,
        r#"{"name": "acme/my-plugin", "require": {"php": ">=8.1"}}"#,
    )
    .unwrap();

    let mut config = LayeredConfig::empty();
    for (key, value) in sample_tree().as_object().unwrap() {
        config.set(key, value.clone(), Registry::Defaults).unwrap();
    }
    config
        .save(Registry::Defaults.into(), &path, Some("extra.wpbundle"), false)
        .unwrap();

    let mut reloaded = LayeredConfig::empty();
    reloaded
        .load(&path, Some("extra.wpbundle"), Registry::Defaults)
        .unwrap();
    assert_eq!(reloaded.registry(Registry::Defaults), &sample_tree());

    let document: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(document["name"], "acme/my-plugin");
    assert_eq!(document["require"]["php"], ">=8.1");
}

#[test]
fn test_project_config_round_trip_through_binding() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("composer.json"),
        r#"{"name": "acme/my-plugin", "extra": {"wpbundle": {"output": "build"}}}"#,
    )
    .unwrap();

    let mut config = LayeredConfig::default();
    load_project(&mut config, dir.path()).unwrap();
    config
        .set("exclude", json!(["tests"]), Registry::Defaults)
        .unwrap();
    config.save_bound(Registry::Defaults, false).unwrap();

    let mut reloaded = LayeredConfig::default();
    load_project(&mut reloaded, dir.path()).unwrap();

    assert_eq!(reloaded.get_str("output").unwrap(), "build");
    assert_eq!(reloaded.get_string_list("exclude").unwrap(), vec!["tests"]);
    assert_eq!(reloaded.get_str("include_file").unwrap(), ".wpinclude");
}
