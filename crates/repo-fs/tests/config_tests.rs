use pretty_assertions::assert_eq;
use repo_fs::{ConfigStore, Error};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use tempfile::TempDir;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct TestDocument {
    name: String,
    repositories: BTreeMap<String, String>,
}

fn sample() -> TestDocument {
    TestDocument {
        name: "mirror".into(),
        repositories: BTreeMap::from([("r1".into(), "https://example.com/a".into())]),
    }
}

#[test]
fn test_load_toml() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("satis.toml");
    fs::write(
        &path,
        r#"name = "mirror"

[repositories]
r1 = "https://example.com/a"
"#,
    )
    .unwrap();

    let doc: Option<TestDocument> = ConfigStore::new().load(&path).unwrap();
    assert_eq!(doc, Some(sample()));
}

#[test]
fn test_load_json() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("satis.json");
    fs::write(
        &path,
        r#"{"name": "mirror", "repositories": {"r1": "https://example.com/a"}}"#,
    )
    .unwrap();

    let doc: Option<TestDocument> = ConfigStore::new().load(&path).unwrap();
    assert_eq!(doc, Some(sample()));
}

#[test]
fn test_load_yaml() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("satis.yaml");
    fs::write(&path, "name: mirror\nrepositories:\n  r1: https://example.com/a\n").unwrap();

    let doc: Option<TestDocument> = ConfigStore::new().load(&path).unwrap();
    assert_eq!(doc, Some(sample()));
}

#[test]
fn test_save_json_is_pretty() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("satis.json");

    ConfigStore::new().save(&path, &sample()).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("\n  \"name\": \"mirror\""));
    assert!(content.ends_with('\n'));
}

#[test]
fn test_roundtrip_toml() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("satis.toml");
    let store = ConfigStore::new();

    store.save(&path, &sample()).unwrap();
    let loaded: Option<TestDocument> = store.load(&path).unwrap();

    assert_eq!(loaded, Some(sample()));
}

#[test]
fn test_unsupported_format() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("satis.xyz");
    fs::write(&path, "data").unwrap();

    let result: repo_fs::Result<Option<TestDocument>> = ConfigStore::new().load(&path);

    assert!(matches!(result, Err(Error::UnsupportedFormat { .. })));
}

#[test]
fn test_invalid_json_reports_parse_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("satis.json");
    fs::write(&path, "{ not json").unwrap();

    let result: repo_fs::Result<Option<TestDocument>> = ConfigStore::new().load(&path);

    match result {
        Err(Error::ConfigParse { format, .. }) => assert_eq!(format, "JSON"),
        other => panic!("Expected ConfigParse, got {:?}", other),
    }
}

#[test]
fn test_missing_or_blank_file_loads_none() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("missing.json");
    let blank = temp.path().join("blank.yaml");
    fs::write(&blank, "\n  \n").unwrap();

    let store = ConfigStore::new();

    assert_eq!(store.load::<TestDocument>(&missing).unwrap(), None);
    assert_eq!(store.load::<TestDocument>(&blank).unwrap(), None);
}

#[test]
fn test_save_toml_drops_nulls() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("satis.toml");
    let document = serde_json::json!({
        "name": "mirror",
        "archive": null,
        "repositories": {"r1": "https://example.com/a", "r2": null}
    });

    ConfigStore::new().save(&path, &document).unwrap();
    let loaded: Option<TestDocument> = ConfigStore::new().load(&path).unwrap();

    assert_eq!(loaded, Some(sample()));
}
