use repo_fs::{LockFile, RobustnessConfig, io};
use std::fs;
use tempfile::TempDir;

fn fast() -> RobustnessConfig {
    RobustnessConfig {
        enable_fsync: false,
        ..RobustnessConfig::default()
    }
}

#[test]
fn test_write_atomic_creates_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("satis.json");

    io::write_atomic(&path, b"{}", fast()).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content, "{}");
}

#[test]
fn test_write_atomic_overwrites_existing() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("satis.json");
    fs::write(&path, "original").unwrap();

    io::write_atomic(&path, b"updated", fast()).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "updated");
}

#[test]
fn test_write_atomic_creates_parent_directories() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("a").join("b").join("satis.json");

    io::write_atomic(&path, b"deep", fast()).unwrap();

    assert_eq!(io::read_text(&path).unwrap(), "deep");
}

#[test]
fn test_write_atomic_leaves_no_temp_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("satis.json");

    io::write_atomic(&path, b"content", RobustnessConfig::default()).unwrap();

    let leftovers: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "Found temp files: {:?}", leftovers);
}

#[test]
fn test_write_atomic_fails_while_lock_is_held() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("satis.json");
    fs::write(&path, "original").unwrap();

    let _held = LockFile::try_acquire(LockFile::path_for(&path))
        .unwrap()
        .unwrap();

    let config = RobustnessConfig {
        enable_fsync: false,
        lock_timeout: std::time::Duration::from_millis(100),
    };
    let result = io::write_atomic(&path, b"new content", config);

    assert!(result.is_err(), "Write should fail when lock is held");
    assert_eq!(fs::read_to_string(&path).unwrap(), "original");
}

#[test]
fn test_read_text_nonexistent_file_is_not_found() {
    let temp = TempDir::new().unwrap();
    let err = io::read_text(&temp.path().join("missing.json")).unwrap_err();

    assert!(err.is_not_found());
}
