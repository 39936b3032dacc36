//! Common assertions for archivarius testing

use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;
use walkdir::WalkDir;

/// Asserts that `dir` holds exactly the given top-level files and contents
pub fn assert_dir_files(dir: &Path, expected: &[(&str, &[u8])]) -> Result<()> {
    let actual = collect_files(dir)?;
    let expected: BTreeMap<String, Vec<u8>> = expected
        .iter()
        .map(|(name, content)| (name.to_string(), content.to_vec()))
        .collect();

    assert_eq!(
        actual.keys().collect::<Vec<_>>(),
        expected.keys().collect::<Vec<_>>(),
        "Different files in {:?}",
        dir
    );

    for (name, content) in &expected {
        assert_eq!(&actual[name], content, "Content mismatch for {}", name);
    }

    Ok(())
}

/// Asserts that two directory structures are identical
pub fn assert_dirs_equal(dir1: &Path, dir2: &Path) -> Result<()> {
    let entries1 = collect_entries(dir1)?;
    let entries2 = collect_entries(dir2)?;

    assert_eq!(
        entries1.keys().collect::<Vec<_>>(),
        entries2.keys().collect::<Vec<_>>(),
        "Different entries in {:?} and {:?}",
        dir1,
        dir2
    );

    for (relative, content1) in &entries1 {
        assert_eq!(
            content1, &entries2[relative],
            "Content mismatch for {}",
            relative
        );
    }

    Ok(())
}

/// Asserts that a file has specific permissions (Unix only)
#[cfg(unix)]
pub fn assert_file_permissions(path: &Path, expected: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = std::fs::metadata(path)?;
    let mode = metadata.permissions().mode() & 0o777;

    assert_eq!(
        mode, expected,
        "Permission mismatch for {:?}: expected {:o}, got {:o}",
        path, expected, mode
    );

    Ok(())
}

/// Top-level regular files of `dir` with their contents
fn collect_files(dir: &Path) -> Result<BTreeMap<String, Vec<u8>>> {
    let mut files = BTreeMap::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if entry.file_type().is_file() {
            let name = entry.file_name().to_string_lossy().into_owned();
            files.insert(name, std::fs::read(entry.path())?);
        }
    }
    Ok(files)
}

/// Every entry under `dir` keyed by relative path; directories map to `None`
fn collect_entries(dir: &Path) -> Result<BTreeMap<String, Option<Vec<u8>>>> {
    let mut entries = BTreeMap::new();
    for entry in WalkDir::new(dir).min_depth(1) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(dir)?
            .to_string_lossy()
            .into_owned();
        let content = if entry.file_type().is_file() {
            Some(std::fs::read(entry.path())?)
        } else {
            None
        };
        entries.insert(relative, content);
    }
    Ok(entries)
}
