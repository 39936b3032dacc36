//! Common test fixtures for archivarius testing

use crate::TestDir;
use anyhow::{ensure, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const DIGITS: &[u8] = b"123456789012";

/// Names of the numbered fixtures; file `n` is `n` bytes long
pub const NUMBERED_NAMES: [&str; 12] = [
    "one.txt",
    "two.txt",
    "three.txt",
    "four.txt",
    "five.txt",
    "six.txt",
    "seven.txt",
    "eight.txt",
    "nine.txt",
    "ten.txt",
    "eleven.txt",
    "twelve.txt",
];

/// Name and content of numbered fixture `n` (1..=12)
pub fn numbered(n: usize) -> Result<(&'static str, &'static [u8])> {
    ensure!(
        (1..=NUMBERED_NAMES.len()).contains(&n),
        "numbered fixtures go from 1 to {}, got {}",
        NUMBERED_NAMES.len(),
        n
    );
    Ok((NUMBERED_NAMES[n - 1], &DIGITS[..n]))
}

/// Names and contents of the numbered fixtures `ns`, in order
pub fn numbered_files(ns: &[usize]) -> Result<Vec<(&'static str, &'static [u8])>> {
    ns.iter().map(|&n| numbered(n)).collect()
}

/// Writes the numbered fixtures `ns` into `dir` (relative to the test dir)
pub fn create_numbered_files(test_dir: &TestDir, dir: &str, ns: &[usize]) -> Result<PathBuf> {
    let root = test_dir.create_dir(dir)?;
    for &n in ns {
        let (name, content) = numbered(n)?;
        test_dir.create_file(&format!("{}/{}", dir, name), content)?;
    }
    Ok(root)
}

/// Writes a JSON file next to the numbered fixtures, used for filter tests
pub fn create_json_file(test_dir: &TestDir, dir: &str) -> Result<PathBuf> {
    test_dir.create_file(&format!("{}/uno.json", dir), br#"["blue", "green"]"#)
}

/// Nested content that must never be picked up by a build
pub fn create_nested_files(test_dir: &TestDir, dir: &str) -> Result<()> {
    test_dir.create_file(&format!("{}/inner/inner1.txt", dir), b"inner")?;
    test_dir.create_file(&format!("{}/inner/inner/inner2.txt", dir), b"double inner")?;
    Ok(())
}

/// Entry of a hand-built container
pub enum ZipFixture<'a> {
    /// Regular file entry
    File(&'a str, &'a [u8]),
    /// Directory marker; the name should end with `/`
    Dir(&'a str),
}

/// Writes a container with exactly the given entries, in order
pub fn write_zip(path: &Path, entries: &[ZipFixture<'_>]) -> Result<()> {
    let mut zip = ZipWriter::new(File::create(path)?);
    let options = SimpleFileOptions::default();

    for entry in entries {
        match entry {
            ZipFixture::File(name, content) => {
                zip.start_file(*name, options)?;
                zip.write_all(content)?;
            }
            ZipFixture::Dir(name) => {
                zip.add_directory(*name, options)?;
            }
        }
    }

    zip.finish()?;
    Ok(())
}
