use archivarius_testing::assertions::assert_dir_files;
use archivarius_testing::fixtures::{create_json_file, create_numbered_files, numbered_files};
use archivarius_testing::TestDir;
use assert_cmd::Command;
use predicates::prelude::*;

/// Command isolated from the user's configuration
fn archivarius(test_dir: &TestDir) -> Command {
    let config = test_dir
        .create_file("config.toml", b"[archive]\ncompression = \"deflated\"\n")
        .unwrap();
    let mut cmd = Command::cargo_bin("archivarius").unwrap();
    cmd.env("ARCHIVARIUS_CONFIG", config).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help() {
    let test_dir = TestDir::new().unwrap();
    archivarius(&test_dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("compress"))
        .stdout(predicate::str::contains("extract"))
        .stdout(predicate::str::contains("serve"));
}

#[test]
fn test_compress_and_extract() {
    let test_dir = TestDir::new().unwrap();
    let src = create_numbered_files(&test_dir, "src", &[1, 2, 3, 4, 5, 6]).unwrap();
    create_json_file(&test_dir, "src").unwrap();
    let archive = test_dir.join("out.zip");
    let dst = test_dir.join("dst");

    archivarius(&test_dir)
        .args(["compress", src.to_str().unwrap(), "-o", archive.to_str().unwrap()])
        .args(["--filter", "*.txt", "--limit", "4"])
        .assert()
        .success()
        .stdout("six.txt\nfive.txt\nfour.txt\nthree.txt\n");

    archivarius(&test_dir)
        .args(["extract", archive.to_str().unwrap(), "--list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("four.txt"))
        .stdout(predicate::str::contains("uno.json").not());

    archivarius(&test_dir)
        .args(["-q", "extract", archive.to_str().unwrap(), "-o", dst.to_str().unwrap()])
        .args(["--limit", "2"])
        .assert()
        .success();

    assert_dir_files(&dst, &numbered_files(&[5, 6]).unwrap()).unwrap();
}

#[test]
fn test_missing_input_exit_code() {
    let test_dir = TestDir::new().unwrap();

    archivarius(&test_dir)
        .args(["compress", test_dir.join("nowhere").to_str().unwrap()])
        .args(["-o", test_dir.join("a.zip").to_str().unwrap()])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("nowhere"));

    archivarius(&test_dir)
        .args(["extract", test_dir.join("missing.zip").to_str().unwrap()])
        .args(["-o", test_dir.join("dst").to_str().unwrap()])
        .assert()
        .code(2);
}

#[test]
fn test_not_a_zip_exit_code() {
    let test_dir = TestDir::new().unwrap();
    let bogus = test_dir.create_file("bogus.zip", b"definitely not a zip").unwrap();

    archivarius(&test_dir)
        .args(["extract", bogus.to_str().unwrap(), "-o"])
        .arg(test_dir.join("dst"))
        .assert()
        .code(2);
}

#[test]
fn test_invalid_filter_exit_code() {
    let test_dir = TestDir::new().unwrap();
    let src = create_numbered_files(&test_dir, "src", &[1]).unwrap();

    archivarius(&test_dir)
        .args(["compress", src.to_str().unwrap(), "-o"])
        .arg(test_dir.join("a.zip"))
        .args(["--filter", "[a-"])
        .assert()
        .code(3);

    assert!(!test_dir.join("a.zip").exists());
}

#[test]
fn test_bad_arguments_exit_code() {
    let test_dir = TestDir::new().unwrap();

    archivarius(&test_dir).arg("frobnicate").assert().code(3);
    archivarius(&test_dir)
        .args(["compress", "src"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("--output"));
}

#[test]
fn test_create_error_exit_code() {
    let test_dir = TestDir::new().unwrap();
    let src = create_numbered_files(&test_dir, "src", &[1]).unwrap();
    test_dir.create_file("blocker", b"file").unwrap();

    archivarius(&test_dir)
        .args(["compress", src.to_str().unwrap(), "-o"])
        .arg(test_dir.join("blocker/a.zip"))
        .assert()
        .code(4);
}

#[test]
fn test_config_show() {
    let test_dir = TestDir::new().unwrap();

    archivarius(&test_dir)
        .args(["config", "--show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("compression = \"deflated\""))
        .stdout(predicate::str::contains("max_concurrent_jobs = 8"));

    archivarius(&test_dir)
        .args(["config", "--path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_init() {
    let test_dir = TestDir::new().unwrap();
    let target = test_dir.join("fresh/config.toml");

    archivarius(&test_dir)
        .env("ARCHIVARIUS_CONFIG", &target)
        .args(["config", "--init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));

    let written = std::fs::read_to_string(&target).unwrap();
    assert!(written.contains("compression = \"deflated\""));
    assert!(written.contains("max_concurrent_jobs = 8"));

    std::fs::write(&target, "[archive]\ncompression = \"stored\"\n").unwrap();
    archivarius(&test_dir)
        .env("ARCHIVARIUS_CONFIG", &target)
        .args(["config", "--init"])
        .assert()
        .success();
    assert!(std::fs::read_to_string(&target).unwrap().contains("stored"));
}

#[test]
fn test_broken_config_is_reported() {
    let test_dir = TestDir::new().unwrap();
    let broken = test_dir.create_file("broken.toml", b"[archive]\nlevel = 42\n").unwrap();
    let src = create_numbered_files(&test_dir, "src", &[1]).unwrap();

    archivarius(&test_dir)
        .env("ARCHIVARIUS_CONFIG", broken)
        .args(["compress", src.to_str().unwrap(), "-o"])
        .arg(test_dir.join("a.zip"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("level"));
}
