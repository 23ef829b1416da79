//! CLI end-to-end tests: exercise the compiled `spacesaver` binary directly.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

fn spacesaver_cmd() -> Command {
    Command::cargo_bin("spacesaver").unwrap()
}

#[test]
fn help_flag_lists_subcommands() {
    let mut cmd = spacesaver_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("spacesaver"))
        .stdout(predicate::str::contains("scan"))
        .stdout(predicate::str::contains("probe"));
}

#[test]
fn version_flag_prints_crate_version() {
    let mut cmd = spacesaver_cmd();
    cmd.arg("--version").assert().success().stdout(predicate::str::contains("spacesaver"));
}

#[test]
fn probe_help_mentions_the_path_argument() {
    let mut cmd = spacesaver_cmd();
    cmd.args(["probe", "--help"]).assert().success().stdout(predicate::str::contains("PATH"));
}

#[test]
fn probe_nonexistent_file_fails() {
    let mut cmd = spacesaver_cmd();
    cmd.args(["probe", "/no/such/file.mkv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("exist"));
}

#[test]
fn scan_over_fixture_tree_reports_one_added_entry() {
    let source = tempdir().unwrap();
    let state = tempdir().unwrap();
    fs::write(source.path().join("Movie.2020.1080p.mkv"), vec![0u8; 256]).unwrap();

    let config_path = state.path().join("config.toml");
    fs::write(
        &config_path,
        format!(
            "source_dirs = [\"{}\"]\ndest_dir = \"{}\"\n",
            source.path().display(),
            state.path().display(),
        ),
    )
    .unwrap();

    let mut cmd = spacesaver_cmd();
    cmd.args(["--config", config_path.to_str().unwrap(), "scan"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"added\":1"));
}

#[test]
fn check_tools_reports_missing_binaries() {
    let mut cmd = spacesaver_cmd();
    cmd.env("SPACESAVER_FFMPEG_PATH", "/no/such/ffmpeg")
        .env("SPACESAVER_FFPROBE_PATH", "/no/such/ffprobe")
        .arg("check-tools")
        .assert()
        .failure()
        .stdout(predicate::str::contains("MISSING"));
}
