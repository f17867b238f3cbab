//! Integration tests for the goodcheck binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn goodcheck(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("goodcheck").unwrap();
    cmd.current_dir(dir.path()).env_remove("GOODCHECK_CONFIG");
    cmd
}

// =========== Strategies Command ===========

#[test]
fn test_strategies_lists_combined() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("list.txt"),
        "_strategyCurlExtraKeys#--ipv4\n\
         _strategyPort80#--dpi-desync=fake\n\
         _strategyPort443#--dpi-desync=split2\n\
         _strategyPort443#--dpi-desync=disorder2\n",
    )
    .unwrap();

    goodcheck(&dir)
        .args(["strategies", "list.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Loaded"))
        .stdout(predicate::str::contains("--ipv4"))
        .stdout(predicate::str::contains(
            "#1 --wf-tcp=80,443 --filter-tcp=80 --dpi-desync=fake --new --filter-tcp=443 --dpi-desync=split2",
        ))
        .stdout(predicate::str::contains(
            "#2 --wf-tcp=80,443 --filter-tcp=80 --dpi-desync=fake --new --filter-tcp=443 --dpi-desync=disorder2",
        ));
}

#[test]
fn test_strategies_tokens() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("list.txt"), "--hostlist=\"my list.txt\" --new\n").unwrap();

    goodcheck(&dir)
        .args(["strategies", "list.txt", "--tokens"])
        .assert()
        .success()
        .stdout(predicate::str::contains("    --hostlist=my list.txt"))
        .stdout(predicate::str::contains("    --new"));
}

#[test]
fn test_strategies_port80_without_443_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("list.txt"), "_strategyPort80#--dpi-desync=fake\n").unwrap();

    goodcheck(&dir)
        .args(["strategies", "list.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("port-443"));
}

#[test]
fn test_strategies_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    goodcheck(&dir)
        .args(["strategies", "missing.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.txt"));
}

#[test]
fn test_strategies_uses_config_placeholders() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("list.txt"), "--dpi-desync-fake-tls-mod=sni=FAKESNI\n").unwrap();
    fs::write(
        dir.path().join("goodcheck.toml"),
        "[placeholders]\nfake_sni = \"example.org\"\n",
    )
    .unwrap();

    goodcheck(&dir)
        .args(["strategies", "list.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sni=example.org"));
}

// =========== Config Command ===========

#[test]
fn test_config_generate_then_validate() {
    let dir = TempDir::new().unwrap();

    goodcheck(&dir)
        .args(["config", "generate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("goodcheck.toml"));
    assert!(dir.path().join("goodcheck.toml").exists());

    goodcheck(&dir)
        .args(["config", "validate", "goodcheck.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));

    goodcheck(&dir)
        .args(["config", "generate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn test_config_validate_rejects_bad_passes() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("bad.toml"), "[evaluation]\npasses = 12\n").unwrap();

    goodcheck(&dir)
        .args(["config", "validate", "bad.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("evaluation.passes"));
}

#[test]
fn test_config_show_defaults() {
    let dir = TempDir::new().unwrap();
    goodcheck(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[probe]"))
        .stdout(predicate::str::contains("executable = \"curl\""))
        .stdout(predicate::str::contains("max_workers = 8"));
}

#[test]
fn test_explicit_config_flag() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("other.toml"), "[probe]\nmax_workers = 3\n").unwrap();

    goodcheck(&dir)
        .args(["-c", "other.toml", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("max_workers = 3"));
}

// =========== Misc ===========

#[test]
fn test_completions_bash() {
    let dir = TempDir::new().unwrap();
    goodcheck(&dir)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("goodcheck"));
}

#[test]
fn test_run_requires_shaper_and_strategies() {
    let dir = TempDir::new().unwrap();
    goodcheck(&dir)
        .args(["run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--shaper"));
}

#[cfg(unix)]
#[test]
fn test_run_reports_aborted_shaper() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("list.txt"), "--dpi-desync=fake\n").unwrap();

    goodcheck(&dir)
        .args([
            "run",
            "--shaper",
            "/nonexistent/winws",
            "--strategies",
            "list.txt",
            "--skip-preflight",
            "--settle-ms",
            "0",
        ])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Failed to start shaper"))
        .stdout(predicate::str::contains("Skipped strategies"));
}
