use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile::tempdir;

fn wikiscript(config_home: &std::path::Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("wikiscript"));
    cmd.env("XDG_CONFIG_HOME", config_home);
    cmd
}

#[test]
fn list_prints_declared_cases() {
    let tmp = tempdir().unwrap();
    wikiscript(tmp.path())
        .args(["list", "--module", "CommonTests"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1\taddition\n"))
        .stdout(predicate::str::contains("\tmw.log is a function\n"))
        .stdout(predicate::str::contains("-- 19 cases --"));
}

#[test]
fn list_fails_for_unknown_module() {
    let tmp = tempdir().unwrap();
    wikiscript(tmp.path())
        .args(["list", "--module", "NoSuchModule"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("FAIL wikiscript list"))
        .stdout(predicate::str::contains("module 'Module:NoSuchModule' not found"));
}
