use assert_cmd::prelude::*;
use predicates::str::{contains, is_empty};
use std::process::Command;
use tempfile::TempDir;

fn kvs(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("kvs").unwrap();
    cmd.current_dir(temp_dir);
    cmd
}

#[test]
fn cli_no_args() {
    Command::cargo_bin("kvs").unwrap().assert().failure();
}

#[test]
fn cli_get_non_existent_key() {
    let temp_dir = TempDir::new().unwrap();

    kvs(&temp_dir)
        .args(&["get", "key1"])
        .assert()
        .success()
        .stdout("Key not found\n");
}

#[test]
fn cli_rm_non_existent_key() {
    let temp_dir = TempDir::new().unwrap();

    kvs(&temp_dir)
        .args(&["rm", "key1"])
        .assert()
        .failure()
        .stdout("Key not found\n");
}

#[test]
fn cli_set_get_rm() {
    let temp_dir = TempDir::new().unwrap();

    kvs(&temp_dir)
        .args(&["set", "key1", "value1"])
        .assert()
        .success()
        .stdout(is_empty());

    kvs(&temp_dir)
        .args(&["get", "key1"])
        .assert()
        .success()
        .stdout("value1\n");

    kvs(&temp_dir)
        .args(&["set", "key1", "value2"])
        .assert()
        .success();

    kvs(&temp_dir)
        .args(&["get", "key1"])
        .assert()
        .success()
        .stdout("value2\n");

    kvs(&temp_dir).args(&["rm", "key1"]).assert().success();

    kvs(&temp_dir)
        .args(&["get", "key1"])
        .assert()
        .success()
        .stdout("Key not found\n");
}

#[test]
fn cli_ls() {
    let temp_dir = TempDir::new().unwrap();

    kvs(&temp_dir).args(&["set", "b", "2"]).assert().success();
    kvs(&temp_dir).args(&["set", "a", "1"]).assert().success();

    kvs(&temp_dir)
        .args(&["ls"])
        .assert()
        .success()
        .stdout("{\"key\":\"a\",\"value\":\"1\"}\n{\"key\":\"b\",\"value\":\"2\"}\n");
}

#[test]
fn cli_data_dir() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("data");

    kvs(&temp_dir)
        .args(&["set", "key1", "value1", "--data-dir"])
        .arg(&data_dir)
        .assert()
        .success();

    assert!(data_dir.join("kvs.log").exists());

    kvs(&temp_dir)
        .args(&["get", "key1"])
        .assert()
        .success()
        .stdout("Key not found\n");

    kvs(&temp_dir)
        .arg("--data-dir")
        .arg(&data_dir)
        .args(&["get", "key1"])
        .assert()
        .success()
        .stdout(contains("value1"));
}

#[test]
fn cli_invalid_subcommand() {
    let temp_dir = TempDir::new().unwrap();

    kvs(&temp_dir).args(&["unknown"]).assert().failure();
    kvs(&temp_dir).args(&["get"]).assert().failure();
    kvs(&temp_dir).args(&["set", "key"]).assert().failure();
}

#[test]
fn server_refuses_data_dir_of_other_engine() {
    let temp_dir = TempDir::new().unwrap();

    kvs(&temp_dir).args(&["set", "key1", "value1"]).assert().success();
    std::fs::write(temp_dir.path().join("engine"), "kvs").unwrap();

    Command::cargo_bin("kvs-server")
        .unwrap()
        .current_dir(&temp_dir)
        .args(&["--engine", "sled", "--host", "127.0.0.1", "--port", "0"])
        .assert()
        .failure()
        .stderr(contains("EngineMismatch"));

    assert_eq!(
        std::fs::read_to_string(temp_dir.path().join("engine")).unwrap(),
        "kvs"
    );
    kvs(&temp_dir)
        .args(&["get", "key1"])
        .assert()
        .success()
        .stdout("value1\n");
}
