mod common;

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn test_cli_places_an_order() {
    let dir = tempdir().unwrap();
    let operators = dir.path().join("operators.csv");
    let menu = dir.path().join("menu.csv");
    let script = dir.path().join("script.csv");
    common::write_operators(&operators).unwrap();
    common::write_menu(&menu).unwrap();
    common::write_script(&script, &["place, user:alice, o1, op1, burger:2"]).unwrap();

    let mut cmd = Command::new(cargo_bin!("mealflow"));
    cmd.arg(&operators).arg(&menu).arg(&script);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "order,status,payment_method,payment_status,total",
        ))
        .stdout(predicate::str::contains("o1,pending,cod,pending,300"));
}
