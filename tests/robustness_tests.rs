mod common;

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use common::{order_row, write_orders};
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_malformed_csv_handling() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("robustness_test.csv");
    write_orders(
        &input,
        &[
            order_row("order-1", "10.00", "1", ""),
            // Text in total field
            order_row("order-2", "ten", "1", ""),
            // Negative installment count
            order_row("order-3", "10.00", "-1", ""),
            order_row("order-4", "20.00", "2", ""),
        ],
    )
    .unwrap();

    let mut cmd = Command::new(cargo_bin!("komerci"));
    cmd.arg(&input).arg("--simulate");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Error reading order"))
        .stdout(predicate::str::contains("order-1,captured,0"))
        .stdout(predicate::str::contains("order-4,captured,0"))
        .stdout(predicate::str::contains("order-2").not())
        .stdout(predicate::str::contains("order-3").not());
}

#[test]
fn test_invalid_orders_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("invalid_orders.csv");
    write_orders(
        &input,
        &[
            order_row("order-1", "10.00", "0", ""),
            order_row("order-2", "10.00", "13", ""),
            order_row("order-3", "0", "1", ""),
            order_row("order-4", "10.00", "2", "bogus"),
            order_row("order-5", "10.00", "2", "customer"),
        ],
    )
    .unwrap();

    let mut cmd = Command::new(cargo_bin!("komerci"));
    cmd.arg(&input).arg("--simulate");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("order-1,rejected"))
        .stdout(predicate::str::contains("order-2,rejected"))
        .stdout(predicate::str::contains("order-3,rejected"))
        .stdout(predicate::str::contains("order-4,rejected"))
        .stdout(predicate::str::contains("order-5,captured,0,Transacao aprovada,************1111,000001,"));
}
