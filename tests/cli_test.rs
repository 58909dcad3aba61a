#![cfg(feature = "cli")]

use std::process::{Command, Output};
use tempfile::TempDir;

fn gpubench(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gpubench"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_non_integer_argument() {
    let output = gpubench(&["abc"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output), "'abc' is not a valid integer.\n");
}

#[test]
fn test_wrong_argument_count_prints_usage() {
    for args in [&[][..], &["0", "1"][..]] {
        let output = gpubench(args);
        assert_eq!(output.status.code(), Some(1));
        assert_eq!(stdout(&output), "Usage: gpubench <integer>\n");
    }
}

#[test]
fn test_unrecognized_mode_fails_loudly() {
    let output = gpubench(&["7"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).starts_with("Unrecognized mode 7"));

    let output = gpubench(&["-1"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).starts_with("Unrecognized mode -1"));
}

#[test]
fn test_bench_binary_rejects_unknown_variant_before_loading_data() {
    let output = Command::new(env!("CARGO_BIN_EXE_bench-burn"))
        .arg("5")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stdout(&output),
        "Unrecognized variant 5; expected 0 (nightly) or 1 (stable).\n"
    );
}

#[test]
fn test_invalid_framework_log_level_is_a_usage_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_gpubench"))
        .arg("0")
        .env("GPUBENCH_FRAMEWORK_LOG", "loud")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output), "Usage: gpubench <integer>\n");
}

#[test]
fn test_bench_binaries_reject_non_integer_variant() {
    for (binary, program) in [
        (env!("CARGO_BIN_EXE_bench-candle"), "bench-candle"),
        (env!("CARGO_BIN_EXE_bench-burn"), "bench-burn"),
    ] {
        let output = Command::new(binary).arg("abc").output().unwrap();
        assert_eq!(output.status.code(), Some(1), "{}", program);
        assert_eq!(stdout(&output), "'abc' is not a valid integer.\n");
    }
}

#[test]
fn test_bench_binaries_print_usage_on_wrong_argument_count() {
    for (binary, program) in [
        (env!("CARGO_BIN_EXE_bench-candle"), "bench-candle"),
        (env!("CARGO_BIN_EXE_bench-burn"), "bench-burn"),
    ] {
        for args in [&[][..], &["0", "1"][..]] {
            let output = Command::new(binary).args(args).output().unwrap();
            assert_eq!(output.status.code(), Some(1));
            assert_eq!(stdout(&output), format!("Usage: {} <integer>\n", program));
        }
    }
}

#[test]
fn test_mode_is_checked_before_the_config_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("gpubench.toml"), "[bench\n").unwrap();

    for (arg, expected) in [("abc", "'abc' is not a valid integer."), ("7", "Unrecognized mode 7")] {
        let output = Command::new(env!("CARGO_BIN_EXE_gpubench"))
            .arg(arg)
            .current_dir(dir.path())
            .env_remove("RUST_LOG")
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(1));
        assert!(stdout(&output).starts_with(expected));
    }
}
