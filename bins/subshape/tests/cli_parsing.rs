//! CLI argument parsing tests for the subshape command.
//!
//! These tests run without root privileges; the only commands that
//! touch the system degrade to empty results when tools are missing.

use assert_cmd::Command;
use predicates::prelude::*;

fn subshape_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_subshape"))
}

mod global_flags {
    use super::*;

    #[test]
    fn test_help() {
        subshape_cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Per-subscriber traffic-control report"));
    }

    #[test]
    fn test_version() {
        subshape_cmd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("subshape"));
    }

    #[test]
    fn test_invalid_subcommand() {
        subshape_cmd()
            .arg("invalid_command")
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }

    #[test]
    fn test_output_flags() {
        subshape_cmd().args(["-j", "-p", "-x", "--help"]).assert().success();
        subshape_cmd()
            .args(["--json", "--pretty", "--extensive", "--help"])
            .assert()
            .success();
    }

    #[test]
    fn test_missing_config_file() {
        subshape_cmd()
            .args(["-c", "/nonexistent/subshape.conf", "report"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error: cannot load config"));
    }
}

mod aliases {
    use super::*;

    #[test]
    fn test_report_alias() {
        subshape_cmd()
            .args(["r", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--active-only"));
    }

    #[test]
    fn test_qdisc_alias() {
        subshape_cmd()
            .args(["q", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--ifb"));
    }

    #[test]
    fn test_sample_alias() {
        subshape_cmd().args(["s", "10.0.0.0/24", "-n", "1"]).assert().success();
    }

    #[test]
    fn test_derive_alias() {
        subshape_cmd().args(["d", "10.0.0.2"]).assert().success();
    }
}

mod derive {
    use super::*;

    #[test]
    fn test_derive_compact() {
        subshape_cmd()
            .args(["derive", "10.20.1.5"])
            .assert()
            .success()
            .stdout(predicate::str::contains("CLASSID"))
            .stdout(predicate::str::contains("1:261"))
            .stdout(predicate::str::contains("02:5:106"));
    }

    #[test]
    fn test_derive_extensive() {
        subshape_cmd()
            .args(["-x", "derive", "192.168.3.17"])
            .assert()
            .success()
            .stdout(predicate::str::contains("FILTER_ID"))
            .stdout(predicate::str::contains("1:0x311"));
    }

    #[test]
    fn test_derive_malformed() {
        subshape_cmd()
            .args(["derive", "10.0.1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("N/A"));
    }

    #[test]
    fn test_derive_json() {
        subshape_cmd()
            .args(["-j", "derive", "10.0.0.0"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"classid\":\"1:1\""));
    }

    #[test]
    fn test_derive_requires_address() {
        subshape_cmd().arg("derive").assert().failure();
    }
}

mod sample {
    use super::*;

    #[test]
    fn test_sample_sequence() {
        subshape_cmd()
            .args(["sample", "10.0.0.0/24", "-n", "3"])
            .assert()
            .success()
            .stdout(predicate::str::contains("10.0.0.2"))
            .stdout(predicate::str::contains("10.0.0.4"))
            .stdout(predicate::str::contains("10.0.0.5").not());
    }

    #[test]
    fn test_sample_insufficient() {
        subshape_cmd()
            .args(["sample", "10.0.0.0/30", "-n", "5"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("not enough addresses"));
    }

    #[test]
    fn test_sample_invalid_network() {
        subshape_cmd()
            .args(["sample", "10.0.0.0/33"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid network"));
    }
}

mod report {
    use super::*;

    #[test]
    fn test_report_without_devices() {
        subshape_cmd()
            .args([
                "report",
                "--lan",
                "subshape-none0",
                "--ifb",
                "subshape-none1",
                "--set",
                "subshape-none",
                "--timeout",
                "2",
                "--active-only",
            ])
            .assert()
            .success()
            .stdout(predicate::str::starts_with("IP "));
    }
}
