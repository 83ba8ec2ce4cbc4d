use assert_cmd::Command;
use predicates::str::{contains, diff};

fn ls8() -> Command {
    Command::cargo_bin("ls8").unwrap()
}

#[test]
fn runs_without_arguments() {
    ls8().assert().success();
}

#[test]
fn runs_product() {
    let mut cmd = ls8();
    cmd.arg("run").arg("tests/files/mult.ls8").arg("--minimal");
    cmd.assert().success().stdout(diff("72\n"));
}

#[test]
fn runs_path_shortcut_with_status() {
    let mut cmd = ls8();
    cmd.arg("tests/files/print8.ls8");
    cmd.assert()
        .success()
        .stdout(contains("8\n"))
        .stdout(contains("Halted"))
        .stdout(contains("Completed"));
}

#[test]
fn runs_raw_binary() {
    let mut cmd = ls8();
    cmd.arg("run").arg("tests/files/mult.bin").arg("--minimal");
    cmd.assert().success().stdout(diff("72\n"));
}

#[test]
fn swaps_through_stack() {
    let mut cmd = ls8();
    cmd.arg("run").arg("tests/files/stack.ls8").arg("--minimal");
    cmd.assert().success().stdout(diff("2\n1\n"));
}

#[test]
fn conventional_call_returns() {
    let mut cmd = ls8();
    cmd.arg("run")
        .arg("tests/files/call.ls8")
        .arg("--minimal")
        .arg("--call")
        .arg("conventional");
    cmd.assert().success().stdout(diff("99\n"));
}

#[test]
fn faithful_call_never_returns() {
    let mut cmd = ls8();
    cmd.arg("run")
        .arg("tests/files/call.ls8")
        .arg("--minimal")
        .arg("--max-steps")
        .arg("50");
    cmd.assert()
        .failure()
        .stdout(diff(""))
        .stderr(contains("halt"))
        .stderr(contains("steps"));
}

#[test]
fn step_budget_from_environment() {
    let mut cmd = ls8();
    cmd.arg("run")
        .arg("tests/files/call.ls8")
        .arg("--minimal")
        .env("LS8_MAX_STEPS", "20");
    cmd.assert().failure().stderr(contains("steps"));
}

#[test]
fn traces_each_step() {
    let mut cmd = ls8();
    cmd.arg("run")
        .arg("tests/files/mult.ls8")
        .arg("--minimal")
        .arg("--trace");
    cmd.assert()
        .success()
        .stdout(diff("72\n"))
        .stderr(contains("TRACE: 00 | 82 00 08 | 00 00 00 00 00 00 00 F3"))
        .stderr(contains("TRACE: 09 | 47 00 01 | 48 09 00 00 00 00 00 F3"));
}

#[test]
fn traces_from_environment() {
    let mut cmd = ls8();
    cmd.arg("run")
        .arg("tests/files/print8.ls8")
        .arg("--minimal")
        .env("LS8_TRACE", "1");
    cmd.assert()
        .success()
        .stderr(contains("TRACE: 05 | 01 00 00 | 08 00 00 00 00 00 00 F3"));
}

#[test]
fn rejects_unknown_opcode() {
    let mut cmd = ls8();
    cmd.arg("run").arg("tests/files/unknown.ls8").arg("--minimal");
    cmd.assert().failure().stderr(contains("0b11000000"));

    let mut cmd = ls8();
    cmd.arg("run")
        .arg("tests/files/unknown.ls8")
        .arg("--minimal")
        .arg("--lenient");
    cmd.assert().success().stdout(diff("6\n"));
}

#[test]
fn check_reports_bad_literal() {
    let mut cmd = ls8();
    cmd.arg("check").arg("tests/files/bad.ls8");
    cmd.assert().failure().stderr(contains("load::bad_literal"));
}

#[test]
fn check_counts_bytes() {
    let mut cmd = ls8();
    cmd.arg("check").arg("tests/files/mult.ls8");
    cmd.assert().success().stdout(contains("12 bytes loaded"));
}

#[test]
fn rejects_unknown_extension() {
    let mut cmd = ls8();
    cmd.arg("run").arg("Cargo.toml");
    cmd.assert().failure().stderr(contains("unknown extension"));
}

#[test]
fn rejects_unknown_call_convention() {
    let mut cmd = ls8();
    cmd.arg("run")
        .arg("tests/files/mult.ls8")
        .arg("--call")
        .arg("bogus");
    cmd.assert()
        .failure()
        .stderr(contains("Unknown call convention 'bogus'"));
}

#[test]
fn watch_requires_existing_file() {
    let mut cmd = ls8();
    cmd.arg("watch").arg("tests/files/missing.ls8");
    cmd.assert().failure().stderr(contains("does not exist"));
}
