use assert_cmd::Command;
use predicates::prelude::*;

fn cmd(data_dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("nextcmd").unwrap();
    cmd.arg("--data-dir").arg(data_dir);
    cmd
}

#[test]
fn status_on_a_fresh_data_dir_reports_zero_counts() {
    let dir = tempfile::tempdir().unwrap();
    cmd(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("sessions: 0"))
        .stdout(predicate::str::contains("events: 0"));
}

#[test]
fn suggest_on_a_fresh_data_dir_reports_no_suggestions() {
    let dir = tempfile::tempdir().unwrap();
    cmd(dir.path())
        .arg("suggest")
        .arg("--buffer")
        .arg("git ")
        .assert()
        .success()
        .stdout(predicate::str::contains("no suggestions"));
}

#[test]
fn rebuild_aggregates_on_a_fresh_data_dir_replays_zero_events() {
    let dir = tempfile::tempdir().unwrap();
    cmd(dir.path())
        .arg("--rebuild-aggregates")
        .assert()
        .success()
        .stdout(predicate::str::contains("rebuilt aggregates from 0 events"));
}

#[test]
fn no_subcommand_prints_help() {
    let dir = tempfile::tempdir().unwrap();
    cmd(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Debugging driver for the nextcmd suggestion engine"));
}
