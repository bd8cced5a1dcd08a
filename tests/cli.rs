use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn traysnap_cmd() -> Command {
    Command::cargo_bin("traysnap").expect("binary exists")
}

#[test]
fn traysnap_help_prints_usage() {
    traysnap_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Tray-resident screenshot tool with global hotkeys",
        ));
}

#[test]
fn version_prints_package_version() {
    traysnap_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn no_flags_prints_usage() {
    traysnap_cmd()
        .assert()
        .success()
        .stdout(predicate::str::contains("traysnap --tray"))
        .stdout(predicate::str::contains("Ctrl+Alt+S"))
        .stdout(predicate::str::contains("Alt+Q"));
}

#[test]
fn image_flag_alone_prints_usage() {
    traysnap_cmd()
        .arg("--image")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn fullscreen_conflicts_with_region() {
    traysnap_cmd()
        .args(["--fullscreen", "--region"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn tray_conflicts_with_one_shot_flags() {
    traysnap_cmd()
        .args(["--tray", "--region"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn fullscreen_capture_fails_without_display() {
    let temp = TempDir::new().unwrap();

    traysnap_cmd()
        .env_remove("DISPLAY")
        .env_remove("WAYLAND_DISPLAY")
        .env("XDG_CONFIG_HOME", temp.path())
        .env("HOME", temp.path())
        .arg("--fullscreen")
        .assert()
        .failure();
}
