use assert_cmd::Command;
use std::path::Path;

fn wifictl() -> Command {
    Command::cargo_bin("wifictl").unwrap()
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().unwrap();
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Writes a config whose control directory exists but holds no sockets.
fn empty_config(dir: &Path) -> std::path::PathBuf {
    let ctrl = dir.join("ctrl");
    std::fs::create_dir(&ctrl).unwrap();
    let path = dir.join("config.toml");
    std::fs::write(
        &path,
        format!(
            "ctrl_iface_dir = {:?}\nsocket_dir = {:?}\n",
            ctrl.display().to_string(),
            dir.display().to_string()
        ),
    )
    .unwrap();
    path
}

#[test]
fn help_lists_subcommands() {
    let out = stdout_of(wifictl().arg("--help"));
    assert!(out.contains("wifictl"));
    for sub in ["scan", "connect", "disconnect", "status", "list-interfaces"] {
        assert!(out.contains(sub), "missing {} in help", sub);
    }
}

#[test]
fn scan_help_mentions_options() {
    let out = stdout_of(wifictl().args(["scan", "--help"]));
    assert!(out.contains("Scan for available WiFi networks"));
    assert!(out.contains("interface"));
    assert!(out.contains("wait"));
}

#[test]
fn connect_help_mentions_options() {
    let out = stdout_of(wifictl().args(["connect", "--help"]));
    assert!(out.contains("Connect to a WiFi network"));
    assert!(out.contains("SSID"));
    assert!(out.contains("password"));
    assert!(out.contains("timeout"));
}

#[test]
fn disconnect_and_status_help() {
    let out = stdout_of(wifictl().args(["disconnect", "--help"]));
    assert!(out.contains("Disconnect"));
    assert!(out.contains("interface"));

    let out = stdout_of(wifictl().args(["status", "--help"]));
    assert!(out.to_lowercase().contains("status"));
}

#[test]
fn show_config_prints_effective_values() {
    let dir = tempfile::tempdir().unwrap();
    let config = empty_config(dir.path());

    let out = stdout_of(wifictl().arg("--config").arg(&config).arg("show-config"));
    assert!(out.contains("ctrl_iface_dir"));
    assert!(out.contains("handshake_retries = 3"));
}

#[cfg(target_os = "linux")]
#[test]
fn no_adapters_exits_with_one() {
    let dir = tempfile::tempdir().unwrap();
    let config = empty_config(dir.path());

    let output = wifictl()
        .arg("--config")
        .arg(&config)
        .args(["status", "-i", "0"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("No WiFi interface found"));
}

#[cfg(target_os = "linux")]
#[test]
fn list_interfaces_without_adapters_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let config = empty_config(dir.path());

    wifictl()
        .arg("--config")
        .arg(&config)
        .arg("list-interfaces")
        .assert()
        .success();
}
