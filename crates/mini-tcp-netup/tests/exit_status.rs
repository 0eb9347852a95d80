//! Exit status of the `mini-tcp-netup` binary

use std::process::{Command, Output};

fn netup(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mini-tcp-netup"))
        .args(args)
        .output()
        .expect("failed to launch mini-tcp-netup")
}

#[test]
fn bad_prefix_exits_non_zero_naming_the_step() {
    let out = netup(&["plan", "--prefix-len", "40"]);
    let stderr = String::from_utf8_lossy(&out.stderr);

    assert!(!out.status.success(), "expected failure, stderr: {}", stderr);
    assert!(stderr.contains("address assignment"), "{}", stderr);
    assert!(stderr.contains("prefix length 40"), "{}", stderr);
    assert!(out.stdout.is_empty(), "nothing should be planned");
}

#[test]
fn unreadable_config_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    let out = netup(&["-c", missing.to_str().unwrap(), "plan"]);

    assert!(!out.status.success());
}

#[cfg(target_os = "linux")]
#[test]
fn plan_exits_zero_and_lists_commands() {
    let out = netup(&["plan"]);
    let stdout = String::from_utf8_lossy(&out.stdout);

    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(
        stdout.lines().collect::<Vec<_>>(),
        vec![
            "setcap cap_net_admin=eip target/release/mini-tcp",
            "ip address add 192.167.1.0/24 dev mini-tcp-tun",
            "ip link set dev mini-tcp-tun up",
        ]
    );
}
