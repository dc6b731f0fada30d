//! Run the `opseed` binary end to end.

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

fn opseed(dir: &Path) -> Command {
    let config = dir.join("opseed.toml");
    if !config.exists() {
        std::fs::write(&config, "").unwrap();
    }
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_opseed"));
    cmd.arg("--config").arg(config);
    cmd.env_remove("RUST_LOG");
    cmd
}

fn wait_for(path: &Path, limit: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < limit {
        if path.exists() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    false
}

#[test]
fn load_until_sigterm() {
    let dir = tempfile::tempdir().unwrap();
    let snapshots = dir.path().join("snapshots");
    std::fs::create_dir(&snapshots).unwrap();
    std::fs::write(snapshots.join("a.xml"), "<system><hostname>a</hostname></system>").unwrap();
    std::fs::write(snapshots.join("b.xml"), "<system><hostname>b</hostname></system>").unwrap();
    let store = dir.path().join("store");
    let sync = dir.path().join("ready");

    let mut child = opseed(dir.path())
        .arg("load")
        .arg("--path")
        .arg(&snapshots)
        .arg("--store-dir")
        .arg(&store)
        .arg("-s")
        .arg(&sync)
        .args(["--keepalive-ms", "50"])
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    assert!(wait_for(&sync, Duration::from_secs(10)), "sync file never appeared");
    // readable as soon as it exists
    assert!(opseed_loader::sync_file::read_sync_file(&sync).unwrap().is_some());

    let show = opseed(dir.path())
        .args(["show", "/system"])
        .arg("--store-dir")
        .arg(&store)
        .output()
        .unwrap();
    assert!(show.status.success());
    assert_eq!(String::from_utf8_lossy(&show.stdout), "/system/hostname = b\n");

    let killed = Command::new("sh")
        .arg("-c")
        .arg(format!("kill -TERM {}", child.id()))
        .status()
        .unwrap();
    assert!(killed.success());

    let status = child.wait().unwrap();
    assert_eq!(status.code(), Some(0));

    let after = opseed(dir.path())
        .args(["show", "--sessions"])
        .arg("--store-dir")
        .arg(&store)
        .output()
        .unwrap();
    assert!(after.stdout.is_empty());
}

#[test]
fn load_failure_exits_one() {
    let dir = tempfile::tempdir().unwrap();
    let status = opseed(dir.path())
        .arg("load")
        .arg("--path")
        .arg(dir.path().join("missing"))
        .arg("--store-dir")
        .arg(dir.path().join("store"))
        .stderr(Stdio::null())
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(1));
}

#[test]
fn unwritable_sync_file_exits_three() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("only.xml");
    std::fs::write(&file, "<a>1</a>").unwrap();
    let status = opseed(dir.path())
        .arg("load")
        .arg("--file")
        .arg(&file)
        .arg("--store-dir")
        .arg(dir.path().join("store"))
        .arg("--sync-file")
        .arg(dir.path().join("no/such/dir/ready"))
        .stderr(Stdio::null())
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(3));
}

#[test]
fn bench_prints_summary_line() {
    let dir = tempfile::tempdir().unwrap();
    let output = opseed(dir.path())
        .args(["bench", "-p", "/", "-n", "5"])
        .arg("--store-dir")
        .arg(dir.path().join("store"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("--- store 5 get_data: mean="), "{stdout}");
    assert!(stdout.contains("; σ="));
}

#[test]
fn bench_needs_two_samples() {
    let dir = tempfile::tempdir().unwrap();
    let status = opseed(dir.path())
        .args(["bench", "-p", "/", "-n", "1"])
        .arg("--store-dir")
        .arg(dir.path().join("store"))
        .stderr(Stdio::null())
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(2));
}
