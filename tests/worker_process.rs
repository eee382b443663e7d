//! Drives the compiled worker binary over its stdin/stdout.

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use serde_json::{Value, json};

fn spawn_worker() -> Child {
    Command::new(env!("CARGO_BIN_EXE_sonora-tagreader"))
        .arg("--log-level")
        .arg("warn")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn worker")
}

/// Minimal text-layout SPC header with a title and a game name.
fn write_spc(path: &Path) {
    let mut h = vec![0u8; 0x100];
    let magic = b"SNES-SPC700 Sound File Data v0.30";
    h[..magic.len()].copy_from_slice(magic);
    h[0x21] = 26;
    h[0x22] = 26;
    h[0x23] = 26;
    h[0x2E..0x2E + 5].copy_from_slice(b"Intro");
    h[0x4E..0x4E + 9].copy_from_slice(b"Some Game");
    h.resize(0x10200, 0);
    std::fs::write(path, h).unwrap();
}

fn wait_with_deadline(child: &mut Child, deadline: Duration) -> std::process::ExitStatus {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait().unwrap() {
            return status;
        }
        if start.elapsed() > deadline {
            let _ = child.kill();
            panic!("worker did not exit after channel closure");
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}

#[test]
fn answers_in_order_and_exits_on_close() {
    let dir = tempfile::tempdir().unwrap();
    let spc = dir.path().join("intro.spc");
    write_spc(&spc);
    let missing = dir.path().join("missing.mp3");

    let mut child = spawn_worker();
    let mut stdin = child.stdin.take().unwrap();
    let stdout = BufReader::new(child.stdout.take().unwrap());

    let requests = [
        json!({"id": 1, "request": {"type": "probe_file", "path": spc}}),
        json!({"id": 2, "request": {"type": "read_metadata", "path": spc}}),
        json!({"id": 3, "request": {"type": "write_metadata", "path": spc, "metadata": {"title": "x"}}}),
        json!({"id": 4, "request": {"type": "read_embedded_art", "path": missing}}),
        json!({"id": 5, "request": {"type": "teleport"}}),
        json!({"id": 6}),
    ];
    for r in &requests {
        writeln!(stdin, "{r}").unwrap();
    }
    stdin.write_all(b"this is not json\n").unwrap();
    // Closing the channel must end the process.
    drop(stdin);

    let replies: Vec<Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(&l.unwrap()).unwrap())
        .collect();

    let status = wait_with_deadline(&mut child, Duration::from_secs(10));
    assert!(status.success());

    assert_eq!(replies.len(), 7);
    let ids: Vec<u64> = replies.iter().map(|r| r["id"].as_u64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 0]);

    assert_eq!(
        replies[0]["response"],
        json!({"type": "probe_file", "success": true})
    );

    let meta = &replies[1]["response"]["metadata"];
    assert_eq!(replies[1]["response"]["type"], "read_metadata");
    assert_eq!(meta["title"], "Intro");
    assert_eq!(meta["album"], "Some Game");
    assert_eq!(meta["filetype"], "spc");

    // Neither provider can write SPC tags.
    assert_eq!(
        replies[2]["response"],
        json!({"type": "write_metadata", "success": false})
    );
    assert_eq!(
        replies[3]["response"],
        json!({"type": "read_embedded_art", "data": ""})
    );
    for reply in &replies[4..] {
        assert_eq!(reply["response"], json!({"type": "empty"}));
    }
}

#[test]
fn idle_worker_exits_when_host_goes_away() {
    let mut child = spawn_worker();
    drop(child.stdin.take());

    let status = wait_with_deadline(&mut child, Duration::from_secs(10));
    assert!(status.success());
}
