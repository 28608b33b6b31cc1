//! Loopback feed server and work-directory helpers for CLI tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::process::Command;
use std::time::Duration;

use chrono::{DateTime, Utc};
use flate2::{write::GzEncoder, Compression};
use serde_json::json;

/// `(status line, body)` keyed by request path.
pub type Routes = HashMap<String, (&'static str, Vec<u8>)>;

pub const FEED_PATH: &str = "/feeds/json/cve/1.1";

/// Serve `routes` until the test process exits. Unknown paths get a 404.
pub fn serve(routes: Routes) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { continue };
            answer(stream, &routes);
        }
    });
    format!("http://{addr}{FEED_PATH}")
}

fn answer(mut stream: TcpStream, routes: &Routes) {
    stream
        .set_read_timeout(Some(Duration::from_secs(2)))
        .expect("set_read_timeout");
    let mut buf = Vec::new();
    let mut tmp = [0u8; 4096];
    loop {
        match stream.read(&mut tmp) {
            Ok(0) => break,
            Ok(n) => {
                buf.extend_from_slice(&tmp[..n]);
                if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            Err(_) => break,
        }
    }
    let text = String::from_utf8_lossy(&buf);
    let path = text
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or_default()
        .to_string();

    let (status, body) = routes
        .get(&path)
        .cloned()
        .unwrap_or(("404 Not Found", b"not found".to_vec()));
    let head = format!(
        "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&body);
    let _ = stream.flush();
}

pub fn meta_route(routes: &mut Routes, partition: &str, modified: DateTime<Utc>) {
    routes.insert(
        format!("{FEED_PATH}/nvdcve-1.1-{partition}.meta"),
        (
            "200 OK",
            format!(
                "lastModifiedDate:{}\r\nsize:1\r\ngzSize:1\r\nsha256:00\r\n",
                modified.to_rfc3339()
            )
            .into_bytes(),
        ),
    );
}

pub fn payload_route(routes: &mut Routes, partition: &str, ids: &[&str]) {
    let items: Vec<_> = ids
        .iter()
        .map(|id| json!({ "cve": { "CVE_data_meta": { "ID": id } }, "impact": {} }))
        .collect();
    let body = serde_json::to_vec(&json!({ "CVE_data_type": "CVE", "CVE_Items": items }))
        .expect("payload json");
    routes.insert(
        format!("{FEED_PATH}/nvdcve-1.1-{partition}.json.gz"),
        ("200 OK", gzip(&body)),
    );
}

pub fn failing_route(routes: &mut Routes, partition: &str) {
    routes.insert(
        format!("{FEED_PATH}/nvdcve-1.1-{partition}.json.gz"),
        ("500 Internal Server Error", b"boom".to_vec()),
    );
}

fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(bytes).expect("gzip write");
    enc.finish().expect("gzip finish")
}

pub fn write_config(work: &Path, base_url: &str) {
    std::fs::write(
        work.join("nvdsync.yaml"),
        format!("feed:\n  base_url: {base_url}\n"),
    )
    .expect("write config");
}

pub fn write_checkpoint(work: &Path, when: DateTime<Utc>) {
    std::fs::write(
        work.join("last_updated.txt"),
        format!(r#"{{"Date":"{}"}}"#, when.to_rfc3339()),
    )
    .expect("write checkpoint");
}

pub fn nvdsync(work: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("nvdsync"));
    cmd.arg("--work-dir")
        .arg(work)
        .env("RUST_LOG", "info")
        .env("NO_PROXY", "127.0.0.1")
        .env("no_proxy", "127.0.0.1")
        .env_remove("GITHUB_TOKEN");
    cmd
}
