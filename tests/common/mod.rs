#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use assert_fs::prelude::*;

/// One request as seen by the mock backend.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub cookie: Option<String>,
    pub body: String,
}

/// Canned reply: status, JSON body, extra headers.
pub struct Reply {
    pub status: u16,
    pub body: String,
    pub headers: Vec<(String, String)>,
}

impl Reply {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

type Router = dyn Fn(&Recorded) -> Reply + Send + Sync;

/// Minimal HTTP/1.1 backend on a random local port. One request per
/// connection; every request is recorded for later assertions.
pub struct MockBackend {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockBackend {
    pub fn start<F>(router: F) -> Self
    where
        F: Fn(&Recorded) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let router: Arc<Router> = Arc::new(router);

        let seen = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let router = Arc::clone(&router);
                let seen = Arc::clone(&seen);
                thread::spawn(move || serve(stream, router.as_ref(), &seen));
            }
        });

        Self { base_url, requests }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    /// `METHOD path` of every request, in arrival order.
    pub fn calls(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }
}

fn serve(stream: TcpStream, router: &Router, seen: &Mutex<Vec<Recorded>>) {
    let mut reader = BufReader::new(stream.try_clone().unwrap());

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).unwrap_or(0) == 0 {
        return;
    }
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut content_length = 0;
    let mut cookie = None;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            let value = value.trim();
            match name.to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.parse().unwrap_or(0),
                "cookie" => cookie = Some(value.to_string()),
                _ => {}
            }
        }
    }

    let mut body = vec![0; content_length];
    reader.read_exact(&mut body).unwrap();

    let recorded = Recorded {
        method,
        path,
        cookie,
        body: String::from_utf8_lossy(&body).into_owned(),
    };
    let reply = router(&recorded);
    seen.lock().unwrap().push(recorded);

    let mut out = format!(
        "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
        reply.status,
        reply.body.len()
    );
    for (name, value) in &reply.headers {
        out.push_str(&format!("{name}: {value}\r\n"));
    }
    out.push_str("\r\n");
    out.push_str(&reply.body);

    let mut stream = stream;
    let _ = stream.write_all(out.as_bytes());
    let _ = stream.flush();
}

/// hsmctl pointed at `backend`, with `home` as its config directory.
pub fn hsmctl(home: &assert_fs::TempDir, backend: &MockBackend) -> Command {
    let mut cmd = cargo_bin_cmd!("hsmctl");
    cmd.env("HSMCTL_HOME", home.path())
        .env("HSMCTL_API_URL", &backend.base_url)
        .env_remove("HSMCTL_PASSWORD")
        .env_remove("HSMCTL_LOG");
    cmd
}

/// Write a stored session cookie into `home`.
pub fn logged_in(home: &assert_fs::TempDir) {
    home.child("session").write_str("abc123\n").unwrap();
}

pub const HEALTHY: &str =
    r#"{"connected":true,"configured":true,"certificate_exists":true,"error":null}"#;

/// JSON for a list response holding `labels`, all AES secret keys.
pub fn key_list(labels: &[&str]) -> String {
    let keys: Vec<String> = labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            format!(
                r#"{{"label":"{label}","key_class":"SECRET_KEY","key_type":"AES","key_id":"{:02}","token":true,"destroyable":true}}"#,
                i + 1
            )
        })
        .collect();
    format!(r#"{{"keys":[{}],"count":{}}}"#, keys.join(","), labels.len())
}
