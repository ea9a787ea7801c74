use assert_cmd::{Command, cargo::cargo_bin_cmd};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;

/// `hxutil` with its config file inside `config_dir` and no ambient
/// credentials, proxies or log settings.
pub fn hxutil_cmd(config_dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("hxutil");
    cmd.arg("--config")
        .arg(config_path(config_dir))
        .env_remove("HXUTIL_CONFIG")
        .env_remove("HXUTIL_EMAIL")
        .env_remove("HXUTIL_PASSWORD")
        .env_remove("RUST_LOG")
        .env_remove("HTTP_PROXY")
        .env_remove("http_proxy")
        .env_remove("HTTPS_PROXY")
        .env_remove("https_proxy")
        .env_remove("ALL_PROXY")
        .env_remove("all_proxy")
        .env("NO_PROXY", "*");
    cmd
}

// Not every test crate inspects the config file.
#[allow(dead_code)]
pub fn config_path(config_dir: &Path) -> PathBuf {
    config_dir.join("config.toml")
}

/// [`hxutil_cmd`] already pointed at `api` and logged in as dev@example.com.
#[allow(dead_code)]
pub fn logged_in_cmd(config_dir: &Path, api: &MockApi) -> Command {
    let mut cmd = hxutil_cmd(config_dir);
    cmd.arg("--base-url")
        .arg(api.base_url())
        .env("HXUTIL_EMAIL", "dev@example.com")
        .env("HXUTIL_PASSWORD", "secret");
    cmd
}

/// Minimal HTTP/1.1 responder on a loopback port.
///
/// Requests are answered from a fixed route table keyed by request target
/// (path plus query). A target without an exact entry falls back to its path
/// alone, and anything else gets a 404 with a `NOT_FOUND` error body. Every
/// response closes the connection.
#[allow(dead_code)]
pub struct MockApi {
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl MockApi {
    pub fn start(routes: &[(&str, u16, &str)]) -> MockApi {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let routes: HashMap<String, (u16, String)> = routes
            .iter()
            .map(|(target, status, body)| (target.to_string(), (*status, body.to_string())))
            .collect();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let seen = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                let _ = respond(stream, &routes, &seen);
            }
        });

        MockApi { base_url, requests }
    }

    /// The default routes of a logged-in session.
    pub fn with_login(routes: &[(&str, u16, &str)]) -> MockApi {
        let mut all = vec![("POST /api/v0/login", 200, r#"{"token":"t0k3n"}"#)];
        all.extend_from_slice(routes);
        MockApi::start(&all)
    }

    pub fn base_url(&self) -> String {
        self.base_url.clone()
    }

    /// Request lines ("METHOD target") received so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[allow(dead_code)]
fn respond(
    stream: TcpStream,
    routes: &HashMap<String, (u16, String)>,
    seen: &Mutex<Vec<String>>,
) -> std::io::Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);

    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default().to_string();

    let mut content_length = 0;
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header)? == 0 || header == "\r\n" {
            break;
        }
        if let Some((name, value)) = header.split_once(':')
            && name.eq_ignore_ascii_case("content-length")
        {
            content_length = value.trim().parse().unwrap_or(0);
        }
    }
    let mut body = vec![0; content_length];
    reader.read_exact(&mut body)?;

    let key = format!("{method} {target}");
    seen.lock().unwrap().push(key.clone());
    let path_only = match target.split_once('?') {
        Some((path, _)) => format!("{method} {path}"),
        None => key.clone(),
    };
    let (status, body) = routes
        .get(&key)
        .or_else(|| routes.get(&path_only))
        .cloned()
        .unwrap_or((404, r#"{"error_code":"NOT_FOUND","error":"not found"}"#.to_string()));

    let mut stream = stream;
    write!(
        stream,
        "HTTP/1.1 {status} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )?;
    stream.flush()
}
