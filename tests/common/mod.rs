//! Shared integration-test harness for spawning a `mockstage` server as a
//! child process and talking to it over HTTP.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use serde_json::Value;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};

/// Maximum time to wait for the server to report its bound address.
pub const STARTUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Temporary storage layout: `<tmp>/mocks/` and `<tmp>/config.json`.
pub struct Storage {
    dir: TempDir,
}

impl Storage {
    /// Creates an empty storage root. Neither the mocks dir nor the config
    /// file exist yet.
    #[allow(clippy::missing_panics_doc)]
    #[must_use]
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create tempdir"),
        }
    }

    #[must_use]
    pub fn mocks_dir(&self) -> PathBuf {
        self.dir.path().join("mocks")
    }

    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.dir.path().join("config.json")
    }

    /// Writes a fixture file, creating the mocks dir if needed.
    #[allow(clippy::missing_panics_doc)]
    pub fn write_fixture(&self, file_name: &str, content: &str) {
        std::fs::create_dir_all(self.mocks_dir()).expect("failed to create mocks dir");
        std::fs::write(self.mocks_dir().join(file_name), content).expect("failed to write fixture");
    }

    /// Writes the config file verbatim.
    #[allow(clippy::missing_panics_doc)]
    pub fn write_config(&self, content: &str) {
        std::fs::write(self.config_file(), content).expect("failed to write config");
    }

    /// Storage flags shared by `serve` and `endpoints`.
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        vec![
            "--mocks-dir".to_string(),
            path_str(&self.mocks_dir()),
            "--config-file".to_string(),
            path_str(&self.config_file()),
        ]
    }
}

fn path_str(path: &Path) -> String {
    path.to_str().expect("non-UTF-8 temp path").to_string()
}

/// A running `mockstage serve` process bound to an ephemeral port.
///
/// The child process is killed on drop via `kill_on_drop(true)`.
pub struct MockStageServer {
    child: Child,
    base_url: String,
    client: reqwest::Client,
}

impl MockStageServer {
    /// Spawns `mockstage serve` on `127.0.0.1:0` over `storage`.
    ///
    /// Reads stderr until the "HTTP server listening" line to discover the port.
    #[allow(clippy::missing_panics_doc)]
    pub async fn start(storage: &Storage) -> Self {
        let bin = env!("CARGO_BIN_EXE_mockstage");
        let mut child = Command::new(bin)
            .args(["serve", "--port", "0", "--bind", "127.0.0.1", "-v", "--color", "never"])
            .args(storage.args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .expect("failed to spawn mockstage");

        let stderr = child.stderr.take().expect("stderr not captured");
        let mut reader = BufReader::new(stderr);
        let mut line = String::new();
        let mut port: Option<u16> = None;

        let deadline = tokio::time::Instant::now() + STARTUP_TIMEOUT;
        while tokio::time::Instant::now() < deadline {
            line.clear();
            let read = tokio::time::timeout(Duration::from_secs(5), reader.read_line(&mut line))
                .await
                .expect("timed out waiting for server startup")
                .expect("failed to read stderr");

            assert!(read > 0, "server exited before printing listening address");

            if line.contains("listening") {
                if let Some(start) = line.find("127.0.0.1:") {
                    let after_host = &line[start + "127.0.0.1:".len()..];
                    let digits: String = after_host.chars().take_while(char::is_ascii_digit).collect();
                    port = digits.parse().ok();
                }
                break;
            }
        }

        // Keep draining stderr so the child never blocks on a full pipe.
        tokio::spawn(async move {
            let mut sink = String::new();
            while reader.read_line(&mut sink).await.is_ok_and(|n| n > 0) {
                sink.clear();
            }
        });

        let port = port.expect("failed to discover server port from stderr");
        Self {
            child,
            base_url: format!("http://127.0.0.1:{port}"),
            client: reqwest::Client::new(),
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    #[must_use]
    pub const fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// `GET path`, returning status and parsed JSON body.
    #[allow(clippy::missing_panics_doc)]
    pub async fn get_json(&self, path: &str) -> (u16, Value) {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("request failed");
        let status = resp.status().as_u16();
        (status, resp.json().await.expect("body is not JSON"))
    }

    /// `POST path` with a JSON body, returning status and parsed JSON body.
    #[allow(clippy::missing_panics_doc)]
    pub async fn post_json(&self, path: &str, body: &Value) -> (u16, Value) {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("request failed");
        let status = resp.status().as_u16();
        (status, resp.json().await.expect("body is not JSON"))
    }

    /// Kills the server process.
    pub async fn shutdown(mut self) {
        let _ = self.child.kill().await;
    }
}

/// Runs the binary to completion with `args`.
#[allow(clippy::missing_panics_doc)]
#[must_use]
pub fn run_command(args: &[&str]) -> Output {
    std::process::Command::new(env!("CARGO_BIN_EXE_mockstage"))
        .args(args)
        .output()
        .expect("failed to run mockstage")
}
