#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use confluence::core::{ExternalInvocation, InvocationOutput, Result};
use confluence::{AppState, ConfluenceError, ScriptRunner, ServerConfig};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

/// What the test double answers to every invocation.
#[derive(Clone)]
pub enum Reply {
    Output(InvocationOutput),
    Timeout,
    MissingInterpreter,
}

impl Reply {
    pub fn stdout(stdout: &str) -> Self {
        Reply::Output(InvocationOutput {
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_code: Some(0),
        })
    }

    pub fn failure(stderr: &str, exit_code: i32) -> Self {
        Reply::Output(InvocationOutput {
            stdout: String::new(),
            stderr: stderr.to_string(),
            exit_code: Some(exit_code),
        })
    }
}

/// `ScriptRunner` test double that records every invocation it receives.
pub struct RecordingRunner {
    reply: Reply,
    calls: AtomicUsize,
    invocations: Mutex<Vec<ExternalInvocation>>,
}

impl RecordingRunner {
    pub fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
            invocations: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn invocations(&self) -> Vec<ExternalInvocation> {
        self.invocations.lock().unwrap().clone()
    }

    /// stdin of the last invocation, parsed as JSON.
    pub fn last_payload(&self) -> Option<Value> {
        self.invocations()
            .last()
            .and_then(|invocation| invocation.stdin.clone())
            .map(|stdin| serde_json::from_str(&stdin).unwrap())
    }
}

#[async_trait]
impl ScriptRunner for RecordingRunner {
    async fn run(&self, invocation: &ExternalInvocation) -> Result<InvocationOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.invocations.lock().unwrap().push(invocation.clone());

        match &self.reply {
            Reply::Output(output) => Ok(output.clone()),
            Reply::Timeout => Err(ConfluenceError::Timeout {
                seconds: invocation.timeout.as_secs(),
            }),
            Reply::MissingInterpreter => Err(ConfluenceError::InterpreterNotFound {
                command: invocation.program.clone(),
            }),
        }
    }
}

/// Temporary script directory holding the three transform scripts.
pub struct ScriptDir {
    pub dir: TempDir,
    pub config: ServerConfig,
}

impl ScriptDir {
    /// Empty placeholder scripts, enough for a test double.
    pub fn placeholders() -> Self {
        Self::with_scripts("# placeholder\n", "# placeholder\n", "# placeholder\n")
    }

    pub fn with_scripts(iris: &str, spectrum: &str, loom: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = ServerConfig::default();
        config.scripts.root = dir.path().display().to_string();

        let paths = config.script_paths();
        write_script(&paths.iris, iris);
        write_script(&paths.spectrum, spectrum);
        write_script(&paths.loom, loom);

        Self { dir, config }
    }
}

fn write_script(path: &Path, content: &str) {
    std::fs::write(path, content).unwrap();
}

pub fn router(runner: Arc<dyn ScriptRunner>, config: &ServerConfig) -> Router {
    let state = AppState::new(runner, config);
    confluence::build_router(state, config).unwrap()
}

pub async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(router, request).await
}

pub async fn post_json(router: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}
