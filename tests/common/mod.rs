//! Shared helpers for integration tests: a scripted chat-completions server
//! and a fake on-device engine.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;

use tlstream::translation::TranslationSink;
use tlstream::translation::on_device::{
    BoxError, EngineLoader, EngineOptions, InferenceEngine, InferenceSession, ResultListener,
    SessionOptions,
};
use tlstream::TranslateError;

/// A `data:` line carrying one content delta.
pub fn content_line(text: &str) -> String {
    let payload = serde_json::json!({ "choices": [{ "delta": { "content": text } }] });
    format!("data: {payload}")
}

pub const DONE_LINE: &str = "data: [DONE]";

/// What the server does with one request.
#[derive(Debug, Clone)]
pub enum Reply {
    /// 200 with the given lines, then close.
    Stream(Vec<String>),
    /// 200 with the given lines, then keep the connection open until the
    /// client goes away.
    StreamThenHang(Vec<String>),
    /// A bare status code with a short body.
    Status(u16),
}

#[derive(Default)]
struct Shared {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<serde_json::Value>>,
    content_types: Mutex<Vec<String>>,
    disconnected: AtomicBool,
    disconnect: Notify,
}

/// A minimal HTTP/1.1 server speaking just enough of the chat completions
/// protocol for the remote backend.
pub struct MockServer {
    addr: SocketAddr,
    shared: Arc<Shared>,
}

impl MockServer {
    /// Starts a server that answers requests with `replies` in order; the
    /// last reply is repeated once the queue runs dry.
    pub async fn start(replies: Vec<Reply>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shared = Arc::new(Shared {
            replies: Mutex::new(replies.into()),
            ..Shared::default()
        });

        let accept_shared = Arc::clone(&shared);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let shared = Arc::clone(&accept_shared);
                tokio::spawn(handle(stream, shared));
            }
        });

        Self { addr, shared }
    }

    /// Address in the `host:port` form the settings use.
    pub fn address(&self) -> String {
        self.addr.to_string()
    }

    /// JSON bodies of all requests received so far.
    pub fn requests(&self) -> Vec<serde_json::Value> {
        self.shared.requests.lock().unwrap().clone()
    }

    /// Lower-cased `content-type` header of every request.
    pub fn content_types(&self) -> Vec<String> {
        self.shared.content_types.lock().unwrap().clone()
    }

    /// The user message of every request, in arrival order.
    pub fn user_messages(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|body| body["messages"][1]["content"].as_str().unwrap().to_string())
            .collect()
    }

    /// Waits until a hanging stream sees its client disconnect.
    pub async fn wait_for_disconnect(&self) {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let notified = self.shared.disconnect.notified();
                if self.shared.disconnected.load(Ordering::SeqCst) {
                    return;
                }
                notified.await;
            }
        })
        .await
        .expect("client never closed the connection");
    }
}

async fn handle(mut stream: TcpStream, shared: Arc<Shared>) {
    let Some((headers, body)) = read_request(&mut stream).await else {
        return;
    };
    let content_type = header_value(&headers, "content-type").unwrap_or_default();
    shared.content_types.lock().unwrap().push(content_type);
    if let Ok(json) = serde_json::from_slice(&body) {
        shared.requests.lock().unwrap().push(json);
    }

    let reply = {
        let mut replies = shared.replies.lock().unwrap();
        if replies.len() > 1 {
            replies.pop_front().unwrap()
        } else {
            replies.front().cloned().unwrap_or(Reply::Status(500))
        }
    };

    match reply {
        Reply::Status(code) => {
            let response = format!(
                "HTTP/1.1 {code} Mock\r\n\
                 content-type: text/plain\r\n\
                 content-length: 4\r\n\
                 connection: close\r\n\r\nnope"
            );
            let _ = stream.write_all(response.as_bytes()).await;
        }
        Reply::Stream(lines) => {
            if write_stream(&mut stream, &lines).await.is_ok() {
                let _ = stream.shutdown().await;
            }
        }
        Reply::StreamThenHang(lines) => {
            if write_stream(&mut stream, &lines).await.is_ok() {
                let mut scratch = [0u8; 64];
                // Nothing more is expected from the client; EOF means it hung up.
                while matches!(stream.read(&mut scratch).await, Ok(n) if n > 0) {}
            }
            shared.disconnected.store(true, Ordering::SeqCst);
            shared.disconnect.notify_waiters();
        }
    }
}

async fn write_stream(stream: &mut TcpStream, lines: &[String]) -> std::io::Result<()> {
    stream
        .write_all(
            b"HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\nconnection: close\r\n\r\n",
        )
        .await?;
    for line in lines {
        stream.write_all(format!("{line}\n\n").as_bytes()).await?;
        stream.flush().await?;
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    Ok(())
}

/// Finds `name` in a lower-cased header block.
fn header_value(headers: &str, name: &str) -> Option<String> {
    headers.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        (key.trim() == name).then(|| value.trim().to_string())
    })
}

/// Reads one request, returning its lower-cased header block and body.
async fn read_request(stream: &mut TcpStream) -> Option<(String, Vec<u8>)> {
    let mut buf = Vec::new();
    let mut scratch = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        let n = stream.read(&mut scratch).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&scratch[..n]);
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let content_length = header_value(&headers, "content-length")
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut scratch).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&scratch[..n]);
    }

    let body = buf[header_end..header_end + content_length].to_vec();
    Some((headers, body))
}

/// How a fake session behaves once generation starts.
#[derive(Debug, Clone)]
pub enum Script {
    /// Emits each piece, the last one flagged final.
    Respond(Vec<String>),
    /// Emits the pieces, then waits until closed without ever finishing.
    RespondThenStall(Vec<String>),
    /// Drops the listener without a final result.
    Vanish,
    /// Fails to start generating.
    FailGenerate,
}

/// Counters shared between a [`FakeLoader`] and the test.
#[derive(Default)]
pub struct EngineStats {
    pub loads: AtomicUsize,
    pub sessions: AtomicUsize,
    pub closes: AtomicUsize,
    pub loaded_paths: Mutex<Vec<std::path::PathBuf>>,
    pub queries: Mutex<Vec<String>>,
}

/// Loads [`FakeEngine`]s that answer according to a fixed script.
pub struct FakeLoader {
    pub stats: Arc<EngineStats>,
    script: Script,
    fail_load: bool,
    gate: Option<Mutex<std::sync::mpsc::Receiver<()>>>,
}

impl FakeLoader {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            stats: Arc::new(EngineStats::default()),
            script,
            fail_load: false,
            gate: None,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            stats: Arc::new(EngineStats::default()),
            script: Script::Vanish,
            fail_load: true,
            gate: None,
        })
    }

    /// A loader whose `load` blocks until the returned sender is dropped,
    /// standing in for a slow model copy.
    pub fn gated(script: Script) -> (Arc<Self>, std::sync::mpsc::Sender<()>) {
        let (open, gate) = std::sync::mpsc::channel();
        let loader = Arc::new(Self {
            stats: Arc::new(EngineStats::default()),
            script,
            fail_load: false,
            gate: Some(Mutex::new(gate)),
        });
        (loader, open)
    }
}

impl EngineLoader for FakeLoader {
    fn load(&self, options: &EngineOptions) -> Result<Arc<dyn InferenceEngine>, BoxError> {
        if self.fail_load {
            return Err("corrupt model".into());
        }
        self.stats.loads.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            let _ = gate.lock().unwrap().recv();
        }
        self.stats
            .loaded_paths
            .lock()
            .unwrap()
            .push(options.model_path.clone());
        Ok(Arc::new(FakeEngine {
            stats: Arc::clone(&self.stats),
            script: self.script.clone(),
        }))
    }
}

struct FakeEngine {
    stats: Arc<EngineStats>,
    script: Script,
}

impl InferenceEngine for FakeEngine {
    fn create_session(
        &self,
        _options: &SessionOptions,
    ) -> Result<Box<dyn InferenceSession>, BoxError> {
        self.stats.sessions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            stats: Arc::clone(&self.stats),
            script: self.script.clone(),
            closed: Arc::new(AtomicBool::new(false)),
        }))
    }
}

struct FakeSession {
    stats: Arc<EngineStats>,
    script: Script,
    closed: Arc<AtomicBool>,
}

impl InferenceSession for FakeSession {
    fn add_query_chunk(&mut self, text: &str) -> Result<(), BoxError> {
        self.stats.queries.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn generate_response_async(&mut self, mut listener: ResultListener) -> Result<(), BoxError> {
        let closed = Arc::clone(&self.closed);
        match self.script.clone() {
            Script::FailGenerate => return Err("generation refused".into()),
            Script::Vanish => drop(listener),
            Script::Respond(pieces) => {
                thread::spawn(move || {
                    let last = pieces.len().saturating_sub(1);
                    for (i, piece) in pieces.into_iter().enumerate() {
                        if closed.load(Ordering::SeqCst) {
                            return;
                        }
                        listener(piece, i == last);
                    }
                });
            }
            Script::RespondThenStall(pieces) => {
                thread::spawn(move || {
                    for piece in pieces {
                        listener(piece, false);
                    }
                    while !closed.load(Ordering::SeqCst) {
                        thread::sleep(Duration::from_millis(5));
                    }
                    // A closed session may still flush one stale partial.
                    listener("stale".to_string(), false);
                });
            }
        }
        Ok(())
    }

    fn close(&mut self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.stats.closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Sink that forwards a signal after every partial, so tests can act
/// mid-stream.
pub struct SignallingSink {
    pub partials: Vec<String>,
    pub errors: Vec<TranslateError>,
    pub completions: usize,
    signal: tokio::sync::mpsc::UnboundedSender<usize>,
}

impl SignallingSink {
    pub fn new() -> (Self, tokio::sync::mpsc::UnboundedReceiver<usize>) {
        let (signal, rx) = tokio::sync::mpsc::unbounded_channel();
        (
            Self {
                partials: Vec::new(),
                errors: Vec::new(),
                completions: 0,
                signal,
            },
            rx,
        )
    }
}

impl TranslationSink for SignallingSink {
    fn on_result(&mut self, text: &str) {
        self.partials.push(text.to_string());
        let _ = self.signal.send(self.partials.len());
    }

    fn on_error(&mut self, error: TranslateError) {
        self.errors.push(error);
    }

    fn on_complete(&mut self) {
        self.completions += 1;
    }
}
