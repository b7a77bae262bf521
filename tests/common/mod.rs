//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use llm_proxy::{HttpServer, ProxyConfig, Shutdown};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// What the mock upstream answers with.
#[derive(Clone)]
pub enum MockReply {
    /// 200 with a chunked body, pausing `delay` after each chunk.
    Stream {
        chunks: Vec<&'static str>,
        delay: Duration,
    },
    /// Fixed status and body.
    Status(u16, &'static str),
}

/// A raw-TCP inference server stand-in.
pub struct MockUpstream {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    bodies: Arc<Mutex<Vec<Value>>>,
    aborted: Arc<AtomicBool>,
}

impl MockUpstream {
    pub fn url(&self) -> String {
        format!("http://{}/api/generate", self.addr)
    }

    /// Requests received so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// JSON bodies received so far.
    pub fn bodies(&self) -> Vec<Value> {
        self.bodies.lock().unwrap().clone()
    }

    /// True once a write to the proxy failed (the proxy hung up).
    pub fn aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }
}

pub async fn start_mock_upstream(reply: MockReply) -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let bodies = Arc::new(Mutex::new(Vec::new()));
    let aborted = Arc::new(AtomicBool::new(false));

    let mock = MockUpstream {
        addr,
        hits: hits.clone(),
        bodies: bodies.clone(),
        aborted: aborted.clone(),
    };

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let reply = reply.clone();
            let hits = hits.clone();
            let bodies = bodies.clone();
            let aborted = aborted.clone();
            tokio::spawn(async move {
                serve_one(socket, reply, hits, bodies, aborted).await;
            });
        }
    });

    mock
}

async fn serve_one(
    mut socket: TcpStream,
    reply: MockReply,
    hits: Arc<AtomicUsize>,
    bodies: Arc<Mutex<Vec<Value>>>,
    aborted: Arc<AtomicBool>,
) {
    let Some(body) = read_request_body(&mut socket).await else {
        return;
    };
    hits.fetch_add(1, Ordering::SeqCst);
    if let Ok(json) = serde_json::from_slice(&body) {
        bodies.lock().unwrap().push(json);
    }

    match reply {
        MockReply::Status(status, body) => {
            let response = format!(
                "HTTP/1.1 {status} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
        MockReply::Stream { chunks, delay } => {
            let head = "HTTP/1.1 200 OK\r\nContent-Type: application/x-ndjson\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n";
            if socket.write_all(head.as_bytes()).await.is_err() {
                aborted.store(true, Ordering::SeqCst);
                return;
            }
            for chunk in chunks {
                let frame = format!("{:x}\r\n{chunk}\r\n", chunk.len());
                if socket.write_all(frame.as_bytes()).await.is_err() || socket.flush().await.is_err() {
                    aborted.store(true, Ordering::SeqCst);
                    return;
                }
                tokio::time::sleep(delay).await;
            }
            let _ = socket.write_all(b"0\r\n\r\n").await;
            let _ = socket.shutdown().await;
        }
    }
}

/// Read one HTTP/1.1 request and return its body.
async fn read_request_body(socket: &mut TcpStream) -> Option<Vec<u8>> {
    let mut buf = Vec::new();
    let mut tmp = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        let n = socket.read(&mut tmp).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&tmp[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let content_length = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut tmp).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&tmp[..n]);
    }

    Some(buf[header_end..header_end + content_length].to_vec())
}

/// An address nothing listens on.
pub fn closed_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// Defaults pointed at `upstream_url`, with a rate limit that stays out of the way.
pub fn test_config(upstream_url: &str) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstream.url = upstream_url.to_string();
    config.upstream.timeout_secs = 2;
    config.rate_limit.requests_per_minute = 100;
    config
}

/// Start the proxy on an ephemeral port.
pub async fn start_proxy(config: ProxyConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

pub async fn post_json(client: &reqwest::Client, proxy: SocketAddr, body: &str) -> reqwest::Response {
    client
        .post(format!("http://{proxy}/api/generate"))
        .header("content-type", "application/json")
        .body(body.to_string())
        .send()
        .await
        .expect("proxy unreachable")
}
