//! Minimal HTTP/1.1 server for integration tests.
//!
//! Routes:
//! - `GET /slow/<name>`: waits `delay`, then 200 with body `<name>` (octet-stream).
//! - `GET /image.png`: 200 with a tiny PNG signature body (image/png).
//! - anything else: 404.
//!
//! Records the request paths in arrival order and the peak number of requests
//! being served at once.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub const PNG_BODY: &[u8] = b"\x89PNG\r\n\x1a\n";

#[derive(Debug, Default)]
pub struct ServerStats {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    paths: Mutex<Vec<String>>,
}

impl ServerStats {
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

pub struct TestServer {
    pub base_url: String,
    pub stats: Arc<ServerStats>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Starts a server in a background thread. Runs until the process exits.
pub fn start(delay: Duration) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let stats = Arc::new(ServerStats::default());
    let server_stats = Arc::clone(&stats);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let stats = Arc::clone(&server_stats);
            thread::spawn(move || handle(stream, &stats, delay));
        }
    });
    TestServer {
        base_url: format!("http://127.0.0.1:{}/", port),
        stats,
    }
}

/// A URL on a port nothing listens on.
pub fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/gone", port)
}

fn handle(mut stream: TcpStream, stats: &ServerStats, delay: Duration) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let request = String::from_utf8_lossy(&buf[..n]);
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();

    let now = stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    stats.peak.fetch_max(now, Ordering::SeqCst);
    stats.paths.lock().unwrap().push(path.clone());

    let (status, content_type, body): (&str, &str, Vec<u8>) =
        if let Some(name) = path.strip_prefix("/slow/") {
            thread::sleep(delay);
            ("200 OK", "application/octet-stream", name.as_bytes().to_vec())
        } else if path == "/image.png" {
            ("200 OK", "image/png", PNG_BODY.to_vec())
        } else {
            ("404 Not Found", "text/plain", b"not found".to_vec())
        };

    // Leave the in-flight window before the client can see the response, so
    // the count never overlaps the client's next request.
    stats.in_flight.fetch_sub(1, Ordering::SeqCst);

    let head = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        content_type,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&body);
}
