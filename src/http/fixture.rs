//! Canned HTTP/1.1 upstream for offline tests of the success paths.
//!
//! Each route is a substring of the request target and a list of JSON
//! bodies. The n-th request matching a route gets its n-th body and the last
//! body repeats. Unmatched requests get a 404.

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// History payload with nothing in it.
pub(crate) const EMPTY_HISTORY: &str = r#"{"data":[]}"#;

/// One request as the server received it.
#[derive(Debug, Clone)]
pub(crate) struct Seen {
    /// Path and query.
    pub target: String,
    /// Request line and headers.
    pub head: String,
    pub body: String,
}

struct Route {
    pattern: &'static str,
    bodies: Vec<String>,
    served: usize,
}

pub(crate) struct StubServer {
    url: String,
    seen: Arc<Mutex<Vec<Seen>>>,
    task: JoinHandle<()>,
}

impl StubServer {
    /// Routes are matched in order, so list the more specific pattern first.
    pub async fn start(routes: Vec<(&'static str, Vec<String>)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let routes: Vec<Route> = routes
            .into_iter()
            .map(|(pattern, bodies)| {
                assert!(!bodies.is_empty(), "route {pattern} has no body");
                Route {
                    pattern,
                    bodies,
                    served: 0,
                }
            })
            .collect();
        let routes = Arc::new(Mutex::new(routes));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let task = tokio::spawn({
            let seen = seen.clone();
            async move {
                while let Ok((socket, _)) = listener.accept().await {
                    let routes = routes.clone();
                    let seen = seen.clone();
                    tokio::spawn(async move {
                        let _ = answer(socket, &routes, &seen).await;
                    });
                }
            }
        });
        Self { url, seen, task }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn requests(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    /// Requests whose target contains `pattern`.
    pub fn hits(&self, pattern: &str) -> usize {
        self.requests()
            .iter()
            .filter(|s| s.target.contains(pattern))
            .count()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn answer(
    mut socket: TcpStream,
    routes: &Mutex<Vec<Route>>,
    seen: &Mutex<Vec<Seen>>,
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < head_end + length {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let target = head.split_whitespace().nth(1).unwrap_or("/").to_string();
    let reply = {
        let mut routes = routes.lock().unwrap();
        routes
            .iter_mut()
            .find(|r| target.contains(r.pattern))
            .map(|r| {
                let body = r.bodies[r.served.min(r.bodies.len() - 1)].clone();
                r.served += 1;
                body
            })
    };
    seen.lock().unwrap().push(Seen {
        target,
        head,
        body: String::from_utf8_lossy(&buf[head_end..]).into_owned(),
    });

    let (status, body) = match reply {
        Some(body) => ("200 OK", body),
        None => ("404 Not Found", "not found".to_string()),
    };
    let response = format!(
        "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );
    socket.write_all(response.as_bytes()).await?;
    socket.shutdown().await
}

// ─── Payloads ────────────────────────────────────────────────────────────────

/// CoinCap asset payload priced at `price`.
pub(crate) fn asset_body(price: f64) -> String {
    format!(
        r#"{{"data":{{"id":"bitcoin","symbol":"BTC","priceUsd":"{price}","changePercent24Hr":"1.25","marketCapUsd":"1300000000000","volumeUsd24Hr":"9000000000","supply":"19840000"}},"timestamp":0}}"#
    )
}

/// CoinGecko global payload with the given BTC dominance.
pub(crate) fn global_body(btc: f64) -> String {
    format!(r#"{{"data":{{"active_cryptocurrencies":9000,"market_cap_percentage":{{"btc":{btc}}}}}}}"#)
}

/// CoinCap history of `n` rising points, one hour apart, ending now.
pub(crate) fn history_body(n: usize) -> String {
    let now = crate::shared::now_ms();
    let entries: Vec<String> = (0..n)
        .map(|i| {
            let time = now - (n - 1 - i) as i64 * crate::shared::HOUR_MS;
            format!(r#"{{"priceUsd":"{}","time":{time}}}"#, 60_000.0 + i as f64 * 25.0)
        })
        .collect();
    format!(r#"{{"data":[{}]}}"#, entries.join(","))
}
