//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use kyc_gateway::config::GatewayConfig;
use kyc_gateway::http::middleware::{RequestLogger, RequestRecord};
use kyc_gateway::{Gateway, LaunchError, Shutdown};

/// Start a fake Redis that answers `PING` with `+PONG` and anything else
/// with `+OK`.
pub async fn start_mock_cache(addr: SocketAddr) {
    let listener = TcpListener::bind(addr).await.unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    tokio::spawn(async move {
                        let mut conn = BufReader::new(socket);
                        loop {
                            let mut header = String::new();
                            match conn.read_line(&mut header).await {
                                Ok(0) | Err(_) => return,
                                Ok(_) => {}
                            }
                            let argc: usize = header.trim().trim_start_matches('*').parse().unwrap_or(0);
                            let mut args = Vec::with_capacity(argc);
                            for _ in 0..argc {
                                let mut len = String::new();
                                let mut value = String::new();
                                let _ = conn.read_line(&mut len).await;
                                let _ = conn.read_line(&mut value).await;
                                args.push(value.trim_end().to_ascii_uppercase());
                            }
                            let reply: &[u8] = match args.first().map(String::as_str) {
                                Some("PING") => b"+PONG\r\n",
                                _ => b"+OK\r\n",
                            };
                            if conn.get_mut().write_all(reply).await.is_err() {
                                return;
                            }
                        }
                    });
                }
                Err(_) => break,
            }
        }
    });
}

/// Start an upstream that answers every request with its own request line
/// and the `X-Forwarded-Prefix` it received, separated by `|`.
pub async fn start_echo_upstream(addr: SocketAddr) {
    let listener = TcpListener::bind(addr).await.unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    tokio::spawn(async move {
                        let mut conn = BufReader::new(socket);
                        let mut request_line = String::new();
                        let _ = conn.read_line(&mut request_line).await;
                        let mut prefix = String::new();
                        loop {
                            let mut line = String::new();
                            match conn.read_line(&mut line).await {
                                Ok(0) | Err(_) => break,
                                Ok(_) if line == "\r\n" => break,
                                Ok(_) => {
                                    if let Some((name, value)) = line.split_once(':') {
                                        if name.eq_ignore_ascii_case("x-forwarded-prefix") {
                                            prefix = value.trim().to_string();
                                        }
                                    }
                                }
                            }
                        }
                        let body = format!("{}|{}", request_line.trim_end(), prefix);
                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        let _ = conn.get_mut().write_all(response.as_bytes()).await;
                        let _ = conn.get_mut().shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });
}

/// Config bound to `addr` with short timeouts.
pub fn test_config(addr: SocketAddr, cache_addr: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = addr.to_string();
    config.cache.url = format!("redis://{}", cache_addr);
    config.cache.connect_timeout_secs = 1;
    config.timeouts.shutdown_grace_secs = 1;
    config
}

/// Run the gateway in the background and give it time to bind.
pub async fn spawn_gateway(
    gateway: Gateway,
    shutdown: &Shutdown,
) -> JoinHandle<Result<(), LaunchError>> {
    let rx = shutdown.subscribe();
    let handle = tokio::spawn(async move { gateway.run(rx).await });
    tokio::time::sleep(Duration::from_millis(300)).await;
    handle
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Keeps every access record.
#[derive(Default)]
pub struct CapturingLogger {
    pub records: Mutex<Vec<RequestRecord>>,
}

impl CapturingLogger {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn snapshot(&self) -> Vec<RequestRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl RequestLogger for CapturingLogger {
    fn log(&self, record: &RequestRecord) {
        self.records.lock().unwrap().push(record.clone());
    }
}
