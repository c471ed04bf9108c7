//! Redis reachability probe.
//!
//! Speaks just enough RESP to prove the server is up and accepts our
//! credentials: optional `AUTH`, optional `SELECT`, then `PING`. A fresh
//! connection is opened per check, so the probe is safe to share between
//! tasks without any locking.

use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time;
use url::Url;

use crate::cache::{CacheError, ConnectionCheck};

const DEFAULT_PORT: u16 = 6379;

/// Connection parameters parsed from a `redis://` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisTarget {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub db: Option<u32>,
}

impl RedisTarget {
    /// Parse `redis://[[user]:password@]host[:port][/db]`.
    pub fn from_url(raw: &str) -> Result<Self, CacheError> {
        let url = Url::parse(raw).map_err(|e| CacheError::InvalidUrl(e.to_string()))?;
        if url.scheme() != "redis" {
            return Err(CacheError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }
        let host = url
            .host_str()
            .ok_or_else(|| CacheError::InvalidUrl("missing host".into()))?
            .to_string();

        let db = match url.path().trim_start_matches('/') {
            "" => None,
            segment => Some(
                segment
                    .parse()
                    .map_err(|_| CacheError::InvalidUrl(format!("bad database '{}'", segment)))?,
            ),
        };

        Ok(Self {
            host,
            port: url.port().unwrap_or(DEFAULT_PORT),
            username: Some(url.username())
                .filter(|u| !u.is_empty())
                .map(str::to_string),
            password: url.password().map(str::to_string),
            db,
        })
    }

    /// `host:port` for logging.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Checks that a Redis server answers `PING`.
#[derive(Debug, Clone)]
pub struct RedisConnectionCheck {
    target: RedisTarget,
    timeout: Duration,
}

impl RedisConnectionCheck {
    pub fn new(target: RedisTarget, timeout: Duration) -> Self {
        Self { target, timeout }
    }

    /// Build a checker straight from a URL.
    pub fn from_url(raw: &str, timeout: Duration) -> Result<Self, CacheError> {
        Ok(Self::new(RedisTarget::from_url(raw)?, timeout))
    }

    pub fn target(&self) -> &RedisTarget {
        &self.target
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let stream = TcpStream::connect((self.target.host.as_str(), self.target.port))
            .await
            .map_err(CacheError::Connect)?;
        let mut conn = BufReader::new(stream);

        if let Some(password) = &self.target.password {
            let reply = match &self.target.username {
                Some(user) => command(&mut conn, &["AUTH", user.as_str(), password.as_str()]).await?,
                None => command(&mut conn, &["AUTH", password.as_str()]).await?,
            };
            expect_simple(&reply, "OK")?;
        }

        if let Some(db) = self.target.db {
            let db = db.to_string();
            let reply = command(&mut conn, &["SELECT", db.as_str()]).await?;
            expect_simple(&reply, "OK")?;
        }

        let reply = command(&mut conn, &["PING"]).await?;
        expect_simple(&reply, "PONG")
    }
}

impl ConnectionCheck for RedisConnectionCheck {
    fn check_connection(&self) -> BoxFuture<'_, Result<(), CacheError>> {
        Box::pin(async move {
            match time::timeout(self.timeout, self.ping()).await {
                Ok(result) => result,
                Err(_) => Err(CacheError::Timeout(self.timeout)),
            }
        })
    }

    fn describe(&self) -> String {
        format!("redis at {}", self.target.address())
    }
}

/// Encode a command as a RESP array of bulk strings.
fn encode_command(args: &[&str]) -> Vec<u8> {
    let mut out = format!("*{}\r\n", args.len()).into_bytes();
    for arg in args {
        out.extend_from_slice(format!("${}\r\n", arg.len()).as_bytes());
        out.extend_from_slice(arg.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
    out
}

async fn command(conn: &mut BufReader<TcpStream>, args: &[&str]) -> Result<String, CacheError> {
    conn.get_mut()
        .write_all(&encode_command(args))
        .await
        .map_err(CacheError::Io)?;

    let mut line = String::new();
    let read = conn.read_line(&mut line).await.map_err(CacheError::Io)?;
    if read == 0 {
        return Err(CacheError::Closed);
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn expect_simple(reply: &str, expected: &str) -> Result<(), CacheError> {
    match reply.strip_prefix('+') {
        Some(body) if body == expected => Ok(()),
        _ => match reply.strip_prefix('-') {
            Some(err) => Err(CacheError::Rejected(err.to_string())),
            None => Err(CacheError::UnexpectedReply(reply.to_string())),
        },
    }
}
