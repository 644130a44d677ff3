//! Connection to the session server and the reconnect policy

use log::{info, warn};
use shared::{read_frame, write_frame};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::sleep;

/// Longest wait between two reconnect attempts
pub const MAX_BACKOFF: Duration = Duration::from_secs(10);

pub struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    peer: SocketAddr,
}

impl Connection {
    pub async fn connect(addr: &str) -> io::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?;
        let (read_half, write_half) = stream.into_split();

        info!("Connected to {}", peer);
        Ok(Self {
            reader: BufReader::new(read_half),
            writer: write_half,
            peer,
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Sends one request and waits for its reply
    ///
    /// `Ok(None)` means the server closed the connection.
    pub async fn request(&mut self, line: &str) -> io::Result<Option<String>> {
        write_frame(&mut self.writer, line).await?;
        read_frame(&mut self.reader).await
    }
}

/// Linear backoff between reconnect attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retry_interval: Duration,
    /// Zero retries without limit
    pub max_retries: u32,
}

impl RetryPolicy {
    pub fn new(retry_interval: Duration, max_retries: u32) -> Self {
        Self {
            retry_interval,
            max_retries,
        }
    }

    /// Wait after the failed attempt number `attempt`, counting from 1
    pub fn delay(&self, attempt: u32) -> Duration {
        self.retry_interval.saturating_mul(attempt).min(MAX_BACKOFF)
    }

    pub fn allows(&self, attempt: u32) -> bool {
        self.max_retries == 0 || attempt <= self.max_retries
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), 0)
    }
}

/// Tries to connect to `addr` until it succeeds or the policy gives up
pub async fn reconnect(addr: &str, policy: &RetryPolicy) -> Option<Connection> {
    let mut attempt = 1;
    while policy.allows(attempt) {
        info!("Reconnecting to {} (attempt {})", addr, attempt);
        match Connection::connect(addr).await {
            Ok(connection) => return Some(connection),
            Err(e) => {
                let delay = policy.delay(attempt);
                warn!("Reconnect to {} failed: {}, retrying in {:?}", addr, e, delay);
                sleep(delay).await;
            }
        }
        attempt += 1;
    }

    warn!("Giving up on {} after {} attempts", addr, attempt - 1);
    None
}
