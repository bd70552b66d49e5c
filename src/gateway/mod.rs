//! Remote execution client for the external interpreter gateway.
//!
//! One TCP connection is opened at startup and kept for the lifetime of the
//! editor. There is no retry, no timeout and no reconnection: once the
//! connection is gone every call fails with [`GatewayError::NotConnected`].

use std::io;

use log::{debug, info, warn};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufStream};
use tokio::net::TcpStream;

use crate::config::Config;

pub mod protocol;

use protocol::ReplyValue;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("cannot reach interpreter gateway at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("not connected to interpreter gateway at {addr} ({reason})")]
    NotConnected { addr: String, reason: String },

    #[error("gateway I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("gateway closed the connection")]
    ConnectionClosed,

    #[error("interpreter error: {0}")]
    Remote(String),

    #[error("malformed gateway reply: {0:?}")]
    MalformedReply(String),

    #[error("unsupported gateway reply type '{0}'")]
    UnsupportedReply(char),
}

impl GatewayError {
    /// Errors after which the stream can no longer be trusted.
    fn breaks_connection(&self) -> bool {
        matches!(
            self,
            GatewayError::Io(_) | GatewayError::ConnectionClosed | GatewayError::MalformedReply(_)
        )
    }
}

/// The two calls the editor makes on the interpreter.
#[allow(async_fn_in_trait)]
pub trait RemoteExecution {
    /// Hand the full program text to the interpreter.
    async fn submit(&mut self, text: &str) -> Result<(), GatewayError>;

    /// The interpreter's last computed result.
    async fn fetch_result(&mut self) -> Result<String, GatewayError>;

    /// Short human-readable description for the status bar.
    fn describe(&self) -> String;
}

/// Names of the remote entry point object and its two methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    pub target: String,
    pub submit_method: String,
    pub result_method: String,
}

impl Default for EntryPoint {
    fn default() -> Self {
        Self {
            target: "t".into(),
            submit_method: "set_text".into(),
            result_method: "get_result".into(),
        }
    }
}

impl EntryPoint {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            target: cfg.entry_point(),
            submit_method: cfg.submit_method(),
            result_method: cfg.result_method(),
        }
    }
}

#[derive(Debug)]
pub struct GatewayClient {
    addr: String,
    entry: EntryPoint,
    conn: Option<BufStream<TcpStream>>,
    offline_reason: String,
}

impl GatewayClient {
    pub async fn connect(addr: &str, entry: EntryPoint) -> Result<Self, GatewayError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|source| GatewayError::Connect {
                addr: addr.to_string(),
                source,
            })?;
        // Calls are small request/reply exchanges.
        let _ = stream.set_nodelay(true);
        info!("connected to interpreter gateway at {addr}");
        Ok(Self {
            addr: addr.to_string(),
            entry,
            conn: Some(BufStream::new(stream)),
            offline_reason: String::new(),
        })
    }

    /// A client whose startup connection failed.
    pub fn disconnected(addr: &str, entry: EntryPoint, reason: impl Into<String>) -> Self {
        Self {
            addr: addr.to_string(),
            entry,
            conn: None,
            offline_reason: reason.into(),
        }
    }

    /// Connect once; on failure keep a disconnected client so the editor can
    /// still start and report the problem on Run.
    pub async fn connect_or_offline(addr: &str, entry: EntryPoint) -> Self {
        match Self::connect(addr, entry.clone()).await {
            Ok(client) => client,
            Err(e) => {
                warn!("{e}");
                Self::disconnected(addr, entry, e.to_string())
            }
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    async fn call(&mut self, method: &str, args: &[&str]) -> Result<ReplyValue, GatewayError> {
        let command = protocol::encode_call(&self.entry.target, method, args);
        let result = {
            let conn = self.conn.as_mut().ok_or_else(|| GatewayError::NotConnected {
                addr: self.addr.clone(),
                reason: self.offline_reason.clone(),
            })?;
            round_trip(conn, &command).await
        };

        if let Err(e) = &result {
            if e.breaks_connection() {
                warn!("dropping gateway connection after {method}: {e}");
                self.offline_reason = e.to_string();
                self.conn = None;
            }
        }
        result
    }
}

async fn round_trip(
    conn: &mut BufStream<TcpStream>,
    command: &str,
) -> Result<ReplyValue, GatewayError> {
    conn.write_all(command.as_bytes()).await?;
    conn.flush().await?;

    let mut line = String::new();
    if conn.read_line(&mut line).await? == 0 {
        return Err(GatewayError::ConnectionClosed);
    }
    debug!("gateway reply: {} bytes", line.len());
    protocol::decode_reply(&line)
}

impl RemoteExecution for GatewayClient {
    async fn submit(&mut self, text: &str) -> Result<(), GatewayError> {
        let method = self.entry.submit_method.clone();
        debug!("{method}: {} bytes", text.len());
        // Whatever the setter returns is ignored.
        self.call(&method, &[text]).await.map(|_| ())
    }

    async fn fetch_result(&mut self) -> Result<String, GatewayError> {
        let method = self.entry.result_method.clone();
        let value = self.call(&method, &[]).await?;
        debug!("{method}: {} reply", value.kind());
        Ok(value.into_text())
    }

    fn describe(&self) -> String {
        if self.is_connected() {
            format!("gateway {}", self.addr)
        } else {
            format!("gateway {} (offline)", self.addr)
        }
    }
}
