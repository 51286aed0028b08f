//! Line-delimited JSON driver for the tickrelay service.
//!
//! Input (stdin), one object per line:
//! ```text
//! {"method": "startHeartBeat", "sender": "com.example.app", "payload": {"subscribe": true}}
//! {"method": "echo", "sender": "com.example.app", "private": true, "payload": "{\"input\":\"hi\"}"}
//! {"disconnect": "com.example.app"}
//! ```
//! A string `payload` is passed through as raw JSON text; any other value is
//! serialized first. Output (stdout), one object per reply or broadcast:
//! ```text
//! {"sender": "com.example.app", "method": "startHeartBeat", "reply": {"heartbeat": 1}}
//! ```
//! Logs go to stderr.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use clap::Parser;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tickrelay::{
    Config, DeliveryError, LogWriter, Observe, Outbox, ReplyHandle, Request, Route,
    ServiceBuilder, ServiceHandle, shutdown_signal,
};

#[derive(Parser, Debug)]
#[command(name = "tickrelay", version, about = "Heartbeat and relay service over stdio")]
struct Args {
    /// Heartbeat period in milliseconds.
    #[arg(long, env = "TICKRELAY_PERIOD_MS", default_value_t = 1000)]
    period_ms: u64,

    /// Topic heartbeat subscribers register under.
    #[arg(long, default_value = "heartbeat")]
    topic: String,

    /// Downstream address used by `getUTCTime`.
    #[arg(long, env = "TICKRELAY_TIME_URI", default_value = "luna://com.palm.systemservice/time/getSystemTime")]
    time_uri: String,

    /// Log filter (`tracing_subscriber::EnvFilter` syntax).
    #[arg(long, env = "TICKRELAY_LOG", default_value = "info")]
    log: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Input {
    Call {
        method: String,
        sender: String,
        #[serde(default)]
        private: bool,
        #[serde(default)]
        payload: Value,
    },
    Disconnect {
        disconnect: String,
    },
}

#[derive(Serialize)]
struct Output<'a> {
    sender: &'a str,
    method: &'a str,
    reply: &'a Value,
}

/// Writes a caller's replies as tagged stdout lines.
struct LineOutbox {
    sender: Arc<str>,
    method: Arc<str>,
    out: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl Outbox for LineOutbox {
    async fn deliver(&self, payload: &Value) -> Result<(), DeliveryError> {
        let line = serde_json::to_string(&Output {
            sender: &self.sender,
            method: &self.method,
            reply: payload,
        })
        .map_err(|e| DeliveryError::Rejected {
            reason: e.to_string(),
        })?;
        self.out.send(line).map_err(|_| DeliveryError::Closed)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&args.log).context("invalid log filter")?)
        .with_writer(std::io::stderr)
        .init();

    let cfg = Config {
        heartbeat_period: Duration::from_millis(args.period_ms),
        heartbeat_topic: args.topic,
        time_service_uri: args.time_uri,
        ..Config::default()
    };
    let observers: Vec<Arc<dyn Observe>> = vec![Arc::new(LogWriter::new())];
    let (service, handle) = ServiceBuilder::new(cfg).with_observers(observers).build();

    let token = CancellationToken::new();
    let service_task = tokio::spawn(service.run(token.clone()));

    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_lines(out_rx));

    let signal = shutdown_signal();
    tokio::pin!(signal);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    loop {
        tokio::select! {
            sig = &mut signal => {
                let name = sig?;
                info!(signal = name, "terminating");
                break;
            }
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) => feed(&handle, &out_tx, &line).await?,
                None => {
                    info!("stdin closed; running until signalled");
                    stdin_open = false;
                }
            },
        }
    }

    token.cancel();
    service_task.await.context("service loop panicked")?;
    drop(handle);
    drop(out_tx);
    writer.await.context("writer panicked")??;
    Ok(())
}

async fn feed(
    handle: &ServiceHandle,
    out: &mpsc::UnboundedSender<String>,
    line: &str,
) -> anyhow::Result<()> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(());
    }
    let input: Input = match serde_json::from_str(line) {
        Ok(input) => input,
        Err(e) => {
            warn!("unreadable input line: {e}");
            return Ok(());
        }
    };

    match input {
        Input::Call {
            method,
            sender,
            private,
            payload,
        } => {
            let raw = match payload {
                Value::Null => "{}".to_string(),
                Value::String(s) => s,
                other => other.to_string(),
            };
            let outbox = LineOutbox {
                sender: Arc::from(sender.as_str()),
                method: Arc::from(method.as_str()),
                out: out.clone(),
            };
            let route = if private { Route::Private } else { Route::Public };
            let request =
                Request::new(method, raw, sender, ReplyHandle::new(outbox)).with_route(route);
            handle.submit(request).await?;
        }
        Input::Disconnect { disconnect } => handle.disconnect(disconnect).await?,
    }
    Ok(())
}

async fn write_lines(mut rx: mpsc::UnboundedReceiver<String>) -> std::io::Result<()> {
    let mut out = tokio::io::stdout();
    while let Some(line) = rx.recv().await {
        out.write_all(line.as_bytes()).await?;
        out.write_all(b"\n").await?;
        out.flush().await?;
    }
    Ok(())
}
