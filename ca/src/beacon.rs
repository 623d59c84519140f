//! Best-effort synchronous flush for teardown.
//!
//! When a session ends there may be debounced writes that never fired.
//! The async client is no good at that point (the runtime is about to
//! go away), so remaining writes are handed to a detached thread with a
//! blocking client and a bounded grace period. Nothing on this path is
//! retried or reported back; it either lands or it is logged and lost.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::client::{WriteMethod, WriteOp};
use crate::error::ApiError;

/// A write prepared for the blocking path: absolute URL, no client state.
#[derive(Debug, Clone)]
pub struct BeaconRequest {
    pub method: WriteMethod,
    pub url: String,
    pub body: Option<serde_json::Value>,
}

impl BeaconRequest {
    pub fn from_op(op: &WriteOp, base_url: &str) -> Result<Self, ApiError> {
        Ok(Self {
            method: op.method(),
            url: format!("{}{}", base_url.trim_end_matches('/'), op.path()),
            body: op.body()?,
        })
    }
}

/// Send `requests` on a detached thread, waiting at most `wait` for the
/// whole batch. The thread outlives the wait if it must; we just stop
/// holding the caller up.
pub fn send_all(requests: Vec<BeaconRequest>, wait: Duration) {
    if requests.is_empty() {
        return;
    }
    let count = requests.len();
    let (done_tx, done_rx) = mpsc::channel();
    thread::spawn(move || {
        run_batch(requests, wait);
        let _ = done_tx.send(());
    });
    match done_rx.recv_timeout(wait) {
        Ok(()) => debug!(count, "teardown flush finished"),
        Err(_) => warn!(count, "teardown flush still running after {:?}", wait),
    }
}

fn run_batch(requests: Vec<BeaconRequest>, per_request: Duration) {
    let client = match reqwest::blocking::Client::builder()
        .timeout(per_request)
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            warn!("teardown flush client failed to build: {}", e);
            return;
        }
    };
    for request in requests {
        let builder = match request.method {
            WriteMethod::Patch => client.patch(&request.url),
            WriteMethod::Delete => client.delete(&request.url),
        };
        let builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder,
        };
        match builder.send() {
            Ok(response) if response.status().is_success() => {
                debug!(url = %request.url, "teardown write delivered");
            }
            Ok(response) => {
                warn!(url = %request.url, status = %response.status(), "teardown write rejected");
            }
            Err(e) => {
                warn!(url = %request.url, "teardown write failed: {}", e);
            }
        }
    }
}
