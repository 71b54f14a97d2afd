//! Relay consumer.
//!
//! Frames are processed one at a time in delivery order: decode, classify,
//! apply, then persist the cursor. A store failure ends the session before the
//! cursor moves, and the next session resumes from the last persisted cursor,
//! so the failed event is delivered again.

use std::sync::Arc;

use futures::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use shared::event::{EventKind, RepoEvent};
use shared::filter::{classify, Classified, Rejection};
use shared::uri::AtUri;
use time::OffsetDateTime;
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use crate::config::IngesterConfig;
use crate::error::{IngestError, StoreError};
use crate::reconciler::Reconciler;
use crate::store::ProjectionStore;

#[derive(Debug, Deserialize)]
struct Frame {
    did: String,
    time_us: i64,
    kind: String,
    commit: Option<CommitFrame>,
}

#[derive(Debug, Deserialize)]
struct CommitFrame {
    operation: EventKind,
    collection: String,
    rkey: String,
    record: Option<Value>,
    cid: Option<String>,
}

impl Frame {
    fn into_event(self) -> Option<(i64, RepoEvent)> {
        if self.kind != "commit" {
            return None;
        }
        let commit = self.commit?;

        Some((self.time_us, RepoEvent {
            kind: commit.operation,
            uri: AtUri::new(&self.did, &commit.collection, &commit.rkey).to_string(),
            collection: commit.collection,
            cid: commit.cid,
            author: self.did,
            record: commit.record,
        }))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Applied,
    Rejected(Rejection),
    /// Identity and account frames, or commits without a body.
    Ignored,
    Undecodable,
}

pub struct Ingester {
    store: Arc<dyn ProjectionStore>,
    config: IngesterConfig,
}

impl Ingester {
    pub fn new(store: Arc<dyn ProjectionStore>, config: IngesterConfig) -> Self {
        Self { store, config }
    }

    /// Without a cursor the relay starts from live events.
    pub fn subscribe_url(&self, cursor: Option<i64>) -> String {
        let mut params: Vec<String> = self.config.collections
            .iter()
            .map(|c| format!("wantedCollections={c}"))
            .collect();
        if let Some(cursor) = cursor {
            params.push(format!("cursor={cursor}"));
        }

        let separator = if self.config.endpoint.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.config.endpoint, separator, params.join("&"))
    }

    pub async fn handle_frame(&self, text: &str) -> Result<FrameOutcome, StoreError> {
        let frame: Frame = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Skipping undecodable relay frame: {}", e);
                return Ok(FrameOutcome::Undecodable);
            }
        };

        let Some((cursor, event)) = frame.into_event() else {
            return Ok(FrameOutcome::Ignored);
        };

        let outcome = match classify(&event, OffsetDateTime::now_utc()) {
            Classified::Accepted(mutation) => {
                Reconciler::apply(self.store.as_ref(), &mutation).await.map_err(|e| {
                    error!(uri = %event.uri, "failed to apply relay event: {}", e);
                    e
                })?;
                FrameOutcome::Applied
            }
            Classified::Rejected(rejection) => {
                debug!(uri = %event.uri, "dropping record: {}", rejection);
                FrameOutcome::Rejected(rejection)
            }
        };

        self.store.save_cursor(&self.config.service, cursor).await?;
        Ok(outcome)
    }

    async fn session(&self, processed: &mut usize) -> Result<(), IngestError> {
        let cursor = self.store.load_cursor(&self.config.service).await?;
        let url = self.subscribe_url(cursor);

        let (mut socket, _) = connect_async(url.as_str()).await.map_err(IngestError::Connect)?;
        info!("📡 Connected to relay {} (cursor: {:?})", self.config.endpoint, cursor);

        while let Some(message) = socket.next().await {
            match message.map_err(IngestError::Stream)? {
                Message::Text(text) => {
                    self.handle_frame(&text).await?;
                    *processed += 1;
                }
                Message::Binary(bytes) => match std::str::from_utf8(&bytes) {
                    Ok(text) => {
                        self.handle_frame(text).await?;
                        *processed += 1;
                    }
                    Err(_) => warn!("Skipping non-UTF-8 binary relay frame ({} bytes)", bytes.len()),
                },
                Message::Close(frame) => {
                    info!("Relay closed the connection: {:?}", frame);
                    break;
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Runs until the task is dropped. Every session failure is retried with
    /// exponential backoff; the backoff resets after a session that made
    /// progress.
    pub async fn run(self) {
        let mut backoff = self.config.min_backoff;
        info!("🛰️ Ingester started for {:?}", self.config.collections);

        loop {
            let mut processed = 0;
            match self.session(&mut processed).await {
                Ok(()) => info!("Relay session ended after {} frames", processed),
                Err(e) => error!("Relay session failed after {} frames: {}", processed, e),
            }

            if processed > 0 {
                backoff = self.config.min_backoff;
            }

            warn!("Reconnecting to relay in {:?}", backoff);
            sleep(backoff).await;
            backoff = (backoff * 2).min(self.config.max_backoff);
        }
    }
}
