//! Streaming match export
//!
//! Match history is unbounded, so it is never collected into one body. The
//! engine pushes records into a [`ChannelSink`] running on its own task; each
//! record is encoded and handed to the response body as soon as it arrives.
//! The bounded channel gives backpressure: a slow client stalls the engine's
//! walk instead of growing a buffer.
//!
//! The body is a sequence of independent JSON documents, not an array.
//! `jq -s` turns it into one.
//!
//! Headers are committed when the first record is handed over. Until then an
//! export failure becomes a 500; afterwards it can only be logged. A producer
//! that ends without reporting an outcome counts as a failure.

use crate::codec::{encode_pretty, JSON_CONTENT_TYPE};
use crate::core::{CoreEngine, ExportError, MatchSink, SinkError};
use crate::error::AdminError;
use crate::models::MatchRecord;
use anyhow::anyhow;
use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use futures::stream::{self, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};
use types::asset::AssetId;
use types::swap::MatchData;

/// Records buffered between the engine and the client by default.
pub const DEFAULT_EXPORT_BUFFER: usize = 16;

/// Parameters of one match export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportRequest {
    pub base: AssetId,
    pub quote: AssetId,
    pub include_inactive: bool,
    /// Cap on inactive matches; non-positive means no cap.
    pub limit: i64,
}

/// Sink that encodes each record and hands it to the response body.
pub struct ChannelSink {
    tx: mpsc::Sender<Bytes>,
    flushed: usize,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<Bytes>) -> Self {
        Self { tx, flushed: 0 }
    }

    /// Records accepted by the response body so far.
    pub fn flushed(&self) -> usize {
        self.flushed
    }
}

#[async_trait]
impl MatchSink for ChannelSink {
    async fn emit(&mut self, record: MatchData) -> Result<(), SinkError> {
        let doc = encode_pretty(&MatchRecord::from(record)).map_err(|e| SinkError::Encode(e.to_string()))?;
        self.tx.send(Bytes::from(doc)).await.map_err(|_| SinkError::Closed)?;
        self.flushed += 1;
        Ok(())
    }
}

/// Run a match export and turn it into a streaming response.
pub async fn stream_matches(
    core: Arc<dyn CoreEngine>,
    market: String,
    req: ExportRequest,
    buffer: usize,
) -> Result<Response, AdminError> {
    let (tx, mut rx) = mpsc::channel::<Bytes>(buffer.max(1));
    let (outcome_tx, outcome_rx) = oneshot::channel::<Result<usize, ExportError>>();

    tokio::spawn(async move {
        let mut sink = ChannelSink::new(tx);
        let result = core
            .market_matches_streaming(req.base, req.quote, req.include_inactive, req.limit, &mut sink)
            .await;
        let flushed = sink.flushed();
        // Closes the body stream.
        drop(sink);
        match &result {
            Ok(n) => debug!(market = %market, records = n, "match export complete"),
            Err(err) if flushed > 0 => warn!(
                market = %market,
                flushed,
                error = %err,
                "failed to write matches response"
            ),
            Err(_) => {}
        }
        // Only the handler waiting for a first record listens.
        if flushed == 0 {
            if let Err(Err(err)) = outcome_tx.send(result) {
                warn!(market = %market, error = %err, "match export failed after client went away");
            }
        }
    });

    match rx.recv().await {
        Some(first) => {
            let rest = stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|doc| (doc, rx)) });
            let body = stream::once(async move { first })
                .chain(rest)
                .map(Ok::<_, Infallible>);
            Ok((
                StatusCode::OK,
                [(header::CONTENT_TYPE, JSON_CONTENT_TYPE)],
                Body::from_stream(body),
            )
                .into_response())
        }
        None => match outcome_rx.await {
            Ok(Ok(_)) => Ok((StatusCode::OK, [(header::CONTENT_TYPE, JSON_CONTENT_TYPE)]).into_response()),
            Ok(Err(err)) => Err(AdminError::engine("failed to retrieve matches", err)),
            Err(_) => Err(AdminError::engine(
                "failed to retrieve matches",
                anyhow!("match export ended without an outcome"),
            )),
        },
    }
}
