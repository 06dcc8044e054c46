//! Match export over HTTP
//!
//! The export body is a sequence of pretty-printed JSON documents. A failure
//! before the first record is a 500; a failure afterwards truncates the body
//! at a document boundary. A client leaving mid-stream stops the export.

use admin::sim::SimulatedCore;
use admin::{create_router, AppState, Limits};
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use futures::StreamExt;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn venue(active: u64, inactive: u64) -> Arc<SimulatedCore> {
    let core = SimulatedCore::new();
    core.add_asset_defaults(0, "btc", 100);
    core.add_asset_defaults(42, "dcr", 100);
    core.add_market(42, 0, 60_000, true);
    for i in 0..active {
        core.add_match(42, 0, SimulatedCore::sample_match(i, true));
    }
    for i in active..active + inactive {
        core.add_match(42, 0, SimulatedCore::sample_match(i, false));
    }
    Arc::new(core)
}

fn app(core: &Arc<SimulatedCore>, export_buffer: usize) -> Router {
    let limits = Limits {
        export_buffer,
        ..Limits::default()
    };
    create_router(AppState::new(core.clone()).with_limits(limits))
}

async fn export(app: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

fn documents(body: &[u8]) -> Vec<Value> {
    serde_json::Deserializer::from_slice(body)
        .into_iter::<Value>()
        .collect::<Result<_, _>>()
        .unwrap()
}

#[tokio::test]
async fn test_active_matches_by_default() {
    let core = venue(3, 4);
    let (status, body) = export(&app(&core, 2), "/market/dcr_btc/matches").await;
    assert_eq!(status, StatusCode::OK);

    let docs = documents(&body);
    assert_eq!(docs.len(), 3);
    for doc in &docs {
        assert_eq!(doc["active"], true);
        assert_eq!(doc["status"], "MakerSwapCast");
        assert_eq!(doc["epochDur"], 60_000);
    }
    // Separate documents, each pretty-printed and newline-terminated.
    let text = String::from_utf8(body).unwrap();
    assert!(text.starts_with("{\n    \""));
    assert_eq!(text.matches("}\n{").count(), 2);
}

#[tokio::test]
async fn test_inactive_matches_capped_by_n() {
    let core = venue(1, 6);
    let app = app(&core, 4);

    let (_, body) = export(&app, "/market/dcr_btc/matches?includeinactive=true").await;
    assert_eq!(documents(&body).len(), 7);

    let (_, body) = export(&app, "/market/dcr_btc/matches?includeinactive=1&n=2").await;
    let docs = documents(&body);
    assert_eq!(docs.len(), 3);
    assert_eq!(docs.iter().filter(|d| d["active"] == false).count(), 2);

    let (_, body) = export(&app, "/market/dcr_btc/matches?includeinactive=T&n=-1").await;
    assert_eq!(documents(&body).len(), 7);
}

#[tokio::test]
async fn test_failure_after_records_truncates_body() {
    let core = venue(5, 0);
    core.fail_matches_after(42, 0, 3);
    let (status, body) = export(&app(&core, 1), "/market/dcr_btc/matches").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(documents(&body).len(), 3);
}

#[tokio::test]
async fn test_failure_before_first_record_is_server_error() {
    let core = venue(5, 0);
    core.fail_matches_after(42, 0, 0);
    let req = Request::builder()
        .uri("/market/dcr_btc/matches")
        .body(Body::empty())
        .unwrap();
    let resp = app(&core, 4).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        resp.headers()[header::CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"failed to retrieve matches\n");
}

#[tokio::test]
async fn test_crashed_export_is_server_error() {
    let core = venue(3, 0);
    core.crash_match_exports(42, 0);
    let (status, body) = export(&app(&core, 4), "/market/dcr_btc/matches").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, b"failed to retrieve matches\n");
}

#[tokio::test]
async fn test_client_leaving_mid_stream_stops_export() {
    let core = venue(6, 0);
    let req = Request::builder()
        .uri("/market/dcr_btc/matches")
        .body(Body::empty())
        .unwrap();
    let resp = app(&core, 1).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let mut body = resp.into_body().into_data_stream();
    let first = body.next().await.unwrap().unwrap();
    let doc: Value = serde_json::from_slice(&first).unwrap();
    assert_eq!(doc["active"], true);
    drop(body);

    tokio::time::timeout(Duration::from_secs(5), async {
        while core.interrupted_exports() == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("export kept running after the client left");
    assert_eq!(core.interrupted_exports(), 1);
}

#[tokio::test]
async fn test_no_matches_is_empty_ok() {
    let core = venue(0, 0);
    let (status, body) = export(&app(&core, 4), "/market/dcr_btc/matches?includeinactive=true").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_bad_parameters_rejected_before_engine_call() {
    let core = venue(2, 2);
    let app = app(&core, 4);
    let before = core.engine_calls();

    let (status, body) = export(&app, "/market/dcr_btc/matches?includeinactive=yes").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(String::from_utf8(body).unwrap().starts_with("invalid include inactive boolean"));

    let (status, body) = export(&app, "/market/dcr_btc/matches?n=1.5").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(String::from_utf8(body).unwrap().starts_with("invalid n int"));

    assert_eq!(core.engine_calls(), before);

    let (status, body) = export(&app, "/market/doge_btc/matches").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, b"unknown market \"doge_btc\"\n");
}
