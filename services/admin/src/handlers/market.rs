use crate::codec::PrettyJson;
use crate::core::CoreEngine;
use crate::error::AdminError;
use crate::export::{stream_matches, ExportRequest};
use crate::lifecycle::LifecycleController;
use crate::models::{MarketStatusView, OrderBookView, ResumeResult, SuspendResult};
use crate::params::{self, QueryParams};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use tracing::error;
use types::market::MarketStatus;
use types::order::BookOrderNote;

async fn known_status(core: &dyn CoreEngine, market: &str) -> Result<MarketStatus, AdminError> {
    core.market_status(market)
        .await
        .ok_or_else(|| AdminError::invalid(format!("unknown market {market:?}")))
}

/// All markets keyed by name. The name is not repeated inside each entry.
pub async fn markets(State(state): State<AppState>) -> PrettyJson<BTreeMap<String, MarketStatusView>> {
    let statuses = state.core.market_statuses().await;
    PrettyJson(
        statuses
            .iter()
            .map(|(name, status)| (name.clone(), MarketStatusView::new(None, status)))
            .collect(),
    )
}

pub async fn market_info(
    State(state): State<AppState>,
    Path(market): Path<String>,
) -> Result<PrettyJson<MarketStatusView>, AdminError> {
    let market = params::market_name(&market);
    let status = known_status(state.core.as_ref(), &market).await?;
    Ok(PrettyJson(MarketStatusView::new(Some(market), &status)))
}

#[derive(Debug, Clone, Copy)]
enum Board {
    /// Orders resting on the book.
    Book,
    /// Orders queued in the active epoch.
    Epoch,
}

async fn board(state: &AppState, market: &str, which: Board) -> Result<PrettyJson<OrderBookView>, AdminError> {
    let market = params::market_name(market);
    let status = known_status(state.core.as_ref(), &market).await?;
    let orders = match which {
        Board::Book => state
            .core
            .book_orders(status.base, status.quote)
            .await
            .map_err(|e| AdminError::engine("failed to obtain order book", e))?,
        Board::Epoch => state
            .core
            .epoch_orders(status.base, status.quote)
            .await
            .map_err(|e| AdminError::engine("failed to obtain epoch orders", e))?,
    };

    let notes = orders
        .iter()
        .filter_map(|order| match BookOrderNote::from_order(order, &market) {
            Ok(note) => Some(note),
            Err(err) => {
                error!(market = %market, error = %err, "unable to encode order");
                None
            }
        })
        .collect();

    Ok(PrettyJson(OrderBookView {
        marketid: market,
        epoch: u64::try_from(status.active_epoch).unwrap_or_default(),
        orders: notes,
    }))
}

pub async fn order_book(
    State(state): State<AppState>,
    Path(market): Path<String>,
) -> Result<PrettyJson<OrderBookView>, AdminError> {
    board(&state, &market, Board::Book).await
}

pub async fn epoch_orders(
    State(state): State<AppState>,
    Path(market): Path<String>,
) -> Result<PrettyJson<OrderBookView>, AdminError> {
    board(&state, &market, Board::Epoch).await
}

/// Stream the market's matches. `n` only caps inactive matches.
pub async fn matches(
    State(state): State<AppState>,
    Path(market): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response, AdminError> {
    let query = QueryParams::new(query);
    let include_inactive = params::include_inactive(&query)?;
    let limit = params::match_limit(&query)?;

    let market = params::market_name(&market);
    let status = known_status(state.core.as_ref(), &market).await?;
    let req = ExportRequest {
        base: status.base,
        quote: status.quote,
        include_inactive,
        limit,
    };
    stream_matches(state.core.clone(), market, req, state.limits.export_buffer).await
}

pub async fn resume(
    State(state): State<AppState>,
    Path(market): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<PrettyJson<ResumeResult>, AdminError> {
    let when = params::schedule(&QueryParams::new(query), "resume", Utc::now())?;
    let market = params::market_name(&market);
    LifecycleController::new(state.core.as_ref())
        .resume(&market, when)
        .await
        .map(PrettyJson)
}

pub async fn suspend(
    State(state): State<AppState>,
    Path(market): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<PrettyJson<SuspendResult>, AdminError> {
    let query = QueryParams::new(query);
    let when = params::schedule(&query, "suspend", Utc::now())?;
    let persist_book = params::persist_book(&query)?;
    let market = params::market_name(&market);
    LifecycleController::new(state.core.as_ref())
        .suspend(&market, when, persist_book)
        .await
        .map(PrettyJson)
}
