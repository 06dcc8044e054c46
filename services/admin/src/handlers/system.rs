use crate::codec::PrettyJson;
use crate::error::AdminError;
use crate::params::{self, QueryParams};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use std::collections::HashMap;
use tracing::info;
use types::ids::CoinId;
use types::message::ConfigSnapshot;

pub async fn ping() -> PrettyJson<&'static str> {
    PrettyJson("pong")
}

pub async fn config(State(state): State<AppState>) -> PrettyJson<ConfigSnapshot> {
    PrettyJson(state.core.config_snapshot().await)
}

pub async fn enable_data_api(
    State(state): State<AppState>,
    Path(yes): Path<String>,
) -> Result<PrettyJson<&'static str>, AdminError> {
    let yes = params::required_bool(&yes)?;
    state.core.enable_data_api(yes).await;
    info!(enabled = yes, "data API toggled");
    Ok(PrettyJson(if yes { "Data API enabled" } else { "Data API disabled" }))
}

/// Pre-generate bonds for later assignment to accounts.
pub async fn prepay_bonds(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<PrettyJson<Vec<CoinId>>, AdminError> {
    let req = params::prepay_request(&QueryParams::new(query))?;
    let coins = state
        .core
        .create_prepaid_bonds(usize::from(req.n), req.strength, req.lock_secs)
        .await
        .map_err(|e| AdminError::engine("error creating bonds", e))?;
    info!(
        count = coins.len(),
        strength = req.strength,
        days = req.days,
        "prepaid bonds created"
    );
    Ok(PrettyJson(coins))
}
