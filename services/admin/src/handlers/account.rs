use crate::codec::PrettyJson;
use crate::error::AdminError;
use crate::models::{ApiTime, ForgiveResult};
use crate::params::{self, QueryParams};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use chrono::Utc;
use std::collections::HashMap;
use tracing::info;
use types::account::AccountInfo;
use types::swap::{MatchFail, MatchOutcome};

pub async fn account_info(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<PrettyJson<AccountInfo>, AdminError> {
    let id = params::account_id_from_path(&account_id)?;
    let info = state
        .core
        .account_info(id)
        .await
        .map_err(|e| AdminError::engine("failed to retrieve account", e))?;
    Ok(PrettyJson(info))
}

pub async fn forgive_match(
    State(state): State<AppState>,
    Path((account_id, match_id)): Path<(String, String)>,
) -> Result<PrettyJson<ForgiveResult>, AdminError> {
    let id = params::decode_account_id(&account_id)?;
    let mid = params::match_id(&match_id)?;
    let res = state
        .core
        .forgive_match_fail(id, mid)
        .await
        .map_err(|e| AdminError::engine("failed to forgive failed match", e))?;

    info!(
        account = %id,
        match_id = %mid,
        forgiven = res.forgiven,
        unbanned = res.unbanned,
        "match failure forgiveness"
    );
    Ok(PrettyJson(ForgiveResult {
        accountid: account_id,
        forgiven: res.forgiven,
        unbanned: res.unbanned,
        forgivetime: ApiTime(Utc::now()),
    }))
}

pub async fn match_outcomes(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<PrettyJson<Vec<MatchOutcome>>, AdminError> {
    let id = params::decode_account_id(&account_id)?;
    let n = params::history_limit(&QueryParams::new(query))?;
    let outcomes = state
        .core
        .account_match_outcomes(id, n)
        .await
        .map_err(|e| AdminError::engine("failed to retrieve match outcomes", e))?;
    Ok(PrettyJson(outcomes))
}

pub async fn match_fails(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<PrettyJson<Vec<MatchFail>>, AdminError> {
    let id = params::decode_account_id(&account_id)?;
    let n = params::history_limit(&QueryParams::new(query))?;
    let fails = state
        .core
        .user_match_fails(id, n)
        .await
        .map_err(|e| AdminError::engine("failed to retrieve match fails", e))?;
    Ok(PrettyJson(fails))
}
