use crate::aggregate::PartialResults;
use crate::codec::PrettyJson;
use crate::core::AssetHandle;
use crate::error::AdminError;
use crate::models::AssetInfo;
use crate::params;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use tracing::{debug, info};
use types::asset::AssetId;
use types::fee::cap_fee_rate;

async fn supported_asset(state: &AppState, symbol: &str, id: AssetId) -> Result<AssetHandle, AdminError> {
    state.core.asset(id).await.map_err(|err| {
        debug!(asset = symbol, asset_id = id, error = %err, "asset lookup failed");
        AdminError::invalid(format!("unsupported asset {symbol:?} / {id}"))
    })
}

/// Asset descriptor with its live fee rate and sync status.
///
/// The two backend queries are independent. A failure in one is reported in
/// `errors` and leaves the other's value intact.
pub async fn asset_info(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<PrettyJson<AssetInfo>, AdminError> {
    let (symbol, id) = params::asset_id(&symbol)?;
    let handle = supported_asset(&state, &symbol, id).await?;

    let (fee_rate, synced) = futures::join!(handle.backend.fee_rate(), handle.backend.synced());

    // Same ceiling the engine applies to scaled rates when it processes an
    // epoch.
    let scaled_fee_rate = match &fee_rate {
        Ok(rate) => cap_fee_rate(state.core.scale_fee_rate(id, *rate).await, handle.asset.max_fee_rate),
        Err(_) => 0,
    };

    let mut partial = PartialResults::new();
    let current_fee_rate = partial.take("current fee rate", fee_rate);
    let synced = partial.take("sync status", synced);

    Ok(PrettyJson(AssetInfo {
        asset: handle.asset,
        current_fee_rate,
        scaled_fee_rate,
        synced,
        errors: partial.into_errors(),
    }))
}

pub async fn set_fee_scale(
    State(state): State<AppState>,
    Path((symbol, scale)): Path<(String, String)>,
) -> Result<StatusCode, AdminError> {
    let (symbol, id) = params::asset_id(&symbol)?;
    let scale = params::fee_rate_scale(&scale)?;
    supported_asset(&state, &symbol, id).await?;

    info!(
        asset = %symbol.to_uppercase(),
        asset_id = id,
        scale,
        "setting fee rate scale factor"
    );
    state.core.set_fee_rate_scale(id, scale).await;
    Ok(StatusCode::OK)
}
