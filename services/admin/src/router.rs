use crate::handlers::{account, asset, market, notify, system};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Build the admin API. Routes are served at the root; the listener is
/// expected to be reachable by operators only.
pub fn create_router(state: AppState) -> Router {
    let note_read_limit = state.limits.note_read_limit;

    Router::new()
        .route("/ping", get(system::ping))
        .route("/config", get(system::config))
        .route("/asset/{asset_symbol}", get(asset::asset_info))
        .route("/asset/{asset_symbol}/setfeescale/{scale}", get(asset::set_fee_scale))
        .route("/markets", get(market::markets))
        .route("/market/{market_name}", get(market::market_info))
        .route("/market/{market_name}/orderbook", get(market::order_book))
        .route("/market/{market_name}/epochorders", get(market::epoch_orders))
        .route("/market/{market_name}/matches", get(market::matches))
        .route("/market/{market_name}/resume", get(market::resume))
        .route("/market/{market_name}/suspend", get(market::suspend))
        .route("/enabledataapi/{yes}", get(system::enable_data_api))
        .route("/account/{account_id}", get(account::account_info))
        .route(
            "/account/{account_id}/forgive_match/{match_id}",
            get(account::forgive_match),
        )
        .route("/account/{account_id}/matchoutcomes", get(account::match_outcomes))
        .route("/account/{account_id}/matchfails", get(account::match_fails))
        .route("/account/{account_id}/notify", post(notify::notify))
        .route("/notifyall", post(notify::notify_all))
        .route("/prepaybonds", get(system::prepay_bonds))
        .layer(DefaultBodyLimit::max(note_read_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
