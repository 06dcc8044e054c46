//! Operator notices
//!
//! The body is the notice text, sent as is. The router caps how much of it is
//! read; anything past the cap is reported as an oversized notice.

use crate::error::AdminError;
use crate::params::{self, MAX_NOTE_BYTES};
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, FailedToBufferBody},
        Path, State,
    },
    http::StatusCode,
};
use tracing::info;
use types::message::{Notification, NOTIFY_ROUTE};

fn read_error(rejection: BytesRejection) -> AdminError {
    match rejection {
        BytesRejection::FailedToBufferBody(FailedToBufferBody::LengthLimitError(_)) => {
            AdminError::invalid(format!("cannot send messages larger than {MAX_NOTE_BYTES} bytes"))
        }
        other => AdminError::engine("unable to read request body", other),
    }
}

fn to_note(body: Result<Bytes, BytesRejection>) -> Result<Notification, AdminError> {
    let body = body.map_err(read_error)?;
    let text = params::notice_text(&body)?;
    Notification::new(NOTIFY_ROUTE, text).map_err(|e| AdminError::engine("unable to create notification", e))
}

pub async fn notify(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Result<StatusCode, AdminError> {
    let id = params::decode_account_id(&account_id)?;
    let note = to_note(body)?;
    state.core.notify(id, note).await;
    info!(account = %id, "operator notice sent");
    Ok(StatusCode::OK)
}

pub async fn notify_all(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<StatusCode, AdminError> {
    let note = to_note(body)?;
    state.core.notify_all(note).await;
    info!("operator notice broadcast");
    Ok(StatusCode::OK)
}
