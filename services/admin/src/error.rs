use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Central error type for the admin control plane
///
/// Client-side problems (bad parameters, wrong market state) map to 400 and
/// echo the offending input. Engine failures map to 500; the client sees only
/// the operation that failed while the full cause goes to the log.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Malformed, out-of-range or unresolvable request input.
    #[error("{0}")]
    InvalidInput(String),

    /// The subject exists but is in the wrong state for the request.
    #[error("{0}")]
    InvalidState(String),

    /// The Core Engine failed or returned an inconsistent result.
    #[error("{context}")]
    Engine {
        context: String,
        #[source]
        source: anyhow::Error,
    },
}

impl AdminError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        AdminError::InvalidInput(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        AdminError::InvalidState(msg.into())
    }

    pub fn engine(context: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        AdminError::Engine {
            context: context.into(),
            source: source.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AdminError::InvalidInput(_) | AdminError::InvalidState(_) => StatusCode::BAD_REQUEST,
            AdminError::Engine { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let AdminError::Engine { context, source } = &self {
            tracing::error!(error = %format!("{source:#}"), "{context}");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "rejected request");
        }

        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            format!("{self}\n"),
        )
            .into_response()
    }
}
