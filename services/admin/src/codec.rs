//! Response encoding
//!
//! Every JSON body is pretty-printed with a four-space indent and terminated
//! by a newline so that operators can read responses straight off `curl`.
//! The streaming export uses the same encoding per record.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Encode a value as indented JSON followed by a newline.
pub fn encode_pretty<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::with_capacity(128);
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}

/// A 200 response carrying a pretty-printed JSON body.
#[derive(Debug, Clone)]
pub struct PrettyJson<T>(pub T);

impl<T: Serialize> IntoResponse for PrettyJson<T> {
    fn into_response(self) -> Response {
        match encode_pretty(&self.0) {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, JSON_CONTENT_TYPE)],
                body,
            )
                .into_response(),
            Err(err) => {
                tracing::error!(error = %err, "JSON encode error");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_four_space_indent_and_trailing_newline() {
        let body = encode_pretty(&json!({"market": "dcr_btc"})).unwrap();
        assert_eq!(
            String::from_utf8(body).unwrap(),
            "{\n    \"market\": \"dcr_btc\"\n}\n"
        );
    }

    #[test]
    fn test_scalar_body() {
        let body = encode_pretty("pong").unwrap();
        assert_eq!(body, b"\"pong\"\n");
    }

    #[test]
    fn test_pretty_json_response_headers() {
        let resp = PrettyJson(vec![1, 2, 3]).into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], JSON_CONTENT_TYPE);
    }
}
