//! Proxy error types and their HTTP rendering.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

/// Failures of a single `/accounts` call. None of them is retried.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// Upstream answered with a status >= 400.
    #[error("Nibo returned status {status}")]
    Upstream { status: u16, body: Value },

    /// Upstream did not answer within the configured timeout.
    #[error("Nibo timeout")]
    Timeout,

    /// Connection refused, DNS failure and other transport errors.
    #[error("{0}")]
    Gateway(String),
}

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Gateway(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn detail(&self) -> Value {
        match self {
            Self::Upstream { status, body } => json!({
                "error": "NIBO_ACCOUNTS_FETCH_FAILED",
                "status": status,
                "body": body,
            }),
            Self::Timeout => json!({
                "error": "TIMEOUT",
                "message": self.to_string(),
            }),
            Self::Gateway(message) => json!({
                "error": "BAD_GATEWAY",
                "message": message,
            }),
        }
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Gateway(error_chain(&e))
        }
    }
}

/// Joins an error with its `source()` chain, e.g.
/// `error sending request: client error (Connect): Connection refused`.
pub fn error_chain(e: &dyn std::error::Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[derive(Debug, thiserror::Error)]
    #[error("tcp connect error")]
    struct ConnectError(#[source] std::io::Error);

    #[derive(Debug, thiserror::Error)]
    #[error("error sending request")]
    struct SendError(#[source] ConnectError);

    #[test]
    fn error_chain_includes_causes() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "Connection refused");
        let err = SendError(ConnectError(io));
        assert_eq!(
            error_chain(&err),
            "error sending request: tcp connect error: Connection refused"
        );
    }

    #[tokio::test]
    async fn upstream_error_keeps_upstream_status() {
        let err = ProxyError::Upstream {
            status: 404,
            body: json!({ "msg": "not found" }),
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            json!({
                "detail": {
                    "error": "NIBO_ACCOUNTS_FETCH_FAILED",
                    "status": 404,
                    "body": { "msg": "not found" }
                }
            })
        );
    }

    #[tokio::test]
    async fn timeout_maps_to_504() {
        let response = ProxyError::Timeout.into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            body_json(response).await,
            json!({ "detail": { "error": "TIMEOUT", "message": "Nibo timeout" } })
        );
    }

    #[tokio::test]
    async fn gateway_maps_to_502() {
        let response = ProxyError::Gateway("connection refused".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            body_json(response).await,
            json!({ "detail": { "error": "BAD_GATEWAY", "message": "connection refused" } })
        );
    }
}
