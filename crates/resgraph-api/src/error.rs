use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use resgraph_core::ResGraphError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub const AUTH_REALM: &str = "Basic realm=\"resgraph\"";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Graph error: {0}")]
    Graph(#[from] ResGraphError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Graph(err) if err.is_store_error() => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Graph(ResGraphError::NodeNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Graph(ResGraphError::InvalidOperation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Graph(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = self.to_string();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %error_message, "request failed");
        }

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(AUTH_REALM));
        }
        response
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_are_server_errors() {
        for err in [
            ResGraphError::Database("down".into()),
            ResGraphError::Query("syntax".into()),
            ResGraphError::Decode("bad row".into()),
        ] {
            assert!(err.is_store_error());
            assert_eq!(ApiError::from(err).status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
        assert_eq!(
            ApiError::from(ResGraphError::Config("missing uri".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn caller_errors_keep_their_status() {
        let cases = [
            (ResGraphError::NodeNotFound("7".into()), StatusCode::NOT_FOUND),
            (ResGraphError::InvalidOperation("bad id".into()), StatusCode::BAD_REQUEST),
        ];
        for (err, status) in cases {
            assert!(!err.is_store_error());
            assert_eq!(ApiError::from(err).status(), status);
        }
        assert_eq!(
            ApiError::BadRequest("abc".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn unauthorized_carries_challenge() {
        let response = ApiError::Unauthorized("missing credentials".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            AUTH_REALM
        );
    }
}
