use crate::{ApiError, AppState};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use resgraph_core::Settings;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Credentials accepted by [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub required: bool,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub api_key: Option<SecretString>,
}

impl AuthConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            required: settings.security.require_auth,
            username: settings.security.username.clone(),
            password: settings.secrets.password.clone(),
            api_key: settings.secrets.api_key.clone(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            required: false,
            username: None,
            password: None,
            api_key: None,
        }
    }

    /// Whether `headers` carry a valid API key or Basic credentials.
    pub fn authorize(&self, headers: &HeaderMap) -> bool {
        if !self.required {
            return true;
        }

        if let Some(presented) = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
            if let Some(expected) = &self.api_key {
                if presented == expected.expose_secret() {
                    return true;
                }
            }
        }

        match basic_credentials(headers) {
            Some((user, pass)) => match (&self.username, &self.password) {
                (Some(expected_user), Some(expected_pass)) => {
                    user == *expected_user && pass == expected_pass.expose_secret()
                }
                _ => false,
            },
            None => false,
        }
    }
}

/// Decode `Authorization: Basic <base64(user:pass)>`.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if state.auth.authorize(req.headers()) {
        return Ok(next.run(req).await);
    }

    debug!(path = %req.uri().path(), "rejecting unauthenticated request");
    Err(ApiError::Unauthorized("valid credentials required".into()))
}
