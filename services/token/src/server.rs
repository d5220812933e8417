//! HTTP transport for the access token endpoint.

use crate::error::TokenError;
use crate::issuer::AccessTokenIssuer;
use crate::metrics;
use crate::model::{AccessTokenErr, AccessTokenReq, AccessTokenRsp, ProblemDetails};
use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Form, Json, Router};
use std::sync::Arc;
use tracing::{error, warn};

/// Path of the token endpoint.
pub const TOKEN_PATH: &str = "/oauth2/token";

/// Media type of `ProblemDetails` bodies.
pub const PROBLEM_JSON: &str = "application/problem+json";

/// Result of one call to the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessTokenOutcome {
    /// 200 with an `AccessTokenRsp` body.
    Granted(AccessTokenRsp),
    /// 400 with an `AccessTokenErr` body.
    Rejected(AccessTokenErr),
    /// 403 with a `ProblemDetails` body.
    Forbidden,
}

impl AccessTokenOutcome {
    /// HTTP status carried by this outcome.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Granted(_) => StatusCode::OK,
            Self::Rejected(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
        }
    }
}

impl From<Result<AccessTokenRsp, TokenError>> for AccessTokenOutcome {
    fn from(result: Result<AccessTokenRsp, TokenError>) -> Self {
        match result {
            Ok(rsp) => Self::Granted(rsp),
            Err(e) => Self::Rejected(e.to_response()),
        }
    }
}

impl IntoResponse for AccessTokenOutcome {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::Granted(rsp) => (status, Json(rsp)).into_response(),
            Self::Rejected(err) => (status, Json(err)).into_response(),
            Self::Forbidden => (
                status,
                [(header::CONTENT_TYPE, PROBLEM_JSON)],
                Json(ProblemDetails::forbidden()),
            )
                .into_response(),
        }
    }
}

/// `POST /oauth2/token`.
///
/// Issuance runs on its own task so a panic inside it surfaces as 403
/// instead of dropping the connection.
pub async fn access_token_handler(
    State(issuer): State<Arc<AccessTokenIssuer>>,
    form: Result<Form<AccessTokenReq>, FormRejection>,
) -> AccessTokenOutcome {
    let outcome = match form {
        Ok(Form(request)) => {
            match tokio::spawn(async move { issuer.issue(request).await }).await {
                Ok(result) => AccessTokenOutcome::from(result),
                Err(e) => {
                    error!(error = %e, "Access token issuance aborted");
                    AccessTokenOutcome::Forbidden
                }
            }
        }
        Err(rejection) => {
            warn!(reason = %rejection.body_text(), "Malformed access token request");
            let err = TokenError::invalid_request("malformed request body");
            metrics::record_rejection(err.error_code().as_str());
            AccessTokenOutcome::Rejected(err.to_response())
        }
    };

    metrics::record_http_status(outcome.status().as_u16());
    outcome
}

/// Router serving the token endpoint.
pub fn router(issuer: Arc<AccessTokenIssuer>) -> Router {
    Router::new()
        .route(TOKEN_PATH, post(access_token_handler))
        .with_state(issuer)
}
