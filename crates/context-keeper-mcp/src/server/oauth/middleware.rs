//! Bearer token gate for protected routes.
//!
//! ```rust,ignore
//! let protected = Router::new()
//!     .route("/tools", get(list_tools))
//!     .route_layer(middleware::from_fn_with_state(oauth.clone(), require_bearer));
//! ```
//!
//! Handlers behind the gate read the verified grant with
//! `Extension(grant): Extension<GrantContext>`.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::service::OAuthServer;

/// Reject requests without a valid access token; otherwise attach its
/// [`GrantContext`](super::types::GrantContext) and continue.
pub async fn require_bearer(State(oauth): State<OAuthServer>, mut req: Request, next: Next) -> Response {
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    match oauth.verify(authorization.as_deref()).await {
        Ok(grant) => {
            req.extensions_mut().insert(grant);
            next.run(req).await
        }
        Err(e) => {
            tracing::debug!(error = e.code(), path = %req.uri().path(), "Rejected request to protected route");
            e.into_response()
        }
    }
}
