// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use chrono::Utc;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::Session,
};

/// Guardião das rotas exclusivas do planejador.
pub struct RequirePlanner(pub Session);

impl<S> FromRequestParts<S> for RequirePlanner
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(session) = AuthenticatedUser::from_request_parts(parts, state).await?;

        if let Err(e) = session.require_planner(Utc::now()) {
            let app_state = AppState::from_ref(state);
            let locale = Locale::from_headers(&parts.headers);
            tracing::warn!("Acesso de planejador negado para {}", session.user.id);
            return Err(e.to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequirePlanner(session))
    }
}
