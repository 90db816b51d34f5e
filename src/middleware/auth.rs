// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use uuid::Uuid;

use crate::{common::error::AppError, config::AppState, models::auth::Claims};

// O nome do cabeçalho usado pelas rotas de plataforma (cadastro de lojas)
const PLATFORM_KEY_HEADER: &str = "x-platform-key";

/// Valida o Bearer token e coloca as claims nos "extensions" da requisição.
pub async fn auth_guard(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(AppError::InvalidToken)?;

    let claims = app_state.auth_service.validate_token(bearer.token())?;
    request.extensions_mut().insert(AuthenticatedUser(claims));
    Ok(next.run(request).await)
}

/// Rotas do operador da plataforma: exigem a chave configurada em PLATFORM_API_KEY.
pub async fn platform_guard(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let provided = request
        .headers()
        .get(PLATFORM_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(key) if key == app_state.config.platform_api_key => Ok(next.run(request).await),
        Some(_) => {
            tracing::warn!("Chave de plataforma inválida");
            Err(AppError::Forbidden)
        }
        None => Err(AppError::InvalidToken),
    }
}

// Extrator para obter o usuário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Claims);

impl AuthenticatedUser {
    pub fn user_id(&self) -> Uuid {
        self.0.sub
    }

    pub fn store_id(&self) -> Uuid {
        self.0.store_id
    }

    /// A sessão só enxerga a própria loja.
    pub fn ensure_store(&self, store_id: Uuid) -> Result<(), AppError> {
        if self.0.store_id != store_id {
            tracing::warn!(user = %self.0.sub, own = %self.0.store_id, requested = %store_id, "Acesso a outra loja recusado");
            return Err(AppError::CrossTenantReference { expected: self.0.store_id, found: store_id });
        }
        Ok(())
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::InvalidToken)
    }
}
