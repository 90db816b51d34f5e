// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{common::error::AppError, middleware::auth::AuthenticatedUser, models::roles::Role};

/// 1. O Trait que define quais cargos passam pelo portão
pub trait RoleGate: Send + Sync + 'static {
    fn name() -> &'static str;
    fn allows(role: Role) -> bool;
}

/// 2. O Extractor (Guardião)
pub struct RequireRole<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleGate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // A. Extrai Usuário (colocado pelo auth_guard)
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or(AppError::InvalidToken)?;

        // B. Verifica o cargo
        if !T::allows(user.0.role) {
            tracing::warn!(user = %user.0.sub, role = %user.0.role, gate = T::name(), "Acesso negado");
            return Err(AppError::Forbidden);
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS PORTÕES
// ---

/// Editar fluxos, permissões e configurações da loja
pub struct ConfigAdmin;
impl RoleGate for ConfigAdmin {
    fn name() -> &'static str { "config:admin" }
    fn allows(role: Role) -> bool { role.is_config_admin() }
}

pub type RequireConfigAdmin = RequireRole<ConfigAdmin>;
