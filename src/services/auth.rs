// src/services/auth.rs

use std::sync::Arc;

use bcrypt::verify;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    common::error::AppError,
    db::TenantRepository,
    models::auth::{AuthResponse, Claims},
    models::tenancy::{normalize_slug, StoreStatus, StoreUser},
};

#[derive(Clone)]
pub struct AuthService {
    repo: Arc<dyn TenantRepository>,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(repo: Arc<dyn TenantRepository>, jwt_secret: String) -> Self {
        Self { repo, jwt_secret }
    }

    /// Login por (slug da loja, usuário, senha). Lojas suspensas não entram.
    pub async fn login(&self, store_slug: &str, username: &str, password: &str) -> Result<AuthResponse, AppError> {
        let store = self
            .repo
            .find_store_by_slug(&normalize_slug(store_slug))
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let user = self
            .repo
            .find_user(store.id, username.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        // Só depois da senha, para não revelar quais lojas existem
        if store.status == StoreStatus::Suspended {
            tracing::warn!(store_id = %store.id, user = %user.username, "Login recusado: loja suspensa");
            return Err(AppError::StoreSuspended);
        }

        let token = self.create_token(&user)?;
        Ok(AuthResponse { token, store_id: user.store_id, role: user.role })
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        Ok(token_data.claims)
    }

    fn create_token(&self, user: &StoreUser) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(7);

        let claims = Claims {
            sub: user.id,
            store_id: user.store_id,
            role: user.role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}
