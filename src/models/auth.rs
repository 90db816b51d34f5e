// src/models/auth.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::roles::Role;

// Dados para login: a loja é identificada pelo slug
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    #[validate(length(min = 1, message = "O identificador da loja é obrigatório."))]
    #[schema(example = "lojacentro")]
    pub store: String,
    #[validate(length(min = 1, message = "O usuário é obrigatório."))]
    #[schema(example = "maria")]
    pub username: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    #[schema(example = "segredo123")]
    pub password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub store_id: Uuid,
    pub role: Role,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub sub: Uuid,       // ID do usuário
    pub store_id: Uuid,  // Loja à qual a sessão está presa
    pub role: Role,
    pub exp: usize,
    pub iat: usize,
}
