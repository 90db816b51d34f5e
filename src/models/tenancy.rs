// src/models/tenancy.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::roles::Role;
use crate::models::settings::UpdateCompanySettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    Active,
    Suspended,
}

impl StoreStatus {
    pub fn toggled(self) -> Self {
        match self {
            StoreStatus::Active => StoreStatus::Suspended,
            StoreStatus::Suspended => StoreStatus::Active,
        }
    }
}

// ---
// 1. Store (a Loja / tenant)
// ---
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,
    /// Identificador de login, único entre todas as lojas
    #[schema(example = "lojacentro")]
    pub slug: String,
    #[schema(example = "Loja Centro")]
    pub name: String,
    pub status: StoreStatus,
    pub created_at: DateTime<Utc>,
}

// ---
// 2. StoreUser (usuário vinculado a uma loja)
// ---
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoreUser {
    pub id: Uuid,
    #[schema(ignore)]
    pub store_id: Uuid,
    #[schema(example = "Maria Souza")]
    pub name: String,
    #[schema(example = "maria")]
    pub username: String,
    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Slug normalizado: minúsculas, só letras e dígitos ASCII.
pub fn normalize_slug(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

// O que o operador da plataforma envia para criar uma loja
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStorePayload {
    #[validate(length(min = 1, message = "O nome da loja é obrigatório."))]
    #[schema(example = "Loja Centro")]
    pub name: String,

    #[validate(length(min = 1, message = "O identificador da loja é obrigatório."))]
    #[schema(example = "lojacentro")]
    pub slug: String,

    #[validate(length(min = 1, message = "O nome do administrador é obrigatório."))]
    #[schema(example = "Maria Souza")]
    pub admin_name: String,

    #[validate(length(min = 1, message = "O usuário do administrador é obrigatório."))]
    #[schema(example = "maria")]
    pub admin_username: String,

    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    #[schema(example = "segredo123")]
    pub admin_password: String,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStorePayload {
    #[schema(example = "lojanova")]
    pub slug: Option<String>,

    #[validate(length(min = 1, message = "O nome da loja não pode ficar vazio."))]
    pub name: Option<String>,

    #[validate(nested)]
    pub settings: Option<UpdateCompanySettings>,
}

// Dados do usuário a ser criado junto com a loja (senha já com hash)
#[derive(Debug, Clone)]
pub struct NewStoreUser {
    pub name: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}
