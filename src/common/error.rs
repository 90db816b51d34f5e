use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// Condições esperadas (slug duplicado, cargo/etapa/seção desconhecidos) viram
// variantes tipadas; só falhas realmente inesperadas caem no 500.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Entrada inválida: {0}")]
    InvalidInput(String),

    #[error("Cargo desconhecido: {0}")]
    UnknownRole(String),

    #[error("Etapa desconhecida: {0}")]
    UnknownStep(String),

    #[error("Seção desconhecida: {0}")]
    UnknownSection(String),

    #[error("Permissão desconhecida: {0}")]
    UnknownCapability(String),

    #[error("Slug já está em uso: {0}")]
    DuplicateSlug(String),

    #[error("Feriado duplicado: {0}")]
    DuplicateHoliday(String),

    #[error("Referência a outra loja (esperado {expected}, recebido {found})")]
    CrossTenantReference { expected: Uuid, found: Uuid },

    #[error("Loja não encontrada: {0}")]
    StoreNotFound(Uuid),

    #[error("Loja suspensa")]
    StoreSuspended,

    // Transitória: o rascunho continua em memória e o pacote persistido anterior fica intacto
    #[error("Falha ao persistir a configuração: {0}")]
    PersistenceFailure(String),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    /// `save` pode ser repetido depois de uma falha de persistência.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::PersistenceFailure(_))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidInput(_)
            | AppError::UnknownRole(_)
            | AppError::UnknownSection(_)
            | AppError::UnknownCapability(_) => StatusCode::BAD_REQUEST,
            AppError::UnknownStep(_) | AppError::StoreNotFound(_) => StatusCode::NOT_FOUND,
            AppError::DuplicateSlug(_) | AppError::DuplicateHoliday(_) => StatusCode::CONFLICT,
            AppError::CrossTenantReference { .. } | AppError::Forbidden | AppError::StoreSuspended => {
                StatusCode::FORBIDDEN
            }
            AppError::InvalidCredentials | AppError::InvalidToken | AppError::JwtError(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::PersistenceFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) | AppError::BcryptError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    // Chave do catálogo de mensagens + argumento opcional para interpolar
    fn message_key(&self) -> (&'static str, Option<String>) {
        match self {
            AppError::ValidationError(_) => ("error.validation", None),
            AppError::InvalidInput(msg) => ("error.invalid_input", Some(msg.clone())),
            AppError::UnknownRole(role) => ("error.unknown_role", Some(role.clone())),
            AppError::UnknownStep(step) => ("error.unknown_step", Some(step.clone())),
            AppError::UnknownSection(section) => ("error.unknown_section", Some(section.clone())),
            AppError::UnknownCapability(cap) => ("error.unknown_capability", Some(cap.clone())),
            AppError::DuplicateSlug(slug) => ("error.duplicate_slug", Some(slug.clone())),
            AppError::DuplicateHoliday(h) => ("error.duplicate_holiday", Some(h.clone())),
            AppError::CrossTenantReference { .. } => ("error.cross_tenant", None),
            AppError::StoreNotFound(_) => ("error.store_not_found", None),
            AppError::StoreSuspended => ("error.store_suspended", None),
            AppError::PersistenceFailure(_) => ("error.persistence_failure", None),
            AppError::InvalidCredentials => ("error.invalid_credentials", None),
            AppError::InvalidToken | AppError::JwtError(_) => ("error.invalid_token", None),
            AppError::Forbidden => ("error.forbidden", None),
            AppError::DatabaseError(_) | AppError::InternalServerError(_) | AppError::BcryptError(_) => {
                ("error.internal", None)
            }
        }
    }

    /// Converte para a resposta HTTP no idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Erro Interno do Servidor: {:?}", self);
        }
        if let AppError::PersistenceFailure(reason) = self {
            tracing::warn!("Falha de persistência (recuperável): {}", reason);
        }

        let (key, arg) = self.message_key();
        let error = i18n.translate(&locale.0, key, arg.as_deref());

        let details = match self {
            // Retorna todos os detalhes da validação, campo a campo
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<Value> = field_errors
                        .iter()
                        .map(|e| {
                            let msg = e.message.as_ref().map(|m| m.to_string()).unwrap_or_else(|| e.code.to_string());
                            Value::String(msg)
                        })
                        .collect();
                    details.insert(field.to_string(), Value::Array(messages));
                }
                Some(Value::Object(details))
            }
            AppError::CrossTenantReference { expected, found } => {
                Some(json!({ "expectedStoreId": expected, "foundStoreId": found }))
            }
            AppError::PersistenceFailure(_) => Some(json!({ "retryable": true })),
            _ => None,
        };

        ApiError { status, error, details }
    }
}

// O erro que efetivamente sai pela API
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

// Para middlewares que não têm acesso ao Locale: usa o idioma padrão
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default(), &I18nStore::default())
            .into_response()
    }
}
