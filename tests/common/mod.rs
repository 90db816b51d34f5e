//! Utilitários compartilhados pelos testes de integração
//!
//! Monta o `AppState` sobre o backend em memória e oferece atalhos para
//! criar lojas e abrir sessões.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use console_backend::{
    common::error::AppError,
    config::{AppState, Config},
    db::{ConfigStore, MemoryBackend},
    models::{auth::Claims, config::PersistedBundle, tenancy::{CreateStorePayload, Store}},
};

pub const ADMIN_PASSWORD: &str = "segredo123";

pub fn test_config() -> Config {
    Config {
        database_url: None,
        database_max_connections: 1,
        jwt_secret: "segredo-de-teste".into(),
        platform_api_key: "chave-de-teste".into(),
        bind_addr: "127.0.0.1:0".into(),
        // Custo mínimo do bcrypt: os testes não precisam de hash lento
        bcrypt_cost: 4,
    }
}

pub fn memory_state() -> (AppState, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::new());
    let state = AppState::assemble(test_config(), None, backend.clone(), backend.clone());
    (state, backend)
}

/// Estado cujo `ConfigStore` pode ser forçado a falhar nas gravações.
pub fn flaky_state() -> (AppState, Arc<FlakyStore>) {
    let backend = Arc::new(MemoryBackend::new());
    let flaky = Arc::new(FlakyStore::new(backend.clone()));
    let state = AppState::assemble(test_config(), None, flaky.clone(), backend);
    (state, flaky)
}

pub fn store_payload(slug: &str) -> CreateStorePayload {
    CreateStorePayload {
        name: format!("Loja {slug}"),
        slug: slug.to_string(),
        admin_name: "Maria Souza".into(),
        admin_username: "maria".into(),
        admin_password: ADMIN_PASSWORD.into(),
    }
}

pub async fn create_store(state: &AppState, slug: &str) -> Store {
    state
        .tenant_service
        .create_store(store_payload(slug))
        .await
        .expect("Failed to create store")
}

/// Faz login como o administrador da loja e devolve as claims do token.
pub async fn login_admin(state: &AppState, slug: &str) -> Claims {
    let response = state
        .auth_service
        .login(slug, "maria", ADMIN_PASSWORD)
        .await
        .expect("Failed to log in");
    state
        .auth_service
        .validate_token(&response.token)
        .expect("Token should be valid")
}

/// `ConfigStore` que delega ao backend em memória, mas recusa gravações
/// enquanto `fail_writes` estiver ligado.
pub struct FlakyStore {
    inner: Arc<MemoryBackend>,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: Arc<MemoryBackend>) -> Self {
        Self { inner, fail_writes: AtomicBool::new(false) }
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConfigStore for FlakyStore {
    async fn load(&self, store_id: Uuid) -> Result<Option<PersistedBundle>, AppError> {
        self.inner.load(store_id).await
    }

    async fn write(&self, store_id: Uuid, bundle: &PersistedBundle) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::InternalServerError(anyhow::anyhow!("conexão perdida no meio da gravação")));
        }
        self.inner.write(store_id, bundle).await
    }
}
