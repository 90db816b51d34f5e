// src/services/tenancy_service.rs

use std::sync::Arc;

use bcrypt::hash;
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::TenantRepository,
    models::config::PersistedBundle,
    models::roles::Role,
    models::tenancy::{normalize_slug, CreateStorePayload, NewStoreUser, Store, StoreStatus, UpdateStorePayload},
    services::{config_service::ConfigService, defaults},
};

#[derive(Clone)]
pub struct TenantService {
    repo: Arc<dyn TenantRepository>,
    config: ConfigService,
    password_cost: u32,
}

impl TenantService {
    pub fn new(repo: Arc<dyn TenantRepository>, config: ConfigService, password_cost: u32) -> Self {
        Self { repo, config, password_cost }
    }

    // Slug normalizado e não-vazio
    fn clean_slug(raw: &str) -> Result<String, AppError> {
        let slug = normalize_slug(raw);
        if slug.is_empty() {
            return Err(AppError::InvalidInput("o identificador deve conter letras ou números".into()));
        }
        Ok(slug)
    }

    async fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let password = password.to_owned();
        let cost = self.password_cost;
        // bcrypt é caro: roda fora do executor assíncrono
        let hashed = tokio::task::spawn_blocking(move || hash(&password, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
        Ok(hashed)
    }

    /// LÓGICA DE NEGÓCIO: cria a loja (ativa), semeia fluxo, assistência,
    /// permissões e configurações padrão e cria o administrador, tudo atômico.
    pub async fn create_store(&self, payload: CreateStorePayload) -> Result<Store, AppError> {
        payload.validate()?;
        let slug = Self::clean_slug(&payload.slug)?;

        // Checa contra TODAS as lojas, inclusive suspensas
        if self.repo.slug_taken(&slug, None).await? {
            return Err(AppError::DuplicateSlug(slug));
        }

        let store = Store {
            id: Uuid::new_v4(),
            slug,
            name: payload.name.trim().to_string(),
            status: StoreStatus::Active,
            created_at: Utc::now(),
        };

        let admin = NewStoreUser {
            name: payload.admin_name.trim().to_string(),
            username: payload.admin_username.trim().to_string(),
            password_hash: self.hash_password(&payload.admin_password).await?,
            role: Role::highest(),
        };

        let bundle = PersistedBundle::from(&defaults::default_bundle(store.id));
        let (store, admin) = self.repo.create_store(&store, &admin, &bundle).await?;

        tracing::info!(store_id = %store.id, slug = %store.slug, admin = %admin.username, "🏪 Loja criada");
        Ok(store)
    }

    pub async fn get_store(&self, store_id: Uuid) -> Result<Store, AppError> {
        self.repo
            .find_store(store_id)
            .await?
            .ok_or(AppError::StoreNotFound(store_id))
    }

    pub async fn list_stores(&self) -> Result<Vec<Store>, AppError> {
        self.repo.list_stores().await
    }

    /// Renomear o slug revalida a unicidade; colisão é rejeitada e nada muda.
    ///
    /// As configurações da empresa são gravadas antes da linha da loja: se a
    /// gravação delas falhar, slug e nome continuam como estavam. Se a loja
    /// falhar depois, as configurações anteriores são regravadas.
    pub async fn update_store(&self, store_id: Uuid, payload: UpdateStorePayload) -> Result<Store, AppError> {
        payload.validate()?;
        let mut store = self.get_store(store_id).await?;
        let previous_slug = store.slug.clone();

        if let Some(raw) = payload.slug.as_deref() {
            let slug = Self::clean_slug(raw)?;
            if slug != store.slug {
                if self.repo.slug_taken(&slug, Some(store_id)).await? {
                    return Err(AppError::DuplicateSlug(slug));
                }
                store.slug = slug;
            }
        }
        if let Some(name) = payload.name {
            store.name = name.trim().to_string();
        }

        let settings_backup = match payload.settings {
            Some(settings) => {
                let previous = self.config.load(store_id).await?;
                self.config.update_company_settings(store_id, settings).await?;
                previous
            }
            None => None,
        };

        match self.repo.update_store(&store).await {
            Ok(store) => {
                if store.slug != previous_slug {
                    tracing::info!(%store_id, from = %previous_slug, to = %store.slug, "Slug da loja alterado");
                }
                Ok(store)
            }
            Err(err) => {
                if let Some(previous) = settings_backup {
                    if let Err(undo) = self.config.restore(store_id, previous).await {
                        tracing::error!(%store_id, error = %undo, "Falha ao desfazer as configurações da empresa");
                    }
                }
                Err(err)
            }
        }
    }

    /// Alterna ativa ⇄ suspensa. Dados e configuração são mantidos.
    pub async fn toggle_store_status(&self, store_id: Uuid) -> Result<Store, AppError> {
        let mut store = self.get_store(store_id).await?;
        store.status = store.status.toggled();
        let store = self.repo.update_store(&store).await?;
        tracing::info!(%store_id, status = ?store.status, "Status da loja alterado");
        Ok(store)
    }
}
