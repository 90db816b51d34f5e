// src/db/memory.rs
//
// Backend em memória: usado quando DATABASE_URL não está definida (modo de
// desenvolvimento) e pelos testes. Mesma semântica dos repositórios Postgres.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::db::config_repo::ConfigStore;
use crate::db::tenancy_repo::TenantRepository;
use crate::models::config::PersistedBundle;
use crate::models::tenancy::{NewStoreUser, Store, StoreUser};

#[derive(Default)]
struct MemoryState {
    stores: HashMap<Uuid, Store>,
    users: Vec<StoreUser>,
    bundles: HashMap<Uuid, PersistedBundle>,
}

#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConfigStore for MemoryBackend {
    async fn load(&self, store_id: Uuid) -> Result<Option<PersistedBundle>, AppError> {
        Ok(self.state.read().await.bundles.get(&store_id).cloned())
    }

    async fn write(&self, store_id: Uuid, bundle: &PersistedBundle) -> Result<(), AppError> {
        self.state.write().await.bundles.insert(store_id, bundle.clone());
        Ok(())
    }
}

#[async_trait]
impl TenantRepository for MemoryBackend {
    async fn slug_taken(&self, slug: &str, except: Option<Uuid>) -> Result<bool, AppError> {
        let state = self.state.read().await;
        Ok(state
            .stores
            .values()
            .any(|s| s.slug == slug && Some(s.id) != except))
    }

    async fn create_store(
        &self,
        store: &Store,
        admin: &NewStoreUser,
        bundle: &PersistedBundle,
    ) -> Result<(Store, StoreUser), AppError> {
        // Trava de escrita única: checagem e inserção não se intercalam
        let mut state = self.state.write().await;
        if state.stores.values().any(|s| s.slug == store.slug) {
            return Err(AppError::DuplicateSlug(store.slug.clone()));
        }

        let user = StoreUser {
            id: Uuid::new_v4(),
            store_id: store.id,
            name: admin.name.clone(),
            username: admin.username.clone(),
            password_hash: admin.password_hash.clone(),
            role: admin.role,
            created_at: Utc::now(),
        };

        state.stores.insert(store.id, store.clone());
        state.users.push(user.clone());
        state.bundles.insert(store.id, bundle.clone());
        Ok((store.clone(), user))
    }

    async fn find_store(&self, store_id: Uuid) -> Result<Option<Store>, AppError> {
        Ok(self.state.read().await.stores.get(&store_id).cloned())
    }

    async fn find_store_by_slug(&self, slug: &str) -> Result<Option<Store>, AppError> {
        Ok(self.state.read().await.stores.values().find(|s| s.slug == slug).cloned())
    }

    async fn list_stores(&self) -> Result<Vec<Store>, AppError> {
        let mut stores: Vec<Store> = self.state.read().await.stores.values().cloned().collect();
        stores.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.slug.cmp(&b.slug)));
        Ok(stores)
    }

    async fn update_store(&self, store: &Store) -> Result<Store, AppError> {
        let mut state = self.state.write().await;
        if state.stores.values().any(|s| s.slug == store.slug && s.id != store.id) {
            return Err(AppError::DuplicateSlug(store.slug.clone()));
        }
        let current = state.stores.get_mut(&store.id).ok_or(AppError::StoreNotFound(store.id))?;
        current.slug = store.slug.clone();
        current.name = store.name.clone();
        current.status = store.status;
        Ok(current.clone())
    }

    async fn find_user(&self, store_id: Uuid, username: &str) -> Result<Option<StoreUser>, AppError> {
        Ok(self
            .state
            .read()
            .await
            .users
            .iter()
            .find(|u| u.store_id == store_id && u.username == username)
            .cloned())
    }
}
