// src/db/tenancy_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::db::config_repo::write_bundle;
use crate::models::config::PersistedBundle;
use crate::models::tenancy::{NewStoreUser, Store, StoreUser};

/// Lojas e seus usuários. A unicidade do slug vale para TODAS as lojas,
/// inclusive as suspensas.
#[async_trait]
pub trait TenantRepository: Send + Sync {
    /// `except` exclui a própria loja da checagem (renomeação).
    async fn slug_taken(&self, slug: &str, except: Option<Uuid>) -> Result<bool, AppError>;

    /// Cria loja, administrador e pacote semeado numa única unidade atômica.
    async fn create_store(
        &self,
        store: &Store,
        admin: &NewStoreUser,
        bundle: &PersistedBundle,
    ) -> Result<(Store, StoreUser), AppError>;

    async fn find_store(&self, store_id: Uuid) -> Result<Option<Store>, AppError>;
    async fn find_store_by_slug(&self, slug: &str) -> Result<Option<Store>, AppError>;
    async fn list_stores(&self) -> Result<Vec<Store>, AppError>;

    /// Grava slug, nome e status.
    async fn update_store(&self, store: &Store) -> Result<Store, AppError>;

    async fn find_user(&self, store_id: Uuid, username: &str) -> Result<Option<StoreUser>, AppError>;
}

// Linha crua de store_users: o cargo chega como texto e é validado na conversão
#[derive(Debug, FromRow)]
struct StoreUserRow {
    id: Uuid,
    store_id: Uuid,
    name: String,
    username: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<StoreUserRow> for StoreUser {
    type Error = AppError;

    fn try_from(row: StoreUserRow) -> Result<Self, Self::Error> {
        Ok(StoreUser {
            role: row.role.parse()?,
            id: row.id,
            store_id: row.store_id,
            name: row.name,
            username: row.username,
            password_hash: row.password_hash,
            created_at: row.created_at,
        })
    }
}

fn map_slug_conflict(e: sqlx::Error, slug: &str) -> AppError {
    // Converte erro de violação de chave única em um erro mais amigável
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() && db_err.constraint() == Some("stores_slug_key") {
            return AppError::DuplicateSlug(slug.to_string());
        }
    }
    e.into()
}

#[derive(Clone)]
pub struct PgTenantRepository {
    pool: PgPool,
}

impl PgTenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantRepository for PgTenantRepository {
    async fn slug_taken(&self, slug: &str, except: Option<Uuid>) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM stores
                WHERE slug = $1 AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
            .bind(slug)
            .bind(except)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn create_store(
        &self,
        store: &Store,
        admin: &NewStoreUser,
        bundle: &PersistedBundle,
    ) -> Result<(Store, StoreUser), AppError> {
        // 1. Inicia a transação
        let mut tx = self.pool.begin().await?;

        // 2. Cria a Loja
        let created = sqlx::query_as::<_, Store>(
            r#"
            INSERT INTO stores (id, slug, name, status, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, slug, name, status, created_at
            "#,
        )
            .bind(store.id)
            .bind(&store.slug)
            .bind(&store.name)
            .bind(store.status)
            .bind(store.created_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_slug_conflict(e, &store.slug))?;

        // 3. Cria o administrador com o cargo de maior privilégio
        let row = sqlx::query_as::<_, StoreUserRow>(
            r#"
            INSERT INTO store_users (store_id, name, username, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, store_id, name, username, password_hash, role, created_at
            "#,
        )
            .bind(created.id)
            .bind(&admin.name)
            .bind(&admin.username)
            .bind(&admin.password_hash)
            .bind(admin.role.as_str())
            .fetch_one(&mut *tx)
            .await?;

        // 4. Grava o pacote semeado (fluxos, permissões, configurações)
        write_bundle(&mut *tx, created.id, bundle).await?;

        // 5. Commit
        tx.commit().await?;

        Ok((created, row.try_into()?))
    }

    async fn find_store(&self, store_id: Uuid) -> Result<Option<Store>, AppError> {
        let store = sqlx::query_as::<_, Store>(
            "SELECT id, slug, name, status, created_at FROM stores WHERE id = $1",
        )
            .bind(store_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(store)
    }

    async fn find_store_by_slug(&self, slug: &str) -> Result<Option<Store>, AppError> {
        let store = sqlx::query_as::<_, Store>(
            "SELECT id, slug, name, status, created_at FROM stores WHERE slug = $1",
        )
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        Ok(store)
    }

    async fn list_stores(&self) -> Result<Vec<Store>, AppError> {
        let stores = sqlx::query_as::<_, Store>(
            "SELECT id, slug, name, status, created_at FROM stores ORDER BY created_at, slug",
        )
            .fetch_all(&self.pool)
            .await?;

        Ok(stores)
    }

    async fn update_store(&self, store: &Store) -> Result<Store, AppError> {
        let updated = sqlx::query_as::<_, Store>(
            r#"
            UPDATE stores
            SET slug = $2, name = $3, status = $4
            WHERE id = $1
            RETURNING id, slug, name, status, created_at
            "#,
        )
            .bind(store.id)
            .bind(&store.slug)
            .bind(&store.name)
            .bind(store.status)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_slug_conflict(e, &store.slug))?;

        updated.ok_or(AppError::StoreNotFound(store.id))
    }

    async fn find_user(&self, store_id: Uuid, username: &str) -> Result<Option<StoreUser>, AppError> {
        let row = sqlx::query_as::<_, StoreUserRow>(
            r#"
            SELECT id, store_id, name, username, password_hash, role, created_at
            FROM store_users
            WHERE store_id = $1 AND username = $2
            "#,
        )
            .bind(store_id)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        row.map(StoreUser::try_from).transpose()
    }
}
