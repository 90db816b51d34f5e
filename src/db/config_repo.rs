// src/db/config_repo.rs

use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::{types::Json, PgConnection, PgPool};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::config::{PersistedBundle, PersistedPermission};

/// Fronteira de persistência do pacote de configuração, chaveada por loja.
/// `write` é tudo-ou-nada: ou o pacote inteiro é gravado, ou nada muda.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn load(&self, store_id: Uuid) -> Result<Option<PersistedBundle>, AppError>;
    async fn write(&self, store_id: Uuid, bundle: &PersistedBundle) -> Result<(), AppError>;
}

// Nomes das seções na tabela store_config_sections
const META: &str = "meta";
const WORKFLOW: &str = "workflow";
const ASSISTANCE_WORKFLOW: &str = "assistanceWorkflow";
const ORIGINS: &str = "origins";
const COMPANY_SETTINGS: &str = "companySettings";

#[derive(Clone)]
pub struct PgConfigStore {
    pool: PgPool,
}

impl PgConfigStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, AppError> {
    serde_json::to_value(value).map_err(|e| AppError::InternalServerError(e.into()))
}

fn from_json<T: serde::de::DeserializeOwned>(section: &str, value: Value) -> Result<T, AppError> {
    serde_json::from_value(value)
        .map_err(|e| AppError::InternalServerError(anyhow::anyhow!("seção '{}' corrompida: {}", section, e)))
}

/// Grava o pacote usando a conexão recebida. Quem chama decide a transação
/// (o save e a criação da loja usam a mesma função).
pub(crate) async fn write_bundle(
    conn: &mut PgConnection,
    store_id: Uuid,
    bundle: &PersistedBundle,
) -> Result<(), AppError> {
    let mut sections: Vec<(&str, Value)> = vec![(META, json!({ "templateVersion": bundle.template_version }))];
    if let Some(workflow) = &bundle.workflow {
        sections.push((WORKFLOW, to_json(workflow)?));
    }
    if let Some(workflow) = &bundle.assistance_workflow {
        sections.push((ASSISTANCE_WORKFLOW, to_json(workflow)?));
    }
    if let Some(origins) = &bundle.origins {
        sections.push((ORIGINS, to_json(origins)?));
    }
    if let Some(settings) = &bundle.company_settings {
        sections.push((COMPANY_SETTINGS, to_json(settings)?));
    }

    for (section, payload) in sections {
        sqlx::query(
            r#"
            INSERT INTO store_config_sections (store_id, section, payload)
            VALUES ($1, $2, $3)
            ON CONFLICT (store_id, section)
            DO UPDATE SET payload = EXCLUDED.payload, updated_at = NOW()
            "#,
        )
            .bind(store_id)
            .bind(section)
            .bind(Json(payload))
            .execute(&mut *conn)
            .await?;
    }

    // Permissões: substitui o conjunto inteiro (um registro por cargo)
    sqlx::query("DELETE FROM store_permissions WHERE store_id = $1")
        .bind(store_id)
        .execute(&mut *conn)
        .await?;

    for record in &bundle.permissions {
        sqlx::query("INSERT INTO store_permissions (store_id, role, payload) VALUES ($1, $2, $3)")
            .bind(store_id)
            .bind(&record.role)
            .bind(Json(to_json(record)?))
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

#[async_trait]
impl ConfigStore for PgConfigStore {
    async fn load(&self, store_id: Uuid) -> Result<Option<PersistedBundle>, AppError> {
        let sections = sqlx::query_as::<_, (String, Json<Value>)>(
            "SELECT section, payload FROM store_config_sections WHERE store_id = $1",
        )
            .bind(store_id)
            .fetch_all(&self.pool)
            .await?;

        let permissions = sqlx::query_as::<_, (String, Json<Value>)>(
            "SELECT role, payload FROM store_permissions WHERE store_id = $1 ORDER BY role",
        )
            .bind(store_id)
            .fetch_all(&self.pool)
            .await?;

        if sections.is_empty() && permissions.is_empty() {
            return Ok(None);
        }

        let mut bundle = PersistedBundle::default();
        for (section, Json(payload)) in sections {
            match section.as_str() {
                META => {
                    bundle.template_version = payload
                        .get("templateVersion")
                        .and_then(Value::as_u64)
                        .and_then(|v| u32::try_from(v).ok());
                }
                WORKFLOW => bundle.workflow = Some(from_json(WORKFLOW, payload)?),
                ASSISTANCE_WORKFLOW => bundle.assistance_workflow = Some(from_json(ASSISTANCE_WORKFLOW, payload)?),
                ORIGINS => bundle.origins = Some(from_json(ORIGINS, payload)?),
                COMPANY_SETTINGS => bundle.company_settings = Some(from_json(COMPANY_SETTINGS, payload)?),
                other => tracing::warn!(%store_id, section = other, "Seção de configuração desconhecida ignorada"),
            }
        }
        for (role, Json(payload)) in permissions {
            let record: PersistedPermission = from_json(&role, payload)?;
            bundle.permissions.push(record);
        }

        Ok(Some(bundle))
    }

    async fn write(&self, store_id: Uuid, bundle: &PersistedBundle) -> Result<(), AppError> {
        // 1. Inicia Transação
        let mut tx = self.pool.begin().await?;

        // 2. Grava todas as seções e permissões
        // Se falhar no meio, o drop do `tx` desfaz tudo
        write_bundle(&mut *tx, store_id, bundle).await?;

        // 3. Commit
        tx.commit().await?;
        Ok(())
    }
}
