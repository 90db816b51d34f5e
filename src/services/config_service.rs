// src/services/config_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::common::error::AppError;
use crate::db::{ConfigStore, TenantRepository};
use crate::models::config::{ConfigBundle, PersistedBundle, Section};
use crate::models::settings::{CompanySettings, UpdateCompanySettings};
use crate::services::draft::ConfigDraft;
use crate::services::merge::merge_with_defaults;

/// Gateway de persistência: carrega, grava e restaura o pacote de uma loja.
#[derive(Clone)]
pub struct ConfigService {
    store: Arc<dyn ConfigStore>,
    tenants: Arc<dyn TenantRepository>,
}

impl ConfigService {
    pub fn new(store: Arc<dyn ConfigStore>, tenants: Arc<dyn TenantRepository>) -> Self {
        Self { store, tenants }
    }

    /// Pacote persistido, já completado com os padrões.
    pub async fn load(&self, store_id: Uuid) -> Result<Option<ConfigBundle>, AppError> {
        match self.store.load(store_id).await? {
            Some(persisted) => Ok(Some(merge_with_defaults(store_id, persisted)?.0)),
            None => Ok(None),
        }
    }

    /// Abre um rascunho para a loja. Loja sem pacote gravado começa semeada.
    pub async fn open_draft(&self, store_id: Uuid) -> Result<ConfigDraft, AppError> {
        if self.tenants.find_store(store_id).await?.is_none() {
            return Err(AppError::StoreNotFound(store_id));
        }
        match self.load(store_id).await? {
            Some(bundle) => Ok(ConfigDraft::from_persisted(store_id, bundle)),
            None => {
                tracing::info!(%store_id, "Loja sem configuração gravada; rascunho semeado com o padrão");
                Ok(ConfigDraft::seeded(store_id))
            }
        }
    }

    /// Grava o pacote inteiro do rascunho como uma unidade.
    ///
    /// Em falha o rascunho é preservado (continua `Dirty`/`Seeded`) e o pacote
    /// gravado anteriormente fica intacto; quem chama pode repetir.
    pub async fn save(&self, draft: &mut ConfigDraft) -> Result<(), AppError> {
        let store_id = draft.store_id();
        draft.bundle().validate(store_id)?;

        let persisted = PersistedBundle::from(draft.bundle());
        match self.store.write(store_id, &persisted).await {
            Ok(()) => {
                draft.mark_persisted();
                tracing::info!(%store_id, "Configuração da loja gravada");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(%store_id, error = %err, "Falha ao gravar configuração; rascunho mantido");
                Err(match err {
                    AppError::PersistenceFailure(_) => err,
                    other => AppError::PersistenceFailure(other.to_string()),
                })
            }
        }
    }

    /// Restaura uma seção do rascunho a partir da tag textual ("workflow", ...).
    pub fn reset_to_defaults(&self, draft: &mut ConfigDraft, store_id: Uuid, section: &str) -> Result<Section, AppError> {
        let section: Section = section.parse()?;
        draft.reset_section(store_id, section)?;
        tracing::info!(%store_id, %section, "Seção restaurada para o padrão (pendente de gravação)");
        Ok(section)
    }

    /// Regrava um pacote lido antes, desfazendo uma gravação posterior.
    pub async fn restore(&self, store_id: Uuid, bundle: ConfigBundle) -> Result<(), AppError> {
        let mut draft = ConfigDraft::from_persisted(store_id, bundle);
        self.save(&mut draft).await
    }

    /// Atualiza as configurações da empresa direto no pacote persistido
    /// (usado pelo cadastro de lojas, fora de um rascunho).
    pub async fn update_company_settings(
        &self,
        store_id: Uuid,
        patch: UpdateCompanySettings,
    ) -> Result<CompanySettings, AppError> {
        let mut draft = self.open_draft(store_id).await?;
        draft.update_company_settings(store_id, patch)?;
        self.save(&mut draft).await?;
        Ok(draft.bundle().company_settings.clone())
    }
}
