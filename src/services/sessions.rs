// src/services/sessions.rs

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::services::config_service::ConfigService;
use crate::services::draft::ConfigDraft;

type DraftKey = (Uuid, Uuid); // (store_id, user_id)
type SharedDraft = Arc<Mutex<ConfigDraft>>;

/// Rascunhos abertos pelos usuários da API, um por (loja, usuário).
///
/// Cada rascunho tem o próprio lock: um save lento numa loja não bloqueia
/// edições em outra. O mapa em si só é travado para buscar/inserir.
#[derive(Clone)]
pub struct DraftSessions {
    config: ConfigService,
    drafts: Arc<StdMutex<HashMap<DraftKey, SharedDraft>>>,
}

impl DraftSessions {
    pub fn new(config: ConfigService) -> Self {
        Self { config, drafts: Arc::new(StdMutex::new(HashMap::new())) }
    }

    fn lookup(&self, key: DraftKey) -> Option<SharedDraft> {
        self.drafts.lock().ok().and_then(|map| map.get(&key).cloned())
    }

    async fn get_or_open(&self, store_id: Uuid, user_id: Uuid) -> Result<SharedDraft, AppError> {
        let key = (store_id, user_id);
        if let Some(draft) = self.lookup(key) {
            return Ok(draft);
        }

        // Abre fora do lock do mapa; se outra requisição abriu antes, fica a dela
        let opened = Arc::new(Mutex::new(self.config.open_draft(store_id).await?));
        let mut map = self
            .drafts
            .lock()
            .map_err(|_| anyhow::anyhow!("mapa de rascunhos envenenado"))?;
        Ok(map.entry(key).or_insert(opened).clone())
    }

    /// Executa `f` sobre o rascunho da sessão, abrindo-o se preciso.
    pub async fn with_draft<R>(
        &self,
        store_id: Uuid,
        user_id: Uuid,
        f: impl FnOnce(&mut ConfigDraft) -> Result<R, AppError>,
    ) -> Result<R, AppError> {
        let draft = self.get_or_open(store_id, user_id).await?;
        let mut guard = draft.lock().await;
        f(&mut *guard)
    }

    pub async fn save(&self, store_id: Uuid, user_id: Uuid) -> Result<ConfigDraft, AppError> {
        let draft = self.get_or_open(store_id, user_id).await?;
        let mut guard = draft.lock().await;
        self.config.save(&mut *guard).await?;
        Ok(guard.clone())
    }

    pub async fn reset(&self, store_id: Uuid, user_id: Uuid, section: &str) -> Result<ConfigDraft, AppError> {
        let draft = self.get_or_open(store_id, user_id).await?;
        let mut guard = draft.lock().await;
        self.config.reset_to_defaults(&mut *guard, store_id, section)?;
        Ok(guard.clone())
    }

    /// Descarta o rascunho; a próxima leitura recarrega o pacote gravado.
    pub fn discard(&self, store_id: Uuid, user_id: Uuid) -> bool {
        match self.drafts.lock() {
            Ok(mut map) => map.remove(&(store_id, user_id)).is_some(),
            Err(_) => false,
        }
    }
}
