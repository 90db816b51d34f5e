// src/config.rs

use std::{env, sync::Arc, time::Duration};

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{ConfigStore, MemoryBackend, PgConfigStore, PgTenantRepository, TenantRepository},
    services::{AuthService, ConfigService, DraftSessions, TenantService},
};

/// Configuração lida do ambiente (.env)
#[derive(Debug, Clone)]
pub struct Config {
    /// Sem DATABASE_URL o servidor sobe com o backend em memória
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub platform_api_key: String,
    pub bind_addr: String,
    pub bcrypt_cost: u32,
}

fn required(name: &str) -> anyhow::Result<String> {
    env::var(name).map_err(|_| anyhow::anyhow!("{} deve ser definida", name))
}

fn parsed_or<T: std::str::FromStr>(name: &str, default: T) -> anyhow::Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| anyhow::anyhow!("{} tem valor inválido: {}", name, raw)),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            database_max_connections: parsed_or("DATABASE_MAX_CONNECTIONS", 5)?,
            jwt_secret: required("JWT_SECRET")?,
            platform_api_key: required("PLATFORM_API_KEY")?,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            bcrypt_cost: parsed_or("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
        })
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db_pool: Option<PgPool>,
    pub i18n_store: I18nStore,
    pub auth_service: AuthService,
    pub tenant_service: TenantService,
    pub config_service: ConfigService,
    pub draft_sessions: DraftSessions,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        match &config.database_url {
            Some(database_url) => {
                // Conecta ao banco de dados, usando '?' para propagar erros
                let db_pool = PgPoolOptions::new()
                    .max_connections(config.database_max_connections)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect(database_url)
                    .await?;

                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

                let config_store = Arc::new(PgConfigStore::new(db_pool.clone()));
                let tenant_repo = Arc::new(PgTenantRepository::new(db_pool.clone()));
                Ok(Self::assemble(config, Some(db_pool), config_store, tenant_repo))
            }
            None => {
                tracing::warn!("⚠️ DATABASE_URL não definida: usando armazenamento em memória (dados não sobrevivem ao restart)");
                let backend = Arc::new(MemoryBackend::new());
                Ok(Self::assemble(config, None, backend.clone(), backend))
            }
        }
    }

    /// Monta o gráfico de dependências sobre os repositórios escolhidos.
    pub fn assemble(
        config: Config,
        db_pool: Option<PgPool>,
        config_store: Arc<dyn ConfigStore>,
        tenant_repo: Arc<dyn TenantRepository>,
    ) -> Self {
        let config_service = ConfigService::new(config_store, tenant_repo.clone());
        let tenant_service = TenantService::new(tenant_repo.clone(), config_service.clone(), config.bcrypt_cost);
        let auth_service = AuthService::new(tenant_repo, config.jwt_secret.clone());
        let draft_sessions = DraftSessions::new(config_service.clone());

        Self {
            config: Arc::new(config),
            db_pool,
            i18n_store: I18nStore::default(),
            auth_service,
            tenant_service,
            config_service,
            draft_sessions,
        }
    }
}
