// src/common/i18n.rs

use std::collections::HashMap;
use std::sync::Arc;

pub const DEFAULT_LANG: &str = "pt";

const PT: &[(&str, &str)] = &[
    ("error.validation", "Um ou mais campos são inválidos."),
    ("error.invalid_input", "Entrada inválida: {}"),
    ("error.unknown_role", "Cargo desconhecido: {}"),
    ("error.unknown_step", "Etapa do fluxo não encontrada: {}"),
    ("error.unknown_section", "Seção de configuração desconhecida: {}"),
    ("error.unknown_capability", "Permissão desconhecida: {}"),
    ("error.duplicate_slug", "O identificador '{}' já está em uso por outra loja."),
    ("error.duplicate_holiday", "Já existe um feriado cadastrado para {}."),
    ("error.cross_tenant", "A operação referencia dados de outra loja."),
    ("error.store_not_found", "Loja não encontrada."),
    ("error.store_suspended", "Esta loja está suspensa."),
    ("error.persistence_failure", "Não foi possível salvar a configuração. Suas alterações foram mantidas; tente novamente."),
    ("error.invalid_credentials", "Usuário ou senha inválidos."),
    ("error.invalid_token", "Token de autenticação inválido ou ausente."),
    ("error.forbidden", "Você não tem permissão para realizar esta ação."),
    ("error.internal", "Ocorreu um erro inesperado."),
];

const EN: &[(&str, &str)] = &[
    ("error.validation", "One or more fields are invalid."),
    ("error.invalid_input", "Invalid input: {}"),
    ("error.unknown_role", "Unknown role: {}"),
    ("error.unknown_step", "Workflow step not found: {}"),
    ("error.unknown_section", "Unknown configuration section: {}"),
    ("error.unknown_capability", "Unknown capability: {}"),
    ("error.duplicate_slug", "The identifier '{}' is already used by another store."),
    ("error.duplicate_holiday", "A holiday is already registered for {}."),
    ("error.cross_tenant", "The operation references another store's data."),
    ("error.store_not_found", "Store not found."),
    ("error.store_suspended", "This store is suspended."),
    ("error.persistence_failure", "Could not save the configuration. Your changes were kept; please retry."),
    ("error.invalid_credentials", "Invalid username or password."),
    ("error.invalid_token", "Missing or invalid authentication token."),
    ("error.forbidden", "You are not allowed to perform this action."),
    ("error.internal", "An unexpected error occurred."),
];

/// Catálogo de mensagens compilado no binário, indexado por idioma.
#[derive(Clone)]
pub struct I18nStore {
    catalogs: Arc<HashMap<&'static str, HashMap<&'static str, &'static str>>>,
}

impl Default for I18nStore {
    fn default() -> Self {
        let mut catalogs = HashMap::new();
        catalogs.insert("pt", PT.iter().copied().collect());
        catalogs.insert("en", EN.iter().copied().collect());
        Self { catalogs: Arc::new(catalogs) }
    }
}

impl I18nStore {
    pub fn translate(&self, lang: &str, key: &str, arg: Option<&str>) -> String {
        let template = self
            .catalogs
            .get(lang)
            .and_then(|c| c.get(key))
            .or_else(|| self.catalogs.get(DEFAULT_LANG).and_then(|c| c.get(key)))
            .copied()
            .unwrap_or(key);

        match arg {
            Some(value) => template.replacen("{}", value, 1),
            None => template.replacen(": {}", "", 1).replacen("{}", "", 1),
        }
    }
}
