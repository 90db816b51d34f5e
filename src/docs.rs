// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::get_me,

        // --- Platform ---
        handlers::tenancy::create_store,
        handlers::tenancy::list_stores,
        handlers::tenancy::get_store,
        handlers::tenancy::update_store,
        handlers::tenancy::toggle_store_status,

        // --- Config ---
        handlers::config::list_roles_handler,
        handlers::config::get_config,
        handlers::config::discard_draft,
        handlers::config::save_config,
        handlers::config::reset_section,
        handlers::config::get_stages,
        handlers::config::update_step,
        handlers::config::update_assistance_step,
        handlers::config::get_permissions,
        handlers::config::set_capability,
        handlers::config::toggle_stage,
        handlers::config::toggle_step,
        handlers::config::update_company,
        handlers::config::add_holiday,
        handlers::config::set_origins,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::LoginPayload,
            models::auth::AuthResponse,
            models::auth::Claims,

            // --- Cargos ---
            models::roles::Role,
            models::roles::RoleEntry,

            // --- Fluxos ---
            models::workflow::WorkflowStep,
            models::workflow::AssistanceStep,
            models::workflow::WorkflowDefinition,
            models::workflow::AssistanceWorkflow,
            models::workflow::StepPatch,
            models::workflow::StageGroup,

            // --- Permissões ---
            models::permissions::Capability,
            models::permissions::Capabilities,
            models::permissions::PermissionConfig,
            models::permissions::SetCapabilityPayload,

            // --- Empresa ---
            models::settings::HolidayType,
            models::settings::Holiday,
            models::settings::WhatsAppIntegration,
            models::settings::CompanySettings,
            models::settings::UpdateCompanySettings,

            // --- Pacote de configuração ---
            models::config::Section,
            models::config::ConfigBundle,
            crate::services::draft::DraftState,
            handlers::config::DraftView,
            handlers::config::StageVisibilityView,
            handlers::config::StepAuthorizationView,
            handlers::config::OriginsPayload,

            // --- Lojas ---
            models::tenancy::StoreStatus,
            models::tenancy::Store,
            models::tenancy::CreateStorePayload,
            models::tenancy::UpdateStorePayload,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação por loja"),
        (name = "Platform", description = "Cadastro de Lojas (operador da plataforma)"),
        (name = "Config", description = "Fluxos, Permissões e Configurações da Loja")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
        components.add_security_scheme(
            "platform_key",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("x-platform-key"))),
        );
    }
}
