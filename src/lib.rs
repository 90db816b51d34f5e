// src/lib.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::config::AppState;
use crate::docs::ApiDoc;
use crate::middleware::auth::{auth_guard, platform_guard};

/// Monta o router completo sobre o estado já construído.
pub fn app(app_state: AppState) -> Router {
    // Rotas de autenticação (públicas)
    let auth_routes = Router::new().route("/login", post(handlers::auth::login));

    // Rotas da sessão (protegidas pelo middleware)
    let session_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Cadastro de lojas: só o operador da plataforma
    let platform_routes = Router::new()
        .route("/stores"
               ,post(handlers::tenancy::create_store)
               .get(handlers::tenancy::list_stores)
        )
        .route("/stores/{store_id}"
               ,get(handlers::tenancy::get_store)
               .patch(handlers::tenancy::update_store)
        )
        .route("/stores/{store_id}/toggle-status"
               ,post(handlers::tenancy::toggle_store_status)
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            platform_guard,
        ));

    // Configuração da loja: sessão + cargo administrativo (checado no handler)
    let config_routes = Router::new()
        .route("/api/roles", get(handlers::config::list_roles_handler))
        .route("/api/stores/{store_id}/config"
               ,get(handlers::config::get_config)
               .delete(handlers::config::discard_draft)
        )
        .route("/api/stores/{store_id}/config/save", post(handlers::config::save_config))
        .route("/api/stores/{store_id}/config/reset/{section}", post(handlers::config::reset_section))
        .route("/api/stores/{store_id}/config/workflow/stages", get(handlers::config::get_stages))
        .route("/api/stores/{store_id}/config/workflow/steps/{step_id}", patch(handlers::config::update_step))
        .route("/api/stores/{store_id}/config/assistance/steps/{step_id}", patch(handlers::config::update_assistance_step))
        .route("/api/stores/{store_id}/config/permissions", get(handlers::config::get_permissions))
        .route(
            "/api/stores/{store_id}/config/permissions/{role}/capabilities/{capability}",
            put(handlers::config::set_capability),
        )
        .route(
            "/api/stores/{store_id}/config/permissions/{role}/stages/{stage}/toggle",
            post(handlers::config::toggle_stage),
        )
        .route(
            "/api/stores/{store_id}/config/permissions/{role}/steps/{step_id}/toggle",
            post(handlers::config::toggle_step),
        )
        .route("/api/stores/{store_id}/config/company", patch(handlers::config::update_company))
        .route("/api/stores/{store_id}/config/holidays", post(handlers::config::add_holiday))
        .route("/api/stores/{store_id}/config/origins", put(handlers::config::set_origins))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes.merge(session_routes))
        .nest("/api/platform", platform_routes)
        .merge(config_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}
