// src/handlers/tenancy.rs
//
// Rotas do operador da plataforma (protegidas pelo platform_guard).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::i18n::Locale,
    models::tenancy::{CreateStorePayload, Store, UpdateStorePayload},
};

// POST /api/platform/stores
#[utoipa::path(
    post,
    path = "/api/platform/stores",
    tag = "Platform",
    request_body = CreateStorePayload,
    responses(
        (status = 201, description = "Loja criada com configuração padrão", body = Store),
        (status = 409, description = "Identificador já em uso")
    ),
    security(("platform_key" = []))
)]
pub async fn create_store(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<CreateStorePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let store = app_state
        .tenant_service
        .create_store(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(store)))
}

// GET /api/platform/stores
#[utoipa::path(
    get,
    path = "/api/platform/stores",
    tag = "Platform",
    responses((status = 200, description = "Todas as lojas, inclusive suspensas", body = Vec<Store>)),
    security(("platform_key" = []))
)]
pub async fn list_stores(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let stores = app_state
        .tenant_service
        .list_stores()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(stores))
}

// GET /api/platform/stores/{store_id}
#[utoipa::path(
    get,
    path = "/api/platform/stores/{store_id}",
    tag = "Platform",
    params(("store_id" = Uuid, Path, description = "ID da Loja")),
    responses(
        (status = 200, description = "Loja", body = Store),
        (status = 404, description = "Loja não encontrada")
    ),
    security(("platform_key" = []))
)]
pub async fn get_store(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(store_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let store = app_state
        .tenant_service
        .get_store(store_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(store))
}

// PATCH /api/platform/stores/{store_id}
#[utoipa::path(
    patch,
    path = "/api/platform/stores/{store_id}",
    tag = "Platform",
    params(("store_id" = Uuid, Path, description = "ID da Loja")),
    request_body = UpdateStorePayload,
    responses(
        (status = 200, description = "Loja atualizada", body = Store),
        (status = 409, description = "Novo identificador colide com outra loja")
    ),
    security(("platform_key" = []))
)]
pub async fn update_store(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(store_id): Path<Uuid>,
    Json(payload): Json<UpdateStorePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let store = app_state
        .tenant_service
        .update_store(store_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(store))
}

// POST /api/platform/stores/{store_id}/toggle-status
#[utoipa::path(
    post,
    path = "/api/platform/stores/{store_id}/toggle-status",
    tag = "Platform",
    params(("store_id" = Uuid, Path, description = "ID da Loja")),
    responses((status = 200, description = "Status alternado (ativa ⇄ suspensa)", body = Store)),
    security(("platform_key" = []))
)]
pub async fn toggle_store_status(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(store_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let store = app_state
        .tenant_service
        .toggle_store_status(store_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(store))
}
