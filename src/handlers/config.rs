// src/handlers/config.rs
//
// Edição da configuração da loja: tudo opera sobre o rascunho da sessão
// (DraftSessions) até o POST .../save.

use std::collections::BTreeSet;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, rbac::RequireConfigAdmin},
    models::{
        config::{ConfigBundle, Section},
        permissions::{Capability, PermissionConfig, SetCapabilityPayload},
        roles::{list_roles, Role, RoleEntry},
        settings::{CompanySettings, Holiday, UpdateCompanySettings},
        workflow::{stage_groups, AssistanceStep, StageGroup, StepPatch, WorkflowStep},
    },
    services::draft::{ConfigDraft, DraftState},
};

// =============================================================================
//  RESPOSTAS
// =============================================================================

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DraftView {
    pub store_id: Uuid,
    pub state: DraftState,
    pub bundle: ConfigBundle,
}

impl From<&ConfigDraft> for DraftView {
    fn from(draft: &ConfigDraft) -> Self {
        Self { store_id: draft.store_id(), state: draft.state(), bundle: draft.bundle().clone() }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StageVisibilityView {
    pub role: Role,
    #[schema(value_type = Vec<u8>)]
    pub viewable_stages: BTreeSet<u8>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepAuthorizationView {
    pub role: Role,
    #[schema(value_type = Vec<String>)]
    pub actionable_steps: BTreeSet<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OriginsPayload {
    #[schema(example = json!(["Indicação", "Instagram"]))]
    pub origins: Vec<String>,
}

fn parse_role(raw: &str) -> Result<Role, AppError> {
    raw.parse()
}

// GET /api/roles
#[utoipa::path(
    get,
    path = "/api/roles",
    tag = "Config",
    responses((status = 200, description = "Cargos do sistema, em ordem fixa", body = Vec<RoleEntry>))
)]
pub async fn list_roles_handler() -> impl IntoResponse {
    let roles: Vec<RoleEntry> = list_roles().iter().copied().map(RoleEntry::from).collect();
    Json(roles)
}

// =============================================================================
//  RASCUNHO
// =============================================================================

// GET /api/stores/{store_id}/config
#[utoipa::path(
    get,
    path = "/api/stores/{store_id}/config",
    tag = "Config",
    params(("store_id" = Uuid, Path, description = "ID da Loja")),
    responses(
        (status = 200, description = "Rascunho atual da configuração", body = DraftView),
        (status = 403, description = "Loja de outra sessão")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_config(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _gate: RequireConfigAdmin,
    Path(store_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let view = async {
        user.ensure_store(store_id)?;
        app_state
            .draft_sessions
            .with_draft(store_id, user.user_id(), |draft| Ok(DraftView::from(&*draft)))
            .await
    }
    .await
    .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(view))
}

// DELETE /api/stores/{store_id}/config
#[utoipa::path(
    delete,
    path = "/api/stores/{store_id}/config",
    tag = "Config",
    params(("store_id" = Uuid, Path, description = "ID da Loja")),
    responses((status = 204, description = "Rascunho descartado")),
    security(("api_jwt" = []))
)]
pub async fn discard_draft(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _gate: RequireConfigAdmin,
    Path(store_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    user.ensure_store(store_id)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    app_state.draft_sessions.discard(store_id, user.user_id());
    Ok(StatusCode::NO_CONTENT)
}

// POST /api/stores/{store_id}/config/save
#[utoipa::path(
    post,
    path = "/api/stores/{store_id}/config/save",
    tag = "Config",
    params(("store_id" = Uuid, Path, description = "ID da Loja")),
    responses(
        (status = 200, description = "Pacote gravado", body = DraftView),
        (status = 503, description = "Falha de persistência; rascunho mantido, pode repetir")
    ),
    security(("api_jwt" = []))
)]
pub async fn save_config(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _gate: RequireConfigAdmin,
    Path(store_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = async {
        user.ensure_store(store_id)?;
        app_state.draft_sessions.save(store_id, user.user_id()).await
    }
    .await
    .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(DraftView::from(&draft)))
}

// POST /api/stores/{store_id}/config/reset/{section}
#[utoipa::path(
    post,
    path = "/api/stores/{store_id}/config/reset/{section}",
    tag = "Config",
    params(
        ("store_id" = Uuid, Path, description = "ID da Loja"),
        ("section" = Section, Path, description = "workflow | assistanceWorkflow | permissions | origins")
    ),
    responses(
        (status = 200, description = "Seção restaurada no rascunho (ainda não gravada)", body = DraftView),
        (status = 400, description = "Seção desconhecida")
    ),
    security(("api_jwt" = []))
)]
pub async fn reset_section(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _gate: RequireConfigAdmin,
    Path((store_id, section)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = async {
        user.ensure_store(store_id)?;
        app_state.draft_sessions.reset(store_id, user.user_id(), &section).await
    }
    .await
    .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(DraftView::from(&draft)))
}

// =============================================================================
//  FLUXOS
// =============================================================================

// GET /api/stores/{store_id}/config/workflow/stages
#[utoipa::path(
    get,
    path = "/api/stores/{store_id}/config/workflow/stages",
    tag = "Config",
    params(("store_id" = Uuid, Path, description = "ID da Loja")),
    responses((status = 200, description = "Passos agrupados por etapa", body = Vec<StageGroup>)),
    security(("api_jwt" = []))
)]
pub async fn get_stages(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _gate: RequireConfigAdmin,
    Path(store_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let groups = async {
        user.ensure_store(store_id)?;
        app_state
            .draft_sessions
            .with_draft(store_id, user.user_id(), |draft| Ok(stage_groups(draft.get_workflow(store_id)?)))
            .await
    }
    .await
    .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(groups))
}

// PATCH /api/stores/{store_id}/config/workflow/steps/{step_id}
#[utoipa::path(
    patch,
    path = "/api/stores/{store_id}/config/workflow/steps/{step_id}",
    tag = "Config",
    params(
        ("store_id" = Uuid, Path, description = "ID da Loja"),
        ("step_id" = String, Path, description = "Código do passo (ex: 1.1)")
    ),
    request_body = StepPatch,
    responses(
        (status = 200, description = "Passo atualizado no rascunho", body = WorkflowStep),
        (status = 404, description = "Passo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_step(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _gate: RequireConfigAdmin,
    Path((store_id, step_id)): Path<(Uuid, String)>,
    Json(patch): Json<StepPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let step = async {
        user.ensure_store(store_id)?;
        app_state
            .draft_sessions
            .with_draft(store_id, user.user_id(), |draft| draft.update_step(store_id, &step_id, &patch))
            .await
    }
    .await
    .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(step))
}

// PATCH /api/stores/{store_id}/config/assistance/steps/{step_id}
#[utoipa::path(
    patch,
    path = "/api/stores/{store_id}/config/assistance/steps/{step_id}",
    tag = "Config",
    params(
        ("store_id" = Uuid, Path, description = "ID da Loja"),
        ("step_id" = String, Path, description = "Código do passo de assistência")
    ),
    request_body = StepPatch,
    responses(
        (status = 200, description = "Passo atualizado no rascunho", body = AssistanceStep),
        (status = 404, description = "Passo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_assistance_step(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _gate: RequireConfigAdmin,
    Path((store_id, step_id)): Path<(Uuid, String)>,
    Json(patch): Json<StepPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let step = async {
        user.ensure_store(store_id)?;
        app_state
            .draft_sessions
            .with_draft(store_id, user.user_id(), |draft| {
                draft.update_assistance_step(store_id, &step_id, &patch)
            })
            .await
    }
    .await
    .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(step))
}

// =============================================================================
//  PERMISSÕES
// =============================================================================

// GET /api/stores/{store_id}/config/permissions
#[utoipa::path(
    get,
    path = "/api/stores/{store_id}/config/permissions",
    tag = "Config",
    params(("store_id" = Uuid, Path, description = "ID da Loja")),
    responses((status = 200, description = "Um registro por cargo", body = Vec<PermissionConfig>)),
    security(("api_jwt" = []))
)]
pub async fn get_permissions(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _gate: RequireConfigAdmin,
    Path(store_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let permissions = async {
        user.ensure_store(store_id)?;
        app_state
            .draft_sessions
            .with_draft(store_id, user.user_id(), |draft| {
                Ok(draft
                    .get_permissions(store_id)?
                    .into_iter()
                    .cloned()
                    .collect::<Vec<PermissionConfig>>())
            })
            .await
    }
    .await
    .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(permissions))
}

// PUT /api/stores/{store_id}/config/permissions/{role}/capabilities/{capability}
#[utoipa::path(
    put,
    path = "/api/stores/{store_id}/config/permissions/{role}/capabilities/{capability}",
    tag = "Config",
    params(
        ("store_id" = Uuid, Path, description = "ID da Loja"),
        ("role" = Role, Path, description = "Cargo"),
        ("capability" = Capability, Path, description = "Permissão global (ex: editClient)")
    ),
    request_body = SetCapabilityPayload,
    responses(
        (status = 200, description = "Registro do cargo atualizado", body = PermissionConfig),
        (status = 400, description = "Cargo ou permissão desconhecidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_capability(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _gate: RequireConfigAdmin,
    Path((store_id, role, capability)): Path<(Uuid, String, String)>,
    Json(payload): Json<SetCapabilityPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let record = async {
        user.ensure_store(store_id)?;
        let role = parse_role(&role)?;
        let capability: Capability = capability.parse()?;
        app_state
            .draft_sessions
            .with_draft(store_id, user.user_id(), |draft| {
                draft.set_capability(store_id, role, capability, payload.value).cloned()
            })
            .await
    }
    .await
    .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(record))
}

// POST /api/stores/{store_id}/config/permissions/{role}/stages/{stage}/toggle
#[utoipa::path(
    post,
    path = "/api/stores/{store_id}/config/permissions/{role}/stages/{stage}/toggle",
    tag = "Config",
    params(
        ("store_id" = Uuid, Path, description = "ID da Loja"),
        ("role" = Role, Path, description = "Cargo"),
        ("stage" = u8, Path, description = "Etapa (1..9)")
    ),
    responses((status = 200, description = "Etapas visíveis após a alternância", body = StageVisibilityView)),
    security(("api_jwt" = []))
)]
pub async fn toggle_stage(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _gate: RequireConfigAdmin,
    Path((store_id, role, stage)): Path<(Uuid, String, u8)>,
) -> Result<impl IntoResponse, ApiError> {
    let view = async {
        user.ensure_store(store_id)?;
        let role = parse_role(&role)?;
        app_state
            .draft_sessions
            .with_draft(store_id, user.user_id(), |draft| {
                let viewable_stages = draft.toggle_stage_visibility(store_id, role, stage)?.clone();
                Ok(StageVisibilityView { role, viewable_stages })
            })
            .await
    }
    .await
    .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(view))
}

// POST /api/stores/{store_id}/config/permissions/{role}/steps/{step_id}/toggle
#[utoipa::path(
    post,
    path = "/api/stores/{store_id}/config/permissions/{role}/steps/{step_id}/toggle",
    tag = "Config",
    params(
        ("store_id" = Uuid, Path, description = "ID da Loja"),
        ("role" = Role, Path, description = "Cargo"),
        ("step_id" = String, Path, description = "Código do passo")
    ),
    responses((status = 200, description = "Passos autorizados após a alternância", body = StepAuthorizationView)),
    security(("api_jwt" = []))
)]
pub async fn toggle_step(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _gate: RequireConfigAdmin,
    Path((store_id, role, step_id)): Path<(Uuid, String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let view = async {
        user.ensure_store(store_id)?;
        let role = parse_role(&role)?;
        app_state
            .draft_sessions
            .with_draft(store_id, user.user_id(), |draft| {
                let actionable_steps = draft.toggle_step_authorization(store_id, role, &step_id)?.clone();
                Ok(StepAuthorizationView { role, actionable_steps })
            })
            .await
    }
    .await
    .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(view))
}

// =============================================================================
//  EMPRESA, FERIADOS E ORIGENS
// =============================================================================

// PATCH /api/stores/{store_id}/config/company
#[utoipa::path(
    patch,
    path = "/api/stores/{store_id}/config/company",
    tag = "Config",
    params(("store_id" = Uuid, Path, description = "ID da Loja")),
    request_body = UpdateCompanySettings,
    responses((status = 200, description = "Configurações da empresa no rascunho", body = CompanySettings)),
    security(("api_jwt" = []))
)]
pub async fn update_company(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _gate: RequireConfigAdmin,
    Path(store_id): Path<Uuid>,
    Json(payload): Json<UpdateCompanySettings>,
) -> Result<impl IntoResponse, ApiError> {
    let settings = async {
        user.ensure_store(store_id)?;
        payload.validate()?;
        app_state
            .draft_sessions
            .with_draft(store_id, user.user_id(), |draft| {
                draft.update_company_settings(store_id, payload).cloned()
            })
            .await
    }
    .await
    .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(settings))
}

// POST /api/stores/{store_id}/config/holidays
#[utoipa::path(
    post,
    path = "/api/stores/{store_id}/config/holidays",
    tag = "Config",
    params(("store_id" = Uuid, Path, description = "ID da Loja")),
    request_body = Holiday,
    responses(
        (status = 201, description = "Feriados após a inclusão", body = Vec<Holiday>),
        (status = 409, description = "Feriado duplicado (data, tipo, ano)")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_holiday(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _gate: RequireConfigAdmin,
    Path(store_id): Path<Uuid>,
    Json(holiday): Json<Holiday>,
) -> Result<impl IntoResponse, ApiError> {
    let holidays = async {
        user.ensure_store(store_id)?;
        app_state
            .draft_sessions
            .with_draft(store_id, user.user_id(), |draft| {
                draft.add_holiday(store_id, holiday).map(|h| h.to_vec())
            })
            .await
    }
    .await
    .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(holidays)))
}

// PUT /api/stores/{store_id}/config/origins
#[utoipa::path(
    put,
    path = "/api/stores/{store_id}/config/origins",
    tag = "Config",
    params(("store_id" = Uuid, Path, description = "ID da Loja")),
    request_body = OriginsPayload,
    responses((status = 200, description = "Origens normalizadas", body = Vec<String>)),
    security(("api_jwt" = []))
)]
pub async fn set_origins(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _gate: RequireConfigAdmin,
    Path(store_id): Path<Uuid>,
    Json(payload): Json<OriginsPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let origins = async {
        user.ensure_store(store_id)?;
        app_state
            .draft_sessions
            .with_draft(store_id, user.user_id(), |draft| {
                draft.set_origins(store_id, payload.origins).map(|o| o.to_vec())
            })
            .await
    }
    .await
    .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(origins))
}
