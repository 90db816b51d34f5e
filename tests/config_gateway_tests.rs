//! Gateway de persistência da configuração
//!
//! Save/load, restauração de seções, falhas de gravação e o merge com os
//! padrões no carregamento.

mod common;

use chrono::NaiveDate;
use serde_json::json;
use std::collections::BTreeMap;
use uuid::Uuid;

use common::*;
use console_backend::{
    common::error::AppError,
    db::ConfigStore,
    models::{
        config::{PersistedBundle, PersistedPermission, Section},
        permissions::Capability,
        roles::{list_roles, Role},
        settings::{Holiday, HolidayType},
        workflow::StepPatch,
    },
    services::{defaults, draft::DraftState},
};

#[tokio::test]
async fn test_save_then_load_round_trip() {
    let (state, _backend) = memory_state();
    let store = create_store(&state, "lojacentro").await;
    let mut draft = state.config_service.open_draft(store.id).await.unwrap();
    assert_eq!(draft.state(), DraftState::Persisted);

    let patch = StepPatch { owner_role: Some(Role::Designer), sla: Some(json!("4 dias")) };
    let step = draft.update_step(store.id, "1.2", &patch).unwrap();
    assert_eq!(step.sla, 4);
    draft.update_assistance_step(store.id, "AT.2", &StepPatch { owner_role: None, sla: Some(json!(9)) }).unwrap();
    draft.toggle_stage_visibility(store.id, Role::Seller, 5).unwrap();
    draft.toggle_step_authorization(store.id, Role::Seller, "5.1").unwrap();
    draft.set_capability(store.id, Role::Seller, Capability::ChangeSeller, true).unwrap();
    draft
        .add_holiday(store.id, Holiday {
            date: NaiveDate::from_ymd_opt(2025, 3, 19).unwrap(),
            name: "São José".into(),
            kind: HolidayType::Fixed,
            year: None,
        })
        .unwrap();
    draft.set_origins(store.id, vec!["Feira".into(), "Site".into()]).unwrap();
    assert!(draft.is_dirty());

    state.config_service.save(&mut draft).await.unwrap();
    assert_eq!(draft.state(), DraftState::Persisted);

    let loaded = state.config_service.load(store.id).await.unwrap().unwrap();
    assert_eq!(&loaded, draft.bundle());
    assert_eq!(loaded.workflow.order, defaults::default_workflow().order);
}

#[tokio::test]
async fn test_reset_workflow_then_save_restores_default_grouping() {
    let (state, _backend) = memory_state();
    let store = create_store(&state, "lojacentro").await;
    let mut draft = state.config_service.open_draft(store.id).await.unwrap();

    let patch = StepPatch { owner_role: Some(Role::Owner), sla: Some(json!(99)) };
    draft.update_step(store.id, "3.1", &patch).unwrap();
    state.config_service.save(&mut draft).await.unwrap();

    let section = state.config_service.reset_to_defaults(&mut draft, store.id, "workflow").unwrap();
    assert_eq!(section, Section::Workflow);
    assert!(draft.is_dirty());
    state.config_service.save(&mut draft).await.unwrap();

    let loaded = state.config_service.load(store.id).await.unwrap().unwrap();
    assert_eq!(loaded.workflow.steps_by_stage(), defaults::default_workflow().steps_by_stage());
}

#[tokio::test]
async fn test_reset_is_not_persisted_until_save() {
    let (state, _backend) = memory_state();
    let store = create_store(&state, "lojacentro").await;
    let mut draft = state.config_service.open_draft(store.id).await.unwrap();

    draft.set_origins(store.id, vec!["Feira".into()]).unwrap();
    state.config_service.save(&mut draft).await.unwrap();
    state.config_service.reset_to_defaults(&mut draft, store.id, "origins").unwrap();

    let loaded = state.config_service.load(store.id).await.unwrap().unwrap();
    assert_eq!(loaded.origins, vec!["Feira".to_string()]);
    assert_eq!(draft.bundle().origins, defaults::default_origins());
}

#[tokio::test]
async fn test_reset_unknown_section_fails() {
    let (state, _backend) = memory_state();
    let store = create_store(&state, "lojacentro").await;
    let mut draft = state.config_service.open_draft(store.id).await.unwrap();

    let result = state.config_service.reset_to_defaults(&mut draft, store.id, "companySettings");
    assert!(matches!(result, Err(AppError::UnknownSection(s)) if s == "companySettings"));
    assert_eq!(draft.state(), DraftState::Persisted);
}

#[tokio::test]
async fn test_failed_save_keeps_draft_and_prior_bundle() {
    let (state, flaky) = flaky_state();
    let store = create_store(&state, "lojacentro").await;
    let before = state.config_service.load(store.id).await.unwrap().unwrap();

    let mut draft = state.config_service.open_draft(store.id).await.unwrap();
    draft.set_origins(store.id, vec!["Feira".into()]).unwrap();

    flaky.set_failing(true);
    let result = state.config_service.save(&mut draft).await;
    match result {
        Err(err @ AppError::PersistenceFailure(_)) => assert!(err.is_retryable()),
        other => panic!("expected PersistenceFailure, got {other:?}"),
    }
    assert!(draft.is_dirty());
    assert_eq!(draft.bundle().origins, vec!["Feira".to_string()]);
    assert_eq!(state.config_service.load(store.id).await.unwrap().unwrap(), before);

    // Retry depois que o armazenamento volta
    flaky.set_failing(false);
    state.config_service.save(&mut draft).await.unwrap();
    assert_eq!(draft.state(), DraftState::Persisted);
    let loaded = state.config_service.load(store.id).await.unwrap().unwrap();
    assert_eq!(loaded.origins, vec!["Feira".to_string()]);
}

#[tokio::test]
async fn test_open_draft_for_unknown_store_fails() {
    let (state, _backend) = memory_state();
    let missing = Uuid::new_v4();
    let result = state.config_service.open_draft(missing).await;
    assert!(matches!(result, Err(AppError::StoreNotFound(id)) if id == missing));
}

#[tokio::test]
async fn test_get_permissions_has_one_record_per_role() {
    let (state, _backend) = memory_state();
    let first = create_store(&state, "primeira").await;
    let second = create_store(&state, "segunda").await;

    for store in [&first, &second] {
        let draft = state.config_service.open_draft(store.id).await.unwrap();
        let permissions = draft.get_permissions(store.id).unwrap();
        let roles: Vec<Role> = permissions.iter().map(|p| p.role).collect();
        assert_eq!(roles, list_roles().to_vec());
        assert!(permissions.iter().all(|p| p.store_id == store.id));
    }
}

#[tokio::test]
async fn test_partial_bundle_is_completed_with_defaults() {
    let (state, backend) = memory_state();
    let store = create_store(&state, "lojacentro").await;

    let mut capabilities = BTreeMap::new();
    capabilities.insert("manageUsers".to_string(), true);
    capabilities.insert("recursoDoFuturo".to_string(), true);
    let partial = PersistedBundle {
        origins: Some(vec!["Feira".into()]),
        permissions: vec![PersistedPermission {
            store_id: Some(store.id),
            role: "Seller".into(),
            capabilities,
            viewable_stages: [1].into_iter().collect(),
            actionable_steps: ["1.1".to_string()].into_iter().collect(),
        }],
        ..Default::default()
    };
    backend.write(store.id, &partial).await.unwrap();

    let bundle = state.config_service.load(store.id).await.unwrap().unwrap();
    assert_eq!(bundle.origins, vec!["Feira".to_string()]);
    assert_eq!(bundle.workflow, defaults::default_workflow());
    assert_eq!(bundle.permissions.len(), list_roles().len());

    let seller = bundle.permission(Role::Seller).unwrap();
    assert!(seller.capabilities.manage_users);
    // Flags ausentes vêm do padrão do cargo
    assert!(seller.capabilities.kanban);
    assert_eq!(bundle.permission(Role::Designer), Some(&defaults::default_permission(store.id, Role::Designer)));
}

#[tokio::test]
async fn test_load_rejects_foreign_permission_record() {
    let (state, backend) = memory_state();
    let store = create_store(&state, "lojacentro").await;

    let foreign = PersistedBundle {
        permissions: vec![PersistedPermission {
            store_id: Some(Uuid::new_v4()),
            role: "Seller".into(),
            capabilities: BTreeMap::new(),
            viewable_stages: Default::default(),
            actionable_steps: Default::default(),
        }],
        ..Default::default()
    };
    backend.write(store.id, &foreign).await.unwrap();

    let result = state.config_service.load(store.id).await;
    assert!(matches!(result, Err(AppError::CrossTenantReference { expected, .. }) if expected == store.id));
}

#[tokio::test]
async fn test_load_rejects_unknown_role() {
    let (state, backend) = memory_state();
    let store = create_store(&state, "lojacentro").await;

    let broken = PersistedBundle {
        permissions: vec![PersistedPermission {
            store_id: Some(store.id),
            role: "Astronaut".into(),
            capabilities: BTreeMap::new(),
            viewable_stages: Default::default(),
            actionable_steps: Default::default(),
        }],
        ..Default::default()
    };
    backend.write(store.id, &broken).await.unwrap();

    let result = state.config_service.open_draft(store.id).await;
    assert!(matches!(result, Err(AppError::UnknownRole(role)) if role == "Astronaut"));
}

#[tokio::test]
async fn test_update_company_settings_outside_draft_persists() {
    let (state, _backend) = memory_state();
    let store = create_store(&state, "lojacentro").await;

    let patch = console_backend::models::settings::UpdateCompanySettings {
        phone: Some("(11) 4000-0000".into()),
        ..Default::default()
    };
    let settings = state.config_service.update_company_settings(store.id, patch).await.unwrap();
    assert_eq!(settings.phone.as_deref(), Some("(11) 4000-0000"));

    let loaded = state.config_service.load(store.id).await.unwrap().unwrap();
    assert_eq!(loaded.company_settings, settings);
}
