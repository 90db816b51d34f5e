//! Rascunhos por sessão
//!
//! Isolamento entre lojas e usuários, descarte e last-write-wins no save.

mod common;

use serde_json::json;

use common::*;
use console_backend::{
    common::error::AppError,
    models::{roles::Role, workflow::StepPatch},
    services::{defaults, draft::DraftState},
};

#[tokio::test]
async fn test_sessions_on_different_stores_do_not_share_state() {
    let (state, _backend) = memory_state();
    let a = create_store(&state, "lojaa").await;
    let b = create_store(&state, "lojab").await;
    let admin_a = login_admin(&state, "lojaa").await;
    let admin_b = login_admin(&state, "lojab").await;
    let sessions = &state.draft_sessions;

    sessions
        .with_draft(a.id, admin_a.sub, |draft| draft.set_origins(a.id, vec!["Feira".into()]).map(|_| ()))
        .await
        .unwrap();

    let origins_b = sessions
        .with_draft(b.id, admin_b.sub, |draft| Ok(draft.get_origins(b.id)?.to_vec()))
        .await
        .unwrap();
    assert_eq!(origins_b, defaults::default_origins());
}

#[tokio::test]
async fn test_draft_rejects_ids_from_another_store() {
    let (state, _backend) = memory_state();
    let a = create_store(&state, "lojaa").await;
    let b = create_store(&state, "lojab").await;
    let admin_b = login_admin(&state, "lojab").await;

    let result = state
        .draft_sessions
        .with_draft(b.id, admin_b.sub, |draft| draft.update_step(a.id, "1.1", &StepPatch::default()))
        .await;
    assert!(matches!(result, Err(AppError::CrossTenantReference { expected, found }) if expected == b.id && found == a.id));
}

#[tokio::test]
async fn test_edits_accumulate_in_the_session_draft() {
    let (state, _backend) = memory_state();
    let store = create_store(&state, "lojacentro").await;
    let admin = login_admin(&state, "lojacentro").await;
    let sessions = &state.draft_sessions;

    sessions
        .with_draft(store.id, admin.sub, |draft| draft.toggle_stage_visibility(store.id, Role::Seller, 4).map(|_| ()))
        .await
        .unwrap();
    let (visible, dirty) = sessions
        .with_draft(store.id, admin.sub, |draft| {
            Ok((draft.can_view_stage(store.id, Role::Seller, 4)?, draft.is_dirty()))
        })
        .await
        .unwrap();
    assert!(visible);
    assert!(dirty);
}

#[tokio::test]
async fn test_discard_reloads_persisted_bundle() {
    let (state, _backend) = memory_state();
    let store = create_store(&state, "lojacentro").await;
    let admin = login_admin(&state, "lojacentro").await;
    let sessions = &state.draft_sessions;

    sessions
        .with_draft(store.id, admin.sub, |draft| draft.set_origins(store.id, vec!["Feira".into()]).map(|_| ()))
        .await
        .unwrap();
    assert!(sessions.discard(store.id, admin.sub));
    assert!(!sessions.discard(store.id, admin.sub));

    let (origins, draft_state) = sessions
        .with_draft(store.id, admin.sub, |draft| Ok((draft.get_origins(store.id)?.to_vec(), draft.state())))
        .await
        .unwrap();
    assert_eq!(origins, defaults::default_origins());
    assert_eq!(draft_state, DraftState::Persisted);
}

#[tokio::test]
async fn test_later_save_overwrites_earlier_one() {
    let (state, _backend) = memory_state();
    let store = create_store(&state, "lojacentro").await;
    let admin = login_admin(&state, "lojacentro").await;
    let other_session = uuid::Uuid::new_v4();
    let sessions = &state.draft_sessions;

    let first = StepPatch { owner_role: None, sla: Some(json!(10)) };
    let second = StepPatch { owner_role: None, sla: Some(json!(20)) };
    sessions
        .with_draft(store.id, admin.sub, |draft| draft.update_step(store.id, "2.1", &first))
        .await
        .unwrap();
    sessions
        .with_draft(store.id, other_session, |draft| draft.update_step(store.id, "2.1", &second))
        .await
        .unwrap();

    sessions.save(store.id, admin.sub).await.unwrap();
    let saved = sessions.save(store.id, other_session).await.unwrap();
    assert_eq!(saved.state(), DraftState::Persisted);

    let loaded = state.config_service.load(store.id).await.unwrap().unwrap();
    assert_eq!(loaded.workflow.steps["2.1"].sla, 20);
}

#[tokio::test]
async fn test_reset_through_session_leaves_draft_dirty() {
    let (state, _backend) = memory_state();
    let store = create_store(&state, "lojacentro").await;
    let admin = login_admin(&state, "lojacentro").await;

    let draft = state.draft_sessions.reset(store.id, admin.sub, "permissions").await.unwrap();
    assert_eq!(draft.state(), DraftState::Dirty);
    assert_eq!(draft.bundle().permissions, defaults::default_permissions(store.id));

    let result = state.draft_sessions.reset(store.id, admin.sub, "everything").await;
    assert!(matches!(result, Err(AppError::UnknownSection(_))));
}
