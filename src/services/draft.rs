// src/services/draft.rs

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::config::{ConfigBundle, Section};
use crate::models::permissions::{Capability, PermissionConfig};
use crate::models::roles::{list_roles, Role};
use crate::models::settings::{normalize_origins, CompanySettings, Holiday, HolidayType, UpdateCompanySettings};
use crate::models::workflow::{AssistanceStep, AssistanceWorkflow, StepPatch, WorkflowDefinition, WorkflowStep};
use crate::services::defaults;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum DraftState {
    /// Recém-semeado com os padrões, ainda não gravado
    Seeded,
    /// Diferente do que está persistido
    Dirty,
    /// Igual ao último pacote gravado/carregado
    Persisted,
}

// ---
// Rascunho da configuração de UMA loja
// ---
// Todas as edições acontecem aqui, em memória, até o `save` explícito do
// ConfigService. Cada operação recebe o store_id e recusa ids de outra loja.
#[derive(Debug, Clone)]
pub struct ConfigDraft {
    store_id: Uuid,
    bundle: ConfigBundle,
    state: DraftState,
}

impl ConfigDraft {
    pub fn seeded(store_id: Uuid) -> Self {
        Self { store_id, bundle: defaults::default_bundle(store_id), state: DraftState::Seeded }
    }

    pub fn from_persisted(store_id: Uuid, bundle: ConfigBundle) -> Self {
        Self { store_id, bundle, state: DraftState::Persisted }
    }

    pub fn store_id(&self) -> Uuid {
        self.store_id
    }

    pub fn state(&self) -> DraftState {
        self.state
    }

    pub fn bundle(&self) -> &ConfigBundle {
        &self.bundle
    }

    pub fn is_dirty(&self) -> bool {
        self.state == DraftState::Dirty
    }

    pub(crate) fn mark_persisted(&mut self) {
        self.state = DraftState::Persisted;
    }

    fn ensure_tenant(&self, store_id: Uuid) -> Result<(), AppError> {
        if store_id != self.store_id {
            return Err(AppError::CrossTenantReference { expected: self.store_id, found: store_id });
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.state = DraftState::Dirty;
    }

    fn permission_mut(&mut self, role: Role) -> Result<&mut PermissionConfig, AppError> {
        // Não deveria acontecer: o merge garante um registro por cargo
        self.bundle
            .permission_mut(role)
            .ok_or_else(|| AppError::UnknownRole(role.to_string()))
    }

    // =========================================================================
    //  FLUXO PRINCIPAL E DE ASSISTÊNCIA
    // =========================================================================

    pub fn get_workflow(&self, store_id: Uuid) -> Result<&WorkflowDefinition, AppError> {
        self.ensure_tenant(store_id)?;
        Ok(&self.bundle.workflow)
    }

    pub fn update_step(&mut self, store_id: Uuid, step_id: &str, patch: &StepPatch) -> Result<WorkflowStep, AppError> {
        self.ensure_tenant(store_id)?;
        let step = self.bundle.workflow.update_step(step_id, patch)?;
        self.touch();
        Ok(step)
    }

    pub fn steps_by_stage(&self, store_id: Uuid) -> Result<BTreeMap<u8, Vec<WorkflowStep>>, AppError> {
        self.ensure_tenant(store_id)?;
        Ok(self.bundle.workflow.steps_by_stage())
    }

    pub fn get_assistance_workflow(&self, store_id: Uuid) -> Result<&AssistanceWorkflow, AppError> {
        self.ensure_tenant(store_id)?;
        Ok(&self.bundle.assistance_workflow)
    }

    pub fn update_assistance_step(
        &mut self,
        store_id: Uuid,
        step_id: &str,
        patch: &StepPatch,
    ) -> Result<AssistanceStep, AppError> {
        self.ensure_tenant(store_id)?;
        let step = self.bundle.assistance_workflow.update_step(step_id, patch)?;
        self.touch();
        Ok(step)
    }

    // =========================================================================
    //  PERMISSÕES
    // =========================================================================

    /// Um registro por cargo, na ordem do registro de cargos.
    pub fn get_permissions(&self, store_id: Uuid) -> Result<Vec<&PermissionConfig>, AppError> {
        self.ensure_tenant(store_id)?;
        list_roles()
            .iter()
            .map(|role| {
                self.bundle
                    .permission(*role)
                    .ok_or_else(|| AppError::UnknownRole(role.to_string()))
            })
            .collect()
    }

    pub fn set_capability(
        &mut self,
        store_id: Uuid,
        role: Role,
        capability: Capability,
        value: bool,
    ) -> Result<&PermissionConfig, AppError> {
        self.ensure_tenant(store_id)?;
        self.permission_mut(role)?.capabilities.set(capability, value);
        self.touch();
        self.permission_mut(role).map(|p| &*p)
    }

    pub fn toggle_stage_visibility(&mut self, store_id: Uuid, role: Role, stage: u8) -> Result<&BTreeSet<u8>, AppError> {
        self.ensure_tenant(store_id)?;
        let record = self.permission_mut(role)?;
        record.toggle_stage(stage)?;
        self.touch();
        self.permission_mut(role).map(|p| &p.viewable_stages)
    }

    pub fn toggle_step_authorization(
        &mut self,
        store_id: Uuid,
        role: Role,
        step_id: &str,
    ) -> Result<&BTreeSet<String>, AppError> {
        self.ensure_tenant(store_id)?;
        let step_id = step_id.trim();
        if step_id.is_empty() {
            return Err(AppError::InvalidInput("id de passo vazio".into()));
        }
        self.permission_mut(role)?.toggle_step(step_id);
        self.touch();
        self.permission_mut(role).map(|p| &p.actionable_steps)
    }

    pub fn can_view_stage(&self, store_id: Uuid, role: Role, stage: u8) -> Result<bool, AppError> {
        self.ensure_tenant(store_id)?;
        Ok(self.bundle.permission(role).is_some_and(|p| p.can_view_stage(stage)))
    }

    pub fn can_execute_step(&self, store_id: Uuid, role: Role, step_id: &str) -> Result<bool, AppError> {
        self.ensure_tenant(store_id)?;
        Ok(self
            .bundle
            .permission(role)
            .is_some_and(|p| p.can_execute(step_id, &self.bundle.workflow, &self.bundle.assistance_workflow)))
    }

    /// Concessões que não resolvem para nenhum passo dos fluxos atuais.
    pub fn stale_step_grants(&self, store_id: Uuid, role: Role) -> Result<Vec<String>, AppError> {
        self.ensure_tenant(store_id)?;
        let record = self
            .bundle
            .permission(role)
            .ok_or_else(|| AppError::UnknownRole(role.to_string()))?;
        Ok(record.stale_steps(&self.bundle.workflow, &self.bundle.assistance_workflow))
    }

    // =========================================================================
    //  CONFIGURAÇÕES DA EMPRESA E ORIGENS
    // =========================================================================

    pub fn get_company_settings(&self, store_id: Uuid) -> Result<&CompanySettings, AppError> {
        self.ensure_tenant(store_id)?;
        Ok(&self.bundle.company_settings)
    }

    pub fn update_company_settings(
        &mut self,
        store_id: Uuid,
        patch: UpdateCompanySettings,
    ) -> Result<&CompanySettings, AppError> {
        self.ensure_tenant(store_id)?;
        self.bundle.company_settings.apply(patch);
        self.touch();
        Ok(&self.bundle.company_settings)
    }

    pub fn add_holiday(&mut self, store_id: Uuid, holiday: Holiday) -> Result<&[Holiday], AppError> {
        self.ensure_tenant(store_id)?;
        self.bundle.company_settings.add_holiday(holiday)?;
        self.touch();
        Ok(&self.bundle.company_settings.holidays)
    }

    pub fn remove_holiday(
        &mut self,
        store_id: Uuid,
        date: NaiveDate,
        kind: HolidayType,
        year: Option<i32>,
    ) -> Result<bool, AppError> {
        self.ensure_tenant(store_id)?;
        let removed = self.bundle.company_settings.remove_holiday(date, kind, year);
        if removed {
            self.touch();
        }
        Ok(removed)
    }

    pub fn is_holiday(&self, store_id: Uuid, day: NaiveDate) -> Result<bool, AppError> {
        self.ensure_tenant(store_id)?;
        Ok(self.bundle.company_settings.is_holiday(day))
    }

    pub fn get_origins(&self, store_id: Uuid) -> Result<&[String], AppError> {
        self.ensure_tenant(store_id)?;
        Ok(&self.bundle.origins)
    }

    pub fn set_origins(&mut self, store_id: Uuid, origins: Vec<String>) -> Result<&[String], AppError> {
        self.ensure_tenant(store_id)?;
        self.bundle.origins = normalize_origins(origins);
        self.touch();
        Ok(&self.bundle.origins)
    }

    // =========================================================================
    //  RESTAURAR PADRÃO
    // =========================================================================

    /// Substitui a seção pelo modelo padrão. Fica `Dirty` até o próximo save.
    pub fn reset_section(&mut self, store_id: Uuid, section: Section) -> Result<(), AppError> {
        self.ensure_tenant(store_id)?;
        match section {
            Section::Workflow => self.bundle.workflow = defaults::default_workflow(),
            Section::AssistanceWorkflow => self.bundle.assistance_workflow = defaults::default_assistance_workflow(),
            Section::Permissions => self.bundle.permissions = defaults::default_permissions(self.store_id),
            Section::Origins => self.bundle.origins = defaults::default_origins(),
        }
        self.touch();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn draft() -> (Uuid, ConfigDraft) {
        let id = Uuid::new_v4();
        (id, ConfigDraft::from_persisted(id, defaults::default_bundle(id)))
    }

    #[test]
    fn operations_reject_other_tenants() {
        let (_, mut draft) = draft();
        let intruder = Uuid::new_v4();
        assert!(matches!(draft.get_workflow(intruder), Err(AppError::CrossTenantReference { .. })));
        assert!(matches!(
            draft.update_step(intruder, "1.1", &StepPatch::default()),
            Err(AppError::CrossTenantReference { .. })
        ));
        assert!(matches!(
            draft.toggle_step_authorization(intruder, Role::Seller, "1.1"),
            Err(AppError::CrossTenantReference { .. })
        ));
        assert!(matches!(
            draft.reset_section(intruder, Section::Workflow),
            Err(AppError::CrossTenantReference { .. })
        ));
        assert_eq!(draft.state(), DraftState::Persisted);
    }

    #[test]
    fn mutations_mark_draft_dirty() {
        let (id, mut draft) = draft();
        assert!(!draft.is_dirty());
        let patch = StepPatch { owner_role: None, sla: Some(json!("x")) };
        let step = draft.update_step(id, "2.1", &patch).unwrap();
        assert_eq!(step.sla, 0);
        assert!(draft.is_dirty());
    }

    #[test]
    fn failed_update_leaves_state_untouched() {
        let (id, mut draft) = draft();
        assert!(matches!(draft.update_step(id, "nope", &StepPatch::default()), Err(AppError::UnknownStep(_))));
        assert_eq!(draft.state(), DraftState::Persisted);
    }

    #[test]
    fn permissions_follow_registry_order() {
        let (id, draft) = draft();
        let roles: Vec<Role> = draft.get_permissions(id).unwrap().iter().map(|p| p.role).collect();
        assert_eq!(roles, list_roles().to_vec());
    }

    #[test]
    fn toggles_are_involutions() {
        let (id, mut draft) = draft();
        let stages = draft.bundle().permission(Role::Designer).unwrap().viewable_stages.clone();
        let steps = draft.bundle().permission(Role::Designer).unwrap().actionable_steps.clone();

        draft.toggle_stage_visibility(id, Role::Designer, 7).unwrap();
        assert_eq!(draft.toggle_stage_visibility(id, Role::Designer, 7).unwrap(), &stages);

        draft.toggle_step_authorization(id, Role::Designer, "2.1").unwrap();
        assert_eq!(draft.toggle_step_authorization(id, Role::Designer, "2.1").unwrap(), &steps);
    }

    #[test]
    fn set_capability_changes_one_role() {
        let (id, mut draft) = draft();
        let before = draft.bundle().permission(Role::Seller).unwrap().clone();
        let after = draft.set_capability(id, Role::Measurer, Capability::ManageUsers, true).unwrap();
        assert!(after.capabilities.manage_users);
        assert_eq!(draft.bundle().permission(Role::Seller).unwrap(), &before);
    }

    #[test]
    fn step_grant_for_future_step_is_kept_but_inert() {
        let (id, mut draft) = draft();
        draft.toggle_step_authorization(id, Role::Seller, "10.1").unwrap();
        assert!(!draft.can_execute_step(id, Role::Seller, "10.1").unwrap());
        assert_eq!(draft.stale_step_grants(id, Role::Seller).unwrap(), vec!["10.1".to_string()]);
        assert!(draft.can_execute_step(id, Role::Seller, "1.1").unwrap());
    }

    #[test]
    fn default_assistance_grants_are_executable() {
        let (id, draft) = draft();
        let seller = draft.bundle().permission(Role::Seller).unwrap();
        assert!(seller.actionable_steps.contains("AT.1"));
        assert!(draft.can_execute_step(id, Role::Seller, "AT.1").unwrap());
        assert!(draft.stale_step_grants(id, Role::Seller).unwrap().is_empty());
        // AT.2 existe mas pertence a outro cargo
        assert!(!draft.can_execute_step(id, Role::Seller, "AT.2").unwrap());
    }

    #[test]
    fn reset_workflow_discards_customisations() {
        let (id, mut draft) = draft();
        let patch = StepPatch { owner_role: Some(Role::Owner), sla: Some(json!(30)) };
        draft.update_step(id, "1.1", &patch).unwrap();
        draft.reset_section(id, Section::Workflow).unwrap();
        assert_eq!(draft.steps_by_stage(id).unwrap(), defaults::default_workflow().steps_by_stage());
        assert!(draft.is_dirty());
    }

    #[test]
    fn reset_permissions_prunes_stale_grants() {
        let (id, mut draft) = draft();
        draft.toggle_step_authorization(id, Role::Seller, "77.1").unwrap();
        draft.reset_section(id, Section::Permissions).unwrap();
        assert!(draft.stale_step_grants(id, Role::Seller).unwrap().is_empty());
    }

    #[test]
    fn origins_and_holidays() {
        let (id, mut draft) = draft();
        let origins = draft.set_origins(id, vec!["Feira".into(), " feira ".into()]).unwrap();
        assert_eq!(origins, ["Feira".to_string()]);

        let day = NaiveDate::from_ymd_opt(2025, 6, 19).unwrap();
        assert!(!draft.is_holiday(id, day).unwrap());
        draft
            .add_holiday(id, Holiday { date: day, name: "Corpus Christi".into(), kind: HolidayType::Movable, year: Some(2025) })
            .unwrap();
        assert!(draft.is_holiday(id, day).unwrap());
        assert!(draft.remove_holiday(id, day, HolidayType::Movable, Some(2025)).unwrap());
        assert!(!draft.is_holiday(id, day).unwrap());
    }
}
