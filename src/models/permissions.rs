// src/models/permissions.rs

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::roles::Role;
use crate::models::workflow::{is_valid_stage, AssistanceWorkflow, WorkflowDefinition, MAX_STAGE, MIN_STAGE};

// ---
// 1. Capacidades globais (flags booleanas)
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    Dashboard,
    Kanban,
    ViewClient,
    EditClient,
    DeleteClient,
    EditProject,
    ChangeSeller,
    ViewSettings,
    ManageUsers,
    ViewAssembly,
    EditAssembly,
    ViewPostAssembly,
    EditPostAssembly,
    DeletePostAssembly,
    ViewAssistance,
    EditAssistance,
    DeleteAssistance,
}

pub const ALL_CAPABILITIES: [Capability; 17] = [
    Capability::Dashboard,
    Capability::Kanban,
    Capability::ViewClient,
    Capability::EditClient,
    Capability::DeleteClient,
    Capability::EditProject,
    Capability::ChangeSeller,
    Capability::ViewSettings,
    Capability::ManageUsers,
    Capability::ViewAssembly,
    Capability::EditAssembly,
    Capability::ViewPostAssembly,
    Capability::EditPostAssembly,
    Capability::DeletePostAssembly,
    Capability::ViewAssistance,
    Capability::EditAssistance,
    Capability::DeleteAssistance,
];

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Dashboard => "dashboard",
            Capability::Kanban => "kanban",
            Capability::ViewClient => "viewClient",
            Capability::EditClient => "editClient",
            Capability::DeleteClient => "deleteClient",
            Capability::EditProject => "editProject",
            Capability::ChangeSeller => "changeSeller",
            Capability::ViewSettings => "viewSettings",
            Capability::ManageUsers => "manageUsers",
            Capability::ViewAssembly => "viewAssembly",
            Capability::EditAssembly => "editAssembly",
            Capability::ViewPostAssembly => "viewPostAssembly",
            Capability::EditPostAssembly => "editPostAssembly",
            Capability::DeletePostAssembly => "deletePostAssembly",
            Capability::ViewAssistance => "viewAssistance",
            Capability::EditAssistance => "editAssistance",
            Capability::DeleteAssistance => "deleteAssistance",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_CAPABILITIES
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::UnknownCapability(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub dashboard: bool,
    pub kanban: bool,
    pub view_client: bool,
    pub edit_client: bool,
    pub delete_client: bool,
    pub edit_project: bool,
    pub change_seller: bool,
    pub view_settings: bool,
    pub manage_users: bool,
    pub view_assembly: bool,
    pub edit_assembly: bool,
    pub view_post_assembly: bool,
    pub edit_post_assembly: bool,
    pub delete_post_assembly: bool,
    pub view_assistance: bool,
    pub edit_assistance: bool,
    pub delete_assistance: bool,
}

impl Capabilities {
    pub fn all() -> Self {
        let mut caps = Self::default();
        for cap in ALL_CAPABILITIES {
            caps.set(cap, true);
        }
        caps
    }

    pub fn from_granted(granted: &[Capability]) -> Self {
        let mut caps = Self::default();
        for cap in granted {
            caps.set(*cap, true);
        }
        caps
    }

    fn slot(&mut self, cap: Capability) -> &mut bool {
        match cap {
            Capability::Dashboard => &mut self.dashboard,
            Capability::Kanban => &mut self.kanban,
            Capability::ViewClient => &mut self.view_client,
            Capability::EditClient => &mut self.edit_client,
            Capability::DeleteClient => &mut self.delete_client,
            Capability::EditProject => &mut self.edit_project,
            Capability::ChangeSeller => &mut self.change_seller,
            Capability::ViewSettings => &mut self.view_settings,
            Capability::ManageUsers => &mut self.manage_users,
            Capability::ViewAssembly => &mut self.view_assembly,
            Capability::EditAssembly => &mut self.edit_assembly,
            Capability::ViewPostAssembly => &mut self.view_post_assembly,
            Capability::EditPostAssembly => &mut self.edit_post_assembly,
            Capability::DeletePostAssembly => &mut self.delete_post_assembly,
            Capability::ViewAssistance => &mut self.view_assistance,
            Capability::EditAssistance => &mut self.edit_assistance,
            Capability::DeleteAssistance => &mut self.delete_assistance,
        }
    }

    pub fn get(&self, cap: Capability) -> bool {
        match cap {
            Capability::Dashboard => self.dashboard,
            Capability::Kanban => self.kanban,
            Capability::ViewClient => self.view_client,
            Capability::EditClient => self.edit_client,
            Capability::DeleteClient => self.delete_client,
            Capability::EditProject => self.edit_project,
            Capability::ChangeSeller => self.change_seller,
            Capability::ViewSettings => self.view_settings,
            Capability::ManageUsers => self.manage_users,
            Capability::ViewAssembly => self.view_assembly,
            Capability::EditAssembly => self.edit_assembly,
            Capability::ViewPostAssembly => self.view_post_assembly,
            Capability::EditPostAssembly => self.edit_post_assembly,
            Capability::DeletePostAssembly => self.delete_post_assembly,
            Capability::ViewAssistance => self.view_assistance,
            Capability::EditAssistance => self.edit_assistance,
            Capability::DeleteAssistance => self.delete_assistance,
        }
    }

    pub fn set(&mut self, cap: Capability, value: bool) {
        *self.slot(cap) = value;
    }

    /// Forma persistida: mapa nome -> valor, tolerante a campos novos/antigos.
    pub fn to_map(&self) -> BTreeMap<String, bool> {
        ALL_CAPABILITIES
            .iter()
            .map(|cap| (cap.as_str().to_string(), self.get(*cap)))
            .collect()
    }
}

// ---
// 2. PermissionConfig: um registro por (loja, cargo)
// ---
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionConfig {
    pub store_id: Uuid,
    pub role: Role,
    pub capabilities: Capabilities,
    #[schema(value_type = Vec<u8>, example = json!([1, 2, 3]))]
    pub viewable_stages: BTreeSet<u8>,
    #[schema(value_type = Vec<String>, example = json!(["1.1", "1.2"]))]
    pub actionable_steps: BTreeSet<String>,
}

/// Diferença simétrica de um elemento: adiciona se ausente, remove se presente.
/// Retorna se o elemento ficou presente.
fn resolves(step_id: &str, workflow: &WorkflowDefinition, assistance: &AssistanceWorkflow) -> bool {
    workflow.contains(step_id) || assistance.contains(step_id)
}

fn toggle_member<T: Ord>(set: &mut BTreeSet<T>, value: T) -> bool {
    if set.remove(&value) {
        false
    } else {
        set.insert(value);
        true
    }
}

impl PermissionConfig {
    pub fn toggle_stage(&mut self, stage: u8) -> Result<bool, AppError> {
        if !is_valid_stage(stage) {
            return Err(AppError::InvalidInput(format!(
                "etapa {stage} fora do intervalo {MIN_STAGE}..{MAX_STAGE}"
            )));
        }
        Ok(toggle_member(&mut self.viewable_stages, stage))
    }

    // Não valida contra o fluxo: a concessão pode anteceder o passo ou sobreviver a ele
    pub fn toggle_step(&mut self, step_id: &str) -> bool {
        toggle_member(&mut self.actionable_steps, step_id.to_string())
    }

    pub fn can_view_stage(&self, stage: u8) -> bool {
        self.viewable_stages.contains(&stage)
    }

    /// Só concessões que resolvem para um passo real de um dos fluxos atuais
    /// (principal ou assistência) valem.
    pub fn can_execute(&self, step_id: &str, workflow: &WorkflowDefinition, assistance: &AssistanceWorkflow) -> bool {
        self.actionable_steps.contains(step_id) && resolves(step_id, workflow, assistance)
    }

    /// Concessões que não apontam para nenhum passo dos fluxos atuais.
    pub fn stale_steps(&self, workflow: &WorkflowDefinition, assistance: &AssistanceWorkflow) -> Vec<String> {
        self.actionable_steps
            .iter()
            .filter(|id| !resolves(id, workflow, assistance))
            .cloned()
            .collect()
    }
}

// Payload de setCapability
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetCapabilityPayload {
    #[schema(example = true)]
    pub value: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::workflow::{AssistanceStep, WorkflowStep};

    fn record() -> PermissionConfig {
        PermissionConfig {
            store_id: Uuid::new_v4(),
            role: Role::Seller,
            capabilities: Capabilities::default(),
            viewable_stages: BTreeSet::from([1, 2]),
            actionable_steps: BTreeSet::from(["1.1".to_string()]),
        }
    }

    #[test]
    fn stage_toggle_is_an_involution() {
        let mut rec = record();
        let original = rec.viewable_stages.clone();
        for stage in [1, 5] {
            rec.toggle_stage(stage).unwrap();
            rec.toggle_stage(stage).unwrap();
            assert_eq!(rec.viewable_stages, original);
        }
    }

    #[test]
    fn step_toggle_is_an_involution() {
        let mut rec = record();
        let original = rec.actionable_steps.clone();
        assert!(!rec.toggle_step("1.1"));
        assert!(rec.toggle_step("1.1"));
        assert!(rec.toggle_step("9.9"));
        assert!(!rec.toggle_step("9.9"));
        assert_eq!(rec.actionable_steps, original);
    }

    #[test]
    fn stage_outside_range_is_rejected() {
        let mut rec = record();
        assert!(rec.toggle_stage(0).is_err());
        assert!(rec.toggle_stage(10).is_err());
    }

    fn workflows() -> (WorkflowDefinition, AssistanceWorkflow) {
        let wf = WorkflowDefinition::from_steps(vec![WorkflowStep {
            id: "1.1".into(),
            label: "Cadastro".into(),
            stage: 1,
            owner_role: Role::Seller,
            sla: 1,
        }]);
        let at = AssistanceWorkflow::from_steps(vec![AssistanceStep {
            id: "AT.1".into(),
            label: "Abertura".into(),
            owner_role: Role::Seller,
            sla: 1,
        }]);
        (wf, at)
    }

    #[test]
    fn stale_grants_are_inert() {
        let (wf, at) = workflows();
        let mut rec = record();
        rec.toggle_step("3.3");
        assert!(rec.can_execute("1.1", &wf, &at));
        assert!(!rec.can_execute("3.3", &wf, &at));
        assert_eq!(rec.stale_steps(&wf, &at), vec!["3.3".to_string()]);
    }

    #[test]
    fn assistance_grant_is_executable_and_not_stale() {
        let (wf, at) = workflows();
        let mut rec = record();
        rec.toggle_step("AT.1");
        assert!(rec.can_execute("AT.1", &wf, &at));
        assert!(rec.stale_steps(&wf, &at).is_empty());

        // Sem a concessão, o passo existe mas não é executável
        rec.toggle_step("AT.1");
        assert!(!rec.can_execute("AT.1", &wf, &at));
    }

    #[test]
    fn capability_set_touches_one_field() {
        let mut caps = Capabilities::default();
        caps.set(Capability::EditPostAssembly, true);
        let granted: Vec<_> = ALL_CAPABILITIES.iter().filter(|c| caps.get(**c)).collect();
        assert_eq!(granted, vec![&Capability::EditPostAssembly]);
        assert!(caps.edit_post_assembly);
    }

    #[test]
    fn capability_names_parse() {
        for cap in ALL_CAPABILITIES {
            assert_eq!(cap.as_str().parse::<Capability>().unwrap(), cap);
        }
        assert!(matches!("fly".parse::<Capability>(), Err(AppError::UnknownCapability(_))));
    }

    #[test]
    fn capability_map_matches_serde_names() {
        let caps = Capabilities::all();
        let as_json = serde_json::to_value(caps).unwrap();
        for (key, value) in caps.to_map() {
            assert_eq!(as_json[&key], serde_json::Value::Bool(value), "{key}");
        }
    }
}
