// src/models/config.rs

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::permissions::PermissionConfig;
use crate::models::roles::{list_roles, Role};
use crate::models::settings::CompanySettings;
use crate::models::workflow::{AssistanceStep, AssistanceWorkflow, WorkflowDefinition, WorkflowStep};

// ---
// 1. Seções redefiníveis do pacote de configuração
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum Section {
    Workflow,
    AssistanceWorkflow,
    Permissions,
    Origins,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Workflow => "workflow",
            Section::AssistanceWorkflow => "assistanceWorkflow",
            Section::Permissions => "permissions",
            Section::Origins => "origins",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "workflow" => Ok(Section::Workflow),
            "assistanceWorkflow" => Ok(Section::AssistanceWorkflow),
            "permissions" => Ok(Section::Permissions),
            "origins" => Ok(Section::Origins),
            other => Err(AppError::UnknownSection(other.to_string())),
        }
    }
}

// ---
// 2. O pacote completo de configuração de uma loja
// ---
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfigBundle {
    /// Versão do modelo padrão usado na semeadura
    pub template_version: u32,
    pub workflow: WorkflowDefinition,
    pub assistance_workflow: AssistanceWorkflow,
    /// Um registro por cargo, na ordem do registro de cargos
    pub permissions: Vec<PermissionConfig>,
    pub origins: Vec<String>,
    pub company_settings: CompanySettings,
}

impl ConfigBundle {
    pub fn permission(&self, role: Role) -> Option<&PermissionConfig> {
        self.permissions.iter().find(|p| p.role == role)
    }

    pub fn permission_mut(&mut self, role: Role) -> Option<&mut PermissionConfig> {
        self.permissions.iter_mut().find(|p| p.role == role)
    }

    /// Invariantes estruturais checados antes de qualquer gravação.
    pub fn validate(&self, store_id: Uuid) -> Result<(), AppError> {
        self.workflow.validate()?;
        self.assistance_workflow.validate()?;

        if self.permissions.len() != list_roles().len() {
            return Err(AppError::InvalidInput(format!(
                "esperado um registro de permissão por cargo ({}), encontrados {}",
                list_roles().len(),
                self.permissions.len()
            )));
        }
        for (expected, record) in list_roles().iter().zip(&self.permissions) {
            if record.role != *expected {
                return Err(AppError::InvalidInput(format!(
                    "registro de permissão fora de ordem: esperado {expected}, encontrado {}",
                    record.role
                )));
            }
            if record.store_id != store_id {
                return Err(AppError::CrossTenantReference { expected: store_id, found: record.store_id });
            }
        }
        Ok(())
    }
}

// ---
// 3. Forma persistida
// ---
// Tudo opcional e cargos como texto: o carregamento completa o que faltar com
// os padrões e falha cedo em cargos inválidos (ver services::merge).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedBundle {
    #[serde(default)]
    pub template_version: Option<u32>,
    #[serde(default)]
    pub workflow: Option<PersistedWorkflow>,
    #[serde(default)]
    pub assistance_workflow: Option<PersistedWorkflow>,
    #[serde(default)]
    pub permissions: Vec<PersistedPermission>,
    #[serde(default)]
    pub origins: Option<Vec<String>>,
    #[serde(default)]
    pub company_settings: Option<CompanySettings>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedWorkflow {
    pub steps: BTreeMap<String, PersistedStep>,
    pub order: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedStep {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<u8>,
    pub owner_role: String,
    #[serde(default)]
    pub sla: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedPermission {
    #[serde(default)]
    pub store_id: Option<Uuid>,
    pub role: String,
    #[serde(default)]
    pub capabilities: BTreeMap<String, bool>,
    #[serde(default)]
    pub viewable_stages: BTreeSet<u8>,
    #[serde(default)]
    pub actionable_steps: BTreeSet<String>,
}

impl From<&WorkflowStep> for PersistedStep {
    fn from(step: &WorkflowStep) -> Self {
        Self {
            id: step.id.clone(),
            label: step.label.clone(),
            stage: Some(step.stage),
            owner_role: step.owner_role.to_string(),
            sla: step.sla,
        }
    }
}

impl From<&AssistanceStep> for PersistedStep {
    fn from(step: &AssistanceStep) -> Self {
        Self {
            id: step.id.clone(),
            label: step.label.clone(),
            stage: None,
            owner_role: step.owner_role.to_string(),
            sla: step.sla,
        }
    }
}

impl From<&WorkflowDefinition> for PersistedWorkflow {
    fn from(wf: &WorkflowDefinition) -> Self {
        Self {
            steps: wf.steps.iter().map(|(id, s)| (id.clone(), s.into())).collect(),
            order: wf.order.clone(),
        }
    }
}

impl From<&AssistanceWorkflow> for PersistedWorkflow {
    fn from(wf: &AssistanceWorkflow) -> Self {
        Self {
            steps: wf.steps.iter().map(|(id, s)| (id.clone(), s.into())).collect(),
            order: wf.order.clone(),
        }
    }
}

impl From<&PermissionConfig> for PersistedPermission {
    fn from(p: &PermissionConfig) -> Self {
        Self {
            store_id: Some(p.store_id),
            role: p.role.to_string(),
            capabilities: p.capabilities.to_map(),
            viewable_stages: p.viewable_stages.clone(),
            actionable_steps: p.actionable_steps.clone(),
        }
    }
}

impl From<&ConfigBundle> for PersistedBundle {
    fn from(bundle: &ConfigBundle) -> Self {
        Self {
            template_version: Some(bundle.template_version),
            workflow: Some((&bundle.workflow).into()),
            assistance_workflow: Some((&bundle.assistance_workflow).into()),
            permissions: bundle.permissions.iter().map(Into::into).collect(),
            origins: Some(bundle.origins.clone()),
            company_settings: Some(bundle.company_settings.clone()),
        }
    }
}
