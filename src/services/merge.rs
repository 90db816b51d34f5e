// src/services/merge.rs
//
// Carregamento: PersistedBundle (tudo opcional) -> ConfigBundle completo.
// Seções ausentes vêm do modelo padrão; cargos inválidos falham aqui, não na tela.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::config::{ConfigBundle, PersistedBundle, PersistedPermission, PersistedStep, PersistedWorkflow, Section};
use crate::models::permissions::{Capability, PermissionConfig};
use crate::models::roles::{list_roles, Role};
use crate::models::workflow::{AssistanceStep, AssistanceWorkflow, WorkflowDefinition, WorkflowStep};
use crate::services::defaults;

/// O que precisou ser completado com os padrões durante o merge.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergeReport {
    pub defaulted_sections: Vec<Section>,
    pub company_settings_defaulted: bool,
    pub defaulted_roles: Vec<Role>,
    pub ignored_capabilities: Vec<String>,
}

impl MergeReport {
    pub fn is_clean(&self) -> bool {
        self.defaulted_sections.is_empty()
            && !self.company_settings_defaulted
            && self.defaulted_roles.is_empty()
            && self.ignored_capabilities.is_empty()
    }
}

pub fn merge_with_defaults(store_id: Uuid, persisted: PersistedBundle) -> Result<(ConfigBundle, MergeReport), AppError> {
    let mut report = MergeReport::default();

    let workflow = match persisted.workflow {
        Some(wf) => main_workflow_from(wf)?,
        None => {
            report.defaulted_sections.push(Section::Workflow);
            defaults::default_workflow()
        }
    };
    workflow.validate()?;

    let assistance_workflow = match persisted.assistance_workflow {
        Some(wf) => assistance_workflow_from(wf)?,
        None => {
            report.defaulted_sections.push(Section::AssistanceWorkflow);
            defaults::default_assistance_workflow()
        }
    };
    assistance_workflow.validate()?;

    let permissions = merge_permissions(store_id, persisted.permissions, &mut report)?;

    let origins = match persisted.origins {
        Some(origins) => origins,
        None => {
            report.defaulted_sections.push(Section::Origins);
            defaults::default_origins()
        }
    };

    let company_settings = match persisted.company_settings {
        Some(settings) => settings,
        None => {
            report.company_settings_defaulted = true;
            defaults::default_company_settings()
        }
    };

    let bundle = ConfigBundle {
        template_version: persisted.template_version.unwrap_or(defaults::TEMPLATE_VERSION),
        workflow,
        assistance_workflow,
        permissions,
        origins,
        company_settings,
    };

    if !report.is_clean() {
        tracing::warn!(%store_id, ?report, "Configuração carregada completada com valores padrão");
    }
    Ok((bundle, report))
}

fn main_workflow_from(wf: PersistedWorkflow) -> Result<WorkflowDefinition, AppError> {
    let steps = wf
        .steps
        .into_iter()
        .map(|(key, step)| -> Result<(String, WorkflowStep), AppError> {
            let stage = step
                .stage
                .ok_or_else(|| AppError::InvalidInput(format!("passo {} do fluxo principal sem etapa", step.id)))?;
            Ok((
                key,
                WorkflowStep {
                    owner_role: step.owner_role.parse()?,
                    id: step.id,
                    label: step.label,
                    stage,
                    sla: step.sla,
                },
            ))
        })
        .collect::<Result<BTreeMap<_, _>, AppError>>()?;
    Ok(WorkflowDefinition { steps, order: wf.order })
}

fn assistance_workflow_from(wf: PersistedWorkflow) -> Result<AssistanceWorkflow, AppError> {
    let steps = wf
        .steps
        .into_iter()
        .map(|(key, step): (String, PersistedStep)| -> Result<(String, AssistanceStep), AppError> {
            Ok((
                key,
                AssistanceStep {
                    owner_role: step.owner_role.parse()?,
                    id: step.id,
                    label: step.label,
                    sla: step.sla,
                },
            ))
        })
        .collect::<Result<BTreeMap<_, _>, AppError>>()?;
    Ok(AssistanceWorkflow { steps, order: wf.order })
}

fn merge_permissions(
    store_id: Uuid,
    persisted: Vec<PersistedPermission>,
    report: &mut MergeReport,
) -> Result<Vec<PermissionConfig>, AppError> {
    if persisted.is_empty() {
        report.defaulted_sections.push(Section::Permissions);
        return Ok(defaults::default_permissions(store_id));
    }

    let mut by_role: BTreeMap<Role, PersistedPermission> = BTreeMap::new();
    for record in persisted {
        let role: Role = record.role.parse()?;
        if let Some(owner) = record.store_id {
            if owner != store_id {
                return Err(AppError::CrossTenantReference { expected: store_id, found: owner });
            }
        }
        if by_role.insert(role, record).is_some() {
            return Err(AppError::InvalidInput(format!("registro de permissão duplicado para {role}")));
        }
    }

    let mut merged = Vec::with_capacity(list_roles().len());
    for role in list_roles() {
        let mut record = defaults::default_permission(store_id, *role);
        match by_role.remove(role) {
            Some(saved) => {
                for (name, value) in saved.capabilities {
                    match name.parse::<Capability>() {
                        Ok(cap) => record.capabilities.set(cap, value),
                        Err(_) => report.ignored_capabilities.push(format!("{role}.{name}")),
                    }
                }
                record.viewable_stages = saved.viewable_stages;
                record.actionable_steps = saved.actionable_steps;
            }
            None => report.defaulted_roles.push(*role),
        }
        merged.push(record);
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::permissions::Capabilities;
    use std::collections::BTreeSet;

    #[test]
    fn empty_bundle_becomes_defaults() {
        let store_id = Uuid::new_v4();
        let (bundle, report) = merge_with_defaults(store_id, PersistedBundle::default()).unwrap();
        assert_eq!(bundle, defaults::default_bundle(store_id));
        assert_eq!(
            report.defaulted_sections,
            vec![Section::Workflow, Section::AssistanceWorkflow, Section::Permissions, Section::Origins]
        );
        assert!(report.company_settings_defaulted);
    }

    #[test]
    fn full_bundle_round_trips_unchanged() {
        let store_id = Uuid::new_v4();
        let mut original = defaults::default_bundle(store_id);
        original.workflow.steps.get_mut("1.2").unwrap().sla = 11;
        original.permissions[0].toggle_step("5.1");

        let persisted = PersistedBundle::from(&original);
        let (loaded, report) = merge_with_defaults(store_id, persisted).unwrap();
        assert_eq!(loaded, original);
        assert!(report.is_clean());
    }

    #[test]
    fn missing_role_record_is_filled_from_default() {
        let store_id = Uuid::new_v4();
        let mut persisted = PersistedBundle::from(&defaults::default_bundle(store_id));
        persisted.permissions.retain(|p| p.role != "Finance");

        let (bundle, report) = merge_with_defaults(store_id, persisted).unwrap();
        assert_eq!(bundle.permissions.len(), list_roles().len());
        assert_eq!(report.defaulted_roles, vec![Role::Finance]);
        assert_eq!(bundle.permission(Role::Finance), Some(&defaults::default_permission(store_id, Role::Finance)));
    }

    #[test]
    fn missing_capability_keys_take_role_default() {
        let store_id = Uuid::new_v4();
        let mut persisted = PersistedBundle::from(&defaults::default_bundle(store_id));
        let owner = persisted.permissions.iter_mut().find(|p| p.role == "Owner").unwrap();
        owner.capabilities = BTreeMap::from([("kanban".to_string(), false), ("teleport".to_string(), true)]);

        let (bundle, report) = merge_with_defaults(store_id, persisted).unwrap();
        let caps = bundle.permission(Role::Owner).unwrap().capabilities;
        let mut expected = Capabilities::all();
        expected.kanban = false;
        assert_eq!(caps, expected);
        assert_eq!(report.ignored_capabilities, vec!["Owner.teleport".to_string()]);
    }

    #[test]
    fn invalid_role_fails_fast() {
        let store_id = Uuid::new_v4();
        let mut persisted = PersistedBundle::from(&defaults::default_bundle(store_id));
        persisted.workflow.as_mut().unwrap().steps.get_mut("1.1").unwrap().owner_role = "Janitor".into();
        let err = merge_with_defaults(store_id, persisted).unwrap_err();
        assert!(matches!(err, AppError::UnknownRole(r) if r == "Janitor"));
    }

    #[test]
    fn foreign_permission_record_is_rejected() {
        let store_id = Uuid::new_v4();
        let other = Uuid::new_v4();
        let persisted = PersistedBundle::from(&defaults::default_bundle(other));
        let err = merge_with_defaults(store_id, persisted).unwrap_err();
        assert!(matches!(err, AppError::CrossTenantReference { expected, found } if expected == store_id && found == other));
    }

    #[test]
    fn broken_order_is_rejected() {
        let store_id = Uuid::new_v4();
        let mut persisted = PersistedBundle::from(&defaults::default_bundle(store_id));
        persisted.workflow.as_mut().unwrap().order.pop();
        assert!(matches!(merge_with_defaults(store_id, persisted), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn stale_grants_survive_loading() {
        let store_id = Uuid::new_v4();
        let mut persisted = PersistedBundle::from(&defaults::default_bundle(store_id));
        persisted.permissions[0].actionable_steps = BTreeSet::from(["99.1".to_string()]);
        let (bundle, _) = merge_with_defaults(store_id, persisted).unwrap();
        assert!(bundle.permissions[0].actionable_steps.contains("99.1"));
    }
}
