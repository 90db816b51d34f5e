// src/models/workflow.rs

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::common::error::AppError;
use crate::models::roles::Role;

pub const MIN_STAGE: u8 = 1;
pub const MAX_STAGE: u8 = 9;
/// Etapa 8: subconjunto "pós-montagem" do fluxo principal.
pub const POST_ASSEMBLY_STAGE: u8 = 8;

pub fn is_valid_stage(stage: u8) -> bool {
    (MIN_STAGE..=MAX_STAGE).contains(&stage)
}

// ---
// 1. Passo do fluxo principal
// ---
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    #[schema(example = "1.1")]
    pub id: String,
    #[schema(example = "Cadastro do cliente")]
    pub label: String,
    #[schema(example = 1)]
    pub stage: u8,
    pub owner_role: Role,
    /// Prazo em dias
    #[schema(example = 2)]
    pub sla: u32,
}

// ---
// 2. Passo do fluxo de assistência (lista plana, sem etapas)
// ---
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssistanceStep {
    #[schema(example = "AT.1")]
    pub id: String,
    #[schema(example = "Abertura do chamado")]
    pub label: String,
    pub owner_role: Role,
    #[schema(example = 1)]
    pub sla: u32,
}

/// O que os dois tipos de passo têm em comum: só `ownerRole` e `sla` mudam depois da semeadura.
pub trait StepEntry {
    fn id(&self) -> &str;
    fn apply(&mut self, patch: &StepPatch);
}

impl StepEntry for WorkflowStep {
    fn id(&self) -> &str {
        &self.id
    }

    fn apply(&mut self, patch: &StepPatch) {
        if let Some(role) = patch.owner_role {
            self.owner_role = role;
        }
        if let Some(sla) = &patch.sla {
            self.sla = normalize_sla(sla);
        }
    }
}

impl StepEntry for AssistanceStep {
    fn id(&self) -> &str {
        &self.id
    }

    fn apply(&mut self, patch: &StepPatch) {
        if let Some(role) = patch.owner_role {
            self.owner_role = role;
        }
        if let Some(sla) = &patch.sla {
            self.sla = normalize_sla(sla);
        }
    }
}

// Payload de updateStep. `label`, `id` e `stage` não são editáveis.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepPatch {
    pub owner_role: Option<Role>,
    /// Aceita número ou texto; valores inválidos viram 0
    #[schema(value_type = Option<Object>, example = json!(3))]
    pub sla: Option<Value>,
}

/// Coerção permissiva do SLA: qualquer coisa que não seja um inteiro
/// não-negativo vira 0 (frações são truncadas).
pub fn normalize_sla(value: &Value) -> u32 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_leading_number(s.trim()),
        Value::Bool(_) | Value::Null | Value::Array(_) | Value::Object(_) => None,
    };
    match parsed {
        Some(v) if v.is_finite() && v >= 0.0 => v.trunc().min(u32::MAX as f64) as u32,
        _ => 0,
    }
}

// "12 dias" -> 12, "3.5" -> 3.5, "1.2.3" -> 1.2, "abc" -> None
fn parse_leading_number(s: &str) -> Option<f64> {
    let mut seen_dot = false;
    let end = s
        .char_indices()
        .take_while(|&(i, c)| match c {
            '0'..='9' => true,
            '.' if !seen_dot => {
                seen_dot = true;
                true
            }
            '-' | '+' => i == 0,
            _ => false,
        })
        .map(|(i, c)| i + c.len_utf8())
        .last()?;
    s[..end].parse::<f64>().ok()
}

// ---
// 3. Definição de fluxo: passos por id + ordem total
// ---
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDefinition {
    pub steps: BTreeMap<String, WorkflowStep>,
    #[schema(example = json!(["1.1", "1.2", "2.1"]))]
    pub order: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssistanceWorkflow {
    pub steps: BTreeMap<String, AssistanceStep>,
    #[schema(example = json!(["AT.1", "AT.2"]))]
    pub order: Vec<String>,
}

/// Garante que `order` é uma permutação exata das chaves de `steps`
/// e que cada passo está registrado sob o próprio id.
pub fn validate_order<S: StepEntry>(steps: &BTreeMap<String, S>, order: &[String]) -> Result<(), AppError> {
    let mut seen = HashSet::with_capacity(order.len());
    for id in order {
        if !seen.insert(id.as_str()) {
            return Err(AppError::InvalidInput(format!("passo duplicado na ordem do fluxo: {id}")));
        }
        if !steps.contains_key(id) {
            return Err(AppError::InvalidInput(format!("passo {id} está na ordem mas não existe no fluxo")));
        }
    }
    if let Some(missing) = steps.keys().find(|id| !seen.contains(id.as_str())) {
        return Err(AppError::InvalidInput(format!("passo {missing} não aparece na ordem do fluxo")));
    }
    if let Some((key, step)) = steps.iter().find(|(key, step)| key.as_str() != step.id()) {
        return Err(AppError::InvalidInput(format!("passo registrado como {key} tem id {}", step.id())));
    }
    Ok(())
}

fn update_in<S: StepEntry + Clone>(
    steps: &mut BTreeMap<String, S>,
    step_id: &str,
    patch: &StepPatch,
) -> Result<S, AppError> {
    let step = steps
        .get_mut(step_id)
        .ok_or_else(|| AppError::UnknownStep(step_id.to_string()))?;
    step.apply(patch);
    Ok(step.clone())
}

impl WorkflowDefinition {
    pub fn from_steps(steps: Vec<WorkflowStep>) -> Self {
        let order = steps.iter().map(|s| s.id.clone()).collect();
        let steps = steps.into_iter().map(|s| (s.id.clone(), s)).collect();
        Self { steps, order }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        validate_order(&self.steps, &self.order)?;
        if let Some(step) = self.steps.values().find(|s| !is_valid_stage(s.stage)) {
            return Err(AppError::InvalidInput(format!(
                "passo {} tem etapa {} fora do intervalo {MIN_STAGE}..{MAX_STAGE}",
                step.id, step.stage
            )));
        }
        Ok(())
    }

    pub fn contains(&self, step_id: &str) -> bool {
        self.steps.contains_key(step_id)
    }

    /// Passos na ordem de execução.
    pub fn ordered(&self) -> impl Iterator<Item = &WorkflowStep> {
        self.order.iter().filter_map(|id| self.steps.get(id))
    }

    pub fn update_step(&mut self, step_id: &str, patch: &StepPatch) -> Result<WorkflowStep, AppError> {
        update_in(&mut self.steps, step_id, patch)
    }

    /// Agrupa a ordem por etapa, preservando a ordem relativa dentro de cada etapa.
    pub fn steps_by_stage(&self) -> BTreeMap<u8, Vec<WorkflowStep>> {
        let mut grouped: BTreeMap<u8, Vec<WorkflowStep>> = BTreeMap::new();
        for step in self.ordered() {
            grouped.entry(step.stage).or_default().push(step.clone());
        }
        grouped
    }

    pub fn post_assembly_steps(&self) -> impl Iterator<Item = &WorkflowStep> {
        self.ordered().filter(|s| s.stage == POST_ASSEMBLY_STAGE)
    }
}

impl AssistanceWorkflow {
    pub fn from_steps(steps: Vec<AssistanceStep>) -> Self {
        let order = steps.iter().map(|s| s.id.clone()).collect();
        let steps = steps.into_iter().map(|s| (s.id.clone(), s)).collect();
        Self { steps, order }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        validate_order(&self.steps, &self.order)
    }

    pub fn contains(&self, step_id: &str) -> bool {
        self.steps.contains_key(step_id)
    }

    pub fn ordered(&self) -> impl Iterator<Item = &AssistanceStep> {
        self.order.iter().filter_map(|id| self.steps.get(id))
    }

    pub fn update_step(&mut self, step_id: &str, patch: &StepPatch) -> Result<AssistanceStep, AppError> {
        update_in(&mut self.steps, step_id, patch)
    }
}

// Resposta de GET .../workflow/stages
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StageGroup {
    #[schema(example = 1)]
    pub stage: u8,
    pub steps: Vec<WorkflowStep>,
}

pub fn stage_groups(workflow: &WorkflowDefinition) -> Vec<StageGroup> {
    workflow
        .steps_by_stage()
        .into_iter()
        .map(|(stage, steps)| StageGroup { stage, steps })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn step(id: &str, stage: u8) -> WorkflowStep {
        WorkflowStep { id: id.into(), label: format!("Passo {id}"), stage, owner_role: Role::Seller, sla: 1 }
    }

    #[test]
    fn groups_by_stage_preserving_order() {
        let wf = WorkflowDefinition::from_steps(vec![step("1.1", 1), step("1.2", 1), step("2.1", 2)]);
        let grouped = wf.steps_by_stage();
        let ids = |stage: u8| grouped[&stage].iter().map(|s| s.id.as_str()).collect::<Vec<_>>();
        assert_eq!(grouped.len(), 2);
        assert_eq!(ids(1), vec!["1.1", "1.2"]);
        assert_eq!(ids(2), vec!["2.1"]);
    }

    #[test]
    fn grouping_follows_order_not_key_order() {
        let mut wf = WorkflowDefinition::from_steps(vec![step("1.1", 1), step("1.2", 1)]);
        wf.order = vec!["1.2".into(), "1.1".into()];
        let ids: Vec<_> = wf.steps_by_stage()[&1].iter().map(|s| s.id.clone()).collect();
        assert_eq!(ids, vec!["1.2", "1.1"]);
    }

    #[test]
    fn order_must_be_a_permutation() {
        let mut wf = WorkflowDefinition::from_steps(vec![step("1.1", 1), step("1.2", 1)]);
        assert!(wf.validate().is_ok());

        wf.order = vec!["1.1".into(), "1.1".into()];
        assert!(matches!(wf.validate(), Err(AppError::InvalidInput(_))));

        wf.order = vec!["1.1".into()];
        assert!(matches!(wf.validate(), Err(AppError::InvalidInput(_))));

        wf.order = vec!["1.1".into(), "1.2".into(), "7.7".into()];
        assert!(matches!(wf.validate(), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn stage_out_of_range_is_invalid() {
        let wf = WorkflowDefinition::from_steps(vec![step("0.1", 0)]);
        assert!(wf.validate().is_err());
        let wf = WorkflowDefinition::from_steps(vec![step("10.1", 10)]);
        assert!(wf.validate().is_err());
    }

    #[test]
    fn update_touches_only_owner_and_sla() {
        let mut wf = WorkflowDefinition::from_steps(vec![step("1.1", 1)]);
        let patch = StepPatch { owner_role: Some(Role::Manager), sla: Some(json!(5)) };
        let updated = wf.update_step("1.1", &patch).unwrap();
        assert_eq!(updated.owner_role, Role::Manager);
        assert_eq!(updated.sla, 5);
        assert_eq!(updated.label, "Passo 1.1");
        assert_eq!(updated.stage, 1);
    }

    #[test]
    fn update_unknown_step_fails() {
        let mut wf = WorkflowDefinition::from_steps(vec![step("1.1", 1)]);
        let err = wf.update_step("9.9", &StepPatch::default()).unwrap_err();
        assert!(matches!(err, AppError::UnknownStep(id) if id == "9.9"));
    }

    #[test]
    fn sla_is_normalized() {
        assert_eq!(normalize_sla(&json!(4)), 4);
        assert_eq!(normalize_sla(&json!(3.9)), 3);
        assert_eq!(normalize_sla(&json!(-2)), 0);
        assert_eq!(normalize_sla(&json!("7")), 7);
        assert_eq!(normalize_sla(&json!("12 dias")), 12);
        assert_eq!(normalize_sla(&json!("1.2.3")), 1);
        assert_eq!(normalize_sla(&json!("4.5 horas")), 4);
        assert_eq!(normalize_sla(&json!("-3")), 0);
        assert_eq!(normalize_sla(&json!("abc")), 0);
        assert_eq!(normalize_sla(&json!("")), 0);
        assert_eq!(normalize_sla(&Value::Null), 0);
        assert_eq!(normalize_sla(&json!(true)), 0);
    }
}
