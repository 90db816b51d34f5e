// src/services/defaults.rs
//
// Modelo padrão do sistema, compilado no binário. Versionado por
// TEMPLATE_VERSION; lojas novas e "restaurar padrão" usam exatamente isto.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::config::ConfigBundle;
use crate::models::permissions::{Capabilities, Capability, PermissionConfig};
use crate::models::roles::{list_roles, Role};
use crate::models::settings::{CompanySettings, Holiday, HolidayType};
use crate::models::workflow::{
    AssistanceStep, AssistanceWorkflow, WorkflowDefinition, WorkflowStep, MAX_STAGE, MIN_STAGE,
};

pub const TEMPLATE_VERSION: u32 = 1;

// Ano de referência dos feriados fixos (só dia/mês importam)
const HOLIDAY_REFERENCE_YEAR: i32 = 2024;

// (id, rótulo, etapa, cargo responsável, SLA em dias)
const MAIN_STEPS: &[(&str, &str, u8, Role, u32)] = &[
    ("1.1", "Cadastro do cliente", 1, Role::Seller, 1),
    ("1.2", "Orçamento", 1, Role::Seller, 3),
    ("1.3", "Fechamento do contrato", 1, Role::Seller, 2),
    ("2.1", "Projeto executivo", 2, Role::Designer, 5),
    ("2.2", "Aprovação do projeto", 2, Role::Designer, 2),
    ("3.1", "Agendamento da medição", 3, Role::Measurer, 2),
    ("3.2", "Medição técnica", 3, Role::Measurer, 3),
    ("4.1", "Conferência técnica", 4, Role::Releaser, 2),
    ("4.2", "Liberação para produção", 4, Role::Releaser, 1),
    ("5.1", "Conferência financeira", 5, Role::Finance, 2),
    ("5.2", "Pedido à fábrica", 5, Role::Finance, 1),
    ("6.1", "Acompanhamento da produção", 6, Role::Logistics, 20),
    ("6.2", "Recebimento da mercadoria", 6, Role::Logistics, 2),
    ("7.1", "Entrega ao cliente", 7, Role::Logistics, 2),
    ("7.2", "Agendamento da montagem", 7, Role::AssemblyCoordinator, 2),
    ("7.3", "Montagem", 7, Role::Assembler, 5),
    ("8.1", "Vistoria pós-montagem", 8, Role::AssemblyCoordinator, 3),
    ("8.2", "Ajustes finais", 8, Role::Assembler, 5),
    ("9.1", "Termo de entrega", 9, Role::Manager, 2),
    ("9.2", "Pesquisa de satisfação", 9, Role::Seller, 7),
];

const ASSISTANCE_STEPS: &[(&str, &str, Role, u32)] = &[
    ("AT.1", "Abertura do chamado", Role::Seller, 1),
    ("AT.2", "Visita técnica", Role::AssemblyCoordinator, 3),
    ("AT.3", "Solicitação de peças", Role::Finance, 5),
    ("AT.4", "Execução da assistência", Role::Assembler, 5),
    ("AT.5", "Encerramento", Role::Manager, 1),
];

const ORIGINS: &[&str] = &["Indicação", "Instagram", "Facebook", "Google", "Loja física", "Arquiteto", "Outros"];

// Feriados nacionais fixos
const NATIONAL_HOLIDAYS: &[(u32, u32, &str)] = &[
    (1, 1, "Confraternização Universal"),
    (4, 21, "Tiradentes"),
    (5, 1, "Dia do Trabalho"),
    (9, 7, "Independência do Brasil"),
    (10, 12, "Nossa Senhora Aparecida"),
    (11, 2, "Finados"),
    (11, 15, "Proclamação da República"),
    (11, 20, "Dia da Consciência Negra"),
    (12, 25, "Natal"),
];

pub fn default_workflow() -> WorkflowDefinition {
    WorkflowDefinition::from_steps(
        MAIN_STEPS
            .iter()
            .map(|&(id, label, stage, owner_role, sla)| WorkflowStep {
                id: id.to_string(),
                label: label.to_string(),
                stage,
                owner_role,
                sla,
            })
            .collect(),
    )
}

pub fn default_assistance_workflow() -> AssistanceWorkflow {
    AssistanceWorkflow::from_steps(
        ASSISTANCE_STEPS
            .iter()
            .map(|&(id, label, owner_role, sla)| AssistanceStep {
                id: id.to_string(),
                label: label.to_string(),
                owner_role,
                sla,
            })
            .collect(),
    )
}

pub fn default_origins() -> Vec<String> {
    ORIGINS.iter().map(|o| o.to_string()).collect()
}

pub fn default_holidays() -> Vec<Holiday> {
    NATIONAL_HOLIDAYS
        .iter()
        .filter_map(|&(month, day, name)| {
            NaiveDate::from_ymd_opt(HOLIDAY_REFERENCE_YEAR, month, day).map(|date| Holiday {
                date,
                name: name.to_string(),
                kind: HolidayType::Fixed,
                year: None,
            })
        })
        .collect()
}

pub fn default_company_settings() -> CompanySettings {
    CompanySettings { holidays: default_holidays(), ..Default::default() }
}

fn default_capabilities(role: Role) -> Capabilities {
    use Capability::*;

    match role {
        Role::Owner | Role::Admin => Capabilities::all(),
        Role::Manager => {
            let mut caps = Capabilities::all();
            caps.set(ManageUsers, false);
            caps
        }
        Role::Seller => Capabilities::from_granted(&[
            Dashboard, Kanban, ViewClient, EditClient, EditProject, ViewAssistance, EditAssistance,
        ]),
        Role::Designer => Capabilities::from_granted(&[Kanban, ViewClient, EditProject]),
        Role::Measurer | Role::Releaser => Capabilities::from_granted(&[Kanban, ViewClient]),
        Role::Finance => Capabilities::from_granted(&[Dashboard, Kanban, ViewClient, ViewAssistance]),
        Role::Logistics => Capabilities::from_granted(&[Kanban, ViewClient, ViewAssembly]),
        Role::Assembler => {
            Capabilities::from_granted(&[Kanban, ViewAssembly, ViewPostAssembly, ViewAssistance])
        }
        Role::AssemblyCoordinator => Capabilities::from_granted(&[
            Kanban,
            ViewClient,
            ViewAssembly,
            EditAssembly,
            ViewPostAssembly,
            EditPostAssembly,
            ViewAssistance,
            EditAssistance,
        ]),
    }
}

/// Registro padrão de um cargo: vê as etapas onde é responsável por algum
/// passo e pode executar esses passos. Gestão vê e executa tudo.
pub fn default_permission(store_id: Uuid, role: Role) -> PermissionConfig {
    let workflow = default_workflow();
    let assistance = default_assistance_workflow();
    let full_access = matches!(role, Role::Owner | Role::Admin | Role::Manager);

    let (viewable_stages, actionable_steps): (BTreeSet<u8>, BTreeSet<String>) = if full_access {
        (
            (MIN_STAGE..=MAX_STAGE).collect(),
            workflow.order.iter().chain(&assistance.order).cloned().collect(),
        )
    } else {
        let owned_main = workflow.ordered().filter(|s| s.owner_role == role);
        let owned_assistance = assistance.ordered().filter(|s| s.owner_role == role);
        (
            workflow.ordered().filter(|s| s.owner_role == role).map(|s| s.stage).collect(),
            owned_main
                .map(|s| s.id.clone())
                .chain(owned_assistance.map(|s| s.id.clone()))
                .collect(),
        )
    };

    PermissionConfig {
        store_id,
        role,
        capabilities: default_capabilities(role),
        viewable_stages,
        actionable_steps,
    }
}

pub fn default_permissions(store_id: Uuid) -> Vec<PermissionConfig> {
    list_roles().iter().map(|role| default_permission(store_id, *role)).collect()
}

/// Pacote completo para uma loja recém-criada.
pub fn default_bundle(store_id: Uuid) -> ConfigBundle {
    ConfigBundle {
        template_version: TEMPLATE_VERSION,
        workflow: default_workflow(),
        assistance_workflow: default_assistance_workflow(),
        permissions: default_permissions(store_id),
        origins: default_origins(),
        company_settings: default_company_settings(),
    }
}
