// src/models/roles.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::common::error::AppError;

// ---
// Registro de Cargos
// ---
// Vocabulário fechado, compartilhado por todas as lojas. Cargos não são
// criados nem apagados em tempo de execução.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub enum Role {
    Seller,
    Designer,
    Measurer,
    Releaser,
    Finance,
    Logistics,
    Assembler,
    AssemblyCoordinator,
    Manager,
    Admin,
    Owner,
}

/// Ordem estável usada pela UI e pela semeadura das permissões padrão.
pub const ALL_ROLES: [Role; 11] = [
    Role::Seller,
    Role::Designer,
    Role::Measurer,
    Role::Releaser,
    Role::Finance,
    Role::Logistics,
    Role::Assembler,
    Role::AssemblyCoordinator,
    Role::Manager,
    Role::Admin,
    Role::Owner,
];

/// listRoles()
pub fn list_roles() -> &'static [Role] {
    &ALL_ROLES
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Seller => "Seller",
            Role::Designer => "Designer",
            Role::Measurer => "Measurer",
            Role::Releaser => "Releaser",
            Role::Finance => "Finance",
            Role::Logistics => "Logistics",
            Role::Assembler => "Assembler",
            Role::AssemblyCoordinator => "AssemblyCoordinator",
            Role::Manager => "Manager",
            Role::Admin => "Admin",
            Role::Owner => "Owner",
        }
    }

    /// Nome exibido na tela de configuração.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Seller => "Vendedor",
            Role::Designer => "Projetista",
            Role::Measurer => "Medidor",
            Role::Releaser => "Liberador",
            Role::Finance => "Financeiro",
            Role::Logistics => "Logística",
            Role::Assembler => "Montador",
            Role::AssemblyCoordinator => "Coordenador de Montagem",
            Role::Manager => "Gerente",
            Role::Admin => "Administrador",
            Role::Owner => "Proprietário",
        }
    }

    /// Cargos que podem editar a configuração da loja.
    pub fn is_config_admin(&self) -> bool {
        matches!(self, Role::Admin | Role::Owner)
    }

    /// Cargo de maior privilégio, atribuído ao administrador criado com a loja.
    pub fn highest() -> Role {
        Role::Owner
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    // Aceita o nome canônico sem diferenciar maiúsculas
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ALL_ROLES
            .iter()
            .copied()
            .find(|role| role.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| AppError::UnknownRole(s.to_string()))
    }
}

// Resposta de GET /api/roles
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleEntry {
    #[schema(example = "Seller")]
    pub role: Role,
    #[schema(example = "Vendedor")]
    pub label: String,
}

impl From<Role> for RoleEntry {
    fn from(role: Role) -> Self {
        Self { role, label: role.label().to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn registry_has_no_duplicates() {
        let unique: HashSet<Role> = list_roles().iter().copied().collect();
        assert_eq!(unique.len(), list_roles().len());
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("assemblycoordinator".parse::<Role>().unwrap(), Role::AssemblyCoordinator);
        assert_eq!(" Owner ".parse::<Role>().unwrap(), Role::Owner);
    }

    #[test]
    fn unknown_role_is_rejected() {
        let err = "Janitor".parse::<Role>().unwrap_err();
        assert!(matches!(err, AppError::UnknownRole(name) if name == "Janitor"));
    }

    #[test]
    fn round_trips_through_display() {
        for role in list_roles() {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), *role);
        }
    }
}
