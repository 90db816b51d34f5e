// src/models/settings.rs

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::common::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum HolidayType {
    /// Mesmo dia/mês todo ano
    Fixed,
    /// Data móvel (Carnaval, Corpus Christi...): vale só para `year`
    Movable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Holiday {
    #[schema(example = "2024-12-25")]
    pub date: NaiveDate,
    #[schema(example = "Natal")]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: HolidayType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = 2025)]
    pub year: Option<i32>,
}

impl Holiday {
    // Chave de unicidade: (data, tipo, ano)
    fn key(&self) -> (NaiveDate, HolidayType, Option<i32>) {
        (self.date, self.kind, self.year)
    }

    fn describe(&self) -> String {
        match self.year {
            Some(year) => format!("{} ({:?}, {})", self.date, self.kind, year),
            None => format!("{} ({:?})", self.date, self.kind),
        }
    }

    pub fn falls_on(&self, day: NaiveDate) -> bool {
        match self.kind {
            HolidayType::Fixed => self.date.month() == day.month() && self.date.day() == day.day(),
            HolidayType::Movable => self.date == day && self.year.is_none_or(|y| y == day.year()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WhatsAppIntegration {
    pub enabled: bool,
    #[schema(example = "https://api.whatsapp.example.com")]
    pub api_url: Option<String>,
    #[schema(example = "loja-centro")]
    pub instance: Option<String>,
    // Armazenado como veio (sem criptografia)
    pub token: Option<String>,
}

// ---
// Configurações da empresa (parte do pacote de configuração da loja)
// ---
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanySettings {
    #[schema(example = "Minha Loja Ltda")]
    pub company_name: Option<String>,
    #[schema(example = "12.345.678/0001-99")]
    pub document_number: Option<String>,
    #[schema(example = "Rua das Flores, 123 - Centro")]
    pub address: Option<String>,
    #[schema(example = "(11) 99999-8888")]
    pub phone: Option<String>,
    #[schema(example = "contato@minhaloja.com")]
    pub email: Option<String>,
    // URL devolvida pelo serviço de upload (externo)
    pub logo_url: Option<String>,
    pub holidays: Vec<Holiday>,
    pub whatsapp: WhatsAppIntegration,
}

impl CompanySettings {
    /// Rejeita um segundo feriado com o mesmo (data, tipo, ano).
    pub fn add_holiday(&mut self, holiday: Holiday) -> Result<(), AppError> {
        if holiday.name.trim().is_empty() {
            return Err(AppError::InvalidInput("o nome do feriado é obrigatório".into()));
        }
        if holiday.kind == HolidayType::Movable && holiday.year.is_none() {
            return Err(AppError::InvalidInput("feriados móveis exigem o ano".into()));
        }
        if self.holidays.iter().any(|h| h.key() == holiday.key()) {
            return Err(AppError::DuplicateHoliday(holiday.describe()));
        }
        self.holidays.push(holiday);
        Ok(())
    }

    /// Retorna se algum feriado foi removido.
    pub fn remove_holiday(&mut self, date: NaiveDate, kind: HolidayType, year: Option<i32>) -> bool {
        let before = self.holidays.len();
        self.holidays.retain(|h| h.key() != (date, kind, year));
        before != self.holidays.len()
    }

    pub fn is_holiday(&self, day: NaiveDate) -> bool {
        self.holidays.iter().any(|h| h.falls_on(day))
    }

    pub fn apply(&mut self, patch: UpdateCompanySettings) {
        let UpdateCompanySettings { company_name, document_number, address, phone, email, logo_url, whatsapp } = patch;
        if company_name.is_some() {
            self.company_name = company_name;
        }
        if document_number.is_some() {
            self.document_number = document_number;
        }
        if address.is_some() {
            self.address = address;
        }
        if phone.is_some() {
            self.phone = phone;
        }
        if email.is_some() {
            self.email = email;
        }
        if logo_url.is_some() {
            self.logo_url = logo_url;
        }
        if let Some(whatsapp) = whatsapp {
            self.whatsapp = whatsapp;
        }
    }
}

// Feriados e origens têm operações próprias; aqui só os campos simples
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCompanySettings {
    #[validate(length(min = 1, message = "O nome da empresa não pode ficar vazio."))]
    #[schema(example = "Minha Nova Loja")]
    pub company_name: Option<String>,
    pub document_number: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,
    pub logo_url: Option<String>,
    pub whatsapp: Option<WhatsAppIntegration>,
}

/// Normaliza a lista de origens de clientes: apara espaços, descarta vazios
/// e repetições (sem diferenciar maiúsculas), mantendo a primeira ocorrência.
pub fn normalize_origins(origins: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    origins
        .into_iter()
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .filter(|o| seen.insert(o.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn christmas() -> Holiday {
        Holiday { date: date("2024-12-25"), name: "Natal".into(), kind: HolidayType::Fixed, year: None }
    }

    #[test]
    fn duplicate_holiday_is_rejected() {
        let mut settings = CompanySettings::default();
        settings.add_holiday(christmas()).unwrap();
        let err = settings.add_holiday(christmas()).unwrap_err();
        assert!(matches!(err, AppError::DuplicateHoliday(_)));
        assert_eq!(settings.holidays.len(), 1);
    }

    #[test]
    fn same_date_different_type_is_allowed() {
        let mut settings = CompanySettings::default();
        settings.add_holiday(christmas()).unwrap();
        let movable = Holiday { kind: HolidayType::Movable, year: Some(2024), ..christmas() };
        settings.add_holiday(movable).unwrap();
        assert_eq!(settings.holidays.len(), 2);
    }

    #[test]
    fn movable_requires_year() {
        let mut settings = CompanySettings::default();
        let carnaval = Holiday { date: date("2025-03-04"), name: "Carnaval".into(), kind: HolidayType::Movable, year: None };
        assert!(matches!(settings.add_holiday(carnaval), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn fixed_holidays_repeat_every_year() {
        let mut settings = CompanySettings::default();
        settings.add_holiday(christmas()).unwrap();
        settings
            .add_holiday(Holiday { date: date("2025-03-04"), name: "Carnaval".into(), kind: HolidayType::Movable, year: Some(2025) })
            .unwrap();
        assert!(settings.is_holiday(date("2031-12-25")));
        assert!(settings.is_holiday(date("2025-03-04")));
        assert!(!settings.is_holiday(date("2026-03-04")));
    }

    #[test]
    fn remove_holiday_by_key() {
        let mut settings = CompanySettings::default();
        settings.add_holiday(christmas()).unwrap();
        assert!(!settings.remove_holiday(date("2024-12-25"), HolidayType::Fixed, Some(2024)));
        assert!(settings.remove_holiday(date("2024-12-25"), HolidayType::Fixed, None));
        assert!(settings.holidays.is_empty());
    }

    #[test]
    fn holiday_serializes_type_tag() {
        let json = serde_json::to_value(christmas()).unwrap();
        assert_eq!(json["type"], "fixed");
        assert!(json.get("year").is_none());
    }

    #[test]
    fn origins_are_normalized() {
        let origins = normalize_origins(vec![" Instagram ".into(), "".into(), "instagram".into(), "Google".into()]);
        assert_eq!(origins, vec!["Instagram", "Google"]);
    }

    #[test]
    fn patch_keeps_unset_fields() {
        let mut settings = CompanySettings { phone: Some("1234".into()), ..Default::default() };
        settings.apply(UpdateCompanySettings { company_name: Some("Nova".into()), ..Default::default() });
        assert_eq!(settings.company_name.as_deref(), Some("Nova"));
        assert_eq!(settings.phone.as_deref(), Some("1234"));
    }
}
