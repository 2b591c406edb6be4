//! Modelo de MaintenanceRecord
//!
//! Un registro de servicio fechado con costo y descripción libre.
//! Pertenece exclusivamente a un vehículo.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::utils::validation::{
    coerce_number, date_from_value, format_brl, format_date_br, now_millis, parse_date,
    InputWarning, Sanitized, INVALID_DATE_LABEL,
};

/// Registro de mantenimiento
#[derive(Debug, Clone, PartialEq)]
pub struct MaintenanceRecord {
    pub id: String,
    pub date: Option<DateTime<Utc>>,
    pub kind: String,
    pub cost: f64,
    pub description: String,
}

/// Forma persistida `{id, date, type, cost, description}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceData {
    pub id: String,
    pub date: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub cost: f64,
    pub description: String,
}

impl MaintenanceRecord {
    /// Construir desde entrada de formulario, corrigiendo fecha y costo inválidos
    pub fn new(date: &str, kind: &str, cost: f64, description: Option<&str>) -> Self {
        Self::sanitized(date, kind, cost, description).logged("MaintenanceRecord")
    }

    pub fn sanitized(
        date: &str,
        kind: &str,
        cost: f64,
        description: Option<&str>,
    ) -> Sanitized<Self> {
        let mut warnings = Vec::new();

        let date = match parse_date(date) {
            Some(date) => date,
            None => {
                warnings.push(InputWarning::InvalidDate { input: date.to_string() });
                now_millis()
            }
        };

        let cost = if cost.is_finite() && cost >= 0.0 {
            cost
        } else {
            warnings.push(InputWarning::InvalidCost { input: cost.to_string() });
            0.0
        };

        let record = Self {
            id: Uuid::new_v4().to_string(),
            date: Some(date),
            kind: kind.trim().to_string(),
            cost,
            description: description.map(str::trim).unwrap_or_default().to_string(),
        };

        Sanitized::with_warnings(record, warnings)
    }

    /// Construir desde JSON de formulario, donde el costo puede venir como texto
    pub fn from_form(
        date: &str,
        kind: &str,
        cost: &Value,
        description: Option<&str>,
    ) -> Sanitized<Self> {
        match coerce_number(cost) {
            Some(number) => Self::sanitized(date, kind, number, description),
            None if cost.is_null() => Self::sanitized(date, kind, 0.0, description),
            None => {
                let mut built = Self::sanitized(date, kind, 0.0, description);
                built.warnings.push(InputWarning::InvalidCost { input: cost.to_string() });
                built
            }
        }
    }

    /// Fecha válida, tipo no vacío y costo no negativo
    pub fn is_valid(&self) -> bool {
        self.date.is_some()
            && !self.kind.trim().is_empty()
            && self.cost.is_finite()
            && self.cost >= 0.0
    }

    /// `tipo em dd/mm/aaaa - R$ x,yy (descrição)`
    pub fn format(&self) -> String {
        let Some(date) = self.date.as_ref() else {
            return INVALID_DATE_LABEL.to_string();
        };

        let mut text = format!("{} em {}", self.kind, format_date_br(Some(date)));
        if self.cost > 0.0 {
            text.push_str(" - ");
            text.push_str(&format_brl(self.cost));
        }
        if !self.description.is_empty() {
            text.push_str(&format!(" ({})", self.description));
        }
        text
    }

    /// Costo formateado siempre presente, incluso `R$ 0,00`
    pub fn cost_label(&self) -> String {
        format_brl(self.cost)
    }

    pub fn is_after(&self, instant: &DateTime<Utc>) -> bool {
        self.date.map_or(false, |date| date > *instant)
    }

    pub fn serialize(&self) -> MaintenanceData {
        MaintenanceData {
            id: self.id.clone(),
            date: self.date.map(|date| date.to_rfc3339_opts(SecondsFormat::Millis, true)),
            kind: self.kind.clone(),
            cost: self.cost,
            description: self.description.clone(),
        }
    }

    /// Reconstruir desde un registro plano; `None` si faltan campos o no es válido
    pub fn reconstruct(data: &Value) -> Option<Self> {
        let object = data.as_object()?;
        let date = date_from_value(object.get("date")?)?;
        let kind = object.get("type")?.as_str()?;

        let record = Self {
            id: object
                .get("id")
                .and_then(Value::as_str)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            date: Some(date),
            kind: kind.trim().to_string(),
            cost: object
                .get("cost")
                .and_then(coerce_number)
                .filter(|cost| *cost >= 0.0)
                .unwrap_or(0.0),
            description: object
                .get("description")
                .and_then(Value::as_str)
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
        };

        record.is_valid().then_some(record)
    }

    /// Edición explícita: nuevos valores saneados, mismo id
    pub fn edited(
        &self,
        date: &str,
        kind: &str,
        cost: f64,
        description: Option<&str>,
    ) -> Sanitized<Self> {
        let id = self.id.clone();
        Self::sanitized(date, kind, cost, description).map(|mut record| {
            record.id = id;
            record
        })
    }
}

/// Orden más reciente primero; registros sin fecha al final
pub fn sort_newest_first(records: &mut [MaintenanceRecord]) {
    records.sort_by(|a, b| b.date.cmp(&a.date));
}
