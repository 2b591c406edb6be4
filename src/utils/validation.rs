//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos,
//! coerción de valores de formularios/JSON y formateo pt-BR.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SubsecRound, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Primer año aceptado para un vehículo (Benz Patent-Motorwagen)
pub const MIN_VEHICLE_YEAR: i32 = 1886;

/// Sentinela mostrado cuando la fecha de un registro no es válida
pub const INVALID_DATE_LABEL: &str = "Data inválida";

/// Advertencias recuperables: la entrada se corrige y la operación continúa
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum InputWarning {
    #[error("Data inválida '{input}', usando a data atual")]
    InvalidDate { input: String },

    #[error("Custo inválido '{input}', usando R$ 0,00")]
    InvalidCost { input: String },

    #[error("Ano {year} fora do intervalo {min}-{max}, usando {replacement}")]
    YearOutOfRange { year: i64, min: i32, max: i32, replacement: i32 },

    #[error("Capacidade máxima inválida '{input}', usando {replacement}")]
    InvalidMaxLoad { input: String, replacement: u32 },

    #[error("Carga atual {requested} ajustada para {clamped}")]
    LoadClamped { requested: i64, clamped: u32 },
}

/// Valor saneado junto con las advertencias producidas al construirlo
#[derive(Debug, Clone, PartialEq)]
pub struct Sanitized<T> {
    pub value: T,
    pub warnings: Vec<InputWarning>,
}

impl<T> Sanitized<T> {
    pub fn clean(value: T) -> Self {
        Self { value, warnings: Vec::new() }
    }

    pub fn with_warnings(value: T, warnings: Vec<InputWarning>) -> Self {
        Self { value, warnings }
    }

    /// Emitir las advertencias en el log y devolver solo el valor
    pub fn logged(self, context: &str) -> T {
        for warning in &self.warnings {
            log::warn!("⚠️ {}: {}", context, warning);
        }
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sanitized<U> {
        Sanitized { value: f(self.value), warnings: self.warnings }
    }
}

/// Instante actual truncado a milisegundos (precisión de ISO 8601 con `.sssZ`)
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Convertir texto de formulario o JSON a instante UTC
///
/// Acepta RFC 3339, `YYYY-MM-DDTHH:MM[:SS[.f]]`, `YYYY-MM-DD` y `DD/MM/YYYY`.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc).trunc_subsecs(3));
    }

    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
    ];
    for format in FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&naive).trunc_subsecs(3));
        }
    }

    for format in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive));
        }
    }

    None
}

/// Convertir un valor JSON (string ISO o epoch en milisegundos) a instante UTC
pub fn date_from_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(text) => parse_date(text),
        Value::Number(number) => number
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    }
}

/// Coerción numérica: números JSON y strings numéricos
pub fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// Coerción a entero truncando la parte decimal
pub fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|n| n.is_finite()).map(|n| n.trunc() as i64)),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>().ok().or_else(|| {
                text.parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .map(|n| n.trunc() as i64)
            })
        }
        _ => None,
    }
}

/// Texto recortado no vacío
pub fn non_empty_trimmed(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Último año aceptado: año actual + 2 (modelos anticipados)
pub fn max_vehicle_year() -> i32 {
    use chrono::Datelike;
    Utc::now().year() + 2
}

/// Año dentro de `[1886, año actual + 2]`; fuera de rango se reemplaza por el año actual
pub fn sanitize_year(year: i64) -> Sanitized<i32> {
    use chrono::Datelike;
    let max = max_vehicle_year();
    if year >= i64::from(MIN_VEHICLE_YEAR) && year <= i64::from(max) {
        return Sanitized::clean(year as i32);
    }
    let replacement = Utc::now().year();
    Sanitized::with_warnings(
        replacement,
        vec![InputWarning::YearOutOfRange { year, min: MIN_VEHICLE_YEAR, max, replacement }],
    )
}

/// Formatear fecha como `dd/mm/aaaa`
pub fn format_date_br(date: Option<&DateTime<Utc>>) -> String {
    match date {
        Some(date) => date.format("%d/%m/%Y").to_string(),
        None => INVALID_DATE_LABEL.to_string(),
    }
}

/// Formatear un monto como moneda brasileña: `R$ 1.234,56`
pub fn format_brl(amount: f64) -> String {
    let decimal = Decimal::from_f64_retain(amount).unwrap_or_default();
    format_brl_decimal(decimal)
}

pub fn format_brl_decimal(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (integer, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    format!("{}R$ {},{}", if negative { "-" } else { "" }, grouped, fraction)
}
