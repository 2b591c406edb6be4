//! Modelos de Analytics
//!
//! Agregados derivados del estado en memoria del garage. Se recalculan en
//! cada consulta; no hay caché que mantener.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use super::garage::{AppointmentView, Garage};
use super::variants::VehicleType;
use super::vehicle::{Vehicle, VehicleStatus};
use crate::utils::validation::format_brl_decimal;

/// Costo acumulado de mantenimiento por vehículo
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleCost {
    pub vehicle_id: String,
    pub vehicle_label: String,
    pub records: usize,
    pub total: f64,
    pub total_label: String,
}

/// Resumen para el dashboard del garage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GarageStats {
    pub owner: String,
    pub vehicle_count: usize,
    pub type_counts: BTreeMap<VehicleType, usize>,
    pub status_counts: BTreeMap<VehicleStatus, usize>,
    pub maintenance_count: usize,
    pub total_maintenance_cost: f64,
    pub total_maintenance_cost_label: String,
    pub cost_by_vehicle: Vec<VehicleCost>,
    pub next_appointment: Option<AppointmentView>,
    pub upcoming: Vec<AppointmentView>,
    pub generated_at: DateTime<Utc>,
}

fn decimal_cost(vehicle: &Vehicle) -> Decimal {
    vehicle
        .maintenance_history()
        .iter()
        .filter_map(|record| Decimal::from_f64_retain(record.cost))
        .map(|cost| cost.round_dp(2))
        .sum()
}

impl GarageStats {
    pub fn compute(garage: &Garage, now: DateTime<Utc>) -> Self {
        let mut type_counts = BTreeMap::new();
        let mut status_counts = BTreeMap::new();
        let mut total = Decimal::ZERO;
        let mut cost_by_vehicle = Vec::with_capacity(garage.len());

        for vehicle in garage.vehicles() {
            *type_counts.entry(vehicle.vehicle_type()).or_insert(0) += 1;
            *status_counts.entry(vehicle.status()).or_insert(0) += 1;

            let vehicle_total = decimal_cost(vehicle);
            total += vehicle_total;
            cost_by_vehicle.push(VehicleCost {
                vehicle_id: vehicle.id().to_string(),
                vehicle_label: vehicle.label(),
                records: vehicle.maintenance_history().len(),
                total: vehicle_total.to_f64().unwrap_or_default(),
                total_label: format_brl_decimal(vehicle_total),
            });
        }

        let upcoming: Vec<AppointmentView> = garage
            .all_future_appointments(now)
            .iter()
            .map(AppointmentView::from)
            .collect();

        Self {
            owner: garage.owner().to_string(),
            vehicle_count: garage.len(),
            type_counts,
            status_counts,
            maintenance_count: garage
                .vehicles()
                .iter()
                .map(|v| v.maintenance_history().len())
                .sum(),
            total_maintenance_cost: total.to_f64().unwrap_or_default(),
            total_maintenance_cost_label: format_brl_decimal(total),
            cost_by_vehicle,
            next_appointment: upcoming.first().cloned(),
            upcoming,
            generated_at: now,
        }
    }

    /// Mapa id → costo total
    pub fn cost_map(&self) -> BTreeMap<&str, f64> {
        self.cost_by_vehicle
            .iter()
            .map(|cost| (cost.vehicle_id.as_str(), cost.total))
            .collect()
    }
}
