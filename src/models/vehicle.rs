//! Modelo de Vehicle
//!
//! Registro base compartido por todas las variantes (identidad, año,
//! máquina de estados del motor e historial de mantenimiento) más la
//! carga útil de la variante en `kind`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::maintenance::{sort_newest_first, MaintenanceRecord};
use super::outcome::{Feedback, OperationResult, Refusal};
use super::variants::{Cargo, VehicleKind, VehicleType};
use crate::utils::validation::{non_empty_trimmed, sanitize_year, Sanitized};

/// Estado del motor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleStatus {
    Off,
    On,
    Moving,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Off => "off",
            VehicleStatus::On => "on",
            VehicleStatus::Moving => "moving",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "off" => Some(VehicleStatus::Off),
            "on" => Some(VehicleStatus::On),
            "moving" => Some(VehicleStatus::Moving),
            _ => None,
        }
    }
}

/// Fallo de construcción: no hay valor seguro para los campos de identidad
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VehicleError {
    #[error("Campo obrigatório ausente: {0}")]
    MissingField(&'static str),
}

/// Datos de entrada para crear un vehículo
#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub id: Option<String>,
    pub make: String,
    pub model: String,
    pub year: i64,
    pub kind: VehicleKind,
}

/// Vehículo de la flota
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    id: String,
    make: String,
    model: String,
    year: i32,
    status: VehicleStatus,
    speed: f64,
    maintenance_history: Vec<MaintenanceRecord>,
    kind: VehicleKind,
}

impl Vehicle {
    /// Construcción validada; marca/modelo vacíos son un error, el año se corrige
    pub fn build(input: NewVehicle) -> Result<Sanitized<Self>, VehicleError> {
        let make = non_empty_trimmed(&input.make).ok_or(VehicleError::MissingField("make"))?;
        let model = non_empty_trimmed(&input.model).ok_or(VehicleError::MissingField("model"))?;
        let id = input
            .id
            .as_deref()
            .and_then(non_empty_trimmed)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Ok(sanitize_year(input.year).map(|year| Self {
            id,
            make,
            model,
            year,
            status: VehicleStatus::Off,
            speed: 0.0,
            maintenance_history: Vec::new(),
            kind: input.kind,
        }))
    }

    pub fn new(
        make: &str,
        model: &str,
        year: i64,
        kind: VehicleKind,
    ) -> Result<Self, VehicleError> {
        let built = Self::build(NewVehicle {
            id: None,
            make: make.to_string(),
            model: model.to_string(),
            year,
            kind,
        })?;
        Ok(built.logged("Vehicle"))
    }

    pub fn car(make: &str, model: &str, year: i64) -> Result<Self, VehicleError> {
        Self::new(make, model, year, VehicleKind::Car)
    }

    pub fn sports_car(
        make: &str,
        model: &str,
        year: i64,
        turbo_on: bool,
    ) -> Result<Self, VehicleError> {
        Self::new(make, model, year, VehicleKind::SportsCar { turbo_on })
    }

    pub fn truck(
        make: &str,
        model: &str,
        year: i64,
        max_load: Option<i64>,
        current_load: Option<i64>,
    ) -> Result<Self, VehicleError> {
        let cargo = Cargo::new(max_load, current_load).logged("Truck");
        Self::new(make, model, year, VehicleKind::Truck(cargo))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn make(&self) -> &str {
        &self.make
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn status(&self) -> VehicleStatus {
        self.status
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn kind(&self) -> &VehicleKind {
        &self.kind
    }

    pub fn vehicle_type(&self) -> VehicleType {
        self.kind.vehicle_type()
    }

    pub fn maintenance_history(&self) -> &[MaintenanceRecord] {
        &self.maintenance_history
    }

    pub fn label(&self) -> String {
        self.to_string()
    }

    /// Restaurar estado de movimiento desde un registro persistido
    ///
    /// Con el motor apagado la velocidad siempre es 0.
    pub(crate) fn restore_motion(&mut self, status: VehicleStatus, speed: f64) {
        self.status = status;
        self.speed = if status == VehicleStatus::Off || !speed.is_finite() {
            0.0
        } else {
            speed.max(0.0)
        };
    }

    pub(crate) fn restore_history(&mut self, records: Vec<MaintenanceRecord>) {
        self.maintenance_history = records;
        sort_newest_first(&mut self.maintenance_history);
    }

    pub fn start(&mut self) -> OperationResult {
        if self.status != VehicleStatus::Off {
            return Err(Refusal::AlreadyOn);
        }
        self.status = VehicleStatus::On;
        self.speed = 0.0;
        Ok(Feedback::Started)
    }

    pub fn stop(&mut self) -> OperationResult {
        if self.status == VehicleStatus::Off {
            return Err(Refusal::AlreadyOff);
        }
        if self.speed > 0.0 {
            return Err(Refusal::MustBrakeFirst);
        }
        self.status = VehicleStatus::Off;
        self.speed = 0.0;
        Ok(Feedback::Stopped)
    }

    /// Precondición común a todas las variantes: sondeo con delta 0
    fn ensure_can_accelerate(&mut self) -> Result<(), Refusal> {
        self.apply_acceleration(0.0).map(|_| ())
    }

    fn apply_acceleration(&mut self, delta: f64) -> OperationResult {
        if self.status == VehicleStatus::Off {
            return Err(Refusal::EngineOff);
        }
        if !delta.is_finite() || delta < 0.0 {
            return Err(Refusal::invalid_amount(delta));
        }
        if self.status == VehicleStatus::On && delta > 0.0 {
            self.status = VehicleStatus::Moving;
        }
        self.speed += delta;
        Ok(Feedback::Accelerated { speed: self.speed })
    }

    fn apply_braking(&mut self, delta: f64) -> OperationResult {
        if self.status != VehicleStatus::Moving {
            return Err(Refusal::NotMoving);
        }
        if !delta.is_finite() || delta <= 0.0 {
            return Err(Refusal::invalid_amount(delta));
        }
        self.speed -= delta;
        if self.speed <= 0.0 {
            self.speed = 0.0;
            self.status = VehicleStatus::On;
            return Ok(Feedback::Halted);
        }
        Ok(Feedback::Braked { speed: self.speed })
    }

    /// Acelerar `delta` (o el delta por defecto de la variante)
    ///
    /// El delta efectivo es `delta × factor`, donde el factor sale del turbo
    /// o de la carga actual.
    pub fn accelerate(&mut self, delta: Option<f64>) -> OperationResult {
        let delta = delta.unwrap_or_else(|| self.kind.motion_profile().accelerate_delta);
        if delta.is_nan() || delta < 0.0 {
            return Err(Refusal::invalid_amount(delta));
        }
        self.ensure_can_accelerate()?;
        let effective = delta * self.kind.acceleration_factor();
        self.apply_acceleration(effective)
    }

    pub fn brake(&mut self, delta: Option<f64>) -> OperationResult {
        let delta = delta.unwrap_or_else(|| self.kind.motion_profile().brake_delta);
        if self.status != VehicleStatus::Moving {
            return Err(Refusal::NotMoving);
        }
        if delta.is_nan() || delta <= 0.0 {
            return Err(Refusal::invalid_amount(delta));
        }
        let effective = delta * self.kind.braking_factor();
        self.apply_braking(effective)
    }

    pub fn toggle_turbo(&mut self) -> OperationResult {
        self.require("toggle_turbo", self.kind.capabilities().turbo)?;
        if self.status == VehicleStatus::Off {
            return Err(Refusal::EngineOff);
        }
        if let VehicleKind::SportsCar { turbo_on } = &mut self.kind {
            *turbo_on = !*turbo_on;
        }
        Ok(Feedback::TurboToggled { turbo_on: self.kind.turbo_on().unwrap_or(false) })
    }

    pub fn load_cargo(&mut self, amount: i64) -> OperationResult {
        let cargo = self.cargo_mut("load_cargo")?;
        let amount = positive_amount(amount)?;
        if !cargo.load(amount) {
            return Err(Refusal::CapacityExceeded { remaining: cargo.remaining() });
        }
        Ok(Feedback::CargoLoaded { current_load: cargo.current_load(), max_load: cargo.max_load() })
    }

    pub fn unload_cargo(&mut self, amount: i64) -> OperationResult {
        let cargo = self.cargo_mut("unload_cargo")?;
        let amount = positive_amount(amount)?;
        if !cargo.unload(amount) {
            return Err(Refusal::InsufficientLoad { current: cargo.current_load() });
        }
        Ok(Feedback::CargoUnloaded { current_load: cargo.current_load() })
    }

    fn cargo_mut(&mut self, operation: &'static str) -> Result<&mut Cargo, Refusal> {
        self.require(operation, self.kind.capabilities().cargo)?;
        let vehicle_type = self.vehicle_type().as_str();
        self.kind
            .cargo_mut()
            .ok_or(Refusal::Unsupported { operation, vehicle_type })
    }

    /// Rechazo `Unsupported` según la tabla de capacidades de la variante
    fn require(&self, operation: &'static str, supported: bool) -> Result<(), Refusal> {
        if supported {
            return Ok(());
        }
        Err(Refusal::Unsupported { operation, vehicle_type: self.vehicle_type().as_str() })
    }

    pub fn add_maintenance(&mut self, record: MaintenanceRecord) -> OperationResult {
        if !record.is_valid() {
            return Err(Refusal::InvalidMaintenance);
        }
        let record_id = record.id.clone();
        self.maintenance_history.push(record);
        sort_newest_first(&mut self.maintenance_history);
        Ok(Feedback::MaintenanceAdded { record_id })
    }

    /// Reemplazar un registro conservando su id
    pub fn update_maintenance(
        &mut self,
        mut record: MaintenanceRecord,
        record_id: &str,
    ) -> OperationResult {
        if !record.is_valid() {
            return Err(Refusal::InvalidMaintenance);
        }
        let slot = self
            .maintenance_history
            .iter_mut()
            .find(|existing| existing.id == record_id)
            .ok_or_else(|| Refusal::MaintenanceNotFound { id: record_id.to_string() })?;
        record.id = record_id.to_string();
        *slot = record;
        sort_newest_first(&mut self.maintenance_history);
        Ok(Feedback::MaintenanceUpdated { record_id: record_id.to_string() })
    }

    pub fn remove_maintenance(&mut self, record_id: &str) -> OperationResult {
        let position = self
            .maintenance_history
            .iter()
            .position(|record| record.id == record_id)
            .ok_or_else(|| Refusal::MaintenanceNotFound { id: record_id.to_string() })?;
        self.maintenance_history.remove(position);
        Ok(Feedback::MaintenanceRemoved { record_id: record_id.to_string() })
    }

    pub fn find_maintenance(&self, record_id: &str) -> Option<&MaintenanceRecord> {
        self.maintenance_history.iter().find(|record| record.id == record_id)
    }

    /// Citas posteriores a `now`, de la más próxima a la más lejana
    ///
    /// El iterador es perezoso y `Clone`, así que puede recorrerse de nuevo.
    pub fn future_appointments_at(
        &self,
        now: DateTime<Utc>,
    ) -> impl Iterator<Item = &MaintenanceRecord> + Clone + '_ {
        self.maintenance_history
            .iter()
            .rev()
            .filter(move |record| record.is_after(&now))
    }

    pub fn future_appointments(&self) -> impl Iterator<Item = &MaintenanceRecord> + Clone + '_ {
        self.future_appointments_at(Utc::now())
    }

    pub fn total_maintenance_cost(&self) -> f64 {
        self.maintenance_history.iter().map(|record| record.cost).sum()
    }
}

fn positive_amount(amount: i64) -> Result<u32, Refusal> {
    if amount <= 0 {
        return Err(Refusal::invalid_amount(amount));
    }
    u32::try_from(amount).map_err(|_| Refusal::invalid_amount(amount))
}

impl fmt::Display for Vehicle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.make, self.model, self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn running_car() -> Vehicle {
        let mut car = Vehicle::car("Toyota", "Corolla", 2022).unwrap();
        car.start().unwrap();
        car
    }

    #[test]
    fn test_construction_requires_identity() {
        assert_eq!(Vehicle::car("", "Corolla", 2022), Err(VehicleError::MissingField("make")));
        assert_eq!(Vehicle::car("Toyota", "  ", 2022), Err(VehicleError::MissingField("model")));

        let car = Vehicle::car("  Toyota ", "Corolla", 2022).unwrap();
        assert_eq!(car.make(), "Toyota");
        assert_eq!(car.status(), VehicleStatus::Off);
        assert_eq!(car.speed(), 0.0);
        assert_eq!(car.vehicle_type(), VehicleType::Car);
    }

    #[test]
    fn test_year_out_of_range_is_replaced() {
        use chrono::Datelike;
        let built = Vehicle::build(NewVehicle {
            id: Some("fixed".into()),
            make: "Ford".into(),
            model: "T".into(),
            year: 1700,
            kind: VehicleKind::Car,
        })
        .unwrap();
        assert_eq!(built.value.year(), Utc::now().year());
        assert_eq!(built.value.id(), "fixed");
        assert_eq!(built.warnings.len(), 1);
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut car = running_car();
        let before = car.clone();
        assert_eq!(car.start(), Err(Refusal::AlreadyOn));
        assert_eq!(car, before);
    }

    #[test]
    fn test_scenario_accelerate_and_brake() {
        let mut car = running_car();
        assert_eq!(car.status(), VehicleStatus::On);

        assert_eq!(car.accelerate(Some(10.0)), Ok(Feedback::Accelerated { speed: 10.0 }));
        assert_eq!(car.status(), VehicleStatus::Moving);

        assert_eq!(car.brake(Some(15.0)), Ok(Feedback::Halted));
        assert_eq!(car.status(), VehicleStatus::On);
        assert_eq!(car.speed(), 0.0);
    }

    #[test]
    fn test_default_deltas() {
        let mut car = running_car();
        car.accelerate(None).unwrap();
        car.accelerate(None).unwrap();
        assert_eq!(car.speed(), 20.0);
        assert_eq!(car.brake(None), Ok(Feedback::Braked { speed: 5.0 }));
    }

    #[test]
    fn test_stop_rules() {
        let mut car = running_car();
        car.accelerate(Some(5.0)).unwrap();
        assert_eq!(car.stop(), Err(Refusal::MustBrakeFirst));
        car.brake(Some(5.0)).unwrap();
        assert_eq!(car.stop(), Ok(Feedback::Stopped));
        assert_eq!(car.stop(), Err(Refusal::AlreadyOff));
    }

    #[test]
    fn test_refusals_leave_state_untouched() {
        let mut car = Vehicle::car("Fiat", "Uno", 2010).unwrap();
        assert_eq!(car.accelerate(Some(10.0)), Err(Refusal::EngineOff));
        assert_eq!(car.brake(Some(10.0)), Err(Refusal::NotMoving));

        car.start().unwrap();
        let before = car.clone();
        assert!(matches!(car.accelerate(Some(f64::NAN)), Err(Refusal::InvalidAmount { .. })));
        assert!(matches!(car.accelerate(Some(-1.0)), Err(Refusal::InvalidAmount { .. })));
        assert_eq!(car.brake(Some(5.0)), Err(Refusal::NotMoving));
        assert_eq!(car, before);

        car.accelerate(Some(10.0)).unwrap();
        assert!(matches!(car.brake(Some(0.0)), Err(Refusal::InvalidAmount { .. })));
        assert!(matches!(car.brake(Some(-3.0)), Err(Refusal::InvalidAmount { .. })));
        assert_eq!(car.speed(), 10.0);
        assert_eq!(car.status(), VehicleStatus::Moving);
    }

    #[test]
    fn test_zero_acceleration_keeps_status_on() {
        let mut car = running_car();
        assert_eq!(car.accelerate(Some(0.0)), Ok(Feedback::Accelerated { speed: 0.0 }));
        assert_eq!(car.status(), VehicleStatus::On);

        let mut sports = Vehicle::sports_car("Porsche", "911", 2023, false).unwrap();
        sports.start().unwrap();
        sports.toggle_turbo().unwrap();
        assert_eq!(sports.accelerate(Some(0.0)), Ok(Feedback::Accelerated { speed: 0.0 }));
        assert_eq!((sports.status(), sports.speed()), (VehicleStatus::On, 0.0));

        let mut truck = Vehicle::truck("Scania", "R450", 2021, Some(1000), Some(600)).unwrap();
        truck.start().unwrap();
        assert!(truck.kind().acceleration_factor() < 1.0);
        assert_eq!(truck.accelerate(Some(0.0)), Ok(Feedback::Accelerated { speed: 0.0 }));
        assert_eq!((truck.status(), truck.speed()), (VehicleStatus::On, 0.0));
    }

    #[test]
    fn test_turbo_multiplier() {
        let mut sports = Vehicle::sports_car("Porsche", "911", 2023, false).unwrap();
        assert_eq!(sports.toggle_turbo(), Err(Refusal::EngineOff));
        sports.start().unwrap();
        assert_eq!(sports.toggle_turbo(), Ok(Feedback::TurboToggled { turbo_on: true }));
        sports.accelerate(Some(15.0)).unwrap();
        assert!((sports.speed() - 27.0).abs() < 1e-9);

        sports.toggle_turbo().unwrap();
        sports.accelerate(None).unwrap();
        assert!((sports.speed() - 42.0).abs() < 1e-9);
    }

    #[test]
    fn test_unsupported_operations() {
        let mut car = running_car();
        let before = car.clone();
        let unsupported = |outcome: OperationResult| match outcome {
            Err(Refusal::Unsupported {
                operation,
                vehicle_type,
            }) => Some((operation, vehicle_type)),
            _ => None,
        };
        assert_eq!(unsupported(car.toggle_turbo()), Some(("toggle_turbo", "Car")));
        assert_eq!(unsupported(car.load_cargo(10)), Some(("load_cargo", "Car")));
        assert_eq!(unsupported(car.unload_cargo(10)), Some(("unload_cargo", "Car")));
        assert_eq!(car, before);

        let mut truck = Vehicle::truck("Ford", "F150", 2020, Some(1000), None).unwrap();
        assert_eq!(unsupported(truck.toggle_turbo()), Some(("toggle_turbo", "Truck")));

        let mut sports = Vehicle::sports_car("Porsche", "911", 2023, false).unwrap();
        assert_eq!(unsupported(sports.load_cargo(1)), Some(("load_cargo", "SportsCar")));
    }

    #[test]
    fn test_truck_cargo_and_penalties() {
        let mut truck = Vehicle::truck("Ford", "F150", 2020, Some(1000), None).unwrap();
        assert_eq!(truck.load_cargo(1200), Err(Refusal::CapacityExceeded { remaining: 1000 }));
        assert!(truck.load_cargo(800).is_ok());
        assert_eq!(truck.load_cargo(300), Err(Refusal::CapacityExceeded { remaining: 200 }));
        assert_eq!(truck.kind().cargo().unwrap().current_load(), 800);
        assert!(matches!(truck.load_cargo(0), Err(Refusal::InvalidAmount { .. })));
        assert_eq!(truck.unload_cargo(900), Err(Refusal::InsufficientLoad { current: 800 }));

        truck.start().unwrap();
        truck.accelerate(Some(15.0)).unwrap();
        let factor = 1.0 - 800.0 / 1500.0;
        assert!((truck.speed() - 15.0 * factor).abs() < 1e-9);

        let before = truck.speed();
        truck.brake(Some(2.0)).unwrap();
        assert!((truck.speed() - (before - 2.0 * 0.6)).abs() < 1e-9);
    }

    #[test]
    fn test_maintenance_history_sorted() {
        let mut car = Vehicle::car("Honda", "Civic", 2019).unwrap();
        let old = MaintenanceRecord::new("2022-01-01", "Óleo", 100.0, None);
        let new = MaintenanceRecord::new("2024-01-01", "Pneus", 800.0, None);
        car.add_maintenance(old.clone()).unwrap();
        car.add_maintenance(new.clone()).unwrap();
        assert_eq!(car.maintenance_history()[0].id, new.id);
        assert_eq!(car.total_maintenance_cost(), 900.0);

        let invalid = MaintenanceRecord::new("2024-01-01", "", 10.0, None);
        assert_eq!(car.add_maintenance(invalid), Err(Refusal::InvalidMaintenance));
        assert_eq!(car.maintenance_history().len(), 2);
    }

    #[test]
    fn test_update_and_remove_maintenance() {
        let mut car = Vehicle::car("Honda", "Civic", 2019).unwrap();
        let first = MaintenanceRecord::new("2022-01-01", "Óleo", 100.0, None);
        let second = MaintenanceRecord::new("2023-01-01", "Filtro", 50.0, None);
        car.add_maintenance(first.clone()).unwrap();
        car.add_maintenance(second.clone()).unwrap();

        let edited = first.edited("2025-06-01", "Óleo sintético", 180.0, None).value;
        car.update_maintenance(edited, &first.id).unwrap();
        assert_eq!(car.maintenance_history()[0].id, first.id);
        assert_eq!(car.find_maintenance(&first.id).unwrap().cost, 180.0);

        assert!(matches!(
            car.update_maintenance(second.clone(), "missing"),
            Err(Refusal::MaintenanceNotFound { .. })
        ));
        car.remove_maintenance(&second.id).unwrap();
        assert_eq!(car.maintenance_history().len(), 1);
        assert!(car.remove_maintenance(&second.id).is_err());
    }

    #[test]
    fn test_future_appointments_soonest_first() {
        let now = Utc::now();
        let mut car = Vehicle::car("VW", "Gol", 2015).unwrap();
        for days in [30, -10, 5, 90] {
            let date = (now + Duration::days(days)).to_rfc3339();
            car.add_maintenance(MaintenanceRecord::new(&date, &format!("d{}", days), 0.0, None))
                .unwrap();
        }

        let upcoming = car.future_appointments_at(now);
        let kinds: Vec<_> = upcoming.clone().map(|r| r.kind.as_str()).collect();
        assert_eq!(kinds, vec!["d5", "d30", "d90"]);
        assert_eq!(upcoming.count(), 3);
    }

    #[test]
    fn test_restore_motion_enforces_off_speed() {
        let mut car = Vehicle::car("VW", "Gol", 2015).unwrap();
        car.restore_motion(VehicleStatus::Off, 40.0);
        assert_eq!(car.speed(), 0.0);
        car.restore_motion(VehicleStatus::Moving, 40.0);
        assert_eq!(car.speed(), 40.0);
    }

    #[test]
    fn test_display() {
        let car = Vehicle::car("Toyota", "Corolla", 2022).unwrap();
        assert_eq!(car.to_string(), "Toyota Corolla (2022)");
    }
}
