//! Variantes de vehículo
//!
//! `VehicleKind` es el tipo suma cerrado (Vehicle, Car, SportsCar, Truck).
//! El comportamiento específico de cada variante se resuelve con una tabla
//! explícita de capacidades y perfiles de movimiento.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::utils::validation::{InputWarning, Sanitized};

/// Multiplicador de aceleración con turbo activo
pub const TURBO_MULTIPLIER: f64 = 1.8;

/// Capacidad por defecto de un camión (kg)
pub const DEFAULT_MAX_LOAD: u32 = 1000;

/// Discriminante `_type` del registro serializado
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VehicleType {
    Vehicle,
    Car,
    SportsCar,
    Truck,
}

impl VehicleType {
    pub const ALL: [VehicleType; 4] = [
        VehicleType::Vehicle,
        VehicleType::Car,
        VehicleType::SportsCar,
        VehicleType::Truck,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Vehicle => "Vehicle",
            VehicleType::Car => "Car",
            VehicleType::SportsCar => "SportsCar",
            VehicleType::Truck => "Truck",
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVehicleType(pub String);

impl FromStr for VehicleType {
    type Err = UnknownVehicleType;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        VehicleType::ALL
            .into_iter()
            .find(|vehicle_type| vehicle_type.as_str() == tag)
            .ok_or_else(|| UnknownVehicleType(tag.to_string()))
    }
}

/// Estado de carga de un camión; `current_load <= max_load` siempre
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cargo {
    max_load: u32,
    current_load: u32,
}

impl Cargo {
    /// Capacidad inválida o ausente pasa a 1000; la carga se recorta a `[0, max_load]`
    pub fn new(max_load: Option<i64>, current_load: Option<i64>) -> Sanitized<Self> {
        let mut warnings = Vec::new();

        let max_load = match max_load {
            Some(value) if value > 0 && value <= i64::from(u32::MAX) => value as u32,
            None => DEFAULT_MAX_LOAD,
            Some(value) => {
                warnings.push(InputWarning::InvalidMaxLoad {
                    input: value.to_string(),
                    replacement: DEFAULT_MAX_LOAD,
                });
                DEFAULT_MAX_LOAD
            }
        };

        let requested = current_load.unwrap_or(0);
        let clamped = requested.clamp(0, i64::from(max_load)) as u32;
        if i64::from(clamped) != requested {
            warnings.push(InputWarning::LoadClamped { requested, clamped });
        }

        Sanitized::with_warnings(Self { max_load, current_load: clamped }, warnings)
    }

    pub fn max_load(&self) -> u32 {
        self.max_load
    }

    pub fn current_load(&self) -> u32 {
        self.current_load
    }

    pub fn remaining(&self) -> u32 {
        self.max_load - self.current_load
    }

    fn ratio(&self) -> f64 {
        f64::from(self.current_load) / f64::from(self.max_load)
    }

    pub(crate) fn load(&mut self, amount: u32) -> bool {
        if amount > self.remaining() {
            return false;
        }
        self.current_load += amount;
        true
    }

    pub(crate) fn unload(&mut self, amount: u32) -> bool {
        if amount > self.current_load {
            return false;
        }
        self.current_load -= amount;
        true
    }
}

/// Carga útil específica de cada variante
#[derive(Debug, Clone, PartialEq)]
pub enum VehicleKind {
    /// Registro legado sin subtipo
    Vehicle,
    Car,
    SportsCar { turbo_on: bool },
    Truck(Cargo),
}

/// Qué operaciones opcionales admite una variante
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub turbo: bool,
    pub cargo: bool,
}

/// Deltas por defecto de aceleración y frenado
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionProfile {
    pub accelerate_delta: f64,
    pub brake_delta: f64,
}

impl VehicleKind {
    pub fn vehicle_type(&self) -> VehicleType {
        match self {
            VehicleKind::Vehicle => VehicleType::Vehicle,
            VehicleKind::Car => VehicleType::Car,
            VehicleKind::SportsCar { .. } => VehicleType::SportsCar,
            VehicleKind::Truck(_) => VehicleType::Truck,
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        match self {
            VehicleKind::Vehicle | VehicleKind::Car => Capabilities { turbo: false, cargo: false },
            VehicleKind::SportsCar { .. } => Capabilities { turbo: true, cargo: false },
            VehicleKind::Truck(_) => Capabilities { turbo: false, cargo: true },
        }
    }

    pub fn motion_profile(&self) -> MotionProfile {
        match self {
            VehicleKind::Vehicle | VehicleKind::Car => MotionProfile {
                accelerate_delta: 10.0,
                brake_delta: 15.0,
            },
            VehicleKind::SportsCar { .. } => MotionProfile {
                accelerate_delta: 15.0,
                brake_delta: 15.0,
            },
            VehicleKind::Truck(_) => MotionProfile {
                accelerate_delta: 8.0,
                brake_delta: 10.0,
            },
        }
    }

    /// Multiplicador aplicado al delta pedido de aceleración
    pub fn acceleration_factor(&self) -> f64 {
        match self {
            VehicleKind::SportsCar { turbo_on: true } => TURBO_MULTIPLIER,
            VehicleKind::Truck(cargo) => (1.0 - cargo.ratio() / 1.5).max(0.2),
            _ => 1.0,
        }
    }

    /// Multiplicador aplicado al delta pedido de frenado
    pub fn braking_factor(&self) -> f64 {
        match self {
            VehicleKind::Truck(cargo) => (1.0 - cargo.ratio() / 2.0).max(0.3),
            _ => 1.0,
        }
    }

    pub fn turbo_on(&self) -> Option<bool> {
        match self {
            VehicleKind::SportsCar { turbo_on } => Some(*turbo_on),
            _ => None,
        }
    }

    pub fn cargo(&self) -> Option<&Cargo> {
        match self {
            VehicleKind::Truck(cargo) => Some(cargo),
            _ => None,
        }
    }

    pub(crate) fn cargo_mut(&mut self) -> Option<&mut Cargo> {
        match self {
            VehicleKind::Truck(cargo) => Some(cargo),
            _ => None,
        }
    }
}
