//! Modelos del dominio
//!
//! Vehículos, variantes, mantenimiento, garage y agregados. Nada en este
//! módulo depende de la capa HTTP ni de la persistencia.

pub mod analytics;
pub mod garage;
pub mod maintenance;
pub mod outcome;
pub mod record;
pub mod variants;
pub mod vehicle;

pub use garage::{Garage, LoadReport, PublicVehicle};
pub use maintenance::MaintenanceRecord;
pub use outcome::{Feedback, OperationReport, OperationResult, Refusal};
pub use record::{reconstruct_vehicle, ReconstructError, VehicleRecord};
pub use variants::{Capabilities, Cargo, VehicleKind, VehicleType};
pub use vehicle::{NewVehicle, Vehicle, VehicleError, VehicleStatus};
