//! DTOs de la capa HTTP

pub mod api_response;
pub mod vehicle_dto;

pub use api_response::ApiResponse;
pub use vehicle_dto::*;
