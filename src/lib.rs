pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

pub use crate::config::RegistrarConfig;
pub use crate::error::RegistrarError;
pub use crate::models::RegistrationOutcome;
pub use crate::services::registrar::Registrar;
