//! RepairDesk core types and utilities

pub mod error;
pub mod settings;
pub mod tracing;

pub use error::{CoreError, CoreResult};
pub use settings::load_settings;
