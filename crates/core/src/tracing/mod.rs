//! Shared tracing functionality for RepairDesk

pub mod config;
pub mod init;

pub use config::InstrumentationConfig;
pub use init::init_tracing;
