//! Data models for invoice records and configuration.

pub mod config;
pub mod record;

pub use config::{
    ConfigRepository, ConfigStore, DateOrder, EntityConfig, FiscalCalendar, SupplierTemplate,
};
pub use record::{Field, InvoiceRecord};
