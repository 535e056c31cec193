//! Core library for invoice renaming.
//!
//! Takes the raw OCR text of an invoice, extracts the fields that matter for
//! filing (supplier, invoice number, date, amount, currency), classifies the
//! invoice into a fiscal quarter, and renders a deterministic canonical file
//! name. A batch orchestrator runs many documents with per-document retry.
//!
//! # Example
//!
//! ```
//! use invren_core::models::ConfigStore;
//! use invren_core::pipeline::Pipeline;
//!
//! let config = ConfigStore::builtin();
//! let pipeline = Pipeline::new(&config);
//!
//! let text = "ACME Trading LLC\nInvoice No: 12345\nDate: 15/02/2025\nTotal: 960.34 AED\n";
//! let out = pipeline.process("scan.pdf", text, None).unwrap();
//! assert!(out.naming.file_name.ends_with(".pdf"));
//! ```

pub mod batch;
pub mod classify;
pub mod error;
pub mod extract;
pub mod models;
pub mod naming;
pub mod pipeline;
pub mod text;

pub use batch::{
    BatchOrchestrator, BatchResult, DocumentOutcome, DocumentRequest, PipelineRemote, RetryPolicy,
};
pub use classify::{classify, ClassificationResult};
pub use error::{InvrenError, Result};
pub use models::{ConfigRepository, ConfigStore, EntityConfig, InvoiceRecord, SupplierTemplate};
pub use naming::NamingResult;
pub use pipeline::{Pipeline, PipelineOutput};
pub use text::{FileTextSource, TextSource};
