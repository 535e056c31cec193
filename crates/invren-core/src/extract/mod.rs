//! Rule-based field extractors for invoice text.
//!
//! Each extractor is a pure pass over the raw OCR text: it either finds a
//! value and a confidence score or does nothing. Malformed or empty text is
//! never an error at this layer.

pub mod amounts;
pub mod currency;
pub mod dates;
pub mod invoice_number;
pub mod patterns;
pub mod prefix;
pub mod supplier;

pub use amounts::{extract_total, normalize_amount, AmountExtractor};
pub use currency::extract_currency;
pub use dates::{extract_invoice_date, DateExtractor};
pub use invoice_number::extract_invoice_number;
pub use prefix::extract_accounting_prefix;
pub use supplier::extract_supplier;

use regex::Regex;
use tracing::{debug, warn};

use crate::models::{DateOrder, EntityConfig, InvoiceRecord, SupplierTemplate};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// Extraction result with confidence.
#[derive(Debug, Clone)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    /// Position in source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: f32, source: impl Into<String>) -> Self {
        Self {
            value,
            confidence,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}

/// Entity-derived hints threaded through the extractors.
pub struct ExtractionContext<'a> {
    /// Known-supplier templates.
    pub suppliers: &'a [SupplierTemplate],
    /// Locale hint for ambiguous numeric dates.
    pub date_order: DateOrder,
    /// Currency assumed when none appears in the text.
    pub default_currency: Option<&'a str>,
    /// Compiled accounting prefix patterns.
    pub prefix_patterns: Vec<Regex>,
}

impl<'a> ExtractionContext<'a> {
    /// Build a context from an entity's configuration. Prefix patterns were
    /// validated at config load; a pattern that still fails to compile is
    /// skipped with a warning.
    pub fn for_entity(entity: &'a EntityConfig, suppliers: &'a [SupplierTemplate]) -> Self {
        let prefix_patterns = entity
            .accounting_prefixes
            .iter()
            .filter_map(|p| match Regex::new(p) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!("skipping invalid accounting prefix pattern `{p}`: {e}");
                    None
                }
            })
            .collect();

        Self {
            suppliers,
            date_order: entity.date_order,
            default_currency: entity.default_currency.as_deref(),
            prefix_patterns,
        }
    }
}

/// Run every extractor over the record in fixed order: supplier, invoice
/// number, date, amount, currency, accounting prefix.
///
/// The order only matters for log readability; each extractor reads only the
/// raw text. A field already confidently set is left alone, and a miss is a
/// no-op, so this never fails.
pub fn run_extractors(record: &mut InvoiceRecord, ctx: &ExtractionContext<'_>) {
    let text = record.raw_text().to_string();

    let (supplier, template) = extract_supplier(&text, ctx);
    if let Some(m) = supplier {
        debug!(supplier = %m.value, confidence = m.confidence, "supplier extracted");
        record.set_supplier(m.value, m.confidence);
    }

    if let Some(m) = extract_invoice_number(&text, template) {
        debug!(invoice_number = %m.value, confidence = m.confidence, "invoice number extracted");
        record.set_invoice_number(m.value, m.confidence);
    }

    if let Some(m) = extract_invoice_date(&text, ctx.date_order, template) {
        debug!(date = %m.value, confidence = m.confidence, "date extracted");
        record.set_date(m.value, m.confidence);
    }

    if let Some(m) = extract_total(&text) {
        debug!(amount = %m.value, confidence = m.confidence, "amount extracted");
        record.set_amount(m.value, m.confidence);
    }

    if let Some(m) = extract_currency(&text, template, ctx.default_currency) {
        debug!(currency = %m.value, confidence = m.confidence, "currency extracted");
        record.set_currency(m.value, m.confidence);
    }

    let source_name = record.source_name().to_string();
    if let Some(m) = extract_accounting_prefix(&source_name, &text, &ctx.prefix_patterns) {
        debug!(prefix = %m.value, "accounting prefix extracted");
        record.set_accounting_prefix(m.value, m.confidence);
    }
}
