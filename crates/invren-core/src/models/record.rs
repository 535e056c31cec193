//! The per-document invoice record accumulator.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One scored field of an invoice record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Supplier,
    InvoiceNumber,
    Date,
    Amount,
    Currency,
    AccountingPrefix,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Supplier => "supplier",
            Field::InvoiceNumber => "invoice_number",
            Field::Date => "date",
            Field::Amount => "amount",
            Field::Currency => "currency",
            Field::AccountingPrefix => "accounting_prefix",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable accumulator for one document's extraction results.
///
/// Field values can only be written together with a confidence score through
/// the `set_*` methods, so a populated field always carries a score and an
/// absent field never does. A record is owned by exactly one pipeline
/// invocation and is dropped when that invocation finishes.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceRecord {
    /// Original file identifier (never changes).
    source_name: String,

    /// Raw OCR output, the input to every extractor (never changes).
    #[serde(skip)]
    raw_text: String,

    supplier: Option<String>,
    invoice_number: Option<String>,
    date: Option<NaiveDate>,
    amount: Option<Decimal>,
    currency: Option<String>,
    accounting_prefix: Option<String>,

    /// Confidence score per populated field, each in [0, 1].
    confidence: HashMap<Field, f32>,
}

impl InvoiceRecord {
    /// Create an empty record for one document.
    pub fn new(source_name: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            raw_text: raw_text.into(),
            supplier: None,
            invoice_number: None,
            date: None,
            amount: None,
            currency: None,
            accounting_prefix: None,
            confidence: HashMap::new(),
        }
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn supplier(&self) -> Option<&str> {
        self.supplier.as_deref()
    }

    pub fn invoice_number(&self) -> Option<&str> {
        self.invoice_number.as_deref()
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn amount(&self) -> Option<Decimal> {
        self.amount
    }

    pub fn currency(&self) -> Option<&str> {
        self.currency.as_deref()
    }

    pub fn accounting_prefix(&self) -> Option<&str> {
        self.accounting_prefix.as_deref()
    }

    /// Confidence score for a field, if the field is populated.
    pub fn confidence(&self, field: Field) -> Option<f32> {
        self.confidence.get(&field).copied()
    }

    /// Whether a field is populated.
    pub fn has(&self, field: Field) -> bool {
        self.confidence.contains_key(&field)
    }

    pub fn set_supplier(&mut self, value: impl Into<String>, confidence: f32) {
        self.supplier = Some(value.into());
        self.score(Field::Supplier, confidence);
    }

    pub fn set_invoice_number(&mut self, value: impl Into<String>, confidence: f32) {
        self.invoice_number = Some(value.into());
        self.score(Field::InvoiceNumber, confidence);
    }

    pub fn set_date(&mut self, value: NaiveDate, confidence: f32) {
        self.date = Some(value);
        self.score(Field::Date, confidence);
    }

    pub fn set_amount(&mut self, value: Decimal, confidence: f32) {
        self.amount = Some(value);
        self.score(Field::Amount, confidence);
    }

    pub fn set_currency(&mut self, value: impl Into<String>, confidence: f32) {
        self.currency = Some(value.into());
        self.score(Field::Currency, confidence);
    }

    pub fn set_accounting_prefix(&mut self, value: impl Into<String>, confidence: f32) {
        self.accounting_prefix = Some(value.into());
        self.score(Field::AccountingPrefix, confidence);
    }

    fn score(&mut self, field: Field, confidence: f32) {
        self.confidence.insert(field, confidence.clamp(0.0, 1.0));
    }

    /// Fields that are still missing after extraction, in canonical order.
    pub fn missing_fields(&self) -> Vec<Field> {
        [
            Field::Supplier,
            Field::InvoiceNumber,
            Field::Date,
            Field::Amount,
            Field::Currency,
        ]
        .into_iter()
        .filter(|f| !self.has(*f))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_populated_field_carries_score() {
        let mut record = InvoiceRecord::new("a.pdf", "some text");
        assert!(!record.has(Field::Supplier));
        assert_eq!(record.confidence(Field::Supplier), None);

        record.set_supplier("AWS", 1.0);
        assert_eq!(record.supplier(), Some("AWS"));
        assert_eq!(record.confidence(Field::Supplier), Some(1.0));
    }

    #[test]
    fn test_confidence_clamped() {
        let mut record = InvoiceRecord::new("a.pdf", "");
        record.set_currency("USD", 1.5);
        assert_eq!(record.confidence(Field::Currency), Some(1.0));
    }

    #[test]
    fn test_missing_fields() {
        let mut record = InvoiceRecord::new("a.pdf", "");
        record.set_supplier("AWS", 1.0);
        record.set_amount(Decimal::ONE, 0.8);

        let missing = record.missing_fields();
        assert_eq!(
            missing,
            vec![Field::InvoiceNumber, Field::Date, Field::Currency]
        );
    }
}
