//! Canonical file name rendering and collision resolution.
//!
//! Format: `[Prefix_]Supplier_#Number_DD-MM-YYYY_AmountCCY[_Qn-YYYY].ext`.
//! Rendering is pure and total: a malformed or missing field degrades to its
//! fixed placeholder so the field count in a name is stable for parsers.

use std::collections::HashSet;

use serde::Serialize;

use crate::classify::ClassificationResult;
use crate::error::NamingError;
use crate::models::InvoiceRecord;

/// Placeholder for a missing supplier.
pub const UNKNOWN_SUPPLIER: &str = "Unknown";
/// Placeholder for a missing invoice number.
pub const NO_NUMBER: &str = "NoNum";
/// Placeholder for a missing date.
pub const NO_DATE: &str = "NoDate";
/// Placeholder amount+currency.
pub const NO_AMOUNT: &str = "0.00XXX";

/// Search bound for conflict resolution.
const MAX_CONFLICT_ATTEMPTS: u32 = 100;

/// The rendered name plus the component strings that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamingResult {
    /// Final file name including extension.
    pub file_name: String,

    pub prefix: Option<String>,
    pub supplier: String,
    pub invoice_number: String,
    pub date: String,
    pub amount: String,
    pub quarter: Option<String>,
    pub extension: String,
}

/// Render the canonical name for a record. The quarter suffix is omitted
/// entirely when classification was unclassifiable (`None`).
pub fn render(
    record: &InvoiceRecord,
    classification: Option<&ClassificationResult>,
) -> NamingResult {
    let extension = extension_of(record.source_name());

    let supplier = sanitize(record.supplier().unwrap_or(""), UNKNOWN_SUPPLIER);
    let invoice_number = sanitize(record.invoice_number().unwrap_or(""), NO_NUMBER);

    let date = record
        .date()
        .map(|d| d.format("%d-%m-%Y").to_string())
        .unwrap_or_else(|| NO_DATE.to_string());

    let amount = match record.amount() {
        Some(a) => format!("{:.2}{}", a, record.currency().unwrap_or("XXX")),
        None => NO_AMOUNT.to_string(),
    };

    let prefix = record
        .accounting_prefix()
        .map(|p| sanitize(p, ""))
        .filter(|p| !p.is_empty());

    let quarter = classification.map(ClassificationResult::suffix);

    let mut parts: Vec<&str> = Vec::with_capacity(6);
    if let Some(p) = &prefix {
        parts.push(p);
    }
    parts.extend([supplier.as_str(), invoice_number.as_str(), date.as_str(), amount.as_str()]);
    if let Some(q) = &quarter {
        parts.push(q);
    }

    let file_name = format!("{}{}", parts.join("_"), extension);

    NamingResult {
        file_name,
        prefix,
        supplier,
        invoice_number,
        date,
        amount,
        quarter,
        extension,
    }
}

/// The extension of a file name including its dot, original case preserved;
/// empty when there is none.
fn extension_of(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((base, ext)) if !base.is_empty() && !ext.is_empty() && !ext.contains(['/', '\\']) => {
            format!(".{ext}")
        }
        _ => String::new(),
    }
}

/// Clean a string for use as a file name component: accents folded to ASCII,
/// path separators / control characters / quotes and other illegal symbols
/// replaced, whitespace collapsed to single underscores, underscore runs
/// collapsed. Falls back to `default` when nothing survives.
pub fn sanitize(value: &str, default: &str) -> String {
    let mut out = String::with_capacity(value.len());

    for c in value.chars() {
        match fold_ascii(c) {
            Some(folded) => out.push_str(folded),
            None if c.is_whitespace() => out.push('_'),
            None if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '#' => out.push(c),
            None if c.is_control() || !c.is_ascii() => {} // dropped
            None => out.push('_'),
        }
    }

    // Collapse underscore runs and trim the edges.
    let mut collapsed = String::with_capacity(out.len());
    let mut prev_underscore = false;
    for c in out.chars() {
        if c == '_' {
            if !prev_underscore {
                collapsed.push('_');
            }
            prev_underscore = true;
        } else {
            collapsed.push(c);
            prev_underscore = false;
        }
    }
    let cleaned = collapsed.trim_matches('_');

    if cleaned.is_empty() {
        default.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Fold common Latin accents to their ASCII base letter.
fn fold_ascii(c: char) -> Option<&'static str> {
    Some(match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => "a",
        'Á' | 'À' | 'Â' | 'Ä' | 'Ã' | 'Å' => "A",
        'é' | 'è' | 'ê' | 'ë' => "e",
        'É' | 'È' | 'Ê' | 'Ë' => "E",
        'í' | 'ì' | 'î' | 'ï' => "i",
        'Í' | 'Ì' | 'Î' | 'Ï' => "I",
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => "o",
        'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' => "O",
        'ú' | 'ù' | 'û' | 'ü' => "u",
        'Ú' | 'Ù' | 'Û' | 'Ü' => "U",
        'ç' => "c",
        'Ç' => "C",
        'ñ' => "n",
        'Ñ' => "N",
        'ß' => "ss",
        _ => return None,
    })
}

/// Return a name guaranteed not to collide with `existing`: the proposal
/// unchanged when free, otherwise `base_1.ext`, `base_2.ext`, ... bounded at
/// 100 attempts.
pub fn resolve_conflict(
    proposed: &str,
    existing: &HashSet<String>,
) -> Result<String, NamingError> {
    if !existing.contains(proposed) {
        return Ok(proposed.to_string());
    }

    let (base, ext) = match proposed.rsplit_once('.') {
        Some((base, ext)) if !base.is_empty() => (base, format!(".{ext}")),
        _ => (proposed, String::new()),
    };

    for n in 1..=MAX_CONFLICT_ATTEMPTS {
        let candidate = format!("{base}_{n}{ext}");
        if !existing.contains(&candidate) {
            return Ok(candidate);
        }
    }

    Err(NamingError::ConflictExhausted {
        name: proposed.to_string(),
        attempts: MAX_CONFLICT_ATTEMPTS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::models::FiscalCalendar;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn full_record() -> InvoiceRecord {
        let mut record = InvoiceRecord::new("original.pdf", "");
        record.set_supplier("AWS", 1.0);
        record.set_invoice_number("#2030491957", 0.9);
        record.set_date(NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(), 0.9);
        record.set_amount(Decimal::from_str("592.37").unwrap(), 0.9);
        record.set_currency("USD", 1.0);
        record
    }

    #[test]
    fn test_full_record_name() {
        let naming = render(&full_record(), None);
        assert_eq!(naming.file_name, "AWS_#2030491957_01-02-2025_592.37USD.pdf");
    }

    #[test]
    fn test_empty_record_degrades_to_placeholders() {
        let record = InvoiceRecord::new("test.pdf", "");
        let naming = render(&record, None);
        assert_eq!(naming.file_name, "Unknown_NoNum_NoDate_0.00XXX.pdf");
    }

    #[test]
    fn test_quarter_suffix() {
        let record = full_record();
        let cal = FiscalCalendar {
            quarter_start_month: 2,
            folder_template: "{year}/{quarter}".to_string(),
        };
        let classification = classify(record.date().unwrap(), &cal);

        let naming = render(&record, Some(&classification));
        assert_eq!(
            naming.file_name,
            "AWS_#2030491957_01-02-2025_592.37USD_Q1-2025.pdf"
        );
    }

    #[test]
    fn test_accounting_prefix_prepended() {
        let mut record = full_record();
        record.set_accounting_prefix("PUR 25-0024", 1.0);
        let naming = render(&record, None);
        assert!(naming.file_name.starts_with("PUR_25-0024_AWS_"));
    }

    #[test]
    fn test_amount_rendered_with_two_decimals() {
        let mut record = InvoiceRecord::new("a.pdf", "");
        record.set_amount(Decimal::from_str("1234.5").unwrap(), 0.9);
        record.set_currency("AED", 1.0);
        let naming = render(&record, None);
        assert_eq!(naming.amount, "1234.50AED");
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let record = full_record();
        let a = render(&record, None);
        let b = render(&record, None);
        assert_eq!(a, b);
    }

    #[test]
    fn test_sanitize_strips_special_characters() {
        let mut record = InvoiceRecord::new("test.pdf", "");
        record.set_supplier("Café & Résumé Ltd.", 0.5);
        let naming = render(&record, None);

        assert!(!naming.file_name.contains('&'));
        assert!(!naming.file_name.contains('é'));
        assert!(!naming.file_name.contains('/'));
        assert!(naming.supplier.starts_with("Cafe"));
    }

    #[test]
    fn test_sanitize_empty_falls_back_to_default() {
        assert_eq!(sanitize("   ", "Unknown"), "Unknown");
        assert_eq!(sanitize("///", "NoNum"), "NoNum");
    }

    #[test]
    fn test_extension_preserved_with_case() {
        let record = InvoiceRecord::new("file.PNG", "");
        assert!(render(&record, None).file_name.ends_with(".PNG"));

        let record = InvoiceRecord::new("no_extension", "");
        assert_eq!(render(&record, None).extension, "");
    }

    #[test]
    fn test_conflict_free_name_unchanged() {
        let existing = HashSet::from(["b.pdf".to_string()]);
        assert_eq!(resolve_conflict("a.pdf", &existing).unwrap(), "a.pdf");
    }

    #[test]
    fn test_conflict_appends_counter() {
        let existing = HashSet::from(["a.pdf".to_string(), "a_1.pdf".to_string()]);
        assert_eq!(resolve_conflict("a.pdf", &existing).unwrap(), "a_2.pdf");
    }

    #[test]
    fn test_conflict_bound() {
        let mut existing = HashSet::from(["a.pdf".to_string()]);
        for n in 1..=100 {
            existing.insert(format!("a_{n}.pdf"));
        }

        assert_eq!(
            resolve_conflict("a.pdf", &existing),
            Err(NamingError::ConflictExhausted {
                name: "a.pdf".to_string(),
                attempts: 100,
            })
        );
    }
}
