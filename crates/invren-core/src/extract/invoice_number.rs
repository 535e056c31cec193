//! Invoice number extraction with contextual patterns and validation.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

use super::patterns::INVOICE_NUMBER_LABELS;
use super::ExtractionMatch;
use crate::models::SupplierTemplate;

lazy_static! {
    static ref NON_DIGIT: Regex = Regex::new(r"[^0-9]").unwrap();
    static ref PHONE_LIKE: Regex = Regex::new(r"^\+\d{10,}$").unwrap();
    static ref COUNTRY_CODE_LIKE: Regex = Regex::new(r"^00\d{3}$").unwrap();
}

/// Extract the invoice number, preferring a supplier-template pattern over
/// the generic label patterns. The stored value carries a leading `#`.
pub fn extract_invoice_number(
    text: &str,
    template: Option<&SupplierTemplate>,
) -> Option<ExtractionMatch<String>> {
    // Template pattern first: the template context already confirms the
    // field, so validation is lighter.
    if let Some(pattern) = template.and_then(|t| t.invoice_number_pattern.as_deref()) {
        match Regex::new(&format!("(?i){pattern}")) {
            Ok(re) => {
                if let Some(caps) = re.captures(text) {
                    if let Some(num) = caps.get(1).map(|m| m.as_str().trim()) {
                        if is_plausible_length(num) {
                            return Some(ExtractionMatch::new(format!("#{num}"), 1.0, &caps[0]));
                        }
                    }
                }
            }
            Err(e) => warn!("invalid supplier invoice number pattern `{pattern}`: {e}"),
        }
    }

    // Generic label patterns, most specific first.
    for (re, confidence) in INVOICE_NUMBER_LABELS.iter() {
        if let Some(caps) = re.captures(text) {
            let num = trim_punctuation(caps[1].trim());
            if is_valid_generic(num) {
                return Some(ExtractionMatch::new(format!("#{num}"), *confidence, &caps[0]));
            }
        }
    }

    None
}

/// Strip punctuation that OCR tends to glue onto the token.
fn trim_punctuation(num: &str) -> &str {
    num.trim_matches(|c: char| matches!(c, '.' | ',' | ':' | ';' | '(' | ')' | '"' | '\''))
}

fn is_plausible_length(num: &str) -> bool {
    (3..=30).contains(&num.len())
}

/// Strict validation for generically-matched numbers: rejects phone numbers,
/// country codes, and other long-digit false positives.
fn is_valid_generic(num: &str) -> bool {
    if !is_plausible_length(num) {
        return false;
    }

    let digits = NON_DIGIT.replace_all(num, "");
    if digits.len() > 15 {
        return false;
    }

    !PHONE_LIKE.is_match(num) && !COUNTRY_CODE_LIKE.is_match(num)
}
