//! Amount extraction: labeled totals with a largest-amount fallback.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::{AMOUNT_PATTERN, TOTAL_LABELS};
use super::{ExtractionMatch, FieldExtractor};

lazy_static! {
    // OCR artifact repair: "960 .34", "960. 34", "1 499.70"
    static ref SPACE_BEFORE_DOT: Regex = Regex::new(r"(\d)\s+\.(\d)").unwrap();
    static ref SPACE_AFTER_DOT: Regex = Regex::new(r"(\d)\.\s+(\d)").unwrap();
    static ref SPACE_THOUSANDS: Regex = Regex::new(r"(\d)\s+(\d{3})\b").unwrap();

    // Amount adjacent to a currency marker, either side.
    static ref CURRENCY_TAGGED: Regex = Regex::new(
        r"(?i)(?:[\$€£₹﷼]|AED|USD|EUR|GBP|INR|SAR|US\$)\s*(\d{1,3}(?:[\s\u{00a0},.]?\d{3})*[,.]\d{1,2})|(\d{1,3}(?:[\s\u{00a0},.]?\d{3})*[,.]\d{1,2})\s*(?:[\$€£₹﷼]|AED|USD|EUR|GBP|INR|SAR)"
    ).unwrap();
}

/// Amount field extractor over currency-shaped numeric tokens.
pub struct AmountExtractor;

impl AmountExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = ExtractionMatch<Decimal>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let repaired = repair_ocr_artifacts(text);
        let mut results = Vec::new();

        for caps in AMOUNT_PATTERN.captures_iter(&repaired) {
            let full = caps.get(0).unwrap();
            if let Some(amount) = normalize_amount(full.as_str()) {
                results.push(
                    ExtractionMatch::new(amount, 0.8, full.as_str())
                        .with_position(full.start(), full.end()),
                );
            }
        }

        results
    }
}

/// Extract the payable total: the first amount on a labeled total line
/// (most specific label first), falling back to the largest currency-tagged
/// amount anywhere in the text.
pub fn extract_total(text: &str) -> Option<ExtractionMatch<Decimal>> {
    let extractor = AmountExtractor::new();

    for (label, confidence) in TOTAL_LABELS.iter() {
        if let Some(caps) = label.captures(text) {
            let line: String = caps
                .get(1)
                .map(|m| m.as_str())
                .unwrap_or("")
                .lines()
                .next()
                .unwrap_or("")
                .chars()
                .take(80)
                .collect();

            if let Some(m) = extractor.extract(&line) {
                if m.value > Decimal::ZERO {
                    return Some(ExtractionMatch::new(m.value, *confidence, &caps[0]));
                }
            }
        }
    }

    fallback_largest(text)
}

/// Last resort: the largest amount that sits next to a currency marker.
fn fallback_largest(text: &str) -> Option<ExtractionMatch<Decimal>> {
    let repaired = repair_ocr_artifacts(text);
    let mut best: Option<ExtractionMatch<Decimal>> = None;

    for caps in CURRENCY_TAGGED.captures_iter(&repaired) {
        let raw = caps.get(1).or_else(|| caps.get(2));
        let Some(raw) = raw else { continue };

        if let Some(amount) = normalize_amount(raw.as_str()) {
            if amount > Decimal::ZERO
                && best.as_ref().is_none_or(|b| amount > b.value)
            {
                best = Some(ExtractionMatch::new(amount, 0.5, caps.get(0).unwrap().as_str()));
            }
        }
    }

    best
}

/// Fix common OCR artifacts before parsing.
pub fn repair_ocr_artifacts(raw: &str) -> String {
    let out = SPACE_BEFORE_DOT.replace_all(raw, "$1.$2");
    let out = SPACE_AFTER_DOT.replace_all(&out, "$1.$2");
    SPACE_THOUSANDS.replace_all(&out, "$1$2").into_owned()
}

/// Normalize a raw amount string to an exact decimal, handling both the
/// `1,234.56` and `1.234,56` separator conventions. Returns `None` for
/// anything that does not parse.
pub fn normalize_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        // Only commas: the last one is decimal iff it has 1-2 trailing digits.
        (Some(pos), None) => {
            if cleaned.len() - pos - 1 <= 2 && cleaned.matches(',').count() == 1 {
                cleaned.replace(',', ".")
            } else {
                cleaned.replace(',', "")
            }
        }
        // Both: whichever comes last is the decimal separator.
        (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        _ => cleaned,
    };

    Decimal::from_str(&normalized).ok()
}
