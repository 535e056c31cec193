//! Invoice date extraction across numeric, ISO, and textual formats.

use chrono::{Datelike, NaiveDate, Utc};
use regex::Regex;
use tracing::warn;

use super::patterns::{
    DATE_NUMERIC, DATE_TEXTUAL_DMY, DATE_TEXTUAL_MDY, DATE_YMD, INVOICE_DATE_LABELS,
    NEGATIVE_DATE_LABELS, ORDINAL_SUFFIX,
};
use super::{ExtractionMatch, FieldExtractor};
use crate::models::{DateOrder, SupplierTemplate};

/// How far back an invoice date may plausibly lie.
const EARLIEST_PLAUSIBLE_YEAR: i32 = 2015;

/// How much of the document the unlabeled fallback scans.
const FALLBACK_WINDOW: usize = 2000;

/// Date field extractor. Numeric day/month ambiguity (03/04/2025) is
/// resolved by the entity's locale hint.
pub struct DateExtractor {
    order: DateOrder,
}

impl DateExtractor {
    pub fn new(order: DateOrder) -> Self {
        Self { order }
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<NaiveDate>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    /// All date-shaped tokens in text order.
    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results: Vec<Self::Output> = Vec::new();

        // ISO YYYY-MM-DD first: unambiguous regardless of locale.
        for caps in DATE_YMD.captures_iter(text) {
            let year: i32 = caps[1].parse().unwrap_or(0);
            let month: u32 = caps[2].parse().unwrap_or(0);
            let day: u32 = caps[3].parse().unwrap_or(0);

            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                let full = caps.get(0).unwrap();
                results.push(
                    ExtractionMatch::new(date, 0.95, full.as_str())
                        .with_position(full.start(), full.end()),
                );
            }
        }

        // Numeric DD/MM/YYYY or MM/DD/YYYY per the locale hint; if the
        // preferred order yields an impossible date the other is tried.
        for caps in DATE_NUMERIC.captures_iter(text) {
            let a: u32 = caps[1].parse().unwrap_or(0);
            let b: u32 = caps[2].parse().unwrap_or(0);
            let year = parse_year(&caps[3]);

            let (day, month) = match self.order {
                DateOrder::Dmy => (a, b),
                DateOrder::Mdy => (b, a),
            };

            let date = NaiveDate::from_ymd_opt(year, month, day)
                .or_else(|| NaiveDate::from_ymd_opt(year, day, month));

            if let Some(date) = date {
                let full = caps.get(0).unwrap();
                if overlaps(&results, full.start()) {
                    continue;
                }
                results.push(
                    ExtractionMatch::new(date, 0.9, full.as_str())
                        .with_position(full.start(), full.end()),
                );
            }
        }

        // Textual month: "15 February 2025" and "February 15, 2025".
        for caps in DATE_TEXTUAL_DMY.captures_iter(text) {
            let day: u32 = caps[1].parse().unwrap_or(0);
            let month = month_from_name(&caps[2]);
            let year = parse_year(&caps[3]);

            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                let full = caps.get(0).unwrap();
                if overlaps(&results, full.start()) {
                    continue;
                }
                results.push(
                    ExtractionMatch::new(date, 0.95, full.as_str())
                        .with_position(full.start(), full.end()),
                );
            }
        }

        for caps in DATE_TEXTUAL_MDY.captures_iter(text) {
            let month = month_from_name(&caps[1]);
            let day: u32 = caps[2].parse().unwrap_or(0);
            let year = parse_year(&caps[3]);

            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                let full = caps.get(0).unwrap();
                if overlaps(&results, full.start()) {
                    continue;
                }
                results.push(
                    ExtractionMatch::new(date, 0.95, full.as_str())
                        .with_position(full.start(), full.end()),
                );
            }
        }

        results.sort_by_key(|m| m.position.map(|(s, _)| s).unwrap_or(usize::MAX));
        results
    }
}

fn overlaps<T>(results: &[ExtractionMatch<T>], start: usize) -> bool {
    results
        .iter()
        .any(|r| r.position.is_some_and(|(s, e)| (s..e).contains(&start)))
}

/// Extract the invoice date: labeled lines first (custom supplier labels,
/// then the generic label list, skipping due/payment/delivery contexts),
/// then the earliest plausible date-shaped token in the opening of the text.
///
/// The earliest-in-text tie-break applies only when no label is adjacent to
/// any candidate.
pub fn extract_invoice_date(
    text: &str,
    order: DateOrder,
    template: Option<&SupplierTemplate>,
) -> Option<ExtractionMatch<NaiveDate>> {
    let extractor = DateExtractor::new(order);

    // Supplier-specific labels carry the highest confidence.
    if let Some(labels) = template.map(|t| t.date_labels.as_slice()) {
        for label in labels {
            match Regex::new(&format!(r"(?i){}\s*:?\s*(.+)", regex::escape(label))) {
                Ok(re) => {
                    if let Some(date) = labeled_date(&re, text, &extractor) {
                        return Some(ExtractionMatch::new(date, 1.0, label.as_str()));
                    }
                }
                Err(e) => warn!("invalid supplier date label `{label}`: {e}"),
            }
        }
    }

    for re in INVOICE_DATE_LABELS.iter() {
        if let Some(m) = re.find(text) {
            // A label like bare "Date:" inside "Due Date:" must not win.
            let preceding = &text[floor_boundary(text, m.start().saturating_sub(12))..m.start()];
            let label_line = format!("{preceding}{}", m.as_str());
            if NEGATIVE_DATE_LABELS.iter().any(|neg| neg.is_match(&label_line)) {
                continue;
            }
        }
        if let Some(date) = labeled_date(re, text, &extractor) {
            return Some(ExtractionMatch::new(date, 0.95, re.as_str()));
        }
    }

    // Unlabeled fallback: earliest match in the opening window not preceded
    // by a negative label.
    let window = &text[..floor_boundary(text, FALLBACK_WINDOW)];

    for candidate in extractor.extract_all(window) {
        if !is_plausible(candidate.value) {
            continue;
        }
        if let Some((start, _)) = candidate.position {
            // Only the candidate's own line counts as negative context; a
            // due-date label on an earlier line must not suppress it.
            let line_start = window[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
            let from = line_start.max(start.saturating_sub(40));
            let preceding = &window[floor_boundary(window, from)..start];
            if NEGATIVE_DATE_LABELS.iter().any(|neg| neg.is_match(preceding)) {
                continue;
            }
        }
        return Some(ExtractionMatch::new(candidate.value, 0.6, candidate.source));
    }

    None
}

/// Parse the line after a label: first 50 chars, ordinals stripped.
fn labeled_date(
    label: &Regex,
    text: &str,
    extractor: &DateExtractor,
) -> Option<NaiveDate> {
    let caps = label.captures(text)?;
    let line: String = caps.get(1)?.as_str().lines().next()?.chars().take(50).collect();
    let cleaned = ORDINAL_SUFFIX.replace_all(&line, "$1");

    extractor
        .extract(&cleaned)
        .map(|m| m.value)
        .filter(|d| is_plausible(*d))
}

/// Largest char boundary at or below `i`.
fn floor_boundary(s: &str, mut i: usize) -> usize {
    if i >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn is_plausible(date: NaiveDate) -> bool {
    let this_year = Utc::now().year();
    date.year() >= EARLIEST_PLAUSIBLE_YEAR && date.year() <= this_year + 2
}

fn parse_year(s: &str) -> i32 {
    let year: i32 = s.parse().unwrap_or(0);
    if year < 100 {
        // Two-digit year: assume 2000s for 00-50, 1900s for 51-99.
        if year <= 50 {
            2000 + year
        } else {
            1900 + year
        }
    } else {
        year
    }
}

fn month_from_name(name: &str) -> u32 {
    match name.to_lowercase().as_str() {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sep" | "sept" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_numeric_dmy() {
        let extractor = DateExtractor::new(DateOrder::Dmy);
        let m = extractor.extract("15/02/2025").unwrap();
        assert_eq!(m.value, date(2025, 2, 15));
    }

    #[test]
    fn test_ambiguous_resolved_by_locale() {
        let text = "03/04/2025";

        let dmy = DateExtractor::new(DateOrder::Dmy).extract(text).unwrap();
        assert_eq!(dmy.value, date(2025, 4, 3));

        let mdy = DateExtractor::new(DateOrder::Mdy).extract(text).unwrap();
        assert_eq!(mdy.value, date(2025, 3, 4));
    }

    #[test]
    fn test_impossible_order_swaps() {
        // 25 cannot be a month, so MDY still reads this as 25 December.
        let m = DateExtractor::new(DateOrder::Mdy).extract("25/12/2024").unwrap();
        assert_eq!(m.value, date(2024, 12, 25));
    }

    #[test]
    fn test_iso_format() {
        let m = DateExtractor::new(DateOrder::Dmy).extract("2025-02-15").unwrap();
        assert_eq!(m.value, date(2025, 2, 15));
    }

    #[test]
    fn test_textual_formats() {
        let extractor = DateExtractor::new(DateOrder::Dmy);

        let m = extractor.extract("15 February 2025").unwrap();
        assert_eq!(m.value, date(2025, 2, 15));

        let m = extractor.extract("February 15, 2025").unwrap();
        assert_eq!(m.value, date(2025, 2, 15));

        let m = extractor.extract("15 Feb 2025").unwrap();
        assert_eq!(m.value, date(2025, 2, 15));
    }

    #[test]
    fn test_two_digit_year() {
        let m = DateExtractor::new(DateOrder::Dmy).extract("15/02/25").unwrap();
        assert_eq!(m.value, date(2025, 2, 15));
    }

    #[test]
    fn test_labeled_date_preferred() {
        let text = "Due Date: 01/03/2025\nInvoice Date: 15/02/2025\n";
        let m = extract_invoice_date(text, DateOrder::Dmy, None).unwrap();
        assert_eq!(m.value, date(2025, 2, 15));
    }

    #[test]
    fn test_ordinal_suffix_stripped() {
        let text = "Invoice Date: 22nd March 2025\n";
        let m = extract_invoice_date(text, DateOrder::Dmy, None).unwrap();
        assert_eq!(m.value, date(2025, 3, 22));
    }

    #[test]
    fn test_unlabeled_fallback_takes_earliest() {
        let text = "Some header\n15/02/2025 and later 20/03/2025\n";
        let m = extract_invoice_date(text, DateOrder::Dmy, None).unwrap();
        assert_eq!(m.value, date(2025, 2, 15));
    }

    #[test]
    fn test_negative_context_skipped_in_fallback() {
        let text = "Payment Date 01/03/2025\nref 15/02/2025\n";
        let m = extract_invoice_date(text, DateOrder::Dmy, None).unwrap();
        assert_eq!(m.value, date(2025, 2, 15));
    }

    #[test]
    fn test_negative_label_on_previous_line_does_not_suppress() {
        let text = "Due Date\n15/02/2025\n";
        let m = extract_invoice_date(text, DateOrder::Dmy, None).unwrap();
        assert_eq!(m.value, date(2025, 2, 15));
    }

    #[test]
    fn test_implausible_date_ignored() {
        assert!(extract_invoice_date("ref 01/01/1999\n", DateOrder::Dmy, None).is_none());
    }

    #[test]
    fn test_empty_text_is_noop() {
        assert!(extract_invoice_date("", DateOrder::Dmy, None).is_none());
    }
}
