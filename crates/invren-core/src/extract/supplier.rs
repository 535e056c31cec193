//! Supplier extraction: template matching with a letterhead fallback.

use super::patterns::{COMPANY_SUFFIXES, LETTERHEAD_SKIP};
use super::{ExtractionContext, ExtractionMatch};
use crate::models::SupplierTemplate;

/// Extract the supplier name. Known-supplier templates win with confidence
/// 1.0; otherwise the first ~20 lines are scanned for a letterhead-like
/// company name (confidence 0.4 - 0.6). The matched template, if any, is
/// returned so later extractors can use its hints.
pub fn extract_supplier<'a>(
    text: &str,
    ctx: &ExtractionContext<'a>,
) -> (Option<ExtractionMatch<String>>, Option<&'a SupplierTemplate>) {
    if let Some(template) = match_template(text, ctx.suppliers) {
        let m = ExtractionMatch::new(template.display_name.clone(), 1.0, &template.id);
        return (Some(m), Some(template));
    }

    (letterhead_heuristic(text), None)
}

/// Case-insensitive substring match against every template's detection
/// patterns. First template listed wins.
fn match_template<'a>(
    text: &str,
    templates: &'a [SupplierTemplate],
) -> Option<&'a SupplierTemplate> {
    let text_upper = text.to_uppercase();
    templates.iter().find(|t| {
        t.detection_patterns
            .iter()
            .any(|p| text_upper.contains(&p.to_uppercase()))
    })
}

/// Fallback for unknown suppliers: score the first 20 non-empty lines and
/// take the most company-like one.
fn letterhead_heuristic(text: &str) -> Option<ExtractionMatch<String>> {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    let mut best: Option<(i32, &str)> = None;
    for (i, line) in lines.iter().take(20).enumerate() {
        if line.len() < 3 || line.len() > 80 {
            continue;
        }
        if LETTERHEAD_SKIP.is_match(line) {
            continue;
        }

        // Skip lines that are mostly numbers or symbols.
        let alpha = line.chars().filter(|c| c.is_alphabetic() || *c == ' ').count();
        if alpha * 2 < line.len() {
            continue;
        }

        let mut score = 0i32;
        if COMPANY_SUFFIXES.is_match(line) {
            score += 15;
        }
        if i < 5 {
            score += 5 - i as i32;
        }
        if (5..=50).contains(&line.len()) {
            score += 5;
        }
        if line.chars().next().is_some_and(char::is_uppercase) {
            score += 3;
        }

        if best.is_none_or(|(s, _)| score > s) {
            best = Some((score, line));
        }
    }

    best.map(|(score, line)| {
        // Map the heuristic score into the 0.4 - 0.6 confidence band.
        let confidence = 0.4 + (score as f32 / 100.0).min(0.2);
        ExtractionMatch::new(line.to_string(), confidence, line)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DateOrder;

    fn template(id: &str, display: &str, patterns: &[&str]) -> SupplierTemplate {
        SupplierTemplate {
            id: id.to_string(),
            display_name: display.to_string(),
            detection_patterns: patterns.iter().map(|s| s.to_string()).collect(),
            default_currency: None,
            invoice_number_pattern: None,
            date_labels: Vec::new(),
        }
    }

    fn ctx(suppliers: &[SupplierTemplate]) -> ExtractionContext<'_> {
        ExtractionContext {
            suppliers,
            date_order: DateOrder::Dmy,
            default_currency: None,
            prefix_patterns: Vec::new(),
        }
    }

    #[test]
    fn test_template_match_wins() {
        let templates = vec![template("etisalat", "Etisalat", &["ETISALAT", "e& UAE"])];
        let context = ctx(&templates);

        let (m, t) = extract_supplier("Invoice from Etisalat UAE\nTotal: 100", &context);
        let m = m.unwrap();
        assert_eq!(m.value, "Etisalat");
        assert_eq!(m.confidence, 1.0);
        assert_eq!(t.unwrap().id, "etisalat");
    }

    #[test]
    fn test_letterhead_fallback() {
        let templates = Vec::new();
        let context = ctx(&templates);

        let text = "Acme Trading LLC\nPO Box 1234\nInvoice No: 42\n";
        let (m, t) = extract_supplier(text, &context);
        let m = m.unwrap();
        assert_eq!(m.value, "Acme Trading LLC");
        assert!(m.confidence >= 0.4 && m.confidence <= 0.6);
        assert!(t.is_none());
    }

    #[test]
    fn test_empty_text_is_noop() {
        let templates = Vec::new();
        let context = ctx(&templates);
        let (m, t) = extract_supplier("", &context);
        assert!(m.is_none());
        assert!(t.is_none());
    }

    #[test]
    fn test_skip_words_filtered() {
        let templates = Vec::new();
        let context = ctx(&templates);

        // Every line is a known non-supplier line.
        let text = "Invoice\nTotal: 100.00\nPage 1 of 2\n";
        let (m, _) = extract_supplier(text, &context);
        assert!(m.is_none());
    }
}
