//! Accounting prefix extraction (purchase orders, payment vouchers).

use regex::Regex;

use super::ExtractionMatch;

/// Match an entity-configured accounting prefix, first anchored at the start
/// of the source file name, then as a token anywhere in the raw text. The
/// trailing separator is stripped from the stored value.
pub fn extract_accounting_prefix(
    source_name: &str,
    raw_text: &str,
    patterns: &[Regex],
) -> Option<ExtractionMatch<String>> {
    for re in patterns {
        if let Some(m) = re.find(source_name) {
            if m.start() == 0 {
                return Some(ExtractionMatch::new(trim_prefix(m.as_str()), 1.0, m.as_str()));
            }
        }

        if let Some(m) = re.find(raw_text) {
            return Some(ExtractionMatch::new(trim_prefix(m.as_str()), 0.8, m.as_str()));
        }
    }

    None
}

fn trim_prefix(raw: &str) -> String {
    raw.trim_end_matches(['_', ' ', '-']).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> Vec<Regex> {
        vec![
            Regex::new(r"PUR \d{2}-\d{4}_").unwrap(),
            Regex::new(r"Pyt Vch \d{4}-\d{4}_").unwrap(),
        ]
    }

    #[test]
    fn test_purchase_order_prefix_from_filename() {
        let m = extract_accounting_prefix("PUR 25-0024_scan.pdf", "", &patterns()).unwrap();
        assert_eq!(m.value, "PUR 25-0024");
        assert_eq!(m.confidence, 1.0);
    }

    #[test]
    fn test_payment_voucher_prefix() {
        let m =
            extract_accounting_prefix("Pyt Vch 2023-1386_inv.pdf", "", &patterns()).unwrap();
        assert_eq!(m.value, "Pyt Vch 2023-1386");
    }

    #[test]
    fn test_prefix_found_in_text() {
        let m = extract_accounting_prefix("scan.pdf", "ref PUR 25-0024_ acc", &patterns())
            .unwrap();
        assert_eq!(m.value, "PUR 25-0024");
        assert_eq!(m.confidence, 0.8);
    }

    #[test]
    fn test_mid_filename_match_ignored() {
        // Prefix must anchor at the start of the file name.
        assert!(
            extract_accounting_prefix("copy of PUR 25-0024_x.pdf", "", &patterns()).is_none()
        );
    }

    #[test]
    fn test_no_patterns_is_noop() {
        assert!(extract_accounting_prefix("PUR 25-0024_x.pdf", "", &[]).is_none());
    }
}
