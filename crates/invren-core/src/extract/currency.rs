//! Currency extraction: explicit code or symbol, else the entity default.

use super::patterns::{CURRENCY_CODE, CURRENCY_SPELLINGS};
use super::ExtractionMatch;
use crate::models::SupplierTemplate;

/// Confidence when the currency is inferred rather than read from the text.
const INFERRED_CONFIDENCE: f32 = 0.5;

/// Extract the invoice currency.
///
/// An explicit ISO code in the text wins with confidence 1.0; named
/// spellings and symbols are next (0.9); otherwise the supplier's or
/// entity's default currency is used with a lower confidence, and no
/// currency at all is a no-op.
pub fn extract_currency(
    text: &str,
    template: Option<&SupplierTemplate>,
    default_currency: Option<&str>,
) -> Option<ExtractionMatch<String>> {
    if let Some(m) = CURRENCY_CODE.find(text) {
        return Some(ExtractionMatch::new(m.as_str().to_string(), 1.0, m.as_str()));
    }

    for (re, code) in CURRENCY_SPELLINGS.iter() {
        if let Some(m) = re.find(text) {
            return Some(ExtractionMatch::new(code.to_string(), 0.9, m.as_str()));
        }
    }

    let default = template
        .and_then(|t| t.default_currency.as_deref())
        .or(default_currency)?;

    Some(ExtractionMatch::new(
        default.to_string(),
        INFERRED_CONFIDENCE,
        "entity default",
    ))
}
