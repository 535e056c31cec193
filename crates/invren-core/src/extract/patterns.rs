//! Common regex patterns for invoice field extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Numeric date patterns. The first is order-ambiguous (DMY or MDY,
    // resolved by the entity's locale hint), the second is ISO.
    pub static ref DATE_NUMERIC: Regex = Regex::new(
        r"\b(\d{1,2})[./\-](\d{1,2})[./\-](\d{4}|\d{2})\b"
    ).unwrap();

    pub static ref DATE_YMD: Regex = Regex::new(
        r"\b(\d{4})[./\-](\d{1,2})[./\-](\d{1,2})\b"
    ).unwrap();

    // Textual month: "15 February 2025", "Feb 15, 2025", "15 Feb 25"
    pub static ref DATE_TEXTUAL_DMY: Regex = Regex::new(
        r"(?i)\b(\d{1,2})\s+(January|February|March|April|May|June|July|August|September|October|November|December|Jan|Feb|Mar|Apr|Jun|Jul|Aug|Sep|Sept|Oct|Nov|Dec)\.?,?\s+(\d{4}|\d{2})\b"
    ).unwrap();

    pub static ref DATE_TEXTUAL_MDY: Regex = Regex::new(
        r"(?i)\b(January|February|March|April|May|June|July|August|September|October|November|December|Jan|Feb|Mar|Apr|Jun|Jul|Aug|Sep|Sept|Oct|Nov|Dec)\.?\s+(\d{1,2}),?\s+(\d{4}|\d{2})\b"
    ).unwrap();

    // Ordinal suffixes: 22nd -> 22, 1st -> 1
    pub static ref ORDINAL_SUFFIX: Regex = Regex::new(
        r"(\d+)(?:st|nd|rd|th)\b"
    ).unwrap();

    // Labels that precede the invoice date, most specific first.
    pub static ref INVOICE_DATE_LABELS: Vec<Regex> = vec![
        Regex::new(r"(?i)Invoice\s*Date\s*:?\s*(.+)").unwrap(),
        Regex::new(r"(?i)Bill\s*(?:issue\s*)?date\s*:?\s*(.+)").unwrap(),
        Regex::new(r"(?i)Date\s*of\s*issue\s*:?\s*(.+)").unwrap(),
        Regex::new(r"(?i)Tax\s*Invoice\s*(?:Issue\s*)?Date\s*:?\s*(.+)").unwrap(),
        Regex::new(r"(?i)Invoice\s*issued\s*:?\s*(.+)").unwrap(),
        Regex::new(r"(?i)Facture\s*date\s*:?\s*(.+)").unwrap(),
        Regex::new(r"(?i)Date\s*(?:de\s*)?(?:la\s*)?facture\s*:?\s*(.+)").unwrap(),
        Regex::new(r"(?i)\bDate\s*:?\s*(.+)").unwrap(),
    ];

    // Labels whose nearby date must NOT be taken as the invoice date.
    pub static ref NEGATIVE_DATE_LABELS: Vec<Regex> = vec![
        Regex::new(r"(?i)Due\s*Date").unwrap(),
        Regex::new(r"(?i)Payment\s*Date").unwrap(),
        Regex::new(r"(?i)Delivery\s*Date").unwrap(),
        Regex::new(r"(?i)Expiry\s*Date").unwrap(),
        Regex::new(r"(?i)Ship\s*Date").unwrap(),
    ];

    // Currency-shaped numeric token: optional thousands groups (space, comma
    // or dot) followed by a two-digit fraction with either separator.
    pub static ref AMOUNT_PATTERN: Regex = Regex::new(
        r"(\d{1,3}(?:[\s\u{00a0},.]?\d{3})*)[,.](\d{1,2})\b"
    ).unwrap();

    // Labels that precede the payable total, most specific first. Each entry
    // pairs the label with the confidence given to an amount found on its line.
    pub static ref TOTAL_LABELS: Vec<(Regex, f32)> = vec![
        (Regex::new(r"(?i)Total\s*Amount\s*Due[\s:]*(.+)").unwrap(), 0.95),
        (Regex::new(r"(?i)Amount\s*Due[\s:]*(.+)").unwrap(), 0.95),
        (Regex::new(r"(?i)Grand\s*Total[\s:]*(.+)").unwrap(), 0.95),
        (Regex::new(r"(?i)Total\s*Amount\s*(?:Due|Payable)[\s:]*(.+)").unwrap(), 0.95),
        (Regex::new(r"(?i)Total\s*Payable[\s:]*(.+)").unwrap(), 0.95),
        (Regex::new(r"(?i)Balance[\s:]*(.+)").unwrap(), 0.85),
        (Regex::new(r"(?i)Total\s*(?:incl|inc|with)\w*\s*(?:VAT|Tax)[\s:]*(.+)").unwrap(), 0.9),
        (Regex::new(r"(?i)Total\s*(?:TTC|[àa]\s*payer)[\s:]*(.+)").unwrap(), 0.9),
        (Regex::new(r"(?i)Montant\s*total[\s:]*(.+)").unwrap(), 0.9),
        (Regex::new(r"(?i)\bTotal[\s:]*(.+)").unwrap(), 0.7),
        (Regex::new(r"(?i)Subtotal[\s:]*(.+)").unwrap(), 0.6),
    ];

    // Generic invoice number patterns, most specific first, paired with
    // the confidence of a match.
    pub static ref INVOICE_NUMBER_LABELS: Vec<(Regex, f32)> = vec![
        (Regex::new(r"(?i)Document\s*Number\s*:\s*([A-Za-z0-9-]+)").unwrap(), 0.9),
        (Regex::new(r"(?i)Tax\s*Invoice\s*Number\s*:?\s*([A-Za-z0-9-]+)").unwrap(), 0.9),
        (Regex::new(r"(?i)Tax\s*Invoice\s*No\.?\s*:?\s*([A-Za-z0-9-]+)").unwrap(), 0.9),
        (Regex::new(r"(?i)Tax\s*Invoice#\s*([A-Za-z0-9-]+)").unwrap(), 0.9),
        (Regex::new(r"(?i)Invoice\s*number\s*:?\s*([A-Za-z0-9/-]+)").unwrap(), 0.85),
        (Regex::new(r"(?i)Invoice\s*#\s*([A-Za-z0-9/-]+)").unwrap(), 0.85),
        (Regex::new(r"(?i)Invoice\s*No\.?\s*:?\s*([A-Za-z0-9/-]+)").unwrap(), 0.85),
        (Regex::new(r"(?i)Invoice\s*ID\s*:?\s*([A-Za-z0-9-]+)").unwrap(), 0.85),
        (Regex::new(r"(?i)\bInv\.?\s*(?:#|No\.?|:)\s*:?\s*([A-Za-z0-9/-]+)").unwrap(), 0.8),
        (Regex::new(r"(?i)Num[ée]ro\s*(?:de\s*)?(?:la\s*)?facture\s*:?\s*([A-Za-z0-9/-]+)").unwrap(), 0.8),
        (Regex::new(r"(?i)Facture\s*(?:n[o°]|#)\s*:?\s*([A-Za-z0-9/-]+)").unwrap(), 0.8),
        (Regex::new(r"(?i)Bill\s*number\s*:?\s*([A-Za-z0-9]+)").unwrap(), 0.75),
        (Regex::new(r"(?i)Your\s*bill\s*number\s*:?\s*([0-9]+)").unwrap(), 0.75),
        (Regex::new(r"(?i)Receipt\s*#?\s*:?\s*([A-Za-z0-9-]+)").unwrap(), 0.6),
        (Regex::new(r"(?i)Customer\s*Invoices?\s*([A-Za-z0-9/]+)").unwrap(), 0.6),
    ];

    // Letterhead heuristic: company-like suffixes and lines to skip.
    pub static ref COMPANY_SUFFIXES: Regex = Regex::new(
        r"(?i)\b(Inc\.?|LLC|Ltd\.?|Limited|Corp\.?|Corporation|Company|Co\.?|Group|PJSC|GmbH|S\.?A\.?R\.?L\.?|Pvt\.?|PLC|SAS|SARL|SA|Srl|B\.?V\.?)\b"
    ).unwrap();

    pub static ref LETTERHEAD_SKIP: Regex = Regex::new(
        r"(?i)^\s*(Invoice|Receipt|Bill\b|Statement|Tax\s|Date|Total|Amount|Page\s|Tel\b|Phone|Email|Address|Street|P\.?O\.?\s*Box|www\.|http|Subtotal|Due\s|Payment|Description|Quantity|Unit|Price|Item|Service|IBAN|SWIFT|Account|Bank|Reference)"
    ).unwrap();

    // Three-letter currency code as a standalone token.
    pub static ref CURRENCY_CODE: Regex = Regex::new(
        r"\b(USD|EUR|AED|GBP|INR|SAR|MAD|CHF|CAD|AUD|JPY|SGD|QAR|KWD|BHD|OMR|EGP|PKR)\b"
    ).unwrap();
}

lazy_static! {
    // Currency spellings searched for when no ISO code appears, ordered so
    // that the specific beats the generic ("Dirham marocain" before plain
    // "Dirham", a bare `$` last).
    pub static ref CURRENCY_SPELLINGS: Vec<(Regex, &'static str)> = vec![
        (Regex::new(r"(?i)Dirham\s+marocain").unwrap(), "MAD"),
        (Regex::new(r"(?i)\bAED\b|Dirham").unwrap(), "AED"),
        (Regex::new(r"(?i)\bUSD\b|US\s*\$|Dollars?\b").unwrap(), "USD"),
        (Regex::new(r"(?i)\bEUR\b|Euros?\b|€").unwrap(), "EUR"),
        (Regex::new(r"(?i)\bGBP\b|£|Pound\s*Sterling").unwrap(), "GBP"),
        (Regex::new(r"(?i)\bINR\b|₹|Rupee").unwrap(), "INR"),
        (Regex::new(r"(?i)\bSAR\b|﷼|Saudi\s*Riyal").unwrap(), "SAR"),
        (Regex::new(r"(?i)\bCHF\b|Swiss\s*Franc").unwrap(), "CHF"),
        (Regex::new(r"\$").unwrap(), "USD"),
    ];
}
