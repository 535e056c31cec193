//! End-to-end processing of a single document: text in, canonical name out.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::classify::{classify, expand_folder_template, ClassificationResult};
use crate::error::PipelineError;
use crate::extract::{run_extractors, ExtractionContext};
use crate::models::{ConfigRepository, Field, InvoiceRecord};
use crate::naming::{self, NamingResult, UNKNOWN_SUPPLIER};
use crate::text::MIN_USABLE_CHARS;

/// Weight of each field in the overall confidence score. Dates and suppliers
/// carry the most weight because they drive filing decisions.
const CONFIDENCE_WEIGHTS: [(Field, f32); 5] = [
    (Field::Supplier, 0.25),
    (Field::InvoiceNumber, 0.20),
    (Field::Date, 0.25),
    (Field::Amount, 0.20),
    (Field::Currency, 0.10),
];

/// Everything the pipeline learned about one document.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub record: InvoiceRecord,
    /// `None` when the invoice date could not be extracted.
    pub classification: Option<ClassificationResult>,
    /// Filing folder from the entity's folder template, e.g. `2025/Q1`.
    pub folder: Option<String>,
    pub naming: NamingResult,
    /// Weighted overall confidence in 0.0 - 1.0.
    pub confidence: f32,
    /// Human-readable notes about degraded fields.
    pub warnings: Vec<String>,
}

/// Single-document processing pipeline. Stateless apart from configuration;
/// one instance can process any number of documents.
pub struct Pipeline<'a, C: ConfigRepository> {
    config: &'a C,
}

impl<'a, C: ConfigRepository> Pipeline<'a, C> {
    pub fn new(config: &'a C) -> Self {
        Self { config }
    }

    /// Process one document. `entity_id` of `None` selects the configured
    /// default entity.
    pub fn process(
        &self,
        source_name: &str,
        raw_text: &str,
        entity_id: Option<&str>,
    ) -> Result<PipelineOutput, PipelineError> {
        let entity = match entity_id {
            Some(id) => self
                .config
                .entity(id)
                .ok_or_else(|| PipelineError::UnknownEntity(id.to_string()))?,
            None => self
                .config
                .default_entity()
                .ok_or_else(|| PipelineError::UnknownEntity("<default>".to_string()))?,
        };

        let usable = raw_text.chars().filter(|c| !c.is_whitespace()).count();
        if usable < MIN_USABLE_CHARS {
            return Err(PipelineError::OcrFailure(source_name.to_string()));
        }

        info!(source = source_name, entity = %entity.id, "extracting fields");
        let mut record = InvoiceRecord::new(source_name, raw_text);
        let ctx = ExtractionContext::for_entity(entity, self.config.suppliers());
        run_extractors(&mut record, &ctx);

        debug!(source = source_name, "classifying fiscal quarter");
        let classification = record.date().map(|date| classify(date, &entity.calendar));
        if let Some(c) = &classification {
            debug!(quarter = %c.quarter_label, fiscal_year = c.fiscal_year, "classified");
        }
        let folder = classification
            .as_ref()
            .map(|c| expand_folder_template(&entity.calendar.folder_template, c));

        debug!(source = source_name, "rendering name");
        let naming = naming::render(&record, classification.as_ref());

        let confidence = overall_confidence(&record);
        let warnings = collect_warnings(&record);
        for w in &warnings {
            warn!(source = source_name, "{w}");
        }

        info!(
            source = source_name,
            name = %naming.file_name,
            confidence,
            "document processed"
        );

        Ok(PipelineOutput {
            record,
            classification,
            folder,
            naming,
            confidence,
            warnings,
        })
    }
}

/// Weighted average over the extracted fields. A missing field contributes
/// zero at full weight, so the score drops as extraction degrades. A supplier
/// that fell through to the placeholder counts as missing.
fn overall_confidence(record: &InvoiceRecord) -> f32 {
    let mut total = 0.0;
    for (field, weight) in CONFIDENCE_WEIGHTS {
        let score = match field {
            Field::Supplier if supplier_is_placeholder(record) => 0.0,
            _ => record.confidence(field).unwrap_or(0.0),
        };
        total += score * weight;
    }
    total.clamp(0.0, 1.0)
}

fn supplier_is_placeholder(record: &InvoiceRecord) -> bool {
    match record.supplier() {
        None => true,
        Some(s) => s == UNKNOWN_SUPPLIER,
    }
}

fn collect_warnings(record: &InvoiceRecord) -> Vec<String> {
    record
        .missing_fields()
        .into_iter()
        .filter(|f| *f != Field::AccountingPrefix)
        .map(|f| format!("field not extracted: {}", f.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConfigStore;
    use crate::models::{DateOrder, EntityConfig, FiscalCalendar, SupplierTemplate};
    use pretty_assertions::assert_eq;

    fn uae_config() -> ConfigStore {
        ConfigStore {
            entities: vec![EntityConfig {
                id: "uae".to_string(),
                name: "UAE Branch".to_string(),
                calendar: FiscalCalendar {
                    quarter_start_month: 2,
                    folder_template: "{year}/{quarter}".to_string(),
                },
                default_currency: Some("AED".to_string()),
                date_order: DateOrder::Dmy,
                accounting_prefixes: vec![r"PUR \d{2}-\d{4}".to_string()],
            }],
            suppliers: vec![SupplierTemplate {
                id: "etisalat".to_string(),
                display_name: "Etisalat".to_string(),
                detection_patterns: vec!["etisalat".to_string()],
                default_currency: Some("AED".to_string()),
                invoice_number_pattern: None,
                date_labels: Vec::new(),
            }],
            default_entity: Some("uae".to_string()),
        }
    }

    const ETISALAT_TEXT: &str = "\
Etisalat UAE
Tax Invoice# INV1965257146
Invoice Date: 15/02/2025
Due Date: 15/03/2025
Total Amount Due: AED 960.34
";

    #[test]
    fn test_end_to_end_known_supplier() {
        let config = uae_config();
        let pipeline = Pipeline::new(&config);

        let out = pipeline
            .process("scan001.pdf", ETISALAT_TEXT, Some("uae"))
            .unwrap();

        assert_eq!(
            out.naming.file_name,
            "Etisalat_#INV1965257146_15-02-2025_960.34AED_Q1-2025.pdf"
        );
        assert!(out.confidence > 0.8);
        assert!(out.warnings.is_empty());
        assert_eq!(out.folder.as_deref(), Some("2025/Q1"));
    }

    #[test]
    fn test_default_entity_used_when_none_named() {
        let config = uae_config();
        let pipeline = Pipeline::new(&config);

        let out = pipeline.process("scan001.pdf", ETISALAT_TEXT, None).unwrap();
        assert!(out.naming.file_name.ends_with("_Q1-2025.pdf"));
    }

    #[test]
    fn test_unknown_entity_is_an_error() {
        let config = uae_config();
        let pipeline = Pipeline::new(&config);

        assert!(matches!(
            pipeline.process("scan001.pdf", ETISALAT_TEXT, Some("nope")),
            Err(PipelineError::UnknownEntity(id)) if id == "nope"
        ));
    }

    #[test]
    fn test_blank_text_is_ocr_failure() {
        let config = uae_config();
        let pipeline = Pipeline::new(&config);

        assert!(matches!(
            pipeline.process("blank.pdf", "   \n ", Some("uae")),
            Err(PipelineError::OcrFailure(_))
        ));
    }

    #[test]
    fn test_missing_date_skips_quarter_and_warns() {
        let config = uae_config();
        let pipeline = Pipeline::new(&config);

        let text = "Etisalat UAE\nTax Invoice# INV1965257146\nTotal Amount Due: AED 960.34\n";
        let out = pipeline.process("scan002.pdf", text, Some("uae")).unwrap();

        assert!(out.classification.is_none());
        assert!(out.folder.is_none());
        assert!(out.naming.file_name.contains("NoDate"));
        assert!(!out.naming.file_name.contains("_Q"));
        assert!(out.warnings.iter().any(|w| w.contains("date")));
    }

    #[test]
    fn test_confidence_drops_with_missing_fields() {
        let config = uae_config();
        let pipeline = Pipeline::new(&config);

        let full = pipeline
            .process("a.pdf", ETISALAT_TEXT, Some("uae"))
            .unwrap();
        let partial = pipeline
            .process("b.pdf", "Some unknown letterhead text here\nnothing else of note\n", Some("uae"))
            .unwrap();

        assert!(partial.confidence < full.confidence);
    }
}
