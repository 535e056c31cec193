//! Configuration structures for entities, fiscal calendars, and suppliers.

use std::fs;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Per-entity fiscal calendar definition.
///
/// `quarter_start_month` is the calendar month in which Q1 begins. A
/// non-January start gives year-rollover semantics: months before the start
/// month belong to the previous fiscal year's Q4.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiscalCalendar {
    /// Calendar month (1-12) in which Q1 begins.
    pub quarter_start_month: u32,

    /// Folder template with `{year}`, `{quarter}`, `{quarter_num}` placeholders.
    #[serde(default = "default_folder_template")]
    pub folder_template: String,
}

fn default_folder_template() -> String {
    "{year}/{quarter}".to_string()
}

impl Default for FiscalCalendar {
    fn default() -> Self {
        Self {
            quarter_start_month: 1,
            folder_template: default_folder_template(),
        }
    }
}

/// Locale hint for disambiguating numeric dates such as 03/04/2025.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateOrder {
    /// Day first (03/04/2025 = 3 April).
    #[default]
    Dmy,
    /// Month first (03/04/2025 = 4 March).
    Mdy,
}

/// Per-entity configuration, immutable after load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityConfig {
    pub id: String,
    pub name: String,

    #[serde(default)]
    pub calendar: FiscalCalendar,

    /// Currency assumed when none is found in the text.
    #[serde(default)]
    pub default_currency: Option<String>,

    /// Locale hint for ambiguous numeric dates.
    #[serde(default)]
    pub date_order: DateOrder,

    /// Regex patterns for recognized accounting prefixes,
    /// e.g. `PUR \d{2}-\d{4}_` or `Pyt Vch \d{4}-\d{4}_`.
    #[serde(default)]
    pub accounting_prefixes: Vec<String>,
}

/// A known-supplier detection and extraction template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierTemplate {
    pub id: String,

    /// Name used in the generated file name.
    pub display_name: String,

    /// Case-insensitive substrings whose presence identifies this supplier.
    pub detection_patterns: Vec<String>,

    /// Currency this supplier always bills in, if any.
    #[serde(default)]
    pub default_currency: Option<String>,

    /// Supplier-specific invoice number pattern with one capture group.
    #[serde(default)]
    pub invoice_number_pattern: Option<String>,

    /// Extra labels that precede the invoice date on this supplier's documents.
    #[serde(default)]
    pub date_labels: Vec<String>,
}

/// Read-only access to entity and supplier configuration.
///
/// Passed explicitly into the pipeline so it can be tested against an
/// in-memory store instead of a live host environment.
pub trait ConfigRepository {
    /// Look up an entity by id. Unknown ids are an error at the call site,
    /// never a silent default.
    fn entity(&self, id: &str) -> Option<&EntityConfig>;

    /// The entity used when a request names none.
    fn default_entity(&self) -> Option<&EntityConfig>;

    /// All known supplier templates.
    fn suppliers(&self) -> &[SupplierTemplate];
}

/// Configuration store backed by a JSON file (or built in memory for tests).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigStore {
    pub entities: Vec<EntityConfig>,
    pub suppliers: Vec<SupplierTemplate>,
    pub default_entity: Option<String>,
}

impl ConfigStore {
    /// Load and validate a configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let store: ConfigStore =
            serde_json::from_str(&raw).map_err(|e| ConfigError::Parse {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        store.validate()?;
        Ok(store)
    }

    /// A minimal store with a single standard-calendar entity, used when no
    /// configuration file is supplied.
    pub fn builtin() -> Self {
        Self {
            entities: vec![EntityConfig {
                id: "default".to_string(),
                name: "Default".to_string(),
                calendar: FiscalCalendar::default(),
                default_currency: None,
                date_order: DateOrder::Dmy,
                accounting_prefixes: Vec::new(),
            }],
            suppliers: Vec::new(),
            default_entity: Some("default".to_string()),
        }
    }

    /// Validate every entity and supplier template.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for entity in &self.entities {
            if !(1..=12).contains(&entity.calendar.quarter_start_month) {
                return Err(ConfigError::InvalidQuarterStart {
                    entity: entity.id.clone(),
                    month: entity.calendar.quarter_start_month,
                });
            }

            if let Some(placeholder) =
                unknown_placeholder(&entity.calendar.folder_template)
            {
                return Err(ConfigError::UnknownPlaceholder {
                    entity: entity.id.clone(),
                    placeholder,
                });
            }

            for pattern in &entity.accounting_prefixes {
                check_pattern(pattern, &format!("entity {}", entity.id))?;
            }
        }

        for supplier in &self.suppliers {
            if let Some(pattern) = &supplier.invoice_number_pattern {
                check_pattern(pattern, &format!("supplier {}", supplier.id))?;
            }
        }

        // A dangling default entity id must fail at load time, not resolve
        // to some other entity later.
        if let Some(id) = &self.default_entity {
            if !self.entities.iter().any(|e| e.id == *id) {
                return Err(ConfigError::UnknownEntity(id.clone()));
            }
        }

        Ok(())
    }
}

fn check_pattern(pattern: &str, context: &str) -> Result<(), ConfigError> {
    Regex::new(pattern)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            context: context.to_string(),
            reason: e.to_string(),
        })
}

/// Return the first `{placeholder}` in a folder template that the classifier
/// does not know how to fill.
fn unknown_placeholder(template: &str) -> Option<String> {
    let known = ["year", "quarter", "quarter_num"];
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let tail = &rest[start + 1..];
        let end = tail.find('}')?;
        let name = &tail[..end];
        if !known.contains(&name) {
            return Some(name.to_string());
        }
        rest = &tail[end + 1..];
    }
    None
}

impl ConfigRepository for ConfigStore {
    fn entity(&self, id: &str) -> Option<&EntityConfig> {
        self.entities.iter().find(|e| e.id == id)
    }

    fn default_entity(&self) -> Option<&EntityConfig> {
        self.default_entity.as_deref().and_then(|id| self.entity(id))
    }

    fn suppliers(&self) -> &[SupplierTemplate] {
        &self.suppliers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: &str, start: u32) -> EntityConfig {
        EntityConfig {
            id: id.to_string(),
            name: id.to_string(),
            calendar: FiscalCalendar {
                quarter_start_month: start,
                folder_template: "{year}/{quarter}".to_string(),
            },
            default_currency: None,
            date_order: DateOrder::Dmy,
            accounting_prefixes: Vec::new(),
        }
    }

    #[test]
    fn test_validate_accepts_valid_store() {
        let store = ConfigStore {
            entities: vec![entity("acme", 2)],
            suppliers: Vec::new(),
            default_entity: Some("acme".to_string()),
        };
        assert!(store.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_month() {
        let store = ConfigStore {
            entities: vec![entity("acme", 13)],
            suppliers: Vec::new(),
            default_entity: None,
        };
        assert!(matches!(
            store.validate(),
            Err(ConfigError::InvalidQuarterStart { month: 13, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_prefix_pattern() {
        let mut e = entity("acme", 1);
        e.accounting_prefixes.push("PUR [".to_string());
        let store = ConfigStore {
            entities: vec![e],
            suppliers: Vec::new(),
            default_entity: None,
        };
        assert!(matches!(
            store.validate(),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_unknown_placeholder() {
        let mut e = entity("acme", 1);
        e.calendar.folder_template = "{year}/{month}".to_string();
        let store = ConfigStore {
            entities: vec![e],
            suppliers: Vec::new(),
            default_entity: None,
        };
        assert!(matches!(
            store.validate(),
            Err(ConfigError::UnknownPlaceholder { .. })
        ));
    }

    #[test]
    fn test_entity_lookup_has_no_silent_default() {
        let store = ConfigStore {
            entities: vec![entity("acme", 1)],
            suppliers: Vec::new(),
            default_entity: Some("acme".to_string()),
        };
        assert!(store.entity("nope").is_none());
        assert_eq!(store.default_entity().unwrap().id, "acme");
    }

    #[test]
    fn test_validate_rejects_dangling_default_entity() {
        let store = ConfigStore {
            entities: vec![entity("acme", 1)],
            suppliers: Vec::new(),
            default_entity: Some("gone".to_string()),
        };
        assert!(matches!(
            store.validate(),
            Err(ConfigError::UnknownEntity(id)) if id == "gone"
        ));

        // The accessor never substitutes another entity for a missing id.
        assert!(store.default_entity().is_none());
    }
}
