use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ledger::model::coerce_macro;

/// Which provider a search result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Local,
    External,
    UserDb,
}

impl Source {
    pub fn label(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::External => "external",
            Self::UserDb => "userdb",
        }
    }

    /// Canonical merge order: the curated user database outranks the bundled
    /// dataset, which outranks the external API. Lower merges first and wins
    /// de-duplication ties.
    pub fn priority(self) -> u8 {
        match self {
            Self::UserDb => 0,
            Self::Local => 1,
            Self::External => 2,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Normalized search result. Ephemeral; not persisted. Fiber, sugar and
/// sodium are display passthroughs only and never enter ledger arithmetic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodRecord {
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    #[serde(default = "FoodRecord::default_category")]
    pub category: String,
    pub source: Source,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiber: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sugar: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sodium: Option<f64>,
}

impl FoodRecord {
    pub fn default_category() -> String {
        "general".to_string()
    }

    /// Normalization boundary for adapter output: drops records without a
    /// name and coerces every macro to a finite non-negative value.
    pub fn sanitized(mut self) -> Option<Self> {
        let name = self.name.trim();
        if name.is_empty() {
            return None;
        }
        self.name = name.to_string();
        self.calories = coerce_macro(self.calories);
        self.protein = coerce_macro(self.protein);
        self.carbs = coerce_macro(self.carbs);
        self.fats = coerce_macro(self.fats);
        Some(self)
    }

    /// De-duplication key: lowercase name with non-alphanumerics stripped.
    pub fn dedup_key(&self) -> String {
        self.name
            .to_lowercase()
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect()
    }
}
