use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::source::SourceKind;

/// One ingredient line of an extracted recipe.
///
/// `amount` is always numeric: fractional textual amounts such as "1/2" are
/// coerced to 0.5 during normalization and never survive as strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ingredient {
    pub name: String,
    pub amount: f64,
    pub unit: String,
    pub optional: bool,
}

/// The canonical structured recipe produced by an import.
///
/// `ingredients` and `instructions` are never absent; a recipe with nothing
/// usable in either is still representable as empty lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedRecipe {
    pub title: String,
    pub description: String,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<String>,
    pub servings: u32,
    pub prep_time: Option<String>,
    pub cook_time: Option<String>,
    pub difficulty: Option<String>,
    pub cuisine: Option<String>,
    pub category: Option<String>,
    /// Free-form tags from the model plus one provenance tag recording which
    /// extraction technique produced this result.
    pub tags: Vec<String>,
    pub source_url: String,
    pub source_platform: SourceKind,
    /// Reliability score in [0,1], discounted when only a visual fallback
    /// (thumbnail analysis) was available.
    pub extraction_confidence: f64,
    pub extracted_at: DateTime<Utc>,
}
