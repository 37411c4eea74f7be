use chrono::Utc;
use log::debug;
use serde_json::Value;

use crate::bundle::ExtractionMethod;
use crate::error::ImportError;
use crate::model::{ExtractedRecipe, Ingredient};
use crate::source::SourceKind;

/// Confidence assumed when the model omits the field.
const DEFAULT_CONFIDENCE: f64 = 0.7;
/// Thumbnail-only extraction is noticeably less reliable than reading text
/// or watching the video; its confidence is discounted by this factor.
const VISUAL_FALLBACK_PENALTY: f64 = 0.8;
const DEFAULT_SERVINGS: u32 = 4;

/// Convert the model's raw JSON into the canonical recipe shape.
///
/// Refuses to synthesize a result: an explicit error marker or a missing
/// title is a typed failure, never a partial recipe.
pub fn normalize(
    raw: &Value,
    source_url: &str,
    platform: SourceKind,
    method: ExtractionMethod,
) -> Result<ExtractedRecipe, ImportError> {
    if let Some(error) = raw.get("error").and_then(Value::as_str) {
        return Err(ImportError::ModelDeclined(error.to_string()));
    }

    let title = raw["title"]
        .as_str()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            ImportError::UnsupportedSource("extraction produced no recipe title".to_string())
        })?
        .to_string();

    let ingredients = raw["ingredients"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .enumerate()
                .map(|(i, item)| normalize_ingredient(item, i))
                .collect()
        })
        .unwrap_or_default();

    let instructions = raw["instructions"]
        .as_array()
        .map(|steps| {
            steps
                .iter()
                .filter_map(|step| match step {
                    Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                    Value::Object(o) => o.get("text").and_then(Value::as_str).map(String::from),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    let mut confidence = raw["confidence"].as_f64().unwrap_or(DEFAULT_CONFIDENCE);
    if method == ExtractionMethod::VisualFallback {
        confidence *= VISUAL_FALLBACK_PENALTY;
    }
    let confidence = confidence.clamp(0.0, 1.0);

    let mut tags: Vec<String> = raw["tags"]
        .as_array()
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();
    tags.push(method.provenance_tag().to_string());

    Ok(ExtractedRecipe {
        title,
        description: raw["description"].as_str().unwrap_or("").to_string(),
        ingredients,
        instructions,
        servings: raw["servings"]
            .as_u64()
            .and_then(|s| u32::try_from(s).ok())
            .unwrap_or(DEFAULT_SERVINGS),
        prep_time: string_field(raw, "prepTime"),
        cook_time: string_field(raw, "cookTime"),
        difficulty: string_field(raw, "difficulty"),
        cuisine: string_field(raw, "cuisine"),
        category: string_field(raw, "category"),
        tags,
        source_url: source_url.to_string(),
        source_platform: platform,
        extraction_confidence: confidence,
        extracted_at: Utc::now(),
    })
}

fn normalize_ingredient(item: &Value, index: usize) -> Ingredient {
    let name = item["name"]
        .as_str()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(String::from)
        .unwrap_or_else(|| format!("Ingredient {}", index + 1));

    Ingredient {
        name,
        amount: parse_amount(&item["amount"]),
        unit: item["unit"].as_str().unwrap_or("").to_string(),
        optional: item["optional"].as_bool().unwrap_or(false),
    }
}

fn string_field(raw: &Value, key: &str) -> Option<String> {
    raw[key]
        .as_str()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Coerce an amount to a number. Accepts plain numbers, decimal strings,
/// fractions ("1/2") and mixed numbers ("1 1/2"); anything unparseable
/// defaults to 1.
pub fn parse_amount(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(1.0),
        Value::String(s) => parse_amount_str(s).unwrap_or_else(|| {
            debug!("unparseable ingredient amount {s:?}, defaulting to 1");
            1.0
        }),
        _ => 1.0,
    }
}

fn parse_amount_str(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(n) = s.parse::<f64>() {
        return Some(n);
    }

    // Mixed number: "1 1/2"
    if let Some((whole, fraction)) = s.split_once(' ') {
        if let (Ok(w), Some(f)) = (whole.parse::<f64>(), parse_fraction(fraction)) {
            return Some(w + f);
        }
    }

    parse_fraction(s)
}

fn parse_fraction(s: &str) -> Option<f64> {
    let (numerator, denominator) = s.split_once('/')?;
    let n = numerator.trim().parse::<f64>().ok()?;
    let d = denominator.trim().parse::<f64>().ok()?;
    if d == 0.0 {
        return None;
    }
    Some(n / d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize_ok(raw: Value) -> ExtractedRecipe {
        normalize(
            &raw,
            "https://example.com/r",
            SourceKind::Web,
            ExtractionMethod::Text,
        )
        .unwrap()
    }

    #[test]
    fn test_amount_coercion_table() {
        let cases = [
            (json!("1/2"), 0.5),
            (json!("0.5"), 0.5),
            (json!(""), 1.0),
            (json!("abc"), 1.0),
            (json!(2), 2.0),
            (json!(0.25), 0.25),
            (json!("1 1/2"), 1.5),
            (json!(null), 1.0),
            (json!("3/0"), 1.0),
        ];
        for (input, expected) in cases {
            assert_eq!(parse_amount(&input), expected, "input {input}");
        }
    }

    #[test]
    fn test_error_marker_is_model_declined() {
        let raw = json!({"error": "content contains no recipe"});
        let result = normalize(
            &raw,
            "https://example.com",
            SourceKind::Web,
            ExtractionMethod::Text,
        );
        assert!(matches!(result, Err(ImportError::ModelDeclined(_))));
    }

    #[test]
    fn test_missing_title_is_refused() {
        let raw = json!({"ingredients": [], "instructions": ["stir"]});
        let result = normalize(
            &raw,
            "https://example.com",
            SourceKind::Web,
            ExtractionMethod::Text,
        );
        assert!(matches!(result, Err(ImportError::UnsupportedSource(_))));
    }

    #[test]
    fn test_ingredient_defaults() {
        let recipe = normalize_ok(json!({
            "title": "Rice",
            "ingredients": [
                {"name": "rice", "amount": "1/2", "unit": "cup"},
                {"amount": 2},
                {"name": "  "}
            ]
        }));

        assert_eq!(recipe.ingredients[0].amount, 0.5);
        assert_eq!(recipe.ingredients[1].name, "Ingredient 2");
        assert_eq!(recipe.ingredients[1].amount, 2.0);
        assert_eq!(recipe.ingredients[2].name, "Ingredient 3");
        assert_eq!(recipe.ingredients[2].amount, 1.0);
        assert!(!recipe.ingredients[0].optional);
    }

    #[test]
    fn test_lists_never_absent() {
        let recipe = normalize_ok(json!({"title": "Bare"}));
        assert!(recipe.ingredients.is_empty());
        assert!(recipe.instructions.is_empty());
    }

    #[test]
    fn test_confidence_default_and_clamp() {
        assert_eq!(
            normalize_ok(json!({"title": "A"})).extraction_confidence,
            0.7
        );
        assert_eq!(
            normalize_ok(json!({"title": "A", "confidence": 7.5})).extraction_confidence,
            1.0
        );
        assert_eq!(
            normalize_ok(json!({"title": "A", "confidence": -0.2})).extraction_confidence,
            0.0
        );
    }

    #[test]
    fn test_visual_fallback_discount_and_tag() {
        let raw = json!({"title": "A", "confidence": 0.9});
        let visual = normalize(
            &raw,
            "https://example.com",
            SourceKind::TikTok,
            ExtractionMethod::VisualFallback,
        )
        .unwrap();
        let textual = normalize(
            &raw,
            "https://example.com",
            SourceKind::TikTok,
            ExtractionMethod::Text,
        )
        .unwrap();

        assert!(visual.extraction_confidence < textual.extraction_confidence);
        assert!((visual.extraction_confidence - 0.72).abs() < 1e-9);
        assert!(visual.tags.contains(&"visual-fallback".to_string()));
        assert!(textual.tags.contains(&"extracted-from-text".to_string()));
    }

    #[test]
    fn test_instruction_object_steps() {
        let recipe = normalize_ok(json!({
            "title": "Steps",
            "instructions": ["Chop", {"text": "Fry"}, "", 4]
        }));
        assert_eq!(recipe.instructions, vec!["Chop", "Fry"]);
    }

    #[test]
    fn test_servings_default() {
        assert_eq!(normalize_ok(json!({"title": "A"})).servings, 4);
        assert_eq!(
            normalize_ok(json!({"title": "A", "servings": 2})).servings,
            2
        );
    }

    #[test]
    fn test_servings_out_of_range_falls_back_to_default() {
        // A value past u32::MAX must not wrap into a bogus count.
        let raw = json!({"title": "A", "servings": 99_999_999_999u64});
        assert_eq!(normalize_ok(raw).servings, 4);
    }
}
