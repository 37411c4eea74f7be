/// System prompt for turning extracted content into a structured recipe.
///
/// The model must answer with a single JSON object. The `error` field is the
/// explicit decline marker the normalizer checks before anything else.
pub const EXTRACTION_PROMPT: &str = r#"You are a recipe extraction assistant.
You receive content captured from a web page, social media post or video
(title, caption, transcript, page text or embedded recipe markup), and
sometimes an attached video or image. Reconstruct the recipe being made.

Respond with exactly one JSON object, no other text:
{
  "title": "recipe name",
  "description": "one or two sentences",
  "ingredients": [{"name": "flour", "amount": 2, "unit": "cups", "optional": false}],
  "instructions": ["step one", "step two"],
  "servings": 4,
  "prepTime": "15 minutes",
  "cookTime": "30 minutes",
  "difficulty": "easy",
  "cuisine": "italian",
  "category": "dinner",
  "tags": ["weeknight"],
  "confidence": 0.9
}

Rules:
- Keep the recipe in its source language; do not translate.
- Amounts must be numbers. Convert fractions ("1/2" becomes 0.5).
- Omit fields you cannot determine rather than inventing them.
- confidence reflects how certain you are this is a complete, correct recipe.
- If the content contains no recipe at all, respond with {"error": "<why>"}."#;

/// Addendum for photo imports: pages of a cookbook or a recipe card,
/// possibly spread across several images.
pub const PHOTO_PROMPT: &str = r#"The attached images are photographs of a
recipe (cookbook pages, a recipe card, or a handwritten note). When there are
several images they are pages of the same recipe in order: combine them into
one recipe, merging later pages' instructions with earlier pages' ingredients."#;

/// Fold an optional caller hint into the prompt.
pub fn with_hint(base: &str, hint: Option<&str>) -> String {
    match hint.map(str::trim).filter(|h| !h.is_empty()) {
        Some(hint) => format!("{base}\n\nThe user says this is: {hint}"),
        None => base.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_demands_json_and_error_marker() {
        assert!(EXTRACTION_PROMPT.contains("one JSON object"));
        assert!(EXTRACTION_PROMPT.contains(r#"{"error""#));
    }

    #[test]
    fn test_with_hint() {
        let prompt = with_hint("base", Some("grandma's lasagna"));
        assert!(prompt.starts_with("base"));
        assert!(prompt.contains("grandma's lasagna"));
        assert_eq!(with_hint("base", None), "base");
        assert_eq!(with_hint("base", Some("  ")), "base");
    }
}
