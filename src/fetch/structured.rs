use log::debug;
use scraper::{Html, Selector};
use serde_json::Value;

/// Cap on the serialized structured-data blob handed to the model.
const STRUCTURED_DATA_CAP: usize = 8 * 1024;

/// Scan every `application/ld+json` block in a page and keep the ones that
/// look like recipe markup, serialized compactly and size-capped.
///
/// Each block is sanitized and parsed defensively: malformed JSON is skipped,
/// never an error. Returns `None` when no recipe-shaped block exists.
pub fn extract_structured_data(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("script[type='application/ld+json']").expect("static selector");

    let mut blocks = Vec::new();
    for script in document.select(&selector) {
        let cleaned = sanitize_json(&script.inner_html());
        let parsed: Value = match serde_json::from_str(&cleaned) {
            Ok(v) => v,
            Err(e) => {
                debug!("skipping unparseable ld+json block: {e}");
                continue;
            }
        };

        if let Some(recipe) = find_recipe_node(&parsed) {
            blocks.push(recipe.to_string());
        }
    }

    if blocks.is_empty() {
        return None;
    }

    let mut joined = blocks.join("\n");
    if joined.len() > STRUCTURED_DATA_CAP {
        let mut cut = STRUCTURED_DATA_CAP;
        while !joined.is_char_boundary(cut) {
            cut -= 1;
        }
        joined.truncate(cut);
    }
    Some(joined)
}

/// Locate a recipe-shaped node: top-level object, array element, or a
/// `@graph` member.
fn find_recipe_node(value: &Value) -> Option<&Value> {
    if is_recipe(value) {
        return Some(value);
    }
    if let Some(array) = value.as_array() {
        return array.iter().find(|item| is_recipe(item));
    }
    if let Some(graph) = value.get("@graph").and_then(Value::as_array) {
        return graph.iter().find(|item| is_recipe(item));
    }
    None
}

fn is_recipe(value: &Value) -> bool {
    if value.get("recipeIngredient").is_some() || value.get("recipeInstructions").is_some() {
        return true;
    }
    match value.get("@type") {
        Some(Value::String(t)) => t.eq_ignore_ascii_case("recipe"),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|t| t.eq_ignore_ascii_case("recipe")),
        _ => false,
    }
}

/// Clean common ld+json breakage before parsing.
fn sanitize_json(json_str: &str) -> String {
    let mut cleaned = json_str.trim().to_string();

    // Some pages prepend junk before the first brace/bracket.
    if !cleaned.starts_with('{') && !cleaned.starts_with('[') {
        if let Some(start) = cleaned.find('{') {
            cleaned = cleaned[start..].to_string();
        }
    }

    // Trailing commas and stray HTML comments show up in the wild.
    cleaned = cleaned.replace(",]", "]").replace(",}", "}");
    cleaned = cleaned.replace("<!--", "").replace("-->", "");

    cleaned
}
