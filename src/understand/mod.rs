mod gemini;
pub mod prompt;

pub use gemini::GeminiModel;

use async_trait::async_trait;
use serde_json::Value;

use crate::bundle::ContentBundle;
use crate::error::ImportError;

/// Pipeline phases reported to an [`ImportObserver`]. Emitted in order;
/// `Watching` only appears when media is attached to the bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportPhase {
    /// The model is analyzing attached media
    Watching,
    /// The model response arrived and is being read
    Reading,
    /// The structured recipe is being assembled
    Building,
    Done,
}

/// Optional progress side-channel for imports. The one-shot path never
/// invokes it; implementations must be cheap and non-blocking.
pub trait ImportObserver: Send + Sync {
    fn phase(&self, phase: ImportPhase);
    fn note(&self, _note: &str) {}
}

/// The external content-understanding capability, treated as a black box:
/// bundle in, free-form text (expected to contain one JSON object) out.
#[async_trait]
pub trait RecipeModel: Send + Sync {
    fn model_name(&self) -> &str;

    /// One-shot analysis of a content bundle.
    async fn analyze(&self, bundle: &ContentBundle) -> Result<String, ImportError>;

    /// Streaming-flavored analysis: same final payload as [`analyze`], with
    /// phase notifications emitted around the request. Only meaningful when
    /// the bundle carries media, but harmless otherwise.
    async fn analyze_with_observer(
        &self,
        bundle: &ContentBundle,
        observer: &dyn ImportObserver,
    ) -> Result<String, ImportError> {
        if !bundle.media.is_empty() {
            observer.phase(ImportPhase::Watching);
        }
        let response = self.analyze(bundle).await?;
        observer.phase(ImportPhase::Reading);
        Ok(response)
    }
}

/// Pull one JSON object out of a model response that may be bare JSON,
/// wrapped in prose, or inside a ``` code fence.
///
/// This is the single point where raw model output is parsed; semantic
/// validation happens in the normalizer.
pub fn extract_json_payload(response: &str) -> Result<Value, ImportError> {
    let trimmed = response.trim();

    // Fenced block first: its content is the strongest signal.
    if let Some(fenced) = fenced_block(trimmed) {
        if let Ok(value) = serde_json::from_str::<Value>(fenced.trim()) {
            if value.is_object() {
                return Ok(value);
            }
        }
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if value.is_object() {
            return Ok(value);
        }
    }

    // Prose-wrapped: take the first brace-balanced object.
    if let Some(object) = first_json_object(trimmed) {
        if let Ok(value) = serde_json::from_str::<Value>(object) {
            if value.is_object() {
                return Ok(value);
            }
        }
    }

    Err(ImportError::ResponseParse(format!(
        "no JSON object found in a {} character response",
        response.len()
    )))
}

fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after = &text[start + 3..];
    // Skip an optional language tag on the fence line.
    let body_start = after.find('\n')? + 1;
    let body = &after[body_start..];
    let end = body.find("```")?;
    Some(&body[..end])
}

fn first_json_object(text: &str) -> Option<&str> {
    let open = text.find('{')?;
    let bytes = text[open..].as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[open..=open + i]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECIPE_JSON: &str = r#"{"title": "Pesto", "confidence": 0.9}"#;

    #[test]
    fn test_bare_json() {
        let value = extract_json_payload(RECIPE_JSON).unwrap();
        assert_eq!(value["title"], "Pesto");
    }

    #[test]
    fn test_fenced_json() {
        let response = format!("Here is the recipe:\n```json\n{RECIPE_JSON}\n```\nEnjoy!");
        let value = extract_json_payload(&response).unwrap();
        assert_eq!(value["title"], "Pesto");
    }

    #[test]
    fn test_prose_wrapped_json() {
        let response = format!("Sure! The extracted recipe is {RECIPE_JSON} — let me know.");
        let value = extract_json_payload(&response).unwrap();
        assert_eq!(value["title"], "Pesto");
    }

    #[test]
    fn test_fenced_and_bare_parse_identically() {
        let bare = extract_json_payload(RECIPE_JSON).unwrap();
        let fenced = extract_json_payload(&format!("```json\n{RECIPE_JSON}\n```")).unwrap();
        assert_eq!(bare, fenced);
    }

    #[test]
    fn test_json_with_braces_in_strings() {
        let response = r#"prefix {"title": "a {weird} name", "n": 1} suffix"#;
        let value = extract_json_payload(response).unwrap();
        assert_eq!(value["title"], "a {weird} name");
    }

    #[test]
    fn test_no_json_is_an_error() {
        assert!(matches!(
            extract_json_payload("I could not find a recipe."),
            Err(ImportError::ResponseParse(_))
        ));
    }
}
