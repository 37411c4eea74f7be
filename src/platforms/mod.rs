pub mod instagram;
pub mod pinterest;
pub mod reddit;
pub mod tiktok;
pub mod twitter;
pub mod web;
pub mod youtube;

use std::future::Future;
use std::pin::Pin;

use log::{debug, warn};
use reqwest::Client;

use crate::source::SourceKind;

/// The common output of every platform extractor.
///
/// `platform` is always set; every content field is best-effort. A record
/// with nothing but `platform` is a valid result, not an error — total
/// extraction failure is representable.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformContent {
    pub platform: SourceKind,
    /// Direct playable media location
    pub video_url: Option<String>,
    /// Caption / post text attached to the media
    pub caption: Option<String>,
    /// Readable page text
    pub page_text: Option<String>,
    /// Spoken-word transcript, when the platform exposes one
    pub transcript: Option<String>,
    pub thumbnail_url: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    /// Embedded machine-readable recipe markup, size-capped upstream
    pub structured_data: Option<String>,
}

impl PlatformContent {
    pub fn new(platform: SourceKind) -> Self {
        Self {
            platform,
            video_url: None,
            caption: None,
            page_text: None,
            transcript: None,
            thumbnail_url: None,
            title: None,
            author: None,
            structured_data: None,
        }
    }

    /// Merge fields from a lower-precedence source: only fields still absent
    /// on `self` are taken from `other`.
    ///
    /// Extractors join their concurrent sub-fetches first and then apply
    /// results in a fixed precedence order through this method, so the merged
    /// record does not depend on fetch completion order.
    pub fn fill_missing(&mut self, other: PlatformContent) {
        fill(&mut self.video_url, other.video_url);
        fill(&mut self.caption, other.caption);
        fill(&mut self.page_text, other.page_text);
        fill(&mut self.transcript, other.transcript);
        fill(&mut self.thumbnail_url, other.thumbnail_url);
        fill(&mut self.title, other.title);
        fill(&mut self.author, other.author);
        fill(&mut self.structured_data, other.structured_data);
    }

    /// Whether any free-text field carries content the model could read.
    pub fn has_text(&self) -> bool {
        has(&self.caption) || has(&self.page_text) || has(&self.transcript) || has(&self.structured_data)
    }

    /// Whether the record is completely empty apart from the platform tag.
    pub fn is_empty(&self) -> bool {
        !self.has_text()
            && self.video_url.is_none()
            && self.thumbnail_url.is_none()
            && self.title.is_none()
    }
}

fn fill(slot: &mut Option<String>, value: Option<String>) {
    if slot.is_none() {
        if let Some(v) = value {
            if !v.trim().is_empty() {
                *slot = Some(v);
            }
        }
    }
}

fn has(slot: &Option<String>) -> bool {
    slot.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false)
}

/// A named fallback technique: a future producing an optional value.
pub(crate) type Technique<'a, T> =
    (&'static str, Pin<Box<dyn Future<Output = Option<T>> + Send + 'a>>);

/// Evaluate techniques left to right and stop at the first one that produces
/// a value. Exhaustion is logged as a warning — when a previously reliable
/// technique ladder stops producing data, that log line is the signal that a
/// third-party format drifted.
pub(crate) async fn first_success<T>(field: &str, techniques: Vec<Technique<'_, T>>) -> Option<T> {
    for (name, technique) in techniques {
        match technique.await {
            Some(value) => {
                debug!("{field}: resolved via {name}");
                return Some(value);
            }
            None => debug!("{field}: {name} produced nothing, trying next technique"),
        }
    }
    warn!("{field}: every technique exhausted");
    None
}

/// Find a brace-balanced JSON object embedded in page markup after `marker`.
///
/// Several platforms inline their app state as a giant JSON blob assigned to
/// a well-known variable; this pulls it out without regexes.
pub(crate) fn embedded_json_after(html: &str, marker: &str) -> Option<serde_json::Value> {
    let start = html.find(marker)? + marker.len();
    let rest = &html[start..];
    let open = rest.find('{')?;
    let bytes = rest[open..].as_bytes();

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
                    let blob = &rest[open..=open + i];
                    return serde_json::from_str(blob).ok();
                }
            }
            _ => {}
        }
    }
    None
}

/// Run the extractor for a non-file source kind.
///
/// Never fails: every extractor returns a (possibly empty) record.
pub async fn extract(client: &Client, url: &str, kind: SourceKind) -> PlatformContent {
    match kind {
        SourceKind::Youtube => youtube::extract(client, url).await,
        SourceKind::TikTok => tiktok::extract(client, url).await,
        SourceKind::Instagram => instagram::extract(client, url).await,
        SourceKind::Twitter => twitter::extract(client, url).await,
        SourceKind::Pinterest => pinterest::extract(client, url).await,
        SourceKind::Reddit => reddit::extract(client, url).await,
        _ => web::extract(client, url).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(platform: SourceKind) -> PlatformContent {
        PlatformContent::new(platform)
    }

    #[test]
    fn test_platform_always_set() {
        let empty = content(SourceKind::TikTok);
        assert_eq!(empty.platform, SourceKind::TikTok);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_fill_missing_respects_precedence() {
        // "oembed" applied first must win over "page scrape" applied second.
        let mut merged = content(SourceKind::Youtube);

        let mut oembed = content(SourceKind::Youtube);
        oembed.title = Some("From oEmbed".into());

        let mut page = content(SourceKind::Youtube);
        page.title = Some("From page".into());
        page.caption = Some("Page caption".into());

        merged.fill_missing(oembed);
        merged.fill_missing(page);

        assert_eq!(merged.title.as_deref(), Some("From oEmbed"));
        assert_eq!(merged.caption.as_deref(), Some("Page caption"));
    }

    #[test]
    fn test_fill_missing_ignores_blank_values() {
        let mut merged = content(SourceKind::Web);
        let mut other = content(SourceKind::Web);
        other.title = Some("   ".into());
        merged.fill_missing(other);
        assert!(merged.title.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_merge_is_completion_order_independent() {
        use std::time::Duration;

        // Two concurrent sub-fetches with controlled settle times, joined
        // before the fixed-precedence merge, the way every extractor does it.
        async fn oembed_like(delay_ms: u64) -> PlatformContent {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            let mut c = PlatformContent::new(SourceKind::TikTok);
            c.title = Some("oembed title".into());
            c.thumbnail_url = Some("https://t/1.jpg".into());
            c
        }

        async fn page_like(delay_ms: u64) -> PlatformContent {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            let mut c = PlatformContent::new(SourceKind::TikTok);
            c.title = Some("page title".into());
            c.video_url = Some("https://v/1.mp4".into());
            c
        }

        async fn merged(oembed_delay_ms: u64, page_delay_ms: u64) -> PlatformContent {
            let (oembed, page) =
                tokio::join!(oembed_like(oembed_delay_ms), page_like(page_delay_ms));
            let mut content = PlatformContent::new(SourceKind::TikTok);
            content.fill_missing(oembed);
            content.fill_missing(page);
            content
        }

        // oEmbed settles first in one run, last in the other.
        let oembed_fast = merged(5, 50).await;
        let oembed_slow = merged(50, 5).await;

        assert_eq!(oembed_fast, oembed_slow);
        assert_eq!(oembed_fast.title.as_deref(), Some("oembed title"));
        assert_eq!(oembed_fast.video_url.as_deref(), Some("https://v/1.mp4"));
    }

    #[tokio::test]
    async fn test_first_success_stops_at_first_value() {
        let techniques: Vec<Technique<'_, i32>> = vec![
            ("a", Box::pin(async { None })),
            ("b", Box::pin(async { Some(2) })),
            ("c", Box::pin(async { Some(3) })),
        ];
        assert_eq!(first_success("field", techniques).await, Some(2));
    }

    #[tokio::test]
    async fn test_first_success_exhaustion_is_none() {
        let techniques: Vec<Technique<'_, i32>> = vec![
            ("a", Box::pin(async { None })),
            ("b", Box::pin(async { None })),
        ];
        assert_eq!(first_success("field", techniques).await, None);
    }

    #[test]
    fn test_embedded_json_after() {
        let html = r#"<script>var ytInitialPlayerResponse = {"a": {"b": "c}"}, "n": 1};</script>"#;
        let value = embedded_json_after(html, "ytInitialPlayerResponse").unwrap();
        assert_eq!(value["a"]["b"], "c}");
        assert_eq!(value["n"], 1);
    }

    #[test]
    fn test_embedded_json_handles_escapes() {
        let html = r#"state = {"text": "he said \"hi\" {not a brace}"};"#;
        let value = embedded_json_after(html, "state =").unwrap();
        assert_eq!(value["text"], r#"he said "hi" {not a brace}"#);
    }

    #[test]
    fn test_embedded_json_missing_marker() {
        assert!(embedded_json_after("<html></html>", "nope").is_none());
    }
}
