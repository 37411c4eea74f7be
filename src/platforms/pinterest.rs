use reqwest::Client;
use serde_json::Value;

use crate::fetch::{
    fetch_html, fetch_json, meta::extract_meta_tags, meta::html_to_text,
    structured::extract_structured_data, ClientIdentity,
};
use crate::platforms::{first_success, PlatformContent, Technique};
use crate::source::SourceKind;

/// Extract content from a pin URL.
///
/// Pins that link out to recipe blogs usually carry the blog's ld+json blob
/// verbatim, which makes structured data the most valuable field here. The
/// pin-widget API is the fallback for a description when page scraping
/// yields nothing.
pub async fn extract(client: &Client, url: &str) -> PlatformContent {
    let mut content = PlatformContent::new(SourceKind::Pinterest);

    let page = fetch_html(client, url, ClientIdentity::Browser).await;

    if let Some(html) = page.as_deref() {
        let meta = extract_meta_tags(html);
        let mut from_page = PlatformContent::new(SourceKind::Pinterest);
        from_page.title = meta.title;
        from_page.caption = meta.description;
        from_page.thumbnail_url = meta.image;
        from_page.video_url = meta.video;
        from_page.structured_data = extract_structured_data(html);
        from_page.page_text = Some(html_to_text(html)).filter(|t| !t.is_empty());
        content.fill_missing(from_page);
    }

    if content.caption.is_none() {
        let techniques: Vec<Technique<'_, String>> = vec![(
            "pin-widget-api",
            Box::pin(widget_description(client, url)),
        )];
        content.caption = first_success("pinterest description", techniques).await;
    }

    content
}

async fn widget_description(client: &Client, url: &str) -> Option<String> {
    let id = pin_id(url)?;
    let endpoint =
        format!("https://widgets.pinterest.com/v3/pidgets/pins/info/?pin_ids={id}");
    let body = fetch_json(client, &endpoint, ClientIdentity::Browser).await?;
    pin_description(&body)
}

fn pin_description(body: &Value) -> Option<String> {
    let description = body["data"][0]["description"].as_str()?.trim();
    if description.is_empty() {
        None
    } else {
        Some(description.to_string())
    }
}

fn pin_id(url: &str) -> Option<String> {
    let pos = url.find("/pin/")?;
    let id: String = url[pos + "/pin/".len()..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pin_id() {
        assert_eq!(
            pin_id("https://www.pinterest.com/pin/99360735500167749/").as_deref(),
            Some("99360735500167749")
        );
        assert!(pin_id("https://www.pinterest.com/ideas/").is_none());
    }

    #[test]
    fn test_pin_description() {
        let body = json!({"data": [{"description": "  Slow cooker ragu  "}]});
        assert_eq!(pin_description(&body).as_deref(), Some("Slow cooker ragu"));
        assert!(pin_description(&json!({"data": [{"description": "  "}]})).is_none());
        assert!(pin_description(&json!({})).is_none());
    }
}
