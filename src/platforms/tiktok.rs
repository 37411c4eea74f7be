use reqwest::Client;
use serde_json::Value;

use crate::fetch::oembed::{fetch_oembed, urlencode};
use crate::fetch::{fetch_html, fetch_json, ClientIdentity};
use crate::platforms::{embedded_json_after, first_success, PlatformContent, Technique};
use crate::source::SourceKind;

/// Extract content from a short-form video post.
///
/// The oEmbed title doubles as the post caption here. The direct video URL is
/// the hard field: the rehydration blob on the page is tried first, and the
/// tikwm mirror only after first-party scraping fails.
pub async fn extract(client: &Client, url: &str) -> PlatformContent {
    let mut content = PlatformContent::new(SourceKind::TikTok);

    let (oembed, page) = tokio::join!(
        fetch_oembed(client, url, SourceKind::TikTok),
        fetch_html(client, url, ClientIdentity::Browser),
    );

    if let Some(oembed) = oembed {
        let mut from_oembed = PlatformContent::new(SourceKind::TikTok);
        // The platform reports the caption as the oEmbed title.
        from_oembed.caption = oembed.title.clone();
        from_oembed.title = oembed.title;
        from_oembed.author = oembed.author_name;
        from_oembed.thumbnail_url = oembed.thumbnail_url;
        content.fill_missing(from_oembed);
    }

    let item = page.as_deref().and_then(item_from_page);
    if let Some(item) = &item {
        let mut from_page = PlatformContent::new(SourceKind::TikTok);
        from_page.caption = item["desc"].as_str().map(String::from);
        from_page.author = item["author"]["nickname"].as_str().map(String::from);
        from_page.thumbnail_url = item["video"]["cover"].as_str().map(String::from);
        content.fill_missing(from_page);
    }

    let techniques: Vec<Technique<'_, String>> = vec![
        (
            "rehydration-blob",
            Box::pin(async {
                item.as_ref()
                    .and_then(|item| item["video"]["playAddr"].as_str())
                    .map(String::from)
            }),
        ),
        ("tikwm-mirror", Box::pin(mirror_video_url(client, url))),
    ];
    content.video_url = first_success("tiktok video url", techniques).await;

    content
}

/// Dig the post item out of the page's embedded hydration state.
fn item_from_page(html: &str) -> Option<Value> {
    let state = embedded_json_after(html, "__UNIVERSAL_DATA_FOR_REHYDRATION__\" type=\"application/json\">")
        .or_else(|| embedded_json_after(html, "__UNIVERSAL_DATA_FOR_REHYDRATION__"))?;
    let item = &state["__DEFAULT_SCOPE__"]["webapp.video-detail"]["itemInfo"]["itemStruct"];
    if item.is_object() {
        Some(item.clone())
    } else {
        None
    }
}

/// Last-resort third-party mirror for the direct video URL only.
async fn mirror_video_url(client: &Client, url: &str) -> Option<String> {
    let body = fetch_json(client, &mirror_endpoint(url), ClientIdentity::Browser).await?;
    body["data"]["play"].as_str().map(String::from)
}

fn mirror_endpoint(url: &str) -> String {
    format!("https://www.tikwm.com/api/?url={}", urlencode(url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_from_page() {
        let html = r#"<script id="__UNIVERSAL_DATA_FOR_REHYDRATION__" type="application/json">
        {"__DEFAULT_SCOPE__": {"webapp.video-detail": {"itemInfo": {"itemStruct": {
            "desc": "30 second garlic noodles!",
            "author": {"nickname": "quickcook"},
            "video": {"playAddr": "https://v16.tiktokcdn.com/play", "cover": "https://p16/cover.jpg"}
        }}}}}</script>"#;

        let item = item_from_page(html).unwrap();
        assert_eq!(item["desc"], "30 second garlic noodles!");
        assert_eq!(item["video"]["playAddr"], "https://v16.tiktokcdn.com/play");
    }

    #[test]
    fn test_item_from_page_missing_blob() {
        assert!(item_from_page("<html><body>nothing here</body></html>").is_none());
    }

    #[test]
    fn test_mirror_endpoint_encodes_source_url() {
        let endpoint = mirror_endpoint("https://www.tiktok.com/@cook/video/71?is_copy=1&lang=en");
        assert_eq!(
            endpoint,
            "https://www.tikwm.com/api/?url=https%3A%2F%2Fwww.tiktok.com%2F%40cook%2Fvideo%2F71%3Fis_copy%3D1%26lang%3Den"
        );
    }
}
