use reqwest::Client;
use serde_json::Value;

use crate::fetch::{fetch_html, fetch_json, meta::extract_meta_tags, ClientIdentity};
use crate::platforms::PlatformContent;
use crate::source::SourceKind;

/// Extract content from a post URL.
///
/// Appending `.json` to any post URL returns the full listing; the selftext
/// of recipe posts usually carries the whole recipe. Page meta tags are the
/// fallback when the JSON endpoint is rate-limited.
pub async fn extract(client: &Client, url: &str) -> PlatformContent {
    let mut content = PlatformContent::new(SourceKind::Reddit);

    let json_url = json_url(url);
    let (listing, page) = tokio::join!(
        fetch_json(client, &json_url, ClientIdentity::Browser),
        fetch_html(client, url, ClientIdentity::LinkPreview),
    );

    if let Some(post) = listing.as_ref().and_then(post_data) {
        let mut from_json = PlatformContent::new(SourceKind::Reddit);
        from_json.title = post["title"].as_str().map(String::from);
        from_json.author = post["author"].as_str().map(String::from);
        from_json.page_text = post["selftext"]
            .as_str()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from);
        from_json.video_url = post["secure_media"]["reddit_video"]["fallback_url"]
            .as_str()
            .or_else(|| post["media"]["reddit_video"]["fallback_url"].as_str())
            .map(String::from);
        from_json.thumbnail_url = post["preview"]["images"][0]["source"]["url"]
            .as_str()
            .map(|u| u.replace("&amp;", "&"));
        content.fill_missing(from_json);
    }

    if let Some(html) = page.as_deref() {
        let meta = extract_meta_tags(html);
        let mut from_page = PlatformContent::new(SourceKind::Reddit);
        from_page.title = meta.title;
        from_page.caption = meta.description;
        from_page.thumbnail_url = meta.image;
        from_page.video_url = meta.video;
        content.fill_missing(from_page);
    }

    content
}

fn json_url(url: &str) -> String {
    let base = url.split(['?', '#']).next().unwrap_or(url);
    format!("{}.json", base.trim_end_matches('/'))
}

/// The listing shape is `[{"data": {"children": [{"data": {post}}]}}, ...]`.
fn post_data(listing: &Value) -> Option<&Value> {
    let post = &listing[0]["data"]["children"][0]["data"];
    if post.is_object() {
        Some(post)
    } else {
        None
    }
}
