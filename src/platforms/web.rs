use reqwest::Client;

use crate::fetch::{
    fetch_html, meta::extract_meta_tags, meta::html_to_text,
    structured::extract_structured_data, ClientIdentity,
};
use crate::platforms::PlatformContent;
use crate::source::SourceKind;

/// Extract content from a generic web page (recipe blogs, mostly).
///
/// One fetch, three readings of the same body: embedded recipe markup when
/// the site publishes it, meta tags for title/description/image, and the
/// readable page text as the model's raw material.
pub async fn extract(client: &Client, url: &str) -> PlatformContent {
    let mut content = PlatformContent::new(SourceKind::Web);

    let Some(html) = fetch_html(client, url, ClientIdentity::Browser).await else {
        return content;
    };

    content.structured_data = extract_structured_data(&html);

    let meta = extract_meta_tags(&html);
    content.title = meta.title;
    content.caption = meta.description;
    content.thumbnail_url = meta.image;
    content.author = meta.author;

    let text = html_to_text(&html);
    if !text.is_empty() {
        content.page_text = Some(text);
    }

    content
}
