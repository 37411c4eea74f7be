use reqwest::Client;
use scraper::{Html, Selector};

use crate::fetch::{fetch_html, meta::extract_meta_tags, ClientIdentity};
use crate::platforms::{embedded_json_after, first_success, PlatformContent, Technique};
use crate::source::SourceKind;

/// Extract content from a reel/post URL.
///
/// The main page serves a login wall to browsers, but the link-preview
/// identity still gets full Open Graph tags, and the captioned embed page is
/// scrapeable without auth when requested as a mobile client. Both are
/// fetched concurrently; OG tags take precedence, the embed fills the gaps.
pub async fn extract(client: &Client, url: &str) -> PlatformContent {
    let mut content = PlatformContent::new(SourceKind::Instagram);

    let embed_url = embed_url(url);
    let (page, embed) = tokio::join!(
        fetch_html(client, url, ClientIdentity::LinkPreview),
        fetch_html(client, &embed_url, ClientIdentity::MobileBrowser),
    );

    if let Some(html) = page.as_deref() {
        let meta = extract_meta_tags(html);
        let mut from_meta = PlatformContent::new(SourceKind::Instagram);
        from_meta.title = meta.title;
        from_meta.caption = meta.description;
        from_meta.thumbnail_url = meta.image;
        from_meta.video_url = meta.video;
        content.fill_missing(from_meta);
    }

    if let Some(html) = embed.as_deref() {
        let mut from_embed = PlatformContent::new(SourceKind::Instagram);
        from_embed.caption = embed_caption(html);
        content.fill_missing(from_embed);
    }

    if content.video_url.is_none() {
        let techniques: Vec<Technique<'_, String>> = vec![(
            "embed-context-blob",
            Box::pin(async { embed.as_deref().and_then(embed_video_url) }),
        )];
        content.video_url = first_success("instagram video url", techniques).await;
    }

    content
}

/// The `/embed/captioned/` view of a post, served without a login wall.
fn embed_url(url: &str) -> String {
    let base = url.split(['?', '#']).next().unwrap_or(url);
    format!("{}/embed/captioned/", base.trim_end_matches('/'))
}

fn embed_caption(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(".Caption, .CaptionComments").ok()?;
    let caption = document
        .select(&selector)
        .next()?
        .text()
        .collect::<Vec<_>>()
        .join(" ");
    let caption = caption.split_whitespace().collect::<Vec<_>>().join(" ");
    if caption.is_empty() {
        None
    } else {
        Some(caption)
    }
}

fn embed_video_url(html: &str) -> Option<String> {
    let context = embedded_json_after(html, "\"contextJSON\":")
        .or_else(|| embedded_json_after(html, "gql_data"))?;
    context["gql_data"]["shortcode_media"]["video_url"]
        .as_str()
        .or_else(|| context["shortcode_media"]["video_url"].as_str())
        .map(String::from)
}
