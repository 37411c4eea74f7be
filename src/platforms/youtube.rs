use html_escape::decode_html_entities;
use log::debug;
use reqwest::Client;
use serde_json::Value;

use crate::fetch::{fetch_html, oembed::fetch_oembed, ClientIdentity};
use crate::platforms::{embedded_json_after, first_success, PlatformContent, Technique};
use crate::source::SourceKind;

/// A transcript shorter than this is caption noise ("[Music]"), not a recipe
/// narration, and does not count as usable.
pub(crate) const MIN_TRANSCRIPT_LEN: usize = 80;

/// Extract content from a watch/shorts URL.
///
/// The page and oEmbed fetches run concurrently. The transcript is the
/// preferred content for this platform; only when no usable transcript exists
/// does the extractor expose a muxed stream URL for downstream binary
/// analysis, picking the smallest stream since only comprehension matters.
pub async fn extract(client: &Client, url: &str) -> PlatformContent {
    let mut content = PlatformContent::new(SourceKind::Youtube);

    let (oembed, page) = tokio::join!(
        fetch_oembed(client, url, SourceKind::Youtube),
        fetch_html(client, url, ClientIdentity::Browser),
    );

    // Fixed precedence: oEmbed first, then the watch page.
    if let Some(oembed) = oembed {
        let mut from_oembed = PlatformContent::new(SourceKind::Youtube);
        from_oembed.title = oembed.title;
        from_oembed.author = oembed.author_name;
        from_oembed.thumbnail_url = oembed.thumbnail_url;
        content.fill_missing(from_oembed);
    }

    let player = page
        .as_deref()
        .and_then(|html| embedded_json_after(html, "ytInitialPlayerResponse"));

    if let Some(player) = &player {
        let mut from_page = PlatformContent::new(SourceKind::Youtube);
        let details = &player["videoDetails"];
        from_page.title = details["title"].as_str().map(String::from);
        from_page.author = details["author"].as_str().map(String::from);
        from_page.caption = details["shortDescription"].as_str().map(String::from);
        from_page.thumbnail_url = details["thumbnail"]["thumbnails"]
            .as_array()
            .and_then(|t| t.last())
            .and_then(|t| t["url"].as_str())
            .map(String::from);
        content.fill_missing(from_page);
    }

    if content.thumbnail_url.is_none() {
        if let Some(id) = video_id(url) {
            content.thumbnail_url = Some(format!("https://i.ytimg.com/vi/{id}/hqdefault.jpg"));
        }
    }

    // Transcript ladder: caption track first, nothing else carries spoken
    // words as text.
    let techniques: Vec<Technique<'_, String>> = vec![(
        "caption-track",
        Box::pin(fetch_transcript(client, player.as_ref())),
    )];
    content.transcript = first_success("youtube transcript", techniques).await;

    // No usable transcript: fall back to the smallest muxed stream so the
    // understanding step can watch the video instead.
    if content.transcript.is_none() {
        content.video_url = player.as_ref().and_then(smallest_muxed_stream);
    }

    content
}

async fn fetch_transcript(client: &Client, player: Option<&Value>) -> Option<String> {
    let track_url = player?["captions"]["playerCaptionsTracklistRenderer"]["captionTracks"]
        .as_array()?
        .first()?["baseUrl"]
        .as_str()?
        .to_string();

    let xml = fetch_html(client, &track_url, ClientIdentity::Browser).await?;
    let transcript = parse_timedtext(&xml);
    if transcript.len() >= MIN_TRANSCRIPT_LEN {
        Some(transcript)
    } else {
        debug!(
            "youtube transcript too short to be usable ({} chars)",
            transcript.len()
        );
        None
    }
}

/// Collapse a timed-text XML document into plain transcript text.
fn parse_timedtext(xml: &str) -> String {
    let mut out = Vec::new();
    let mut rest = xml;
    while let Some(open_end) = rest.find('>') {
        rest = &rest[open_end + 1..];
        let Some(close) = rest.find('<') else { break };
        let chunk = rest[..close].trim();
        if !chunk.is_empty() {
            // Captions arrive double-escaped often enough to decode twice.
            let decoded = decode_html_entities(&decode_html_entities(chunk).into_owned()).into_owned();
            out.push(decoded);
        }
        rest = &rest[close..];
    }
    out.join(" ")
}

/// Choose the lowest-bitrate muxed (audio+video) format with a direct URL.
fn smallest_muxed_stream(player: &Value) -> Option<String> {
    player["streamingData"]["formats"]
        .as_array()?
        .iter()
        .filter(|format| format["url"].is_string())
        .min_by_key(|format| format["bitrate"].as_u64().unwrap_or(u64::MAX))?["url"]
        .as_str()
        .map(String::from)
}

fn video_id(url: &str) -> Option<String> {
    let lower = url.to_lowercase();
    let id = if let Some(pos) = lower.find("watch?v=") {
        &url[pos + "watch?v=".len()..]
    } else if let Some(pos) = lower.find("youtu.be/") {
        &url[pos + "youtu.be/".len()..]
    } else if let Some(pos) = lower.find("/shorts/") {
        &url[pos + "/shorts/".len()..]
    } else {
        return None;
    };
    let id: String = id
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
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
    fn test_video_id_variants() {
        assert_eq!(
            video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=4s").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            video_id("https://youtu.be/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            video_id("https://www.youtube.com/shorts/abc_-123").as_deref(),
            Some("abc_-123")
        );
        assert!(video_id("https://www.youtube.com/feed/library").is_none());
    }

    #[test]
    fn test_parse_timedtext() {
        let xml = r#"<?xml version="1.0"?><transcript>
            <text start="0" dur="2">Today we&amp;#39;re making pasta</text>
            <text start="2" dur="3">with garlic &amp; butter</text>
        </transcript>"#;
        let transcript = parse_timedtext(xml);
        assert_eq!(transcript, "Today we're making pasta with garlic & butter");
    }

    #[test]
    fn test_smallest_muxed_stream() {
        let player = json!({
            "streamingData": {
                "formats": [
                    {"itag": 22, "bitrate": 2_000_000, "url": "https://v/hd"},
                    {"itag": 18, "bitrate": 500_000, "url": "https://v/sd"},
                    {"itag": 17, "bitrate": 100_000}
                ]
            }
        });
        // The 100k format has no URL and must be skipped.
        assert_eq!(smallest_muxed_stream(&player).as_deref(), Some("https://v/sd"));
    }

    #[test]
    fn test_smallest_muxed_stream_absent() {
        assert!(smallest_muxed_stream(&json!({})).is_none());
    }
}
