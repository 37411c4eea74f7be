use log::debug;
use reqwest::Client;
use serde::Deserialize;

use crate::fetch::{fetch_html, ClientIdentity};
use crate::source::SourceKind;

/// An oEmbed response. Everything is optional; third parties disagree on
/// which fields they bother to fill.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OEmbed {
    pub title: Option<String>,
    pub author_name: Option<String>,
    pub thumbnail_url: Option<String>,
    pub html: Option<String>,
}

impl OEmbed {
    /// A response with neither title nor embed markup tells us nothing.
    fn is_usable(&self) -> bool {
        self.title.is_some() || self.html.is_some()
    }
}

/// Look up oEmbed data for a URL, trying the platform's own endpoint first
/// and a universal aggregator as the fallback. Returns the first structurally
/// valid response, or `None` when every endpoint fails.
pub async fn fetch_oembed(client: &Client, url: &str, kind: SourceKind) -> Option<OEmbed> {
    for endpoint in endpoints_for(url, kind) {
        let Some(body) = fetch_html(client, &endpoint, ClientIdentity::Browser).await else {
            continue;
        };
        match serde_json::from_str::<OEmbed>(&body) {
            Ok(oembed) if oembed.is_usable() => return Some(oembed),
            Ok(_) => debug!("oembed endpoint {endpoint} returned an empty document"),
            Err(e) => debug!("oembed endpoint {endpoint} returned invalid JSON: {e}"),
        }
    }
    None
}

fn endpoints_for(url: &str, kind: SourceKind) -> Vec<String> {
    let encoded = urlencode(url);
    let mut endpoints = match kind {
        SourceKind::Youtube => vec![format!(
            "https://www.youtube.com/oembed?url={encoded}&format=json"
        )],
        SourceKind::TikTok => vec![format!("https://www.tiktok.com/oembed?url={encoded}")],
        SourceKind::Twitter => vec![format!(
            "https://publish.twitter.com/oembed?url={encoded}&omit_script=true"
        )],
        _ => Vec::new(),
    };
    // Universal fallback, works across many providers.
    endpoints.push(format!("https://noembed.com/embed?url={encoded}"));
    endpoints
}

/// Minimal percent-encoding for a URL used as a query parameter.
pub(crate) fn urlencode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urlencode() {
        assert_eq!(
            urlencode("https://a.b/c?d=e&f"),
            "https%3A%2F%2Fa.b%2Fc%3Fd%3De%26f"
        );
    }

    #[test]
    fn test_endpoint_order_platform_first() {
        let endpoints = endpoints_for("https://youtu.be/x", SourceKind::Youtube);
        assert_eq!(endpoints.len(), 2);
        assert!(endpoints[0].starts_with("https://www.youtube.com/oembed"));
        assert!(endpoints[1].starts_with("https://noembed.com/embed"));
    }

    #[test]
    fn test_generic_kind_gets_only_universal_endpoint() {
        let endpoints = endpoints_for("https://example.com/x", SourceKind::Web);
        assert_eq!(endpoints.len(), 1);
        assert!(endpoints[0].starts_with("https://noembed.com/embed"));
    }

    #[test]
    fn test_usability() {
        assert!(!OEmbed::default().is_usable());
        let with_title = OEmbed {
            title: Some("t".into()),
            ..Default::default()
        };
        assert!(with_title.is_usable());
    }
}
