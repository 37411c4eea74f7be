use serde::{Deserialize, Serialize};

/// The closed set of source categories an import input can fall into.
///
/// Derived purely from the shape of the URL or local path; classification
/// never touches the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Youtube,
    TikTok,
    Instagram,
    Twitter,
    Pinterest,
    Reddit,
    Pdf,
    Json,
    Xml,
    PlainText,
    Image,
    VideoFile,
    AudioFile,
    Web,
}

impl SourceKind {
    /// Display name used in logs and the extracted recipe's provenance.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Youtube => "youtube",
            SourceKind::TikTok => "tiktok",
            SourceKind::Instagram => "instagram",
            SourceKind::Twitter => "twitter",
            SourceKind::Pinterest => "pinterest",
            SourceKind::Reddit => "reddit",
            SourceKind::Pdf => "pdf",
            SourceKind::Json => "json",
            SourceKind::Xml => "xml",
            SourceKind::PlainText => "text",
            SourceKind::Image => "image",
            SourceKind::VideoFile => "video",
            SourceKind::AudioFile => "audio",
            SourceKind::Web => "web",
        }
    }

    /// Whether this kind is a file rather than a page to scrape.
    pub fn is_file(&self) -> bool {
        matches!(
            self,
            SourceKind::Pdf
                | SourceKind::Json
                | SourceKind::Xml
                | SourceKind::PlainText
                | SourceKind::Image
                | SourceKind::VideoFile
                | SourceKind::AudioFile
        )
    }
}

/// Classify a URL or local path into a [`SourceKind`].
///
/// Total and order-sensitive: known platform domains are checked before file
/// extensions, and anything unrecognized falls through to [`SourceKind::Web`].
/// Local paths (absolute or `file://`) are classified by extension only.
pub fn classify(input: &str) -> SourceKind {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    // Local file paths never reach the domain checks.
    if lower.starts_with("file://") || trimmed.starts_with('/') {
        return classify_extension(&lower).unwrap_or(SourceKind::Web);
    }

    let host = host_of(&lower);

    if host_matches(&host, &["youtube.com", "youtu.be", "m.youtube.com"]) {
        return SourceKind::Youtube;
    }
    if host_matches(&host, &["tiktok.com", "vm.tiktok.com", "vt.tiktok.com"]) {
        return SourceKind::TikTok;
    }
    if host_matches(&host, &["instagram.com", "instagr.am"]) {
        return SourceKind::Instagram;
    }
    if host_matches(&host, &["twitter.com", "x.com", "t.co"]) {
        return SourceKind::Twitter;
    }
    if host_matches(&host, &["pinterest.com", "pin.it"]) {
        return SourceKind::Pinterest;
    }
    if host_matches(&host, &["reddit.com", "redd.it"]) {
        return SourceKind::Reddit;
    }

    classify_extension(&lower).unwrap_or(SourceKind::Web)
}

fn classify_extension(lower: &str) -> Option<SourceKind> {
    // Strip query/fragment before looking at the extension.
    let path = lower
        .split(['?', '#'])
        .next()
        .unwrap_or(lower)
        .trim_end_matches('/');
    let ext = path.rsplit('.').next()?;
    if ext.len() > 5 || ext.contains('/') {
        return None;
    }

    match ext {
        "pdf" => Some(SourceKind::Pdf),
        "json" => Some(SourceKind::Json),
        "xml" | "rss" | "atom" => Some(SourceKind::Xml),
        "txt" | "md" => Some(SourceKind::PlainText),
        "jpg" | "jpeg" | "png" | "gif" | "webp" | "heic" | "bmp" => Some(SourceKind::Image),
        "mp4" | "mov" | "webm" | "mkv" | "avi" | "m4v" => Some(SourceKind::VideoFile),
        "mp3" | "m4a" | "wav" | "aac" | "ogg" | "flac" => Some(SourceKind::AudioFile),
        _ => None,
    }
}

fn host_of(lower: &str) -> String {
    let rest = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(lower);
    rest.split(['/', '?', '#'])
        .next()
        .unwrap_or("")
        .to_string()
}

fn host_matches(host: &str, domains: &[&str]) -> bool {
    domains
        .iter()
        .any(|d| host == *d || host.ends_with(&format!(".{d}")))
}
