use std::fmt::Write as _;
use std::path::PathBuf;

use crate::platforms::PlatformContent;
use crate::source::SourceKind;

/// Which technique ultimately fed the understanding step. Recorded as a
/// provenance tag on the result and used to discount confidence when only a
/// thumbnail was available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMethod {
    /// A staged video/media file is attached for binary analysis
    Video,
    /// Free text (caption, transcript, page text, structured data)
    Text,
    /// Deliberate photo/file import (recipe card, cookbook page, PDF)
    Photo,
    /// Nothing but a thumbnail image to look at
    VisualFallback,
}

impl ExtractionMethod {
    pub fn provenance_tag(&self) -> &'static str {
        match self {
            ExtractionMethod::Video => "extracted-from-video",
            ExtractionMethod::Text => "extracted-from-text",
            ExtractionMethod::Photo => "extracted-from-photo",
            ExtractionMethod::VisualFallback => "visual-fallback",
        }
    }
}

/// A binary attachment for the understanding request.
#[derive(Debug, Clone)]
pub struct MediaPart {
    pub path: PathBuf,
    pub mime: String,
}

/// The merged, normalized package handed to the understanding step: the
/// platform content rendered as one text block, plus zero or more local media
/// references. Ownership of *staged* media files stays with the import call
/// that created them (the bundle only references paths).
#[derive(Debug, Clone)]
pub struct ContentBundle {
    pub source_url: String,
    pub platform: SourceKind,
    pub text: String,
    pub media: Vec<MediaPart>,
    pub method: ExtractionMethod,
    /// Caller-provided hint (photo imports), folded into the prompt.
    pub hint: Option<String>,
}

/// Whether this content needs a binary media download before the model can
/// understand it: short-form video posts rarely carry enough text, and a
/// transcript-bearing platform without a usable transcript leaves only the
/// stream itself.
pub fn needs_media_staging(content: &PlatformContent) -> bool {
    match content.platform {
        SourceKind::TikTok | SourceKind::Instagram => content.video_url.is_some(),
        SourceKind::Youtube => content.transcript.is_none() && content.video_url.is_some(),
        _ => false,
    }
}

/// Render the platform content as the model's text input. Section headers
/// keep the fields distinguishable without any markup the model could
/// confuse for recipe content.
pub fn render_text(content: &PlatformContent) -> String {
    let mut text = String::new();
    let mut section = |label: &str, value: &Option<String>| {
        if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            let _ = writeln!(text, "{label}: {v}\n");
        }
    };

    section("Title", &content.title);
    section("Author", &content.author);
    section("Caption", &content.caption);
    section("Transcript", &content.transcript);
    section("Page text", &content.page_text);
    section("Structured recipe data", &content.structured_data);

    text.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(platform: SourceKind) -> PlatformContent {
        PlatformContent::new(platform)
    }

    #[test]
    fn test_staging_required_for_short_form_video() {
        let mut tiktok = content(SourceKind::TikTok);
        assert!(!needs_media_staging(&tiktok));
        tiktok.video_url = Some("https://v/1.mp4".into());
        assert!(needs_media_staging(&tiktok));
    }

    #[test]
    fn test_staging_skipped_when_transcript_usable() {
        let mut youtube = content(SourceKind::Youtube);
        youtube.video_url = Some("https://v/2.mp4".into());
        assert!(needs_media_staging(&youtube));

        youtube.transcript = Some("First, dice the onions...".into());
        assert!(!needs_media_staging(&youtube));
    }

    #[test]
    fn test_staging_never_required_for_text_platforms() {
        let mut reddit = content(SourceKind::Reddit);
        reddit.video_url = Some("https://v/3.mp4".into());
        assert!(!needs_media_staging(&reddit));
    }

    #[test]
    fn test_render_text_sections() {
        let mut c = content(SourceKind::Web);
        c.title = Some("Beef Stew".into());
        c.page_text = Some("Brown the beef.".into());
        let text = render_text(&c);
        assert!(text.contains("Title: Beef Stew"));
        assert!(text.contains("Page text: Brown the beef."));
        assert!(!text.contains("Transcript:"));
    }

    #[test]
    fn test_render_text_empty_content() {
        assert_eq!(render_text(&content(SourceKind::TikTok)), "");
    }
}
