use html_escape::decode_html_entities;
use scraper::{ElementRef, Html, Selector};

/// Cap on extracted plain text, enough for any realistic recipe page.
const PAGE_TEXT_CAP: usize = 12 * 1024;

/// Meta tags harvested from a page head: Open Graph, Twitter cards and the
/// plain description/title fallbacks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageMeta {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub video: Option<String>,
    pub author: Option<String>,
}

/// Extract Open-Graph/Twitter-card/description meta tags plus `<title>`.
///
/// Attribute order (`property` before `content` or the reverse) does not
/// matter: tags are matched on the parsed DOM, not on raw text.
pub fn extract_meta_tags(html: &str) -> PageMeta {
    let document = Html::parse_document(html);
    let selector = Selector::parse("meta").expect("static selector");

    let mut meta = PageMeta::default();

    for element in document.select(&selector) {
        let key = element
            .value()
            .attr("property")
            .or_else(|| element.value().attr("name"))
            .unwrap_or("");
        let Some(content) = element.value().attr("content") else {
            continue;
        };
        let content = decode_html_entities(content).trim().to_string();
        if content.is_empty() {
            continue;
        }

        match key {
            "og:title" | "twitter:title" => fill(&mut meta.title, content),
            "og:description" | "twitter:description" | "description" => {
                fill(&mut meta.description, content)
            }
            "og:image" | "og:image:url" | "twitter:image" => fill(&mut meta.image, content),
            "og:video" | "og:video:url" | "og:video:secure_url" | "twitter:player:stream" => {
                fill(&mut meta.video, content)
            }
            "author" | "article:author" | "og:site_name" => fill(&mut meta.author, content),
            _ => {}
        }
    }

    if meta.title.is_none() {
        let title_selector = Selector::parse("title").expect("static selector");
        if let Some(title) = document.select(&title_selector).next() {
            let text = title.text().collect::<String>().trim().to_string();
            if !text.is_empty() {
                meta.title = Some(decode_html_entities(&text).into_owned());
            }
        }
    }

    meta
}

fn fill(slot: &mut Option<String>, value: String) {
    if slot.is_none() {
        *slot = Some(value);
    }
}

/// Subtrees that carry no recipe content and pollute extracted text.
const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "nav", "header", "footer", "svg", "form", "iframe",
];

/// Extract readable plain text from markup.
///
/// Skips script/style/navigation chrome, decodes entities, collapses
/// whitespace, and caps the output length.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let body_selector = Selector::parse("body").expect("static selector");

    // parse_document always synthesizes an <html><body> wrapper.
    let mut pieces = Vec::new();
    if let Some(body) = document.select(&body_selector).next() {
        collect_text(body, &mut pieces);
    }

    let joined = pieces.join(" ");
    let decoded = decode_html_entities(&joined);
    let mut text = decoded.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.len() > PAGE_TEXT_CAP {
        let mut cut = PAGE_TEXT_CAP;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
    text
}

fn collect_text(element: ElementRef, out: &mut Vec<String>) {
    for child in element.children() {
        if let Some(el) = ElementRef::wrap(child) {
            if SKIPPED_TAGS.contains(&el.value().name()) {
                continue;
            }
            collect_text(el, out);
        } else if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                out.push(trimmed.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_property_then_content() {
        let html = r#"<html><head>
            <meta property="og:title" content="Best Stew" />
            <meta property="og:image" content="https://example.com/stew.jpg" />
        </head><body></body></html>"#;

        let meta = extract_meta_tags(html);
        assert_eq!(meta.title.as_deref(), Some("Best Stew"));
        assert_eq!(meta.image.as_deref(), Some("https://example.com/stew.jpg"));
    }

    #[test]
    fn test_meta_content_then_property() {
        // Reversed attribute order must parse identically.
        let html = r#"<html><head>
            <meta content="Best Stew" property="og:title" />
            <meta content="A hearty dinner" name="description" />
        </head><body></body></html>"#;

        let meta = extract_meta_tags(html);
        assert_eq!(meta.title.as_deref(), Some("Best Stew"));
        assert_eq!(meta.description.as_deref(), Some("A hearty dinner"));
    }

    #[test]
    fn test_title_tag_fallback_and_entities() {
        let html = "<html><head><title>Mac &amp; Cheese</title></head><body></body></html>";
        let meta = extract_meta_tags(html);
        assert_eq!(meta.title.as_deref(), Some("Mac & Cheese"));
    }

    #[test]
    fn test_og_video() {
        let html = r#"<head><meta property="og:video" content="https://cdn.example.com/v.mp4"></head>"#;
        let meta = extract_meta_tags(html);
        assert_eq!(meta.video.as_deref(), Some("https://cdn.example.com/v.mp4"));
    }

    #[test]
    fn test_first_meta_wins() {
        let html = r#"<head>
            <meta property="og:title" content="First">
            <meta name="twitter:title" content="Second">
        </head>"#;
        let meta = extract_meta_tags(html);
        assert_eq!(meta.title.as_deref(), Some("First"));
    }

    #[test]
    fn test_html_to_text_strips_chrome() {
        let html = r#"<html><body>
            <nav>Home | About</nav>
            <script>var x = 1;</script>
            <style>.a { color: red }</style>
            <h1>Tomato Soup</h1>
            <p>Simmer the tomatoes &amp; basil.</p>
            <footer>Copyright</footer>
        </body></html>"#;

        let text = html_to_text(html);
        assert!(text.contains("Tomato Soup"));
        assert!(text.contains("Simmer the tomatoes & basil."));
        assert!(!text.contains("var x"));
        assert!(!text.contains("color: red"));
        assert!(!text.contains("Home | About"));
        assert!(!text.contains("Copyright"));
    }

    #[test]
    fn test_html_to_text_collapses_whitespace() {
        let html = "<body><p>a\n\n   b</p>\t<p>c</p></body>";
        assert_eq!(html_to_text(html), "a b c");
    }

    #[test]
    fn test_html_to_text_caps_length() {
        let html = format!("<body><p>{}</p></body>", "word ".repeat(10_000));
        assert!(html_to_text(&html).len() <= PAGE_TEXT_CAP);
    }
}
