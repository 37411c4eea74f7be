use std::path::{Path, PathBuf};

use log::debug;
use reqwest::Client;

use crate::bundle::{needs_media_staging, render_text, ContentBundle, ExtractionMethod, MediaPart};
use crate::config::ImportConfig;
use crate::error::ImportError;
use crate::fetch::{fetch_html, ClientIdentity};
use crate::media::{media_kind_of, stage_remote_media, StagedMedia};
use crate::model::ExtractedRecipe;
use crate::normalize::normalize;
use crate::platforms::{self, PlatformContent};
use crate::source::{classify, SourceKind};
use crate::understand::{extract_json_payload, ImportObserver, ImportPhase, RecipeModel};

/// Import a recipe from a URL or local file path.
///
/// Any media this call stages is held in an RAII guard scoped to this
/// function, so the temporary file is removed on success, typed failure and
/// panic alike.
pub(crate) async fn import_url(
    client: &Client,
    model: &dyn RecipeModel,
    config: &ImportConfig,
    url: &str,
    observer: Option<&dyn ImportObserver>,
) -> Result<ExtractedRecipe, ImportError> {
    let kind = classify(url);
    debug!("classified {url} as {}", kind.as_str());

    let (bundle, staged) = if kind.is_file() {
        bundle_from_file(client, config, url, kind).await?
    } else if is_local(url) {
        return Err(ImportError::UnsupportedSource(format!(
            "local path with unrecognized file type: {url}"
        )));
    } else {
        let content = platforms::extract(client, url, kind).await;
        bundle_from_content(client, config, url, content).await?
    };

    let recipe = understand(model, &bundle, url, kind, observer).await;

    // Explicit end of the staged media's life; the guard would also drop on
    // any early return above this point.
    drop(staged);

    recipe
}

/// Import a recipe from one or more photographed pages. All images go into a
/// single understanding request so later pages merge into one recipe.
pub(crate) async fn import_photos(
    model: &dyn RecipeModel,
    config: &ImportConfig,
    paths: &[PathBuf],
    hint: Option<&str>,
) -> Result<ExtractedRecipe, ImportError> {
    if paths.is_empty() {
        return Err(ImportError::InvalidRequest(
            "no photos supplied".to_string(),
        ));
    }

    let mut media = Vec::with_capacity(paths.len());
    for path in paths {
        let size = tokio::fs::metadata(path).await?.len();
        if size > config.max_media_bytes {
            return Err(ImportError::OversizedMedia {
                size,
                limit: config.max_media_bytes,
            });
        }
        let (_, mime) = media_kind_of(&path.to_string_lossy());
        media.push(MediaPart {
            path: path.clone(),
            mime: mime.to_string(),
        });
    }

    let source_url = paths[0].to_string_lossy().into_owned();
    let bundle = ContentBundle {
        source_url: source_url.clone(),
        platform: SourceKind::Image,
        text: String::new(),
        media,
        method: ExtractionMethod::Photo,
        hint: hint.map(String::from),
    };

    understand(model, &bundle, &source_url, SourceKind::Image, None).await
}

/// Run the understanding step and normalize its payload, emitting observer
/// phases when a side-channel is attached.
async fn understand(
    model: &dyn RecipeModel,
    bundle: &ContentBundle,
    source_url: &str,
    kind: SourceKind,
    observer: Option<&dyn ImportObserver>,
) -> Result<ExtractedRecipe, ImportError> {
    let response = match observer {
        Some(observer) => model.analyze_with_observer(bundle, observer).await?,
        None => model.analyze(bundle).await?,
    };

    if let Some(observer) = observer {
        observer.phase(ImportPhase::Building);
    }

    let payload = extract_json_payload(&response)?;
    let recipe = normalize(&payload, source_url, kind, bundle.method)?;

    if let Some(observer) = observer {
        observer.phase(ImportPhase::Done);
        observer.note(&format!("extracted \"{}\"", recipe.title));
    }

    Ok(recipe)
}

/// Assemble the bundle for a platform extraction, staging media when the
/// platform requires binary analysis and degrading to text or thumbnail
/// analysis when it does not or staging fails.
async fn bundle_from_content(
    client: &Client,
    config: &ImportConfig,
    url: &str,
    content: PlatformContent,
) -> Result<(ContentBundle, Option<StagedMedia>), ImportError> {
    let mut media = Vec::new();
    let mut staged = None;
    let mut method = None;

    if needs_media_staging(&content) {
        // video_url is guaranteed by needs_media_staging.
        let video_url = content.video_url.clone().unwrap_or_default();
        let (extension, mime) = media_kind_of(&video_url);
        match stage_remote_media(
            client,
            &video_url,
            config.max_media_bytes,
            extension,
            config.staging_dir.as_deref(),
        )
        .await {
            Ok(guard) => {
                media.push(MediaPart {
                    path: guard.path().to_path_buf(),
                    mime: mime.to_string(),
                });
                staged = Some(guard);
                method = Some(ExtractionMethod::Video);
            }
            Err(oversized @ ImportError::OversizedMedia { .. }) => return Err(oversized),
            Err(e) => debug!("media staging failed, degrading to text/visual: {e}"),
        }
    }

    let method = match method {
        Some(m) => m,
        None if content.has_text() => ExtractionMethod::Text,
        None => {
            // Last resort: stage the thumbnail for visual analysis.
            let Some(thumbnail) = content.thumbnail_url.clone() else {
                return Err(ImportError::UnsupportedSource(format!(
                    "no content could be extracted from {url}"
                )));
            };
            let (extension, mime) = media_kind_of(&thumbnail);
            match stage_remote_media(
                client,
                &thumbnail,
                config.max_media_bytes,
                extension,
                config.staging_dir.as_deref(),
            )
            .await {
                Ok(guard) => {
                    media.push(MediaPart {
                        path: guard.path().to_path_buf(),
                        mime: mime.to_string(),
                    });
                    staged = Some(guard);
                    ExtractionMethod::VisualFallback
                }
                Err(oversized @ ImportError::OversizedMedia { .. }) => return Err(oversized),
                Err(_) => {
                    return Err(ImportError::UnsupportedSource(format!(
                        "no content could be extracted from {url}"
                    )))
                }
            }
        }
    };

    let bundle = ContentBundle {
        source_url: url.to_string(),
        platform: content.platform,
        text: render_text(&content),
        media,
        method,
        hint: None,
    };
    Ok((bundle, staged))
}

/// Assemble the bundle for a file-like source: text formats are fetched or
/// read as text, binary formats become media parts. Remote files are staged
/// (and cleaned up); local files are referenced in place and never deleted.
async fn bundle_from_file(
    client: &Client,
    config: &ImportConfig,
    url: &str,
    kind: SourceKind,
) -> Result<(ContentBundle, Option<StagedMedia>), ImportError> {
    let local = local_path(url);

    if matches!(
        kind,
        SourceKind::Json | SourceKind::Xml | SourceKind::PlainText
    ) {
        let text = match &local {
            Some(path) => Some(tokio::fs::read_to_string(path).await?),
            None => fetch_html(client, url, ClientIdentity::Browser).await,
        };
        let text = text.filter(|t| !t.trim().is_empty()).ok_or_else(|| {
            ImportError::UnsupportedSource(format!("no readable text at {url}"))
        })?;

        let bundle = ContentBundle {
            source_url: url.to_string(),
            platform: kind,
            text,
            media: Vec::new(),
            method: ExtractionMethod::Text,
            hint: None,
        };
        return Ok((bundle, None));
    }

    let method = match kind {
        SourceKind::VideoFile | SourceKind::AudioFile => ExtractionMethod::Video,
        _ => ExtractionMethod::Photo,
    };

    let (media, staged) = match local {
        Some(path) => {
            let size = tokio::fs::metadata(&path).await?.len();
            if size > config.max_media_bytes {
                return Err(ImportError::OversizedMedia {
                    size,
                    limit: config.max_media_bytes,
                });
            }
            let (_, mime) = media_kind_of(url);
            (
                vec![MediaPart {
                    path,
                    mime: mime.to_string(),
                }],
                None,
            )
        }
        None => {
            let (extension, mime) = media_kind_of(url);
            let guard = stage_remote_media(
                client,
                url,
                config.max_media_bytes,
                extension,
                config.staging_dir.as_deref(),
            )
            .await?;
            (
                vec![MediaPart {
                    path: guard.path().to_path_buf(),
                    mime: mime.to_string(),
                }],
                Some(guard),
            )
        }
    };

    let bundle = ContentBundle {
        source_url: url.to_string(),
        platform: kind,
        text: String::new(),
        media,
        method,
        hint: None,
    };
    Ok((bundle, staged))
}

fn is_local(input: &str) -> bool {
    input.starts_with('/') || input.to_lowercase().starts_with("file://")
}

fn local_path(input: &str) -> Option<PathBuf> {
    if let Some(stripped) = input.strip_prefix("file://") {
        return Some(Path::new(stripped).to_path_buf());
    }
    if input.starts_with('/') {
        return Some(Path::new(input).to_path_buf());
    }
    None
}
