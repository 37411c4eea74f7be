//! Recipe import pipeline.
//!
//! Takes an arbitrary URL (video post, recipe blog, social thread, file) or a
//! captured photo, classifies the source, extracts whatever content the
//! platform will give up through ordered fallback techniques, bundles it for
//! an AI understanding step, and normalizes the result into a structured
//! [`ExtractedRecipe`] with a confidence score.
//!
//! Extraction is best-effort by design: individual fetch and parse failures
//! degrade to "fewer fields found", and only the outermost import call
//! surfaces a typed [`ImportError`]. Any media downloaded for binary
//! analysis is staged in transient storage and removed before the call
//! returns, on every path.
//!
//! ```no_run
//! # #[tokio::main]
//! # async fn main() -> Result<(), recipe_import::ImportError> {
//! let recipe = recipe_import::import_from_url("https://example.com/best-stew").await?;
//! println!("{} ({:.0}% confident)", recipe.title, recipe.extraction_confidence * 100.0);
//! # Ok(())
//! # }
//! ```

pub mod bundle;
pub mod config;
pub mod error;
pub mod fetch;
pub mod media;
pub mod model;
pub mod normalize;
pub mod platforms;
mod pipeline;
pub mod source;
pub mod understand;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

pub use crate::bundle::{ContentBundle, ExtractionMethod, MediaPart};
pub use crate::config::{ImportConfig, ModelConfig};
pub use crate::error::ImportError;
pub use crate::model::{ExtractedRecipe, Ingredient};
pub use crate::platforms::PlatformContent;
pub use crate::source::{classify, SourceKind};
pub use crate::understand::{GeminiModel, ImportObserver, ImportPhase, RecipeModel};

/// The import pipeline: one shared HTTP client, one understanding model, one
/// configuration. Cheap to clone per import call is not needed — a single
/// instance serves the whole app.
pub struct Importer {
    client: Client,
    model: Arc<dyn RecipeModel>,
    config: ImportConfig,
}

impl Importer {
    /// Build an importer from layered configuration (`import.toml` plus
    /// `RECIPE_IMPORT_*` environment variables) with the default Gemini
    /// understanding model.
    pub fn from_env() -> Result<Self, ImportError> {
        let config = ImportConfig::load()?;
        let model = Arc::new(GeminiModel::new(&config.model)?);
        Ok(Self::with_model(model, config))
    }

    /// Build an importer around any understanding model. This is the seam
    /// used by tests and by apps that route to their own model backend.
    pub fn with_model(model: Arc<dyn RecipeModel>, config: ImportConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            model,
            config,
        }
    }

    /// Import a recipe from a URL (or a local file path).
    pub async fn import_from_url(&self, url: &str) -> Result<ExtractedRecipe, ImportError> {
        pipeline::import_url(&self.client, self.model.as_ref(), &self.config, url, None).await
    }

    /// Import a recipe from a URL with a progress side-channel. Phases are
    /// emitted in order (`Watching` only when media is analyzed, then
    /// `Reading`, `Building`, `Done`); the final payload is identical to
    /// [`Importer::import_from_url`].
    pub async fn import_from_url_with_observer(
        &self,
        url: &str,
        observer: &dyn ImportObserver,
    ) -> Result<ExtractedRecipe, ImportError> {
        pipeline::import_url(
            &self.client,
            self.model.as_ref(),
            &self.config,
            url,
            Some(observer),
        )
        .await
    }

    /// Import a recipe from a single photo.
    pub async fn import_from_photo(
        &self,
        path: impl Into<PathBuf>,
        hint: Option<&str>,
    ) -> Result<ExtractedRecipe, ImportError> {
        pipeline::import_photos(self.model.as_ref(), &self.config, &[path.into()], hint).await
    }

    /// Import a recipe spread across several photos (cookbook pages). All
    /// images are sent together so later pages' instructions merge with
    /// earlier pages' ingredients into one recipe.
    pub async fn import_from_photos(
        &self,
        paths: &[PathBuf],
        hint: Option<&str>,
    ) -> Result<ExtractedRecipe, ImportError> {
        pipeline::import_photos(self.model.as_ref(), &self.config, paths, hint).await
    }
}

/// Import a recipe from a URL with default configuration.
pub async fn import_from_url(url: &str) -> Result<ExtractedRecipe, ImportError> {
    Importer::from_env()?.import_from_url(url).await
}

/// Import a recipe from a photo with default configuration.
pub async fn import_from_photo(
    path: impl Into<PathBuf>,
    hint: Option<&str>,
) -> Result<ExtractedRecipe, ImportError> {
    Importer::from_env()?.import_from_photo(path, hint).await
}

/// Import one recipe from several photographed pages with default
/// configuration.
pub async fn import_from_photos(
    paths: &[PathBuf],
    hint: Option<&str>,
) -> Result<ExtractedRecipe, ImportError> {
    Importer::from_env()?.import_from_photos(paths, hint).await
}
