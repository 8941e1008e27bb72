use crate::assistant::{describe_image, detect_language, summarize_text, translate_text};
use crate::client::ChatModel;
use crate::config::DEFAULT_DESCRIBE_PROMPT;
use crate::error::{RelevanceError, Result};
use crate::ranking::{RankedImage, rank};
use crate::similarity::Scorer;
use crate::upload::{ImageUpload, load_all};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageFailure {
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub language: String,
    pub summary: String,
    pub strategy: &'static str,
    pub ranked: Vec<RankedImage>,
    pub failures: Vec<ImageFailure>,
}

/// Describe every image, score it against the text and rank the results.
pub struct Pipeline<M, S> {
    model: M,
    scorer: S,
    describe_prompt: String,
    translate: bool,
}

impl<M: ChatModel, S: Scorer> Pipeline<M, S> {
    pub fn new(model: M, scorer: S) -> Self {
        Self {
            model,
            scorer,
            describe_prompt: DEFAULT_DESCRIBE_PROMPT.to_string(),
            translate: true,
        }
    }

    #[must_use]
    pub fn with_describe_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.describe_prompt = prompt.into();
        self
    }

    #[must_use]
    pub fn with_translation(mut self, translate: bool) -> Self {
        self.translate = translate;
        self
    }

    /// Load `paths` and run. Files that cannot be loaded are reported as failures ahead of the
    /// ones that fail later, even when none of them loads.
    pub fn run_paths<P: AsRef<Path> + Sync>(&mut self, text: &str, paths: &[P]) -> Result<Report> {
        let mut uploads = Vec::with_capacity(paths.len());
        let mut load_failures = Vec::new();
        for (path, result) in load_all(paths) {
            match result {
                Ok(upload) => uploads.push(upload),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "could not load image");
                    load_failures.push(ImageFailure {
                        name: path.display().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let mut report = self.run(text, &uploads)?;
        load_failures.append(&mut report.failures);
        report.failures = load_failures;
        Ok(report)
    }

    /// Language detection and summary failures abort the run; a failing image is recorded and skipped.
    pub fn run(&mut self, text: &str, uploads: &[ImageUpload]) -> Result<Report> {
        if text.trim().is_empty() {
            return Err(RelevanceError::Config("No news text provided".into()));
        }

        let language = detect_language(&self.model, text)?;
        let summary = summarize_text(&self.model, text)?;
        info!(%language, images = uploads.len(), scorer = self.scorer.name(), "ranking images");

        let mut scored = Vec::with_capacity(uploads.len());
        let mut failures = Vec::new();
        for upload in uploads {
            let start = Instant::now();
            match self.process_image(text, &language, upload) {
                Ok(item) => {
                    info!(
                        image = %upload.name,
                        relevance = item.relevance,
                        elapsed = ?start.elapsed(),
                        "scored image"
                    );
                    scored.push(item);
                }
                Err(e) => {
                    warn!(image = %upload.name, error = %e, "skipping image");
                    failures.push(ImageFailure {
                        name: upload.name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(Report {
            language,
            summary,
            strategy: self.scorer.name(),
            ranked: rank(scored),
            failures,
        })
    }

    fn process_image(
        &mut self,
        text: &str,
        language: &str,
        upload: &ImageUpload,
    ) -> Result<RankedImage> {
        debug!(image = %upload.name, width = upload.width, height = upload.height, "describing image");
        let description = describe_image(&self.model, upload, &self.describe_prompt)?;
        let display_description = if self.translate {
            translate_text(&self.model, &description, language)?
        } else {
            description.trim().to_string()
        };
        let relevance = self.scorer.score(text, &description)?;

        Ok(RankedImage {
            name: upload.name.clone(),
            description,
            display_description,
            relevance,
        })
    }
}
