use std::env;
use std::path::{Path, PathBuf};

/// Get the directory where embedding model files are stored for a given model ID.
#[must_use]
pub fn get_model_dir(model_id: &str) -> PathBuf {
    #[allow(deprecated)]
    let base_folder = env::home_dir().map_or_else(
        || Path::new(".image_relevance_cache").to_owned(),
        |p| p.join(".cache/image_relevance"),
    );
    base_folder.join(model_id)
}

/// Read an environment variable, treating blank values as unset.
#[must_use]
pub fn env_optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Collapse runs of whitespace into single spaces and lowercase.
#[must_use]
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
