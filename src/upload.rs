use crate::error::{RelevanceError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::GenericImageView;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// An image the user handed in, kept as its original encoded bytes.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Map a file extension onto the mime type sent in the data URL.
fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        _ => None,
    }
}

impl ImageUpload {
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        let bytes = fs::read(path)?;
        Self::from_bytes(name, bytes)
    }

    /// `name` must carry a jpg, jpeg or png extension; the bytes must decode.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let name = name.into();
        let mime = Path::new(&name)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(mime_for_extension)
            .ok_or_else(|| RelevanceError::UnsupportedImage(PathBuf::from(&name)))?;

        let decoded = image::load_from_memory(&bytes)?;
        let (width, height) = decoded.dimensions();

        Ok(Self {
            name,
            mime,
            bytes,
            width,
            height,
        })
    }

    /// `data:<mime>;base64,<payload>` as accepted by `image_url` content parts.
    #[must_use]
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

/// Read and validate a batch of files in parallel, preserving input order.
pub fn load_all<P: AsRef<Path> + Sync>(paths: &[P]) -> Vec<(PathBuf, Result<ImageUpload>)> {
    paths
        .par_iter()
        .map(|p| {
            let path = p.as_ref();
            (path.to_owned(), ImageUpload::from_path(path))
        })
        .collect()
}
