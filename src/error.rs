use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelevanceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("API response contained no message content")]
    EmptyResponse,
    #[error("Please provide a valid OpenAI API key.")]
    MissingApiKey,
    #[error("Unsupported image '{0}': expected jpg, jpeg or png")]
    UnsupportedImage(PathBuf),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("ONNX error: {0}")]
    Onnx(#[from] ort::Error),
    #[error("Tokenization error: {0}")]
    Tokenizer(String),
    #[error("Shape/Tensor error: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Inference error: {0}")]
    Inference(String),
}

pub type Result<T> = std::result::Result<T, RelevanceError>;
