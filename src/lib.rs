#![allow(clippy::missing_errors_doc)]
pub mod assistant;
pub mod client;
pub mod config;
pub mod embedder;
pub mod error;
pub mod onnx;
pub mod pipeline;
pub mod prompts;
pub mod ranking;
pub mod similarity;
pub mod upload;
pub mod utils;

pub use client::{ChatModel, OpenAiClient};
pub use config::RankerConfig;
pub use embedder::SentenceEmbedder;
pub use error::{RelevanceError, Result};
pub use pipeline::{Pipeline, Report};
pub use ranking::RankedImage;
pub use similarity::{Scorer, Strategy};
pub use upload::ImageUpload;
