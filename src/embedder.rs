use crate::config::EmbedderConfig;
use crate::error::{RelevanceError, Result};
use crate::onnx::OnnxSession;
use crate::utils::get_model_dir;
use ndarray::{Array1, Array2, ArrayView2, ArrayView3, Axis, Ix2, Ix3};
use ort::value::Tensor;
use std::path::Path;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};
use tracing::debug;

pub const MODEL_FILE: &str = "model.onnx";
pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const CONFIG_FILE: &str = "embedder_config.json";

/// Sentence-embedding model (e.g. an exported sentence-transformers checkpoint) run with ONNX Runtime.
pub struct SentenceEmbedder {
    pub session: OnnxSession,
    pub config: EmbedderConfig,
    tokenizer: Tokenizer,
    id_name: String,
    mask_name: String,
    type_name: Option<String>,
}

impl SentenceEmbedder {
    /// Load a model from the default cache location.
    pub fn from_model_id(model_id: &str) -> Result<Self> {
        Self::new(&get_model_dir(model_id))
    }

    pub fn new(model_dir: &Path) -> Result<Self> {
        if !model_dir.is_dir() {
            return Err(RelevanceError::Config(format!(
                "Embedding model folder not found: {}",
                model_dir.display()
            )));
        }
        let config = EmbedderConfig::from_file(model_dir.join(CONFIG_FILE))?;
        let session = OnnxSession::new(model_dir.join(MODEL_FILE))?;
        let mut tokenizer = Tokenizer::from_file(model_dir.join(TOKENIZER_FILE))
            .map_err(|e| RelevanceError::Tokenizer(e.to_string()))?;

        let pad_token = config
            .pad_token
            .clone()
            .or_else(|| {
                ["[PAD]", "<pad>"]
                    .iter()
                    .find(|t| tokenizer.token_to_id(t).is_some())
                    .map(|t| (*t).to_string())
            })
            .ok_or_else(|| RelevanceError::Config("No pad token found in tokenizer".into()))?;
        let pad_id = tokenizer
            .token_to_id(&pad_token)
            .ok_or_else(|| RelevanceError::Config(format!("Pad token '{pad_token}' not in vocab")))?;

        tokenizer
            .with_padding(Some(PaddingParams {
                strategy: PaddingStrategy::BatchLongest,
                pad_id,
                pad_token,
                ..Default::default()
            }))
            .with_truncation(Some(TruncationParams {
                max_length: config.max_length,
                ..Default::default()
            }))
            .map_err(|e| RelevanceError::Tokenizer(e.to_string()))?;

        let id_name = session
            .find_input(&["input_ids"])
            .ok_or_else(|| RelevanceError::Config("Could not find text input node".into()))?;
        let mask_name = session
            .find_input(&["attention_mask"])
            .ok_or_else(|| RelevanceError::Config("Could not find attention mask node".into()))?;
        let type_name = session.find_input(&["token_type_ids"]);

        debug!(dir = %model_dir.display(), max_length = config.max_length, "loaded sentence embedder");

        Ok(Self {
            session,
            config,
            tokenizer,
            id_name,
            mask_name,
            type_name,
        })
    }

    /// Returns `(input_ids, attention_mask, token_type_ids)`, each `[batch, seq]`.
    pub fn tokenize<T: AsRef<str>>(
        &self,
        texts: &[T],
    ) -> Result<(Array2<i64>, Array2<i64>, Array2<i64>)> {
        let encodings = if self.config.lowercase {
            let lowered: Vec<String> = texts.iter().map(|s| s.as_ref().to_lowercase()).collect();
            self.tokenizer.encode_batch(lowered, true)
        } else {
            let texts: Vec<&str> = texts.iter().map(AsRef::as_ref).collect();
            self.tokenizer.encode_batch(texts, true)
        }
        .map_err(|e| RelevanceError::Tokenizer(e.to_string()))?;

        let batch_size = encodings.len();
        let seq_len = encodings.first().map_or(0, tokenizers::Encoding::len);

        let ids: Vec<i64> = encodings
            .iter()
            .flat_map(|e| e.get_ids().iter().map(|&x| i64::from(x)))
            .collect();
        let mask: Vec<i64> = encodings
            .iter()
            .flat_map(|e| e.get_attention_mask().iter().map(|&x| i64::from(x)))
            .collect();
        let types: Vec<i64> = encodings
            .iter()
            .flat_map(|e| e.get_type_ids().iter().map(|&x| i64::from(x)))
            .collect();

        Ok((
            Array2::from_shape_vec((batch_size, seq_len), ids)?,
            Array2::from_shape_vec((batch_size, seq_len), mask)?,
            Array2::from_shape_vec((batch_size, seq_len), types)?,
        ))
    }

    pub fn embed_text(&mut self, text: &str) -> Result<Array1<f32>> {
        let embs = self.embed_texts(&[text])?;
        Ok(embs.row(0).to_owned())
    }

    pub fn embed_texts<T: AsRef<str>>(&mut self, texts: &[T]) -> Result<Array2<f32>> {
        if texts.is_empty() {
            return Err(RelevanceError::Inference("Empty batch".to_string()));
        }
        let (ids, mask, types) = self.tokenize(texts)?;

        let ort_ids = Tensor::from_array(ids)?;
        let ort_mask = Tensor::from_array(mask.clone())?;
        let outputs = if let Some(t_name) = &self.type_name {
            let ort_types = Tensor::from_array(types)?;
            self.session.session.run(ort::inputs![
                &self.id_name => ort_ids,
                &self.mask_name => ort_mask,
                t_name => ort_types
            ])?
        } else {
            self.session
                .session
                .run(ort::inputs![&self.id_name => ort_ids, &self.mask_name => ort_mask])?
        };

        let hidden = outputs[0].try_extract_array::<f32>()?;
        let pooled = match hidden.ndim() {
            2 => hidden.into_dimensionality::<Ix2>()?.to_owned(),
            3 => mean_pool(hidden.into_dimensionality::<Ix3>()?, mask.view()),
            n => {
                return Err(RelevanceError::Inference(format!(
                    "Unexpected embedding output rank {n}"
                )))
            }
        };

        Ok(if self.config.normalize {
            l2_normalize_rows(pooled)
        } else {
            pooled
        })
    }
}

/// Average token states over positions where the attention mask is set.
#[must_use]
pub fn mean_pool(hidden: ArrayView3<f32>, mask: ArrayView2<i64>) -> Array2<f32> {
    let (batch, _, dim) = hidden.dim();
    let mut pooled = Array2::<f32>::zeros((batch, dim));
    for (b, mut out) in pooled.axis_iter_mut(Axis(0)).enumerate() {
        let mut count = 0.0_f32;
        for (s, token) in hidden.index_axis(Axis(0), b).axis_iter(Axis(0)).enumerate() {
            if mask[[b, s]] != 0 {
                out += &token;
                count += 1.0;
            }
        }
        out /= count.max(1e-9);
    }
    pooled
}

#[must_use]
pub fn l2_normalize_rows(mut embs: Array2<f32>) -> Array2<f32> {
    for mut row in embs.axis_iter_mut(Axis(0)) {
        let norm = row.dot(&row).sqrt();
        if norm > 0.0 {
            row /= norm;
        }
    }
    embs
}
