use crate::assistant::rate_relevance;
use crate::client::ChatModel;
use crate::embedder::SentenceEmbedder;
use crate::error::Result;
use crate::utils::normalize_text;
use ndarray::Array1;
use std::fmt;
use std::path::Path;

/// How a description is matched against the input text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Strategy {
    /// Ask the chat model for a score between 0 and 1.
    Llm,
    /// Normalized edit distance on the raw text.
    Lexical,
    /// Cosine similarity of sentence embeddings.
    Embedding,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Llm => "llm",
            Self::Lexical => "lexical",
            Self::Embedding => "embedding",
        })
    }
}

pub trait Scorer {
    fn name(&self) -> &'static str;

    /// Relevance of `description` to `text`; higher is more relevant.
    fn score(&mut self, text: &str, description: &str) -> Result<f32>;
}

impl<S: Scorer + ?Sized> Scorer for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn score(&mut self, text: &str, description: &str) -> Result<f32> {
        (**self).score(text, description)
    }
}

pub struct LlmScorer<M> {
    model: M,
}

impl<M: ChatModel> LlmScorer<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }
}

impl<M: ChatModel> Scorer for LlmScorer<M> {
    fn name(&self) -> &'static str {
        "llm"
    }

    fn score(&mut self, text: &str, description: &str) -> Result<f32> {
        rate_relevance(&self.model, text, description)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LexicalScorer;

impl Scorer for LexicalScorer {
    fn name(&self) -> &'static str {
        "lexical"
    }

    fn score(&mut self, text: &str, description: &str) -> Result<f32> {
        Ok(lexical_similarity(text, description))
    }
}

/// Levenshtein distance over chars.
#[must_use]
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let (m, n) = (a_chars.len(), b_chars.len());
    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }
    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0; n + 1];
    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[n]
}

/// `1 - distance / longest` after lowercasing and collapsing whitespace, in `[0, 1]`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn lexical_similarity(a: &str, b: &str) -> f32 {
    let a = normalize_text(a);
    let b = normalize_text(b);
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - edit_distance(&a, &b) as f32 / max_len as f32
}

/// 0 when either vector is all zeros or the lengths differ.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let mag_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    dot / (mag_a * mag_b)
}

pub struct EmbeddingScorer {
    embedder: SentenceEmbedder,
    // The news text is the same for every image, so embed it once.
    cached_text: Option<(String, Array1<f32>)>,
}

impl EmbeddingScorer {
    #[must_use]
    pub fn new(embedder: SentenceEmbedder) -> Self {
        Self {
            embedder,
            cached_text: None,
        }
    }

    fn text_embedding(&mut self, text: &str) -> Result<Array1<f32>> {
        if let Some((cached, emb)) = &self.cached_text {
            if cached == text {
                return Ok(emb.clone());
            }
        }
        let emb = self.embedder.embed_text(text)?;
        self.cached_text = Some((text.to_string(), emb.clone()));
        Ok(emb)
    }
}

impl Scorer for EmbeddingScorer {
    fn name(&self) -> &'static str {
        "embedding"
    }

    fn score(&mut self, text: &str, description: &str) -> Result<f32> {
        let text_emb = self.text_embedding(text)?;
        let desc_emb = self.embedder.embed_text(description)?;
        Ok(cosine_similarity(&text_emb.to_vec(), &desc_emb.to_vec()))
    }
}

/// Build the scorer for `strategy`. `embedding_model` is a model folder or an ID under the cache folder.
pub fn build_scorer<M: ChatModel + 'static>(
    strategy: Strategy,
    model: M,
    embedding_model: &str,
) -> Result<Box<dyn Scorer>> {
    let scorer: Box<dyn Scorer> = match strategy {
        Strategy::Llm => Box::new(LlmScorer::new(model)),
        Strategy::Lexical => Box::new(LexicalScorer),
        Strategy::Embedding => {
            let path = Path::new(embedding_model);
            let embedder = if path.is_dir() {
                SentenceEmbedder::new(path)?
            } else {
                SentenceEmbedder::from_model_id(embedding_model)?
            };
            Box::new(EmbeddingScorer::new(embedder))
        }
    };
    Ok(scorer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_distance_basics() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("abc", ""), 3);
        assert_eq!(edit_distance("straße", "strasse"), 2);
    }

    #[test]
    fn lexical_similarity_is_case_and_space_insensitive() {
        assert!((lexical_similarity("Flooded  street", "flooded street") - 1.0).abs() < f32::EPSILON);
        assert!((lexical_similarity("", "") - 1.0).abs() < f32::EPSILON);
        assert_eq!(lexical_similarity("abc", ""), 0.0);
    }

    #[test]
    fn closer_description_scores_higher() {
        let text = "Firefighters battle a forest fire near the town";
        let near = "Firefighters battling a forest fire near a town";
        let far = "A cat sleeping on a sofa";
        let mut scorer = LexicalScorer;
        assert!(scorer.score(text, near).unwrap() > scorer.score(text, far).unwrap());
    }

    #[test]
    fn cosine_cases() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 3.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 1.0], &[-1.0, -1.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn strategy_display_matches_cli_names() {
        use clap::ValueEnum;
        for strategy in Strategy::value_variants() {
            let name = strategy.to_string();
            assert_eq!(Strategy::from_str(&name, false).unwrap(), *strategy);
        }
    }
}
