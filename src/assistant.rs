use crate::client::{ChatMessage, ChatModel};
use crate::error::Result;
use crate::prompts;
use crate::upload::ImageUpload;

/// Ask the model which language `text` is written in.
pub fn detect_language<M: ChatModel>(model: &M, text: &str) -> Result<String> {
    let reply = model.complete(
        &[ChatMessage::user(prompts::detect_language(text))],
        prompts::DETECT_LANGUAGE_MAX_TOKENS,
    )?;
    Ok(reply.trim().to_string())
}

pub fn summarize_text<M: ChatModel>(model: &M, text: &str) -> Result<String> {
    let reply = model.complete(
        &[ChatMessage::user(prompts::summarize(text))],
        prompts::SUMMARY_MAX_TOKENS,
    )?;
    Ok(reply.trim().to_string())
}

/// Send the image as a base64 data URL together with `prompt`. The reply is returned untrimmed.
pub fn describe_image<M: ChatModel>(model: &M, upload: &ImageUpload, prompt: &str) -> Result<String> {
    model.complete(
        &[ChatMessage::user_with_image(prompt, upload.data_url())],
        prompts::DESCRIBE_MAX_TOKENS,
    )
}

pub fn translate_text<M: ChatModel>(model: &M, text: &str, target_language: &str) -> Result<String> {
    let reply = model.complete(
        &[ChatMessage::user(prompts::translate(text, target_language))],
        prompts::TRANSLATE_MAX_TOKENS,
    )?;
    Ok(reply.trim().to_string())
}

/// Ask the model for a relevance score of `description` to `news_text` in `[0, 1]`.
pub fn rate_relevance<M: ChatModel>(model: &M, news_text: &str, description: &str) -> Result<f32> {
    let reply = model.complete(
        &[ChatMessage::user(prompts::relevance(news_text, description))],
        prompts::RELEVANCE_MAX_TOKENS,
    )?;
    Ok(parse_relevance(&reply))
}

/// Anything that is not a finite number scores 0.
#[must_use]
pub fn parse_relevance(reply: &str) -> f32 {
    match reply.trim().parse::<f32>() {
        // `+ 0.0` turns a "-0" reply into positive zero.
        Ok(score) if score.is_finite() => score.clamp(0.0, 1.0) + 0.0,
        _ => 0.0,
    }
}
