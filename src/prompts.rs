//! Prompt templates sent to the chat model.

pub const DETECT_LANGUAGE_MAX_TOKENS: u32 = 10;
pub const SUMMARY_MAX_TOKENS: u32 = 150;
pub const DESCRIBE_MAX_TOKENS: u32 = 300;
pub const TRANSLATE_MAX_TOKENS: u32 = 300;
pub const RELEVANCE_MAX_TOKENS: u32 = 10;

#[must_use]
pub fn detect_language(text: &str) -> String {
    format!("Detect the language of the following text: '{text}'")
}

#[must_use]
pub fn summarize(text: &str) -> String {
    format!("Please summarize the following news text: '{text}'")
}

#[must_use]
pub fn translate(text: &str, target_language: &str) -> String {
    format!("Translate the following text to {target_language}: '{text}'")
}

#[must_use]
pub fn relevance(news_text: &str, image_description: &str) -> String {
    format!(
        "Given the news text: '{news_text}', rate the relevance of the following image \
         description on a scale from 0 to 1. Only respond with a number between 0 and 1 \
         without any additional text. Image description: '{image_description}'"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relevance_prompt_wording() {
        assert_eq!(
            relevance("Storm hits coast", "Waves on rocks"),
            "Given the news text: 'Storm hits coast', rate the relevance of the following image \
             description on a scale from 0 to 1. Only respond with a number between 0 and 1 \
             without any additional text. Image description: 'Waves on rocks'"
        );
    }

    #[test]
    fn translate_prompt_names_target() {
        assert_eq!(
            translate("A cat", "Dutch"),
            "Translate the following text to Dutch: 'A cat'"
        );
    }
}
