//! The fixed enrichment prompt template.

use crate::config::PromptConfig;

/// Output-format options for the enrichment template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptStyle {
    pub include_phonetics: bool,
    pub include_examples: bool,
    pub handle_irregular: bool,
    pub target_language: String,
}

impl Default for PromptStyle {
    fn default() -> Self {
        PromptConfig::default().into()
    }
}

impl From<PromptConfig> for PromptStyle {
    fn from(config: PromptConfig) -> Self {
        Self {
            include_phonetics: config.include_phonetics,
            include_examples: config.include_examples,
            handle_irregular: config.handle_irregular,
            target_language: config.target_language,
        }
    }
}

/// Build the instruction prompt for one chunk.
///
/// The word list comes first as a JSON array, followed by the description
/// of the array-of-objects reply expected back.
pub fn build_prompt(words: &[String], style: &PromptStyle) -> String {
    // Serializing a slice of strings cannot fail
    let list = serde_json::to_string(words).unwrap_or_else(|_| "[]".to_string());
    let lang = &style.target_language;

    let mut prompt = format!("Here is a list of English words as a JSON array:\n{list}\n\n");
    prompt.push_str("For each word, produce one JSON object with these fields:\n");
    prompt.push_str("- \"word\": the word exactly as given\n");
    if style.include_phonetics {
        prompt.push_str("- \"phonetic\": the IPA transcription, e.g. \"/əˈbændən/\"\n");
    }
    prompt.push_str(&format!(
        "- \"translation\": a concise {lang} translation covering the common senses\n"
    ));
    prompt.push_str("- \"description\": a one-sentence English definition\n");
    prompt.push_str("- \"synonyms\": up to three English synonyms (array of strings)\n");
    prompt.push_str("- \"antonyms\": up to three English antonyms (array of strings, may be empty)\n");
    if style.include_examples {
        prompt.push_str(&format!(
            "- \"examples\": two objects {{\"sentence\": ..., \"translation\": ...}} with a short \
             English sentence using the word and its {lang} translation\n"
        ));
    }

    if style.handle_irregular {
        prompt.push_str(
            "\nSome entries are irregular:\n\
             - A word written in all capitals is an acronym or abbreviation; \
             put its expansion in \"description\".\n\
             - A word that looks misspelled should be enriched as the most likely \
             intended word, but keep \"word\" exactly as given.\n",
        );
    }

    prompt.push_str(
        "\nReply with a single JSON array holding one object per word, in the same \
         order as the input. Do not add commentary before or after the array.",
    );
    prompt
}
