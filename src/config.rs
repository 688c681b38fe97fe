use crate::quiz::{OPTION_COUNT, QuizMode};
use crate::template::DEFAULT_PRICE_RANGE;
use crate::vocab::MIN_VOCAB_ENTRIES;

/// Runtime settings for a quiz deployment. Every field has a default, so a
/// partial JSON document only overrides what it names.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuizConfig {
    pub vocab_url: String,
    pub conversation_url: String,
    pub option_count: usize,
    pub min_vocab_entries: usize,
    pub initial_mode: QuizMode,
    /// Delay before moving on after a vocabulary answer.
    pub vocab_advance_delay_ms: u32,
    /// Delay before moving on after a conversation answer.
    pub conversation_advance_delay_ms: u32,
    pub speech_rate: f32,
    pub default_price_range: (u64, u64),
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            vocab_url: "./data/vocab.json".to_string(),
            conversation_url: "./data/quiz-template.json".to_string(),
            option_count: OPTION_COUNT,
            min_vocab_entries: MIN_VOCAB_ENTRIES,
            initial_mode: QuizMode::default(),
            vocab_advance_delay_ms: 800,
            conversation_advance_delay_ms: 1200,
            speech_rate: 0.9,
            default_price_range: DEFAULT_PRICE_RANGE,
        }
    }
}

impl QuizConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Wrong answers per vocabulary question.
    pub fn distractor_count(&self) -> usize {
        self.option_count.saturating_sub(1)
    }
}
