pub mod config;
pub mod demo;
pub mod generator;
pub mod matcher;
pub mod quiz;
pub mod session;
pub mod speech;
pub mod template;
pub mod verbalizer;
pub mod vocab;
#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use config::QuizConfig;
pub use demo::{demo_templates, demo_vocab};
pub use generator::{ClockTime, GenerateError, PhoneNumber, TimeRange};
pub use matcher::{acceptable_answers, check_spoken_answer, normalize};
pub use quiz::{ChoiceSet, OPTION_COUNT, QuizError, QuizMode, build_choices};
pub use session::{
    AnswerOutcome, Deck, Phase, PresentationToken, Presented, Session, SessionEvent, Summary,
};
pub use speech::{Lang, Microphone, SpeechError, SpeechQueue, Utterance};
pub use template::{
    DisplayValue, GeneratedQuestion, QuizTemplate, TemplateError, TemplateKind, TemplateSet,
    instantiate,
};
pub use verbalizer::{
    TimeReading, VerbalizeError, digit_to_japanese, hour_to_japanese, minute_to_japanese,
    number_to_japanese, phone_digits_to_japanese, time_with_period,
};
pub use vocab::{DataLoadError, VocabEntry, VocabList};
