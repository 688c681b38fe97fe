use rand::Rng;
use std::path::Path;

use crate::generator::{
    GenerateError, phone_distractors, price_distractors, price_reading, random_phone,
    random_price, random_time, random_time_range, time_distractors, time_range_distractors,
};
use crate::quiz::{ChoiceSet, OPTION_COUNT, finalize_choices};
use crate::verbalizer::format_price_display;
use crate::vocab::{DataLoadError, read_data_file};

/// Price range used when a price template does not give one.
pub const DEFAULT_PRICE_RANGE: (u64, u64) = (100, 50_000);

/// How a template's question value and choices are produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    /// Authored choices and answer, used as written.
    #[default]
    Plain,
    Time,
    TimeRange,
    Phone,
    Price,
    /// Authored choices shown alongside an image.
    ImageLocation,
}

impl TemplateKind {
    pub fn is_randomized(self) -> bool {
        matches!(self, Self::Time | Self::TimeRange | Self::Phone | Self::Price)
    }
}

fn lenient_kind<'de, D>(deserializer: D) -> Result<TemplateKind, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = <serde_json::Value as serde::Deserialize>::deserialize(deserializer)?;
    match serde_json::from_value::<TemplateKind>(value.clone()) {
        Ok(kind) => Ok(kind),
        Err(_) => {
            log::warn!("unknown question type {value}, treating it as plain");
            Ok(TemplateKind::Plain)
        }
    }
}

/// A conversation question as authored in the quiz file.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizTemplate {
    /// Unrecognised types are read as [`TemplateKind::Plain`].
    #[serde(rename = "type", default, deserialize_with = "lenient_kind")]
    pub kind: TemplateKind,
    pub question: String,
    #[serde(default)]
    pub question_th: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default)]
    pub answer_pattern: Option<String>,
    #[serde(default)]
    pub price_range: Option<(u64, u64)>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub choices: Option<Vec<String>>,
    #[serde(default)]
    pub choices_th: Option<Vec<String>>,
    #[serde(default)]
    pub correct_answer: Option<String>,
}

impl QuizTemplate {
    pub fn new(kind: TemplateKind, question: impl Into<String>) -> Self {
        Self {
            kind,
            question: question.into(),
            question_th: None,
            hint: None,
            answer_pattern: None,
            price_range: None,
            image: None,
            choices: None,
            choices_th: None,
            correct_answer: None,
        }
    }
}

/// The value shown next to a question, already formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayValue {
    Time(String),
    TimeRange(String),
    Phone(String),
    Price(String),
    Image(String),
}

impl DisplayValue {
    pub fn text(&self) -> &str {
        match self {
            Self::Time(text)
            | Self::TimeRange(text)
            | Self::Phone(text)
            | Self::Price(text)
            | Self::Image(text) => text,
        }
    }
}

/// A template instantiated for one presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedQuestion {
    pub template: QuizTemplate,
    pub display: Option<DisplayValue>,
    pub correct_answer: String,
    pub choices: Vec<String>,
    /// Thai subtitles aligned with `choices`, authored questions only.
    pub choices_th: Option<Vec<String>>,
    pub correct_index: usize,
}

impl GeneratedQuestion {
    /// Thai subtitle for the option at `index`, if one was authored.
    pub fn choice_subtitle(&self, index: usize) -> Option<&str> {
        self.choices_th
            .as_ref()
            .and_then(|subtitles| subtitles.get(index))
            .map(String::as_str)
            .filter(|subtitle| !subtitle.is_empty())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("question \"{question}\" has no authored choices")]
    MissingChoices { question: String },
    #[error("question \"{question}\" lists a correct answer that is not among its choices")]
    CorrectAnswerNotInChoices { question: String },
    #[error(transparent)]
    Generate(#[from] GenerateError),
}

/// Rolls fresh values for `template` and builds its choice set.
///
/// # Errors
/// * [`TemplateError::MissingChoices`] / [`TemplateError::CorrectAnswerNotInChoices`]
///   for authored questions without a usable answer.
/// * [`TemplateError::Generate`] when a randomized value cannot be read or
///   enough distractors cannot be found.
pub fn instantiate<R: Rng + ?Sized>(
    rng: &mut R,
    template: &QuizTemplate,
    default_price_range: (u64, u64),
) -> Result<GeneratedQuestion, TemplateError> {
    let wrong_count = OPTION_COUNT - 1;

    let (display, set) = match template.kind {
        TemplateKind::Time => {
            let time = random_time(rng);
            let correct = time.reading().map_err(GenerateError::from)?;
            let wrong = time_distractors(rng, time, wrong_count)?;
            (
                Some(DisplayValue::Time(time.to_string())),
                finalize_choices(rng, correct, wrong),
            )
        }
        TemplateKind::TimeRange => {
            let range = random_time_range(rng);
            let correct = range.reading().map_err(GenerateError::from)?;
            let wrong = time_range_distractors(rng, range, wrong_count)?;
            (
                Some(DisplayValue::TimeRange(range.to_string())),
                finalize_choices(rng, correct, wrong),
            )
        }
        TemplateKind::Phone => {
            let phone = random_phone(rng);
            let correct = phone.reading().map_err(GenerateError::from)?;
            let wrong = phone_distractors(rng, &phone, wrong_count)?;
            (
                Some(DisplayValue::Phone(phone.to_string())),
                finalize_choices(rng, correct, wrong),
            )
        }
        TemplateKind::Price => {
            let (min, max) = template.price_range.unwrap_or(default_price_range);
            let price = random_price(rng, min, max)?;
            let correct = price_reading(price).map_err(GenerateError::from)?;
            let wrong = price_distractors(rng, price, wrong_count)?;
            (
                Some(DisplayValue::Price(format_price_display(price))),
                finalize_choices(rng, correct, wrong),
            )
        }
        TemplateKind::Plain | TemplateKind::ImageLocation => {
            let display = match template.kind {
                TemplateKind::ImageLocation => template.image.clone().map(DisplayValue::Image),
                _ => None,
            };
            (display, authored_choices(template)?)
        }
    };

    let choices_th = if template.kind.is_randomized() {
        None
    } else {
        template.choices_th.clone()
    };

    Ok(GeneratedQuestion {
        template: template.clone(),
        display,
        correct_answer: set.correct_answer,
        choices: set.options,
        choices_th,
        correct_index: set.correct_index,
    })
}

/// Authored choices keep their written order.
fn authored_choices(template: &QuizTemplate) -> Result<ChoiceSet, TemplateError> {
    let choices = template
        .choices
        .clone()
        .filter(|choices| !choices.is_empty())
        .ok_or_else(|| TemplateError::MissingChoices {
            question: template.question.clone(),
        })?;

    let not_found = || TemplateError::CorrectAnswerNotInChoices {
        question: template.question.clone(),
    };

    let correct_answer = template.correct_answer.clone().ok_or_else(not_found)?;
    let correct_index = choices
        .iter()
        .position(|choice| *choice == correct_answer)
        .ok_or_else(not_found)?;

    Ok(ChoiceSet {
        options: choices,
        correct_index,
        correct_answer,
    })
}

#[derive(serde::Deserialize)]
struct TemplateFile {
    #[serde(default)]
    questions: Vec<QuizTemplate>,
}

/// The question list of a conversation quiz file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSet {
    questions: Vec<QuizTemplate>,
}

impl TemplateSet {
    pub fn new(questions: Vec<QuizTemplate>) -> Result<Self, DataLoadError> {
        if questions.is_empty() {
            return Err(DataLoadError::NoQuestions);
        }
        Ok(Self { questions })
    }

    /// Parses `{ "questions": [...] }`.
    pub fn from_json(json: &str) -> Result<Self, DataLoadError> {
        Self::parse(json, "<inline>")
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DataLoadError> {
        let path = path.as_ref();
        let data = read_data_file(path)?;
        Self::parse(&data, &path.display().to_string())
    }

    pub(crate) fn parse(json: &str, origin: &str) -> Result<Self, DataLoadError> {
        let file: TemplateFile =
            serde_json::from_str(json).map_err(|source| DataLoadError::Parse {
                path: origin.to_string(),
                source,
            })?;
        Self::new(file.questions)
    }

    pub fn questions(&self) -> &[QuizTemplate] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::check_spoken_answer;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn assert_valid_set(question: &GeneratedQuestion) {
        assert_eq!(question.choices.len(), OPTION_COUNT);
        assert_eq!(question.choices[question.correct_index], question.correct_answer);
        let unique: HashSet<_> = question.choices.iter().collect();
        assert_eq!(unique.len(), OPTION_COUNT);
    }

    #[test]
    fn parses_camel_case_fields() {
        let json = r#"{
            "questions": [
                {
                    "type": "price",
                    "question": "いくらですか。",
                    "questionTh": "ราคาเท่าไร",
                    "answerPattern": "~ en desu",
                    "priceRange": [500, 2000]
                },
                {
                    "question": "おなまえは？",
                    "choices": ["たなかです", "がくせいです"],
                    "choicesTh": ["ทานากะครับ", "เป็นนักเรียน"],
                    "correctAnswer": "たなかです"
                }
            ]
        }"#;

        let set = TemplateSet::from_json(json).expect("quiz file should parse");
        let questions = set.questions();

        assert_eq!(questions[0].kind, TemplateKind::Price);
        assert_eq!(questions[0].question_th.as_deref(), Some("ราคาเท่าไร"));
        assert_eq!(questions[0].price_range, Some((500, 2000)));
        assert_eq!(questions[1].kind, TemplateKind::Plain);
        assert_eq!(questions[1].choices_th.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn unknown_types_are_authored_questions() {
        let json = r#"{
            "questions": [
                { "type": "time", "question": "いま なんじですか。" },
                {
                    "type": "multiple_choice",
                    "question": "はじめまして。",
                    "choices": ["どうぞよろしく。", "いただきます。", "おやすみなさい。", "いってきます。"],
                    "correctAnswer": "どうぞよろしく。"
                },
                { "type": 3, "question": "すみません。", "choices": ["いいえ"], "correctAnswer": "いいえ" }
            ]
        }"#;

        let set = TemplateSet::from_json(json).expect("unknown types do not reject the file");
        let questions = set.questions();

        assert_eq!(questions.len(), 3);
        assert_eq!(questions[0].kind, TemplateKind::Time);
        assert_eq!(questions[1].kind, TemplateKind::Plain);
        assert_eq!(questions[2].kind, TemplateKind::Plain);

        let mut rng = StdRng::seed_from_u64(4);
        let question = instantiate(&mut rng, &questions[1], DEFAULT_PRICE_RANGE)
            .expect("authored choices are used as written");
        assert_eq!(question.correct_index, 0);
        assert_eq!(question.correct_answer, "どうぞよろしく。");
    }

    #[test]
    fn empty_question_list_is_an_error() {
        assert_eq!(
            TemplateSet::from_json(r#"{ "questions": [] }"#),
            Err(DataLoadError::NoQuestions)
        );
        assert_eq!(TemplateSet::from_json("{}"), Err(DataLoadError::NoQuestions));
    }

    #[test]
    fn time_questions_are_deterministic_for_a_seed() {
        let template = QuizTemplate::new(TemplateKind::Time, "なんじですか。");

        let first = instantiate(&mut StdRng::seed_from_u64(11), &template, DEFAULT_PRICE_RANGE)
            .expect("time question");
        let second = instantiate(&mut StdRng::seed_from_u64(11), &template, DEFAULT_PRICE_RANGE)
            .expect("time question");

        assert_eq!(first.display, second.display);
        assert_eq!(first.correct_answer, second.correct_answer);
        assert_eq!(first.choices, second.choices);
        assert_valid_set(&first);
    }

    #[test]
    fn randomized_kinds_produce_valid_sets() {
        let mut rng = StdRng::seed_from_u64(12);
        for kind in [
            TemplateKind::Time,
            TemplateKind::TimeRange,
            TemplateKind::Phone,
            TemplateKind::Price,
        ] {
            let template = QuizTemplate::new(kind, "question");
            for _ in 0..25 {
                let question =
                    instantiate(&mut rng, &template, DEFAULT_PRICE_RANGE).expect("generates");
                assert_valid_set(&question);
                assert!(question.display.is_some());
                assert!(question.choices_th.is_none());
            }
        }
    }

    #[test]
    fn time_range_answer_reads_kara_made() {
        let mut rng = StdRng::seed_from_u64(13);
        let template = QuizTemplate::new(TemplateKind::TimeRange, "なんじからなんじまでですか。");
        let question = instantiate(&mut rng, &template, DEFAULT_PRICE_RANGE).expect("range");

        assert!(question.correct_answer.contains(" kara "));
        assert!(question.correct_answer.ends_with(" made"));
        assert!(matches!(question.display, Some(DisplayValue::TimeRange(ref text)) if text.contains(" - ")));
    }

    #[test]
    fn price_respects_template_range() {
        let mut rng = StdRng::seed_from_u64(14);
        let mut template = QuizTemplate::new(TemplateKind::Price, "いくらですか。");
        template.price_range = Some((1000, 1000));

        let question = instantiate(&mut rng, &template, DEFAULT_PRICE_RANGE).expect("price");

        assert_eq!(question.correct_answer, "sen en");
        assert_eq!(question.display, Some(DisplayValue::Price("1,000 ¥".to_string())));
        assert_valid_set(&question);
    }

    #[test]
    fn inverted_price_range_fails_the_question() {
        let mut rng = StdRng::seed_from_u64(15);
        let mut template = QuizTemplate::new(TemplateKind::Price, "いくらですか。");
        template.price_range = Some((900, 100));

        let error = instantiate(&mut rng, &template, DEFAULT_PRICE_RANGE).expect_err("inverted");
        assert_eq!(
            error,
            TemplateError::Generate(GenerateError::InvalidPriceRange { min: 900, max: 100 })
        );
    }

    #[test]
    fn authored_choices_keep_order_and_subtitles() {
        let mut rng = StdRng::seed_from_u64(16);
        let mut template = QuizTemplate::new(TemplateKind::ImageLocation, "ここはどこですか。");
        template.image = Some("images/eki.jpg".to_string());
        template.choices = Some(vec!["えきです".to_string(), "がっこうです".to_string()]);
        template.choices_th = Some(vec!["สถานีรถไฟ".to_string()]);
        template.correct_answer = Some("がっこうです".to_string());

        let question = instantiate(&mut rng, &template, DEFAULT_PRICE_RANGE).expect("authored");

        assert_eq!(question.choices, vec!["えきです", "がっこうです"]);
        assert_eq!(question.correct_index, 1);
        assert_eq!(question.display, Some(DisplayValue::Image("images/eki.jpg".to_string())));
        assert_eq!(question.choice_subtitle(0), Some("สถานีรถไฟ"));
        assert_eq!(question.choice_subtitle(1), None);
    }

    #[test]
    fn authored_questions_need_a_listed_answer() {
        let mut rng = StdRng::seed_from_u64(17);
        let mut template = QuizTemplate::new(TemplateKind::Plain, "おげんきですか。");

        assert_eq!(
            instantiate(&mut rng, &template, DEFAULT_PRICE_RANGE),
            Err(TemplateError::MissingChoices {
                question: "おげんきですか。".to_string()
            })
        );

        template.choices = Some(vec!["はい".to_string()]);
        template.correct_answer = Some("いいえ".to_string());

        assert_eq!(
            instantiate(&mut rng, &template, DEFAULT_PRICE_RANGE),
            Err(TemplateError::CorrectAnswerNotInChoices {
                question: "おげんきですか。".to_string()
            })
        );
    }

    #[test]
    fn phone_answers_can_be_spoken_back() {
        let mut rng = StdRng::seed_from_u64(18);
        let template = QuizTemplate::new(TemplateKind::Phone, "でんわばんごうは？");
        let question = instantiate(&mut rng, &template, DEFAULT_PRICE_RANGE).expect("phone");

        let spoken = format!("ええと {}", question.correct_answer);
        assert!(check_spoken_answer(&spoken, &question.correct_answer));
    }
}
