use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;

/// Number of options shown for every multiple-choice question.
pub const OPTION_COUNT: usize = 4;

/// Translation direction between prompt and answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum QuizMode {
    /// Prompts with the Japanese word and expects the Thai translation.
    #[default]
    JapaneseToThai,
    /// Prompts with the Thai word and expects the Japanese translation.
    ThaiToJapanese,
}

impl QuizMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::JapaneseToThai => Self::ThaiToJapanese,
            Self::ThaiToJapanese => Self::JapaneseToThai,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::JapaneseToThai => "JP → TH",
            Self::ThaiToJapanese => "TH → JP",
        }
    }
}

/// A shuffled multiple-choice set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceSet {
    /// Rendered option texts, all distinct.
    pub options: Vec<String>,
    /// Index in `options` holding the correct answer.
    pub correct_index: usize,
    pub correct_answer: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QuizError {
    #[error("option count must be at least 2")]
    OptionCountTooSmall,
    #[error("requires at least {required} items but only {available} provided")]
    NotEnoughItems { required: usize, available: usize },
    #[error("requires at least {required} unique options but only {unique} available")]
    InsufficientUniqueOptions { required: usize, unique: usize },
    #[error("correct item index {index} is outside a pool of {len}")]
    CorrectIndexOutOfRange { index: usize, len: usize },
}

/// Builds a choice set for `pool[correct_index]` with `pick_count` wrong answers
/// drawn from the rest of the pool.
///
/// The correct item is excluded by position, so two entries with equal fields
/// are still told apart. Candidates whose rendered text repeats the correct
/// answer or an option already picked are skipped.
///
/// # Errors
/// * [`QuizError::OptionCountTooSmall`] if `pick_count` is zero.
/// * [`QuizError::CorrectIndexOutOfRange`] if `correct_index` is not in `pool`.
/// * [`QuizError::NotEnoughItems`] if the pool is smaller than `pick_count + 1`.
/// * [`QuizError::InsufficientUniqueOptions`] if too few distinct texts remain.
pub fn build_choices<R, T, F>(
    rng: &mut R,
    pool: &[T],
    correct_index: usize,
    project: F,
    pick_count: usize,
) -> Result<ChoiceSet, QuizError>
where
    R: Rng + ?Sized,
    F: Fn(&T) -> String,
{
    if pick_count == 0 {
        return Err(QuizError::OptionCountTooSmall);
    }

    let correct_item = pool.get(correct_index).ok_or(QuizError::CorrectIndexOutOfRange {
        index: correct_index,
        len: pool.len(),
    })?;

    let required = pick_count + 1;
    if pool.len() < required {
        return Err(QuizError::NotEnoughItems {
            required,
            available: pool.len(),
        });
    }

    let correct_answer = project(correct_item);

    let mut others: Vec<usize> = (0..pool.len()).filter(|idx| *idx != correct_index).collect();
    others.shuffle(rng);

    let mut seen = HashSet::new();
    seen.insert(correct_answer.clone());

    let wrong: Vec<String> = others
        .into_iter()
        .map(|idx| project(&pool[idx]))
        .filter(|text| seen.insert(text.clone()))
        .take(pick_count)
        .collect();

    if wrong.len() < pick_count {
        return Err(QuizError::InsufficientUniqueOptions {
            required,
            unique: wrong.len() + 1,
        });
    }

    Ok(finalize_choices(rng, correct_answer, wrong))
}

/// Shuffles `correct` in among `wrong` and records where it landed.
pub fn finalize_choices<R: Rng + ?Sized>(
    rng: &mut R,
    correct: String,
    wrong: Vec<String>,
) -> ChoiceSet {
    let mut options: Vec<(bool, String)> = Vec::with_capacity(wrong.len() + 1);
    options.push((true, correct.clone()));
    options.extend(wrong.into_iter().map(|text| (false, text)));
    options.shuffle(rng);

    let correct_index = options
        .iter()
        .position(|(is_correct, _)| *is_correct)
        .unwrap_or_default();

    ChoiceSet {
        options: options.into_iter().map(|(_, text)| text).collect(),
        correct_index,
        correct_answer: correct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::VocabEntry;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn sample_vocab() -> Vec<VocabEntry> {
        vec![
            VocabEntry::new("せんせい", "ครู"),
            VocabEntry::new("がくせい", "นักเรียน"),
            VocabEntry::new("いしゃ", "หมอ"),
            VocabEntry::new("かいしゃいん", "พนักงานบริษัท"),
            VocabEntry::new("ぎんこういん", "พนักงานธนาคาร"),
        ]
    }

    #[test]
    fn builds_four_options_with_one_correct() {
        let vocab = sample_vocab();
        let mut rng = StdRng::seed_from_u64(42);

        let set = build_choices(
            &mut rng,
            &vocab,
            2,
            |entry| entry.answer(QuizMode::JapaneseToThai).to_string(),
            OPTION_COUNT - 1,
        )
        .expect("choices should build");

        assert_eq!(set.options.len(), OPTION_COUNT);
        assert_eq!(set.correct_answer, "หมอ");
        assert_eq!(set.options[set.correct_index], "หมอ");
        assert_eq!(set.options.iter().filter(|text| *text == "หมอ").count(), 1);
    }

    #[test]
    fn correct_answer_present_exactly_once_over_many_seeds() {
        let vocab = sample_vocab();

        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let correct_index = (seed as usize) % vocab.len();
            let set = build_choices(
                &mut rng,
                &vocab,
                correct_index,
                |entry| entry.answer(QuizMode::ThaiToJapanese).to_string(),
                3,
            )
            .expect("choices should build");

            let correct = &vocab[correct_index].jp;
            assert_eq!(set.options.len(), 4);
            assert_eq!(&set.options[set.correct_index], correct);
            assert_eq!(set.options.iter().filter(|text| *text == correct).count(), 1);

            let unique: HashSet<_> = set.options.iter().collect();
            assert_eq!(unique.len(), 4);
        }
    }

    #[test]
    fn random_distinct_pools_always_build_valid_sets() {
        let mut rng = StdRng::seed_from_u64(2024);

        for round in 0..300 {
            let size = if round % 4 == 0 { 4 } else { rng.gen_range(4..=12) };
            let mut ids = HashSet::new();
            while ids.len() < size {
                ids.insert(rng.gen_range(0..10_000u32));
            }
            let pool: Vec<VocabEntry> = ids
                .into_iter()
                .map(|id| VocabEntry::new(format!("語{id}"), format!("คำ{id}")))
                .collect();

            let mode = if round % 2 == 0 {
                QuizMode::JapaneseToThai
            } else {
                QuizMode::ThaiToJapanese
            };
            let correct_index = rng.gen_range(0..pool.len());
            let set = build_choices(
                &mut rng,
                &pool,
                correct_index,
                |entry| entry.answer(mode).to_string(),
                OPTION_COUNT - 1,
            )
            .expect("distinct pools of four or more always build");

            let correct = pool[correct_index].answer(mode);
            assert_eq!(set.options.len(), OPTION_COUNT);
            assert_eq!(set.options[set.correct_index], correct);
            assert_eq!(set.options.iter().filter(|text| *text == correct).count(), 1);
            let unique: HashSet<_> = set.options.iter().collect();
            assert_eq!(unique.len(), OPTION_COUNT, "pool of {size}");
        }
    }

    #[test]
    fn duplicate_translations_are_not_offered_twice() {
        let mut vocab = sample_vocab();
        vocab.push(VocabEntry::new("きょうし", "ครู"));
        let mut rng = StdRng::seed_from_u64(9);

        for _ in 0..50 {
            let set = build_choices(
                &mut rng,
                &vocab,
                0,
                |entry| entry.th.clone(),
                3,
            )
            .expect("enough distinct translations remain");

            assert_eq!(set.options.iter().filter(|text| *text == "ครู").count(), 1);
        }
    }

    #[test]
    fn error_when_pool_too_small() {
        let vocab = sample_vocab();
        let mut rng = StdRng::seed_from_u64(1);

        let error = build_choices(&mut rng, &vocab[..3], 0, |entry| entry.th.clone(), 3)
            .expect_err("three items cannot make four options");

        assert_eq!(
            error,
            QuizError::NotEnoughItems {
                required: 4,
                available: 3
            }
        );
    }

    #[test]
    fn error_when_not_enough_unique_texts() {
        let vocab = vec![
            VocabEntry::new("あ", "ก"),
            VocabEntry::new("い", "ก"),
            VocabEntry::new("う", "ข"),
            VocabEntry::new("え", "ข"),
        ];
        let mut rng = StdRng::seed_from_u64(2);

        let error = build_choices(&mut rng, &vocab, 0, |entry| entry.th.clone(), 3)
            .expect_err("only two distinct translations");

        assert_eq!(
            error,
            QuizError::InsufficientUniqueOptions {
                required: 4,
                unique: 2
            }
        );
    }

    #[test]
    fn error_when_index_out_of_range() {
        let vocab = sample_vocab();
        let mut rng = StdRng::seed_from_u64(3);

        let error = build_choices(&mut rng, &vocab, 10, |entry| entry.th.clone(), 3)
            .expect_err("index past the end");

        assert_eq!(error, QuizError::CorrectIndexOutOfRange { index: 10, len: 5 });
        assert_eq!(
            build_choices(&mut rng, &vocab, 0, |entry| entry.th.clone(), 0),
            Err(QuizError::OptionCountTooSmall)
        );
    }

    #[test]
    fn finalize_records_correct_position() {
        let mut rng = StdRng::seed_from_u64(4);
        let set = finalize_choices(
            &mut rng,
            "gozen ku-ji".to_string(),
            vec!["gogo ni-ji".to_string(), "gozen go-ji".to_string()],
        );

        assert_eq!(set.options.len(), 3);
        assert_eq!(set.options[set.correct_index], "gozen ku-ji");
    }

    #[test]
    fn mode_toggles_back_and_forth() {
        let mode = QuizMode::default();
        assert_eq!(mode, QuizMode::JapaneseToThai);
        assert_eq!(mode.toggled(), QuizMode::ThaiToJapanese);
        assert_eq!(mode.toggled().toggled(), mode);
        assert_eq!(mode.label(), "JP → TH");
    }
}
