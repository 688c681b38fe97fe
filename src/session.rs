use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::config::QuizConfig;
use crate::matcher::check_spoken_answer;
use crate::quiz::{QuizError, QuizMode, build_choices};
use crate::speech::{Lang, Utterance};
use crate::template::{DisplayValue, GeneratedQuestion, QuizTemplate, TemplateSet, instantiate};
use crate::vocab::{VocabEntry, VocabList};

/// Material a session is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deck {
    /// Word pairs; choices are drawn from the rest of the deck.
    Vocabulary(VocabList),
    /// Conversation templates; randomized values are re-rolled on restart.
    Conversation(TemplateSet),
}

impl Deck {
    fn vocab_pool(&self) -> &[VocabEntry] {
        match self {
            Self::Vocabulary(list) => list.entries(),
            Self::Conversation(_) => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Item {
    /// Position of the entry in the vocabulary deck.
    Vocab(usize),
    Question(GeneratedQuestion),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Items laid out, nothing shown yet.
    Ready,
    /// A question is shown and accepts one answer.
    Presenting,
    /// The answer is revealed; waiting for `next` or the auto-advance.
    Answered,
    /// Every item has been passed.
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceOption {
    pub text: String,
    pub subtitle: Option<String>,
}

/// What the presentation layer needs to show the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presented {
    pub prompt: String,
    /// Kana reading of a Japanese prompt.
    pub reading: Option<String>,
    pub prompt_translation: Option<String>,
    pub hint: Option<String>,
    pub answer_pattern: Option<String>,
    pub display: Option<DisplayValue>,
    pub options: Vec<ChoiceOption>,
    pub correct_index: usize,
    pub correct_answer: String,
    /// Utterance to read the prompt aloud.
    pub speech: Utterance,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    /// Option picked, or the correct option for a matched spoken answer.
    pub chosen: Option<usize>,
    pub heard: Option<String>,
    pub correct: bool,
}

/// Permission to move past one answered question, valid until the session
/// moves on by any other route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceTicket {
    epoch: u64,
}

/// Identifies one presentation of a question, for answers that arrive late.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentationToken {
    epoch: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub chosen: Option<usize>,
    pub correct_index: usize,
    pub ticket: AdvanceTicket,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub score: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Reset { mode: QuizMode, total: usize },
    Presented { index: usize },
    Answered { index: usize, correct: bool },
    Skipped { index: usize, reason: String },
    Completed { score: usize, total: usize },
}

type Listener = Box<dyn FnMut(&SessionEvent)>;

/// One run through a deck: order, score, and the answered/unanswered state
/// of the current question.
pub struct Session<R: Rng = StdRng> {
    deck: Deck,
    config: QuizConfig,
    rng: R,
    mode: QuizMode,
    items: Vec<Item>,
    current_index: usize,
    score: usize,
    phase: Phase,
    presented: Option<Presented>,
    answer: Option<Answer>,
    choices_hidden: bool,
    epoch: u64,
    listener: Option<Listener>,
}

impl<R: Rng> Session<R> {
    /// Lays out a shuffled run over `deck`. Call [`Session::start`] to show
    /// the first question.
    pub fn new(deck: Deck, config: QuizConfig, rng: R) -> Self {
        let mode = config.initial_mode;
        let mut session = Self {
            deck,
            config,
            rng,
            mode,
            items: Vec::new(),
            current_index: 0,
            score: 0,
            phase: Phase::Ready,
            presented: None,
            answer: None,
            choices_hidden: false,
            epoch: 0,
            listener: None,
        };
        session.items = session.lay_out(true);
        session
    }

    /// Registers a callback invoked after every state change.
    pub fn set_listener(&mut self, listener: impl FnMut(&SessionEvent) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn start(&mut self) {
        if self.phase == Phase::Ready {
            self.present_current();
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    /// Questions answered so far, including the one currently revealed.
    pub fn answered_count(&self) -> usize {
        self.current_index + usize::from(self.phase == Phase::Answered)
    }

    /// One-based question number for display, `total` once complete.
    pub fn position(&self) -> usize {
        match self.phase {
            Phase::Complete => self.total(),
            _ if self.items.is_empty() => 0,
            _ => self.current_index + 1,
        }
    }

    pub fn presented(&self) -> Option<&Presented> {
        self.presented.as_ref()
    }

    pub fn answer(&self) -> Option<&Answer> {
        self.answer.as_ref()
    }

    pub fn choices_hidden(&self) -> bool {
        self.choices_hidden
    }

    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    pub fn is_conversation(&self) -> bool {
        matches!(self.deck, Deck::Conversation(_))
    }

    pub fn summary(&self) -> Option<Summary> {
        (self.phase == Phase::Complete).then_some(Summary {
            score: self.score,
            total: self.total(),
        })
    }

    /// Language a spoken answer is expected in.
    pub fn answer_lang(&self) -> Lang {
        match (&self.deck, self.mode) {
            (Deck::Vocabulary(_), QuizMode::JapaneseToThai) => Lang::Thai,
            _ => Lang::Japanese,
        }
    }

    /// Delay the presentation layer should wait before [`Session::auto_advance`].
    pub fn advance_delay_ms(&self) -> u32 {
        if self.is_conversation() {
            self.config.conversation_advance_delay_ms
        } else {
            self.config.vocab_advance_delay_ms
        }
    }

    /// Moves to the next question whether or not the current one was answered.
    pub fn next(&mut self) {
        match self.phase {
            Phase::Presenting | Phase::Answered => self.advance(),
            Phase::Ready => self.start(),
            Phase::Complete => {}
        }
    }

    /// Advances after an answer if `ticket` is still current. Returns whether
    /// it did; a ticket fires at most once.
    pub fn auto_advance(&mut self, ticket: AdvanceTicket) -> bool {
        if ticket.epoch != self.epoch || self.phase != Phase::Answered {
            return false;
        }
        self.advance();
        true
    }

    pub fn shuffle_restart(&mut self) {
        self.restart(true);
    }

    /// Restarts in deck order.
    pub fn reset_restart(&mut self) {
        self.restart(false);
    }

    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
        log::info!("switched to {}", self.mode.label());
        self.restart(true);
    }

    /// Flips whether the options are hidden, returning the new value.
    pub fn toggle_hide_choices(&mut self) -> bool {
        self.choices_hidden = !self.choices_hidden;
        self.choices_hidden
    }

    /// Answers with the option at `index`. Ignored unless a question is
    /// waiting for its answer.
    pub fn choose_option(&mut self, index: usize) -> Option<AnswerOutcome> {
        let presented = self.presented.as_ref().filter(|_| self.phase == Phase::Presenting)?;
        if index >= presented.options.len() {
            return None;
        }

        let correct = index == presented.correct_index;
        Some(self.record(Some(index), None, correct))
    }

    /// Answers with the first option whose text equals `text`.
    pub fn choose_option_text(&mut self, text: &str) -> Option<AnswerOutcome> {
        let index = self
            .presented
            .as_ref()?
            .options
            .iter()
            .position(|option| option.text == text)?;
        self.choose_option(index)
    }

    /// Token for the question currently waiting for an answer.
    pub fn presentation_token(&self) -> Option<PresentationToken> {
        (self.phase == Phase::Presenting).then_some(PresentationToken { epoch: self.epoch })
    }

    /// Like [`Session::submit_spoken_answer`], but ignored once the session
    /// has moved past the presentation `token` was taken from.
    pub fn submit_spoken_answer_for(
        &mut self,
        token: PresentationToken,
        transcript: &str,
    ) -> Option<AnswerOutcome> {
        if token.epoch != self.epoch {
            log::debug!("discarding transcript {transcript:?} for an earlier question");
            return None;
        }
        self.submit_spoken_answer(transcript)
    }

    /// Answers with a speech transcript, matched loosely against the correct
    /// answer. A match counts as choosing the correct option.
    pub fn submit_spoken_answer(&mut self, transcript: &str) -> Option<AnswerOutcome> {
        let presented = self.presented.as_ref().filter(|_| self.phase == Phase::Presenting)?;

        let correct = check_spoken_answer(transcript, &presented.correct_answer);
        let chosen = correct.then_some(presented.correct_index);
        log::debug!("heard {transcript:?}, correct: {correct}");

        Some(self.record(chosen, Some(transcript.to_string()), correct))
    }

    fn record(&mut self, chosen: Option<usize>, heard: Option<String>, correct: bool) -> AnswerOutcome {
        let correct_index = self
            .presented
            .as_ref()
            .map(|presented| presented.correct_index)
            .unwrap_or_default();

        if correct {
            self.score += 1;
        }
        self.phase = Phase::Answered;
        self.answer = Some(Answer {
            chosen,
            heard,
            correct,
        });
        self.emit(SessionEvent::Answered {
            index: self.current_index,
            correct,
        });

        AnswerOutcome {
            correct,
            chosen,
            correct_index,
            ticket: AdvanceTicket { epoch: self.epoch },
        }
    }

    fn advance(&mut self) {
        self.epoch += 1;
        self.current_index += 1;
        self.present_current();
    }

    fn restart(&mut self, reshuffle: bool) {
        self.epoch += 1;
        self.items = self.lay_out(reshuffle);
        self.current_index = 0;
        self.score = 0;
        self.phase = Phase::Ready;
        self.presented = None;
        self.answer = None;
        self.emit(SessionEvent::Reset {
            mode: self.mode,
            total: self.items.len(),
        });
        self.present_current();
    }

    fn lay_out(&mut self, reshuffle: bool) -> Vec<Item> {
        let mut items: Vec<Item> = match &self.deck {
            Deck::Vocabulary(list) => (0..list.len()).map(Item::Vocab).collect(),
            Deck::Conversation(set) => {
                // templates are shuffled before instantiation so the rolls
                // follow the presented order
                let mut templates: Vec<&QuizTemplate> = set.questions().iter().collect();
                if reshuffle {
                    templates.shuffle(&mut self.rng);
                }

                let price_range = self.config.default_price_range;
                let rng = &mut self.rng;
                return templates
                    .into_iter()
                    .filter_map(|template| match instantiate(rng, template, price_range) {
                        Ok(question) => Some(Item::Question(question)),
                        Err(error) => {
                            log::warn!("dropping question {:?}: {error}", template.question);
                            None
                        }
                    })
                    .collect();
            }
        };

        if reshuffle {
            items.shuffle(&mut self.rng);
        }
        items
    }

    fn present_current(&mut self) {
        self.answer = None;

        while self.current_index < self.items.len() {
            match self.present_item(self.current_index) {
                Ok(presented) => {
                    self.presented = Some(presented);
                    self.phase = Phase::Presenting;
                    self.emit(SessionEvent::Presented {
                        index: self.current_index,
                    });
                    return;
                }
                Err(error) => {
                    log::warn!("skipping question {}: {error}", self.current_index + 1);
                    self.emit(SessionEvent::Skipped {
                        index: self.current_index,
                        reason: error.to_string(),
                    });
                    self.current_index += 1;
                }
            }
        }

        self.presented = None;
        self.phase = Phase::Complete;
        log::info!("session complete: {}/{}", self.score, self.total());
        self.emit(SessionEvent::Completed {
            score: self.score,
            total: self.total(),
        });
    }

    fn present_item(&mut self, index: usize) -> Result<Presented, QuizError> {
        let mode = self.mode;
        let pick_count = self.config.distractor_count();

        match &self.items[index] {
            Item::Vocab(entry_index) => {
                let pool = self.deck.vocab_pool();
                let set = build_choices(
                    &mut self.rng,
                    pool,
                    *entry_index,
                    |entry| entry.answer(mode).to_string(),
                    pick_count,
                )?;
                let entry = &pool[*entry_index];

                let speech = match mode {
                    QuizMode::JapaneseToThai => Utterance::new(entry.reading(), Lang::Japanese),
                    QuizMode::ThaiToJapanese => Utterance::new(entry.th.clone(), Lang::Thai),
                };
                let reading = match mode {
                    QuizMode::JapaneseToThai => entry.kana.clone(),
                    QuizMode::ThaiToJapanese => None,
                };

                Ok(Presented {
                    prompt: entry.prompt(mode).to_string(),
                    reading,
                    prompt_translation: None,
                    hint: None,
                    answer_pattern: None,
                    display: None,
                    options: set
                        .options
                        .into_iter()
                        .map(|text| ChoiceOption {
                            text,
                            subtitle: None,
                        })
                        .collect(),
                    correct_index: set.correct_index,
                    correct_answer: set.correct_answer,
                    speech,
                })
            }
            Item::Question(question) => {
                let template = &question.template;
                Ok(Presented {
                    prompt: template.question.clone(),
                    reading: None,
                    prompt_translation: template.question_th.clone(),
                    hint: template.hint.clone(),
                    answer_pattern: template.answer_pattern.clone(),
                    display: question.display.clone(),
                    options: question
                        .choices
                        .iter()
                        .enumerate()
                        .map(|(idx, text)| ChoiceOption {
                            text: text.clone(),
                            subtitle: question.choice_subtitle(idx).map(str::to_string),
                        })
                        .collect(),
                    correct_index: question.correct_index,
                    correct_answer: question.correct_answer.clone(),
                    speech: Utterance::new(template.question.clone(), Lang::Japanese),
                })
            }
        }
    }

    fn emit(&mut self, event: SessionEvent) {
        log::debug!("session event: {event:?}");
        if let Some(listener) = self.listener.as_mut() {
            listener(&event);
        }
    }
}
