//! Bookkeeping around the speech synthesis and recognition capabilities.
//!
//! The engines themselves live outside the crate; these types decide what to
//! play next and when a control returns to idle.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Lang {
    Japanese,
    Thai,
}

impl Lang {
    /// BCP 47 tag handed to the speech engines.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Japanese => "ja-JP",
            Self::Thai => "th-TH",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Japanese => "ja",
            Self::Thai => "th",
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub text: String,
    pub lang: Lang,
}

impl Utterance {
    pub fn new(text: impl Into<String>, lang: Lang) -> Self {
        Self {
            text: text.into(),
            lang,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SpeechError {
    #[error("speech is not supported in this environment")]
    Unsupported,
    #[error("speech was interrupted")]
    Interrupted,
    #[error("speech failed: {0}")]
    Failed(String),
}

impl SpeechError {
    /// Maps an engine error code (`interrupted`, `not-allowed`, ...) to an error.
    pub fn from_code(code: &str) -> Self {
        match code {
            "interrupted" | "canceled" => Self::Interrupted,
            "unsupported" => Self::Unsupported,
            other => Self::Failed(other.to_string()),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Interrupted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct InFlight {
    utterance: Utterance,
    retried: bool,
}

/// Serializes speak requests: one utterance plays at a time and at most one
/// waits behind it.
#[derive(Debug, Default)]
pub struct SpeechQueue {
    in_flight: Option<InFlight>,
    pending: Option<Utterance>,
}

impl SpeechQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the utterance to start now, or `None` when it was queued behind
    /// the one playing. A queued request replaces any earlier queued one.
    pub fn request(&mut self, utterance: Utterance) -> Option<Utterance> {
        if utterance.text.trim().is_empty() {
            return None;
        }

        if self.in_flight.is_some() {
            if let Some(dropped) = self.pending.replace(utterance) {
                log::debug!("replaced queued utterance {:?}", dropped.text);
            }
            return None;
        }

        self.start(utterance, false)
    }

    /// Reports how the playing utterance ended and returns what to play next.
    ///
    /// A transient failure is retried once; after that, or on any other
    /// outcome, the queued utterance (if any) is started.
    pub fn finished(&mut self, outcome: Result<(), SpeechError>) -> Option<Utterance> {
        let current = self.in_flight.take()?;

        if let Err(error) = outcome {
            if error.is_transient() && !current.retried {
                log::info!("retrying interrupted utterance {:?}", current.utterance.text);
                return self.start(current.utterance, true);
            }
            log::warn!("dropping utterance {:?}: {}", current.utterance.text, error);
        }

        let next = self.pending.take()?;
        self.start(next, false)
    }

    fn start(&mut self, utterance: Utterance, retried: bool) -> Option<Utterance> {
        self.in_flight = Some(InFlight {
            utterance: utterance.clone(),
            retried,
        });
        Some(utterance)
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn pending(&self) -> Option<&Utterance> {
        self.pending.as_ref()
    }

    /// Forgets the queued utterance, e.g. when the session restarts.
    pub fn clear_pending(&mut self) {
        self.pending = None;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MicState {
    #[default]
    Idle,
    Listening,
}

/// Tracks the single-shot listen control.
#[derive(Debug, Default)]
pub struct Microphone {
    state: MicState,
}

impl Microphone {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MicState {
        self.state
    }

    /// Moves to `Listening`. Returns `false` if a listen is already running.
    pub fn begin(&mut self) -> bool {
        if self.state == MicState::Listening {
            return false;
        }
        self.state = MicState::Listening;
        true
    }

    /// Returns to idle whatever the outcome and yields the trimmed transcript
    /// when there is one.
    pub fn finish(&mut self, outcome: Result<String, SpeechError>) -> Option<String> {
        self.state = MicState::Idle;

        match outcome {
            Ok(transcript) => {
                let transcript = transcript.trim();
                (!transcript.is_empty()).then(|| transcript.to_string())
            }
            Err(error) => {
                log::info!("listening ended without a transcript: {error}");
                None
            }
        }
    }
}

/// Which capability an unsupported notice refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Synthesis,
    Recognition,
}

/// Remembers which unsupported notices have already been shown.
#[derive(Debug, Default)]
pub struct SupportNotice {
    synthesis_shown: bool,
    recognition_shown: bool,
}

impl SupportNotice {
    /// True the first time it is called for `capability`.
    pub fn should_notify(&mut self, capability: Capability) -> bool {
        let shown = match capability {
            Capability::Synthesis => &mut self.synthesis_shown,
            Capability::Recognition => &mut self.recognition_shown,
        };
        !std::mem::replace(shown, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ja(text: &str) -> Utterance {
        Utterance::new(text, Lang::Japanese)
    }

    #[test]
    fn idle_queue_starts_immediately() {
        let mut queue = SpeechQueue::new();
        assert_eq!(queue.request(ja("おはよう")), Some(ja("おはよう")));
        assert!(queue.is_busy());
    }

    #[test]
    fn busy_queue_keeps_only_the_latest_request() {
        let mut queue = SpeechQueue::new();
        queue.request(ja("いち"));

        assert_eq!(queue.request(ja("に")), None);
        assert_eq!(queue.request(ja("さん")), None);
        assert_eq!(queue.pending(), Some(&ja("さん")));

        assert_eq!(queue.finished(Ok(())), Some(ja("さん")));
        assert_eq!(queue.finished(Ok(())), None);
        assert!(!queue.is_busy());
    }

    #[test]
    fn interruption_is_retried_once() {
        let mut queue = SpeechQueue::new();
        queue.request(ja("こんにちは"));
        queue.request(ja("つぎ"));

        assert_eq!(queue.finished(Err(SpeechError::Interrupted)), Some(ja("こんにちは")));
        assert_eq!(queue.finished(Err(SpeechError::Interrupted)), Some(ja("つぎ")));
        assert_eq!(queue.finished(Ok(())), None);
    }

    #[test]
    fn hard_failures_are_not_retried() {
        let mut queue = SpeechQueue::new();
        queue.request(Utterance::new("ครู", Lang::Thai));

        assert_eq!(queue.finished(Err(SpeechError::Failed("network".into()))), None);
        assert!(!queue.is_busy());
    }

    #[test]
    fn blank_text_is_ignored() {
        let mut queue = SpeechQueue::new();
        assert_eq!(queue.request(ja("  ")), None);
        assert!(!queue.is_busy());
        assert_eq!(queue.finished(Ok(())), None);
    }

    #[test]
    fn error_codes_map_to_kinds() {
        assert_eq!(SpeechError::from_code("interrupted"), SpeechError::Interrupted);
        assert_eq!(SpeechError::from_code("unsupported"), SpeechError::Unsupported);
        assert_eq!(
            SpeechError::from_code("not-allowed"),
            SpeechError::Failed("not-allowed".to_string())
        );
        assert!(SpeechError::Interrupted.is_transient());
        assert!(!SpeechError::Unsupported.is_transient());
    }

    #[test]
    fn microphone_returns_to_idle_on_every_outcome() {
        let mut mic = Microphone::new();

        assert!(mic.begin());
        assert!(!mic.begin());
        assert_eq!(mic.finish(Ok("  せんせい ".to_string())), Some("せんせい".to_string()));
        assert_eq!(mic.state(), MicState::Idle);

        assert!(mic.begin());
        assert_eq!(mic.finish(Err(SpeechError::Failed("no-speech".into()))), None);
        assert_eq!(mic.state(), MicState::Idle);

        assert!(mic.begin());
        assert_eq!(mic.finish(Ok("   ".to_string())), None);
    }

    #[test]
    fn unsupported_notice_fires_once_per_capability() {
        let mut notice = SupportNotice::default();
        assert!(notice.should_notify(Capability::Recognition));
        assert!(!notice.should_notify(Capability::Recognition));
        assert!(notice.should_notify(Capability::Synthesis));
        assert!(!notice.should_notify(Capability::Synthesis));
    }

    #[test]
    fn language_tags() {
        assert_eq!(Lang::Japanese.tag(), "ja-JP");
        assert_eq!(Lang::Thai.code(), "th");
        assert_eq!(Lang::Thai.to_string(), "th-TH");
    }
}
