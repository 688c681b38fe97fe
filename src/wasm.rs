#![cfg(target_arch = "wasm32")]

use crate::speech::{Capability, SupportNotice};
use crate::{
    AnswerOutcome, DataLoadError, Deck, DisplayValue, Microphone, Phase, Presented, QuizConfig,
    Session, SessionEvent, SpeechError, SpeechQueue, Summary, TemplateSet, Utterance, VocabList,
    demo_vocab,
};
use gloo_net::http::Request;
use leptos::leptos_dom::helpers::{TimeoutHandle, set_timeout_with_handle};
use leptos::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::Duration;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

#[wasm_bindgen(inline_js = r#"
export function speechSupported() {
    return typeof window !== "undefined" && "speechSynthesis" in window;
}

export function recognitionSupported() {
    return typeof window !== "undefined"
        && !!(window.SpeechRecognition || window.webkitSpeechRecognition);
}

export function speak(text, lang, rate) {
    return new Promise((resolve, reject) => {
        const utterance = new SpeechSynthesisUtterance(text);
        utterance.lang = lang;
        utterance.rate = rate;
        utterance.onend = () => resolve();
        utterance.onerror = (event) => reject(event.error || "failed");
        window.speechSynthesis.speak(utterance);
    });
}

export function listen(lang) {
    return new Promise((resolve, reject) => {
        const Recognition = window.SpeechRecognition || window.webkitSpeechRecognition;
        const recognition = new Recognition();
        recognition.lang = lang;
        recognition.interimResults = false;
        recognition.maxAlternatives = 1;
        let settled = false;
        recognition.onresult = (event) => {
            settled = true;
            resolve(event.results[0][0].transcript);
        };
        recognition.onerror = (event) => {
            settled = true;
            reject(event.error || "failed");
        };
        recognition.onend = () => {
            if (!settled) reject("no-speech");
        };
        recognition.start();
    });
}

export function notify(message) {
    window.alert(message);
}
"#)]
extern "C" {
    #[wasm_bindgen(js_name = speechSupported)]
    fn speech_supported() -> bool;

    #[wasm_bindgen(js_name = recognitionSupported)]
    fn recognition_supported() -> bool;

    #[wasm_bindgen(js_name = speak)]
    fn speak_js(text: &str, lang: &str, rate: f32) -> js_sys::Promise;

    #[wasm_bindgen(js_name = listen)]
    fn listen_js(lang: &str) -> js_sys::Promise;

    fn notify(message: &str);
}

const SYNTHESIS_UNSUPPORTED: &str = "เบราว์เซอร์ไม่รองรับการอ่านออกเสียง";
const RECOGNITION_UNSUPPORTED: &str = "เบราว์เซอร์ไม่รองรับ Speech Recognition";

#[derive(Clone, Copy, PartialEq, Eq)]
enum DeckChoice {
    Vocabulary,
    Conversation,
    Demo,
}

#[derive(Clone, PartialEq, Eq)]
enum Scene {
    Menu,
    Loading,
    Failed(String),
    Game,
}

fn speech_error_from(value: JsValue) -> SpeechError {
    value
        .as_string()
        .map(|code| SpeechError::from_code(&code))
        .unwrap_or_else(|| SpeechError::Failed("unknown".to_string()))
}

async fn fetch_text(url: &str) -> Result<String, DataLoadError> {
    let fetch_error = |message: String| DataLoadError::Fetch {
        path: url.to_string(),
        message,
    };

    let response = Request::get(url)
        .send()
        .await
        .map_err(|error| fetch_error(error.to_string()))?;

    if !response.ok() {
        return Err(fetch_error(format!("HTTP {}", response.status())));
    }

    response
        .text()
        .await
        .map_err(|error| fetch_error(error.to_string()))
}

async fn load_deck(choice: DeckChoice, config: &QuizConfig) -> Result<Deck, DataLoadError> {
    match choice {
        DeckChoice::Vocabulary => {
            let text = fetch_text(&config.vocab_url).await?;
            VocabList::parse(&text, &config.vocab_url, config.min_vocab_entries)
                .map(Deck::Vocabulary)
        }
        DeckChoice::Conversation => {
            let text = fetch_text(&config.conversation_url).await?;
            TemplateSet::parse(&text, &config.conversation_url).map(Deck::Conversation)
        }
        DeckChoice::Demo => demo_vocab().map(Deck::Vocabulary),
    }
}

/// Everything the view needs from the session, copied out so no borrow is
/// held while rendering.
#[derive(Clone, PartialEq)]
struct Snapshot {
    phase: Phase,
    position: usize,
    total: usize,
    score: usize,
    mode_label: &'static str,
    conversation: bool,
    choices_hidden: bool,
    presented: Option<Presented>,
    chosen: Option<usize>,
    correct: Option<bool>,
    heard: Option<String>,
    summary: Option<Summary>,
}

impl Snapshot {
    fn of(session: &Session<StdRng>) -> Self {
        let answer = session.answer();
        Self {
            phase: session.phase(),
            position: session.position(),
            total: session.total(),
            score: session.score(),
            mode_label: session.mode().label(),
            conversation: session.is_conversation(),
            choices_hidden: session.choices_hidden(),
            presented: session.presented().cloned(),
            chosen: answer.and_then(|answer| answer.chosen),
            correct: answer.map(|answer| answer.correct),
            heard: answer.and_then(|answer| answer.heard.clone()),
            summary: session.summary(),
        }
    }
}

/// Shared handles to the session and the speech devices. Every field is a
/// copyable arena handle, so closures capture the controller by value.
#[derive(Clone, Copy)]
struct Controller {
    session: StoredValue<Option<Session<StdRng>>>,
    version: RwSignal<u64>,
    timer: StoredValue<Option<TimeoutHandle>>,
    speech: StoredValue<SpeechQueue>,
    mic: StoredValue<Microphone>,
    notices: StoredValue<SupportNotice>,
    presented_flag: StoredValue<bool>,
    listening: RwSignal<bool>,
    speech_rate: f32,
}

impl Controller {
    fn new(speech_rate: f32) -> Self {
        Self {
            session: store_value(None),
            version: create_rw_signal(0),
            timer: store_value(None),
            speech: store_value(SpeechQueue::new()),
            mic: store_value(Microphone::new()),
            notices: store_value(SupportNotice::default()),
            presented_flag: store_value(false),
            listening: create_rw_signal(false),
            speech_rate,
        }
    }

    fn snapshot(self) -> Option<Snapshot> {
        self.version.get();
        self.session
            .with_value(|slot| slot.as_ref().map(Snapshot::of))
    }

    fn install(self, mut session: Session<StdRng>) {
        self.cancel_timer();
        self.speech.update_value(SpeechQueue::clear_pending);

        let flag = self.presented_flag;
        session.set_listener(move |event| {
            if matches!(event, SessionEvent::Presented { .. }) {
                flag.set_value(true);
            }
        });
        session.start();

        self.session.set_value(Some(session));
        self.after_change();
    }

    fn unload(self) {
        self.cancel_timer();
        self.speech.update_value(SpeechQueue::clear_pending);
        self.session.set_value(None);
        self.refresh();
    }

    fn refresh(self) {
        self.version.update(|version| *version += 1);
    }

    /// Re-renders, then reads out a newly presented question.
    fn after_change(self) {
        self.refresh();

        let presented = self
            .presented_flag
            .try_update_value(std::mem::take)
            .unwrap_or(false);
        if !presented {
            return;
        }

        let utterance = self.session.with_value(|slot| {
            slot.as_ref()
                .and_then(|session| session.presented())
                .map(|presented| presented.speech.clone())
        });
        if let Some(utterance) = utterance {
            self.speak(utterance);
        }
    }

    /// Runs a user control that moves the session on by itself; a scheduled
    /// auto-advance is dropped.
    fn control(self, action: impl FnOnce(&mut Session<StdRng>)) {
        self.cancel_timer();
        self.session.update_value(|slot| {
            if let Some(session) = slot.as_mut() {
                action(session);
            }
        });
        self.after_change();
    }

    fn restart(self, action: impl FnOnce(&mut Session<StdRng>)) {
        self.speech.update_value(SpeechQueue::clear_pending);
        self.control(action);
    }

    fn toggle_choices(self) {
        self.session.update_value(|slot| {
            if let Some(session) = slot.as_mut() {
                session.toggle_hide_choices();
            }
        });
        self.refresh();
    }

    fn answer(self, action: impl FnOnce(&mut Session<StdRng>) -> Option<AnswerOutcome>) {
        let result = self
            .session
            .try_update_value(|slot| {
                slot.as_mut().and_then(|session| {
                    action(session).map(|outcome| (outcome, session.advance_delay_ms()))
                })
            })
            .flatten();
        self.refresh();

        if let Some((outcome, delay_ms)) = result {
            log::info!(
                "answered {} (choice {:?}, correct option {})",
                if outcome.correct { "correctly" } else { "wrongly" },
                outcome.chosen,
                outcome.correct_index
            );
            self.schedule_advance(outcome, delay_ms);
        }
    }

    fn schedule_advance(self, outcome: AnswerOutcome, delay_ms: u32) {
        self.cancel_timer();

        let ticket = outcome.ticket;
        let handle = set_timeout_with_handle(
            move || {
                self.timer.set_value(None);
                let advanced = self
                    .session
                    .try_update_value(|slot| {
                        slot.as_mut()
                            .map(|session| session.auto_advance(ticket))
                            .unwrap_or(false)
                    })
                    .unwrap_or(false);
                if advanced {
                    self.after_change();
                }
            },
            Duration::from_millis(u64::from(delay_ms)),
        );

        match handle {
            Ok(handle) => self.timer.set_value(Some(handle)),
            Err(error) => log::error!("could not schedule the next question: {error:?}"),
        }
    }

    fn cancel_timer(self) {
        if let Some(handle) = self.timer.try_update_value(Option::take).flatten() {
            handle.clear();
        }
    }

    fn notify_unsupported(self, capability: Capability, message: &str) {
        let first = self
            .notices
            .try_update_value(|notices| notices.should_notify(capability))
            .unwrap_or(false);
        if first {
            log::warn!("{message}");
            notify(message);
        }
    }

    fn speak(self, utterance: Utterance) {
        if !speech_supported() {
            self.notify_unsupported(Capability::Synthesis, SYNTHESIS_UNSUPPORTED);
            return;
        }

        let Some(first) = self
            .speech
            .try_update_value(|queue| queue.request(utterance))
            .flatten()
        else {
            return;
        };

        let rate = self.speech_rate;
        let speech = self.speech;
        spawn_local(async move {
            let mut next = Some(first);
            while let Some(utterance) = next {
                let outcome = JsFuture::from(speak_js(&utterance.text, utterance.lang.tag(), rate))
                    .await
                    .map(|_| ())
                    .map_err(speech_error_from);
                if let Err(error) = &outcome {
                    log::warn!("speech for {:?} ended with {error}", utterance.text);
                }
                next = speech
                    .try_update_value(|queue| queue.finished(outcome))
                    .flatten();
            }
        });
    }

    fn speak_current(self) {
        let utterance = self.session.with_value(|slot| {
            slot.as_ref()
                .and_then(|session| session.presented())
                .map(|presented| presented.speech.clone())
        });
        if let Some(utterance) = utterance {
            self.speak(utterance);
        }
    }

    fn listen(self) {
        if !recognition_supported() {
            self.notify_unsupported(Capability::Recognition, RECOGNITION_UNSUPPORTED);
            return;
        }

        let Some((token, lang)) = self.session.with_value(|slot| {
            slot.as_ref().and_then(|session| {
                session
                    .presentation_token()
                    .map(|token| (token, session.answer_lang()))
            })
        }) else {
            return;
        };

        if !self.mic.try_update_value(Microphone::begin).unwrap_or(false) {
            return;
        }
        self.listening.set(true);

        spawn_local(async move {
            let outcome = JsFuture::from(listen_js(lang.tag()))
                .await
                .map_err(speech_error_from)
                .and_then(|value| {
                    value
                        .as_string()
                        .ok_or_else(|| SpeechError::Failed("no transcript".to_string()))
                });
            if let Err(error) = &outcome {
                log::warn!("recognition failed: {error}");
            }

            let transcript = self
                .mic
                .try_update_value(|mic| mic.finish(outcome))
                .flatten();
            self.listening.set(false);

            if let Some(transcript) = transcript {
                log::info!("heard {transcript:?}");
                self.answer(|session| session.submit_spoken_answer_for(token, &transcript));
            }
        });
    }
}

fn display_caption(display: &DisplayValue) -> &'static str {
    match display {
        DisplayValue::Time(_) => "เวลา",
        DisplayValue::TimeRange(_) => "ช่วงเวลา",
        DisplayValue::Phone(_) => "เบอร์โทรศัพท์",
        DisplayValue::Price(_) => "ราคา",
        DisplayValue::Image(_) => "รูปภาพ",
    }
}

#[component]
fn QuestionCard(snapshot: Snapshot, controller: Controller) -> impl IntoView {
    let Some(presented) = snapshot.presented.clone() else {
        return view! { <section class="quiz-card"></section> }.into_view();
    };

    let revealed = snapshot.phase == Phase::Answered;
    let feedback = match snapshot.correct {
        Some(true) => "ถูกต้อง ✅".to_string(),
        Some(false) => format!("ผิด ❌ เฉลย: {}", presented.correct_answer),
        None => presented
            .hint
            .clone()
            .unwrap_or_else(|| "เลือกคำตอบที่ถูกต้อง".to_string()),
    };
    let feedback_class = match snapshot.correct {
        Some(true) => "feedback correct",
        Some(false) => "feedback wrong",
        None => "feedback",
    };

    let display = presented.display.clone().map(|display| match display {
        DisplayValue::Image(src) => view! {
            <figure class="display">
                <img class="display-image" src=src alt="รูปภาพ" />
            </figure>
        }
        .into_view(),
        other => view! {
            <figure class="display">
                <figcaption class="eyebrow">{display_caption(&other)}</figcaption>
                <p class="display-value">{other.text().to_string()}</p>
            </figure>
        }
        .into_view(),
    });

    let options = (!snapshot.choices_hidden || revealed).then(|| {
        presented
            .options
            .iter()
            .enumerate()
            .map(|(index, option)| {
                let mut class = String::from("option");
                if revealed && index == presented.correct_index {
                    class.push_str(" correct");
                } else if revealed && snapshot.chosen == Some(index) {
                    class.push_str(" wrong");
                }

                view! {
                    <button
                        class=class
                        type="button"
                        disabled=!matches!(snapshot.phase, Phase::Presenting)
                        on:click=move |_| controller.answer(|session| session.choose_option(index))
                    >
                        <span class="option-index">{(index + 1).to_string()}</span>
                        <span class="option-body">{option.text.clone()}</span>
                        {option
                            .subtitle
                            .clone()
                            .map(|subtitle| view! { <span class="option-subtitle">{subtitle}</span> })}
                    </button>
                }
            })
            .collect_view()
    });

    view! {
        <section class="quiz-card">
            <div class="prompt-area">
                <p class="prompt">{presented.prompt.clone()}</p>
                {presented.reading.clone().map(|reading| view! { <p class="prompt-reading">{reading}</p> })}
                {presented
                    .prompt_translation
                    .clone()
                    .map(|translation| view! { <p class="prompt-translation">{translation}</p> })}
                {presented
                    .answer_pattern
                    .clone()
                    .map(|pattern| view! { <p class="answer-pattern">{pattern}</p> })}
            </div>
            {display}
            <div class="options-grid">{options}</div>
            <p class=feedback_class>{feedback}</p>
            {snapshot.heard.clone().map(|heard| view! { <p class="heard">"🎤 " {heard}</p> })}
        </section>
    }
    .into_view()
}

#[component]
fn App() -> impl IntoView {
    let config = store_value(QuizConfig::default());
    let controller = Controller::new(config.with_value(|config| config.speech_rate));
    let (scene, set_scene) = create_signal(Scene::Menu);

    let open_deck = Callback::new(move |choice: DeckChoice| {
        set_scene.set(Scene::Loading);

        spawn_local(async move {
            let config = config.get_value();
            match load_deck(choice, &config).await {
                Ok(deck) => {
                    let session = Session::new(deck, config, StdRng::from_entropy());
                    log::info!("loaded a deck of {} questions", session.total());
                    controller.install(session);
                    set_scene.set(Scene::Game);
                }
                Err(error) => {
                    log::error!("{error}");
                    set_scene.set(Scene::Failed(error.to_string()));
                }
            }
        });
    });

    let return_to_menu = Callback::new(move |_| {
        controller.unload();
        set_scene.set(Scene::Menu);
    });

    let body = move || match scene.get() {
        Scene::Menu => view! {
            <section class="menu">
                <button class="btn btn-primary" type="button" on:click=move |_| open_deck.call(DeckChoice::Vocabulary)>
                    "คำศัพท์ (Vocabulary)"
                </button>
                <button class="btn btn-primary" type="button" on:click=move |_| open_deck.call(DeckChoice::Conversation)>
                    "บทสนทนา (Conversation)"
                </button>
                <button class="btn" type="button" on:click=move |_| open_deck.call(DeckChoice::Demo)>
                    "ตัวอย่าง (Demo)"
                </button>
            </section>
        }
        .into_view(),
        Scene::Loading => view! { <p class="status">"กำลังโหลด…"</p> }.into_view(),
        Scene::Failed(message) => view! {
            <section class="error-card">
                <p class="eyebrow">"เกิดข้อผิดพลาดในการโหลดคำศัพท์"</p>
                <p class="error-body">{message}</p>
                <button class="btn" type="button" on:click=move |_| return_to_menu.call(())>
                    "กลับ"
                </button>
            </section>
        }
        .into_view(),
        Scene::Game => view! { <Game controller=controller on_exit=return_to_menu /> }.into_view(),
    };

    view! {
        <div class="app">
            <header class="app-header">
                <div class="app-title">"ทบทวนภาษาญี่ปุ่น"</div>
            </header>
            {body}
        </div>
    }
}

#[component]
fn Game(controller: Controller, on_exit: Callback<()>) -> impl IntoView {
    let snapshot = create_memo(move |_| controller.snapshot());
    let listening = controller.listening;

    let status = move || {
        snapshot.get().map(|snapshot| {
            view! {
                <div class="status-bar">
                    <span class="counter">{format!("{}/{}", snapshot.position, snapshot.total)}</span>
                    <span class="score">{format!("คะแนน: {}", snapshot.score)}</span>
                    {(!snapshot.conversation).then(|| view! { <span class="mode">{snapshot.mode_label}</span> })}
                </div>
            }
        })
    };

    let card = move || match snapshot.get() {
        Some(snapshot) if snapshot.phase == Phase::Complete => {
            let summary = snapshot.summary.unwrap_or(Summary {
                score: snapshot.score,
                total: snapshot.total,
            });
            view! {
                <section class="result-card">
                    <p class="result-title">"จบแล้ว 🎉"</p>
                    <p class="result-subtitle">{format!("คะแนนรวม: {}/{}", summary.score, summary.total)}</p>
                </section>
            }
            .into_view()
        }
        Some(snapshot) => view! { <QuestionCard snapshot=snapshot controller=controller /> }.into_view(),
        None => ().into_view(),
    };

    let hide_label = move || {
        if snapshot.get().is_some_and(|snapshot| snapshot.choices_hidden) {
            "แสดงตัวเลือก"
        } else {
            "ซ่อนตัวเลือก"
        }
    };
    let is_conversation = move || snapshot.get().is_some_and(|snapshot| snapshot.conversation);

    view! {
        <main class="game">
            {status}
            {card}
            <div class="controls">
                <button class="btn btn-primary" type="button" on:click=move |_| controller.control(Session::next)>
                    "ถัดไป"
                </button>
                <button class="btn" type="button" on:click=move |_| controller.speak_current()>
                    "🔊 ฟัง"
                </button>
                <button class="btn" type="button" disabled=move || listening.get() on:click=move |_| controller.listen()>
                    {move || if listening.get() { "🎤 กำลังฟัง…" } else { "🎤 พูดคำตอบ" }}
                </button>
                <button class="btn" type="button" on:click=move |_| controller.restart(Session::shuffle_restart)>
                    "สุ่มใหม่"
                </button>
                <button class="btn" type="button" on:click=move |_| controller.restart(Session::reset_restart)>
                    "เริ่มใหม่"
                </button>
                <Show when=move || !is_conversation()>
                    <button class="btn" type="button" on:click=move |_| controller.restart(Session::toggle_mode)>
                        "สลับโหมด"
                    </button>
                </Show>
                <button class="btn" type="button" on:click=move |_| controller.toggle_choices()>
                    {hide_label}
                </button>
                <button class="btn" type="button" on:click=move |_| on_exit.call(())>
                    "เมนู"
                </button>
            </div>
        </main>
    }
}

/// Mounts the quiz into the page body.
pub fn mount() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
    mount_to_body(|| view! { <App /> });
}
