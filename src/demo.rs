use crate::template::{QuizTemplate, TemplateKind, TemplateSet};
use crate::vocab::{DataLoadError, MIN_VOCAB_ENTRIES, VocabEntry, VocabList};

fn demo_entries() -> Vec<VocabEntry> {
    vec![
        VocabEntry::new("先生", "ครู / อาจารย์").with_kana("せんせい"),
        VocabEntry::new("学生", "นักเรียน / นักศึกษา").with_kana("がくせい"),
        VocabEntry::new("医者", "หมอ").with_kana("いしゃ"),
        VocabEntry::new("会社員", "พนักงานบริษัท").with_kana("かいしゃいん"),
        VocabEntry::new("銀行員", "พนักงานธนาคาร").with_kana("ぎんこういん"),
        VocabEntry::new("ありがとう", "ขอบคุณ"),
    ]
}

/// A small built-in deck for trying the quiz without data files.
pub fn demo_vocab() -> Result<VocabList, DataLoadError> {
    VocabList::new(demo_entries(), MIN_VOCAB_ENTRIES)
}

pub fn demo_templates() -> Result<TemplateSet, DataLoadError> {
    let mut greeting = QuizTemplate::new(TemplateKind::Plain, "はじめまして。");
    greeting.question_th = Some("ยินดีที่ได้รู้จัก".to_string());
    greeting.choices = Some(vec![
        "どうぞよろしく。".to_string(),
        "いただきます。".to_string(),
        "おやすみなさい。".to_string(),
        "いってきます。".to_string(),
    ]);
    greeting.choices_th = Some(vec![
        "ฝากเนื้อฝากตัวด้วย".to_string(),
        "ทานละนะ".to_string(),
        "ราตรีสวัสดิ์".to_string(),
        "ไปก่อนนะ".to_string(),
    ]);
    greeting.correct_answer = Some("どうぞよろしく。".to_string());

    let mut time = QuizTemplate::new(TemplateKind::Time, "いま なんじですか。");
    time.question_th = Some("ตอนนี้กี่โมง".to_string());
    time.answer_pattern = Some("gozen/gogo ~ji ~fun desu".to_string());

    let mut hours = QuizTemplate::new(TemplateKind::TimeRange, "ひるやすみは なんじから なんじまでですか。");
    hours.question_th = Some("พักกลางวันกี่โมงถึงกี่โมง".to_string());
    hours.answer_pattern = Some("~ kara ~ made desu".to_string());

    let mut phone = QuizTemplate::new(TemplateKind::Phone, "でんわばんごうは なんばんですか。");
    phone.question_th = Some("เบอร์โทรศัพท์เบอร์อะไร".to_string());

    let mut price = QuizTemplate::new(TemplateKind::Price, "これは いくらですか。");
    price.question_th = Some("อันนี้ราคาเท่าไร".to_string());
    price.hint = Some("en = เยน".to_string());
    price.price_range = Some((100, 9_000));

    TemplateSet::new(vec![greeting, time, hours, phone, price])
}
