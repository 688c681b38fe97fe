use std::fmt;
use std::fs;
use std::path::Path;

use crate::quiz::QuizMode;

/// Fewest entries a vocabulary deck can have and still fill four options.
pub const MIN_VOCAB_ENTRIES: usize = 4;

/// A Japanese word or phrase paired with its Thai translation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VocabEntry {
    pub jp: String,
    pub th: String,
    /// Kana reading when `jp` is written with kanji.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kana: Option<String>,
}

impl VocabEntry {
    pub fn new(jp: impl Into<String>, th: impl Into<String>) -> Self {
        Self {
            jp: jp.into(),
            th: th.into(),
            kana: None,
        }
    }

    pub fn with_kana(mut self, kana: impl Into<String>) -> Self {
        self.kana = Some(kana.into());
        self
    }

    /// Text to read aloud for the Japanese side: the kana when present.
    pub fn reading(&self) -> &str {
        self.kana.as_deref().unwrap_or(&self.jp)
    }

    pub fn prompt(&self, mode: QuizMode) -> &str {
        match mode {
            QuizMode::JapaneseToThai => &self.jp,
            QuizMode::ThaiToJapanese => &self.th,
        }
    }

    pub fn answer(&self, mode: QuizMode) -> &str {
        match mode {
            QuizMode::JapaneseToThai => &self.th,
            QuizMode::ThaiToJapanese => &self.jp,
        }
    }
}

impl fmt::Display for VocabEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kana {
            Some(kana) => write!(f, "{} ({}): {}", self.jp, kana, self.th),
            None => write!(f, "{}: {}", self.jp, self.th),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("failed to read data file at {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse data file at {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("requires at least {required} vocabulary entries but only {available} are valid")]
    InsufficientEntries { required: usize, available: usize },
    #[error("quiz file contains no questions")]
    NoQuestions,
    #[error("failed to fetch {path}: {message}")]
    Fetch { path: String, message: String },
}

impl PartialEq for DataLoadError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Read { path: left, .. }, Self::Read { path: right, .. }) => left == right,
            (Self::Parse { path: left, .. }, Self::Parse { path: right, .. }) => left == right,
            (
                Self::InsufficientEntries {
                    required: left_required,
                    available: left_available,
                },
                Self::InsufficientEntries {
                    required: right_required,
                    available: right_available,
                },
            ) => left_required == right_required && left_available == right_available,
            (Self::NoQuestions, Self::NoQuestions) => true,
            (Self::Fetch { path: left, .. }, Self::Fetch { path: right, .. }) => left == right,
            _ => false,
        }
    }
}

impl Eq for DataLoadError {}

pub(crate) fn read_data_file(path: &Path) -> Result<String, DataLoadError> {
    fs::read_to_string(path).map_err(|source| DataLoadError::Read {
        path: path.display().to_string(),
        source,
    })
}

/// Loose shape of an entry before validation.
#[derive(serde::Deserialize)]
struct RawEntry {
    #[serde(default)]
    jp: Option<String>,
    #[serde(default)]
    th: Option<String>,
    /// Any JSON value; only a string is kept as the reading.
    #[serde(default)]
    kana: serde_json::Value,
}

impl RawEntry {
    fn into_entry(self) -> Option<VocabEntry> {
        let jp = self.jp?.trim().to_string();
        let th = self.th?.trim().to_string();

        if jp.is_empty() || th.is_empty() {
            return None;
        }

        let kana = self
            .kana
            .as_str()
            .map(|kana| kana.trim().to_string())
            .filter(|kana| !kana.is_empty());

        Some(VocabEntry { jp, th, kana })
    }
}

/// A validated vocabulary deck in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabList {
    entries: Vec<VocabEntry>,
}

impl VocabList {
    /// Validates `entries`, dropping any without both sides.
    pub fn new(entries: Vec<VocabEntry>, min_entries: usize) -> Result<Self, DataLoadError> {
        let raw = entries.into_iter().map(|entry| RawEntry {
            jp: Some(entry.jp),
            th: Some(entry.th),
            kana: entry.kana.map(serde_json::Value::String).unwrap_or_default(),
        });
        Self::from_raw(raw, min_entries)
    }

    /// Parses a JSON array of `{ jp, th, kana? }` objects.
    ///
    /// Elements that are not objects, or whose `jp`/`th` are missing, not
    /// strings, or blank after trimming, are skipped.
    ///
    /// # Errors
    /// * [`DataLoadError::Parse`] if `json` is not an array.
    /// * [`DataLoadError::InsufficientEntries`] if fewer than `min_entries` survive.
    pub fn from_json(json: &str, min_entries: usize) -> Result<Self, DataLoadError> {
        Self::parse(json, "<inline>", min_entries)
    }

    pub fn from_path(path: impl AsRef<Path>, min_entries: usize) -> Result<Self, DataLoadError> {
        let path = path.as_ref();
        let data = read_data_file(path)?;
        Self::parse(&data, &path.display().to_string(), min_entries)
    }

    pub(crate) fn parse(json: &str, origin: &str, min_entries: usize) -> Result<Self, DataLoadError> {
        let values: Vec<serde_json::Value> =
            serde_json::from_str(json).map_err(|source| DataLoadError::Parse {
                path: origin.to_string(),
                source,
            })?;

        let total = values.len();
        let raw = values
            .into_iter()
            .filter_map(|value| serde_json::from_value::<RawEntry>(value).ok());

        let list = Self::from_raw(raw, min_entries)?;
        if list.len() < total {
            log::warn!(
                "dropped {} invalid vocabulary entries from {}",
                total - list.len(),
                origin
            );
        }

        Ok(list)
    }

    fn from_raw(
        raw: impl Iterator<Item = RawEntry>,
        min_entries: usize,
    ) -> Result<Self, DataLoadError> {
        let entries: Vec<VocabEntry> = raw.filter_map(RawEntry::into_entry).collect();

        if entries.len() < min_entries {
            return Err(DataLoadError::InsufficientEntries {
                required: min_entries,
                available: entries.len(),
            });
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[VocabEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_and_answer_follow_mode() {
        let entry = VocabEntry::new("先生", "ครู").with_kana("せんせい");

        assert_eq!(entry.prompt(QuizMode::JapaneseToThai), "先生");
        assert_eq!(entry.answer(QuizMode::JapaneseToThai), "ครู");
        assert_eq!(entry.prompt(QuizMode::ThaiToJapanese), "ครู");
        assert_eq!(entry.answer(QuizMode::ThaiToJapanese), "先生");
        assert_eq!(entry.reading(), "せんせい");
        assert_eq!(VocabEntry::new("いしゃ", "หมอ").reading(), "いしゃ");
    }

    #[test]
    fn display_includes_kana_when_present() {
        let entry = VocabEntry::new("先生", "ครู").with_kana("せんせい");
        assert_eq!(entry.to_string(), "先生 (せんせい): ครู");
        assert_eq!(VocabEntry::new("いしゃ", "หมอ").to_string(), "いしゃ: หมอ");
    }

    #[test]
    fn filters_and_trims_entries() {
        let json = r#"[
            { "jp": " せんせい ", "th": "ครู" },
            { "jp": "がくせい", "th": "นักเรียน", "kana": "" },
            { "jp": "", "th": "ว่าง" },
            { "jp": "いしゃ" },
            { "jp": 12, "th": "ตัวเลข" },
            "not an object",
            { "jp": "会社員", "th": "พนักงานบริษัท", "kana": "かいしゃいん" },
            { "jp": "ぎんこういん", "th": "พนักงานธนาคาร" }
        ]"#;

        let list = VocabList::from_json(json, MIN_VOCAB_ENTRIES).expect("four valid entries");

        assert_eq!(list.len(), 4);
        assert_eq!(list.entries()[0].jp, "せんせい");
        assert!(list.entries()[1].kana.is_none());
        assert_eq!(list.entries()[2].kana.as_deref(), Some("かいしゃいん"));
    }

    #[test]
    fn malformed_kana_keeps_the_entry() {
        let json = r#"[
            { "jp": "先生", "th": "ครู", "kana": 5 },
            { "jp": "学生", "th": "นักเรียน", "kana": ["がく", "せい"] },
            { "jp": "医者", "th": "หมอ", "kana": null },
            { "jp": "会社員", "th": "พนักงานบริษัท", "kana": "かいしゃいん" }
        ]"#;

        let list = VocabList::from_json(json, MIN_VOCAB_ENTRIES).expect("all four entries are valid");

        assert_eq!(list.len(), 4);
        assert!(list.entries()[0].kana.is_none());
        assert_eq!(list.entries()[0].reading(), "先生");
        assert!(list.entries()[1].kana.is_none());
        assert!(list.entries()[2].kana.is_none());
        assert_eq!(list.entries()[3].reading(), "かいしゃいん");
    }

    #[test]
    fn three_valid_entries_are_not_enough() {
        let json = r#"[
            { "jp": "せんせい", "th": "ครู" },
            { "jp": "がくせい", "th": "นักเรียน" },
            { "jp": "いしゃ", "th": "หมอ" },
            { "jp": "   ", "th": "ว่าง" }
        ]"#;

        let error = VocabList::from_json(json, MIN_VOCAB_ENTRIES).expect_err("threshold is four");

        assert_eq!(
            error,
            DataLoadError::InsufficientEntries {
                required: 4,
                available: 3
            }
        );
    }

    #[test]
    fn rejects_non_array_documents() {
        let error = VocabList::from_json(r#"{ "jp": "せんせい" }"#, MIN_VOCAB_ENTRIES)
            .expect_err("object is not a list");

        assert_eq!(
            error,
            DataLoadError::Parse {
                path: "<inline>".to_string(),
                source: serde_json::from_str::<()>("x").unwrap_err(),
            }
        );
    }

    #[test]
    fn new_validates_in_memory_entries() {
        let error = VocabList::new(
            vec![VocabEntry::new("せんせい", "ครู"), VocabEntry::new(" ", "ว่าง")],
            2,
        )
        .expect_err("blank entry is dropped");

        assert_eq!(
            error,
            DataLoadError::InsufficientEntries {
                required: 2,
                available: 1
            }
        );
    }
}
