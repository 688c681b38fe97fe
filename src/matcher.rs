//! Loose comparison of transcribed speech against the expected answer.

use regex::Regex;
use std::sync::LazyLock;

/// Punctuation dropped before comparing.
const PUNCTUATION: [char; 8] = ['/', '・', '、', '。', '.', ',', '!', '?'];

/// Politeness particles and copulas removed wherever they appear, longest
/// first so compound forms go before their parts.
const POLITENESS_TOKENS: [&str; 7] = ["นะครับ", "ค่ะครับ", "ครับ", "ค่ะ", "นะ", "です", "だ"];

/// One alternation over [`POLITENESS_TOKENS`]; a single pass keeps text
/// joined by a removal from being matched again.
static POLITENESS: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = POLITENESS_TOKENS.map(regex::escape).join("|");
    Regex::new(&alternation).expect("politeness tokens form a valid pattern")
});

/// Separator between acceptable alternatives in an answer field.
pub const ANSWER_SEPARATOR: char = '/';

pub fn normalize(text: &str) -> String {
    let compact: String = text
        .to_lowercase()
        .chars()
        .filter(|ch| !ch.is_whitespace() && !PUNCTUATION.contains(ch))
        .collect();

    POLITENESS.replace_all(&compact, "").into_owned()
}

/// Splits an answer field such as `ครู / อาจารย์` into normalized alternatives.
pub fn acceptable_answers(field: &str) -> Vec<String> {
    field
        .split(ANSWER_SEPARATOR)
        .map(normalize)
        .filter(|answer| !answer.is_empty())
        .collect()
}

/// True when the normalized transcript contains any acceptable alternative.
///
/// Containment rather than equality lets the speaker wrap the answer in other
/// words, e.g. `เขาเป็นครูค่ะ` for `ครู`.
pub fn check_spoken_answer(transcript: &str, field: &str) -> bool {
    let spoken = normalize(transcript);
    if spoken.is_empty() {
        return false;
    }

    acceptable_answers(field)
        .iter()
        .any(|answer| spoken.contains(answer.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_case_space_and_punctuation() {
        assert_eq!(normalize("  Gozen Ku-ji!  "), "gozenku-ji");
        assert_eq!(normalize("せん・せい、。"), "せんせい");
        assert_eq!(normalize("a/b, c.d?"), "abcd");
    }

    #[test]
    fn strips_politeness_tokens_anywhere() {
        assert_eq!(normalize("ครูครับ"), normalize("ครู"));
        assert_eq!(normalize("ขอบคุณนะครับ"), "ขอบคุณ");
        assert_eq!(normalize("がくせいです"), "がくせい");
        assert_eq!(normalize("ありがとう ครับ"), "ありがとう");
    }

    #[test]
    fn removal_does_not_expose_new_tokens() {
        assert_eq!(normalize("นครับะ"), "นะ");
        assert_eq!(normalize("でだす"), "です");
    }

    #[test]
    fn splits_alternatives() {
        assert_eq!(
            acceptable_answers("ครู / อาจารย์"),
            vec!["ครู".to_string(), "อาจารย์".to_string()]
        );
        assert_eq!(acceptable_answers("せんせい//"), vec!["せんせい".to_string()]);
        assert!(acceptable_answers(" / ").is_empty());
    }

    #[test]
    fn spoken_answer_matches_by_containment() {
        assert!(check_spoken_answer("เขาเป็นครูค่ะ", "ครู/อาจารย์"));
        assert!(check_spoken_answer("อาจารย์", "ครู/อาจารย์"));
        assert!(check_spoken_answer("わたしは せんせいです", "せんせい"));
        assert!(!check_spoken_answer("หมอ", "ครู/อาจารย์"));
    }

    #[test]
    fn empty_inputs_never_match() {
        assert!(!check_spoken_answer("", "ครู"));
        assert!(!check_spoken_answer("ครับ", "ครู"));
        assert!(!check_spoken_answer("ครู", ""));
    }
}
