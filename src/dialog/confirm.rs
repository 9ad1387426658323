//! Yes/no recognition for the confirmation step

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use std::sync::OnceLock;

const YES_WORDS: &[&str] = &[
    "yes", "y", "yeah", "yep", "yup", "sure", "ok", "okay", "correct", "confirm", "absolutely",
    "of course", "oui",
];

const NO_WORDS: &[&str] = &["no", "n", "nope", "nah", "not", "never", "wrong", "non"];

fn automaton() -> &'static AhoCorasick {
    static AC: OnceLock<AhoCorasick> = OnceLock::new();
    AC.get_or_init(|| {
        AhoCorasickBuilder::new()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::LeftmostLongest)
            .build(YES_WORDS.iter().chain(NO_WORDS))
            .expect("Failed to build confirmation automaton")
    })
}

fn is_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}

/// Classify a confirmation answer
///
/// `Some(true)` for yes, `Some(false)` for no, `None` when the answer is
/// neither. The numbered choices `1` and `2` are accepted too. The first
/// whole-word match wins.
pub fn recognize_confirmation(answer: &str) -> Option<bool> {
    let answer = answer.trim();
    match answer {
        "1" | "(1)" => return Some(true),
        "2" | "(2)" => return Some(false),
        _ => {}
    }

    automaton()
        .find_iter(answer)
        .find(|m| is_word_boundary(answer, m.start(), m.end()))
        .map(|m| m.pattern().as_usize() < YES_WORDS.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yes_answers() {
        for answer in ["yes", "Yes", "YES!", "y", "yeah sure", "ok", "1", "of course"] {
            assert_eq!(recognize_confirmation(answer), Some(true), "{}", answer);
        }
    }

    #[test]
    fn test_no_answers() {
        for answer in ["no", "No.", "nope", "n", "2", "no thanks", "not really"] {
            assert_eq!(recognize_confirmation(answer), Some(false), "{}", answer);
        }
    }

    #[test]
    fn test_unrecognized_answers() {
        for answer in ["", "maybe", "Paris", "nothing", "yesterday", "3"] {
            assert_eq!(recognize_confirmation(answer), None, "{}", answer);
        }
    }

    #[test]
    fn test_first_whole_word_wins() {
        assert_eq!(recognize_confirmation("no, yes"), Some(false));
        assert_eq!(recognize_confirmation("yes not no"), Some(true));
    }
}
