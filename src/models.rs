use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Correct answers needed before a question counts as mastered.
pub const MASTERY_THRESHOLD: i64 = 4;

/// Highest option count a question may carry (letters A through J).
pub const MAX_OPTIONS: usize = 10;

pub const OPTION_LETTERS: [char; MAX_OPTIONS] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J'];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub letter: char,
    pub text: String,
    pub is_correct: bool,
}

impl QuizOption {
    pub fn new(letter: char, text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            letter,
            text: text.into(),
            is_correct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub text: String,
    pub domain: String,
    pub explanation: Option<String>,
    pub options: Vec<QuizOption>,
}

impl Question {
    /// Letters of the options flagged correct, in canonical lettering.
    pub fn correct_letters(&self) -> BTreeSet<char> {
        self.options
            .iter()
            .filter(|o| o.is_correct)
            .map(|o| o.letter)
            .collect()
    }

    pub fn is_multi_select(&self) -> bool {
        self.options.iter().filter(|o| o.is_correct).count() > 1
    }

    pub fn explanation_text(&self) -> &str {
        self.explanation.as_deref().unwrap_or("")
    }

    pub fn view(&self) -> QuestionView {
        QuestionView {
            id: self.id,
            text: self.text.clone(),
            domain: self.domain.clone(),
            options: self
                .options
                .iter()
                .map(|o| OptionView {
                    letter: o.letter,
                    text: o.text.clone(),
                })
                .collect(),
        }
    }
}

// What the client gets to see before answering: no correctness flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionView {
    pub id: i64,
    pub text: String,
    pub domain: String,
    pub options: Vec<OptionView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionView {
    pub letter: char,
    pub text: String,
}

// Cumulative counters for one question, as reported back after an answer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mastery {
    pub correct: i64,
    pub incorrect: i64,
}

impl Mastery {
    pub fn status(&self) -> MasteryStatus {
        if self.correct >= MASTERY_THRESHOLD {
            MasteryStatus::Mastered
        } else if self.correct > 0 || self.incorrect > 0 {
            MasteryStatus::NeedsPractice
        } else {
            MasteryStatus::New
        }
    }

    pub fn is_mastered(&self) -> bool {
        self.status() == MasteryStatus::Mastered
    }

    pub fn needs_practice(&self) -> bool {
        self.status() == MasteryStatus::NeedsPractice
    }

    pub fn has_been_wrong(&self) -> bool {
        self.incorrect > 0 && self.correct < MASTERY_THRESHOLD
    }

    pub fn attempts(&self) -> i64 {
        self.correct + self.incorrect
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MasteryStatus {
    New,
    NeedsPractice,
    Mastered,
}

impl MasteryStatus {
    pub fn label(&self) -> &'static str {
        match self {
            MasteryStatus::New => "New",
            MasteryStatus::NeedsPractice => "Needs practice",
            MasteryStatus::Mastered => "Mastered",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasteryRecord {
    pub question_id: i64,
    pub correct_count: i64,
    pub incorrect_count: i64,
    pub last_answered: Option<String>,
}

impl MasteryRecord {
    pub fn mastery(&self) -> Mastery {
        Mastery {
            correct: self.correct_count,
            incorrect: self.incorrect_count,
        }
    }
}

// A question from the missed pool together with its current counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissedQuestion {
    pub question: Question,
    pub mastery: Mastery,
}

// One entry of a session's answer log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub position: usize,
    pub question_id: i64,
    pub selected: BTreeSet<char>,
    pub correct: BTreeSet<char>,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainCount {
    pub name: String,
    pub count: i64,
}

// JSON output wrapper for CLI
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// Shortens `s` to at most `max_len` characters, ending in "..." when cut.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

/// Parses user-entered answer letters ("a", "B,C", "bd") into a normalised set.
pub fn parse_letters<S: AsRef<str>>(inputs: &[S]) -> BTreeSet<char> {
    inputs
        .iter()
        .flat_map(|s| s.as_ref().chars().collect::<Vec<_>>())
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_question(correct: &[char]) -> Question {
        Question {
            id: 1,
            text: "Which services are serverless?".to_string(),
            domain: "Technology".to_string(),
            explanation: None,
            options: ['A', 'B', 'C', 'D']
                .iter()
                .map(|&l| QuizOption::new(l, format!("Option {}", l), correct.contains(&l)))
                .collect(),
        }
    }

    mod question_tests {
        use super::*;

        #[test]
        fn correct_letters_collects_flagged_options() {
            let q = make_question(&['B', 'D']);
            let letters: Vec<char> = q.correct_letters().into_iter().collect();
            assert_eq!(letters, vec!['B', 'D']);
        }

        #[test]
        fn multi_select_detection() {
            assert!(!make_question(&['A']).is_multi_select());
            assert!(make_question(&['A', 'C']).is_multi_select());
        }

        #[test]
        fn explanation_text_defaults_to_empty() {
            let q = make_question(&['A']);
            assert_eq!(q.explanation_text(), "");
        }

        #[test]
        fn view_hides_correctness() {
            let q = make_question(&['C']);
            let view = q.view();
            assert_eq!(view.options.len(), 4);
            let json = serde_json::to_string(&view).unwrap();
            assert!(!json.contains("is_correct"));
        }
    }

    mod mastery_tests {
        use super::*;

        fn m(correct: i64, incorrect: i64) -> Mastery {
            Mastery { correct, incorrect }
        }

        #[test]
        fn untouched_is_new() {
            assert_eq!(m(0, 0).status(), MasteryStatus::New);
            assert!(!m(0, 0).needs_practice());
            assert!(!m(0, 0).has_been_wrong());
        }

        #[test]
        fn below_threshold_needs_practice() {
            assert_eq!(m(3, 0).status(), MasteryStatus::NeedsPractice);
            assert_eq!(m(0, 2).status(), MasteryStatus::NeedsPractice);
        }

        #[test]
        fn threshold_is_mastered() {
            assert!(m(4, 0).is_mastered());
            assert!(m(9, 9).is_mastered());
        }

        #[test]
        fn wrong_answers_after_mastery_do_not_unmaster() {
            let mastered = m(4, 7);
            assert!(mastered.is_mastered());
            assert!(!mastered.has_been_wrong());
        }

        #[test]
        fn has_been_wrong_requires_incorrect_and_unmastered() {
            assert!(m(1, 1).has_been_wrong());
            assert!(!m(3, 0).has_been_wrong());
        }

        #[test]
        fn mastered_and_needs_practice_are_disjoint() {
            for correct in 0..8 {
                for incorrect in 0..4 {
                    let x = m(correct, incorrect);
                    assert!(!(x.is_mastered() && x.needs_practice()));
                }
            }
        }

        #[test]
        fn record_converts_to_counters() {
            let record = MasteryRecord {
                question_id: 7,
                correct_count: 2,
                incorrect_count: 5,
                last_answered: None,
            };
            assert_eq!(record.mastery(), m(2, 5));
            assert_eq!(record.mastery().attempts(), 7);
        }

        #[test]
        fn serializes_with_short_field_names() {
            let json = serde_json::to_string(&m(1, 2)).unwrap();
            assert_eq!(json, r#"{"correct":1,"incorrect":2}"#);
        }
    }

    mod truncate_tests {
        use super::*;

        #[test]
        fn truncate_short_string() {
            assert_eq!(truncate("hello", 10), "hello");
        }

        #[test]
        fn truncate_exact_length() {
            assert_eq!(truncate("hello", 5), "hello");
        }

        #[test]
        fn truncate_long_string() {
            assert_eq!(truncate("hello world", 8), "hello...");
        }

        #[test]
        fn truncate_counts_chars_not_bytes() {
            assert_eq!(truncate("Réseau", 10), "Réseau");
            assert_eq!(truncate("Sécurité et conformité", 8), "Sécur...");
        }
    }

    mod parse_letters_tests {
        use super::*;

        #[test]
        fn separate_arguments() {
            let set = parse_letters(&["a", "C"]);
            assert_eq!(set.into_iter().collect::<Vec<_>>(), vec!['A', 'C']);
        }

        #[test]
        fn packed_and_comma_separated() {
            let set = parse_letters(&["b,d", "BD"]);
            assert_eq!(set.into_iter().collect::<Vec<_>>(), vec!['B', 'D']);
        }

        #[test]
        fn empty_input() {
            let empty: [&str; 0] = [];
            assert!(parse_letters(&empty).is_empty());
        }
    }

    mod json_output_tests {
        use super::*;

        #[test]
        fn ok_with_unit() {
            let output = JsonOutput::<()>::ok(());
            assert!(output.success);
            assert_eq!(output.data, Some(()));
            assert!(output.error.is_none());
        }

        #[test]
        fn err_with_string() {
            let output = JsonOutput::<()>::err("something went wrong");
            assert!(!output.success);
            assert!(output.data.is_none());
            assert_eq!(output.error, Some("something went wrong".to_string()));
        }

        #[test]
        fn serializes_ok_correctly() {
            let output = JsonOutput::ok("test");
            let json = serde_json::to_string(&output).unwrap();
            assert!(json.contains("\"success\":true"));
            assert!(json.contains("\"data\":\"test\""));
            assert!(json.contains("\"error\":null"));
        }
    }
}
