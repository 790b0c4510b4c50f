use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where a quiz draws its questions from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuizMode {
    /// Every question, or only those tagged with the given domain.
    Domain(Option<String>),
    /// Attempted questions that are not mastered yet.
    Missed,
}

impl QuizMode {
    /// Treats an absent, empty or "all" domain as no filter.
    pub fn from_domain(domain: Option<&str>) -> Self {
        QuizMode::Domain(domain_filter(domain).map(str::to_string))
    }

    pub fn label(&self) -> &str {
        match self {
            QuizMode::Domain(None) => "all",
            QuizMode::Domain(Some(d)) => d,
            QuizMode::Missed => "Missed Questions",
        }
    }
}

/// Normalises a requested domain: `None`, blank and "all" (any case) mean
/// every domain.
pub fn domain_filter(domain: Option<&str>) -> Option<&str> {
    match domain.map(str::trim) {
        None | Some("") => None,
        Some(d) if d.eq_ignore_ascii_case("all") => None,
        Some(d) => Some(d),
    }
}

impl Default for QuizMode {
    fn default() -> Self {
        QuizMode::Domain(None)
    }
}

impl fmt::Display for QuizMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub type QuizResult<T> = Result<T, QuizError>;

#[derive(Debug, Error)]
pub enum QuizError {
    #[error("No questions available for {mode}")]
    NoQuestions { mode: QuizMode },

    #[error("Quiz completed")]
    QuizCompleted,

    #[error("Question {} has already been answered", .position + 1)]
    AlreadyAnswered { position: usize },

    #[error("Select at least one option")]
    EmptySelection,

    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl QuizError {
    /// Outcomes a surface should show as a message rather than a failure.
    pub fn is_benign(&self) -> bool {
        !matches!(self, QuizError::Database(_) | QuizError::InvalidQuestion(_))
    }

    pub fn user_message(&self) -> String {
        match self {
            QuizError::NoQuestions {
                mode: QuizMode::Missed,
            } => "No missed questions to practice! Great job!".to_string(),
            QuizError::NoQuestions { .. } => "No questions available".to_string(),
            other => other.to_string(),
        }
    }
}
