//! Certification exam quiz trainer.
//!
//! Questions live in SQLite. A `QuizSession` draws a randomised run from
//! them, scores each answer by exact set match and folds the outcome into
//! per-question mastery counters shared by every client.

pub mod db;
pub mod error;
pub mod models;
pub mod quiz;
pub mod shuffle;
pub mod store;
pub mod tui;

pub use db::{Database, Stats};
pub use error::{QuizError, QuizMode, QuizResult};
pub use quiz::{Advance, AnswerFeedback, QuizResults, QuizSession, QuizState, ReviewEntry};
pub use store::{MasteryStore, QuestionStore};
