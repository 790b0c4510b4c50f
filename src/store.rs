//! Storage seams the quiz core talks to.
//!
//! `Database` implements both traits over SQLite. Retrieval is deterministic;
//! randomised ordering is the quiz core's job.

use rusqlite::Result;

use crate::models::{Mastery, MasteryRecord, MissedQuestion, Question};

pub trait QuestionStore {
    /// Questions in id order, optionally restricted to one domain.
    fn questions(&self, domain: Option<&str>) -> Result<Vec<Question>>;

    /// Attempted questions whose correct count is still below the mastery
    /// threshold, in id order.
    fn missed_questions(&self) -> Result<Vec<MissedQuestion>>;
}

pub trait MasteryStore {
    /// Upserts the mastery counters for one answer and logs it to history.
    ///
    /// Counters are shared by every client. Two writers racing on one
    /// question both land their increment (the update is relative), but
    /// `last_answered` is last-writer-wins.
    fn record_outcome(&self, question_id: i64, is_correct: bool) -> Result<MasteryRecord>;

    fn mastery_record(&self, question_id: i64) -> Result<Option<MasteryRecord>>;

    /// Counters for a question, zero when it has never been answered.
    fn mastery(&self, question_id: i64) -> Result<Mastery> {
        Ok(self
            .mastery_record(question_id)?
            .map(|r| r.mastery())
            .unwrap_or_default())
    }

    /// Drops all answer history and mastery counters.
    fn reset_all(&self) -> Result<()>;
}
