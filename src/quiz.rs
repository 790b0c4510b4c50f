//! Quiz session state machine and scoring.
//!
//! A `QuizSession` is a snapshot of the questions drawn at start plus the
//! running answer log. It is owned by exactly one client and persisted
//! between requests by the caller.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{QuizError, QuizMode, QuizResult};
use crate::models::{AnswerRecord, Mastery, Question, QuestionView};
use crate::store::{MasteryStore, QuestionStore};

/// Percentage at or above which a run counts as a pass.
pub const PASS_PERCENTAGE: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizState {
    NotStarted,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSession {
    mode: QuizMode,
    questions: Vec<Question>,
    current_index: usize,
    score: usize,
    answers: Vec<AnswerRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerFeedback {
    pub is_correct: bool,
    pub correct_answers: BTreeSet<char>,
    pub explanation: String,
    pub mastery: Mastery,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Next {
        question: QuestionView,
        current: usize,
        total: usize,
    },
    Completed,
}

impl Serialize for Advance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Advance::Completed => {
                let mut s = serializer.serialize_struct("Advance", 1)?;
                s.serialize_field("completed", &true)?;
                s.end()
            }
            Advance::Next {
                question,
                current,
                total,
            } => {
                let mut s = serializer.serialize_struct("Advance", 4)?;
                s.serialize_field("completed", &false)?;
                s.serialize_field("question", question)?;
                s.serialize_field("current", current)?;
                s.serialize_field("total", total)?;
                s.end()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainScore {
    pub name: String,
    pub correct: usize,
    pub attempted: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizResults {
    pub mode: String,
    pub score: usize,
    pub total: usize,
    pub answered: usize,
    pub percentage: f64,
    pub passed: bool,
    pub domains: Vec<DomainScore>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewEntry {
    pub number: usize,
    pub question: Question,
    pub answer: AnswerRecord,
}

impl QuizSession {
    /// Draws a fresh run. The returned session replaces whatever the client
    /// had before.
    ///
    /// Domain runs come back in random order, optionally capped at `limit`
    /// (zero means no cap). Missed runs surface the most-missed,
    /// least-mastered questions first; ties are random.
    pub fn start<S, R>(
        store: &S,
        mode: &QuizMode,
        limit: Option<usize>,
        rng: &mut R,
    ) -> QuizResult<Self>
    where
        S: QuestionStore + ?Sized,
        R: Rng + ?Sized,
    {
        let mut questions = match mode {
            QuizMode::Domain(domain) => {
                let mut questions = store.questions(domain.as_deref())?;
                questions.shuffle(rng);
                questions
            }
            QuizMode::Missed => {
                let mut missed = store.missed_questions()?;
                missed.shuffle(rng);
                // stable, so the shuffle decides ties
                missed.sort_by_key(|m| (Reverse(m.mastery.incorrect), m.mastery.correct));
                missed.into_iter().map(|m| m.question).collect()
            }
        };

        if let Some(limit) = limit.filter(|&n| n > 0) {
            questions.truncate(limit);
        }

        if questions.is_empty() {
            return Err(QuizError::NoQuestions { mode: mode.clone() });
        }

        tracing::info!(mode = %mode, questions = questions.len(), "quiz started");

        Ok(Self {
            mode: mode.clone(),
            questions,
            current_index: 0,
            score: 0,
            answers: Vec::new(),
        })
    }

    pub fn start_missed<S, R>(store: &S, rng: &mut R) -> QuizResult<Self>
    where
        S: QuestionStore + ?Sized,
        R: Rng + ?Sized,
    {
        Self::start(store, &QuizMode::Missed, None, rng)
    }

    /// Scores the current question by exact set match and folds the outcome
    /// into the shared mastery counters.
    pub fn submit<S>(&mut self, store: &S, selected: &BTreeSet<char>) -> QuizResult<AnswerFeedback>
    where
        S: MasteryStore + ?Sized,
    {
        let position = self.current_index;
        let question = self
            .questions
            .get(position)
            .ok_or(QuizError::QuizCompleted)?;

        if self.answers.iter().any(|a| a.position == position) {
            return Err(QuizError::AlreadyAnswered { position });
        }
        if selected.is_empty() {
            return Err(QuizError::EmptySelection);
        }

        let correct = question.correct_letters();
        let is_correct = *selected == correct;
        let question_id = question.id;
        let explanation = question.explanation_text().to_string();

        let record = store.record_outcome(question_id, is_correct)?;

        self.answers.push(AnswerRecord {
            position,
            question_id,
            selected: selected.clone(),
            correct: correct.clone(),
            is_correct,
        });
        if is_correct {
            self.score += 1;
        }

        tracing::debug!(
            question_id,
            is_correct,
            correct_count = record.correct_count,
            incorrect_count = record.incorrect_count,
            "answer recorded"
        );

        Ok(AnswerFeedback {
            is_correct,
            correct_answers: correct,
            explanation,
            mastery: record.mastery(),
        })
    }

    /// Moves to the next question. Skipping an unanswered question is allowed.
    pub fn advance(&mut self) -> QuizResult<Advance> {
        if self.current_index >= self.questions.len() {
            return Err(QuizError::QuizCompleted);
        }

        self.current_index += 1;

        Ok(match self.questions.get(self.current_index) {
            Some(question) => Advance::Next {
                question: question.view(),
                current: self.current_index + 1,
                total: self.questions.len(),
            },
            None => Advance::Completed,
        })
    }

    pub fn results(&self) -> QuizResults {
        let total = self.questions.len();
        let percentage = if total > 0 {
            self.score as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        let mut by_domain: BTreeMap<&str, (usize, usize)> = self
            .questions
            .iter()
            .map(|q| (q.domain.as_str(), (0, 0)))
            .collect();

        for answer in &self.answers {
            let Some(question) = self.questions.get(answer.position) else {
                continue;
            };
            let entry = by_domain.entry(question.domain.as_str()).or_default();
            entry.1 += 1;
            if answer.is_correct {
                entry.0 += 1;
            }
        }

        QuizResults {
            mode: self.mode.label().to_string(),
            score: self.score,
            total,
            answered: self.answers.len(),
            percentage,
            passed: percentage >= PASS_PERCENTAGE,
            domains: by_domain
                .into_iter()
                .map(|(name, (correct, attempted))| DomainScore {
                    name: name.to_string(),
                    correct,
                    attempted,
                })
                .collect(),
        }
    }

    pub fn review(&self) -> Vec<ReviewEntry> {
        self.answers
            .iter()
            .filter_map(|answer| {
                self.questions.get(answer.position).map(|q| ReviewEntry {
                    number: answer.position + 1,
                    question: q.clone(),
                    answer: answer.clone(),
                })
            })
            .collect()
    }

    pub fn state(&self) -> QuizState {
        if self.questions.is_empty() {
            QuizState::NotStarted
        } else if self.current_index < self.questions.len() {
            QuizState::InProgress
        } else {
            QuizState::Completed
        }
    }

    /// Whether a session read back from storage still obeys the invariants
    /// `submit` and `advance` maintain.
    pub fn is_consistent(&self) -> bool {
        if self.current_index > self.questions.len() {
            return false;
        }

        let mut positions = BTreeSet::new();
        for answer in &self.answers {
            let Some(question) = self.questions.get(answer.position) else {
                return false;
            };
            if answer.position > self.current_index
                || !positions.insert(answer.position)
                || answer.question_id != question.id
                || answer.is_correct != (answer.selected == answer.correct)
            {
                return false;
            }
        }

        self.score == self.answers.iter().filter(|a| a.is_correct).count()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    pub fn current_view(&self) -> Option<QuestionView> {
        self.current_question().map(Question::view)
    }

    pub fn current_answered(&self) -> bool {
        self.answers.iter().any(|a| a.position == self.current_index)
    }

    pub fn mode(&self) -> &QuizMode {
        &self.mode
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }
}
