use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result};
use serde::Serialize;
use std::path::Path;

use crate::error::{domain_filter, QuizError, QuizResult};
use crate::models::{
    DomainCount, Mastery, MasteryRecord, MissedQuestion, Question, QuizOption, MASTERY_THRESHOLD,
    MAX_OPTIONS, OPTION_LETTERS,
};
use crate::quiz::QuizSession;
use crate::store::{MasteryStore, QuestionStore};

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS questions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                question_text TEXT NOT NULL,
                domain TEXT NOT NULL,
                explanation TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS options (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                question_id INTEGER NOT NULL,
                option_letter TEXT NOT NULL,
                option_text TEXT NOT NULL,
                is_correct INTEGER NOT NULL DEFAULT 0,
                UNIQUE (question_id, option_letter),
                FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS question_mastery (
                question_id INTEGER PRIMARY KEY,
                correct_count INTEGER NOT NULL DEFAULT 0,
                incorrect_count INTEGER NOT NULL DEFAULT 0,
                last_answered TEXT,
                FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS answer_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                question_id INTEGER NOT NULL,
                answered_correctly INTEGER NOT NULL,
                answered_at TEXT NOT NULL DEFAULT (datetime('now')),
                FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE
            );

            -- One in-flight quiz per client
            CREATE TABLE IF NOT EXISTS quiz_sessions (
                client_id TEXT PRIMARY KEY,
                state TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_questions_domain ON questions(domain);
            CREATE INDEX IF NOT EXISTS idx_options_question ON options(question_id);
            CREATE INDEX IF NOT EXISTS idx_mastery_correct ON question_mastery(correct_count);
            CREATE INDEX IF NOT EXISTS idx_history_question ON answer_history(question_id);
            "#,
        )?;

        Ok(())
    }

    // Question operations

    /// Inserts a question with its options. Rejects option sets the quiz
    /// cannot score: none or more than ten options, no correct option, or
    /// letters outside `A`..`J` or repeated.
    pub fn add_question(
        &self,
        text: &str,
        domain: &str,
        explanation: Option<&str>,
        options: &[QuizOption],
    ) -> QuizResult<i64> {
        validate_options(options)?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO questions (question_text, domain, explanation) VALUES (?1, ?2, ?3)",
            params![text, domain, explanation],
        )?;
        let question_id = tx.last_insert_rowid();

        for opt in options {
            tx.execute(
                r#"
                INSERT INTO options (question_id, option_letter, option_text, is_correct)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![question_id, opt.letter.to_string(), opt.text, opt.is_correct],
            )?;
        }

        tx.commit()?;
        Ok(question_id)
    }

    pub fn get_question(&self, id: i64) -> Result<Option<Question>> {
        let question = self
            .conn
            .query_row(
                "SELECT id, question_text, domain, explanation FROM questions WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Question {
                        id: row.get(0)?,
                        text: row.get(1)?,
                        domain: row.get(2)?,
                        explanation: row.get(3)?,
                        options: vec![],
                    })
                },
            )
            .optional()?;

        match question {
            Some(mut q) => {
                q.options = self.question_options(q.id)?;
                Ok(Some(q))
            }
            None => Ok(None),
        }
    }

    fn question_options(&self, question_id: i64) -> Result<Vec<QuizOption>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT option_letter, option_text, is_correct
            FROM options
            WHERE question_id = ?1
            ORDER BY option_letter
            "#,
        )?;

        let rows = stmt.query_map(params![question_id], |row| {
            let letter: String = row.get(0)?;
            Ok(QuizOption {
                letter: letter.chars().next().unwrap_or('?'),
                text: row.get(1)?,
                is_correct: row.get(2)?,
            })
        })?;

        rows.collect()
    }

    pub fn count_questions(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM questions", [], |row| row.get(0))
    }

    pub fn domain_counts(&self) -> Result<Vec<DomainCount>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT domain, COUNT(*) as count
            FROM questions
            GROUP BY domain
            ORDER BY count DESC, domain ASC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(DomainCount {
                name: row.get(0)?,
                count: row.get(1)?,
            })
        })?;

        rows.collect()
    }

    // Session operations
    pub fn load_session(&self, client_id: &str) -> Result<QuizSession> {
        let state: Option<String> = self
            .conn
            .query_row(
                "SELECT state FROM quiz_sessions WHERE client_id = ?1",
                params![client_id],
                |row| row.get(0),
            )
            .optional()?;

        let Some(state) = state else {
            return Ok(QuizSession::default());
        };

        match serde_json::from_str::<QuizSession>(&state) {
            Ok(session) if session.is_consistent() => Ok(session),
            Ok(_) => {
                tracing::warn!(client = client_id, "discarding inconsistent quiz session");
                Ok(QuizSession::default())
            }
            Err(e) => {
                tracing::warn!(client = client_id, error = %e, "discarding unreadable quiz session");
                Ok(QuizSession::default())
            }
        }
    }

    pub fn save_session(&self, client_id: &str, session: &QuizSession) -> Result<()> {
        let state = serde_json::to_string(session)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        self.conn.execute(
            r#"
            INSERT INTO quiz_sessions (client_id, state, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(client_id) DO UPDATE SET
                state = excluded.state,
                updated_at = excluded.updated_at
            "#,
            params![client_id, state, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn clear_session(&self, client_id: &str) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM quiz_sessions WHERE client_id = ?1",
            params![client_id],
        )?;
        Ok(rows > 0)
    }

    // Statistics
    pub fn get_stats(&self) -> Result<Stats> {
        let total = self.count_questions()?;
        let domains = self.domain_counts()?;

        let needs_practice: i64 = self.conn.query_row(
            r#"
            SELECT COUNT(*) FROM question_mastery
            WHERE correct_count < ?1 AND (correct_count > 0 OR incorrect_count > 0)
            "#,
            params![MASTERY_THRESHOLD],
            |row| row.get(0),
        )?;

        let mastered_count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM question_mastery WHERE correct_count >= ?1",
            params![MASTERY_THRESHOLD],
            |row| row.get(0),
        )?;

        let wrong_count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM question_mastery WHERE incorrect_count > 0 AND correct_count < ?1",
            params![MASTERY_THRESHOLD],
            |row| row.get(0),
        )?;

        let total_answers: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM answer_history", [], |row| row.get(0))?;

        Ok(Stats {
            total,
            domains,
            needs_practice,
            mastered_count,
            wrong_count,
            total_answers,
        })
    }
}

fn validate_options(options: &[QuizOption]) -> QuizResult<()> {
    let invalid = |msg: String| Err(QuizError::InvalidQuestion(msg));

    if options.is_empty() || options.len() > MAX_OPTIONS {
        return invalid(format!(
            "a question needs between 1 and {} options, got {}",
            MAX_OPTIONS,
            options.len()
        ));
    }
    if !options.iter().any(|o| o.is_correct) {
        return invalid("at least one option must be correct".to_string());
    }

    let mut seen = Vec::with_capacity(options.len());
    for opt in options {
        if !OPTION_LETTERS.contains(&opt.letter) {
            return invalid(format!("option letter '{}' is outside A-J", opt.letter));
        }
        if seen.contains(&opt.letter) {
            return invalid(format!("option letter '{}' is used twice", opt.letter));
        }
        seen.push(opt.letter);
    }

    Ok(())
}

impl QuestionStore for Database {
    fn questions(&self, domain: Option<&str>) -> Result<Vec<Question>> {
        let map_row = |row: &rusqlite::Row<'_>| -> Result<Question> {
            Ok(Question {
                id: row.get(0)?,
                text: row.get(1)?,
                domain: row.get(2)?,
                explanation: row.get(3)?,
                options: vec![],
            })
        };

        let mut questions: Vec<Question> = if let Some(domain) = domain_filter(domain) {
            let mut stmt = self.conn.prepare(
                r#"
                SELECT id, question_text, domain, explanation
                FROM questions
                WHERE domain = ?1
                ORDER BY id
                "#,
            )?;
            let rows = stmt.query_map(params![domain], map_row)?;
            rows.collect::<Result<Vec<_>>>()?
        } else {
            let mut stmt = self.conn.prepare(
                "SELECT id, question_text, domain, explanation FROM questions ORDER BY id",
            )?;
            let rows = stmt.query_map([], map_row)?;
            rows.collect::<Result<Vec<_>>>()?
        };

        for question in &mut questions {
            question.options = self.question_options(question.id)?;
        }

        Ok(questions)
    }

    fn missed_questions(&self) -> Result<Vec<MissedQuestion>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT q.id, q.question_text, q.domain, q.explanation,
                   m.correct_count, m.incorrect_count
            FROM questions q
            JOIN question_mastery m ON q.id = m.question_id
            WHERE m.correct_count < ?1
            ORDER BY q.id
            "#,
        )?;

        let rows = stmt.query_map(params![MASTERY_THRESHOLD], |row| {
            Ok(MissedQuestion {
                question: Question {
                    id: row.get(0)?,
                    text: row.get(1)?,
                    domain: row.get(2)?,
                    explanation: row.get(3)?,
                    options: vec![],
                },
                mastery: Mastery {
                    correct: row.get(4)?,
                    incorrect: row.get(5)?,
                },
            })
        })?;
        let mut missed = rows.collect::<Result<Vec<_>>>()?;

        for entry in &mut missed {
            entry.question.options = self.question_options(entry.question.id)?;
        }

        Ok(missed)
    }
}

impl MasteryStore for Database {
    fn record_outcome(&self, question_id: i64, is_correct: bool) -> Result<MasteryRecord> {
        let now = Utc::now().to_rfc3339();
        let (correct, incorrect) = if is_correct { (1, 0) } else { (0, 1) };

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO answer_history (question_id, answered_correctly, answered_at) VALUES (?1, ?2, ?3)",
            params![question_id, is_correct, now],
        )?;
        tx.execute(
            r#"
            INSERT INTO question_mastery (question_id, correct_count, incorrect_count, last_answered)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(question_id) DO UPDATE SET
                correct_count = correct_count + excluded.correct_count,
                incorrect_count = incorrect_count + excluded.incorrect_count,
                last_answered = excluded.last_answered
            "#,
            params![question_id, correct, incorrect, now],
        )?;
        tx.commit()?;

        self.mastery_record(question_id)?
            .ok_or(rusqlite::Error::QueryReturnedNoRows)
    }

    fn mastery_record(&self, question_id: i64) -> Result<Option<MasteryRecord>> {
        self.conn
            .query_row(
                r#"
                SELECT question_id, correct_count, incorrect_count, last_answered
                FROM question_mastery
                WHERE question_id = ?1
                "#,
                params![question_id],
                |row| {
                    Ok(MasteryRecord {
                        question_id: row.get(0)?,
                        correct_count: row.get(1)?,
                        incorrect_count: row.get(2)?,
                        last_answered: row.get(3)?,
                    })
                },
            )
            .optional()
    }

    fn reset_all(&self) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM answer_history", [])?;
        tx.execute("DELETE FROM question_mastery", [])?;
        tx.commit()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub total: i64,
    pub domains: Vec<DomainCount>,
    pub needs_practice: i64,
    pub mastered_count: i64,
    pub wrong_count: i64,
    pub total_answers: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QuizMode;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn setup_db() -> Database {
        let db = Database::open(":memory:").expect("Failed to create in-memory database");
        db.init().expect("Failed to initialize database");
        db
    }

    fn opts(correct: &[char]) -> Vec<QuizOption> {
        ['A', 'B', 'C', 'D']
            .iter()
            .map(|&l| QuizOption::new(l, format!("Answer {}", l), correct.contains(&l)))
            .collect()
    }

    fn add(db: &Database, text: &str, domain: &str) -> i64 {
        db.add_question(text, domain, Some("Because."), &opts(&['A']))
            .unwrap()
    }

    mod init_tests {
        use super::*;

        #[test]
        fn init_creates_tables() {
            let db = setup_db();
            for table in [
                "questions",
                "options",
                "question_mastery",
                "answer_history",
                "quiz_sessions",
            ] {
                let count: i64 = db
                    .conn
                    .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                        row.get(0)
                    })
                    .unwrap_or_else(|_| panic!("{} table should exist", table));
                assert_eq!(count, 0);
            }
        }

        #[test]
        fn init_is_idempotent() {
            let db = setup_db();
            add(&db, "Q1", "Cloud Concepts");

            db.init().expect("Re-init should succeed");

            assert_eq!(db.count_questions().unwrap(), 1);
        }
    }

    mod question_tests {
        use super::*;

        #[test]
        fn add_and_get_question() {
            let db = setup_db();
            let id = db
                .add_question("What is S3?", "Technology", None, &opts(&['B', 'D']))
                .unwrap();

            let q = db.get_question(id).unwrap().unwrap();
            assert_eq!(q.text, "What is S3?");
            assert_eq!(q.domain, "Technology");
            assert!(q.explanation.is_none());
            assert_eq!(q.options.len(), 4);
            assert_eq!(q.correct_letters(), ['B', 'D'].into_iter().collect());
        }

        #[test]
        fn get_question_not_found() {
            let db = setup_db();
            assert!(db.get_question(999).unwrap().is_none());
        }

        #[test]
        fn options_come_back_in_letter_order() {
            let db = setup_db();
            let reversed: Vec<QuizOption> = opts(&['C']).into_iter().rev().collect();
            let id = db.add_question("Q", "D", None, &reversed).unwrap();

            let q = db.get_question(id).unwrap().unwrap();
            let letters: String = q.options.iter().map(|o| o.letter).collect();
            assert_eq!(letters, "ABCD");
        }

        #[test]
        fn duplicate_letter_rolls_back_question() {
            let db = setup_db();
            let dup = vec![
                QuizOption::new('A', "one", true),
                QuizOption::new('A', "two", false),
            ];
            assert!(db.add_question("Q", "D", None, &dup).is_err());
            assert_eq!(db.count_questions().unwrap(), 0);
        }

        #[test]
        fn question_without_correct_option_is_rejected() {
            let db = setup_db();
            let result = db.add_question("Q", "D", None, &opts(&[]));

            assert!(matches!(result, Err(QuizError::InvalidQuestion(_))));
            assert_eq!(db.count_questions().unwrap(), 0);
        }

        #[test]
        fn more_than_ten_options_is_rejected() {
            let db = setup_db();
            let mut options: Vec<QuizOption> = OPTION_LETTERS
                .iter()
                .map(|&l| QuizOption::new(l, format!("Answer {}", l), false))
                .collect();
            options.push(QuizOption::new('K', "Answer K", true));

            let result = db.add_question("Q", "D", None, &options);

            assert!(matches!(result, Err(QuizError::InvalidQuestion(_))));
            assert_eq!(db.count_questions().unwrap(), 0);
        }

        #[test]
        fn ten_options_are_accepted() {
            let db = setup_db();
            let options: Vec<QuizOption> = OPTION_LETTERS
                .iter()
                .map(|&l| QuizOption::new(l, format!("Answer {}", l), l == 'J'))
                .collect();

            let id = db.add_question("Q", "D", None, &options).unwrap();
            let q = db.get_question(id).unwrap().unwrap();
            assert_eq!(q.options.len(), 10);
            assert_eq!(q.correct_letters(), ['J'].into_iter().collect());
        }

        #[test]
        fn letter_outside_range_is_rejected() {
            let db = setup_db();
            let options = vec![QuizOption::new('Z', "Answer", true)];
            assert!(db.add_question("Q", "D", None, &options).is_err());
        }

        #[test]
        fn questions_unfiltered_in_id_order() {
            let db = setup_db();
            let a = add(&db, "Q1", "Security");
            let b = add(&db, "Q2", "Billing");
            let c = add(&db, "Q3", "Security");

            let ids: Vec<i64> = db.questions(None).unwrap().iter().map(|q| q.id).collect();
            assert_eq!(ids, vec![a, b, c]);
        }

        #[test]
        fn questions_filtered_by_domain() {
            let db = setup_db();
            add(&db, "Q1", "Security");
            add(&db, "Q2", "Billing");
            add(&db, "Q3", "Security");

            let security = db.questions(Some("Security")).unwrap();
            assert_eq!(security.len(), 2);
            assert!(security.iter().all(|q| q.domain == "Security"));
            assert!(security.iter().all(|q| !q.options.is_empty()));

            assert!(db.questions(Some("Networking")).unwrap().is_empty());
        }

        #[test]
        fn all_domain_means_no_filter() {
            let db = setup_db();
            add(&db, "Q1", "Security");
            add(&db, "Q2", "Billing");

            assert_eq!(db.questions(Some("all")).unwrap().len(), 2);
            assert_eq!(db.questions(Some("ALL")).unwrap().len(), 2);
            assert_eq!(db.questions(Some("")).unwrap().len(), 2);
        }

        #[test]
        fn unnormalised_all_mode_still_starts() {
            let db = setup_db();
            add(&db, "Q1", "Security");

            let mut rng = StdRng::seed_from_u64(3);
            let mode = QuizMode::Domain(Some("all".to_string()));
            let session = QuizSession::start(&db, &mode, None, &mut rng).unwrap();
            assert_eq!(session.total(), 1);
        }

        #[test]
        fn domain_counts_sorted_by_count_then_name() {
            let db = setup_db();
            add(&db, "Q1", "Billing");
            add(&db, "Q2", "Security");
            add(&db, "Q3", "Security");
            add(&db, "Q4", "Architecture");

            let counts = db.domain_counts().unwrap();
            let names: Vec<&str> = counts.iter().map(|d| d.name.as_str()).collect();
            assert_eq!(names, vec!["Security", "Architecture", "Billing"]);
            assert_eq!(counts[0].count, 2);
        }
    }

    mod mastery_tests {
        use super::*;

        #[test]
        fn first_outcome_creates_record() {
            let db = setup_db();
            let id = add(&db, "Q", "D");

            assert!(db.mastery_record(id).unwrap().is_none());
            let record = db.record_outcome(id, true).unwrap();
            assert_eq!(record.correct_count, 1);
            assert_eq!(record.incorrect_count, 0);
            assert!(record.last_answered.is_some());
        }

        #[test]
        fn first_wrong_outcome_seeds_incorrect() {
            let db = setup_db();
            let id = add(&db, "Q", "D");

            let record = db.record_outcome(id, false).unwrap();
            assert_eq!(record.mastery(), Mastery { correct: 0, incorrect: 1 });
        }

        #[test]
        fn later_outcomes_increment_matching_counter() {
            let db = setup_db();
            let id = add(&db, "Q", "D");

            db.record_outcome(id, true).unwrap();
            db.record_outcome(id, false).unwrap();
            db.record_outcome(id, true).unwrap();

            assert_eq!(db.mastery(id).unwrap(), Mastery { correct: 2, incorrect: 1 });
        }

        #[test]
        fn mastery_defaults_to_zero() {
            let db = setup_db();
            let id = add(&db, "Q", "D");
            assert_eq!(db.mastery(id).unwrap(), Mastery::default());
        }

        #[test]
        fn outcomes_are_logged_to_history() {
            let db = setup_db();
            let id = add(&db, "Q", "D");
            db.record_outcome(id, true).unwrap();
            db.record_outcome(id, false).unwrap();

            let correct: i64 = db
                .conn
                .query_row(
                    "SELECT COUNT(*) FROM answer_history WHERE answered_correctly = 1",
                    [],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(correct, 1);
            assert_eq!(db.get_stats().unwrap().total_answers, 2);
        }

        #[test]
        fn reset_all_clears_counters_and_history() {
            let db = setup_db();
            let a = add(&db, "Q1", "D");
            let b = add(&db, "Q2", "D");
            db.record_outcome(a, true).unwrap();
            db.record_outcome(b, false).unwrap();

            db.reset_all().unwrap();

            assert!(db.mastery_record(a).unwrap().is_none());
            assert!(db.mastery_record(b).unwrap().is_none());
            assert_eq!(db.get_stats().unwrap().total_answers, 0);
            assert_eq!(db.count_questions().unwrap(), 2);
        }

        // Counters are global. Separate connections racing on one question
        // both land their increment because the update is relative; only
        // last_answered is last-writer-wins.
        #[test]
        fn shared_counters_across_connections() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("quiz.db");

            let first = Database::open(&path).unwrap();
            first.init().unwrap();
            let id = add(&first, "Q", "D");

            let second = Database::open(&path).unwrap();
            first.record_outcome(id, true).unwrap();
            second.record_outcome(id, true).unwrap();
            first.record_outcome(id, false).unwrap();

            assert_eq!(second.mastery(id).unwrap(), Mastery { correct: 2, incorrect: 1 });
        }
    }

    mod missed_tests {
        use super::*;

        #[test]
        fn unattempted_questions_are_not_missed() {
            let db = setup_db();
            add(&db, "Q", "D");
            assert!(db.missed_questions().unwrap().is_empty());
        }

        #[test]
        fn missed_pool_excludes_mastered() {
            let db = setup_db();
            let learning = add(&db, "Q1", "D");
            let mastered = add(&db, "Q2", "D");

            db.record_outcome(learning, false).unwrap();
            for _ in 0..MASTERY_THRESHOLD {
                db.record_outcome(mastered, true).unwrap();
            }

            let missed = db.missed_questions().unwrap();
            assert_eq!(missed.len(), 1);
            assert_eq!(missed[0].question.id, learning);
            assert_eq!(missed[0].mastery, Mastery { correct: 0, incorrect: 1 });
            assert_eq!(missed[0].question.options.len(), 4);
        }

        #[test]
        fn correct_but_unmastered_is_still_in_pool() {
            let db = setup_db();
            let id = add(&db, "Q", "D");
            db.record_outcome(id, true).unwrap();

            assert_eq!(db.missed_questions().unwrap().len(), 1);
        }
    }

    mod stats_tests {
        use super::*;

        #[test]
        fn stats_empty_db() {
            let db = setup_db();
            let stats = db.get_stats().unwrap();
            assert_eq!(stats.total, 0);
            assert!(stats.domains.is_empty());
            assert_eq!(stats.needs_practice, 0);
            assert_eq!(stats.mastered_count, 0);
            assert_eq!(stats.wrong_count, 0);
        }

        #[test]
        fn stats_classifies_mastery() {
            let db = setup_db();
            let mastered = add(&db, "Q1", "Security");
            let wrong = add(&db, "Q2", "Security");
            let practising = add(&db, "Q3", "Billing");
            add(&db, "Q4", "Billing");

            for _ in 0..4 {
                db.record_outcome(mastered, true).unwrap();
            }
            db.record_outcome(mastered, false).unwrap();
            db.record_outcome(wrong, false).unwrap();
            db.record_outcome(practising, true).unwrap();

            let stats = db.get_stats().unwrap();
            assert_eq!(stats.total, 4);
            assert_eq!(stats.mastered_count, 1);
            assert_eq!(stats.needs_practice, 2);
            assert_eq!(stats.wrong_count, 1);
            assert!(stats.needs_practice + stats.mastered_count <= 3);
        }

        #[test]
        fn stats_after_reset_are_zero() {
            let db = setup_db();
            let id = add(&db, "Q", "D");
            db.record_outcome(id, false).unwrap();
            db.record_outcome(id, true).unwrap();

            db.reset_all().unwrap();

            let stats = db.get_stats().unwrap();
            assert_eq!(stats.mastered_count, 0);
            assert_eq!(stats.needs_practice, 0);
            assert_eq!(stats.wrong_count, 0);
            assert_eq!(stats.total, 1);
        }
    }

    mod session_tests {
        use super::*;

        #[test]
        fn missing_session_loads_empty() {
            let db = setup_db();
            let session = db.load_session("nobody").unwrap();
            assert_eq!(session.total(), 0);
            assert_eq!(session.score(), 0);
        }

        #[test]
        fn session_round_trips_through_storage() {
            let db = setup_db();
            add(&db, "Q1", "D");
            add(&db, "Q2", "D");

            let mut rng = StdRng::seed_from_u64(1);
            let session =
                QuizSession::start(&db, &QuizMode::Domain(None), None, &mut rng).unwrap();
            db.save_session("alice", &session).unwrap();

            let loaded = db.load_session("alice").unwrap();
            assert_eq!(loaded, session);
        }

        #[test]
        fn sessions_are_per_client() {
            let db = setup_db();
            add(&db, "Q1", "D");

            let mut rng = StdRng::seed_from_u64(1);
            let session =
                QuizSession::start(&db, &QuizMode::Domain(None), None, &mut rng).unwrap();
            db.save_session("alice", &session).unwrap();

            assert_eq!(db.load_session("bob").unwrap().total(), 0);
            assert_eq!(db.load_session("alice").unwrap().total(), 1);
        }

        #[test]
        fn corrupt_session_loads_empty() {
            let db = setup_db();
            db.conn
                .execute(
                    "INSERT INTO quiz_sessions (client_id, state) VALUES ('eve', '{not json')",
                    [],
                )
                .unwrap();

            assert_eq!(db.load_session("eve").unwrap().total(), 0);
        }

        fn store_tampered(db: &Database, client: &str, edit: impl FnOnce(&mut serde_json::Value)) {
            add(db, "Q1", "D");
            add(db, "Q2", "D");
            let mut rng = StdRng::seed_from_u64(8);
            let mut session =
                QuizSession::start(db, &QuizMode::Domain(None), None, &mut rng).unwrap();
            let correct = session.current_question().unwrap().correct_letters();
            session.submit(db, &correct).unwrap();

            let mut value = serde_json::to_value(&session).unwrap();
            edit(&mut value);
            db.conn
                .execute(
                    "INSERT INTO quiz_sessions (client_id, state) VALUES (?1, ?2)",
                    params![client, value.to_string()],
                )
                .unwrap();
        }

        #[test]
        fn inflated_score_loads_empty() {
            let db = setup_db();
            store_tampered(&db, "eve", |v| v["score"] = 5.into());

            let session = db.load_session("eve").unwrap();
            assert_eq!(session.total(), 0);
            assert_eq!(session.results().percentage, 0.0);
        }

        #[test]
        fn index_past_end_loads_empty() {
            let db = setup_db();
            store_tampered(&db, "eve", |v| v["current_index"] = 7.into());
            assert_eq!(db.load_session("eve").unwrap().total(), 0);
        }

        #[test]
        fn answer_past_end_loads_empty() {
            let db = setup_db();
            store_tampered(&db, "eve", |v| v["answers"][0]["position"] = 9.into());
            assert_eq!(db.load_session("eve").unwrap().total(), 0);
        }

        #[test]
        fn untouched_session_still_loads() {
            let db = setup_db();
            store_tampered(&db, "eve", |_| {});

            let session = db.load_session("eve").unwrap();
            assert_eq!(session.total(), 2);
            assert_eq!(session.score(), 1);
        }

        #[test]
        fn clear_session_removes_record() {
            let db = setup_db();
            db.save_session("alice", &QuizSession::default()).unwrap();
            assert!(db.clear_session("alice").unwrap());
            assert!(!db.clear_session("alice").unwrap());
        }
    }
}
