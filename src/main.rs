use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use certquiz::models::{parse_letters, truncate, JsonOutput, QuizOption, OPTION_LETTERS};
use certquiz::{Advance, Database, MasteryStore, QuizError, QuizMode, QuizSession};

const DEFAULT_DB_NAME: &str = "certquiz.db";
const DEFAULT_CLIENT: &str = "default";

#[derive(Parser)]
#[command(name = "certquiz")]
#[command(about = "Certification exam quiz trainer with mastery tracking")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Session owner; each client has one active quiz
    #[arg(long, global = true, env = "CERTQUIZ_CLIENT", default_value = DEFAULT_CLIENT)]
    client: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Add a question
    Add {
        /// Question text
        text: String,

        /// Domain the question belongs to
        #[arg(long, short)]
        domain: String,

        /// Explanation shown after answering
        #[arg(long, short)]
        explanation: Option<String>,

        /// Option text, repeat for each option (lettered A, B, C, ...)
        #[arg(long = "option", short = 'o', required = true)]
        options: Vec<String>,

        /// Correct letters, e.g. "B" or "A,C"
        #[arg(long, short)]
        correct: String,
    },

    /// List domains with question counts
    Domains,

    /// Show question and mastery statistics
    Stats,

    /// Start a new quiz, replacing any quiz in progress
    Quiz {
        /// Only questions from this domain ("all" for every domain)
        #[arg(long, short)]
        domain: Option<String>,

        /// Maximum number of questions
        #[arg(long, short)]
        limit: Option<usize>,

        /// Practice questions that are not mastered yet
        #[arg(long, conflicts_with = "domain")]
        missed: bool,
    },

    /// Show the current question
    Current,

    /// Answer the current question
    Answer {
        /// Selected letters, e.g. `A` or `B D`
        #[arg(required = true)]
        letters: Vec<String>,
    },

    /// Move to the next question
    Next,

    /// Show the score for the current quiz
    Results,

    /// Review every answered question
    Review,

    /// Reset all mastery counters and answer history
    ClearProgress,

    /// Launch interactive terminal UI
    Tui,
}

fn get_db_path() -> PathBuf {
    if let Ok(path) = std::env::var("CERTQUIZ_DB") {
        return PathBuf::from(path);
    }

    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("certquiz");

    std::fs::create_dir_all(&config_dir).ok();
    config_dir.join(DEFAULT_DB_NAME)
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "certquiz=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let db_path = get_db_path();
    let db = Database::open(&db_path)?;
    db.init()?;
    tracing::debug!(path = %db_path.display(), "database ready");

    match cli.command {
        Commands::Init => {
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
            } else {
                println!("Database initialized at: {}", db_path.display());
            }
        }

        Commands::Add {
            text,
            domain,
            explanation,
            options,
            correct,
        } => {
            let options = build_options(&options, &correct)?;
            let id = db.add_question(&text, &domain, explanation.as_deref(), &options)?;

            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "id": id,
                        "domain": domain
                    })))?
                );
            } else {
                println!("Added question {} to '{}'", id, domain);
            }
        }

        Commands::Domains => {
            let domains = db.domain_counts()?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&domains))?);
            } else if domains.is_empty() {
                println!("No questions found.");
            } else {
                println!("{:<40} QUESTIONS", "DOMAIN");
                println!("{}", "-".repeat(52));
                for d in domains {
                    println!("{:<40} {}", truncate(&d.name, 38), d.count);
                }
            }
        }

        Commands::Stats => {
            let stats = db.get_stats()?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&stats))?);
            } else {
                println!("=== Quiz Statistics ===");
                println!("Total questions: {}", stats.total);
                for d in &stats.domains {
                    println!("  {:<36} {}", truncate(&d.name, 34), d.count);
                }
                println!("Answers given: {}", stats.total_answers);
                println!("Mastered (4+ correct): {}", stats.mastered_count);
                println!("Needs practice: {}", stats.needs_practice);
                println!("Answered wrong at least once: {}", stats.wrong_count);
            }
        }

        Commands::Quiz {
            domain,
            limit,
            missed,
        } => {
            let mode = if missed {
                QuizMode::Missed
            } else {
                QuizMode::from_domain(domain.as_deref())
            };

            let session = match QuizSession::start(&db, &mode, limit, &mut rand::thread_rng()) {
                Ok(session) => session,
                Err(e) => return report(cli.json, e),
            };
            db.save_session(&cli.client, &session)?;

            print_current(cli.json, &session)?;
        }

        Commands::Current => {
            let session = db.load_session(&cli.client)?;
            print_current(cli.json, &session)?;
        }

        Commands::Answer { letters } => {
            let mut session = db.load_session(&cli.client)?;
            let selected = parse_letters(&letters);

            let feedback = match session.submit(&db, &selected) {
                Ok(feedback) => feedback,
                Err(e) => return report(cli.json, e),
            };
            db.save_session(&cli.client, &session)?;

            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&feedback))?);
            } else {
                if feedback.is_correct {
                    println!("Correct!");
                } else {
                    println!("Incorrect.");
                }
                println!("Correct answer: {}", join_letters(&feedback.correct_answers));
                if !feedback.explanation.is_empty() {
                    println!();
                    println!("{}", feedback.explanation);
                }
                println!();
                println!(
                    "Mastery: {} correct, {} incorrect ({})",
                    feedback.mastery.correct,
                    feedback.mastery.incorrect,
                    feedback.mastery.status().label()
                );
            }
        }

        Commands::Next => {
            let mut session = db.load_session(&cli.client)?;

            let advance = match session.advance() {
                Ok(advance) => advance,
                Err(QuizError::QuizCompleted) => Advance::Completed,
                Err(e) => return report(cli.json, e),
            };
            db.save_session(&cli.client, &session)?;

            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&advance))?);
            } else {
                match advance {
                    Advance::Completed => {
                        println!("Quiz completed! Run `certquiz results` to see your score.")
                    }
                    Advance::Next { .. } => print_current(false, &session)?,
                }
            }
        }

        Commands::Results => {
            let session = db.load_session(&cli.client)?;
            let results = session.results();

            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&results))?);
            } else {
                println!("=== Results ({}) ===", results.mode);
                println!(
                    "Score: {}/{} ({:.1}%) - {}",
                    results.score,
                    results.total,
                    results.percentage,
                    if results.passed { "PASS" } else { "FAIL" }
                );
                if !results.domains.is_empty() {
                    println!();
                    println!("{:<40} CORRECT", "DOMAIN");
                    println!("{}", "-".repeat(52));
                    for d in &results.domains {
                        println!(
                            "{:<40} {}/{}",
                            truncate(&d.name, 38),
                            d.correct,
                            d.attempted
                        );
                    }
                }
            }
        }

        Commands::Review => {
            let session = db.load_session(&cli.client)?;
            let review = session.review();

            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&review))?);
            } else if review.is_empty() {
                println!("Nothing to review yet.");
            } else {
                for entry in review {
                    let mark = if entry.answer.is_correct { "✓" } else { "✗" };
                    println!("{}. {} [{}]", entry.number, entry.question.text, entry.question.domain);
                    for opt in &entry.question.options {
                        println!("   {}) {}", opt.letter, opt.text);
                    }
                    println!(
                        "   {} You answered: {}  Correct: {}",
                        mark,
                        join_letters(&entry.answer.selected),
                        join_letters(&entry.answer.correct)
                    );
                    if let Some(explanation) = &entry.question.explanation {
                        println!("   {}", explanation);
                    }
                    println!();
                }
            }
        }

        Commands::ClearProgress => {
            db.reset_all()?;
            tracing::info!("progress cleared");

            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
            } else {
                println!("Progress cleared! All missed questions have been reset.");
            }
        }

        Commands::Tui => {
            certquiz::tui::run(db, cli.client)?;
        }
    }

    Ok(())
}

// Benign quiz outcomes become messages; storage failures stay errors.
fn report(json: bool, err: QuizError) -> Result<(), Box<dyn std::error::Error>> {
    if !err.is_benign() {
        return Err(err.into());
    }

    if json {
        println!(
            "{}",
            serde_json::to_string(&JsonOutput::<()>::err(err.user_message()))?
        );
    } else {
        println!("{}", err.user_message());
    }
    Ok(())
}

fn print_current(json: bool, session: &QuizSession) -> Result<(), Box<dyn std::error::Error>> {
    let Some(question) = session.current_view() else {
        return report(json, QuizError::QuizCompleted);
    };

    if json {
        println!(
            "{}",
            serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                "question": question,
                "current": session.current_index() + 1,
                "total": session.total(),
                "domain": session.mode().label(),
            })))?
        );
    } else {
        println!(
            "Question {}/{} [{}]",
            session.current_index() + 1,
            session.total(),
            question.domain
        );
        println!();
        println!("{}", question.text);
        println!();
        for opt in &question.options {
            println!("  {}) {}", opt.letter, opt.text);
        }
        println!();
        println!("Answer with: certquiz answer <letters>");
    }
    Ok(())
}

/// Letters CLI option texts A, B, C, ... in order and flags the ones named in
/// `correct`. Whether the result is a valid question is up to `add_question`.
fn build_options(texts: &[String], correct: &str) -> Result<Vec<QuizOption>, String> {
    if texts.len() > OPTION_LETTERS.len() {
        return Err(format!(
            "Option {} has no letter; the last letter is {}",
            OPTION_LETTERS.len() + 1,
            OPTION_LETTERS[OPTION_LETTERS.len() - 1]
        ));
    }

    let correct = parse_letters(&[correct]);
    let letters = &OPTION_LETTERS[..texts.len()];

    if let Some(bad) = correct.iter().find(|c| !letters.contains(c)) {
        return Err(format!("Correct letter '{}' has no matching option", bad));
    }

    Ok(texts
        .iter()
        .zip(letters)
        .map(|(text, &letter)| QuizOption::new(letter, text.trim(), correct.contains(&letter)))
        .collect())
}

fn join_letters<'a, I: IntoIterator<Item = &'a char>>(letters: I) -> String {
    let joined: Vec<String> = letters.into_iter().map(|c| c.to_string()).collect();
    if joined.is_empty() {
        "-".to_string()
    } else {
        joined.join(", ")
    }
}
