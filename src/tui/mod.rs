mod ui;
mod widgets;

use std::collections::BTreeSet;
use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use rand::rngs::ThreadRng;
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::db::{Database, Stats};
use crate::error::{QuizError, QuizMode};
use crate::models::{DomainCount, OPTION_LETTERS};
use crate::quiz::{Advance, AnswerFeedback, QuizSession, QuizState};
use crate::shuffle::{shuffle_options, ShuffledOptions};
use crate::store::MasteryStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Question,
    Results,
    Review,
}

pub struct StatefulList<T> {
    pub items: Vec<T>,
    pub selected: Option<usize>,
}

impl<T> StatefulList<T> {
    fn with_items(items: Vec<T>) -> Self {
        let selected = if items.is_empty() { None } else { Some(0) };
        Self { items, selected }
    }

    fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(i) => {
                if i >= self.items.len() - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.selected = Some(i);
    }

    fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(i) => {
                if i == 0 {
                    self.items.len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.selected = Some(i);
    }

    fn selected_item(&self) -> Option<&T> {
        self.selected.and_then(|i| self.items.get(i))
    }
}

/// A row in the dashboard's domain picker. `None` stands for every domain.
#[derive(Debug, Clone)]
pub struct DomainEntry {
    pub name: Option<String>,
    pub count: i64,
}

impl DomainEntry {
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("All domains")
    }
}

fn domain_entries(stats: &Stats) -> Vec<DomainEntry> {
    let mut entries = vec![DomainEntry {
        name: None,
        count: stats.total,
    }];
    entries.extend(stats.domains.iter().map(|DomainCount { name, count }| DomainEntry {
        name: Some(name.clone()),
        count: *count,
    }));
    entries
}

pub struct App {
    db: Database,
    client: String,
    rng: ThreadRng,
    pub view: View,
    pub stats: Stats,
    pub domains: StatefulList<DomainEntry>,
    /// Cap for domain quizzes; zero means every matching question.
    pub limit: usize,
    pub session: QuizSession,
    pub shuffled: Option<ShuffledOptions>,
    /// Letters toggled on under the display lettering.
    pub selection: BTreeSet<char>,
    pub feedback: Option<AnswerFeedback>,
    pub review_scroll: u16,
    pub message: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(db: Database, client: String) -> Result<Self, Box<dyn std::error::Error>> {
        let stats = db.get_stats()?;
        let session = db.load_session(&client)?;
        let domains = StatefulList::with_items(domain_entries(&stats));

        let mut app = Self {
            db,
            client,
            rng: rand::thread_rng(),
            view: View::Dashboard,
            stats,
            domains,
            limit: 0,
            session,
            shuffled: None,
            selection: BTreeSet::new(),
            feedback: None,
            review_scroll: 0,
            message: None,
            should_quit: false,
        };
        if app.session.state() == QuizState::InProgress {
            app.message = Some("Quiz in progress, press r to resume".to_string());
        }
        Ok(app)
    }

    pub fn refresh_data(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.stats = self.db.get_stats()?;
        self.domains = StatefulList::with_items(domain_entries(&self.stats));
        Ok(())
    }

    // Shows the current question under a fresh option order.
    fn present_current(&mut self) {
        self.selection.clear();
        self.feedback = None;
        self.shuffled = self
            .session
            .current_question()
            .map(|q| shuffle_options(&q.options, &mut self.rng));
        self.view = View::Question;
    }

    fn start_quiz(&mut self, mode: QuizMode) -> Result<(), Box<dyn std::error::Error>> {
        let started = match mode {
            QuizMode::Missed => QuizSession::start_missed(&self.db, &mut self.rng),
            mode => QuizSession::start(&self.db, &mode, Some(self.limit), &mut self.rng),
        };

        match started {
            Ok(session) => {
                self.db.save_session(&self.client, &session)?;
                self.session = session;
                self.message = None;
                self.present_current();
            }
            Err(e) => self.show_error(e)?,
        }
        Ok(())
    }

    fn adjust_limit(&mut self, delta: i64) {
        let max = self.stats.total.max(0) as usize;
        self.limit = if delta < 0 {
            self.limit.saturating_sub(delta.unsigned_abs() as usize)
        } else {
            (self.limit + delta as usize).min(max)
        };
    }

    fn resume(&mut self) {
        match self.session.state() {
            QuizState::InProgress => self.present_current(),
            QuizState::Completed => self.view = View::Results,
            QuizState::NotStarted => self.message = Some("No quiz to resume".to_string()),
        }
    }

    fn toggle(&mut self, letter: char) {
        let available = self.shuffled.as_ref().map_or(0, |s| s.options.len());
        if !OPTION_LETTERS[..available].contains(&letter) {
            return;
        }
        if !self.selection.remove(&letter) {
            self.selection.insert(letter);
        }
    }

    fn submit(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let Some(shuffled) = &self.shuffled else {
            return Ok(());
        };
        let selected = shuffled.to_canonical(&self.selection);
        match self.session.submit(&self.db, &selected) {
            Ok(feedback) => {
                self.db.save_session(&self.client, &self.session)?;
                self.feedback = Some(feedback);
                self.message = None;
            }
            Err(e) => self.show_error(e)?,
        }
        Ok(())
    }

    fn advance(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let advance = match self.session.advance() {
            Ok(advance) => advance,
            Err(QuizError::QuizCompleted) => Advance::Completed,
            Err(e) => return Err(e.into()),
        };
        self.db.save_session(&self.client, &self.session)?;

        match advance {
            Advance::Next { .. } => self.present_current(),
            Advance::Completed => {
                self.shuffled = None;
                self.feedback = None;
                self.view = View::Results;
            }
        }
        Ok(())
    }

    fn abandon(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.db.clear_session(&self.client)?;
        self.session = QuizSession::default();
        self.shuffled = None;
        self.feedback = None;
        self.view = View::Dashboard;
        self.refresh_data()
    }

    fn back_to_dashboard(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.view = View::Dashboard;
        self.refresh_data()
    }

    fn show_error(&mut self, err: QuizError) -> Result<(), Box<dyn std::error::Error>> {
        if !err.is_benign() {
            return Err(err.into());
        }
        self.message = Some(err.user_message());
        Ok(())
    }

    fn handle_key(
        &mut self,
        key: KeyCode,
        modifiers: KeyModifiers,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if key == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return Ok(());
        }

        match self.view {
            View::Dashboard => self.handle_dashboard_key(key, modifiers)?,
            View::Question => self.handle_question_key(key)?,
            View::Results => match key {
                KeyCode::Char('v') => {
                    self.review_scroll = 0;
                    self.view = View::Review;
                }
                KeyCode::Enter | KeyCode::Esc | KeyCode::Char('h') => self.back_to_dashboard()?,
                KeyCode::Char('q') => self.should_quit = true,
                _ => {}
            },
            View::Review => match key {
                KeyCode::Char('j') | KeyCode::Down => {
                    self.review_scroll = self.review_scroll.saturating_add(1)
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    self.review_scroll = self.review_scroll.saturating_sub(1)
                }
                KeyCode::Char('g') => self.review_scroll = 0,
                KeyCode::Esc | KeyCode::Char('h') => self.view = View::Results,
                KeyCode::Char('q') => self.should_quit = true,
                _ => {}
            },
        }
        Ok(())
    }

    fn handle_dashboard_key(
        &mut self,
        key: KeyCode,
        modifiers: KeyModifiers,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match key {
            KeyCode::Char('q') => self.should_quit = true,

            KeyCode::Char('r') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.refresh_data()?;
            }
            KeyCode::Char('r') => self.resume(),

            KeyCode::Char('j') | KeyCode::Down => self.domains.next(),
            KeyCode::Char('k') | KeyCode::Up => self.domains.previous(),
            KeyCode::Char('g') if !self.domains.items.is_empty() => {
                self.domains.selected = Some(0);
            }
            KeyCode::Char('G') if !self.domains.items.is_empty() => {
                self.domains.selected = Some(self.domains.items.len() - 1);
            }

            KeyCode::Enter | KeyCode::Char('l') => {
                if let Some(entry) = self.domains.selected_item() {
                    let mode = QuizMode::from_domain(entry.name.as_deref());
                    self.start_quiz(mode)?;
                }
            }
            KeyCode::Char('m') => self.start_quiz(QuizMode::Missed)?,

            KeyCode::Char('+') | KeyCode::Char('=') => self.adjust_limit(1),
            KeyCode::Char('-') => self.adjust_limit(-1),
            KeyCode::Char(']') => self.adjust_limit(10),
            KeyCode::Char('[') => self.adjust_limit(-10),

            KeyCode::Char('X') => {
                self.db.reset_all()?;
                tracing::info!("progress cleared");
                self.refresh_data()?;
                self.message = Some("Progress cleared".to_string());
            }

            _ => {}
        }
        Ok(())
    }

    fn handle_question_key(&mut self, key: KeyCode) -> Result<(), Box<dyn std::error::Error>> {
        match key {
            KeyCode::Esc => self.back_to_dashboard()?,
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('x') => self.abandon()?,
            KeyCode::Enter if self.feedback.is_some() => self.advance()?,
            KeyCode::Enter => self.submit()?,
            KeyCode::Char('n') | KeyCode::Tab => self.advance()?,
            KeyCode::Char(c) if self.feedback.is_none() && c.is_ascii_alphabetic() => {
                self.toggle(c.to_ascii_uppercase())
            }
            _ => {}
        }
        Ok(())
    }
}

pub fn run(db: Database, client: String) -> Result<(), Box<dyn std::error::Error>> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = App::new(db, client).and_then(|mut app| run_app(&mut terminal, &mut app));

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key.code, key.modifiers)?;
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
