use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::truncate;
use crate::quiz::QuizState;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8), // Stats
            Constraint::Min(0),    // Current quiz
        ])
        .split(chunks[0]);

    draw_stats(f, app, left[0]);
    draw_session(f, app, left[1]);
    draw_domains(f, app, chunks[1]);
}

fn stat_line(label: &str, value: i64, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{}: ", label), Style::default().fg(Color::Gray)),
        Span::styled(format!("{}", value), Style::default().fg(color)),
    ])
}

fn draw_stats(f: &mut Frame, app: &App, area: Rect) {
    let stats = &app.stats;

    let text = vec![
        Line::from(vec![
            Span::styled("Questions: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", stats.total),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        stat_line("Answers", stats.total_answers, Color::White),
        stat_line("Mastered", stats.mastered_count, Color::Green),
        stat_line(
            "Needs practice",
            stats.needs_practice,
            if stats.needs_practice > 0 {
                Color::Yellow
            } else {
                Color::White
            },
        ),
        stat_line(
            "Missed",
            stats.wrong_count,
            if stats.wrong_count > 0 {
                Color::Red
            } else {
                Color::White
            },
        ),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Stats ")
        .title_style(Style::default().fg(Color::Cyan));

    f.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_session(f: &mut Frame, app: &App, area: Rect) {
    let session = &app.session;

    let text = match session.state() {
        QuizState::NotStarted => vec![Line::from(Span::styled(
            "No quiz started",
            Style::default().fg(Color::DarkGray),
        ))],
        state => {
            let (status, color) = if state == QuizState::Completed {
                ("Completed", Color::Green)
            } else {
                ("In progress", Color::Cyan)
            };
            vec![
                Line::from(Span::styled(status, Style::default().fg(color))),
                Line::from(vec![
                    Span::styled("Mode: ", Style::default().fg(Color::Gray)),
                    Span::raw(session.mode().label().to_string()),
                ]),
                Line::from(vec![
                    Span::styled("Question: ", Style::default().fg(Color::Gray)),
                    Span::raw(format!(
                        "{}/{}",
                        (session.current_index() + 1).min(session.total()),
                        session.total()
                    )),
                ]),
                Line::from(vec![
                    Span::styled("Score: ", Style::default().fg(Color::Gray)),
                    Span::raw(format!("{}", session.score())),
                ]),
            ]
        }
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Current Quiz ")
        .title_style(Style::default().fg(Color::Magenta));

    f.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_domains(f: &mut Frame, app: &App, area: Rect) {
    let width = area.width.saturating_sub(14) as usize;

    let items: Vec<ListItem> = app
        .domains
        .items
        .iter()
        .map(|entry| {
            let style = if entry.name.is_none() {
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<w$}", truncate(entry.label(), width), w = width),
                    style,
                ),
                Span::styled(
                    format!("{:>5}", entry.count),
                    Style::default().fg(Color::Yellow),
                ),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(match app.limit {
            0 => " Domains (limit: all) ".to_string(),
            n => format!(" Domains (limit: {}) ", n),
        })
        .title_style(Style::default().fg(Color::Yellow));

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.domains.selected);

    f.render_stateful_widget(list, area, &mut state);
}
