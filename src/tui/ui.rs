use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::widgets::{dashboard, question, results, review};
use super::{App, View};

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Help bar
        ])
        .split(f.area());

    draw_title(f, app, chunks[0]);
    draw_content(f, app, chunks[1]);
    draw_help_bar(f, app, chunks[2]);
}

fn draw_title(f: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(
        match app.view {
            View::Dashboard => "Dashboard",
            View::Question => "Quiz",
            View::Results => "Results",
            View::Review => "Review",
        },
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    )];

    if app.view != View::Dashboard && app.session.total() > 0 {
        spans.push(Span::styled(
            format!("  {}", app.session.mode().label()),
            Style::default().fg(Color::Cyan),
        ));
        spans.push(Span::styled(
            format!("  score {}/{}", app.session.score(), app.session.total()),
            Style::default().fg(Color::Gray),
        ));
    }

    if let Some(message) = &app.message {
        spans.push(Span::styled(
            format!("  {}", message),
            Style::default().fg(Color::Magenta),
        ));
    }

    let title = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title(" CertQuiz "));

    f.render_widget(title, area);
}

fn draw_content(f: &mut Frame, app: &App, area: Rect) {
    match app.view {
        View::Dashboard => dashboard::draw(f, app, area),
        View::Question => question::draw(f, app, area),
        View::Results => results::draw(f, app, area),
        View::Review => review::draw(f, app, area),
    }
}

fn key(k: &'static str) -> Span<'static> {
    Span::styled(k, Style::default().fg(Color::Cyan))
}

fn draw_help_bar(f: &mut Frame, app: &App, area: Rect) {
    let mut spans = match app.view {
        View::Dashboard => vec![
            key("j/k"),
            Span::raw(" Nav  "),
            key("<CR>"),
            Span::raw(" Start  "),
            key("+/-"),
            Span::raw(" Limit  "),
            key("m"),
            Span::raw(" Missed  "),
            key("r"),
            Span::raw(" Resume  "),
            key("X"),
            Span::raw(" Clear progress  "),
            key("^r"),
            Span::raw(" Refresh  "),
        ],
        View::Question if app.feedback.is_some() => vec![
            key("<CR>/n"),
            Span::raw(" Next  "),
            key("<Esc>"),
            Span::raw(" Dashboard  "),
        ],
        View::Question => vec![
            key("a-j"),
            Span::raw(" Toggle  "),
            key("<CR>"),
            Span::raw(" Submit  "),
            key("n"),
            Span::raw(" Skip  "),
            key("x"),
            Span::raw(" Abandon  "),
            key("<Esc>"),
            Span::raw(" Dashboard  "),
        ],
        View::Results => vec![
            key("v"),
            Span::raw(" Review  "),
            key("<CR>/<Esc>"),
            Span::raw(" Dashboard  "),
        ],
        View::Review => vec![
            key("j/k"),
            Span::raw(" Scroll  "),
            key("h/<Esc>"),
            Span::raw(" Back  "),
        ],
    };

    spans.extend(vec![key("q"), Span::raw(" Quit")]);

    let help = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));

    f.render_widget(help, area);
}
