use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use super::truncate;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let results = app.session.results();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Score
            Constraint::Min(0),    // Domain breakdown
        ])
        .split(area);

    let (verdict, color) = if results.passed {
        ("PASS", Color::Green)
    } else {
        ("FAIL", Color::Red)
    };

    let summary = vec![
        Line::from(vec![
            Span::styled("Score: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}/{}", results.score, results.total),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("  ({:.1}%)", results.percentage)),
        ]),
        Line::from(vec![
            Span::styled("Answered: ", Style::default().fg(Color::Gray)),
            Span::raw(format!("{}", results.answered)),
        ]),
        Line::from(Span::styled(
            verdict,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", results.mode))
        .title_style(Style::default().fg(Color::Cyan));
    f.render_widget(Paragraph::new(summary).block(block), chunks[0]);

    let items: Vec<ListItem> = results
        .domains
        .iter()
        .map(|d| {
            let color = if d.attempted == 0 {
                Color::DarkGray
            } else if d.correct == d.attempted {
                Color::Green
            } else {
                Color::Yellow
            };
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<40}", truncate(&d.name, 38)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format!("{}/{}", d.correct, d.attempted),
                    Style::default().fg(color),
                ),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" By Domain ")
        .title_style(Style::default().fg(Color::Yellow));
    f.render_widget(List::new(items).block(block), chunks[1]);
}
