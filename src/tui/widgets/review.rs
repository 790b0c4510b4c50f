use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let review = app.session.review();

    let mut lines: Vec<Line> = Vec::new();
    if review.is_empty() {
        lines.push(Line::from(Span::styled(
            "Nothing answered yet",
            Style::default().fg(Color::DarkGray),
        )));
    }

    for entry in &review {
        let (mark, color) = if entry.answer.is_correct {
            ("✓", Color::Green)
        } else {
            ("✗", Color::Red)
        };

        lines.push(Line::from(vec![
            Span::styled(format!("{} ", mark), Style::default().fg(color)),
            Span::styled(
                format!("{}. {}", entry.number, entry.question.text),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
        ]));

        for opt in &entry.question.options {
            let picked = entry.answer.selected.contains(&opt.letter);
            let style = if opt.is_correct {
                Style::default().fg(Color::Green)
            } else if picked {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::Gray)
            };
            let marker = if picked { ">" } else { " " };
            lines.push(Line::from(Span::styled(
                format!("  {} {}) {}", marker, opt.letter, opt.text),
                style,
            )));
        }

        if let Some(explanation) = &entry.question.explanation {
            lines.push(Line::from(Span::styled(
                format!("    {}", explanation),
                Style::default().fg(Color::DarkGray),
            )));
        }
        lines.push(Line::from(""));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Review ({} answered) ", review.len()))
        .title_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.review_scroll, 0));

    f.render_widget(paragraph, area);
}
