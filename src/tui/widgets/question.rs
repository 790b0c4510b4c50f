use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::{mastery_bar, status_color};
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let (Some(question), Some(shuffled)) = (app.session.current_question(), &app.shuffled) else {
        let empty = Paragraph::new("No question to show")
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(empty, area);
        return;
    };

    let feedback_height = if app.feedback.is_some() { 9 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),                  // Question + options
            Constraint::Length(feedback_height), // Feedback
        ])
        .split(area);

    let mut lines = vec![
        Line::from(Span::styled(
            question.text.clone(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    if app.feedback.is_none() && app.session.current_answered() {
        lines.push(Line::from(Span::styled(
            "Already answered, press n to continue",
            Style::default().fg(Color::Magenta),
        )));
    } else if question.is_multi_select() {
        lines.push(Line::from(Span::styled(
            format!("Select {}", question.correct_letters().len()),
            Style::default().fg(Color::DarkGray),
        )));
    }

    for opt in &shuffled.options {
        let picked = app.selection.contains(&opt.letter);
        let marker = if picked { "[x]" } else { "[ ]" };

        // Once answered, colour the key and any wrong picks.
        let style = match &app.feedback {
            Some(_) if shuffled.correct.contains(&opt.letter) => Style::default().fg(Color::Green),
            Some(_) if picked => Style::default().fg(Color::Red),
            _ if picked => Style::default().fg(Color::Yellow),
            _ => Style::default().fg(Color::White),
        };

        lines.push(Line::from(vec![
            Span::styled(format!("{} ", marker), style),
            Span::styled(
                format!("{}) ", opt.letter),
                style.add_modifier(Modifier::BOLD),
            ),
            Span::styled(opt.text.clone(), style),
        ]));
    }

    let title = format!(
        " Question {}/{} [{}] ",
        app.session.current_index() + 1,
        app.session.total(),
        question.domain
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_style(Style::default().fg(Color::Cyan));

    f.render_widget(
        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false }),
        chunks[0],
    );

    if app.feedback.is_some() {
        draw_feedback(f, app, chunks[1]);
    }
}

fn draw_feedback(f: &mut Frame, app: &App, area: Rect) {
    let (Some(feedback), Some(shuffled)) = (&app.feedback, &app.shuffled) else {
        return;
    };

    let (verdict, color) = if feedback.is_correct {
        ("Correct!", Color::Green)
    } else {
        ("Incorrect", Color::Red)
    };
    let answer: Vec<String> = shuffled.correct.iter().map(|c| c.to_string()).collect();
    let status = feedback.mastery.status();

    let mut lines = vec![
        Line::from(vec![
            Span::styled(verdict, Style::default().fg(color).add_modifier(Modifier::BOLD)),
            Span::raw(format!("  Answer: {}", answer.join(", "))),
        ]),
        Line::from(vec![
            Span::styled("Mastery ", Style::default().fg(Color::Gray)),
            Span::styled(
                mastery_bar(feedback.mastery.correct),
                Style::default().fg(Color::Green),
            ),
            Span::styled(
                format!(" {} ", status.label()),
                Style::default().fg(status_color(status)),
            ),
            Span::styled(
                format!(
                    "({} correct, {} incorrect)",
                    feedback.mastery.correct, feedback.mastery.incorrect
                ),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
    ];
    if !feedback.explanation.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(feedback.explanation.clone()));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Feedback ")
        .title_style(Style::default().fg(color));

    f.render_widget(
        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: true }),
        area,
    );
}
