pub mod dashboard;
pub mod question;
pub mod results;
pub mod review;

use ratatui::style::Color;

pub(crate) use crate::models::truncate;
use crate::models::MasteryStatus;

pub(crate) fn status_color(status: MasteryStatus) -> Color {
    match status {
        MasteryStatus::New => Color::Gray,
        MasteryStatus::NeedsPractice => Color::Yellow,
        MasteryStatus::Mastered => Color::Green,
    }
}

/// Four-cell bar filling one cell per correct answer up to mastery.
pub(crate) fn mastery_bar(correct: i64) -> String {
    let threshold = crate::models::MASTERY_THRESHOLD as usize;
    let filled = (correct.max(0) as usize).min(threshold);
    format!("{}{}", "█".repeat(filled), "░".repeat(threshold - filled))
}
