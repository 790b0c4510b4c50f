//! Option shuffling for display.
//!
//! Scoring always happens in canonical lettering. A shuffled presentation
//! keeps the mapping back so whatever letters the user saw are the letters
//! translated and validated on submission.

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{QuizOption, MAX_OPTIONS, OPTION_LETTERS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShuffledOptions {
    /// Options in display order, relettered A, B, C, ...
    pub options: Vec<QuizOption>,
    /// Correct letters under the display lettering.
    pub correct: BTreeSet<char>,
    /// `canonical[i]` is the original letter of the option shown at position `i`.
    canonical: Vec<char>,
}

impl ShuffledOptions {
    /// Maps display letters back to canonical ones. Letters outside the
    /// displayed range are kept as-is so they still fail the exact match.
    pub fn to_canonical(&self, selected: &BTreeSet<char>) -> BTreeSet<char> {
        selected
            .iter()
            .map(|&letter| self.canonical_letter(letter).unwrap_or(letter))
            .collect()
    }

    pub fn canonical_letter(&self, display: char) -> Option<char> {
        OPTION_LETTERS
            .iter()
            .position(|&l| l == display)
            .and_then(|i| self.canonical.get(i).copied())
    }
}

/// Shuffles options and reassigns letters in the new order.
///
/// Only defined for up to ten options; anything past `J` is dropped.
pub fn shuffle_options<R: Rng + ?Sized>(options: &[QuizOption], rng: &mut R) -> ShuffledOptions {
    let mut shuffled: Vec<&QuizOption> = options.iter().take(MAX_OPTIONS).collect();
    shuffled.shuffle(rng);

    let mut new_options = Vec::with_capacity(shuffled.len());
    let mut correct = BTreeSet::new();
    let mut canonical = Vec::with_capacity(shuffled.len());

    for (opt, &letter) in shuffled.into_iter().zip(OPTION_LETTERS.iter()) {
        if opt.is_correct {
            correct.insert(letter);
        }
        canonical.push(opt.letter);
        new_options.push(QuizOption::new(letter, opt.text.clone(), opt.is_correct));
    }

    ShuffledOptions {
        options: new_options,
        correct,
        canonical,
    }
}
