//! # tally-validate
//!
//! The grading front door of TALLY.
//!
//! This crate provides:
//! - Type-dispatched answer validation over the closed `AnswerType` enum
//! - Mistake classification for incorrect numeric answers
//! - Feedback selection with an injectable phrase chooser
//! - Progressive hint indexing by attempt number
//! - The `Grader` façade tying it all together
//!
//! Every function here is total: arbitrary user-typed text produces a
//! result, never an error. The only non-determinism is praise phrase
//! selection, which sits behind [`PhraseChooser`] so tests can pin it.

use rand::Rng;

use tally_core::{approx_eq, AnswerType, ErrorKind, Problem, ValidationResult, DEFAULT_TOLERANCE};
use tally_numeric::{compare_coordinate, compare_numeric, normalize, parse_numeric};

// ============================================================================
// Feedback Tables
// ============================================================================

/// Praise phrases for a correct answer
pub const PRAISE_PHRASES: &[&str] = &[
    "Great job!",
    "Excellent work!",
    "You got it!",
    "Nicely done!",
    "Perfect!",
];

/// Feedback shown for a sign mistake
pub const SIGN_FEEDBACK: &str = "Close! Check the sign of your answer.";

/// Feedback shown for a doubled or halved answer
pub const ARITHMETIC_FEEDBACK: &str = "Check your arithmetic - your answer is off by a factor of 2.";

/// Feedback when no heuristic matched
pub const UNKNOWN_FEEDBACK: &str = "Not quite. Take another look at the problem.";

/// Source of praise phrase selection.
///
/// Production uses [`RandomChooser`]; tests use [`FirstChooser`] so
/// feedback text is deterministic and assertable.
pub trait PhraseChooser {
    /// Pick one phrase from a non-empty list
    fn choose(&self, phrases: &'static [&'static str]) -> &'static str;
}

/// Uniformly random phrase selection
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomChooser;

impl PhraseChooser for RandomChooser {
    fn choose(&self, phrases: &'static [&'static str]) -> &'static str {
        let index = rand::thread_rng().gen_range(0..phrases.len());
        phrases[index]
    }
}

/// Always picks the first phrase
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstChooser;

impl PhraseChooser for FirstChooser {
    fn choose(&self, phrases: &'static [&'static str]) -> &'static str {
        phrases[0]
    }
}

/// Fixed feedback message for an error kind
pub fn feedback_for(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::SignError => SIGN_FEEDBACK,
        ErrorKind::ArithmeticError => ARITHMETIC_FEEDBACK,
        ErrorKind::Unknown => UNKNOWN_FEEDBACK,
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Decide whether a student answer matches the correct answer.
///
/// In order: normalized exact match, normalized match against any
/// acceptable alternate, then comparison dispatched on `answer_type`.
/// Malformed input simply fails to match.
pub fn answers_match(
    student: &str,
    correct: &str,
    answer_type: AnswerType,
    acceptable_answers: &[String],
    tolerance: f64,
) -> bool {
    let normalized_student = normalize(student);
    if normalized_student == normalize(correct) {
        return true;
    }

    if acceptable_answers
        .iter()
        .any(|alternate| normalized_student == normalize(alternate))
    {
        return true;
    }

    match answer_type {
        AnswerType::Integer | AnswerType::Decimal | AnswerType::Fraction => {
            compare_numeric(student, correct, tolerance)
        }
        AnswerType::Coordinate => compare_coordinate(student, correct, tolerance),
        AnswerType::Expression => tally_algebra::compare_expressions(student, correct, tolerance),
        // Exact match only; normalization above already lowercased
        AnswerType::MultipleChoice | AnswerType::TrueFalse => false,
    }
}

// ============================================================================
// Error Classification
// ============================================================================

/// Guess what kind of mistake an incorrect answer represents.
///
/// Heuristics, applied in order when both sides parse numerically:
/// matching magnitude with opposite sign is a sign error; a x2 or x0.5
/// magnitude ratio is an arithmetic error; a declared common mistake
/// mentioning "sign" together with a negated value is also a sign
/// error. Everything else - including every symbolic mismatch - is
/// [`ErrorKind::Unknown`].
pub fn classify_error(
    student: &str,
    correct: &str,
    common_mistakes: &[String],
    tolerance: f64,
) -> ErrorKind {
    let (student_value, correct_value) = match (parse_numeric(student), parse_numeric(correct)) {
        (Some(s), Some(c)) => (s, c),
        _ => return ErrorKind::Unknown,
    };

    let opposite_sign = student_value * correct_value < 0.0;
    if opposite_sign && approx_eq(student_value.abs(), correct_value.abs(), tolerance) {
        return ErrorKind::SignError;
    }

    if correct_value != 0.0
        && (approx_eq(student_value, correct_value * 2.0, tolerance)
            || approx_eq(student_value, correct_value * 0.5, tolerance))
    {
        return ErrorKind::ArithmeticError;
    }

    let mentions_sign = common_mistakes
        .iter()
        .any(|mistake| mistake.to_lowercase().contains("sign"));
    if mentions_sign && approx_eq(student_value, -correct_value, tolerance) {
        return ErrorKind::SignError;
    }

    ErrorKind::Unknown
}

// ============================================================================
// Hints
// ============================================================================

/// Index of the hint to reveal on attempt `attempt` (1-indexed).
///
/// Progresses one hint per attempt and clamps at the last hint:
/// attempt 1 reveals hint 0, attempt N >= hint count reveals the last.
/// `None` when there are no hints at all.
pub fn hint_for_attempt(attempt: u32, hint_count: usize) -> Option<usize> {
    if hint_count == 0 || attempt == 0 {
        return None;
    }
    Some(((attempt - 1) as usize).min(hint_count - 1))
}

// ============================================================================
// Grader
// ============================================================================

/// The grading engine: validates an answer against a [`Problem`] and
/// assembles the full [`ValidationResult`].
///
/// Pure apart from praise selection, which is injected. Independent
/// calls share no state, so one `Grader` may serve concurrent callers.
pub struct Grader {
    tolerance: f64,
    chooser: Box<dyn PhraseChooser + Send + Sync>,
}

impl Default for Grader {
    fn default() -> Self {
        Self::new()
    }
}

impl Grader {
    /// Create a grader with the default tolerance and random praise
    pub fn new() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            chooser: Box::new(RandomChooser),
        }
    }

    /// Override the numeric tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Override the praise phrase chooser
    pub fn with_chooser(mut self, chooser: impl PhraseChooser + Send + Sync + 'static) -> Self {
        self.chooser = Box::new(chooser);
        self
    }

    /// Grade one answer attempt.
    ///
    /// `attempt` is the 1-indexed attempt number; when supplied and the
    /// answer is wrong, the result carries the next hint index, clamped
    /// to the problem's last hint. Correct answers never carry a hint.
    pub fn grade(
        &self,
        problem: &Problem,
        raw_answer: &str,
        attempt: Option<u32>,
    ) -> ValidationResult {
        let is_correct = answers_match(
            raw_answer,
            &problem.answer,
            problem.answer_type,
            &problem.acceptable_answers,
            self.tolerance,
        );

        if is_correct {
            return ValidationResult::correct(
                raw_answer,
                &problem.answer,
                self.chooser.choose(PRAISE_PHRASES),
            );
        }

        let kind = classify_error(
            raw_answer,
            &problem.answer,
            &problem.common_mistakes,
            self.tolerance,
        );
        let hint = attempt.and_then(|n| hint_for_attempt(n, problem.hints.len()));

        ValidationResult::incorrect(raw_answer, &problem.answer, feedback_for(kind), kind, hint)
    }
}
