//! # tally-core
//!
//! Shared vocabulary for the TALLY answer-grading engine.
//!
//! This crate provides:
//! - The `Problem` record consumed read-only by the grader
//! - The closed `AnswerType` enum that drives comparison dispatch
//! - The `ValidationResult` record handed back to callers
//! - Error-kind tags for mistake classification
//! - The shared numeric tolerance and comparison helper
//!
//! Everything here is plain data: no parsing, no comparison logic.
//! The grading subsystems (`tally-numeric`, `tally-algebra`,
//! `tally-validate`) build on these types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

/// Default absolute tolerance for treating two numeric values as equal
pub const DEFAULT_TOLERANCE: f64 = 0.001;

/// Lowest difficulty tier a problem may carry
pub const MIN_TIER: u8 = 1;

/// Highest difficulty tier a problem may carry
pub const MAX_TIER: u8 = 5;

/// Check whether two values agree within an absolute tolerance
pub fn approx_eq(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised while constructing a `Problem`
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ProblemError {
    #[error("Tier {0} is outside the supported range {MIN_TIER}..={MAX_TIER}")]
    TierOutOfRange(u8),

    #[error("Problem id must not be empty")]
    EmptyId,

    #[error("Canonical answer must not be empty")]
    EmptyAnswer,
}

/// Result type for problem construction
pub type ProblemResult<T> = Result<T, ProblemError>;

// ============================================================================
// Answer Types
// ============================================================================

/// The representation a problem expects its answer in.
///
/// Dispatch over this enum is exhaustive everywhere: adding a variant
/// forces every comparison site to be updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerType {
    /// Whole number, e.g. `"42"`
    Integer,
    /// Decimal number, e.g. `"3.75"`
    Decimal,
    /// Fraction or mixed number, e.g. `"3/4"` or `"1 1/2"`
    Fraction,
    /// Algebraic expression, e.g. `"2x + 1"`
    Expression,
    /// Ordered pair, e.g. `"(3, 4)"`
    Coordinate,
    /// Choice letter, e.g. `"b"`
    MultipleChoice,
    /// `"true"` or `"false"`
    TrueFalse,
}

// ============================================================================
// Problem Record
// ============================================================================

/// Immutable description of a single exercise.
///
/// Produced by the generation/import collaborators; this engine only
/// reads it. Hints are progressive: index 0 is the gentlest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    /// Unique identifier
    pub id: String,
    /// Difficulty tier, 1 (easiest) through 5
    pub tier: u8,
    /// Problem statement shown to the student
    pub statement: String,
    /// Canonical answer string
    pub answer: String,
    /// Expected answer representation
    pub answer_type: AnswerType,
    /// Alternate answer strings that are also accepted
    #[serde(default)]
    pub acceptable_answers: Vec<String>,
    /// Ordered worked-solution steps
    #[serde(default)]
    pub solution_steps: Vec<String>,
    /// Progressive hints, gentlest first (1-3 entries)
    #[serde(default)]
    pub hints: Vec<String>,
    /// Descriptions of mistakes students commonly make here
    #[serde(default)]
    pub common_mistakes: Vec<String>,
}

impl Problem {
    /// Create a problem with the required fields; optional lists start empty
    pub fn new(
        id: impl Into<String>,
        tier: u8,
        statement: impl Into<String>,
        answer: impl Into<String>,
        answer_type: AnswerType,
    ) -> ProblemResult<Self> {
        let id = id.into();
        let answer = answer.into();

        if id.is_empty() {
            return Err(ProblemError::EmptyId);
        }
        if answer.is_empty() {
            return Err(ProblemError::EmptyAnswer);
        }
        if !(MIN_TIER..=MAX_TIER).contains(&tier) {
            return Err(ProblemError::TierOutOfRange(tier));
        }

        Ok(Self {
            id,
            tier,
            statement: statement.into(),
            answer,
            answer_type,
            acceptable_answers: Vec::new(),
            solution_steps: Vec::new(),
            hints: Vec::new(),
            common_mistakes: Vec::new(),
        })
    }

    /// Attach alternate accepted answers
    pub fn with_acceptable_answers<I, S>(mut self, answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.acceptable_answers = answers.into_iter().map(Into::into).collect();
        self
    }

    /// Attach worked-solution steps
    pub fn with_solution_steps<I, S>(mut self, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.solution_steps = steps.into_iter().map(Into::into).collect();
        self
    }

    /// Attach progressive hints
    pub fn with_hints<I, S>(mut self, hints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hints = hints.into_iter().map(Into::into).collect();
        self
    }

    /// Attach common-mistake descriptions
    pub fn with_common_mistakes<I, S>(mut self, mistakes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.common_mistakes = mistakes.into_iter().map(Into::into).collect();
        self
    }
}

// ============================================================================
// Validation Output
// ============================================================================

/// Classification of an incorrect answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Magnitude matches but the sign is flipped
    SignError,
    /// Off by a factor of 2 (doubled or halved)
    ArithmeticError,
    /// No heuristic matched
    Unknown,
}

/// Outcome of grading one answer attempt.
///
/// Constructed once per validation call and never mutated afterwards.
/// `hint_to_show`, when present, is a valid index into the originating
/// problem's hint list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the answer was accepted
    pub is_correct: bool,
    /// The student's answer, verbatim as submitted
    pub student_answer: String,
    /// The canonical correct answer
    pub correct_answer: String,
    /// Feedback message for the student
    pub feedback: String,
    /// Mistake classification, populated only on incorrect answers
    pub error_kind: Option<ErrorKind>,
    /// Zero-based index of the next hint to reveal, if any
    pub hint_to_show: Option<usize>,
}

impl ValidationResult {
    /// Build a result for an accepted answer
    pub fn correct(
        student_answer: impl Into<String>,
        correct_answer: impl Into<String>,
        feedback: impl Into<String>,
    ) -> Self {
        Self {
            is_correct: true,
            student_answer: student_answer.into(),
            correct_answer: correct_answer.into(),
            feedback: feedback.into(),
            error_kind: None,
            hint_to_show: None,
        }
    }

    /// Build a result for a rejected answer
    pub fn incorrect(
        student_answer: impl Into<String>,
        correct_answer: impl Into<String>,
        feedback: impl Into<String>,
        error_kind: ErrorKind,
        hint_to_show: Option<usize>,
    ) -> Self {
        Self {
            is_correct: false,
            student_answer: student_answer.into(),
            correct_answer: correct_answer.into(),
            feedback: feedback.into(),
            error_kind: Some(error_kind),
            hint_to_show,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =====================================================
    // Construction
    // =====================================================

    #[test]
    fn test_problem_new_valid() {
        let problem = Problem::new("p1", 2, "What is 2 + 3?", "5", AnswerType::Integer).unwrap();
        assert_eq!(problem.id, "p1");
        assert_eq!(problem.tier, 2);
        assert!(problem.hints.is_empty());
        assert!(problem.acceptable_answers.is_empty());
    }

    #[test]
    fn test_problem_tier_out_of_range() {
        let err = Problem::new("p1", 0, "s", "5", AnswerType::Integer).unwrap_err();
        assert_eq!(err, ProblemError::TierOutOfRange(0));

        let err = Problem::new("p1", 6, "s", "5", AnswerType::Integer).unwrap_err();
        assert_eq!(err, ProblemError::TierOutOfRange(6));
    }

    #[test]
    fn test_problem_empty_fields_rejected() {
        assert_eq!(
            Problem::new("", 1, "s", "5", AnswerType::Integer).unwrap_err(),
            ProblemError::EmptyId
        );
        assert_eq!(
            Problem::new("p1", 1, "s", "", AnswerType::Integer).unwrap_err(),
            ProblemError::EmptyAnswer
        );
    }

    #[test]
    fn test_problem_builders() {
        let problem = Problem::new("p2", 3, "Solve for x: 2x = 6", "3", AnswerType::Integer)
            .unwrap()
            .with_hints(["Divide both sides by 2"])
            .with_acceptable_answers(["x=3"])
            .with_solution_steps(["2x = 6", "x = 6 / 2", "x = 3"])
            .with_common_mistakes(["Forgetting to divide"]);

        assert_eq!(problem.hints.len(), 1);
        assert_eq!(problem.acceptable_answers, vec!["x=3"]);
        assert_eq!(problem.solution_steps.len(), 3);
        assert_eq!(problem.common_mistakes.len(), 1);
    }

    // =====================================================
    // Tolerance helper
    // =====================================================

    #[test]
    fn test_approx_eq() {
        assert!(approx_eq(1.0, 1.0005, DEFAULT_TOLERANCE));
        assert!(approx_eq(1.0005, 1.0, DEFAULT_TOLERANCE));
        assert!(!approx_eq(1.0, 1.01, DEFAULT_TOLERANCE));
        assert!(approx_eq(-2.0, -2.0, DEFAULT_TOLERANCE));
    }

    // =====================================================
    // Serialization
    // =====================================================

    #[test]
    fn test_answer_type_serde_tags() {
        assert_eq!(
            serde_json::to_string(&AnswerType::MultipleChoice).unwrap(),
            "\"multiple_choice\""
        );
        assert_eq!(
            serde_json::from_str::<AnswerType>("\"true_false\"").unwrap(),
            AnswerType::TrueFalse
        );
    }

    #[test]
    fn test_error_kind_serde_tags() {
        assert_eq!(
            serde_json::to_string(&ErrorKind::SignError).unwrap(),
            "\"sign_error\""
        );
        assert_eq!(
            serde_json::from_str::<ErrorKind>("\"arithmetic_error\"").unwrap(),
            ErrorKind::ArithmeticError
        );
    }

    #[test]
    fn test_problem_roundtrip_with_defaults() {
        // Optional lists may be absent in imported records
        let json = r#"{
            "id": "imported-1",
            "tier": 4,
            "statement": "Simplify 3x + 2x",
            "answer": "5x",
            "answer_type": "expression"
        }"#;

        let problem: Problem = serde_json::from_str(json).unwrap();
        assert_eq!(problem.answer_type, AnswerType::Expression);
        assert!(problem.hints.is_empty());

        let back = serde_json::to_string(&problem).unwrap();
        let again: Problem = serde_json::from_str(&back).unwrap();
        assert_eq!(problem, again);
    }

    #[test]
    fn test_validation_result_constructors() {
        let ok = ValidationResult::correct("5", "5", "Great job!");
        assert!(ok.is_correct);
        assert_eq!(ok.error_kind, None);
        assert_eq!(ok.hint_to_show, None);

        let bad = ValidationResult::incorrect("-5", "5", "Check your signs.", ErrorKind::SignError, Some(0));
        assert!(!bad.is_correct);
        assert_eq!(bad.error_kind, Some(ErrorKind::SignError));
        assert_eq!(bad.hint_to_show, Some(0));
    }
}
