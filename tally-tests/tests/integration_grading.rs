//! End-to-end grading scenarios across every answer representation
//!
//! Drives the full path a practice session takes: raw student text in,
//! structured validation result out.

use tally_core::{AnswerType, ErrorKind, Problem};
use tally_tests::problem;
use tally_validate::{FirstChooser, Grader, ARITHMETIC_FEEDBACK, PRAISE_PHRASES, UNKNOWN_FEEDBACK};

fn grader() -> Grader {
    Grader::new().with_chooser(FirstChooser)
}

/// A correct expression answer in a different written order is accepted
#[test]
fn test_expression_reordered_is_correct() {
    let problem = Problem::new("e2e-expr", 3, "Simplify", "2x+1", AnswerType::Expression).unwrap();

    let result = grader().grade(&problem, "1+2x", Some(1));
    assert!(result.is_correct);
    assert_eq!(result.error_kind, None);
    assert_eq!(result.hint_to_show, None);
}

/// A wrong expression is rejected with no misleading classification
#[test]
fn test_expression_mismatch_reports_unknown() {
    let problem = Problem::new("e2e-expr", 3, "Simplify", "2x+1", AnswerType::Expression).unwrap();

    let result = grader().grade(&problem, "3x+1", Some(1));
    assert!(!result.is_correct);
    assert_eq!(result.error_kind, Some(ErrorKind::Unknown));
    assert_eq!(result.feedback, UNKNOWN_FEEDBACK);
}

/// Fraction problems accept every equivalent written form
#[test]
fn test_fraction_equivalent_forms() {
    let problem = problem("frac-1");
    let grader = grader();

    for answer in ["1 1/2", "3/2", "1.5", "1.50"] {
        let result = grader.grade(&problem, answer, Some(1));
        assert!(result.is_correct, "{answer:?} should be accepted");
    }

    // 11/2 is 5.5: dropping the space changes the value
    let result = grader.grade(&problem, "11/2", Some(1));
    assert!(!result.is_correct);
}

/// Coordinates compare component-wise and in order
#[test]
fn test_coordinate_grading() {
    let problem = problem("coord-1");
    let grader = grader();

    assert!(grader.grade(&problem, "2, 3", Some(1)).is_correct);
    assert!(grader.grade(&problem, "(2.0005, 3)", Some(1)).is_correct);
    assert!(!grader.grade(&problem, "(3, 2)", Some(1)).is_correct);
}

/// The verbatim student answer is preserved in the result
#[test]
fn test_student_answer_verbatim() {
    let result = grader().grade(&problem("int-1"), "  X = 10 ", Some(1));
    assert!(result.is_correct);
    assert_eq!(result.student_answer, "  X = 10 ");
    assert_eq!(result.correct_answer, "10");
}

/// Praise is drawn from the table via the injected chooser
#[test]
fn test_correct_feedback_is_deterministic_with_chooser() {
    let result = grader().grade(&problem("tf-1"), "TRUE", None);
    assert!(result.is_correct);
    assert_eq!(result.feedback, PRAISE_PHRASES[0]);
}

/// Hint indices progress with the attempt number and clamp at the end
#[test]
fn test_hint_progression_over_attempts() {
    let problem = problem("expr-1");
    let grader = grader();

    let expectations = [(1, Some(0)), (2, Some(1)), (3, Some(2)), (4, Some(2)), (10, Some(2))];
    for (attempt, expected) in expectations {
        let result = grader.grade(&problem, "x+2", Some(attempt));
        assert!(!result.is_correct);
        assert_eq!(result.hint_to_show, expected, "attempt {attempt}");
    }
}

/// Sign and magnitude mistakes get targeted feedback
#[test]
fn test_error_classification_end_to_end() {
    let problem = Problem::new("e2e-num", 2, "Evaluate", "5", AnswerType::Integer).unwrap();
    let grader = grader();

    let result = grader.grade(&problem, "-5", Some(1));
    assert_eq!(result.error_kind, Some(ErrorKind::SignError));

    let doubled = Problem::new("e2e-num2", 2, "Evaluate", "10", AnswerType::Integer).unwrap();
    let result = grader.grade(&doubled, "20", Some(1));
    assert_eq!(result.error_kind, Some(ErrorKind::ArithmeticError));
    assert_eq!(result.feedback, ARITHMETIC_FEEDBACK);
}

/// Garbage input grades as incorrect, never panics
#[test]
fn test_garbage_input_is_graded() {
    let grader = grader();
    for p in tally_tests::sample_problems() {
        for garbage in ["", "   ", "@#$%", "NaN", "1/0", "(((", "x="] {
            let result = grader.grade(&p, garbage, Some(1));
            assert!(!result.is_correct, "{garbage:?} accepted for {}", p.id);
        }
    }
}

/// Acceptable alternates are honored alongside the canonical answer
#[test]
fn test_acceptable_alternates() {
    let problem = Problem::new("e2e-alt", 1, "Half of one", "1/2", AnswerType::Fraction)
        .unwrap()
        .with_acceptable_answers(["one half"]);

    assert!(grader().grade(&problem, "One Half", None).is_correct);
}
