//! Shared fixtures for TALLY integration tests

use tally_core::{AnswerType, Problem};

/// A small bank of problems covering every answer representation
pub fn sample_problems() -> Vec<Problem> {
    vec![
        Problem::new("int-1", 1, "What is 6 + 4?", "10", AnswerType::Integer)
            .unwrap()
            .with_hints(["Count up from 6"]),
        Problem::new("dec-1", 2, "What is 1.5 + 2.25?", "3.75", AnswerType::Decimal).unwrap(),
        Problem::new("frac-1", 2, "Add 1/2 and 1", "1 1/2", AnswerType::Fraction)
            .unwrap()
            .with_acceptable_answers(["3/2", "1.5"]),
        Problem::new("coord-1", 3, "Where do y=x+1 and y=3 meet?", "(2, 3)", AnswerType::Coordinate)
            .unwrap()
            .with_hints(["Set the equations equal", "x + 1 = 3"]),
        Problem::new("expr-1", 4, "Simplify x + x + 1", "2x+1", AnswerType::Expression)
            .unwrap()
            .with_hints(["Combine like terms", "x + x is 2x", "The constant stays"]),
        Problem::new("mc-1", 1, "Which is prime? a) 4 b) 7 c) 9", "b", AnswerType::MultipleChoice)
            .unwrap(),
        Problem::new("tf-1", 1, "7 is prime.", "true", AnswerType::TrueFalse).unwrap(),
    ]
}

/// Fetch one fixture problem by id
pub fn problem(id: &str) -> Problem {
    sample_problems()
        .into_iter()
        .find(|p| p.id == id)
        .unwrap_or_else(|| panic!("no fixture problem with id {id:?}"))
}
