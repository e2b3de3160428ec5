//! # tally-algebra
//!
//! Symbolic core of the TALLY grading engine.
//!
//! This crate provides:
//! - Implicit-multiplication and exponent-shorthand rewriting
//! - Tokenization of flat algebraic expressions
//! - Term parsing and like-term combination into canonical form
//! - Expression equivalence, symbolic first with a sampled-numeric
//!   fallback
//! - A restricted recursive-descent evaluator over a closed grammar
//!
//! # Limitation
//!
//! The symbolic path treats `+`/`-` as top-level term separators and
//! does not expand parenthesized products: `(x+1)(x-1)` has no flat
//! term form. Such inputs fail term parsing and are compared by the
//! numeric fallback, which evaluates both sides (nested parentheses
//! included) at fixed substitution points.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::iter::Peekable;
use std::str::Chars;
use thiserror::Error;

use tally_core::approx_eq;

/// Digit directly followed by a letter or open paren: `2x`, `5(`
static DIGIT_TIMES: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d)([a-z(])").unwrap());

/// Letter directly followed by a digit is exponent shorthand: `x2`
static EXPONENT_SHORTHAND: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z])(\d)").unwrap());

/// Adjacent letters multiply: `xy`
static ADJACENT_LETTERS: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z])([a-z])").unwrap());

/// Back-to-back parenthesized groups multiply: `)(`
static PAREN_PRODUCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\)\(").unwrap());

/// Substitution points used by the numeric equivalence fallback
pub const SAMPLE_POINTS: [(f64, f64); 4] = [(1.0, 1.0), (2.0, 3.0), (-1.0, 2.0), (0.5, -1.0)];

// ============================================================================
// Tokenizer
// ============================================================================

/// One token of a flat algebraic expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Token {
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    OpenParen,
    CloseParen,
    /// Run of alphanumerics, possibly carrying a folded-in leading sign
    Operand(String),
}

/// Make implicit multiplication and exponentiation explicit.
///
/// Lowercases, removes whitespace, then applies the ordered rewrite
/// passes: `2x` → `2*x`, `x2` → `x^2`, `xy` → `x*y`, `)(` → `)*(`.
/// Purely textual; no structure is built here.
pub fn rewrite_implicit(expr: &str) -> String {
    let compact: String = expr
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    let mut s = DIGIT_TIMES.replace_all(&compact, "$1*$2").into_owned();
    s = EXPONENT_SHORTHAND.replace_all(&s, "$1^$2").into_owned();
    // Non-overlapping matches skip every other letter in a run, so
    // repeat until the pass stops changing anything
    while ADJACENT_LETTERS.is_match(&s) {
        s = ADJACENT_LETTERS.replace_all(&s, "$1*$2").into_owned();
    }
    PAREN_PRODUCT.replace_all(&s, ")*(").into_owned()
}

/// Split an expression into operator and operand tokens.
///
/// A `-` at the start of input, after another operator, or after an
/// open paren is folded into the following operand as its sign rather
/// than emitted as a binary operator. Returns `None` on any character
/// outside the expression alphabet.
pub fn tokenize(expr: &str) -> Option<Vec<Token>> {
    let rewritten = rewrite_implicit(expr);
    let mut tokens: Vec<Token> = Vec::new();
    let mut chars = rewritten.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                let unary = matches!(
                    tokens.last(),
                    None | Some(Token::Plus)
                        | Some(Token::Minus)
                        | Some(Token::Star)
                        | Some(Token::Slash)
                        | Some(Token::Caret)
                        | Some(Token::OpenParen)
                );
                if unary {
                    let operand = take_operand(&mut chars);
                    if operand.is_empty() {
                        tokens.push(Token::Minus);
                    } else {
                        tokens.push(Token::Operand(format!("-{operand}")));
                    }
                } else {
                    tokens.push(Token::Minus);
                }
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '^' => {
                chars.next();
                tokens.push(Token::Caret);
            }
            '(' => {
                chars.next();
                tokens.push(Token::OpenParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::CloseParen);
            }
            c if c.is_ascii_alphanumeric() || c == '.' => {
                let operand = take_operand(&mut chars);
                tokens.push(Token::Operand(operand));
            }
            _ => return None,
        }
    }

    Some(tokens)
}

fn take_operand(chars: &mut Peekable<Chars>) -> String {
    let mut operand = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_alphanumeric() || c == '.' {
            operand.push(c);
            chars.next();
        } else {
            break;
        }
    }
    operand
}

// ============================================================================
// Terms and Canonical Form
// ============================================================================

/// One monomial: a signed coefficient times variables with integer
/// exponents. Exponents of zero are removed as they arise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub coefficient: f64,
    pub variables: BTreeMap<String, i32>,
}

impl Term {
    /// Canonical variable signature: sorted, exponent-annotated
    /// concatenation, e.g. `x^2y` for x²y. The empty string is the
    /// signature of a pure constant.
    pub fn signature(&self) -> String {
        let mut signature = String::new();
        for (variable, exponent) in &self.variables {
            if *exponent == 1 {
                signature.push_str(variable);
            } else {
                signature.push_str(&format!("{variable}^{exponent}"));
            }
        }
        signature
    }
}

/// Combined like-term map: canonical signature to summed coefficient
pub type CanonicalExpression = BTreeMap<String, f64>;

/// Parse one `+`/`-`-separated term substring (as tokens) into a
/// [`Term`]. The grammar is a flat product: operands joined by `*` or
/// `/`, each with an optional integer exponent. Division only by a
/// numeric factor; anything else is outside the flat form.
fn parse_term(tokens: &[Token]) -> Option<Term> {
    let mut coefficient = 1.0;
    let mut variables: BTreeMap<String, i32> = BTreeMap::new();
    let mut iter = tokens.iter().peekable();
    let mut expect_factor = true;
    let mut divide_next = false;

    while let Some(token) = iter.next() {
        match token {
            Token::Operand(text) => {
                if !expect_factor {
                    return None;
                }
                let mut exponent = 1i32;
                if let Some(Token::Caret) = iter.peek() {
                    iter.next();
                    match iter.next() {
                        Some(Token::Operand(raw)) => exponent = raw.parse().ok()?,
                        _ => return None,
                    }
                }
                apply_factor(text, exponent, divide_next, &mut coefficient, &mut variables)?;
                divide_next = false;
                expect_factor = false;
            }
            Token::Star => {
                if expect_factor {
                    return None;
                }
                expect_factor = true;
            }
            Token::Slash => {
                if expect_factor {
                    return None;
                }
                expect_factor = true;
                divide_next = true;
            }
            _ => return None,
        }
    }

    if expect_factor {
        return None;
    }
    Some(Term {
        coefficient,
        variables,
    })
}

/// Fold one factor into the running coefficient / variable map
fn apply_factor(
    text: &str,
    exponent: i32,
    divide: bool,
    coefficient: &mut f64,
    variables: &mut BTreeMap<String, i32>,
) -> Option<()> {
    let (sign, body) = match text.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, text),
    };
    if body.is_empty() {
        return None;
    }

    if body.chars().all(|c| c.is_ascii_alphabetic()) {
        // Dividing by a variable has no flat term form
        if divide {
            return None;
        }
        *coefficient *= sign;
        let entry = variables.entry(body.to_string()).or_insert(0);
        *entry += exponent;
        if *entry == 0 {
            variables.remove(body);
        }
        Some(())
    } else {
        let value: f64 = body.parse().ok()?;
        let value = (sign * value).powi(exponent);
        if divide {
            if value == 0.0 {
                return None;
            }
            *coefficient /= value;
        } else {
            *coefficient *= value;
        }
        Some(())
    }
}

/// Parse an expression into its canonical like-term map.
///
/// Splits the token stream on top-level `+`/`-`, parses each term,
/// groups by canonical signature summing coefficients, and drops
/// groups whose combined coefficient is within `tolerance` of zero.
/// Returns `None` when any term falls outside the flat grammar
/// (nested parentheses, division by a variable, malformed input).
pub fn canonicalize(expr: &str, tolerance: f64) -> Option<CanonicalExpression> {
    let tokens = tokenize(expr)?;
    if tokens.is_empty() {
        return None;
    }

    let mut terms: Vec<(f64, Vec<Token>)> = Vec::new();
    let mut current: Vec<Token> = Vec::new();
    let mut sign = 1.0;
    for token in tokens {
        match token {
            Token::Plus | Token::Minus => {
                let flip = token == Token::Minus;
                if current.is_empty() {
                    // Leading operator, e.g. the `-` of `- x + 1`
                    if flip {
                        sign = -sign;
                    }
                } else {
                    terms.push((sign, std::mem::take(&mut current)));
                    sign = if flip { -1.0 } else { 1.0 };
                }
            }
            other => current.push(other),
        }
    }
    if current.is_empty() {
        return None;
    }
    terms.push((sign, current));

    let mut combined = CanonicalExpression::new();
    for (sign, term_tokens) in terms {
        let term = parse_term(&term_tokens)?;
        *combined.entry(term.signature()).or_insert(0.0) += sign * term.coefficient;
    }
    combined.retain(|_, coefficient| coefficient.abs() > tolerance);
    Some(combined)
}

/// Compare two canonical maps signature-by-signature within
/// `tolerance`. A signature absent on one side counts as coefficient
/// zero, so `x + 0y` equals `x`.
pub fn canonical_eq(a: &CanonicalExpression, b: &CanonicalExpression, tolerance: f64) -> bool {
    let signatures: BTreeSet<&String> = a.keys().chain(b.keys()).collect();
    signatures.into_iter().all(|signature| {
        let ca = a.get(signature).copied().unwrap_or(0.0);
        let cb = b.get(signature).copied().unwrap_or(0.0);
        approx_eq(ca, cb, tolerance)
    })
}

// ============================================================================
// Restricted Evaluator
// ============================================================================

/// Errors from the restricted numeric evaluator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Division by zero")]
    DivisionByZero,

    #[error("Unexpected character '{0}'")]
    UnexpectedChar(char),

    #[error("Unexpected end of expression")]
    UnexpectedEnd,

    #[error("Unbound variable: {0}")]
    UnboundVariable(String),

    #[error("Malformed number: {0}")]
    MalformedNumber(String),
}

/// Result type for evaluator operations
pub type EvalResult<T> = Result<T, EvalError>;

/// Numeric evaluator over the closed grammar
/// `expr := term (('+'|'-') term)*`,
/// `term := unary (('*'|'/') unary)*`,
/// `unary := '-'* power`,
/// `power := atom ('^' unary)?`,
/// `atom := number | variable | '(' expr ')'`.
///
/// Student text is parsed by this evaluator directly; no host-language
/// evaluation of any kind takes place, and any character outside the
/// grammar is a typed error.
#[derive(Debug, Default, Clone)]
pub struct Evaluator {
    bindings: HashMap<String, f64>,
}

impl Evaluator {
    /// Create an evaluator with no variable bindings
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a variable to a value (names are case-normalized)
    pub fn bind(&mut self, name: impl Into<String>, value: f64) {
        self.bindings.insert(name.into().to_lowercase(), value);
    }

    /// Evaluate an expression string to a number.
    ///
    /// Implicit multiplication is rewritten first, so `"2x"` works
    /// whenever `x` is bound.
    pub fn evaluate(&self, expr: &str) -> EvalResult<f64> {
        let rewritten = rewrite_implicit(expr);
        let mut parser = ExprParser {
            chars: rewritten.chars().peekable(),
            bindings: &self.bindings,
        };
        let value = parser.expr()?;
        match parser.chars.next() {
            Some(c) => Err(EvalError::UnexpectedChar(c)),
            None => Ok(value),
        }
    }
}

struct ExprParser<'a> {
    chars: Peekable<Chars<'a>>,
    bindings: &'a HashMap<String, f64>,
}

impl ExprParser<'_> {
    fn expr(&mut self) -> EvalResult<f64> {
        let mut value = self.term()?;
        loop {
            match self.chars.peek() {
                Some('+') => {
                    self.chars.next();
                    value += self.term()?;
                }
                Some('-') => {
                    self.chars.next();
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> EvalResult<f64> {
        let mut value = self.unary()?;
        loop {
            match self.chars.peek() {
                Some('*') => {
                    self.chars.next();
                    value *= self.unary()?;
                }
                Some('/') => {
                    self.chars.next();
                    let divisor = self.unary()?;
                    if divisor == 0.0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    value /= divisor;
                }
                _ => return Ok(value),
            }
        }
    }

    fn unary(&mut self) -> EvalResult<f64> {
        if self.chars.peek() == Some(&'-') {
            self.chars.next();
            Ok(-self.unary()?)
        } else {
            self.power()
        }
    }

    fn power(&mut self) -> EvalResult<f64> {
        let base = self.atom()?;
        if self.chars.peek() == Some(&'^') {
            self.chars.next();
            let exponent = self.unary()?;
            Ok(base.powf(exponent))
        } else {
            Ok(base)
        }
    }

    fn atom(&mut self) -> EvalResult<f64> {
        match self.chars.peek().copied() {
            Some('(') => {
                self.chars.next();
                let value = self.expr()?;
                match self.chars.next() {
                    Some(')') => Ok(value),
                    Some(c) => Err(EvalError::UnexpectedChar(c)),
                    None => Err(EvalError::UnexpectedEnd),
                }
            }
            Some(c) if c.is_ascii_digit() || c == '.' => {
                let mut number = String::new();
                while let Some(&c) = self.chars.peek() {
                    if c.is_ascii_digit() || c == '.' {
                        number.push(c);
                        self.chars.next();
                    } else {
                        break;
                    }
                }
                number
                    .parse()
                    .map_err(|_| EvalError::MalformedNumber(number))
            }
            Some(c) if c.is_ascii_alphabetic() => {
                let mut name = String::new();
                while let Some(&c) = self.chars.peek() {
                    if c.is_ascii_alphabetic() {
                        name.push(c);
                        self.chars.next();
                    } else {
                        break;
                    }
                }
                self.bindings
                    .get(&name)
                    .copied()
                    .ok_or(EvalError::UnboundVariable(name))
            }
            Some(c) => Err(EvalError::UnexpectedChar(c)),
            None => Err(EvalError::UnexpectedEnd),
        }
    }
}

// ============================================================================
// Equivalence
// ============================================================================

/// Decide whether two expressions are equivalent.
///
/// Symbolic comparison of canonical term maps runs first. When either
/// side has no flat term form, both raw expressions are evaluated at
/// the fixed [`SAMPLE_POINTS`]; points where either side fails to
/// evaluate are skipped, at least one point must succeed on both
/// sides, and every successful point must agree within `tolerance`.
/// Ill-formed input is never an error, only a non-match.
pub fn compare_expressions(a: &str, b: &str, tolerance: f64) -> bool {
    match (canonicalize(a, tolerance), canonicalize(b, tolerance)) {
        (Some(ca), Some(cb)) => canonical_eq(&ca, &cb, tolerance),
        _ => numeric_fallback(a, b, tolerance),
    }
}

fn numeric_fallback(a: &str, b: &str, tolerance: f64) -> bool {
    let mut matched = 0usize;
    for (x, y) in SAMPLE_POINTS {
        let mut evaluator = Evaluator::new();
        evaluator.bind("x", x);
        evaluator.bind("y", y);
        match (evaluator.evaluate(a), evaluator.evaluate(b)) {
            (Ok(va), Ok(vb)) if va.is_finite() && vb.is_finite() => {
                if !approx_eq(va, vb, tolerance) {
                    return false;
                }
                matched += 1;
            }
            // This substitution point failed on one side; try the next
            _ => {}
        }
    }
    matched > 0
}
