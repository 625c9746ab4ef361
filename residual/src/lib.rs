#![warn(missing_docs)]
//! Matching of sequences over arbitrary alphabets with Brzozowski derivatives.
//!
//! Instead of compiling an automaton up front, a match computes, element by
//! element, the *residual* expression describing what remains to be matched.
//! A sequence matches when the final residual accepts the empty sequence.
//!
//! ```rust
//! use residual::*;
//!
//! let a = literal(Predicate::equal_to('a'));
//! let expr = concat(star(any()), a);
//!
//! assert!(matches(&expr, "xxxxa".chars()));
//! assert!(!matches(&expr, "xxxxb".chars()));
//! ```
//!
//! ## This Documentation
//!
//! * Building expressions: the free constructors below, operators on [`Expression`]
//!   (`|`, `&`, `-`, `!`), [`parse_pattern`] and the [`pattern!`] macro.
//! * Matching: [`matches`] for one-off matches, [`Matcher`] for an expression
//!   matched many times (optionally through a shared [`MemoCache`]), and
//!   [`MatcherState`] for streaming input.
#![cfg_attr(docsrs, feature(doc_auto_cfg, doc_cfg))]
#![cfg_attr(not(docsrs), allow(rustdoc::broken_intra_doc_links))]
#![allow(unknown_lints)]
#![allow(unexpected_cfgs)]

use std::borrow::Borrow;

pub use residual_expressions::*;

mod config;
pub use config::MatcherConfig;

mod error;
pub use error::MatchError;

mod matcher;
pub use matcher::Matcher;

mod state;
pub use state::{MatcherState, SequenceMatcher};

/// Build an [`Expression`] from pattern syntax.
///
/// Names refer to expression variables in scope, which are cloned.
/// `0` fails, `e` accepts the empty sequence and `_` matches any element.
/// Operators, loosest first: `|`, then `&` and `-`, then juxtaposition
/// (concatenation), then prefix `~`, then postfix `*`, `+` and `?`.
///
/// ```rust
/// use residual::*;
///
/// let a = literal(Predicate::equal_to('a'));
/// let b = literal(Predicate::equal_to('b'));
///
/// let expr = pattern!(_* a (b | e));
/// assert!(matches(&expr, "xxa".chars()));
/// assert!(matches(&expr, "xab".chars()));
/// ```
#[cfg(feature = "macros")]
pub use residual_macros::pattern;

/// An expression matching nothing, not even the empty sequence.
pub fn fail<T>() -> Expression<T> {
    Expression::fail()
}

/// An expression matching only the empty sequence.
pub fn accept<T>() -> Expression<T> {
    Expression::accept()
}

/// An expression matching one element for which `predicate` holds.
pub fn literal<T>(predicate: Predicate<T>) -> Expression<T> {
    Expression::literal(predicate)
}

/// An expression matching any one element.
pub fn any<T>() -> Expression<T> {
    Expression::any()
}

/// Sequences made of a match of `a` followed by a match of `b`.
pub fn concat<T>(a: Expression<T>, b: Expression<T>) -> Expression<T> {
    a.concat(b)
}

/// Sequences matching `a` or `b`.
pub fn alternate<T>(a: Expression<T>, b: Expression<T>) -> Expression<T> {
    a.alternate(b)
}

/// Zero or more repetitions of `a`.
pub fn star<T>(a: Expression<T>) -> Expression<T> {
    a.star()
}

/// One or more repetitions of `a`.
pub fn plus<T>(a: Expression<T>) -> Expression<T> {
    a.plus()
}

/// Zero or one occurrence of `a`.
pub fn optional<T>(a: Expression<T>) -> Expression<T> {
    a.optional()
}

/// Sequences matching both `a` and `b`.
pub fn intersect<T>(a: Expression<T>, b: Expression<T>) -> Expression<T> {
    a.intersect(b)
}

/// Sequences matching `a` but not `b`.
pub fn difference<T>(a: Expression<T>, b: Expression<T>) -> Expression<T> {
    a.difference(b)
}

/// Sequences not matching `a`.
pub fn complement<T>(a: Expression<T>) -> Expression<T> {
    a.complement()
}

/// Whether `expression` matches the empty sequence.
pub fn nullable<T>(expression: &Expression<T>) -> bool {
    expression.is_nullable()
}

/// The residual of `expression` after consuming `value`.
pub fn derive<T>(expression: &Expression<T>, value: &T) -> Expression<T> {
    expression.derive(value)
}

/// Returns true if `expression` matches the whole `sequence`.
///
/// Derivatives go through a [`MemoCache`] that lives for this call only, and no
/// limits apply. See [`Matcher`] to share a cache between matches or to set limits.
pub fn matches<T, I>(expression: &Expression<T>, sequence: I) -> bool
where
    I: IntoIterator,
    I::Item: Borrow<T>,
{
    expression.matches(sequence)
}
