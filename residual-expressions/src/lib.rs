use proc_macro2::{LexError, TokenStream};
use thiserror::Error;

mod cache;
mod expression;
mod parse;
mod predicate;

#[cfg(feature = "emit")]
mod emit;

#[cfg(feature = "dot")]
mod dot;

pub use cache::{CacheConfig, CacheStats, MemoCache};
pub use expression::{Expression, Kind};
pub use parse::Pattern;
pub use predicate::{Class, Predicate, PredicateId};

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),
    #[error("parse error: {0}")]
    Parse(#[from] syn::Error),
    #[error("no expression bound to name `{0}`")]
    Unbound(String),
}

/// parse a string to a pattern
pub fn parse_pattern(input: impl AsRef<str>) -> Result<Pattern, ParseError> {
    let stream: TokenStream = input.as_ref().parse()?;
    Ok(parse_pattern_token_stream(stream)?)
}

/// parse a rust [`TokenStream`](TokenStream) to a pattern
pub fn parse_pattern_token_stream(input: TokenStream) -> syn::Result<Pattern> {
    syn::parse2(input)
}
