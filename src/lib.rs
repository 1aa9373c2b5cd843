//! Whole-string regular expression matching by Brzozowski derivatives.
//!
//! A pattern is parsed into nodes owned by a [`RegexStorage`]. Matching
//! derives the regex by each input byte in turn and checks whether what
//! remains accepts the empty string.
//!
//! ```
//! use deriv_match::{matches, parse, RegexStorage};
//!
//! let storage = RegexStorage::new();
//! let regex = parse(&storage, "(a|b)+").unwrap();
//! assert!(matches(&storage, regex, "aabba"));
//! assert!(!matches(&storage, regex, ""));
//! ```

use thiserror::Error;

mod arena_regex;
mod parser;

pub use arena_regex::{Re, Regex, RegexContents, RegexStorage};
pub use parser::Parser;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("`{op}` at position {pos} has nothing to repeat")]
    NothingToRepeat { op: char, pos: usize },
    #[error("unmatched `)` at position {pos}")]
    UnmatchedClose { pos: usize },
    #[error("`(` at position {pos} is never closed")]
    UnclosedGroup { pos: usize },
    #[error("escape at position {pos} has nothing to escape")]
    DanglingEscape { pos: usize },
    #[error("expression does not reduce to a single regex")]
    Malformed,
}

/// Parses `pattern` into nodes owned by `storage`.
pub fn parse<'a>(storage: &'a RegexStorage<'a>, pattern: &str) -> Result<Re<'a>, SyntaxError> {
    Parser::new(storage).parse(pattern)
}

/// Does the _entire_ text match the regex?
pub fn matches<'a>(storage: &'a RegexStorage<'a>, regex: Re<'a>, text: impl AsRef<[u8]>) -> bool {
    storage.matches(text, regex)
}

/// Parses `pattern` into a fresh storage and matches `text` against it.
pub fn is_match(pattern: &str, text: &str) -> Result<bool, SyntaxError> {
    let storage = RegexStorage::new();
    let regex = parse(&storage, pattern)?;
    Ok(storage.matches(text, regex))
}
