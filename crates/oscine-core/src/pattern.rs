//! OSC address pattern matching
//!
//! A message's address may use the OSC 1.0 pattern syntax: `?` for a
//! single character, `*` for any run of characters, `[...]` character
//! sets and `{a,b}` alternation. Patterns are rewritten into an
//! anchored regular expression and tested against registered literal
//! addresses.
//!
//! Registered handler keys are literal: they must not contain pattern
//! metacharacters. The glob syntax belongs to incoming messages only.

use regex_lite::Regex;

use crate::{Error, Result};

/// Characters that may not appear in a literal (registered) address.
pub const INVALID_ADDRESS_CHARS: &[char] = &['*', '?', ',', '[', ']', '{', '}', '#', ' '];

/// Reject addresses that miss the leading slash or contain pattern
/// metacharacters. Applied at registration time, not at dispatch.
pub fn validate_address(addr: &str) -> Result<()> {
    if !addr.starts_with('/') {
        return Err(Error::InvalidAddress(format!(
            "address must start with '/': {addr}"
        )));
    }
    if let Some(c) = addr.chars().find(|c| INVALID_ADDRESS_CHARS.contains(c)) {
        return Err(Error::InvalidAddress(format!(
            "disallowed character {c:?} in {addr}"
        )));
    }
    Ok(())
}

/// Compile an OSC address pattern into an anchored regex.
///
/// Substitutions, in order: `.` `(` `)` are escaped (not special in
/// OSC), `*` becomes `.*`, `{`/`,`/`}` become `(`/`|`/`)`, `?` becomes
/// `.`. Bracket sets already carry regex semantics and pass through.
/// A malformed bracket or brace expression surfaces as the regex
/// engine's compile error, verbatim.
pub fn compile(pattern: &str) -> Result<Regex> {
    let mut translated = String::with_capacity(pattern.len() + 8);
    translated.push('^');
    for c in pattern.chars() {
        match c {
            '.' | '(' | ')' => {
                translated.push('\\');
                translated.push(c);
            }
            '*' => translated.push_str(".*"),
            '{' => translated.push('('),
            ',' => translated.push('|'),
            '}' => translated.push(')'),
            '?' => translated.push('.'),
            _ => translated.push(c),
        }
    }
    translated.push('$');
    Regex::new(&translated).map_err(|e| Error::InvalidPattern(e.to_string()))
}

/// Match a message's address pattern against a literal address.
///
/// The part-count pre-check runs first and rejects without compiling
/// anything; only surviving candidates pay for the regex.
pub fn match_address(pattern: &str, address: &str) -> Result<bool> {
    if !verify_parts(pattern, address) {
        return Ok(false);
    }
    Ok(compile(pattern)?.is_match(address))
}

/// Fast segment test: both strings split on `/` must yield the same
/// number of parts, and no part beyond the leading empty one may be
/// empty. Identical strings short-circuit.
pub(crate) fn verify_parts(pattern: &str, address: &str) -> bool {
    if pattern == address {
        return true;
    }
    let p: Vec<&str> = pattern.split('/').collect();
    let a: Vec<&str> = address.split('/').collect();
    if p.len() != a.len() {
        return false;
    }
    p.iter()
        .zip(&a)
        .skip(1)
        .all(|(ps, as_)| !ps.is_empty() && !as_.is_empty())
}
