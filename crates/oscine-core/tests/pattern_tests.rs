//! Address pattern matching tests
//!
//! The message's address carries the pattern; the argument is a
//! registered literal address.

use oscine_core::{pattern, Message};

fn matches(addr_pattern: &str, registered: &str) -> bool {
    Message::new(addr_pattern)
        .matches(registered)
        .expect("match failed")
}

#[test]
fn test_exact_match() {
    assert!(matches("/path/to/method", "/path/to/method"));
}

#[test]
fn test_single_char_wildcard() {
    assert!(matches("/path/to/meth?d", "/path/to/method"));
    assert!(!matches("/path/to/meth?d", "/path/to/methood"));
}

#[test]
fn test_star_wildcard() {
    assert!(matches("/path/to/*", "/path/to/method"));
    assert!(matches("/path/*/method", "/path/to/method"));
}

#[test]
fn test_bracket_set() {
    assert!(matches("/path/to/m[aei]thod", "/path/to/method"));
    assert!(!matches("/path/to/m[aei]thod", "/path/to/mothod"));
}

#[test]
fn test_different_leaf_does_not_match() {
    assert!(!matches("/path/to/destruction", "/path/to/method"));
}

#[test]
fn test_part_count_mismatch_rejected() {
    // No trailing slash: three segments against four.
    assert!(!matches("/path/to*", "/path/to/method"));
    assert!(!matches("/path", "/path/to/method"));
}

#[test]
fn test_star_does_not_cross_separators_via_part_check() {
    // '*' would happily eat '/', but the part pre-check blocks it.
    assert!(!matches("/*", "/path/to/method"));
}

#[test]
fn test_alternation() {
    assert!(matches("/osc/{cue,scene}/fire", "/osc/cue/fire"));
    assert!(matches("/osc/{cue,scene}/fire", "/osc/scene/fire"));
    assert!(!matches("/osc/{cue,scene}/fire", "/osc/fader/fire"));
}

#[test]
fn test_registration_validation() {
    assert!(pattern::validate_address("/mixer/ch/1/gain").is_ok());
    for bad in [
        "/a*b", "/a?b", "/a,b", "/a[b", "/a]b", "/a{b", "/a}b", "/a#b", "/a b",
    ] {
        assert!(
            pattern::validate_address(bad).is_err(),
            "{bad:?} should be rejected"
        );
    }
}
