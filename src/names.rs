//! XML name validation and utilities
//!
//! This module provides lexical checks for NCNames and QNames used in schema
//! attributes, and the sanitising of names used as JSON Schema definition keys.

use once_cell::sync::Lazy;
use regex::Regex;

static NCNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\p{L}_][\p{L}\p{N}_\-\.\u{B7}\u{300}-\u{36F}\u{203F}-\u{2040}]*$")
        .expect("NCName pattern is valid")
});

/// Characters that cannot appear unescaped in a JSON pointer segment
static POINTER_UNSAFE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[~/#%\s]").expect("pointer pattern is valid"));

/// Check if a string is a valid NCName (non-colonized name)
pub fn is_valid_ncname(name: &str) -> bool {
    !name.is_empty() && NCNAME.is_match(name)
}

/// Check if a string is a valid QName (qualified name)
pub fn is_valid_qname(name: &str) -> bool {
    match name.split_once(':') {
        Some((prefix, local)) => is_valid_ncname(prefix) && is_valid_ncname(local),
        None => is_valid_ncname(name),
    }
}

/// Split a QName into prefix and local name
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    if let Some((prefix, local)) = qname.split_once(':') {
        (Some(prefix), local)
    } else {
        (None, qname)
    }
}

/// Make a name usable as a `#/definitions/<name>` pointer segment
pub fn definition_segment(name: &str) -> String {
    POINTER_UNSAFE.replace_all(name, "_").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_ncname() {
        assert!(is_valid_ncname("element"));
        assert!(is_valid_ncname("my-element"));
        assert!(is_valid_ncname("_element"));
        assert!(is_valid_ncname("été"));

        assert!(!is_valid_ncname(""));
        assert!(!is_valid_ncname("prefix:element"));
        assert!(!is_valid_ncname("123element"));
        assert!(!is_valid_ncname("-element"));
    }

    #[test]
    fn test_is_valid_qname() {
        assert!(is_valid_qname("element"));
        assert!(is_valid_qname("prefix:element"));
        assert!(is_valid_qname("xs:schema"));

        assert!(!is_valid_qname(""));
        assert!(!is_valid_qname(":element"));
        assert!(!is_valid_qname("element:"));
    }

    #[test]
    fn test_split_qname() {
        assert_eq!(split_qname("element"), (None, "element"));
        assert_eq!(split_qname("xs:element"), (Some("xs"), "element"));
    }

    #[test]
    fn test_definition_segment() {
        assert_eq!(definition_segment("bookType"), "bookType");
        assert_eq!(definition_segment("a/b~c"), "a_b_c");
    }
}
