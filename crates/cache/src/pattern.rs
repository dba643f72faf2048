//! Glob patterns over cache keys
//!
//! `*` matches any run of characters, `:` included, and `?` matches exactly
//! one character. There is no escape syntax: key segments built through
//! [`CacheKey`](crate::CacheKey) never contain wildcards.

use wildmatch::WildMatchPattern;

pub type KeyPattern = WildMatchPattern<'*', '?'>;

/// True if `key` contains a wildcard
pub fn is_pattern(key: &str) -> bool {
    key.contains(['*', '?'])
}

/// True if `key` matches the whole of `pattern`
pub fn key_matches(pattern: &str, key: &str) -> bool {
    KeyPattern::new(pattern).matches(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(key_matches("campaign:123:meta:status", "campaign:123:meta:status"));
        assert!(!key_matches("campaign:123:meta:status", "campaign:123:meta:statu"));
        assert!(!key_matches("campaign:123", "campaign:1234"));
    }

    #[test]
    fn test_star_spans_segments() {
        assert!(key_matches("campaign:123:*", "campaign:123:meta:status"));
        assert!(key_matches("campaign:123:*", "campaign:123:"));
        assert!(!key_matches("campaign:123:*", "campaign:1234:meta:status"));
        assert!(key_matches("*:status", "campaign:9:google:status"));
        assert!(key_matches("campaign:*:meta:*", "campaign:9:meta:insights"));
    }

    #[test]
    fn test_question_mark_is_one_char() {
        assert!(key_matches("campaign:12?:*", "campaign:123:meta:status"));
        assert!(!key_matches("campaign:12?:*", "campaign:12:meta:status"));
    }

    #[test]
    fn test_is_pattern() {
        assert!(is_pattern("campaign:*"));
        assert!(is_pattern("campaign:?"));
        assert!(!is_pattern("campaign:123:meta:status"));
    }
}
