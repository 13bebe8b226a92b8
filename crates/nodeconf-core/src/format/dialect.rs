//! The characters that give a line its meaning.
//!
//! The daemon's configuration format uses `=` between a key and its value and
//! accepts both `#` and `;` as comment markers.  A backslash escapes the next
//! character, so `a\=b=c` has the key `a\=b`.

/// Character sets recognized by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialect {
    /// Characters that separate a key from its value.  The first unescaped
    /// occurrence on a line wins.
    pub delimiters: Vec<char>,
    /// Characters that start a comment when they are the first non-blank
    /// character of a line (or follow a section header).
    pub comment_indicators: Vec<char>,
    /// Character that makes the following character literal.
    pub escape: Option<char>,
}

impl Default for Dialect {
    /// | Field                | Default      |
    /// |----------------------|--------------|
    /// | `delimiters`         | `=`          |
    /// | `comment_indicators` | `#`, `;`     |
    /// | `escape`             | `\`          |
    fn default() -> Self {
        Self {
            delimiters: vec!['='],
            comment_indicators: vec!['#', ';'],
            escape: Some('\\'),
        }
    }
}

impl Dialect {
    pub fn is_comment_indicator(&self, c: char) -> bool {
        self.comment_indicators.contains(&c)
    }

    /// Returns the byte offset and length of the first unescaped delimiter.
    pub fn find_delimiter(&self, text: &str) -> Option<(usize, usize)> {
        let mut escaped = false;
        for (idx, c) in text.char_indices() {
            if escaped {
                escaped = false;
                continue;
            }
            if Some(c) == self.escape {
                escaped = true;
                continue;
            }
            if self.delimiters.contains(&c) {
                return Some((idx, c.len_utf8()));
            }
        }
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_delimiter_returns_first_occurrence() {
        let dialect = Dialect::default();
        assert_eq!(dialect.find_delimiter("a=b=c"), Some((1, 1)));
    }

    #[test]
    fn test_find_delimiter_skips_escaped_character() {
        let dialect = Dialect::default();
        assert_eq!(dialect.find_delimiter(r"a\=b=c"), Some((4, 1)));
    }

    #[test]
    fn test_find_delimiter_returns_none_without_separator() {
        let dialect = Dialect::default();
        assert_eq!(dialect.find_delimiter("addressindex"), None);
    }

    #[test]
    fn test_custom_delimiter_set() {
        let dialect = Dialect {
            delimiters: vec!['=', ':'],
            ..Dialect::default()
        };
        assert_eq!(dialect.find_delimiter("key: value"), Some((3, 1)));
    }

    #[test]
    fn test_default_comment_indicators() {
        let dialect = Dialect::default();
        assert!(dialect.is_comment_indicator('#'));
        assert!(dialect.is_comment_indicator(';'));
        assert!(!dialect.is_comment_indicator('/'));
    }
}
