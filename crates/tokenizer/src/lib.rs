//! Whitespace/quote-aware token scanner (spec §4.1).
//!
//! The parser crate leans on `sqlparser` for the bulk of SQL grammar, but a
//! handful of csvql extensions — `PK(col)` hints, function argument lists
//! inside `EXTRACT(WEEK FROM dt)`, and the CREATE INDEX dispatch line the CLI
//! reads before handing anything to `sqlparser` — are scanned by hand the way
//! the original C tokeniser does it. This crate is that scanner.

use std::str::FromStr;

/// Which quote character (if any) terminated a token read by
/// [`Scanner::get_quoted_token`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuoteKind {
    /// `'single quoted'` — a string literal.
    Single,
    /// `"double quoted"` — an identifier.
    Double,
    /// No quote character seen; a bare token.
    None,
}

/// Outcome of a bounded read: either the token text, or a sentinel saying
/// the token exceeded the caller's maximum length. Mirrors the original's
/// "truncate and report" contract rather than panicking on oversized input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenResult {
    Token(String),
    LengthExceeded,
    Eof,
}

/// A cursor over a caller-owned string. The scanner never copies the input
/// up front; it walks byte offsets and slices lazily.
pub struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

const CONTROL_TERMINATORS: [char; 2] = ['\0', '\n'];

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.src.len()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    /// Consumes spaces, tabs, newlines, and `--` to end-of-line comments.
    pub fn skip_whitespace(&mut self) {
        loop {
            let rest = self.rest();
            let mut chars = rest.char_indices();
            match chars.next() {
                None => return,
                Some((_, c)) if c.is_whitespace() => {
                    self.pos += c.len_utf8();
                }
                Some((_, '-')) if rest.starts_with("--") => {
                    let consumed = rest.find('\n').map(|i| i + 1).unwrap_or(rest.len());
                    self.pos += consumed;
                }
                _ => return,
            }
        }
    }

    /// Returns the next unquoted bare token, terminated by whitespace, a
    /// comma, or a control character. Parentheses and comparison operators
    /// are kept as part of the surrounding token so call sites can lex
    /// `FUNC(arg)` and `>=` without a dedicated grammar rule for them.
    pub fn get_token(&mut self, max_len: usize) -> TokenResult {
        self.skip_whitespace();
        if self.at_eof() {
            return TokenResult::Eof;
        }

        let rest = self.rest();
        let end = rest
            .char_indices()
            .find(|&(_, c)| c.is_whitespace() || c == ',' || CONTROL_TERMINATORS.contains(&c))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());

        let token = &rest[..end];
        self.pos += end;

        if token.is_empty() {
            // A lone comma or control char: return it as a one-byte token.
            return self.get_token(max_len);
        }
        if token.chars().count() > max_len {
            return TokenResult::LengthExceeded;
        }
        TokenResult::Token(token.to_string())
    }

    /// Recognises a single- or double-quoted token; falls back to a bare
    /// token (via [`Self::get_token`]) when no quote character opens it.
    /// Returns the token text (without surrounding quotes) and which kind
    /// of quoting was used.
    pub fn get_quoted_token(&mut self, max_len: usize) -> (TokenResult, QuoteKind) {
        self.skip_whitespace();
        if self.at_eof() {
            return (TokenResult::Eof, QuoteKind::None);
        }

        let quote = self.rest().chars().next().filter(|c| *c == '\'' || *c == '"');
        let Some(quote) = quote else {
            return (self.get_token(max_len), QuoteKind::None);
        };

        self.pos += 1; // consume opening quote
        let rest = self.rest();
        match rest.find(quote) {
            Some(end) => {
                let token = &rest[..end];
                self.pos += end + 1; // consume through closing quote
                let kind = if quote == '\'' {
                    QuoteKind::Single
                } else {
                    QuoteKind::Double
                };
                if token.chars().count() > max_len {
                    (TokenResult::LengthExceeded, kind)
                } else {
                    (TokenResult::Token(token.to_string()), kind)
                }
            }
            None => (TokenResult::LengthExceeded, QuoteKind::None),
        }
    }

    /// Reads a token and parses it as a signed integer.
    pub fn get_numeric_token(&mut self, max_len: usize) -> Option<i64> {
        match self.get_token(max_len) {
            TokenResult::Token(t) => i64::from_str(&t).ok(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_whitespace_and_line_comments() {
        let mut s = Scanner::new("   -- a comment\n  SELECT");
        s.skip_whitespace();
        assert_eq!(s.get_token(64), TokenResult::Token("SELECT".into()));
    }

    #[test]
    fn bare_tokens_terminate_on_whitespace_and_comma() {
        let mut s = Scanner::new("a, b c");
        assert_eq!(s.get_token(64), TokenResult::Token("a".into()));
        assert_eq!(s.get_token(64), TokenResult::Token(",".into()));
        assert_eq!(s.get_token(64), TokenResult::Token("b".into()));
        assert_eq!(s.get_token(64), TokenResult::Token("c".into()));
        assert_eq!(s.get_token(64), TokenResult::Eof);
    }

    #[test]
    fn parens_and_operators_stay_attached() {
        let mut s = Scanner::new("LEFT(name,3) >= 1");
        assert_eq!(s.get_token(64), TokenResult::Token("LEFT(name,3)".into()));
        assert_eq!(s.get_token(64), TokenResult::Token(">=".into()));
        assert_eq!(s.get_token(64), TokenResult::Token("1".into()));
    }

    #[test]
    fn quoted_tokens_report_their_kind() {
        let mut s = Scanner::new("'alice' \"name\" bob");
        assert_eq!(
            s.get_quoted_token(64),
            (TokenResult::Token("alice".into()), QuoteKind::Single)
        );
        assert_eq!(
            s.get_quoted_token(64),
            (TokenResult::Token("name".into()), QuoteKind::Double)
        );
        assert_eq!(
            s.get_quoted_token(64),
            (TokenResult::Token("bob".into()), QuoteKind::None)
        );
    }

    #[test]
    fn numeric_token_parses_signed_integer() {
        let mut s = Scanner::new("-42 abc");
        assert_eq!(s.get_numeric_token(64), Some(-42));
        assert_eq!(s.get_numeric_token(64), None);
    }

    #[test]
    fn overflowing_token_reports_length_exceeded() {
        let mut s = Scanner::new("abcdefgh");
        assert_eq!(s.get_token(4), TokenResult::LengthExceeded);
    }

    #[test]
    fn unterminated_quote_reports_length_exceeded() {
        let mut s = Scanner::new("'never closes");
        assert_eq!(s.get_quoted_token(64).0, TokenResult::LengthExceeded);
    }
}
