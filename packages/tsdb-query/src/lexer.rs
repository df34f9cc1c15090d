//! TSQL tokenizer.
//!
//! A query is scanned line by line with one ordered regex alternation, so
//! earlier patterns win over later ones at the same position. Word-shaped
//! matches are classified afterwards: a word is only a keyword when the
//! whole identifier is the keyword, so `from-date` stays an identifier.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{QueryError, Result};

/// Query type keywords.
pub const QUERY_TYPES: [&str; 5] = ["info", "set", "retrieve", "select", "insert"];

/// Clause keywords.
const CLAUSE_KEYWORDS: [&str; 3] = ["from", "where", "report"];

/// Word-shaped logical operators.
const WORD_OPERATORS: [&str; 3] = ["and", "or", "not"];

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        concat!(
            r"(?i)",
            r"(\*|\.)",
            r"|(==|=|!=|~|!~|<=|<|>=|>|&&|&|\|\||\||!)",
            r"|(\(|\))",
            r#"|"([^"\\]*(?:\\.[^"\\]*)*)""#,
            r"|'([^'\\]*(?:\\.[^'\\]*)*)'",
            r"|({yyyy}-{m}(?:-{d})?(?:{t}|{tt})?)",
            r"|((?:{d}-)?{m}-{yy}(?:{t}|{tt})?)",
            r"|(:today)",
            r"|([+-]?[0-9]+)",
            r"|((?:{id}:)?{id}(?:@(?:{id}:)?{id})*)",
            r"|(\S)",
        ),
        d = r"[0-9]{1,2}",
        m = r"(?:[0-9]{1,2}|jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)",
        yy = r"(?:[0-9]{2})?[0-9]{2}",
        yyyy = r"[0-9]{4}",
        t = r"\s*\([0-9]{2}:[0-9]{2}(?::[0-9]{2})?\)",
        tt = r"\s+[0-9]{2}:[0-9]{2}(?::[0-9]{2})",
        id = r"[a-zA-Z][-_a-zA-Z0-9]*",
    );
    Regex::new(&pattern).unwrap()
});

/// Token classes, in the order their patterns are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Query types, clause keywords, `*`, and the `.` terminator
    Keyword,
    /// Comparison and logical operators
    Operator,
    /// `(` or `)`
    Paren,
    /// Quoted string; the text excludes the quotes
    String,
    /// Date literal, including `:today` and `now`
    Date,
    Integer,
    /// Column or table name, possibly `table:`-qualified and `@`-chained
    Identifier,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Matched text; keywords and word operators are lowercased
    pub text: String,
    /// 1-based line number
    pub lineno: usize,
}

impl Token {
    /// True if this is the keyword or operator `text`.
    pub fn is(&self, kind: TokenKind, text: &str) -> bool {
        self.kind == kind && self.text == text
    }
}

/// Splits `query` into tokens.
///
/// A `.` terminator is appended to the input, so a query that omits its
/// final `.` still ends with one.
pub fn tokenize(query: &str) -> Result<Vec<Token>> {
    let input = format!("{query}.");
    let mut tokens = Vec::new();
    for (idx, line) in input.lines().enumerate() {
        let lineno = idx + 1;
        for caps in TOKEN_RE.captures_iter(line) {
            let Some((group, m)) = caps
                .iter()
                .enumerate()
                .skip(1)
                .find_map(|(i, m)| m.map(|m| (i, m)))
            else {
                continue;
            };
            let text = m.as_str();
            let (kind, text) = match group {
                1 => (TokenKind::Keyword, text.to_string()),
                2 => (TokenKind::Operator, text.to_string()),
                3 => (TokenKind::Paren, text.to_string()),
                4 | 5 => (TokenKind::String, text.to_string()),
                6 | 7 => (TokenKind::Date, text.to_string()),
                8 => (TokenKind::Date, text.to_lowercase()),
                9 => (TokenKind::Integer, text.to_string()),
                10 => classify_word(text),
                _ => {
                    return Err(QueryError::Syntax {
                        message: "unexpected input".to_string(),
                        lineno,
                        offset: Some(m.start()),
                        text: Some(line.to_string()),
                    })
                }
            };
            tokens.push(Token { kind, text, lineno });
        }
    }
    Ok(tokens)
}

fn classify_word(word: &str) -> (TokenKind, String) {
    let lower = word.to_lowercase();
    if QUERY_TYPES.contains(&lower.as_str()) || CLAUSE_KEYWORDS.contains(&lower.as_str()) {
        (TokenKind::Keyword, lower)
    } else if WORD_OPERATORS.contains(&lower.as_str()) {
        (TokenKind::Operator, lower)
    } else if lower == "now" {
        (TokenKind::Date, lower)
    } else {
        (TokenKind::Identifier, word.to_string())
    }
}
