//! Recursive-descent TSQL parser.
//!
//! ```text
//! query       := query_type select_body '.'
//! select_body := projection from? where?
//! projection  := '*' | column+
//! from        := 'from' table*
//! where       := 'where' disjunction
//! disjunction := conjunction (('or' | '||' | '|') conjunction)*
//! conjunction := unary (('and' | '&&' | '&') unary)*
//! unary       := ('not' | '!') disjunction | '(' disjunction ')' | comparison
//! comparison  := column operator literal
//! ```

use regex::Regex;
use tsdb_core::codec::parse_datetime;

use crate::ast::{ColumnRef, Condition, Literal, Operator, Projection, Query};
use crate::error::{QueryError, Result};
use crate::lexer::{tokenize, Token, TokenKind, QUERY_TYPES};

/// Parses a complete query, e.g. `select i-id from item where i-wf = 1.`
pub fn parse_query(query: &str) -> Result<Query> {
    Parser::new(tokenize(query)?).parse_query()
}

/// Parses a select body without the leading query type, e.g.
/// `i-id from item where i-wf = 1`.
pub fn parse_select(query: &str) -> Result<Query> {
    Parser::new(tokenize(query)?).parse_select()
}

/// Parses either a complete query or a bare select body.
pub fn parse(query: &str) -> Result<Query> {
    let tokens = tokenize(query)?;
    let has_type = tokens
        .first()
        .is_some_and(|t| t.kind == TokenKind::Keyword && QUERY_TYPES.contains(&t.text.as_str()));
    let mut parser = Parser::new(tokens);
    if has_type {
        parser.parse_query()
    } else {
        parser.parse_select()
    }
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    fn parse_query(&mut self) -> Result<Query> {
        let token = self.advance()?;
        if token.kind != TokenKind::Keyword || !QUERY_TYPES.contains(&token.text.as_str()) {
            return Err(expected("a query type", &token));
        }
        if token.text != "select" && token.text != "retrieve" {
            return Err(QueryError::syntax(
                format!("'{}' queries are not supported", token.text),
                token.lineno,
                None,
            ));
        }
        self.parse_select()
    }

    fn parse_select(&mut self) -> Result<Query> {
        let start = self.next_token_or_end()?.clone();

        let projection = self.parse_projection()?;
        let tables = self.parse_from();
        let condition = self.parse_where()?;

        if projection == Projection::All && tables.is_empty() && condition.is_none() {
            return Err(QueryError::syntax(
                "'select *' requires a 'from' or 'where' statement",
                start.lineno,
                Some(&start.text),
            ));
        }
        self.expect_terminator()?;
        Ok(Query::select(projection, tables, condition))
    }

    fn parse_projection(&mut self) -> Result<Projection> {
        let token = self.advance()?;
        if token.is(TokenKind::Keyword, "*") {
            return Ok(Projection::All);
        }
        if token.kind != TokenKind::Identifier {
            return Err(QueryError::syntax(
                "expected '*' or column identifiers",
                token.lineno,
                Some(&token.text),
            ));
        }
        let mut columns = prepare_columns(&token.text);
        while self.peek_kind() == Some(TokenKind::Identifier) {
            let token = self.advance()?;
            columns.extend(prepare_columns(&token.text));
        }
        Ok(Projection::Columns(columns))
    }

    fn parse_from(&mut self) -> Vec<String> {
        let mut tables = Vec::new();
        if self.peek_is(TokenKind::Keyword, "from") {
            self.position += 1;
            while let Some(token) = self.peek().filter(|t| t.kind == TokenKind::Identifier) {
                tables.push(token.text.clone());
                self.position += 1;
            }
        }
        tables
    }

    fn parse_where(&mut self) -> Result<Option<Condition>> {
        if !self.peek_is(TokenKind::Keyword, "where") {
            return Ok(None);
        }
        self.position += 1;
        self.parse_disjunction().map(Some)
    }

    fn parse_disjunction(&mut self) -> Result<Condition> {
        let mut condition = self.parse_conjunction()?;
        while self.peek_operator(&["|", "||", "or"]) {
            self.position += 1;
            condition = condition.or(self.parse_conjunction()?);
        }
        Ok(condition)
    }

    fn parse_conjunction(&mut self) -> Result<Condition> {
        let mut condition = self.parse_unary()?;
        while self.peek_operator(&["&", "&&", "and"]) {
            self.position += 1;
            condition = condition.and(self.parse_unary()?);
        }
        Ok(condition)
    }

    fn parse_unary(&mut self) -> Result<Condition> {
        let token = self.next_token_or_end()?.clone();
        match token.kind {
            TokenKind::Operator if token.text == "!" || token.text == "not" => {
                self.position += 1;
                Ok(self.parse_disjunction()?.not())
            }
            TokenKind::Paren if token.text == "(" => {
                self.position += 1;
                let condition = self.parse_disjunction()?;
                let close = self.advance()?;
                if !close.is(TokenKind::Paren, ")") {
                    return Err(expected("')'", &close));
                }
                Ok(condition)
            }
            TokenKind::Identifier => self.parse_comparison(),
            _ => Err(QueryError::syntax(
                "expected '!', 'not', '(', or a column name",
                token.lineno,
                Some(&token.text),
            )),
        }
    }

    fn parse_comparison(&mut self) -> Result<Condition> {
        let token = self.advance()?;
        if token.text.contains('@') {
            return Err(QueryError::syntax(
                "conditions take a single column",
                token.lineno,
                Some(&token.text),
            ));
        }
        let column = ColumnRef::parse(&token.text);

        let token = self.advance()?;
        let op = match token.kind {
            TokenKind::Operator => Operator::from_symbol(&token.text),
            _ => None,
        }
        .ok_or_else(|| expected("a comparison operator", &token))?;

        let token = self.advance()?;
        let value = literal(op, &token)?;
        Ok(Condition::compare(op, column, value))
    }

    /// Consumes the `.` terminator. Only further `.` tokens may follow it.
    fn expect_terminator(&mut self) -> Result<()> {
        let token = self.advance()?;
        if !token.is(TokenKind::Keyword, ".") {
            return Err(expected("'.'", &token));
        }
        while let Some(token) = self.peek() {
            if !token.is(TokenKind::Keyword, ".") {
                return Err(QueryError::syntax(
                    "unexpected input after '.'",
                    token.lineno,
                    Some(&token.text),
                ));
            }
            self.position += 1;
        }
        Ok(())
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn peek_is(&self, kind: TokenKind, text: &str) -> bool {
        self.peek().is_some_and(|t| t.is(kind, text))
    }

    fn peek_operator(&self, symbols: &[&str]) -> bool {
        self.peek()
            .is_some_and(|t| t.kind == TokenKind::Operator && symbols.contains(&t.text.as_str()))
    }

    /// Returns the next token without consuming it, failing at the end of
    /// input.
    fn next_token_or_end(&self) -> Result<&Token> {
        self.peek().ok_or_else(|| self.end_of_input())
    }

    fn advance(&mut self) -> Result<Token> {
        let token = self.next_token_or_end()?.clone();
        self.position += 1;
        Ok(token)
    }

    fn end_of_input(&self) -> QueryError {
        let lineno = self.tokens.last().map_or(1, |t| t.lineno);
        QueryError::syntax("unexpected end of query", lineno, None)
    }
}

fn expected(what: &str, token: &Token) -> QueryError {
    QueryError::syntax(format!("expected {what}"), token.lineno, Some(&token.text))
}

/// Decomposes an `@`-chained column path. A table qualifier applies to its
/// segment and every following unqualified one.
fn prepare_columns(path: &str) -> Vec<ColumnRef> {
    let mut table: Option<String> = None;
    path.split('@')
        .map(|segment| {
            let column = ColumnRef::parse(segment);
            if column.table.is_some() {
                table = column.table.clone();
            }
            ColumnRef {
                table: table.clone(),
                name: column.name,
            }
        })
        .collect()
}

/// Converts the token after operator `op` into a literal, checking that the
/// operator accepts it.
fn literal(op: Operator, token: &Token) -> Result<Literal> {
    let type_error = |what: &str| {
        QueryError::syntax(
            format!("the '{op}' operator is only valid with {what}"),
            token.lineno,
            Some(op.as_str()),
        )
    };
    match token.kind {
        TokenKind::String => {
            if op.is_ordering() {
                return Err(type_error("integers and dates"));
            }
            if op.is_regex() {
                Regex::new(&token.text).map_err(|e| {
                    QueryError::syntax(
                        format!("invalid regular expression: {e}"),
                        token.lineno,
                        Some(&token.text),
                    )
                })?;
            }
            Ok(Literal::String(token.text.clone()))
        }
        TokenKind::Identifier if !op.is_regex() && !op.is_ordering() => {
            Ok(Literal::String(token.text.clone()))
        }
        TokenKind::Integer | TokenKind::Date if op.is_regex() => Err(type_error("strings")),
        TokenKind::Integer => token.text.parse().map(Literal::Integer).map_err(|_| {
            QueryError::syntax("integer out of range", token.lineno, Some(&token.text))
        }),
        TokenKind::Date => parse_datetime(&token.text).map(Literal::Date).map_err(|_| {
            QueryError::syntax("invalid date", token.lineno, Some(&token.text))
        }),
        _ if op.is_regex() => Err(type_error("strings")),
        _ if op.is_ordering() => Err(type_error("integers and dates")),
        _ => Err(expected("a literal value", token)),
    }
}
