//! Standard grammar engines backed by `sqlparser` dialects

use super::{GrammarEngine, GrammarFailure};
use crate::tree::{ParseNode, ParseTree, StandardNode};
use sqlparser::ast;
use sqlparser::dialect::{
    AnsiDialect, ClickHouseDialect, Dialect, GenericDialect, HiveDialect, MsSqlDialect, MySqlDialect,
    PostgreSqlDialect,
};
use sqlparser::parser::{Parser, ParserError};
use sqlparser::tokenizer::{Token, Tokenizer};

/// Grammar engine wrapping a `sqlparser` dialect
pub struct DialectGrammar {
    name: String,
    dialect: Box<dyn Dialect + Send + Sync>,

    /// Peel a trailing `OPTION (...)` clause off before parsing
    query_hints: bool,
}

impl DialectGrammar {
    pub fn new(name: impl Into<String>, dialect: Box<dyn Dialect + Send + Sync>) -> Self {
        Self {
            name: name.into(),
            dialect,
            query_hints: false,
        }
    }

    /// Enable SQLServer style `OPTION (hint, ...)` query hints
    pub fn with_query_hints(mut self) -> Self {
        self.query_hints = true;
        self
    }

    /// Create an engine with the generic dialect
    pub fn generic() -> Self {
        Self::new("Generic", Box::new(GenericDialect {}))
    }

    /// Create an engine for SQL92
    pub fn ansi() -> Self {
        Self::new("SQL92", Box::new(AnsiDialect {}))
    }

    /// Create an engine for MySQL
    pub fn mysql() -> Self {
        Self::new("MySQL", Box::new(MySqlDialect {}))
    }

    /// Create an engine for PostgreSQL
    pub fn postgres() -> Self {
        Self::new("PostgreSQL", Box::new(PostgreSqlDialect {}))
    }

    /// Create an engine for SQLServer
    pub fn sqlserver() -> Self {
        Self::new("SQLServer", Box::new(MsSqlDialect {})).with_query_hints()
    }

    /// Create an engine for ClickHouse
    pub fn clickhouse() -> Self {
        Self::new("ClickHouse", Box::new(ClickHouseDialect {}))
    }

    /// Create an engine for Hive
    pub fn hive() -> Self {
        Self::new("Hive", Box::new(HiveDialect {}))
    }

    fn parse_statement(&self, sql: &str) -> Result<ast::Statement, GrammarFailure> {
        let mut statements = Parser::parse_sql(&*self.dialect, sql).map_err(|e| match e {
            ParserError::RecursionLimitExceeded => {
                GrammarFailure::Internal("recursion limit exceeded".to_string())
            }
            other => GrammarFailure::Cancelled(other.to_string()),
        })?;

        match statements.len() {
            1 => Ok(statements.remove(0)),
            0 => Err(GrammarFailure::Cancelled("no statement found".to_string())),
            n => Err(GrammarFailure::Cancelled(format!(
                "expected a single statement, found {}",
                n
            ))),
        }
    }

    /// Split `sql` into the statement text and its trailing `OPTION` hints
    fn split_query_hints(&self, sql: &str) -> Result<(String, Vec<String>), GrammarFailure> {
        let tokens = Tokenizer::new(&*self.dialect, sql)
            .with_unescape(false)
            .tokenize()
            .map_err(|e| GrammarFailure::Cancelled(e.to_string()))?;

        match find_option_clause(&tokens) {
            Some(clause) => {
                let statement = render(&tokens[..clause.option]);
                let hints = split_top_level(&tokens[clause.open + 1..clause.close])
                    .into_iter()
                    .map(|hint| render(hint).trim().to_string())
                    .filter(|hint| !hint.is_empty())
                    .collect();
                Ok((statement, hints))
            }
            None => Ok((sql.to_string(), Vec::new())),
        }
    }
}

impl GrammarEngine for DialectGrammar {
    fn name(&self) -> &str {
        &self.name
    }

    fn try_parse(&self, sql: &str) -> Result<ParseTree, GrammarFailure> {
        let (statement_sql, query_hints) = if self.query_hints {
            self.split_query_hints(sql)?
        } else {
            (sql.to_string(), Vec::new())
        };

        let statement = self.parse_statement(&statement_sql)?;
        // catch-all for SHOW forms the dialect does not know
        let catch_all = matches!(statement, ast::Statement::ShowVariable { .. });

        let mut node = StandardNode::new(statement);
        node.query_hints = query_hints;

        let root = ParseNode::Standard(node);
        Ok(if catch_all {
            ParseTree::provisional(root)
        } else {
            ParseTree::new(root)
        })
    }
}

/// Token positions of `OPTION ( ... )` at the end of a statement
struct OptionClause {
    option: usize,
    open: usize,
    close: usize,
}

fn find_option_clause(tokens: &[Token]) -> Option<OptionClause> {
    let close = tokens
        .iter()
        .rposition(|token| !matches!(token, Token::Whitespace(_) | Token::SemiColon))?;
    if tokens[close] != Token::RParen {
        return None;
    }

    let mut depth = 0usize;
    let mut open = None;
    for index in (0..close).rev() {
        match tokens[index] {
            Token::RParen => depth += 1,
            Token::LParen if depth == 0 => {
                open = Some(index);
                break;
            }
            Token::LParen => depth -= 1,
            _ => {}
        }
    }
    let open = open?;

    let option = tokens[..open]
        .iter()
        .rposition(|token| !matches!(token, Token::Whitespace(_)))?;
    match &tokens[option] {
        Token::Word(word) if word.quote_style.is_none() && word.value.eq_ignore_ascii_case("OPTION") => {
            Some(OptionClause { option, open, close })
        }
        _ => None,
    }
}

/// Split tokens on commas outside parentheses
fn split_top_level(tokens: &[Token]) -> Vec<&[Token]> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (index, token) in tokens.iter().enumerate() {
        match token {
            Token::LParen => depth += 1,
            Token::RParen => depth = depth.saturating_sub(1),
            Token::Comma if depth == 0 => {
                parts.push(&tokens[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(&tokens[start..]);
    parts
}

fn render(tokens: &[Token]) -> String {
    tokens.iter().map(|token| token.to_string()).collect()
}
