//! Fallback parsing
//!
//! The standard engine of a database type is tried first. When it cancels,
//! each applicable feature grammar is tried in registration order until one
//! produces a tree. Internal engine failures stop the search immediately.
//! A provisional tree is held back and returned only if every later grammar
//! cancels.

use crate::grammar::{GrammarEngine, GrammarFailure};
use crate::statement::Statement;
use crate::tree::ParseTree;
use crate::visitor::StatementBuilder;
use shardbind_core::{Result, ShardbindError};
use std::fmt;
use std::sync::Arc;

/// Reason recorded when no grammar accepts the SQL text
pub const SYNTAX_ERROR: &str = "You have an error in your SQL syntax";

/// Reason recorded when a grammar accepted the text into an error node
pub const UNSUPPORTED_SQL: &str = "Unsupported SQL";

/// Parser engine for one database type
pub struct SqlStatementParserEngine {
    standard: Arc<dyn GrammarEngine>,
    features: Vec<Arc<dyn GrammarEngine>>,
    builder: StatementBuilder,
}

impl SqlStatementParserEngine {
    pub fn new(standard: Arc<dyn GrammarEngine>, features: Vec<Arc<dyn GrammarEngine>>) -> Self {
        Self {
            standard,
            features,
            builder: StatementBuilder,
        }
    }

    /// Parse SQL text into a statement
    pub fn parse(&self, sql: &str) -> Result<Statement> {
        let tree = self.parse_tree(sql)?;
        Ok(self.builder.build(tree))
    }

    /// Parse SQL text into a raw tree, trying every grammar in order
    pub fn parse_tree(&self, sql: &str) -> Result<ParseTree> {
        let mut deferred: Option<ParseTree> = None;

        for engine in std::iter::once(&self.standard).chain(self.features.iter()) {
            match engine.try_parse(sql) {
                Ok(tree) if tree.is_error() => {
                    tracing::debug!(engine = engine.name(), "Grammar engine produced an error node");
                    return Err(ShardbindError::sql_parsing(sql, UNSUPPORTED_SQL));
                }
                Ok(tree) if tree.is_provisional() => {
                    tracing::debug!(engine = engine.name(), "Grammar engine accepted SQL provisionally");
                    if deferred.is_none() {
                        deferred = Some(tree);
                    }
                }
                Ok(tree) => {
                    tracing::debug!(engine = engine.name(), "Grammar engine accepted SQL");
                    return Ok(tree);
                }
                Err(GrammarFailure::Cancelled(reason)) => {
                    tracing::debug!(engine = engine.name(), %reason, "Grammar engine cancelled, trying next");
                }
                Err(GrammarFailure::Internal(reason)) => {
                    tracing::debug!(engine = engine.name(), %reason, "Grammar engine failed");
                    return Err(ShardbindError::sql_parsing(sql, SYNTAX_ERROR));
                }
            }
        }

        deferred.ok_or_else(|| ShardbindError::sql_parsing(sql, SYNTAX_ERROR))
    }

    /// Engine names in the order they are tried
    pub fn engine_names(&self) -> Vec<&str> {
        std::iter::once(&self.standard)
            .chain(self.features.iter())
            .map(|engine| engine.name())
            .collect()
    }
}

impl fmt::Debug for SqlStatementParserEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlStatementParserEngine")
            .field("engines", &self.engine_names())
            .finish()
    }
}
