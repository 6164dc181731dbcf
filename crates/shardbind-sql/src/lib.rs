//! SQL parsing into canonical statements
//!
//! This crate handles:
//! - Standard grammar engines for each database type (sqlparser dialects)
//! - Feature grammars for syntax the standard engines reject (DistSQL,
//!   MySQL `LOAD XML`, SQLServer `DENY`)
//! - Fallback parsing across grammar engines
//! - Building one canonical `Statement` per parse tree

pub mod engine;
pub mod grammar;
pub mod statement;
pub mod tree;
pub mod visitor;

pub use engine::{SqlStatementParserEngine, SYNTAX_ERROR, UNSUPPORTED_SQL};
pub use grammar::{FeatureGrammar, FeatureScope, GrammarEngine, GrammarFailure, GrammarRegistry};
pub use statement::{
    ColumnReference, CommonTableExpression, CreateTableStatement, DeleteStatement, DenyStatement,
    DistSqlStatement, DropTableStatement, InsertStatement, LoadXmlStatement, OptionHintSegment,
    OtherStatement, ReadwriteSplittingRuleSegment, SelectStatement, Statement, StatementCategory,
    TableReference, UpdateStatement, WithSegment, WithTableHintSegment,
};
pub use tree::ParseTree;
pub use visitor::StatementBuilder;
