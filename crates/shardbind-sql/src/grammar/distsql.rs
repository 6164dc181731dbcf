//! DistSQL grammars
//!
//! Middleware administration statements: storage unit management and
//! read/write-splitting rules. Both grammars are database independent and
//! tokenize with the generic dialect.

use super::tokens::TokenCursor;
use super::{GrammarEngine, GrammarFailure};
use crate::tree::{rules, NodeValue, ParseNode, ParseTree, RuleNode};
use sqlparser::dialect::GenericDialect;
use sqlparser::tokenizer::Token;

/// `SHOW STORAGE UNITS` and `UNREGISTER STORAGE UNIT`
#[derive(Debug, Clone, Copy, Default)]
pub struct DistSqlGrammar;

impl GrammarEngine for DistSqlGrammar {
    fn name(&self) -> &str {
        "DistSQL"
    }

    fn try_parse(&self, sql: &str) -> Result<ParseTree, GrammarFailure> {
        let mut cursor = TokenCursor::tokenize(&GenericDialect {}, sql)?;

        let node = if cursor.parse_keywords(&["SHOW", "STORAGE", "UNITS"]) {
            show_storage_units(&mut cursor)?
        } else if cursor.parse_keywords(&["UNREGISTER", "STORAGE", "UNIT"]) {
            unregister_storage_unit(&mut cursor)?
        } else {
            return Err(cursor.expected("SHOW STORAGE UNITS or UNREGISTER STORAGE UNIT"));
        };

        cursor.expect_end()?;
        Ok(ParseTree::new(ParseNode::Rule(node)))
    }
}

fn show_storage_units(cursor: &mut TokenCursor) -> Result<RuleNode, GrammarFailure> {
    let mut node = RuleNode::new(rules::SHOW_STORAGE_UNITS);
    from_database(cursor, &mut node)?;
    Ok(node)
}

fn unregister_storage_unit(cursor: &mut TokenCursor) -> Result<RuleNode, GrammarFailure> {
    let mut node = RuleNode::new(rules::UNREGISTER_STORAGE_UNIT);

    if cursor.parse_keywords(&["IF", "EXISTS"]) {
        node.push("ifExists", NodeValue::Keyword("IF EXISTS".to_string()));
    }
    for name in cursor.parse_comma_separated(TokenCursor::parse_identifier)? {
        node.push("name", NodeValue::Identifier(vec![name]));
    }
    if cursor.parse_keywords(&["IGNORE", "SINGLE", "TABLES"]) {
        node.push("ignoreSingleTables", NodeValue::Keyword("IGNORE SINGLE TABLES".to_string()));
    }

    Ok(node)
}

/// `CREATE`, `DROP` and `SHOW` for read/write-splitting rules
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadwriteSplittingGrammar;

impl GrammarEngine for ReadwriteSplittingGrammar {
    fn name(&self) -> &str {
        "ReadwriteSplitting"
    }

    fn try_parse(&self, sql: &str) -> Result<ParseTree, GrammarFailure> {
        let mut cursor = TokenCursor::tokenize(&GenericDialect {}, sql)?;

        let node = if cursor.parse_keywords(&["CREATE", "READWRITE_SPLITTING", "RULE"]) {
            create_rule(&mut cursor)?
        } else if cursor.parse_keywords(&["DROP", "READWRITE_SPLITTING", "RULE"]) {
            drop_rule(&mut cursor)?
        } else if cursor.parse_keywords(&["SHOW", "READWRITE_SPLITTING"]) {
            show_rules(&mut cursor)?
        } else {
            return Err(cursor.expected("READWRITE_SPLITTING rule statement"));
        };

        cursor.expect_end()?;
        Ok(ParseTree::new(ParseNode::Rule(node)))
    }
}

fn create_rule(cursor: &mut TokenCursor) -> Result<RuleNode, GrammarFailure> {
    let mut node = RuleNode::new(rules::CREATE_READWRITE_SPLITTING_RULE);

    if cursor.parse_keywords(&["IF", "NOT", "EXISTS"]) {
        node.push("ifNotExists", NodeValue::Keyword("IF NOT EXISTS".to_string()));
    }
    for definition in cursor.parse_comma_separated(rule_definition)? {
        node.push("rule", NodeValue::Rule(definition));
    }

    Ok(node)
}

/// `name (WRITE_STORAGE_UNIT=w, READ_STORAGE_UNITS(r, ...) [, TYPE(NAME='lb')])`
fn rule_definition(cursor: &mut TokenCursor) -> Result<RuleNode, GrammarFailure> {
    let mut node = RuleNode::new(rules::READWRITE_SPLITTING_RULE_DEFINITION);

    node.push("name", NodeValue::Identifier(vec![cursor.parse_identifier()?]));
    cursor.expect_token(&Token::LParen)?;

    cursor.expect_keyword("WRITE_STORAGE_UNIT")?;
    cursor.expect_token(&Token::Eq)?;
    node.push("writeStorageUnit", NodeValue::Identifier(vec![cursor.parse_identifier()?]));
    cursor.expect_token(&Token::Comma)?;

    cursor.expect_keyword("READ_STORAGE_UNITS")?;
    cursor.expect_token(&Token::LParen)?;
    for unit in cursor.parse_comma_separated(TokenCursor::parse_identifier)? {
        node.push("readStorageUnit", NodeValue::Identifier(vec![unit]));
    }
    cursor.expect_token(&Token::RParen)?;

    if cursor.consume_token(&Token::Comma) {
        cursor.expect_keyword("TYPE")?;
        cursor.expect_token(&Token::LParen)?;
        cursor.expect_keyword("NAME")?;
        cursor.expect_token(&Token::Eq)?;
        let algorithm = match cursor.parse_string_literal() {
            Ok(value) => value,
            Err(_) => cursor.parse_identifier()?,
        };
        node.push("loadBalancer", NodeValue::Literal(algorithm));
        cursor.expect_token(&Token::RParen)?;
    }

    cursor.expect_token(&Token::RParen)?;
    Ok(node)
}

fn drop_rule(cursor: &mut TokenCursor) -> Result<RuleNode, GrammarFailure> {
    let mut node = RuleNode::new(rules::DROP_READWRITE_SPLITTING_RULE);

    if cursor.parse_keywords(&["IF", "EXISTS"]) {
        node.push("ifExists", NodeValue::Keyword("IF EXISTS".to_string()));
    }
    for name in cursor.parse_comma_separated(TokenCursor::parse_identifier)? {
        node.push("name", NodeValue::Identifier(vec![name]));
    }

    Ok(node)
}

/// `SHOW READWRITE_SPLITTING RULE[S] [name] [FROM db]`
fn show_rules(cursor: &mut TokenCursor) -> Result<RuleNode, GrammarFailure> {
    let mut node = RuleNode::new(rules::SHOW_READWRITE_SPLITTING_RULES);

    if cursor.parse_one_of_keywords(&["RULES", "RULE"]).is_none() {
        return Err(cursor.expected("RULES"));
    }
    if !cursor.is_end() && !cursor.peek_keyword("FROM") {
        node.push("name", NodeValue::Identifier(vec![cursor.parse_identifier()?]));
    }
    from_database(cursor, &mut node)?;

    Ok(node)
}

fn from_database(cursor: &mut TokenCursor, node: &mut RuleNode) -> Result<(), GrammarFailure> {
    if cursor.parse_keyword("FROM") {
        node.push("database", NodeValue::Identifier(vec![cursor.parse_identifier()?]));
    }
    Ok(())
}
