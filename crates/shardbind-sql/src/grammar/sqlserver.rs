//! SQLServer `DENY` grammar

use super::tokens::TokenCursor;
use super::{GrammarEngine, GrammarFailure};
use crate::tree::{rules, NodeValue, ParseNode, ParseTree, RuleNode};
use sqlparser::dialect::MsSqlDialect;
use sqlparser::tokenizer::Token;

/// `DENY permission [(column, ...)] [, ...] ON [OBJECT::]t [(column, ...)]
/// TO principal [, ...] [CASCADE] [AS principal]`
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyGrammar;

impl GrammarEngine for DenyGrammar {
    fn name(&self) -> &str {
        "SQLServer DENY"
    }

    fn try_parse(&self, sql: &str) -> Result<ParseTree, GrammarFailure> {
        let mut cursor = TokenCursor::tokenize(&MsSqlDialect {}, sql)?;
        let mut node = RuleNode::new(rules::DENY);

        cursor.expect_keyword("DENY")?;

        loop {
            node.push("privilege", NodeValue::Keyword(privilege(&mut cursor)?));
            columns(&mut cursor, &mut node)?;
            if !cursor.consume_token(&Token::Comma) {
                break;
            }
        }

        cursor.expect_keyword("ON")?;
        if cursor.peek_keyword("OBJECT") && cursor.peek_nth(1) == Some(&Token::DoubleColon) {
            cursor.expect_keyword("OBJECT")?;
            cursor.expect_token(&Token::DoubleColon)?;
        }
        node.push("table", NodeValue::Identifier(cursor.parse_object_name()?));
        columns(&mut cursor, &mut node)?;

        cursor.expect_keyword("TO")?;
        for principal in cursor.parse_comma_separated(TokenCursor::parse_identifier)? {
            node.push("principal", NodeValue::Identifier(vec![principal]));
        }

        if cursor.parse_keyword("CASCADE") {
            node.push("cascade", NodeValue::Keyword("CASCADE".to_string()));
        }
        if cursor.parse_keyword("AS") {
            node.push("grantor", NodeValue::Identifier(vec![cursor.parse_identifier()?]));
        }

        cursor.expect_end()?;
        Ok(ParseTree::new(ParseNode::Rule(node)))
    }
}

/// One permission, possibly several words (e.g. `VIEW DEFINITION`)
fn privilege(cursor: &mut TokenCursor) -> Result<String, GrammarFailure> {
    let mut words = Vec::new();

    while !cursor.is_end()
        && !cursor.peek_keyword("ON")
        && !matches!(cursor.peek(), Some(Token::Comma) | Some(Token::LParen))
    {
        match cursor.peek() {
            Some(Token::Word(word)) if word.quote_style.is_none() => {
                words.push(word.value.to_ascii_uppercase());
                cursor.parse_identifier()?;
            }
            _ => return Err(cursor.expected("permission")),
        }
    }

    if words.is_empty() {
        return Err(cursor.expected("permission"));
    }
    Ok(words.join(" "))
}

fn columns(cursor: &mut TokenCursor, node: &mut RuleNode) -> Result<(), GrammarFailure> {
    if cursor.consume_token(&Token::LParen) {
        for column in cursor.parse_comma_separated(TokenCursor::parse_identifier)? {
            node.push("column", NodeValue::Identifier(vec![column]));
        }
        cursor.expect_token(&Token::RParen)?;
    }
    Ok(())
}
