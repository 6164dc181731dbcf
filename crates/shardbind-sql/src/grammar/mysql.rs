//! MySQL `LOAD XML` grammar

use super::tokens::TokenCursor;
use super::{GrammarEngine, GrammarFailure};
use crate::tree::{rules, NodeValue, ParseNode, ParseTree, RuleNode};
use sqlparser::dialect::MySqlDialect;
use sqlparser::tokenizer::Token;

/// `LOAD XML [LOW_PRIORITY | CONCURRENT] [LOCAL] INFILE 'file' [REPLACE | IGNORE]
/// INTO TABLE t [CHARACTER SET cs] [ROWS IDENTIFIED BY '<tag>']
/// [IGNORE n {LINES | ROWS}] [(column, ...)]`
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadXmlGrammar;

impl GrammarEngine for LoadXmlGrammar {
    fn name(&self) -> &str {
        "MySQL LOAD XML"
    }

    fn try_parse(&self, sql: &str) -> Result<ParseTree, GrammarFailure> {
        let mut cursor = TokenCursor::tokenize(&MySqlDialect {}, sql)?;
        let mut node = RuleNode::new(rules::LOAD_XML);

        cursor.expect_keywords(&["LOAD", "XML"])?;

        if let Some(priority) = cursor.parse_one_of_keywords(&["LOW_PRIORITY", "CONCURRENT"]) {
            node.push("priority", NodeValue::Keyword(priority));
        }
        if cursor.parse_keyword("LOCAL") {
            node.push("local", NodeValue::Keyword("LOCAL".to_string()));
        }

        cursor.expect_keyword("INFILE")?;
        node.push("fileName", NodeValue::Literal(cursor.parse_string_literal()?));

        if let Some(duplicate) = cursor.parse_one_of_keywords(&["REPLACE", "IGNORE"]) {
            node.push("duplicate", NodeValue::Keyword(duplicate));
        }

        cursor.expect_keywords(&["INTO", "TABLE"])?;
        node.push("table", NodeValue::Identifier(cursor.parse_object_name()?));

        if cursor.parse_keywords(&["CHARACTER", "SET"]) || cursor.parse_keyword("CHARSET") {
            let charset = match cursor.parse_string_literal() {
                Ok(value) => value,
                Err(_) => cursor.parse_identifier()?,
            };
            node.push("charset", NodeValue::Literal(charset));
        }

        if cursor.parse_keywords(&["ROWS", "IDENTIFIED", "BY"]) {
            node.push("rowsIdentifiedBy", NodeValue::Literal(cursor.parse_string_literal()?));
        }

        if cursor.parse_keyword("IGNORE") {
            node.push("ignoreLines", NodeValue::Number(cursor.parse_number()?));
            if cursor.parse_one_of_keywords(&["LINES", "ROWS"]).is_none() {
                return Err(cursor.expected("LINES or ROWS"));
            }
        }

        if cursor.consume_token(&Token::LParen) {
            for column in cursor.parse_comma_separated(column_or_user_variable)? {
                node.push("column", NodeValue::Identifier(vec![column]));
            }
            cursor.expect_token(&Token::RParen)?;
        }

        cursor.expect_end()?;
        Ok(ParseTree::new(ParseNode::Rule(node)))
    }
}

/// Column name, or `@var` user variable receiving the field
fn column_or_user_variable(cursor: &mut TokenCursor) -> Result<String, GrammarFailure> {
    if cursor.consume_token(&Token::AtSign) {
        Ok(format!("@{}", cursor.parse_identifier()?))
    } else {
        cursor.parse_identifier()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(sql: &str) -> RuleNode {
        match LoadXmlGrammar.try_parse(sql).unwrap().into_root() {
            ParseNode::Rule(node) => node,
            other => panic!("expected rule node, got {:?}", other),
        }
    }

    #[test]
    fn minimal_load_xml() {
        let node = rule("LOAD XML INFILE 'person.xml' INTO TABLE person");

        assert_eq!(node.rule(), rules::LOAD_XML);
        assert_eq!(node.child("fileName").and_then(NodeValue::as_text), Some("person.xml"));
        assert_eq!(node.child("table").and_then(NodeValue::as_text), Some("person"));
        assert!(!node.has("local"));
    }

    #[test]
    fn load_xml_with_every_clause() {
        let node = rule(
            "LOAD XML LOW_PRIORITY LOCAL INFILE '/tmp/person.xml' REPLACE INTO TABLE test.person \
             CHARACTER SET utf8mb4 ROWS IDENTIFIED BY '<person>' IGNORE 1 LINES (person_id, fname, @skip)",
        );

        assert_eq!(node.child("priority").and_then(NodeValue::as_text), Some("LOW_PRIORITY"));
        assert!(node.has("local"));
        assert_eq!(node.child("duplicate").and_then(NodeValue::as_text), Some("REPLACE"));
        assert_eq!(
            node.child("table").and_then(NodeValue::as_identifier),
            Some(&["test".to_string(), "person".to_string()][..])
        );
        assert_eq!(node.child("charset").and_then(NodeValue::as_text), Some("utf8mb4"));
        assert_eq!(node.child("rowsIdentifiedBy").and_then(NodeValue::as_text), Some("<person>"));
        assert_eq!(node.child("ignoreLines").and_then(NodeValue::as_text), Some("1"));
        assert_eq!(node.children("column").count(), 3);
    }

    #[test]
    fn load_data_is_not_load_xml() {
        let result = LoadXmlGrammar.try_parse("LOAD DATA INFILE 'f' INTO TABLE t");
        assert!(matches!(result, Err(GrammarFailure::Cancelled(_))));
    }

    #[test]
    fn trailing_garbage_is_cancelled() {
        let result = LoadXmlGrammar.try_parse("LOAD XML INFILE 'f' INTO TABLE t garbage");
        assert!(matches!(result, Err(GrammarFailure::Cancelled(_))));
    }
}
