//! Token cursor for the keyword grammars
//!
//! Keyword grammars reuse the `sqlparser` tokenizer of their dialect and walk
//! the significant tokens by hand. Every mismatch is a `Cancelled` failure so
//! the parser engine can move on to the next grammar.

use super::GrammarFailure;
use sqlparser::dialect::Dialect;
use sqlparser::tokenizer::{Token, Tokenizer};

pub(crate) struct TokenCursor {
    tokens: Vec<Token>,
    index: usize,
}

impl TokenCursor {
    /// Tokenize `sql`, dropping whitespace and trailing semicolons
    pub fn tokenize(dialect: &dyn Dialect, sql: &str) -> Result<Self, GrammarFailure> {
        let mut tokens: Vec<Token> = Tokenizer::new(dialect, sql)
            .tokenize()
            .map_err(|e| GrammarFailure::Cancelled(e.to_string()))?
            .into_iter()
            .filter(|token| !matches!(token, Token::Whitespace(_)))
            .collect();

        while matches!(tokens.last(), Some(Token::SemiColon)) {
            tokens.pop();
        }

        Ok(Self { tokens, index: 0 })
    }

    pub fn peek(&self) -> Option<&Token> {
        self.peek_nth(0)
    }

    /// Token `offset` positions ahead of the current one
    pub fn peek_nth(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.index + offset)
    }

    pub fn is_end(&self) -> bool {
        self.index >= self.tokens.len()
    }

    /// Check if the current token is the unquoted word `keyword`
    pub fn peek_keyword(&self, keyword: &str) -> bool {
        is_keyword(self.peek(), keyword)
    }

    /// Consume the unquoted word `keyword` if it is next
    pub fn parse_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(keyword) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    /// Consume a sequence of keywords, or nothing if any of them is missing
    pub fn parse_keywords(&mut self, keywords: &[&str]) -> bool {
        let matched = keywords
            .iter()
            .enumerate()
            .all(|(offset, keyword)| is_keyword(self.peek_nth(offset), keyword));

        if matched {
            self.index += keywords.len();
        }
        matched
    }

    /// Consume the first of `keywords` that is next, returning it upper-cased
    pub fn parse_one_of_keywords(&mut self, keywords: &[&str]) -> Option<String> {
        let keyword = keywords.iter().find(|keyword| self.peek_keyword(keyword))?;
        self.index += 1;
        Some(keyword.to_ascii_uppercase())
    }

    pub fn expect_keyword(&mut self, keyword: &str) -> Result<(), GrammarFailure> {
        if self.parse_keyword(keyword) {
            Ok(())
        } else {
            Err(self.expected(keyword))
        }
    }

    pub fn expect_keywords(&mut self, keywords: &[&str]) -> Result<(), GrammarFailure> {
        for keyword in keywords {
            self.expect_keyword(keyword)?;
        }
        Ok(())
    }

    /// Consume `expected` if it is next
    pub fn consume_token(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    pub fn expect_token(&mut self, expected: &Token) -> Result<(), GrammarFailure> {
        if self.consume_token(expected) {
            Ok(())
        } else {
            Err(self.expected(&expected.to_string()))
        }
    }

    /// Consume a single (possibly quoted) word
    pub fn parse_identifier(&mut self) -> Result<String, GrammarFailure> {
        match self.peek() {
            Some(Token::Word(word)) => {
                let value = word.value.clone();
                self.index += 1;
                Ok(value)
            }
            _ => Err(self.expected("identifier")),
        }
    }

    /// Consume a dot-separated name
    pub fn parse_object_name(&mut self) -> Result<Vec<String>, GrammarFailure> {
        let mut parts = vec![self.parse_identifier()?];
        while self.consume_token(&Token::Period) {
            parts.push(self.parse_identifier()?);
        }
        Ok(parts)
    }

    /// Consume a quoted string, returning its unquoted value
    pub fn parse_string_literal(&mut self) -> Result<String, GrammarFailure> {
        match self.peek() {
            Some(Token::SingleQuotedString(value)) | Some(Token::DoubleQuotedString(value)) => {
                let value = value.clone();
                self.index += 1;
                Ok(value)
            }
            _ => Err(self.expected("string literal")),
        }
    }

    pub fn parse_number(&mut self) -> Result<String, GrammarFailure> {
        match self.peek() {
            Some(Token::Number(value, _)) => {
                let value = value.clone();
                self.index += 1;
                Ok(value)
            }
            _ => Err(self.expected("number")),
        }
    }

    /// Parse one or more comma-separated items
    pub fn parse_comma_separated<T, F>(&mut self, mut parse: F) -> Result<Vec<T>, GrammarFailure>
    where
        F: FnMut(&mut Self) -> Result<T, GrammarFailure>,
    {
        let mut items = vec![parse(self)?];
        while self.consume_token(&Token::Comma) {
            items.push(parse(self)?);
        }
        Ok(items)
    }

    /// Fail unless every token has been consumed
    pub fn expect_end(&self) -> Result<(), GrammarFailure> {
        if self.is_end() {
            Ok(())
        } else {
            Err(self.expected("end of statement"))
        }
    }

    /// Build a cancellation naming what was expected and what was found
    pub fn expected(&self, what: &str) -> GrammarFailure {
        let found = self
            .peek()
            .map(|token| token.to_string())
            .unwrap_or_else(|| "end of input".to_string());

        GrammarFailure::Cancelled(format!("expected {}, found {}", what, found))
    }
}

fn is_keyword(token: Option<&Token>, keyword: &str) -> bool {
    match token {
        Some(Token::Word(word)) => word.quote_style.is_none() && word.value.eq_ignore_ascii_case(keyword),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlparser::dialect::GenericDialect;

    #[test]
    fn trailing_semicolons_are_ignored() {
        let mut cursor = TokenCursor::tokenize(&GenericDialect {}, "SHOW STORAGE UNITS;;").unwrap();

        assert!(cursor.parse_keywords(&["show", "storage", "units"]));
        assert!(cursor.expect_end().is_ok());
    }

    #[test]
    fn keyword_sequence_is_all_or_nothing() {
        let mut cursor = TokenCursor::tokenize(&GenericDialect {}, "IF NOT t").unwrap();

        assert!(!cursor.parse_keywords(&["IF", "NOT", "EXISTS"]));
        assert!(cursor.peek_keyword("IF"));
    }

    #[test]
    fn quoted_word_is_not_a_keyword() {
        let mut cursor = TokenCursor::tokenize(&GenericDialect {}, "\"FROM\"").unwrap();

        assert!(!cursor.peek_keyword("FROM"));
        assert_eq!(cursor.parse_identifier().unwrap(), "FROM");
    }

    #[test]
    fn object_name_and_list() {
        let mut cursor = TokenCursor::tokenize(&GenericDialect {}, "db.t, u").unwrap();
        let names = cursor.parse_comma_separated(TokenCursor::parse_object_name).unwrap();

        assert_eq!(
            names,
            vec![
                vec!["db".to_string(), "t".to_string()],
                vec!["u".to_string()]
            ]
        );
    }

    #[test]
    fn mismatch_is_cancelled() {
        let mut cursor = TokenCursor::tokenize(&GenericDialect {}, "42").unwrap();

        match cursor.parse_identifier() {
            Err(GrammarFailure::Cancelled(reason)) => assert_eq!(reason, "expected identifier, found 42"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
