//! SQLServer statement extractor

use crate::extractor::DialectStatementExtractor;
use shardbind_sql::{Statement, TableReference};

/// Pulls the target object out of SQLServer `DENY` statements
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerStatementExtractor;

impl DialectStatementExtractor for SqlServerStatementExtractor {
    fn database_type(&self) -> &str {
        "SQLServer"
    }

    fn extract_tables(&self, statement: &Statement) -> Vec<TableReference> {
        match statement {
            Statement::Deny(deny) => vec![deny.table.clone()],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shardbind_sql::{DenyStatement, SelectStatement};

    #[test]
    fn deny_yields_its_table() {
        let statement = Statement::Deny(DenyStatement::new(
            vec!["SELECT".to_string()],
            TableReference::new("t_order").with_owner("dbo"),
            vec!["user1".to_string()],
        ));

        assert_eq!(
            SqlServerStatementExtractor.extract_tables(&statement),
            vec![TableReference::new("t_order").with_owner("dbo")]
        );
    }

    #[test]
    fn other_statements_yield_nothing() {
        let statement = Statement::Select(SelectStatement::new(vec![TableReference::new("t")]));

        assert!(SqlServerStatementExtractor.extract_tables(&statement).is_empty());
    }
}
