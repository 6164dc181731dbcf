//! Statement contexts
//!
//! A context pairs a parsed statement with the tables and columns it
//! references. Tables come from the statement's own structure plus whatever
//! the dialect extractor of the database type contributes. Each table is
//! listed once by its owner-qualified name; aliases are kept apart.

use crate::extractor::ExtractorRegistry;
use serde::Serialize;
use shardbind_core::DatabaseType;
use shardbind_sql::{
    ColumnReference, CreateTableStatement, DeleteStatement, DropTableStatement, InsertStatement,
    LoadXmlStatement, SelectStatement, Statement, StatementCategory, TableReference, UpdateStatement,
};
use std::collections::{BTreeMap, BTreeSet};

/// Statements whose structure names the tables they touch
pub trait TableAvailable {
    fn tables(&self) -> Vec<TableReference>;
}

impl TableAvailable for SelectStatement {
    fn tables(&self) -> Vec<TableReference> {
        let mut tables = self.tables().to_vec();
        if let Some(with) = self.with_segment() {
            tables.extend(with.tables().cloned());
        }
        tables
    }
}

impl TableAvailable for InsertStatement {
    fn tables(&self) -> Vec<TableReference> {
        std::iter::once(self.table.clone())
            .chain(self.source_tables.iter().cloned())
            .collect()
    }
}

impl TableAvailable for UpdateStatement {
    fn tables(&self) -> Vec<TableReference> {
        let mut tables = vec![self.table().clone()];
        tables.extend(self.joined_tables().iter().cloned());
        if let Some(with) = self.with_segment() {
            tables.extend(with.tables().cloned());
        }
        tables
    }
}

impl TableAvailable for DeleteStatement {
    fn tables(&self) -> Vec<TableReference> {
        self.tables.clone()
    }
}

impl TableAvailable for CreateTableStatement {
    fn tables(&self) -> Vec<TableReference> {
        vec![self.table.clone()]
    }
}

impl TableAvailable for DropTableStatement {
    fn tables(&self) -> Vec<TableReference> {
        self.tables.clone()
    }
}

impl TableAvailable for LoadXmlStatement {
    fn tables(&self) -> Vec<TableReference> {
        vec![self.table.clone()]
    }
}

/// Tables named by the statement's own structure
fn structural_tables(statement: &Statement) -> Vec<TableReference> {
    match statement {
        Statement::Select(select) => TableAvailable::tables(select),
        Statement::Insert(insert) => insert.tables(),
        Statement::Update(update) => TableAvailable::tables(update),
        Statement::Delete(delete) => delete.tables(),
        Statement::CreateTable(create) => create.tables(),
        Statement::DropTable(drop) => drop.tables(),
        Statement::LoadXml(load) => load.tables(),
        Statement::Deny(_) | Statement::DistSql(_) | Statement::Other(_) => Vec::new(),
    }
}

/// Columns named explicitly by the statement
fn referenced_columns(statement: &Statement) -> Vec<ColumnReference> {
    match statement {
        Statement::Insert(insert) => insert.columns.clone(),
        Statement::Update(update) => update.assignments().to_vec(),
        Statement::LoadXml(load) => load.columns.clone(),
        _ => Vec::new(),
    }
}

/// A bound statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementContext {
    database_type: String,
    category: StatementCategory,
    statement: Statement,
    tables: BTreeSet<TableReference>,
    aliases: BTreeMap<String, TableReference>,
    columns: BTreeSet<ColumnReference>,
}

impl StatementContext {
    /// Bind a statement for a database type
    pub fn bind(database_type: &DatabaseType, statement: Statement, extractors: &ExtractorRegistry) -> Self {
        let mut tables = BTreeSet::new();
        let mut aliases = BTreeMap::new();
        let referenced = structural_tables(&statement)
            .into_iter()
            .chain(extractors.extract_tables(database_type.name(), &statement));
        for table in referenced {
            if let Some(alias) = &table.alias {
                aliases.insert(alias.clone(), table.unaliased());
            }
            tables.insert(table.unaliased());
        }

        let columns = referenced_columns(&statement).into_iter().collect();

        Self {
            database_type: database_type.name().to_string(),
            category: statement.category(),
            statement,
            tables,
            aliases,
            columns,
        }
    }

    pub fn database_type(&self) -> &str {
        &self.database_type
    }

    pub fn category(&self) -> StatementCategory {
        self.category
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    pub fn into_statement(self) -> Statement {
        self.statement
    }

    /// Referenced tables without aliases, ordered
    pub fn tables(&self) -> &BTreeSet<TableReference> {
        &self.tables
    }

    /// Table aliases and the tables they stand for
    pub fn aliases(&self) -> &BTreeMap<String, TableReference> {
        &self.aliases
    }

    /// Referenced columns, ordered
    pub fn columns(&self) -> &BTreeSet<ColumnReference> {
        &self.columns
    }

    /// Owner-qualified names of the referenced tables
    pub fn table_names(&self) -> Vec<String> {
        self.tables.iter().map(TableReference::qualified_name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shardbind_sql::{DenyStatement, DistSqlStatement, WithSegment, CommonTableExpression};

    fn sqlserver() -> DatabaseType {
        DatabaseType::new("SQLServer", ["jdbc:sqlserver:"])
    }

    #[test]
    fn update_tables_include_every_segment() {
        let update = UpdateStatement::new(TableReference::new("t_order"), vec![ColumnReference::new("status")])
            .with_joined_tables(vec![TableReference::new("t_user")])
            .with_common_table_expressions(WithSegment {
                recursive: false,
                common_table_expressions: vec![CommonTableExpression {
                    name: "pending".to_string(),
                    tables: vec![TableReference::new("t_queue")],
                }],
            });

        let context = StatementContext::bind(&sqlserver(), Statement::Update(update), &ExtractorRegistry::new());

        assert_eq!(context.table_names(), vec!["t_order", "t_queue", "t_user"]);
        assert_eq!(context.columns(), &BTreeSet::from([ColumnReference::new("status")]));
        assert_eq!(context.category(), StatementCategory::Dml);
    }

    #[test]
    fn deny_tables_come_from_extractor_only() {
        let deny = Statement::Deny(DenyStatement::new(
            vec!["SELECT".to_string()],
            TableReference::new("t_order"),
            vec!["user1".to_string()],
        ));

        let without = StatementContext::bind(&sqlserver(), deny.clone(), &ExtractorRegistry::new());
        let with = StatementContext::bind(&sqlserver(), deny, &ExtractorRegistry::builtin());

        assert!(without.tables().is_empty());
        assert_eq!(with.table_names(), vec!["t_order"]);
        assert_eq!(with.category(), StatementCategory::Dcl);
    }

    #[test]
    fn dist_sql_has_no_tables() {
        let statement = Statement::DistSql(DistSqlStatement::ShowStorageUnits { from_database: None });
        let context = StatementContext::bind(&sqlserver(), statement, &ExtractorRegistry::builtin());

        assert!(context.tables().is_empty());
        assert!(context.columns().is_empty());
        assert_eq!(context.category(), StatementCategory::Rql);
    }

    #[test]
    fn self_join_lists_table_once() {
        let select = SelectStatement::new(vec![
            TableReference::new("t_order").with_alias("a"),
            TableReference::new("t_order").with_alias("b"),
        ]);

        let context = StatementContext::bind(&sqlserver(), Statement::Select(select), &ExtractorRegistry::new());

        assert_eq!(context.tables(), &BTreeSet::from([TableReference::new("t_order")]));
        assert_eq!(context.table_names(), vec!["t_order"]);
        assert_eq!(
            context.aliases(),
            &BTreeMap::from([
                ("a".to_string(), TableReference::new("t_order")),
                ("b".to_string(), TableReference::new("t_order")),
            ])
        );
    }

    #[test]
    fn bind_is_idempotent() {
        let statement = Statement::LoadXml(LoadXmlStatement::new("f.xml", TableReference::new("t")));
        let extractors = ExtractorRegistry::builtin();

        let first = StatementContext::bind(&sqlserver(), statement.clone(), &extractors);
        let second = StatementContext::bind(&sqlserver(), statement, &extractors);

        assert_eq!(first, second);
    }
}
