//! Canonical statement model
//!
//! Every grammar engine result is normalized into one `Statement` variant.
//! Parts every dialect agrees on are plain fields; dialect-only sub-clauses
//! are optional segments that can only be read through accessors returning
//! `Option`.

use serde::Serialize;
use std::fmt;

/// A table named by a statement
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TableReference {
    /// Schema (or database) qualifier
    pub owner: Option<String>,

    /// Table name
    pub name: String,

    /// Alias given in the statement
    pub alias: Option<String>,
}

impl TableReference {
    /// Create an unqualified table reference
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            owner: None,
            name: name.into(),
            alias: None,
        }
    }

    /// Build a reference from the dot-separated parts of a name
    ///
    /// The last part is the table; anything before it is the owner.
    pub fn from_parts(parts: &[String]) -> Self {
        match parts.split_last() {
            Some((name, [])) => Self::new(name.clone()),
            Some((name, owner)) => Self::new(name.clone()).with_owner(owner.join(".")),
            None => Self::new(String::new()),
        }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// The same table without its alias
    pub fn unaliased(&self) -> Self {
        Self {
            owner: self.owner.clone(),
            name: self.name.clone(),
            alias: None,
        }
    }

    /// Owner-qualified name without the alias
    pub fn qualified_name(&self) -> String {
        match &self.owner {
            Some(owner) => format!("{}.{}", owner, self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for TableReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{} AS {}", self.qualified_name(), alias),
            None => write!(f, "{}", self.qualified_name()),
        }
    }
}

/// A column named by a statement
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ColumnReference {
    /// Table (or alias) qualifier
    pub owner: Option<String>,

    /// Column name
    pub name: String,
}

impl ColumnReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            owner: None,
            name: name.into(),
        }
    }

    /// Build a reference from the dot-separated parts of a name
    pub fn from_parts(parts: &[String]) -> Self {
        match parts.split_last() {
            Some((name, [])) => Self::new(name.clone()),
            Some((name, owner)) => Self {
                owner: Some(owner.join(".")),
                name: name.clone(),
            },
            None => Self::new(String::new()),
        }
    }
}

impl fmt::Display for ColumnReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.owner {
            Some(owner) => write!(f, "{}.{}", owner, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// One named subquery of a WITH clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommonTableExpression {
    pub name: String,

    /// Tables read by the subquery
    pub tables: Vec<TableReference>,
}

/// WITH clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WithSegment {
    pub recursive: bool,
    pub common_table_expressions: Vec<CommonTableExpression>,
}

impl WithSegment {
    /// Tables read by all subqueries of the clause
    pub fn tables(&self) -> impl Iterator<Item = &TableReference> {
        self.common_table_expressions
            .iter()
            .flat_map(|cte| cte.tables.iter())
    }
}

/// SQLServer `WITH (hint, ...)` table hints
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WithTableHintSegment {
    pub hints: Vec<String>,
}

/// SQLServer `OPTION (hint, ...)` query hints
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionHintSegment {
    pub hints: Vec<String>,
}

/// SELECT statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectStatement {
    /// Tables of the query body, excluding references to CTEs
    tables: Vec<TableReference>,

    with: Option<WithSegment>,
}

impl SelectStatement {
    pub fn new(tables: Vec<TableReference>) -> Self {
        Self { tables, with: None }
    }

    /// Attach the WITH clause
    pub fn with_common_table_expressions(mut self, with: WithSegment) -> Self {
        self.with = Some(with);
        self
    }

    pub fn tables(&self) -> &[TableReference] {
        &self.tables
    }

    pub fn with_segment(&self) -> Option<&WithSegment> {
        self.with.as_ref()
    }
}

/// INSERT statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertStatement {
    pub table: TableReference,

    /// Explicit column list
    pub columns: Vec<ColumnReference>,

    /// Tables read by an `INSERT ... SELECT` source query
    pub source_tables: Vec<TableReference>,
}

/// UPDATE statement
///
/// The WITH clause, table hints and `OPTION` hints are only filled in by
/// dialects whose grammar produces them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateStatement {
    table: TableReference,

    /// Tables joined into the update or read by subqueries
    joined_tables: Vec<TableReference>,

    /// Assigned columns
    assignments: Vec<ColumnReference>,

    with: Option<WithSegment>,
    with_table_hint: Option<WithTableHintSegment>,
    option_hint: Option<OptionHintSegment>,
}

impl UpdateStatement {
    pub fn new(table: TableReference, assignments: Vec<ColumnReference>) -> Self {
        Self {
            table,
            joined_tables: Vec::new(),
            assignments,
            with: None,
            with_table_hint: None,
            option_hint: None,
        }
    }

    pub fn with_joined_tables(mut self, tables: Vec<TableReference>) -> Self {
        self.joined_tables = tables;
        self
    }

    pub fn with_common_table_expressions(mut self, with: WithSegment) -> Self {
        self.with = Some(with);
        self
    }

    pub fn with_table_hints(mut self, hints: WithTableHintSegment) -> Self {
        self.with_table_hint = Some(hints);
        self
    }

    pub fn with_option_hints(mut self, hints: OptionHintSegment) -> Self {
        self.option_hint = Some(hints);
        self
    }

    pub fn table(&self) -> &TableReference {
        &self.table
    }

    pub fn joined_tables(&self) -> &[TableReference] {
        &self.joined_tables
    }

    pub fn assignments(&self) -> &[ColumnReference] {
        &self.assignments
    }

    pub fn with_segment(&self) -> Option<&WithSegment> {
        self.with.as_ref()
    }

    pub fn with_table_hint_segment(&self) -> Option<&WithTableHintSegment> {
        self.with_table_hint.as_ref()
    }

    pub fn option_hint_segment(&self) -> Option<&OptionHintSegment> {
        self.option_hint.as_ref()
    }
}

/// DELETE statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteStatement {
    pub tables: Vec<TableReference>,
}

/// CREATE TABLE statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateTableStatement {
    pub table: TableReference,
    pub columns: Vec<ColumnReference>,
}

/// DROP TABLE statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DropTableStatement {
    pub tables: Vec<TableReference>,
    pub if_exists: bool,
}

/// MySQL `LOAD XML` statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadXmlStatement {
    pub file_name: String,
    pub table: TableReference,

    /// `LOCAL` keyword present
    pub local: bool,

    /// Tag given by `ROWS IDENTIFIED BY`
    pub rows_identified_by: Option<String>,

    pub columns: Vec<ColumnReference>,
}

impl LoadXmlStatement {
    pub fn new(file_name: impl Into<String>, table: TableReference) -> Self {
        Self {
            file_name: file_name.into(),
            table,
            local: false,
            rows_identified_by: None,
            columns: Vec::new(),
        }
    }
}

/// SQLServer `DENY` statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DenyStatement {
    pub privileges: Vec<String>,
    pub table: TableReference,
    pub columns: Vec<ColumnReference>,
    pub principals: Vec<String>,
    pub cascade: bool,
}

impl DenyStatement {
    pub fn new(privileges: Vec<String>, table: TableReference, principals: Vec<String>) -> Self {
        Self {
            privileges,
            table,
            columns: Vec::new(),
            principals,
            cascade: false,
        }
    }
}

/// Definition of one read/write-splitting rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadwriteSplittingRuleSegment {
    pub name: String,
    pub write_storage_unit: String,
    pub read_storage_units: Vec<String>,

    /// Load balancer algorithm name from `TYPE(NAME=...)`
    pub load_balancer: Option<String>,
}

/// Middleware administration statements
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DistSqlStatement {
    ShowStorageUnits {
        from_database: Option<String>,
    },
    UnregisterStorageUnit {
        names: Vec<String>,
        if_exists: bool,
        ignore_single_tables: bool,
    },
    CreateReadwriteSplittingRule {
        if_not_exists: bool,
        rules: Vec<ReadwriteSplittingRuleSegment>,
    },
    DropReadwriteSplittingRule {
        names: Vec<String>,
        if_exists: bool,
    },
    ShowReadwriteSplittingRules {
        rule_name: Option<String>,
        from_database: Option<String>,
    },
}

/// A statement accepted by a grammar but without a dedicated shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OtherStatement {
    /// The statement as rendered by its grammar engine
    pub sql: String,
}

/// Logical statement category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatementCategory {
    /// Data query
    Dql,
    /// Data manipulation
    Dml,
    /// Data definition
    Ddl,
    /// Data control
    Dcl,
    /// Rule definition (DistSQL)
    Rdl,
    /// Rule query (DistSQL)
    Rql,
    Other,
}

impl fmt::Display for StatementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Dql => "DQL",
            Self::Dml => "DML",
            Self::Ddl => "DDL",
            Self::Dcl => "DCL",
            Self::Rdl => "RDL",
            Self::Rql => "RQL",
            Self::Other => "OTHER",
        };
        write!(f, "{}", name)
    }
}

/// Canonical parsed statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Statement {
    Select(SelectStatement),
    Insert(InsertStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
    CreateTable(CreateTableStatement),
    DropTable(DropTableStatement),
    LoadXml(LoadXmlStatement),
    Deny(DenyStatement),
    DistSql(DistSqlStatement),
    Other(OtherStatement),
}

impl Statement {
    /// Get the logical category of this statement
    pub fn category(&self) -> StatementCategory {
        match self {
            Self::Select(_) => StatementCategory::Dql,
            Self::Insert(_) | Self::Update(_) | Self::Delete(_) | Self::LoadXml(_) => {
                StatementCategory::Dml
            }
            Self::CreateTable(_) | Self::DropTable(_) => StatementCategory::Ddl,
            Self::Deny(_) => StatementCategory::Dcl,
            Self::DistSql(dist_sql) => match dist_sql {
                DistSqlStatement::ShowStorageUnits { .. }
                | DistSqlStatement::ShowReadwriteSplittingRules { .. } => StatementCategory::Rql,
                DistSqlStatement::UnregisterStorageUnit { .. }
                | DistSqlStatement::CreateReadwriteSplittingRule { .. }
                | DistSqlStatement::DropReadwriteSplittingRule { .. } => StatementCategory::Rdl,
            },
            Self::Other(_) => StatementCategory::Other,
        }
    }

    /// Short statement kind name (e.g. "UPDATE")
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Select(_) => "SELECT",
            Self::Insert(_) => "INSERT",
            Self::Update(_) => "UPDATE",
            Self::Delete(_) => "DELETE",
            Self::CreateTable(_) => "CREATE TABLE",
            Self::DropTable(_) => "DROP TABLE",
            Self::LoadXml(_) => "LOAD XML",
            Self::Deny(_) => "DENY",
            Self::DistSql(_) => "DISTSQL",
            Self::Other(_) => "OTHER",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_reference_from_parts() {
        let parts = vec!["sales".to_string(), "dbo".to_string(), "orders".to_string()];
        let table = TableReference::from_parts(&parts);

        assert_eq!(table.owner.as_deref(), Some("sales.dbo"));
        assert_eq!(table.name, "orders");
        assert_eq!(table.qualified_name(), "sales.dbo.orders");
    }

    #[test]
    fn table_reference_display() {
        let table = TableReference::new("t_order").with_owner("public").with_alias("o");
        assert_eq!(table.to_string(), "public.t_order AS o");
        assert_eq!(TableReference::new("t").to_string(), "t");
        assert_eq!(table.unaliased(), TableReference::new("t_order").with_owner("public"));
    }

    #[test]
    fn column_reference_from_parts() {
        let column = ColumnReference::from_parts(&["o".to_string(), "status".to_string()]);
        assert_eq!(column.to_string(), "o.status");
    }

    #[test]
    fn update_segments_absent_by_default() {
        let update = UpdateStatement::new(TableReference::new("t"), vec![ColumnReference::new("a")]);

        assert!(update.with_segment().is_none());
        assert!(update.with_table_hint_segment().is_none());
        assert!(update.option_hint_segment().is_none());
    }

    #[test]
    fn update_segments_set_at_construction() {
        let update = UpdateStatement::new(TableReference::new("t"), Vec::new())
            .with_table_hints(WithTableHintSegment {
                hints: vec!["ROWLOCK".to_string()],
            })
            .with_option_hints(OptionHintSegment {
                hints: vec!["MAXDOP 1".to_string()],
            });

        assert_eq!(update.with_table_hint_segment().unwrap().hints, vec!["ROWLOCK"]);
        assert_eq!(update.option_hint_segment().unwrap().hints, vec!["MAXDOP 1"]);
        assert!(update.with_segment().is_none());
    }

    #[test]
    fn statement_categories() {
        let load = Statement::LoadXml(LoadXmlStatement::new("f", TableReference::new("t")));
        let show = Statement::DistSql(DistSqlStatement::ShowStorageUnits { from_database: None });
        let drop = Statement::DistSql(DistSqlStatement::DropReadwriteSplittingRule {
            names: vec!["ms_group".to_string()],
            if_exists: false,
        });

        assert_eq!(load.category(), StatementCategory::Dml);
        assert_eq!(show.category(), StatementCategory::Rql);
        assert_eq!(drop.category(), StatementCategory::Rdl);
        assert_eq!(load.kind(), "LOAD XML");
    }

    #[test]
    fn statement_serializes_with_variant_name() {
        let statement = Statement::Delete(DeleteStatement {
            tables: vec![TableReference::new("t_order")],
        });

        let json = serde_json::to_value(&statement).unwrap();
        assert_eq!(json["delete"]["tables"][0]["name"], "t_order");
    }
}
