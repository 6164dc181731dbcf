//! Statement builder
//!
//! Walks a raw parse tree and produces exactly one canonical `Statement`.
//! Standard nodes are mapped from the `sqlparser` AST; rule nodes from the
//! keyword grammars are dispatched by rule name.
//!
//! The builder trusts its input. A rule it does not know, a rule missing a
//! required child, or an error node are bugs in a grammar engine and panic.

use crate::statement::{
    ColumnReference, CommonTableExpression, CreateTableStatement, DeleteStatement, DenyStatement,
    DistSqlStatement, DropTableStatement, InsertStatement, LoadXmlStatement, OptionHintSegment,
    OtherStatement, ReadwriteSplittingRuleSegment, SelectStatement, Statement, TableReference,
    UpdateStatement, WithSegment, WithTableHintSegment,
};
use crate::tree::{rules, NodeValue, ParseNode, ParseTree, RuleNode, StandardNode};
use sqlparser::ast::{
    self, AssignmentTarget, Expr, FromTable, Function, FunctionArg, FunctionArgExpr,
    FunctionArguments, GroupByExpr, Join, JoinConstraint, JoinOperator, ObjectName, ObjectType,
    Query, Select, SelectItem, SetExpr, TableAlias, TableFactor, TableWithJoins, With,
};

/// Builds canonical statements from raw parse trees
#[derive(Debug, Clone, Copy, Default)]
pub struct StatementBuilder;

impl StatementBuilder {
    /// Build the statement for a parse tree
    ///
    /// # Panics
    ///
    /// Panics on an error node, an unknown rule name, or a rule missing a
    /// required child.
    pub fn build(&self, tree: ParseTree) -> Statement {
        match tree.into_root() {
            ParseNode::Standard(node) => build_standard(node),
            ParseNode::Rule(node) => build_rule(&node),
            ParseNode::Error(node) => panic!("error node reached the statement builder: `{}`", node.text),
        }
    }
}

fn build_standard(node: StandardNode) -> Statement {
    let StandardNode {
        statement,
        query_hints,
    } = node;

    match statement.as_ref() {
        ast::Statement::Query(query) => build_query(query, query_hints),
        ast::Statement::Insert(insert) => {
            let mut collector = TableCollector::default();
            if let Some(source) = &insert.source {
                collector.visit_query(source);
            }

            Statement::Insert(InsertStatement {
                table: table_reference(&insert.table_name, None),
                columns: insert
                    .columns
                    .iter()
                    .map(|column| ColumnReference::new(column.value.clone()))
                    .collect(),
                source_tables: collector.into_tables(),
            })
        }
        ast::Statement::Update { .. } => {
            build_update(&statement, None, &[], query_hints).unwrap_or_else(|| other(&statement))
        }
        ast::Statement::Delete(delete) => {
            let mut collector = TableCollector::default();
            for name in &delete.tables {
                collector.add_table(name, None);
            }
            match &delete.from {
                FromTable::WithFromKeyword(from) | FromTable::WithoutKeyword(from) => {
                    for table in from {
                        collector.visit_table_with_joins(table);
                    }
                }
            }
            for table in delete.using.iter().flatten() {
                collector.visit_table_with_joins(table);
            }
            if let Some(selection) = &delete.selection {
                collector.visit_expr(selection);
            }

            Statement::Delete(DeleteStatement {
                tables: collector.into_tables(),
            })
        }
        ast::Statement::CreateTable(create) => Statement::CreateTable(CreateTableStatement {
            table: table_reference(&create.name, None),
            columns: create
                .columns
                .iter()
                .map(|column| ColumnReference::new(column.name.value.clone()))
                .collect(),
        }),
        ast::Statement::Drop {
            object_type: ObjectType::Table,
            names,
            if_exists,
            ..
        } => Statement::DropTable(DropTableStatement {
            tables: names.iter().map(|name| table_reference(name, None)).collect(),
            if_exists: *if_exists,
        }),
        _ => other(&statement),
    }
}

fn other(statement: &ast::Statement) -> Statement {
    Statement::Other(OtherStatement {
        sql: statement.to_string(),
    })
}

fn build_query(query: &Query, query_hints: Vec<String>) -> Statement {
    let bound_names = cte_names(query.with.as_ref());
    let with = query.with.as_ref().map(|with| with_segment(with, &bound_names));

    match query.body.as_ref() {
        SetExpr::Update(update) => {
            build_update(update, with, &bound_names, query_hints).unwrap_or_else(|| other(update))
        }
        SetExpr::Insert(insert) => build_standard(StandardNode {
            statement: Box::new(insert.clone()),
            query_hints,
        }),
        body => {
            let mut collector = TableCollector::new(bound_names);
            collector.visit_set_expr(body);

            let select = SelectStatement::new(collector.into_tables());
            Statement::Select(match with {
                Some(with) => select.with_common_table_expressions(with),
                None => select,
            })
        }
    }
}

/// Build an UPDATE; `None` when the target is not a plain table
///
/// An unqualified target naming an alias of the `FROM` clause is resolved to
/// the aliased table.
fn build_update(
    statement: &ast::Statement,
    with: Option<WithSegment>,
    cte_names: &[String],
    query_hints: Vec<String>,
) -> Option<Statement> {
    let ast::Statement::Update {
        table,
        assignments,
        from,
        selection,
        ..
    } = statement
    else {
        return None;
    };

    let TableFactor::Table {
        name,
        alias,
        with_hints,
        ..
    } = &table.relation
    else {
        return None;
    };

    let mut collector = TableCollector::new(cte_names.to_vec());
    for join in &table.joins {
        collector.visit_join(join);
    }
    if let Some(from) = from {
        collector.visit_table_with_joins(from);
    }
    for assignment in assignments {
        collector.visit_expr(&assignment.value);
    }
    if let Some(selection) = selection {
        collector.visit_expr(selection);
    }

    let mut target = table_reference(name, alias.as_ref());
    let mut joined_tables = collector.into_tables();
    if target.owner.is_none() && target.alias.is_none() {
        let aliased = joined_tables.iter().position(|joined| {
            joined
                .alias
                .as_deref()
                .is_some_and(|from_alias| from_alias.eq_ignore_ascii_case(&target.name))
        });
        if let Some(index) = aliased {
            target = joined_tables.remove(index);
        }
    }

    let columns = assignments
        .iter()
        .flat_map(|assignment| match &assignment.target {
            AssignmentTarget::ColumnName(name) => vec![column_reference(name)],
            AssignmentTarget::Tuple(names) => names.iter().map(column_reference).collect(),
        })
        .collect();

    let mut update = UpdateStatement::new(target, columns).with_joined_tables(joined_tables);

    if let Some(with) = with {
        update = update.with_common_table_expressions(with);
    }
    if !with_hints.is_empty() {
        update = update.with_table_hints(WithTableHintSegment {
            hints: with_hints.iter().map(ToString::to_string).collect(),
        });
    }
    if !query_hints.is_empty() {
        update = update.with_option_hints(OptionHintSegment { hints: query_hints });
    }

    Some(Statement::Update(update))
}

fn cte_names(with: Option<&With>) -> Vec<String> {
    with.map(|with| {
        with.cte_tables
            .iter()
            .map(|cte| cte.alias.name.value.clone())
            .collect()
    })
    .unwrap_or_default()
}

fn with_segment(with: &With, cte_names: &[String]) -> WithSegment {
    WithSegment {
        recursive: with.recursive,
        common_table_expressions: with
            .cte_tables
            .iter()
            .map(|cte| {
                let mut collector = TableCollector::new(cte_names.to_vec());
                collector.visit_query(&cte.query);
                CommonTableExpression {
                    name: cte.alias.name.value.clone(),
                    tables: collector.into_tables(),
                }
            })
            .collect(),
    }
}

fn table_reference(name: &ObjectName, alias: Option<&TableAlias>) -> TableReference {
    let parts: Vec<String> = name.0.iter().map(|ident| ident.value.clone()).collect();
    let table = TableReference::from_parts(&parts);
    match alias {
        Some(alias) => table.with_alias(alias.name.value.clone()),
        None => table,
    }
}

fn column_reference(name: &ObjectName) -> ColumnReference {
    let parts: Vec<String> = name.0.iter().map(|ident| ident.value.clone()).collect();
    ColumnReference::from_parts(&parts)
}

/// Collects physical tables, skipping names bound by a WITH clause in scope
#[derive(Debug, Default)]
struct TableCollector {
    cte_names: Vec<String>,
    tables: Vec<TableReference>,
}

impl TableCollector {
    fn new(cte_names: Vec<String>) -> Self {
        Self {
            cte_names,
            tables: Vec::new(),
        }
    }

    /// Tables in first-seen order, duplicates removed
    fn into_tables(self) -> Vec<TableReference> {
        let mut tables: Vec<TableReference> = Vec::with_capacity(self.tables.len());
        for table in self.tables {
            if !tables.contains(&table) {
                tables.push(table);
            }
        }
        tables
    }

    fn add_table(&mut self, name: &ObjectName, alias: Option<&TableAlias>) {
        let table = table_reference(name, alias);
        let is_cte = table.owner.is_none()
            && self
                .cte_names
                .iter()
                .any(|cte| cte.eq_ignore_ascii_case(&table.name));

        if !is_cte {
            self.tables.push(table);
        }
    }

    fn visit_query(&mut self, query: &Query) {
        let scope = self.cte_names.len();

        if let Some(with) = &query.with {
            self.cte_names.extend(cte_names(Some(with)));
            for cte in &with.cte_tables {
                self.visit_query(&cte.query);
            }
        }
        self.visit_set_expr(&query.body);
        if let Some(order_by) = &query.order_by {
            for order in &order_by.exprs {
                self.visit_expr(&order.expr);
            }
        }
        if let Some(limit) = &query.limit {
            self.visit_expr(limit);
        }

        self.cte_names.truncate(scope);
    }

    fn visit_set_expr(&mut self, body: &SetExpr) {
        match body {
            SetExpr::Select(select) => self.visit_select(select),
            SetExpr::Query(query) => self.visit_query(query),
            SetExpr::SetOperation { left, right, .. } => {
                self.visit_set_expr(left);
                self.visit_set_expr(right);
            }
            SetExpr::Values(values) => {
                for row in &values.rows {
                    self.visit_exprs(row);
                }
            }
            _ => {}
        }
    }

    fn visit_select(&mut self, select: &Select) {
        for table in &select.from {
            self.visit_table_with_joins(table);
        }
        for item in &select.projection {
            if let SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } = item {
                self.visit_expr(expr);
            }
        }
        for expr in [&select.prewhere, &select.selection, &select.having, &select.qualify]
            .into_iter()
            .flatten()
        {
            self.visit_expr(expr);
        }
        if let GroupByExpr::Expressions(exprs, _) = &select.group_by {
            self.visit_exprs(exprs);
        }
        self.visit_exprs(&select.sort_by);
    }

    fn visit_table_with_joins(&mut self, table: &TableWithJoins) {
        self.visit_table_factor(&table.relation);
        for join in &table.joins {
            self.visit_join(join);
        }
    }

    fn visit_join(&mut self, join: &Join) {
        self.visit_table_factor(&join.relation);

        let constraint = match &join.join_operator {
            JoinOperator::Inner(constraint)
            | JoinOperator::LeftOuter(constraint)
            | JoinOperator::RightOuter(constraint)
            | JoinOperator::FullOuter(constraint)
            | JoinOperator::Semi(constraint)
            | JoinOperator::LeftSemi(constraint)
            | JoinOperator::RightSemi(constraint)
            | JoinOperator::Anti(constraint)
            | JoinOperator::LeftAnti(constraint)
            | JoinOperator::RightAnti(constraint) => Some(constraint),
            JoinOperator::AsOf {
                match_condition,
                constraint,
            } => {
                self.visit_expr(match_condition);
                Some(constraint)
            }
            JoinOperator::CrossJoin | JoinOperator::CrossApply | JoinOperator::OuterApply => None,
        };
        if let Some(JoinConstraint::On(expr)) = constraint {
            self.visit_expr(expr);
        }
    }

    fn visit_table_factor(&mut self, factor: &TableFactor) {
        match factor {
            TableFactor::Table { name, alias, .. } => self.add_table(name, alias.as_ref()),
            TableFactor::Derived { subquery, .. } => self.visit_query(subquery),
            TableFactor::NestedJoin {
                table_with_joins, ..
            } => self.visit_table_with_joins(table_with_joins),
            _ => {}
        }
    }

    fn visit_exprs(&mut self, exprs: &[Expr]) {
        for expr in exprs {
            self.visit_expr(expr);
        }
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Subquery(query) => self.visit_query(query),
            Expr::Exists { subquery, .. } => self.visit_query(subquery),
            Expr::InSubquery { expr, subquery, .. } => {
                self.visit_expr(expr);
                self.visit_query(subquery);
            }
            Expr::InList { expr, list, .. } => {
                self.visit_expr(expr);
                self.visit_exprs(list);
            }
            Expr::Between {
                expr, low, high, ..
            } => {
                self.visit_expr(expr);
                self.visit_expr(low);
                self.visit_expr(high);
            }
            Expr::BinaryOp { left, right, .. }
            | Expr::AnyOp { left, right, .. }
            | Expr::AllOp { left, right, .. }
            | Expr::IsDistinctFrom(left, right)
            | Expr::IsNotDistinctFrom(left, right)
            | Expr::InUnnest {
                expr: left,
                array_expr: right,
                ..
            }
            | Expr::AtTimeZone {
                timestamp: left,
                time_zone: right,
            }
            | Expr::Position {
                expr: left,
                r#in: right,
            }
            | Expr::Like {
                expr: left,
                pattern: right,
                ..
            }
            | Expr::ILike {
                expr: left,
                pattern: right,
                ..
            }
            | Expr::SimilarTo {
                expr: left,
                pattern: right,
                ..
            }
            | Expr::RLike {
                expr: left,
                pattern: right,
                ..
            } => {
                self.visit_expr(left);
                self.visit_expr(right);
            }
            Expr::Nested(inner)
            | Expr::UnaryOp { expr: inner, .. }
            | Expr::IsNull(inner)
            | Expr::IsNotNull(inner)
            | Expr::IsTrue(inner)
            | Expr::IsNotTrue(inner)
            | Expr::IsFalse(inner)
            | Expr::IsNotFalse(inner)
            | Expr::IsUnknown(inner)
            | Expr::IsNotUnknown(inner)
            | Expr::Cast { expr: inner, .. }
            | Expr::Convert { expr: inner, .. }
            | Expr::Extract { expr: inner, .. }
            | Expr::Ceil { expr: inner, .. }
            | Expr::Floor { expr: inner, .. }
            | Expr::Collate { expr: inner, .. }
            | Expr::Named { expr: inner, .. }
            | Expr::CompositeAccess { expr: inner, .. }
            | Expr::JsonAccess { value: inner, .. }
            | Expr::MapAccess { column: inner, .. }
            | Expr::Subscript { expr: inner, .. }
            | Expr::OuterJoin(inner)
            | Expr::Prior(inner) => self.visit_expr(inner),
            Expr::Substring {
                expr,
                substring_from,
                substring_for,
                ..
            } => {
                self.visit_expr(expr);
                for part in [substring_from, substring_for].into_iter().flatten() {
                    self.visit_expr(part);
                }
            }
            Expr::Trim {
                expr,
                trim_what,
                trim_characters,
                ..
            } => {
                self.visit_expr(expr);
                if let Some(what) = trim_what {
                    self.visit_expr(what);
                }
                if let Some(characters) = trim_characters {
                    self.visit_exprs(characters);
                }
            }
            Expr::Overlay {
                expr,
                overlay_what,
                overlay_from,
                overlay_for,
            } => {
                self.visit_expr(expr);
                self.visit_expr(overlay_what);
                self.visit_expr(overlay_from);
                if let Some(overlay_for) = overlay_for {
                    self.visit_expr(overlay_for);
                }
            }
            Expr::Case {
                operand,
                conditions,
                results,
                else_result,
            } => {
                for part in [operand, else_result].into_iter().flatten() {
                    self.visit_expr(part);
                }
                self.visit_exprs(conditions);
                self.visit_exprs(results);
            }
            Expr::Function(function) => self.visit_function(function),
            Expr::Tuple(exprs) => self.visit_exprs(exprs),
            Expr::Array(array) => self.visit_exprs(&array.elem),
            Expr::GroupingSets(sets) | Expr::Cube(sets) | Expr::Rollup(sets) => {
                for set in sets {
                    self.visit_exprs(set);
                }
            }
            _ => {}
        }
    }

    fn visit_function(&mut self, function: &Function) {
        self.visit_function_arguments(&function.parameters);
        self.visit_function_arguments(&function.args);
        if let Some(filter) = &function.filter {
            self.visit_expr(filter);
        }
        for order in &function.within_group {
            self.visit_expr(&order.expr);
        }
    }

    fn visit_function_arguments(&mut self, arguments: &FunctionArguments) {
        match arguments {
            FunctionArguments::None => {}
            FunctionArguments::Subquery(query) => self.visit_query(query),
            FunctionArguments::List(list) => {
                for argument in &list.args {
                    let value = match argument {
                        FunctionArg::Named { arg, .. }
                        | FunctionArg::ExprNamed { arg, .. }
                        | FunctionArg::Unnamed(arg) => arg,
                    };
                    if let FunctionArgExpr::Expr(expr) = value {
                        self.visit_expr(expr);
                    }
                }
            }
        }
    }
}

fn build_rule(node: &RuleNode) -> Statement {
    match node.rule() {
        rules::LOAD_XML => {
            let mut statement = LoadXmlStatement::new(
                required_text(node, "fileName"),
                TableReference::from_parts(required_identifier(node, "table")),
            );
            statement.local = node.has("local");
            statement.rows_identified_by = optional_text(node, "rowsIdentifiedBy");
            statement.columns = texts(node, "column")
                .into_iter()
                .filter(|column| !column.starts_with('@'))
                .map(ColumnReference::new)
                .collect();
            Statement::LoadXml(statement)
        }
        rules::DENY => {
            let mut statement = DenyStatement::new(
                texts(node, "privilege"),
                TableReference::from_parts(required_identifier(node, "table")),
                texts(node, "principal"),
            );
            statement.columns = texts(node, "column").into_iter().map(ColumnReference::new).collect();
            statement.cascade = node.has("cascade");
            Statement::Deny(statement)
        }
        rules::SHOW_STORAGE_UNITS => Statement::DistSql(DistSqlStatement::ShowStorageUnits {
            from_database: optional_text(node, "database"),
        }),
        rules::UNREGISTER_STORAGE_UNIT => Statement::DistSql(DistSqlStatement::UnregisterStorageUnit {
            names: required_texts(node, "name"),
            if_exists: node.has("ifExists"),
            ignore_single_tables: node.has("ignoreSingleTables"),
        }),
        rules::CREATE_READWRITE_SPLITTING_RULE => {
            let definitions = node
                .children("rule")
                .map(|child| {
                    let definition = child.as_rule().unwrap_or_else(|| {
                        panic!("rule `{}` has a non-rule `rule` child", node.rule())
                    });
                    readwrite_splitting_rule(definition)
                })
                .collect::<Vec<_>>();
            if definitions.is_empty() {
                missing_child(node, "rule");
            }

            Statement::DistSql(DistSqlStatement::CreateReadwriteSplittingRule {
                if_not_exists: node.has("ifNotExists"),
                rules: definitions,
            })
        }
        rules::DROP_READWRITE_SPLITTING_RULE => {
            Statement::DistSql(DistSqlStatement::DropReadwriteSplittingRule {
                names: required_texts(node, "name"),
                if_exists: node.has("ifExists"),
            })
        }
        rules::SHOW_READWRITE_SPLITTING_RULES => {
            Statement::DistSql(DistSqlStatement::ShowReadwriteSplittingRules {
                rule_name: optional_text(node, "name"),
                from_database: optional_text(node, "database"),
            })
        }
        unknown => panic!("unknown grammar rule `{}`", unknown),
    }
}

fn readwrite_splitting_rule(node: &RuleNode) -> ReadwriteSplittingRuleSegment {
    assert_eq!(
        node.rule(),
        rules::READWRITE_SPLITTING_RULE_DEFINITION,
        "unexpected rule inside a read/write-splitting rule list"
    );

    ReadwriteSplittingRuleSegment {
        name: required_text(node, "name"),
        write_storage_unit: required_text(node, "writeStorageUnit"),
        read_storage_units: required_texts(node, "readStorageUnit"),
        load_balancer: optional_text(node, "loadBalancer"),
    }
}

fn missing_child(node: &RuleNode, label: &str) -> ! {
    panic!("rule `{}` is missing required child `{}`", node.rule(), label)
}

fn required_text(node: &RuleNode, label: &str) -> String {
    match node.child(label).and_then(NodeValue::as_text) {
        Some(text) => text.to_string(),
        None => missing_child(node, label),
    }
}

fn required_identifier<'a>(node: &'a RuleNode, label: &str) -> &'a [String] {
    match node.child(label).and_then(NodeValue::as_identifier) {
        Some(parts) => parts,
        None => missing_child(node, label),
    }
}

fn required_texts(node: &RuleNode, label: &str) -> Vec<String> {
    let values = texts(node, label);
    if values.is_empty() {
        missing_child(node, label);
    }
    values
}

fn optional_text(node: &RuleNode, label: &str) -> Option<String> {
    node.child(label).and_then(NodeValue::as_text).map(str::to_string)
}

fn texts(node: &RuleNode, label: &str) -> Vec<String> {
    node.children(label)
        .filter_map(NodeValue::as_text)
        .map(str::to_string)
        .collect()
}
