//! End-to-end tests: URL resolution, parsing and binding

use pretty_assertions::assert_eq;
use shardbind_binder::{
    DialectStatementExtractor, ExtractorRegistry, SqlBindingEngine, StatementContext,
};
use shardbind_core::{DatabaseType, DatabaseTypeRegistry, ErrorCategory, ErrorCode, ShardbindError};
use shardbind_sql::{GrammarRegistry, Statement, StatementCategory, TableReference};
use std::collections::BTreeSet;
use std::sync::Arc;

fn tables(names: &[&str]) -> BTreeSet<TableReference> {
    names.iter().map(|name| TableReference::new(*name)).collect()
}

#[test]
fn mysql_url_resolves_to_trunk_over_branches() {
    let mut types = DatabaseTypeRegistry::new();
    types.register(DatabaseType::new("MySQL", ["jdbc:mysql:"])).unwrap();
    types
        .register(DatabaseType::new("Doris", ["jdbc:mysql:"]).branch_of("MySQL"))
        .unwrap();
    types
        .register(DatabaseType::new("StarRocks", ["jdbc:mysql:"]).branch_of("MySQL"))
        .unwrap();

    let engine = SqlBindingEngine::new(types, GrammarRegistry::builtin(), ExtractorRegistry::builtin());

    let resolved = engine.resolve_database_type("jdbc:mysql://localhost/x").unwrap();
    assert_eq!(resolved.name(), "MySQL");
}

#[test]
fn builtin_urls_resolve() {
    let engine = SqlBindingEngine::builtin();

    let cases = [
        ("jdbc:mysql://127.0.0.1:3306/demo", "MySQL"),
        ("jdbc:mariadb://127.0.0.1:3306/demo", "MariaDB"),
        ("jdbc:postgresql://127.0.0.1:5432/demo", "PostgreSQL"),
        ("jdbc:opengauss://127.0.0.1:5432/demo", "openGauss"),
        ("jdbc:sqlserver://127.0.0.1:1433;DatabaseName=demo", "SQLServer"),
        ("jdbc:h2:mem:demo", "H2"),
    ];

    for (url, expected) in cases {
        assert_eq!(engine.resolve_database_type(url).unwrap().name(), expected, "{}", url);
    }
}

#[test]
fn unmatched_url_is_unsupported_storage_type() {
    let engine = SqlBindingEngine::builtin();

    let err = engine.resolve_database_type("jdbc:unknown://host/db").unwrap_err();

    assert_eq!(
        err,
        ShardbindError::UnsupportedStorageType {
            url: "jdbc:unknown://host/db".to_string(),
        }
    );
    assert_eq!(err.code(), ErrorCode::UnsupportedStorageType);
    assert_eq!(err.category(), ErrorCategory::ConfigurationMismatch);
}

#[test]
fn load_xml_binds_its_table() {
    let engine = SqlBindingEngine::builtin();
    let mysql = engine.database_types().get_by_name("MySQL").unwrap();

    let context = engine
        .parse_and_bind(mysql, "LOAD XML INFILE 'f' INTO TABLE t")
        .unwrap();

    assert_eq!(context.tables(), &tables(&["t"]));
    assert_eq!(context.category(), StatementCategory::Dml);
    assert_eq!(context.database_type(), "MySQL");
}

#[test]
fn sqlserver_deny_binds_extracted_table() {
    let engine = SqlBindingEngine::builtin();
    let sqlserver = engine.database_types().get_by_name("SQLServer").unwrap();

    let context = engine
        .parse_and_bind(sqlserver, "DENY SELECT ON t TO user1")
        .unwrap();

    let Statement::Deny(deny) = context.statement() else {
        panic!("expected DENY, got {:?}", context.statement());
    };
    assert_eq!(
        engine.extractors().extract_tables("SQLServer", context.statement()),
        tables(&["t"])
    );
    assert_eq!(deny.principals, vec!["user1"]);
    assert_eq!(context.tables(), &tables(&["t"]));
    assert_eq!(context.category(), StatementCategory::Dcl);
}

#[test]
fn misspelled_sql_is_rejected_with_its_text() {
    let engine = SqlBindingEngine::builtin();
    let mysql = engine.database_types().get_by_name("MySQL").unwrap();

    let err = engine.parse_and_bind(mysql, "SELEC * FORM t").unwrap_err();

    assert_eq!(err.code(), ErrorCode::SqlParsing);
    assert_eq!(err.category(), ErrorCategory::InputRejected);
    assert_eq!(err.sql(), Some("SELEC * FORM t"));
    assert!(err.to_string().contains("SELEC * FORM t"));
}

#[test]
fn parse_and_bind_is_idempotent() {
    let engine = SqlBindingEngine::builtin();
    let postgres = engine.database_types().get_by_name("PostgreSQL").unwrap();
    let sql = "WITH recent AS (SELECT * FROM t_order) SELECT * FROM recent JOIN t_user u ON u.id = recent.user_id";

    let first = engine.parse_and_bind(postgres, sql).unwrap();
    let second = engine.parse_and_bind(postgres, sql).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.table_names(), vec!["t_order", "t_user"]);
}

#[test]
fn sqlserver_update_segments_survive_binding() {
    let engine = SqlBindingEngine::builtin();
    let sqlserver = engine.database_types().get_by_name("SQLServer").unwrap();

    let context = engine
        .parse_and_bind(
            sqlserver,
            "UPDATE t_order WITH (ROWLOCK) SET status = 'done', updated_at = 1 WHERE id = 1 OPTION (MAXDOP 1)",
        )
        .unwrap();

    let Statement::Update(update) = context.statement() else {
        panic!("expected UPDATE, got {:?}", context.statement());
    };
    assert!(update.with_segment().is_none());
    assert_eq!(update.with_table_hint_segment().unwrap().hints, vec!["ROWLOCK"]);
    assert_eq!(update.option_hint_segment().unwrap().hints, vec!["MAXDOP 1"]);
    assert_eq!(context.columns().len(), 2);
}

#[test]
fn update_from_clause_binds_every_table() {
    let engine = SqlBindingEngine::builtin();
    let postgres = engine.database_types().get_by_name("PostgreSQL").unwrap();
    let sqlserver = engine.database_types().get_by_name("SQLServer").unwrap();

    let context = engine
        .parse_and_bind(
            postgres,
            "UPDATE t_order SET status = s.status FROM t_status s WHERE t_order.status_id = s.id",
        )
        .unwrap();
    assert_eq!(context.tables(), &tables(&["t_order", "t_status"]));

    let context = engine
        .parse_and_bind(
            sqlserver,
            "UPDATE o SET o.status = 'x' FROM t_order o JOIN t_user u ON u.id = o.user_id",
        )
        .unwrap();
    let Statement::Update(update) = context.statement() else {
        panic!("expected UPDATE, got {:?}", context.statement());
    };
    assert_eq!(update.table().name, "t_order");
    assert_eq!(context.tables(), &tables(&["t_order", "t_user"]));
    assert_eq!(context.aliases().get("o"), Some(&TableReference::new("t_order")));
}

#[test]
fn subqueries_inside_expressions_are_bound() {
    let engine = SqlBindingEngine::builtin();
    let mysql = engine.database_types().get_by_name("MySQL").unwrap();

    let cases = [
        (
            "SELECT * FROM t_order WHERE COALESCE((SELECT MAX(id) FROM t_user), 0) > 1",
            &["t_order", "t_user"][..],
        ),
        (
            "SELECT CASE WHEN EXISTS (SELECT 1 FROM t_audit) THEN 1 ELSE 0 END FROM t_order",
            &["t_audit", "t_order"][..],
        ),
        (
            "SELECT * FROM t_order WHERE id BETWEEN (SELECT 1 FROM u) AND 3",
            &["t_order", "u"][..],
        ),
    ];

    for (sql, expected) in cases {
        let context = engine.parse_and_bind(mysql, sql).unwrap();
        assert_eq!(context.tables(), &tables(expected), "{}", sql);
    }
}

#[test]
fn postgres_show_statements_parse() {
    let engine = SqlBindingEngine::builtin();
    let postgres = engine.database_types().get_by_name("PostgreSQL").unwrap();

    for sql in ["SHOW search_path", "SHOW TIME ZONE"] {
        let context = engine.parse_and_bind(postgres, sql).unwrap();
        assert_eq!(context.statement().kind(), "OTHER", "{}", sql);
        assert!(context.tables().is_empty());
    }

    let context = engine.parse_and_bind(postgres, "SHOW STORAGE UNITS").unwrap();
    assert_eq!(context.category(), StatementCategory::Rql);
}

#[test]
fn self_join_binds_one_table() {
    let engine = SqlBindingEngine::builtin();
    let mysql = engine.database_types().get_by_name("MySQL").unwrap();

    let context = engine
        .parse_and_bind(mysql, "SELECT * FROM t_order a JOIN t_order b ON a.parent_id = b.id")
        .unwrap();

    assert_eq!(context.tables(), &tables(&["t_order"]));
    assert_eq!(context.table_names(), vec!["t_order"]);
    assert_eq!(context.aliases().len(), 2);
}

#[test]
fn dist_sql_binds_without_tables() {
    let engine = SqlBindingEngine::builtin();
    let postgres = engine.database_types().get_by_name("PostgreSQL").unwrap();

    let context = engine
        .parse_and_bind(postgres, "DROP READWRITE_SPLITTING RULE IF EXISTS ms_group")
        .unwrap();

    assert!(context.tables().is_empty());
    assert_eq!(context.category(), StatementCategory::Rdl);
}

struct ShadowTableExtractor;

impl DialectStatementExtractor for ShadowTableExtractor {
    fn database_type(&self) -> &str {
        "MySQL"
    }

    fn extract_tables(&self, _statement: &Statement) -> Vec<TableReference> {
        vec![TableReference::new("t_shadow")]
    }
}

#[test]
fn extractors_only_add_tables() {
    let mut extractors = ExtractorRegistry::builtin();
    extractors.register(Arc::new(ShadowTableExtractor));

    let with_extractor = SqlBindingEngine::new(DatabaseTypeRegistry::builtin(), GrammarRegistry::builtin(), extractors);
    let without_extractor = SqlBindingEngine::new(
        DatabaseTypeRegistry::builtin(),
        GrammarRegistry::builtin(),
        ExtractorRegistry::new(),
    );
    let mysql = DatabaseTypeRegistry::builtin().get_by_name("MySQL").unwrap().clone();
    let sql = "DELETE FROM t_order WHERE id = 1";

    let extended = with_extractor.parse_and_bind(&mysql, sql).unwrap();
    let structural = without_extractor.parse_and_bind(&mysql, sql).unwrap();

    assert_eq!(structural.tables(), &tables(&["t_order"]));
    assert_eq!(extended.tables(), &tables(&["t_order", "t_shadow"]));
    assert!(structural.tables().is_subset(extended.tables()));
}

#[test]
fn concurrent_parse_and_bind() {
    let engine = SqlBindingEngine::builtin();
    let mysql = engine.database_types().get_by_name("MySQL").unwrap();
    let expected = engine
        .parse_and_bind(mysql, "SELECT * FROM t_order o JOIN t_order_item i ON o.id = i.order_id")
        .unwrap();

    let contexts: Vec<StatementContext> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    engine
                        .parse_and_bind(mysql, "SELECT * FROM t_order o JOIN t_order_item i ON o.id = i.order_id")
                        .unwrap()
                })
            })
            .collect();

        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    for context in contexts {
        assert_eq!(context, expected);
    }
}
