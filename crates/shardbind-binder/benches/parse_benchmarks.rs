//! Benchmarks for parsing and binding
//!
//! Covers the standard engine path, the feature grammar fallback path and
//! URL resolution.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use shardbind_binder::SqlBindingEngine;

/// SELECT joining `joins` tables, with one IN subquery per join
fn generate_join_sql(joins: usize) -> String {
    let mut sql = String::from("SELECT t0.id FROM t_0 t0");
    for i in 1..=joins {
        sql.push_str(&format!(" JOIN t_{i} t{i} ON t{prev}.id = t{i}.parent_id", i = i, prev = i - 1));
    }
    sql.push_str(" WHERE 1 = 1");
    for i in 1..=joins {
        sql.push_str(&format!(" AND t{i}.owner_id IN (SELECT id FROM owner_{i})", i = i));
    }
    sql
}

fn bench_standard_parse(c: &mut Criterion) {
    let engine = SqlBindingEngine::builtin();
    let mut group = c.benchmark_group("standard_parse_and_bind");

    for database_type in ["MySQL", "PostgreSQL", "SQLServer"] {
        let database_type = engine.database_types().get_by_name(database_type).unwrap();

        for joins in [1usize, 8, 32] {
            let sql = generate_join_sql(joins);
            group.bench_with_input(
                BenchmarkId::new(database_type.name().to_string(), joins),
                &sql,
                |b, sql| {
                    b.iter(|| black_box(engine.parse_and_bind(database_type, sql).unwrap()));
                },
            );
        }
    }

    group.finish();
}

fn bench_feature_fallback(c: &mut Criterion) {
    let engine = SqlBindingEngine::builtin();
    let mysql = engine.database_types().get_by_name("MySQL").unwrap();
    let sqlserver = engine.database_types().get_by_name("SQLServer").unwrap();

    c.bench_function("fallback_load_xml", |b| {
        b.iter(|| {
            black_box(
                engine
                    .parse_and_bind(mysql, "LOAD XML LOCAL INFILE 'person.xml' INTO TABLE person ROWS IDENTIFIED BY '<person>'")
                    .unwrap(),
            )
        });
    });

    c.bench_function("fallback_deny", |b| {
        b.iter(|| black_box(engine.parse_and_bind(sqlserver, "DENY SELECT ON dbo.t_order TO user1").unwrap()));
    });

    c.bench_function("rejected_sql", |b| {
        b.iter(|| black_box(engine.parse_and_bind(mysql, "SELEC * FORM t").is_err()));
    });
}

fn bench_url_resolution(c: &mut Criterion) {
    let engine = SqlBindingEngine::builtin();

    c.bench_function("resolve_database_type", |b| {
        b.iter(|| {
            black_box(
                engine
                    .resolve_database_type("jdbc:opengauss://127.0.0.1:5432/demo")
                    .unwrap(),
            )
        });
    });
}

criterion_group!(benches, bench_standard_parse, bench_feature_fallback, bench_url_resolution);

criterion_main!(benches);
