mod common;

use common::{tag, MockDriver};
use pretty_assertions::assert_eq;
use serde::Serialize;
use sqltag::{sql, Arg, Record, Value};

#[test]
fn test_id_is_escaped_not_bound() {
    let sql = tag();
    let compiled = sql.id("name").compile();
    assert_eq!(compiled.sql, "`name`");
    assert!(compiled.params.is_empty());

    assert_eq!(sql.id("we`ird").compile().sql, "`we``ird`");
}

#[test]
fn test_raw_is_inlined() {
    let sql = tag();
    let query = sql!(sql; "UPDATE t SET updated_at = " {sql.raw("NOW()")} " WHERE id = " {1});
    let compiled = query.compile();
    assert_eq!(compiled.sql, "UPDATE t SET updated_at = NOW() WHERE id = $1");
    assert_eq!(compiled.params, vec![Value::Int(1)]);
}

#[test]
fn test_join() {
    let sql = tag();
    let compiled = sql.join([1, 2, 3]).compile();
    assert_eq!(compiled.sql, "$1, $2, $3");
    assert_eq!(compiled.params, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
}

#[test]
fn test_join_edge_cases() {
    let sql = tag();
    assert_eq!(sql.join(Vec::<i32>::new()).compile().sql, "");
    assert_eq!(sql.join([sql.id("a")]).compile().sql, "`a`");
    assert_eq!(
        sql.join([Some(1), None, Some(3)]).compile().sql,
        "$1, $2",
    );
    assert_eq!(
        sql.join_with([sql.id("a"), sql.id("b")], " || ").compile().sql,
        "`a` || `b`",
    );
}

#[test]
fn test_join_mixed_items() {
    let sql = tag();
    let items: Vec<Arg<MockDriver>> = vec![
        sql.id("name").into(),
        Arg::Omitted,
        sql!(sql; "COALESCE(age, " {0} ")").into(),
        Value::from("x").into(),
    ];
    let compiled = sql.join(items).compile();
    assert_eq!(compiled.sql, "`name`, COALESCE(age, $1), $2");
    assert_eq!(compiled.params, vec![Value::Int(0), Value::from("x")]);
}

#[test]
fn test_and_or() {
    let sql = tag();
    let filter = sql.and([
        sql!(sql; "age > " {18}),
        sql.or([sql!(sql; "city = " {"paris"}), sql!(sql; "city = " {"rome"})]),
    ]);
    let compiled = sql!(sql; "SELECT * FROM users WHERE " {filter}).compile();

    assert_eq!(
        compiled.sql,
        "SELECT * FROM users WHERE (age > $1 AND (city = $2 OR city = $3))"
    );
    assert_eq!(
        compiled.params,
        vec![Value::Int(18), Value::from("paris"), Value::from("rome")]
    );
}

#[test]
fn test_and_skips_omitted_conditions() {
    let sql = tag();
    let name: Option<&str> = None;
    let filter = sql.and([
        Some(sql!(sql; "active = " {true})),
        name.map(|n| sql!(sql; "name = " {n})),
    ]);
    let compiled = filter.compile();
    assert_eq!(compiled.sql, "(active = $1)");
    assert_eq!(compiled.params, vec![Value::Bool(true)]);
}

#[test]
fn test_in_list() {
    let sql = tag();
    let compiled = sql.in_list("id", [Some(1), None, Some(3)]).compile();
    assert_eq!(compiled.sql, "`id` IN ($1, $2)");
    assert_eq!(compiled.params, vec![Value::Int(1), Value::Int(3)]);
}

#[test]
fn test_in_list_empty() {
    let sql = tag();
    let compiled = sql.in_list("id", Vec::<i32>::new()).compile();
    assert_eq!(compiled.sql, "$1");
    assert_eq!(compiled.params, vec![Value::Int(0)]);

    let compiled = sql.in_list("id", [None::<i32>, None]).compile();
    assert_eq!(compiled.sql, "$1");
    assert_eq!(compiled.params, vec![Value::Int(0)]);
}

#[test]
fn test_in_list_or_custom_fallback() {
    let sql = tag();
    let query = sql!(sql; "SELECT * FROM t WHERE " {sql.in_list_or("id", Vec::<i64>::new(), 1)});
    let compiled = query.compile();
    assert_eq!(compiled.sql, "SELECT * FROM t WHERE $1");
    assert_eq!(compiled.params, vec![Value::Int(1)]);
}

#[test]
fn test_set_values_all_keys() {
    let sql = tag();
    let record = Record::new().with("name", "bob").with("age", 30);
    let query = sql!(sql; "UPDATE users SET " {sql.set_values(&record, &[])} " WHERE id = " {7});
    let compiled = query.compile();

    assert_eq!(compiled.sql, "UPDATE users SET `name` = $1, `age` = $2 WHERE id = $3");
    assert_eq!(
        compiled.params,
        vec![Value::from("bob"), Value::Int(30), Value::Int(7)]
    );
}

#[test]
fn test_set_values_selected_keys() {
    let sql = tag();
    let record = Record::new().with("name", "bob").with("age", 30).with("id", 7);
    let compiled = sql.set_values(&record, &["age", "missing"]).compile();

    assert_eq!(compiled.sql, "`age` = $1, `missing` = ");
    assert_eq!(compiled.params, vec![Value::Int(30)]);
}

#[test]
fn test_insert_values() {
    let sql = tag();
    let rows = vec![
        Record::new().with("id", 1).with("name", "a"),
        Record::new().with("id", 2).with("name", "b"),
    ];
    let compiled = sql.insert_values(&rows, &[]).compile();

    assert_eq!(compiled.sql, "(`id`, `name`) VALUES ($1, $2), ($3, $4)");
    assert_eq!(
        compiled.params,
        vec![Value::Int(1), Value::from("a"), Value::Int(2), Value::from("b")]
    );
}

#[test]
fn test_insert_values_uses_first_record_keys() {
    let sql = tag();
    let rows = vec![
        Record::new().with("id", 1).with("name", "a"),
        Record::new().with("name", "b").with("id", 2).with("extra", true),
    ];
    let compiled = sql.insert_values(&rows, &[]).compile();

    assert_eq!(compiled.sql, "(`id`, `name`) VALUES ($1, $2), ($3, $4)");
    assert_eq!(
        compiled.params,
        vec![Value::Int(1), Value::from("a"), Value::Int(2), Value::from("b")]
    );
}

#[test]
fn test_insert_row_with_explicit_keys_and_null() {
    let sql = tag();
    let record = Record::new().with("id", 1).with("bio", Value::Null).with("name", "a");
    let query = sql!(sql; "INSERT INTO users " {sql.insert_row(&record, &["name", "bio"])});
    let compiled = query.compile();

    assert_eq!(compiled.sql, "INSERT INTO users (`name`, `bio`) VALUES ($1, $2)");
    assert_eq!(compiled.params, vec![Value::from("a"), Value::Null]);
}

#[test]
fn test_records_from_structs() {
    #[derive(Serialize)]
    struct NewUser {
        name: &'static str,
        tags: Vec<&'static str>,
    }

    let sql = tag();
    let record = Record::from_serialize(&NewUser {
        name: "bob",
        tags: vec!["a", "b"],
    })
    .unwrap();
    let compiled = sql.insert_row(&record, &[]).compile();

    assert_eq!(compiled.sql, "(`name`, `tags`) VALUES ($1, $2)");
    assert_eq!(
        compiled.params,
        vec![Value::from("bob"), Value::from(r#"["a","b"]"#)]
    );
}

#[test]
fn test_facade_output_composes() {
    let sql = tag();
    let ids = vec![4, 5];
    let query = sql!(sql;
        "SELECT " {sql.join([sql.id("id"), sql.id("name")])}
        " FROM " {sql.id("users")}
        " WHERE " {sql.and([sql.in_list("id", ids), sql!(sql; "active = " {true})])}
        " LIMIT " {10}
    );
    let compiled = query.compile();

    assert_eq!(
        compiled.sql,
        "SELECT `id`, `name` FROM `users` WHERE (`id` IN ($1, $2) AND active = $3) LIMIT $4"
    );
    assert_eq!(compiled.params.len(), 4);
}
