use quarry_core::{builder, table, Command, Conditions, Error, Limit, QueryBuilder, Value, Values};

#[test]
fn structured_where_gets_generated_placeholders() {
    let mut query = table("user").where_([("id", 5)]);
    let (sql, params) = query.to_sql().unwrap();
    assert_eq!(sql, "SELECT * FROM user WHERE `id` = :dy0");
    assert_eq!(params.value(&":dy0".into()), Some(Value::Int(5)));
}

#[test]
fn in_between_and_groups() {
    let mut query = table("user").select(["id", "name"]).where_(
        Conditions::new()
            .add("status", 1)
            .add("id:IN", vec![3, 5])
            .add("age:BETWEEN", (18, 30))
            .open()
            .add("city", "Pallet")
            .add(" OR `city`", "Viridian")
            .close(),
    );
    let (sql, params) = query.to_sql().unwrap();
    assert_eq!(
        sql,
        "SELECT id,name FROM user WHERE `status` = :dy0 AND `id` IN (:dy1,:dy2) \
         AND `age` BETWEEN :dy3 AND :dy4 AND (`city` = :dy5 OR `city` = :dy6)"
    );
    assert_eq!(params.len(), 7);
}

#[test]
fn empty_in_list_short_circuits() {
    let empty: Vec<i64> = Vec::new();
    let mut query = table("user").where_(
        Conditions::new()
            .add("id:IN", empty.clone())
            .add("role:NOT IN", empty),
    );
    let (sql, params) = query.to_sql().unwrap();
    assert_eq!(sql, "SELECT * FROM user WHERE 1=0 AND 1=1");
    assert!(params.is_empty());
}

#[test]
fn malformed_between_is_rejected() {
    let mut query = table("user").where_(Conditions::new().add("age:BETWEEN", vec![1, 2, 3]));
    assert!(matches!(query.to_sql(), Err(Error::InvalidCondition { .. })));
}

#[test]
fn and_where_combines_raw_and_structured() {
    let mut query = table("user")
        .where_("deleted_at IS NULL")
        .and_where([("type", 2)]);
    assert_eq!(
        query.get_sql_text().unwrap(),
        "SELECT * FROM user WHERE deleted_at IS NULL AND `type` = :dy0"
    );

    let mut query = table("user")
        .where_("a = 1")
        .and_where("b = 2 OR c = 3");
    assert_eq!(
        query.get_sql_text().unwrap(),
        "SELECT * FROM user WHERE a = 1 AND (b = 2 OR c = 3)"
    );
}

#[test]
fn rendering_twice_is_stable() {
    let mut query = table("user").where_([("id", 1)]).limit(Limit::page(10, 30));
    let first = query.to_sql().unwrap();
    let second = query.to_sql().unwrap();
    assert_eq!(first, second);
    assert_eq!(first.0, "SELECT * FROM user WHERE `id` = :dy0 LIMIT 10 OFFSET 30");
}

#[test]
fn raw_limit_and_sort_lists() {
    let mut query = table("post")
        .sort(vec![("created_at", "DESC"), ("id", "ASC")])
        .limit("LIMIT :n")
        .merge_params([("n", 5)]);
    let (sql, params) = query.to_sql().unwrap();
    assert_eq!(sql, "SELECT * FROM post ORDER BY created_at DESC,id ASC LIMIT :n");
    assert_eq!(params.value(&":n".into()), Some(Value::Int(5)));
}

#[test]
fn insert_update_delete_shapes() {
    let mut insert = builder().insert_into("user", [("name", "Ash"), ("age", "10")]);
    assert_eq!(
        insert.get_sql_text().unwrap(),
        "INSERT INTO user (name,age) VALUES (:dy0,:dy1)"
    );

    let mut update = builder().update_table(
        "user",
        Values::new().set("age", 11).expr("updated_at = NOW()"),
        [("name", "Ash")],
    );
    assert_eq!(
        update.get_sql_text().unwrap(),
        "UPDATE user SET age = :dy0,updated_at = NOW() WHERE `name` = :dy1"
    );

    let mut delete = builder().delete_from("user", "age > 99");
    assert_eq!(delete.get_sql_text().unwrap(), "DELETE FROM user WHERE age > 99");
}

#[test]
fn empty_values_are_rejected() {
    let mut insert = table("user").values(Values::new()).insert();
    assert!(matches!(insert.to_sql(), Err(Error::EmptyValues { .. })));
}

#[test]
fn command_switches_keep_criteria() {
    let query = table("user").where_([("id", 9)]).limit(1);
    let mut delete = query.clone().command(Command::Delete);
    assert_eq!(
        delete.get_sql_text().unwrap(),
        "DELETE FROM user WHERE `id` = :dy0 LIMIT 1"
    );
    let mut select: QueryBuilder = query;
    assert_eq!(select.command_value(), Command::Select);
    assert_eq!(
        select.get_sql_text().unwrap(),
        "SELECT * FROM user WHERE `id` = :dy0 LIMIT 1"
    );
}

#[test]
fn generated_placeholders_avoid_caller_names() {
    let mut query = table("t")
        .where_with("a = :dy0", [("dy0", 1)])
        .and_where([("b", 2)]);
    let (sql, params) = query.to_sql().unwrap();
    assert_eq!(sql, "SELECT * FROM t WHERE a = :dy0 AND `b` = :dy1");
    assert_eq!(params.value(&":dy0".into()), Some(Value::Int(1)));
    assert_eq!(params.value(&":dy1".into()), Some(Value::Int(2)));
}
