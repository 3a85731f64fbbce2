use quarry_core::mock::MockConnection;
use quarry_core::{builder, table, Conditions, Limit, Value, Values};

fn main() -> quarry_core::Result<()> {
    // SELECT with structured conditions
    let mut select = table(("book", "b"))
        .select(["b.id", "b.name AS title", "a.name AS author"])
        .left_join(("author", "a"), "a.id = b.author_id")
        .where_(
            Conditions::new()
                .add("b.on_shelf", 1)
                .add("b.category_id:IN", vec![3, 5, 8])
                .add("b.price:BETWEEN", (10, 50)),
        )
        .sort("b.id DESC")
        .limit(Limit::page(20, 40));

    let (sql, params) = select.to_sql()?;
    println!("SELECT SQL: {}", sql);
    for (key, binding) in params.iter() {
        println!("  {} = {}", key, binding.current());
    }

    // INSERT with a raw SQL expression
    let mut insert = builder().insert_into(
        "book",
        Values::new()
            .set("name", "Dune")
            .set("author_id", 7)
            .expr("created_at={:NOW()"),
    );
    println!("INSERT SQL: {}", insert.get_sql_text()?);

    // UPDATE
    let mut update = builder().update_table("book", [("on_shelf", 0)], [("id", 42)]);
    println!("UPDATE SQL: {}", update.get_sql_text()?);

    // DELETE
    let mut delete = builder().delete_from("book", "on_shelf = 0 AND updated_at < NOW() - INTERVAL 1 YEAR");
    println!("DELETE SQL: {}", delete.get_sql_text()?);

    // Grouped results against the in-memory driver
    let conn = MockConnection::new().with_rows(
        &["author", "books"],
        vec![
            vec!["Herbert".into(), Value::Int(6)],
            vec!["Le Guin".into(), Value::Int(4)],
        ],
    );
    let counts = table(("book", "b"))
        .left_join(("author", "a"), "a.id = b.author_id")
        .select_map("a.name AS author", "COUNT(b.id) AS books")
        .group("a.id")
        .build_with(&conn)?
        .fetch_map(None)?;
    if let Some(counts) = counts.as_values() {
        for (author, books) in counts {
            println!("{}: {}", author, books);
        }
    }

    Ok(())
}
