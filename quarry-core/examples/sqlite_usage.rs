use quarry_core::executor::any::AnyConnection;
use quarry_core::{builder, table, Conditions, Params, Query, Value};

fn main() -> quarry_core::Result<()> {
    let conn = AnyConnection::connect("sqlite::memory:")?;

    Query::new(
        "CREATE TABLE user (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, age INTEGER)",
        Params::new(),
    )
    .on(&conn)
    .execute()?;

    for (name, age) in [("John", 35), ("Ash", 35), ("Mo", 20)] {
        builder()
            .insert_into("user", [("name", Value::from(name)), ("age", Value::from(age))])
            .execute(&conn)?;
    }

    let adults = table("user")
        .where_(Conditions::new().add("age:>=", 21))
        .count(&conn)?;
    println!("adults: {}", adults);

    let by_age = table("user")
        .select_map("age[]", "name")
        .sort("id")
        .build_with(&conn)?
        .fetch_map(None)?;
    println!("{:?}", by_age);

    let mut query = Query::new("SELECT name FROM user WHERE id = :id", [("id", 2)]).on(&conn);
    println!("id 2: {:?}", query.fetch_scalar()?);
    query.bind_value(":id", 3)?;
    println!("id 3: {:?}", query.fetch_scalar()?);

    Ok(())
}
