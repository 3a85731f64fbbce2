//! Per-table facade over the statement builder

use crate::builder::{IntoColumns, QueryBuilder, Values};
use crate::condition::Condition;
use crate::error::Result;
use crate::executor::Connection;
use crate::row::Row;
use crate::value::Value;

/// Attribute names reported by [`Repository::attributes`]
pub const ATTRIBUTES: [&str; 6] = [
    "AUTOCOMMIT",
    "CLIENT_VERSION",
    "CONNECTION_STATUS",
    "DRIVER_NAME",
    "SERVER_INFO",
    "SERVER_VERSION",
];

/// A table-bound data access object.
///
/// Implementors name their table and hand out a connection; every other
/// method builds a [`QueryBuilder`] for that table and runs it.
///
/// ```
/// use quarry_core::mock::MockConnection;
/// use quarry_core::{Repository, Value};
///
/// struct Users {
///     conn: MockConnection,
/// }
///
/// impl Repository for Users {
///     type Connection = MockConnection;
///
///     fn table(&self) -> &str {
///         "user"
///     }
///
///     fn connection(&self) -> &MockConnection {
///         &self.conn
///     }
/// }
///
/// let users = Users { conn: MockConnection::new().with_affected(1) };
/// assert_eq!(users.delete([("id", 4)]).unwrap(), 1);
/// assert_eq!(
///     users.conn.last_execution().unwrap().sql,
///     "DELETE FROM user WHERE `id` = :dy0"
/// );
/// ```
pub trait Repository {
    type Connection: Connection;

    fn table(&self) -> &str;

    fn connection(&self) -> &Self::Connection;

    /// A fresh builder for this table
    fn query(&self) -> QueryBuilder {
        QueryBuilder::new().table(self.table())
    }

    /// First matching row
    fn get_one(&self, columns: impl IntoColumns, condition: impl Into<Condition>) -> Result<Option<Row>> {
        self.query()
            .select(columns)
            .where_(condition)
            .limit(1)
            .build_with(self.connection())?
            .fetch_row()
    }

    fn get_all(&self, columns: impl IntoColumns, condition: impl Into<Condition>) -> Result<Vec<Row>> {
        self.query()
            .select(columns)
            .where_(condition)
            .build_with(self.connection())?
            .fetch_all()
    }

    fn insert(&self, values: impl Into<Values>) -> Result<u64> {
        self.query().values(values).insert().execute(self.connection())
    }

    /// Insert, overwriting a row with the same unique key
    fn replace(&self, values: impl Into<Values>) -> Result<u64> {
        self.query().values(values).replace().execute(self.connection())
    }

    fn update(&self, values: impl Into<Values>, condition: impl Into<Condition>) -> Result<u64> {
        self.query()
            .values(values)
            .where_(condition)
            .update()
            .execute(self.connection())
    }

    fn delete(&self, condition: impl Into<Condition>) -> Result<u64> {
        self.query().where_(condition).delete().execute(self.connection())
    }

    fn exists(&self, condition: impl Into<Condition>) -> Result<bool> {
        self.query().where_(condition).exists(self.connection())
    }

    fn count(&self, condition: impl Into<Condition>) -> Result<i64> {
        self.query().where_(condition).count(self.connection())
    }

    fn max(&self, column: &str, condition: impl Into<Condition>) -> Result<Option<Value>> {
        aggregate(self, "MAX", column, condition.into())
    }

    fn min(&self, column: &str, condition: impl Into<Condition>) -> Result<Option<Value>> {
        aggregate(self, "MIN", column, condition.into())
    }

    fn avg(&self, column: &str, condition: impl Into<Condition>) -> Result<Option<Value>> {
        aggregate(self, "AVG", column, condition.into())
    }

    fn sum(&self, column: &str, condition: impl Into<Condition>) -> Result<Option<Value>> {
        aggregate(self, "SUM", column, condition.into())
    }

    fn last_insert_id(&self) -> Result<Value> {
        self.connection().last_insert_id()
    }

    /// Driver attributes by name. Attributes the driver cannot report come
    /// back as an empty string.
    fn attributes(&self) -> Vec<(&'static str, Value)> {
        ATTRIBUTES
            .iter()
            .map(|&name| {
                let value = match self.connection().attribute(name) {
                    Ok(Value::Null) => Value::String(String::new()),
                    Ok(value) => value,
                    Err(e) => {
                        tracing::debug!(
                            target: "quarry.sql",
                            attribute = name,
                            error = %e,
                            "attribute unavailable"
                        );
                        Value::String(String::new())
                    }
                };
                (name, value)
            })
            .collect()
    }
}

fn aggregate<R: Repository + ?Sized>(
    repository: &R,
    function: &str,
    column: &str,
    condition: Condition,
) -> Result<Option<Value>> {
    repository
        .query()
        .select(format!("{}({})", function, column))
        .where_(condition)
        .build_with(repository.connection())?
        .fetch_scalar()
}
