//! Quarry Core - a MySQL-flavored statement builder with a prepared
//! statement layer.
//!
//! Conditions are compiled into parameterized SQL with generated `:dyN`
//! placeholders, statements are rendered by a fluent [`QueryBuilder`], and
//! the resulting [`Query`] prepares lazily on a [`Connection`] and
//! materializes rows in several shapes, including grouped maps.
//!
//! ```
//! use quarry_core::mock::MockConnection;
//! use quarry_core::{table, MapKey, Value};
//!
//! let conn = MockConnection::new().with_rows(
//!     &["id", "name"],
//!     vec![vec![Value::Int(2), "John".into()], vec![Value::Int(3), "Ash".into()]],
//! );
//!
//! let names = table("user")
//!     .select_map("id", "name")
//!     .where_([("age", 35)])
//!     .build_with(&conn)?
//!     .fetch_map(None)?;
//!
//! let names = names.as_values().unwrap();
//! assert_eq!(names[&MapKey::Int(2)], Value::from("John"));
//! assert_eq!(names[&MapKey::Int(3)], Value::from("Ash"));
//! # Ok::<(), quarry_core::Error>(())
//! ```

pub mod builder;
pub mod condition;
pub mod config;
pub mod criteria;
pub mod error;
pub mod executor;
pub mod mock;
pub mod operator;
pub mod params;
pub mod query;
pub mod repository;
pub mod row;
pub mod value;

// Re-export main types
pub use builder::{Command, IntoColumns, IntoTable, QueryBuilder, Values};
pub use condition::{Condition, ConditionEntry, ConditionValue, Conditions};
pub use config::{BuilderConfig, DatabaseConfig};
pub use criteria::{Criteria, Limit, Sort};
pub use error::{Error, Result};
pub use executor::{Connection, Statement};
pub use operator::Operator;
pub use params::{Binding, ParamKey, Params, Slot};
pub use query::{Query, QueryOptions};
pub use repository::Repository;
pub use row::{FetchMap, MapFields, MapOption, Row};
pub use value::{MapKey, ParamType, Value};

/// A fresh, empty query builder
pub fn builder() -> QueryBuilder {
    QueryBuilder::new()
}

/// Create a SELECT builder for the given table
pub fn table(table: impl IntoTable) -> QueryBuilder {
    QueryBuilder::new().table(table)
}
