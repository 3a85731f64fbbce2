//! Error types for Quarry

use thiserror::Error;

/// The main error type for Quarry operations
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed structured condition (wrong value shape for IN / NOT IN / BETWEEN)
    #[error("Invalid condition: {message}")]
    InvalidCondition { message: String },

    /// INSERT or UPDATE attempted without any column values
    #[error("{command} requires at least one value")]
    EmptyValues { command: &'static str },

    /// A value of a type the statement cannot place
    #[error("Invalid value type for '{column}': {message}")]
    InvalidValueType { column: String, message: String },

    /// Positional `?` placeholder used where only `:name` placeholders work
    #[error("Unsupported placeholder '{placeholder}', use the :name form instead")]
    UnsupportedPlaceholder { placeholder: String },

    /// Render attempted before a table was set
    #[error("Table name must not be empty")]
    MissingTable,

    /// `execute()` called on a SELECT builder
    #[error("execute() cannot run a SELECT statement, fetch its results instead")]
    WrongCommandForExecute,

    /// `fetch_map()` called with no grouping instruction available
    #[error("fetch_map requires a map option, either on invocation or via select_map")]
    MissingFetchMapOption,

    /// Command string outside SELECT / INSERT / UPDATE / DELETE
    #[error("Unsupported SQL command '{command}'")]
    UnsupportedCommand { command: String },

    /// Opaque failure reported by a driver
    #[error("Driver failure: {message}")]
    DriverFailure { message: String },

    /// Failure reported by the sqlx-backed driver
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Row to object mapping error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A query was run without a connection
    #[error("An active connection is required to prepare a statement")]
    MissingConnection,

    /// Column referenced by a fetch map is absent from the result set
    #[error("Column '{column}' not found in result set")]
    ColumnNotFound { column: String },

    /// An aggregate query returned no value
    #[error("Query failed: {message}")]
    QueryFailed { message: String },

    /// Invalid database configuration
    #[error("Invalid configuration: {message}")]
    Config { message: String },
}

/// Convenience Result type for Quarry operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new invalid condition error
    pub fn invalid_condition(message: impl Into<String>) -> Self {
        Self::InvalidCondition {
            message: message.into(),
        }
    }

    /// Create a new invalid value type error
    pub fn invalid_value_type(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValueType {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a new unsupported command error
    pub fn unsupported_command(command: impl Into<String>) -> Self {
        Self::UnsupportedCommand {
            command: command.into(),
        }
    }

    /// Create a new driver failure
    pub fn driver(message: impl Into<String>) -> Self {
        Self::DriverFailure {
            message: message.into(),
        }
    }

    /// Create a new column not found error
    pub fn column_not_found(column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
        }
    }

    /// Create a new query failed error
    pub fn query_failed(message: impl Into<String>) -> Self {
        Self::QueryFailed {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error came from the underlying connection or statement
    pub fn is_driver_failure(&self) -> bool {
        matches!(self, Self::DriverFailure { .. } | Self::Database(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_condition_error() {
        let err = Error::invalid_condition("IN expects a list");
        assert!(matches!(err, Error::InvalidCondition { .. }));
        assert_eq!(err.to_string(), "Invalid condition: IN expects a list");
    }

    #[test]
    fn test_empty_values_error() {
        let err = Error::EmptyValues { command: "INSERT" };
        assert_eq!(err.to_string(), "INSERT requires at least one value");
    }

    #[test]
    fn test_invalid_value_type_error() {
        let err = Error::invalid_value_type("flag", "expected string, number or null");
        assert_eq!(
            err.to_string(),
            "Invalid value type for 'flag': expected string, number or null"
        );
    }

    #[test]
    fn test_unsupported_command_error() {
        let err = Error::unsupported_command("TRUNCATE");
        assert!(matches!(err, Error::UnsupportedCommand { .. }));
        assert_eq!(err.to_string(), "Unsupported SQL command 'TRUNCATE'");
    }

    #[test]
    fn test_driver_failure_kind() {
        assert!(Error::driver("connection lost").is_driver_failure());
        assert!(Error::Database(sqlx::Error::RowNotFound).is_driver_failure());
        assert!(!Error::MissingTable.is_driver_failure());
    }
}
