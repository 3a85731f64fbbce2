//! Operator suffix parsing for condition keys (`field:OP[:suffix]`)

use std::fmt::{self, Display};

/// Comparison operator carried by a condition key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operator {
    /// Plain equality, used when a key has no operator or an empty one
    Eq,
    In,
    NotIn,
    Between,
    /// Any other token, rendered literally (`>`, `<=`, `LIKE`, `!=` ...)
    Other(String),
}

impl Operator {
    /// Parse an operator token; the token is trimmed and uppercased first
    pub fn parse(token: &str) -> Self {
        let token = token.trim().to_uppercase();
        match token.as_str() {
            "" | "=" => Operator::Eq,
            "IN" => Operator::In,
            "NOT IN" => Operator::NotIn,
            "BETWEEN" => Operator::Between,
            _ => Operator::Other(token),
        }
    }

    /// Get the string representation of the operator
    pub fn as_str(&self) -> &str {
        match self {
            Operator::Eq => "=",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::Between => "BETWEEN",
            Operator::Other(token) => token,
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A condition key split into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionKey {
    /// Column reference, already quoted when it needed quoting
    pub field: String,
    pub operator: Operator,
    /// Text appended verbatim after the rendered predicate
    pub suffix: Option<String>,
}

impl ConditionKey {
    pub fn parse(key: &str) -> Self {
        let mut parts = key.split(':');
        let field = parts.next().unwrap_or_default();
        let operator = parts.next().map(Operator::parse).unwrap_or(Operator::Eq);
        let suffix = parts
            .next()
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Self {
            field: quote_field(field),
            operator,
            suffix,
        }
    }
}

/// Backtick-quote a bare column name; dotted or already quoted references
/// pass through untouched.
pub fn quote_field(field: &str) -> String {
    if field.contains('`') || field.contains('.') {
        field.to_string()
    } else {
        format!("`{}`", field)
    }
}
