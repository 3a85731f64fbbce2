use super::{Assignment, QueryBuilder};
use crate::condition::Placer;
use crate::error::{Error, Result};
use crate::params::Params;
use crate::value::Value;

impl QueryBuilder {
    /// `INSERT INTO t (f1,f2) VALUES (v1,v2)`; `REPLACE INTO` when
    /// [`QueryBuilder::replace`] was used
    pub(super) fn render_insert(&mut self, params: &mut Params) -> Result<String> {
        let table = self.table_sql()?;
        if self.values.is_empty() {
            return Err(Error::EmptyValues { command: "INSERT" });
        }

        let mut fields = Vec::new();
        let mut values = Vec::new();
        let mut placer = self.criteria.placer(params);

        for (i, entry) in self.values.entries().iter().enumerate() {
            match entry {
                Assignment::Column { column, value } => {
                    fields.push(column.clone());
                    values.push(placer.place(value.clone()));
                }
                Assignment::Expr(Value::String(expr)) => {
                    if let Some((field, value)) = insert_expr(expr, &mut placer)? {
                        fields.push(field);
                        values.push(value);
                    }
                }
                Assignment::Expr(other) => {
                    return Err(Error::invalid_value_type(
                        format!("#{}", i),
                        format!("INSERT expression must be a string, got {}", other.type_name()),
                    ));
                }
            }
        }

        let verb = if self.replace { "REPLACE" } else { "INSERT" };
        Ok(format!(
            "{} INTO {} ({}) VALUES ({})",
            verb,
            table,
            fields.join(","),
            values.join(",")
        ))
    }
}

/// Classify the right-hand side of a `"col=expr"` entry. Entries without a
/// right-hand side contribute nothing.
fn insert_expr(expr: &str, placer: &mut Placer<'_>) -> Result<Option<(String, String)>> {
    let Some((field, value)) = expr.split_once('=') else {
        return Ok(None);
    };
    let (field, value) = (field.trim(), value.trim());
    if value.is_empty() {
        return Ok(None);
    }

    let rendered = if value.starts_with(':') {
        value.to_string()
    } else if let Some(raw) = value.strip_prefix("{:") {
        raw.to_string()
    } else if value == "?" {
        return Err(Error::UnsupportedPlaceholder {
            placeholder: value.to_string(),
        });
    } else {
        placer.place(Value::from(value).trim_quotes())
    };
    Ok(Some((field.to_string(), rendered)))
}
