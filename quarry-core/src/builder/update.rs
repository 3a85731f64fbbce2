use super::{Assignment, QueryBuilder};
use crate::error::{Error, Result};
use crate::params::Params;
use crate::value::Value;

impl QueryBuilder {
    /// `UPDATE t [joins] SET a = :dy0,b = NULL` followed by the criteria
    pub(super) fn render_update(&mut self, params: &mut Params) -> Result<String> {
        let table = self.table_sql()?;
        if self.values.is_empty() {
            return Err(Error::EmptyValues { command: "UPDATE" });
        }

        let mut sql = format!("UPDATE {}", table);
        sql.push_str(&self.render_joins(params)?);

        let mut sets = Vec::with_capacity(self.values.len());
        {
            let mut placer = self.criteria.placer(params);
            for (i, entry) in self.values.entries().iter().enumerate() {
                match entry {
                    Assignment::Column { column, value: Value::Null } => {
                        sets.push(format!("{} = NULL", column));
                    }
                    Assignment::Column { column, value: Value::Bool(_) } => {
                        return Err(Error::invalid_value_type(
                            column.as_str(),
                            "UPDATE value must be a string or a number, got bool",
                        ));
                    }
                    Assignment::Column { column, value } => {
                        let placeholder = placer.place(value.clone().trim_quotes());
                        sets.push(format!("{} = {}", column, placeholder));
                    }
                    Assignment::Expr(Value::String(expr)) => sets.push(expr.clone()),
                    Assignment::Expr(other) => {
                        return Err(Error::invalid_value_type(
                            format!("#{}", i),
                            format!("UPDATE expression must be a string, got {}", other.type_name()),
                        ));
                    }
                }
            }
        }

        sql.push_str(" SET ");
        sql.push_str(&sets.join(","));
        sql.push_str(&self.criteria.render(params)?);
        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::{QueryBuilder, Values};
    use crate::error::Error;
    use crate::mock::MockConnection;
    use crate::value::Value;
    use crate::Conditions;

    #[test]
    fn test_update_values_and_where() {
        let mut builder = QueryBuilder::new().update_table(
            "user",
            Values::new()
                .set("name", "'Ash'")
                .set("deleted_at", Value::Null)
                .expr("visits = visits + 1"),
            Conditions::new().add("id", 3),
        );
        let (sql, params) = builder.to_sql().unwrap();
        assert_eq!(
            sql,
            "UPDATE user SET name = :dy0,deleted_at = NULL,visits = visits + 1 WHERE `id` = :dy1"
        );
        assert_eq!(params.value(&":dy0".into()), Some(Value::from("Ash")));
        assert_eq!(params.value(&":dy1".into()), Some(Value::Int(3)));
    }

    #[test]
    fn test_update_joins_come_before_set() {
        let mut builder = QueryBuilder::new()
            .table(("user", "u"))
            .left_join(("profile", "p"), "p.user_id = u.id")
            .values("u.score = p.score")
            .where_("p.score IS NOT NULL")
            .update();
        assert_eq!(
            builder.get_sql_text().unwrap(),
            "UPDATE user u LEFT JOIN profile p ON p.user_id = u.id SET u.score = p.score WHERE p.score IS NOT NULL"
        );
    }

    #[test]
    fn test_update_rejects_bool() {
        let mut builder = QueryBuilder::new().update_table("user", [("active", true)], "id = 1");
        assert!(matches!(
            builder.to_sql(),
            Err(Error::InvalidValueType { column, .. }) if column == "active"
        ));
    }

    #[test]
    fn test_update_requires_values() {
        let mut builder = QueryBuilder::new().table("user").update();
        assert!(matches!(
            builder.to_sql(),
            Err(Error::EmptyValues { command: "UPDATE" })
        ));
    }

    #[test]
    fn test_execute_update() {
        let conn = MockConnection::new().with_affected(2);
        let mut builder = QueryBuilder::new().update_table("user", [("city", "Cerulean")], [("city", "Pallet")]);
        assert_eq!(builder.execute(&conn).unwrap(), 2);
        let execution = conn.last_execution().unwrap();
        assert_eq!(execution.sql, "UPDATE user SET city = :dy0 WHERE `city` = :dy1");
        assert_eq!(execution.value(":dy0"), Some(&Value::from("Cerulean")));
    }
}
