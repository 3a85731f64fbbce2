//! In-memory driver for tests: canned result sets, recorded executions

use crate::error::{Error, Result};
use crate::executor::{Connection, Statement};
use crate::params::ParamKey;
use crate::row::Row;
use crate::value::{ParamType, Value};
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;
use std::sync::Arc;

/// One recorded statement execution
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub sql: String,
    pub bindings: Vec<(ParamKey, Value, ParamType)>,
}

impl Execution {
    /// Value bound to `key` for this execution
    pub fn value(&self, key: impl Into<ParamKey>) -> Option<&Value> {
        let key = key.into();
        self.bindings
            .iter()
            .find(|(k, _, _)| *k == key)
            .map(|(_, v, _)| v)
    }

    pub fn param_type(&self, key: impl Into<ParamKey>) -> Option<ParamType> {
        let key = key.into();
        self.bindings
            .iter()
            .find(|(k, _, _)| *k == key)
            .map(|(_, _, t)| *t)
    }
}

#[derive(Debug, Default)]
struct MockState {
    result: Vec<Row>,
    queued: VecDeque<Vec<Row>>,
    affected: u64,
    failure: Option<String>,
    prepared: Vec<String>,
    executions: Vec<Execution>,
    cursor_closes: usize,
    last_insert_id: Option<i64>,
    attributes: BTreeMap<String, Value>,
}

/// Mock connection. Clones share state but are distinct connections, which
/// is how tests exercise re-preparing on a connection change.
#[derive(Debug, Clone, Default)]
pub struct MockConnection {
    state: Rc<RefCell<MockState>>,
}

fn rows_of(columns: &[&str], rows: Vec<Vec<Value>>) -> Vec<Row> {
    let columns: Arc<[String]> = columns
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .into();
    rows.into_iter()
        .map(|values| Row::new(Arc::clone(&columns), values))
        .collect()
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Result set returned by every execution with nothing queued
    pub fn with_rows(self, columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        self.state.borrow_mut().result = rows_of(columns, rows);
        self
    }

    /// Result set returned by the next execution only
    pub fn queue_rows(&self, columns: &[&str], rows: Vec<Vec<Value>>) {
        self.state
            .borrow_mut()
            .queued
            .push_back(rows_of(columns, rows));
    }

    /// Affected row count reported by every execution
    pub fn with_affected(self, affected: u64) -> Self {
        self.state.borrow_mut().affected = affected;
        self
    }

    /// Make every execution fail with a driver error
    pub fn failing(self, message: impl Into<String>) -> Self {
        self.state.borrow_mut().failure = Some(message.into());
        self
    }

    /// Id reported by `last_insert_id` once a statement has executed
    pub fn with_last_insert_id(self, id: i64) -> Self {
        self.state.borrow_mut().last_insert_id = Some(id);
        self
    }

    pub fn with_attribute(self, name: &str, value: impl Into<Value>) -> Self {
        self.state
            .borrow_mut()
            .attributes
            .insert(name.to_string(), value.into());
        self
    }

    /// SQL text of every prepared statement, in order
    pub fn prepared(&self) -> Vec<String> {
        self.state.borrow().prepared.clone()
    }

    pub fn executions(&self) -> Vec<Execution> {
        self.state.borrow().executions.clone()
    }

    pub fn last_execution(&self) -> Option<Execution> {
        self.state.borrow().executions.last().cloned()
    }

    /// How many times a statement released its cursor
    pub fn cursor_closes(&self) -> usize {
        self.state.borrow().cursor_closes
    }
}

impl Connection for MockConnection {
    type Statement = MockStatement;

    fn prepare(&self, sql: &str) -> Result<MockStatement> {
        self.state.borrow_mut().prepared.push(sql.to_string());
        Ok(MockStatement {
            state: Rc::clone(&self.state),
            sql: sql.to_string(),
            bindings: Vec::new(),
            cursor: VecDeque::new(),
        })
    }

    fn last_insert_id(&self) -> Result<Value> {
        let state = self.state.borrow();
        let executed = !state.executions.is_empty();
        Ok(match state.last_insert_id {
            Some(id) if executed => Value::Int(id),
            _ => Value::Null,
        })
    }

    fn attribute(&self, name: &str) -> Result<Value> {
        self.state
            .borrow()
            .attributes
            .get(name)
            .cloned()
            .ok_or_else(|| Error::driver(format!("attribute {} is not supported", name)))
    }
}

/// Statement prepared on a [`MockConnection`]
#[derive(Debug)]
pub struct MockStatement {
    state: Rc<RefCell<MockState>>,
    sql: String,
    bindings: Vec<(ParamKey, Value, ParamType)>,
    cursor: VecDeque<Row>,
}

impl Statement for MockStatement {
    fn bind_value(&mut self, key: &ParamKey, value: &Value, param_type: ParamType) -> Result<()> {
        match self.bindings.iter_mut().find(|(k, _, _)| k == key) {
            Some(binding) => {
                binding.1 = value.clone();
                binding.2 = param_type;
            }
            None => self
                .bindings
                .push((key.clone(), value.clone(), param_type)),
        }
        Ok(())
    }

    fn execute(&mut self) -> Result<u64> {
        let mut state = self.state.borrow_mut();
        if let Some(message) = &state.failure {
            return Err(Error::driver(message.clone()));
        }
        state.executions.push(Execution {
            sql: self.sql.clone(),
            bindings: self.bindings.clone(),
        });
        let queued = state.queued.pop_front();
        let rows = queued.unwrap_or_else(|| state.result.clone());
        self.cursor = rows.into();
        Ok(state.affected)
    }

    fn fetch(&mut self) -> Result<Option<Row>> {
        Ok(self.cursor.pop_front())
    }

    fn fetch_all(&mut self) -> Result<Vec<Row>> {
        Ok(self.cursor.drain(..).collect())
    }

    fn close_cursor(&mut self) {
        self.cursor.clear();
        self.state.borrow_mut().cursor_closes += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_records_executions() {
        let conn = MockConnection::new().with_affected(3);
        let mut stmt = conn.prepare("DELETE FROM t WHERE id = :id").unwrap();
        stmt.bind_value(&":id".into(), &Value::Int(1), ParamType::Int)
            .unwrap();
        assert_eq!(stmt.execute().unwrap(), 3);

        let execution = conn.last_execution().unwrap();
        assert_eq!(execution.sql, "DELETE FROM t WHERE id = :id");
        assert_eq!(execution.value(":id"), Some(&Value::Int(1)));
        assert_eq!(execution.param_type(":id"), Some(ParamType::Int));
    }

    #[test]
    fn test_mock_queued_rows_come_first() {
        let conn = MockConnection::new().with_rows(&["n"], vec![vec![Value::Int(1)]]);
        conn.queue_rows(&["n"], vec![vec![Value::Int(9)]]);
        let mut stmt = conn.prepare("SELECT n").unwrap();

        stmt.execute().unwrap();
        assert_eq!(stmt.fetch_column().unwrap(), Some(Value::Int(9)));
        stmt.execute().unwrap();
        assert_eq!(stmt.fetch_column().unwrap(), Some(Value::Int(1)));
    }

    #[test]
    fn test_mock_failure() {
        let conn = MockConnection::new().failing("gone away");
        let mut stmt = conn.prepare("SELECT 1").unwrap();
        let err = stmt.execute().unwrap_err();
        assert!(err.is_driver_failure());
        assert!(conn.executions().is_empty());
    }

    #[test]
    fn test_mock_attributes() {
        let conn = MockConnection::new().with_attribute("DRIVER_NAME", "mock");
        assert_eq!(conn.attribute("DRIVER_NAME").unwrap(), Value::from("mock"));
        assert!(conn.attribute("SERVER_INFO").is_err());
    }
}
