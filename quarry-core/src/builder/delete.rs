use super::QueryBuilder;
use crate::error::Result;
use crate::params::Params;

impl QueryBuilder {
    pub(super) fn render_delete(&mut self, params: &mut Params) -> Result<String> {
        let table = self.table_sql()?;
        Ok(format!("DELETE FROM {}{}", table, self.criteria.render(params)?))
    }
}
