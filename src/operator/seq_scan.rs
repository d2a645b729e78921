use std::sync::Arc;

use super::Operator;
use crate::{
    buffer_pool::BufferPool,
    heap::{DbFileIterator, TableId},
    storage::{Field, Schema, Tuple},
    transaction::TransactionId,
    types::{DbResult, SimpleResult},
};

/// Reads every tuple of a table, in no particular order.
///
/// Field names of the output schema are prefixed with the table alias
/// (`alias.field`).
pub struct SeqScan {
    table_id: TableId,
    table_alias: String,
    schema: Schema,
    it: Box<dyn DbFileIterator>,
}

impl SeqScan {
    pub fn new(
        pool: &Arc<BufferPool>,
        tid: TransactionId,
        table_id: TableId,
        table_alias: &str,
    ) -> DbResult<Self> {
        let file = pool.get_catalog().get_db_file(table_id)?;
        let fields = file
            .get_schema()
            .get_fields()
            .iter()
            .map(|f| Field::new(&format!("{}.{}", table_alias, f.name), f.t))
            .collect();
        let it = file.iterator(pool.clone(), tid);

        Ok(Self {
            table_id,
            table_alias: table_alias.to_string(),
            schema: Schema::new(fields),
            it,
        })
    }

    pub fn get_table_id(&self) -> TableId {
        self.table_id
    }

    pub fn get_alias(&self) -> &str {
        &self.table_alias
    }
}

impl Operator for SeqScan {
    fn open(&mut self) -> SimpleResult {
        self.it.open()
    }

    fn close(&mut self) {
        self.it.close();
    }

    fn rewind(&mut self) -> SimpleResult {
        self.it.rewind()
    }

    fn next(&mut self) -> DbResult<Option<Tuple>> {
        self.it.next()
    }

    fn get_schema(&self) -> &Schema {
        &self.schema
    }
}
