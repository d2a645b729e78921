use std::sync::Arc;

use log::debug;

use super::Operator;
use crate::{
    buffer_pool::BufferPool,
    error::DbError,
    heap::TableId,
    storage::{Schema, Tuple, Type},
    transaction::TransactionId,
    types::{DbResult, SimpleResult},
};

/// Inserts the tuples read from its child into a table.
///
/// Produces a single tuple holding the number of inserted records, then
/// nothing. Rewinding rewinds the child but never inserts again.
pub struct Insert {
    pool: Arc<BufferPool>,
    tid: TransactionId,
    child: Box<dyn Operator>,
    table_id: TableId,
    schema: Schema,
    done: bool,
}

impl Insert {
    pub fn new(
        pool: &Arc<BufferPool>,
        tid: TransactionId,
        child: Box<dyn Operator>,
        table_id: TableId,
    ) -> DbResult<Self> {
        let table_schema = pool.get_catalog().get_schema(table_id)?;
        if *child.get_schema() != *table_schema {
            return Err(DbError::Database(format!(
                "child schema ({}) doesn't match the table schema ({})",
                child.get_schema(),
                table_schema
            )));
        }

        Ok(Self {
            pool: pool.clone(),
            tid,
            child,
            table_id,
            schema: Schema::from_types(&[Type::Int], &["inserted"]),
            done: false,
        })
    }
}

impl Operator for Insert {
    fn open(&mut self) -> SimpleResult {
        self.child.open()
    }

    fn close(&mut self) {
        self.child.close();
    }

    fn rewind(&mut self) -> SimpleResult {
        self.child.rewind()
    }

    fn next(&mut self) -> DbResult<Option<Tuple>> {
        if self.done {
            return Ok(None);
        }

        let mut count = 0;
        while let Some(tuple) = self.child.next()? {
            self.pool.insert_tuple(self.tid, self.table_id, tuple)?;
            count += 1;
        }
        self.done = true;

        debug!("{} inserted {} tuples into table {}", self.tid, count, self.table_id);
        Ok(Some(Tuple::from_ints(&[count])))
    }

    fn get_schema(&self) -> &Schema {
        &self.schema
    }
}
