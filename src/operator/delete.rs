use std::sync::Arc;

use super::Operator;
use crate::{
    buffer_pool::BufferPool,
    storage::{Schema, Tuple, Type},
    transaction::TransactionId,
    types::{DbResult, SimpleResult},
};

/// Deletes the tuples read from its child from the tables they belong
/// to. Same output shape as `Insert`: one tuple with the count.
pub struct Delete {
    pool: Arc<BufferPool>,
    tid: TransactionId,
    child: Box<dyn Operator>,
    schema: Schema,
    done: bool,
}

impl Delete {
    pub fn new(pool: &Arc<BufferPool>, tid: TransactionId, child: Box<dyn Operator>) -> Self {
        Self {
            pool: pool.clone(),
            tid,
            child,
            schema: Schema::from_types(&[Type::Int], &["deleted"]),
            done: false,
        }
    }
}

impl Operator for Delete {
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
            self.pool.delete_tuple(self.tid, &tuple)?;
            count += 1;
        }
        self.done = true;
        Ok(Some(Tuple::from_ints(&[count])))
    }

    fn get_schema(&self) -> &Schema {
        &self.schema
    }
}
