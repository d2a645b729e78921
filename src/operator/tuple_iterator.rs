use super::Operator;
use crate::{
    error::DbError,
    storage::{Schema, Tuple},
    types::{DbResult, SimpleResult},
};

/// Serves a fixed list of tuples from memory.
pub struct TupleIterator {
    schema: Schema,
    tuples: Vec<Tuple>,

    // `None` while closed
    pos: Option<usize>,
}

impl TupleIterator {
    /// Every tuple must match `schema`.
    pub fn new(schema: Schema, tuples: Vec<Tuple>) -> DbResult<Self> {
        if let Some(t) = tuples.iter().find(|t| !t.conforms_to(&schema)) {
            return Err(DbError::Database(format!(
                "tuple {} doesn't match schema {}",
                t, schema
            )));
        }

        Ok(Self {
            schema,
            tuples,
            pos: None,
        })
    }
}

impl Operator for TupleIterator {
    fn open(&mut self) -> SimpleResult {
        self.pos = Some(0);
        Ok(())
    }

    fn close(&mut self) {
        self.pos = None;
    }

    fn rewind(&mut self) -> SimpleResult {
        self.open()
    }

    fn next(&mut self) -> DbResult<Option<Tuple>> {
        match self.pos.as_mut() {
            Some(pos) if *pos < self.tuples.len() => {
                *pos += 1;
                Ok(Some(self.tuples[*pos - 1].clone()))
            }
            _ => Ok(None),
        }
    }

    fn get_schema(&self) -> &Schema {
        &self.schema
    }
}
