mod aggregate;
mod aggregator;
mod delete;
mod insert;
mod seq_scan;
mod tuple_iterator;

pub use aggregate::Aggregate;
pub use aggregator::{AggregateOp, Aggregator, IntegerAggregator, StringAggregator};
pub use delete::Delete;
pub use insert::Insert;
pub use seq_scan::SeqScan;
pub use tuple_iterator::TupleIterator;

use crate::{
    storage::{Schema, Tuple},
    types::{DbResult, SimpleResult},
};

/// A node of a query plan, pulling tuples from its children.
///
/// `next` returns `Ok(None)` once the operator is exhausted; errors are
/// either `TransactionAborted` (the transaction must be rolled back) or
/// a plain database error.
pub trait Operator: Send {
    fn open(&mut self) -> SimpleResult;

    fn close(&mut self);

    /// Restart from the first tuple. Only valid on an open operator.
    fn rewind(&mut self) -> SimpleResult;

    fn next(&mut self) -> DbResult<Option<Tuple>>;

    fn get_schema(&self) -> &Schema;

    /// Drain the operator. It has to be open.
    fn collect_tuples(&mut self) -> DbResult<Vec<Tuple>> {
        let mut tuples = Vec::new();
        while let Some(tuple) = self.next()? {
            tuples.push(tuple);
        }
        Ok(tuples)
    }
}
