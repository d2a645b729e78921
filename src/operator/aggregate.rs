use super::{
    aggregator::{output_schema, AggregateOp, Aggregator, IntegerAggregator, StringAggregator},
    Operator, TupleIterator,
};
use crate::{
    storage::{Schema, Tuple, Type},
    types::{DbResult, SimpleResult},
};

/// Computes one aggregate (`min`, `max`, `sum`, `avg` or `count`) over
/// field `afield` of its child, optionally grouped by `gfield`.
///
/// The child is drained on `open`.
pub struct Aggregate {
    child: Box<dyn Operator>,
    afield: usize,
    gfield: Option<usize>,
    op: AggregateOp,
    schema: Schema,
    results: Option<TupleIterator>,
}

impl Aggregate {
    pub fn new(
        child: Box<dyn Operator>,
        afield: usize,
        gfield: Option<usize>,
        op: AggregateOp,
    ) -> DbResult<Self> {
        let schema = output_schema(child.get_schema(), gfield, afield, op)?;

        // reject unsupported combinations up front
        Self::new_aggregator(child.get_schema(), afield, gfield, op)?;

        Ok(Self {
            child,
            afield,
            gfield,
            op,
            schema,
            results: None,
        })
    }

    fn new_aggregator(
        child: &Schema,
        afield: usize,
        gfield: Option<usize>,
        op: AggregateOp,
    ) -> DbResult<Box<dyn Aggregator>> {
        match child.get_field_type(afield)? {
            Type::Int => Ok(Box::new(IntegerAggregator::new(child, gfield, afield, op)?)),
            Type::String => Ok(Box::new(StringAggregator::new(child, gfield, afield, op)?)),
        }
    }

    pub fn get_op(&self) -> AggregateOp {
        self.op
    }
}

impl Operator for Aggregate {
    fn open(&mut self) -> SimpleResult {
        self.child.open()?;

        let mut aggregator =
            Self::new_aggregator(self.child.get_schema(), self.afield, self.gfield, self.op)?;
        while let Some(tuple) = self.child.next()? {
            aggregator.merge(&tuple)?;
        }

        let mut results = aggregator.iterator()?;
        results.open()?;
        self.results = Some(results);
        Ok(())
    }

    fn close(&mut self) {
        self.child.close();
        self.results = None;
    }

    fn rewind(&mut self) -> SimpleResult {
        match self.results.as_mut() {
            Some(results) => results.rewind(),
            None => Ok(()),
        }
    }

    fn next(&mut self) -> DbResult<Option<Tuple>> {
        match self.results.as_mut() {
            Some(results) => results.next(),
            None => Ok(None),
        }
    }

    fn get_schema(&self) -> &Schema {
        &self.schema
    }
}
