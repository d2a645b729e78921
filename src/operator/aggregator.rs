use std::{collections::BTreeMap, fmt};

use super::TupleIterator;
use crate::{
    error::DbError,
    storage::{Cell, Field, Schema, Tuple, Type},
    types::{DbResult, SimpleResult},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOp {
    Min,
    Max,
    Sum,
    Avg,
    Count,
}

impl fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            AggregateOp::Min => "min",
            AggregateOp::Max => "max",
            AggregateOp::Sum => "sum",
            AggregateOp::Avg => "avg",
            AggregateOp::Count => "count",
        };
        write!(f, "{}", name)
    }
}

/// Computes one aggregate over a stream of tuples, optionally grouped
/// by a field.
pub trait Aggregator: Send {
    /// Fold a new tuple into its group.
    fn merge(&mut self, tuple: &Tuple) -> SimpleResult;

    /// One tuple per group, `(group, value)` or just `(value)` without
    /// grouping, groups in ascending order.
    fn iterator(&self) -> DbResult<TupleIterator>;
}

/// Output schema of an aggregation over `child`.
pub(super) fn output_schema(
    child: &Schema,
    gfield: Option<usize>,
    afield: usize,
    op: AggregateOp,
) -> DbResult<Schema> {
    let aggregate_name = format!("{}({})", op, child.get_field_name(afield)?);

    let mut fields = Vec::new();
    if let Some(g) = gfield {
        fields.push(Field::new(child.get_field_name(g)?, child.get_field_type(g)?));
    }
    fields.push(Field::new(&aggregate_name, Type::Int));
    Ok(Schema::new(fields))
}

fn group_key(tuple: &Tuple, gfield: Option<usize>) -> Option<Cell> {
    gfield.map(|g| tuple.get_cell(g).clone())
}

fn build_iterator(
    schema: &Schema,
    groups: impl Iterator<Item = (Option<Cell>, i32)>,
) -> DbResult<TupleIterator> {
    let tuples = groups
        .map(|(group, value)| {
            let mut cells = Vec::with_capacity(2);
            if let Some(g) = group {
                cells.push(g);
            }
            cells.push(Cell::Int(value));
            Tuple::new(cells)
        })
        .collect();
    TupleIterator::new(schema.clone(), tuples)
}

#[derive(Debug, Clone, Copy)]
struct IntState {
    count: i64,
    sum: i64,
    min: i32,
    max: i32,
}

impl IntState {
    fn new(value: i32) -> Self {
        Self {
            count: 0,
            sum: 0,
            min: value,
            max: value,
        }
    }

    fn add(&mut self, value: i32) {
        self.count += 1;
        self.sum += value as i64;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    fn result(&self, op: AggregateOp) -> i32 {
        match op {
            AggregateOp::Min => self.min,
            AggregateOp::Max => self.max,
            AggregateOp::Sum => self.sum as i32,
            // integer division, truncated toward zero
            AggregateOp::Avg => (self.sum / self.count) as i32,
            AggregateOp::Count => self.count as i32,
        }
    }
}

/// Aggregates an int field. Supports every `AggregateOp`.
pub struct IntegerAggregator {
    gfield: Option<usize>,
    afield: usize,
    op: AggregateOp,
    schema: Schema,
    groups: BTreeMap<Option<Cell>, IntState>,
}

impl IntegerAggregator {
    pub fn new(child: &Schema, gfield: Option<usize>, afield: usize, op: AggregateOp) -> DbResult<Self> {
        if child.get_field_type(afield)? != Type::Int {
            return Err(DbError::Database(format!(
                "field {} is not an int field",
                child.get_field_name(afield)?
            )));
        }

        Ok(Self {
            gfield,
            afield,
            op,
            schema: output_schema(child, gfield, afield, op)?,
            groups: BTreeMap::new(),
        })
    }
}

impl Aggregator for IntegerAggregator {
    fn merge(&mut self, tuple: &Tuple) -> SimpleResult {
        let value = tuple.get_cell(self.afield).get_int()?;
        self.groups
            .entry(group_key(tuple, self.gfield))
            .or_insert_with(|| IntState::new(value))
            .add(value);
        Ok(())
    }

    fn iterator(&self) -> DbResult<TupleIterator> {
        let op = self.op;
        build_iterator(
            &self.schema,
            self.groups
                .iter()
                .map(|(group, state)| (group.clone(), state.result(op))),
        )
    }
}

/// Aggregates a string field. Only `Count` makes sense here.
pub struct StringAggregator {
    gfield: Option<usize>,
    schema: Schema,
    counts: BTreeMap<Option<Cell>, i32>,
}

impl StringAggregator {
    pub fn new(child: &Schema, gfield: Option<usize>, afield: usize, op: AggregateOp) -> DbResult<Self> {
        if op != AggregateOp::Count {
            return Err(DbError::Database(format!(
                "{} is not supported on string fields, only count is",
                op
            )));
        }

        Ok(Self {
            gfield,
            schema: output_schema(child, gfield, afield, op)?,
            counts: BTreeMap::new(),
        })
    }
}

impl Aggregator for StringAggregator {
    fn merge(&mut self, tuple: &Tuple) -> SimpleResult {
        *self.counts.entry(group_key(tuple, self.gfield)).or_insert(0) += 1;
        Ok(())
    }

    fn iterator(&self) -> DbResult<TupleIterator> {
        build_iterator(
            &self.schema,
            self.counts.iter().map(|(group, count)| (group.clone(), *count)),
        )
    }
}
