use std::{fmt, io::Read};

use super::Cell;
use crate::{
    heap::PageId,
    io::{ByteWriter, Decodeable, Encodeable},
    storage::schema::Schema,
    types::DbResult,
};

/// Location of a stored tuple: the page and the slot inside it.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct RecordId {
    pub pid: PageId,
    pub slot: usize,
}

impl RecordId {
    pub fn new(pid: PageId, slot: usize) -> Self {
        Self { pid, slot }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}#{}", self.pid, self.slot)
    }
}

#[derive(Clone)]
pub struct Tuple {
    cells: Vec<Cell>,

    /// Where the tuple lives on disk, `None` until it has been stored
    /// in (or read from) a page.
    record_id: Option<RecordId>,
}

// constructors
impl Tuple {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self {
            cells,
            record_id: None,
        }
    }

    /// A tuple of `width` int cells, all holding `value`.
    pub fn new_int_tuples(value: i32, width: usize) -> Self {
        Self::new(vec![Cell::Int(value); width])
    }

    pub fn from_ints(values: &[i32]) -> Self {
        Self::new(values.iter().map(|v| Cell::Int(*v)).collect())
    }
}

impl Tuple {
    pub fn get_cell(&self, i: usize) -> &Cell {
        &self.cells[i]
    }

    pub fn get_cells(&self) -> &Vec<Cell> {
        &self.cells
    }

    pub fn set_cell(&mut self, i: usize, cell: Cell) {
        self.cells[i] = cell;
    }

    pub fn get_record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub fn set_record_id(&mut self, rid: Option<RecordId>) {
        self.record_id = rid;
    }

    /// Cut every string cell to the length a page slot stores.
    pub fn fit_to_slots(&mut self) {
        for cell in self.cells.iter_mut() {
            cell.fit_to_slot();
        }
    }

    /// Whether the cells line up with the fields of `schema`.
    pub fn conforms_to(&self, schema: &Schema) -> bool {
        self.cells.len() == schema.fields_count()
            && self
                .cells
                .iter()
                .zip(schema.get_fields())
                .all(|(c, f)| c.get_type() == f.t)
    }
}

impl Encodeable for Tuple {
    fn encode(&self, writer: &mut ByteWriter) {
        for cell in &self.cells {
            writer.write(cell);
        }
    }
}

impl Decodeable for Tuple {
    type Reference = Schema;

    fn decode_from<R: Read>(reader: &mut R, schema: &Schema) -> DbResult<Self> {
        let mut cells = Vec::with_capacity(schema.fields_count());
        for field in schema.get_fields() {
            cells.push(Cell::decode_from(reader, &field.t)?);
        }
        Ok(Self::new(cells))
    }
}

/// Tuples are equal when their cells are, regardless of where they are
/// stored.
impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        self.cells == other.cells
    }
}

impl Eq for Tuple {}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let cells: Vec<String> = self.cells.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", cells.join("\t"))
    }
}

impl fmt::Debug for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.record_id {
            Some(rid) => write!(f, "{{{:?} @ {}}}", self.cells, rid),
            None => write!(f, "{{{:?}}}", self.cells),
        }
    }
}
