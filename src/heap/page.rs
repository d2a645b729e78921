use std::{fmt, sync::Arc};

use bit_vec::BitVec;
use log::debug;

use super::PageId;
use crate::{
    buffer_pool::BufferPool,
    error::DbError,
    io::{ByteWriter, Decodeable},
    storage::{RecordId, Schema, Tuple},
    transaction::TransactionId,
    types::{DbResult, SimpleResult},
    utils::{ceil_div, floor_div},
};

/// The in-memory image of one page of a heap file.
///
/// Layout on disk: a header bitmap with one bit per slot, followed by
/// `slot_count` fixed-size tuple slots, followed by zero padding up to
/// the page size.
pub struct HeapPage {
    pid: PageId,
    schema: Arc<Schema>,

    slot_count: usize,

    // indicate slots' status: true means occupied, false means empty
    header: BitVec<u32>,

    // one entry per slot, `None` for the empty ones
    tuples: Vec<Option<Tuple>>,

    // the transaction that dirtied this page, `None` when the page
    // matches its on-disk image
    dirty: Option<TransactionId>,
}

impl HeapPage {
    pub fn new(pid: &PageId, bytes: &[u8], schema: &Arc<Schema>) -> DbResult<Self> {
        let page_size = BufferPool::get_page_size();
        if bytes.len() < page_size {
            return Err(DbError::Database(format!(
                "page {} has {} bytes, expect {}",
                pid,
                bytes.len(),
                page_size
            )));
        }

        let tuple_size = schema.get_size();
        let slot_count = Self::calculate_slots_count(schema);
        let header_size = Self::calculate_header_size(slot_count);
        let header = BitVec::from_bytes(&bytes[..header_size]);

        let mut tuples = Vec::with_capacity(slot_count);
        for slot in 0..slot_count {
            if !header[slot] {
                tuples.push(None);
                continue;
            }

            let start = header_size + slot * tuple_size;
            let mut reader = &bytes[start..start + tuple_size];
            let mut tuple = Tuple::decode_from(&mut reader, schema)?;
            tuple.set_record_id(Some(RecordId::new(*pid, slot)));
            tuples.push(Some(tuple));
        }

        Ok(Self {
            pid: *pid,
            schema: schema.clone(),
            slot_count,
            header,
            tuples,
            dirty: None,
        })
    }

    /// Retrieve the maximum number of tuples this page can hold.
    ///
    /// Every tuple costs its own size plus one bit in the header.
    pub fn calculate_slots_count(schema: &Schema) -> usize {
        let bits_per_tuple_including_header = schema.get_size() * 8 + 1;
        floor_div(BufferPool::get_page_size() * 8, bits_per_tuple_including_header)
    }

    /// Computes the number of bytes in the header of a page holding
    /// `slot_count` slots.
    pub fn calculate_header_size(slot_count: usize) -> usize {
        ceil_div(slot_count, 8)
    }

    /// The image of a page without any tuple in it.
    pub fn empty_page_data() -> Vec<u8> {
        vec![0; BufferPool::get_page_size()]
    }

    pub fn get_pid(&self) -> PageId {
        self.pid
    }

    pub fn get_schema(&self) -> &Schema {
        &self.schema
    }

    pub fn get_slots_count(&self) -> usize {
        self.slot_count
    }

    pub fn empty_slots_count(&self) -> usize {
        (0..self.slot_count).filter(|i| !self.is_slot_used(*i)).count()
    }

    /// Returns the number of tuples currently stored on this page
    pub fn tuples_count(&self) -> usize {
        self.slot_count - self.empty_slots_count()
    }

    /// Returns true if associated slot on this page is filled.
    pub fn is_slot_used(&self, slot_index: usize) -> bool {
        slot_index < self.slot_count && self.header[slot_index]
    }

    fn mark_slot_status(&mut self, slot_index: usize, used: bool) {
        self.header.set(slot_index, used);
    }

    pub fn get_tuple(&self, slot_index: usize) -> Option<&Tuple> {
        self.tuples.get(slot_index).and_then(|t| t.as_ref())
    }

    /// Store the tuple in the first empty slot. The tuple's record id is
    /// updated to point at its new location, and its string cells are cut
    /// to what the slot holds on disk.
    pub fn insert_tuple(&mut self, tuple: &mut Tuple) -> SimpleResult {
        if !tuple.conforms_to(&self.schema) {
            return Err(DbError::Database(format!(
                "tuple {} doesn't match the schema of page {} ({})",
                tuple, self.pid, self.schema
            )));
        }

        let slot = (0..self.slot_count)
            .find(|i| !self.is_slot_used(*i))
            .ok_or_else(|| DbError::Database(format!("page {} is full", self.pid)))?;

        tuple.fit_to_slots();
        tuple.set_record_id(Some(RecordId::new(self.pid, slot)));
        self.tuples[slot] = Some(tuple.clone());
        self.mark_slot_status(slot, true);

        debug!("tuple inserted at {}#{}", self.pid, slot);
        Ok(())
    }

    /// Remove the tuple from the slot named by its record id.
    pub fn delete_tuple(&mut self, tuple: &Tuple) -> SimpleResult {
        let rid = tuple
            .get_record_id()
            .ok_or_else(|| DbError::invalid("tuple has no record id"))?;

        if rid.pid != self.pid {
            return Err(DbError::InvalidArgument(format!(
                "tuple {} is not on page {}",
                rid, self.pid
            )));
        }
        if rid.slot >= self.slot_count {
            return Err(DbError::InvalidArgument(format!(
                "slot {} out of range, page {} has {} slots",
                rid.slot, self.pid, self.slot_count
            )));
        }
        if !self.is_slot_used(rid.slot) {
            return Err(DbError::Database(format!("slot {} is already empty", rid)));
        }

        self.tuples[rid.slot] = None;
        self.mark_slot_status(rid.slot, false);
        Ok(())
    }

    /// Tuples in slot order, each one carrying its record id.
    pub fn tuples(&self) -> impl Iterator<Item = &Tuple> {
        self.tuples.iter().filter_map(|t| t.as_ref())
    }

    pub fn mark_dirty(&mut self, tid: Option<TransactionId>) {
        self.dirty = tid;
    }

    /// The transaction that dirtied this page, if any.
    pub fn is_dirty(&self) -> Option<TransactionId> {
        self.dirty
    }

    pub fn get_page_data(&self) -> DbResult<Vec<u8>> {
        let page_size = BufferPool::get_page_size();
        let tuple_size = self.schema.get_size();

        let mut writer = ByteWriter::new_reserved(page_size);
        writer.write_bytes(&self.header.to_bytes());

        let empty_slot = vec![0; tuple_size];
        for tuple in &self.tuples {
            match tuple {
                Some(t) => writer.write(t),
                None => writer.write_bytes(&empty_slot),
            }
        }

        writer.to_padded_bytes(page_size)
    }
}

impl fmt::Debug for HeapPage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "HeapPage {{ pid: {}, tuples: {}/{}, dirty: {:?} }}",
            self.pid,
            self.tuples_count(),
            self.slot_count,
            self.dirty
        )
    }
}
